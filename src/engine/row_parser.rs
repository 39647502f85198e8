//! Appointment file parsing.
//!
//! Uploaded appointment files are comma- or tab-delimited text with a header
//! line followed by `appointmentDate, studentName, sessionTypeLabel` rows.
//! The delimiter is chosen by looking at the header: a tab anywhere in the
//! first line means the whole file is tab-delimited and read verbatim;
//! otherwise fields are split on commas outside double quotes and one layer
//! of surrounding quotes is removed.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde_json::json;
use tracing::debug;

use crate::models::{AppointmentRow, ImportWarning, WarningKind};

/// Minimum number of fields a data row must have.
pub const MIN_ROW_FIELDS: usize = 3;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// The delimiter detected for an appointment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// Comma-separated, double-quote aware.
    Comma,
    /// Tab-separated, no quote handling.
    Tab,
}

impl Delimiter {
    /// Chooses the delimiter from the file's first line.
    pub fn detect(text: &str) -> Self {
        match text.lines().next() {
            Some(header) if header.contains('\t') => Delimiter::Tab,
            _ => Delimiter::Comma,
        }
    }

    fn byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }
}

/// The rows read from a file, plus one warning per discarded row.
#[derive(Debug, Clone, Default)]
pub struct RowParseResult {
    /// Rows with at least three fields and a readable date.
    pub rows: Vec<AppointmentRow>,
    /// Rows that were discarded.
    pub malformed: Vec<ImportWarning>,
}

/// Parses an appointment date-time.
///
/// Only the wall-clock date and time are kept; an RFC 3339 offset is
/// dropped rather than converted. A bare date means midnight.
///
/// # Example
///
/// ```
/// use grid_import_engine::engine::parse_appointment_datetime;
///
/// let iso = parse_appointment_datetime("2026-03-02 15:30").unwrap();
/// let us = parse_appointment_datetime("3/2/2026 3:30 PM").unwrap();
/// assert_eq!(iso, us);
/// assert!(parse_appointment_datetime("next tuesday").is_none());
/// ```
pub fn parse_appointment_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Parses the text of an appointment file into rows.
///
/// The first line is always a header and never becomes a row, even when it
/// is blank. Every other line is read on its own, so a stray quote costs
/// only the line it is on. Blank lines are skipped. Rows with fewer than
/// [`MIN_ROW_FIELDS`] fields, or whose first field is not a readable
/// date-time, are dropped and reported in [`RowParseResult::malformed`];
/// parsing never fails as a whole.
///
/// # Example
///
/// ```
/// use grid_import_engine::engine::parse_appointment_rows;
///
/// let text = "Date,Student,Type\n\
///             2026-03-02 15:00,\"Lee, Ann\",Math\n\
///             2026-03-02 15:00,Bo Kim\n";
///
/// let result = parse_appointment_rows(text);
/// assert_eq!(result.rows.len(), 1);
/// assert_eq!(result.rows[0].student_name, "Lee, Ann");
/// assert_eq!(result.malformed.len(), 1);
/// ```
pub fn parse_appointment_rows(text: &str) -> RowParseResult {
    let delimiter = Delimiter::detect(text);
    let mut result = RowParseResult::default();

    for (index, text_line) in text.lines().enumerate().skip(1) {
        let line = index + 1;
        if text_line.trim().is_empty() {
            continue;
        }

        let warning = match read_line(text_line, delimiter) {
            Some(Ok(record)) => match row_from_record(&record, line) {
                Ok(row) => {
                    result.rows.push(row);
                    continue;
                }
                Err(warning) => warning,
            },
            Some(Err(err)) => ImportWarning::for_line(
                WarningKind::MalformedRow,
                line,
                format!("Unreadable row: {}", err),
                json!({ "text": text_line }),
            ),
            None => ImportWarning::for_line(
                WarningKind::MalformedRow,
                line,
                "Unreadable row: no fields".to_string(),
                json!({ "text": text_line }),
            ),
        };
        debug!(line, reason = %warning.message, "Discarding malformed row");
        result.malformed.push(warning);
    }

    result
}

/// Splits one line into fields. Comma files honour quotes and are trimmed;
/// tab files are split verbatim.
fn read_line(text_line: &str, delimiter: Delimiter) -> Option<csv::Result<StringRecord>> {
    let trim = match delimiter {
        Delimiter::Comma => Trim::All,
        Delimiter::Tab => Trim::None,
    };
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter.byte())
        .quoting(delimiter == Delimiter::Comma)
        .trim(trim)
        .from_reader(text_line.as_bytes())
        .into_records()
        .next()
}

fn row_from_record(record: &StringRecord, line: usize) -> Result<AppointmentRow, ImportWarning> {
    if record.len() < MIN_ROW_FIELDS {
        return Err(ImportWarning::for_line(
            WarningKind::MalformedRow,
            line,
            format!(
                "Expected at least {} fields, found {}",
                MIN_ROW_FIELDS,
                record.len()
            ),
            json!({ "fields": record.iter().collect::<Vec<_>>() }),
        ));
    }

    let date_text = &record[0];
    let appointment_date = parse_appointment_datetime(date_text).ok_or_else(|| {
        ImportWarning::for_line(
            WarningKind::MalformedRow,
            line,
            format!("Unreadable appointment date '{}'", date_text),
            json!({ "appointment_date": date_text }),
        )
    })?;

    Ok(AppointmentRow {
        line,
        appointment_date,
        student_name: record[1].to_string(),
        session_type_label: record[2].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_detects_tab_from_header_only() {
        assert_eq!(Delimiter::detect("a\tb\tc\n1,2,3"), Delimiter::Tab);
        assert_eq!(Delimiter::detect("a,b,c\n1\t2\t3"), Delimiter::Comma);
        assert_eq!(Delimiter::detect(""), Delimiter::Comma);
    }

    #[test]
    fn test_parses_comma_rows_and_skips_header() {
        let text = "Appointment Date,Student,Session\n\
                    2026-03-02 15:00,Ann Lee,Math 30\n\
                    2026-03-02 15:30,Bo Kim,Reading 60\n";

        let result = parse_appointment_rows(text);
        assert_eq!(result.rows.len(), 2);
        assert!(result.malformed.is_empty());

        let first = &result.rows[0];
        assert_eq!(first.line, 2);
        assert_eq!(first.appointment_date, datetime("2026-03-02 15:00:00"));
        assert_eq!(first.student_name, "Ann Lee");
        assert_eq!(first.session_type_label, "Math 30");
        assert_eq!(result.rows[1].line, 3);
    }

    #[test]
    fn test_quoted_fields_keep_commas_and_lose_quotes() {
        let text = "date,name,type\n\"2026-03-02 15:00\",\"Lee, Ann\",\"Math\"\n";
        let result = parse_appointment_rows(text);

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].student_name, "Lee, Ann");
        assert_eq!(result.rows[0].session_type_label, "Math");
    }

    #[test]
    fn test_tab_rows_are_split_verbatim() {
        let text = "date\tname\ttype\n2026-03-02 16:00\tCy, Fox\t\"Math\"\n";
        let result = parse_appointment_rows(text);

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].student_name, "Cy, Fox");
        // Quotes are not special in tab-delimited files.
        assert_eq!(result.rows[0].session_type_label, "\"Math\"");
    }

    #[test]
    fn test_tab_fields_keep_their_spaces() {
        let text = "date\tname\ttype\n2026-03-02 16:00\t Cy Fox \t typeA\n";
        let result = parse_appointment_rows(text);

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].student_name, " Cy Fox ");
        assert_eq!(result.rows[0].session_type_label, " typeA");
    }

    #[test]
    fn test_comma_fields_are_trimmed() {
        let text = "date,name,type\n2026-03-02 16:00 , Cy Fox ,  typeA\n";
        let result = parse_appointment_rows(text);

        assert_eq!(result.rows[0].student_name, "Cy Fox");
        assert_eq!(result.rows[0].session_type_label, "typeA");
    }

    #[test]
    fn test_stray_quote_costs_only_its_own_line() {
        let text = "date,name,type\n\
                    2026-03-02 15:00,\"Ann Lee,typeA\n\
                    2026-03-02 15:00,Bo Kim,typeA\n\
                    2026-03-02 15:30,Cy Fox,typeA\n";
        let result = parse_appointment_rows(text);

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0].line, 3);
        assert_eq!(result.rows[0].student_name, "Bo Kim");
        assert_eq!(result.rows[1].line, 4);
        assert_eq!(result.malformed.len(), 1);
        assert_eq!(result.malformed[0].line, Some(2));
    }

    #[test]
    fn test_blank_first_line_is_the_header() {
        let text = "\nDate,Student,Type\n2026-03-02 15:00,Ann Lee,typeA\n";
        let result = parse_appointment_rows(text);

        // The real header sits on line 2 and is read as a data row.
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].line, 3);
        assert_eq!(result.malformed.len(), 1);
        assert_eq!(result.malformed[0].line, Some(2));
    }

    #[test]
    fn test_blank_lines_between_rows_are_skipped() {
        let text = "date,name,type\n\n2026-03-02 15:00,Ann Lee,Math\n   \n";
        let result = parse_appointment_rows(text);

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].line, 3);
        assert!(result.malformed.is_empty());
    }

    #[test]
    fn test_short_rows_are_discarded_not_fatal() {
        let text = "date,name,type\n2026-03-02 15:00,Ann Lee\n2026-03-02 15:00,Bo Kim,Math\n";
        let result = parse_appointment_rows(text);

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.malformed.len(), 1);
        assert_eq!(result.malformed[0].kind, WarningKind::MalformedRow);
        assert_eq!(result.malformed[0].line, Some(2));
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let text = "date,name,type,notes\n2026-03-02 15:00,Ann Lee,Math,bring book\n";
        let result = parse_appointment_rows(text);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].session_type_label, "Math");
    }

    #[test]
    fn test_unreadable_date_is_malformed() {
        let text = "date,name,type\nsoon,Ann Lee,Math\n";
        let result = parse_appointment_rows(text);
        assert!(result.rows.is_empty());
        assert_eq!(result.malformed.len(), 1);
        assert!(result.malformed[0].message.contains("soon"));
    }

    #[test]
    fn test_header_only_and_empty_files_yield_nothing() {
        assert!(parse_appointment_rows("date,name,type\n").rows.is_empty());
        assert!(parse_appointment_rows("date,name,type").rows.is_empty());
        assert!(parse_appointment_rows("").rows.is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "date,name,type\r\n2026-03-02 15:00,Ann Lee,Math\r\n";
        let result = parse_appointment_rows(text);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].session_type_label, "Math");
    }

    #[test]
    fn test_datetime_formats() {
        let expected = datetime("2026-03-02 15:30:00");
        for text in [
            "2026-03-02 15:30",
            "2026-03-02 15:30:00",
            "2026-03-02T15:30:00",
            "2026-03-02T15:30:00.000",
            "2026-03-02T15:30",
            "2026-03-02T15:30:00-05:00",
            "3/2/2026 15:30",
            "03/02/2026 3:30 PM",
            "3/2/2026 3:30:00 PM",
        ] {
            assert_eq!(parse_appointment_datetime(text), Some(expected), "{}", text);
        }
        assert_eq!(
            parse_appointment_datetime("2026-03-02"),
            Some(datetime("2026-03-02 00:00:00"))
        );
    }
}

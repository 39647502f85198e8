//! Per-slot occupancy of the schedule grid.

use std::collections::BTreeMap;

use chrono::NaiveTime;

use super::appointment::StudentId;

/// Maps each slot start time to the students present in that slot.
///
/// Slots iterate in chronological order. Each slot keeps its occupants in
/// first-seen order and never lists the same student twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occupancy {
    slots: BTreeMap<NaiveTime, Vec<StudentId>>,
}

impl Occupancy {
    /// Creates an empty occupancy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a student to the slot starting at `time`.
    ///
    /// Returns `false` when the student was already an occupant there.
    pub fn add(&mut self, time: NaiveTime, student_id: StudentId) -> bool {
        let occupants = self.slots.entry(time).or_default();
        if occupants.contains(&student_id) {
            return false;
        }
        occupants.push(student_id);
        true
    }

    /// Returns the occupants of the slot starting at `time`.
    pub fn occupants(&self, time: NaiveTime) -> &[StudentId] {
        self.slots.get(&time).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates slots in ascending time order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveTime, &[StudentId])> {
        self.slots
            .iter()
            .map(|(time, occupants)| (*time, occupants.as_slice()))
    }

    /// Removes every slot whose time fails `keep`, returning what was removed.
    pub fn split_off_unless<F>(&mut self, mut keep: F) -> Vec<(NaiveTime, Vec<StudentId>)>
    where
        F: FnMut(NaiveTime) -> bool,
    {
        let dropped: Vec<NaiveTime> = self.slots.keys().copied().filter(|t| !keep(*t)).collect();
        dropped
            .into_iter()
            .filter_map(|time| self.slots.remove(&time).map(|occupants| (time, occupants)))
            .collect()
    }

    /// Number of slots with at least one occupant.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Total occupant entries across all slots.
    pub fn occupant_count(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    /// Returns true when no slot has an occupant.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

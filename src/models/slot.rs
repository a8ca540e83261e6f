use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A concrete `[start, end)` assignment. `date` is the slot's calendar day at
/// local midnight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slot {
    pub date: NaiveDateTime,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Slot {
    pub fn overlaps(&self, start: &NaiveDateTime, end: &NaiveDateTime) -> bool {
        self.start < *end && self.end > *start
    }
}

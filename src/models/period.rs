// file: src/period.rs
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Number of class periods in a teaching day.
pub const PERIOD_COUNT: u8 = 16;

// (start hour, start minute, end hour, end minute); period 16 ends after midnight.
const PERIOD_TABLE: [(u32, u32, u32, u32); PERIOD_COUNT as usize] = [
    (6, 45, 7, 35),
    (7, 40, 8, 30),
    (8, 40, 9, 30),
    (9, 40, 10, 30),
    (10, 35, 11, 25),
    (13, 0, 13, 50),
    (13, 55, 14, 45),
    (14, 50, 15, 40),
    (15, 55, 16, 45),
    (16, 50, 17, 40),
    (18, 15, 19, 5),
    (19, 10, 20, 0),
    (20, 10, 21, 0),
    (21, 10, 22, 0),
    (22, 10, 23, 0),
    (23, 30, 0, 20),
];

/// A class period: ordinal 1-16 with fixed local wall-clock bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub index: u8,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Period {
    /// Looks up a period by its 1-based ordinal.
    pub fn get(index: u8) -> Option<Self> {
        if index == 0 || index > PERIOD_COUNT {
            return None;
        }
        let (sh, sm, eh, em) = PERIOD_TABLE[(index - 1) as usize];
        Some(Self {
            index,
            start: NaiveTime::from_hms_opt(sh, sm, 0)?,
            end: NaiveTime::from_hms_opt(eh, em, 0)?,
        })
    }

    pub fn all() -> impl Iterator<Item = Period> {
        (1..=PERIOD_COUNT).filter_map(Period::get)
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end < self.start
    }
}

//! Calendar seasons and season selections

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Season classification error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeasonError {
    #[error("Invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),

    #[error("Unknown season label: {0}")]
    UnknownLabel(String),
}

/// One of four fixed calendar buckets.
///
/// Variant order is the display order used everywhere: Winter, Spring,
/// Summer, Fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// All seasons in display order
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    pub fn label(self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }

    /// Position in display order (0..4)
    pub fn index(self) -> usize {
        self as usize
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Season {
    type Err = SeasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Season::ALL
            .into_iter()
            .find(|season| season.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SeasonError::UnknownLabel(trimmed.to_string()))
    }
}

/// Map a calendar month (1-12) to its season.
///
/// December through February is Winter, March through May Spring, June
/// through August Summer, September through November Fall. Anything else is
/// a caller error.
pub fn classify_season(month: u32) -> Result<Season, SeasonError> {
    match month {
        12 | 1 | 2 => Ok(Season::Winter),
        3..=5 => Ok(Season::Spring),
        6..=8 => Ok(Season::Summer),
        9..=11 => Ok(Season::Fall),
        _ => Err(SeasonError::InvalidMonth(month)),
    }
}

/// A selection of zero or more seasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SeasonSet {
    bits: u8,
}

impl SeasonSet {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub const fn all() -> Self {
        Self { bits: 0b1111 }
    }

    pub fn insert(&mut self, season: Season) {
        self.bits |= season.bit();
    }

    pub fn contains(&self, season: Season) -> bool {
        self.bits & season.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Selected seasons in display order
    pub fn iter(&self) -> impl Iterator<Item = Season> + '_ {
        Season::ALL.into_iter().filter(|s| self.contains(*s))
    }

    /// Parse a comma-separated list of labels, e.g. `"Winter,fall"`.
    ///
    /// Blank entries are ignored, so `""` yields the empty set.
    pub fn parse_list(list: &str) -> Result<Self, SeasonError> {
        list.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Season::from_str)
            .collect()
    }
}

impl FromIterator<Season> for SeasonSet {
    fn from_iter<I: IntoIterator<Item = Season>>(iter: I) -> Self {
        let mut set = SeasonSet::empty();
        for season in iter {
            set.insert(season);
        }
        set
    }
}

impl fmt::Display for SeasonSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.iter().map(Season::label).collect();
        f.write_str(&labels.join(","))
    }
}

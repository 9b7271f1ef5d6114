use crate::{Error, DEFAULT_SEED};
use chrono::{Datelike, Local, NaiveDate};
use std::str::FromStr;

/// Where a preset's seed comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedSource {
    /// The fixed default seed.
    #[default]
    Default,
    Fixed(u64),
    /// `YYYYMMDD` of the given day.
    Date(NaiveDate),
    /// `YYYYMMDD` of the local date when resolved.
    Today,
}

impl SeedSource {
    pub fn resolve(&self) -> u64 {
        match *self {
            Self::Default => DEFAULT_SEED,
            Self::Fixed(seed) => seed,
            Self::Date(date) => date_seed(date),
            Self::Today => date_seed(Local::now().date_naive()),
        }
    }
}

/// Encode a date as the integer `YYYYMMDD`.
pub fn date_seed(date: NaiveDate) -> u64 {
    let year = date.year().max(0) as u64;
    year * 10_000 + date.month() as u64 * 100 + date.day() as u64
}

impl FromStr for SeedSource {
    type Err = Error;

    /// Accepts `default`, `today`, a `YYYY-MM-DD` date, or an integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => return Ok(Self::Default),
            "today" => return Ok(Self::Today),
            _ => {}
        }
        if let Ok(seed) = s.parse::<u64>() {
            return Ok(Self::Fixed(seed));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self::Date)
            .map_err(|_| Error::InvalidSeed(s.to_string()))
    }
}

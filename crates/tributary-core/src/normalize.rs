use crate::{Error, FlowData, Result};
use std::str::FromStr;

/// Average month length in days, used to turn a daily rate into a monthly figure.
pub const DAYS_PER_MONTH: f64 = 365.0 / 12.0;

/// How link values relate to the period the data covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
    /// Values are drawn as given.
    #[default]
    AsGiven,
    /// Values are totals over `days` and are drawn as a monthly average.
    DailyAverageOverPeriod,
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "asGiven" | "as-given" | "total" => Ok(Self::AsGiven),
            "dailyAverageOverPeriod" | "daily-average" | "monthly" => {
                Ok(Self::DailyAverageOverPeriod)
            }
            other => Err(Error::UnknownInterval {
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum NormalizeOptions {
    #[default]
    AsGiven,
    DailyAverageOverPeriod { period_length_days: f64 },
}

impl NormalizeOptions {
    /// Resolves an [`Interval`] against the period length carried by the data itself.
    pub fn from_interval(interval: Interval, data: &FlowData) -> Result<Self> {
        match interval {
            Interval::AsGiven => Ok(Self::AsGiven),
            Interval::DailyAverageOverPeriod => {
                let days = data.days.ok_or(Error::MissingPeriod)?;
                Ok(Self::DailyAverageOverPeriod {
                    period_length_days: days,
                })
            }
        }
    }
}

/// Returns a rescaled copy of `data`; the input is never modified.
///
/// Only link values change. `DailyAverageOverPeriod` multiplies every value by
/// `DAYS_PER_MONTH / period_length_days`.
pub fn normalize(data: &FlowData, options: &NormalizeOptions) -> Result<FlowData> {
    let mut out = data.clone();
    match *options {
        NormalizeOptions::AsGiven => {}
        NormalizeOptions::DailyAverageOverPeriod { period_length_days } => {
            if !(period_length_days.is_finite() && period_length_days > 0.0) {
                return Err(Error::InvalidPeriod {
                    days: period_length_days,
                });
            }
            let factor = DAYS_PER_MONTH / period_length_days;
            for link in &mut out.links {
                link.value *= factor;
            }
            tracing::debug!(factor, links = out.links.len(), "rescaled link values");
        }
    }
    Ok(out)
}

use std::fmt;
use std::str::FromStr;

use foundation::time::Timestamp;

/// Granularity at which trend timestamps are bucketed before counting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TimeResolution {
    /// Raw timestamp text; identical strings share a bucket.
    #[default]
    Exact,
    Day,
    Month,
}

impl TimeResolution {
    /// Maps a raw timestamp to its bucket key. `Exact` passes text through
    /// untouched (unparseable values are dropped later, at series build).
    pub fn bucket_key(self, raw: &str) -> Option<String> {
        match self {
            TimeResolution::Exact => {
                let raw = raw.trim();
                (!raw.is_empty()).then(|| raw.to_string())
            }
            TimeResolution::Day => Timestamp::parse(raw).map(|t| t.start_of_day().label()),
            TimeResolution::Month => Timestamp::parse(raw).map(|t| t.start_of_month().label()),
        }
    }
}

impl fmt::Display for TimeResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeResolution::Exact => "exact",
            TimeResolution::Day => "day",
            TimeResolution::Month => "month",
        })
    }
}

impl FromStr for TimeResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(TimeResolution::Exact),
            "day" => Ok(TimeResolution::Day),
            "month" => Ok(TimeResolution::Month),
            other => Err(format!("unknown time resolution: {other} (expected exact|day|month)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TimeResolution;

    #[test]
    fn day_and_month_truncate() {
        let raw = "03/14/2021 09:15:00 PM";
        assert_eq!(TimeResolution::Day.bucket_key(raw).as_deref(), Some("2021-03-14"));
        assert_eq!(TimeResolution::Month.bucket_key(raw).as_deref(), Some("2021-03-01"));
        assert_eq!(TimeResolution::Exact.bucket_key(raw).as_deref(), Some(raw));
        assert_eq!(TimeResolution::Day.bucket_key("never"), None);
        assert_eq!(TimeResolution::Exact.bucket_key("  "), None);
    }

    #[test]
    fn parses_from_config_text() {
        assert_eq!("Month".parse::<TimeResolution>(), Ok(TimeResolution::Month));
        assert!("hourly".parse::<TimeResolution>().is_err());
    }

    #[test]
    fn defaults_to_one_bucket_per_timestamp() {
        assert_eq!(TimeResolution::default(), TimeResolution::Exact);
        let a = TimeResolution::default().bucket_key("2020-01-01 10:00:00");
        let b = TimeResolution::default().bucket_key("2020-01-01 11:00:00");
        assert_ne!(a, b);
    }
}

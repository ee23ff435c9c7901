//! Severity scale used for filtering.
//!
//! Levels mirror the `syslog.h` numbering from `LOG_CRIT` downward: a lower
//! number is more urgent, and a message passes the threshold when its value is
//! less than or equal to the threshold's value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{Error, Result};

/// Message severity, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(i32)]
pub enum Severity {
    /// Critical messages only.
    Crit = 2,
    /// High importance.
    High = 3,
    /// Medium importance.
    #[default]
    Med = 4,
    /// Low importance.
    Low = 5,
    /// Informational.
    Info = 6,
    /// Debug output.
    Debug = 7,
}

impl Severity {
    /// Every level, most urgent first.
    pub const ALL: [Severity; 6] = [
        Severity::Crit,
        Severity::High,
        Severity::Med,
        Severity::Low,
        Severity::Info,
        Severity::Debug,
    ];

    /// Fixed 5-character code written into each log line.
    pub fn code(self) -> &'static str {
        match self {
            Severity::Crit => "CRIT_",
            Severity::High => "HIGH_",
            Severity::Med => "MED__",
            Severity::Low => "LOW__",
            Severity::Info => "INFO_",
            Severity::Debug => "DEBUG",
        }
    }

    /// Lowercase name, as accepted in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            Severity::Crit => "crit",
            Severity::High => "high",
            Severity::Med => "med",
            Severity::Low => "low",
            Severity::Info => "info",
            Severity::Debug => "debug",
        }
    }

    /// Numeric value on the syslog-like scale.
    pub fn level(self) -> i32 {
        self as i32
    }

    /// Whether a message at `self` is emitted under `threshold`.
    pub fn passes(self, threshold: Severity) -> bool {
        self.level() <= threshold.level()
    }
}

impl TryFrom<i32> for Severity {
    type Error = Error;

    fn try_from(level: i32) -> Result<Self> {
        Severity::ALL
            .into_iter()
            .find(|s| s.level() == level)
            .ok_or(Error::InvalidSeverity(level))
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(level) = trimmed.parse::<i32>() {
            return Severity::try_from(level);
        }
        let lower = trimmed.trim_end_matches('_').to_ascii_lowercase();
        match lower.as_str() {
            "crit" | "critical" => Ok(Severity::Crit),
            "high" => Ok(Severity::High),
            "med" | "medium" => Ok(Severity::Med),
            "low" => Ok(Severity::Low),
            "info" => Ok(Severity::Info),
            "debug" => Ok(Severity::Debug),
            _ => Err(Error::Config(format!("unknown severity: {}", s))),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Severity::High,
            tracing::Level::WARN => Severity::Med,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::TRACE => Severity::Debug,
        }
    }
}

impl Serialize for Severity {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum SeverityInput {
            Number(i64),
            Name(String),
        }

        match SeverityInput::deserialize(deserializer)? {
            SeverityInput::Number(n) => i32::try_from(n)
                .map_err(|_| de::Error::custom(format!("severity out of range: {}", n)))
                .and_then(|n| Severity::try_from(n).map_err(de::Error::custom)),
            SeverityInput::Name(name) => name.parse().map_err(de::Error::custom),
        }
    }
}

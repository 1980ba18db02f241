use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
    Lowest,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown priority: '{0}'")]
pub struct UnknownPriorityError(pub String);

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::Lowest,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
            Priority::Lowest => "LOWEST",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Priority::Critical => "Critical",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Lowest => "Lowest",
        }
    }

    pub fn parse(name: &str) -> Result<Priority, UnknownPriorityError> {
        let wanted = name.trim();
        if wanted.is_empty() {
            return Err(UnknownPriorityError(name.to_string()));
        }
        Priority::ALL
            .into_iter()
            .find(|p| p.display_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPriorityError(name.to_string()))
    }
}

impl FromStr for Priority {
    type Err = UnknownPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.code() == s)
            .ok_or_else(|| UnknownPriorityError(s.to_string()))
    }
}

impl core::fmt::Display for Priority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

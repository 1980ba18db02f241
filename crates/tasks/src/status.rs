use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Waiting,
    InProgress,
    InReview,
    Completed,
    Cancelled,
    OnHold,
    Rejected,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown status: '{0}'")]
pub struct UnknownStatusError(pub String);

impl Status {
    pub const ALL: [Status; 7] = [
        Status::Waiting,
        Status::InProgress,
        Status::InReview,
        Status::Completed,
        Status::Cancelled,
        Status::OnHold,
        Status::Rejected,
    ];

    /// Successor on the happy path `Waiting → InProgress → InReview → Completed`.
    ///
    /// Every state off that path, and `Completed` itself, maps to itself.
    pub const fn next_status(self) -> Status {
        match self {
            Status::Waiting => Status::InProgress,
            Status::InProgress => Status::InReview,
            Status::InReview => Status::Completed,
            Status::Completed | Status::Cancelled | Status::OnHold | Status::Rejected => self,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Status::Waiting => "WAITING",
            Status::InProgress => "IN_PROGRESS",
            Status::InReview => "IN_REVIEW",
            Status::Completed => "COMPLETED",
            Status::Cancelled => "CANCELLED",
            Status::OnHold => "ON_HOLD",
            Status::Rejected => "REJECTED",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Status::Waiting => "Waiting",
            Status::InProgress => "In progress",
            Status::InReview => "In review",
            Status::Completed => "Completed",
            Status::Cancelled => "Cancelled",
            Status::OnHold => "On hold",
            Status::Rejected => "Rejected",
        }
    }

    /// Parse a display name, case-insensitively.
    pub fn parse(name: &str) -> Result<Status, UnknownStatusError> {
        let wanted = name.trim();
        Status::ALL
            .into_iter()
            .find(|s| s.display_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownStatusError(name.to_string()))
    }
}

impl FromStr for Status {
    type Err = UnknownStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|st| st.code() == s)
            .ok_or_else(|| UnknownStatusError(s.to_string()))
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn happy_path_ends_in_completed() {
        let mut s = Status::default();
        let mut seen = vec![s];
        while s.next_status() != s {
            s = s.next_status();
            seen.push(s);
        }
        assert_eq!(
            seen,
            vec![Status::Waiting, Status::InProgress, Status::InReview, Status::Completed]
        );
    }

    #[test]
    fn off_path_states_are_self_loops() {
        for s in [Status::Completed, Status::Cancelled, Status::OnHold, Status::Rejected] {
            assert_eq!(s.next_status(), s);
        }
    }

    #[test]
    fn parse_by_display_name() {
        assert_eq!(Status::parse("in PROGRESS"), Ok(Status::InProgress));
        assert_eq!(Status::parse(" on hold "), Ok(Status::OnHold));
        assert!(Status::parse("IN_PROGRESS").is_err());
        assert!(Status::parse("").is_err());
    }

    #[test]
    fn serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Status::InReview).unwrap(), "\"IN_REVIEW\"");
        let s: Status = serde_json::from_str("\"ON_HOLD\"").unwrap();
        assert_eq!(s, Status::OnHold);
        assert_eq!("REJECTED".parse::<Status>(), Ok(Status::Rejected));
    }

    proptest! {
        /// Property: repeated advancing reaches a fixed point within three steps.
        #[test]
        fn advancing_converges(start in prop::sample::select(Status::ALL.to_vec())) {
            let fixed = start.next_status().next_status().next_status();
            prop_assert_eq!(fixed.next_status(), fixed);
        }
    }
}

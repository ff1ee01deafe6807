//! Extraction outcome, failure taxonomy and progress events
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an extraction produced no transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    /// Nothing transcript-like was discoverable after every fallback stage
    NotFound,
    /// A source was located but its text is below the minimum length
    EmptyOrRestricted,
    /// A caption fetch failed or returned a non-success status
    NetworkFailure,
    /// Structured data could not be parsed
    MalformedData,
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorReason::NotFound => "not found",
            ErrorReason::EmptyOrRestricted => "empty or restricted",
            ErrorReason::NetworkFailure => "network failure",
            ErrorReason::MalformedData => "malformed data",
        };
        f.write_str(name)
    }
}

/// Typed failure with a strategy-specific detail line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub reason: ErrorReason,
    pub detail: String,
}

impl Failure {
    pub fn new(reason: ErrorReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(ErrorReason::NotFound, detail)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.detail)
    }
}

/// Terminal result of one extraction attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Transcript(String),
    Error(Failure),
}

impl Outcome {
    pub fn failure(reason: ErrorReason, detail: impl Into<String>) -> Self {
        Outcome::Error(Failure::new(reason, detail))
    }

    pub fn is_transcript(&self) -> bool {
        matches!(self, Outcome::Transcript(_))
    }

    pub fn transcript(&self) -> Option<&str> {
        match self {
            Outcome::Transcript(text) => Some(text),
            Outcome::Error(_) => None,
        }
    }

    pub fn reason(&self) -> Option<ErrorReason> {
        match self {
            Outcome::Transcript(_) => None,
            Outcome::Error(failure) => Some(failure.reason),
        }
    }

    /// Short status line a UI shows for this outcome
    pub fn user_message(&self) -> &'static str {
        match self {
            Outcome::Transcript(_) => "Transcript copied",
            Outcome::Error(failure) => match failure.reason {
                ErrorReason::NotFound => "No transcript found",
                ErrorReason::EmptyOrRestricted => "Captions may be disabled for this video",
                ErrorReason::NetworkFailure => "Couldn't download captions",
                ErrorReason::MalformedData => "No transcript found",
            },
        }
    }
}

/// Progress notification for a waiting UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub message: String,
    pub emitted_at: DateTime<Utc>,
}

impl StatusEvent {
    pub const FETCHING_CAPTIONS: &'static str = "Fetching captions...";
    pub const CHECKING_STRUCTURED_DATA: &'static str = "Checking structured data...";
    pub const APPEARS_EMPTY: &'static str = "Transcript found but appears empty";

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            emitted_at: Utc::now(),
        }
    }
}

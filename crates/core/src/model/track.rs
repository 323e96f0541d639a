use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrackError {
    #[error("track name cannot be empty")]
    EmptyName,

    #[error("track name cannot contain whitespace: {0}")]
    Whitespace(String),
}

/// Subject area grouping an ordered lesson sequence (e.g. a programming language).
///
/// Normalized to a trimmed, lowercase key so `"Python"` and `"python"` share
/// lessons and progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Track(String);

impl Track {
    /// Create a validated track key.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::EmptyName` if the name is empty after trimming and
    /// `TrackError::Whitespace` if it contains inner whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TrackError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TrackError::EmptyName);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(TrackError::Whitespace(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-facing name for the track.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.0.as_str() {
            "javascript" => "JavaScript",
            "python" => "Python",
            "html" => "HTML/CSS",
            "react" => "React",
            "java" => "Java",
            "csharp" => "C#",
            other => other,
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Track {
    type Error = TrackError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Track::new(value)
    }
}

impl From<Track> for String {
    fn from(track: Track) -> Self {
        track.0
    }
}

impl std::str::FromStr for Track {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Track::new(s)
    }
}

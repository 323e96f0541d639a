use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::NotificationId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotificationError {
    #[error("notification title cannot be empty")]
    EmptyTitle,

    #[error("unknown notification kind: {0}")]
    UnknownKind(String),
}

/// Category of a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    System,
    Community,
    Achievement,
    Lesson,
    Opportunity,
    Message,
}

impl NotificationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Community => "community",
            Self::Achievement => "achievement",
            Self::Lesson => "lesson",
            Self::Opportunity => "opportunity",
            Self::Message => "message",
        }
    }

    /// Parse the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::UnknownKind` for unrecognized values.
    pub fn parse(value: &str) -> Result<Self, NotificationError> {
        match value {
            "system" => Ok(Self::System),
            "community" => Ok(Self::Community),
            "achievement" => Ok(Self::Achievement),
            "lesson" => Ok(Self::Lesson),
            "opportunity" => Ok(Self::Opportunity),
            "message" => Ok(Self::Message),
            other => Err(NotificationError::UnknownKind(other.to_string())),
        }
    }

    /// Icon hint for renderers.
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::System => "cog",
            Self::Community => "users",
            Self::Achievement => "trophy",
            Self::Lesson => "graduation-cap",
            Self::Opportunity => "briefcase",
            Self::Message => "envelope",
        }
    }
}

/// A notification that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    kind: NotificationKind,
    title: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl NotificationDraft {
    /// # Errors
    ///
    /// Returns `NotificationError::EmptyTitle` if the title is blank.
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, NotificationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(NotificationError::EmptyTitle);
        }
        Ok(Self {
            kind,
            title,
            message: message.into(),
            created_at,
        })
    }

    #[must_use]
    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn assign_id(self, id: NotificationId) -> Notification {
        Notification {
            id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            read: false,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Feed tabs. `Community` also shows achievements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationFilter {
    #[default]
    All,
    Unread,
    System,
    Community,
}

impl NotificationFilter {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Unread => "unread",
            Self::System => "system",
            Self::Community => "community",
        }
    }

    #[must_use]
    pub fn matches(self, notification: &Notification) -> bool {
        match self {
            Self::All => true,
            Self::Unread => !notification.read,
            Self::System => notification.kind == NotificationKind::System,
            Self::Community => matches!(
                notification.kind,
                NotificationKind::Community | NotificationKind::Achievement
            ),
        }
    }
}

impl std::str::FromStr for NotificationFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(Self::All),
            "unread" => Ok(Self::Unread),
            "system" => Ok(Self::System),
            "community" => Ok(Self::Community),
            other => Err(format!("unknown notification filter: {other}")),
        }
    }
}

const WELCOME: [(NotificationKind, &str, &str); 3] = [
    (
        NotificationKind::System,
        "Welcome aboard!",
        "Congratulations on joining the community. Explore opportunities and connect with other women in tech.",
    ),
    (
        NotificationKind::Community,
        "Explore the learning area",
        "Take quizzes and earn XP across several programming languages in the Learn section.",
    ),
    (
        NotificationKind::System,
        "Complete your profile",
        "Add your skills and a short bio so the community can get to know you.",
    ),
];

/// Starter notifications for a learner's first visit to the feed.
#[must_use]
pub fn welcome_notifications(created_at: DateTime<Utc>) -> Vec<NotificationDraft> {
    WELCOME
        .iter()
        .map(|(kind, title, message)| NotificationDraft {
            kind: *kind,
            title: (*title).to_string(),
            message: (*message).to_string(),
            created_at,
        })
        .collect()
}

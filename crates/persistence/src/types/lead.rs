//! Contact-form leads.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A stored contact-form submission. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Unique within the site's partition.
    pub id: String,
    /// Submitter's name.
    pub name: String,
    /// Submitter's email address.
    pub email: String,
    /// Free-text message.
    pub message: String,
    /// When the store accepted the submission.
    pub created_at: DateTime<Utc>,
}

impl Lead {
    /// Builds a lead from a submission with a fresh UUID and the current time,
    /// truncated to microseconds so every backend stores it unchanged.
    pub fn from_submission(submission: NewLead) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: submission.name,
            email: submission.email,
            message: submission.message,
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}

/// A public form submission before the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
    /// Submitter's name. Required.
    pub name: String,
    /// Submitter's email address. Required.
    pub email: String,
    /// Optional message body.
    #[serde(default)]
    pub message: String,
}

impl NewLead {
    /// Creates a submission.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }
}

//! Direct grants of items to subjects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted direct grant of an item to a subject.
///
/// Identity is the `(subject_id, item_name)` pair; there is no surrogate key.
///
/// # Examples
///
/// ```
/// use access_rbac::Assignment;
///
/// let a = Assignment::new("u1", "admin").with_creator("root");
/// assert_eq!(a.key(), ("u1", "admin"));
/// assert_eq!(a.created_by.as_deref(), Some("root"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    /// Assignee, e.g. a user id.
    pub subject_id: String,

    /// Role or permission name.
    pub item_name: String,

    /// When the grant was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Optional identifier of the granting actor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl Assignment {
    /// Create an assignment stamped with the current time.
    pub fn new(subject_id: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            item_name: item_name.into(),
            created_at: Utc::now(),
            created_by: None,
        }
    }

    /// Record the granting actor.
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.created_by = Some(creator.into());
        self
    }

    /// The `(subject_id, item_name)` identity.
    pub fn key(&self) -> (&str, &str) {
        (&self.subject_id, &self.item_name)
    }

    /// Check if this assignment is for the given pair.
    pub fn matches(&self, subject_id: &str, item_name: &str) -> bool {
        self.subject_id == subject_id && self.item_name == item_name
    }
}

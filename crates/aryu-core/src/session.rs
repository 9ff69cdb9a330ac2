//! Authenticated session snapshot.
//!
//! The portal persists `{ token, loginType, user: { id, permissions } }`
//! after login. [`SessionContext`] is the typed form of that blob. It is
//! read once and injected into whatever needs the user's identity, instead
//! of every component re-reading shared storage on its own.

use std::{collections::BTreeSet, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Which portal the user signed in to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginType {
    /// Staff and administrators.
    Admin,
    /// Tutors.
    Tutor,
    /// Learners.
    Student,
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend user id.
    pub id: u64,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Permission codenames granted to the user.
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

/// Auth snapshot injected at application root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    /// Bearer credential for HTTP and socket query strings.
    pub token: String,
    /// Portal the user signed in to.
    pub login_type: LoginType,
    /// The user.
    pub user: UserProfile,
}

impl SessionContext {
    /// Parse the persisted session blob.
    pub fn from_json(raw: &str) -> Result<Self, SessionError> {
        let session: Self = serde_json::from_str(raw)?;
        if session.token.trim().is_empty() {
            return Err(SessionError::MissingToken);
        }
        Ok(session)
    }

    /// Read the persisted session blob from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let session = Self::from_json(&raw)?;
        tracing::debug!(user_id = session.user.id, login_type = ?session.login_type, "session loaded");
        Ok(session)
    }

    /// Signed-in user id.
    pub fn user_id(&self) -> u64 {
        self.user.id
    }

    /// True for the admin portal.
    pub fn is_admin(&self) -> bool {
        self.login_type == LoginType::Admin
    }

    /// True if the user holds the permission codename.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.user.permissions.contains(permission)
    }

    /// True if the user may drive a live quiz: an admin, or anyone holding
    /// the `quiz.start` permission.
    pub fn can_start_quiz(&self) -> bool {
        self.is_admin() || self.has_permission("quiz.start")
    }
}

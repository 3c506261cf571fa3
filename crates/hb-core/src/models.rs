//! # Domain Models
//!
//! These structs represent the core entities of Hushbox.
//! We use UUID v7 for time-ordered, globally unique identification.
//! Field names serialize as camelCase to match the dashboard's JSON contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role claim every admin session token must carry.
pub const ADMIN_ROLE: &str = "admin";

/// Role the external identity provider must grant before the token is even looked at.
pub const EXTERNAL_ROLE: &str = "confess";

/// Default author recorded on archive entries.
pub const DEFAULT_ARCHIVER: &str = "admin";

/// A single anonymous submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confession {
    pub id: Uuid,
    /// HTML-entity-escaped at rest; decode before display.
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    pub ip_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Confession {
    /// Builds a fresh, unread confession from already-sanitized content.
    pub fn new(content: String, ip_address: String, user_agent: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            content,
            created_at: Utc::now(),
            is_read: false,
            ip_address,
            user_agent,
        }
    }
}

/// A confession moved out of the active list by an admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedConfession {
    /// The confession as it looked when it was archived. Its `id` is the original id.
    #[serde(flatten)]
    pub confession: Confession,
    pub original_id: Uuid,
    pub archived_at: DateTime<Utc>,
    pub archived_by: String,
}

impl ArchivedConfession {
    pub fn from_confession(confession: Confession, archived_by: impl Into<String>) -> Self {
        Self {
            original_id: confession.id,
            confession,
            archived_at: Utc::now(),
            archived_by: archived_by.into(),
        }
    }

    /// Hands back the confession so it can rejoin the active list.
    pub fn restore(self) -> Confession {
        self.confession
    }
}

/// An IP address that may no longer submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannedIp {
    /// Stored as string to support IPv4/v6 alike
    pub ip: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate counters shown on the dashboard.
///
/// Signed: the dashboard applies deltas locally and a repeated `mark_read`
/// may push `unread` below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: i64,
    pub unread: i64,
    pub today: i64,
}

/// Claims embedded in a signed admin session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub username: String,
    pub role: String,
    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,
    /// Expiry (Unix timestamp, seconds).
    pub exp: i64,
}

/// The identity an authenticated request acts as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub username: String,
    pub role: String,
}

impl From<AdminClaims> for AdminIdentity {
    fn from(claims: AdminClaims) -> Self {
        Self {
            username: claims.username,
            role: claims.role,
        }
    }
}

//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AuthError;
use crate::models::{AdminClaims, ArchivedConfession, Confession, Stats};

/// Data persistence contract for confessions and their archive.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ConfessionRepo: Send + Sync {
    // Active confessions
    async fn create_confession(&self, confession: Confession) -> anyhow::Result<()>;
    /// Newest first.
    async fn list_confessions(&self) -> anyhow::Result<Vec<Confession>>;
    async fn get_confession(&self, id: Uuid) -> anyhow::Result<Option<Confession>>;
    /// Returns the updated confession, or `None` when the id is unknown.
    async fn set_read(&self, id: Uuid, is_read: bool) -> anyhow::Result<Option<Confession>>;
    /// Returns `false` when nothing was deleted.
    async fn delete_confession(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Bulk delete; returns the number of rows removed.
    async fn delete_by_ip(&self, ip: &str) -> anyhow::Result<u64>;
    /// Counters over the active list; `today` counts rows created at or after `day_start`.
    async fn stats(&self, day_start: DateTime<Utc>) -> anyhow::Result<Stats>;

    // Archive
    /// Moves a confession into the archive atomically. `None` when the id is unknown.
    async fn archive_confession(
        &self,
        id: Uuid,
        archived_by: &str,
    ) -> anyhow::Result<Option<ArchivedConfession>>;
    /// Moves an archive entry back to the active list. `None` when the id is unknown.
    async fn unarchive_confession(&self, id: Uuid) -> anyhow::Result<Option<Confession>>;
    /// Most recently archived first.
    async fn list_archived(&self) -> anyhow::Result<Vec<ArchivedConfession>>;
    async fn delete_archived(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// IP ban list.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BanRepo: Send + Sync {
    /// Returns `false` if the IP was already banned.
    async fn ban_ip(&self, ip: &str) -> anyhow::Result<bool>;
    async fn is_banned(&self, ip: &str) -> anyhow::Result<bool>;
}

/// Credential store and session-token signer.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verifies staff/admin credentials
    async fn verify_admin_credentials(&self, username: &str, password: &str) -> bool;

    /// Issues a signed token carrying the admin role for `username`.
    fn issue_token(&self, username: &str) -> anyhow::Result<String>;

    /// Verifies signature and expiry. Role checking is left to the caller.
    fn decode_token(&self, token: &str) -> Result<AdminClaims, AuthError>;
}

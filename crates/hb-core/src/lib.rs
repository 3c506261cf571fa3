//! hushbox/crates/hb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Hushbox:
//! submission checks, entity escaping, admin session checks and the
//! dashboard's moderation state.

pub mod auth;
pub mod error;
pub mod models;
pub mod moderation;
pub mod sanitize;
pub mod threat;
pub mod traits;
pub mod validate;

// Re-exporting for easier access in other crates
pub use auth::*;
pub use error::*;
pub use models::*;
pub use moderation::{FilterMode, ModerationBoard};
pub use traits::*;
pub use validate::{SubmissionPolicy, DEFAULT_MAX_LENGTH};

#[cfg(test)]
mod tests {
    use super::*;

    /// The whole submission path: check, escape, store, decode for display.
    #[test]
    fn accepted_submission_round_trips_to_display() {
        let policy = SubmissionPolicy::default();
        let text = "I left my job today.";

        policy.validate(text).unwrap();
        let stored = sanitize::sanitize(text);
        assert_eq!(stored, text);

        let confession = Confession::new(stored, "127.0.0.1".into(), None);
        let board = ModerationBoard::load(
            vec![confession],
            Stats {
                total: 1,
                unread: 1,
                today: 1,
            },
        );
        assert_eq!(board.active()[0].content, "I left my job today.");
        assert!(!board.active()[0].is_read);
    }

    #[test]
    fn script_submission_is_refused_before_escaping() {
        let err = SubmissionPolicy::default()
            .validate("Hello <script>alert(1)</script>")
            .unwrap_err();
        assert_eq!(err, ValidationError::UnsafeContent);
    }

    #[test]
    fn confession_serializes_camel_case() {
        let c = Confession::new("x".into(), "1.2.3.4".into(), Some("curl".into()));
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["isRead"], false);
        assert_eq!(json["ipAddress"], "1.2.3.4");
        assert_eq!(json["userAgent"], "curl");
        assert!(json.get("createdAt").is_some());
    }
}

//! Single-owner access gate.
//!
//! Compares the inbound sender identifier against the configured owner by
//! exact equality. No allowlists, no lockout, no attempt tracking.

/// Access policy over one configured owner identifier.
#[derive(Debug, Clone, Copy)]
pub struct AccessGate {
    owner_id: Option<i64>,
}

impl AccessGate {
    /// Gate over the configured owner; `None` disables gating entirely.
    #[must_use]
    pub const fn new(owner_id: Option<i64>) -> Self {
        Self { owner_id }
    }

    /// Whether an owner is configured at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.owner_id.is_some()
    }

    /// Whether this sender may be processed.
    #[must_use]
    pub fn permits(&self, user_id: i64) -> bool {
        self.owner_id.map_or(true, |owner| owner == user_id)
    }

    /// Fixed denial text embedding the rejected identifier.
    #[must_use]
    pub fn denial_message(user_id: i64) -> String {
        format!("🚫 Acceso denegado. Este bot es privado, carnal. (ID: {user_id})")
    }
}

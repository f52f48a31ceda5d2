use std::fmt;

/// Status of a ledger record keyed by a content-derived identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RecordStatus {
    /// No record exists under this key.
    Unregistered,
    /// Registered and not revoked.
    Active,
    /// Revoked. Final for credentials; consents may be reactivated.
    Revoked,
}

impl RecordStatus {
    /// Derive the status from a record's flags.
    pub fn from_flags(is_registered: bool, is_revoked: bool) -> Self {
        match (is_registered, is_revoked) {
            (false, _) => Self::Unregistered,
            (true, false) => Self::Active,
            (true, true) => Self::Revoked,
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unregistered => write!(f, "Unregistered"),
            Self::Active => write!(f, "Active"),
            Self::Revoked => write!(f, "Revoked"),
        }
    }
}

/// Events that drive a record through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// First write under a key.
    Register,
    /// Mark an active record revoked.
    Revoke,
    /// Clear the revocation of a record (consent only).
    Reactivate,
}

/// Why a lifecycle transition was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleViolation {
    #[error("record is already registered")]
    AlreadyRegistered,
    #[error("record is not registered")]
    NotRegistered,
    #[error("record is already revoked")]
    AlreadyRevoked,
    #[error("record is not revoked")]
    NotRevoked,
}

/// Transition table shared by the credential and consent ledgers.
///
/// Valid transitions:
/// - Unregistered → Active (Register)
/// - Active → Revoked (Revoke)
/// - Revoked → Active (Reactivate)
pub struct RecordLifecycle;

impl RecordLifecycle {
    /// Attempt a transition. Returns the new status or the violated rule.
    pub fn transition(
        current: RecordStatus,
        event: LifecycleEvent,
    ) -> Result<RecordStatus, LifecycleViolation> {
        let next = match (current, event) {
            (RecordStatus::Unregistered, LifecycleEvent::Register) => RecordStatus::Active,
            (_, LifecycleEvent::Register) => return Err(LifecycleViolation::AlreadyRegistered),

            (RecordStatus::Active, LifecycleEvent::Revoke) => RecordStatus::Revoked,
            (RecordStatus::Revoked, LifecycleEvent::Revoke) => {
                return Err(LifecycleViolation::AlreadyRevoked)
            }
            (RecordStatus::Unregistered, LifecycleEvent::Revoke) => {
                return Err(LifecycleViolation::NotRegistered)
            }

            (RecordStatus::Revoked, LifecycleEvent::Reactivate) => RecordStatus::Active,
            (RecordStatus::Unregistered, LifecycleEvent::Reactivate) => {
                return Err(LifecycleViolation::NotRegistered)
            }
            (RecordStatus::Active, LifecycleEvent::Reactivate) => {
                return Err(LifecycleViolation::NotRevoked)
            }
        };

        tracing::trace!(from = %current, to = %next, event = ?event, "record transition");
        Ok(next)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: RecordStatus, event: LifecycleEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}

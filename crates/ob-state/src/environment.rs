//! # Publication Environment
//!
//! An environment is a delivery target (pre-production, production, a local
//! sandbox). Stateful environments track a chain of consolidated states:
//!
//! ```text
//! state A (active) ◀── adjust_on ── state B (created by package, pending)
//! ```
//!
//! While a publication package is pending the environment is locked. A valid
//! report activates the new state and unlocks; a failed report or an abort
//! unlocks without moving the chain forward.
//!
//! Stateless environments never lock and never hold a state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ob_core::{EnvironmentId, StateId};

#[derive(Error, Debug, PartialEq)]
pub enum EnvironmentError {
    #[error("Environment is locked")]
    Locked,

    #[error("Environment is not active")]
    Inactive,

    #[error("environment {0} does not track state")]
    Stateless(EnvironmentId),

    /// The new state was computed against a different predecessor.
    #[error("state chain mismatch: expected adjust_on {expected:?}, got {actual:?}")]
    ChainMismatch {
        expected: Option<StateId>,
        actual: Option<StateId>,
    },

    #[error("state {0} is not the active state of the environment")]
    NotActiveState(StateId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub id: EnvironmentId,
    pub title: String,
    pub description: String,
    pub code: Option<String>,
    pub province_id: String,
    pub authority_id: String,
    pub submitter_id: String,
    pub governing_body_type: String,
    pub frbr_country: String,
    pub frbr_language: String,
    pub has_state: bool,
    pub can_validate: bool,
    pub can_publicate: bool,
    pub is_active: bool,
    pub is_locked: bool,
    pub active_state: Option<StateId>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Environment {
    pub fn new(title: impl Into<String>, province_id: impl Into<String>, has_state: bool) -> Self {
        let now = Utc::now();
        Self {
            id: EnvironmentId::new(),
            title: title.into(),
            description: String::new(),
            code: None,
            province_id: province_id.into(),
            authority_id: String::new(),
            submitter_id: String::new(),
            governing_body_type: "provinciale_staten".to_string(),
            frbr_country: "nl".to_string(),
            frbr_language: "nld".to_string(),
            has_state,
            can_validate: true,
            can_publicate: true,
            is_active: true,
            is_locked: false,
            active_state: None,
            created_at: now,
            modified_at: now,
        }
    }

    /// Reject work on a locked or inactive environment.
    pub fn guard_unlocked(&self) -> Result<(), EnvironmentError> {
        if !self.is_active {
            return Err(EnvironmentError::Inactive);
        }
        if self.is_locked {
            return Err(EnvironmentError::Locked);
        }
        Ok(())
    }

    pub fn lock(&mut self) -> Result<(), EnvironmentError> {
        if !self.has_state {
            return Err(EnvironmentError::Stateless(self.id));
        }
        self.guard_unlocked()?;
        self.is_locked = true;
        self.touch();
        Ok(())
    }

    /// Unlocking an unlocked environment is a no-op.
    pub fn unlock(&mut self) {
        self.is_locked = false;
        self.touch();
    }

    /// Verify a new state was built on top of the current active state.
    pub fn chain_state(&self, adjust_on: Option<StateId>) -> Result<(), EnvironmentError> {
        if !self.has_state {
            return Err(EnvironmentError::Stateless(self.id));
        }
        if adjust_on != self.active_state {
            return Err(EnvironmentError::ChainMismatch {
                expected: self.active_state,
                actual: adjust_on,
            });
        }
        Ok(())
    }

    /// Make `state` the active state and release the lock.
    pub fn activate_state(
        &mut self,
        state: StateId,
        adjust_on: Option<StateId>,
    ) -> Result<(), EnvironmentError> {
        self.chain_state(adjust_on)?;
        self.active_state = Some(state);
        self.unlock();
        Ok(())
    }

    /// Undo the activation of `created`, restoring its predecessor. The lock
    /// belongs to whichever package is in flight and is left alone.
    pub fn rollback_to(
        &mut self,
        created: StateId,
        previous: Option<StateId>,
    ) -> Result<(), EnvironmentError> {
        if self.active_state != Some(created) {
            return Err(EnvironmentError::NotActiveState(created));
        }
        self.active_state = previous;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stateful() -> Environment {
        Environment::new("Pre-productie", "pv28", true)
    }

    #[test]
    fn lock_blocks_second_lock() {
        let mut env = stateful();
        env.lock().unwrap();
        assert_eq!(env.lock(), Err(EnvironmentError::Locked));
        env.unlock();
        env.lock().unwrap();
    }

    #[test]
    fn stateless_environment_never_locks() {
        let mut env = Environment::new("Lokaal", "pv28", false);
        assert!(matches!(env.lock(), Err(EnvironmentError::Stateless(_))));
        assert!(!env.is_locked);
    }

    #[test]
    fn inactive_environment_is_guarded() {
        let mut env = stateful();
        env.is_active = false;
        assert_eq!(env.guard_unlocked(), Err(EnvironmentError::Inactive));
    }

    #[test]
    fn first_state_chains_on_nothing() {
        let mut env = stateful();
        let first = StateId::new();
        env.lock().unwrap();
        env.activate_state(first, None).unwrap();
        assert_eq!(env.active_state, Some(first));
        assert!(!env.is_locked);
    }

    #[test]
    fn chain_mismatch_is_rejected() {
        let mut env = stateful();
        let first = StateId::new();
        env.activate_state(first, None).unwrap();

        let stale = StateId::new();
        let err = env.activate_state(StateId::new(), Some(stale)).unwrap_err();
        assert_eq!(
            err,
            EnvironmentError::ChainMismatch {
                expected: Some(first),
                actual: Some(stale),
            }
        );
        assert_eq!(env.active_state, Some(first));
    }

    #[test]
    fn rollback_restores_predecessor() {
        let mut env = stateful();
        let first = StateId::new();
        let second = StateId::new();
        env.activate_state(first, None).unwrap();
        env.activate_state(second, Some(first)).unwrap();

        assert!(env.rollback_to(first, None).is_err());
        env.rollback_to(second, Some(first)).unwrap();
        assert_eq!(env.active_state, Some(first));
    }

    #[test]
    fn rollback_keeps_lock_of_pending_package() {
        let mut env = stateful();
        let first = StateId::new();
        env.activate_state(first, None).unwrap();
        env.lock().unwrap();

        env.rollback_to(first, None).unwrap();
        assert_eq!(env.active_state, None);
        assert!(env.is_locked);
    }
}

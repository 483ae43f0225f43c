//! Recording session state machine

use std::fmt;
use thiserror::Error;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: &'static str,
}

/// Session lifecycle entity.
///
/// State machine:
///   IDLE -> RECORDING (begin)
///   RECORDING -> IDLE (finish)
#[derive(Debug, Default)]
pub struct SessionLifecycle {
    state: SessionState,
}

impl SessionLifecycle {
    /// Create a new lifecycle in idle state
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// Check that `begin` would be accepted, without transitioning
    pub fn ensure_can_begin(&self) -> Result<(), InvalidStateTransition> {
        self.expect(SessionState::Idle, "start recording")
    }

    /// Check that `finish` would be accepted, without transitioning
    pub fn ensure_can_finish(&self) -> Result<(), InvalidStateTransition> {
        self.expect(SessionState::Recording, "stop recording")
    }

    /// Transition from IDLE to RECORDING
    pub fn begin(&mut self) -> Result<(), InvalidStateTransition> {
        self.ensure_can_begin()?;
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Transition from RECORDING to IDLE
    pub fn finish(&mut self) -> Result<(), InvalidStateTransition> {
        self.ensure_can_finish()?;
        self.state = SessionState::Idle;
        Ok(())
    }

    fn expect(
        &self,
        required: SessionState,
        action: &'static str,
    ) -> Result<(), InvalidStateTransition> {
        if self.state != required {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action,
            });
        }
        Ok(())
    }
}

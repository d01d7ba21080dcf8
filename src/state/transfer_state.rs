use crate::{Result, SpindleError};
use std::fmt;

/// Represents the current state of one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Created and waiting for a concurrency slot
    Queued,

    /// Request issued, response not fully received
    InFlight,

    /// Response completed with a 2xx status
    Succeeded,

    /// Transport error, non-2xx status, or abandoned
    Failed,
}

impl TransferState {
    /// Returns true if the transfer needs no further processing
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if the transfer still counts towards a session's work
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn can_transition_to(&self, next: TransferState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::InFlight)
                | (Self::Queued, Self::Failed)
                | (Self::InFlight, Self::Succeeded)
                | (Self::InFlight, Self::Failed)
        )
    }

    /// Moves to `next`, rejecting transitions the lifecycle does not allow
    pub fn transition(&mut self, next: TransferState) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(SpindleError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InFlight => "in_flight",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!TransferState::Queued.is_terminal());
        assert!(!TransferState::InFlight.is_terminal());
        assert!(TransferState::Succeeded.is_terminal());
        assert!(TransferState::Failed.is_terminal());

        assert!(TransferState::Queued.is_active());
        assert!(!TransferState::Failed.is_active());
    }

    #[test]
    fn test_happy_path() {
        let mut state = TransferState::Queued;
        state.transition(TransferState::InFlight).unwrap();
        state.transition(TransferState::Succeeded).unwrap();
        assert_eq!(state, TransferState::Succeeded);
    }

    #[test]
    fn test_queued_can_be_abandoned() {
        let mut state = TransferState::Queued;
        state.transition(TransferState::Failed).unwrap();
        assert_eq!(state, TransferState::Failed);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut state = TransferState::Queued;
        let err = state.transition(TransferState::Succeeded).unwrap_err();
        assert!(matches!(
            err,
            SpindleError::InvalidTransition {
                from: TransferState::Queued,
                to: TransferState::Succeeded
            }
        ));
        assert_eq!(state, TransferState::Queued);

        let mut done = TransferState::Succeeded;
        assert!(done.transition(TransferState::InFlight).is_err());
        assert!(done.transition(TransferState::Failed).is_err());

        let mut failed = TransferState::Failed;
        assert!(failed.transition(TransferState::Queued).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferState::InFlight.to_string(), "in_flight");
        assert_eq!(format!("{}", TransferState::Succeeded), "succeeded");
    }
}

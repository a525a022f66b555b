//! Per-kind generation state machine.

use std::fmt;

use crate::TransformKind;

/// Progress of one transformation.
///
/// ```text
/// NotStarted -> SpecResolved -> TargetReady -> DocumentReady -> Transformed -> Written
///                                   \-> Skipped
/// any non-terminal state -> Aborted
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationState {
    NotStarted,
    SpecResolved,
    TargetReady,
    DocumentReady,
    Transformed,
    Written,
    /// The artifact does not apply to this model.
    Skipped,
    Aborted { error: String },
}

impl GenerationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Written | Self::Skipped | Self::Aborted { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written | Self::Skipped)
    }

    pub fn can_transition_to(&self, next: &GenerationState) -> bool {
        use GenerationState::*;

        match (self, next) {
            (from, Aborted { .. }) => !from.is_terminal(),
            (NotStarted, SpecResolved)
            | (SpecResolved, TargetReady)
            | (TargetReady, DocumentReady)
            | (TargetReady, Skipped)
            | (DocumentReady, Transformed)
            | (Transformed, Written) => true,
            _ => false,
        }
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("not started"),
            Self::SpecResolved => f.write_str("spec resolved"),
            Self::TargetReady => f.write_str("target ready"),
            Self::DocumentReady => f.write_str("document ready"),
            Self::Transformed => f.write_str("transformed"),
            Self::Written => f.write_str("written"),
            Self::Skipped => f.write_str("skipped"),
            Self::Aborted { error } => write!(f, "aborted: {error}"),
        }
    }
}

/// State of one kind plus the states it went through.
#[derive(Debug, Clone)]
pub struct StateMachine {
    kind: TransformKind,
    state: GenerationState,
    history: Vec<GenerationState>,
}

impl StateMachine {
    pub fn new(kind: TransformKind) -> Self {
        Self {
            kind,
            state: GenerationState::NotStarted,
            history: vec![GenerationState::NotStarted],
        }
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    /// Every state entered so far, starting with `NotStarted`.
    pub fn history(&self) -> &[GenerationState] {
        &self.history
    }

    pub fn advance(&mut self, next: GenerationState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(kind = %self.kind, from = %self.state, to = %next, "generation state");
        self.history.push(next.clone());
        self.state = next;
    }

    pub fn abort(&mut self, error: impl fmt::Display) {
        self.advance(GenerationState::Aborted {
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut machine = StateMachine::new(TransformKind::InterfaceDefinition);
        for next in [
            GenerationState::SpecResolved,
            GenerationState::TargetReady,
            GenerationState::DocumentReady,
            GenerationState::Transformed,
            GenerationState::Written,
        ] {
            machine.advance(next);
        }

        assert_eq!(machine.history().len(), 6);
        assert!(machine.state().is_terminal());
        assert!(machine.state().is_success());
    }

    #[test]
    fn test_abort_from_non_terminal_only() {
        let aborted = GenerationState::Aborted {
            error: "boom".to_string(),
        };
        assert!(GenerationState::NotStarted.can_transition_to(&aborted));
        assert!(GenerationState::Transformed.can_transition_to(&aborted));
        assert!(!GenerationState::Written.can_transition_to(&aborted));
        assert!(!GenerationState::Skipped.can_transition_to(&aborted));
        assert!(!aborted.can_transition_to(&aborted));
    }

    #[test]
    fn test_skip_only_after_target() {
        assert!(GenerationState::TargetReady.can_transition_to(&GenerationState::Skipped));
        assert!(!GenerationState::DocumentReady.can_transition_to(&GenerationState::Skipped));
        assert!(!GenerationState::NotStarted.can_transition_to(&GenerationState::Written));
    }

    #[test]
    fn test_abort_records_message() {
        let mut machine = StateMachine::new(TransformKind::ResolvedModel);
        machine.advance(GenerationState::SpecResolved);
        machine.abort("target is a file");

        assert_eq!(
            machine.state().to_string(),
            "aborted: target is a file"
        );
        assert!(!machine.state().is_success());
    }
}

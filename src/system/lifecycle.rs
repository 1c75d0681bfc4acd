//! CLI launch phases.
//!
//! The CLI path walks a fixed sequence of phases. Each step may only move to
//! its direct successor; the exit handler may fire from anywhere.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliPhase {
    Unstarted,
    StreamsBound,
    ConsoleModeApplied,
    EnvironmentProbed,
    WindowCreatedHidden,
    FocusRestored,
    EventLoopRunning,
    ExitHandlerFired,
}

impl CliPhase {
    /// The only phase a normal transition may move to
    pub fn successor(self) -> Option<CliPhase> {
        use CliPhase::*;
        match self {
            Unstarted => Some(StreamsBound),
            StreamsBound => Some(ConsoleModeApplied),
            ConsoleModeApplied => Some(EnvironmentProbed),
            EnvironmentProbed => Some(WindowCreatedHidden),
            WindowCreatedHidden => Some(FocusRestored),
            FocusRestored => Some(EventLoopRunning),
            EventLoopRunning => Some(ExitHandlerFired),
            ExitHandlerFired => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid launch transition {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: CliPhase,
    pub to: CliPhase,
}

#[derive(Debug)]
pub struct Lifecycle {
    history: Vec<CliPhase>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            history: vec![CliPhase::Unstarted],
        }
    }

    pub fn phase(&self) -> CliPhase {
        self.history.last().copied().unwrap_or(CliPhase::Unstarted)
    }

    /// Every phase entered so far, starting with `Unstarted`
    pub fn history(&self) -> &[CliPhase] {
        &self.history
    }

    pub fn advance(&mut self, to: CliPhase) -> Result<(), TransitionError> {
        let from = self.phase();
        // ExitHandlerFired is only entered through `fire_exit`
        if to == CliPhase::ExitHandlerFired || from.successor() != Some(to) {
            return Err(TransitionError { from, to });
        }
        self.history.push(to);
        Ok(())
    }

    /// Enter `ExitHandlerFired` from any phase. Returns the phase that was
    /// active when the exit happened, or `None` if it already fired.
    pub fn fire_exit(&mut self) -> Option<CliPhase> {
        let from = self.phase();
        if from == CliPhase::ExitHandlerFired {
            return None;
        }
        self.history.push(CliPhase::ExitHandlerFired);
        Some(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CliPhase::*;

    #[test]
    fn test_full_sequence() {
        let mut lifecycle = Lifecycle::new();
        for phase in [
            StreamsBound,
            ConsoleModeApplied,
            EnvironmentProbed,
            WindowCreatedHidden,
            FocusRestored,
            EventLoopRunning,
        ] {
            lifecycle.advance(phase).unwrap();
        }
        assert_eq!(lifecycle.fire_exit(), Some(EventLoopRunning));
        assert_eq!(lifecycle.phase(), ExitHandlerFired);
        assert_eq!(lifecycle.history().len(), 8);
    }

    #[test]
    fn test_skipping_is_rejected() {
        let mut lifecycle = Lifecycle::new();
        let err = lifecycle.advance(ConsoleModeApplied).unwrap_err();
        assert_eq!(
            err,
            TransitionError {
                from: Unstarted,
                to: ConsoleModeApplied
            }
        );
        assert_eq!(lifecycle.phase(), Unstarted);
    }

    #[test]
    fn test_going_back_is_rejected() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(StreamsBound).unwrap();
        assert!(lifecycle.advance(StreamsBound).is_err());
        assert!(lifecycle.advance(Unstarted).is_err());
    }

    #[test]
    fn test_exit_reachable_from_any_phase() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.fire_exit(), Some(Unstarted));

        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(StreamsBound).unwrap();
        lifecycle.advance(ConsoleModeApplied).unwrap();
        assert_eq!(lifecycle.fire_exit(), Some(ConsoleModeApplied));
    }

    #[test]
    fn test_exit_fires_once_and_is_terminal() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.fire_exit();
        assert_eq!(lifecycle.fire_exit(), None);
        assert!(lifecycle.advance(StreamsBound).is_err());
    }

    #[test]
    fn test_exit_cannot_be_advanced_into() {
        let mut lifecycle = Lifecycle::new();
        for phase in [
            StreamsBound,
            ConsoleModeApplied,
            EnvironmentProbed,
            WindowCreatedHidden,
            FocusRestored,
            EventLoopRunning,
        ] {
            lifecycle.advance(phase).unwrap();
        }
        assert!(lifecycle.advance(ExitHandlerFired).is_err());
    }
}

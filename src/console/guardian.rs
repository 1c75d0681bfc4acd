//! Console input mode guardian.
//!
//! Holds the snapshot of the console input flags taken before the bootstrap
//! changes them, and writes it back exactly once. Clones share the same
//! snapshot, so a clone can live inside an exit hook while the bootstrap
//! keeps using the original.

use super::ConsoleEnvironment;
use std::sync::{Arc, Mutex, MutexGuard};

const TARGET: &str = "localnode::console";

/// Result of [`ConsoleModeGuardian::capture`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Captured,
    /// A snapshot is already held; it was left untouched
    AlreadyHeld,
    /// The input flags could not be read (usually no console)
    Unavailable,
}

/// Result of [`ConsoleModeGuardian::apply_interactive`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    Applied,
    /// Flags were already interactive
    Unchanged,
    /// Refused because no snapshot is held
    NotCaptured,
    Failed,
}

/// Result of [`ConsoleModeGuardian::restore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStatus {
    Restored,
    /// Nothing was captured (or it was already restored)
    NothingToRestore,
    Failed,
}

pub struct ConsoleModeGuardian<C: ConsoleEnvironment> {
    console: Arc<C>,
    saved: Arc<Mutex<Option<C::Mode>>>,
}

impl<C: ConsoleEnvironment> Clone for ConsoleModeGuardian<C> {
    fn clone(&self) -> Self {
        Self {
            console: Arc::clone(&self.console),
            saved: Arc::clone(&self.saved),
        }
    }
}

impl<C: ConsoleEnvironment> ConsoleModeGuardian<C> {
    pub fn new(console: Arc<C>) -> Self {
        Self {
            console,
            saved: Arc::new(Mutex::new(None)),
        }
    }

    fn saved(&self) -> MutexGuard<'_, Option<C::Mode>> {
        // A panic while holding the lock must not stop restoration
        self.saved.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot the current input flags unless a snapshot is already held.
    pub fn capture(&self) -> CaptureStatus {
        let mut saved = self.saved();
        if saved.is_some() {
            tracing::debug!(target: TARGET, "Console mode already captured, keeping original snapshot");
            return CaptureStatus::AlreadyHeld;
        }

        match self.console.read_mode() {
            Ok(mode) => {
                tracing::debug!(target: TARGET, ?mode, "Captured console input mode");
                *saved = Some(mode);
                CaptureStatus::Captured
            }
            Err(e) => {
                tracing::debug!(target: TARGET, error = %e, "Console input mode unavailable");
                CaptureStatus::Unavailable
            }
        }
    }

    /// Enable interrupt signals, echo and line input on top of the current flags.
    ///
    /// Only runs while a snapshot is held, so every mutation has a
    /// restoration waiting for it. The snapshot lock is held through the
    /// write, so a concurrent [`restore`](Self::restore) always lands after it.
    pub fn apply_interactive(&self) -> ApplyStatus {
        let saved = self.saved();
        if saved.is_none() {
            return ApplyStatus::NotCaptured;
        }

        let current = match self.console.read_mode() {
            Ok(mode) => mode,
            Err(e) => {
                tracing::warn!(target: TARGET, error = %e, "Failed to read console input mode");
                return ApplyStatus::Failed;
            }
        };

        let interactive = self.console.interactive_mode(&current);
        if interactive == current {
            return ApplyStatus::Unchanged;
        }

        match self.console.write_mode(&interactive) {
            Ok(()) => {
                tracing::debug!(target: TARGET, mode = ?interactive, "Applied interactive console input mode");
                ApplyStatus::Applied
            }
            Err(e) => {
                tracing::warn!(target: TARGET, error = %e, "Failed to apply interactive console input mode");
                ApplyStatus::Failed
            }
        }
    }

    /// Write the captured flags back and release the snapshot.
    pub fn restore(&self) -> RestoreStatus {
        let mut saved = self.saved();
        let Some(mode) = saved.take() else {
            return RestoreStatus::NothingToRestore;
        };

        match self.console.write_mode(&mode) {
            Ok(()) => {
                tracing::debug!(target: TARGET, ?mode, "Restored console input mode");
                RestoreStatus::Restored
            }
            Err(e) => {
                tracing::warn!(target: TARGET, error = %e, "Failed to restore console input mode");
                RestoreStatus::Failed
            }
        }
    }

    pub fn is_captured(&self) -> bool {
        self.saved().is_some()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Option<C::Mode> {
        self.saved().clone()
    }
}

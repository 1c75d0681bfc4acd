//! Console stream binding and input-mode handling.
//!
//! This module organizes everything that touches the console device:
//! - `guardian`: capture, interactive mutation and restoration of input flags
//! - `unix`: termios-backed implementation (controlling terminal, `/dev/tty`)
//! - `windows`: Win32 console implementation (`AttachConsole`, `AllocConsole`)
//!
//! The bootstrap only talks to [`ConsoleEnvironment`]; the platform module
//! is selected at compile time through [`NativeConsole`].

pub mod guardian;
#[cfg(unix)]
pub mod unix;
#[cfg(windows)]
pub mod windows;

use std::fmt;
use std::io;

pub use guardian::{ApplyStatus, CaptureStatus, ConsoleModeGuardian};

#[cfg(unix)]
pub use self::unix::UnixConsole as NativeConsole;
#[cfg(windows)]
pub use self::windows::WindowsConsole as NativeConsole;

/// How the standard streams ended up connected after binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleBindingResult {
    /// Streams use the console of the launching process
    AttachedToParent,
    /// A console owned by this process was acquired and the streams rebound to it
    AllocatedNew,
    /// No console could be obtained; streams are left as they were
    Unavailable,
}

impl ConsoleBindingResult {
    /// Whether a console input device is expected to exist
    pub fn has_console(self) -> bool {
        !matches!(self, ConsoleBindingResult::Unavailable)
    }
}

/// Outcome of moving keyboard focus back to the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    Restored,
    /// The console has no window of its own (or none could be found)
    NoConsoleWindow,
    /// The platform does not let a hidden window keep focus, nothing to do
    NotApplicable,
}

/// Platform console capability used by the bootstrap.
///
/// Implementations never fail the process: binding reports a status and
/// mode access returns `io::Result` for the guardian to log and absorb.
pub trait ConsoleEnvironment: Send + Sync + 'static {
    /// Opaque snapshot of the console input driver flags
    type Mode: Clone + PartialEq + fmt::Debug + Send + 'static;

    /// Attach stdin/stdout/stderr to a console, trying parent then new.
    fn bind(&self) -> ConsoleBindingResult;

    /// Read the current console input flags.
    fn read_mode(&self) -> io::Result<Self::Mode>;

    /// Write console input flags back to the driver.
    fn write_mode(&self, mode: &Self::Mode) -> io::Result<()>;

    /// `mode` with signal generation, echo and line input enabled.
    fn interactive_mode(&self, mode: &Self::Mode) -> Self::Mode;

    /// Give keyboard focus back to the console window.
    fn focus_console(&self) -> FocusOutcome;
}

/// Flush Rust's buffered std streams before their underlying handles change.
pub(crate) fn flush_std_streams() {
    use std::io::Write;

    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_console() {
        assert!(ConsoleBindingResult::AttachedToParent.has_console());
        assert!(ConsoleBindingResult::AllocatedNew.has_console());
        assert!(!ConsoleBindingResult::Unavailable.has_console());
    }
}

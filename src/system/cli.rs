//! Command-line mode detection.
//!
//! This module decides, before SDL or any other subsystem looks at argv,
//! whether the process runs as a windowed GUI or as a headless CLI:
//! - Mode-selecting flags (`--cli`, `--help`, `-h`)
//! - Build-level CLI support (some builds redirect CLI users to `localnode-cli`)
//! - The fixed redirect message printed by those builds

use std::ffi::OsString;

/// Flags that switch the process into CLI mode. Matched exactly and case-sensitively.
pub const MODE_FLAGS: [&str; 3] = ["--cli", "--help", "-h"];

/// Name of the standalone CLI binary shipped next to the GUI binary
pub const CLI_BINARY: &str = "localnode-cli";

/// Which of the two mutually exclusive modes the process runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessMode {
    Gui,
    Cli,
}

/// Whether this build can run CLI mode itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliSupport {
    Supported,
    /// CLI requests are answered with a redirect to another binary
    Redirect { binary: &'static str },
}

impl CliSupport {
    /// Support level compiled into this binary
    pub fn native() -> Self {
        if cfg!(feature = "cli-redirect") {
            CliSupport::Redirect { binary: CLI_BINARY }
        } else {
            CliSupport::Supported
        }
    }

    /// Whether launching in `mode` binds and mutates the console
    pub fn drives_console(&self, mode: ProcessMode) -> bool {
        mode == ProcessMode::Cli && *self == CliSupport::Supported
    }
}

/// Collect process arguments without the program name.
///
/// Tokens that are not valid UTF-8 are converted lossily; they can never
/// equal a mode flag, so detection is unaffected.
pub fn collect_args<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = OsString>,
{
    raw.into_iter().skip(1).map(|arg| arg.to_string_lossy().into_owned()).collect()
}

/// Detect the process mode from arguments (program name excluded).
///
/// Pure: nothing is consumed or reordered, unknown flags are ignored.
pub fn detect_mode<S: AsRef<str>>(args: &[S]) -> ProcessMode {
    if args.iter().any(|arg| MODE_FLAGS.contains(&arg.as_ref())) {
        ProcessMode::Cli
    } else {
        ProcessMode::Gui
    }
}

/// Message printed when a CLI flag reaches a build without CLI support
pub fn redirect_message(binary: &str) -> String {
    format!(
        "CLI mode is not supported by the localnode GUI binary on this platform.\n\
         Please use the {binary} binary included in this bundle:\n\
         \n  {binary} [options]\n  {binary} --help\n\
         \n{binary} runs without a display and has no windowing dependency."
    )
}

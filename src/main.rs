// The GUI binary never owns a console; CLI mode attaches one explicitly
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

mod console;
mod environment;
mod error;
mod logging;
mod runtime;
mod settings;
mod system;

use crate::console::NativeConsole;
use crate::environment::ProcessEnv;
use crate::runtime::SdlRuntime;
use crate::system::cli::{self, CliSupport};
use crate::system::exit_hooks::{self, ExitHooks};
use crate::system::init::{Bootstrap, LaunchOutcome};
use std::process::ExitCode;
use std::sync::Arc;

// Build-time version information
const BUILD_DATE: &str = env!("BUILD_DATE");
const GIT_HASH: &str = env!("GIT_HASH");

fn main() -> ExitCode {
    // Before anything else looks at argv
    let args = cli::collect_args(std::env::args_os());
    let mode = cli::detect_mode(&args);

    let (settings, settings_error) = match settings::load_settings() {
        Ok(settings) => (settings, None),
        Err(e) => (settings::Settings::default(), Some(e)),
    };

    if let Err(e) = logging::init_logging(&settings.logging) {
        eprintln!("[MAIN] Logging disabled: {}", e);
    }
    if let Some(e) = settings_error {
        tracing::warn!(target: "localnode::init", error = %e, "Failed to load settings, using defaults");
    }

    tracing::info!(
        target: "localnode::init",
        version = env!("CARGO_PKG_VERSION"),
        git = GIT_HASH,
        built = BUILD_DATE,
        ?mode,
        "localnode starting"
    );

    // Redirect builds never touch the console, so there is nothing to restore
    if CliSupport::native().drives_console(mode) {
        exit_hooks::install_process_handlers();
    }

    let mut bootstrap = Bootstrap::new(Arc::new(NativeConsole::new()), ProcessEnv, ExitHooks::global(), settings.window);
    let mut stdout = std::io::stdout();

    match bootstrap.launch(mode, args, &mut stdout, SdlRuntime::new) {
        Ok(report) => {
            match report.outcome {
                LaunchOutcome::Redirected => tracing::debug!(target: "localnode::init", "Redirected to CLI binary"),
                LaunchOutcome::LoopExited => tracing::debug!(
                    target: "localnode::init",
                    mode = ?report.mode,
                    binding = ?report.binding,
                    capture = ?report.capture,
                    apply = ?report.apply,
                    rendering = ?report.rendering,
                    focus = ?report.focus,
                    phases = ?report.phases,
                    "Event loop exited"
                ),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(target: "localnode::init", error = %e, "Launch failed");
            eprintln!("localnode: {}", e);
            ExitCode::FAILURE
        }
    }
}

//! Launch sequencing for GUI and CLI mode.
//!
//! This module decides what happens between mode detection and the event loop:
//! - Redirecting CLI requests on builds without CLI support
//! - Console binding and interactive input flags (CLI only)
//! - Display probing and the software rendering fallback (CLI only)
//! - Building the window runtime, window visibility and console focus
//!
//! Restoration of the console input flags is registered before anything is
//! mutated and runs through [`ExitHooks`] on every way out of [`Bootstrap::launch`].

use crate::console::{ApplyStatus, CaptureStatus, ConsoleBindingResult, ConsoleEnvironment, ConsoleModeGuardian, FocusOutcome};
use crate::environment::{select_rendering, EnvSource, RenderingDecision, RenderingEnvironmentProbe, RenderingPolicy};
use crate::error::BootstrapError;
use crate::runtime::{LaunchPlan, WindowRuntime};
use crate::settings::WindowSettings;
use crate::system::cli::{redirect_message, CliSupport, ProcessMode};
use crate::system::exit_hooks::ExitHooks;
use crate::system::lifecycle::{CliPhase, Lifecycle};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

const TARGET: &str = "localnode::bootstrap";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// CLI was requested on a build without CLI support; a redirect was printed
    Redirected,
    /// The event loop ran and returned
    LoopExited,
}

/// What the launch did, step by step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub mode: ProcessMode,
    pub outcome: LaunchOutcome,
    pub binding: Option<ConsoleBindingResult>,
    pub capture: Option<CaptureStatus>,
    pub apply: Option<ApplyStatus>,
    pub rendering: Option<RenderingDecision>,
    pub focus: Option<FocusOutcome>,
    /// CLI phases entered, empty on the GUI and redirect paths
    pub phases: Vec<CliPhase>,
}

impl LaunchReport {
    fn new(mode: ProcessMode, outcome: LaunchOutcome) -> Self {
        Self {
            mode,
            outcome,
            binding: None,
            capture: None,
            apply: None,
            rendering: None,
            focus: None,
            phases: Vec::new(),
        }
    }
}

pub struct Bootstrap<C: ConsoleEnvironment, E: EnvSource> {
    console: Arc<C>,
    env: E,
    hooks: Arc<ExitHooks>,
    window: WindowSettings,
    support: CliSupport,
    rendering: RenderingPolicy,
}

fn lock(lifecycle: &Mutex<Lifecycle>) -> MutexGuard<'_, Lifecycle> {
    lifecycle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn advance(lifecycle: &Mutex<Lifecycle>, phase: CliPhase) {
    if let Err(e) = lock(lifecycle).advance(phase) {
        tracing::error!(target: TARGET, error = %e, "Launch sequence out of order");
    }
}

impl<C: ConsoleEnvironment, E: EnvSource> Bootstrap<C, E> {
    pub fn new(console: Arc<C>, env: E, hooks: Arc<ExitHooks>, window: WindowSettings) -> Self {
        Self {
            console,
            env,
            hooks,
            window,
            support: CliSupport::native(),
            rendering: RenderingPolicy::native(),
        }
    }

    pub fn with_cli_support(mut self, support: CliSupport) -> Self {
        self.support = support;
        self
    }

    pub fn with_rendering_policy(mut self, rendering: RenderingPolicy) -> Self {
        self.rendering = rendering;
        self
    }

    /// The environment after the launch, including any directive it set
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Run the process in `mode` until the event loop returns.
    ///
    /// `args` are forwarded untouched to the runtime. `out` receives the
    /// redirect message. `make_runtime` is only called once the launch plan
    /// is final, so no windowing code runs before console setup.
    pub fn launch<R, F, W>(&mut self, mode: ProcessMode, args: Vec<String>, out: &mut W, make_runtime: F) -> Result<LaunchReport, BootstrapError>
    where
        R: WindowRuntime,
        F: FnOnce(&LaunchPlan) -> Result<R, String>,
        W: Write,
    {
        match mode {
            ProcessMode::Gui => self.launch_gui(args, make_runtime),
            ProcessMode::Cli => match self.support {
                CliSupport::Redirect { binary } => {
                    tracing::info!(target: TARGET, binary, "CLI mode unsupported in this build, redirecting");
                    // Nothing useful can be done if stdout is gone
                    let _ = writeln!(out, "{}", redirect_message(binary));
                    let _ = out.flush();
                    Ok(LaunchReport::new(mode, LaunchOutcome::Redirected))
                }
                CliSupport::Supported => self.launch_cli(args, make_runtime),
            },
        }
    }

    fn launch_gui<R, F>(&mut self, args: Vec<String>, make_runtime: F) -> Result<LaunchReport, BootstrapError>
    where
        R: WindowRuntime,
        F: FnOnce(&LaunchPlan) -> Result<R, String>,
    {
        tracing::debug!(target: TARGET, "Launching in GUI mode");

        let mut runtime = make_runtime(&LaunchPlan::gui()).map_err(BootstrapError::Runtime)?;
        runtime.set_entrypoint_arguments(args);
        runtime
            .create_window(&self.window.title, self.window.origin(), self.window.size())
            .map_err(BootstrapError::WindowCreation)?;
        runtime.set_quit_on_close(self.window.quit_on_close);
        runtime.set_visible(true);

        runtime.run_event_loop().map_err(BootstrapError::EventLoop)?;
        Ok(LaunchReport::new(ProcessMode::Gui, LaunchOutcome::LoopExited))
    }

    fn launch_cli<R, F>(&mut self, args: Vec<String>, make_runtime: F) -> Result<LaunchReport, BootstrapError>
    where
        R: WindowRuntime,
        F: FnOnce(&LaunchPlan) -> Result<R, String>,
    {
        tracing::debug!(target: TARGET, "Launching in CLI mode");

        let lifecycle = Arc::new(Mutex::new(Lifecycle::new()));
        let guardian = ConsoleModeGuardian::new(Arc::clone(&self.console));

        // Registered before the first mutation: a crash in between restores the identity
        {
            let guardian = guardian.clone();
            let lifecycle = Arc::clone(&lifecycle);
            self.hooks.register("console-mode", move || {
                let status = guardian.restore();
                let from = lock(&lifecycle).fire_exit();
                tracing::debug!(target: TARGET, ?status, ?from, "Console mode exit handler fired");
            });
        }

        let mut report = LaunchReport::new(ProcessMode::Cli, LaunchOutcome::LoopExited);
        let result = {
            let _exit_scope = self.hooks.scope();
            self.run_cli_phases(&lifecycle, &guardian, &mut report, args, make_runtime)
        };

        report.phases = lock(&lifecycle).history().to_vec();
        result.map(|()| report)
    }

    fn run_cli_phases<R, F>(
        &mut self,
        lifecycle: &Mutex<Lifecycle>,
        guardian: &ConsoleModeGuardian<C>,
        report: &mut LaunchReport,
        args: Vec<String>,
        make_runtime: F,
    ) -> Result<(), BootstrapError>
    where
        R: WindowRuntime,
        F: FnOnce(&LaunchPlan) -> Result<R, String>,
    {
        let binding = self.console.bind();
        if binding.has_console() {
            tracing::debug!(target: TARGET, ?binding, "Console streams bound");
        } else {
            tracing::warn!(target: TARGET, "No console available, continuing with best-effort streams");
        }
        report.binding = Some(binding);
        advance(lifecycle, CliPhase::StreamsBound);

        let capture = guardian.capture();
        let apply = guardian.apply_interactive();
        tracing::debug!(target: TARGET, ?capture, ?apply, held = guardian.is_captured(), "Console input mode prepared");
        report.capture = Some(capture);
        report.apply = Some(apply);
        advance(lifecycle, CliPhase::ConsoleModeApplied);

        let probe = RenderingEnvironmentProbe::probe(&self.env, &self.rendering);
        let rendering = select_rendering(&mut self.env, &self.rendering, &probe);
        match rendering {
            RenderingDecision::SoftwareForced => {
                tracing::info!(target: TARGET, var = self.rendering.software_var, "No display detected, forcing software rendering");
            }
            RenderingDecision::ExplicitConfiguration => {
                tracing::info!(target: TARGET, var = ?self.rendering.explicit_config_var, "Explicit font configuration set, environment left untouched");
            }
            _ => tracing::debug!(target: TARGET, ?rendering, displays = ?probe.present, "Rendering environment probed"),
        }
        report.rendering = Some(rendering);
        advance(lifecycle, CliPhase::EnvironmentProbed);

        let plan = LaunchPlan {
            mode: ProcessMode::Cli,
            rendering: Some(rendering),
            has_display: probe.has_display(),
        };
        let mut runtime = make_runtime(&plan).map_err(BootstrapError::Runtime)?;
        runtime.set_entrypoint_arguments(args);
        runtime
            .create_window(&self.window.title, self.window.origin(), self.window.size())
            .map_err(BootstrapError::WindowCreation)?;
        runtime.set_quit_on_close(self.window.quit_on_close);
        // The engine must exist for the application, the window must not be seen
        runtime.set_visible(false);
        runtime.set_headless(true);
        advance(lifecycle, CliPhase::WindowCreatedHidden);

        let focus = self.console.focus_console();
        tracing::debug!(target: TARGET, ?focus, "Console focus");
        report.focus = Some(focus);
        advance(lifecycle, CliPhase::FocusRestored);

        advance(lifecycle, CliPhase::EventLoopRunning);
        runtime.run_event_loop().map_err(BootstrapError::EventLoop)
    }
}

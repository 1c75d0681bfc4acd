//! Exit hook registry.
//!
//! Cleanup that must survive every way the process can end is registered
//! here. The registry is drained on first run, so each hook fires at most
//! once no matter how many exit paths race for it:
//! - normal return (`ExitScope` drop)
//! - `std::process::exit` (`atexit`)
//! - panics (panic hook)
//! - SIGINT/SIGTERM/SIGHUP on Unix, console control events on Windows

use std::sync::{Arc, Mutex, OnceLock};

const TARGET: &str = "localnode::exit";

type Hook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
pub struct ExitHooks {
    hooks: Mutex<Vec<(&'static str, Hook)>>,
}

impl ExitHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry shared with the process-level handlers from [`install_process_handlers`]
    pub fn global() -> Arc<ExitHooks> {
        static GLOBAL: OnceLock<Arc<ExitHooks>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ExitHooks::new())))
    }

    pub fn register<F>(&self, name: &'static str, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        tracing::debug!(target: TARGET, hook = name, "Registered exit hook");
        self.lock().push((name, Box::new(hook)));
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Run every pending hook in reverse registration order. Returns how many ran.
    pub fn run_all(&self) -> usize {
        // Drain under the lock, run outside it so a hook may register or panic freely
        let hooks: Vec<_> = self.lock().drain(..).collect();
        let count = hooks.len();
        for (name, hook) in hooks.into_iter().rev() {
            tracing::debug!(target: TARGET, hook = name, "Running exit hook");
            hook();
        }
        count
    }

    /// Guard that runs the pending hooks when dropped
    pub fn scope(self: &Arc<Self>) -> ExitScope {
        ExitScope { hooks: Arc::clone(self) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(&'static str, Hook)>> {
        self.hooks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct ExitScope {
    hooks: Arc<ExitHooks>,
}

impl Drop for ExitScope {
    fn drop(&mut self) {
        self.hooks.run_all();
    }
}

extern "C" fn run_global_hooks_at_exit() {
    ExitHooks::global().run_all();
}

/// Wire the global registry to process exit, panics and termination signals.
///
/// Call once, before anything registers state that needs restoring.
pub fn install_process_handlers() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        if unsafe { libc::atexit(run_global_hooks_at_exit) } != 0 {
            tracing::warn!(target: TARGET, "Failed to register atexit handler");
        }

        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            ExitHooks::global().run_all();
            previous(info);
        }));

        install_signal_handlers();
    });
}

/// Run the hooks on SIGTERM, SIGINT and SIGHUP, then die the way the signal intended
#[cfg(not(target_os = "windows"))]
fn install_signal_handlers() {
    use signal_hook::consts::signal::*;
    use signal_hook::iterator::Signals;

    let mut signals = match Signals::new([SIGTERM, SIGINT, SIGHUP]) {
        Ok(signals) => signals,
        Err(e) => {
            tracing::warn!(target: TARGET, error = %e, "Failed to register signal handlers");
            return;
        }
    };
    tracing::debug!(target: TARGET, "Registered signal handlers for SIGTERM, SIGINT, SIGHUP");

    let spawned = std::thread::Builder::new().name("exit-signals".into()).spawn(move || {
        if let Some(sig) = signals.forever().next() {
            tracing::info!(target: TARGET, signal = sig, "Termination signal received, running exit hooks");
            ExitHooks::global().run_all();
            if let Err(e) = signal_hook::low_level::emulate_default_handler(sig) {
                tracing::error!(target: TARGET, error = %e, "Failed to re-raise signal");
                std::process::exit(128 + sig);
            }
        }
    });
    if let Err(e) = spawned {
        tracing::warn!(target: TARGET, error = %e, "Failed to start signal thread");
    }
}

#[cfg(target_os = "windows")]
fn install_signal_handlers() {
    use windows_sys::Win32::Foundation::BOOL;
    use windows_sys::Win32::System::Console::SetConsoleCtrlHandler;

    unsafe extern "system" fn on_console_control(_ctrl_type: u32) -> BOOL {
        // Runs on its own thread; returning FALSE lets the default handler end the process
        ExitHooks::global().run_all();
        0
    }

    if unsafe { SetConsoleCtrlHandler(Some(on_console_control), 1) } == 0 {
        tracing::warn!(target: TARGET, "Failed to register console control handler");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[test]
    fn test_hooks_run_once() {
        let hooks = ExitHooks::new();
        let fired = counter();
        let f = Arc::clone(&fired);
        hooks.register("count", move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(hooks.run_all(), 1);
        assert_eq!(hooks.run_all(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hooks_run_in_reverse_order() {
        let hooks = ExitHooks::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            hooks.register(name, move || order.lock().unwrap().push(name));
        }

        hooks.run_all();
        assert_eq!(*order.lock().unwrap(), vec!["third", "second", "first"]);
    }

    #[test]
    fn test_scope_runs_on_drop() {
        let hooks = Arc::new(ExitHooks::new());
        let fired = counter();
        let f = Arc::clone(&fired);
        hooks.register("count", move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        {
            let _scope = hooks.scope();
            assert_eq!(fired.load(Ordering::SeqCst), 0);
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.pending(), 0);
    }

    #[test]
    fn test_scope_runs_on_early_return() {
        fn fails(hooks: &Arc<ExitHooks>) -> Result<(), String> {
            let _scope = hooks.scope();
            let created = false;
            if !created {
                return Err("window creation failed".to_string());
            }
            Ok(())
        }

        let hooks = Arc::new(ExitHooks::new());
        let fired = counter();
        let f = Arc::clone(&fired);
        hooks.register("count", move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        assert!(fails(&hooks).is_err());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hook_may_register_while_running() {
        let hooks = Arc::new(ExitHooks::new());
        let inner = Arc::clone(&hooks);
        hooks.register("outer", move || inner.register("late", || {}));

        assert_eq!(hooks.run_all(), 1);
        assert_eq!(hooks.pending(), 1);
    }
}

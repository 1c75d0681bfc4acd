//! Windowing runtime seam.
//!
//! The bootstrap never talks to SDL directly; it drives a [`WindowRuntime`]
//! that it asks a factory to build only after mode negotiation, console
//! binding and the rendering fallback are settled.

pub mod sdl;

use crate::environment::RenderingDecision;
use crate::system::cli::ProcessMode;

pub use sdl::SdlRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// Everything the runtime factory needs to know before touching the display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub mode: ProcessMode,
    /// `None` on the GUI path, where no probe runs
    pub rendering: Option<RenderingDecision>,
    pub has_display: bool,
}

impl LaunchPlan {
    pub fn gui() -> Self {
        Self {
            mode: ProcessMode::Gui,
            rendering: None,
            has_display: true,
        }
    }

    pub fn software_rendering(&self) -> bool {
        self.rendering == Some(RenderingDecision::SoftwareForced)
    }
}

/// Window and event loop provider
pub trait WindowRuntime {
    /// Arguments handed to the application entrypoint, unmodified.
    fn set_entrypoint_arguments(&mut self, args: Vec<String>);

    fn create_window(&mut self, title: &str, origin: Point, size: Size) -> Result<(), String>;

    fn set_quit_on_close(&mut self, quit_on_close: bool);

    fn set_visible(&mut self, visible: bool);

    /// Keep the engine running without presenting frames
    fn set_headless(&mut self, headless: bool);

    /// Block until the runtime decides to quit.
    fn run_event_loop(&mut self) -> Result<(), String>;
}

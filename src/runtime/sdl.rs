//! SDL3 window runtime.
//!
//! SDL is only initialised when the bootstrap builds this runtime, after the
//! process mode, console and rendering fallback are decided. Hints that
//! depend on the launch plan are set before `sdl3::init`.

use super::{LaunchPlan, Point, Size, WindowRuntime};
use crate::system::cli::ProcessMode;
use sdl3::event::{Event, WindowEvent};
use sdl3::pixels::Color;
use sdl3::render::Canvas;
use sdl3::video::Window;

const TARGET: &str = "localnode::runtime";

/// Frame budget while waiting for events (~60 FPS)
const EVENT_WAIT_MS: u32 = 16;

const BACKGROUND: Color = Color::RGB(30, 30, 30);

pub struct SdlRuntime {
    sdl: sdl3::Sdl,
    video: sdl3::VideoSubsystem,
    canvas: Option<Canvas<Window>>,
    entrypoint_args: Vec<String>,
    quit_on_close: bool,
    headless: bool,
}

impl SdlRuntime {
    pub fn new(plan: &LaunchPlan) -> Result<Self, String> {
        configure_sdl_hints(plan);

        let sdl = sdl3::init().map_err(|e| e.to_string())?;
        let video = sdl.video().map_err(|e| e.to_string())?;
        tracing::debug!(target: TARGET, software = plan.software_rendering(), has_display = plan.has_display, "SDL video initialized");

        Ok(Self {
            sdl,
            video,
            canvas: None,
            entrypoint_args: Vec::new(),
            quit_on_close: false,
            headless: false,
        })
    }

    fn render_frame(&mut self) {
        if self.headless {
            return;
        }
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.set_draw_color(BACKGROUND);
            canvas.clear();
            canvas.present();
        }
    }
}

/// SDL hints for desktop integration and headless fallbacks.
///
/// The software renderer follows the directive the bootstrap set. The
/// offscreen video driver follows the missing display alone, whoever set
/// (or refused) the directive: without it SDL video cannot start at all.
fn sdl_hints(plan: &LaunchPlan) -> Vec<(&'static str, &'static str)> {
    let mut hints = vec![
        ("SDL_VIDEO_X11_WMCLASS", "localnode"),
        ("SDL_VIDEO_WAYLAND_WMCLASS", "localnode"),
        ("SDL_APP_ID", "localnode"),
        ("SDL_APP_NAME", "localnode"),
    ];

    if plan.mode == ProcessMode::Cli {
        // Ctrl+C belongs to the console, not to the hidden window
        hints.push(("SDL_NO_SIGNAL_HANDLERS", "1"));
    }
    if plan.software_rendering() {
        hints.push(("SDL_RENDER_DRIVER", "software"));
    }
    if !plan.has_display {
        hints.push(("SDL_VIDEO_DRIVER", "offscreen"));
    }
    hints
}

fn configure_sdl_hints(plan: &LaunchPlan) {
    for (name, value) in sdl_hints(plan) {
        if !sdl3::hint::set(name, value) {
            tracing::debug!(target: TARGET, hint = name, "SDL hint rejected");
        }
    }
}

impl WindowRuntime for SdlRuntime {
    fn set_entrypoint_arguments(&mut self, args: Vec<String>) {
        self.entrypoint_args = args;
    }

    fn create_window(&mut self, title: &str, origin: Point, size: Size) -> Result<(), String> {
        // Created hidden; visibility is decided by the bootstrap afterwards
        let window = self
            .video
            .window(title, size.width, size.height)
            .position(origin.x, origin.y)
            .resizable()
            .high_pixel_density()
            .hidden()
            .build()
            .map_err(|e| e.to_string())?;

        let mut canvas = window.into_canvas();
        canvas.set_draw_color(BACKGROUND);
        self.canvas = Some(canvas);

        tracing::debug!(target: TARGET, title, width = size.width, height = size.height, "Window created");
        Ok(())
    }

    fn set_quit_on_close(&mut self, quit_on_close: bool) {
        self.quit_on_close = quit_on_close;
    }

    fn set_visible(&mut self, visible: bool) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        let window = canvas.window_mut();
        if visible {
            window.show();
        } else {
            window.hide();
        }
        tracing::debug!(target: TARGET, visible, "Window visibility changed");
    }

    fn set_headless(&mut self, headless: bool) {
        self.headless = headless;
    }

    fn run_event_loop(&mut self) -> Result<(), String> {
        let mut event_pump = self.sdl.event_pump().map_err(|e| e.to_string())?;
        tracing::debug!(target: TARGET, args = ?self.entrypoint_args, headless = self.headless, "Event loop started");

        'running: loop {
            let mut events = Vec::new();
            if let Some(event) = event_pump.wait_event_timeout(EVENT_WAIT_MS) {
                events.push(event);
            }
            events.extend(event_pump.poll_iter());

            for event in events {
                match event {
                    Event::Quit { .. } => {
                        tracing::debug!(target: TARGET, "Quit requested");
                        break 'running;
                    }
                    Event::Window {
                        win_event: WindowEvent::CloseRequested,
                        ..
                    } if self.quit_on_close => {
                        tracing::debug!(target: TARGET, "Window closed");
                        break 'running;
                    }
                    _ => {}
                }
            }

            self.render_frame();
        }

        Ok(())
    }
}

//! Win32 console: parent attach, allocation and console input mode.
//!
//! The binary is built for the `windows` subsystem, so it starts with no
//! console and no usable std handles. Rust's std streams call
//! `GetStdHandle` on every access, so updating the Win32 std handles is
//! enough to resynchronize them once the buffers are flushed.

use super::{flush_std_streams, ConsoleBindingResult, ConsoleEnvironment, FocusOutcome};
use std::io;
use std::ptr;
use windows_sys::Win32::Foundation::{GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Storage::FileSystem::{CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING};
use windows_sys::Win32::System::Console::{
    AllocConsole, AttachConsole, GetConsoleMode, GetConsoleWindow, GetStdHandle, SetConsoleMode, SetStdHandle, ATTACH_PARENT_PROCESS,
    CONSOLE_MODE, ENABLE_ECHO_INPUT, ENABLE_LINE_INPUT, ENABLE_PROCESSED_INPUT, STD_ERROR_HANDLE, STD_HANDLE, STD_INPUT_HANDLE, STD_OUTPUT_HANDLE,
};
use windows_sys::Win32::UI::WindowsAndMessaging::SetForegroundWindow;

const TARGET: &str = "localnode::console";

#[derive(Debug, Default)]
pub struct WindowsConsole;

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Open a console device (`CONIN$` / `CONOUT$`) for reading and writing
fn open_device(name: &str) -> io::Result<HANDLE> {
    let name = wide(name);
    let handle = unsafe {
        CreateFileW(
            name.as_ptr(),
            GENERIC_READ | GENERIC_WRITE,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            ptr::null(),
            OPEN_EXISTING,
            FILE_ATTRIBUTE_NORMAL,
            ptr::null_mut(),
        )
    };
    if handle == INVALID_HANDLE_VALUE {
        return Err(io::Error::last_os_error());
    }
    Ok(handle)
}

fn set_std_handle(which: STD_HANDLE, handle: HANDLE) -> io::Result<()> {
    if unsafe { SetStdHandle(which, handle) } == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn input_handle() -> io::Result<HANDLE> {
    let handle = unsafe { GetStdHandle(STD_INPUT_HANDLE) };
    if handle == INVALID_HANDLE_VALUE || handle.is_null() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "no console input handle"));
    }
    Ok(handle)
}

impl WindowsConsole {
    pub fn new() -> Self {
        WindowsConsole
    }

    /// Point the three std handles at the console this process is attached to.
    fn rebind_streams() {
        flush_std_streams();

        match open_device("CONOUT$") {
            Ok(output) => {
                for which in [STD_OUTPUT_HANDLE, STD_ERROR_HANDLE] {
                    if let Err(e) = set_std_handle(which, output) {
                        tracing::warn!(target: TARGET, error = %e, "Failed to rebind console output");
                    }
                }
            }
            Err(e) => tracing::warn!(target: TARGET, error = %e, "Failed to open CONOUT$"),
        }

        // The runtime reads input through GetStdHandle, reopening the C stdin is not enough
        match open_device("CONIN$").and_then(|input| set_std_handle(STD_INPUT_HANDLE, input)) {
            Ok(()) => {}
            Err(e) => tracing::warn!(target: TARGET, error = %e, "Failed to rebind console input"),
        }
    }
}

impl ConsoleEnvironment for WindowsConsole {
    type Mode = CONSOLE_MODE;

    fn bind(&self) -> ConsoleBindingResult {
        let result = if unsafe { AttachConsole(ATTACH_PARENT_PROCESS) } != 0 {
            ConsoleBindingResult::AttachedToParent
        } else if unsafe { AllocConsole() } != 0 {
            ConsoleBindingResult::AllocatedNew
        } else {
            tracing::debug!(target: TARGET, error = %io::Error::last_os_error(), "No console could be attached or allocated");
            return ConsoleBindingResult::Unavailable;
        };

        Self::rebind_streams();
        result
    }

    fn read_mode(&self) -> io::Result<CONSOLE_MODE> {
        let handle = input_handle()?;
        let mut mode: CONSOLE_MODE = 0;
        if unsafe { GetConsoleMode(handle, &mut mode) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(mode)
    }

    fn write_mode(&self, mode: &CONSOLE_MODE) -> io::Result<()> {
        let handle = input_handle()?;
        if unsafe { SetConsoleMode(handle, *mode) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn interactive_mode(&self, mode: &CONSOLE_MODE) -> CONSOLE_MODE {
        // ENABLE_PROCESSED_INPUT turns Ctrl+C into CTRL_C_EVENT instead of a raw byte
        mode | ENABLE_PROCESSED_INPUT | ENABLE_ECHO_INPUT | ENABLE_LINE_INPUT
    }

    fn focus_console(&self) -> FocusOutcome {
        let window = unsafe { GetConsoleWindow() };
        if window.is_null() {
            return FocusOutcome::NoConsoleWindow;
        }
        if unsafe { SetForegroundWindow(window) } != 0 {
            FocusOutcome::Restored
        } else {
            FocusOutcome::NoConsoleWindow
        }
    }
}

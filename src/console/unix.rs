//! Unix console: the controlling terminal and its termios line discipline.
//!
//! A Unix process always inherits descriptors 0-2, so "attaching to the
//! parent console" means noticing that one of them already is a terminal.
//! Only when none is do we reach for `/dev/tty` and rebind all three.

use super::{flush_std_streams, ConsoleBindingResult, ConsoleEnvironment, FocusOutcome};
use std::ffi::CStr;
use std::io;
use std::os::raw::c_int;

const TARGET: &str = "localnode::console";

const CONTROLLING_TTY: &CStr = c"/dev/tty";

const STD_FDS: [c_int; 3] = [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO];

#[derive(Debug, Default)]
pub struct UnixConsole;

impl UnixConsole {
    pub fn new() -> Self {
        UnixConsole
    }

    fn is_terminal(fd: c_int) -> bool {
        unsafe { libc::isatty(fd) == 1 }
    }

    /// Open the controlling terminal and make it fds 0, 1 and 2.
    fn acquire_controlling_terminal() -> io::Result<()> {
        let fd = unsafe { libc::open(CONTROLLING_TTY.as_ptr(), libc::O_RDWR | libc::O_NOCTTY) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        flush_std_streams();
        let result = rebind_all(fd, &STD_FDS, dup2);

        // On success the terminal stays open only through the std fds
        if result.is_err() || !STD_FDS.contains(&fd) {
            unsafe { libc::close(fd) };
        }
        result
    }
}

fn dup2(source: c_int, target: c_int) -> io::Result<()> {
    if unsafe { libc::dup2(source, target) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Point every fd in `targets` at `source`, all or nothing.
///
/// If one rebind fails, the targets already moved get their previous file
/// back (or are closed again if they were closed before).
fn rebind_all<F>(source: c_int, targets: &[c_int], mut rebind: F) -> io::Result<()>
where
    F: FnMut(c_int, c_int) -> io::Result<()>,
{
    let mut moved: Vec<(c_int, c_int)> = Vec::with_capacity(targets.len());
    let mut result = Ok(());

    for &target in targets {
        if target == source {
            continue;
        }
        let previous = unsafe { libc::dup(target) };
        if let Err(e) = rebind(source, target) {
            if previous >= 0 {
                unsafe { libc::close(previous) };
            }
            result = Err(e);
            break;
        }
        moved.push((target, previous));
    }

    for (target, previous) in moved.into_iter().rev() {
        if result.is_err() {
            if previous >= 0 {
                unsafe { libc::dup2(previous, target) };
            } else {
                unsafe { libc::close(target) };
            }
        }
        if previous >= 0 {
            unsafe { libc::close(previous) };
        }
    }

    if let Err(e) = &result {
        tracing::debug!(target: TARGET, error = %e, "Rebinding std fds failed, rolled back");
    }
    result
}

impl ConsoleEnvironment for UnixConsole {
    type Mode = libc::termios;

    fn bind(&self) -> ConsoleBindingResult {
        // Any inherited terminal means the parent's console is already wired up;
        // rebinding would break redirections like `localnode --cli > out.txt`
        if STD_FDS.iter().any(|&fd| Self::is_terminal(fd)) {
            return ConsoleBindingResult::AttachedToParent;
        }

        match Self::acquire_controlling_terminal() {
            Ok(()) => ConsoleBindingResult::AllocatedNew,
            Err(e) => {
                tracing::debug!(target: TARGET, error = %e, "No controlling terminal");
                ConsoleBindingResult::Unavailable
            }
        }
    }

    fn read_mode(&self) -> io::Result<libc::termios> {
        let mut mode: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &mut mode) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(mode)
    }

    fn write_mode(&self, mode: &libc::termios) -> io::Result<()> {
        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, mode) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn interactive_mode(&self, mode: &libc::termios) -> libc::termios {
        let mut interactive = *mode;
        interactive.c_lflag |= libc::ISIG | libc::ECHO | libc::ICANON;
        interactive
    }

    fn focus_console(&self) -> FocusOutcome {
        // Hidden X11/Wayland windows never take keyboard focus from a terminal
        FocusOutcome::NotApplicable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::AsRawFd;

    fn inode(fd: c_int) -> u64 {
        let mut stat: libc::stat = unsafe { std::mem::zeroed() };
        assert_eq!(unsafe { libc::fstat(fd, &mut stat) }, 0);
        stat.st_ino as u64
    }

    #[test]
    fn test_rebind_all_moves_every_target() {
        let source = tempfile::tempfile().unwrap();
        let first = tempfile::tempfile().unwrap();
        let second = tempfile::tempfile().unwrap();
        let (src, a, b) = (source.as_raw_fd(), first.as_raw_fd(), second.as_raw_fd());

        rebind_all(src, &[a, b], dup2).unwrap();

        assert_eq!(inode(a), inode(src));
        assert_eq!(inode(b), inode(src));
    }

    #[test]
    fn test_partial_rebind_is_rolled_back() {
        let source = tempfile::tempfile().unwrap();
        let first = tempfile::tempfile().unwrap();
        let second = tempfile::tempfile().unwrap();
        let (src, a, b) = (source.as_raw_fd(), first.as_raw_fd(), second.as_raw_fd());
        let before = (inode(a), inode(b));

        let result = rebind_all(src, &[a, b], |from, to| {
            if to == b {
                return Err(io::Error::other("dup2 refused"));
            }
            dup2(from, to)
        });

        assert!(result.is_err());
        // The first fd was moved, then put back
        assert_eq!((inode(a), inode(b)), before);
        assert_ne!(inode(a), inode(src));
    }

    #[test]
    fn test_interactive_mode_sets_line_discipline_flags() {
        let console = UnixConsole::new();
        let mut raw: libc::termios = unsafe { std::mem::zeroed() };
        raw.c_lflag = libc::IEXTEN;
        raw.c_iflag = libc::ICRNL;

        let interactive = console.interactive_mode(&raw);
        assert_ne!(interactive.c_lflag & libc::ISIG, 0);
        assert_ne!(interactive.c_lflag & libc::ECHO, 0);
        assert_ne!(interactive.c_lflag & libc::ICANON, 0);
        // Unrelated flags survive
        assert_ne!(interactive.c_lflag & libc::IEXTEN, 0);
        assert_eq!(interactive.c_iflag, libc::ICRNL);
    }

    #[test]
    fn test_interactive_mode_is_stable() {
        let console = UnixConsole::new();
        let mut mode: libc::termios = unsafe { std::mem::zeroed() };
        mode.c_lflag = libc::ISIG | libc::ECHO | libc::ICANON;

        assert_eq!(console.interactive_mode(&mode), mode);
    }

    #[test]
    fn test_focus_is_not_applicable() {
        assert_eq!(UnixConsole::new().focus_console(), FocusOutcome::NotApplicable);
    }
}

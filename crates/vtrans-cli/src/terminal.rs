// crates/vtrans-cli/src/terminal.rs
//
// Raw-mode stdin for single-key console commands (spec.md §4.9). Puts the
// controlling terminal into non-canonical, no-echo mode with `VMIN=0,
// VTIME=0` so a read on fd 0 returns immediately whether or not a key is
// waiting, instead of blocking for a full line. Restored on drop so a crash
// or normal exit never leaves the user's shell in raw mode.

use std::io;

/// RAII guard around one terminal's raw-mode state. `stdin_interaction`
/// callers hold this for the process's lifetime; dropping it restores the
/// original termios settings.
pub struct RawTerminalGuard {
    original: libc::termios,
}

impl RawTerminalGuard {
    /// Returns `None` if fd 0 isn't a TTY (piped input, CI, etc.) — raw mode
    /// is simply skipped rather than treated as an error.
    pub fn enable() -> io::Result<Option<Self>> {
        unsafe {
            if libc::isatty(libc::STDIN_FILENO) == 0 {
                return Ok(None);
            }

            let mut original: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &mut original) != 0 {
                return Err(io::Error::last_os_error());
            }

            let mut raw = original;
            raw.c_lflag &= !(libc::ICANON | libc::ECHO);
            raw.c_cc[libc::VMIN] = 0;
            raw.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &raw) != 0 {
                return Err(io::Error::last_os_error());
            }

            Ok(Some(Self { original }))
        }
    }

    /// Read one byte if available, without blocking. `Ok(None)` means no key
    /// was waiting this tick.
    pub fn poll_byte(&self) -> io::Result<Option<u8>> {
        let mut byte: u8 = 0;
        let n = unsafe { libc::read(libc::STDIN_FILENO, &mut byte as *mut u8 as *mut libc::c_void, 1) };
        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::WouldBlock {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }
}

impl Drop for RawTerminalGuard {
    fn drop(&mut self) {
        unsafe {
            libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &self.original);
        }
    }
}

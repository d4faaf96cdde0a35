//! Process and OS primitives used by the runner and by test bodies.
//!
//! - [`Clock`]: millisecond time source consumed by the runner. The default
//!   [`MonotonicClock`] never goes backwards, so measured durations are never
//!   negative.
//! - [`now_millis`]: wall-clock milliseconds since the UNIX epoch.
//! - [`sleep_ms`] / [`wait`]: blocking sleeps for test bodies. [`wait`] polls
//!   the wall clock in short slices until a deadline passes.
//! - [`resident_memory_bytes`]: peak resident set size of this process.
//! - [`ansi_supported`] / [`enable_virtual_terminal`]: whether colour escapes
//!   should be written, and console setup so they are interpreted.

#[cfg(test)]
mod tests;

use std::cell::Cell;
use std::ffi::OsStr;
use std::io;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::trace;

/// Longest single sleep taken by [`wait`] between deadline checks.
pub const WAIT_SLICE_MS: u64 = 20;

// ------------------------------------------------------------------------------------------------
// Clocks
// ------------------------------------------------------------------------------------------------

/// A millisecond time source.
///
/// Only differences between two readings are meaningful to the runner.
pub trait Clock {
    /// Returns the current reading in milliseconds.
    fn now_millis(&self) -> u64;
}

/// Monotonic clock anchored at construction time.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Creates a clock reading `0` now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Wall clock: milliseconds since the UNIX epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        now_millis()
    }
}

/// Deterministic clock that advances by a fixed step on every reading.
///
/// Useful for checking timing output without depending on the scheduler.
#[derive(Debug)]
pub struct StepClock {
    now: Cell<u64>,
    step: u64,
}

impl StepClock {
    /// Creates a clock whose first reading is `start`.
    pub fn new(start: u64, step: u64) -> Self {
        Self {
            now: Cell::new(start),
            step,
        }
    }
}

impl Clock for StepClock {
    fn now_millis(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now.saturating_add(self.step));
        now
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }
}

// ------------------------------------------------------------------------------------------------
// Time helpers
// ------------------------------------------------------------------------------------------------

/// Milliseconds since the UNIX epoch.
///
/// Returns `0` if the system clock is set before the epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Blocks the calling thread for `ms` milliseconds.
pub fn sleep_ms(ms: u64) {
    thread::sleep(Duration::from_millis(ms));
}

/// Blocks until at least `ms` milliseconds of wall-clock time have passed.
///
/// Sleeps in slices of at most [`WAIT_SLICE_MS`], re-reading the clock
/// after each slice.
pub fn wait(ms: u64) {
    let deadline = now_millis().saturating_add(ms);
    loop {
        let now = now_millis();
        if now >= deadline {
            break;
        }
        sleep_ms((deadline - now).min(WAIT_SLICE_MS));
    }
    trace!(ms, "wait finished");
}

// ------------------------------------------------------------------------------------------------
// Process information
// ------------------------------------------------------------------------------------------------

/// Peak resident set size of the current process, in bytes.
///
/// Returns `None` where the platform does not expose it.
#[cfg(target_os = "linux")]
pub fn resident_memory_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_hwm(&status)
}

/// Peak resident set size of the current process, in bytes.
///
/// Returns `None` where the platform does not expose it.
#[cfg(not(target_os = "linux"))]
pub fn resident_memory_bytes() -> Option<u64> {
    None
}

/// Extracts `VmHWM` (reported in KiB) from a `/proc/<pid>/status` dump.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) fn parse_vm_hwm(status: &str) -> Option<u64> {
    let line = status.lines().find(|l| l.starts_with("VmHWM:"))?;
    let kib: u64 = line
        .trim_start_matches("VmHWM:")
        .trim()
        .trim_end_matches("kB")
        .trim()
        .parse()
        .ok()?;
    kib.checked_mul(1024)
}

/// Returns `false` when the `NO_COLOR` environment variable is set to a
/// non-empty value.
///
/// The runner only emits ANSI colour escapes when this holds and the
/// configuration asks for them.
pub fn ansi_supported() -> bool {
    !no_color_requested(std::env::var_os("NO_COLOR").as_deref())
}

/// Applies the `NO_COLOR` convention: only a non-empty value disables colour.
pub(crate) fn no_color_requested(value: Option<&OsStr>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

// ------------------------------------------------------------------------------------------------
// Console
// ------------------------------------------------------------------------------------------------

/// Prepares the console attached to standard output for ANSI escapes.
///
/// Windows consoles interpret escape sequences only once virtual terminal
/// processing is switched on. Every other platform needs no setup and this
/// returns `Ok(())`.
///
/// # Errors
///
/// On Windows, returns the OS error when standard output is not a console
/// or its mode cannot be changed. Escapes should not be written then.
pub fn enable_virtual_terminal() -> io::Result<()> {
    #[cfg(windows)]
    {
        console::enable_virtual_terminal()
    }
    #[cfg(not(windows))]
    {
        Ok(())
    }
}

#[cfg(windows)]
mod console {
    use std::ffi::c_void;
    use std::io;

    type Handle = *mut c_void;

    const STD_OUTPUT_HANDLE: u32 = -11_i32 as u32;
    const ENABLE_VIRTUAL_TERMINAL_PROCESSING: u32 = 0x0004;

    #[link(name = "kernel32")]
    unsafe extern "system" {
        fn GetStdHandle(std_handle: u32) -> Handle;
        fn GetConsoleMode(console: Handle, mode: *mut u32) -> i32;
        fn SetConsoleMode(console: Handle, mode: u32) -> i32;
    }

    pub(super) fn enable_virtual_terminal() -> io::Result<()> {
        // SAFETY: the handle comes from GetStdHandle and `mode` outlives both calls.
        unsafe {
            let handle = GetStdHandle(STD_OUTPUT_HANDLE);
            if handle.is_null() || handle as isize == -1 {
                return Err(io::Error::last_os_error());
            }
            let mut mode = 0_u32;
            if GetConsoleMode(handle, &mut mode) == 0 {
                return Err(io::Error::last_os_error());
            }
            if mode & ENABLE_VIRTUAL_TERMINAL_PROCESSING != 0 {
                return Ok(());
            }
            if SetConsoleMode(handle, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING) == 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }
}

use std::ffi::OsStr;

use crate::platform::{
    enable_virtual_terminal, no_color_requested, parse_vm_hwm, resident_memory_bytes,
};

const STATUS: &str = "Name:\tcargo\nVmPeak:\t  20000 kB\nVmHWM:\t    1536 kB\nVmRSS:\t    1024 kB\n";

#[test]
fn parses_peak_rss_in_bytes() {
    assert_eq!(parse_vm_hwm(STATUS), Some(1536 * 1024));
}

#[test]
fn missing_field_yields_none() {
    assert_eq!(parse_vm_hwm("Name:\tcargo\nVmRSS:\t 1 kB\n"), None);
}

#[test]
fn garbage_value_yields_none() {
    assert_eq!(parse_vm_hwm("VmHWM:\t lots kB\n"), None);
}

#[cfg(target_os = "linux")]
#[test]
fn resident_memory_is_reported_on_linux() {
    let bytes = resident_memory_bytes().unwrap();
    assert!(bytes > 0);
    assert_eq!(bytes % 1024, 0);
}

#[cfg(not(target_os = "linux"))]
#[test]
fn resident_memory_is_unavailable_elsewhere() {
    assert_eq!(resident_memory_bytes(), None);
}

#[test]
fn no_color_needs_a_non_empty_value() {
    assert!(!no_color_requested(None));
    assert!(!no_color_requested(Some(OsStr::new(""))));
    assert!(no_color_requested(Some(OsStr::new("1"))));
    assert!(no_color_requested(Some(OsStr::new("false"))));
}

#[cfg(not(windows))]
#[test]
fn virtual_terminal_needs_no_setup_off_windows() {
    assert!(enable_virtual_terminal().is_ok());
    assert!(enable_virtual_terminal().is_ok());
}

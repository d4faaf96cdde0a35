use crate::registry::{Registry, TestEntry};
use std::cell::RefCell;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber controlled by `RUST_LOG` env var.
/// Safe to call multiple times; only the first call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Shared log of test bodies that actually ran.
pub type Journal = Rc<RefCell<Vec<String>>>;

/// Builds a registry of `(name, categories)` pairs whose bodies append
/// their own name to the returned journal.
pub fn journaled(entries: &[(&str, &str)]) -> (Registry, Journal) {
    let journal: Journal = Rc::default();
    let registry = entries
        .iter()
        .map(|&(name, categories)| {
            let log = Rc::clone(&journal);
            let owned = name.to_owned();
            TestEntry::new(name, categories, move || {
                log.borrow_mut().push(owned.clone());
                0
            })
        })
        .collect();
    (registry, journal)
}

/// Output lines as UTF-8 strings.
pub fn lines(buf: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(buf)
        .lines()
        .map(str::to_owned)
        .collect()
}

//! Time-ordered identifier generation.

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::LazyLock;

/// Prefix for generation run identifiers.
pub const RUN_PREFIX: &str = "run";
/// Prefix for script variant identifiers.
pub const VARIANT_PREFIX: &str = "var";

/// Largest sequence value that fits the six hex digit suffix.
const MAX_SEQUENCE: u32 = 0x00FF_FFFF;

static GLOBAL: LazyLock<IdGenerator> = LazyLock::new(IdGenerator::new);

/// Produce a new identifier from the process-wide generator.
///
/// # Examples
///
/// ```
/// use scriptorium_core::new_id;
///
/// let first = new_id("run");
/// let second = new_id("run");
/// assert!(first.starts_with("run_"));
/// assert!(first < second);
/// ```
pub fn new_id(prefix: &str) -> String {
    GLOBAL.next(prefix)
}

#[derive(Debug, Default)]
struct IdState {
    last_millis: i64,
    sequence: u32,
}

/// Generator of unique, lexically sortable identifiers.
///
/// Identifiers have the form `<prefix>_<millis:12 hex><sequence:6 hex>`. Within one
/// generator, successive identifiers with the same prefix sort in creation order:
/// the millisecond component never moves backwards (clock regressions reuse the last
/// value) and the sequence disambiguates calls within the same millisecond.
#[derive(Debug, Default)]
pub struct IdGenerator {
    state: Mutex<IdState>,
}

impl IdGenerator {
    /// Create a generator with fresh state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next identifier with the given prefix.
    pub fn next(&self, prefix: &str) -> String {
        let now = Utc::now().timestamp_millis();
        let (millis, sequence) = self.advance(now);
        format!("{}_{:012x}{:06x}", prefix, millis, sequence)
    }

    fn advance(&self, now: i64) -> (i64, u32) {
        let mut state = self.state.lock();
        if now > state.last_millis {
            state.last_millis = now;
            state.sequence = 0;
        } else if state.sequence >= MAX_SEQUENCE {
            // Sequence space exhausted for this millisecond; borrow the next one.
            state.last_millis += 1;
            state.sequence = 0;
        } else {
            state.sequence += 1;
        }
        (state.last_millis, state.sequence)
    }
}

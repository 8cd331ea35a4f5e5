//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available —
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub default_queries: Vec<String>,

  // Gallery paging
  pub page_size: usize,
  pub backend_limit: usize,
  pub grid_columns: usize,

  // Timers (milliseconds)
  pub debounce_ms: u64,
  pub reveal_ms: u64,
  pub tick_ms: u64,

  // Request cache
  pub cache_fresh_secs: u64,

  // Infinite-scroll trigger
  pub sentinel_margin_rows: usize,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.page_size, 9);
    assert_eq!(c.backend_limit, 48);
    assert!(!c.default_queries.is_empty());
    assert!(c.grid_columns > 0);
  }
}

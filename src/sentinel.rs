/// Infinite-scroll trigger region for the gallery grid.
///
/// Plays the role of an intersection observer on a marker after the grid:
/// fires when the bottom of the viewport comes within `margin_rows` of the
/// end of revealed content. Evaluated against current geometry on every
/// check, so it never acts on stale state; the loading controller's own
/// guards make repeated firing idempotent.
#[derive(Debug, Clone, Copy)]
pub struct ScrollSentinel {
  margin_rows: usize,
}

impl ScrollSentinel {
  pub fn new(margin_rows: usize) -> Self {
    Self { margin_rows }
  }

  /// Whether the trigger region intersects the margin-extended viewport.
  /// `first_row` is the topmost rendered grid row, `viewport_rows` how many
  /// rows fit on screen, `total_rows` how many rows of revealed content exist.
  pub fn intersects(&self, first_row: usize, viewport_rows: usize, total_rows: usize) -> bool {
    first_row + viewport_rows + self.margin_rows >= total_rows
  }
}

/// Number of grid rows needed for `count` items at `columns` per row.
pub fn rows_for(count: usize, columns: usize) -> usize {
  count.div_ceil(columns.max(1))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fires_near_the_bottom() {
    let sentinel = ScrollSentinel::new(2);
    // 16 rows of content, 5-row viewport: scrolled to row 9 the bottom is
    // at 14, within 2 rows of the end.
    assert!(sentinel.intersects(9, 5, 16));
    assert!(!sentinel.intersects(8, 5, 16));
  }

  #[test]
  fn fires_when_content_fits_the_viewport() {
    let sentinel = ScrollSentinel::new(2);
    assert!(sentinel.intersects(0, 10, 3));
    assert!(sentinel.intersects(0, 10, 0));
  }

  #[test]
  fn rows_round_up() {
    assert_eq!(rows_for(0, 3), 0);
    assert_eq!(rows_for(9, 3), 3);
    assert_eq!(rows_for(10, 3), 4);
    assert_eq!(rows_for(5, 0), 5);
  }
}

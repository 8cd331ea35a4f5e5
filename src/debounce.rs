use std::time::{Duration, Instant};

/// Delays propagation of a rapidly-changing value until it has been stable
/// for the configured delay. Each new input cancels the pending timer before
/// scheduling a new one. Driven by the event loop via `tick`.
#[derive(Debug)]
pub struct Debounced<T> {
  value: T,
  pending: Option<(T, Instant)>,
  delay: Duration,
}

impl<T: Clone + PartialEq> Debounced<T> {
  pub fn new(initial: T, delay: Duration) -> Self {
    Self { value: initial, pending: None, delay }
  }

  /// Propose a new value. A candidate equal to the settled value cancels any
  /// pending update; anything else restarts the delay from `now`.
  pub fn set(&mut self, next: T, now: Instant) {
    if next == self.value {
      self.pending = None;
      return;
    }
    self.pending = Some((next, now + self.delay));
  }

  /// Settle the pending value once its deadline has passed.
  /// Returns true when the settled value changed on this call.
  pub fn tick(&mut self, now: Instant) -> bool {
    let due = matches!(self.pending, Some((_, deadline)) if now >= deadline);
    if due && let Some((next, _)) = self.pending.take() {
      self.value = next;
      return true;
    }
    false
  }

  /// Settle any pending value immediately (explicit commit, e.g. Enter).
  /// Returns true when the settled value changed.
  pub fn flush(&mut self) -> bool {
    if let Some((next, _)) = self.pending.take() {
      self.value = next;
      return true;
    }
    false
  }

  /// The settled value.
  pub fn value(&self) -> &T {
    &self.value
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn debounced(initial: &str) -> (Debounced<String>, Instant) {
    (Debounced::new(initial.to_string(), Duration::from_millis(500)), Instant::now())
  }

  #[test]
  fn value_settles_after_delay() {
    let (mut d, t0) = debounced("");
    d.set("cats".to_string(), t0);
    assert!(!d.tick(t0 + Duration::from_millis(499)));
    assert_eq!(d.value(), "");
    assert!(d.tick(t0 + Duration::from_millis(500)));
    assert_eq!(d.value(), "cats");
  }

  #[test]
  fn new_input_restarts_the_timer() {
    let (mut d, t0) = debounced("");
    d.set("c".to_string(), t0);
    d.set("ca".to_string(), t0 + Duration::from_millis(400));
    // Original deadline has passed, but the rescheduled one has not.
    assert!(!d.tick(t0 + Duration::from_millis(600)));
    assert!(d.tick(t0 + Duration::from_millis(900)));
    assert_eq!(d.value(), "ca");
  }

  #[test]
  fn reverting_to_settled_value_cancels_pending() {
    let (mut d, t0) = debounced("cats");
    d.set("cat".to_string(), t0);
    d.set("cats".to_string(), t0 + Duration::from_millis(100));
    assert!(!d.tick(t0 + Duration::from_secs(5)));
    assert_eq!(d.value(), "cats");
  }

  #[test]
  fn flush_commits_pending_immediately() {
    let (mut d, t0) = debounced("");
    d.set("cats".to_string(), t0);
    assert!(d.flush());
    assert_eq!(d.value(), "cats");
    assert!(!d.flush());
  }

  #[test]
  fn tick_without_pending_is_a_noop() {
    let (mut d, t0) = debounced("stable");
    assert!(!d.tick(t0 + Duration::from_secs(10)));
    assert_eq!(d.value(), "stable");
  }
}

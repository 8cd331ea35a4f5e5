//! Incremental loading controller for the video gallery.
//!
//! Owns the accumulated result buffer, pagination tokens, visible-window
//! size, and reveal timing for one (query, order) session. All transitions
//! go through `apply`, invoked from fetch completion, timer expiry, and
//! scroll-trigger callbacks; `tick` drives the reveal-delay timer from the
//! event loop.

use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::api::{VideoItem, VideoResponse};
use crate::query::Order;

/// Key segment standing in for the absent token of a session's first page.
const INITIAL_TOKEN_KEY: &str = "__initial__";

/// Events the controller reacts to.
#[derive(Debug)]
pub enum LoaderEvent {
  /// The scroll sentinel entered the trigger region.
  SentinelHit,
  /// A fresh (non-placeholder) response for the current token arrived.
  ResponseArrived(VideoResponse),
  /// The fetch for the current token failed.
  FetchFailed,
  /// The reveal delay elapsed.
  RevealElapsed,
}

pub struct Loader {
  query: String,
  order: Order,
  items: Vec<VideoItem>,
  seen_ids: HashSet<String>,
  /// Token of the last issued request; `None` is the first page.
  current_token: Option<String>,
  /// Token for the next page, from the latest merged response.
  next_page_token: Option<String>,
  /// Target rendered-item count; the effective window is capped at the buffer length.
  visible_count: usize,
  loading_more: bool,
  pending_reveal: bool,
  /// Composite (query, order, token) keys already merged. Guards against
  /// reapplying replayed cache data. Cleared only on session reset.
  loaded_tokens: HashSet<String>,
  reveal_deadline: Option<Instant>,
  page_size: usize,
  reveal_delay: Duration,
}

impl Loader {
  pub fn new(query: &str, order: Order, page_size: usize, reveal_delay: Duration) -> Self {
    Self {
      query: query.to_string(),
      order,
      items: Vec::new(),
      seen_ids: HashSet::new(),
      current_token: None,
      next_page_token: None,
      visible_count: page_size,
      loading_more: false,
      pending_reveal: false,
      loaded_tokens: HashSet::new(),
      reveal_deadline: None,
      page_size,
      reveal_delay,
    }
  }

  // --- Session ---

  /// Reset to a new session if the effective query or order changed.
  /// Returns true when a reset happened. Must run before any new fetch is issued.
  pub fn sync_session(&mut self, query: &str, order: Order) -> bool {
    if self.query == query && self.order == order {
      return false;
    }
    debug!(query, order = order.api_value(), "session reset");
    self.query = query.to_string();
    self.order = order;
    self.items.clear();
    self.seen_ids.clear();
    self.current_token = None;
    self.next_page_token = None;
    self.visible_count = self.page_size;
    self.loading_more = false;
    self.pending_reveal = false;
    self.loaded_tokens.clear();
    self.reveal_deadline = None;
    true
  }

  // --- Transitions ---

  /// Apply one event. `fetching` reports whether a request for the current
  /// token is in flight at the time of the event.
  pub fn apply(&mut self, event: LoaderEvent, fetching: bool, now: Instant) {
    match event {
      LoaderEvent::SentinelHit => {
        if !self.loading_more {
          if self.visible_count < self.items.len() {
            // Buffered items exist beyond the window: reveal them.
            self.loading_more = true;
            self.pending_reveal = true;
          } else if self.next_page_token.is_some() && !fetching {
            // Buffer exhausted: advance to the next page.
            self.loading_more = true;
            self.pending_reveal = true;
            self.current_token = self.next_page_token.clone();
          }
        }
      }
      LoaderEvent::ResponseArrived(response) => self.merge(response),
      LoaderEvent::FetchFailed => {
        if self.loading_more {
          // Abort the loading-more attempt; accumulated results stay intact.
          self.loading_more = false;
          self.pending_reveal = false;
          self.reveal_deadline = None;
        }
      }
      LoaderEvent::RevealElapsed => {
        self.reveal_deadline = None;
        if self.pending_reveal {
          self.visible_count = (self.visible_count + self.page_size).min(self.items.len());
          self.pending_reveal = false;
          self.loading_more = false;
        }
      }
    }
    self.settle(fetching, now);
  }

  /// Fire the reveal timer if its deadline has passed.
  /// Returns true when a reveal step ran.
  pub fn tick(&mut self, fetching: bool, now: Instant) -> bool {
    if let Some(deadline) = self.reveal_deadline
      && now >= deadline
    {
      self.apply(LoaderEvent::RevealElapsed, fetching, now);
      return true;
    }
    false
  }

  /// Re-evaluate the pending-reveal state after any transition: schedule a
  /// reveal when the buffer is ahead of the window, advance to the next page
  /// when it isn't, or finish when no more pages exist.
  fn settle(&mut self, fetching: bool, now: Instant) {
    if !self.pending_reveal {
      self.reveal_deadline = None;
      return;
    }
    if self.items.len() > self.visible_count {
      if self.reveal_deadline.is_none() {
        self.reveal_deadline = Some(now + self.reveal_delay);
      }
      return;
    }
    if let Some(ref next) = self.next_page_token {
      if !fetching && self.current_token.as_ref() != Some(next) {
        debug!(token = %next, "advancing to next page");
        self.current_token = Some(next.clone());
      }
      return;
    }
    // End of content.
    self.pending_reveal = false;
    self.loading_more = false;
    self.reveal_deadline = None;
  }

  /// Merge a fresh response for the current token into the buffer.
  /// Replayed (already-loaded) composite keys are ignored; the first page of
  /// a session replaces the buffer, later pages extend it; ids deduplicate.
  fn merge(&mut self, response: VideoResponse) {
    if !self.loaded_tokens.insert(self.current_token_key()) {
      return;
    }
    if self.current_token.is_none() {
      self.items.clear();
      self.seen_ids.clear();
    }
    for item in response.items {
      if self.seen_ids.insert(item.id.clone()) {
        self.items.push(item);
      }
    }
    self.next_page_token = response.next_page_token;
    debug!(buffered = self.items.len(), has_next = self.next_page_token.is_some(), "merged page");
  }

  fn current_token_key(&self) -> String {
    format!(
      "{}-{}-{}",
      self.query,
      self.order.api_value(),
      self.current_token.as_deref().unwrap_or(INITIAL_TOKEN_KEY)
    )
  }

  // --- Accessors ---

  pub fn query(&self) -> &str {
    &self.query
  }

  pub fn order(&self) -> Order {
    self.order
  }

  pub fn current_token(&self) -> Option<&String> {
    self.current_token.as_ref()
  }

  /// Whether the current token's response has already been merged.
  pub fn current_token_loaded(&self) -> bool {
    self.loaded_tokens.contains(&self.current_token_key())
  }

  /// The rendered window: never longer than the buffer.
  pub fn visible_items(&self) -> &[VideoItem] {
    &self.items[..self.visible_count.min(self.items.len())]
  }

  pub fn buffered_len(&self) -> usize {
    self.items.len()
  }

  pub fn is_loading_more(&self) -> bool {
    self.loading_more
  }

  /// True once the last merged page carried no next-page token.
  pub fn end_reached(&self) -> bool {
    self.current_token_loaded() && self.next_page_token.is_none()
  }
}

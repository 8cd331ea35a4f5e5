use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{self, FetchError, FetchParams, VideoItem, VideoResponse};
use crate::cache::{Lookup, QueryCache, QueryKey};
use crate::config::Config;
use crate::constants::constants;
use crate::debounce::Debounced;
use crate::loader::{Loader, LoaderEvent};
use crate::query::{self, Order};
use crate::sentinel::{ScrollSentinel, rows_for};
use crate::theme::{Theme, ThemeMode, theme_for};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Input,
  Browse,
}

/// One spawned backend fetch awaiting completion.
struct PendingFetch {
  key: QueryKey,
  rx: oneshot::Receiver<Result<VideoResponse, FetchError>>,
  handle: JoinHandle<()>,
}

pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub order: Order,
  pub theme_mode: ThemeMode,
  pub should_quit: bool,
  /// Base-view fetch error, shown as a full retry state. Load-more errors never land here.
  pub last_error: Option<String>,
  /// Selected index into the visible items (grid navigation).
  pub selected: usize,
  /// First rendered grid row.
  pub scroll_row: usize,
  /// Grid rows that fit on screen; written by the renderer each draw.
  pub grid_viewport_rows: usize,
  /// App start instant, drives the loading spinner animation.
  pub started_at: Instant,
  debounced: Debounced<String>,
  loader: Loader,
  cache: QueryCache,
  sentinel: ScrollSentinel,
  /// Edge trigger: set while the viewport bottom is away from the content
  /// end, consumed on the next intersection.
  sentinel_armed: bool,
  client: Client,
  backend_url: String,
  /// Key of the last failed request. Blocks automatic refetch until the
  /// retry action (base view) or a fresh sentinel hit (page fetch).
  failed_key: Option<QueryKey>,
  fetches: Vec<PendingFetch>,
}

impl App {
  pub fn new(backend_url: String) -> Self {
    let config = Config::load();
    let c = constants();
    let initial_query = query::daily_default_query();

    Self {
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      mode: AppMode::Input,
      order: Order::default(),
      theme_mode: config.theme_mode(),
      should_quit: false,
      last_error: None,
      selected: 0,
      scroll_row: 0,
      grid_viewport_rows: 3,
      started_at: Instant::now(),
      debounced: Debounced::new(String::new(), Duration::from_millis(c.debounce_ms)),
      loader: Loader::new(initial_query, Order::default(), c.page_size, Duration::from_millis(c.reveal_ms)),
      cache: QueryCache::new(Duration::from_secs(c.cache_fresh_secs)),
      sentinel: ScrollSentinel::new(c.sentinel_margin_rows),
      sentinel_armed: true,
      client: Client::new(),
      backend_url,
      failed_key: None,
      fetches: Vec::new(),
    }
  }

  pub fn theme(&self) -> &'static Theme {
    theme_for(self.theme_mode)
  }

  /// Toggle light/dark and persist the preference.
  pub fn toggle_theme(&mut self) {
    self.theme_mode = self.theme_mode.toggle();
    Config { theme_mode: Some(self.theme_mode.label().to_string()) }.save();
  }

  /// Cycle the sort order. Applies immediately (no debounce); the session
  /// resets on the next tick.
  pub fn cycle_order(&mut self) {
    self.order = self.order.next();
  }

  /// Called after every edit of the search input.
  pub fn input_changed(&mut self, now: Instant) {
    self.debounced.set(self.input.trim().to_string(), now);
  }

  /// Commit the typed query immediately (Enter), bypassing the debounce,
  /// and re-issue the base request if it had failed.
  pub fn commit_query(&mut self) {
    self.debounced.flush();
    self.retry();
  }

  fn normalized_query(&self) -> String {
    query::normalize_query(&self.input, self.debounced.value(), query::daily_default_query()).to_string()
  }

  fn current_key(&self) -> QueryKey {
    QueryKey {
      query: self.loader.query().to_string(),
      order: self.loader.order(),
      page_token: self.loader.current_token().cloned(),
    }
  }

  fn fetching_current(&self) -> bool {
    self.cache.is_in_flight(&self.current_key())
  }

  // --- Event loop driving ---

  /// One pass of the update loop: settle the debounce, sync the session,
  /// keep the current page's fetch alive, drive the reveal timer, and check
  /// the scroll sentinel.
  pub fn tick(&mut self, now: Instant) {
    self.debounced.tick(now);

    let normalized = self.normalized_query();
    if self.loader.sync_session(&normalized, self.order) {
      self.last_error = None;
      self.failed_key = None;
      self.selected = 0;
      self.scroll_row = 0;
      self.sentinel_armed = true;
    }

    self.ensure_fetch(now);
    let fetching = self.fetching_current();
    self.loader.tick(fetching, now);
    self.check_sentinel(now);
  }

  /// Make sure a fetch for the session's current token exists, serving a
  /// fresh cache hit without a request. The loader's token set ignores
  /// cache replays.
  fn ensure_fetch(&mut self, now: Instant) {
    if self.loader.current_token_loaded() {
      return;
    }
    let key = self.current_key();
    if self.failed_key.as_ref() == Some(&key) {
      return;
    }
    match self.cache.lookup(&key, now) {
      Lookup::Fresh(response) => {
        debug!(query = %key.query, "serving page from cache");
        self.loader.apply(LoaderEvent::ResponseArrived(response), false, now);
      }
      Lookup::Pending => {}
      Lookup::Miss => self.spawn_fetch(key),
    }
  }

  fn spawn_fetch(&mut self, key: QueryKey) {
    info!(
      query = %key.query,
      order = key.order.api_value(),
      token = key.page_token.as_deref().unwrap_or("-"),
      "fetching page"
    );
    self.cache.mark_in_flight(key.clone());

    let client = self.client.clone();
    let base = self.backend_url.clone();
    let params = FetchParams {
      query: key.query.clone(),
      order: key.order,
      limit: constants().backend_limit,
      page_token: key.page_token.clone(),
    };

    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
      let _ = tx.send(api::fetch_videos(&client, &base, &params).await);
    });
    self.fetches.push(PendingFetch { key, rx, handle });
  }

  /// Drain completed background fetches.
  pub fn check_pending(&mut self) {
    let now = Instant::now();
    let mut i = 0;
    while i < self.fetches.len() {
      match self.fetches[i].rx.try_recv() {
        Ok(result) => {
          let fetch = self.fetches.swap_remove(i);
          self.finish_fetch(fetch.key, result, now);
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          i += 1;
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          let fetch = self.fetches.swap_remove(i);
          self.finish_fetch(fetch.key, Err(FetchError::Cancelled), now);
        }
      }
    }
  }

  fn finish_fetch(&mut self, key: QueryKey, result: Result<VideoResponse, FetchError>, now: Instant) {
    match result {
      Ok(response) => {
        self.cache.complete(key.clone(), response.clone(), now);
        if key == self.current_key() {
          self.loader.apply(LoaderEvent::ResponseArrived(response), false, now);
        } else {
          // Superseded by a query/order/token change: cached but not merged.
          debug!(query = %key.query, "discarding superseded response");
        }
      }
      Err(err) => {
        self.cache.fail(&key);
        if err.is_cancelled() {
          debug!(query = %key.query, "fetch cancelled");
          return;
        }
        if key != self.current_key() {
          return;
        }
        self.failed_key = Some(key);
        if self.loader.is_loading_more() {
          // Silent: the loading-more indicator clears, results stay.
          warn!(err = %err, "load-more fetch failed");
          self.loader.apply(LoaderEvent::FetchFailed, false, now);
        } else {
          warn!(err = %err, "search fetch failed");
          self.last_error = Some(err.to_string());
        }
      }
    }
  }

  /// Evaluate the scroll sentinel against current grid geometry.
  fn check_sentinel(&mut self, now: Instant) {
    if self.last_error.is_some() || self.loader.visible_items().is_empty() {
      return;
    }
    let total_rows = rows_for(self.loader.visible_items().len(), constants().grid_columns);
    if !self.sentinel.intersects(self.scroll_row, self.grid_viewport_rows, total_rows) {
      self.sentinel_armed = true;
      return;
    }
    if self.sentinel_armed {
      self.sentinel_armed = false;
      // A fresh hit is the retry path for a failed page fetch.
      if self.failed_key.as_ref().is_some_and(|k| k.page_token.is_some()) {
        self.failed_key = None;
      }
    }
    // While the current key is latched as failed no fetch can be issued, so
    // a hit would only re-enter loading-more with nothing to complete it.
    if self.failed_key.as_ref() == Some(&self.current_key()) {
      return;
    }
    let fetching = self.fetching_current();
    self.loader.apply(LoaderEvent::SentinelHit, fetching, now);
  }

  /// Manual retry of the base request (error state action). Clearing the
  /// failed-key latch lets the next tick re-issue the same request.
  pub fn retry(&mut self) {
    self.last_error = None;
    if let Some(key) = self.failed_key.take() {
      self.cache.invalidate(&key);
    }
  }

  // --- Grid navigation ---

  /// Move the selection by `delta` positions, clamped to the visible window,
  /// scrolling the grid to keep it on screen.
  pub fn move_selection(&mut self, delta: isize) {
    let len = self.loader.visible_items().len();
    if len == 0 {
      return;
    }
    let max = (len - 1) as isize;
    self.selected = (self.selected as isize + delta).clamp(0, max) as usize;

    let columns = constants().grid_columns;
    let row = self.selected / columns;
    if row < self.scroll_row {
      self.scroll_row = row;
    } else if self.grid_viewport_rows > 0 && row >= self.scroll_row + self.grid_viewport_rows {
      self.scroll_row = row + 1 - self.grid_viewport_rows;
    }
  }

  pub fn select_first(&mut self) {
    self.selected = 0;
    self.scroll_row = 0;
  }

  pub fn select_last(&mut self) {
    let len = self.loader.visible_items().len();
    if len > 0 {
      self.selected = 0;
      self.move_selection(len as isize - 1);
    }
  }

  /// Open the selected video's URL in the default browser.
  pub fn open_selected(&mut self) {
    let Some(item) = self.loader.visible_items().get(self.selected) else { return };
    let url = item.url.clone();

    #[cfg(target_os = "macos")]
    let cmd = "open";
    #[cfg(not(target_os = "macos"))]
    let cmd = "xdg-open";
    match std::process::Command::new(cmd)
      .arg(&url)
      .stdin(std::process::Stdio::null())
      .stdout(std::process::Stdio::null())
      .stderr(std::process::Stdio::null())
      .spawn()
    {
      Ok(mut child) => {
        // Reap the child in a background thread to avoid zombie processes.
        std::thread::spawn(move || {
          let _ = child.wait();
        });
      }
      Err(e) => {
        self.last_error = Some(format!("Failed to open browser: {}", e));
      }
    }
  }

  // --- Render state ---

  pub fn visible_items(&self) -> &[VideoItem] {
    self.loader.visible_items()
  }

  pub fn is_fetching(&self) -> bool {
    self.fetching_current()
  }

  pub fn is_loading_more(&self) -> bool {
    self.loader.is_loading_more()
  }

  pub fn end_reached(&self) -> bool {
    self.loader.end_reached()
  }

  pub fn buffered_len(&self) -> usize {
    self.loader.buffered_len()
  }

  pub fn active_query(&self) -> &str {
    self.loader.query()
  }

  /// Previous results shown dimmed while a new session's first page loads.
  pub fn placeholder_items(&self) -> Option<&[VideoItem]> {
    self.cache.placeholder().map(|r| r.items.as_slice()).filter(|items| !items.is_empty())
  }

  /// Abort remaining background fetches on shutdown.
  pub fn teardown(&mut self) {
    for fetch in &self.fetches {
      fetch.handle.abort();
    }
    self.fetches.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn app() -> App {
    App::new("http://127.0.0.1:9/search".to_string())
  }

  fn page(ids: std::ops::Range<usize>, next: Option<&str>) -> VideoResponse {
    VideoResponse {
      items: ids
        .map(|i| VideoItem {
          id: format!("vid-{i}"),
          title: format!("Video {i}"),
          thumbnail_url: String::new(),
          channel_title: "ch".to_string(),
          published_at: "2024-01-01T00:00:00Z".to_string(),
          url: String::new(),
        })
        .collect(),
      next_page_token: next.map(str::to_string),
    }
  }

  #[tokio::test]
  async fn startup_session_uses_daily_default_query() {
    let mut app = app();
    app.tick(Instant::now());
    assert_eq!(app.active_query(), query::daily_default_query());
    assert_eq!(app.order, Order::Relevance);
    app.teardown();
  }

  #[tokio::test]
  async fn order_change_resets_session_before_fetch() {
    let mut app = app();
    let t0 = Instant::now();
    app.tick(t0);
    app.selected = 4;
    app.scroll_row = 2;
    app.last_error = Some("boom".to_string());

    app.cycle_order();
    app.tick(t0 + Duration::from_millis(50));
    assert_eq!(app.order, Order::Date);
    assert_eq!(app.loader.order(), Order::Date);
    assert_eq!(app.selected, 0);
    assert_eq!(app.scroll_row, 0);
    assert!(app.last_error.is_none());
    app.teardown();
  }

  #[tokio::test]
  async fn typed_query_takes_effect_after_debounce() {
    let mut app = app();
    let t0 = Instant::now();
    app.tick(t0);

    app.input = "cats".to_string();
    app.input_changed(t0);
    app.tick(t0 + Duration::from_millis(100));
    // Still debouncing: the session keeps the default query.
    assert_eq!(app.active_query(), query::daily_default_query());

    app.tick(t0 + Duration::from_millis(600));
    assert_eq!(app.active_query(), "cats");
    app.teardown();
  }

  #[tokio::test]
  async fn commit_query_bypasses_debounce() {
    let mut app = app();
    let t0 = Instant::now();
    app.input = "dogs".to_string();
    app.input_changed(t0);
    app.commit_query();
    app.tick(t0);
    assert_eq!(app.active_query(), "dogs");
    app.teardown();
  }

  #[tokio::test]
  async fn failed_page_fetch_does_not_latch_the_loading_indicator() {
    let mut app = app();
    let t0 = Instant::now();
    // Viewport tall enough that the sentinel stays intersected throughout.
    app.grid_viewport_rows = 20;

    // First page arrives: 48 items buffered, more available behind T1.
    app.finish_fetch(app.current_key(), Ok(page(0..48, Some("T1"))), t0);

    // Hold at the bottom until the buffer is exhausted and the session
    // advances to the next page token.
    let mut t = t0;
    while app.loader.current_token().is_none() {
      t += Duration::from_millis(350);
      app.tick(t);
    }
    assert_eq!(app.visible_items().len(), 48);
    assert!(app.is_loading_more());

    // The T1 fetch fails silently.
    app.finish_fetch(app.current_key(), Err(FetchError::Http("boom".to_string())), t);
    assert!(app.last_error.is_none());
    assert!(!app.is_loading_more());

    // Still at the bottom: the indicator stays cleared, and no request is
    // re-issued for the failed key.
    for _ in 0..50 {
      t += Duration::from_millis(50);
      app.tick(t);
      assert!(!app.is_loading_more());
      assert!(app.fetches.is_empty());
    }
    assert_eq!(app.visible_items().len(), 48);

    // Scrolling away re-arms the sentinel; coming back clears the latch.
    app.grid_viewport_rows = 3;
    t += Duration::from_millis(50);
    app.tick(t);
    app.grid_viewport_rows = 20;
    t += Duration::from_millis(50);
    app.tick(t);
    assert!(app.failed_key.is_none());
    app.teardown();
  }

  #[test]
  fn move_selection_clamps_and_scrolls() {
    let mut app = app();
    // No items: a no-op.
    app.move_selection(5);
    assert_eq!(app.selected, 0);
  }
}

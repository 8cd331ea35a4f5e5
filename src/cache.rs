use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::api::VideoResponse;
use crate::query::Order;

/// Identity of one logical request. `page_token == None` is the first page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
  pub query: String,
  pub order: Order,
  pub page_token: Option<String>,
}

struct CacheEntry {
  response: VideoResponse,
  fetched_at: Instant,
}

/// Result of a cache lookup.
pub enum Lookup {
  /// A completed response within the freshness window; no fetch needed.
  Fresh(VideoResponse),
  /// A fetch for this key is already in flight.
  Pending,
  /// Nothing usable; the caller should start a fetch.
  Miss,
}

/// Keyed request cache: deduplicates in-flight requests, serves repeat
/// lookups from a freshness window, and keeps the most recently completed
/// response as stale-while-revalidate placeholder data.
pub struct QueryCache {
  entries: HashMap<QueryKey, CacheEntry>,
  in_flight: HashSet<QueryKey>,
  last_completed: Option<QueryKey>,
  fresh_for: Duration,
}

impl QueryCache {
  pub fn new(fresh_for: Duration) -> Self {
    Self { entries: HashMap::new(), in_flight: HashSet::new(), last_completed: None, fresh_for }
  }

  pub fn lookup(&self, key: &QueryKey, now: Instant) -> Lookup {
    if let Some(entry) = self.entries.get(key)
      && now.duration_since(entry.fetched_at) < self.fresh_for
    {
      return Lookup::Fresh(entry.response.clone());
    }
    if self.in_flight.contains(key) {
      return Lookup::Pending;
    }
    Lookup::Miss
  }

  pub fn is_in_flight(&self, key: &QueryKey) -> bool {
    self.in_flight.contains(key)
  }

  pub fn mark_in_flight(&mut self, key: QueryKey) {
    self.in_flight.insert(key);
  }

  /// Record a completed response for `key` and clear its in-flight mark.
  /// Entries past the freshness window are dropped here, so the map stays
  /// bounded by the requests of the last window.
  pub fn complete(&mut self, key: QueryKey, response: VideoResponse, now: Instant) {
    self.in_flight.remove(&key);
    let fresh_for = self.fresh_for;
    self.entries.retain(|_, entry| now.duration_since(entry.fetched_at) < fresh_for);
    self.entries.insert(key.clone(), CacheEntry { response, fetched_at: now });
    self.last_completed = Some(key);
  }

  /// Clear the in-flight mark for a failed fetch. Any stale entry stays
  /// evicted from the freshness window by its original timestamp.
  pub fn fail(&mut self, key: &QueryKey) {
    self.in_flight.remove(key);
  }

  /// Drop a completed entry so the next lookup misses (manual retry).
  pub fn invalidate(&mut self, key: &QueryKey) {
    self.entries.remove(key);
    if self.last_completed.as_ref() == Some(key) {
      self.last_completed = None;
    }
  }

  /// Most recently completed response, regardless of key or age. Shown as
  /// placeholder content while a new key's fetch resolves.
  pub fn placeholder(&self) -> Option<&VideoResponse> {
    self.last_completed.as_ref().and_then(|key| self.entries.get(key)).map(|entry| &entry.response)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::VideoItem;

  fn key(query: &str, token: Option<&str>) -> QueryKey {
    QueryKey { query: query.to_string(), order: Order::Relevance, page_token: token.map(str::to_string) }
  }

  fn response(n: usize) -> VideoResponse {
    let items = (0..n)
      .map(|i| VideoItem {
        id: format!("vid-{i}"),
        title: format!("Video {i}"),
        thumbnail_url: String::new(),
        channel_title: "ch".to_string(),
        published_at: "2024-01-01T00:00:00Z".to_string(),
        url: String::new(),
      })
      .collect();
    VideoResponse { items, next_page_token: None }
  }

  fn cache() -> (QueryCache, Instant) {
    (QueryCache::new(Duration::from_secs(60)), Instant::now())
  }

  #[test]
  fn miss_then_pending_then_fresh() {
    let (mut cache, t0) = cache();
    let k = key("cats", None);
    assert!(matches!(cache.lookup(&k, t0), Lookup::Miss));

    cache.mark_in_flight(k.clone());
    assert!(matches!(cache.lookup(&k, t0), Lookup::Pending));
    assert!(cache.is_in_flight(&k));

    cache.complete(k.clone(), response(2), t0);
    assert!(!cache.is_in_flight(&k));
    match cache.lookup(&k, t0 + Duration::from_secs(30)) {
      Lookup::Fresh(r) => assert_eq!(r.items.len(), 2),
      _ => panic!("expected fresh hit"),
    }
  }

  #[test]
  fn entries_expire_after_freshness_window() {
    let (mut cache, t0) = cache();
    let k = key("cats", None);
    cache.complete(k.clone(), response(1), t0);
    assert!(matches!(cache.lookup(&k, t0 + Duration::from_secs(61)), Lookup::Miss));
  }

  #[test]
  fn failure_clears_in_flight_without_storing() {
    let (mut cache, t0) = cache();
    let k = key("cats", None);
    cache.mark_in_flight(k.clone());
    cache.fail(&k);
    assert!(!cache.is_in_flight(&k));
    assert!(matches!(cache.lookup(&k, t0), Lookup::Miss));
  }

  #[test]
  fn completion_evicts_expired_entries() {
    let (mut cache, t0) = cache();
    cache.complete(key("cats", None), response(1), t0);
    cache.complete(key("cats", Some("T1")), response(1), t0 + Duration::from_secs(30));

    // Past the first entry's window: it is swept, the fresh one stays.
    cache.complete(key("dogs", None), response(1), t0 + Duration::from_secs(61));
    assert_eq!(cache.entries.len(), 2);
    assert!(!cache.entries.contains_key(&key("cats", None)));
    assert!(cache.entries.contains_key(&key("cats", Some("T1"))));
  }

  #[test]
  fn invalidate_forces_a_refetch() {
    let (mut cache, t0) = cache();
    let k = key("cats", None);
    cache.complete(k.clone(), response(1), t0);
    cache.invalidate(&k);
    assert!(matches!(cache.lookup(&k, t0), Lookup::Miss));
    assert!(cache.placeholder().is_none());
  }

  #[test]
  fn placeholder_tracks_latest_completion() {
    let (mut cache, t0) = cache();
    assert!(cache.placeholder().is_none());

    cache.complete(key("cats", None), response(1), t0);
    cache.complete(key("dogs", None), response(3), t0);
    assert_eq!(cache.placeholder().map(|r| r.items.len()), Some(3));
  }

  #[test]
  fn distinct_tokens_are_distinct_keys() {
    let (mut cache, t0) = cache();
    cache.complete(key("cats", None), response(1), t0);
    assert!(matches!(cache.lookup(&key("cats", Some("T1")), t0), Lookup::Miss));
  }
}

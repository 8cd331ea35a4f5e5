use chrono::Utc;

use crate::constants::constants;

/// Sort orders accepted by the backend search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
  #[default]
  Relevance,
  Date,
  ViewCount,
  Rating,
  Title,
}

impl Order {
  pub const ALL: [Order; 5] = [Order::Relevance, Order::Date, Order::ViewCount, Order::Rating, Order::Title];

  /// Wire value sent as the `order` query parameter.
  pub fn api_value(self) -> &'static str {
    match self {
      Order::Relevance => "relevance",
      Order::Date => "date",
      Order::ViewCount => "viewCount",
      Order::Rating => "rating",
      Order::Title => "title",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Order::Relevance => "Relevance",
      Order::Date => "Newest",
      Order::ViewCount => "Most viewed",
      Order::Rating => "Top rated",
      Order::Title => "Title A-Z",
    }
  }

  /// Cycle to the next sort order.
  pub fn next(self) -> Order {
    // Safety: position() over ALL always finds self; modular arithmetic stays in bounds.
    let idx = Order::ALL.iter().position(|o| *o == self).unwrap_or(0);
    Order::ALL[(idx + 1) % Order::ALL.len()]
  }
}

/// Default query for a given day index (days since the Unix epoch).
/// Stable within a calendar day, rotates daily through the fixed list.
pub fn default_query_for_day(day: u64) -> &'static str {
  let queries = &constants().default_queries;
  &queries[(day as usize) % queries.len()]
}

/// Today's rotating default query.
pub fn daily_default_query() -> &'static str {
  let day = (Utc::now().timestamp() / 86_400).max(0) as u64;
  default_query_for_day(day)
}

/// Effective query after trimming, debouncing, and default substitution:
/// the trimmed live input if non-empty, else the (already trimmed) debounced
/// input if non-empty, else the daily default.
pub fn normalize_query<'a>(input: &str, debounced: &'a str, default: &'a str) -> &'a str {
  if input.trim().is_empty() {
    default
  } else if debounced.is_empty() {
    default
  } else {
    debounced
  }
}

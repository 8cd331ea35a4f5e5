use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Padding, Paragraph},
};

use crate::api::VideoItem;
use crate::app::{App, AppMode};
use crate::constants::constants;
use crate::theme::Theme;

/// Terminal rows per video card (including its border).
const CARD_HEIGHT: u16 = 5;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// Render an RFC 3339 publication date as e.g. "May 1, 2024"; shown raw if unparsable.
fn format_published(raw: &str) -> String {
  chrono::DateTime::parse_from_rfc3339(raw).map(|d| d.format("%b %-d, %Y").to_string()).unwrap_or_else(|_| raw.to_string())
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, nav_area, main_area, status_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_nav(frame, app, nav_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ▶ onetv ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_nav(frame: &mut Frame, app: &mut App, area: Rect) {
  let order_w = (app.order.label().chars().count() + 6) as u16;
  let [input_area, order_area] = Layout::horizontal([Constraint::Min(20), Constraint::Length(order_w)]).areas(area);
  render_input(frame, app, input_area);
  render_order(frame, app, order_area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Input { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search videos ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if app.mode == AppMode::Input {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_order(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let block = Block::bordered()
    .title(" Sort ")
    .title_style(Style::default().fg(theme.muted))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1));
  let label = Line::from(vec![
    Span::styled("⇅ ", Style::default().fg(theme.muted)),
    Span::styled(app.order.label(), Style::default().fg(theme.fg)),
  ]);
  frame.render_widget(Paragraph::new(label).block(block), area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  if app.last_error.is_some() {
    render_error(frame, app, area);
    return;
  }
  if !app.visible_items().is_empty() {
    render_grid(frame, app, area, false);
    return;
  }
  if app.is_fetching() {
    if app.placeholder_items().is_some() {
      // Stale-while-revalidate: previous results, dimmed, while the new
      // session's first page resolves.
      render_grid(frame, app, area, true);
    } else {
      render_skeleton(frame, app, area);
    }
    return;
  }
  render_empty(frame, app.theme(), area);
}

/// The retry key differs per mode: `r` would type into the search box.
fn retry_hint(mode: AppMode) -> &'static str {
  match mode {
    AppMode::Input => "Press Enter to try again.",
    AppMode::Browse => "Press r to try again.",
  }
}

fn render_error(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let message = app.last_error.as_deref().unwrap_or("Something went wrong.");
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("We hit a snag", Style::default().fg(theme.error).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled(message.to_string(), Style::default().fg(theme.fg))),
    Line::from(""),
    Line::from(Span::styled(retry_hint(app.mode), Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text)
    .alignment(Alignment::Center)
    .block(Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border)));
  frame.render_widget(paragraph, area);
}

fn render_empty(frame: &mut Frame, theme: &Theme, area: Rect) {
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("No videos found", Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled("Try a different search or sort order.", Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text)
    .alignment(Alignment::Center)
    .block(Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border)));
  frame.render_widget(paragraph, area);
}

fn render_skeleton(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let columns = constants().grid_columns;
  let rows = (area.height / CARD_HEIGHT) as usize;
  for row in 0..rows {
    for col in 0..columns {
      let cell = grid_cell(area, row, col, columns);
      let block =
        Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border));
      let inner_w = cell.width.saturating_sub(2) as usize;
      let bar = |frac: usize| "░".repeat(inner_w * frac / 4);
      let lines = vec![
        Line::from(Span::styled(bar(4), Style::default().fg(theme.border))),
        Line::from(Span::styled(bar(3), Style::default().fg(theme.border))),
        Line::from(Span::styled(bar(2), Style::default().fg(theme.border))),
      ];
      frame.render_widget(Paragraph::new(lines).block(block), cell);
    }
  }
}

/// Area of one card in the grid, laid out left-to-right, top-to-bottom.
fn grid_cell(area: Rect, row: usize, col: usize, columns: usize) -> Rect {
  let card_w = area.width / columns as u16;
  Rect {
    x: area.x + col as u16 * card_w,
    y: area.y + row as u16 * CARD_HEIGHT,
    width: card_w,
    height: CARD_HEIGHT,
  }
}

fn render_grid(frame: &mut Frame, app: &mut App, area: Rect, dimmed: bool) {
  let columns = constants().grid_columns;

  // Reserve the last line for the loading-more indicator.
  let grid_area = Rect { height: area.height.saturating_sub(1), ..area };
  let viewport_rows = (grid_area.height / CARD_HEIGHT) as usize;
  app.grid_viewport_rows = viewport_rows.max(1);

  let items: Vec<VideoItem> = if dimmed {
    app.placeholder_items().unwrap_or_default().to_vec()
  } else {
    app.visible_items().to_vec()
  };
  let theme = app.theme();

  let total_rows = items.len().div_ceil(columns);
  if app.scroll_row + viewport_rows > total_rows {
    app.scroll_row = total_rows.saturating_sub(viewport_rows);
  }

  for row in 0..viewport_rows {
    let item_row = app.scroll_row + row;
    if item_row >= total_rows {
      break;
    }
    for col in 0..columns {
      let idx = item_row * columns + col;
      let Some(item) = items.get(idx) else { break };
      let cell = grid_cell(grid_area, row, col, columns);
      render_card(frame, theme, item, cell, !dimmed && idx == app.selected, dimmed);
    }
  }

  if app.is_loading_more() {
    let spinner_area = Rect { y: area.y + area.height.saturating_sub(1), height: 1, ..area };
    let frame_idx = (app.started_at.elapsed().as_millis() / 100) as usize % SPINNER_FRAMES.len();
    let line = Line::from(Span::styled(
      format!("{} Loading more videos…", SPINNER_FRAMES[frame_idx]),
      Style::default().fg(theme.accent),
    ));
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), spinner_area);
  }
}

fn render_card(frame: &mut Frame, theme: &Theme, item: &VideoItem, area: Rect, selected: bool, dimmed: bool) {
  let border_color = if selected { theme.accent } else { theme.border };
  let block = Block::bordered()
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let title_style = if dimmed {
    Style::default().fg(theme.muted)
  } else if selected {
    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(theme.fg)
  };

  let lines = vec![
    Line::from(Span::styled(truncate_str(&item.title, inner_w), title_style)),
    Line::from(Span::styled(truncate_str(&item.channel_title, inner_w), Style::default().fg(theme.muted))),
    Line::from(Span::styled(format_published(&item.published_at), Style::default().fg(theme.muted))),
  ];
  frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let visible = app.visible_items().len();
  let (text, style) = if app.last_error.is_some() {
    (" ⚠  Search failed".to_string(), Style::default().fg(theme.error))
  } else if visible == 0 && app.is_fetching() {
    (format!(" ⏳ Searching '{}'…", app.active_query()), Style::default().fg(theme.status))
  } else if app.is_loading_more() {
    (" ⏳ Loading more…".to_string(), Style::default().fg(theme.status))
  } else if visible > 0 && app.end_reached() && visible == app.buffered_len() {
    (format!(" All results loaded — {} videos", visible), Style::default().fg(theme.muted))
  } else if visible > 0 {
    (format!(" {} of {} videos", visible, app.buffered_len()), Style::default().fg(theme.muted))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let has_results = !app.visible_items().is_empty();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Input => {
      let mut k = vec![("Enter", "Search"), ("Tab", "Sort"), ("^t", "Theme")];
      if has_results {
        k.push(("↓", "Browse"));
      }
      k.push(("Esc", if app.input.is_empty() && !has_results { "Quit" } else { "Clear" }));
      k
    }
    AppMode::Browse => {
      let mut k = vec![("Enter", "Open"), ("hjkl", "Navigate"), ("Tab", "Sort")];
      if app.last_error.is_some() {
        k.push(("r", "Retry"));
      }
      k.push(("^t", "Theme"));
      k.push(("Esc", "Search"));
      k
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- truncate_str ---

  #[test]
  fn truncate_short_string_unchanged() {
    assert_eq!(truncate_str("hello", 10), "hello");
    assert_eq!(truncate_str("hello", 5), "hello");
  }

  #[test]
  fn truncate_long_string_adds_ellipsis() {
    assert_eq!(truncate_str("hello world", 6), "hello…");
  }

  // --- format_published ---

  #[test]
  fn rfc3339_dates_are_humanized() {
    assert_eq!(format_published("2024-05-01T12:00:00Z"), "May 1, 2024");
    assert_eq!(format_published("2023-12-25T00:00:00+02:00"), "Dec 25, 2023");
  }

  #[test]
  fn unparsable_dates_pass_through() {
    assert_eq!(format_published("yesterday"), "yesterday");
    assert_eq!(format_published(""), "");
  }

  // --- retry_hint ---

  #[test]
  fn retry_hint_matches_the_bound_key_per_mode() {
    assert_eq!(retry_hint(AppMode::Input), "Press Enter to try again.");
    assert_eq!(retry_hint(AppMode::Browse), "Press r to try again.");
  }

  // --- grid geometry ---

  #[test]
  fn grid_cells_tile_the_area() {
    let area = Rect { x: 0, y: 0, width: 90, height: 15 };
    let a = grid_cell(area, 0, 0, 3);
    let b = grid_cell(area, 0, 1, 3);
    let c = grid_cell(area, 1, 0, 3);
    assert_eq!(a.width, 30);
    assert_eq!(b.x, 30);
    assert_eq!(c.y, CARD_HEIGHT);
  }
}

use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use std::time::Instant;

use crate::app::{App, AppMode};
use crate::constants::constants;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  let now = Instant::now();

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.toggle_theme();
    return;
  }

  // Sort order applies immediately, in any mode.
  if key.code == KeyCode::Tab {
    app.cycle_order();
    return;
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key, now),
    AppMode::Browse => handle_browse_key(app, key),
  }
}

fn handle_input_key(app: &mut App, key: event::KeyEvent, now: Instant) {
  match key.code {
    KeyCode::Enter => {
      app.commit_query();
      if !app.visible_items().is_empty() {
        app.mode = AppMode::Browse;
      }
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
      app.input_changed(now);
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
        app.input_changed(now);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
        app.input_changed(now);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
        app.input_changed(now);
      } else if !app.visible_items().is_empty() {
        app.mode = AppMode::Browse;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if !app.visible_items().is_empty() {
        app.mode = AppMode::Browse;
      }
    }
    _ => {}
  }
}

fn handle_browse_key(app: &mut App, key: event::KeyEvent) {
  let columns = constants().grid_columns as isize;
  match key.code {
    KeyCode::Enter => {
      app.open_selected();
    }
    KeyCode::Char('r') => {
      if app.last_error.is_some() {
        app.retry();
      }
    }
    KeyCode::Char('/') => {
      app.mode = AppMode::Input;
    }
    KeyCode::Down | KeyCode::Char('j') => app.move_selection(columns),
    KeyCode::Up | KeyCode::Char('k') => app.move_selection(-columns),
    KeyCode::Right | KeyCode::Char('l') => app.move_selection(1),
    KeyCode::Left | KeyCode::Char('h') => app.move_selection(-1),
    KeyCode::PageDown => app.move_selection(columns * app.grid_viewport_rows.max(1) as isize),
    KeyCode::PageUp => app.move_selection(-columns * app.grid_viewport_rows.max(1) as isize),
    KeyCode::Char('g') => app.select_first(),
    KeyCode::Char('G') => app.select_last(),
    KeyCode::Esc => {
      app.mode = AppMode::Input;
    }
    _ => {}
  }
}

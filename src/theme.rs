use ratatui::style::Color;

/// Persisted theme preference. Anything other than "light" resolves to dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
  Light,
  #[default]
  Dark,
}

impl ThemeMode {
  pub fn label(self) -> &'static str {
    match self {
      ThemeMode::Light => "light",
      ThemeMode::Dark => "dark",
    }
  }

  pub fn from_config(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "light" => ThemeMode::Light,
      _ => ThemeMode::Dark,
    }
  }

  pub fn toggle(self) -> Self {
    match self {
      ThemeMode::Light => ThemeMode::Dark,
      ThemeMode::Dark => ThemeMode::Light,
    }
  }
}

/// Color palette for one theme.
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub muted: Color,
  pub accent: Color,
  pub border: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

const DARK: Theme = Theme {
  name: "dark",
  bg: Color::Rgb(16, 18, 24),
  fg: Color::Rgb(220, 223, 228),
  muted: Color::Rgb(120, 126, 140),
  accent: Color::Rgb(97, 175, 239),
  border: Color::Rgb(58, 63, 76),
  status: Color::Rgb(152, 195, 121),
  error: Color::Rgb(224, 108, 117),
  key_fg: Color::Rgb(16, 18, 24),
  key_bg: Color::Rgb(120, 126, 140),
};

const LIGHT: Theme = Theme {
  name: "light",
  bg: Color::Rgb(250, 250, 248),
  fg: Color::Rgb(40, 44, 52),
  muted: Color::Rgb(130, 135, 145),
  accent: Color::Rgb(0, 102, 204),
  border: Color::Rgb(200, 203, 210),
  status: Color::Rgb(64, 128, 64),
  error: Color::Rgb(190, 48, 58),
  key_fg: Color::Rgb(250, 250, 248),
  key_bg: Color::Rgb(130, 135, 145),
};

pub fn theme_for(mode: ThemeMode) -> &'static Theme {
  match mode {
    ThemeMode::Light => &LIGHT,
    ThemeMode::Dark => &DARK,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_config_recognizes_light() {
    assert_eq!(ThemeMode::from_config("light"), ThemeMode::Light);
    assert_eq!(ThemeMode::from_config("Light"), ThemeMode::Light);
  }

  #[test]
  fn from_config_defaults_to_dark() {
    assert_eq!(ThemeMode::from_config("dark"), ThemeMode::Dark);
    assert_eq!(ThemeMode::from_config(""), ThemeMode::Dark);
    assert_eq!(ThemeMode::from_config("solarized"), ThemeMode::Dark);
  }

  #[test]
  fn toggle_round_trips() {
    assert_eq!(ThemeMode::Dark.toggle(), ThemeMode::Light);
    assert_eq!(ThemeMode::Light.toggle().toggle(), ThemeMode::Light);
  }

  #[test]
  fn theme_for_matches_mode_label() {
    assert_eq!(theme_for(ThemeMode::Dark).name, "dark");
    assert_eq!(theme_for(ThemeMode::Light).name, "light");
  }
}

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::theme::ThemeMode;

#[derive(Serialize, Deserialize, Default, Debug)]
pub struct Config {
  pub theme_mode: Option<String>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "onetv") {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "onetv") {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }

  /// Stored theme mode; absent or unrecognized values resolve to dark.
  pub fn theme_mode(&self) -> ThemeMode {
    self.theme_mode.as_deref().map(ThemeMode::from_config).unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_theme_defaults_to_dark() {
    let config = Config::default();
    assert_eq!(config.theme_mode(), ThemeMode::Dark);
  }

  #[test]
  fn invalid_theme_defaults_to_dark() {
    let config = Config { theme_mode: Some("mauve".to_string()) };
    assert_eq!(config.theme_mode(), ThemeMode::Dark);
  }

  #[test]
  fn stored_light_theme_round_trips() {
    let config = Config { theme_mode: Some("light".to_string()) };
    assert_eq!(config.theme_mode(), ThemeMode::Light);
    let serialized = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&serialized).unwrap();
    assert_eq!(parsed.theme_mode(), ThemeMode::Light);
  }
}

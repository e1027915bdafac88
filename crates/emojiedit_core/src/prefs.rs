//! Persisted UI preferences: split-pane ratios and the theme flag.
//!
//! Values are stored as strings under fixed keys in a small JSON object, the
//! same shape a browser's local storage would hold. Anything malformed or out
//! of range is dropped at load time and the default takes its place.

use crate::constants::{PREF_KEY_SPLIT_HEIGHT, PREF_KEY_SPLIT_WIDTH, PREF_KEY_THEME};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Editor/preview split, in percent of the container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPrefs {
    pub width: f64,
    pub height: f64,
}

impl LayoutPrefs {
    pub const WIDTH_RANGE: (f64, f64) = (20.0, 80.0);
    pub const HEIGHT_RANGE: (f64, f64) = (40.0, 95.0);
    pub const DEFAULT_WIDTH: f64 = 50.0;
    pub const DEFAULT_HEIGHT: f64 = 85.0;

    /// Clamp a drag result into the allowed ranges.
    pub fn resize(width: f64, height: f64) -> Self {
        Self {
            width: clamp_or_default(width, Self::WIDTH_RANGE, Self::DEFAULT_WIDTH),
            height: clamp_or_default(height, Self::HEIGHT_RANGE, Self::DEFAULT_HEIGHT),
        }
    }

    fn width_from_stored(raw: Option<&str>) -> f64 {
        parse_in_range(raw, Self::WIDTH_RANGE).unwrap_or(Self::DEFAULT_WIDTH)
    }

    fn height_from_stored(raw: Option<&str>) -> f64 {
        parse_in_range(raw, Self::HEIGHT_RANGE).unwrap_or(Self::DEFAULT_HEIGHT)
    }
}

impl Default for LayoutPrefs {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
        }
    }
}

fn clamp_or_default(value: f64, (min, max): (f64, f64), default: f64) -> f64 {
    if value.is_nan() {
        default
    } else {
        value.clamp(min, max)
    }
}

fn parse_in_range(raw: Option<&str>, (min, max): (f64, f64)) -> Option<f64> {
    let value: f64 = raw?.trim().parse().ok()?;
    (value.is_finite() && (min..=max).contains(&value)).then_some(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    /// Stored value if valid, otherwise the system preference, otherwise dark.
    pub fn initial(stored: Option<&str>, system_prefers_light: bool) -> Self {
        match stored.and_then(|raw| raw.parse().ok()) {
            Some(theme) => theme,
            None if system_prefers_light => Self::Light,
            None => Self::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            _ => Err(()),
        }
    }
}

/// Active theme with a single mutation entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeState {
    theme: Theme,
}

impl ThemeState {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toggle(&mut self) -> Theme {
        self.theme = self.theme.opposite();
        self.theme
    }
}

/// Everything that survives a restart.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Preferences {
    pub layout: LayoutPrefs,
    /// `None` until the user picks a theme; the system default applies then.
    pub theme: Option<Theme>,
}

impl Preferences {
    fn from_entries(entries: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| entries.get(key).map(String::as_str);
        Self {
            layout: LayoutPrefs {
                width: LayoutPrefs::width_from_stored(get(PREF_KEY_SPLIT_WIDTH)),
                height: LayoutPrefs::height_from_stored(get(PREF_KEY_SPLIT_HEIGHT)),
            },
            theme: get(PREF_KEY_THEME).and_then(|raw| raw.parse().ok()),
        }
    }

    fn to_entries(self) -> BTreeMap<String, String> {
        let mut entries = BTreeMap::new();
        entries.insert(PREF_KEY_SPLIT_WIDTH.to_string(), self.layout.width.to_string());
        entries.insert(
            PREF_KEY_SPLIT_HEIGHT.to_string(),
            self.layout.height.to_string(),
        );
        if let Some(theme) = self.theme {
            entries.insert(PREF_KEY_THEME.to_string(), theme.to_string());
        }
        entries
    }

    pub fn theme_or_default(&self, system_prefers_light: bool) -> Theme {
        Theme::initial(self.theme.map(Theme::as_str), system_prefers_light)
    }
}

/// File-backed preference storage, read once and written on every change.
#[derive(Debug)]
pub struct PrefsStore {
    path: PathBuf,
    prefs: Preferences,
}

impl PrefsStore {
    /// Load preferences from `path`, falling back to defaults on any problem.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let prefs = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&raw) {
                Ok(map) => {
                    let entries: BTreeMap<String, String> = map
                        .into_iter()
                        .filter_map(|(key, value)| match value {
                            serde_json::Value::String(text) => Some((key, text)),
                            serde_json::Value::Number(number) => Some((key, number.to_string())),
                            _ => None,
                        })
                        .collect();
                    Preferences::from_entries(&entries)
                }
                Err(err) => {
                    debug!("Ignoring malformed preferences at {}: {}", path.display(), err);
                    Preferences::default()
                }
            },
            Err(err) => {
                debug!("No stored preferences at {}: {}", path.display(), err);
                Preferences::default()
            }
        };
        Self { path, prefs }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs
    }

    /// Clamp and store a new split.
    pub fn set_layout(&mut self, width: f64, height: f64) -> LayoutPrefs {
        self.prefs.layout = LayoutPrefs::resize(width, height);
        self.persist();
        self.prefs.layout
    }

    /// Flip the theme and store the result.
    pub fn toggle_theme(&mut self, system_prefers_light: bool) -> Theme {
        let mut state = ThemeState::new(self.prefs.theme_or_default(system_prefers_light));
        let theme = state.toggle();
        self.prefs.theme = Some(theme);
        self.persist();
        theme
    }

    fn persist(&self) {
        if let Err(err) = self.write() {
            warn!(
                "Failed to persist preferences to {}: {}",
                self.path.display(),
                err
            );
        }
    }

    fn write(&self) -> Result<(), crate::AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string_pretty(&self.prefs.to_entries())?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resize_clamps_into_bounds() {
        assert_eq!(
            LayoutPrefs::resize(5.0, 120.0),
            LayoutPrefs {
                width: 20.0,
                height: 95.0
            }
        );
        assert_eq!(LayoutPrefs::resize(f64::NAN, 60.0).width, 50.0);
    }

    #[test]
    fn stored_values_outside_range_revert_individually() {
        let mut entries = BTreeMap::new();
        entries.insert(PREF_KEY_SPLIT_WIDTH.to_string(), "95".to_string());
        entries.insert(PREF_KEY_SPLIT_HEIGHT.to_string(), "60".to_string());
        entries.insert(PREF_KEY_THEME.to_string(), "sepia".to_string());
        let prefs = Preferences::from_entries(&entries);
        assert_eq!(prefs.layout.width, 50.0);
        assert_eq!(prefs.layout.height, 60.0);
        assert_eq!(prefs.theme, None);
    }

    #[test]
    fn theme_initial_prefers_stored_then_system() {
        assert_eq!(Theme::initial(Some("light"), false), Theme::Light);
        assert_eq!(Theme::initial(Some("dark"), true), Theme::Dark);
        assert_eq!(Theme::initial(Some("neon"), true), Theme::Light);
        assert_eq!(Theme::initial(None, false), Theme::Dark);
    }

    #[test]
    fn theme_state_toggles_back_and_forth() {
        let mut state = ThemeState::new(Theme::Dark);
        assert_eq!(state.toggle(), Theme::Light);
        assert_eq!(state.toggle(), Theme::Dark);
        assert_eq!(state.theme(), Theme::Dark);
    }

    #[test]
    fn store_round_trips_through_disk() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("nested").join("prefs.json");
        {
            let mut store = PrefsStore::open(&path);
            assert_eq!(store.preferences(), Preferences::default());
            store.set_layout(33.5, 70.0);
            assert_eq!(store.toggle_theme(false), Theme::Light);
        }
        let reopened = PrefsStore::open(&path);
        let prefs = reopened.preferences();
        assert_eq!(prefs.layout.width, 33.5);
        assert_eq!(prefs.layout.height, 70.0);
        assert_eq!(prefs.theme, Some(Theme::Light));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").expect("write");
        assert_eq!(PrefsStore::open(&path).preferences(), Preferences::default());

        std::fs::write(
            &path,
            r#"{"emoji_editor_split_width": 42, "emoji_editor_split_height": "abc"}"#,
        )
        .expect("write");
        let prefs = PrefsStore::open(&path).preferences();
        assert_eq!(prefs.layout.width, 42.0);
        assert_eq!(prefs.layout.height, 85.0);
    }
}

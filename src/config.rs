//! Diff preferences handling

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::error::DiffError;

/// Serialized value of [`Context::WholeFile`].
pub const WHOLE_FILE: i64 = -1;

/// Number of unchanged lines shown around each change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Lines(u32),
    WholeFile,
}

impl Context {
    /// Context from its serialized form, where any negative value means the
    /// whole file.
    #[must_use]
    pub fn from_value(value: i64) -> Self {
        if value < 0 {
            Self::WholeFile
        } else {
            Self::Lines(u32::try_from(value).unwrap_or(u32::MAX))
        }
    }

    #[must_use]
    pub fn value(self) -> i64 {
        match self {
            Self::Lines(n) => i64::from(n),
            Self::WholeFile => WHOLE_FILE,
        }
    }
}

impl Serialize for Context {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.value())
    }
}

impl<'de> Deserialize<'de> for Context {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::from_value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffPrefs {
    pub context: Context,
    pub tab_size: i64,
    pub line_length: i64,
    pub show_tabs: bool,
    pub show_whitespace_errors: bool,
    pub line_wrapping: bool,
    /// Overrides how many lines are rendered before yielding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_lines_rendered_at_once: Option<u32>,
}

impl Default for DiffPrefs {
    fn default() -> Self {
        Self {
            context: Context::Lines(10),
            tab_size: 8,
            line_length: 100,
            show_tabs: true,
            show_whitespace_errors: true,
            line_wrapping: false,
            num_lines_rendered_at_once: None,
        }
    }
}

impl DiffPrefs {
    /// Check values the renderer cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`DiffError::InvalidPreference`] for a non-positive `tab_size`
    /// or `line_length`.
    pub const fn validate(&self) -> Result<(), DiffError> {
        if self.tab_size <= 0 {
            return Err(DiffError::InvalidPreference {
                name: "tab_size",
                value: self.tab_size,
            });
        }
        if self.line_length <= 0 {
            return Err(DiffError::InvalidPreference {
                name: "line_length",
                value: self.line_length,
            });
        }
        Ok(())
    }
}

/// Load preferences from the user's config directory.
///
/// # Errors
///
/// Returns an error if the prefs file exists but cannot be read or parsed.
pub fn load_prefs() -> anyhow::Result<Option<DiffPrefs>> {
    let Some(path) = prefs_path() else {
        return Ok(None);
    };
    load_prefs_from_path(&path)
}

/// Load preferences from `path`; a missing file is `None`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_prefs_from_path(path: &Path) -> anyhow::Result<Option<DiffPrefs>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read prefs: {}", path.display()))?;
    let prefs = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse prefs: {}", path.display()))?;
    Ok(Some(prefs))
}

/// Save preferences to the user's config directory.
///
/// # Errors
///
/// Returns an error if the config directory cannot be created or the file cannot be written.
pub fn save_prefs(prefs: &DiffPrefs) -> anyhow::Result<()> {
    let Some(path) = prefs_path() else {
        return Ok(());
    };
    save_prefs_to_path(prefs, &path)
}

/// Write preferences to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be written.
pub fn save_prefs_to_path(prefs: &DiffPrefs, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(prefs)?;
    std::fs::write(path, contents)?;
    Ok(())
}

fn prefs_path() -> Option<PathBuf> {
    let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg)
    } else if let Ok(home) = std::env::var("HOME") {
        Path::new(&home).join(".config")
    } else {
        return None;
    };

    Some(base.join(".reviewdiff").join("prefs.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_context_is_whole_file() {
        let prefs: DiffPrefs = serde_json::from_str(r#"{"context": -1}"#).unwrap();
        assert_eq!(prefs.context, Context::WholeFile);
        assert_eq!(prefs.tab_size, 8);

        let prefs: DiffPrefs = serde_json::from_str(r#"{"context": 3}"#).unwrap();
        assert_eq!(prefs.context, Context::Lines(3));
    }

    #[test]
    fn validate_rejects_non_positive_sizes() {
        assert!(DiffPrefs::default().validate().is_ok());

        let prefs = DiffPrefs {
            tab_size: 0,
            ..DiffPrefs::default()
        };
        assert_eq!(
            prefs.validate(),
            Err(DiffError::InvalidPreference {
                name: "tab_size",
                value: 0
            })
        );

        let prefs = DiffPrefs {
            line_length: -4,
            ..DiffPrefs::default()
        };
        assert_eq!(
            prefs.validate(),
            Err(DiffError::InvalidPreference {
                name: "line_length",
                value: -4
            })
        );
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_prefs_from_path(&dir.path().join("prefs.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn saved_prefs_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        let prefs = DiffPrefs {
            context: Context::WholeFile,
            show_tabs: false,
            num_lines_rendered_at_once: Some(50),
            ..DiffPrefs::default()
        };

        save_prefs_to_path(&prefs, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"context\": -1"));
        assert_eq!(load_prefs_from_path(&path).unwrap(), Some(prefs));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_prefs_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse prefs"));
    }
}

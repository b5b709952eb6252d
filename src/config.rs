// TOML build configuration

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::SizeSpec;
use crate::pipeline::bitmap::DEFAULT_SIZES;
use crate::pipeline::windows::ShadowConfig;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub theme: ThemeSection,
    pub config: ConfigSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowConfig>,
    #[serde(default)]
    pub cursors: CursorsSection,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ThemeSection {
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub website: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigSection {
    pub bitmaps_dir: PathBuf,
    pub out_dir: PathBuf,
    #[serde(default = "default_platforms")]
    pub platforms: Vec<Platform>,
    /// Worker threads for the batch build, 0 lets rayon decide.
    #[serde(default)]
    pub thread_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    X11,
    Windows,
}

fn default_platforms() -> Vec<Platform> {
    vec![Platform::X11, Platform::Windows]
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CursorsSection {
    #[serde(default)]
    pub fallback_settings: CursorSettings,
    #[serde(flatten)]
    pub entries: BTreeMap<String, CursorSettings>,
}

/// Per-cursor settings. Unset fields fall back to `fallback_settings`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CursorSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub png: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x11_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_hotspot: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_hotspot: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x11_sizes: Option<SizeList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_sizes: Option<SizeList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x11_delay: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_delay: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeValue {
    Pixels(u32),
    Spec(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeList {
    One(SizeValue),
    Many(Vec<SizeValue>),
}

impl SizeList {
    pub fn specs(&self) -> Result<Vec<SizeSpec>> {
        let values = match self {
            SizeList::One(value) => std::slice::from_ref(value),
            SizeList::Many(values) => values.as_slice(),
        };

        values
            .iter()
            .map(|value| match value {
                SizeValue::Pixels(size) => Ok(SizeSpec::Size(*size)),
                SizeValue::Spec(spec) => spec.parse::<SizeSpec>().map_err(|e| anyhow!(e)),
            })
            .collect()
    }
}

/// Windows output requested for a cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowsTarget {
    pub name: String,
    pub sizes: Vec<SizeSpec>,
    pub delay: u32,
}

/// A cursor entry with every fallback applied.
#[derive(Clone, Debug, PartialEq)]
pub struct CursorJob {
    pub key: String,
    pub png: String,
    pub hotspot: (u32, u32),
    pub x11_name: String,
    pub x11_sizes: Vec<SizeSpec>,
    pub x11_delay: u32,
    pub windows: Option<WindowsTarget>,
}

impl CursorSettings {
    pub fn resolve(&self, key: &str, fallback: &CursorSettings) -> Result<CursorJob> {
        let png = self
            .png
            .clone()
            .or_else(|| fallback.png.clone())
            .ok_or_else(|| anyhow!("cursor '{}' has no 'png' pattern", key))?;

        let x_hotspot = self.x_hotspot.or(fallback.x_hotspot);
        let y_hotspot = self.y_hotspot.or(fallback.y_hotspot);
        let hotspot = match (x_hotspot, y_hotspot) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(anyhow!("cursor '{}' has no hotspot", key)),
        };

        let sizes = |own: &Option<SizeList>, fb: &Option<SizeList>| -> Result<Vec<SizeSpec>> {
            match own.as_ref().or(fb.as_ref()) {
                Some(list) => list
                    .specs()
                    .with_context(|| format!("invalid sizes for cursor '{}'", key)),
                None => Ok(DEFAULT_SIZES.iter().map(|&s| SizeSpec::Size(s)).collect()),
            }
        };

        let windows = match self.win_name.clone() {
            Some(name) => Some(WindowsTarget {
                name: file_name(key, "win_name", name)?,
                sizes: sizes(&self.win_sizes, &fallback.win_sizes)?,
                delay: self.win_delay.or(fallback.win_delay).unwrap_or(0),
            }),
            None => None,
        };

        Ok(CursorJob {
            key: key.to_string(),
            png,
            hotspot,
            x11_name: file_name(
                key,
                "x11_name",
                self.x11_name.clone().unwrap_or_else(|| key.to_string()),
            )?,
            x11_sizes: sizes(&self.x11_sizes, &fallback.x11_sizes)?,
            x11_delay: self.x11_delay.or(fallback.x11_delay).unwrap_or(0),
            windows,
        })
    }
}

/// Output names become single path components.
fn file_name(key: &str, field: &str, name: String) -> Result<String> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(anyhow!("cursor '{}' has an invalid {} '{}'", key, field, name));
    }
    Ok(name)
}

impl ThemeConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load a config file; relative directories resolve against its location.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.config.bitmaps_dir = absolute_path(base, &config.config.bitmaps_dir);
        config.config.out_dir = absolute_path(base, &config.config.out_dir);
        Ok(config)
    }

    pub fn has_platform(&self, platform: Platform) -> bool {
        self.config.platforms.contains(&platform)
    }

    pub fn jobs(&self) -> Result<Vec<CursorJob>> {
        self.cursors
            .entries
            .iter()
            .map(|(key, settings)| settings.resolve(key, &self.cursors.fallback_settings))
            .collect()
    }
}

fn absolute_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
[theme]
name = "Sample"
comment = "Sample cursors"

[config]
bitmaps_dir = "bitmaps"
out_dir = "themes"
platforms = ["x11"]

[shadow]
color = [0, 0, 0, 100]

[cursors.fallback_settings]
x11_sizes = [22, "24:32"]
win_sizes = 32
x11_delay = 30
win_delay = 2
x_hotspot = 1
y_hotspot = 2

[cursors.wait]
png = "wait-*.png"
win_name = "Busy"
x_hotspot = 16
y_hotspot = 17

[cursors.left_ptr]
png = "left_ptr.png"
x11_name = "default"
x11_sizes = "48"
"#;

    #[test]
    fn test_parse_sample() {
        let config = ThemeConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.theme.name, "Sample");
        assert_eq!(config.config.platforms, vec![Platform::X11]);
        assert!(!config.has_platform(Platform::Windows));
        assert_eq!(config.config.thread_count, 0);

        let shadow = config.shadow.as_ref().unwrap();
        assert_eq!(shadow.color, [0, 0, 0, 100]);
        assert_eq!(shadow.blur, 3.125);

        assert_eq!(config.cursors.entries.len(), 2);
        assert!(!config.cursors.entries.contains_key("fallback_settings"));
    }

    #[test]
    fn test_jobs_apply_fallbacks() {
        let config = ThemeConfig::from_toml_str(SAMPLE).unwrap();
        let jobs = config.jobs().unwrap();

        // BTreeMap order
        let left_ptr = &jobs[0];
        assert_eq!(left_ptr.x11_name, "default");
        assert_eq!(left_ptr.hotspot, (1, 2));
        assert_eq!(left_ptr.x11_sizes, vec![SizeSpec::Size(48)]);
        assert_eq!(left_ptr.x11_delay, 30);
        assert!(left_ptr.windows.is_none());

        let wait = &jobs[1];
        assert_eq!(wait.x11_name, "wait");
        assert_eq!(wait.hotspot, (16, 17));
        assert_eq!(
            wait.x11_sizes,
            vec![
                SizeSpec::Size(22),
                SizeSpec::Canvas {
                    size: 24,
                    canvas: 32
                }
            ]
        );
        assert_eq!(
            wait.windows,
            Some(WindowsTarget {
                name: "Busy".to_string(),
                sizes: vec![SizeSpec::Size(32)],
                delay: 2,
            })
        );
    }

    #[test]
    fn test_missing_hotspot_and_defaults() {
        let config = ThemeConfig::from_toml_str(
            r#"
[theme]
name = "T"
[config]
bitmaps_dir = "b"
out_dir = "o"
[cursors.text]
png = "text.png"
"#,
        )
        .unwrap();
        assert_eq!(config.config.platforms, vec![Platform::X11, Platform::Windows]);
        assert!(config.jobs().is_err());

        let settings = CursorSettings {
            png: Some("text.png".to_string()),
            x_hotspot: Some(0),
            y_hotspot: Some(0),
            ..Default::default()
        };
        let job = settings.resolve("text", &CursorSettings::default()).unwrap();
        assert_eq!(job.x11_sizes.len(), DEFAULT_SIZES.len());
        assert_eq!(job.x11_delay, 0);
    }

    #[test]
    fn test_bad_size_spec() {
        let settings = CursorSettings {
            png: Some("a.png".to_string()),
            x_hotspot: Some(0),
            y_hotspot: Some(0),
            x11_sizes: Some(SizeList::One(SizeValue::Spec("huge".to_string()))),
            ..Default::default()
        };
        assert!(settings.resolve("a", &CursorSettings::default()).is_err());
    }

    #[test]
    fn test_output_names_stay_in_theme() {
        let base = CursorSettings {
            png: Some("a.png".to_string()),
            x_hotspot: Some(0),
            y_hotspot: Some(0),
            ..Default::default()
        };
        let fallback = CursorSettings::default();

        for bad in ["../x", "sub/x", "a\\b", "..", ""] {
            let win = CursorSettings {
                win_name: Some(bad.to_string()),
                ..base.clone()
            };
            assert!(win.resolve("a", &fallback).is_err(), "win_name {:?}", bad);

            let x11 = CursorSettings {
                x11_name: Some(bad.to_string()),
                ..base.clone()
            };
            assert!(x11.resolve("a", &fallback).is_err(), "x11_name {:?}", bad);
        }

        let ok = CursorSettings {
            win_name: Some("Busy.v2".to_string()),
            ..base
        };
        assert!(ok.resolve("a", &fallback).is_ok());
    }

    #[test]
    fn test_load_from_file_resolves_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("build.toml");
        fs::write(&path, SAMPLE).unwrap();

        let config = ThemeConfig::load_from_file(&path).unwrap();
        assert_eq!(config.config.bitmaps_dir, dir.path().join("bitmaps"));
        assert_eq!(config.config.out_dir, dir.path().join("themes"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ThemeConfig::from_toml_str(SAMPLE).unwrap();
        let text = config.to_toml_string().unwrap();
        let again = ThemeConfig::from_toml_str(&text).unwrap();
        assert_eq!(again.jobs().unwrap(), config.jobs().unwrap());
    }
}

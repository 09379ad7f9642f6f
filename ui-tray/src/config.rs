use anyhow::Context;

use std::num::NonZeroUsize;
use std::path::PathBuf;

use menukit::capability::Platform;
use menukit::session::DEFAULT_SPLIT_AFTER;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrayConfig {
    #[serde(default = "default_language")]
    pub language: String,

    /// Lists longer than this are folded into sub-menus.
    #[serde(default = "default_split_after")]
    pub split_after: usize,

    /// Directory with `<id>.png` icons (`tray.png` for the tray itself).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_dir: Option<PathBuf>,

    /// Override for menu quirks, e.g. "macos". Defaults to the build target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub downloads: Vec<DownloadEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DownloadEntry {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub stopped: bool,
    #[serde(default)]
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_split_after() -> usize {
    DEFAULT_SPLIT_AFTER
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            split_after: default_split_after(),
            icon_dir: None,
            platform: None,
            categories: Vec::new(),
            tags: Vec::new(),
            downloads: Vec::new(),
        }
    }
}

impl TrayConfig {
    pub fn split_after(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.split_after).unwrap_or_else(|| {
            log::warn!("split_after must be at least 1, using {DEFAULT_SPLIT_AFTER}");
            NonZeroUsize::new(DEFAULT_SPLIT_AFTER).unwrap_or(NonZeroUsize::MIN)
        })
    }

    pub fn platform(&self) -> Platform {
        match self.platform.as_deref() {
            None => Platform::current(),
            Some(name) => Platform::parse(name).unwrap_or_else(|| {
                log::warn!("unknown platform {name:?} in config, using build target");
                Platform::current()
            }),
        }
    }
}

pub fn config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
    base.join("menukit").join("tray.toml")
}

pub fn parse_config(s: &str) -> anyhow::Result<TrayConfig> {
    let mut cfg: TrayConfig = toml::from_str(s).context("parse config")?;

    let mut seen = std::collections::HashSet::new();
    cfg.downloads.retain(|d| {
        let fresh = seen.insert(d.id);
        if !fresh {
            log::warn!("duplicate download id {} ({}) ignored", d.id, d.name);
        }
        fresh
    });

    Ok(cfg)
}

pub fn load_config() -> anyhow::Result<TrayConfig> {
    let path = config_path();
    let s = std::fs::read_to_string(&path).with_context(|| format!("read config {}", path.display()))?;
    parse_config(&s)
}

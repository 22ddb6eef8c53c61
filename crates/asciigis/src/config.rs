//! Configuration loading and merging.
//!
//! Config is loaded from two sources with the working directory taking
//! precedence:
//! 1. User-level: `~/.config/asciigis/config.toml`
//! 2. Project-level: `./asciigis.toml`
//!
//! Carries the project search paths, the show-help-on-startup flag, and
//! the focus hotkey chords. Uses TOML format with serde.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

const DEFAULT_FOCUS_COMMAND: &str = "ctrl+e";
const DEFAULT_FOCUS_LEGEND: &str = "ctrl+l";
const DEFAULT_FOCUS_MAP: &str = "ctrl+w";

#[derive(Debug, Clone)]
pub struct Config {
    pub paths: Vec<PathBuf>,
    pub show_help: bool,
    pub keymap: KeymapConfig,
}

#[derive(Debug, Clone)]
pub struct KeymapConfig {
    pub focus_command: String,
    pub focus_legend: String,
    pub focus_map: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            paths: vec![PathBuf::from("."), PathBuf::from("demos")],
            show_help: true,
            keymap: KeymapConfig {
                focus_command: DEFAULT_FOCUS_COMMAND.to_string(),
                focus_legend: DEFAULT_FOCUS_LEGEND.to_string(),
                focus_map: DEFAULT_FOCUS_MAP.to_string(),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    paths: Option<Vec<String>>,
    #[serde(alias = "showHelp", alias = "showhelp")]
    show_help: Option<bool>,
    keymap: Option<RawKeymap>,
}

#[derive(Debug, Default, Deserialize)]
struct RawKeymap {
    #[serde(alias = "focusCommand")]
    focus_command: Option<String>,
    #[serde(alias = "focusLegend")]
    focus_legend: Option<String>,
    #[serde(alias = "focusMap")]
    focus_map: Option<String>,
}

fn read_toml(path: &Path) -> Option<RawConfig> {
    let contents = fs::read_to_string(path).ok()?;
    if contents.trim().is_empty() {
        return None;
    }
    toml::from_str::<RawConfig>(&contents).ok()
}

fn expand_tilde(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

fn merge_config(user: Option<RawConfig>, project: Option<RawConfig>) -> Config {
    let defaults = Config::default();

    let paths = project
        .as_ref()
        .and_then(|c| c.paths.clone())
        .or_else(|| user.as_ref().and_then(|c| c.paths.clone()))
        .map(|raw| raw.iter().map(|p| expand_tilde(p)).collect())
        .unwrap_or(defaults.paths);
    let show_help = project
        .as_ref()
        .and_then(|c| c.show_help)
        .or_else(|| user.as_ref().and_then(|c| c.show_help))
        .unwrap_or(defaults.show_help);

    let project_keymap = project.as_ref().and_then(|c| c.keymap.as_ref());
    let user_keymap = user.as_ref().and_then(|c| c.keymap.as_ref());
    let focus_command = project_keymap
        .and_then(|k| k.focus_command.clone())
        .or_else(|| user_keymap.and_then(|k| k.focus_command.clone()))
        .unwrap_or(defaults.keymap.focus_command);
    let focus_legend = project_keymap
        .and_then(|k| k.focus_legend.clone())
        .or_else(|| user_keymap.and_then(|k| k.focus_legend.clone()))
        .unwrap_or(defaults.keymap.focus_legend);
    let focus_map = project_keymap
        .and_then(|k| k.focus_map.clone())
        .or_else(|| user_keymap.and_then(|k| k.focus_map.clone()))
        .unwrap_or(defaults.keymap.focus_map);

    Config {
        paths,
        show_help,
        keymap: KeymapConfig {
            focus_command,
            focus_legend,
            focus_map,
        },
    }
}

fn user_config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("asciigis").join("config.toml"))
}

pub fn load_config(cwd: &Path) -> Config {
    let project_config = read_toml(&cwd.join("asciigis.toml"));
    let user_config = user_config_path().and_then(|path| read_toml(&path));
    merge_config(user_config, project_config)
}

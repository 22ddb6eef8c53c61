//! Application state types and core data structures.
//!
//! Defines the App struct which holds all mutable application state,
//! plus supporting types for focus, the modal info overlay, and the
//! status line. Methods are split across input.rs (event handling) and
//! render.rs (UI drawing).

use ratatui::style::Color;
use tracing::{debug, info};

use crate::commands::Dialog;
use crate::compositor::{self, CellGrid};
use crate::config::Config;
use crate::engine::RenderEngine;
use crate::keymap::{parse_key_chord, KeyChord};
use crate::palette::{self, ColorAssignment};
use crate::project::{open_project, Project, ProjectError};
use crate::viewport::{valid_zoom_factor, MapExtent, PanDirection};

/// Which pane currently owns keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    CommandEntry,
    Legend,
    Map,
}

impl Focus {
    pub fn label(&self) -> &'static str {
        match self {
            Focus::CommandEntry => "Command",
            Focus::Legend => "Legend",
            Focus::Map => "Map",
        }
    }
}

/// Modal text overlay (help, about, command list). While visible it
/// suspends every pane; Esc closes it and the prior focus resumes.
#[derive(Debug, Default)]
pub struct InfoOverlay {
    pub visible: bool,
    pub title: String,
    pub content: String,
}

/// Width of the legend pane in cells.
pub const LEGEND_WIDTH: u16 = 30;

/// Zoom factor applied by the global zoom hotkeys.
pub const HOTKEY_ZOOM_FACTOR: f64 = 5.0;

pub const ENTER_COMMAND_TEXT: &str =
    "Enter command. TAB for auto complete. (command-list for command help or ? for general help)";

/// Main application state container.
pub struct App {
    pub focus: Focus,
    pub should_quit: bool,
    pub config: Config,
    pub engine: Box<dyn RenderEngine>,
    pub project: Option<Project>,
    pub extent: Option<MapExtent>,
    pub colors: ColorAssignment,
    pub ascii_mode: bool,
    pub color_mode: bool,
    pub edit_input: String,
    pub last_command: String,
    pub status: String,
    pub status_color: Color,
    pub pending_dialog: Option<Box<dyn Dialog>>,
    pub overlay: InfoOverlay,
    pub legend_cursor: usize,
    pub map_grid: Option<CellGrid>,
    map_dirty: bool,
    map_size: (usize, usize),
    pub focus_command_chord: Option<KeyChord>,
    pub focus_legend_chord: Option<KeyChord>,
    pub focus_map_chord: Option<KeyChord>,
}

impl App {
    /// Create a new App instance with the given config and engine.
    pub fn new(config: Config, engine: Box<dyn RenderEngine>) -> Self {
        let focus_command_chord = parse_key_chord(&config.keymap.focus_command);
        let focus_legend_chord = parse_key_chord(&config.keymap.focus_legend);
        let focus_map_chord = parse_key_chord(&config.keymap.focus_map);
        Self {
            focus: Focus::CommandEntry,
            should_quit: false,
            config,
            engine,
            project: None,
            extent: None,
            colors: ColorAssignment::default(),
            ascii_mode: false,
            color_mode: true,
            edit_input: String::new(),
            last_command: String::new(),
            status: ENTER_COMMAND_TEXT.to_string(),
            status_color: palette::STATUS_INFO,
            pending_dialog: None,
            overlay: InfoOverlay::default(),
            legend_cursor: 0,
            map_grid: None,
            map_dirty: true,
            map_size: (0, 0),
            focus_command_chord,
            focus_legend_chord,
            focus_map_chord,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        self.status_color = palette::STATUS_INFO;
    }

    pub fn set_alert(&mut self, message: impl Into<String>) {
        self.status = message.into();
        self.status_color = palette::STATUS_ALERT;
    }

    pub fn reset_status(&mut self) {
        self.status = ENTER_COMMAND_TEXT.to_string();
        self.status_color = palette::STATUS_INFO;
    }

    pub fn set_focus(&mut self, focus: Focus) {
        debug!(from = self.focus.label(), to = focus.label(), "focus change");
        self.focus = focus;
    }

    pub fn open_overlay(&mut self, title: impl Into<String>, content: impl Into<String>) {
        self.overlay.visible = true;
        self.overlay.title = title.into();
        self.overlay.content = content.into();
    }

    pub fn close_overlay(&mut self) {
        self.overlay.visible = false;
        self.overlay.title.clear();
        self.overlay.content.clear();
    }

    /// Force a recomposite before the next map draw.
    pub fn mark_map_dirty(&mut self) {
        self.map_dirty = true;
    }

    /// Open a project file and swap it in: extent, color assignment, and
    /// legend cursor are rebuilt, the map is recomposited on next draw.
    pub fn load_project_from(&mut self, path: &std::path::Path) -> Result<String, ProjectError> {
        let project = open_project(path)?;
        info!(project = %project.name, "project loaded");
        self.extent = Some(project.extent);
        self.colors = palette::assign(&project.tree.layer_ids_bottom_up());
        self.legend_cursor = 0;
        let name = project.name.clone();
        self.project = Some(project);
        self.mark_map_dirty();
        Ok(format!("Loaded project {name}"))
    }

    /// Pan the viewport; a no-op until a project is loaded.
    pub fn pan(&mut self, direction: PanDirection) {
        if let Some(extent) = self.extent {
            self.extent = Some(extent.panned(direction));
            self.mark_map_dirty();
        }
    }

    /// Shrink the visible extent; a no-op without a project or with an
    /// unusable factor.
    pub fn zoom_in(&mut self, factor: f64) {
        if !valid_zoom_factor(factor) {
            return;
        }
        if let Some(extent) = self.extent {
            self.extent = Some(extent.scaled(1.0 / factor));
            self.mark_map_dirty();
        }
    }

    /// Grow the visible extent; same guards as `zoom_in`.
    pub fn zoom_out(&mut self, factor: f64) {
        if !valid_zoom_factor(factor) {
            return;
        }
        if let Some(extent) = self.extent {
            self.extent = Some(extent.scaled(factor));
            self.mark_map_dirty();
        }
    }

    pub fn toggle_ascii_mode(&mut self) {
        self.ascii_mode = !self.ascii_mode;
        self.mark_map_dirty();
    }

    /// Color and ascii mode are coupled: a colorless block render would
    /// be invisible, so disabling color forces ascii on.
    pub fn toggle_color_mode(&mut self) {
        self.color_mode = !self.color_mode;
        if !self.color_mode {
            self.ascii_mode = true;
        }
        self.mark_map_dirty();
    }

    /// Recomposite the map grid if anything changed since the last draw.
    pub fn ensure_map_grid(&mut self, width: usize, height: usize) {
        if !self.map_dirty && self.map_size == (width, height) && self.map_grid.is_some() {
            return;
        }
        let grid = match (&self.project, self.extent) {
            (Some(project), Some(extent)) => Some(compositor::composite(
                &project.tree,
                self.engine.as_ref(),
                &self.colors,
                &extent,
                width,
                height,
            )),
            _ => None,
        };
        self.map_grid = grid;
        self.map_dirty = false;
        self.map_size = (width, height);
    }
}

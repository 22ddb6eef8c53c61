//! Command registry and metadata.
//!
//! Every command is registered here with its canonical name, aliases,
//! description, and action. Used for dispatch, prefix completion, and the
//! command-list overlay. Actions are either immediate functions or
//! factories for suspendable dialogs.

use tracing::info;

use super::dialog::{Dialog, OpenProjectDialog, ZoomDialog};
use crate::app::state::App;

/// What dispatching a command does.
pub enum CommandAction {
    /// Runs to completion synchronously.
    Immediate(fn(&mut App)),
    /// Starts a suspendable question/answer dialog.
    Dialog(fn() -> Box<dyn Dialog>),
}

/// Specification for a single command.
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub action: CommandAction,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "open-project",
        aliases: &["load-project"],
        description: "Open a project from the configured search paths",
        action: CommandAction::Dialog(open_project_dialog),
    },
    CommandSpec {
        name: "zoom-in",
        aliases: &[],
        description: "Zoom the map in by a factor",
        action: CommandAction::Dialog(zoom_in_dialog),
    },
    CommandSpec {
        name: "zoom-out",
        aliases: &[],
        description: "Zoom the map out by a factor",
        action: CommandAction::Dialog(zoom_out_dialog),
    },
    CommandSpec {
        name: "toggle-ascii-mode",
        aliases: &["ascii-map-mode"],
        description: "Toggle glyph rendering on the map",
        action: CommandAction::Immediate(toggle_ascii_mode),
    },
    CommandSpec {
        name: "toggle-color-mode",
        aliases: &[],
        description: "Toggle layer colors (off forces ascii mode on)",
        action: CommandAction::Immediate(toggle_color_mode),
    },
    CommandSpec {
        name: "help",
        aliases: &["?"],
        description: "Show general help",
        action: CommandAction::Immediate(show_help),
    },
    CommandSpec {
        name: "about",
        aliases: &["faq"],
        description: "What is this thing?",
        action: CommandAction::Immediate(show_about),
    },
    CommandSpec {
        name: "command-list",
        aliases: &[],
        description: "List all commands",
        action: CommandAction::Immediate(show_command_list),
    },
    CommandSpec {
        name: "exit",
        aliases: &["quit"],
        description: "Leave the application",
        action: CommandAction::Immediate(exit),
    },
];

/// Look a command up by canonical name or alias.
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| spec.name == name || spec.aliases.contains(&name))
}

/// Prefix completion over names and aliases.
///
/// Returns the full name only when the typed prefix matches exactly one
/// candidate; an ambiguous prefix leaves the input unresolved.
pub fn complete(input: &str) -> Option<&'static str> {
    let typed = input.trim();
    if typed.is_empty() {
        return None;
    }
    let mut candidates = COMMANDS
        .iter()
        .flat_map(|spec| std::iter::once(spec.name).chain(spec.aliases.iter().copied()))
        .filter(|name| name.starts_with(typed));
    let first = candidates.next()?;
    if candidates.next().is_some() {
        return None;
    }
    Some(first)
}

/// Lines for the command-list overlay, name and aliases aligned.
pub fn command_list_lines() -> Vec<String> {
    let label = |spec: &CommandSpec| {
        if spec.aliases.is_empty() {
            spec.name.to_string()
        } else {
            format!("{} ({})", spec.name, spec.aliases.join(", "))
        }
    };
    let longest = COMMANDS.iter().map(|spec| label(spec).len()).max().unwrap_or(0);
    COMMANDS
        .iter()
        .map(|spec| format!("{:<width$}  {}", label(spec), spec.description, width = longest))
        .collect()
}

pub const HELP_TITLE: &str = "Help - ESC to close";
pub const ABOUT_TITLE: &str = "FAQ - ESC to close";
pub const COMMAND_LIST_TITLE: &str = "Commands - ESC to close";

pub fn help_text() -> String {
    format!(
        "\
YAY ASCII!

Type commands into the bottom line to take action.

Try something like open-project, which can take a name
of a project or a path.
(Configure the search paths in asciigis.toml)

Once a project is loaded you can move the map around:

  CTRL + UP/DOWN/LEFT/RIGHT - Pan
  CTRL + PAGE UP - Zoom in
  CTRL + PAGE DOWN - Zoom out

Switch panes from anywhere:

  {} - command entry
  {} - legend (arrows move, space toggles, left/right fold)
  {} - map (arrows pan, page up/down zoom)

Version: {}",
        DEFAULT_FOCUS_HINTS[0],
        DEFAULT_FOCUS_HINTS[1],
        DEFAULT_FOCUS_HINTS[2],
        env!("CARGO_PKG_VERSION")
    )
}

const DEFAULT_FOCUS_HINTS: [&str; 3] = ["CTRL + E", "CTRL + L", "CTRL + W"];

pub const ABOUT_TEXT: &str = "\
> What the heck is this?
An ASCII map thingo for GIS projects

> Why does it exist?
Because........ we can

> What commands can I use?
command-list to see

> Does this really have any use?
Maybe...maybe not

> Really?
Yes indeed because ASCII!";

fn open_project_dialog() -> Box<dyn Dialog> {
    Box::new(OpenProjectDialog::new())
}

fn zoom_in_dialog() -> Box<dyn Dialog> {
    Box::new(ZoomDialog::zoom_in())
}

fn zoom_out_dialog() -> Box<dyn Dialog> {
    Box::new(ZoomDialog::zoom_out())
}

fn toggle_ascii_mode(app: &mut App) {
    app.toggle_ascii_mode();
    let state = if app.ascii_mode { "on" } else { "off" };
    app.set_status(format!("Ascii mode {state}"));
}

fn toggle_color_mode(app: &mut App) {
    app.toggle_color_mode();
    let message = if app.color_mode {
        "Color mode on".to_string()
    } else {
        "Color mode off (ascii mode forced on)".to_string()
    };
    app.set_status(message);
}

fn show_help(app: &mut App) {
    app.open_overlay(HELP_TITLE, help_text());
}

fn show_about(app: &mut App) {
    app.open_overlay(ABOUT_TITLE, ABOUT_TEXT);
}

fn show_command_list(app: &mut App) {
    app.open_overlay(COMMAND_LIST_TITLE, command_list_lines().join("\n"));
}

fn exit(app: &mut App) {
    info!("exit requested");
    app.should_quit = true;
}

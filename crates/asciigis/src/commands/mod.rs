//! Command system for the command-entry pane.
//!
//! This module handles all aspects of the line-oriented interpreter:
//! - Registry: command specs, aliases, completion, help text (registry.rs)
//! - Dialogs: suspendable multi-step question/answer commands (dialog.rs)
//!
//! A command is either immediate (runs to completion on dispatch) or a
//! dialog that asks a sequence of questions through the status line,
//! re-prompting until each answer validates.

mod dialog;
mod registry;

pub use dialog::{Dialog, DialogStep, OpenProjectDialog, Question, QuestionKind, ZoomDialog};
pub use registry::{
    command_list_lines, complete, find, help_text, CommandAction, CommandSpec, COMMANDS,
    HELP_TITLE,
};

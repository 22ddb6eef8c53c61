//! Suspendable multi-step command dialogs.
//!
//! A dialog is an explicit state machine driven by the input loop: each
//! step yields a `Question` shown on the status line, suspends, and
//! resumes with the operator's typed answer. Invalid answers re-emit the
//! question as a retry until one validates. Exactly one dialog can be
//! pending at a time; it owns the edit line until it terminates.

use std::path::PathBuf;

use tracing::warn;

use crate::app::state::App;
use crate::project::resolve_project_path;
use crate::viewport::valid_zoom_factor;

/// Severity of a prompt: first ask vs. re-prompt after a bad answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Ask,
    Retry,
}

/// A prompt emitted by a suspended dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub prompt: String,
    pub kind: QuestionKind,
}

impl Question {
    pub fn ask(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::Ask,
        }
    }

    pub fn retry(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::Retry,
        }
    }
}

/// Outcome of starting or resuming a dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogStep {
    /// Suspend and show this question.
    Ask(Question),
    /// Terminated normally, optionally with a status message.
    Done(Option<String>),
    /// Terminated with an alert-worthy failure.
    Failed(String),
}

/// A suspendable command. `start` runs to the first question (or straight
/// to completion); `resume` feeds back one answer.
pub trait Dialog {
    fn start(&mut self, app: &mut App) -> DialogStep;
    fn resume(&mut self, app: &mut App, answer: &str) -> DialogStep;
}

/// The open-project dialog: name, resolution, Y/N confirmation, load.
pub struct OpenProjectDialog {
    stage: OpenStage,
}

enum OpenStage {
    AskName,
    Confirm(PathBuf),
}

impl OpenProjectDialog {
    pub fn new() -> Self {
        Self {
            stage: OpenStage::AskName,
        }
    }

    fn confirm_question(path: &PathBuf, kind: QuestionKind) -> Question {
        Question {
            prompt: format!("Really load ({}) | Y/N", path.display()),
            kind,
        }
    }
}

impl Default for OpenProjectDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialog for OpenProjectDialog {
    fn start(&mut self, _app: &mut App) -> DialogStep {
        DialogStep::Ask(Question::ask("Which project to open?"))
    }

    fn resume(&mut self, app: &mut App, answer: &str) -> DialogStep {
        match &self.stage {
            OpenStage::AskName => match resolve_project_path(&app.config.paths, answer) {
                Some(path) => {
                    let question = Self::confirm_question(&path, QuestionKind::Ask);
                    self.stage = OpenStage::Confirm(path);
                    DialogStep::Ask(question)
                }
                None => {
                    warn!(name = answer, "project not found in search paths");
                    DialogStep::Ask(Question::retry(format!(
                        "Couldn't find project {answer}. Check name"
                    )))
                }
            },
            OpenStage::Confirm(path) => {
                match answer.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
                    Some('Y') => {
                        let path = path.clone();
                        match app.load_project_from(&path) {
                            Ok(message) => DialogStep::Done(Some(message)),
                            Err(err) => DialogStep::Failed(format!("Failed to load project: {err}")),
                        }
                    }
                    Some('N') => DialogStep::Done(None),
                    _ => DialogStep::Ask(Self::confirm_question(path, QuestionKind::Retry)),
                }
            }
        }
    }
}

/// Numeric-factor dialog shared by zoom-in and zoom-out.
pub struct ZoomDialog {
    zoom_in: bool,
}

impl ZoomDialog {
    pub fn zoom_in() -> Self {
        Self { zoom_in: true }
    }

    pub fn zoom_out() -> Self {
        Self { zoom_in: false }
    }
}

impl Dialog for ZoomDialog {
    fn start(&mut self, _app: &mut App) -> DialogStep {
        DialogStep::Ask(Question::ask("By how much?"))
    }

    fn resume(&mut self, app: &mut App, answer: &str) -> DialogStep {
        match answer.trim().parse::<f64>() {
            Ok(factor) if valid_zoom_factor(factor) => {
                if self.zoom_in {
                    app.zoom_in(factor);
                } else {
                    app.zoom_out(factor);
                }
                DialogStep::Done(None)
            }
            _ => DialogStep::Ask(Question::retry("Enter a positive number")),
        }
    }
}

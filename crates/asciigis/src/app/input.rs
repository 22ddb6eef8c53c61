//! Input event handling.
//!
//! Routes every key through a fixed precedence: modal overlay, pending
//! dialog, global hotkeys, then the focused pane's own handler. The
//! overlay and a suspended dialog each own input exclusively until they
//! close; global hotkeys fire regardless of which pane has focus.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::commands::{self, CommandAction, Dialog, DialogStep, Question, QuestionKind};
use crate::keymap::{matches_chord, KeyChord};
use crate::legend;
use crate::palette;
use crate::viewport::PanDirection;

use super::state::{App, Focus, HOTKEY_ZOOM_FACTOR};

/// Main key dispatcher.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if app.overlay.visible {
        if key.code == KeyCode::Esc {
            app.close_overlay();
        }
        return;
    }

    if app.pending_dialog.is_some() {
        handle_dialog_key(app, key);
        return;
    }

    if handle_global_hotkey(app, &key) {
        return;
    }

    match app.focus {
        Focus::CommandEntry => handle_command_key(app, key),
        Focus::Legend => handle_legend_key(app, key),
        Focus::Map => handle_map_key(app, key),
    }
}

/// Focus chords and the fixed pan/zoom table. Returns true when handled.
fn handle_global_hotkey(app: &mut App, key: &KeyEvent) -> bool {
    let hit = |chord: &Option<KeyChord>| chord.as_ref().is_some_and(|c| matches_chord(key, c));

    if hit(&app.focus_command_chord) {
        app.set_focus(Focus::CommandEntry);
        return true;
    }
    if hit(&app.focus_legend_chord) {
        app.set_focus(Focus::Legend);
        return true;
    }
    if hit(&app.focus_map_chord) {
        app.set_focus(Focus::Map);
        return true;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Up => app.pan(PanDirection::Up),
            KeyCode::Down => app.pan(PanDirection::Down),
            KeyCode::Left => app.pan(PanDirection::Left),
            KeyCode::Right => app.pan(PanDirection::Right),
            KeyCode::PageUp => app.zoom_in(HOTKEY_ZOOM_FACTOR),
            KeyCode::PageDown => app.zoom_out(HOTKEY_ZOOM_FACTOR),
            _ => return false,
        }
        return true;
    }
    false
}

fn handle_command_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            let input = app.edit_input.trim().to_string();
            app.edit_input.clear();
            if input.is_empty() {
                return;
            }
            dispatch_command(app, &input);
        }
        KeyCode::Tab => {
            if let Some(full) = commands::complete(&app.edit_input) {
                app.edit_input = full.to_string();
            }
        }
        KeyCode::Backspace => {
            app.edit_input.pop();
        }
        KeyCode::Up => {
            app.edit_input = app.last_command.clone();
        }
        KeyCode::Char(ch) => {
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
            {
                app.edit_input.push(ch);
            }
        }
        _ => {}
    }
}

fn dispatch_command(app: &mut App, input: &str) {
    let Some(spec) = commands::find(input) else {
        warn!(command = input, "unknown command");
        app.set_alert(format!("Unknown command: {input}"));
        return;
    };

    info!(command = spec.name, "running command");
    app.last_command = input.to_string();
    match &spec.action {
        CommandAction::Immediate(run) => run(app),
        CommandAction::Dialog(make) => {
            let mut dialog = make();
            let step = dialog.start(app);
            apply_dialog_step(app, dialog, step);
        }
    }
}

/// Edit-line handling while a dialog is suspended. Esc cancels; Enter
/// feeds the typed answer back into the dialog.
fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.pending_dialog = None;
            app.edit_input.clear();
            app.set_status("Command cancelled.");
        }
        KeyCode::Enter => {
            let answer = app.edit_input.trim().to_string();
            app.edit_input.clear();
            if let Some(mut dialog) = app.pending_dialog.take() {
                let step = dialog.resume(app, &answer);
                apply_dialog_step(app, dialog, step);
            }
        }
        KeyCode::Backspace => {
            app.edit_input.pop();
        }
        KeyCode::Char(ch) => {
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
            {
                app.edit_input.push(ch);
            }
        }
        _ => {}
    }
}

fn apply_dialog_step(app: &mut App, dialog: Box<dyn Dialog>, step: DialogStep) {
    match step {
        DialogStep::Ask(question) => {
            show_question(app, &question);
            app.pending_dialog = Some(dialog);
        }
        DialogStep::Done(Some(message)) => app.set_status(message),
        DialogStep::Done(None) => app.reset_status(),
        DialogStep::Failed(message) => app.set_alert(message),
    }
}

fn show_question(app: &mut App, question: &Question) {
    app.status = question.prompt.clone();
    app.status_color = match question.kind {
        QuestionKind::Ask => palette::PROMPT,
        QuestionKind::Retry => palette::PROMPT_RETRY,
    };
}

fn handle_legend_key(app: &mut App, key: KeyEvent) {
    let Some((row_count, selected_id)) = selected_legend_row(app) else {
        return;
    };
    let cursor = app.legend_cursor.min(row_count - 1);
    app.legend_cursor = cursor;

    match key.code {
        KeyCode::Up => {
            app.legend_cursor = cursor.saturating_sub(1);
        }
        KeyCode::Down => {
            app.legend_cursor = (cursor + 1).min(row_count - 1);
        }
        KeyCode::Char(' ') => {
            if let Some(project) = app.project.as_mut() {
                if let Some(node) = project.tree.find_mut(selected_id) {
                    node.toggle_visible();
                }
            }
            app.mark_map_dirty();
        }
        KeyCode::Left => {
            if let Some(project) = app.project.as_mut() {
                legend::set_expanded(&mut project.tree, selected_id, false);
            }
            clamp_legend_cursor(app);
        }
        KeyCode::Right => {
            if let Some(project) = app.project.as_mut() {
                legend::set_expanded(&mut project.tree, selected_id, true);
            }
        }
        _ => {}
    }
}

/// Current legend row count and the id under the cursor, if any.
fn selected_legend_row(app: &App) -> Option<(usize, crate::project::NodeId)> {
    let project = app.project.as_ref()?;
    let rows = legend::flatten(&project.tree);
    if rows.is_empty() {
        return None;
    }
    let cursor = app.legend_cursor.min(rows.len() - 1);
    Some((rows.len(), rows[cursor].id))
}

fn clamp_legend_cursor(app: &mut App) {
    let row_count = app
        .project
        .as_ref()
        .map(|project| legend::flatten(&project.tree).len())
        .unwrap_or(0);
    app.legend_cursor = match row_count {
        0 => 0,
        n => app.legend_cursor.min(n - 1),
    };
}

fn handle_map_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up => app.pan(PanDirection::Up),
        KeyCode::Down => app.pan(PanDirection::Down),
        KeyCode::Left => app.pan(PanDirection::Left),
        KeyCode::Right => app.pan(PanDirection::Right),
        KeyCode::PageUp => app.zoom_in(HOTKEY_ZOOM_FACTOR),
        KeyCode::PageDown => app.zoom_out(HOTKEY_ZOOM_FACTOR),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use tempfile::TempDir;

    use super::handle_key;
    use crate::app::state::{App, Focus, ENTER_COMMAND_TEXT};
    use crate::config::Config;
    use crate::engine::FeatureRasterizer;
    use crate::legend;
    use crate::palette;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    fn type_line(app: &mut App, line: &str) {
        for ch in line.chars() {
            handle_key(app, key(KeyCode::Char(ch)));
        }
    }

    fn submit(app: &mut App, line: &str) {
        type_line(app, line);
        handle_key(app, key(KeyCode::Enter));
    }

    fn test_app() -> App {
        App::new(Config::default(), Box::new(FeatureRasterizer))
    }

    fn app_with_project() -> (App, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        fs::write(
            dir.path().join("harbor.agp"),
            r#"{"extent": [0, 0, 10, 10],
                "nodes": [
                    {"kind": "group", "name": "base", "nodes": [
                        {"kind": "layer", "name": "coast", "geometry": "line",
                         "features": [[[0.0, 0.0], [10.0, 10.0]]]}
                    ]},
                    {"kind": "layer", "name": "buoys", "geometry": "point",
                     "features": [[[5.0, 5.0]]]}
                ]}"#,
        )
        .expect("write project");
        let mut config = Config::default();
        config.paths = vec![dir.path().to_path_buf()];
        let mut app = App::new(config, Box::new(FeatureRasterizer));
        let path = dir.path().join("harbor.agp");
        app.load_project_from(&path).expect("load");
        (app, dir)
    }

    #[test]
    fn unknown_command_reports_alert_and_changes_nothing() {
        let mut app = test_app();
        submit(&mut app, "wut");
        assert!(app.status.contains("Unknown command: wut"));
        assert_eq!(app.status_color, palette::STATUS_ALERT);
        assert!(!app.should_quit);
        assert!(app.edit_input.is_empty());
    }

    #[test]
    fn quit_alias_ends_the_loop() {
        let mut app = test_app();
        submit(&mut app, "quit");
        assert!(app.should_quit);
    }

    #[test]
    fn tab_completes_unique_prefix_only() {
        let mut app = test_app();
        type_line(&mut app, "zoom-i");
        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.edit_input, "zoom-in");

        app.edit_input.clear();
        type_line(&mut app, "zoom-");
        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.edit_input, "zoom-");
    }

    #[test]
    fn up_recalls_the_last_command() {
        let mut app = test_app();
        submit(&mut app, "toggle-ascii-mode");
        assert!(app.edit_input.is_empty());
        handle_key(&mut app, key(KeyCode::Up));
        assert_eq!(app.edit_input, "toggle-ascii-mode");
    }

    #[test]
    fn focus_chords_switch_from_any_pane() {
        let mut app = test_app();
        handle_key(&mut app, ctrl(KeyCode::Char('l')));
        assert_eq!(app.focus, Focus::Legend);
        handle_key(&mut app, ctrl(KeyCode::Char('w')));
        assert_eq!(app.focus, Focus::Map);
        handle_key(&mut app, ctrl(KeyCode::Char('e')));
        assert_eq!(app.focus, Focus::CommandEntry);
    }

    #[test]
    fn overlay_is_modal_and_preserves_focus() {
        let mut app = test_app();
        app.set_focus(Focus::Legend);
        app.open_overlay("Help", "text");

        // Keys other than Esc are swallowed.
        handle_key(&mut app, ctrl(KeyCode::Char('w')));
        assert!(app.overlay.visible);
        assert_eq!(app.focus, Focus::Legend);

        handle_key(&mut app, key(KeyCode::Esc));
        assert!(!app.overlay.visible);
        assert_eq!(app.focus, Focus::Legend);
    }

    #[test]
    fn dialog_suspends_and_esc_cancels() {
        let mut app = test_app();
        submit(&mut app, "open-project");
        assert!(app.pending_dialog.is_some());
        assert_eq!(app.status, "Which project to open?");
        assert_eq!(app.status_color, palette::PROMPT);

        handle_key(&mut app, key(KeyCode::Esc));
        assert!(app.pending_dialog.is_none());
        assert_eq!(app.status, "Command cancelled.");
    }

    #[test]
    fn dialog_reprompts_in_retry_color() {
        let mut app = test_app();
        app.config.paths = vec![];
        submit(&mut app, "open-project");
        submit(&mut app, "missing");
        assert!(app.pending_dialog.is_some());
        assert!(app.status.contains("Couldn't find project missing"));
        assert_eq!(app.status_color, palette::PROMPT_RETRY);
    }

    #[test]
    fn open_project_flow_end_to_end() {
        let (mut app, _dir) = app_with_project();
        app.project = None;
        app.extent = None;

        submit(&mut app, "open-project");
        submit(&mut app, "harbor");
        assert!(app.status.starts_with("Really load"));
        submit(&mut app, "Y");
        assert!(app.pending_dialog.is_none());
        assert!(app.project.is_some());
        assert!(app.status.contains("Loaded project"));
    }

    #[test]
    fn global_pan_works_regardless_of_focus() {
        let (mut app, _dir) = app_with_project();
        let before = app.extent.expect("extent");
        app.set_focus(Focus::Legend);
        handle_key(&mut app, ctrl(KeyCode::Right));
        let after = app.extent.expect("extent");
        assert!(after.xmin > before.xmin);
        assert_eq!(after.width(), before.width());
    }

    #[test]
    fn global_zoom_hotkeys_use_factor_five() {
        let (mut app, _dir) = app_with_project();
        let before = app.extent.expect("extent");
        handle_key(&mut app, ctrl(KeyCode::PageDown));
        let after = app.extent.expect("extent");
        assert!((after.width() - before.width() * 5.0).abs() < 1e-9);
    }

    #[test]
    fn legend_cursor_clamps_at_both_ends() {
        let (mut app, _dir) = app_with_project();
        app.set_focus(Focus::Legend);
        handle_key(&mut app, key(KeyCode::Up));
        assert_eq!(app.legend_cursor, 0);
        for _ in 0..10 {
            handle_key(&mut app, key(KeyCode::Down));
        }
        let rows = legend::flatten(&app.project.as_ref().unwrap().tree);
        assert_eq!(app.legend_cursor, rows.len() - 1);
    }

    #[test]
    fn legend_space_toggles_selected_visibility() {
        let (mut app, _dir) = app_with_project();
        app.set_focus(Focus::Legend);
        handle_key(&mut app, key(KeyCode::Down)); // onto "coast"
        handle_key(&mut app, key(KeyCode::Char(' ')));
        let rows = legend::flatten(&app.project.as_ref().unwrap().tree);
        assert_eq!(rows[1].name, "coast");
        assert!(!rows[1].visible);
        // Cursor stays put.
        assert_eq!(app.legend_cursor, 1);
    }

    #[test]
    fn legend_collapse_hides_children_and_expand_restores() {
        let (mut app, _dir) = app_with_project();
        app.set_focus(Focus::Legend);
        // Cursor starts on the "base" group.
        handle_key(&mut app, key(KeyCode::Left));
        let rows = legend::flatten(&app.project.as_ref().unwrap().tree);
        assert_eq!(rows.len(), 2);

        handle_key(&mut app, key(KeyCode::Right));
        let rows = legend::flatten(&app.project.as_ref().unwrap().tree);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn stale_legend_cursor_is_reclamped_before_moving() {
        let (mut app, _dir) = app_with_project();
        app.set_focus(Focus::Legend);
        app.legend_cursor = 99;
        handle_key(&mut app, key(KeyCode::Up));
        let rows = legend::flatten(&app.project.as_ref().unwrap().tree);
        assert_eq!(app.legend_cursor, rows.len() - 2);
    }

    #[test]
    fn legend_keys_are_no_ops_without_project() {
        let mut app = test_app();
        app.set_focus(Focus::Legend);
        handle_key(&mut app, key(KeyCode::Down));
        handle_key(&mut app, key(KeyCode::Char(' ')));
        assert_eq!(app.legend_cursor, 0);
    }

    #[test]
    fn map_focus_arrows_pan_without_ctrl() {
        let (mut app, _dir) = app_with_project();
        app.set_focus(Focus::Map);
        let before = app.extent.expect("extent");
        handle_key(&mut app, key(KeyCode::Up));
        let after = app.extent.expect("extent");
        assert!(after.ymin > before.ymin);
    }

    #[test]
    fn dialog_answer_none_resets_the_prompt() {
        let (mut app, _dir) = app_with_project();
        app.project = None;
        submit(&mut app, "open-project");
        submit(&mut app, "harbor");
        submit(&mut app, "N");
        assert!(app.pending_dialog.is_none());
        assert!(app.project.is_none());
        assert_eq!(app.status, ENTER_COMMAND_TEXT);
    }
}

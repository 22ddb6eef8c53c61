//! Application runner and event loop.
//!
//! Handles terminal setup/teardown, log setup, and the main loop. The
//! loop is single-threaded and cooperative: draw the frame, block on the
//! next key, dispatch, repeat. A slow composite blocks input by design,
//! so no key is ever processed mid-recomposite.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::commands;
use crate::config::load_config;
use crate::engine::FeatureRasterizer;

use super::state::App;

const LOG_FILE: &str = "asciigis.log";
const LOG_ENV: &str = "ASCIIGIS_LOG";

/// Entry point: set up logging and the terminal, run the event loop.
pub fn run() -> io::Result<()> {
    init_logging();

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal);

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// The terminal owns stdout, so logs go to a file in the working
/// directory. Filter via ASCIIGIS_LOG, default info.
fn init_logging() {
    let Ok(file) = std::fs::File::create(LOG_FILE) else {
        return;
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init();
}

/// Main event loop: draw, block on input, dispatch, until quit.
fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = load_config(&cwd);
    info!(paths = ?config.paths, show_help = config.show_help, "starting up");

    let mut app = App::new(config, Box::new(FeatureRasterizer));
    if app.config.show_help {
        app.open_overlay(commands::HELP_TITLE, commands::help_text());
    }

    terminal.clear()?;
    loop {
        terminal.draw(|frame| super::render::render(&mut app, frame))?;
        if app.should_quit {
            break;
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                super::input::handle_key(&mut app, key);
            }
            Event::Resize(..) => app.mark_map_dirty(),
            _ => {}
        }
    }
    info!("shutting down");
    Ok(())
}

mod app;
mod commands;
mod compositor;
mod config;
mod engine;
mod keymap;
mod legend;
mod palette;
mod project;
mod viewport;

fn main() -> std::io::Result<()> {
    app::run()
}

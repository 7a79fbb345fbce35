//! Desk Explorer
//!
//! Opens a window and drives the interaction controller from keyboard and
//! mouse input:
//! - W/A/S/D to walk, arrow keys to look, Q/E to roll
//! - left-drag to look around, left click to focus a monitor or the clipboard
//! - click the focused surface (or empty space) to step back
//!
//! Usage: `desk-explorer [--config config.json] [--scene scene.json]`

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(err) = desk_explorer::app::run(std::env::args().skip(1)) {
        log::error!("desk-explorer failed: {}", err);
        std::process::exit(1);
    }
}

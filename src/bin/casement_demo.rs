// src/bin/casement_demo.rs

//! Opens a window and echoes its canonical event stream.
//!
//! Keys while the window has focus:
//!   F11 toggle fullscreen    m toggle maximize    s toggle shade
//!   n   minimize             r restore            b toggle borderless
//!   Esc quit

use anyhow::Context;
use log::info;
use std::path::Path;

use casement::{Key, Window, WindowConfig, WindowEvent};

fn main() -> anyhow::Result<()> {
    // Default filter is "info" unless RUST_LOG overrides it.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => WindowConfig::load_from_file(Path::new(&path))
            .with_context(|| format!("loading config {}", path))?,
        None => WindowConfig::default(),
    };

    let mut window = Window::new(&config);
    window.open().context("opening the window")?;
    info!(
        "window open: title={:?} bounds={:?}",
        window.title(),
        window.bounds()
    );

    while let Some(event) = window.get_event()? {
        info!("{:?}", event);
        match event {
            WindowEvent::Close => break,
            WindowEvent::KeyDown { key, is_repeat: false, .. } => match key {
                Key::Escape => break,
                Key::F11 => {
                    let fullscreen = !window.is_fullscreen();
                    window.set_fullscreen(fullscreen)?;
                }
                Key::Char('m') => {
                    let maximized = !window.is_maximized();
                    window.set_maximized(maximized)?;
                }
                Key::Char('s') => {
                    let shaded = !window.is_shaded();
                    window.set_shaded(shaded)?;
                }
                Key::Char('n') => window.set_minimized(true)?,
                Key::Char('r') => window.restore()?,
                Key::Char('b') => {
                    let borderless = !window.is_borderless();
                    window.set_borderless(borderless)?;
                }
                _ => {}
            },
            _ => {}
        }
    }

    window.close();
    info!("window closed");
    Ok(())
}

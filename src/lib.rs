// src/lib.rs

//! Native window, input, and lifecycle-state subsystem.
//!
//! The crate owns one concern: creating a native window and turning the
//! platform's raw message stream into a canonical, per-window event queue
//! with a faithful state record alongside it. Rendering is someone else's
//! job; a renderer plugs in through [`GraphicsContext`] using the window's
//! native handles and never touches the event machinery.
//!
//! The expected shape of a consumer:
//!
//! ```no_run
//! use casement::{Window, WindowConfig, WindowEvent};
//!
//! # fn run() -> anyhow::Result<()> {
//! let mut window = Window::new(&WindowConfig::default());
//! window.open()?;
//! while let Some(event) = window.get_event()? {
//!     match event {
//!         WindowEvent::Close => break,
//!         event => println!("{:?}", event),
//!     }
//! }
//! window.close();
//! # Ok(())
//! # }
//! ```
//!
//! # Threading
//!
//! One thread pumps events; [`Window::get_event`] blocks it until a message
//! arrives. Opening and closing windows is safe from other threads (the
//! handle registry is locked), but the event stream itself is single-pumped.
//! The platform backend is chosen at compile time: X11 on Linux, a scripted
//! mock everywhere else and in unit tests.

pub mod backend;
pub mod config;
pub mod event;
pub mod geometry;
pub mod graphics;
pub mod input;
pub mod keys;
pub mod state;
pub mod window;

pub use crate::backend::{PlatformBackend, PumpMode, PumpOutcome, StateRequest};
pub use crate::config::WindowConfig;
pub use crate::event::WindowEvent;
pub use crate::geometry::{Point, Rect, Size};
pub use crate::graphics::GraphicsContext;
pub use crate::keys::{Key, Modifiers, MouseButton, ScrollAxis};
pub use crate::state::{FrameExtents, StateFlags, WindowState};
pub use crate::window::{NativeHandles, Window};

// src/graphics.rs

//! The graphics-context seam.
//!
//! Rendering lives in a separate subsystem. The window's only obligation to
//! it is handing over native handles (`Window::native_handle`,
//! `Window::native_display`); it never calls through this trait itself.

use crate::window::NativeHandles;
use anyhow::Result;

/// Contract for a rendering context bound to one window.
///
/// Implementations (GL, Vulkan surface wrappers) live outside this crate.
pub trait GraphicsContext {
    /// Binds the context to the window's native handles. Called once after
    /// the window opens.
    fn init(&mut self, handles: &NativeHandles) -> Result<()>;

    /// Marks the start of a frame.
    fn begin(&mut self) -> Result<()>;

    /// Marks the end of a frame.
    fn end(&mut self) -> Result<()>;

    /// Presents the finished frame.
    fn swap_buffers(&mut self) -> Result<()>;

    /// Enables or disables vertical-sync presentation.
    fn set_vsync(&mut self, enabled: bool) -> Result<()>;
}

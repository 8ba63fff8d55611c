// src/backend/mod.rs

//! Platform backends.
//!
//! The backend is selected at compile time: `X11Backend` on Linux builds,
//! `MockBackend` everywhere else and in unit tests. There is exactly one
//! active backend type per build, re-exported as [`ActiveBackend`]; nothing
//! dispatches dynamically.
//!
//! A backend instance owns one native window. The display-wide message pump
//! is a free function (`pump`) rather than a method because a single pump
//! pass can route messages to any registered window, not just the one whose
//! consumer called it.

use crate::geometry::{Point, Rect, Size};
use crate::state::{FrameExtents, WindowState};
use anyhow::Result;
use std::os::raw::c_void;

pub mod extents;
pub mod mock;

#[cfg(target_os = "linux")]
pub mod x11;

#[cfg(all(target_os = "linux", not(test)))]
pub(crate) use self::x11::{pump, X11Backend as ActiveBackend};

#[cfg(any(test, not(target_os = "linux")))]
pub(crate) use self::mock::{pump, MockBackend as ActiveBackend};

/// How a pump pass is allowed to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpMode {
    /// Translate whatever is already queued and return.
    NonBlocking,
    /// Wait until the calling window has at least one canonical event.
    Blocking,
}

/// What a pump pass found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// The calling window's queue has at least one event.
    Ready,
    /// Nothing pending for the calling window.
    Idle,
    /// The platform is gone for this window: connection closed or the
    /// window is no longer registered.
    Shutdown,
}

/// An asynchronous lifecycle request sent to the window manager.
///
/// These are fire-and-forget: the record is not touched until the platform
/// confirms the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRequest {
    Fullscreen(bool),
    Maximized(bool),
    Shaded(bool),
    Minimized(bool),
}

/// Contract between the window facade and one native window.
///
/// All methods are issue-and-return; anything with an asynchronous effect
/// surfaces later through the pump as canonical events.
pub trait PlatformBackend: Sized + Send {
    /// Creates the native window according to the record: geometry, title,
    /// decoration, visibility, and any pre-requested lifecycle states.
    fn open(state: &WindowState, class_name: &str) -> Result<Self>;

    /// Destroys the native window. The backend value is unusable afterwards.
    fn close(&mut self) -> Result<()>;

    /// Native window handle, nonzero while open.
    fn handle(&self) -> u64;

    /// Opaque native display pointer for the graphics collaborator.
    fn display_ptr(&self) -> *mut c_void;

    fn set_title(&mut self, title: &str) -> Result<()>;

    /// Moves/resizes so the client area lands on `bounds`. `extents`
    /// compensates for the decoration frame; pass unknown extents to request
    /// the raw position.
    fn set_bounds(&mut self, bounds: Rect, extents: &FrameExtents) -> Result<()>;

    fn set_visible(&mut self, visible: bool) -> Result<()>;

    fn set_borderless(&mut self, borderless: bool) -> Result<()>;

    /// Toggles user resizing by pinning or releasing the size hints;
    /// `size` is the client size to pin when disabling.
    fn set_resizable(&mut self, resizable: bool, size: Size) -> Result<()>;

    fn request_state(&mut self, request: StateRequest) -> Result<()>;

    /// Asks the platform to give this window keyboard focus.
    fn focus(&mut self) -> Result<()>;

    fn raise(&mut self) -> Result<()>;

    fn lower(&mut self) -> Result<()>;

    /// Reconciles the pointer grab with the capture/trap policy. Trapping
    /// confines the pointer to the client area.
    fn update_pointer_grab(&mut self, captured: bool, trapped: bool) -> Result<()>;

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()>;

    /// Moves the pointer to a client-relative position.
    fn warp_cursor(&mut self, position: Point) -> Result<()>;

    /// Client-relative to screen coordinates, asking the platform.
    fn window_to_screen(&self, position: Point) -> Result<Point>;

    /// Screen to client-relative coordinates, asking the platform.
    fn screen_to_window(&self, position: Point) -> Result<Point>;
}

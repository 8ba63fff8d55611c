// src/state.rs

//! The authoritative window-state record and the lifecycle confirmation diff.
//!
//! The record is the consumer-visible truth about one window. Synchronous
//! attributes (title, bounds, visibility, cursor policy) are written by the
//! window's own setters. The lifecycle booleans (fullscreen, maximized,
//! minimized, shaded) are written only when the platform confirms a change;
//! requesting a transition never touches them.

use crate::event::WindowEvent;
use crate::geometry::{Point, Rect};
use bitflags::bitflags;

bitflags! {
    /// The subset of `_NET_WM_STATE` atoms the subsystem tracks, folded into
    /// a comparable set so confirmations can be diffed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StateFlags: u8 {
        const FULLSCREEN = 1 << 0;
        const MAXIMIZED_VERT = 1 << 1;
        const MAXIMIZED_HORZ = 1 << 2;
        const HIDDEN = 1 << 3;
        const SHADED = 1 << 4;
    }
}

impl StateFlags {
    /// Either maximize direction counts as maximized. Window managers differ
    /// on whether they set one or both atoms.
    pub fn is_maximized(&self) -> bool {
        self.intersects(StateFlags::MAXIMIZED_VERT | StateFlags::MAXIMIZED_HORZ)
    }
}

/// Pixel insets between the client window and its decorated frame, in the
/// order the `_NET_FRAME_EXTENTS` property stores them.
///
/// `known` stays false until the first successful property read; until then
/// the zeros are placeholders, not measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameExtents {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
    pub known: bool,
}

impl FrameExtents {
    pub fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        FrameExtents {
            left,
            right,
            top,
            bottom,
            known: true,
        }
    }
}

/// Authoritative per-window state.
///
/// Owned by exactly one window and mutated only by that window's setters and
/// its translator. Everything here is platform-independent.
#[derive(Debug, Clone)]
pub struct WindowState {
    pub title: String,
    /// Client area in screen coordinates.
    pub bounds: Rect,
    /// Last bounds observed while the window was restored. Used as the
    /// geometry consumers expect after leaving maximize.
    pub restored_bounds: Rect,
    pub visible: bool,
    pub borderless: bool,
    pub resizable: bool,
    pub fullscreen: bool,
    pub maximized: bool,
    pub minimized: bool,
    pub shaded: bool,
    pub focused: bool,
    pub key_repeat_enabled: bool,
    pub mouse_captured: bool,
    pub cursor_trapped: bool,
    pub cursor_visible: bool,
    pub keep_cursor_centered: bool,
    /// Last `_NET_WM_STATE` set confirmed by the platform.
    pub confirmed_flags: StateFlags,
    /// Decoration insets, once discovered.
    pub extents: FrameExtents,
    /// Bounds requested before the extents were known; applied after the
    /// first successful extents read while restored, then cleared.
    pub pending_resize: Option<Rect>,
}

impl Default for WindowState {
    fn default() -> Self {
        WindowState {
            title: String::new(),
            bounds: Rect::new(0, 0, 800, 600),
            restored_bounds: Rect::new(0, 0, 800, 600),
            visible: true,
            borderless: false,
            resizable: true,
            fullscreen: false,
            maximized: false,
            minimized: false,
            shaded: false,
            focused: false,
            key_repeat_enabled: true,
            mouse_captured: false,
            cursor_trapped: false,
            cursor_visible: true,
            keep_cursor_centered: false,
            confirmed_flags: StateFlags::empty(),
            extents: FrameExtents::default(),
            pending_resize: None,
        }
    }
}

impl WindowState {
    /// A window is restored exactly when it is in none of the special
    /// lifecycle states.
    pub fn is_restored(&self) -> bool {
        !(self.fullscreen || self.maximized || self.minimized || self.shaded)
    }

    /// Applies a confirmed `_NET_WM_STATE` set, updating the lifecycle
    /// booleans and returning the canonical events the change produces.
    ///
    /// Flags are compared in a fixed order (fullscreen, maximized, minimized,
    /// shaded) so the event stream is deterministic regardless of which atoms
    /// the window manager happened to reorder. If the window ends up restored
    /// and was not before, exactly one `Restore` follows the exit events.
    pub fn apply_confirmed_flags(&mut self, flags: StateFlags) -> Vec<WindowEvent> {
        let mut events = Vec::new();
        let was_restored = self.is_restored();

        let fullscreen = flags.contains(StateFlags::FULLSCREEN);
        if fullscreen != self.fullscreen {
            self.fullscreen = fullscreen;
            events.push(if fullscreen {
                WindowEvent::EnterFullscreen
            } else {
                WindowEvent::ExitFullscreen
            });
        }

        let maximized = flags.is_maximized();
        if maximized != self.maximized {
            self.maximized = maximized;
            events.push(if maximized {
                WindowEvent::Maximize
            } else {
                WindowEvent::Unmaximize
            });
        }

        let minimized = flags.contains(StateFlags::HIDDEN);
        if minimized != self.minimized {
            self.minimized = minimized;
            events.push(if minimized {
                WindowEvent::Minimize
            } else {
                WindowEvent::Unminimize
            });
        }

        let shaded = flags.contains(StateFlags::SHADED);
        if shaded != self.shaded {
            self.shaded = shaded;
            events.push(if shaded {
                WindowEvent::Shade
            } else {
                WindowEvent::Unshade
            });
        }

        self.confirmed_flags = flags;

        if !was_restored && self.is_restored() {
            events.push(WindowEvent::Restore);
        }
        events
    }

    /// Records a confirmed client-area position, returning the event to emit
    /// if it actually changed.
    pub fn apply_confirmed_position(&mut self, position: Point) -> Option<WindowEvent> {
        if position == self.bounds.origin {
            return None;
        }
        self.bounds.origin = position;
        if self.is_restored() {
            self.restored_bounds.origin = position;
        }
        Some(WindowEvent::Move { position })
    }

    /// Records a confirmed client-area size, returning the event to emit if
    /// it actually changed.
    pub fn apply_confirmed_size(&mut self, size: crate::geometry::Size) -> Option<WindowEvent> {
        if size == self.bounds.size {
            return None;
        }
        self.bounds.size = size;
        if self.is_restored() {
            self.restored_bounds.size = size;
        }
        Some(WindowEvent::Resize { size })
    }

    /// Commits resolved decoration extents and decides whether a deferred
    /// bounds request should be issued now.
    ///
    /// Returns the deferred target if one was pending and the window is
    /// restored. The pending slot is cleared on return, so committing the
    /// same extents again does nothing.
    pub fn commit_extents(&mut self, extents: FrameExtents) -> Option<Rect> {
        self.extents = extents;
        if !self.is_restored() {
            return None;
        }
        self.pending_resize.take()
    }
}

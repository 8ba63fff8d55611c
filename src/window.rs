// src/window.rs

//! The window facade, its shared core, and the process-wide window registry.
//!
//! Ownership is split in two. `Window` is the consumer-facing handle: the
//! only value that can open, close, and mutate. `WindowShared` is the part
//! the message pump needs to reach from a native handle: the state record,
//! the event queue, and the translator scratch (repeat detector, text
//! assembler), all under one mutex. The registry maps native handles to
//! their `WindowShared` so a single pump pass can route messages to any
//! window on the shared connection.
//!
//! Locking rule: the core mutex is held for record/queue mutation and
//! non-blocking platform requests only, never across a blocking pump call.

use crate::backend::{
    self, ActiveBackend, PlatformBackend, PumpMode, PumpOutcome, StateRequest,
};
use crate::backend::extents::ExtentsOutcome;
use crate::config::WindowConfig;
use crate::event::{EventQueue, WindowEvent};
use crate::geometry::{clamp_to_client, Point, Rect};
use crate::input::{PressClass, ReleasedKey, RepeatDetector, TextAssembler};
use crate::keys::{Key, Modifiers, MouseButton, ScrollAxis};
use crate::state::{FrameExtents, StateFlags, WindowState};
use anyhow::{Context, Result};
use log::{debug, error, trace, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::os::raw::c_void;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Native handles a graphics context needs to bind to the window.
#[derive(Debug, Clone, Copy)]
pub struct NativeHandles {
    /// Opaque display/connection pointer. Null for backends without one.
    pub display: *mut c_void,
    /// Native window handle.
    pub window: u64,
}

static REGISTRY: Lazy<Mutex<HashMap<u64, Arc<WindowShared>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn registry() -> MutexGuard<'static, HashMap<u64, Arc<WindowShared>>> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Finds the shared half of a window by native handle. Messages for handles
/// not present here (already-closed windows) are dropped by the pump.
pub(crate) fn lookup(handle: u64) -> Option<Arc<WindowShared>> {
    registry().get(&handle).cloned()
}

/// Text payload accompanying a key press, in whatever form the platform
/// delivered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KeyText {
    None,
    /// Raw UTF-16 code units; surrogate pairs may span messages.
    Utf16(Vec<u16>),
    /// Already-decoded scalars from a platform lookup routine.
    Chars(String),
}

/// Everything the pump and translator touch, under one lock.
pub(crate) struct WindowCore {
    pub(crate) state: WindowState,
    pub(crate) queue: EventQueue,
    pub(crate) repeat: RepeatDetector,
    pub(crate) text: TextAssembler,
    pub(crate) backend: Option<ActiveBackend>,
}

/// The registry-visible half of a window.
pub(crate) struct WindowShared {
    core: Mutex<WindowCore>,
}

impl WindowShared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, WindowCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WindowCore {
    fn push(&mut self, event: WindowEvent) {
        trace!("event queued: {:?}", event);
        self.queue.push(event);
    }

    /// Emits the buffered key release, if any, as a genuine `KeyUp`. Called
    /// before translating any non-key message and once the platform queue is
    /// confirmed empty.
    pub(crate) fn flush_pending_release(&mut self) {
        if let Some(r) = self.repeat.take_pending() {
            self.push(WindowEvent::KeyUp {
                key: r.key,
                modifiers: r.modifiers,
            });
        }
    }

    pub(crate) fn handle_key_press(
        &mut self,
        keycode: u32,
        time: u64,
        key: Key,
        modifiers: Modifiers,
        text: KeyText,
    ) {
        match self.repeat.on_press(keycode, time) {
            PressClass::Repeat => {
                // Auto-repeat: the buffered release was consumed. With
                // repeats disabled both halves vanish.
                if self.state.key_repeat_enabled {
                    self.push(WindowEvent::KeyDown {
                        key,
                        modifiers,
                        is_repeat: true,
                    });
                    self.emit_text(text, true);
                }
            }
            PressClass::Initial(flushed) => {
                if let Some(r) = flushed {
                    self.push(WindowEvent::KeyUp {
                        key: r.key,
                        modifiers: r.modifiers,
                    });
                }
                self.push(WindowEvent::KeyDown {
                    key,
                    modifiers,
                    is_repeat: false,
                });
                self.emit_text(text, false);
            }
        }
    }

    pub(crate) fn handle_key_release(
        &mut self,
        keycode: u32,
        time: u64,
        key: Key,
        modifiers: Modifiers,
    ) {
        if let Some(prev) = self.repeat.on_release(ReleasedKey {
            keycode,
            time,
            key,
            modifiers,
        }) {
            self.push(WindowEvent::KeyUp {
                key: prev.key,
                modifiers: prev.modifiers,
            });
        }
    }

    fn emit_text(&mut self, text: KeyText, is_repeat: bool) {
        match text {
            KeyText::None => {}
            KeyText::Utf16(units) => {
                for unit in units {
                    if let Some(ch) = self.text.push_utf16(unit) {
                        self.push_text(ch, is_repeat);
                    }
                }
            }
            KeyText::Chars(s) => {
                for ch in s.chars() {
                    if let Some(ch) = self.text.push_char(ch) {
                        self.push_text(ch, is_repeat);
                    }
                }
            }
        }
    }

    fn push_text(&mut self, ch: char, is_repeat: bool) {
        // Control characters surface as key events only.
        if ch.is_control() {
            return;
        }
        self.push(WindowEvent::Text { ch, is_repeat });
    }

    pub(crate) fn handle_button(
        &mut self,
        pressed: bool,
        button: MouseButton,
        position: Point,
        modifiers: Modifiers,
    ) {
        self.flush_pending_release();
        let position = clamp_to_client(position, self.state.bounds.size);
        self.push(if pressed {
            WindowEvent::MouseDown {
                button,
                position,
                modifiers,
            }
        } else {
            WindowEvent::MouseUp {
                button,
                position,
                modifiers,
            }
        });
    }

    pub(crate) fn handle_scroll(
        &mut self,
        axis: ScrollAxis,
        amount: i32,
        position: Point,
        modifiers: Modifiers,
    ) {
        self.flush_pending_release();
        let position = clamp_to_client(position, self.state.bounds.size);
        self.push(WindowEvent::MouseScroll {
            axis,
            amount,
            position,
            modifiers,
        });
    }

    pub(crate) fn handle_motion(&mut self, position: Point, modifiers: Modifiers) {
        self.flush_pending_release();
        let position = clamp_to_client(position, self.state.bounds.size);
        if self.state.keep_cursor_centered {
            let size = self.state.bounds.size;
            let center = Point::new((size.width / 2) as i32, (size.height / 2) as i32);
            if position == center {
                // Our own warp arriving back; not user motion.
                return;
            }
            self.push(WindowEvent::MouseMove {
                position,
                modifiers,
            });
            if let Some(b) = self.backend.as_mut() {
                if let Err(e) = b.warp_cursor(center) {
                    warn!("failed to re-center cursor: {:#}", e);
                }
            }
            return;
        }
        self.push(WindowEvent::MouseMove {
            position,
            modifiers,
        });
    }

    pub(crate) fn handle_crossing(&mut self, entered: bool) {
        self.flush_pending_release();
        self.push(if entered {
            WindowEvent::MouseEnter
        } else {
            WindowEvent::MouseLeave
        });
    }

    pub(crate) fn handle_focus(&mut self, focused: bool) {
        self.flush_pending_release();
        if self.state.focused == focused {
            return;
        }
        self.state.focused = focused;
        self.push(if focused {
            WindowEvent::Focus
        } else {
            WindowEvent::Blur
        });
    }

    pub(crate) fn handle_configure(&mut self, bounds: Rect) {
        self.flush_pending_release();
        if let Some(event) = self.state.apply_confirmed_position(bounds.origin) {
            self.push(event);
        }
        if let Some(event) = self.state.apply_confirmed_size(bounds.size) {
            self.push(event);
        }
    }

    pub(crate) fn handle_state_property(&mut self, flags: StateFlags) {
        self.flush_pending_release();
        for event in self.state.apply_confirmed_flags(flags) {
            self.push(event);
        }
    }

    pub(crate) fn handle_extents_outcome(&mut self, outcome: ExtentsOutcome) {
        match outcome {
            ExtentsOutcome::Resolved(extents) => self.handle_extents(extents),
            // No property at all means an undecorated window or a window
            // manager that does not publish extents.
            ExtentsOutcome::Absent => self.handle_extents(FrameExtents::new(0, 0, 0, 0)),
            ExtentsOutcome::Malformed => {
                self.flush_pending_release();
                // Transient states during window-manager startup produce
                // short or mistyped reads; keep whatever we had.
                debug!("discarding malformed frame-extents read");
            }
        }
    }

    fn handle_extents(&mut self, extents: FrameExtents) {
        self.flush_pending_release();
        if let Some(target) = self.state.commit_extents(extents) {
            let extents = self.state.extents;
            if let Some(b) = self.backend.as_mut() {
                if let Err(e) = b.set_bounds(target, &extents) {
                    warn!("failed to apply deferred bounds: {:#}", e);
                }
            }
        }
    }

    pub(crate) fn handle_close_request(&mut self) {
        self.flush_pending_release();
        self.push(WindowEvent::Close);
    }
}

/// A native window plus its canonical event stream.
///
/// Construct with [`Window::new`], then [`Window::open`] to create the
/// native window. All methods are meant to be called from the thread that
/// pumps events; see the crate-level notes on the threading model.
pub struct Window {
    shared: Arc<WindowShared>,
    class_name: String,
}

impl Window {
    pub fn new(config: &WindowConfig) -> Self {
        let mut state = WindowState::default();
        state.title = config.identity.title.clone();
        state.bounds = config.geometry.rect();
        state.restored_bounds = state.bounds;
        state.visible = config.behavior.visible;
        state.borderless = config.behavior.borderless;
        state.resizable = config.behavior.resizable;
        state.fullscreen = config.behavior.fullscreen;
        state.maximized = config.behavior.maximized;
        state.key_repeat_enabled = config.behavior.key_repeat;
        state.cursor_visible = config.behavior.cursor_visible;

        Window {
            shared: Arc::new(WindowShared {
                core: Mutex::new(WindowCore {
                    state,
                    queue: EventQueue::new(),
                    repeat: RepeatDetector::new(),
                    text: TextAssembler::new(),
                    backend: None,
                }),
            }),
            class_name: config.identity.class_name.clone(),
        }
    }

    /// Creates the native window from the current record and registers it
    /// with the pump. Opening an already-open window is a no-op.
    pub fn open(&mut self) -> Result<()> {
        let mut core = self.shared.lock();
        if core.backend.is_some() {
            return Ok(());
        }
        let backend = ActiveBackend::open(&core.state, &self.class_name)
            .context("failed to open native window")?;
        let handle = backend.handle();
        // Until the frame extents are known the window manager may have
        // placed the frame, not the client area, at the requested origin.
        // The first extents resolution re-issues the bounds compensated.
        core.state.pending_resize = Some(core.state.bounds);
        core.state.extents = FrameExtents::default();
        core.backend = Some(backend);
        drop(core);
        registry().insert(handle, Arc::clone(&self.shared));
        debug!("window {:#x} opened", handle);
        Ok(())
    }

    /// Destroys the native window. The record survives, so the window can be
    /// reopened with its last-set attributes. Closing a closed window is a
    /// no-op; errors are logged, not returned.
    pub fn close(&mut self) {
        let mut core = self.shared.lock();
        let Some(mut backend) = core.backend.take() else {
            return;
        };
        let handle = backend.handle();
        core.queue = EventQueue::new();
        core.state.pending_resize = None;
        core.state.extents = FrameExtents::default();
        core.state.focused = false;
        drop(core);
        // Unregister before destroying so the pump cannot route to a dead
        // window.
        registry().remove(&handle);
        if let Err(e) = backend.close() {
            error!("error closing window {:#x}: {:#}", handle, e);
        }
        debug!("window {:#x} closed", handle);
    }

    pub fn is_open(&self) -> bool {
        self.shared.lock().backend.is_some()
    }

    /// Drains pending platform messages without blocking, then pops the next
    /// canonical event if one exists.
    pub fn peek_event(&mut self) -> Option<WindowEvent> {
        if let Err(e) = backend::pump(&self.shared, PumpMode::NonBlocking) {
            warn!("event pump failed: {:#}", e);
        }
        self.shared.lock().queue.pop()
    }

    /// Blocks until this window has a canonical event, then pops it. Returns
    /// `Ok(None)` once the platform has shut down for this window.
    pub fn get_event(&mut self) -> Result<Option<WindowEvent>> {
        loop {
            match backend::pump(&self.shared, PumpMode::Blocking)? {
                PumpOutcome::Ready => {
                    if let Some(event) = self.shared.lock().queue.pop() {
                        return Ok(Some(event));
                    }
                }
                PumpOutcome::Shutdown => {
                    // Deliver anything translated before the shutdown.
                    return Ok(self.shared.lock().queue.pop());
                }
                PumpOutcome::Idle => continue,
            }
        }
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        let mut core = self.shared.lock();
        if core.state.title == title {
            return Ok(());
        }
        core.state.title = title.to_string();
        if let Some(b) = core.backend.as_mut() {
            b.set_title(title)?;
        }
        Ok(())
    }

    pub fn title(&self) -> String {
        self.shared.lock().state.title.clone()
    }

    /// Sets the client-area bounds in screen coordinates. While the
    /// decoration extents are unknown the request is parked and issued,
    /// compensated, on the first successful extents resolution.
    pub fn set_bounds(&mut self, bounds: Rect) -> Result<()> {
        let mut core = self.shared.lock();
        if core.state.bounds == bounds && core.state.pending_resize.is_none() {
            return Ok(());
        }
        core.state.bounds = bounds;
        if core.state.is_restored() {
            core.state.restored_bounds = bounds;
        }
        let extents = core.state.extents;
        // Reborrow the guard once so state and backend borrow as fields.
        let core = &mut *core;
        match core.backend.as_mut() {
            None => {
                core.state.pending_resize = None;
            }
            Some(b) if extents.known => {
                core.state.pending_resize = None;
                b.set_bounds(bounds, &extents)?;
            }
            Some(_) => {
                core.state.pending_resize = Some(bounds);
            }
        }
        Ok(())
    }

    pub fn bounds(&self) -> Rect {
        self.shared.lock().state.bounds
    }

    pub fn set_visible(&mut self, visible: bool) -> Result<()> {
        let mut core = self.shared.lock();
        if core.state.visible == visible {
            return Ok(());
        }
        core.state.visible = visible;
        if let Some(b) = core.backend.as_mut() {
            b.set_visible(visible)?;
        }
        Ok(())
    }

    pub fn is_visible(&self) -> bool {
        self.shared.lock().state.visible
    }

    pub fn set_borderless(&mut self, borderless: bool) -> Result<()> {
        let mut core = self.shared.lock();
        if core.state.borderless == borderless {
            return Ok(());
        }
        core.state.borderless = borderless;
        if let Some(b) = core.backend.as_mut() {
            b.set_borderless(borderless)?;
            // The decoration change shifts the client area; once the new
            // extents arrive the bounds are re-pinned where they were.
            let bounds = core.state.bounds;
            core.state.pending_resize = Some(bounds);
        }
        Ok(())
    }

    pub fn is_borderless(&self) -> bool {
        self.shared.lock().state.borderless
    }

    pub fn set_resizable(&mut self, resizable: bool) -> Result<()> {
        let mut core = self.shared.lock();
        if core.state.resizable == resizable {
            return Ok(());
        }
        core.state.resizable = resizable;
        let size = core.state.bounds.size;
        if let Some(b) = core.backend.as_mut() {
            b.set_resizable(resizable, size)?;
        }
        Ok(())
    }

    pub fn is_resizable(&self) -> bool {
        self.shared.lock().state.resizable
    }

    /// Requests fullscreen. The record flips only when the platform confirms
    /// the transition, which also emits `EnterFullscreen`/`ExitFullscreen`.
    pub fn set_fullscreen(&mut self, fullscreen: bool) -> Result<()> {
        let mut core = self.shared.lock();
        if core.state.fullscreen == fullscreen {
            return Ok(());
        }
        match core.backend.as_mut() {
            None => core.state.fullscreen = fullscreen,
            Some(b) => b.request_state(StateRequest::Fullscreen(fullscreen))?,
        }
        Ok(())
    }

    pub fn is_fullscreen(&self) -> bool {
        self.shared.lock().state.fullscreen
    }

    /// Requests maximize. Entering always issues a fullscreen exit first;
    /// window managers ignore maximize while fullscreen is set.
    pub fn set_maximized(&mut self, maximized: bool) -> Result<()> {
        let mut core = self.shared.lock();
        if core.state.maximized == maximized {
            return Ok(());
        }
        match core.backend.as_mut() {
            None => {
                if maximized {
                    core.state.fullscreen = false;
                }
                core.state.maximized = maximized;
            }
            Some(b) => {
                if maximized {
                    b.request_state(StateRequest::Fullscreen(false))?;
                }
                b.request_state(StateRequest::Maximized(maximized))?;
            }
        }
        Ok(())
    }

    pub fn is_maximized(&self) -> bool {
        self.shared.lock().state.maximized
    }

    pub fn set_minimized(&mut self, minimized: bool) -> Result<()> {
        let mut core = self.shared.lock();
        if core.state.minimized == minimized {
            return Ok(());
        }
        match core.backend.as_mut() {
            None => core.state.minimized = minimized,
            Some(b) => b.request_state(StateRequest::Minimized(minimized))?,
        }
        Ok(())
    }

    pub fn is_minimized(&self) -> bool {
        self.shared.lock().state.minimized
    }

    /// Requests shade (roll up to the title bar). Entering always issues a
    /// fullscreen exit first, like maximize.
    pub fn set_shaded(&mut self, shaded: bool) -> Result<()> {
        let mut core = self.shared.lock();
        if core.state.shaded == shaded {
            return Ok(());
        }
        match core.backend.as_mut() {
            None => {
                if shaded {
                    core.state.fullscreen = false;
                }
                core.state.shaded = shaded;
            }
            Some(b) => {
                if shaded {
                    b.request_state(StateRequest::Fullscreen(false))?;
                }
                b.request_state(StateRequest::Shaded(shaded))?;
            }
        }
        Ok(())
    }

    pub fn is_shaded(&self) -> bool {
        self.shared.lock().state.shaded
    }

    /// Requests a return to the restored state: exit requests for
    /// fullscreen, maximize, shade, and minimize, in that order. Each is
    /// fire-and-forget; confirmations arrive as events.
    pub fn restore(&mut self) -> Result<()> {
        let mut core = self.shared.lock();
        match core.backend.as_mut() {
            None => {
                core.state.fullscreen = false;
                core.state.maximized = false;
                core.state.shaded = false;
                core.state.minimized = false;
            }
            Some(b) => {
                b.request_state(StateRequest::Fullscreen(false))?;
                b.request_state(StateRequest::Maximized(false))?;
                b.request_state(StateRequest::Shaded(false))?;
                b.request_state(StateRequest::Minimized(false))?;
            }
        }
        Ok(())
    }

    pub fn is_restored(&self) -> bool {
        self.shared.lock().state.is_restored()
    }

    /// Asks the platform to focus this window. Confirmation arrives as a
    /// `Focus` event.
    pub fn focus(&mut self) -> Result<()> {
        let mut core = self.shared.lock();
        if let Some(b) = core.backend.as_mut() {
            b.focus()?;
        }
        Ok(())
    }

    pub fn has_focus(&self) -> bool {
        self.shared.lock().state.focused
    }

    pub fn set_mouse_capture(&mut self, captured: bool) -> Result<()> {
        let mut core = self.shared.lock();
        if core.state.mouse_captured == captured {
            return Ok(());
        }
        core.state.mouse_captured = captured;
        let trapped = core.state.cursor_trapped;
        if let Some(b) = core.backend.as_mut() {
            b.update_pointer_grab(captured, trapped)?;
        }
        Ok(())
    }

    pub fn set_cursor_trapped(&mut self, trapped: bool) -> Result<()> {
        let mut core = self.shared.lock();
        if core.state.cursor_trapped == trapped {
            return Ok(());
        }
        core.state.cursor_trapped = trapped;
        let captured = core.state.mouse_captured;
        if let Some(b) = core.backend.as_mut() {
            b.update_pointer_grab(captured, trapped)?;
        }
        Ok(())
    }

    pub fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        let mut core = self.shared.lock();
        if core.state.cursor_visible == visible {
            return Ok(());
        }
        core.state.cursor_visible = visible;
        if let Some(b) = core.backend.as_mut() {
            b.set_cursor_visible(visible)?;
        }
        Ok(())
    }

    /// Gates delivery of auto-repeated keys. The keyboard itself is left
    /// alone; repeats are filtered in translation.
    pub fn set_key_repeat(&mut self, enabled: bool) -> Result<()> {
        self.shared.lock().state.key_repeat_enabled = enabled;
        Ok(())
    }

    /// While enabled, the pointer is warped back to the client-area center
    /// after every motion event; the warp's own motion is suppressed.
    pub fn set_keep_cursor_centered(&mut self, centered: bool) -> Result<()> {
        self.shared.lock().state.keep_cursor_centered = centered;
        Ok(())
    }

    pub fn send_to_top(&mut self) -> Result<()> {
        let mut core = self.shared.lock();
        if let Some(b) = core.backend.as_mut() {
            b.raise()?;
        }
        Ok(())
    }

    pub fn send_to_bottom(&mut self) -> Result<()> {
        let mut core = self.shared.lock();
        if let Some(b) = core.backend.as_mut() {
            b.lower()?;
        }
        Ok(())
    }

    /// Converts a screen position to client coordinates. Open windows ask
    /// the platform; closed windows fall back to the recorded bounds.
    pub fn screen_to_window(&self, position: Point) -> Point {
        let core = self.shared.lock();
        if let Some(b) = core.backend.as_ref() {
            match b.screen_to_window(position) {
                Ok(p) => return p,
                Err(e) => warn!("coordinate query failed, using cached bounds: {:#}", e),
            }
        }
        let origin = core.state.bounds.origin;
        Point::new(position.x - origin.x, position.y - origin.y)
    }

    /// Converts a client position to screen coordinates. Open windows ask
    /// the platform; closed windows fall back to the recorded bounds.
    pub fn window_to_screen(&self, position: Point) -> Point {
        let core = self.shared.lock();
        if let Some(b) = core.backend.as_ref() {
            match b.window_to_screen(position) {
                Ok(p) => return p,
                Err(e) => warn!("coordinate query failed, using cached bounds: {:#}", e),
            }
        }
        let origin = core.state.bounds.origin;
        Point::new(position.x + origin.x, position.y + origin.y)
    }

    /// Native window handle while open.
    pub fn native_handle(&self) -> Option<NonZeroU64> {
        self.shared
            .lock()
            .backend
            .as_ref()
            .and_then(|b| NonZeroU64::new(b.handle()))
    }

    /// Opaque native display pointer; null while closed.
    pub fn native_display(&self) -> *mut c_void {
        self.shared
            .lock()
            .backend
            .as_ref()
            .map(|b| b.display_ptr())
            .unwrap_or(std::ptr::null_mut())
    }

    /// Both native handles at once, for handing to a graphics context.
    pub fn native_handles(&self) -> Option<NativeHandles> {
        let core = self.shared.lock();
        core.backend.as_ref().map(|b| NativeHandles {
            display: b.display_ptr(),
            window: b.handle(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_backend<R>(&self, f: impl FnOnce(&mut ActiveBackend) -> R) -> R {
        let mut core = self.shared.lock();
        f(core.backend.as_mut().expect("window is not open"))
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(&WindowConfig::default())
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockMessage;
    use crate::backend::mock::MockRequest;
    use crate::geometry::Size;
    use test_log::test; // For logging within tests

    fn open_window() -> Window {
        let mut window = Window::new(&WindowConfig::default());
        window.open().expect("mock open cannot fail");
        window
    }

    fn drain(window: &mut Window) -> Vec<WindowEvent> {
        let mut events = Vec::new();
        while let Some(e) = window.peek_event() {
            events.push(e);
        }
        events
    }

    #[test]
    fn it_should_keep_the_last_bounds_set_before_open() {
        let mut window = Window::new(&WindowConfig::default());
        window.set_bounds(Rect::new(1, 1, 10, 10)).unwrap();
        window.set_bounds(Rect::new(2, 2, 20, 20)).unwrap();
        window.set_bounds(Rect::new(32, 32, 1024, 768)).unwrap();
        window.open().unwrap();
        assert_eq!(window.bounds(), Rect::new(32, 32, 1024, 768));
    }

    #[test]
    fn it_should_apply_pre_open_lifecycle_state_at_open() {
        let mut window = Window::new(&WindowConfig::default());
        window.set_fullscreen(true).unwrap();
        assert!(window.is_fullscreen());
        window.open().unwrap();
        // The backend saw the desired state at creation.
        let seeded = window.with_backend(|b| b.opened_with_fullscreen());
        assert!(seeded);
    }

    #[test]
    fn it_should_report_restored_only_when_no_lifecycle_state_is_set() {
        let mut window = open_window();
        assert!(window.is_restored());

        window.with_backend(|b| {
            b.push_message(MockMessage::StateProperty(StateFlags::MAXIMIZED_VERT))
        });
        drain(&mut window);
        assert!(window.is_maximized());
        assert!(!window.is_restored());

        window.with_backend(|b| b.push_message(MockMessage::StateProperty(StateFlags::empty())));
        drain(&mut window);
        assert!(window.is_restored());
    }

    #[test]
    fn it_should_collapse_a_repeat_pair_into_one_keydown() {
        let mut window = open_window();
        window.with_backend(|b| {
            b.push_message(MockMessage::KeyRelease {
                keycode: 38,
                time: 1000,
                key: Key::Char('a'),
                modifiers: Modifiers::empty(),
            });
            b.push_message(MockMessage::KeyPress {
                keycode: 38,
                time: 1000,
                key: Key::Char('a'),
                modifiers: Modifiers::empty(),
                text: Some('a'),
            });
        });
        let events = drain(&mut window);
        assert_eq!(
            events,
            vec![
                WindowEvent::KeyDown {
                    key: Key::Char('a'),
                    modifiers: Modifiers::empty(),
                    is_repeat: true,
                },
                WindowEvent::Text {
                    ch: 'a',
                    is_repeat: true,
                },
            ]
        );
    }

    #[test]
    fn it_should_suppress_both_halves_of_a_repeat_pair_when_repeat_is_off() {
        let mut window = open_window();
        window.set_key_repeat(false).unwrap();
        window.with_backend(|b| {
            b.push_message(MockMessage::KeyRelease {
                keycode: 38,
                time: 1000,
                key: Key::Char('a'),
                modifiers: Modifiers::empty(),
            });
            b.push_message(MockMessage::KeyPress {
                keycode: 38,
                time: 1000,
                key: Key::Char('a'),
                modifiers: Modifiers::empty(),
                text: Some('a'),
            });
        });
        assert_eq!(drain(&mut window), vec![]);
    }

    #[test]
    fn it_should_flush_a_buffered_release_when_the_queue_empties() {
        let mut window = open_window();
        window.with_backend(|b| {
            b.push_message(MockMessage::KeyPress {
                keycode: 38,
                time: 900,
                key: Key::Char('a'),
                modifiers: Modifiers::empty(),
                text: Some('a'),
            });
            b.push_message(MockMessage::KeyRelease {
                keycode: 38,
                time: 1000,
                key: Key::Char('a'),
                modifiers: Modifiers::empty(),
            });
        });
        // The script drains with nothing after the release, so it must
        // surface as a genuine KeyUp.
        let events = drain(&mut window);
        assert_eq!(
            events,
            vec![
                WindowEvent::KeyDown {
                    key: Key::Char('a'),
                    modifiers: Modifiers::empty(),
                    is_repeat: false,
                },
                WindowEvent::Text {
                    ch: 'a',
                    is_repeat: false,
                },
                WindowEvent::KeyUp {
                    key: Key::Char('a'),
                    modifiers: Modifiers::empty(),
                },
            ]
        );
    }

    #[test]
    fn it_should_emit_the_buffered_release_before_an_unrelated_press() {
        let mut window = open_window();
        window.with_backend(|b| {
            b.push_message(MockMessage::KeyRelease {
                keycode: 38,
                time: 1000,
                key: Key::Char('a'),
                modifiers: Modifiers::empty(),
            });
            b.push_message(MockMessage::KeyPress {
                keycode: 39,
                time: 1001,
                key: Key::Char('s'),
                modifiers: Modifiers::empty(),
                text: Some('s'),
            });
        });
        let events = drain(&mut window);
        assert_eq!(
            events[0],
            WindowEvent::KeyUp {
                key: Key::Char('a'),
                modifiers: Modifiers::empty(),
            }
        );
        assert_eq!(
            events[1],
            WindowEvent::KeyDown {
                key: Key::Char('s'),
                modifiers: Modifiers::empty(),
                is_repeat: false,
            }
        );
    }

    #[test]
    fn it_should_pair_a_repeat_across_two_polling_passes() {
        let mut window = open_window();
        window.with_backend(|b| {
            b.push_message(MockMessage::KeyPress {
                keycode: 38,
                time: 900,
                key: Key::Char('a'),
                modifiers: Modifiers::empty(),
                text: None,
            });
        });
        assert_eq!(
            window.peek_event(),
            Some(WindowEvent::KeyDown {
                key: Key::Char('a'),
                modifiers: Modifiers::empty(),
                is_repeat: false,
            })
        );

        // Release and press land in separate passes; the mock keeps the
        // release un-flushed by marking the queue as still busy.
        window.with_backend(|b| {
            b.push_message(MockMessage::KeyRelease {
                keycode: 38,
                time: 1000,
                key: Key::Char('a'),
                modifiers: Modifiers::empty(),
            });
            b.set_hold_flush(true);
        });
        assert_eq!(window.peek_event(), None);

        window.with_backend(|b| {
            b.set_hold_flush(false);
            b.push_message(MockMessage::KeyPress {
                keycode: 38,
                time: 1000,
                key: Key::Char('a'),
                modifiers: Modifiers::empty(),
                text: None,
            });
        });
        assert_eq!(
            window.peek_event(),
            Some(WindowEvent::KeyDown {
                key: Key::Char('a'),
                modifiers: Modifiers::empty(),
                is_repeat: true,
            })
        );
        assert_eq!(window.peek_event(), None);
    }

    #[test]
    fn it_should_apply_deferred_bounds_exactly_once_per_resolution() {
        let mut window = open_window();
        window.with_backend(|b| b.take_requests());

        // First resolution applies the bounds parked at open.
        window.with_backend(|b| {
            b.push_message(MockMessage::ExtentsProperty {
                items: Some(vec![4, 4, 28, 4]),
            })
        });
        drain(&mut window);
        let requests = window.with_backend(|b| b.take_requests());
        let bounds_requests: Vec<_> = requests
            .iter()
            .filter(|r| matches!(r, MockRequest::SetBounds { .. }))
            .collect();
        assert_eq!(bounds_requests.len(), 1);

        // The same extents again must not re-issue anything.
        window.with_backend(|b| {
            b.push_message(MockMessage::ExtentsProperty {
                items: Some(vec![4, 4, 28, 4]),
            })
        });
        drain(&mut window);
        let requests = window.with_backend(|b| b.take_requests());
        assert!(requests
            .iter()
            .all(|r| !matches!(r, MockRequest::SetBounds { .. })));
    }

    #[test]
    fn it_should_compensate_deferred_bounds_with_the_extents() {
        let mut window = Window::new(&WindowConfig::default());
        window.set_bounds(Rect::new(32, 32, 1024, 768)).unwrap();
        window.open().unwrap();
        window.with_backend(|b| b.take_requests());

        window.with_backend(|b| {
            b.push_message(MockMessage::ExtentsProperty {
                items: Some(vec![4, 4, 28, 4]),
            })
        });
        drain(&mut window);
        let requests = window.with_backend(|b| b.take_requests());
        match requests.as_slice() {
            [MockRequest::SetBounds {
                bounds,
                compensated,
            }] => {
                assert_eq!(*bounds, Rect::new(32, 32, 1024, 768));
                // Frame origin = client origin minus the left/top insets.
                assert_eq!(*compensated, Point::new(28, 4));
            }
            other => panic!("expected one SetBounds, got {:?}", other),
        }
    }

    #[test]
    fn it_should_issue_bounds_directly_once_extents_are_known() {
        let mut window = Window::new(&WindowConfig::default());
        window.set_bounds(Rect::new(32, 32, 1024, 768)).unwrap();
        window.open().unwrap();
        window.with_backend(|b| {
            b.push_message(MockMessage::ExtentsProperty {
                items: Some(vec![4, 4, 28, 4]),
            })
        });
        drain(&mut window);
        window.with_backend(|b| b.take_requests());

        // With extents resolved, a new request goes out immediately,
        // already compensated, instead of being parked.
        window.set_bounds(Rect::new(100, 100, 640, 480)).unwrap();
        let requests = window.with_backend(|b| b.take_requests());
        match requests.as_slice() {
            [MockRequest::SetBounds {
                bounds,
                compensated,
            }] => {
                assert_eq!(*bounds, Rect::new(100, 100, 640, 480));
                assert_eq!(*compensated, Point::new(96, 72));
            }
            other => panic!("expected one SetBounds, got {:?}", other),
        }

        // Nothing was parked: the same extents arriving again re-issue
        // no bounds request.
        window.with_backend(|b| {
            b.push_message(MockMessage::ExtentsProperty {
                items: Some(vec![4, 4, 28, 4]),
            })
        });
        drain(&mut window);
        assert!(window.with_backend(|b| b.take_requests()).is_empty());
    }

    #[test]
    fn it_should_retain_stale_extents_on_a_malformed_read() {
        let mut window = open_window();
        window.with_backend(|b| {
            b.push_message(MockMessage::ExtentsProperty {
                items: Some(vec![4, 4, 28, 4]),
            });
            // Wrong arity: six items.
            b.push_message(MockMessage::ExtentsProperty {
                items: Some(vec![1, 2, 3, 4, 5, 6]),
            });
        });
        drain(&mut window);
        let extents = window.shared.lock().state.extents;
        assert_eq!(extents, FrameExtents::new(4, 4, 28, 4));
    }

    #[test]
    fn it_should_resolve_an_absent_extents_property_to_zero() {
        let mut window = open_window();
        window.with_backend(|b| b.push_message(MockMessage::ExtentsProperty { items: None }));
        drain(&mut window);
        let core = window.shared.lock();
        assert!(core.state.extents.known);
        assert_eq!(core.state.extents, FrameExtents::new(0, 0, 0, 0));
    }

    #[test]
    fn it_should_round_trip_coordinate_transforms() {
        let mut window = Window::new(&WindowConfig::default());
        window.set_bounds(Rect::new(100, 50, 640, 480)).unwrap();

        // Closed window: record arithmetic.
        let p = Point::new(250, 75);
        assert_eq!(window.window_to_screen(window.screen_to_window(p)), p);
        assert_eq!(window.screen_to_window(Point::new(100, 50)), Point::new(0, 0));

        // Open window: the platform answers, and stays consistent.
        window.open().unwrap();
        assert_eq!(window.window_to_screen(window.screen_to_window(p)), p);
    }

    #[test]
    fn it_should_confirm_maximize_with_one_event_and_updated_state() {
        let mut window = Window::new(&WindowConfig::default());
        window.set_bounds(Rect::new(32, 32, 1024, 768)).unwrap();
        window.open().unwrap();
        window.with_backend(|b| b.take_requests());

        window.set_maximized(true).unwrap();
        let requests = window.with_backend(|b| b.take_requests());
        assert_eq!(
            requests,
            vec![
                MockRequest::State(StateRequest::Fullscreen(false)),
                MockRequest::State(StateRequest::Maximized(true)),
            ]
        );
        // Nothing confirmed yet.
        assert!(!window.is_maximized());

        window.with_backend(|b| {
            b.push_message(MockMessage::StateProperty(
                StateFlags::MAXIMIZED_VERT | StateFlags::MAXIMIZED_HORZ,
            ))
        });
        let events = drain(&mut window);
        assert_eq!(events, vec![WindowEvent::Maximize]);
        assert!(window.is_maximized());
        assert!(!window.is_restored());
    }

    #[test]
    fn it_should_order_fullscreen_exit_before_maximize_entry() {
        let mut window = open_window();
        window.with_backend(|b| b.take_requests());

        window.set_fullscreen(true).unwrap();
        window.set_maximized(true).unwrap();

        let requests = window.with_backend(|b| b.take_requests());
        assert_eq!(
            requests,
            vec![
                MockRequest::State(StateRequest::Fullscreen(true)),
                MockRequest::State(StateRequest::Fullscreen(false)),
                MockRequest::State(StateRequest::Maximized(true)),
            ]
        );
    }

    #[test]
    fn it_should_order_fullscreen_exit_before_shade_entry() {
        let mut window = open_window();
        window.with_backend(|b| b.take_requests());

        window.set_fullscreen(true).unwrap();
        window.set_shaded(true).unwrap();

        let requests = window.with_backend(|b| b.take_requests());
        assert_eq!(
            requests,
            vec![
                MockRequest::State(StateRequest::Fullscreen(true)),
                MockRequest::State(StateRequest::Fullscreen(false)),
                MockRequest::State(StateRequest::Shaded(true)),
            ]
        );
    }

    #[test]
    fn it_should_record_shade_before_open_and_clear_fullscreen() {
        let mut window = Window::new(&WindowConfig::default());
        window.set_fullscreen(true).unwrap();
        // Entering shade displaces a recorded fullscreen, same as maximize.
        window.set_shaded(true).unwrap();
        assert!(window.is_shaded());
        assert!(!window.is_fullscreen());

        window.open().unwrap();
        let seeded = window.with_backend(|b| b.initial_state().shaded);
        assert!(seeded);
    }

    #[test]
    fn it_should_issue_restore_requests_in_canonical_order() {
        let mut window = open_window();
        window.with_backend(|b| b.take_requests());

        window.restore().unwrap();
        let requests = window.with_backend(|b| b.take_requests());
        assert_eq!(
            requests,
            vec![
                MockRequest::State(StateRequest::Fullscreen(false)),
                MockRequest::State(StateRequest::Maximized(false)),
                MockRequest::State(StateRequest::Shaded(false)),
                MockRequest::State(StateRequest::Minimized(false)),
            ]
        );
    }

    #[test]
    fn it_should_return_none_from_peek_on_an_empty_queue() {
        let mut window = open_window();
        assert_eq!(window.peek_event(), None);
    }

    #[test]
    fn it_should_deliver_close_requests_as_events_without_closing() {
        let mut window = open_window();
        window.with_backend(|b| b.push_message(MockMessage::CloseRequested));
        assert_eq!(window.peek_event(), Some(WindowEvent::Close));
        assert!(window.is_open());
    }

    #[test]
    fn it_should_drain_translated_events_then_signal_shutdown_from_get_event() {
        let mut window = open_window();
        window.with_backend(|b| {
            b.push_message(MockMessage::FocusIn);
            b.push_message(MockMessage::CloseRequested);
        });
        assert_eq!(window.get_event().unwrap(), Some(WindowEvent::Focus));
        assert_eq!(window.get_event().unwrap(), Some(WindowEvent::Close));
        // Script exhausted: the mock platform reports shutdown.
        assert_eq!(window.get_event().unwrap(), None);
    }

    #[test]
    fn it_should_clamp_mouse_positions_to_the_client_area() {
        let mut window = Window::new(&WindowConfig::default());
        window.set_bounds(Rect::new(0, 0, 640, 480)).unwrap();
        window.open().unwrap();
        window.with_backend(|b| {
            b.push_message(MockMessage::Button {
                pressed: true,
                button: MouseButton::Left,
                position: Point::new(650, -3),
                modifiers: Modifiers::empty(),
            })
        });
        assert_eq!(
            window.peek_event(),
            Some(WindowEvent::MouseDown {
                button: MouseButton::Left,
                position: Point::new(639, 0),
                modifiers: Modifiers::empty(),
            })
        );
    }

    #[test]
    fn it_should_suppress_the_centering_warp_motion() {
        let mut window = Window::new(&WindowConfig::default());
        window.set_bounds(Rect::new(0, 0, 640, 480)).unwrap();
        window.open().unwrap();
        window.set_keep_cursor_centered(true).unwrap();
        window.with_backend(|b| b.take_requests());

        window.with_backend(|b| {
            b.push_message(MockMessage::Motion {
                position: Point::new(100, 100),
                modifiers: Modifiers::empty(),
            });
            // The warp echo.
            b.push_message(MockMessage::Motion {
                position: Point::new(320, 240),
                modifiers: Modifiers::empty(),
            });
        });
        let events = drain(&mut window);
        assert_eq!(
            events,
            vec![WindowEvent::MouseMove {
                position: Point::new(100, 100),
                modifiers: Modifiers::empty(),
            }]
        );
        let requests = window.with_backend(|b| b.take_requests());
        assert_eq!(requests, vec![MockRequest::WarpCursor(Point::new(320, 240))]);
    }

    #[test]
    fn it_should_update_bounds_and_emit_on_configure_changes_only() {
        let mut window = Window::new(&WindowConfig::default());
        window.set_bounds(Rect::new(10, 10, 300, 200)).unwrap();
        window.open().unwrap();

        window.with_backend(|b| {
            // Same geometry: silent.
            b.push_message(MockMessage::Configure {
                bounds: Rect::new(10, 10, 300, 200),
            });
            // Moved and resized: two events.
            b.push_message(MockMessage::Configure {
                bounds: Rect::new(20, 10, 400, 200),
            });
        });
        let events = drain(&mut window);
        assert_eq!(
            events,
            vec![
                WindowEvent::Move {
                    position: Point::new(20, 10)
                },
                WindowEvent::Resize {
                    size: Size::new(400, 200)
                },
            ]
        );
        assert_eq!(window.bounds(), Rect::new(20, 10, 400, 200));
    }

    #[test]
    fn it_should_ignore_setters_with_unchanged_values() {
        let mut window = open_window();
        window.with_backend(|b| b.take_requests());

        let title = window.title();
        window.set_title(&title).unwrap();
        window.set_visible(true).unwrap();
        window.set_resizable(true).unwrap();
        assert_eq!(window.with_backend(|b| b.take_requests()), vec![]);
    }

    #[test]
    fn it_should_reopen_after_close_with_the_recorded_attributes() {
        let mut window = Window::new(&WindowConfig::default());
        window.set_bounds(Rect::new(5, 6, 700, 500)).unwrap();
        window.set_title("still here").unwrap();
        window.open().unwrap();
        window.close();
        assert!(!window.is_open());
        assert_eq!(window.peek_event(), None);

        window.open().unwrap();
        assert!(window.is_open());
        assert_eq!(window.bounds(), Rect::new(5, 6, 700, 500));
        assert_eq!(window.title(), "still here");
    }

    #[test]
    fn it_should_expose_native_handles_only_while_open() {
        let mut window = Window::new(&WindowConfig::default());
        assert!(window.native_handle().is_none());
        assert!(window.native_display().is_null());

        window.open().unwrap();
        assert!(window.native_handle().is_some());
        let handles = window.native_handles().unwrap();
        assert_eq!(handles.window, window.native_handle().unwrap().get());

        window.close();
        assert!(window.native_handle().is_none());
    }
}

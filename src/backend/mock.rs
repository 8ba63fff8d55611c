// src/backend/mock.rs

//! Scriptable stand-in for a native backend.
//!
//! The mock plays a queue of [`MockMessage`]s through the same translator
//! core the real backend feeds, and records every outbound request so tests
//! can assert on ordering. A drained script counts as the platform queue
//! being confirmed empty; an exhausted script under a blocking pump counts
//! as shutdown.

use crate::backend::{PlatformBackend, StateRequest};
use crate::geometry::{Point, Rect, Size};
use crate::keys::{Key, Modifiers, MouseButton, ScrollAxis};
use crate::state::{FrameExtents, StateFlags, WindowState};
use anyhow::Result;
use std::collections::VecDeque;
use std::os::raw::c_void;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(any(test, not(target_os = "linux")))]
use crate::backend::extents::{resolve_extents, PropertyRound};
#[cfg(any(test, not(target_os = "linux")))]
use crate::backend::{PumpMode, PumpOutcome};
#[cfg(any(test, not(target_os = "linux")))]
use crate::window::{KeyText, WindowShared};
#[cfg(any(test, not(target_os = "linux")))]
use std::sync::Arc;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// A scripted platform message, already decoded to canonical inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum MockMessage {
    KeyPress {
        keycode: u32,
        time: u64,
        key: Key,
        modifiers: Modifiers,
        text: Option<char>,
    },
    /// A key press whose text arrives as raw UTF-16 units.
    KeyPressUtf16 {
        keycode: u32,
        time: u64,
        key: Key,
        modifiers: Modifiers,
        units: Vec<u16>,
    },
    KeyRelease {
        keycode: u32,
        time: u64,
        key: Key,
        modifiers: Modifiers,
    },
    Button {
        pressed: bool,
        button: MouseButton,
        position: Point,
        modifiers: Modifiers,
    },
    Scroll {
        axis: ScrollAxis,
        amount: i32,
        position: Point,
        modifiers: Modifiers,
    },
    Motion {
        position: Point,
        modifiers: Modifiers,
    },
    Enter,
    Leave,
    FocusIn,
    FocusOut,
    Configure {
        bounds: Rect,
    },
    /// A confirmed lifecycle-state set, as folded from the state property.
    StateProperty(StateFlags),
    /// The frame-extents property changed; `None` plays an absent property.
    ExtentsProperty {
        items: Option<Vec<u64>>,
    },
    CloseRequested,
}

/// An outbound request the facade issued.
#[derive(Debug, Clone, PartialEq)]
pub enum MockRequest {
    SetTitle(String),
    SetBounds {
        bounds: Rect,
        /// Frame-relative position after extents compensation.
        compensated: Point,
    },
    SetVisible(bool),
    SetBorderless(bool),
    SetResizable {
        resizable: bool,
        size: Size,
    },
    State(StateRequest),
    Focus,
    Raise,
    Lower,
    PointerGrab {
        captured: bool,
        trapped: bool,
    },
    CursorVisible(bool),
    WarpCursor(Point),
}

pub struct MockBackend {
    handle: u64,
    /// Client-area origin, tracked so coordinate transforms invert exactly.
    origin: Point,
    initial_state: WindowState,
    script: VecDeque<MockMessage>,
    requests: Vec<MockRequest>,
    hold_flush: bool,
}

impl MockBackend {
    /// Appends a message to the script; the next pump pass translates it.
    pub fn push_message(&mut self, message: MockMessage) {
        self.script.push_back(message);
    }

    /// Takes and clears the recorded outbound requests.
    pub fn take_requests(&mut self) -> Vec<MockRequest> {
        std::mem::take(&mut self.requests)
    }

    /// While held, a drained script does not count as the platform queue
    /// being confirmed empty, so buffered key releases stay buffered.
    pub fn set_hold_flush(&mut self, hold: bool) {
        self.hold_flush = hold;
    }

    /// The record as it looked when the window opened.
    pub fn initial_state(&self) -> &WindowState {
        &self.initial_state
    }

    pub fn opened_with_fullscreen(&self) -> bool {
        self.initial_state.fullscreen
    }

    fn next_message(&mut self) -> Option<MockMessage> {
        self.script.pop_front()
    }
}

impl PlatformBackend for MockBackend {
    fn open(state: &WindowState, _class_name: &str) -> Result<Self> {
        Ok(MockBackend {
            handle: NEXT_HANDLE.fetch_add(1, Ordering::Relaxed),
            origin: state.bounds.origin,
            initial_state: state.clone(),
            script: VecDeque::new(),
            requests: Vec::new(),
            hold_flush: false,
        })
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn handle(&self) -> u64 {
        self.handle
    }

    fn display_ptr(&self) -> *mut c_void {
        std::ptr::null_mut()
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        self.requests.push(MockRequest::SetTitle(title.to_string()));
        Ok(())
    }

    fn set_bounds(&mut self, bounds: Rect, extents: &FrameExtents) -> Result<()> {
        self.origin = bounds.origin;
        self.requests.push(MockRequest::SetBounds {
            bounds,
            compensated: Point::new(
                bounds.origin.x - extents.left as i32,
                bounds.origin.y - extents.top as i32,
            ),
        });
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> Result<()> {
        self.requests.push(MockRequest::SetVisible(visible));
        Ok(())
    }

    fn set_borderless(&mut self, borderless: bool) -> Result<()> {
        self.requests.push(MockRequest::SetBorderless(borderless));
        Ok(())
    }

    fn set_resizable(&mut self, resizable: bool, size: Size) -> Result<()> {
        self.requests
            .push(MockRequest::SetResizable { resizable, size });
        Ok(())
    }

    fn request_state(&mut self, request: StateRequest) -> Result<()> {
        self.requests.push(MockRequest::State(request));
        Ok(())
    }

    fn focus(&mut self) -> Result<()> {
        self.requests.push(MockRequest::Focus);
        Ok(())
    }

    fn raise(&mut self) -> Result<()> {
        self.requests.push(MockRequest::Raise);
        Ok(())
    }

    fn lower(&mut self) -> Result<()> {
        self.requests.push(MockRequest::Lower);
        Ok(())
    }

    fn update_pointer_grab(&mut self, captured: bool, trapped: bool) -> Result<()> {
        self.requests
            .push(MockRequest::PointerGrab { captured, trapped });
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        self.requests.push(MockRequest::CursorVisible(visible));
        Ok(())
    }

    fn warp_cursor(&mut self, position: Point) -> Result<()> {
        self.requests.push(MockRequest::WarpCursor(position));
        Ok(())
    }

    fn window_to_screen(&self, position: Point) -> Result<Point> {
        Ok(Point::new(
            position.x + self.origin.x,
            position.y + self.origin.y,
        ))
    }

    fn screen_to_window(&self, position: Point) -> Result<Point> {
        Ok(Point::new(
            position.x - self.origin.x,
            position.y - self.origin.y,
        ))
    }
}

/// Plays the scripted messages for `shared` through the translator core.
#[cfg(any(test, not(target_os = "linux")))]
pub(crate) fn pump(shared: &Arc<WindowShared>, mode: PumpMode) -> Result<PumpOutcome> {
    let mut core = shared.lock();
    if core.backend.is_none() {
        return Ok(PumpOutcome::Shutdown);
    }

    loop {
        let message = core.backend.as_mut().and_then(|b| b.next_message());
        match message {
            Some(m) => translate(&mut core, m),
            None => break,
        }
    }

    let held = core
        .backend
        .as_ref()
        .map(|b| b.hold_flush)
        .unwrap_or(false);
    if !held {
        // Script drained: the platform queue is confirmed empty.
        core.flush_pending_release();
    }

    if !core.queue.is_empty() {
        return Ok(PumpOutcome::Ready);
    }
    Ok(match mode {
        PumpMode::NonBlocking => PumpOutcome::Idle,
        // Nothing scripted and nothing queued: a real platform would block
        // forever here, so the mock reports shutdown instead.
        PumpMode::Blocking => PumpOutcome::Shutdown,
    })
}

#[cfg(any(test, not(target_os = "linux")))]
fn translate(core: &mut crate::window::WindowCore, message: MockMessage) {
    match message {
        MockMessage::KeyPress {
            keycode,
            time,
            key,
            modifiers,
            text,
        } => {
            let text = match text {
                Some(ch) => KeyText::Chars(ch.to_string()),
                None => KeyText::None,
            };
            core.handle_key_press(keycode, time, key, modifiers, text);
        }
        MockMessage::KeyPressUtf16 {
            keycode,
            time,
            key,
            modifiers,
            units,
        } => {
            core.handle_key_press(keycode, time, key, modifiers, KeyText::Utf16(units));
        }
        MockMessage::KeyRelease {
            keycode,
            time,
            key,
            modifiers,
        } => core.handle_key_release(keycode, time, key, modifiers),
        MockMessage::Button {
            pressed,
            button,
            position,
            modifiers,
        } => core.handle_button(pressed, button, position, modifiers),
        MockMessage::Scroll {
            axis,
            amount,
            position,
            modifiers,
        } => core.handle_scroll(axis, amount, position, modifiers),
        MockMessage::Motion {
            position,
            modifiers,
        } => core.handle_motion(position, modifiers),
        MockMessage::Enter => core.handle_crossing(true),
        MockMessage::Leave => core.handle_crossing(false),
        MockMessage::FocusIn => core.handle_focus(true),
        MockMessage::FocusOut => core.handle_focus(false),
        MockMessage::Configure { bounds } => core.handle_configure(bounds),
        MockMessage::StateProperty(flags) => core.handle_state_property(flags),
        MockMessage::ExtentsProperty { items } => {
            let outcome = resolve_extents(|offset, len| match &items {
                None => PropertyRound::Absent,
                Some(values) => {
                    if offset >= values.len() {
                        return PropertyRound::Data {
                            items: Vec::new(),
                            bytes_after: 0,
                        };
                    }
                    let end = (offset + len).min(values.len());
                    PropertyRound::Data {
                        items: values[offset..end].to_vec(),
                        bytes_after: (values.len() - end) * 4,
                    }
                }
            });
            core.handle_extents_outcome(outcome);
        }
        MockMessage::CloseRequested => core.handle_close_request(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WindowConfig;
    use crate::event::WindowEvent;
    use crate::window::Window;
    use test_log::test; // For logging within tests

    #[test]
    fn it_should_assign_unique_handles() {
        let state = WindowState::default();
        let a = MockBackend::open(&state, "test").unwrap();
        let b = MockBackend::open(&state, "test").unwrap();
        assert_ne!(a.handle(), b.handle());
        assert_ne!(a.handle(), 0);
    }

    #[test]
    fn it_should_assemble_a_surrogate_pair_across_two_presses() {
        let mut window = Window::new(&WindowConfig::default());
        window.open().unwrap();
        window.with_backend(|b| {
            b.push_message(MockMessage::KeyPressUtf16 {
                keycode: 100,
                time: 1,
                key: Key::Invalid,
                modifiers: Modifiers::empty(),
                units: vec![0xD83D],
            });
            b.push_message(MockMessage::KeyPressUtf16 {
                keycode: 101,
                time: 2,
                key: Key::Invalid,
                modifiers: Modifiers::empty(),
                units: vec![0xDE00],
            });
        });

        let mut texts = Vec::new();
        while let Some(e) = window.peek_event() {
            if let WindowEvent::Text { ch, .. } = e {
                texts.push(ch);
            }
        }
        assert_eq!(texts, vec!['\u{1F600}']);
    }

    #[test]
    fn it_should_drop_a_lone_low_surrogate_without_an_event() {
        let mut window = Window::new(&WindowConfig::default());
        window.open().unwrap();
        window.with_backend(|b| {
            b.push_message(MockMessage::KeyPressUtf16 {
                keycode: 100,
                time: 1,
                key: Key::Invalid,
                modifiers: Modifiers::empty(),
                units: vec![0xDC00],
            });
        });
        let mut texts = Vec::new();
        while let Some(e) = window.peek_event() {
            if let WindowEvent::Text { ch, .. } = e {
                texts.push(ch);
            }
        }
        assert!(texts.is_empty());
    }

    #[test]
    fn it_should_emit_scroll_events_with_clamped_positions() {
        let mut window = Window::new(&WindowConfig::default());
        window.open().unwrap();
        window.with_backend(|b| {
            b.push_message(MockMessage::Scroll {
                axis: ScrollAxis::Vertical,
                amount: 1,
                position: Point::new(-10, 5000),
                modifiers: Modifiers::CONTROL,
            });
        });
        assert_eq!(
            window.peek_event(),
            Some(WindowEvent::MouseScroll {
                axis: ScrollAxis::Vertical,
                amount: 1,
                position: Point::new(0, 599),
                modifiers: Modifiers::CONTROL,
            })
        );
    }

    #[test]
    fn it_should_emit_enter_and_leave_events() {
        let mut window = Window::new(&WindowConfig::default());
        window.open().unwrap();
        window.with_backend(|b| {
            b.push_message(MockMessage::Enter);
            b.push_message(MockMessage::Leave);
        });
        assert_eq!(window.peek_event(), Some(WindowEvent::MouseEnter));
        assert_eq!(window.peek_event(), Some(WindowEvent::MouseLeave));
    }

    #[test]
    fn it_should_not_duplicate_focus_events() {
        let mut window = Window::new(&WindowConfig::default());
        window.open().unwrap();
        window.with_backend(|b| {
            b.push_message(MockMessage::FocusIn);
            b.push_message(MockMessage::FocusIn);
            b.push_message(MockMessage::FocusOut);
        });
        assert_eq!(window.peek_event(), Some(WindowEvent::Focus));
        assert_eq!(window.peek_event(), Some(WindowEvent::Blur));
        assert_eq!(window.peek_event(), None);
        assert!(!window.has_focus());
    }
}

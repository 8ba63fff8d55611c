// src/event.rs

//! The canonical event model.
//!
//! Every platform message that matters to a consumer is translated into
//! exactly one of these variants before it reaches the queue. Each variant
//! carries everything needed to act on it without consulting the window it
//! came from, so recorded streams can be replayed.

use crate::geometry::{Point, Size};
use crate::keys::{Key, Modifiers, MouseButton, ScrollAxis};
use std::collections::VecDeque;

/// A platform-independent window event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEvent {
    /// A mouse button was pressed. `position` is client-relative, clamped to
    /// the client area.
    MouseDown {
        button: MouseButton,
        position: Point,
        modifiers: Modifiers,
    },
    /// A mouse button was released.
    MouseUp {
        button: MouseButton,
        position: Point,
        modifiers: Modifiers,
    },
    /// The pointer moved inside the client area.
    MouseMove {
        position: Point,
        modifiers: Modifiers,
    },
    /// The pointer entered the client area.
    MouseEnter,
    /// The pointer left the client area.
    MouseLeave,
    /// A scroll wheel detent. `amount` is positive toward the top/right.
    MouseScroll {
        axis: ScrollAxis,
        amount: i32,
        position: Point,
        modifiers: Modifiers,
    },
    /// A key went down, or auto-repeated while held (`is_repeat`).
    KeyDown {
        key: Key,
        modifiers: Modifiers,
        is_repeat: bool,
    },
    /// A key was genuinely released. Auto-repeat releases never surface.
    KeyUp { key: Key, modifiers: Modifiers },
    /// A complete Unicode scalar produced by a key press. Its UTF-8 form is
    /// at most four bytes by construction of `char`.
    Text { ch: char, is_repeat: bool },
    /// The window gained keyboard focus.
    Focus,
    /// The window lost keyboard focus.
    Blur,
    /// The client area moved. `position` is the screen-relative origin.
    Move { position: Point },
    /// The client area was resized.
    Resize { size: Size },
    /// Platform confirmed the window is maximized.
    Maximize,
    /// Platform confirmed the window left the maximized state.
    Unmaximize,
    /// Platform confirmed the window is minimized.
    Minimize,
    /// Platform confirmed the window left the minimized state.
    Unminimize,
    /// Platform confirmed the window is shaded (rolled up to its title bar).
    Shade,
    /// Platform confirmed the window left the shaded state.
    Unshade,
    /// Platform confirmed fullscreen.
    EnterFullscreen,
    /// Platform confirmed fullscreen exit.
    ExitFullscreen,
    /// The window returned to the restored state (none of maximized,
    /// minimized, shaded, fullscreen). Emitted once per transition, after
    /// the individual exit events.
    Restore,
    /// The user asked to close the window. The window stays open until the
    /// consumer calls `close()`.
    Close,
}

/// Ordered FIFO of canonical events for one window.
///
/// Pushed only by the translator, drained only by the owning window's
/// `peek_event`/`get_event`. Unbounded: the consumer controls draining and a
/// window that stops pumping gets its backlog in order.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<WindowEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    pub fn push(&mut self, event: WindowEvent) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<WindowEvent> {
        self.events.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn test_queue_is_fifo() {
        let mut q = EventQueue::new();
        q.push(WindowEvent::Focus);
        q.push(WindowEvent::Move {
            position: Point::new(1, 2),
        });
        q.push(WindowEvent::Blur);

        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(), Some(WindowEvent::Focus));
        assert_eq!(
            q.pop(),
            Some(WindowEvent::Move {
                position: Point::new(1, 2)
            })
        );
        assert_eq!(q.pop(), Some(WindowEvent::Blur));
        assert_eq!(q.pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn test_events_replay_without_window_context() {
        // Spot check: payload-carrying variants compare by value alone.
        let a = WindowEvent::KeyDown {
            key: Key::Char('a'),
            modifiers: Modifiers::SHIFT,
            is_repeat: true,
        };
        let b = WindowEvent::KeyDown {
            key: Key::Char('a'),
            modifiers: Modifiers::SHIFT,
            is_repeat: true,
        };
        assert_eq!(a, b);

        let r = Rect::new(0, 0, 100, 100);
        let resize = WindowEvent::Resize { size: r.size };
        assert_eq!(resize, WindowEvent::Resize { size: Size::new(100, 100) });
    }
}

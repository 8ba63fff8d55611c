// src/backend/x11/events.rs

//! The X event pump: drain, route by handle, translate into canonical
//! events on the owning window's queue.

use super::display::SharedDisplay;
use super::keymap::{self, ButtonClass};
use crate::backend::extents::{resolve_extents, ExtentsOutcome, PropertyRound};
use crate::backend::{PumpMode, PumpOutcome};
use crate::geometry::{Point, Rect, Size};
use crate::state::StateFlags;
use crate::window::{lookup, KeyText, WindowCore, WindowShared};
use anyhow::Result;
use libc::{c_char, c_int, c_long, c_ulong};
use log::trace;
use std::mem;
use std::ptr;
use std::sync::Arc;
use x11::xlib;

/// Large enough for any composed sequence a single press produces.
const KEY_TEXT_BUFFER_SIZE: usize = 32;

/// Drains the shared connection, routing each message to whichever window
/// it belongs to, until this window's queue has something (`Ready`), the
/// platform runs dry (`Idle`, non-blocking only), or this window is no
/// longer open (`Shutdown`). Blocking mode waits on the connection with no
/// lock held.
pub(crate) fn pump(shared: &Arc<WindowShared>, mode: PumpMode) -> Result<PumpOutcome> {
    let display = {
        let core = shared.lock();
        match core.backend.as_ref() {
            Some(b) => b.shared_display(),
            None => return Ok(PumpOutcome::Shutdown),
        }
    };

    loop {
        drain_pending(&display);

        {
            let mut core = shared.lock();
            if core.backend.is_none() {
                return Ok(PumpOutcome::Shutdown);
            }
            // The platform queue is confirmed empty, so a buffered key
            // release can no longer pair with a repeat press.
            core.flush_pending_release();
            if !core.queue.is_empty() {
                return Ok(PumpOutcome::Ready);
            }
        }

        match mode {
            PumpMode::NonBlocking => return Ok(PumpOutcome::Idle),
            PumpMode::Blocking => unsafe {
                let mut event: xlib::XEvent = mem::zeroed();
                xlib::XNextEvent(display.display(), &mut event);
                route(&display, &mut event);
            },
        }
    }
}

fn drain_pending(display: &Arc<SharedDisplay>) {
    unsafe {
        while xlib::XPending(display.display()) > 0 {
            let mut event: xlib::XEvent = mem::zeroed();
            xlib::XNextEvent(display.display(), &mut event);
            route(display, &mut event);
        }
    }
}

fn route(display: &Arc<SharedDisplay>, event: &mut xlib::XEvent) {
    let event_type = event.get_type();

    if event_type == xlib::MappingNotify {
        // Keyboard layout change; display-wide, not tied to a window.
        unsafe { xlib::XRefreshKeyboardMapping(&mut event.mapping) };
        return;
    }

    // The input method gets first refusal. A filtered message is part of
    // a compose sequence and must not reach the application.
    unsafe {
        if xlib::XFilterEvent(event, 0) != 0 {
            return;
        }
    }

    let window = unsafe { event.any.window };
    let Some(shared) = lookup(window as u64) else {
        trace!(
            "dropping X event type {} for unknown window {:#x}",
            event_type,
            window
        );
        return;
    };
    let mut core = shared.lock();

    match event_type {
        xlib::KeyPress => translate_key_press(&mut core, unsafe { &mut event.key }),
        xlib::KeyRelease => translate_key_release(&mut core, unsafe { &mut event.key }),
        xlib::ButtonPress | xlib::ButtonRelease => {
            let button = unsafe { &event.button };
            let pressed = event_type == xlib::ButtonPress;
            let position = Point::new(button.x, button.y);
            let modifiers = keymap::modifiers_from_state(button.state);
            match keymap::classify_button(button.button) {
                ButtonClass::Scroll(axis, amount) => {
                    // Wheel detents arrive as press/release pairs; the
                    // release half carries nothing new.
                    if pressed {
                        core.handle_scroll(axis, amount, position, modifiers);
                    }
                }
                ButtonClass::Button(b) => core.handle_button(pressed, b, position, modifiers),
            }
        }
        xlib::MotionNotify => {
            let motion = unsafe { &event.motion };
            core.handle_motion(
                Point::new(motion.x, motion.y),
                keymap::modifiers_from_state(motion.state),
            );
        }
        xlib::EnterNotify | xlib::LeaveNotify => {
            let crossing = unsafe { &event.crossing };
            // Grab-induced crossings are side effects of pointer grabs,
            // not real pointer travel.
            if crossing.mode == xlib::NotifyNormal {
                core.handle_crossing(event_type == xlib::EnterNotify);
            }
        }
        xlib::FocusIn | xlib::FocusOut => {
            let focused = event_type == xlib::FocusIn;
            if let Some(b) = core.backend.as_ref() {
                let xic = b.xic();
                if !xic.is_null() {
                    unsafe {
                        if focused {
                            xlib::XSetICFocus(xic);
                        } else {
                            xlib::XUnsetICFocus(xic);
                        }
                    }
                }
            }
            core.handle_focus(focused);
        }
        xlib::ConfigureNotify => {
            let configure = unsafe { &event.configure };
            let size = Size::new(configure.width.max(1) as u32, configure.height.max(1) as u32);
            let origin = if configure.send_event != 0 {
                // Synthetic notifications carry root coordinates already.
                Point::new(configure.x, configure.y)
            } else {
                client_origin_on_root(display, window)
            };
            core.handle_configure(Rect { origin, size });
        }
        xlib::MapNotify => {
            // First chance to learn the frame decorations. Window managers
            // that never publish extents resolve to Absent here instead of
            // leaving deferred bounds parked forever.
            let outcome = read_frame_extents(display, window);
            core.handle_extents_outcome(outcome);
        }
        xlib::PropertyNotify => {
            let property = unsafe { &event.property };
            if property.atom == display.atoms.net_wm_state {
                let flags = read_state_flags(display, window);
                core.handle_state_property(flags);
            } else if property.atom == display.atoms.net_frame_extents {
                let outcome = read_frame_extents(display, window);
                core.handle_extents_outcome(outcome);
            }
        }
        xlib::ClientMessage => {
            let message = unsafe { &event.client_message };
            if message.message_type == display.atoms.wm_protocols
                && message.format == 32
                && message.data.get_long(0) as xlib::Atom == display.atoms.wm_delete_window
            {
                core.handle_close_request();
            }
        }
        other => trace!("unhandled X event type {}", other),
    }
}

fn translate_key_press(core: &mut WindowCore, key_event: &mut xlib::XKeyEvent) {
    let mut buffer = [0u8; KEY_TEXT_BUFFER_SIZE];
    let mut keysym: xlib::KeySym = 0;
    let xic = core.backend.as_ref().map_or(ptr::null_mut(), |b| b.xic());
    let count = unsafe {
        if xic.is_null() {
            // No input method this session; Latin-1 lookup still covers
            // the common case.
            xlib::XLookupString(
                key_event,
                buffer.as_mut_ptr() as *mut c_char,
                buffer.len() as c_int,
                &mut keysym,
                ptr::null_mut(),
            )
        } else {
            let mut status: c_int = 0;
            let count = xlib::Xutf8LookupString(
                xic,
                key_event,
                buffer.as_mut_ptr() as *mut c_char,
                buffer.len() as c_int,
                &mut keysym,
                &mut status,
            );
            if status == xlib::XBufferOverflow {
                0
            } else {
                count
            }
        }
    };
    let text = if count > 0 {
        KeyText::Chars(String::from_utf8_lossy(&buffer[..count as usize]).into_owned())
    } else {
        KeyText::None
    };
    core.handle_key_press(
        key_event.keycode,
        key_event.time as u64,
        keymap::key_from_keysym(keysym),
        keymap::modifiers_from_state(key_event.state),
        text,
    );
}

fn translate_key_release(core: &mut WindowCore, key_event: &mut xlib::XKeyEvent) {
    let mut buffer = [0u8; KEY_TEXT_BUFFER_SIZE];
    let mut keysym: xlib::KeySym = 0;
    unsafe {
        xlib::XLookupString(
            key_event,
            buffer.as_mut_ptr() as *mut c_char,
            buffer.len() as c_int,
            &mut keysym,
            ptr::null_mut(),
        );
    }
    core.handle_key_release(
        key_event.keycode,
        key_event.time as u64,
        keymap::key_from_keysym(keysym),
        keymap::modifiers_from_state(key_event.state),
    );
}

/// Where the client area's top-left sits on the root window. Real
/// ConfigureNotify coordinates are parent-relative under a reparenting
/// window manager, so they have to be translated.
fn client_origin_on_root(display: &SharedDisplay, window: xlib::Window) -> Point {
    unsafe {
        let mut x: c_int = 0;
        let mut y: c_int = 0;
        let mut child: xlib::Window = 0;
        xlib::XTranslateCoordinates(
            display.display(),
            window,
            display.root(),
            0,
            0,
            &mut x,
            &mut y,
            &mut child,
        );
        Point::new(x, y)
    }
}

/// One-shot read of the full `_NET_WM_STATE` atom list. A missing or
/// mistyped property reads as the empty flag set.
fn read_state_flags(display: &SharedDisplay, window: xlib::Window) -> StateFlags {
    let mut flags = StateFlags::empty();
    unsafe {
        let mut actual_type: xlib::Atom = 0;
        let mut actual_format: c_int = 0;
        let mut nitems: c_ulong = 0;
        let mut bytes_after: c_ulong = 0;
        let mut data: *mut u8 = ptr::null_mut();
        let status = xlib::XGetWindowProperty(
            display.display(),
            window,
            display.atoms.net_wm_state,
            0,
            64,
            xlib::False,
            xlib::XA_ATOM,
            &mut actual_type,
            &mut actual_format,
            &mut nitems,
            &mut bytes_after,
            &mut data,
        );
        if status == xlib::Success as c_int
            && actual_type == xlib::XA_ATOM
            && actual_format == 32
            && !data.is_null()
        {
            let atoms: Vec<u64> =
                std::slice::from_raw_parts(data as *const c_ulong, nitems as usize)
                    .iter()
                    .map(|&a| a as u64)
                    .collect();
            flags = display.atoms.fold_state(&atoms);
        }
        if !data.is_null() {
            xlib::XFree(data as *mut _);
        }
    }
    flags
}

/// Reads `_NET_FRAME_EXTENTS` through the chunked round protocol.
fn read_frame_extents(display: &SharedDisplay, window: xlib::Window) -> ExtentsOutcome {
    resolve_extents(|offset, length| unsafe {
        let mut actual_type: xlib::Atom = 0;
        let mut actual_format: c_int = 0;
        let mut nitems: c_ulong = 0;
        let mut bytes_after: c_ulong = 0;
        let mut data: *mut u8 = ptr::null_mut();
        let status = xlib::XGetWindowProperty(
            display.display(),
            window,
            display.atoms.net_frame_extents,
            offset as c_long,
            length as c_long,
            xlib::False,
            xlib::XA_CARDINAL,
            &mut actual_type,
            &mut actual_format,
            &mut nitems,
            &mut bytes_after,
            &mut data,
        );
        if status != xlib::Success as c_int {
            return PropertyRound::Malformed;
        }
        if actual_type == 0 {
            if !data.is_null() {
                xlib::XFree(data as *mut _);
            }
            return PropertyRound::Absent;
        }
        if actual_type != xlib::XA_CARDINAL || actual_format != 32 || data.is_null() {
            if !data.is_null() {
                xlib::XFree(data as *mut _);
            }
            return PropertyRound::Malformed;
        }
        let items = std::slice::from_raw_parts(data as *const c_ulong, nitems as usize)
            .iter()
            .map(|&v| v as u64)
            .collect();
        xlib::XFree(data as *mut _);
        PropertyRound::Data {
            items,
            bytes_after: bytes_after as usize,
        }
    })
}

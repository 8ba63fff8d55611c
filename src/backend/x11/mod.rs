// src/backend/x11/mod.rs

//! Native X11 backend.
//!
//! One `X11Backend` owns one native window on the process-wide shared
//! display. Requests here are issue-and-flush; everything asynchronous
//! (lifecycle confirmations, geometry, extents) comes back through the
//! pump in `events`.

mod atoms;
mod display;
#[cfg(not(test))]
mod events;
mod keymap;

use self::display::SharedDisplay;
use crate::backend::{PlatformBackend, StateRequest};
use crate::geometry::{Point, Rect, Size};
use crate::state::{FrameExtents, WindowState};
use anyhow::{anyhow, Context, Result};
use libc::{c_char, c_int, c_long, c_uint, c_ulong};
use log::{debug, warn};
use std::ffi::CString;
use std::mem;
use std::ptr;
use std::sync::Arc;
use x11::xlib;

#[cfg(not(test))]
pub(crate) use self::events::pump;

const NET_WM_STATE_REMOVE: c_long = 0;
const NET_WM_STATE_ADD: c_long = 1;

const MWM_HINTS_DECORATIONS: c_ulong = 1 << 1;

/// The `_MOTIF_WM_HINTS` payload: five fields, written as a format-32
/// property (Xlib takes format-32 data as longs).
#[repr(C)]
struct MotifWmHints {
    flags: c_ulong,
    functions: c_ulong,
    decorations: c_ulong,
    input_mode: c_long,
    status: c_ulong,
}

pub struct X11Backend {
    display: Arc<SharedDisplay>,
    window: xlib::Window,
    xic: xlib::XIC,
}

// SAFETY: Xlib calls are safe from any thread once XInitThreads() has run,
// which SharedDisplay::acquire guarantees before a backend can exist.
unsafe impl Send for X11Backend {}

impl X11Backend {
    pub(crate) fn shared_display(&self) -> Arc<SharedDisplay> {
        Arc::clone(&self.display)
    }

    pub(crate) fn xic(&self) -> xlib::XIC {
        self.xic
    }

    /// Creates and configures the native window from the record.
    ///
    /// # Safety
    /// `shared` must be the live process-wide display.
    unsafe fn create(
        shared: Arc<SharedDisplay>,
        state: &WindowState,
        class_name: &str,
    ) -> Result<Self> {
        let display = shared.display();
        let screen = shared.screen();

        let mut attributes: xlib::XSetWindowAttributes = mem::zeroed();
        attributes.colormap = shared.colormap();
        attributes.background_pixel = xlib::XBlackPixel(display, screen);
        attributes.border_pixel = xlib::XBlackPixel(display, screen);
        attributes.event_mask = xlib::KeyPressMask
            | xlib::KeyReleaseMask
            | xlib::ButtonPressMask
            | xlib::ButtonReleaseMask
            | xlib::PointerMotionMask
            | xlib::EnterWindowMask
            | xlib::LeaveWindowMask
            | xlib::FocusChangeMask
            | xlib::StructureNotifyMask
            | xlib::PropertyChangeMask
            | xlib::ExposureMask;

        let bounds = state.bounds;
        let window = xlib::XCreateWindow(
            display,
            shared.root(),
            bounds.x(),
            bounds.y(),
            bounds.width(),
            bounds.height(),
            0,
            xlib::XDefaultDepth(display, screen),
            xlib::InputOutput as c_uint,
            shared.visual(),
            xlib::CWColormap | xlib::CWBackPixel | xlib::CWBorderPixel | xlib::CWEventMask,
            &mut attributes,
        );
        if window == 0 {
            return Err(anyhow!("XCreateWindow failed"));
        }

        let mut backend = X11Backend {
            display: shared,
            window,
            xic: ptr::null_mut(),
        };

        let mut delete_atom = backend.display.atoms.wm_delete_window;
        xlib::XSetWMProtocols(display, window, &mut delete_atom, 1);

        if let Err(e) = backend.apply_title(&state.title) {
            // Tear the half-built window down rather than leak it.
            let _ = backend.close();
            return Err(e);
        }
        if let Err(e) = backend.apply_class_hint(class_name) {
            let _ = backend.close();
            return Err(e);
        }

        if !state.resizable {
            backend.apply_size_hints(false, bounds.size);
        }
        if state.borderless {
            backend.write_motif_hints(true);
        }

        // Lifecycle states requested before open are seeded on the state
        // property so the window manager applies them at map time.
        let initial = backend.display.atoms.initial_state_atoms(state);
        if !initial.is_empty() {
            xlib::XChangeProperty(
                display,
                window,
                backend.display.atoms.net_wm_state,
                xlib::XA_ATOM,
                32,
                xlib::PropModeReplace,
                initial.as_ptr() as *const u8,
                initial.len() as c_int,
            );
        }

        let xim = backend.display.xim();
        if !xim.is_null() {
            backend.xic = xlib::XCreateIC(
                xim,
                b"inputStyle\0".as_ptr() as *const c_char,
                (xlib::XIMPreeditNothing | xlib::XIMStatusNothing) as c_ulong,
                b"clientWindow\0".as_ptr() as *const c_char,
                window,
                ptr::null_mut::<c_char>(),
            );
            if backend.xic.is_null() {
                warn!("XCreateIC failed; composed text input disabled for this window");
            }
        }

        if !state.cursor_visible {
            xlib::XDefineCursor(display, window, backend.display.blank_cursor());
        }

        if state.visible {
            xlib::XMapWindow(display, window);
        }
        xlib::XFlush(display);

        if state.minimized && state.visible {
            xlib::XIconifyWindow(display, window, screen);
            xlib::XFlush(display);
        }

        if state.mouse_captured || state.cursor_trapped {
            // Best effort: the window may not be viewable until mapped.
            if let Err(e) =
                backend.update_pointer_grab(state.mouse_captured, state.cursor_trapped)
            {
                warn!("initial pointer grab not established: {:#}", e);
            }
        }

        debug!("created X window {:#x}", window);
        Ok(backend)
    }

    fn apply_title(&mut self, title: &str) -> Result<()> {
        let c_title = CString::new(title).context("window title contains a NUL byte")?;
        unsafe {
            xlib::XStoreName(self.display.display(), self.window, c_title.as_ptr());
            xlib::XChangeProperty(
                self.display.display(),
                self.window,
                self.display.atoms.net_wm_name,
                self.display.atoms.utf8_string,
                8,
                xlib::PropModeReplace,
                title.as_ptr(),
                title.len() as c_int,
            );
            xlib::XFlush(self.display.display());
        }
        Ok(())
    }

    fn apply_class_hint(&mut self, class_name: &str) -> Result<()> {
        let res_name = CString::new(class_name.to_lowercase())
            .context("window class contains a NUL byte")?;
        let res_class =
            CString::new(class_name).context("window class contains a NUL byte")?;
        unsafe {
            let mut hint: xlib::XClassHint = mem::zeroed();
            hint.res_name = res_name.as_ptr() as *mut c_char;
            hint.res_class = res_class.as_ptr() as *mut c_char;
            xlib::XSetClassHint(self.display.display(), self.window, &mut hint);
        }
        Ok(())
    }

    /// Pins min and max size to `size` when not resizable, or releases the
    /// pin down to 1x1.
    fn apply_size_hints(&mut self, resizable: bool, size: Size) {
        unsafe {
            let mut hints: xlib::XSizeHints = mem::zeroed();
            if resizable {
                hints.flags = xlib::PMinSize;
                hints.min_width = 1;
                hints.min_height = 1;
            } else {
                hints.flags = xlib::PMinSize | xlib::PMaxSize;
                hints.min_width = size.width as c_int;
                hints.min_height = size.height as c_int;
                hints.max_width = size.width as c_int;
                hints.max_height = size.height as c_int;
            }
            xlib::XSetWMNormalHints(self.display.display(), self.window, &mut hints);
        }
    }

    fn write_motif_hints(&mut self, borderless: bool) {
        let hints = MotifWmHints {
            flags: MWM_HINTS_DECORATIONS,
            functions: 0,
            decorations: if borderless { 0 } else { 1 },
            input_mode: 0,
            status: 0,
        };
        unsafe {
            xlib::XChangeProperty(
                self.display.display(),
                self.window,
                self.display.atoms.motif_wm_hints,
                self.display.atoms.motif_wm_hints,
                32,
                xlib::PropModeReplace,
                &hints as *const MotifWmHints as *const u8,
                5,
            );
            xlib::XFlush(self.display.display());
        }
    }

    /// Asks the window manager to add or remove up to two state atoms.
    fn send_state_message(&self, add: bool, first: xlib::Atom, second: xlib::Atom) -> Result<()> {
        unsafe {
            let mut event: xlib::XEvent = mem::zeroed();
            event.client_message.type_ = xlib::ClientMessage;
            event.client_message.window = self.window;
            event.client_message.message_type = self.display.atoms.net_wm_state;
            event.client_message.format = 32;
            event.client_message.data.set_long(
                0,
                if add { NET_WM_STATE_ADD } else { NET_WM_STATE_REMOVE },
            );
            event.client_message.data.set_long(1, first as c_long);
            event.client_message.data.set_long(2, second as c_long);
            // Source indication 1: a normal application.
            event.client_message.data.set_long(3, 1);
            let status = xlib::XSendEvent(
                self.display.display(),
                self.display.root(),
                xlib::False,
                xlib::SubstructureRedirectMask | xlib::SubstructureNotifyMask,
                &mut event,
            );
            if status == 0 {
                return Err(anyhow!("XSendEvent refused the state request"));
            }
            xlib::XFlush(self.display.display());
        }
        Ok(())
    }
}

impl PlatformBackend for X11Backend {
    fn open(state: &WindowState, class_name: &str) -> Result<Self> {
        let shared = SharedDisplay::acquire()?;
        unsafe { Self::create(shared, state, class_name) }
    }

    fn close(&mut self) -> Result<()> {
        unsafe {
            if !self.xic.is_null() {
                xlib::XDestroyIC(self.xic);
                self.xic = ptr::null_mut();
            }
            if self.window != 0 {
                xlib::XDestroyWindow(self.display.display(), self.window);
                xlib::XFlush(self.display.display());
                debug!("destroyed X window {:#x}", self.window);
                self.window = 0;
            }
        }
        Ok(())
    }

    fn handle(&self) -> u64 {
        self.window as u64
    }

    fn display_ptr(&self) -> *mut std::os::raw::c_void {
        self.display.display() as *mut std::os::raw::c_void
    }

    fn set_title(&mut self, title: &str) -> Result<()> {
        self.apply_title(title)
    }

    fn set_bounds(&mut self, bounds: Rect, extents: &FrameExtents) -> Result<()> {
        // The window manager places the decoration frame, not the client
        // area, at the requested origin.
        let x = bounds.x() - extents.left as c_int;
        let y = bounds.y() - extents.top as c_int;
        unsafe {
            xlib::XMoveResizeWindow(
                self.display.display(),
                self.window,
                x,
                y,
                bounds.width(),
                bounds.height(),
            );
            xlib::XFlush(self.display.display());
        }
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) -> Result<()> {
        unsafe {
            if visible {
                xlib::XMapWindow(self.display.display(), self.window);
            } else {
                xlib::XWithdrawWindow(
                    self.display.display(),
                    self.window,
                    self.display.screen(),
                );
            }
            xlib::XFlush(self.display.display());
        }
        Ok(())
    }

    fn set_borderless(&mut self, borderless: bool) -> Result<()> {
        self.write_motif_hints(borderless);
        Ok(())
    }

    fn set_resizable(&mut self, resizable: bool, size: Size) -> Result<()> {
        self.apply_size_hints(resizable, size);
        unsafe {
            xlib::XFlush(self.display.display());
        }
        Ok(())
    }

    fn request_state(&mut self, request: StateRequest) -> Result<()> {
        let atoms = self.display.atoms;
        match request {
            StateRequest::Fullscreen(on) => {
                self.send_state_message(on, atoms.net_wm_state_fullscreen, 0)
            }
            StateRequest::Maximized(on) => self.send_state_message(
                on,
                atoms.net_wm_state_maximized_vert,
                atoms.net_wm_state_maximized_horz,
            ),
            StateRequest::Shaded(on) => {
                self.send_state_message(on, atoms.net_wm_state_shaded, 0)
            }
            StateRequest::Minimized(true) => unsafe {
                if xlib::XIconifyWindow(
                    self.display.display(),
                    self.window,
                    self.display.screen(),
                ) == 0
                {
                    return Err(anyhow!("XIconifyWindow failed"));
                }
                xlib::XFlush(self.display.display());
                Ok(())
            },
            StateRequest::Minimized(false) => unsafe {
                // Remapping an iconified window asks for de-iconification.
                xlib::XMapWindow(self.display.display(), self.window);
                xlib::XFlush(self.display.display());
                Ok(())
            },
        }
    }

    fn focus(&mut self) -> Result<()> {
        unsafe {
            xlib::XRaiseWindow(self.display.display(), self.window);
            xlib::XSetInputFocus(
                self.display.display(),
                self.window,
                xlib::RevertToParent,
                xlib::CurrentTime,
            );
            xlib::XFlush(self.display.display());
        }
        Ok(())
    }

    fn raise(&mut self) -> Result<()> {
        unsafe {
            xlib::XRaiseWindow(self.display.display(), self.window);
            xlib::XFlush(self.display.display());
        }
        Ok(())
    }

    fn lower(&mut self) -> Result<()> {
        unsafe {
            xlib::XLowerWindow(self.display.display(), self.window);
            xlib::XFlush(self.display.display());
        }
        Ok(())
    }

    fn update_pointer_grab(&mut self, captured: bool, trapped: bool) -> Result<()> {
        unsafe {
            if captured || trapped {
                let confine_to = if trapped { self.window } else { 0 };
                let mask = (xlib::ButtonPressMask
                    | xlib::ButtonReleaseMask
                    | xlib::PointerMotionMask) as c_uint;
                let status = xlib::XGrabPointer(
                    self.display.display(),
                    self.window,
                    xlib::True,
                    mask,
                    xlib::GrabModeAsync,
                    xlib::GrabModeAsync,
                    confine_to,
                    0,
                    xlib::CurrentTime,
                );
                if status != xlib::GrabSuccess {
                    return Err(anyhow!("pointer grab failed with status {}", status));
                }
            } else {
                xlib::XUngrabPointer(self.display.display(), xlib::CurrentTime);
            }
            xlib::XFlush(self.display.display());
        }
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> Result<()> {
        unsafe {
            if visible {
                xlib::XUndefineCursor(self.display.display(), self.window);
            } else {
                xlib::XDefineCursor(
                    self.display.display(),
                    self.window,
                    self.display.blank_cursor(),
                );
            }
            xlib::XFlush(self.display.display());
        }
        Ok(())
    }

    fn warp_cursor(&mut self, position: Point) -> Result<()> {
        unsafe {
            xlib::XWarpPointer(
                self.display.display(),
                0,
                self.window,
                0,
                0,
                0,
                0,
                position.x,
                position.y,
            );
            xlib::XFlush(self.display.display());
        }
        Ok(())
    }

    fn window_to_screen(&self, position: Point) -> Result<Point> {
        unsafe {
            let mut x: c_int = 0;
            let mut y: c_int = 0;
            let mut child: xlib::Window = 0;
            let same_screen = xlib::XTranslateCoordinates(
                self.display.display(),
                self.window,
                self.display.root(),
                position.x,
                position.y,
                &mut x,
                &mut y,
                &mut child,
            );
            if same_screen == 0 {
                return Err(anyhow!("window and root are on different screens"));
            }
            Ok(Point::new(x, y))
        }
    }

    fn screen_to_window(&self, position: Point) -> Result<Point> {
        unsafe {
            let mut x: c_int = 0;
            let mut y: c_int = 0;
            let mut child: xlib::Window = 0;
            let same_screen = xlib::XTranslateCoordinates(
                self.display.display(),
                self.display.root(),
                self.window,
                position.x,
                position.y,
                &mut x,
                &mut y,
                &mut child,
            );
            if same_screen == 0 {
                return Err(anyhow!("window and root are on different screens"));
            }
            Ok(Point::new(x, y))
        }
    }
}

// src/backend/x11/display.rs

//! Process-wide X display connection, shared by every open window.
//!
//! The first `open()` establishes the connection and its dependent
//! resources; the last window to close drops the final `Arc` and tears
//! everything down in reverse creation order. A later `open()` connects
//! again from scratch.

use super::atoms::Atoms;
use anyhow::{anyhow, Result};
use libc::{c_char, c_int};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use std::ptr;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use x11::xlib;

/// The connection and every display-scoped resource hanging off it.
pub(crate) struct SharedDisplay {
    display: *mut xlib::Display,
    screen: c_int,
    root: xlib::Window,
    visual: *mut xlib::Visual,
    colormap: xlib::Colormap,
    pub(crate) atoms: Atoms,
    xim: xlib::XIM,
    blank_cursor: xlib::Cursor,
}

// SAFETY: Xlib serializes access internally once XInitThreads() has run,
// and `connect` calls it before any other Xlib entry point. Nothing here
// is mutated after construction.
unsafe impl Send for SharedDisplay {}
unsafe impl Sync for SharedDisplay {}

static DISPLAY_SLOT: Lazy<Mutex<Weak<SharedDisplay>>> =
    Lazy::new(|| Mutex::new(Weak::new()));

impl SharedDisplay {
    /// Returns the shared display, connecting if no window currently holds
    /// it. Callers keep the `Arc` alive for as long as they need the
    /// connection; the slot itself holds only a `Weak`.
    pub(crate) fn acquire() -> Result<Arc<SharedDisplay>> {
        let mut slot = DISPLAY_SLOT
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = slot.upgrade() {
            return Ok(existing);
        }
        let fresh = Arc::new(Self::connect()?);
        *slot = Arc::downgrade(&fresh);
        Ok(fresh)
    }

    fn connect() -> Result<Self> {
        info!("Connecting to X server");
        unsafe {
            if xlib::XInitThreads() == 0 {
                return Err(anyhow!("XInitThreads() failed"));
            }

            // The input method picks its style from the locale, which is
            // still "C" unless we adopt the environment's.
            libc::setlocale(libc::LC_CTYPE, b"\0".as_ptr() as *const c_char);
            xlib::XSetLocaleModifiers(b"\0".as_ptr() as *const c_char);

            let display = xlib::XOpenDisplay(ptr::null());
            if display.is_null() {
                return Err(anyhow!(
                    "XOpenDisplay failed; is the DISPLAY environment variable set?"
                ));
            }

            let screen = xlib::XDefaultScreen(display);
            let root = xlib::XRootWindow(display, screen);
            let visual = xlib::XDefaultVisual(display, screen);
            let colormap = xlib::XDefaultColormap(display, screen);
            let atoms = Atoms::intern(display);

            let xim = xlib::XOpenIM(
                display,
                ptr::null_mut(),
                ptr::null_mut(),
                ptr::null_mut(),
            );
            if xim.is_null() {
                // Not fatal: key lookup falls back to the Latin-1 path.
                warn!("XOpenIM failed; composed text input is unavailable");
            }

            // 1x1 all-zero pixmap doubles as shape and mask of the cursor
            // shown while the pointer is hidden.
            let pixmap = xlib::XCreatePixmap(display, root, 1, 1, 1);
            if pixmap == 0 {
                Self::abort_connect(display, xim);
                return Err(anyhow!("failed to create the blank cursor pixmap"));
            }
            let mut color: xlib::XColor = std::mem::zeroed();
            let blank_cursor = xlib::XCreatePixmapCursor(
                display, pixmap, pixmap, &mut color, &mut color, 0, 0,
            );
            xlib::XFreePixmap(display, pixmap);
            if blank_cursor == 0 {
                Self::abort_connect(display, xim);
                return Err(anyhow!("failed to create the blank cursor"));
            }

            debug!("X display connected, screen {}", screen);
            Ok(SharedDisplay {
                display,
                screen,
                root,
                visual,
                colormap,
                atoms,
                xim,
                blank_cursor,
            })
        }
    }

    /// Releases whatever `connect` had built before it failed, newest first.
    unsafe fn abort_connect(display: *mut xlib::Display, xim: xlib::XIM) {
        if !xim.is_null() {
            xlib::XCloseIM(xim);
        }
        xlib::XCloseDisplay(display);
    }

    pub(crate) fn display(&self) -> *mut xlib::Display {
        self.display
    }

    pub(crate) fn screen(&self) -> c_int {
        self.screen
    }

    pub(crate) fn root(&self) -> xlib::Window {
        self.root
    }

    pub(crate) fn visual(&self) -> *mut xlib::Visual {
        self.visual
    }

    pub(crate) fn colormap(&self) -> xlib::Colormap {
        self.colormap
    }

    pub(crate) fn xim(&self) -> xlib::XIM {
        self.xim
    }

    pub(crate) fn blank_cursor(&self) -> xlib::Cursor {
        self.blank_cursor
    }
}

impl Drop for SharedDisplay {
    fn drop(&mut self) {
        // Reverse of creation: cursor, input method, then the connection.
        unsafe {
            xlib::XFreeCursor(self.display, self.blank_cursor);
            if !self.xim.is_null() {
                xlib::XCloseIM(self.xim);
            }
            xlib::XCloseDisplay(self.display);
        }
        info!("X display connection closed");
    }
}

// src/backend/x11/atoms.rs

//! Interned atoms, fetched once per connection.

use crate::state::StateFlags;
use libc::c_char;
use x11::xlib;

/// Every atom the subsystem talks to the window manager with.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Atoms {
    pub wm_protocols: xlib::Atom,
    pub wm_delete_window: xlib::Atom,
    pub net_wm_name: xlib::Atom,
    pub utf8_string: xlib::Atom,
    pub motif_wm_hints: xlib::Atom,
    pub net_frame_extents: xlib::Atom,
    pub net_wm_state: xlib::Atom,
    pub net_wm_state_fullscreen: xlib::Atom,
    pub net_wm_state_maximized_vert: xlib::Atom,
    pub net_wm_state_maximized_horz: xlib::Atom,
    pub net_wm_state_hidden: xlib::Atom,
    pub net_wm_state_shaded: xlib::Atom,
}

impl Atoms {
    /// Interns the full set.
    ///
    /// # Safety
    /// `display` must be a valid, open Xlib display.
    pub(crate) unsafe fn intern(display: *mut xlib::Display) -> Self {
        let intern = |name: &[u8]| {
            xlib::XInternAtom(display, name.as_ptr() as *const c_char, xlib::False)
        };
        Atoms {
            wm_protocols: intern(b"WM_PROTOCOLS\0"),
            wm_delete_window: intern(b"WM_DELETE_WINDOW\0"),
            net_wm_name: intern(b"_NET_WM_NAME\0"),
            utf8_string: intern(b"UTF8_STRING\0"),
            motif_wm_hints: intern(b"_MOTIF_WM_HINTS\0"),
            net_frame_extents: intern(b"_NET_FRAME_EXTENTS\0"),
            net_wm_state: intern(b"_NET_WM_STATE\0"),
            net_wm_state_fullscreen: intern(b"_NET_WM_STATE_FULLSCREEN\0"),
            net_wm_state_maximized_vert: intern(b"_NET_WM_STATE_MAXIMIZED_VERT\0"),
            net_wm_state_maximized_horz: intern(b"_NET_WM_STATE_MAXIMIZED_HORZ\0"),
            net_wm_state_hidden: intern(b"_NET_WM_STATE_HIDDEN\0"),
            net_wm_state_shaded: intern(b"_NET_WM_STATE_SHADED\0"),
        }
    }

    /// Folds a `_NET_WM_STATE` atom list into the flag set the state record
    /// diffs against. Atoms the subsystem does not track are ignored.
    pub(crate) fn fold_state(&self, atoms: &[u64]) -> StateFlags {
        let mut flags = StateFlags::empty();
        for &atom in atoms {
            if atom == self.net_wm_state_fullscreen {
                flags |= StateFlags::FULLSCREEN;
            } else if atom == self.net_wm_state_maximized_vert {
                flags |= StateFlags::MAXIMIZED_VERT;
            } else if atom == self.net_wm_state_maximized_horz {
                flags |= StateFlags::MAXIMIZED_HORZ;
            } else if atom == self.net_wm_state_hidden {
                flags |= StateFlags::HIDDEN;
            } else if atom == self.net_wm_state_shaded {
                flags |= StateFlags::SHADED;
            }
        }
        flags
    }

    /// The atoms to seed `_NET_WM_STATE` with before the first map, from the
    /// pre-open lifecycle booleans.
    pub(crate) fn initial_state_atoms(&self, state: &crate::state::WindowState) -> Vec<xlib::Atom> {
        let mut atoms = Vec::new();
        if state.fullscreen {
            atoms.push(self.net_wm_state_fullscreen);
        }
        if state.maximized {
            atoms.push(self.net_wm_state_maximized_vert);
            atoms.push(self.net_wm_state_maximized_horz);
        }
        if state.shaded {
            atoms.push(self.net_wm_state_shaded);
        }
        atoms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_atoms() -> Atoms {
        Atoms {
            wm_protocols: 1,
            wm_delete_window: 2,
            net_wm_name: 3,
            utf8_string: 4,
            motif_wm_hints: 5,
            net_frame_extents: 6,
            net_wm_state: 7,
            net_wm_state_fullscreen: 10,
            net_wm_state_maximized_vert: 11,
            net_wm_state_maximized_horz: 12,
            net_wm_state_hidden: 13,
            net_wm_state_shaded: 14,
        }
    }

    #[test]
    fn test_fold_state_collects_tracked_atoms() {
        let atoms = fake_atoms();
        let flags = atoms.fold_state(&[10, 12, 13]);
        assert_eq!(
            flags,
            StateFlags::FULLSCREEN | StateFlags::MAXIMIZED_HORZ | StateFlags::HIDDEN
        );
    }

    #[test]
    fn test_fold_state_ignores_unknown_atoms() {
        let atoms = fake_atoms();
        // _NET_WM_STATE_ABOVE and friends are not tracked.
        assert_eq!(atoms.fold_state(&[99, 100, 101]), StateFlags::empty());
        assert_eq!(atoms.fold_state(&[]), StateFlags::empty());
    }

    #[test]
    fn test_initial_state_atoms_for_maximize_carry_both_directions() {
        let atoms = fake_atoms();
        let mut state = crate::state::WindowState::default();
        state.maximized = true;
        assert_eq!(atoms.initial_state_atoms(&state), vec![11, 12]);
    }
}

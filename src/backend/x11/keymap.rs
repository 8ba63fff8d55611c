// src/backend/x11/keymap.rs

//! Keysym, button, and modifier-mask decoding.

use crate::keys::{Key, Modifiers, MouseButton, ScrollAxis};
use libc::c_uint;
use log::trace;
use x11::keysym;
use x11::xlib;

/// X places Unicode codepoints at this offset in the keysym space.
const UNICODE_KEYSYM_BASE: u32 = 0x0100_0000;

/// Maps an X keysym to the canonical key identity. Unrecognized keysyms
/// come back as `Key::Invalid`.
pub(crate) fn key_from_keysym(keysym: xlib::KeySym) -> Key {
    let keysym = keysym as u32;
    match keysym {
        keysym::XK_BackSpace => Key::Backspace,
        keysym::XK_Tab => Key::Tab,
        keysym::XK_Return => Key::Enter,
        keysym::XK_Escape => Key::Escape,
        keysym::XK_space => Key::Space,
        keysym::XK_Delete => Key::Delete,
        keysym::XK_Home => Key::Home,
        keysym::XK_End => Key::End,
        keysym::XK_Page_Up => Key::PageUp,
        keysym::XK_Page_Down => Key::PageDown,
        keysym::XK_Left => Key::Left,
        keysym::XK_Up => Key::Up,
        keysym::XK_Right => Key::Right,
        keysym::XK_Down => Key::Down,
        keysym::XK_Insert => Key::Insert,
        keysym::XK_Menu => Key::Menu,
        keysym::XK_Print => Key::PrintScreen,
        keysym::XK_Scroll_Lock => Key::ScrollLock,
        keysym::XK_Pause => Key::Pause,
        keysym::XK_Shift_L | keysym::XK_Shift_R => Key::Shift,
        keysym::XK_Control_L | keysym::XK_Control_R => Key::Control,
        keysym::XK_Alt_L | keysym::XK_Alt_R => Key::Alt,
        keysym::XK_Super_L | keysym::XK_Super_R => Key::Super,
        keysym::XK_Caps_Lock => Key::CapsLock,
        keysym::XK_Num_Lock => Key::NumLock,
        keysym::XK_F1 => Key::F1,
        keysym::XK_F2 => Key::F2,
        keysym::XK_F3 => Key::F3,
        keysym::XK_F4 => Key::F4,
        keysym::XK_F5 => Key::F5,
        keysym::XK_F6 => Key::F6,
        keysym::XK_F7 => Key::F7,
        keysym::XK_F8 => Key::F8,
        keysym::XK_F9 => Key::F9,
        keysym::XK_F10 => Key::F10,
        keysym::XK_F11 => Key::F11,
        keysym::XK_F12 => Key::F12,
        keysym::XK_F13 => Key::F13,
        keysym::XK_F14 => Key::F14,
        keysym::XK_F15 => Key::F15,
        keysym::XK_F16 => Key::F16,
        keysym::XK_F17 => Key::F17,
        keysym::XK_F18 => Key::F18,
        keysym::XK_F19 => Key::F19,
        keysym::XK_F20 => Key::F20,
        keysym::XK_F21 => Key::F21,
        keysym::XK_F22 => Key::F22,
        keysym::XK_F23 => Key::F23,
        keysym::XK_F24 => Key::F24,
        keysym::XK_KP_0 | keysym::XK_KP_Insert => Key::Keypad0,
        keysym::XK_KP_1 | keysym::XK_KP_End => Key::Keypad1,
        keysym::XK_KP_2 | keysym::XK_KP_Down => Key::Keypad2,
        keysym::XK_KP_3 | keysym::XK_KP_Page_Down => Key::Keypad3,
        keysym::XK_KP_4 | keysym::XK_KP_Left => Key::Keypad4,
        keysym::XK_KP_5 | keysym::XK_KP_Begin => Key::Keypad5,
        keysym::XK_KP_6 | keysym::XK_KP_Right => Key::Keypad6,
        keysym::XK_KP_7 | keysym::XK_KP_Home => Key::Keypad7,
        keysym::XK_KP_8 | keysym::XK_KP_Up => Key::Keypad8,
        keysym::XK_KP_9 | keysym::XK_KP_Page_Up => Key::Keypad9,
        keysym::XK_KP_Add => Key::KeypadPlus,
        keysym::XK_KP_Subtract => Key::KeypadMinus,
        keysym::XK_KP_Multiply => Key::KeypadMultiply,
        keysym::XK_KP_Divide => Key::KeypadDivide,
        keysym::XK_KP_Decimal | keysym::XK_KP_Delete => Key::KeypadDecimal,
        keysym::XK_KP_Enter => Key::KeypadEnter,
        keysym::XK_KP_Equal => Key::KeypadEquals,
        // Latin-1 printables map straight onto their character.
        0x20..=0x7e | 0xa0..=0xff => match char::from_u32(keysym) {
            Some(ch) => Key::Char(ch),
            None => Key::Invalid,
        },
        UNICODE_KEYSYM_BASE..=0x0110_ffff => {
            match char::from_u32(keysym - UNICODE_KEYSYM_BASE) {
                Some(ch) => Key::Char(ch),
                None => Key::Invalid,
            }
        }
        other => {
            trace!("unmapped keysym {:#x}", other);
            Key::Invalid
        }
    }
}

/// What a core-protocol button code means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ButtonClass {
    Button(MouseButton),
    Scroll(ScrollAxis, i32),
}

/// Core protocol encodes the wheel as buttons 4..7; 8 and 9 are the
/// side buttons. Anything past that is `MouseButton::Invalid`.
pub(crate) fn classify_button(code: c_uint) -> ButtonClass {
    match code {
        1 => ButtonClass::Button(MouseButton::Left),
        2 => ButtonClass::Button(MouseButton::Middle),
        3 => ButtonClass::Button(MouseButton::Right),
        4 => ButtonClass::Scroll(ScrollAxis::Vertical, 1),
        5 => ButtonClass::Scroll(ScrollAxis::Vertical, -1),
        6 => ButtonClass::Scroll(ScrollAxis::Horizontal, -1),
        7 => ButtonClass::Scroll(ScrollAxis::Horizontal, 1),
        8 => ButtonClass::Button(MouseButton::X1),
        9 => ButtonClass::Button(MouseButton::X2),
        other => {
            trace!("unmapped button code {}", other);
            ButtonClass::Button(MouseButton::Invalid)
        }
    }
}

/// Decodes the modifier bitmask carried on key, button, and motion
/// messages.
pub(crate) fn modifiers_from_state(state: c_uint) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    if state & xlib::ShiftMask != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if state & xlib::ControlMask != 0 {
        modifiers |= Modifiers::CONTROL;
    }
    if state & xlib::Mod1Mask != 0 {
        modifiers |= Modifiers::ALT;
    }
    if state & xlib::Mod4Mask != 0 {
        modifiers |= Modifiers::SUPER;
    }
    if state & xlib::LockMask != 0 {
        modifiers |= Modifiers::CAPS_LOCK;
    }
    if state & xlib::Mod2Mask != 0 {
        modifiers |= Modifiers::NUM_LOCK;
    }
    modifiers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keysyms() {
        assert_eq!(key_from_keysym(keysym::XK_Escape as xlib::KeySym), Key::Escape);
        assert_eq!(key_from_keysym(keysym::XK_KP_Enter as xlib::KeySym), Key::KeypadEnter);
        assert_eq!(key_from_keysym(keysym::XK_Shift_R as xlib::KeySym), Key::Shift);
        assert_eq!(key_from_keysym(keysym::XK_F24 as xlib::KeySym), Key::F24);
        // Space is a named key, not Char(' ').
        assert_eq!(key_from_keysym(keysym::XK_space as xlib::KeySym), Key::Space);
    }

    #[test]
    fn test_latin1_keysyms_become_chars() {
        assert_eq!(key_from_keysym(0x61), Key::Char('a'));
        assert_eq!(key_from_keysym(0x41), Key::Char('A'));
        assert_eq!(key_from_keysym(0xe9), Key::Char('é'));
    }

    #[test]
    fn test_unicode_keysyms_become_chars() {
        // U+0416 CYRILLIC CAPITAL LETTER ZHE at the Unicode offset.
        assert_eq!(key_from_keysym(0x0100_0416), Key::Char('Ж'));
    }

    #[test]
    fn test_unknown_keysym_is_invalid() {
        assert_eq!(key_from_keysym(0x0000_fedc), Key::Invalid);
        assert_eq!(key_from_keysym(0), Key::Invalid);
    }

    #[test]
    fn test_button_classification() {
        assert_eq!(classify_button(1), ButtonClass::Button(MouseButton::Left));
        assert_eq!(classify_button(3), ButtonClass::Button(MouseButton::Right));
        assert_eq!(classify_button(4), ButtonClass::Scroll(ScrollAxis::Vertical, 1));
        assert_eq!(classify_button(5), ButtonClass::Scroll(ScrollAxis::Vertical, -1));
        assert_eq!(classify_button(6), ButtonClass::Scroll(ScrollAxis::Horizontal, -1));
        assert_eq!(classify_button(9), ButtonClass::Button(MouseButton::X2));
        assert_eq!(classify_button(14), ButtonClass::Button(MouseButton::Invalid));
    }

    #[test]
    fn test_modifier_mask_decoding() {
        let state = xlib::ShiftMask | xlib::Mod1Mask | xlib::Mod2Mask;
        assert_eq!(
            modifiers_from_state(state),
            Modifiers::SHIFT | Modifiers::ALT | Modifiers::NUM_LOCK
        );
        assert_eq!(modifiers_from_state(0), Modifiers::empty());
    }
}

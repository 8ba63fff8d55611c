// src/input/repeat.rs

//! Auto-repeat detection.
//!
//! X delivers a held key as a stream of `KeyRelease`/`KeyPress` pairs that
//! share a keycode and timestamp. A release is therefore never emitted the
//! moment it arrives: it is buffered until the next message shows whether it
//! was the first half of a repeat pair or a genuine release. The buffer
//! survives across polling passes; the owner flushes it with
//! [`RepeatDetector::take_pending`] once the platform queue is confirmed
//! empty, at which point no pairing press can follow.

use crate::keys::{Key, Modifiers};

/// A key release held back while we wait to see what follows it.
///
/// Carries the translated key and modifiers so a flushed release can be
/// emitted as a `KeyUp` without consulting the platform again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleasedKey {
    pub keycode: u32,
    pub time: u64,
    pub key: Key,
    pub modifiers: Modifiers,
}

/// What a key press turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressClass {
    /// The press pairs with the buffered release: the platform is
    /// auto-repeating a held key. The release has been consumed.
    Repeat,
    /// A genuine first press. If a release was buffered it did not pair and
    /// must be emitted as a `KeyUp` before the press is processed.
    Initial(Option<ReleasedKey>),
}

/// One-message-lookahead pairing of release/press into repeats.
#[derive(Debug, Default)]
pub struct RepeatDetector {
    buffered: Option<ReleasedKey>,
}

impl RepeatDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers a release. Returns a previously buffered release that must be
    /// emitted first (two releases in a row cannot both be repeat halves).
    pub fn on_release(&mut self, release: ReleasedKey) -> Option<ReleasedKey> {
        self.buffered.replace(release)
    }

    /// Classifies a press against the buffered release. A pair means same
    /// keycode and same server timestamp.
    pub fn on_press(&mut self, keycode: u32, time: u64) -> PressClass {
        match self.buffered {
            Some(r) if r.keycode == keycode && r.time == time => {
                self.buffered = None;
                PressClass::Repeat
            }
            _ => PressClass::Initial(self.buffered.take()),
        }
    }

    /// Takes the buffered release, if any. Called before translating any
    /// non-key message, and when the platform queue is confirmed empty.
    pub fn take_pending(&mut self) -> Option<ReleasedKey> {
        self.buffered.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(keycode: u32, time: u64) -> ReleasedKey {
        ReleasedKey {
            keycode,
            time,
            key: Key::Char('a'),
            modifiers: Modifiers::empty(),
        }
    }

    #[test]
    fn test_matching_press_is_a_repeat() {
        let mut det = RepeatDetector::new();
        assert_eq!(det.on_release(release(38, 1000)), None);
        assert_eq!(det.on_press(38, 1000), PressClass::Repeat);
        // Buffer is consumed.
        assert_eq!(det.take_pending(), None);
    }

    #[test]
    fn test_different_keycode_flushes_the_release() {
        let mut det = RepeatDetector::new();
        det.on_release(release(38, 1000));
        match det.on_press(39, 1000) {
            PressClass::Initial(Some(r)) => assert_eq!(r.keycode, 38),
            other => panic!("expected flushed release, got {:?}", other),
        }
    }

    #[test]
    fn test_different_timestamp_flushes_the_release() {
        let mut det = RepeatDetector::new();
        det.on_release(release(38, 1000));
        match det.on_press(38, 1004) {
            PressClass::Initial(Some(r)) => assert_eq!(r.time, 1000),
            other => panic!("expected flushed release, got {:?}", other),
        }
    }

    #[test]
    fn test_press_with_empty_buffer_is_initial() {
        let mut det = RepeatDetector::new();
        assert_eq!(det.on_press(38, 1000), PressClass::Initial(None));
    }

    #[test]
    fn test_back_to_back_releases_flush_the_first() {
        let mut det = RepeatDetector::new();
        det.on_release(release(38, 1000));
        let flushed = det.on_release(release(39, 1002));
        assert_eq!(flushed, Some(release(38, 1000)));
        // The second release is now the buffered one.
        assert_eq!(det.take_pending(), Some(release(39, 1002)));
    }

    #[test]
    fn test_buffer_survives_until_explicitly_taken() {
        // A release whose pairing press arrives in a later polling pass must
        // still be recognized, so nothing implicit clears the buffer.
        let mut det = RepeatDetector::new();
        det.on_release(release(38, 1000));
        assert_eq!(det.on_press(38, 1000), PressClass::Repeat);

        det.on_release(release(38, 2000));
        assert_eq!(det.take_pending(), Some(release(38, 2000)));
        assert_eq!(det.take_pending(), None);
    }
}

// src/input/text.rs

//! Text assembly from key-press payloads.
//!
//! A key press may deliver its text as UTF-16 code units, and a character
//! outside the Basic Multilingual Plane arrives as two units in two separate
//! messages. The assembler holds a high surrogate until its low half arrives
//! and emits exactly one complete scalar for the pair. Malformed sequences
//! are dropped with a log; text input never fails translation.

use log::warn;

const HIGH_START: u16 = 0xD800;
const HIGH_END: u16 = 0xDBFF;
const LOW_START: u16 = 0xDC00;
const LOW_END: u16 = 0xDFFF;

/// Reassembles UTF-16 unit streams into Unicode scalars.
#[derive(Debug, Default)]
pub struct TextAssembler {
    pending_high: Option<u16>,
}

impl TextAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one UTF-16 code unit. Returns a completed scalar, or `None`
    /// while an assembly is in progress or the unit was dropped.
    pub fn push_utf16(&mut self, unit: u16) -> Option<char> {
        match unit {
            HIGH_START..=HIGH_END => {
                if let Some(prev) = self.pending_high.replace(unit) {
                    warn!(
                        "dropping unpaired high surrogate {:#06x} (followed by another high surrogate)",
                        prev
                    );
                }
                None
            }
            LOW_START..=LOW_END => match self.pending_high.take() {
                Some(high) => {
                    let scalar = 0x10000
                        + (((high - HIGH_START) as u32) << 10)
                        + (unit - LOW_START) as u32;
                    // Surrogate-pair arithmetic cannot leave the valid range.
                    char::from_u32(scalar)
                }
                None => {
                    warn!("dropping unpaired low surrogate {:#06x}", unit);
                    None
                }
            },
            _ => {
                if let Some(prev) = self.pending_high.take() {
                    warn!(
                        "dropping unpaired high surrogate {:#06x} (followed by a BMP unit)",
                        prev
                    );
                }
                // Every non-surrogate u16 is a valid scalar.
                char::from_u32(unit as u32)
            }
        }
    }

    /// Feeds an already-complete scalar, as produced by platform text lookup
    /// routines that decode internally. An unfinished surrogate assembly is
    /// abandoned first.
    pub fn push_char(&mut self, ch: char) -> Option<char> {
        if let Some(prev) = self.pending_high.take() {
            warn!(
                "dropping unpaired high surrogate {:#06x} (followed by complete text)",
                prev
            );
        }
        Some(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmp_units_pass_straight_through() {
        let mut asm = TextAssembler::new();
        assert_eq!(asm.push_utf16(0x0041), Some('A'));
        assert_eq!(asm.push_utf16(0x00E9), Some('é'));
        assert_eq!(asm.push_utf16(0x4E2D), Some('中'));
    }

    #[test]
    fn test_surrogate_pair_yields_one_scalar() {
        let mut asm = TextAssembler::new();
        // U+1F600 GRINNING FACE = D83D DE00.
        assert_eq!(asm.push_utf16(0xD83D), None);
        assert_eq!(asm.push_utf16(0xDE00), Some('\u{1F600}'));
    }

    #[test]
    fn test_pair_split_across_calls_is_held_not_emitted() {
        // The high half arriving alone produces nothing; only the low half
        // completes it. This is the "two units in two messages" case.
        let mut asm = TextAssembler::new();
        assert_eq!(asm.push_utf16(0xD800), None);
        assert_eq!(asm.push_utf16(0xDC00), Some('\u{10000}'));
    }

    #[test]
    fn test_lone_low_surrogate_is_dropped() {
        let mut asm = TextAssembler::new();
        assert_eq!(asm.push_utf16(0xDE00), None);
        // Stream recovers immediately.
        assert_eq!(asm.push_utf16(0x0042), Some('B'));
    }

    #[test]
    fn test_high_surrogate_followed_by_bmp_is_dropped() {
        let mut asm = TextAssembler::new();
        assert_eq!(asm.push_utf16(0xD83D), None);
        assert_eq!(asm.push_utf16(0x0043), Some('C'));
        // The abandoned high half does not poison the next pair.
        assert_eq!(asm.push_utf16(0xD83D), None);
        assert_eq!(asm.push_utf16(0xDE02), Some('\u{1F602}'));
    }

    #[test]
    fn test_two_high_surrogates_keep_the_latest() {
        let mut asm = TextAssembler::new();
        assert_eq!(asm.push_utf16(0xD800), None);
        assert_eq!(asm.push_utf16(0xD83D), None);
        assert_eq!(asm.push_utf16(0xDE00), Some('\u{1F600}'));
    }

    #[test]
    fn test_complete_char_abandons_pending_assembly() {
        let mut asm = TextAssembler::new();
        assert_eq!(asm.push_utf16(0xD83D), None);
        assert_eq!(asm.push_char('x'), Some('x'));
        assert_eq!(asm.push_utf16(0xDE00), None);
    }

    #[test]
    fn test_emitted_scalars_fit_in_four_utf8_bytes() {
        let mut asm = TextAssembler::new();
        let ch = asm.push_utf16(0xD83D).or(asm.push_utf16(0xDE00)).unwrap();
        assert!(ch.len_utf8() <= 4);
    }
}

// src/backend/extents.rs

//! Decoration-extents resolution.
//!
//! The frame extents live in a window property that can only be read in
//! bounded rounds: each read returns up to a requested number of items plus
//! a count of bytes still unread. The resolver drives that round protocol
//! through a caller-supplied source, so the X implementation hands it a real
//! property read and the tests hand it canned rounds.
//!
//! A well-formed result is exactly four 32-bit cardinals: left, right, top,
//! bottom. Anything else is malformed and discarded; the property being
//! absent altogether resolves to zero extents (undecorated window, or a
//! window manager that never publishes them).

use crate::state::FrameExtents;

/// Items requested per round. The property is four items when well formed,
/// so a single round usually suffices; over-long properties take extra
/// rounds and then fail the arity check.
const ITEMS_PER_ROUND: usize = 4;

/// Upper bound on total items before the read is abandoned as runaway.
const MAX_ITEMS: usize = 64;

/// One round served by a property source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyRound {
    /// Items read this round plus the bytes the server still holds.
    Data { items: Vec<u64>, bytes_after: usize },
    /// The property does not exist.
    Absent,
    /// The property exists but has the wrong type or format, or the read
    /// failed outright.
    Malformed,
}

/// Result of a full resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtentsOutcome {
    Resolved(FrameExtents),
    Absent,
    Malformed,
}

/// Runs the round protocol to completion against `source`, which is called
/// with an item offset and a maximum item count.
pub fn resolve_extents(
    mut source: impl FnMut(usize, usize) -> PropertyRound,
) -> ExtentsOutcome {
    let mut items: Vec<u64> = Vec::new();
    loop {
        match source(items.len(), ITEMS_PER_ROUND) {
            PropertyRound::Absent => return ExtentsOutcome::Absent,
            PropertyRound::Malformed => return ExtentsOutcome::Malformed,
            PropertyRound::Data {
                items: batch,
                bytes_after,
            } => {
                if batch.is_empty() {
                    if bytes_after > 0 {
                        // The server claims more data but served none; a
                        // further round cannot make progress.
                        return ExtentsOutcome::Malformed;
                    }
                    break;
                }
                items.extend(batch);
                if items.len() > MAX_ITEMS {
                    return ExtentsOutcome::Malformed;
                }
                if bytes_after == 0 {
                    break;
                }
            }
        }
    }

    if items.len() != 4 {
        return ExtentsOutcome::Malformed;
    }
    ExtentsOutcome::Resolved(FrameExtents::new(
        items[0] as u32,
        items[1] as u32,
        items[2] as u32,
        items[3] as u32,
    ))
}

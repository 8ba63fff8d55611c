// src/input/mod.rs

//! Pure input-stream helpers shared by every backend: auto-repeat pairing
//! and text assembly. Both are plain state machines with no platform types,
//! so the unit tests drive them directly.

pub mod repeat;
pub mod text;

pub use repeat::{PressClass, ReleasedKey, RepeatDetector};
pub use text::TextAssembler;

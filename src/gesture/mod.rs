//! Gesture classification: finger-state vectors to symbolic tokens.
//!
//! # Pipeline position
//!
//! ```text
//! HandTracker::detect() ──▶ FingerVector ──▶ GestureTable::classify() ──▶ Token
//!                                                                          │
//!                                                            StabilityFilter
//! ```
//!
//! The table is fixed and built once; several symbols share a finger pattern
//! (e.g. `U` and `V`, or the closed fist used by `E`, `S`, `0`, `BAD`, `NO`).
//! The first match in priority order wins; see [`GestureTable`].
//!
//! # Quick start
//!
//! ```
//! use fingerspell::gesture::{classify, Control, FingerVector, Token};
//!
//! let fingers = FingerVector::new([0, 1, 0, 0, 0]).unwrap();
//! assert_eq!(classify(fingers), Token::Letter('D'));
//!
//! let space = FingerVector::new([1, 1, 1, 1, 0]).unwrap();
//! assert_eq!(classify(space), Token::Control(Control::Space));
//! ```

pub mod classifier;
pub mod fingers;
pub mod token;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use classifier::{classify, recognize_sign, GestureTable};
pub use fingers::{FingerVector, FingerVectorError};
pub use token::{Control, Token};

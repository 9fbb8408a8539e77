//! AI Response Validation
//!
//! Turns free-form model text into structured values.
//!
//! ## Design Philosophy
//! - Trim to the JSON boundaries, never repair
//! - Fail loudly with the raw payload attached

mod extract;

pub use extract::{extract, extract_as};

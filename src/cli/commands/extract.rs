//! Extract Command
//!
//! Pull a JSON payload out of raw model output (file or stdin).
//!
//! Usage:
//!   reelsmith extract reply.txt
//!   pbpaste | reelsmith extract -f yaml

use std::path::Path;

use crate::ai::validation::extract;
use crate::cli::util::{OutputFormat, print_document, read_input};
use crate::types::Result;

pub fn run(input: Option<&Path>, format: OutputFormat) -> Result<()> {
    let raw = read_input(input)?;
    let value = extract(&raw)?;
    print_document(&value, format)
}

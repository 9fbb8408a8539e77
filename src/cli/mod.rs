pub mod commands;
pub mod ui;
mod util;

pub use util::{OutputFormat, load_config, load_studio, print_document, read_input, render};

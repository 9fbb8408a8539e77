pub mod analyze;
pub mod config;
pub mod extract;
pub mod image;
pub mod schema;
pub mod video;

//! API request handlers.

mod content;
mod log;
mod sandbox;

pub use content::*;
pub use log::*;
pub use sandbox::*;

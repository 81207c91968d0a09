//! Wovenmusic processing library
//!
//! Upload validation and cover thumbnail generation.

pub mod thumbnail;
pub mod validator;

pub use thumbnail::generate_thumbnail;
pub use validator::{extension_of, MediaValidator, ValidationError};

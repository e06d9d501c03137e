//! External service integrations.

pub mod directory;
pub mod face_match;

pub use directory::{load_directory, DirectoryLoadError};
pub use face_match::{FaceMatchError, HttpFaceMatcher};

pub mod artifact;
pub mod common;
pub mod upload;

pub mod archive;
pub mod error;
pub mod retry;
pub mod source;

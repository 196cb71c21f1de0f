//! Data models exchanged between the upload client and the coordinator

mod media;
mod upload;

pub use media::*;
pub use upload::*;

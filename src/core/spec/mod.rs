pub mod channel;
pub mod media;

pub use channel::Channel;
pub use media::{MediaType, SupportedFormats};

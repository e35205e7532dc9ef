pub mod ais;
pub mod checksum;
pub mod format;

mod encoder;
mod sentence;

pub use encoder::{SentenceEncoder, SentenceKind};
pub use sentence::SentenceBuilder;

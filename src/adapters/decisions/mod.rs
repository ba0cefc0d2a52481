//! Decision source adapters.

pub mod channel;
pub mod file;

pub use channel::ChannelDecisionSource;
pub use file::FileDecisionSource;

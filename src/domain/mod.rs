pub mod feed;
pub mod info;

pub use feed::{Episode, Feed, FeedConfig, Format, Quality, DEFAULT_PAGE_SIZE};
pub use info::{Info, LinkKind, Provider};

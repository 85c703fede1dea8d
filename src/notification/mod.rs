pub mod feed;

pub use feed::{FeedEntry, NotificationFeed};

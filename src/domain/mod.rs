pub mod image;

pub use image::{CachedFeed, FeedImage};

pub mod feed_loader;
pub mod image_loader;
pub mod policy;

pub use feed_loader::{LoadError, LocalFeedLoader, SaveError, ValidateError};
pub use image_loader::{DataLoadError, DataSaveError, LocalImageDataLoader};
pub use policy::FeedCachePolicy;

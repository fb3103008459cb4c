pub mod cache_decorator;
pub mod fallback;

pub use cache_decorator::CacheDecorator;
pub use fallback::Fallback;

//! # Freshet
//!
//! An offline-first resource loading core for a feed-browsing client.
//!
//! ## Architecture
//!
//! Reads flow top-down, writes flow bottom-up:
//!
//! ```text
//! Adapter → Fallback → { CacheDecorator → Remote loader, Local loader } → Store
//! ```
//!
//! - [`store`]: durable feed-snapshot and image-payload persistence behind a
//!   serialized worker
//! - [`cache`]: freshness policy plus the local feed and image loaders
//! - [`remote`]: loaders over the "fetch bytes from a URL" primitive
//! - [`composition`]: generic fallback and cache-write wrappers over any
//!   conforming loader
//! - [`presentation`]: single-flight start/cancel adapter and the
//!   designated-context scheduler
//!
//! ## Composition example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use freshet::cache::LocalFeedLoader;
//! use freshet::clock::SystemClock;
//! use freshet::composition::{CacheDecorator, Fallback};
//! use freshet::loader::FeedLoader;
//! use freshet::remote::{RemoteFeedLoader, ReqwestHttpClient};
//! use freshet::store::SqliteStore;
//!
//! # async fn compose() -> anyhow::Result<()> {
//! let store = Arc::new(SqliteStore::open("feed.db")?);
//! let client = Arc::new(ReqwestHttpClient::new());
//!
//! let local = Arc::new(LocalFeedLoader::new(Arc::clone(&store), SystemClock));
//! let remote = RemoteFeedLoader::new(client, "https://api.example.com/feed".parse()?);
//!
//! // Remote first, caching every success; fall back to the local cache
//! // when the network is down.
//! let loader = Fallback::new(
//!     CacheDecorator::new(remote, Arc::clone(&local)),
//!     Arc::clone(&local),
//! );
//! let feed = loader.load_feed().await?;
//! # Ok(())
//! # }
//! ```

/// Freshness policy and the local feed/image loaders over a store.
pub mod cache;

/// Injectable time source for freshness decisions.
pub mod clock;

/// Generic fallback and cache-write composition over the loader seams.
pub mod composition;

/// Core value types: [`FeedImage`](domain::FeedImage) and
/// [`CachedFeed`](domain::CachedFeed).
pub mod domain;

/// Capability traits the composites are generic over.
pub mod loader;

/// Single-flight presentation adapter and designated-context scheduler.
pub mod presentation;

/// Remote feed and image loaders over an HTTP "get bytes" primitive.
pub mod remote;

/// Snapshot and image-payload persistence: traits, SQLite worker, in-memory
/// variant.
pub mod store;

pub mod adapter;
pub mod scheduler;

pub use adapter::{LoadFuture, ResourceLoadAdapter, ResourceView};
pub use scheduler::{DesignatedThreadScheduler, InlineScheduler, Job, Scheduler};

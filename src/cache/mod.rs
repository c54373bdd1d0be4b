//! Build caches: folder layout, JSON documents, the block ownership index
//! and the staleness oracle that decides when any of them is reused.

mod block_index;
mod paths;
mod staleness;
mod store;

pub use block_index::{BlockIndex, BlockPageMap};
pub use paths::BuildPaths;
pub use staleness::Staleness;
pub use store::{BuildCacheStore, CacheKey};

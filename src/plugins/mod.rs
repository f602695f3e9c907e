//! Command surfaces built on the cache: sync, picker protocol, search,
//! completion.

pub mod azure;
pub mod completion;
pub mod picker;
pub mod provider;
pub mod search;
pub mod selector;
pub mod sync;

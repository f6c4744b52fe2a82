//! Cache Module
//!
//! Bounded read-through cache shared by every storage backend.

mod store;


// Re-export public types
pub use store::BoundedCache;

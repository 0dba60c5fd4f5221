// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod api;
pub mod article;
pub mod config;
pub mod error;
pub mod metrics;
pub mod perspectives;
pub mod providers;
pub mod refresh;
pub mod samples;
pub mod selector;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::Aggregator;
pub use crate::api::{router, AppState};
pub use crate::article::{Category, NormalizedArticle};
pub use crate::error::NewsError;
pub use crate::selector::{SelectionRequest, Selector};

//! FizzBuzz - an HTTP FizzBuzz service backed by a concurrent response cache
//!
//! Computed bodies are cached with request coalescing, negative caching of
//! empty and oversized results, and stale-while-revalidate refreshes.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fizzbuzz;
pub mod metrics;
pub mod models;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{compute_fn, CacheKey, ComputeFn, ResponseCache};
pub use config::{CacheConfig, Config};
pub use tasks::{spawn_cleanup_task, spawn_refresh_worker};

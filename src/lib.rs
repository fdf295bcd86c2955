//! # pasted - content-addressed pastes and short links
//!
//! Content is keyed by its SHA-1 digest: 40 hex characters for pastes, the
//! first 16 for short links. Identical submissions always map to the same key
//! and are stored once.
//!
//! ## Architecture Layers
//!
//! - **Domain**: key codec, content keys, rate buckets, count snapshots
//! - **Application**: content service, rate limiter, count cache, retry, ports
//! - **Infrastructure**: local filesystem store, Swift/Keystone and in-memory
//!   object stores, file-locked rate limit database
//! - **API**: axum handlers, rate limit middleware, OpenAPI document
//!
//! ## Example Usage
//!
//! ```no_run
//! use pasted::{application::builder::ApplicationBuilder, api::create_router, Config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = ApplicationBuilder::from_config(Config::default()).await?;
//! let app = create_router(state);
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use api::errors as api_errors;
pub use application::{dto, ports};
pub use config::Config;
pub use domain::errors as domain_errors;
pub use domain::{entities, value_objects, KeyCodec};

//! Wovenmusic storage gateway API
//!
//! HTTP surface of the gateway: cover resolution endpoints, range-aware
//! track streaming, and the upload/ingest pipeline.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod range;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

//! # frame-sieve
//!
//! Keeps the frames of a movie that a remote image classifier is confident
//! about, and stitches them (with their sound) back into a shorter movie.
//!
//! ## Architecture
//! - `core` - The scoring engine (frames, scorer, filter, pipeline, media)
//! - `events` - Event-driven progress and outcome reporting
//! - `error` - Error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{FrameSieveError, Result};

/// Initialize tracing for the library
///
/// `RUST_LOG` wins when set; otherwise `default_directive` (e.g. `"info"`)
/// is used. Call once from the application entry point.
pub fn init_tracing(default_directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}

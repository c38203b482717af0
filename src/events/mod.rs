//! # Events Module
//!
//! Event-driven progress and outcome reporting.
//!
//! ## Design
//! The scoring run emits events through channels so the CLI (or any
//! other listener) can show progress without the core knowing about it.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Score(ScoreEvent::Outcome(record)) = event {
//!             println!("{record}");
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&frames, &sender, &CancellationToken::new())?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;

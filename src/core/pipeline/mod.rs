//! # Pipeline Module
//!
//! Scores a snapshot of frames with bounded parallelism.
//!
//! ## Stages
//! 1. **Source** - one thread turns frame names into work items
//! 2. **Scorers** - N threads compete for items on one shared channel
//! 3. **Fan-in** - one relay per scorer stream, merged into a single stream
//! 4. **Filter** - the caller's thread applies the threshold to each result
//!
//! ## Cancellation
//! Every blocking send and receive races a shared [`CancellationToken`].
//! All threads are scoped to the run, so none outlive it.
//!
//! With a single worker the stages are skipped and frames are scored
//! sequentially on the calling thread.

mod aggregator;
mod cancel;
mod executor;
mod source;
mod stage;
mod worker;

pub use cancel::CancellationToken;
pub use executor::{Pipeline, PipelineBuilder, PipelineConfig, PipelineResult, RunMode};

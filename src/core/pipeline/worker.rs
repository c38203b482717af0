//! Scorer workers: the fan-out half of the pipeline.

use super::cancel::CancellationToken;
use super::stage::Stage;
use crate::core::frame::WorkItem;
use crate::core::scorer::{score_frame, FrameScorer, ScoreResult};
use crate::error::PipelineError;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::Scope;

/// Start `count` workers competing for items on the shared `items` stream.
///
/// Each worker gets a private output stream, returned in worker order. A
/// worker exits, closing its stream, once the input is drained or the token
/// is cancelled. Each stage yields how many frames it scored.
pub(crate) fn spawn_workers<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    count: usize,
    items: Receiver<WorkItem>,
    scorer: &'env dyn FrameScorer,
    token: &CancellationToken,
) -> Result<(Vec<Receiver<ScoreResult>>, Vec<Stage<'scope, usize>>), PipelineError> {
    let mut streams = Vec::with_capacity(count);
    let mut stages = Vec::with_capacity(count);

    for worker_id in 0..count {
        let (tx, rx) = bounded(1);
        let items = items.clone();
        let token = token.clone();

        let stage = Stage::spawn(scope, format!("scorer-{worker_id}"), move || {
            run_worker(worker_id, &items, &tx, scorer, &token)
        })?;

        streams.push(rx);
        stages.push(stage);
    }

    Ok((streams, stages))
}

fn run_worker(
    worker_id: usize,
    items: &Receiver<WorkItem>,
    output: &Sender<ScoreResult>,
    scorer: &dyn FrameScorer,
    token: &CancellationToken,
) -> usize {
    let mut scored = 0usize;

    while let Some(item) = token.recv_or_cancel(items) {
        let result = score_frame(&item, scorer);
        scored += 1;

        if !token.send_or_cancel(output, result) {
            break;
        }
    }

    tracing::debug!(worker_id, scored, cancelled = token.is_cancelled(), "scorer exiting");
    scored
}

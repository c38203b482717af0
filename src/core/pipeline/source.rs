//! Work source: turns the frame snapshot into a stream of work items.

use super::cancel::CancellationToken;
use super::stage::Stage;
use crate::core::frame::{FrameLayout, WorkItem};
use crate::error::PipelineError;
use crossbeam_channel::{bounded, Receiver};
use std::thread::Scope;

/// Start producing one [`WorkItem`] per identifier, in order.
///
/// The returned receiver is shared by every worker. The source stops and
/// releases its sender as soon as the token is cancelled or no worker is
/// left to receive. The stage yields how many items it handed out.
pub(crate) fn spawn_source<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    identifiers: &'env [String],
    layout: &'env FrameLayout,
    capacity: usize,
    token: &CancellationToken,
) -> Result<(Receiver<WorkItem>, Stage<'scope, usize>), PipelineError> {
    let (tx, rx) = bounded(capacity);
    let token = token.clone();

    let stage = Stage::spawn(scope, "frame-source".to_string(), move || {
        let mut sent = 0usize;
        for identifier in identifiers {
            if !token.send_or_cancel(&tx, WorkItem::new(identifier.clone(), layout)) {
                break;
            }
            sent += 1;
        }
        tracing::debug!(sent, total = identifiers.len(), "frame source finished");
        sent
    })?;

    Ok((rx, stage))
}

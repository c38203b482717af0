//! Fan-in: merges every worker stream into the one stream the filter reads.

use super::cancel::CancellationToken;
use super::stage::Stage;
use crate::core::scorer::ScoreResult;
use crate::error::PipelineError;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::Scope;

/// The merged stream plus the thread that closes it
pub(crate) struct FanIn<'scope> {
    pub(crate) output: Receiver<ScoreResult>,
    pub(crate) coordinator: Stage<'scope, Result<(), PipelineError>>,
}

/// Relay every result from `streams` into one output stream.
///
/// One relay thread drains each stream concurrently, so a stalled worker never
/// holds back results from the others. The output closes only after every
/// relay has exited: the coordinator joins them all before releasing the last
/// sender. Results come out in no particular order across streams.
pub(crate) fn fan_in<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    streams: Vec<Receiver<ScoreResult>>,
    token: &CancellationToken,
) -> Result<FanIn<'scope>, PipelineError> {
    let (aggregate, output) = bounded(1);
    let mut relays = Vec::with_capacity(streams.len());

    for (index, stream) in streams.into_iter().enumerate() {
        let aggregate = aggregate.clone();
        let token = token.clone();
        let relay = Stage::spawn(scope, format!("relay-{index}"), move || {
            relay_stream(&stream, &aggregate, &token);
        })?;
        relays.push(relay);
    }

    let coordinator = Stage::spawn(scope, "fan-in-close".to_string(), move || {
        close_after_relays(relays, aggregate)
    })?;

    Ok(FanIn {
        output,
        coordinator,
    })
}

fn relay_stream(
    stream: &Receiver<ScoreResult>,
    aggregate: &Sender<ScoreResult>,
    token: &CancellationToken,
) {
    while let Some(result) = token.recv_or_cancel(stream) {
        if !token.send_or_cancel(aggregate, result) {
            break;
        }
    }
}

/// Wait for all relays, then drop the coordinator's own sender.
fn close_after_relays(
    relays: Vec<Stage<'_>>,
    aggregate: Sender<ScoreResult>,
) -> Result<(), PipelineError> {
    let mut outcome = Ok(());

    for relay in relays {
        let name = relay.name().to_string();
        if let Err(error) = relay.join() {
            tracing::error!(stage = %name, "relay panicked");
            outcome = Err(error);
        }
    }

    drop(aggregate);
    tracing::debug!("all worker streams closed");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::TryRecvError;
    use std::collections::HashSet;
    use std::thread;
    use std::time::Duration;

    fn result(name: &str) -> ScoreResult {
        ScoreResult::new(name, 0.5, "cat")
    }

    /// Streams that already hold every result and are closed
    fn prefilled_streams(per_stream: &[usize]) -> Vec<Receiver<ScoreResult>> {
        per_stream
            .iter()
            .enumerate()
            .map(|(s, &count)| {
                let (tx, rx) = bounded(count.max(1));
                for i in 0..count {
                    tx.send(result(&format!("{s}-{i}"))).unwrap();
                }
                rx
            })
            .collect()
    }

    #[test]
    fn forwards_every_result_exactly_once() {
        let token = CancellationToken::new();
        let streams = prefilled_streams(&[3, 0, 7, 1]);

        let received: Vec<String> = thread::scope(|scope| {
            let fan = fan_in(scope, streams, &token).unwrap();
            let received = fan.output.iter().map(|r| r.identifier).collect();
            fan.coordinator.join().unwrap().unwrap();
            received
        });

        let unique: HashSet<_> = received.iter().collect();
        assert_eq!(received.len(), 11);
        assert_eq!(unique.len(), 11);
    }

    #[test]
    fn stalled_stream_does_not_block_others_or_close_early() {
        let token = CancellationToken::new();
        let (stalled_tx, stalled_rx) = bounded::<ScoreResult>(1);
        let mut streams = prefilled_streams(&[2, 2]);
        streams.push(stalled_rx);

        thread::scope(|scope| {
            let fan = fan_in(scope, streams, &token).unwrap();

            for _ in 0..4 {
                assert!(fan.output.recv_timeout(Duration::from_secs(5)).is_ok());
            }

            // the stalled worker is still alive, so the output must stay open
            thread::sleep(Duration::from_millis(20));
            assert_eq!(fan.output.try_recv(), Err(TryRecvError::Empty));

            stalled_tx.send(result("late")).unwrap();
            drop(stalled_tx);

            let late: Vec<_> = fan.output.iter().map(|r| r.identifier).collect();
            assert_eq!(late, vec!["late"]);
            fan.coordinator.join().unwrap().unwrap();
        });
    }

    #[test]
    fn stops_forwarding_when_cancelled() {
        let token = CancellationToken::new();
        let (_open_tx, open_rx) = bounded::<ScoreResult>(1);

        thread::scope(|scope| {
            let fan = fan_in(scope, vec![open_rx], &token).unwrap();
            token.cancel();

            // relays exit without the worker stream ever closing
            fan.coordinator.join().unwrap().unwrap();
            assert!(fan.output.recv().is_err());
        });
    }
}

//! Pipeline execution implementation.

use super::aggregator::fan_in;
use super::cancel::{CancelGuard, CancellationToken};
use super::source::spawn_source;
use super::worker::spawn_workers;
use crate::core::filter::{FrameFilter, GoodFrameAction, OutcomeRecord};
use crate::core::frame::{FrameLayout, WorkItem};
use crate::core::scorer::{score_frame, FrameScorer, ScoreResult};
use crate::error::{ConfigError, FrameSieveError, PipelineError};
use crate::events::{null_sender, Event, EventSender, PipelineEvent, PipelineSummary, ScoreEvent};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Instant;
use uuid::Uuid;

/// How a run was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// One frame at a time on the calling thread
    Sequential,
    /// Worker pool with fan-out / fan-in
    Pipelined,
}

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// Identifier of this run
    pub run_id: Uuid,
    /// How the run was executed
    pub mode: RunMode,
    /// One record per frame that received a verdict, in delivery order
    pub outcomes: Vec<OutcomeRecord>,
    /// Frames that could not be scored and were treated as score 0
    pub degraded: usize,
    /// Passing frames whose good-frame action failed (non-fatal)
    pub action_errors: Vec<String>,
    /// Whether cancellation cut the run short
    pub cancelled: bool,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineResult {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            run_id: self.run_id,
            total_frames: self.outcomes.len(),
            passed: self.passed(),
            degraded: self.degraded,
            duration_ms: self.duration_ms,
        }
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Concurrent scorers; 1 runs sequentially
    pub worker_count: usize,
    /// Frames scoring strictly above this pass
    pub threshold: f64,
    /// Log every outcome at info level instead of debug
    pub log_outcomes: bool,
    /// Where frames are read from and moved to
    pub layout: FrameLayout,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            threshold: 0.2,
            log_outcomes: false,
            layout: FrameLayout::default(),
        }
    }
}

impl PipelineConfig {
    /// Check the preconditions a run depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count < 1 {
            return Err(ConfigError::InvalidWorkerCount {
                value: self.worker_count,
            });
        }

        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidThreshold {
                value: self.threshold,
            });
        }

        Ok(())
    }

    fn mode(&self) -> RunMode {
        if self.worker_count == 1 {
            RunMode::Sequential
        } else {
            RunMode::Pipelined
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder<'a> {
    config: PipelineConfig,
    scorer: Option<Box<dyn FrameScorer + 'a>>,
    action: Option<Box<dyn GoodFrameAction + 'a>>,
}

impl<'a> PipelineBuilder<'a> {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            scorer: None,
            action: None,
        }
    }

    /// Set the number of concurrent scorers
    pub fn workers(mut self, worker_count: usize) -> Self {
        self.config.worker_count = worker_count;
        self
    }

    /// Set the pass threshold
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set where frames live
    pub fn layout(mut self, layout: FrameLayout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Log each outcome at info level
    pub fn log_outcomes(mut self, enabled: bool) -> Self {
        self.config.log_outcomes = enabled;
        self
    }

    /// Set the classifier frames are scored with
    pub fn scorer(mut self, scorer: Box<dyn FrameScorer + 'a>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Set what happens to passing frames
    pub fn action(mut self, action: Box<dyn GoodFrameAction + 'a>) -> Self {
        self.action = Some(action);
        self
    }

    /// Validate the configuration and build the pipeline
    pub fn build(self) -> Result<Pipeline<'a>, ConfigError> {
        self.config.validate()?;
        let scorer = self.scorer.ok_or(ConfigError::MissingScorer)?;
        let action = self.action.ok_or(ConfigError::MissingAction)?;

        Ok(Pipeline {
            filter: FrameFilter::new(self.config.threshold, self.config.layout.clone()),
            config: self.config,
            scorer,
            action,
        })
    }
}

impl Default for PipelineBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// The frame scoring pipeline
pub struct Pipeline<'a> {
    config: PipelineConfig,
    filter: FrameFilter,
    scorer: Box<dyn FrameScorer + 'a>,
    action: Box<dyn GoodFrameAction + 'a>,
}

impl<'a> Pipeline<'a> {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder<'a> {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run over `identifiers` without events or external cancellation
    pub fn run(&self, identifiers: &[String]) -> Result<PipelineResult, FrameSieveError> {
        self.run_with_events(identifiers, &null_sender(), &CancellationToken::new())
    }

    /// Run over `identifiers`, streaming outcomes through `events`.
    ///
    /// A single worker runs sequentially on this thread; more workers run the
    /// concurrent pipeline. `token` is cancelled when the run ends, so each
    /// run needs a fresh token.
    pub fn run_with_events(
        &self,
        identifiers: &[String],
        events: &EventSender,
        token: &CancellationToken,
    ) -> Result<PipelineResult, FrameSieveError> {
        match self.config.mode() {
            RunMode::Sequential => self.run_sequential(identifiers, events, token),
            RunMode::Pipelined => self.run_pipelined(identifiers, events, token),
        }
    }

    /// Score every frame one at a time on the calling thread.
    pub fn run_sequential(
        &self,
        identifiers: &[String],
        events: &EventSender,
        token: &CancellationToken,
    ) -> Result<PipelineResult, FrameSieveError> {
        let _teardown = CancelGuard::new(token);
        let mut tally = Tally::start(self, RunMode::Sequential, identifiers.len(), 1, events);

        for identifier in identifiers {
            if token.is_cancelled() {
                break;
            }
            let item = WorkItem::new(identifier.clone(), &self.config.layout);
            tally.accept(score_frame(&item, self.scorer.as_ref()));
        }

        let cancelled = token.is_cancelled();
        Ok(tally.finish(cancelled))
    }

    /// Score frames on a pool of `worker_count` threads.
    ///
    /// Every thread is scoped to this call: the token is cancelled and all
    /// stages are joined before it returns, on every exit path.
    pub fn run_pipelined(
        &self,
        identifiers: &[String],
        events: &EventSender,
        token: &CancellationToken,
    ) -> Result<PipelineResult, FrameSieveError> {
        let workers = self.config.worker_count.max(1);
        let scorer: &dyn FrameScorer = self.scorer.as_ref();
        let layout = &self.config.layout;
        let mut tally = Tally::start(self, RunMode::Pipelined, identifiers.len(), workers, events);

        let cancelled = thread::scope(|scope| -> Result<bool, PipelineError> {
            let _teardown = CancelGuard::new(token);

            let (items, source) = spawn_source(scope, identifiers, layout, workers, token)?;
            let (streams, scorers) = spawn_workers(scope, workers, items, scorer, token)?;
            let fan = fan_in(scope, streams, token)?;

            while let Some(result) = token.recv_or_cancel(&fan.output) {
                tally.accept(result);
            }

            let cancelled = token.is_cancelled();
            token.cancel();

            source.join()?;
            for stage in scorers {
                stage.join()?;
            }
            fan.coordinator.join()??;

            Ok(cancelled)
        })?;

        Ok(tally.finish(cancelled))
    }
}

/// Consumer-side bookkeeping for one run, shared by both modes
struct Tally<'p, 'a> {
    pipeline: &'p Pipeline<'a>,
    events: &'p EventSender,
    run_id: Uuid,
    mode: RunMode,
    started: Instant,
    outcomes: Vec<OutcomeRecord>,
    degraded: usize,
    action_errors: Vec<String>,
}

impl<'p, 'a> Tally<'p, 'a> {
    fn start(
        pipeline: &'p Pipeline<'a>,
        mode: RunMode,
        total_frames: usize,
        workers: usize,
        events: &'p EventSender,
    ) -> Self {
        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, ?mode, total_frames, workers, "starting frame scoring");
        events.send(Event::Pipeline(PipelineEvent::Started {
            run_id,
            total_frames,
            workers,
            mode,
        }));

        Self {
            pipeline,
            events,
            run_id,
            mode,
            started: Instant::now(),
            outcomes: Vec::with_capacity(total_frames),
            degraded: 0,
            action_errors: Vec::new(),
        }
    }

    fn accept(&mut self, result: ScoreResult) {
        if let Some(reason) = &result.failure {
            self.degraded += 1;
            self.events.send(Event::Score(ScoreEvent::Degraded {
                identifier: result.identifier.clone(),
                reason: reason.clone(),
            }));
        }

        let outcome = self
            .pipeline
            .filter
            .filter(&result, self.pipeline.action.as_ref());

        if self.pipeline.config.log_outcomes {
            tracing::info!("{}", outcome.record);
        } else {
            tracing::debug!("{}", outcome.record);
        }

        if let Some(error) = outcome.action_error {
            self.action_errors.push(error);
        }

        self.events
            .send(Event::Score(ScoreEvent::Outcome(outcome.record.clone())));
        self.outcomes.push(outcome.record);
    }

    fn finish(self, cancelled: bool) -> PipelineResult {
        let result = PipelineResult {
            run_id: self.run_id,
            mode: self.mode,
            outcomes: self.outcomes,
            degraded: self.degraded,
            action_errors: self.action_errors,
            cancelled,
            duration_ms: self.started.elapsed().as_millis() as u64,
        };

        if cancelled {
            tracing::info!(run_id = %result.run_id, scored = result.outcomes.len(), "frame scoring cancelled");
            self.events.send(Event::Pipeline(PipelineEvent::Cancelled));
        } else {
            tracing::info!(
                run_id = %result.run_id,
                passed = result.passed(),
                failed = result.failed(),
                "finished frame scoring"
            );
            self.events.send(Event::Pipeline(PipelineEvent::Completed {
                summary: result.summary(),
            }));
        }

        result
    }
}

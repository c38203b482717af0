//! # CLI Module
//!
//! Command-line interface for frame-sieve.
//!
//! ## Usage
//! ```bash
//! # Keep frames the classifier is more than 20% sure about
//! frame-sieve score --movie trailer.mp4 --link http://localhost:5000/model/predict
//!
//! # Two frames a second, eight concurrent uploads, log every verdict
//! frame-sieve score --movie trailer.mp4 --link http://localhost:5000/model/predict \
//!     --hertz 2 --threads 8 --threshold 0.5 --log
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use frame_sieve::core::filter::FrameMover;
use frame_sieve::core::frame::list_frames;
use frame_sieve::core::media::{FfmpegFramer, Framer};
use frame_sieve::core::pipeline::{CancellationToken, Pipeline, PipelineResult};
use frame_sieve::core::scorer::HttpScorer;
use frame_sieve::core::workspace::Workspace;
use frame_sieve::error::{ConfigError, MediaError, Result};
use frame_sieve::events::{
    Event, EventChannel, EventSender, MediaEvent, MediaPhase, PipelineEvent, ScoreEvent,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// frame-sieve - keep the frames a classifier likes
#[derive(Parser, Debug)]
#[command(name = "frame-sieve")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score every frame of a movie and assemble the passing ones
    Score {
        /// Movie to process
        #[arg(short, long)]
        movie: PathBuf,

        /// URL of the classification service
        #[arg(short, long)]
        link: String,

        /// Concurrent scoring requests (1 = sequential)
        #[arg(long, default_value = "1")]
        threads: usize,

        /// Frames sampled per second of movie (1-10)
        #[arg(long, default_value = "1")]
        hertz: u32,

        /// Score a frame must beat to be kept (0-1)
        #[arg(short, long, default_value = "0.2")]
        threshold: f64,

        /// Log every frame's verdict
        #[arg(long)]
        log: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Per-request timeout for the classification service, in seconds
        #[arg(long, default_value = "60")]
        timeout_secs: u64,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Everything a score run needs, validated
struct ScoreOptions {
    movie: PathBuf,
    link: String,
    threads: usize,
    hertz: u32,
    threshold: f64,
    log: bool,
    timeout: Duration,
    output: OutputFormat,
}

impl ScoreOptions {
    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.threads < 1 {
            return Err(ConfigError::InvalidWorkerCount {
                value: self.threads,
            });
        }
        if !(1..=10).contains(&self.hertz) {
            return Err(ConfigError::InvalidHertz { value: self.hertz });
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidThreshold {
                value: self.threshold,
            });
        }
        Ok(())
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            movie,
            link,
            threads,
            hertz,
            threshold,
            log,
            verbose,
            timeout_secs,
            output,
        } => {
            frame_sieve::init_tracing(if verbose { "debug" } else { "info" });
            run_score(ScoreOptions {
                movie,
                link,
                threads,
                hertz,
                threshold,
                log,
                timeout: Duration::from_secs(timeout_secs),
                output,
            })
        }
    }
}

fn run_score(options: ScoreOptions) -> Result<()> {
    options.validate()?;
    let term = Term::stderr();

    if matches!(options.output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("frame-sieve").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    // Dropped at the end of this function, removing every temporary frame
    let workspace = Workspace::create()?;
    let framer = FfmpegFramer::new(&options.movie, workspace.dirs(), options.hertz)?;
    let scorer = HttpScorer::with_timeout(options.link.clone(), options.timeout)?;

    let (sender, receiver) = EventChannel::new();
    let progress = matches!(options.output, OutputFormat::Pretty).then(|| {
        let pb = ProgressBar::new(framer.frame_count());
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb
    });

    let progress_clone = progress.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Media(MediaEvent::PhaseChanged { phase }) => {
                    pb.set_message(phase.to_string());
                }
                Event::Pipeline(PipelineEvent::Started { total_frames, .. }) => {
                    pb.set_length(total_frames as u64);
                    pb.set_position(0);
                }
                Event::Score(ScoreEvent::Outcome(_)) => pb.inc(1),
                _ => {}
            }
        }
        if let Some(pb) = progress_clone {
            pb.finish_and_clear();
        }
    });

    let scored = score_movie(&options, &workspace, &framer, scorer, &sender);
    let assembled = scored
        .as_ref()
        .ok()
        .map(|result| assemble_movie(&framer, result, &sender));

    drop(sender);
    event_thread.join().ok();

    let result = scored?;
    let (movie, assembly_error) = match assembled {
        Some(Ok(movie)) => (movie, None),
        Some(Err(error)) => (None, Some(error)),
        None => (None, None),
    };

    match options.output {
        OutputFormat::Pretty => print_pretty_results(&term, &result, movie.as_deref()),
        OutputFormat::Json => print_json_results(&result, movie.as_deref()),
    }

    // Summary first, then the assembly failure
    if let Some(error) = assembly_error {
        return Err(error.into());
    }

    Ok(())
}

/// Extract and score every frame of the movie.
fn score_movie(
    options: &ScoreOptions,
    workspace: &Workspace,
    framer: &FfmpegFramer,
    scorer: HttpScorer,
    events: &EventSender,
) -> Result<PipelineResult> {
    let movie = options.movie.display();

    events.phase(MediaPhase::StrippingSound);
    tracing::info!(%movie, "stripping sound");
    if let Err(error) = framer.strip_sound() {
        tracing::warn!(%movie, %error, "no sound track extracted, the new movie will be silent");
    }

    events.phase(MediaPhase::SplittingFrames);
    tracing::info!(%movie, hertz = options.hertz, "splitting movie into frames");
    framer.make_frames()?;

    let frames = list_frames(&workspace.dirs().frames)?;
    tracing::info!(
        frames = frames.len(),
        estimated_minutes = framer.frame_count() / 5 / 60,
        "frames ready for scoring"
    );

    events.phase(MediaPhase::Scoring);
    let pipeline = Pipeline::builder()
        .workers(options.threads)
        .threshold(options.threshold)
        .layout(workspace.layout())
        .log_outcomes(options.log)
        .scorer(Box::new(scorer))
        .action(Box::new(FrameMover::new(framer)))
        .build()?;

    pipeline.run_with_events(&frames, events, &CancellationToken::new())
}

/// Stitch the kept frames into a new movie.
///
/// Returns `None` without touching the framer when no frame was kept.
fn assemble_movie(
    framer: &dyn Framer,
    result: &PipelineResult,
    events: &EventSender,
) -> std::result::Result<Option<PathBuf>, MediaError> {
    if result.passed() == 0 {
        tracing::warn!(frames = result.outcomes.len(), "no frames kept, skipping movie assembly");
        return Ok(None);
    }

    events.phase(MediaPhase::AssemblingVideo);
    let output = framer.make_video()?;
    tracing::info!(output = %output.display(), "saved movie");
    Ok(Some(output))
}

fn print_pretty_results(term: &Term, result: &PipelineResult, movie: Option<&Path>) {
    term.write_line("").ok();
    term.write_line(&format!("{} Scoring Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} frames scored in {:.1}s",
        style(result.outcomes.len()).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} frames kept, {} dropped",
        style(result.passed()).green(),
        style(result.failed()).dim()
    ))
    .ok();

    if result.degraded > 0 {
        term.write_line(&format!(
            "  {} frames could not be scored",
            style(result.degraded).yellow()
        ))
        .ok();
    }

    for error in &result.action_errors {
        term.write_line(&format!("  {} {}", style("!").red(), error)).ok();
    }

    term.write_line("").ok();
    let saved = match movie {
        Some(movie) => format!("  Saved to {}", style(movie.display()).bold()),
        None => format!("  {}", style("No movie written").yellow()),
    };
    term.write_line(&saved).ok();
}

fn print_json_results(result: &PipelineResult, movie: Option<&Path>) {
    let output = serde_json::json!({
        "run_id": result.run_id.to_string(),
        "mode": result.mode,
        "total_frames": result.outcomes.len(),
        "passed": result.passed(),
        "failed": result.failed(),
        "degraded": result.degraded,
        "cancelled": result.cancelled,
        "duration_ms": result.duration_ms,
        "movie": movie,
        "action_errors": result.action_errors,
        "outcomes": result.outcomes,
    });

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "failed to render results"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_sieve::core::filter::{OutcomeRecord, Verdict};
    use frame_sieve::core::pipeline::RunMode;
    use frame_sieve::events::null_sender;
    use std::cell::Cell;

    /// Counts assembly requests instead of running ffmpeg
    #[derive(Default)]
    struct CountingFramer {
        videos: Cell<usize>,
    }

    impl Framer for CountingFramer {
        fn strip_sound(&self) -> std::result::Result<(), MediaError> {
            Ok(())
        }

        fn make_frames(&self) -> std::result::Result<(), MediaError> {
            Ok(())
        }

        fn create_sound_frame(&self, _identifier: &str) -> std::result::Result<(), MediaError> {
            Ok(())
        }

        fn make_video(&self) -> std::result::Result<PathBuf, MediaError> {
            self.videos.set(self.videos.get() + 1);
            Ok(PathBuf::from("new_trailer.mov"))
        }

        fn duration(&self) -> f64 {
            3.0
        }

        fn frame_count(&self) -> u64 {
            5
        }
    }

    fn run_result(verdicts: &[Verdict]) -> PipelineResult {
        PipelineResult {
            run_id: uuid::Uuid::new_v4(),
            mode: RunMode::Sequential,
            outcomes: verdicts
                .iter()
                .enumerate()
                .map(|(n, &verdict)| OutcomeRecord {
                    identifier: format!("{n:09}.jpg"),
                    verdict,
                    score: if verdict == Verdict::Pass { 0.9 } else { 0.1 },
                    predicted_label: "cat".to_string(),
                })
                .collect(),
            degraded: 0,
            action_errors: Vec::new(),
            cancelled: false,
            duration_ms: 12,
        }
    }

    fn options() -> ScoreOptions {
        ScoreOptions {
            movie: PathBuf::from("trailer.mp4"),
            link: "http://localhost:5000".to_string(),
            threads: 4,
            hertz: 1,
            threshold: 0.2,
            log: false,
            timeout: Duration::from_secs(60),
            output: OutputFormat::Pretty,
        }
    }

    #[test]
    fn cli_parses_score_arguments() {
        let cli = Cli::try_parse_from([
            "frame-sieve", "score", "--movie", "m.mp4", "--link", "http://x", "--threads", "3",
            "--hertz", "2", "--threshold", "0.5", "--log",
        ])
        .unwrap();

        let Commands::Score {
            threads, hertz, threshold, log, ..
        } = cli.command;
        assert_eq!((threads, hertz, threshold, log), (3, 2, 0.5, true));
    }

    #[test]
    fn options_reject_out_of_range_values() {
        assert!(options().validate().is_ok());
        assert!(ScoreOptions { threads: 0, ..options() }.validate().is_err());
        assert!(ScoreOptions { hertz: 11, ..options() }.validate().is_err());
        assert!(ScoreOptions { hertz: 0, ..options() }.validate().is_err());
        assert!(ScoreOptions { threshold: -0.1, ..options() }.validate().is_err());
    }

    #[test]
    fn assembly_is_skipped_when_no_frame_passed() {
        let framer = CountingFramer::default();
        let result = run_result(&[Verdict::Fail, Verdict::Fail, Verdict::Fail]);

        let movie = assemble_movie(&framer, &result, &null_sender()).unwrap();

        assert!(movie.is_none());
        assert_eq!(framer.videos.get(), 0);
    }

    #[test]
    fn assembly_runs_when_a_frame_passed() {
        let framer = CountingFramer::default();
        let result = run_result(&[Verdict::Fail, Verdict::Pass]);

        let movie = assemble_movie(&framer, &result, &null_sender()).unwrap();

        assert_eq!(movie, Some(PathBuf::from("new_trailer.mov")));
        assert_eq!(framer.videos.get(), 1);
    }

    #[test]
    fn empty_run_needs_no_assembly() {
        let framer = CountingFramer::default();

        let movie = assemble_movie(&framer, &run_result(&[]), &null_sender()).unwrap();

        assert!(movie.is_none());
        assert_eq!(framer.videos.get(), 0);
    }
}

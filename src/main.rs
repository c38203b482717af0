//! # frame-sieve CLI
//!
//! Command-line interface for frame-sieve.
//!
//! ## Usage
//! ```bash
//! frame-sieve score --movie trailer.mp4 --link http://localhost:5000/model/predict
//! frame-sieve score --movie trailer.mp4 --link http://localhost:5000/model/predict --threads 8 --log
//! ```

mod cli;

use frame_sieve::Result;

fn main() -> Result<()> {
    cli::run()
}

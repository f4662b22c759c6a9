//! Real-time audio spectrum analysis for visualizers.
//!
//! Samples go into a [`SpectrumPipeline`](audio::analysis::SpectrumPipeline)
//! through its `ingest*` methods; once per rendered frame,
//! `compute_frame(dt)` returns a smoothed curve of log-spaced bucket
//! magnitudes normalized against the loudest bucket.
//!
//! ```no_run
//! use spectra::audio::analysis::SpectrumPipeline;
//! use spectra::config::AnalysisConfig;
//!
//! let mut pipeline = SpectrumPipeline::new(&AnalysisConfig::default())?;
//! pipeline.ingest_slice(&[0.0f32; 1024]);
//! let bars = pipeline.compute_frame(1.0 / 60.0)?;
//! println!("{} bars", bars.len());
//! # Ok::<(), spectra::error::SpectrumError>(())
//! ```

pub mod audio;
pub mod config;
pub mod encode;
pub mod error;

pub use audio::analysis::SpectrumPipeline;
pub use config::AnalysisConfig;
pub use error::SpectrumError;

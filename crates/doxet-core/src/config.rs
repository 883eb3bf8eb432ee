//! Resolved configuration consumed by the conversion pipeline
//!
//! Command-line parsing lives in the CLI crate; the core only sees this
//! already-resolved object. It is read-only for the duration of a run.

use std::path::PathBuf;

/// Configuration for a single conversion run
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Root directory all output is written under
    pub output_dir: PathBuf,
    /// Keep the cleaned intermediate documents on disk
    pub keep_intermediates: bool,
    /// Ordered list of generator identifiers to invoke
    pub generators: Vec<String>,
}

impl ConverterConfig {
    /// Create a configuration with the default generator set
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            keep_intermediates: false,
            generators: vec!["html".to_string(), "docset".to_string()],
        }
    }

    /// Keep cleaned intermediate documents after the run
    #[must_use]
    pub fn with_intermediates(mut self, keep: bool) -> Self {
        self.keep_intermediates = keep;
        self
    }

    /// Replace the ordered generator list
    #[must_use]
    pub fn with_generators(mut self, generators: Vec<String>) -> Self {
        self.generators = generators;
        self
    }

    /// Directory the cleaned intermediates are written to
    pub fn intermediate_dir(&self) -> PathBuf {
        self.output_dir.join("cleaned")
    }
}

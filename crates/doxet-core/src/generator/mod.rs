//! Output generators and generator dispatch
//!
//! A generator is anything that can consume the finished database and
//! produce output. Dispatch invokes the configured generators in order; a
//! failure is captured per generator, and generators that declare a hard
//! dependency on a failed generator's output are skipped while independent
//! ones still run.

use std::collections::HashSet;

use crate::config::ConverterConfig;
use crate::database::Database;
use crate::error::ConvertError;

pub mod docset;
pub mod html;

pub use docset::DocsetGenerator;
pub use html::HtmlGenerator;

/// Capability interface for output generation
pub trait OutputGenerator: Sync {
    /// Stable identifier used in configuration and dependency declarations
    fn name(&self) -> &str;

    /// Identifier of a generator whose output this one requires, if any
    fn requires(&self) -> Option<&str> {
        None
    }

    /// Consume the database and produce output under the configured root
    fn generate(&self, database: &Database, config: &ConverterConfig) -> Result<(), ConvertError>;
}

/// Outcome of one generator invocation
#[derive(Debug)]
pub enum GeneratorStatus {
    /// The generator ran to completion
    Completed,
    /// The generator ran and failed
    Failed(ConvertError),
    /// The generator was not run because a required generator failed
    Skipped {
        /// Identifier of the failed requirement
        blocked_on: String,
    },
}

/// One entry in the dispatch report
#[derive(Debug)]
pub struct GeneratorRun {
    /// Generator identifier
    pub name: String,
    /// What happened
    pub status: GeneratorStatus,
}

impl GeneratorRun {
    /// Whether this run completed successfully
    pub fn succeeded(&self) -> bool {
        matches!(self.status, GeneratorStatus::Completed)
    }
}

/// Write a generated file, creating parent directories as needed
pub(crate) fn write_output(path: &std::path::Path, contents: &str) -> Result<(), ConvertError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConvertError::io(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| ConvertError::io(path, e))
}

/// Create a built-in generator by identifier
pub fn create(name: &str) -> Option<Box<dyn OutputGenerator>> {
    match name {
        "html" => Some(Box::new(HtmlGenerator)),
        "docset" => Some(Box::new(DocsetGenerator)),
        _ => None,
    }
}

/// Invoke each generator in order, honoring hard dependencies
///
/// A generator whose requirement failed (or was itself skipped) is skipped
/// and counts as failed for anything depending on it in turn. No rollback
/// is attempted for a failed generator's partial output.
pub fn dispatch(
    generators: &[Box<dyn OutputGenerator>],
    database: &Database,
    config: &ConverterConfig,
) -> Vec<GeneratorRun> {
    let mut failed: HashSet<String> = HashSet::new();
    let mut runs = Vec::with_capacity(generators.len());

    for generator in generators {
        let name = generator.name().to_string();
        if let Some(requirement) = generator.requires() {
            if failed.contains(requirement) {
                failed.insert(name.clone());
                runs.push(GeneratorRun {
                    name,
                    status: GeneratorStatus::Skipped {
                        blocked_on: requirement.to_string(),
                    },
                });
                continue;
            }
        }
        let status = match generator.generate(database, config) {
            Ok(()) => GeneratorStatus::Completed,
            Err(cause) => {
                failed.insert(name.clone());
                let error = match cause {
                    already @ ConvertError::GeneratorFailure { .. } => already,
                    other => ConvertError::GeneratorFailure {
                        generator: name.clone(),
                        detail: other.to_string(),
                    },
                };
                GeneratorStatus::Failed(error)
            }
        };
        runs.push(GeneratorRun { name, status });
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{Document, Element};

    struct Stub {
        name: &'static str,
        requires: Option<&'static str>,
        fail: bool,
    }

    impl Stub {
        fn new(name: &'static str, requires: Option<&'static str>, fail: bool) -> Self {
            Self {
                name,
                requires,
                fail,
            }
        }
    }

    impl OutputGenerator for Stub {
        fn name(&self) -> &str {
            self.name
        }

        fn requires(&self) -> Option<&str> {
            self.requires
        }

        fn generate(&self, _: &Database, _: &ConverterConfig) -> Result<(), ConvertError> {
            if self.fail {
                Err(ConvertError::GeneratorFailure {
                    generator: self.name.to_string(),
                    detail: "boom".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn empty_database() -> Database {
        Database::new(
            Document::new(Element::new("index")),
            Document::new(Element::new("hierarchy")),
        )
    }

    #[test]
    fn test_dependent_generator_skipped_after_failure() {
        let generators: Vec<Box<dyn OutputGenerator>> = vec![
            Box::new(Stub::new("html", None, true)),
            Box::new(Stub::new("docset", Some("html"), false)),
            Box::new(Stub::new("manifest", None, false)),
        ];
        let runs = dispatch(&generators, &empty_database(), &ConverterConfig::new("out"));

        assert_eq!(runs.len(), 3);
        assert!(matches!(runs[0].status, GeneratorStatus::Failed(_)));
        assert!(matches!(
            runs[1].status,
            GeneratorStatus::Skipped { ref blocked_on } if blocked_on == "html"
        ));
        assert!(runs[2].succeeded(), "independent generator still runs");
    }

    #[test]
    fn test_skip_is_transitive() {
        let generators: Vec<Box<dyn OutputGenerator>> = vec![
            Box::new(Stub::new("a", None, true)),
            Box::new(Stub::new("b", Some("a"), false)),
            Box::new(Stub::new("c", Some("b"), false)),
        ];
        let runs = dispatch(&generators, &empty_database(), &ConverterConfig::new("out"));
        assert!(matches!(runs[1].status, GeneratorStatus::Skipped { .. }));
        assert!(matches!(runs[2].status, GeneratorStatus::Skipped { .. }));
    }

    #[test]
    fn test_all_succeed_in_order() {
        let generators: Vec<Box<dyn OutputGenerator>> = vec![
            Box::new(Stub::new("html", None, false)),
            Box::new(Stub::new("docset", Some("html"), false)),
        ];
        let runs = dispatch(&generators, &empty_database(), &ConverterConfig::new("out"));
        assert!(runs.iter().all(GeneratorRun::succeeded));
        assert_eq!(runs[0].name, "html");
        assert_eq!(runs[1].name, "docset");
    }

    #[test]
    fn test_registry_knows_builtins() {
        assert!(create("html").is_some());
        assert!(create("docset").is_some());
        assert!(create("pdf").is_none());
    }
}

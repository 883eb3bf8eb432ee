//! Pipeline orchestration
//!
//! Runs the four strictly sequential stages: normalize every raw document,
//! build the object database, resolve cross-references, then dispatch the
//! enabled generators. Per-entity normalization runs in parallel; stage
//! boundaries are hard, because the resolver needs the complete index
//! before any reference can be classified.

use std::fs;
use std::path::Path;

use rayon::prelude::*;

use crate::config::ConverterConfig;
use crate::database::{build_database, sanitize_file_name, Database};
use crate::error::{ConvertError, Warning};
use crate::generator::{self, GeneratorRun, OutputGenerator};
use crate::markup::Document;
use crate::normalize::Normalizer;
use crate::resolver::resolve;

/// Name of the raw top-level index document
pub const INDEX_FILE: &str = "index.xml";

/// Name of the raw hierarchy document
pub const HIERARCHY_FILE: &str = "hierarchy.xml";

/// Result of a successful conversion run
#[derive(Debug)]
pub struct Conversion {
    /// The finished, reference-resolved database
    pub database: Database,
    /// Non-fatal conditions accumulated during the run
    pub warnings: Vec<Warning>,
    /// Per-generator dispatch report
    pub generator_runs: Vec<GeneratorRun>,
}

impl Conversion {
    /// Whether every enabled generator completed
    pub fn generators_succeeded(&self) -> bool {
        self.generator_runs.iter().all(GeneratorRun::succeeded)
    }
}

/// Drives a full conversion run against one input directory
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    /// Create a converter for the given configuration
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// The configuration this converter runs with
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert the extractor output in `input_dir`
    ///
    /// Fatal errors abort before any generator runs; generator failures are
    /// reported per generator in the returned [`Conversion`].
    pub fn convert(&self, input_dir: &Path) -> Result<Conversion, ConvertError> {
        let intake = Intake::scan(input_dir)?;

        let index = Normalizer::clean_index(&intake.index, INDEX_FILE)?;
        let hierarchy = Normalizer::clean_hierarchy(&intake.hierarchy, HIERARCHY_FILE)?;
        let objects: Vec<Document> = intake
            .objects
            .par_iter()
            .map(|(file, raw)| Normalizer::clean_object(raw, file))
            .collect::<Result<_, _>>()?;

        let mut database = build_database(index, hierarchy, objects)?;
        let warnings = resolve(&mut database);

        if self.config.keep_intermediates {
            self.write_intermediates(&database)?;
        }

        let generators = self.enabled_generators();
        let generator_runs = generator::dispatch(&generators, &database, &self.config);

        Ok(Conversion {
            database,
            warnings,
            generator_runs,
        })
    }

    fn enabled_generators(&self) -> Vec<Box<dyn OutputGenerator>> {
        self.config
            .generators
            .iter()
            .map(|name| {
                generator::create(name).unwrap_or_else(|| {
                    Box::new(UnknownGenerator {
                        name: name.clone(),
                    })
                })
            })
            .collect()
    }

    /// Write the cleaned documents, mirroring the directory buckets
    ///
    /// Runs after resolution so retained files reflect the latest
    /// transformation of each document.
    fn write_intermediates(&self, database: &Database) -> Result<(), ConvertError> {
        let root = self.config.intermediate_dir();
        write_file(&root.join(INDEX_FILE), &database.index_document.to_xml())?;
        write_file(
            &root.join(HIERARCHY_FILE),
            &database.hierarchy_document.to_xml(),
        )?;
        for entity in database.entities() {
            let path = root
                .join(entity.relative_directory)
                .join(format!("{}.xml", sanitize_file_name(&entity.name)));
            write_file(&path, &entity.document.to_xml())?;
        }
        Ok(())
    }
}

/// Stands in for a configured identifier no generator answers to
struct UnknownGenerator {
    name: String,
}

impl OutputGenerator for UnknownGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, _: &Database, _: &ConverterConfig) -> Result<(), ConvertError> {
        Err(ConvertError::GeneratorFailure {
            generator: self.name.clone(),
            detail: "unknown generator identifier".to_string(),
        })
    }
}

/// Raw extractor output read from the input directory
struct Intake {
    index: String,
    hierarchy: String,
    /// (file name, raw contents), sorted by file name so discovery order
    /// is independent of directory iteration order
    objects: Vec<(String, String)>,
}

impl Intake {
    fn scan(input_dir: &Path) -> Result<Self, ConvertError> {
        let index = read_file(&input_dir.join(INDEX_FILE))?;
        let hierarchy = read_file(&input_dir.join(HIERARCHY_FILE))?;

        let mut names: Vec<String> = fs::read_dir(input_dir)
            .map_err(|e| ConvertError::io(input_dir, e))?
            .filter_map(Result::ok)
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| {
                name.ends_with(".xml")
                    && name.as_str() != INDEX_FILE
                    && name.as_str() != HIERARCHY_FILE
            })
            .collect();
        names.sort_unstable();

        let mut objects = Vec::with_capacity(names.len());
        for name in names {
            let raw = read_file(&input_dir.join(&name))?;
            objects.push((name, raw));
        }

        Ok(Self {
            index,
            hierarchy,
            objects,
        })
    }
}

fn read_file(path: &Path) -> Result<String, ConvertError> {
    fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))
}

fn write_file(path: &Path, contents: &str) -> Result<(), ConvertError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConvertError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| ConvertError::io(path, e))
}

//! Doxet Core - Conversion engine for extractor-generated API documentation
//!
//! This crate turns the per-entity XML files produced by an upstream
//! documentation extractor into a normalized, cross-referenced object
//! database, then drives pluggable output generators against that database.
//! The pipeline runs in four strictly sequential stages:
//! - Normalizer: strips extractor noise into a canonical markup vocabulary
//! - Builder: assembles the entity/member/hierarchy/directory database
//! - Resolver: rewrites cross-reference markers into concrete links
//! - Dispatch: hands the finished database to each enabled generator

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error and warning taxonomy for the whole pipeline
pub mod error;

/// Resolved configuration consumed by the converter
pub mod config;

/// Owned markup document tree and deterministic serialization
pub mod markup;

/// Markup normalizer - raw extractor XML to cleaned documents
pub mod normalize;

/// Object database - entities, members, hierarchy, directory index
pub mod database;

/// Reference resolver - rewrites cross-reference markers into links
pub mod resolver;

/// Output generators and generator dispatch
pub mod generator;

/// Pipeline orchestration
pub mod converter;

/// Convenience re-export of the converter
pub use converter::{Conversion, Converter};

/// Convenience re-export of the configuration object
pub use config::ConverterConfig;

/// Convenience re-export of the database aggregate
pub use database::{Database, Entity, EntityKind, Member};

/// Convenience re-export of the error taxonomy
pub use error::{ConvertError, Warning};

//! Error and warning types for the conversion pipeline
//!
//! Fatal conditions abort the run and surface as [`ConvertError`]; non-fatal
//! conditions accumulate as [`Warning`]s and are returned alongside the
//! successful result so the caller can decide whether they fail the build.

use std::path::PathBuf;

use thiserror::Error;

/// A fatal conversion error
///
/// Any of these aborts the pipeline before output generation starts, except
/// [`ConvertError::GeneratorFailure`] which is reported per generator by the
/// dispatch stage.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// A raw document could not be parsed
    #[error("malformed input in '{file}': {detail}")]
    MalformedInput {
        /// Name of the offending file
        file: String,
        /// Parser diagnostic
        detail: String,
    },

    /// Two entities share the same name
    #[error("duplicate entity '{name}'")]
    DuplicateEntity {
        /// The colliding entity name
        name: String,
    },

    /// Two members of one entity share the same name
    #[error("duplicate member '{member}' on entity '{entity}'")]
    DuplicateMember {
        /// The owning entity
        entity: String,
        /// The colliding member name
        member: String,
    },

    /// An output generator failed
    #[error("generator '{generator}' failed: {detail}")]
    GeneratorFailure {
        /// Identifier of the failed generator
        generator: String,
        /// Underlying cause
        detail: String,
    },

    /// A filesystem operation failed
    #[error("i/o error at '{}': {source}", path.display())]
    Io {
        /// The path being read or written
        path: PathBuf,
        /// The underlying i/o error
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    /// Wrap an i/o error with the path it occurred at
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A non-fatal condition accumulated during conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A cross-reference marker whose target is not in the database
    ///
    /// The original marker is preserved verbatim in the document.
    DanglingReference {
        /// The document the marker appears in
        document: String,
        /// The marker's target spelling, e.g. `Qux.missingMethod`
        target: String,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::DanglingReference { document, target } => {
                write!(f, "dangling reference '{target}' in '{document}'")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConvertError::DuplicateMember {
            entity: "Foo".to_string(),
            member: "bar".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate member 'bar' on entity 'Foo'");
    }

    #[test]
    fn test_warning_display() {
        let warning = Warning::DanglingReference {
            document: "FooCategory".to_string(),
            target: "Foo.baz".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "dangling reference 'Foo.baz' in 'FooCategory'"
        );
    }
}

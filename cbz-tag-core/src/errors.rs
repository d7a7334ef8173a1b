use std::{io, process::ExitStatus};

use camino::Utf8PathBuf;

use crate::record::Field;

/// A single rejected value, the collector asks for the same field again
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid {field}: {value:?} is not a number")]
    NotANumber { field: Field, value: String },

    #[error("Invalid {field}: {value} is outside {min}..={max}")]
    OutOfRange {
        field: Field,
        /// The digits as given, they may not fit any integer type
        value: String,
        min: u16,
        max: u16,
    },

    #[error("Invalid {field}: it can't be empty")]
    Empty { field: Field },
}

impl ValidationError {
    #[must_use]
    pub fn field(&self) -> Field {
        match self {
            Self::NotANumber { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::Empty { field } => *field,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Gave up on {field} after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        field: Field,
        attempts: u32,
        last: ValidationError,
    },

    #[error("No valid {field} left in the input")]
    SourceExhausted { field: Field },

    #[error("Aborted by the operator")]
    Aborted,

    #[error("Input error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum TagWriteError {
    #[error("Couldn't run {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Rejected {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("Couldn't read descriptor {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid descriptor {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid descriptor pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Invalid credit role {role:?}: it can't contain ':'")]
    CreditRole { role: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error {0}")]
    IO(#[from] io::Error),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("{0} is not a directory")]
    NotADirectory(Utf8PathBuf),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    TagWrite(#[from] TagWriteError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

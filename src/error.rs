use displaydoc::Display;
use std::io;
use thiserror::Error;

/// A reason why loading a map document failed.
#[derive(Debug, Display, Error)]
pub enum LoadError {
    /// IO error: {0}
    Io(#[from] io::Error),
    /// malformed document: {0}
    DocumentMalformed(String),
    /// tile data held {found} cells, expected {expected}
    TruncatedGrid {
        /// Number of cells the layer dimensions call for.
        expected: usize,
        /// Number of cells actually present.
        found: usize,
    },
    /// failed to decompress tile data: {0}
    DecompressionFailed(#[source] io::Error),
    /// failed to decode base64 tile data: {0}
    InvalidBase64(#[from] base64::DecodeError),
    /// could not parse "{value}" as {kind}
    MalformedValue {
        /// What the literal was supposed to be.
        kind: &'static str,
        /// The offending literal.
        value: String,
    },
    /// failed to load template "{path}": {source}
    TemplateLoadFailed {
        /// Template path as written in the referencing object.
        path: String,
        /// Why loading failed.
        source: Box<LoadError>,
    },
    /// failed to load tileset file "{path}": {source}
    TilesetFileLoadFailed {
        /// Tileset source as written in the referencing map.
        path: String,
        /// Why loading failed.
        source: Box<LoadError>,
    },
}

impl LoadError {
    pub(crate) fn malformed(kind: &'static str, value: impl Into<String>) -> Self {
        LoadError::MalformedValue {
            kind,
            value: value.into(),
        }
    }

    /// The numeric code of this error, for callers that report one (e.g. as an exit code).
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            LoadError::Io(_) => ErrorCode::CouldNotOpen,
            LoadError::TruncatedGrid { .. }
            | LoadError::DecompressionFailed(_)
            | LoadError::InvalidBase64(_) => ErrorCode::InvalidFileSize,
            LoadError::DocumentMalformed(_)
            | LoadError::MalformedValue { .. }
            | LoadError::TemplateLoadFailed { .. }
            | LoadError::TilesetFileLoadFailed { .. } => ErrorCode::ParsingError,
        }
    }
}

impl From<xml::reader::Error> for LoadError {
    fn from(err: xml::reader::Error) -> Self {
        LoadError::DocumentMalformed(err.to_string())
    }
}

/// Small numeric classification of a [`LoadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    /// The document could not be opened or read.
    CouldNotOpen = 0x01,
    /// The document could not be parsed.
    ParsingError = 0x02,
    /// Tile data did not have the size its layer declares.
    InvalidFileSize = 0x04,
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        code as u8
    }
}

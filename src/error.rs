//! Unified error types for chunkpack.
//!
//! Only two conditions ever stop an ingestion run: the descriptor cannot be
//! read or parsed, or it declares a format other than `chunked-jsonl`. Both
//! surface as [`ChunkpackError::Descriptor`] (or, for content parsed from
//! memory, [`ChunkpackError::InvalidDescriptor`]). Everything that goes wrong
//! below the descriptor (a missing chunk file, a truncated line, a record with
//! no usable sender) is handled where it is detected and only counted.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for chunkpack operations.
pub type Result<T> = std::result::Result<T, ChunkpackError>;

/// The error type for all chunkpack operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChunkpackError {
    /// An I/O error outside of descriptor loading.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A JSON error outside of descriptor loading.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The bundle descriptor could not be loaded.
    ///
    /// This is the only fatal error during ingestion.
    #[error("Invalid descriptor (file: {}): {source}", path.display())]
    Descriptor {
        /// Path of the descriptor file
        path: PathBuf,
        /// What went wrong
        #[source]
        source: DescriptorErrorKind,
    },

    /// Descriptor content that did not come from a file was rejected.
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(#[source] DescriptorErrorKind),

    /// A chunk entry carries no field a file path can be derived from.
    #[error("Chunk #{index} declares neither relativePath, file nor fileName")]
    ChunkPath {
        /// Position of the entry in the descriptor's chunk list
        index: usize,
    },
}

/// Reasons a descriptor is rejected.
#[derive(Debug, Error)]
pub enum DescriptorErrorKind {
    /// The file could not be read
    #[error("cannot read descriptor: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid JSON or is missing required keys
    #[error("cannot parse descriptor: {0}")]
    Json(#[from] serde_json::Error),
    /// `metadata.format` names another export format
    #[error("unsupported format '{found}' (expected '{expected}')")]
    UnsupportedFormat {
        /// The format identifier found in the descriptor
        found: String,
        /// The only accepted format identifier
        expected: &'static str,
    },
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChunkpackError {
    /// Creates a descriptor error for the given path.
    pub fn descriptor(path: impl Into<PathBuf>, source: impl Into<DescriptorErrorKind>) -> Self {
        ChunkpackError::Descriptor {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Creates a path-less descriptor error for a format mismatch.
    pub fn unsupported_format(found: impl Into<String>) -> Self {
        ChunkpackError::InvalidDescriptor(DescriptorErrorKind::UnsupportedFormat {
            found: found.into(),
            expected: crate::descriptor::EXPECTED_FORMAT,
        })
    }

    /// Attaches the descriptor file path to a path-less descriptor error.
    ///
    /// Other errors are returned unchanged.
    pub fn at_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            ChunkpackError::InvalidDescriptor(source) => ChunkpackError::Descriptor {
                path: path.into(),
                source,
            },
            other => other,
        }
    }

    /// Creates a chunk path error.
    pub fn chunk_path(index: usize) -> Self {
        ChunkpackError::ChunkPath { index }
    }

    /// Returns `true` if this is a descriptor error, with or without a path.
    pub fn is_descriptor(&self) -> bool {
        matches!(
            self,
            ChunkpackError::Descriptor { .. } | ChunkpackError::InvalidDescriptor(_)
        )
    }

    /// Returns `true` if the descriptor declared the wrong format.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(
            self,
            ChunkpackError::Descriptor {
                source: DescriptorErrorKind::UnsupportedFormat { .. },
                ..
            } | ChunkpackError::InvalidDescriptor(DescriptorErrorKind::UnsupportedFormat { .. })
        )
    }

    /// Returns `true` if this is a chunk path error.
    pub fn is_chunk_path(&self) -> bool {
        matches!(self, ChunkpackError::ChunkPath { .. })
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChunkpackError::Io(_))
    }
}

//! Error types for model construction, solving, and file handling

use std::fmt;
use std::path::PathBuf;

/// Main error type for all generation operations
#[derive(Debug)]
pub enum GenerationError {
    /// Failed to load a source or tile image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save a generated image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// Failed to read a manifest or tile set descriptor
    ManifestRead {
        /// Path to the descriptor file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Manifest or tile set descriptor is not valid JSON
    ManifestParse {
        /// Path to the descriptor file
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// Model parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Source data doesn't meet model requirements
    InvalidSourceData {
        /// Description of what's wrong with the source data
        reason: String,
    },

    /// An edge descriptor references a tile name that was never declared
    UnknownTile {
        /// The undeclared tile name
        name: String,
    },

    /// An edge endpoint could not be parsed or is out of range
    MalformedEdge {
        /// The offending endpoint text
        endpoint: String,
        /// Explanation of the failure
        reason: String,
    },

    /// Every solver attempt for a sample ended in a contradiction
    Contradiction {
        /// Name of the sample that failed
        sample: String,
        /// Number of attempts made
        tries: usize,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::ManifestRead { path, source } => {
                write!(f, "Failed to read '{}': {source}", path.display())
            }
            Self::ManifestParse { path, source } => {
                write!(f, "Failed to parse '{}': {source}", path.display())
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::InvalidSourceData { reason } => {
                write!(f, "Invalid source data: {reason}")
            }
            Self::UnknownTile { name } => {
                write!(f, "Edge references undeclared tile '{name}'")
            }
            Self::MalformedEdge { endpoint, reason } => {
                write!(f, "Malformed edge endpoint '{endpoint}': {reason}")
            }
            Self::Contradiction { sample, tries } => {
                write!(f, "Sample '{sample}' reached a contradiction in all {tries} attempts")
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::ManifestRead { source, .. } | Self::FileSystem { source, .. } => Some(source),
            Self::ManifestParse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for generation results
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> GenerationError {
    GenerationError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create an invalid source data error
pub fn invalid_source(reason: &impl ToString) -> GenerationError {
    GenerationError::InvalidSourceData {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = invalid_parameter("symmetry", &9, &"must be between 1 and 8");
        let text = err.to_string();
        assert!(text.contains("symmetry"));
        assert!(text.contains('9'));
    }

    #[test]
    fn test_source_chain_for_io_errors() {
        use std::error::Error;
        let err = GenerationError::FileSystem {
            path: PathBuf::from("out.png"),
            operation: "create directory",
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
    }
}

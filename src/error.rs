use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum BbdIndexError {
    /// Returned by the build entry points when `leaf_max_size` is zero.
    #[error("leaf_max_size must be positive")]
    InvalidLeafSize,

    /// The packed node encoding stores the split dimension in 3 bits, so
    /// only dimensions 1 through 8 are supported.
    #[error("unsupported dimension {dim}, expected 1..=8")]
    UnsupportedDimension {
        /// The rejected dimension.
        dim: usize,
    },
}

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, BbdIndexError>;

//! Error Types
//!
//! The main error type [`PrismError`] covers the failure modes of the render
//! core: shader preprocessing and compilation, matrix math edge cases, and
//! missing GPU capabilities.
//!
//! None of these conditions are fatal to an interactive session. The renderer
//! reports them through this type (or logs them and falls back to a degenerate
//! result) but never aborts the process — a frame that hits one of these draws
//! incorrectly rather than crashing.

use thiserror::Error;

/// The main error type for the Prism render core.
#[derive(Error, Debug)]
pub enum PrismError {
    // ========================================================================
    // Shader & Program Errors
    // ========================================================================
    /// A `#include <name>` directive referenced a chunk that does not exist
    /// in the static chunk table.
    #[error("Unknown shader chunk in #include directive: {0}")]
    UnknownShaderChunk(String),

    /// Recursive `#include` expansion exceeded the depth limit (include cycle).
    #[error("Shader include depth exceeded while expanding chunk: {0}")]
    IncludeDepthExceeded(String),

    /// A `#pragma unroll_loop_start` block could not be parsed.
    #[error("Malformed unroll loop pragma: {0}")]
    MalformedUnrollLoop(String),

    /// The driver rejected a shader at compile or link time.
    ///
    /// `context` carries the numbered source lines surrounding the reported
    /// error line so the failure is diagnosable from the log alone.
    #[error("Program compilation failed: {log}\n{context}")]
    ProgramCompileFailed {
        /// Raw info log from the driver.
        log: String,
        /// Numbered source lines around the error location.
        context: String,
    },

    // ========================================================================
    // Math Errors
    // ========================================================================
    /// A matrix with zero determinant was inverted. Callers fall back to the
    /// identity matrix when they catch this.
    #[error("Cannot invert singular matrix (determinant is zero)")]
    SingularMatrix,

    // ========================================================================
    // Capability & Resource Errors
    // ========================================================================
    /// A requested feature is not available on the current driver.
    #[error("GPU capability not supported: {0}")]
    CapabilityUnsupported(String),

    /// A drawable referenced a geometry/material/texture that is no longer
    /// present in the resource pool.
    #[error("Missing resource: {0}")]
    ResourceMissing(String),
}

/// Alias for `Result<T, PrismError>`.
pub type Result<T> = std::result::Result<T, PrismError>;

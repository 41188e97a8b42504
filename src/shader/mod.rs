//! Shader variant derivation, source assembly and program caching.
//!
//! The pipeline is compiler-shaped: material + object + render-state feature
//! flags flatten into a [`Props`] record, the record hashes into a cache key,
//! and on a pool miss the key's source is assembled textually (chunk include
//! expansion, count substitution, loop unrolling, version prefixing) and
//! handed to the driver's own compiler. Two materials that flatten to the
//! same key always share one refcounted program.

mod cache;
mod chunks;
mod library;
mod preprocess;
mod program;
mod props;

pub use cache::ProgramCache;
pub use chunks::chunk;
pub use library::built_in;
pub use preprocess::assemble;
pub use program::Program;
pub use props::{ObjectContext, Props};

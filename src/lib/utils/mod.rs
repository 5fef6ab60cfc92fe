//! Flat re-exports of the shared helpers under `crate::core`, used by the command layer.

pub use crate::core::concurrency::determine_allowed_cpus;
pub use crate::core::errors::is_broken_pipe;

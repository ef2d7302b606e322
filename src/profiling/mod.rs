//! Optional span profiling for structural-mutation paths.
//!
//! Enabled with `--features profiling`; without the feature every call
//! compiles to a no-op.

pub mod profiler;

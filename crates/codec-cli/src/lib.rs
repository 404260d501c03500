//! File and logging plumbing for the `mips-codec` command-line driver.

/// Input/output helpers and batch processing.
pub mod driver;
/// Minimal stderr logger.
pub mod logger;

// src/lib.rs
// =============================================================================
// Library root. The binary in src/main.rs is a thin wrapper around this:
// everything that scans lives in the `resolver` module.
// =============================================================================

pub mod resolver;

//! Workspace root package. See the crates under `crates/` for the actual
//! Pitwall libraries.

// ── Mdm Teo Atoms Layer ────────────────────────────────────────────────────
// Constants, error types and collaborator traits. No I/O.
// Dependency rule: atoms may only depend on std, mdmteo-core and external
// pure crates. Nothing here may import from engine/ or main.rs.

pub mod constants;
pub mod error;
pub mod traits;

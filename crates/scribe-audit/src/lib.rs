/// Audit logging for the Scribe content pipeline.
///
/// Every top-level generation call — success or failure — produces exactly
/// one durable [`scribe_types::content::GenerationAuditRecord`]. This crate
/// provides the storage backends and the logger that fronts them:
/// - **Storage backends** (`storage`): file (JSON lines), console, memory, null
/// - **Logger** (`logger`): settings-driven backend selection, implements the
///   pipeline's `AuditSink` trait
pub mod error;
pub mod logger;
pub mod storage;

pub use error::AuditError;
pub use logger::AuditLogger;
pub use storage::{AuditQuery, AuditStorage, MemoryStorage};

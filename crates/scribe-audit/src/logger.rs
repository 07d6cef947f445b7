//! Audit logger implementation.
//!
//! A long-lived, explicitly constructed sink instance owned by the process
//! and passed by reference into the pipeline — no lazily-initialized global.

use async_trait::async_trait;
use scribe_types::config::AuditSettings;
use scribe_types::content::GenerationAuditRecord;
use scribe_types::errors::GenerationError;
use scribe_types::traits::AuditSink;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::AuditError;
use crate::storage::{
    AuditQuery, AuditStorage, ConsoleStorage, DualStorage, FileStorage, MemoryStorage, NullStorage,
};

/// The main audit logger.
///
/// Fronts a storage backend chosen from [`AuditSettings`] and implements the
/// pipeline's [`AuditSink`] trait.
pub struct AuditLogger {
    settings: AuditSettings,
    storage: Arc<dyn AuditStorage>,
}

impl AuditLogger {
    /// Create a new audit logger with the given settings.
    pub fn new(settings: AuditSettings) -> Result<Self, AuditError> {
        let storage: Arc<dyn AuditStorage> = if !settings.enabled {
            Arc::new(NullStorage)
        } else {
            let path = Self::resolve_log_path(&settings);
            if settings.stdout {
                Arc::new(DualStorage::new(&path)?)
            } else {
                Arc::new(FileStorage::new(&path)?)
            }
        };

        Ok(Self { settings, storage })
    }

    /// Create a logger with a custom storage backend.
    pub fn with_storage(settings: AuditSettings, storage: Arc<dyn AuditStorage>) -> Self {
        Self { settings, storage }
    }

    /// Create a disabled (no-op) logger.
    pub fn disabled() -> Self {
        Self {
            settings: AuditSettings {
                enabled: false,
                ..Default::default()
            },
            storage: Arc::new(NullStorage),
        }
    }

    /// Create a console-only logger (useful for development).
    pub fn console_only() -> Self {
        Self {
            settings: AuditSettings {
                enabled: true,
                stdout: true,
                ..Default::default()
            },
            storage: Arc::new(ConsoleStorage),
        }
    }

    /// Create an in-memory logger (useful for tests).
    pub fn in_memory() -> Self {
        Self {
            settings: AuditSettings::default(),
            storage: Arc::new(MemoryStorage::new()),
        }
    }

    /// Resolve the log file path from settings.
    fn resolve_log_path(settings: &AuditSettings) -> PathBuf {
        let mut path = PathBuf::from(&settings.directory);
        path.push("generation_audit.log");
        path
    }

    /// Check if logging is enabled.
    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    /// Query stored records with filters.
    pub async fn query(
        &self,
        query: AuditQuery,
    ) -> Result<Vec<GenerationAuditRecord>, AuditError> {
        self.storage.query(query).await
    }

    /// Get recent records for a tenant.
    pub async fn recent_for_tenant(
        &self,
        tenant_id: &str,
        limit: usize,
    ) -> Result<Vec<GenerationAuditRecord>, AuditError> {
        self.query(AuditQuery {
            tenant_id: Some(tenant_id.to_string()),
            limit: Some(limit),
            ..Default::default()
        })
        .await
    }
}

#[async_trait]
impl AuditSink for AuditLogger {
    async fn insert(&self, record: GenerationAuditRecord) -> Result<(), GenerationError> {
        if !self.settings.enabled {
            return Ok(());
        }

        tracing::debug!(
            record_id = %record.id,
            tenant = %record.tenant_id,
            capability = %record.capability,
            success = record.success,
            duration_ms = record.duration_ms,
            "generation audit record"
        );

        self.storage
            .store(record)
            .await
            .map_err(|e| GenerationError::Audit(e.to_string()))
    }
}

//! Audit storage backends.

use async_trait::async_trait;
use scribe_types::content::{Capability, GenerationAuditRecord};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::AuditError;

/// Filter for querying stored audit records.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Filter by tenant ID.
    pub tenant_id: Option<String>,
    /// Filter by capability.
    pub capability: Option<Capability>,
    /// Filter by success flag.
    pub success: Option<bool>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

/// Trait for audit storage backends.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Append an audit record.
    async fn store(&self, record: GenerationAuditRecord) -> Result<(), AuditError>;

    /// Query stored records with filters. Read-only.
    async fn query(&self, query: AuditQuery) -> Result<Vec<GenerationAuditRecord>, AuditError>;

    /// Get a record by ID.
    async fn get(&self, id: Uuid) -> Result<Option<GenerationAuditRecord>, AuditError>;
}

fn matches(record: &GenerationAuditRecord, query: &AuditQuery) -> bool {
    if let Some(ref tenant) = query.tenant_id {
        if &record.tenant_id != tenant {
            return false;
        }
    }
    if let Some(capability) = query.capability {
        if record.capability != capability {
            return false;
        }
    }
    if let Some(success) = query.success {
        if record.success != success {
            return false;
        }
    }
    true
}

fn filter_records(
    records: &[GenerationAuditRecord],
    query: &AuditQuery,
) -> Vec<GenerationAuditRecord> {
    let mut results: Vec<_> = records
        .iter()
        .filter(|r| matches(r, query))
        .cloned()
        .collect();
    if let Some(limit) = query.limit {
        results.truncate(limit);
    }
    results
}

/// Console storage (writes each record as one JSON line to stdout).
pub struct ConsoleStorage;

#[async_trait]
impl AuditStorage for ConsoleStorage {
    async fn store(&self, record: GenerationAuditRecord) -> Result<(), AuditError> {
        let json = serde_json::to_string(&record)?;
        println!("{json}");
        Ok(())
    }

    async fn query(&self, _query: AuditQuery) -> Result<Vec<GenerationAuditRecord>, AuditError> {
        // Console storage doesn't support querying.
        Ok(vec![])
    }

    async fn get(&self, _id: Uuid) -> Result<Option<GenerationAuditRecord>, AuditError> {
        Ok(None)
    }
}

/// No-op storage for disabled audit logging.
pub struct NullStorage;

#[async_trait]
impl AuditStorage for NullStorage {
    async fn store(&self, _record: GenerationAuditRecord) -> Result<(), AuditError> {
        Ok(())
    }

    async fn query(&self, _query: AuditQuery) -> Result<Vec<GenerationAuditRecord>, AuditError> {
        Ok(vec![])
    }

    async fn get(&self, _id: Uuid) -> Result<Option<GenerationAuditRecord>, AuditError> {
        Ok(None)
    }
}

/// In-memory storage, used in tests and for ephemeral deployments.
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<Vec<GenerationAuditRecord>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditStorage for MemoryStorage {
    async fn store(&self, record: GenerationAuditRecord) -> Result<(), AuditError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| AuditError::Storage(format!("failed to acquire write lock: {e}")))?;
        records.push(record);
        Ok(())
    }

    async fn query(&self, query: AuditQuery) -> Result<Vec<GenerationAuditRecord>, AuditError> {
        let records = self
            .records
            .read()
            .map_err(|e| AuditError::Storage(format!("failed to acquire read lock: {e}")))?;
        Ok(filter_records(&records, &query))
    }

    async fn get(&self, id: Uuid) -> Result<Option<GenerationAuditRecord>, AuditError> {
        let records = self
            .records
            .read()
            .map_err(|e| AuditError::Storage(format!("failed to acquire read lock: {e}")))?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }
}

/// File storage (appends one JSON line per record).
///
/// Keeps an in-memory copy of records written through this instance so
/// queries don't re-parse the file.
pub struct FileStorage {
    path: PathBuf,
    records: RwLock<Vec<GenerationAuditRecord>>,
}

impl FileStorage {
    /// Create a file storage backend, creating parent directories as needed.
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            records: RwLock::new(Vec::new()),
        })
    }

    /// The file records are appended to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditStorage for FileStorage {
    async fn store(&self, record: GenerationAuditRecord) -> Result<(), AuditError> {
        let json = serde_json::to_string(&record)?;

        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{json}")?;

        let mut records = self
            .records
            .write()
            .map_err(|e| AuditError::Storage(format!("failed to acquire write lock: {e}")))?;
        records.push(record);
        Ok(())
    }

    async fn query(&self, query: AuditQuery) -> Result<Vec<GenerationAuditRecord>, AuditError> {
        let records = self
            .records
            .read()
            .map_err(|e| AuditError::Storage(format!("failed to acquire read lock: {e}")))?;
        Ok(filter_records(&records, &query))
    }

    async fn get(&self, id: Uuid) -> Result<Option<GenerationAuditRecord>, AuditError> {
        let records = self
            .records
            .read()
            .map_err(|e| AuditError::Storage(format!("failed to acquire read lock: {e}")))?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }
}

/// Dual storage: durable file plus console mirror.
pub struct DualStorage {
    file: FileStorage,
    console: ConsoleStorage,
}

impl DualStorage {
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        Ok(Self {
            file: FileStorage::new(path)?,
            console: ConsoleStorage,
        })
    }
}

#[async_trait]
impl AuditStorage for DualStorage {
    async fn store(&self, record: GenerationAuditRecord) -> Result<(), AuditError> {
        self.console.store(record.clone()).await?;
        self.file.store(record).await
    }

    async fn query(&self, query: AuditQuery) -> Result<Vec<GenerationAuditRecord>, AuditError> {
        self.file.query(query).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<GenerationAuditRecord>, AuditError> {
        self.file.get(id).await
    }
}

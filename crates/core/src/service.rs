//! Archive packaging service.
//!
//! [`ExportService`] drives a full export cycle: for every configured questionnaire it writes
//! the table to disk, reads it back, and adds it to an in-memory ZIP archive. Each export
//! works in its own directory under the export root, named by a random UUID, and that
//! directory is removed once the archive is built.

use crate::archive::{archive_file_name, ArchiveBuilder, ExportArchive};
use crate::config::{ExportConfig, QuestionnaireSpec};
use crate::source::InterviewSource;
use crate::table::write_table;
use crate::{ExportError, ExportResult};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Export pipeline over a data source. Cheap to clone; share one per process.
#[derive(Clone)]
pub struct ExportService {
    cfg: Arc<ExportConfig>,
    source: Arc<dyn InterviewSource>,
}

impl ExportService {
    pub fn new(cfg: Arc<ExportConfig>, source: Arc<dyn InterviewSource>) -> Self {
        Self { cfg, source }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.cfg
    }

    /// Write a single table to `<base>.csv`, honouring the configured query timeout.
    pub async fn write_table(&self, spec: &QuestionnaireSpec, base: &Path) -> ExportResult<PathBuf> {
        write_table(self.source.as_ref(), spec, base, self.cfg.query_timeout()).await
    }

    /// Run a full export and return the packaged archive.
    ///
    /// Tables are written strictly one after another in configured order. Any failure aborts
    /// the export; no partial archive is returned.
    ///
    /// # Errors
    /// Returns an `ExportError` if:
    /// - the working directory cannot be created,
    /// - any table fails to query, project, write or read back,
    /// - the archive cannot be built.
    pub async fn export_archive(&self) -> ExportResult<ExportArchive> {
        let work_dir = self
            .cfg
            .export_root()
            .join(Uuid::new_v4().simple().to_string());

        tokio::fs::create_dir_all(&work_dir)
            .await
            .map_err(ExportError::StorageDirCreation)?;

        let result = self.package_tables(&work_dir).await;

        if let Err(e) = tokio::fs::remove_dir_all(&work_dir).await {
            tracing::warn!(
                "failed to remove export working directory {}: {}",
                work_dir.display(),
                e
            );
        }

        let bytes = result?;
        let archive = ExportArchive {
            file_name: archive_file_name(&Local::now()),
            bytes,
        };

        tracing::info!(
            "built export archive {} ({} bytes)",
            archive.file_name,
            archive.bytes.len()
        );

        Ok(archive)
    }

    async fn package_tables(&self, work_dir: &Path) -> ExportResult<Vec<u8>> {
        let mut builder = ArchiveBuilder::new()?;

        for spec in self.cfg.questionnaires() {
            let path = self.write_table(spec, &work_dir.join(spec.id.as_str())).await?;
            let contents = tokio::fs::read(&path).await.map_err(ExportError::FileRead)?;

            let entry_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    ExportError::InvalidInput(format!(
                        "export file name is not valid UTF-8: {}",
                        path.display()
                    ))
                })?;
            builder.add_file(entry_name, &contents)?;
        }

        builder.finish()
    }
}

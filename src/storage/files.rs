use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Export documents on disk, laid out as `<root>/exports/<analysis_id>/<filename>`.
#[derive(Debug, Clone)]
pub struct ExportStore {
    root: PathBuf,
}

impl ExportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn analysis_dir(&self, analysis_id: Uuid) -> PathBuf {
        self.root.join("exports").join(analysis_id.to_string())
    }

    pub fn path_for(&self, analysis_id: Uuid, filename: &str) -> Result<PathBuf> {
        let name = Path::new(filename);
        if name.file_name().map(|n| n != name.as_os_str()).unwrap_or(true) {
            return Err(Error::InvalidInput(format!("invalid export filename '{}'", filename)));
        }
        Ok(self.analysis_dir(analysis_id).join(name))
    }

    /// Write through a temporary file so readers never see a partial document.
    pub async fn write(&self, analysis_id: Uuid, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(analysis_id, filename)?;
        fs::create_dir_all(self.analysis_dir(analysis_id)).await?;

        let tmp = path.with_extension(format!(
            "{}.tmp",
            path.extension().and_then(|e| e.to_str()).unwrap_or_default()
        ));
        fs::write(&tmp, bytes).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote export file");
        Ok(path)
    }

    /// File contents, or `None` if the file is gone.
    pub async fn read(&self, analysis_id: Uuid, filename: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(analysis_id, filename)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove_analysis(&self, analysis_id: Uuid) -> Result<()> {
        match fs::remove_dir_all(self.analysis_dir(analysis_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

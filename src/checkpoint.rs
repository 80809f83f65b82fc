use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::index::ReviewIndex;
use crate::Result;

/// Snapshot of scrape progress on disk, stored as JSON.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the snapshot. Readers see either the old or the new file, never a partial one.
    pub async fn save(&self, index: &ReviewIndex) -> Result<()> {
        let bytes = serde_json::to_vec(index)?;
        let tmp_path = self.temp_path();

        let write_result = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp_path, &self.path).await
        }
        .await;

        if write_result.is_err() {
            let _ = fs::remove_file(&tmp_path).await;
        }
        Ok(write_result?)
    }

    /// Loads the snapshot, or `None` when no checkpoint has been written yet.
    pub async fn load(&self) -> Result<Option<ReviewIndex>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".tmp.{}", std::process::id()));
        self.path.with_file_name(name)
    }
}

//! Plan persistence.
//!
//! The plan file is the only state kubeplan keeps. Writes always replace the
//! whole file: the new document goes to a sibling temp file which is then
//! renamed over the original.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{KubeplanError, PlanError, Result};

use super::parser::PlanParser;
use super::spec::Plan;

/// Trait for plan storage backends.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Loads the plan.
    ///
    /// Returns `None` if no plan exists yet.
    async fn load(&self) -> Result<Option<Plan>>;

    /// Saves the plan, replacing any previous version.
    async fn save(&self, plan: &Plan) -> Result<()>;

    /// Checks if a plan exists.
    async fn exists(&self) -> Result<bool>;

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}

/// YAML plan file on the local filesystem.
#[derive(Debug)]
pub struct FilePlanStore {
    /// Path to the plan file.
    path: PathBuf,
    /// Parser used for both directions.
    parser: PlanParser,
}

impl FilePlanStore {
    /// Creates a store for the plan file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            parser: PlanParser::new(),
        }
    }

    /// Returns the plan file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the plan, failing if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or invalid.
    pub async fn load_required(&self) -> Result<Plan> {
        self.load().await?.ok_or_else(|| {
            KubeplanError::Plan(PlanError::FileNotFound {
                path: self.path.clone(),
            })
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating plan directory: {}", parent.display());
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| PlanError::write_failed(parent, e.to_string()))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PlanStore for FilePlanStore {
    async fn load(&self) -> Result<Option<Plan>> {
        if !self.path.exists() {
            debug!("Plan file does not exist: {}", self.path.display());
            return Ok(None);
        }

        info!("Loading plan from: {}", self.path.display());
        debug!("Plan backend: {}", self.backend_type());

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            KubeplanError::Plan(PlanError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(self.path.display().to_string()),
            })
        })?;

        self.parser.parse_yaml(&content, Some(&self.path)).map(Some)
    }

    async fn save(&self, plan: &Plan) -> Result<()> {
        self.ensure_parent().await?;

        info!("Writing plan to: {}", self.path.display());
        debug!("Plan backend: {}", self.backend_type());

        let content = PlanParser::to_yaml(plan)?;
        let temp_path = self.temp_path();

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| PlanError::write_failed(&temp_path, e.to_string()))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| PlanError::write_failed(&temp_path, e.to_string()))?;

        file.sync_all()
            .await
            .map_err(|e| PlanError::write_failed(&temp_path, e.to_string()))?;

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| PlanError::write_failed(&self.path, e.to_string()))?;

        debug!("Plan written successfully");
        Ok(())
    }

    async fn exists(&self) -> Result<bool> {
        Ok(self.path.exists())
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}

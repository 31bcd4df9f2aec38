//! Execution context for provisioner runs.
//!
//! Every path a provisioning run touches is derived from an explicit base
//! directory carried here, so nothing ever changes the process working
//! directory.

use std::path::PathBuf;
use tracing::debug;

use crate::error::{KubeplanError, Result};

/// File name of the provisioner variables written for each cluster.
pub const TFVARS_FILE: &str = "terraform.tfvars.json";

/// Directory layout for one cluster's provisioning state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Root directory holding `terraform/clusters` and `terraform/providers`.
    base_dir: PathBuf,
    /// Cluster the context belongs to.
    cluster_name: String,
}

impl ExecutionContext {
    /// Creates a context rooted at `base_dir` for `cluster_name`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>, cluster_name: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cluster_name: cluster_name.into(),
        }
    }

    /// Directory holding the cluster's provisioner state.
    #[must_use]
    pub fn cluster_dir(&self) -> PathBuf {
        self.base_dir
            .join("terraform")
            .join("clusters")
            .join(&self.cluster_name)
    }

    /// Directory holding the provider's provisioner definitions.
    #[must_use]
    pub fn provider_dir(&self, provider: &str) -> PathBuf {
        self.base_dir.join("terraform").join("providers").join(provider)
    }

    /// Path of the provisioner variables file.
    #[must_use]
    pub fn tfvars_path(&self) -> PathBuf {
        self.cluster_dir().join(TFVARS_FILE)
    }

    /// Path of the rendered plan for this cluster.
    #[must_use]
    pub fn plan_path(&self) -> PathBuf {
        self.cluster_dir().join(format!("{}.yaml", self.cluster_name))
    }

    /// Creates the cluster directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn ensure_cluster_dir(&self) -> Result<PathBuf> {
        let dir = self.cluster_dir();
        if !dir.exists() {
            debug!("Creating cluster state directory: {}", dir.display());
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                KubeplanError::internal(format!(
                    "Failed to create cluster state directory {}: {e}",
                    dir.display()
                ))
            })?;
        }
        Ok(dir)
    }
}

//! Plan parsing and rendering.
//!
//! This module turns plan text into a [`Plan`] and back, and loads the
//! `.env` file that usually carries provider credentials next to a plan.

use crate::error::{KubeplanError, PlanError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::Plan;

/// Parser for plan documents.
#[derive(Debug, Default)]
pub struct PlanParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
}

impl PlanParser {
    /// Creates a new plan parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path used to find the `.env` file.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Parses a plan from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or does not describe a plan.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<Plan> {
        debug!("Parsing plan YAML");

        let plan: Plan = serde_yaml::from_str(content).map_err(|e| {
            KubeplanError::Plan(PlanError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })?;

        debug!("Parsed plan for cluster: {}", plan.cluster.name);
        Ok(plan)
    }

    /// Renders a plan as YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan cannot be serialized.
    pub fn to_yaml(plan: &Plan) -> Result<String> {
        serde_yaml::to_string(plan)
            .map_err(|e| KubeplanError::Plan(PlanError::serialization(e.to_string())))
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                KubeplanError::Plan(PlanError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

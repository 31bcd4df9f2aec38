//! Error types for the kubeplan system.
//!
//! This module provides the error hierarchy for every stage of a plan's
//! lifecycle: loading and persisting the plan, validating it, preparing
//! provisioner inputs, and reconciling provisioner output back into it.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for kubeplan.
#[derive(Debug, Error)]
pub enum KubeplanError {
    /// Plan document errors.
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// The plan failed validation.
    #[error("Plan validation failed with {count} error(s)")]
    Validation {
        /// Number of validation errors reported.
        count: usize,
    },

    /// Reconciliation errors.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Provisioner input errors.
    #[error("Provisioner error: {0}")]
    Provision(#[from] ProvisionError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors reading, parsing, or writing a plan document.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan file was not found.
    #[error("Plan file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The plan file already exists and overwriting was not requested.
    #[error("Plan file already exists: {path}")]
    AlreadyExists {
        /// Path to the existing file.
        path: PathBuf,
    },

    /// The plan could not be parsed.
    #[error("Failed to parse plan: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// The plan could not be serialized.
    #[error("Failed to serialize plan: {message}")]
    SerializationError {
        /// Description of the serialization error.
        message: String,
    },

    /// The plan could not be written to disk.
    #[error("Failed to write plan to {path}: {message}")]
    WriteFailed {
        /// Destination path.
        path: PathBuf,
        /// Description of the write failure.
        message: String,
    },
}

/// Errors raised while merging provisioner output into a plan.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// An output variable the reconciler needs was not produced.
    #[error("Provisioner output '{variable}' is missing")]
    MissingOutput {
        /// Name of the missing output variable.
        variable: String,
    },

    /// An output variable could not be decoded.
    #[error("Provisioner output '{variable}' is malformed: {message}")]
    MalformedOutput {
        /// Name of the output variable (or `*` for the whole document).
        variable: String,
        /// Description of the decode failure.
        message: String,
    },

    /// The parallel output sequences for a role disagree in length.
    #[error(
        "Provisioner output for {role} is inconsistent: expected {expected} {sequence}, found {actual}"
    )]
    OutputLengthMismatch {
        /// Role whose output is inconsistent.
        role: String,
        /// Which sequence had the wrong length.
        sequence: String,
        /// Length implied by the public IP sequence.
        expected: usize,
        /// Length actually found.
        actual: usize,
    },

    /// The provisioner reported a different node count than the plan expects.
    #[error(
        "Cluster mutations are not supported: {role} expects {expected} node(s) but the provisioner reported {actual}"
    )]
    MutationUnsupported {
        /// Role whose count differs.
        role: String,
        /// Count recorded in the plan.
        expected: u32,
        /// Count reported by the provisioner.
        actual: usize,
    },
}

/// Errors preparing inputs for the external provisioner.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// A required credential is not set.
    #[error("Missing environment variable: {name}")]
    MissingCredential {
        /// Name of the missing variable.
        name: String,
    },

    /// An SSH key file could not be read.
    #[error("Failed to read SSH key {path}: {message}")]
    KeyUnreadable {
        /// Path to the key file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// Provisioner variables could not be written.
    #[error("Failed to write provisioner variables to {path}: {message}")]
    VariablesWriteFailed {
        /// Destination path.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The external provisioner could not produce an output value.
    #[error("Failed to collect provisioner output '{variable}': {message}")]
    OutputUnavailable {
        /// Requested output variable.
        variable: String,
        /// Message reported by the collaborator.
        message: String,
    },
}

/// Result type alias for kubeplan operations.
pub type Result<T> = std::result::Result<T, KubeplanError>;

impl KubeplanError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if the error means the in-memory plan must be discarded.
    ///
    /// Reconciliation does not roll back roles it already updated, so a plan
    /// that hit a reconciliation error is never safe to persist.
    #[must_use]
    pub const fn taints_plan(&self) -> bool {
        matches!(self, Self::Reconcile(_))
    }
}

impl PlanError {
    /// Creates a parse error without a source location.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
            location: None,
        }
    }

    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Creates a write error for the given path.
    #[must_use]
    pub fn write_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl ReconcileError {
    /// Creates a malformed output error.
    #[must_use]
    pub fn malformed(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedOutput {
            variable: variable.into(),
            message: message.into(),
        }
    }

    /// Creates a missing output error.
    #[must_use]
    pub fn missing(variable: impl Into<String>) -> Self {
        Self::MissingOutput {
            variable: variable.into(),
        }
    }
}

//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// kubeplan - Kubernetes cluster plan validation and reconciliation.
#[derive(Parser, Debug)]
#[command(name = "kubeplan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the plan file.
    #[arg(short, long, global = true, env = "KUBEPLAN_PLAN", default_value = "kubeplan.yaml")]
    pub plan: PathBuf,

    /// Directory holding the provisioner's `terraform/` tree.
    #[arg(long, global = true, env = "KUBEPLAN_BASE_DIR", default_value = ".")]
    pub base_dir: PathBuf,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a templated plan ready for provisioning.
    Init {
        /// Cluster name.
        #[arg(long)]
        name: String,

        /// Number of etcd nodes.
        #[arg(long, default_value = "1")]
        etcd: u32,

        /// Number of master nodes.
        #[arg(long, default_value = "1")]
        master: u32,

        /// Number of worker nodes.
        #[arg(long, default_value = "1")]
        worker: u32,

        /// Number of ingress nodes.
        #[arg(long, default_value = "1")]
        ingress: u32,

        /// Number of storage nodes.
        #[arg(long, default_value = "1")]
        storage: u32,

        /// Force overwrite an existing plan.
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the plan before provisioning.
    Validate,

    /// Write the provisioner variables file for the plan.
    Tfvars {
        /// Public half of the cluster SSH key.
        #[arg(long)]
        public_key: PathBuf,

        /// Private half of the cluster SSH key.
        #[arg(long)]
        private_key: PathBuf,
    },

    /// Merge captured provisioner output into the plan.
    Reconcile {
        /// File holding `terraform output -json`.
        #[arg(long)]
        outputs: PathBuf,

        /// Private key to record in the plan's SSH settings.
        #[arg(long)]
        private_key: PathBuf,
    },

    /// Show the plan's nodes.
    Show,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # kubeplan
//!
//! Plan validation and provisioner reconciliation for Kubernetes clusters
//! built on AWS through an external Terraform-style provisioner.
//!
//! ## Overview
//!
//! A plan file describes a cluster: its name, SSH settings, the provisioner
//! to use, and five node groups (etcd, master, worker, ingress, storage).
//! Before provisioning, node fields hold placeholder tokens such as
//! `${worker_host_2}`. kubeplan lets you:
//!
//! - Validate a plan before anything is provisioned, reporting every
//!   problem at once
//! - Write the provisioner's input variables from the plan and environment
//! - Merge the provisioner's per-role output back into the plan
//!
//! ## Modules
//!
//! - [`plan`]: Plan model, placeholder tokens, validation, and persistence
//! - [`provision`]: Provisioner variables, output decoding, and reconciliation
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! cluster:
//!   name: dev
//!   ssh:
//!     user: ubuntu
//!     ssh_key: ""
//!     ssh_port: 22
//! provisioner:
//!   provider: aws
//!   options:
//!     region: us-east-1
//!     instance_type: t2.medium
//! master:
//!   expected_count: 1
//!   load_balanced_fqdn: "${load_balanced_fqdn}"
//!   load_balanced_short_name: "${load_balanced_short_name}"
//!   nodes:
//!     - host: "${master_host_1}"
//!       ip: "${master_pub_ip_1}"
//!       internal_ip: "${master_priv_ip_1}"
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod error;
pub mod plan;
pub mod provision;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use error::{KubeplanError, Result};
pub use plan::{FilePlanStore, Plan, PlanParser, PlanStore, PlanValidator, ValidationResult};
pub use provision::{ExecutionContext, OutputSource, ProvisionerOutputs, Reconciler};

//! Provisioning module.
//!
//! This module sits between a plan and the external infrastructure
//! provisioner:
//! - Preparing the provisioner's input variables
//! - Decoding the provisioner's per-role output
//! - Reconciling that output back into the plan

mod context;
mod output;
mod source;
mod aws;
mod reconciler;

pub use context::{ExecutionContext, TFVARS_FILE};
pub use output::{ProvisionedNode, ProvisionerOutputs, RoleOutput, TerraformOutput};
pub use source::OutputSource;
pub use aws::{
    default_ssh_user, AwsCredentials, AwsTerraformVariables, SshKeyPair, CUSTOM_IMAGE_USER,
    STOCK_IMAGE_USER,
};
pub use reconciler::{ReconcileSummary, Reconciler};

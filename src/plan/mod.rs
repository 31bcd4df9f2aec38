//! Cluster plan module.
//!
//! This module holds everything about the plan document itself:
//! - The typed plan model and its placeholder tokens
//! - Pre-provisioning validation
//! - Parsing, rendering, and persisting plan files

mod spec;
mod placeholder;
mod instance;
mod validator;
mod parser;
mod store;

pub use spec::{
    AwsOptions, ClusterConfig, MasterNodeGroup, Node, NodeGroup, Plan, ProvisionerConfig, Role,
    RoleCounts, SshConfig,
};
pub use placeholder::{
    host_token, is_host_token, is_private_ip_token, is_public_ip_token, private_ip_token,
    public_ip_token, LOAD_BALANCED_FQDN_TOKEN, LOAD_BALANCED_SHORT_NAME_TOKEN,
};
pub use instance::{is_valid_instance_type, known_instance_types};
pub use validator::{
    failing_scopes, PlanValidator, ProviderEnvironment, RoleRequirement, ValidationError,
    ValidationResult, AWS_CREDENTIAL_VARS, SUPPORTED_PROVIDERS,
};
pub use parser::PlanParser;
pub use store::{FilePlanStore, PlanStore};

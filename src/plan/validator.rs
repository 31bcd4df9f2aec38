//! Pre-provisioning validation of cluster plans.
//!
//! The validator walks a templated plan and collects every problem it finds
//! instead of stopping at the first one, so a user can fix a plan in a single
//! edit. Rule families run in a fixed order: provisioner, duplicate nodes,
//! per-role cardinality and node format, then the master load balancer.

use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

use super::instance::is_valid_instance_type;
use super::placeholder::{
    is_host_token, is_private_ip_token, is_public_ip_token, HOST_PATTERN,
    LOAD_BALANCED_FQDN_TOKEN, LOAD_BALANCED_SHORT_NAME_TOKEN, PRIVATE_IP_PATTERN,
    PUBLIC_IP_PATTERN,
};
use super::spec::{MasterNodeGroup, Node, NodeGroup, Plan, ProvisionerConfig, Role};

/// Providers the provisioner knows how to drive.
pub const SUPPORTED_PROVIDERS: &[&str] = &["aws"];

/// Environment variables the AWS provider needs.
pub const AWS_CREDENTIAL_VARS: &[&str] =
    &["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_DEFAULT_REGION"];

/// Whether a role must have nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleRequirement {
    /// At least one node is required.
    #[default]
    Mandatory,
    /// The role may be left out entirely.
    Optional,
}

/// A snapshot of environment variables the validator consults.
#[derive(Debug, Clone, Default)]
pub struct ProviderEnvironment {
    vars: HashMap<String, String>,
}

/// Validator for cluster plans.
#[derive(Debug, Default)]
pub struct PlanValidator {
    /// Per-role requirement overrides.
    requirements: HashMap<Role, RoleRequirement>,
    /// Environment used for credential checks.
    environment: ProviderEnvironment,
}

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Errors in the order they were found.
    pub errors: Vec<ValidationError>,
}

/// A single validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Where the error was found, outermost first (e.g. "Master nodes: Node #2").
    pub scope: Option<String>,
    /// The error message.
    pub message: String,
}

impl ProviderEnvironment {
    /// Captures the provider variables from the process environment.
    #[must_use]
    pub fn from_process() -> Self {
        Self::from_pairs(
            AWS_CREDENTIAL_VARS
                .iter()
                .filter_map(|name| std::env::var(name).ok().map(|value| (*name, value))),
        )
    }

    /// Builds an environment from explicit key/value pairs.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns a variable's value if it is set and non-empty.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

impl PlanValidator {
    /// Creates a validator that reads credentials from the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default().with_environment(ProviderEnvironment::from_process())
    }

    /// Replaces the environment used for credential checks.
    #[must_use]
    pub fn with_environment(mut self, environment: ProviderEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Sets the requirement for a role.
    #[must_use]
    pub fn with_requirement(mut self, role: Role, requirement: RoleRequirement) -> Self {
        self.requirements.insert(role, requirement);
        self
    }

    /// Returns the requirement configured for a role.
    #[must_use]
    pub fn requirement(&self, role: Role) -> RoleRequirement {
        self.requirements.get(&role).copied().unwrap_or_default()
    }

    /// Validates a plan before provisioning.
    #[must_use]
    pub fn validate(&self, plan: &Plan) -> ValidationResult {
        let mut result = ValidationResult::default();

        result.extend("Provisioner", self.validate_provisioner(&plan.provisioner));
        result.extend("Nodes", validate_no_duplicates(plan));

        for role in [Role::Etcd, Role::Master, Role::Worker, Role::Ingress, Role::Storage] {
            let errors = if role == Role::Master {
                self.validate_master(&plan.master)
            } else {
                self.validate_group(role, plan.group(role))
            };
            result.extend(role.label(), errors);
        }

        if result.is_valid() {
            debug!("Plan validation passed");
        } else {
            debug!("Plan validation found {} error(s)", result.error_count());
        }
        result
    }

    /// Checks the provider identifier, credentials, and instance type.
    fn validate_provisioner(&self, provisioner: &ProvisionerConfig) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if provisioner.provider.is_empty() {
            errors.push(ValidationError::new("Provisioner provider cannot be empty"));
            return errors;
        }

        if !SUPPORTED_PROVIDERS.contains(&provisioner.provider.as_str()) {
            errors.push(ValidationError::new(format!(
                "\"{}\" is not a valid provisioner provider. Options are {SUPPORTED_PROVIDERS:?}",
                provisioner.provider
            )));
        }

        if provisioner.provider == "aws" {
            for var in AWS_CREDENTIAL_VARS {
                if self.environment.get(var).is_none() {
                    errors.push(ValidationError::new(format!("{var} not found")));
                }
            }

            let instance_type = &provisioner.options.instance_type;
            if !is_valid_instance_type(instance_type) {
                errors.push(ValidationError::new(format!(
                    "\"{instance_type}\" is not a valid EC2 instance type"
                )));
            }
        }

        errors
    }

    /// Checks a role's node count and every node in it.
    fn validate_group(&self, role: Role, group: &NodeGroup) -> Vec<ValidationError> {
        match self.requirement(role) {
            RoleRequirement::Mandatory => validate_mandatory_group(group),
            RoleRequirement::Optional => validate_optional_group(group),
        }
    }

    /// Checks the master group, then its load balancer fields.
    fn validate_master(&self, master: &MasterNodeGroup) -> Vec<ValidationError> {
        let mut errors = self.validate_group(Role::Master, &master.group);

        if master.load_balanced_fqdn != LOAD_BALANCED_FQDN_TOKEN {
            errors.push(ValidationError::new(format!(
                "Load balanced FQDN is not a valid templated string, should be '{LOAD_BALANCED_FQDN_TOKEN}'"
            )));
        }

        if master.load_balanced_short_name != LOAD_BALANCED_SHORT_NAME_TOKEN {
            errors.push(ValidationError::new(format!(
                "Load balanced short name is not a valid templated string, should be '{LOAD_BALANCED_SHORT_NAME_TOKEN}'"
            )));
        }

        errors
    }
}

fn validate_mandatory_group(group: &NodeGroup) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let actual = group.nodes.len();

    if actual == 0 {
        errors.push(ValidationError::new("At least one node is required"));
    }
    if group.expected_count == 0 {
        errors.push(ValidationError::new("Node count must be greater than 0"));
    }
    if actual > 0 && group.expected_count > 0 && !count_matches(group) {
        errors.push(count_mismatch(group));
    }

    for (i, node) in group.nodes.iter().enumerate() {
        let scope = format!("Node #{}", i + 1);
        errors.extend(
            validate_node(node)
                .into_iter()
                .map(|e| e.with_prefix(&scope)),
        );
    }

    errors
}

fn validate_optional_group(group: &NodeGroup) -> Vec<ValidationError> {
    if group.is_absent() {
        return Vec::new();
    }
    if !count_matches(group) {
        return vec![count_mismatch(group)];
    }
    validate_mandatory_group(group)
}

fn count_matches(group: &NodeGroup) -> bool {
    usize::try_from(group.expected_count).is_ok_and(|expected| expected == group.nodes.len())
}

fn count_mismatch(group: &NodeGroup) -> ValidationError {
    ValidationError::new(format!(
        "Expected node count ({}) does not match the number of nodes provided ({})",
        group.expected_count,
        group.nodes.len()
    ))
}

/// Checks that every node field is a placeholder of the right family.
fn validate_node(node: &Node) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !is_host_token(&node.host) {
        errors.push(ValidationError::new(format!(
            "\"{}\" is not a valid host templated string, should match '{HOST_PATTERN}'",
            node.host
        )));
    }
    if !is_public_ip_token(&node.ip) {
        errors.push(ValidationError::new(format!(
            "\"{}\" is not a valid IP templated string, should match '{PUBLIC_IP_PATTERN}'",
            node.ip
        )));
    }
    // Private addressing is optional per node.
    if !node.internal_ip.is_empty() && !is_private_ip_token(&node.internal_ip) {
        errors.push(ValidationError::new(format!(
            "\"{}\" is not a valid InternalIP templated string, should match '{PRIVATE_IP_PATTERN}'",
            node.internal_ip
        )));
    }

    errors
}

/// Checks that no host, public IP, or private IP value is used twice across
/// all roles.
fn validate_no_duplicates(plan: &Plan) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut hosts: HashMap<&str, NodeRef> = HashMap::new();
    let mut ips: HashMap<&str, NodeRef> = HashMap::new();
    let mut internal_ips: HashMap<&str, NodeRef> = HashMap::new();

    for (role, index, node) in plan.all_nodes() {
        let here = NodeRef { role, index };
        check_duplicate(&mut hosts, "host", &node.host, here, &mut errors);
        check_duplicate(&mut ips, "IP", &node.ip, here, &mut errors);
        if !node.internal_ip.is_empty() {
            check_duplicate(&mut internal_ips, "internal IP", &node.internal_ip, here, &mut errors);
        }
    }

    errors
}

fn check_duplicate<'a>(
    seen: &mut HashMap<&'a str, NodeRef>,
    field: &str,
    value: &'a str,
    here: NodeRef,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(first) = seen.get(value) {
        errors.push(ValidationError::new(format!(
            "Duplicate {field} \"{value}\" on {first} and {here}"
        )));
    } else {
        seen.insert(value, here);
    }
}

/// Identifies a node by role and 0-based position.
#[derive(Debug, Clone, Copy)]
struct NodeRef {
    role: Role,
    index: usize,
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} node #{}", self.role, self.index + 1)
    }
}

impl ValidationError {
    /// Creates an unscoped error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            scope: None,
            message: message.into(),
        }
    }

    /// Nests the error under `prefix`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.scope = Some(match self.scope.take() {
            Some(inner) => format!("{prefix}: {inner}"),
            None => prefix.to_string(),
        });
        self
    }
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the errors whose scope starts with `prefix`.
    #[must_use]
    pub fn errors_in(&self, prefix: &str) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.scope.as_deref().is_some_and(|s| s.starts_with(prefix)))
            .collect()
    }

    fn extend(&mut self, prefix: &str, errors: Vec<ValidationError>) {
        self.errors
            .extend(errors.into_iter().map(|e| e.with_prefix(prefix)));
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{scope}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Collects the distinct scopes that reported errors, in first-seen order.
#[must_use]
pub fn failing_scopes(result: &ValidationResult) -> Vec<String> {
    let mut seen = HashSet::new();
    result
        .errors
        .iter()
        .filter_map(|e| e.scope.clone())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::spec::RoleCounts;

    fn aws_env() -> ProviderEnvironment {
        ProviderEnvironment::from_pairs([
            ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_DEFAULT_REGION", "us-east-1"),
        ])
    }

    fn validator() -> PlanValidator {
        PlanValidator::default().with_environment(aws_env())
    }

    fn plan() -> Plan {
        let counts = RoleCounts {
            master: 3,
            worker: 2,
            ..RoleCounts::default()
        };
        let mut plan = Plan::templated("test", counts);
        plan.provisioner.options.instance_type = String::from("m4.xlarge");
        plan
    }

    fn messages(result: &ValidationResult) -> Vec<String> {
        result.errors.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_templated_plan_is_valid() {
        let result = validator().validate(&plan());
        assert!(result.is_valid(), "unexpected errors: {:?}", messages(&result));
        assert_eq!(result.error_count(), 0);
    }

    #[test]
    fn test_bad_host_only_reports_format() {
        let mut plan = plan();
        plan.worker.nodes[1].host = String::from("worker-2");

        let result = validator().validate(&plan);
        assert_eq!(result.error_count(), 1, "{:?}", messages(&result));
        let err = &result.errors[0];
        assert_eq!(err.scope.as_deref(), Some("Worker nodes: Node #2"));
        assert!(err.message.contains("\"worker-2\""));
    }

    #[test]
    fn test_empty_internal_ip_is_tolerated() {
        let mut plan = plan();
        plan.etcd.nodes[0].internal_ip.clear();
        plan.worker.nodes[0].internal_ip.clear();
        plan.worker.nodes[1].internal_ip.clear();

        assert!(validator().validate(&plan).is_valid());
    }

    #[test]
    fn test_bad_internal_ip() {
        let mut plan = plan();
        plan.storage.nodes[0].internal_ip = String::from("10.0.0.9");

        let result = validator().validate(&plan);
        assert_eq!(result.error_count(), 1);
        assert!(result.errors[0].message.contains("InternalIP"));
    }

    #[test]
    fn test_count_mismatch_only_reports_cardinality() {
        let mut plan = plan();
        plan.worker.expected_count = 5;

        let result = validator().validate(&plan);
        assert_eq!(
            messages(&result),
            vec![String::from(
                "Worker nodes: Expected node count (5) does not match the number of nodes provided (2)"
            )]
        );
    }

    #[test]
    fn test_every_role_is_mandatory_by_default() {
        let mut plan = plan();
        plan.ingress = NodeGroup::default();

        let result = validator().validate(&plan);
        assert_eq!(
            messages(&result),
            vec![
                String::from("Ingress nodes: At least one node is required"),
                String::from("Ingress nodes: Node count must be greater than 0"),
            ]
        );
    }

    #[test]
    fn test_storage_is_checked() {
        let mut plan = plan();
        plan.storage.expected_count = 0;

        let result = validator().validate(&plan);
        assert_eq!(result.errors_in("Storage nodes").len(), 1);
    }

    #[test]
    fn test_optional_role_may_be_absent() {
        let mut plan = plan();
        plan.ingress = NodeGroup::default();

        let result = validator()
            .with_requirement(Role::Ingress, RoleRequirement::Optional)
            .validate(&plan);
        assert!(result.is_valid(), "{:?}", messages(&result));
    }

    #[test]
    fn test_optional_role_count_mismatch() {
        let mut plan = plan();
        plan.ingress.expected_count = 3;

        let result = validator()
            .with_requirement(Role::Ingress, RoleRequirement::Optional)
            .validate(&plan);
        assert_eq!(result.error_count(), 1);
        assert!(result.errors[0].message.starts_with("Expected node count (3)"));
    }

    #[test]
    fn test_optional_role_with_nodes_checks_format() {
        let mut plan = plan();
        plan.ingress.nodes[0].ip = String::from("1.2.3.4");

        let result = validator()
            .with_requirement(Role::Ingress, RoleRequirement::Optional)
            .validate(&plan);
        assert_eq!(result.error_count(), 1);
        assert_eq!(
            result.errors[0].scope.as_deref(),
            Some("Ingress nodes: Node #1")
        );
    }

    #[test]
    fn test_duplicate_host_across_roles() {
        let mut plan = plan();
        plan.worker.nodes[0].host = String::from("${master_host_1}");

        let result = validator().validate(&plan);
        assert_eq!(result.error_count(), 1, "{:?}", messages(&result));
        let err = &result.errors[0];
        assert_eq!(err.scope.as_deref(), Some("Nodes"));
        assert!(err.message.contains("master node #1"));
        assert!(err.message.contains("worker node #1"));
    }

    #[test]
    fn test_duplicate_ips() {
        let mut plan = plan();
        plan.etcd.nodes[0].ip = String::from("${worker_pub_ip_2}");
        plan.etcd.nodes[0].internal_ip = String::from("${worker_priv_ip_2}");

        let result = validator().validate(&plan);
        assert_eq!(result.errors_in("Nodes").len(), 2);
        assert_eq!(result.error_count(), 2);
    }

    #[test]
    fn test_load_balancer_tokens() {
        let mut plan = plan();
        plan.master.load_balanced_fqdn = String::from("lb.example.com");
        plan.master.load_balanced_short_name = String::from("lb");

        let result = validator().validate(&plan);
        assert_eq!(result.error_count(), 2);
        assert!(result.errors.iter().all(|e| e.scope.as_deref() == Some("Master nodes")));
    }

    #[test]
    fn test_master_cardinality() {
        let mut plan = plan();
        plan.master.group.nodes.clear();

        let result = validator().validate(&plan);
        assert_eq!(
            messages(&result),
            vec![String::from("Master nodes: At least one node is required")]
        );
    }

    #[test]
    fn test_empty_provider_short_circuits() {
        let mut plan = plan();
        plan.provisioner.provider.clear();
        plan.provisioner.options.instance_type = String::from("m4.superlarge");

        let result = PlanValidator::default().validate(&plan);
        assert_eq!(
            messages(&result),
            vec![String::from("Provisioner: Provisioner provider cannot be empty")]
        );
    }

    #[test]
    fn test_empty_provider_does_not_stop_other_rules() {
        let mut plan = plan();
        plan.provisioner.provider.clear();
        plan.worker.expected_count = 7;

        let result = validator().validate(&plan);
        assert_eq!(result.error_count(), 2);
        assert_eq!(result.errors_in("Worker nodes").len(), 1);
    }

    #[test]
    fn test_unsupported_provider() {
        let mut plan = plan();
        plan.provisioner.provider = String::from("gce");

        let result = validator().validate(&plan);
        assert_eq!(result.error_count(), 1);
        assert!(result.errors[0].message.contains("\"gce\" is not a valid provisioner provider"));
    }

    #[test]
    fn test_missing_credentials() {
        let env = ProviderEnvironment::from_pairs([
            ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", ""),
        ]);
        let result = PlanValidator::default()
            .with_environment(env)
            .validate(&plan());

        assert_eq!(
            messages(&result),
            vec![
                String::from("Provisioner: AWS_SECRET_ACCESS_KEY not found"),
                String::from("Provisioner: AWS_DEFAULT_REGION not found"),
            ]
        );
    }

    #[test]
    fn test_instance_type_grammar() {
        let mut plan = plan();
        plan.provisioner.options.instance_type = String::from("m4.superlarge");

        let result = validator().validate(&plan);
        assert_eq!(
            messages(&result),
            vec![String::from(
                "Provisioner: \"m4.superlarge\" is not a valid EC2 instance type"
            )]
        );
    }

    #[test]
    fn test_errors_aggregate_across_families() {
        let mut plan = plan();
        plan.provisioner.options.instance_type.clear();
        plan.etcd.nodes[0].host = String::from("${worker_host_1}");
        plan.master.group.expected_count = 1;
        plan.storage.nodes[0].ip = String::from("nope");
        plan.master.load_balanced_short_name.clear();

        let result = validator().validate(&plan);
        assert_eq!(
            failing_scopes(&result),
            vec![
                String::from("Provisioner"),
                String::from("Nodes"),
                String::from("Master nodes"),
                String::from("Storage nodes: Node #1"),
            ]
        );
        assert_eq!(result.error_count(), 5);
    }

    #[test]
    fn test_prefix_nesting() {
        let err = ValidationError::new("bad")
            .with_prefix("Node #3")
            .with_prefix("Master nodes");
        assert_eq!(err.to_string(), "Master nodes: Node #3: bad");
    }
}

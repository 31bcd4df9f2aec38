//! Placeholder tokens for node fields the provisioner has not filled in yet.
//!
//! A templated plan names every unresolved value with a `${...}` token, e.g.
//! `${worker_host_2}`. The predicates here only check the shape of a field;
//! they never try to resolve it.

use regex::Regex;
use std::sync::LazyLock;

use super::spec::Role;

/// Token the master load balancer FQDN holds before provisioning.
pub const LOAD_BALANCED_FQDN_TOKEN: &str = "${load_balanced_fqdn}";

/// Token the master load balancer short name holds before provisioning.
pub const LOAD_BALANCED_SHORT_NAME_TOKEN: &str = "${load_balanced_short_name}";

/// Host token pattern.
pub const HOST_PATTERN: &str = r"^\$\{(master|etcd|worker|ingress|storage)_host_\d+\}$";

/// Public IP token pattern.
pub const PUBLIC_IP_PATTERN: &str = r"^\$\{(master|etcd|worker|ingress|storage)_pub_ip_\d+\}$";

/// Private IP token pattern.
pub const PRIVATE_IP_PATTERN: &str = r"^\$\{(master|etcd|worker|ingress|storage)_priv_ip_\d+\}$";

static HOST_RE: LazyLock<Regex> = LazyLock::new(|| compile(HOST_PATTERN));
static PUBLIC_IP_RE: LazyLock<Regex> = LazyLock::new(|| compile(PUBLIC_IP_PATTERN));
static PRIVATE_IP_RE: LazyLock<Regex> = LazyLock::new(|| compile(PRIVATE_IP_PATTERN));

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    // The patterns are compile-time constants covered by tests.
    Regex::new(pattern).expect("placeholder pattern is valid")
}

/// Returns true if `value` is a host token.
#[must_use]
pub fn is_host_token(value: &str) -> bool {
    HOST_RE.is_match(value)
}

/// Returns true if `value` is a public IP token.
#[must_use]
pub fn is_public_ip_token(value: &str) -> bool {
    PUBLIC_IP_RE.is_match(value)
}

/// Returns true if `value` is a private IP token.
#[must_use]
pub fn is_private_ip_token(value: &str) -> bool {
    PRIVATE_IP_RE.is_match(value)
}

/// Builds the host token for a role and index.
#[must_use]
pub fn host_token(role: Role, index: u32) -> String {
    format!("${{{role}_host_{index}}}")
}

/// Builds the public IP token for a role and index.
#[must_use]
pub fn public_ip_token(role: Role, index: u32) -> String {
    format!("${{{role}_pub_ip_{index}}}")
}

/// Builds the private IP token for a role and index.
#[must_use]
pub fn private_ip_token(role: Role, index: u32) -> String {
    format!("${{{role}_priv_ip_{index}}}")
}

//! Provisioner output decoding.
//!
//! The provisioner reports each role as three separate arrays (public IPs,
//! private IPs, hostnames) that line up by position. [`RoleOutput::nodes`]
//! checks that they agree and zips them into one ordered list right away, so
//! nothing downstream indexes the arrays separately.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::error::{KubeplanError, ReconcileError, Result};
use crate::plan::{Node, Role};

use super::context::ExecutionContext;
use super::source::OutputSource;

/// A single output variable as printed by `terraform output -json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TerraformOutput {
    /// Whether the value is marked sensitive.
    #[serde(default)]
    pub sensitive: bool,
    /// Declared type of the value.
    #[serde(rename = "type", default)]
    pub output_type: serde_json::Value,
    /// The values.
    pub value: Vec<String>,
}

/// The three raw sequences reported for one role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleOutput {
    /// Public IP addresses.
    pub public_ips: Vec<String>,
    /// Private IP addresses; empty when the role has none.
    pub private_ips: Vec<String>,
    /// Hostnames.
    pub hosts: Vec<String>,
}

/// One machine as reported by the provisioner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedNode {
    /// Public IP address.
    pub public_ip: String,
    /// Private IP address, empty when not reported.
    pub private_ip: String,
    /// Hostname.
    pub host: String,
}

/// Raw provisioner output for every role.
#[derive(Debug, Clone, Default)]
pub struct ProvisionerOutputs {
    roles: HashMap<Role, RoleOutput>,
}

impl TerraformOutput {
    /// Decodes a single output variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a list-valued output.
    pub fn from_slice(variable: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| KubeplanError::Reconcile(ReconcileError::malformed(variable, e.to_string())))
    }
}

impl RoleOutput {
    /// Creates a role output from its three sequences.
    #[must_use]
    pub const fn new(public_ips: Vec<String>, private_ips: Vec<String>, hosts: Vec<String>) -> Self {
        Self {
            public_ips,
            private_ips,
            hosts,
        }
    }

    /// Pairs the sequences by position.
    ///
    /// # Errors
    ///
    /// Returns an error if the hostname count differs from the public IP
    /// count, or if private IPs are present with a different count.
    pub fn nodes(&self, role: Role) -> std::result::Result<Vec<ProvisionedNode>, ReconcileError> {
        let expected = self.public_ips.len();

        if self.hosts.len() != expected {
            return Err(ReconcileError::OutputLengthMismatch {
                role: role.to_string(),
                sequence: String::from("hostnames"),
                expected,
                actual: self.hosts.len(),
            });
        }
        if !self.private_ips.is_empty() && self.private_ips.len() != expected {
            return Err(ReconcileError::OutputLengthMismatch {
                role: role.to_string(),
                sequence: String::from("private IPs"),
                expected,
                actual: self.private_ips.len(),
            });
        }

        Ok(self
            .public_ips
            .iter()
            .zip(&self.hosts)
            .enumerate()
            .map(|(i, (public_ip, host))| ProvisionedNode {
                public_ip: public_ip.clone(),
                private_ip: self.private_ips.get(i).cloned().unwrap_or_default(),
                host: host.clone(),
            })
            .collect())
    }
}

impl From<ProvisionedNode> for Node {
    fn from(node: ProvisionedNode) -> Self {
        Self {
            host: node.host,
            ip: node.public_ip,
            internal_ip: node.private_ip,
        }
    }
}

impl ProvisionerOutputs {
    /// Creates an empty output set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output for a role.
    #[must_use]
    pub fn with_role(mut self, role: Role, output: RoleOutput) -> Self {
        self.roles.insert(role, output);
        self
    }

    /// Returns the output for a role, if one was recorded.
    #[must_use]
    pub fn role(&self, role: Role) -> Option<&RoleOutput> {
        self.roles.get(&role)
    }

    /// Parses the object printed by `terraform output -json`.
    ///
    /// Public IPs and hostnames are required for every role; private IPs may
    /// be left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON or a required
    /// output is missing.
    pub fn from_json(content: &str) -> Result<Self> {
        let mut all: BTreeMap<String, serde_json::Value> = serde_json::from_str(content)
            .map_err(|e| KubeplanError::Reconcile(ReconcileError::malformed("*", e.to_string())))?;

        let mut outputs = Self::new();
        for role in Role::ALL {
            let public_ips = take_required(&mut all, &role.public_ips_output())?;
            let hosts = take_required(&mut all, &role.hosts_output())?;
            let private_ips = take_output(&mut all, &role.private_ips_output())?.unwrap_or_default();
            outputs.roles.insert(role, RoleOutput::new(public_ips, private_ips, hosts));
        }

        debug!("Ignoring {} unrelated provisioner output(s)", all.len());
        Ok(outputs)
    }

    /// Asks the provisioner for every role's outputs.
    ///
    /// A private IP output the provisioner cannot produce is treated as
    /// empty, as in [`Self::from_json`].
    ///
    /// # Errors
    ///
    /// Returns an error if the provisioner cannot produce a public IP or
    /// hostname output, or if any output cannot be decoded.
    pub fn collect(source: &dyn OutputSource, ctx: &ExecutionContext) -> Result<Self> {
        let mut outputs = Self::new();
        for role in Role::ALL {
            let fetch = |variable: String| -> Result<Vec<String>> {
                let bytes = source.output(ctx, &variable)?;
                Ok(TerraformOutput::from_slice(&variable, &bytes)?.value)
            };
            let public_ips = fetch(role.public_ips_output())?;
            let private_ips = match source.output(ctx, &role.private_ips_output()) {
                Ok(bytes) => TerraformOutput::from_slice(&role.private_ips_output(), &bytes)?.value,
                Err(e) => {
                    debug!("No private IPs for {role}: {e}");
                    Vec::new()
                }
            };
            let output = RoleOutput::new(public_ips, private_ips, fetch(role.hosts_output())?);
            debug!(
                "Collected {} {} node(s) from provisioner",
                output.public_ips.len(),
                role
            );
            outputs.roles.insert(role, output);
        }
        Ok(outputs)
    }
}

fn take_output(
    all: &mut BTreeMap<String, serde_json::Value>,
    variable: &str,
) -> Result<Option<Vec<String>>> {
    all.remove(variable)
        .map(|raw| {
            serde_json::from_value::<TerraformOutput>(raw)
                .map(|o| o.value)
                .map_err(|e| KubeplanError::Reconcile(ReconcileError::malformed(variable, e.to_string())))
        })
        .transpose()
}

fn take_required(
    all: &mut BTreeMap<String, serde_json::Value>,
    variable: &str,
) -> Result<Vec<String>> {
    take_output(all, variable)?
        .ok_or_else(|| KubeplanError::Reconcile(ReconcileError::missing(variable)))
}

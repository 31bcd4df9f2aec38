//! Plan document types.
//!
//! This module defines the structs that map to a cluster plan file. Before
//! provisioning every node field holds a placeholder token; after
//! reconciliation they hold the concrete values reported by the provisioner.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::placeholder::{
    host_token, private_ip_token, public_ip_token, LOAD_BALANCED_FQDN_TOKEN,
    LOAD_BALANCED_SHORT_NAME_TOKEN,
};

/// The root structure of a cluster plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    /// Cluster identity and access settings.
    pub cluster: ClusterConfig,
    /// Infrastructure provisioner settings.
    pub provisioner: ProvisionerConfig,
    /// Etcd nodes.
    #[serde(default)]
    pub etcd: NodeGroup,
    /// Master nodes.
    #[serde(default)]
    pub master: MasterNodeGroup,
    /// Worker nodes.
    #[serde(default)]
    pub worker: NodeGroup,
    /// Ingress nodes.
    #[serde(default)]
    pub ingress: NodeGroup,
    /// Storage nodes.
    #[serde(default)]
    pub storage: NodeGroup,
    /// Plan sections owned by other tools, carried through untouched.
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Cluster-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ClusterConfig {
    /// Cluster name.
    pub name: String,
    /// SSH access to the cluster nodes.
    #[serde(default)]
    pub ssh: SshConfig,
}

/// SSH access settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SshConfig {
    /// Login user.
    #[serde(default)]
    pub user: String,
    /// Path to the private key.
    #[serde(default)]
    pub ssh_key: String,
    /// SSH port.
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
}

/// Provisioner settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProvisionerConfig {
    /// Provider identifier (e.g. "aws").
    #[serde(default)]
    pub provider: String,
    /// Provider-specific options.
    #[serde(default)]
    pub options: AwsOptions,
}

/// AWS provider options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AwsOptions {
    /// Region override; the environment default applies when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    /// Custom machine image; the stock image applies when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ami: String,
    /// EC2 instance type for every node.
    #[serde(default)]
    pub instance_type: String,
}

/// A homogeneous group of nodes for one role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NodeGroup {
    /// Number of nodes the role should have.
    #[serde(default)]
    pub expected_count: u32,
    /// The nodes.
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// The master group: a node group plus load balancer addressing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MasterNodeGroup {
    /// Shared node group fields.
    #[serde(flatten)]
    pub group: NodeGroup,
    /// Fully qualified name of the master load balancer.
    #[serde(default)]
    pub load_balanced_fqdn: String,
    /// Short name of the master load balancer.
    #[serde(default)]
    pub load_balanced_short_name: String,
}

/// A single machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Node {
    /// Hostname.
    pub host: String,
    /// Public IP address.
    pub ip: String,
    /// Private IP address, empty when the node has none.
    #[serde(default)]
    pub internal_ip: String,
}

/// Cluster roles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Etcd cluster members.
    Etcd,
    /// Kubernetes control plane.
    Master,
    /// Workload nodes.
    Worker,
    /// Ingress controllers.
    Ingress,
    /// Storage nodes.
    Storage,
}

/// Node counts per role, used to build templated plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleCounts {
    /// Etcd node count.
    pub etcd: u32,
    /// Master node count.
    pub master: u32,
    /// Worker node count.
    pub worker: u32,
    /// Ingress node count.
    pub ingress: u32,
    /// Storage node count.
    pub storage: u32,
}

const fn default_ssh_port() -> u16 {
    22
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: String::new(),
            ssh_key: String::new(),
            ssh_port: default_ssh_port(),
        }
    }
}

impl Default for RoleCounts {
    fn default() -> Self {
        Self {
            etcd: 1,
            master: 1,
            worker: 1,
            ingress: 1,
            storage: 1,
        }
    }
}

impl RoleCounts {
    /// Returns the count configured for a role.
    #[must_use]
    pub const fn get(&self, role: Role) -> u32 {
        match role {
            Role::Etcd => self.etcd,
            Role::Master => self.master,
            Role::Worker => self.worker,
            Role::Ingress => self.ingress,
            Role::Storage => self.storage,
        }
    }
}

impl Role {
    /// All roles, in the order the provisioner output is reconciled.
    pub const ALL: [Self; 5] = [
        Self::Master,
        Self::Etcd,
        Self::Worker,
        Self::Ingress,
        Self::Storage,
    ];

    /// Returns the lower-case role name used in tokens and output variables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Etcd => "etcd",
            Self::Master => "master",
            Self::Worker => "worker",
            Self::Ingress => "ingress",
            Self::Storage => "storage",
        }
    }

    /// Returns the label used to prefix validation errors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Etcd => "Etcd nodes",
            Self::Master => "Master nodes",
            Self::Worker => "Worker nodes",
            Self::Ingress => "Ingress nodes",
            Self::Storage => "Storage nodes",
        }
    }

    /// Name of the provisioner output holding public IPs.
    #[must_use]
    pub fn public_ips_output(self) -> String {
        format!("{}_pub_ips", self.as_str())
    }

    /// Name of the provisioner output holding private IPs.
    #[must_use]
    pub fn private_ips_output(self) -> String {
        format!("{}_priv_ips", self.as_str())
    }

    /// Name of the provisioner output holding hostnames.
    #[must_use]
    pub fn hosts_output(self) -> String {
        format!("{}_hosts", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Node {
    /// Creates a node from concrete values.
    #[must_use]
    pub fn new(host: impl Into<String>, ip: impl Into<String>, internal_ip: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ip: ip.into(),
            internal_ip: internal_ip.into(),
        }
    }

    /// Creates the placeholder node for position `index` (1-based) of a role.
    #[must_use]
    pub fn templated(role: Role, index: u32) -> Self {
        Self {
            host: host_token(role, index),
            ip: public_ip_token(role, index),
            internal_ip: private_ip_token(role, index),
        }
    }
}

impl NodeGroup {
    /// Creates a group of `count` placeholder nodes.
    #[must_use]
    pub fn templated(role: Role, count: u32) -> Self {
        Self {
            expected_count: count,
            nodes: (1..=count).map(|i| Node::templated(role, i)).collect(),
        }
    }

    /// Returns true if the group has neither nodes nor an expected count.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.nodes.is_empty() && self.expected_count == 0
    }
}

impl MasterNodeGroup {
    /// Creates a master group of `count` placeholder nodes with placeholder
    /// load balancer fields.
    #[must_use]
    pub fn templated(count: u32) -> Self {
        Self {
            group: NodeGroup::templated(Role::Master, count),
            load_balanced_fqdn: String::from(LOAD_BALANCED_FQDN_TOKEN),
            load_balanced_short_name: String::from(LOAD_BALANCED_SHORT_NAME_TOKEN),
        }
    }
}

impl Plan {
    /// Builds a fully templated plan ready for provisioning on AWS.
    #[must_use]
    pub fn templated(name: impl Into<String>, counts: RoleCounts) -> Self {
        Self {
            cluster: ClusterConfig {
                name: name.into(),
                ssh: SshConfig::default(),
            },
            provisioner: ProvisionerConfig {
                provider: String::from("aws"),
                options: AwsOptions {
                    instance_type: String::from("t2.medium"),
                    ..AwsOptions::default()
                },
            },
            etcd: NodeGroup::templated(Role::Etcd, counts.etcd),
            master: MasterNodeGroup::templated(counts.master),
            worker: NodeGroup::templated(Role::Worker, counts.worker),
            ingress: NodeGroup::templated(Role::Ingress, counts.ingress),
            storage: NodeGroup::templated(Role::Storage, counts.storage),
            extra: BTreeMap::new(),
        }
    }

    /// Returns the node group for a role.
    #[must_use]
    pub const fn group(&self, role: Role) -> &NodeGroup {
        match role {
            Role::Etcd => &self.etcd,
            Role::Master => &self.master.group,
            Role::Worker => &self.worker,
            Role::Ingress => &self.ingress,
            Role::Storage => &self.storage,
        }
    }

    /// Returns the node group for a role, mutably.
    pub const fn group_mut(&mut self, role: Role) -> &mut NodeGroup {
        match role {
            Role::Etcd => &mut self.etcd,
            Role::Master => &mut self.master.group,
            Role::Worker => &mut self.worker,
            Role::Ingress => &mut self.ingress,
            Role::Storage => &mut self.storage,
        }
    }

    /// Iterates every node with its role and 0-based position.
    pub fn all_nodes(&self) -> impl Iterator<Item = (Role, usize, &Node)> {
        Role::ALL.into_iter().flat_map(move |role| {
            self.group(role)
                .nodes
                .iter()
                .enumerate()
                .map(move |(i, node)| (role, i, node))
        })
    }

    /// Returns the total number of nodes across all roles.
    #[must_use]
    pub fn node_count(&self) -> usize {
        Role::ALL.iter().map(|r| self.group(*r).nodes.len()).sum()
    }
}

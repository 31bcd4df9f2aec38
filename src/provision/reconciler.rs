//! Merges provisioner output into a plan.
//!
//! After a successful provisioning run every placeholder in the plan is
//! replaced with the concrete values the provisioner reported, role by role.
//! Node counts are fixed at that point: output that disagrees with a role's
//! expected count is refused rather than treated as a resize.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{ReconcileError, Result};
use crate::plan::{Node, Plan, Role};

use super::aws::default_ssh_user;
use super::output::ProvisionerOutputs;

/// Reconciles provisioner output into a plan.
#[derive(Debug, Clone)]
pub struct Reconciler {
    /// Private key written into the plan's SSH settings.
    private_key_path: PathBuf,
}

/// Outcome of a successful reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileSummary {
    /// Cluster name.
    pub cluster: String,
    /// Node count recorded for each role, in reconciliation order.
    pub roles: Vec<(Role, usize)>,
    /// Whether the master group got direct addressing instead of a load balancer.
    pub single_master: bool,
    /// SSH user written into the plan.
    pub ssh_user: String,
}

impl Reconciler {
    /// Creates a reconciler that records `private_key_path` in the plan.
    #[must_use]
    pub fn new(private_key_path: impl Into<PathBuf>) -> Self {
        Self {
            private_key_path: private_key_path.into(),
        }
    }

    /// Replaces every role's nodes with the provisioner's, then sets the
    /// cluster SSH fields.
    ///
    /// Roles already updated stay updated when a later role fails; callers
    /// must discard the plan on error instead of persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if a role's output is missing or inconsistent, or if
    /// its node count differs from the plan's expected count.
    pub fn reconcile(&self, plan: &mut Plan, outputs: &ProvisionerOutputs) -> Result<ReconcileSummary> {
        info!("Reconciling provisioner output into plan '{}'", plan.cluster.name);

        let mut roles = Vec::with_capacity(Role::ALL.len());
        for role in Role::ALL {
            let count = Self::reconcile_role(plan, role, outputs)?;
            roles.push((role, count));
        }

        let single_master = plan.master.group.nodes.len() == 1;
        if let [master] = plan.master.group.nodes.as_slice() {
            // A single master has no load balancer in front of it.
            plan.master.load_balanced_fqdn = if master.internal_ip.is_empty() {
                warn!("Single master has no private IP; load balanced FQDN uses its public IP");
                master.ip.clone()
            } else {
                master.internal_ip.clone()
            };
            plan.master.load_balanced_short_name = master.ip.clone();
            debug!("Single master: addressing it directly");
        }

        let ssh_user = default_ssh_user(&plan.provisioner.options.ami);
        plan.cluster.ssh.ssh_key = self.private_key_path.display().to_string();
        plan.cluster.ssh.user = ssh_user.to_string();

        info!("Reconciled {} node(s)", plan.node_count());
        Ok(ReconcileSummary {
            cluster: plan.cluster.name.clone(),
            roles,
            single_master,
            ssh_user: ssh_user.to_string(),
        })
    }

    fn reconcile_role(plan: &mut Plan, role: Role, outputs: &ProvisionerOutputs) -> Result<usize> {
        let output = outputs
            .role(role)
            .ok_or_else(|| ReconcileError::missing(role.public_ips_output()))?;
        let provisioned = output.nodes(role)?;

        let group = plan.group_mut(role);
        let matches = usize::try_from(group.expected_count).is_ok_and(|n| n == provisioned.len());
        if !matches {
            return Err(ReconcileError::MutationUnsupported {
                role: role.to_string(),
                expected: group.expected_count,
                actual: provisioned.len(),
            }
            .into());
        }

        group.nodes = provisioned.into_iter().map(Node::from).collect();
        debug!("Reconciled {} {} node(s)", group.nodes.len(), role);
        Ok(group.nodes.len())
    }
}

impl fmt::Display for ReconcileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plan for cluster '{}' reconciled:", self.cluster)?;
        for (role, count) in &self.roles {
            writeln!(f, "  {role}: {count} node(s)")?;
        }
        if self.single_master {
            writeln!(f, "  Single master: load balancer fields point at the master")?;
        }
        write!(f, "  SSH user: {}", self.ssh_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KubeplanError;
    use crate::plan::{RoleCounts, LOAD_BALANCED_FQDN_TOKEN};
    use crate::provision::output::RoleOutput;

    fn role_output(role: Role, count: usize) -> RoleOutput {
        RoleOutput::new(
            (1..=count).map(|i| format!("54.0.{}.{i}", role as u8)).collect(),
            (1..=count).map(|i| format!("10.0.{}.{i}", role as u8)).collect(),
            (1..=count).map(|i| format!("{role}-{i}")).collect(),
        )
    }

    fn outputs_for(counts: RoleCounts) -> ProvisionerOutputs {
        Role::ALL.into_iter().fold(ProvisionerOutputs::new(), |outputs, role| {
            outputs.with_role(role, role_output(role, counts.get(role) as usize))
        })
    }

    fn reconciler() -> Reconciler {
        Reconciler::new("/clusters/dev/sshkey.pem")
    }

    #[test]
    fn test_nodes_follow_provisioner_order() {
        let counts = RoleCounts {
            worker: 3,
            ..RoleCounts::default()
        };
        let mut plan = Plan::templated("dev", counts);
        let outputs = outputs_for(counts).with_role(
            Role::Worker,
            RoleOutput::new(
                vec![String::from("54.9.9.3"), String::from("54.9.9.1"), String::from("54.9.9.2")],
                vec![String::from("10.9.9.3"), String::from("10.9.9.1"), String::from("10.9.9.2")],
                vec![String::from("w-c"), String::from("w-a"), String::from("w-b")],
            ),
        );

        reconciler().reconcile(&mut plan, &outputs).expect("reconcile");

        assert_eq!(
            plan.worker.nodes,
            vec![
                Node::new("w-c", "54.9.9.3", "10.9.9.3"),
                Node::new("w-a", "54.9.9.1", "10.9.9.1"),
                Node::new("w-b", "54.9.9.2", "10.9.9.2"),
            ]
        );
        assert_eq!(plan.worker.expected_count, 3);
    }

    #[test]
    fn test_single_master_is_addressed_directly() {
        let counts = RoleCounts::default();
        let mut plan = Plan::templated("dev", counts);
        let outputs = outputs_for(counts).with_role(
            Role::Master,
            RoleOutput::new(
                vec![String::from("1.2.3.4")],
                vec![String::from("10.0.0.1")],
                vec![String::from("master-1")],
            ),
        );

        let summary = reconciler().reconcile(&mut plan, &outputs).expect("reconcile");

        assert!(summary.single_master);
        assert_eq!(plan.master.load_balanced_fqdn, "10.0.0.1");
        assert_eq!(plan.master.load_balanced_short_name, "1.2.3.4");
    }

    #[test]
    fn test_single_master_without_private_ip_uses_public_ip() {
        let counts = RoleCounts::default();
        let mut plan = Plan::templated("dev", counts);
        let outputs = outputs_for(counts).with_role(
            Role::Master,
            RoleOutput::new(
                vec![String::from("1.2.3.1")],
                Vec::new(),
                vec![String::from("master-1")],
            ),
        );

        let summary = reconciler().reconcile(&mut plan, &outputs).expect("reconcile");

        assert!(summary.single_master);
        assert_eq!(plan.master.group.nodes[0].internal_ip, "");
        assert_eq!(plan.master.load_balanced_fqdn, "1.2.3.1");
        assert_eq!(plan.master.load_balanced_short_name, "1.2.3.1");
    }

    #[test]
    fn test_multi_master_keeps_load_balancer() {
        let counts = RoleCounts {
            master: 3,
            ..RoleCounts::default()
        };
        let mut plan = Plan::templated("dev", counts);
        let outputs = outputs_for(counts);

        reconciler().reconcile(&mut plan, &outputs).expect("first pass");
        assert_eq!(plan.master.load_balanced_fqdn, LOAD_BALANCED_FQDN_TOKEN);

        plan.master.load_balanced_fqdn = String::from("masters.example.com");
        plan.master.load_balanced_short_name = String::from("masters");

        let summary = reconciler().reconcile(&mut plan, &outputs).expect("second pass");
        assert!(!summary.single_master);
        assert_eq!(plan.master.load_balanced_fqdn, "masters.example.com");
        assert_eq!(plan.master.load_balanced_short_name, "masters");
        assert_eq!(plan.master.group.nodes.len(), 3);
    }

    #[test]
    fn test_count_change_is_rejected() {
        let counts = RoleCounts {
            worker: 3,
            ..RoleCounts::default()
        };
        let mut plan = Plan::templated("dev", counts);
        let templated_workers = plan.worker.clone();
        let outputs = outputs_for(counts).with_role(Role::Worker, role_output(Role::Worker, 2));

        let err = reconciler().reconcile(&mut plan, &outputs).expect_err("resize");

        assert!(matches!(
            err,
            KubeplanError::Reconcile(ReconcileError::MutationUnsupported { expected: 3, actual: 2, .. })
        ));
        assert!(err.taints_plan());
        // The failing role is untouched; roles reconciled before it keep their values.
        assert_eq!(plan.worker, templated_workers);
        assert_eq!(plan.master.group.nodes[0].host, "master-1");
        assert_eq!(plan.etcd.nodes[0].host, "etcd-1");
        assert!(plan.ingress.nodes[0].host.starts_with("${"));
        assert!(plan.cluster.ssh.user.is_empty());
    }

    #[test]
    fn test_inconsistent_output_aborts() {
        let counts = RoleCounts::default();
        let mut plan = Plan::templated("dev", counts);
        let outputs = outputs_for(counts).with_role(
            Role::Etcd,
            RoleOutput::new(
                vec![String::from("54.0.0.1")],
                Vec::new(),
                vec![String::from("etcd-a"), String::from("etcd-b")],
            ),
        );

        let err = reconciler().reconcile(&mut plan, &outputs).expect_err("mismatch");
        assert!(matches!(
            err,
            KubeplanError::Reconcile(ReconcileError::OutputLengthMismatch { expected: 1, actual: 2, .. })
        ));
        assert!(plan.etcd.nodes[0].host.starts_with("${"));
    }

    #[test]
    fn test_missing_role_output() {
        let mut plan = Plan::templated("dev", RoleCounts::default());
        let outputs = ProvisionerOutputs::new().with_role(Role::Master, role_output(Role::Master, 1));

        let err = reconciler().reconcile(&mut plan, &outputs).expect_err("missing etcd");
        assert!(err.to_string().contains("etcd_pub_ips"));
    }

    #[test]
    fn test_missing_private_ips_leave_internal_ip_empty() {
        let counts = RoleCounts::default();
        let mut plan = Plan::templated("dev", counts);
        let outputs = outputs_for(counts).with_role(
            Role::Storage,
            RoleOutput::new(vec![String::from("54.1.1.1")], Vec::new(), vec![String::from("storage-a")]),
        );

        reconciler().reconcile(&mut plan, &outputs).expect("reconcile");
        assert_eq!(plan.storage.nodes, vec![Node::new("storage-a", "54.1.1.1", "")]);
    }

    #[test]
    fn test_ssh_settings() {
        let counts = RoleCounts::default();

        let mut plan = Plan::templated("dev", counts);
        let summary = reconciler().reconcile(&mut plan, &outputs_for(counts)).expect("stock");
        assert_eq!(plan.cluster.ssh.user, "ubuntu");
        assert_eq!(plan.cluster.ssh.ssh_key, "/clusters/dev/sshkey.pem");
        assert_eq!(summary.ssh_user, "ubuntu");

        let mut plan = Plan::templated("dev", counts);
        plan.provisioner.options.ami = String::from("ami-0abc");
        reconciler().reconcile(&mut plan, &outputs_for(counts)).expect("custom");
        assert_eq!(plan.cluster.ssh.user, "root");
    }

    #[test]
    fn test_summary_lists_roles_in_order() {
        let counts = RoleCounts {
            worker: 2,
            ..RoleCounts::default()
        };
        let mut plan = Plan::templated("dev", counts);
        let summary = reconciler().reconcile(&mut plan, &outputs_for(counts)).expect("reconcile");

        assert_eq!(
            summary.roles,
            vec![
                (Role::Master, 1),
                (Role::Etcd, 1),
                (Role::Worker, 2),
                (Role::Ingress, 1),
                (Role::Storage, 1),
            ]
        );
        assert!(summary.to_string().contains("worker: 2 node(s)"));
    }
}

//! AWS provider inputs.
//!
//! Builds the variables file handed to the AWS provisioner and holds the
//! provider's SSH defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{KubeplanError, ProvisionError, Result};
use crate::plan::{Plan, ProviderEnvironment, Role};

/// Login user on the stock AWS image.
pub const STOCK_IMAGE_USER: &str = "ubuntu";

/// Login user on a custom AMI.
pub const CUSTOM_IMAGE_USER: &str = "root";

/// Returns the SSH user for a plan's machine image.
#[must_use]
pub const fn default_ssh_user(ami: &str) -> &'static str {
    if ami.is_empty() {
        STOCK_IMAGE_USER
    } else {
        CUSTOM_IMAGE_USER
    }
}

/// AWS API credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Default region from the environment.
    pub default_region: String,
}

/// An SSH key pair generated for a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshKeyPair {
    /// Public key in `authorized_keys` format.
    pub public_key: String,
    /// Path to the private key.
    pub private_key_path: PathBuf,
}

/// Variables file consumed by the AWS provisioner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AwsTerraformVariables {
    /// Region to provision in.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Path to the private SSH key.
    pub private_ssh_key_path: String,
    /// Public SSH key installed on every node.
    pub public_ssh_key: String,
    /// Cluster name.
    pub cluster_name: String,
    /// Custom AMI, if any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ami: String,
    /// Instance type for every node.
    #[serde(rename = "instance_size", default, skip_serializing_if = "String::is_empty")]
    pub instance_type: String,
    /// Master node count.
    pub master_count: usize,
    /// Etcd node count.
    pub etcd_count: usize,
    /// Worker node count.
    pub worker_count: usize,
    /// Ingress node count.
    pub ingress_count: usize,
    /// Storage node count.
    pub storage_count: usize,
}

impl AwsCredentials {
    /// Reads the credentials from an environment snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing key or secret. The region
    /// may be empty when the plan sets one.
    pub fn from_environment(env: &ProviderEnvironment) -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            env.get(name).map(ToString::to_string).ok_or_else(|| {
                KubeplanError::Provision(ProvisionError::MissingCredential {
                    name: name.to_string(),
                })
            })
        };

        Ok(Self {
            access_key: required("AWS_ACCESS_KEY_ID")?,
            secret_key: required("AWS_SECRET_ACCESS_KEY")?,
            default_region: env
                .get("AWS_DEFAULT_REGION")
                .map(ToString::to_string)
                .unwrap_or_default(),
        })
    }
}

impl SshKeyPair {
    /// Loads an already generated key pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the public key cannot be read.
    pub async fn load(public_key_path: &Path, private_key_path: &Path) -> Result<Self> {
        let public_key = tokio::fs::read_to_string(public_key_path)
            .await
            .map_err(|e| {
                KubeplanError::Provision(ProvisionError::KeyUnreadable {
                    path: public_key_path.to_path_buf(),
                    message: e.to_string(),
                })
            })?;

        Ok(Self {
            public_key: public_key.trim().to_string(),
            private_key_path: std::path::absolute(private_key_path)
                .unwrap_or_else(|_| private_key_path.to_path_buf()),
        })
    }
}

impl AwsTerraformVariables {
    /// Fills the variables from a plan.
    ///
    /// The plan's region wins over the environment's. A key already named in
    /// the plan is kept instead of the generated pair's private key.
    #[must_use]
    pub fn populate(plan: &Plan, credentials: &AwsCredentials, key_pair: &SshKeyPair) -> Self {
        let options = &plan.provisioner.options;
        let region = if options.region.is_empty() {
            credentials.default_region.clone()
        } else {
            options.region.clone()
        };
        let private_ssh_key_path = if plan.cluster.ssh.ssh_key.is_empty() {
            key_pair.private_key_path.display().to_string()
        } else {
            plan.cluster.ssh.ssh_key.clone()
        };
        let count = |role: Role| plan.group(role).nodes.len();

        Self {
            region,
            access_key: credentials.access_key.clone(),
            secret_key: credentials.secret_key.clone(),
            private_ssh_key_path,
            public_ssh_key: key_pair.public_key.clone(),
            cluster_name: plan.cluster.name.clone(),
            ami: options.ami.clone(),
            instance_type: options.instance_type.clone(),
            master_count: count(Role::Master),
            etcd_count: count(Role::Etcd),
            worker_count: count(Role::Worker),
            ingress_count: count(Role::Ingress),
            storage_count: count(Role::Storage),
        }
    }

    /// Writes the variables as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write(&self, path: &Path) -> Result<()> {
        let write_failed = |message: String| {
            KubeplanError::Provision(ProvisionError::VariablesWriteFailed {
                path: path.to_path_buf(),
                message,
            })
        };

        let content = serde_json::to_vec_pretty(self).map_err(|e| write_failed(e.to_string()))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| write_failed(e.to_string()))?;

        restrict_permissions(path).await.map_err(|e| write_failed(e.to_string()))?;

        info!("Wrote provisioner variables to: {}", path.display());
        debug!(
            "Requested nodes: {} master, {} etcd, {} worker, {} ingress, {} storage",
            self.master_count, self.etcd_count, self.worker_count, self.ingress_count, self.storage_count
        );
        Ok(())
    }
}

/// The variables file holds credentials, so only the owner may read it.
#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::RoleCounts;
    use tempfile::TempDir;

    fn credentials() -> AwsCredentials {
        AwsCredentials {
            access_key: String::from("AKIAEXAMPLE"),
            secret_key: String::from("secret"),
            default_region: String::from("us-east-1"),
        }
    }

    fn key_pair() -> SshKeyPair {
        SshKeyPair {
            public_key: String::from("ssh-rsa AAAA"),
            private_key_path: PathBuf::from("/keys/sshkey.pem"),
        }
    }

    #[test]
    fn test_default_ssh_user() {
        assert_eq!(default_ssh_user(""), "ubuntu");
        assert_eq!(default_ssh_user("ami-123456"), "root");
    }

    #[test]
    fn test_credentials_from_environment() {
        let env = ProviderEnvironment::from_pairs([
            ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ]);
        let creds = AwsCredentials::from_environment(&env).expect("credentials");
        assert_eq!(creds.access_key, "AKIAEXAMPLE");
        assert_eq!(creds.default_region, "");

        let env = ProviderEnvironment::from_pairs([("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE")]);
        let err = AwsCredentials::from_environment(&env).expect_err("missing secret");
        assert!(err.to_string().contains("AWS_SECRET_ACCESS_KEY"));
    }

    #[test]
    fn test_populate_counts_and_region() {
        let counts = RoleCounts {
            master: 3,
            worker: 4,
            ..RoleCounts::default()
        };
        let mut plan = Plan::templated("prod", counts);
        plan.provisioner.options.region = String::from("eu-west-1");

        let vars = AwsTerraformVariables::populate(&plan, &credentials(), &key_pair());
        assert_eq!(vars.region, "eu-west-1");
        assert_eq!(vars.cluster_name, "prod");
        assert_eq!(vars.master_count, 3);
        assert_eq!(vars.worker_count, 4);
        assert_eq!(vars.storage_count, 1);
        assert_eq!(vars.private_ssh_key_path, "/keys/sshkey.pem");
        assert_eq!(vars.instance_type, "t2.medium");
    }

    #[test]
    fn test_populate_prefers_existing_key_and_env_region() {
        let mut plan = Plan::templated("prod", RoleCounts::default());
        plan.cluster.ssh.ssh_key = String::from("/home/me/.ssh/cluster.pem");

        let vars = AwsTerraformVariables::populate(&plan, &credentials(), &key_pair());
        assert_eq!(vars.region, "us-east-1");
        assert_eq!(vars.private_ssh_key_path, "/home/me/.ssh/cluster.pem");
    }

    #[tokio::test]
    async fn test_write_variables() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("terraform.tfvars.json");
        let plan = Plan::templated("dev", RoleCounts::default());

        let vars = AwsTerraformVariables::populate(&plan, &credentials(), &key_pair());
        vars.write(&path).await.expect("write");

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("json");
        assert_eq!(written["instance_size"], "t2.medium");
        assert_eq!(written["master_count"], 1);
        assert!(written.get("ami").is_none());
    }

    #[tokio::test]
    async fn test_load_key_pair() {
        let temp = TempDir::new().expect("temp dir");
        let public = temp.path().join("sshkey.pub");
        let private = temp.path().join("sshkey.pem");
        std::fs::write(&public, "ssh-rsa AAAA kubeplan\n").expect("write key");

        let pair = SshKeyPair::load(&public, &private).await.expect("load");
        assert_eq!(pair.public_key, "ssh-rsa AAAA kubeplan");
        assert_eq!(pair.private_key_path, private);
    }
}

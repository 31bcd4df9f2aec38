//! kubeplan CLI entrypoint.
//!
//! This is the main entrypoint for the kubeplan command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use kubeplan::cli::{Cli, Commands, OutputFormatter};
use kubeplan::error::{KubeplanError, PlanError, Result};
use kubeplan::plan::{FilePlanStore, Plan, PlanParser, PlanStore, PlanValidator, ProviderEnvironment, RoleCounts};
use kubeplan::provision::{
    AwsCredentials, AwsTerraformVariables, ExecutionContext, ProvisionerOutputs, Reconciler,
    SshKeyPair,
};

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let store = FilePlanStore::new(&cli.plan);

    match cli.command {
        Commands::Init {
            name,
            etcd,
            master,
            worker,
            ingress,
            storage,
            force,
        } => {
            let counts = RoleCounts {
                etcd,
                master,
                worker,
                ingress,
                storage,
            };
            cmd_init(&store, &name, counts, force).await
        }
        Commands::Validate => cmd_validate(&store, &formatter).await,
        Commands::Tfvars {
            public_key,
            private_key,
        } => cmd_tfvars(&store, &cli.base_dir, &public_key, &private_key).await,
        Commands::Reconcile {
            outputs,
            private_key,
        } => cmd_reconcile(&store, &outputs, &private_key, &formatter).await,
        Commands::Show => {
            let plan = store.load_required().await?;
            println!("{}", formatter.format_plan(&plan));
            Ok(())
        }
    }
}

/// Write a templated plan.
async fn cmd_init(store: &FilePlanStore, name: &str, counts: RoleCounts, force: bool) -> Result<()> {
    if !force && store.exists().await? {
        return Err(PlanError::AlreadyExists {
            path: store.path().to_path_buf(),
        }
        .into());
    }

    let plan = Plan::templated(name, counts);
    store.save(&plan).await?;

    eprintln!("Created: {}", store.path().display());
    eprintln!("Next steps:");
    eprintln!("  1. Export AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY and AWS_DEFAULT_REGION (or use a .env file)");
    eprintln!("  2. Run 'kubeplan validate' to check the plan");
    eprintln!("  3. Run 'kubeplan tfvars' and provision the cluster");
    eprintln!("  4. Run 'kubeplan reconcile' with the captured provisioner output");
    Ok(())
}

/// Validate the plan.
async fn cmd_validate(store: &FilePlanStore, formatter: &OutputFormatter) -> Result<()> {
    load_dotenv(store.path())?;
    let plan = store.load_required().await?;

    info!("Validating plan: {}", store.path().display());
    let result = PlanValidator::new().validate(&plan);
    println!("{}", formatter.format_validation(&result));

    if result.is_valid() {
        Ok(())
    } else {
        Err(KubeplanError::Validation {
            count: result.error_count(),
        })
    }
}

/// Write provisioner variables.
async fn cmd_tfvars(
    store: &FilePlanStore,
    base_dir: &Path,
    public_key: &Path,
    private_key: &Path,
) -> Result<()> {
    load_dotenv(store.path())?;
    let plan = store.load_required().await?;

    let credentials = AwsCredentials::from_environment(&ProviderEnvironment::from_process())?;
    let key_pair = SshKeyPair::load(public_key, private_key).await?;

    let ctx = ExecutionContext::new(base_dir, plan.cluster.name.as_str());
    ctx.ensure_cluster_dir().await?;

    let variables = AwsTerraformVariables::populate(&plan, &credentials, &key_pair);
    variables.write(&ctx.tfvars_path()).await?;

    eprintln!("Created: {}", ctx.tfvars_path().display());
    eprintln!("Provider definitions: {}", ctx.provider_dir(&plan.provisioner.provider).display());
    Ok(())
}

/// Reconcile captured provisioner output into the plan.
async fn cmd_reconcile(
    store: &FilePlanStore,
    outputs_path: &Path,
    private_key: &Path,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut plan = store.load_required().await?;

    let content = tokio::fs::read_to_string(outputs_path).await?;
    let outputs = ProvisionerOutputs::from_json(&content)?;

    let key_path = std::path::absolute(private_key).unwrap_or_else(|_| PathBuf::from(private_key));
    match Reconciler::new(key_path).reconcile(&mut plan, &outputs) {
        Ok(summary) => {
            store.save(&plan).await?;
            println!("{}", formatter.format_reconciliation(&summary));
            Ok(())
        }
        Err(e) => {
            if e.taints_plan() {
                warn!("Discarding partially reconciled plan; {} was not modified", store.path().display());
            }
            error!("Reconciliation failed: {e}");
            Err(e)
        }
    }
}

/// Loads the `.env` file next to the plan, if any.
fn load_dotenv(plan_path: &Path) -> Result<()> {
    let base = plan_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    PlanParser::new().with_base_path(base).load_dotenv()
}

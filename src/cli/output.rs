//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::plan::{failing_scopes, Plan, ValidationResult};
use crate::provision::ReconcileSummary;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Node row for table display.
#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Internal IP")]
    internal_ip: String,
}

/// JSON shape of a validation result.
#[derive(Serialize)]
struct ValidationJson {
    valid: bool,
    errors: Vec<String>,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a validation result.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&ValidationJson {
                valid: result.is_valid(),
                errors: result.errors.iter().map(ToString::to_string).collect(),
            })
            .unwrap_or_default(),
            OutputFormat::Text => {
                if result.is_valid() {
                    return format!("{} Plan is valid.\n", "✓".green());
                }

                let mut output = format!(
                    "{} Plan has {} error(s):\n\n",
                    "✗".red(),
                    result.error_count()
                );
                for error in &result.errors {
                    let _ = writeln!(output, "   - {error}");
                }
                let _ = write!(
                    output,
                    "\nFailing sections: {}\n",
                    failing_scopes(result).join(", ").yellow()
                );
                output
            }
        }
    }

    /// Formats a reconciliation summary.
    #[must_use]
    pub fn format_reconciliation(&self, summary: &ReconcileSummary) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(summary).unwrap_or_default(),
            OutputFormat::Text => format!("{} {summary}\n", "✓".green()),
        }
    }

    /// Formats the plan's nodes.
    #[must_use]
    pub fn format_plan(&self, plan: &Plan) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(plan).unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_text(plan),
        }
    }

    fn format_plan_text(plan: &Plan) -> String {
        let mut output = String::new();

        let _ = write!(
            output,
            "\nCluster: {} (provider: {})\n\n",
            plan.cluster.name.bold(),
            if plan.provisioner.provider.is_empty() {
                "none"
            } else {
                plan.provisioner.provider.as_str()
            }
        );

        if plan.node_count() == 0 {
            output.push_str("   No nodes defined.\n");
            return output;
        }

        let rows: Vec<NodeRow> = plan
            .all_nodes()
            .map(|(role, index, node)| NodeRow {
                role: role.to_string(),
                index: index + 1,
                host: node.host.clone(),
                ip: node.ip.clone(),
                internal_ip: node.internal_ip.clone(),
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let _ = write!(
            output,
            "\nLoad balancer: {} ({})\n",
            plan.master.load_balanced_fqdn, plan.master.load_balanced_short_name
        );

        let provisioned = plan
            .all_nodes()
            .all(|(_, _, node)| !node.host.starts_with("${"));
        let status = if provisioned {
            "provisioned".green()
        } else {
            "templated".yellow()
        };
        let _ = writeln!(output, "Status: {status}");

        output
    }
}

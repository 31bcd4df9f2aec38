//! Boundary to the external provisioner.
//!
//! kubeplan never runs the provisioner itself. Whatever drives it implements
//! [`OutputSource`] and hands back the captured bytes of a single output
//! variable.

use crate::error::Result;

use super::context::ExecutionContext;

/// Supplies captured provisioner output.
#[cfg_attr(test, mockall::automock)]
pub trait OutputSource {
    /// Returns the raw JSON for one output variable of the cluster in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provisioner cannot produce the value.
    fn output(&self, ctx: &ExecutionContext, variable: &str) -> Result<Vec<u8>>;
}

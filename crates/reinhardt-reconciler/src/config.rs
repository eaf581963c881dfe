//! Reconciler options.
//!
//! Options are plain data so they can be built in code or loaded from a TOML
//! table, for example the `[reconciler]` section of an application config:
//!
//! ```toml
//! recycling = false
//! contract_mode = "strict"
//! hydration_marker = "data-rh-root"
//! ```

use crate::error::{ReconcileError, ReconcileResult};
use serde::{Deserialize, Serialize};

/// Attribute that marks a server-rendered root inside a container.
pub const DEFAULT_HYDRATION_MARKER: &str = "data-rh-root";

/// How API contract violations are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractMode {
	/// Log a warning through `tracing` and carry on
	Warn,
	/// Abort the pass with [`ReconcileError::ContractViolation`]
	Strict,
}

impl Default for ContractMode {
	fn default() -> Self {
		if cfg!(debug_assertions) {
			Self::Warn
		} else {
			Self::Strict
		}
	}
}

/// Options for a [`Reconciler`](crate::reconciler::Reconciler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerOptions {
	/// Return unmounted nodes to the recycling pools
	pub recycling: bool,
	/// Reporting policy for contract violations
	pub contract_mode: ContractMode,
	/// Attribute name searched for on the first render into a container
	pub hydration_marker: String,
	/// Whether the first render into a container attempts hydration at all
	pub hydrate: bool,
}

impl Default for ReconcilerOptions {
	fn default() -> Self {
		Self {
			recycling: true,
			contract_mode: ContractMode::default(),
			hydration_marker: DEFAULT_HYDRATION_MARKER.to_string(),
			hydrate: true,
		}
	}
}

impl ReconcilerOptions {
	/// Creates the default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Enables or disables node recycling.
	pub fn recycling(mut self, enabled: bool) -> Self {
		self.recycling = enabled;
		self
	}

	/// Sets the contract violation policy.
	pub fn contract_mode(mut self, mode: ContractMode) -> Self {
		self.contract_mode = mode;
		self
	}

	/// Sets the hydration root attribute.
	pub fn hydration_marker(mut self, marker: impl Into<String>) -> Self {
		self.hydration_marker = marker.into();
		self
	}

	/// Enables or disables hydration on first render.
	pub fn hydrate(mut self, enabled: bool) -> Self {
		self.hydrate = enabled;
		self
	}

	/// Parses options from a TOML document. Missing keys keep their defaults.
	pub fn from_toml_str(source: &str) -> ReconcileResult<Self> {
		let options: Self =
			toml::from_str(source).map_err(|e| ReconcileError::Config(e.to_string()))?;
		options.validate()?;
		Ok(options)
	}

	/// Checks option consistency.
	pub fn validate(&self) -> ReconcileResult<()> {
		if self.hydrate && self.hydration_marker.trim().is_empty() {
			return Err(ReconcileError::Config(
				"hydration_marker must not be empty while hydration is enabled".to_string(),
			));
		}
		Ok(())
	}
}

//! Error types surfaced by registration, activation and service lookup.

use thiserror::Error;

/// A plugin definition was refused and will never take part in activation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
	#[error("plugin id must not be empty")]
	MissingId,
	#[error("plugin {id} has no name")]
	MissingName { id: String },
	#[error("plugin {id} has no init hook")]
	MissingInit { id: String },
	#[error("plugin {id} is already registered")]
	Duplicate { id: String },
}

/// The dependency graph cannot be ordered. Aborts the whole activation pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
	#[error("plugin {plugin} depends on unknown plugin {dependency}")]
	UnknownDependency { plugin: String, dependency: String },
	#[error("dependency cycle among plugins: {}", .plugins.join(", "))]
	Cycle { plugins: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
	#[error("service name must not be empty (provider {provider})")]
	EmptyName { provider: String },
	/// Raised under the first-wins policy when `name` is already taken.
	#[error("service {name} is already provided by {existing}")]
	AlreadyProvided { name: String, existing: String },
}

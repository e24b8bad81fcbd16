//! Named, typed service instances shared between plugins.

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ServiceError;

/// Type-erased service instance.
pub type AnyService = Arc<dyn Any + Send + Sync>;

/// What happens when a second provider registers an existing service name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateServicePolicy {
	/// Overwrite the existing instance.
	#[default]
	LastWins,
	/// Keep the existing instance and refuse the newcomer.
	FirstWins,
}

struct ServiceEntry {
	provider: String,
	instance: AnyService,
}

pub struct ServiceRegistry {
	policy: DuplicateServicePolicy,
	entries: RwLock<FxHashMap<String, ServiceEntry>>,
}

impl ServiceRegistry {
	pub fn new(policy: DuplicateServicePolicy) -> Self {
		Self {
			policy,
			entries: RwLock::new(FxHashMap::default()),
		}
	}

	pub fn policy(&self) -> DuplicateServicePolicy {
		self.policy
	}

	/// Installs `instance` under `name` on behalf of `provider`.
	///
	/// Every collision is logged with the previous provider, whichever way
	/// the policy resolves it.
	pub fn register(&self, provider: &str, name: &str, instance: AnyService) -> Result<(), ServiceError> {
		if name.trim().is_empty() {
			return Err(ServiceError::EmptyName {
				provider: provider.to_owned(),
			});
		}

		let mut entries = self.entries.write();
		if let Some(existing) = entries.get(name) {
			match self.policy {
				DuplicateServicePolicy::LastWins => warn!(
					service = name,
					previous = %existing.provider,
					plugin = provider,
					"service overwritten"
				),
				DuplicateServicePolicy::FirstWins => {
					warn!(
						service = name,
						previous = %existing.provider,
						plugin = provider,
						"service already provided, keeping first"
					);
					return Err(ServiceError::AlreadyProvided {
						name: name.to_owned(),
						existing: existing.provider.clone(),
					});
				}
			}
		} else {
			debug!(service = name, plugin = provider, "service registered");
		}

		entries.insert(
			name.to_owned(),
			ServiceEntry {
				provider: provider.to_owned(),
				instance,
			},
		);
		Ok(())
	}

	/// Typed lookup. Absent names and type mismatches both yield `None`.
	pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
		let instance = self.get_any(name)?;
		match instance.downcast::<T>() {
			Ok(typed) => Some(typed),
			Err(_) => {
				debug!(
					service = name,
					expected = std::any::type_name::<T>(),
					"service type mismatch"
				);
				None
			}
		}
	}

	pub fn get_any(&self, name: &str) -> Option<AnyService> {
		self.entries
			.read()
			.get(name)
			.map(|entry| Arc::clone(&entry.instance))
	}

	pub fn provider(&self, name: &str) -> Option<String> {
		self.entries.read().get(name).map(|entry| entry.provider.clone())
	}

	/// Registered names, sorted.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
		names.sort_unstable();
		names
	}
}

impl Default for ServiceRegistry {
	fn default() -> Self {
		Self::new(DuplicateServicePolicy::default())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	struct Counter(usize);

	#[test]
	fn typed_lookup_and_mismatch() {
		let services = ServiceRegistry::default();
		services.register("p", "counter", Arc::new(Counter(3))).unwrap();

		assert_eq!(services.get::<Counter>("counter").map(|c| c.0), Some(3));
		assert!(services.get::<String>("counter").is_none());
		assert!(services.get::<Counter>("missing").is_none());
	}

	#[test]
	fn last_wins_overwrites_and_records_provider() {
		let services = ServiceRegistry::new(DuplicateServicePolicy::LastWins);
		services.register("a", "svc", Arc::new(Counter(1))).unwrap();
		services.register("b", "svc", Arc::new(Counter(2))).unwrap();

		assert_eq!(services.get::<Counter>("svc").map(|c| c.0), Some(2));
		assert_eq!(services.provider("svc").as_deref(), Some("b"));
	}

	#[test]
	fn first_wins_refuses_newcomer() {
		let services = ServiceRegistry::new(DuplicateServicePolicy::FirstWins);
		services.register("a", "svc", Arc::new(Counter(1))).unwrap();
		let err = services.register("b", "svc", Arc::new(Counter(2))).unwrap_err();

		assert_eq!(
			err,
			ServiceError::AlreadyProvided {
				name: "svc".into(),
				existing: "a".into()
			}
		);
		assert_eq!(services.get::<Counter>("svc").map(|c| c.0), Some(1));
	}

	#[test]
	fn empty_name_is_rejected() {
		let services = ServiceRegistry::default();
		assert!(services.register("a", " ", Arc::new(Counter(1))).is_err());
		assert!(services.names().is_empty());
	}
}

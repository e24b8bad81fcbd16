//! Dependency ordering for the activation pass.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::error::GraphError;

/// One node of the dependency graph: a plugin id and the ids it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
	pub id: String,
	pub dependencies: Vec<String>,
}

impl DependencyNode {
	pub fn new(id: impl Into<String>, dependencies: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self {
			id: id.into(),
			dependencies: dependencies.into_iter().map(Into::into).collect(),
		}
	}
}

/// Orders `nodes` so every plugin follows its dependencies (Kahn's
/// algorithm). Ties keep registration order.
///
/// Every dependency must name a node in `nodes`; the first unknown one, in
/// registration order, fails the whole graph. When the sort stalls, every
/// node left out of the order is reported as part of the cycle.
pub fn activation_order(nodes: &[DependencyNode]) -> Result<Vec<String>, GraphError> {
	let index: FxHashMap<&str, usize> = nodes
		.iter()
		.enumerate()
		.map(|(i, node)| (node.id.as_str(), i))
		.collect();

	let mut in_degree = vec![0usize; nodes.len()];
	let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
	for (i, node) in nodes.iter().enumerate() {
		for dependency in &node.dependencies {
			let Some(&dep) = index.get(dependency.as_str()) else {
				return Err(GraphError::UnknownDependency {
					plugin: node.id.clone(),
					dependency: dependency.clone(),
				});
			};
			dependents[dep].push(i);
			in_degree[i] += 1;
		}
	}

	let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
	let mut order = Vec::with_capacity(nodes.len());
	while let Some(i) = queue.pop_front() {
		order.push(i);
		for &dependent in &dependents[i] {
			in_degree[dependent] -= 1;
			if in_degree[dependent] == 0 {
				queue.push_back(dependent);
			}
		}
	}

	if order.len() < nodes.len() {
		let plugins = (0..nodes.len())
			.filter(|&i| in_degree[i] > 0)
			.map(|i| nodes[i].id.clone())
			.collect();
		return Err(GraphError::Cycle { plugins });
	}

	Ok(order.into_iter().map(|i| nodes[i].id.clone()).collect())
}

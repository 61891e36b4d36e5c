//! Container image build scheduling
//!
//! Image dependencies of kind `docker` order image builds; dependencies
//! on dist artifacts only mark products whose dists must exist first.
//! Node enumeration and neighbor expansion are both sorted so the output
//! is deterministic regardless of input order.

use slipway_errors::{DistError, Result};
use slipway_types::{DockerDepKind, SpecWithDeps};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Products whose dists must exist and the order in which images build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerPlan {
    /// Products whose dist artifacts the image builds consume, sorted
    pub dist_products: Vec<String>,
    /// Every product in the image closure, in dependency order
    pub image_order: Vec<String>,
}

/// Compute the plan for building the images of `requested`
///
/// Both sets are closures over image-dependency edges starting from the
/// requested products: dependencies on dist artifacts join the dist set,
/// and every reached product joins the image set.
///
/// # Errors
///
/// Returns an error when the image dependencies contain a cycle.
pub fn plan(all: &BTreeMap<String, SpecWithDeps>, requested: &[String]) -> Result<DockerPlan> {
    let mut dist_products: BTreeSet<String> = BTreeSet::new();
    let mut image_products: BTreeSet<String> = requested.iter().cloned().collect();
    let mut queue: VecDeque<String> = requested.iter().cloned().collect();
    let mut seen = image_products.clone();

    while let Some(name) = queue.pop_front() {
        let Some(with_deps) = all.get(&name) else {
            continue;
        };
        for image in &with_deps.spec.config.docker {
            for dep in &image.dependencies {
                if dep.kind != DockerDepKind::Docker {
                    dist_products.insert(dep.product.clone());
                }
                image_products.insert(dep.product.clone());
                if seen.insert(dep.product.clone()) {
                    queue.push_back(dep.product.clone());
                }
            }
        }
    }

    let image_order = topo_sort(all, &image_products)?;
    Ok(DockerPlan {
        dist_products: dist_products.into_iter().collect(),
        image_order,
    })
}

/// Deterministic Kahn topological sort over docker-kind edges
fn topo_sort(all: &BTreeMap<String, SpecWithDeps>, nodes: &BTreeSet<String>) -> Result<Vec<String>> {
    let mut edges: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut in_degree: BTreeMap<&str, usize> = nodes.iter().map(|n| (n.as_str(), 0)).collect();

    for name in nodes {
        let Some(with_deps) = all.get(name) else {
            continue;
        };
        for image in &with_deps.spec.config.docker {
            for dep in &image.dependencies {
                if dep.kind != DockerDepKind::Docker || !nodes.contains(&dep.product) {
                    continue;
                }
                // edge dependency -> dependent: the base image builds first
                if edges
                    .entry(dep.product.as_str())
                    .or_default()
                    .insert(name.as_str())
                {
                    if let Some(degree) = in_degree.get_mut(name.as_str()) {
                        *degree += 1;
                    }
                }
            }
        }
    }

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();
    let mut order = Vec::with_capacity(nodes.len());
    while let Some(&node) = ready.iter().next() {
        ready.remove(node);
        order.push(node.to_string());
        if let Some(dependents) = edges.get(node) {
            for &dependent in dependents {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }
    }

    if order.len() == nodes.len() {
        Ok(order)
    } else {
        let cycle: Vec<String> = nodes
            .iter()
            .filter(|name| !order.contains(*name))
            .cloned()
            .collect();
        Err(DistError::ImageDependencyCycle { cycle }.into())
    }
}

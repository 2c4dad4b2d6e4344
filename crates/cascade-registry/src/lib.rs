//! Deployment-set catalog.
//!
//! Repositories declare their direct dependencies; a deployment set names one
//! or more root repositories and resolves to the roots plus their transitive
//! dependents, ordered so that every repository comes after everything it
//! depends on.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use cascade_core::{CascadeConfig, RepositoryRef};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("repository not declared: {repo}")]
    UnknownRepository { repo: RepositoryRef },

    #[error("dependency cycle detected involving repositories: {}", join(.repos))]
    DependencyCycle { repos: Vec<RepositoryRef> },

    #[error("unknown deployment set '{name}' (available: {})", .available.join(", "))]
    UnknownSet { name: String, available: Vec<String> },

    #[error("'{dependent}' is ordered before its dependency '{dependency}'")]
    OrderViolation {
        dependency: RepositoryRef,
        dependent: RepositoryRef,
    },

    #[error("'{repo}' appears more than once in the deployment order")]
    Duplicate { repo: RepositoryRef },
}

fn join(repos: &[RepositoryRef]) -> String {
    repos
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Directed dependency graph: `dependency -> dependents`.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// `repo -> direct dependencies`
    upstream: BTreeMap<RepositoryRef, BTreeSet<RepositoryRef>>,
    /// `repo -> direct dependents`
    downstream: BTreeMap<RepositoryRef, BTreeSet<RepositoryRef>>,
}

impl DependencyGraph {
    pub fn from_config(cfg: &CascadeConfig) -> Result<Self, RegistryError> {
        let mut graph = Self::default();
        for repo in cfg.repositories.keys() {
            graph.add_repository(repo.clone());
        }
        for (repo, entry) in &cfg.repositories {
            for dep in &entry.depends_on {
                graph.add_dependency(dep, repo)?;
            }
        }
        let all: BTreeSet<RepositoryRef> = graph.upstream.keys().cloned().collect();
        graph.topological_order(&all)?;
        Ok(graph)
    }

    pub fn add_repository(&mut self, repo: RepositoryRef) {
        self.upstream.entry(repo.clone()).or_default();
        self.downstream.entry(repo).or_default();
    }

    /// Records that `dependent` must be deployed after `dependency`.
    pub fn add_dependency(
        &mut self,
        dependency: &RepositoryRef,
        dependent: &RepositoryRef,
    ) -> Result<(), RegistryError> {
        for repo in [dependency, dependent] {
            if !self.upstream.contains_key(repo) {
                return Err(RegistryError::UnknownRepository { repo: repo.clone() });
            }
        }
        self.upstream
            .entry(dependent.clone())
            .or_default()
            .insert(dependency.clone());
        self.downstream
            .entry(dependency.clone())
            .or_default()
            .insert(dependent.clone());
        Ok(())
    }

    pub fn dependencies(&self, repo: &RepositoryRef) -> impl Iterator<Item = &RepositoryRef> {
        self.upstream.get(repo).into_iter().flatten()
    }

    /// `roots` plus every repository that transitively depends on one of them.
    pub fn with_dependents(
        &self,
        roots: &[RepositoryRef],
    ) -> Result<BTreeSet<RepositoryRef>, RegistryError> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<&RepositoryRef> = VecDeque::new();
        for root in roots {
            if !self.downstream.contains_key(root) {
                return Err(RegistryError::UnknownRepository { repo: root.clone() });
            }
            queue.push_back(root);
        }

        while let Some(repo) = queue.pop_front() {
            if !seen.insert(repo.clone()) {
                continue;
            }
            queue.extend(self.downstream.get(repo).into_iter().flatten());
        }
        Ok(seen)
    }

    /// Orders `subset` so dependencies precede dependents.
    ///
    /// Kahn's algorithm over the edges inside `subset`; ties go to the
    /// lexicographically smallest repository so the order is stable.
    pub fn topological_order(
        &self,
        subset: &BTreeSet<RepositoryRef>,
    ) -> Result<Vec<RepositoryRef>, RegistryError> {
        let mut in_degree: BTreeMap<&RepositoryRef, usize> = subset
            .iter()
            .map(|repo| {
                let degree = self
                    .dependencies(repo)
                    .filter(|dep| subset.contains(*dep))
                    .count();
                (repo, degree)
            })
            .collect();

        let mut ready: BTreeSet<&RepositoryRef> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&repo, _)| repo)
            .collect();

        let mut sorted = Vec::with_capacity(subset.len());
        while let Some(repo) = ready.pop_first() {
            sorted.push(repo.clone());
            for dependent in self.downstream.get(repo).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if sorted.len() != subset.len() {
            let repos = in_degree
                .into_iter()
                .filter(|(_, degree)| *degree > 0)
                .map(|(repo, _)| repo.clone())
                .collect();
            return Err(RegistryError::DependencyCycle { repos });
        }
        Ok(sorted)
    }

    /// Checks that no repository in `order` precedes one of its dependencies
    /// and that none appears twice.
    pub fn verify_order(&self, order: &[RepositoryRef]) -> Result<(), RegistryError> {
        let mut placed = BTreeSet::new();
        let listed: BTreeSet<&RepositoryRef> = order.iter().collect();
        for repo in order {
            if placed.contains(repo) {
                return Err(RegistryError::Duplicate { repo: repo.clone() });
            }
            for dep in self.dependencies(repo) {
                if listed.contains(dep) && !placed.contains(dep) {
                    return Err(RegistryError::OrderViolation {
                        dependency: dep.clone(),
                        dependent: repo.clone(),
                    });
                }
            }
            placed.insert(repo.clone());
        }
        Ok(())
    }
}

/// A named, ordered list of repositories processed in one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSet {
    pub name: String,
    pub repositories: Vec<RepositoryRef>,
}

/// All deployment sets, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Registry {
    graph: DependencyGraph,
    sets: Vec<DeploymentSet>,
}

impl Registry {
    #[instrument(skip(cfg))]
    pub fn from_config(cfg: &CascadeConfig) -> Result<Self, RegistryError> {
        let graph = DependencyGraph::from_config(cfg)?;

        let mut sets = Vec::with_capacity(cfg.sets.len());
        for set in &cfg.sets {
            let members = if set.include_dependents {
                graph.with_dependents(&set.from)?
            } else {
                set.from.iter().cloned().collect()
            };
            let repositories = graph.topological_order(&members)?;
            graph.verify_order(&repositories)?;
            debug!(
                "set '{}' resolves to [{}]",
                set.name,
                join(&repositories)
            );
            sets.push(DeploymentSet {
                name: set.name.clone(),
                repositories,
            });
        }

        Ok(Self { graph, sets })
    }

    /// Every deployment set in declaration order.
    pub fn list_options(&self) -> &[DeploymentSet] {
        &self.sets
    }

    pub fn resolve(&self, name: &str) -> Result<&DeploymentSet, RegistryError> {
        self.sets
            .iter()
            .find(|set| set.name == name)
            .ok_or_else(|| RegistryError::UnknownSet {
                name: name.to_string(),
                available: self.sets.iter().map(|s| s.name.clone()).collect(),
            })
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }
}

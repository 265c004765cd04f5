//! Build planning
//!
//! Computes the order schema files are compiled in. The default plan orders
//! files so every file comes after the files declaring the models it
//! references, breaking ties by path; the listing plan keeps plain path
//! order and leaves forward references to the build to report.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::path::PathBuf;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collect::scan_file;
use crate::error::{ComposeError, Result};
use crate::resolver::{referenced_models, suggest};
use crate::schema::SchemaFile;

/// How the build order is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildOrder {
    /// Dependencies first, path order among independent files
    #[default]
    Dependency,
    /// Path order as listed
    Listing,
}

impl std::str::FromStr for BuildOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "dependency" => Ok(BuildOrder::Dependency),
            "listing" => Ok(BuildOrder::Listing),
            other => Err(format!("unknown build order '{}'", other)),
        }
    }
}

/// Ordered files ready for the orchestrator
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub files: Vec<SchemaFile>,
    /// Model name → file declaring it
    pub declared: BTreeMap<String, PathBuf>,
}

impl BuildPlan {
    pub fn paths(&self) -> Vec<&PathBuf> {
        self.files.iter().map(|f| &f.path).collect()
    }
}

/// Order `files` for compilation.
///
/// Fails on unparsable files, models declared twice, placeholders naming a
/// model no file declares and, for [`BuildOrder::Dependency`], reference
/// cycles between files.
pub fn plan_build(mut files: Vec<SchemaFile>, order: BuildOrder) -> Result<BuildPlan> {
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let mut declared: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut owner: BTreeMap<String, usize> = BTreeMap::new();
    for (idx, file) in files.iter().enumerate() {
        let scan = scan_file(file)?;
        for model in scan.models {
            if let Some(first) = declared.get(&model.name) {
                return Err(ComposeError::DuplicateModel {
                    model: model.name,
                    first: first.clone(),
                    second: file.path.clone(),
                });
            }
            declared.insert(model.name.clone(), file.path.clone());
            owner.insert(model.name, idx);
        }
    }

    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..files.len()).map(|idx| graph.add_node(idx)).collect();
    for (idx, file) in files.iter().enumerate() {
        for model in referenced_models(&file.content) {
            let Some(&from) = owner.get(&model) else {
                return Err(ComposeError::ForwardReference {
                    file: file.path.clone(),
                    model: model.clone(),
                    suggestion: suggest(&model, declared.keys().map(|k| k.as_str())),
                });
            };
            if from != idx {
                debug!(from = %files[from].path.display(), to = %file.path.display(), "file dependency");
                graph.update_edge(nodes[from], nodes[idx], ());
            }
        }
    }

    let ordered = match order {
        BuildOrder::Listing => (0..files.len()).collect(),
        BuildOrder::Dependency => dependency_order(&graph, &files)?,
    };

    let mut slots: Vec<Option<SchemaFile>> = files.into_iter().map(Some).collect();
    let files: Vec<SchemaFile> = ordered
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect();

    info!(files = files.len(), models = declared.len(), ?order, "planned build");
    Ok(BuildPlan { files, declared })
}

/// Kahn's algorithm, always taking the lowest ready path index
fn dependency_order(graph: &DiGraph<usize, ()>, files: &[SchemaFile]) -> Result<Vec<usize>> {
    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(idx, _)| Reverse(idx))
        .collect();

    let mut ordered = Vec::with_capacity(files.len());
    while let Some(Reverse(idx)) = ready.pop() {
        ordered.push(idx);
        for next in graph.neighbors_directed(NodeIndex::new(idx), Direction::Outgoing) {
            let degree = &mut in_degree[next.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.push(Reverse(next.index()));
            }
        }
    }

    if ordered.len() < files.len() {
        let cycle = kosaraju_scc(graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut members: Vec<usize> = scc.iter().map(|n| graph[*n]).collect();
                members.sort_unstable();
                members
            })
            .min()
            .unwrap_or_default();
        return Err(ComposeError::DependencyCycle {
            files: cycle.into_iter().map(|idx| files[idx].path.clone()).collect(),
        });
    }

    Ok(ordered)
}

//! Build graph types and ordering.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::ast::TargetKind;

/// How a node's output is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Recipe {
    /// Compile one source file into an object.
    Compile {
        /// Compiler command.
        command: String,
        /// Ordered compiler arguments, excluding `-c` and `-o`.
        args: Vec<String>,
        /// Source file.
        source: Utf8PathBuf,
    },
    /// Link objects into an executable or shared library.
    Link {
        /// Linker driver command.
        command: String,
        /// Ordered arguments placed before the inputs.
        args: Vec<String>,
        /// Objects and libraries, in link order.
        inputs: Vec<Utf8PathBuf>,
        /// `-L` and `-l` arguments placed after the inputs.
        libs: Vec<String>,
    },
    /// Archive objects into a static library.
    Archive {
        /// Archiver command.
        command: String,
        /// Archiver flags.
        args: Vec<String>,
        /// Archive members.
        inputs: Vec<Utf8PathBuf>,
    },
    /// Recipe lines written verbatim.
    Raw {
        /// Lines of the recipe.
        lines: Vec<String>,
    },
}

/// Whether a node was declared by the user or derived from a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeKind {
    /// A declared target.
    Target {
        /// Declared kind.
        kind: TargetKind,
    },
    /// An object compiled for `owner`.
    Object {
        /// Name of the target the object is linked into.
        owner: String,
    },
}

/// Something a node needs before its recipe can run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Prerequisite {
    /// Another node in the graph, by name.
    Node(String),
    /// A file that no rule produces.
    File(Utf8PathBuf),
}

/// A single rule in the build graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Unique node name. Targets use their declared name, objects their
    /// output path.
    pub name: String,
    /// File the recipe produces, or the rule name for phony nodes.
    pub output: Utf8PathBuf,
    /// Declared or derived.
    pub kind: NodeKind,
    /// Prerequisites in declaration order.
    pub prerequisites: Vec<Prerequisite>,
    /// How the output is produced.
    pub recipe: Recipe,
    /// The rule does not produce a file.
    pub phony: bool,
}

impl Node {
    /// Names of the nodes this node depends on.
    pub fn node_dependencies(&self) -> impl Iterator<Item = &str> {
        self.prerequisites.iter().filter_map(|p| match p {
            Prerequisite::Node(name) => Some(name.as_str()),
            Prerequisite::File(_) => None,
        })
    }

    /// Whether the node is a compiled target (not an object or custom rule).
    #[must_use]
    pub fn is_compiled_target(&self) -> bool {
        matches!(&self.kind, NodeKind::Target { kind } if kind.is_compiled())
    }
}

/// The validated dependency graph.
///
/// Nodes are stored in declaration order, which is the tie-break used when
/// ordering rules for emission.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BuildGraph {
    /// All nodes keyed by name.
    pub nodes: IndexMap<String, Node>,
}

/// Errors produced while building the graph.
#[derive(Debug, Error, Diagnostic)]
pub enum IrGenError {
    /// Two declarations share a name.
    #[error("target '{name}' is declared more than once")]
    #[diagnostic(code(easymake::ir::duplicate_target))]
    DuplicateTarget {
        /// The repeated name.
        name: String,
    },

    /// Two rules would write the same file or rule name.
    #[error("'{output}' would be produced by both '{first}' and '{second}'")]
    #[diagnostic(code(easymake::ir::duplicate_output))]
    DuplicateOutput {
        /// The contested output.
        output: String,
        /// Node that claimed it first.
        first: String,
        /// Node that tried to claim it again.
        second: String,
    },

    /// A target lists the same source file twice.
    #[error("target '{target}' lists source '{path}' more than once")]
    #[diagnostic(code(easymake::ir::duplicate_source))]
    DuplicateSource {
        /// Target declaring the sources.
        target: String,
        /// The repeated source.
        path: Utf8PathBuf,
    },

    /// Two sources of one target compile to the same object file.
    #[error("sources '{first}' and '{second}' of target '{target}' both compile to '{object}'")]
    #[diagnostic(
        code(easymake::ir::object_collision),
        help("rename one of the sources or move it into another target")
    )]
    ObjectCollision {
        /// Target declaring the sources.
        target: String,
        /// The contested object file.
        object: Utf8PathBuf,
        /// Source that produced the object first.
        first: Utf8PathBuf,
        /// Source that would overwrite it.
        second: Utf8PathBuf,
    },

    /// Declared dependencies form a cycle.
    #[error("circular dependency detected: {}", .cycle.join(" -> "))]
    #[diagnostic(code(easymake::ir::circular_dependency))]
    CircularDependency {
        /// The cycle, starting and ending at its smallest name.
        cycle: Vec<String>,
    },

    /// A declaration has an impossible shape.
    #[error("target '{name}' is invalid: {reason}")]
    #[diagnostic(code(easymake::ir::invalid_target))]
    InvalidTarget {
        /// Offending target.
        name: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

impl BuildGraph {
    /// Look up a node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// All `(dependency, dependent)` edges between nodes, in declaration
    /// order of the dependents.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes
            .values()
            .flat_map(|node| node.node_dependencies().map(move |dep| (dep, node.name.as_str())))
    }

    /// Nodes ordered so that every node follows its dependencies.
    ///
    /// Among nodes whose dependencies are all placed, the one declared first
    /// comes next, so the order is fully determined by the graph.
    ///
    /// # Errors
    ///
    /// Returns [`IrGenError::CircularDependency`] when the nodes cannot be
    /// ordered, listing the nodes left over in name order.
    pub fn topological_order(&self) -> Result<Vec<&Node>, IrGenError> {
        let count = self.nodes.len();
        let mut pending = vec![0usize; count];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
        for (idx, node) in self.nodes.values().enumerate() {
            for dep in node.node_dependencies() {
                if let Some(dep_idx) = self.nodes.get_index_of(dep) {
                    if let Some(slot) = pending.get_mut(idx) {
                        *slot += 1;
                    }
                    if let Some(list) = dependents.get_mut(dep_idx) {
                        list.push(idx);
                    }
                }
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = pending
            .iter()
            .enumerate()
            .filter(|(_, n)| **n == 0)
            .map(|(idx, _)| Reverse(idx))
            .collect();
        let mut order = Vec::with_capacity(count);
        while let Some(Reverse(idx)) = ready.pop() {
            if let Some((_, node)) = self.nodes.get_index(idx) {
                order.push(node);
            }
            for &next in dependents.get(idx).map_or(&[][..], Vec::as_slice) {
                if let Some(slot) = pending.get_mut(next) {
                    *slot -= 1;
                    if *slot == 0 {
                        ready.push(Reverse(next));
                    }
                }
            }
        }

        if order.len() == count {
            return Ok(order);
        }
        let mut cycle: Vec<String> = self
            .nodes
            .values()
            .enumerate()
            .filter(|(idx, _)| pending.get(*idx).is_some_and(|n| *n > 0))
            .map(|(_, node)| node.name.clone())
            .collect();
        cycle.sort();
        Err(IrGenError::CircularDependency { cycle })
    }
}

//! Intermediate Representation structures.
//!
//! This module defines the build graph produced after the configuration has
//! been validated and merged. The graph holds one node per declared target
//! plus one object node per compiled source; prerequisites reference other
//! nodes by name or plain files by path. It carries no Makefile syntax.
//!
//! # Examples
//!
//! ```
//! use easymake::ast::EasymakeConfig;
//! use easymake::compiler::CompilerSpec;
//! use easymake::ir::BuildGraph;
//! use easymake::toolchain::ArchiverPolicy;
//!
//! let config: EasymakeConfig = serde_json::from_value(serde_json::json!({
//!     "targets": [{ "name": "app", "sources": ["main.c", "util.c"] }],
//! }))
//! .expect("schema");
//! let spec = CompilerSpec::from_decl(&config.compiler, ArchiverPolicy::Derived).expect("spec");
//! let graph = BuildGraph::from_config(&config, &spec).expect("graph");
//! let edges: Vec<_> = graph.edges().collect();
//! assert_eq!(edges, vec![("main.o", "app"), ("util.o", "app")]);
//! ```

mod cycle;
mod from_config;
mod graph;

pub use graph::{BuildGraph, IrGenError, Node, NodeKind, Prerequisite, Recipe};

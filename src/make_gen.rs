//! Makefile generator.
//!
//! This module converts a [`crate::ir::BuildGraph`] into Makefile text. Rules
//! are written in dependency order with ties broken by declaration order, so
//! an unchanged graph always produces byte-identical output.

use crate::ir::{BuildGraph, IrGenError, Node, Prerequisite, Recipe};
use camino::Utf8Path;
use itertools::Itertools;
use miette::Diagnostic;
use std::fmt::{self, Display, Formatter, Write};
use thiserror::Error;

/// Errors raised while rendering a Makefile.
#[derive(Debug, Error, Diagnostic)]
pub enum MakeGenError {
    /// The graph could not be ordered.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Order(#[from] IrGenError),
    /// Writing to the output buffer failed.
    #[error("failed to format Makefile")]
    #[diagnostic(code(easymake::make_gen::format))]
    Format(#[from] fmt::Error),
}

/// Generate a Makefile as a string.
///
/// # Errors
///
/// Returns [`MakeGenError::Order`] if the graph contains a cycle; graphs
/// returned by [`BuildGraph::from_config`] never do.
pub fn generate(graph: &BuildGraph) -> Result<String, MakeGenError> {
    let order = graph.topological_order()?;
    let mut out = String::new();

    writeln!(
        out,
        "# Generated by easymake {}. Do not edit.",
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;

    let mut phony = ["all", "clean"]
        .into_iter()
        .map(ToOwned::to_owned)
        .chain(order.iter().flat_map(|node| phony_names(node)));
    writeln!(out, ".PHONY: {}", phony.join(" "))?;
    writeln!(out)?;

    let defaults = graph
        .nodes
        .values()
        .filter(|node| node.is_compiled_target())
        .map(|node| node.output.as_str());
    writeln!(out, "{}", rule_head("all", defaults))?;
    writeln!(out)?;

    for node in &order {
        write!(out, "{}", DisplayRule { node, graph })?;
    }

    let artefacts = order
        .iter()
        .filter(|node| !node.phony && !matches!(node.recipe, Recipe::Raw { .. }))
        .map(|node| node.output.as_str())
        .join(" ");
    writeln!(out, "clean:")?;
    if !artefacts.is_empty() {
        writeln!(out, "\trm -f {artefacts}")?;
    }

    Ok(out)
}

/// Rule names of `node` that must be declared `.PHONY`.
fn phony_names(node: &Node) -> Vec<String> {
    let mut names = Vec::new();
    if node.phony {
        names.push(node.output.to_string());
    }
    if has_alias(node) {
        names.push(node.name.clone());
    }
    names
}

/// Whether `node` needs a `name: output` alias rule.
fn has_alias(node: &Node) -> bool {
    !node.phony && node.output.as_str() != node.name
}

fn rule_head<'a>(target: &str, prerequisites: impl Iterator<Item = &'a str>) -> String {
    let mut head = format!("{target}:");
    for prerequisite in prerequisites {
        head.push(' ');
        head.push_str(prerequisite);
    }
    head
}

/// Space-join the parts of a command line, skipping empty arguments.
fn command_line<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts.into_iter().filter(|part| !part.is_empty()).join(" ")
}

/// Render the recipe lines for `recipe` producing `output`.
fn recipe_lines(recipe: &Recipe, output: &Utf8Path) -> Vec<String> {
    match recipe {
        Recipe::Compile {
            command,
            args,
            source,
        } => vec![command_line(
            std::iter::once(command.as_str())
                .chain(args.iter().map(String::as_str))
                .chain(["-c", source.as_str(), "-o", output.as_str()]),
        )],
        Recipe::Link {
            command,
            args,
            inputs,
            libs,
        } => vec![command_line(
            std::iter::once(command.as_str())
                .chain(args.iter().map(String::as_str))
                .chain(inputs.iter().map(|input| input.as_str()))
                .chain(libs.iter().map(String::as_str))
                .chain(["-o", output.as_str()]),
        )],
        Recipe::Archive {
            command,
            args,
            inputs,
        } => vec![command_line(
            std::iter::once(command.as_str())
                .chain(args.iter().map(String::as_str))
                .chain(std::iter::once(output.as_str()))
                .chain(inputs.iter().map(|input| input.as_str())),
        )],
        Recipe::Raw { lines } => lines.clone(),
    }
}

/// Wrapper struct to display one node as a Makefile rule.
struct DisplayRule<'a> {
    node: &'a Node,
    graph: &'a BuildGraph,
}

impl DisplayRule<'_> {
    fn prerequisite(&self, prerequisite: &'_ Prerequisite) -> String {
        match prerequisite {
            Prerequisite::Node(name) => self
                .graph
                .node(name)
                .map_or_else(|| name.clone(), |dep| dep.output.to_string()),
            Prerequisite::File(path) => path.to_string(),
        }
    }
}

impl Display for DisplayRule<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let prerequisites: Vec<String> = self
            .node
            .prerequisites
            .iter()
            .map(|p| self.prerequisite(p))
            .collect();
        writeln!(
            f,
            "{}",
            rule_head(
                self.node.output.as_str(),
                prerequisites.iter().map(String::as_str)
            )
        )?;
        for line in recipe_lines(&self.node.recipe, &self.node.output) {
            writeln!(f, "\t{line}")?;
        }
        writeln!(f)?;
        if has_alias(self.node) {
            writeln!(f, "{}: {}", self.node.name, self.node.output)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

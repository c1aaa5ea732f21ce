//! Configuration-to-IR conversion.

use std::collections::{HashMap, HashSet};

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use itertools::Itertools;
use tracing::debug;

use crate::ast::{EasymakeConfig, PropertyDecls, StringOrList, TargetKind};
use crate::compiler::{CompilerProperties, CompilerSpec};

use super::{
    cycle,
    graph::{BuildGraph, IrGenError, Node, NodeKind, Prerequisite, Recipe},
};

/// Rule names the emitter writes itself.
const RESERVED_RULES: &[&str] = &["all", "clean"];

/// Extensions compiled with the C++ compiler.
const CXX_EXTENSIONS: &[&str] = &["cc", "cpp", "cxx", "c++", "C"];

/// A target declaration normalised across the three config lists.
#[derive(Debug)]
struct Declaration<'a> {
    name: &'a str,
    kind: TargetKind,
    output: Utf8PathBuf,
    sources: Vec<Utf8PathBuf>,
    dependencies: Vec<String>,
    recipe: Option<Vec<String>>,
    overrides: Option<&'a PropertyDecls>,
    phony: bool,
}

impl Declaration<'_> {
    fn validate(&self) -> Result<(), IrGenError> {
        let reason = match (self.kind.is_compiled(), &self.recipe) {
            (true, Some(_)) => Some("only custom targets may declare a recipe"),
            (true, None) if self.sources.is_empty() => Some("no sources to compile"),
            (false, None) => Some("custom targets need a recipe"),
            (false, Some(lines)) if lines.is_empty() => Some("custom targets need a recipe"),
            (false, Some(_)) if !self.sources.is_empty() => {
                Some("custom targets do not compile sources; list them as dependencies")
            }
            _ => None,
        };
        reason.map_or(Ok(()), |reason| {
            Err(IrGenError::InvalidTarget {
                name: self.name.to_owned(),
                reason,
            })
        })
    }
}

/// Default output file for a target of `kind` called `name`.
fn default_output(name: &str, kind: TargetKind) -> Utf8PathBuf {
    match kind {
        TargetKind::Binary | TargetKind::Custom => Utf8PathBuf::from(name),
        TargetKind::StaticLib => Utf8PathBuf::from(format!("lib{name}.a")),
        TargetKind::SharedLib => Utf8PathBuf::from(format!("lib{name}.so")),
    }
}

fn collect_declarations(config: &EasymakeConfig) -> Vec<Declaration<'_>> {
    let rules = config.extra_compiler.iter().map(|rule| Declaration {
        name: &rule.target,
        kind: TargetKind::Custom,
        output: Utf8PathBuf::from(&rule.target),
        sources: Vec::new(),
        dependencies: rule.dependencies.to_vec(),
        recipe: Some(rule.recipe.to_vec()),
        overrides: None,
        phony: false,
    });
    let custom = config.custom_target.iter().map(|target| Declaration {
        name: &target.name,
        kind: TargetKind::Custom,
        output: Utf8PathBuf::from(&target.name),
        sources: Vec::new(),
        dependencies: target.dependencies.to_vec(),
        recipe: Some(target.recipe.to_vec()),
        overrides: None,
        phony: true,
    });
    let targets = config.targets.iter().map(|target| Declaration {
        name: &target.name,
        kind: target.kind,
        output: target
            .output
            .as_deref()
            .map_or_else(|| default_output(&target.name, target.kind), Utf8PathBuf::from),
        sources: target.sources.to_vec().into_iter().map(Utf8PathBuf::from).collect(),
        dependencies: target.dependencies.to_vec(),
        recipe: target.recipe.as_ref().map(StringOrList::to_vec),
        overrides: Some(&target.properties),
        phony: target.kind == TargetKind::Custom && target.output.is_none(),
    });
    rules.chain(custom).chain(targets).collect()
}

/// The object file compiled from `source`.
fn object_path(source: &Utf8Path) -> Utf8PathBuf {
    source.with_extension("o")
}

fn is_cxx_source(source: &Utf8Path) -> bool {
    source
        .extension()
        .is_some_and(|ext| CXX_EXTENSIONS.contains(&ext))
}

/// Records which node writes each make target so two rules never race for
/// the same file.
#[derive(Default)]
struct Claims {
    owners: HashMap<String, String>,
}

impl Claims {
    fn claim(&mut self, rule: &str, owner: &str) -> Result<(), IrGenError> {
        match self.owners.get(rule) {
            Some(first) if first != owner => Err(IrGenError::DuplicateOutput {
                output: rule.to_owned(),
                first: first.clone(),
                second: owner.to_owned(),
            }),
            Some(_) => Ok(()),
            None => {
                self.owners.insert(rule.to_owned(), owner.to_owned());
                Ok(())
            }
        }
    }
}

struct GraphBuilder<'a> {
    spec: &'a CompilerSpec,
    nodes: IndexMap<String, Node>,
    claims: Claims,
}

impl<'a> GraphBuilder<'a> {
    fn new(spec: &'a CompilerSpec) -> Self {
        let mut claims = Claims::default();
        for reserved in RESERVED_RULES {
            claims
                .owners
                .insert((*reserved).to_owned(), format!("<{reserved}>"));
        }
        Self {
            spec,
            nodes: IndexMap::new(),
            claims,
        }
    }

    fn add(&mut self, node: Node, owner: &str) -> Result<(), IrGenError> {
        self.claims.claim(&node.name, owner)?;
        self.claims.claim(node.output.as_str(), owner)?;
        if self.nodes.contains_key(&node.name) {
            return Err(IrGenError::DuplicateOutput {
                output: node.name,
                first: owner.to_owned(),
                second: owner.to_owned(),
            });
        }
        self.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    fn add_custom(&mut self, decl: &Declaration<'_>) -> Result<(), IrGenError> {
        self.add(
            Node {
                name: decl.name.to_owned(),
                output: decl.output.clone(),
                kind: NodeKind::Target { kind: decl.kind },
                prerequisites: decl
                    .dependencies
                    .iter()
                    .map(|dep| Prerequisite::Node(dep.clone()))
                    .collect(),
                recipe: Recipe::Raw {
                    lines: decl.recipe.clone().unwrap_or_default(),
                },
                phony: decl.phony,
            },
            decl.name,
        )
    }

    fn add_compiled(
        &mut self,
        decl: &Declaration<'_>,
        outputs: &HashMap<&str, (TargetKind, Utf8PathBuf)>,
    ) -> Result<(), IrGenError> {
        let spec = self.spec;
        let props = decl.overrides.map_or_else(
            || spec.properties.clone(),
            |overrides| spec.properties.for_target(overrides),
        );
        let toolchain = &spec.toolchain;

        let mut objects = Vec::with_capacity(decl.sources.len());
        let mut compiled_from: HashMap<Utf8PathBuf, &Utf8Path> = HashMap::new();
        for source in &decl.sources {
            let output = object_path(source);
            if let Some(first) = compiled_from.insert(output.clone(), source.as_path()) {
                let target = decl.name.to_owned();
                return Err(if first == source.as_path() {
                    IrGenError::DuplicateSource {
                        target,
                        path: source.clone(),
                    }
                } else {
                    IrGenError::ObjectCollision {
                        target,
                        object: output,
                        first: first.to_owned(),
                        second: source.clone(),
                    }
                });
            }
            let (command, lang_flags) = if is_cxx_source(source) {
                (toolchain.cxx.value(), props.ccflags.value())
            } else {
                (toolchain.cc.value(), props.cflags.value())
            };
            let mut args: Vec<String> = props.flags.value().clone();
            args.extend(lang_flags.iter().cloned());
            if decl.kind == TargetKind::SharedLib {
                args.push("-fPIC".to_owned());
            }
            args.extend(include_args(&props));
            self.add(
                Node {
                    name: output.to_string(),
                    output: output.clone(),
                    kind: NodeKind::Object {
                        owner: decl.name.to_owned(),
                    },
                    prerequisites: vec![Prerequisite::File(source.clone())],
                    recipe: Recipe::Compile {
                        command: command.clone(),
                        args,
                        source: source.clone(),
                    },
                    phony: false,
                },
                decl.name,
            )?;
            objects.push(output);
        }

        let library_inputs: Vec<Utf8PathBuf> = decl
            .dependencies
            .iter()
            .filter_map(|dep| outputs.get(dep.as_str()))
            .filter(|(kind, _)| matches!(kind, TargetKind::StaticLib | TargetKind::SharedLib))
            .map(|(_, output)| output.clone())
            .unique()
            .collect();

        let prerequisites = objects
            .iter()
            .map(|object| Prerequisite::Node(object.to_string()))
            .chain(
                decl.dependencies
                    .iter()
                    .map(|dep| Prerequisite::Node(dep.clone())),
            )
            .collect();

        let recipe = if decl.kind == TargetKind::StaticLib {
            Recipe::Archive {
                command: toolchain.ar.value().clone(),
                args: props.arflags.value().clone(),
                inputs: objects,
            }
        } else {
            let command = if decl.sources.iter().any(|s| is_cxx_source(s)) {
                toolchain.cxx.value()
            } else {
                toolchain.cc.value()
            };
            let mut args: Vec<String> = props.flags.value().clone();
            if decl.kind == TargetKind::SharedLib {
                args.push("-shared".to_owned());
            }
            args.extend(props.ldflags.value().iter().cloned());
            let mut inputs = objects;
            inputs.extend(library_inputs);
            Recipe::Link {
                command: command.clone(),
                args,
                inputs,
                libs: library_args(&props),
            }
        };

        self.add(
            Node {
                name: decl.name.to_owned(),
                output: decl.output.clone(),
                kind: NodeKind::Target { kind: decl.kind },
                prerequisites,
                recipe,
                phony: false,
            },
            decl.name,
        )
    }

    /// Point every prerequisite at the rule that produces it.
    ///
    /// A name may refer to a node directly or to the output file of a rule;
    /// anything else is a plain file that no rule builds.
    fn resolve_prerequisites(&mut self) {
        let by_output: HashMap<String, String> = self
            .nodes
            .values()
            .map(|node| (node.output.to_string(), node.name.clone()))
            .collect();
        let names: HashSet<String> = self.nodes.keys().cloned().collect();
        for node in self.nodes.values_mut() {
            for prerequisite in &mut node.prerequisites {
                let reference = match &*prerequisite {
                    Prerequisite::Node(name) if names.contains(name) => continue,
                    Prerequisite::Node(name) => name.clone(),
                    Prerequisite::File(path) => path.to_string(),
                };
                let resolved = by_output.get(&reference).map_or_else(
                    || Prerequisite::File(Utf8PathBuf::from(&reference)),
                    |owner| Prerequisite::Node(owner.clone()),
                );
                if matches!(resolved, Prerequisite::File(_)) {
                    debug!(
                        dependent = %node.name,
                        file = %reference,
                        "treating prerequisite as a plain file"
                    );
                }
                *prerequisite = resolved;
            }
        }
    }
}

fn include_args(props: &CompilerProperties) -> Vec<String> {
    let search = props.hpath.value().iter().map(|dir| format!("-I{dir}"));
    let forced = props
        .headers
        .value()
        .iter()
        .flat_map(|header| ["-include".to_owned(), header.clone()]);
    search.chain(forced).collect()
}

fn library_args(props: &CompilerProperties) -> Vec<String> {
    let search = props.libpath.value().iter().map(|dir| format!("-L{dir}"));
    let links = props.links.value().iter().map(|lib| format!("-l{lib}"));
    search.chain(links).collect()
}

impl BuildGraph {
    /// Build the dependency graph for `config` using the merged `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`IrGenError`] when two declarations share a name or output,
    /// a declaration has an invalid shape, or the declared dependencies
    /// form a cycle. No graph is returned in any of these cases.
    pub fn from_config(config: &EasymakeConfig, spec: &CompilerSpec) -> Result<Self, IrGenError> {
        let declarations = collect_declarations(config);

        let mut seen = HashSet::new();
        for decl in &declarations {
            if !seen.insert(decl.name) {
                return Err(IrGenError::DuplicateTarget {
                    name: decl.name.to_owned(),
                });
            }
            decl.validate()?;
        }
        // Dependencies may name a target or its output file.
        let mut outputs: HashMap<&str, (TargetKind, Utf8PathBuf)> = HashMap::new();
        for decl in &declarations {
            let produced = (decl.kind, decl.output.clone());
            outputs.insert(decl.output.as_str(), produced.clone());
            outputs.insert(decl.name, produced);
        }

        let mut builder = GraphBuilder::new(spec);
        for decl in &declarations {
            if decl.kind.is_compiled() {
                builder.add_compiled(decl, &outputs)?;
            } else {
                builder.add_custom(decl)?;
            }
        }
        builder.resolve_prerequisites();

        let graph = Self {
            nodes: builder.nodes,
        };
        graph.detect_cycles()?;
        debug!(nodes = graph.nodes.len(), "built dependency graph");
        Ok(graph)
    }

    fn detect_cycles(&self) -> Result<(), IrGenError> {
        cycle::find_cycle(&self.nodes)
            .map_or(Ok(()), |cycle| Err(IrGenError::CircularDependency { cycle }))
    }
}

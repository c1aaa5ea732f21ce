//! easymake core library.
//!
//! Compiles a declarative YAML project description into a deterministic
//! Makefile. The pipeline runs [`manifest`] (YAML to [`ast`]),
//! [`compiler`] (toolchain deduction and property merging), [`ir`] (the
//! dependency graph) and [`make_gen`] (Makefile text). [`runner`] drives it
//! from the command line defined in [`cli`].

pub mod ast;
pub mod cli;
pub mod compiler;
pub mod error;
pub mod ir;
pub mod make_gen;
pub mod manifest;
pub mod property;
pub mod runner;
pub mod toolchain;

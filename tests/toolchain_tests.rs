//! Toolchain deduction and property precedence through the public API.

use easymake::ast::{CommandDecl, CompilerDecl, PropertyDecls, StringOrList};
use easymake::compiler::CompilerSpec;
use easymake::property::Provenance;
use easymake::toolchain::{ArchiverPolicy, Family, Toolchain, ToolchainError};
use rstest::rstest;

fn cc(command: &str) -> CommandDecl {
    CommandDecl {
        cc: Some(command.to_owned()),
        ..CommandDecl::default()
    }
}

#[rstest]
#[case("gcc", "g++", "ar", Family::Gcc)]
#[case(
    "/opt/cross/arm-none-eabi-gcc-10",
    "/opt/cross/arm-none-eabi-g++-10",
    "/opt/cross/arm-none-eabi-ar-10",
    Family::Gcc
)]
#[case("clang", "clang++", "llvm-ar", Family::Clang)]
#[case("clang-14", "clang++-14", "llvm-ar-14", Family::Clang)]
fn siblings_follow_the_cc_command(
    #[case] command: &str,
    #[case] cxx: &str,
    #[case] ar: &str,
    #[case] family: Family,
) {
    let toolchain = Toolchain::resolve(&cc(command), ArchiverPolicy::Derived).expect("resolve");
    assert_eq!(toolchain.commands(), [command, cxx, ar]);
    assert_eq!(toolchain.family, Some(family));
    assert_eq!(toolchain.cc.provenance(), Provenance::Explicit);
    assert_eq!(toolchain.cxx.provenance(), Provenance::Toolchain);
}

#[rstest]
fn cxx_alone_drives_deduction() {
    let decl = CommandDecl {
        cxx: Some("/usr/local/bin/clang++".into()),
        ..CommandDecl::default()
    };
    let toolchain = Toolchain::resolve(&decl, ArchiverPolicy::Derived).expect("resolve");
    assert_eq!(
        toolchain.commands(),
        ["/usr/local/bin/clang", "/usr/local/bin/clang++", "/usr/local/bin/llvm-ar"]
    );
}

#[rstest]
fn unknown_compiler_is_rejected() {
    let err = Toolchain::resolve(&cc("tcc"), ArchiverPolicy::Derived).expect_err("tcc");
    assert_eq!(
        err,
        ToolchainError::CommandStringIllegal {
            property: "cc",
            command: "tcc".into(),
        }
    );
}

#[rstest]
fn explicit_archiver_is_kept() {
    let decl = CommandDecl {
        cc: Some("clang-14".into()),
        ar: Some("llvm-ar".into()),
        ..CommandDecl::default()
    };
    let toolchain = Toolchain::resolve(&decl, ArchiverPolicy::KnownNamesOnly).expect("resolve");
    assert_eq!(toolchain.ar.value(), "llvm-ar");
    assert!(toolchain.ar.is_explicit());
}

#[rstest]
fn explicit_properties_survive_merging() {
    let flags = vec!["-Wall".to_owned(), "-DNAME=\"a b\"".to_owned(), String::new()];
    let decl = CompilerDecl {
        command: cc("gcc"),
        properties: PropertyDecls {
            flags: Some(StringOrList::List(flags.clone())),
            arflags: Some(StringOrList::String("cr".into())),
            ..PropertyDecls::default()
        },
        ..CompilerDecl::default()
    };
    let spec = CompilerSpec::from_decl(&decl, ArchiverPolicy::Derived).expect("spec");
    assert_eq!(spec.properties.flags.value(), &flags);
    assert!(spec.properties.flags.is_explicit());
    assert_eq!(spec.properties.arflags.value(), &vec!["cr".to_owned()]);
    assert!(spec.properties.arflags.is_explicit());
}

#[rstest]
fn family_preset_fills_unset_arflags() {
    let decl = CompilerDecl {
        command: cc("clang"),
        ..CompilerDecl::default()
    };
    let spec = CompilerSpec::from_decl(&decl, ArchiverPolicy::Derived).expect("spec");
    assert_eq!(spec.properties.arflags.value(), &vec!["rcs".to_owned()]);
    assert_eq!(spec.properties.arflags.provenance(), Provenance::Toolchain);
    assert_eq!(spec.properties.ldflags.provenance(), Provenance::BuiltIn);
}

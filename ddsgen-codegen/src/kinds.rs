//! The fixed set of transformations and their properties.

use std::{fmt, str::FromStr};

/// Which document a transformation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSelection {
    /// The model with every cross-document reference inlined.
    ResolvedModel,
    /// The model exactly as stored.
    RawModel,
    /// The generation spec document.
    SpecDocument,
}

/// How a transformation produces its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    /// Render the named template from the bundle.
    Template(&'static str),
    /// Serialize the reference resolution result.
    ResolveReferences,
}

/// Static description of one transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformInfo {
    pub kind: TransformKind,
    /// Short name used on the command line.
    pub key: &'static str,
    pub label: &'static str,
    pub suffix: &'static str,
    pub program: Program,
    pub input: InputSelection,
    /// Only generated when the model declares a data library.
    pub requires_data_library: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransformKind {
    InterfaceDefinition,
    HeaderBody,
    ImplementationBody,
    TraitsHeader,
    TraitsBody,
    BuildProjectDescriptor,
    BuildBaseDescriptor,
    BuildPathsDescriptor,
    ResolvedModel,
}

// Indexed by discriminant.
const TABLE: [TransformInfo; 9] = [
    TransformInfo {
        kind: TransformKind::InterfaceDefinition,
        key: "idl",
        label: "IDL",
        suffix: ".idl",
        program: Program::Template("idl.tera"),
        input: InputSelection::ResolvedModel,
        requires_data_library: false,
    },
    TransformInfo {
        kind: TransformKind::HeaderBody,
        key: "h",
        label: "C++ header",
        suffix: "_T.h",
        program: Program::Template("header.tera"),
        input: InputSelection::ResolvedModel,
        requires_data_library: false,
    },
    TransformInfo {
        kind: TransformKind::ImplementationBody,
        key: "cpp",
        label: "C++ implementation",
        suffix: "_T.cpp",
        program: Program::Template("impl.tera"),
        input: InputSelection::ResolvedModel,
        requires_data_library: false,
    },
    TransformInfo {
        kind: TransformKind::TraitsHeader,
        key: "traits-h",
        label: "traits header",
        suffix: "Traits.h",
        program: Program::Template("traits_h.tera"),
        input: InputSelection::SpecDocument,
        requires_data_library: false,
    },
    TransformInfo {
        kind: TransformKind::TraitsBody,
        key: "traits-cpp",
        label: "traits implementation",
        suffix: "Traits.cpp",
        program: Program::Template("traits_cpp.tera"),
        input: InputSelection::SpecDocument,
        requires_data_library: false,
    },
    TransformInfo {
        kind: TransformKind::BuildProjectDescriptor,
        key: "mpc",
        label: "MPC project",
        suffix: ".mpc",
        program: Program::Template("mpc.tera"),
        input: InputSelection::RawModel,
        requires_data_library: false,
    },
    TransformInfo {
        kind: TransformKind::BuildBaseDescriptor,
        key: "mpb",
        label: "MPB base project",
        suffix: ".mpb",
        program: Program::Template("mpb.tera"),
        input: InputSelection::RawModel,
        requires_data_library: false,
    },
    TransformInfo {
        kind: TransformKind::BuildPathsDescriptor,
        key: "paths-mpb",
        label: "MPB paths project",
        suffix: "_paths.mpb",
        program: Program::Template("paths_mpb.tera"),
        input: InputSelection::RawModel,
        requires_data_library: true,
    },
    TransformInfo {
        kind: TransformKind::ResolvedModel,
        key: "resolved",
        label: "resolved model",
        suffix: "_resolved.xml",
        program: Program::ResolveReferences,
        input: InputSelection::ResolvedModel,
        requires_data_library: false,
    },
];

impl TransformKind {
    /// Every kind, artifacts first.
    pub const ALL: [TransformKind; 9] = [
        TransformKind::InterfaceDefinition,
        TransformKind::HeaderBody,
        TransformKind::ImplementationBody,
        TransformKind::TraitsHeader,
        TransformKind::TraitsBody,
        TransformKind::BuildProjectDescriptor,
        TransformKind::BuildBaseDescriptor,
        TransformKind::BuildPathsDescriptor,
        TransformKind::ResolvedModel,
    ];

    /// The artifacts produced by a full generation run, in order.
    pub const ARTIFACTS: [TransformKind; 8] = [
        TransformKind::InterfaceDefinition,
        TransformKind::HeaderBody,
        TransformKind::ImplementationBody,
        TransformKind::TraitsHeader,
        TransformKind::TraitsBody,
        TransformKind::BuildProjectDescriptor,
        TransformKind::BuildBaseDescriptor,
        TransformKind::BuildPathsDescriptor,
    ];

    pub fn info(self) -> &'static TransformInfo {
        &TABLE[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.info().key
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn suffix(self) -> &'static str {
        self.info().suffix
    }

    pub fn program(self) -> Program {
        self.info().program
    }

    pub fn input(self) -> InputSelection {
        self.info().input
    }

    /// Whether the transformation must see the resolved model.
    pub fn requires_resolved(self) -> bool {
        self.input() == InputSelection::ResolvedModel
    }

    pub fn requires_data_library(self) -> bool {
        self.info().requires_data_library
    }

    /// File name of the artifact for a model.
    pub fn artifact_name(self, model_name: &str) -> String {
        format!("{model_name}{}", self.suffix())
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TransformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| {
                let keys: Vec<_> = Self::ALL.iter().map(|k| k.key()).collect();
                format!("unknown artifact kind '{s}' (expected one of: {})", keys.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_kind() {
        for kind in TransformKind::ALL {
            assert_eq!(kind.info().kind, kind);
        }
    }

    #[test]
    fn test_artifact_names() {
        let names: Vec<_> = TransformKind::ARTIFACTS
            .iter()
            .map(|k| k.artifact_name("Demo"))
            .collect();
        assert_eq!(
            names,
            vec![
                "Demo.idl",
                "Demo_T.h",
                "Demo_T.cpp",
                "DemoTraits.h",
                "DemoTraits.cpp",
                "Demo.mpc",
                "Demo.mpb",
                "Demo_paths.mpb",
            ]
        );
        assert_eq!(
            TransformKind::ResolvedModel.artifact_name("Demo"),
            "Demo_resolved.xml"
        );
    }

    #[test]
    fn test_input_selection() {
        assert!(TransformKind::InterfaceDefinition.requires_resolved());
        assert!(TransformKind::HeaderBody.requires_resolved());
        assert!(TransformKind::ImplementationBody.requires_resolved());
        assert_eq!(TransformKind::TraitsHeader.input(), InputSelection::SpecDocument);
        assert_eq!(TransformKind::BuildProjectDescriptor.input(), InputSelection::RawModel);
        assert!(!TransformKind::BuildPathsDescriptor.requires_resolved());
        assert!(TransformKind::BuildPathsDescriptor.requires_data_library());
        assert_eq!(
            TransformKind::ResolvedModel.program(),
            Program::ResolveReferences
        );
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!("idl".parse(), Ok(TransformKind::InterfaceDefinition));
        assert_eq!("paths-mpb".parse(), Ok(TransformKind::BuildPathsDescriptor));
        assert!("java".parse::<TransformKind>().unwrap_err().contains("traits-h"));
    }
}

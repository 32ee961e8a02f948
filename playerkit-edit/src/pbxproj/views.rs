//! Typed read-only views over the object arena.
//!
//! Objects reference each other by id only; a view borrows the parsed
//! dictionary of one object and resolves nothing on its own.

use super::parser::{ArrayNode, DictNode, Node};

pub const PBX_GROUP: &str = "PBXGroup";
pub const PBX_FILE_REFERENCE: &str = "PBXFileReference";
pub const PBX_BUILD_FILE: &str = "PBXBuildFile";
pub const PBX_SOURCES_BUILD_PHASE: &str = "PBXSourcesBuildPhase";
pub const PBX_NATIVE_TARGET: &str = "PBXNativeTarget";
pub const XC_BUILD_CONFIGURATION: &str = "XCBuildConfiguration";

#[derive(Debug, Clone, Copy)]
pub struct ObjectView<'g> {
    pub id: &'g str,
    pub dict: &'g DictNode,
}

impl<'g> ObjectView<'g> {
    pub fn isa(&self) -> Option<&'g str> {
        self.dict.str("isa")
    }

    pub fn str(&self, key: &str) -> Option<&'g str> {
        self.dict.str(key)
    }

    /// Ids listed in an array-valued field.
    pub fn id_list(&self, key: &str) -> Vec<&'g str> {
        self.array(key)
            .map(|a| a.items.iter().filter_map(Node::as_str).collect())
            .unwrap_or_default()
    }

    pub fn array(&self, key: &str) -> Option<&'g ArrayNode> {
        self.dict.get(key).and_then(Node::as_array)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GroupView<'g>(pub ObjectView<'g>);

impl<'g> GroupView<'g> {
    pub fn id(&self) -> &'g str {
        self.0.id
    }

    /// The folder this group maps to; Xcode omits `path` for virtual groups.
    pub fn path(&self) -> Option<&'g str> {
        self.0.str("path")
    }

    pub fn name(&self) -> Option<&'g str> {
        self.0.str("name")
    }

    pub fn children(&self) -> Vec<&'g str> {
        self.0.id_list("children")
    }

    pub fn children_node(&self) -> Option<&'g ArrayNode> {
        self.0.array("children")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FileReferenceView<'g>(pub ObjectView<'g>);

impl<'g> FileReferenceView<'g> {
    pub fn id(&self) -> &'g str {
        self.0.id
    }

    pub fn path(&self) -> Option<&'g str> {
        self.0.str("path")
    }

    pub fn name(&self) -> Option<&'g str> {
        self.0.str("name")
    }

    /// True if this reference points at a file called `file_name`.
    pub fn is_named(&self, file_name: &str) -> bool {
        self.name() == Some(file_name)
            || self
                .path()
                .map(|p| p == file_name || p.rsplit('/').next() == Some(file_name))
                .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildFileView<'g>(pub ObjectView<'g>);

impl<'g> BuildFileView<'g> {
    pub fn file_ref(&self) -> Option<&'g str> {
        self.0.str("fileRef")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildPhaseView<'g>(pub ObjectView<'g>);

impl<'g> BuildPhaseView<'g> {
    pub fn id(&self) -> &'g str {
        self.0.id
    }

    pub fn files(&self) -> Vec<&'g str> {
        self.0.id_list("files")
    }

    pub fn files_node(&self) -> Option<&'g ArrayNode> {
        self.0.array("files")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NativeTargetView<'g>(pub ObjectView<'g>);

impl<'g> NativeTargetView<'g> {
    pub fn name(&self) -> Option<&'g str> {
        self.0.str("name")
    }

    pub fn build_phases(&self) -> Vec<&'g str> {
        self.0.id_list("buildPhases")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildConfigurationView<'g>(pub ObjectView<'g>);

impl<'g> BuildConfigurationView<'g> {
    pub fn id(&self) -> &'g str {
        self.0.id
    }

    pub fn name(&self) -> Option<&'g str> {
        self.0.str("name")
    }

    pub fn build_settings(&self) -> Option<&'g DictNode> {
        self.0.dict.get("buildSettings").and_then(Node::as_dict)
    }

    pub fn setting(&self, key: &str) -> Option<&'g str> {
        self.build_settings().and_then(|s| s.str(key))
    }
}

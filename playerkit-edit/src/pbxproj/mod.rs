//! Native project graph adapter for Xcode `project.pbxproj` files.
//!
//! The graph is an arena of objects keyed by their 24-digit ids. Groups,
//! file references, build phases and build configurations are typed views
//! over that arena (see [`views`]). Mutations are computed as text splices
//! against the current snapshot, applied together, and the text is parsed
//! again so the arena always reflects what will be written.

pub mod parser;
pub mod views;

use crate::error::{IntegrationError, IntegrationResult};
use crate::splice::{Splice, apply_splices, is_line_leading, line_indent, line_start};
use camino::{Utf8Path, Utf8PathBuf};
use parser::{ArrayNode, DictNode, Node, parse_document, quote};
use playerkit_types::dependency::{InsertionPoint, Position};
use sha2::{Digest, Sha256};
use tracing::debug;
use views::{
    BuildConfigurationView, BuildFileView, BuildPhaseView, FileReferenceView, GroupView,
    NativeTargetView, ObjectView, PBX_BUILD_FILE, PBX_FILE_REFERENCE, PBX_GROUP,
    PBX_NATIVE_TARGET, PBX_SOURCES_BUILD_PHASE, XC_BUILD_CONFIGURATION,
};

/// How a registered file participates in the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Compiled: referenced from the group and the target's Sources phase.
    Source,
    /// Referenced from the group only.
    Header,
}

#[derive(Debug, Clone)]
pub struct ProjectGraph {
    path: Utf8PathBuf,
    text: String,
    root: DictNode,
}

impl ProjectGraph {
    pub fn parse(path: impl Into<Utf8PathBuf>, text: impl Into<String>) -> IntegrationResult<Self> {
        let path = path.into();
        let text = text.into();
        let root = parse_document(&text)
            .map_err(|e| IntegrationError::descriptor_parse(&path, e.to_string()))?;
        let graph = Self { path, text, root };
        graph.objects()?;
        Ok(graph)
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Current text. Identical to the parsed input until a mutation changes it.
    pub fn as_text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    fn objects(&self) -> IntegrationResult<&DictNode> {
        self.root
            .get("objects")
            .and_then(Node::as_dict)
            .ok_or_else(|| {
                IntegrationError::descriptor_parse(&self.path, "missing `objects` dictionary")
            })
    }

    pub fn object(&self, id: &str) -> Option<ObjectView<'_>> {
        let objects = self.objects().ok()?;
        let entry = objects.entry(id)?;
        entry.value.as_dict().map(|dict| ObjectView {
            id: entry.key.value.as_str(),
            dict,
        })
    }

    pub fn objects_with_isa<'g>(&'g self, isa: &'g str) -> impl Iterator<Item = ObjectView<'g>> {
        self.objects()
            .ok()
            .into_iter()
            .flat_map(|o| o.entries.iter())
            .filter_map(|e| {
                e.value.as_dict().map(|dict| ObjectView {
                    id: e.key.value.as_str(),
                    dict,
                })
            })
            .filter(move |o| o.isa() == Some(isa))
    }

    pub fn groups(&self) -> impl Iterator<Item = GroupView<'_>> {
        self.objects_with_isa(PBX_GROUP).map(GroupView)
    }

    pub fn build_configurations(&self) -> impl Iterator<Item = BuildConfigurationView<'_>> {
        self.objects_with_isa(XC_BUILD_CONFIGURATION)
            .map(BuildConfigurationView)
    }

    pub fn file_reference(&self, id: &str) -> Option<FileReferenceView<'_>> {
        self.object(id)
            .filter(|o| o.isa() == Some(PBX_FILE_REFERENCE))
            .map(FileReferenceView)
    }

    /// The unique group whose declared path is `anchor`.
    ///
    /// Virtual groups (no `path`) never match, whatever their `name`. Zero or
    /// several matches is an error: picking one of several candidates would
    /// register files in the wrong folder.
    pub fn anchor_group(&self, anchor: &str) -> IntegrationResult<GroupView<'_>> {
        let matches: Vec<GroupView<'_>> = self
            .groups()
            .filter(|g| g.path() == Some(anchor))
            .collect();
        match matches.as_slice() {
            [group] => Ok(*group),
            [] => Err(IntegrationError::anchor_not_found(
                &self.path,
                format!("no group with path `{anchor}`"),
            )),
            many => Err(IntegrationError::anchor_not_found(
                &self.path,
                format!(
                    "{} groups share path `{anchor}` ({})",
                    many.len(),
                    many.iter().map(|g| g.id()).collect::<Vec<_>>().join(", ")
                ),
            )),
        }
    }

    /// File reference called `file_name` among the direct children of `group`.
    pub fn child_file<'g>(
        &'g self,
        group: &GroupView<'g>,
        file_name: &str,
    ) -> Option<FileReferenceView<'g>> {
        group
            .children()
            .into_iter()
            .filter_map(|id| self.file_reference(id))
            .find(|f| f.is_named(file_name))
    }

    /// Sources build phase of the target named `target_name`, or the only
    /// Sources phase in the project.
    pub fn sources_phase(&self, target_name: &str) -> IntegrationResult<BuildPhaseView<'_>> {
        for target in self.objects_with_isa(PBX_NATIVE_TARGET).map(NativeTargetView) {
            if target.name() != Some(target_name) {
                continue;
            }
            for phase_id in target.build_phases() {
                if let Some(phase) = self.object(phase_id)
                    && phase.isa() == Some(PBX_SOURCES_BUILD_PHASE)
                {
                    return Ok(BuildPhaseView(phase));
                }
            }
        }

        let phases: Vec<ObjectView<'_>> = self.objects_with_isa(PBX_SOURCES_BUILD_PHASE).collect();
        match phases.as_slice() {
            [phase] => Ok(BuildPhaseView(*phase)),
            [] => Err(IntegrationError::anchor_not_found(
                &self.path,
                "no PBXSourcesBuildPhase",
            )),
            many => Err(IntegrationError::anchor_not_found(
                &self.path,
                format!(
                    "{} Sources build phases and no target named `{target_name}`",
                    many.len()
                ),
            )),
        }
    }

    fn in_phase(&self, phase: &BuildPhaseView<'_>, file_ref: &str) -> bool {
        phase.files().into_iter().any(|id| {
            self.object(id)
                .filter(|o| o.isa() == Some(PBX_BUILD_FILE))
                .and_then(|o| BuildFileView(o).file_ref())
                == Some(file_ref)
        })
    }

    /// Register `file_name` under the anchor group of `point`.
    ///
    /// Adds a file reference and group membership, plus a build file in the
    /// Sources phase for [`ArtifactKind::Source`]. Each piece is only added
    /// when missing. Returns true if the graph changed.
    pub fn register_file(
        &mut self,
        file_name: &str,
        kind: ArtifactKind,
        point: &InsertionPoint,
    ) -> IntegrationResult<bool> {
        let splices = {
            let group = self.anchor_group(&point.anchor)?;
            let phase = match kind {
                ArtifactKind::Source => Some(self.sources_phase(&point.anchor)?),
                ArtifactKind::Header => None,
            };

            let mut splices = Vec::new();
            let mut reserved = Vec::new();

            let file_ref_id = match self.child_file(&group, file_name) {
                Some(existing) => existing.id().to_string(),
                None => {
                    let id = self.new_id(PBX_FILE_REFERENCE, file_name, &reserved);
                    reserved.push(id.clone());
                    let entry = format!(
                        "{id} /* {file_name} */ = {{isa = {PBX_FILE_REFERENCE}; lastKnownFileType = {}; path = {}; sourceTree = \"<group>\"; }};",
                        last_known_file_type(file_name),
                        quote(file_name),
                    );
                    splices.push(self.section_insert(PBX_FILE_REFERENCE, &entry)?);
                    let children = group.children_node().ok_or_else(|| {
                        IntegrationError::descriptor_parse(
                            &self.path,
                            format!("group {} has no `children` list", group.id()),
                        )
                    })?;
                    splices.extend(array_insert(
                        &self.text,
                        children,
                        &format!("{id} /* {file_name} */"),
                        point.position,
                    ));
                    id
                }
            };

            if let Some(phase) = phase
                && !self.in_phase(&phase, &file_ref_id)
            {
                let id = self.new_id(PBX_BUILD_FILE, file_name, &reserved);
                reserved.push(id.clone());
                let entry = format!(
                    "{id} /* {file_name} in Sources */ = {{isa = {PBX_BUILD_FILE}; fileRef = {file_ref_id} /* {file_name} */; }};"
                );
                splices.push(self.section_insert(PBX_BUILD_FILE, &entry)?);
                let files = phase.files_node().ok_or_else(|| {
                    IntegrationError::descriptor_parse(
                        &self.path,
                        format!("build phase {} has no `files` list", phase.id()),
                    )
                })?;
                splices.extend(array_insert(
                    &self.text,
                    files,
                    &format!("{id} /* {file_name} in Sources */"),
                    Position::Append,
                ));
            }

            splices
        };

        if splices.is_empty() {
            debug!(file = file_name, anchor = %point.anchor, "already registered");
            return Ok(false);
        }
        self.apply(splices)?;
        Ok(true)
    }

    /// Set `key = value` in every build configuration named `configuration`.
    ///
    /// Existing values are overwritten in place. Returns true if the graph changed.
    pub fn set_build_property(
        &mut self,
        key: &str,
        value: &str,
        configuration: &str,
    ) -> IntegrationResult<bool> {
        let splices = {
            let configs: Vec<BuildConfigurationView<'_>> = self
                .build_configurations()
                .filter(|c| c.name() == Some(configuration))
                .collect();
            if configs.is_empty() {
                return Err(IntegrationError::anchor_not_found(
                    &self.path,
                    format!("no build configuration named `{configuration}`"),
                ));
            }

            let mut splices = Vec::new();
            for config in configs {
                let settings = config.build_settings().ok_or_else(|| {
                    IntegrationError::descriptor_parse(
                        &self.path,
                        format!("build configuration {} has no `buildSettings`", config.id()),
                    )
                })?;
                match settings.entry(key) {
                    Some(e) if e.value.as_str() == Some(value) => {}
                    Some(e) => splices.push(Splice::replace(e.value.span(), quote(value))),
                    None => splices.push(dict_insert(
                        &self.text,
                        settings,
                        &format!("{} = {};", quote(key), quote(value)),
                    )),
                }
            }
            splices
        };

        if splices.is_empty() {
            return Ok(false);
        }
        self.apply(splices)?;
        Ok(true)
    }

    fn apply(&mut self, splices: Vec<Splice>) -> IntegrationResult<()> {
        let text = apply_splices(&self.text, splices);
        *self = ProjectGraph::parse(self.path.clone(), text)?;
        Ok(())
    }

    /// Insert an object entry at the end of its `/* Begin <isa> section */`,
    /// creating the section when the project has none.
    fn section_insert(&self, isa: &str, entry: &str) -> IntegrationResult<Splice> {
        let objects = self.objects()?;
        let indent = objects
            .entries
            .first()
            .map(|e| line_indent(&self.text, e.key.span.start).to_string())
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| "\t\t".to_string());

        let region = &self.text[objects.open..objects.close];
        let marker = format!("/* End {isa} section */");
        if let Some(rel) = region.find(&marker) {
            let at = line_start(&self.text, objects.open + rel);
            return Ok(Splice::insert(at, format!("{indent}{entry}\n")));
        }

        let section = format!(
            "\n/* Begin {isa} section */\n{indent}{entry}\n/* End {isa} section */\n"
        );
        if is_line_leading(&self.text, objects.close) {
            Ok(Splice::insert(
                line_start(&self.text, objects.close),
                section,
            ))
        } else {
            Ok(Splice::insert(objects.close, section))
        }
    }

    /// Deterministic id for a new object, skipping ids already in use.
    fn new_id(&self, role: &str, file_name: &str, reserved: &[String]) -> String {
        let mut attempt: u32 = 0;
        loop {
            let mut hasher = Sha256::new();
            hasher.update(role.as_bytes());
            hasher.update([0u8]);
            hasher.update(file_name.as_bytes());
            hasher.update(attempt.to_le_bytes());
            let id = hex::encode_upper(&hasher.finalize()[..12]);
            if self.object(&id).is_none() && !reserved.contains(&id) {
                return id;
            }
            attempt += 1;
        }
    }
}

/// Splices adding `element` to an array, one element per line when the
/// array is already laid out that way.
fn array_insert(text: &str, arr: &ArrayNode, element: &str, position: Position) -> Vec<Splice> {
    if position == Position::Before {
        let after_open = arr.open + 1;
        let first = arr.items.first().map(|n| n.span().start).unwrap_or(arr.close);
        if let Some(nl) = text[after_open..first].find('\n') {
            let indent = format!("{}\t", line_indent(text, arr.close));
            return vec![Splice::insert(
                after_open + nl + 1,
                format!("{indent}{element},\n"),
            )];
        }
        return vec![Splice::insert(after_open, format!("{element}, "))];
    }

    let mut out = Vec::new();
    if let Some(last) = arr.items.last() {
        let end = last.span().end;
        if !text[end..arr.close].contains(',') {
            out.push(Splice::insert(end, ","));
        }
    }
    if is_line_leading(text, arr.close) && line_start(text, arr.close) > arr.open {
        let indent = line_indent(text, arr.close);
        out.push(Splice::insert(
            line_start(text, arr.close),
            format!("{indent}\t{element},\n"),
        ));
    } else {
        let base = line_indent(text, arr.open);
        out.push(Splice::insert(
            arr.close,
            format!("\n{base}\t{element},\n{base}"),
        ));
    }
    out
}

/// Splice appending `line` as the last entry of a dictionary.
fn dict_insert(text: &str, dict: &DictNode, line: &str) -> Splice {
    if is_line_leading(text, dict.close) && line_start(text, dict.close) > dict.open {
        let indent = line_indent(text, dict.close);
        Splice::insert(
            line_start(text, dict.close),
            format!("{indent}\t{line}\n"),
        )
    } else {
        let base = line_indent(text, dict.open);
        Splice::insert(dict.close, format!("\n{base}\t{line}\n{base}"))
    }
}

fn last_known_file_type(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next().unwrap_or_default() {
        "swift" => "sourcecode.swift",
        "m" => "sourcecode.c.objc",
        "mm" => "sourcecode.cpp.objcpp",
        "cpp" | "cc" => "sourcecode.cpp.cpp",
        "hpp" => "sourcecode.cpp.h",
        "h" => "sourcecode.c.h",
        "c" => "sourcecode.c.c",
        _ => "text",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_types_follow_extension() {
        assert_eq!(last_known_file_type("VideoPlayer.swift"), "sourcecode.swift");
        assert_eq!(last_known_file_type("empty.cpp"), "sourcecode.cpp.cpp");
        assert_eq!(last_known_file_type("empty.hpp"), "sourcecode.cpp.h");
        assert_eq!(last_known_file_type("App-Bridging-Header.h"), "sourcecode.c.h");
        assert_eq!(last_known_file_type("README"), "text");
    }

    #[test]
    fn array_insert_appends_on_its_own_line() {
        let text = "{\n\tchildren = (\n\t\tA /* a */,\n\t);\n}";
        let root = parse_document(text).unwrap();
        let arr = root.get("children").and_then(Node::as_array).unwrap();
        let out = apply_splices(text, array_insert(text, arr, "B /* b */", Position::Append));
        assert_eq!(out, "{\n\tchildren = (\n\t\tA /* a */,\n\t\tB /* b */,\n\t);\n}");
    }

    #[test]
    fn array_insert_prepends_for_before() {
        let text = "{\n\tchildren = (\n\t\tA,\n\t);\n}";
        let root = parse_document(text).unwrap();
        let arr = root.get("children").and_then(Node::as_array).unwrap();
        let out = apply_splices(text, array_insert(text, arr, "B", Position::Before));
        assert_eq!(out, "{\n\tchildren = (\n\t\tB,\n\t\tA,\n\t);\n}");
    }

    #[test]
    fn array_insert_expands_inline_arrays_and_adds_missing_comma() {
        let text = "{\n\tfiles = (A);\n}";
        let root = parse_document(text).unwrap();
        let arr = root.get("files").and_then(Node::as_array).unwrap();
        let out = apply_splices(text, array_insert(text, arr, "B", Position::Append));
        assert_eq!(out, "{\n\tfiles = (A,\n\t\tB,\n\t);\n}");
        assert!(parse_document(&out).is_ok());
    }

    #[test]
    fn dict_insert_matches_sibling_indentation() {
        let text = "{\n\tbuildSettings = {\n\t\tA = 1;\n\t};\n}";
        let root = parse_document(text).unwrap();
        let dict = root.get("buildSettings").and_then(Node::as_dict).unwrap();
        let out = apply_splices(text, vec![dict_insert(text, dict, "B = 2;")]);
        assert_eq!(out, "{\n\tbuildSettings = {\n\t\tA = 1;\n\t\tB = 2;\n\t};\n}");
    }
}

//! Java analyzer using tree-sitter.
//!
//! Walks the parsed syntax tree and reports classes, interfaces and
//! enums as types, methods as functions, and field declarators as
//! fields. Signatures are the node's source text with whitespace runs
//! collapsed; doc comments are the `/** ... */` block immediately above
//! a declaration.

use std::collections::HashSet;
use std::path::Path;

use log::warn;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use super::SourceAnalyzer;
use crate::model::{Element, ElementKind, Visibility};

const DECLARATION_QUERY: &str = r#"
(class_declaration name: (identifier) @type_name) @type_decl
(interface_declaration name: (identifier) @type_name) @type_decl
(enum_declaration name: (identifier) @type_name) @type_decl
(method_declaration name: (identifier) @method_name) @method_decl
(field_declaration) @field_decl
"#;

const PACKAGE_QUERY: &str = r#"
(package_declaration (scoped_identifier) @package_name)
(package_declaration (identifier) @package_name)
"#;

pub struct JavaAnalyzer {
    language: Language,
}

impl JavaAnalyzer {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_java::LANGUAGE.into(),
        }
    }

    fn extract(
        &self,
        path: &Path,
        content: &str,
        include_private: bool,
    ) -> anyhow::Result<Vec<Element>> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse Java source: {}", path.display()))?;

        let source = content.as_bytes();
        let root = tree.root_node();
        let package = self.extract_package(root, source);
        let file_path = path.to_string_lossy().to_string();

        let query = Query::new(&self.language, DECLARATION_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, root, source);

        let mut elements = Vec::new();
        let mut seen_positions = HashSet::new();

        while let Some(m) = matches.next() {
            let mut name_node = None;
            let mut decl_node = None;
            let mut is_type = false;

            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "type_name" => {
                        name_node = Some(capture.node);
                        is_type = true;
                    }
                    "method_name" => name_node = Some(capture.node),
                    "type_decl" | "method_decl" | "field_decl" => decl_node = Some(capture.node),
                    _ => {}
                }
            }

            let decl = match decl_node {
                Some(n) => n,
                None => continue,
            };

            if decl.kind() == "field_declaration" {
                if included(decl, "", source, include_private) {
                    self.collect_field_elements(decl, source, &file_path, &mut elements);
                }
                continue;
            }

            let name = match name_node {
                Some(n) => node_text(n, source).to_string(),
                None => continue,
            };
            if name.is_empty() || !seen_positions.insert((decl.start_byte(), name.clone())) {
                continue;
            }
            if !included(decl, &name, source, include_private) {
                continue;
            }

            if is_type {
                elements.push(self.type_element(decl, &name, &package, source, &file_path));
            } else {
                elements.push(self.method_element(decl, &name, source, &file_path));
            }
        }

        elements.sort_by(|a, b| {
            (a.line_number, a.name.as_str()).cmp(&(b.line_number, b.name.as_str()))
        });
        Ok(elements)
    }

    fn type_element(
        &self,
        decl: Node,
        name: &str,
        package: &Option<String>,
        source: &[u8],
        file_path: &str,
    ) -> Element {
        Element {
            kind: ElementKind::Type,
            name: name.to_string(),
            qualified_name: qualified_type_name(decl, name, package, source),
            file_path: file_path.to_string(),
            line_number: decl.start_position().row + 1,
            signature: collapse_whitespace(node_text(decl, source)),
            documentation: doc_comment_above(decl, source),
            parameters: Vec::new(),
            annotations: annotations_of(decl, source),
        }
    }

    fn method_element(&self, decl: Node, name: &str, source: &[u8], file_path: &str) -> Element {
        let signature = method_signature(decl, source);
        Element {
            kind: ElementKind::Function,
            name: name.to_string(),
            // A function's qualified name is its full declaration string.
            qualified_name: signature.clone(),
            file_path: file_path.to_string(),
            line_number: decl.start_position().row + 1,
            signature,
            documentation: doc_comment_above(decl, source),
            parameters: parameters_of(decl, source),
            annotations: annotations_of(decl, source),
        }
    }

    /// One element per declarator: `int a, b;` yields two fields.
    fn collect_field_elements(
        &self,
        decl: Node,
        source: &[u8],
        file_path: &str,
        elements: &mut Vec<Element>,
    ) {
        let signature = collapse_whitespace(node_text(decl, source));
        let documentation = doc_comment_above(decl, source);
        let annotations = annotations_of(decl, source);

        let mut walker = decl.walk();
        for child in decl.children(&mut walker) {
            if child.kind() != "variable_declarator" {
                continue;
            }
            let name = child
                .child_by_field_name("name")
                .map(|n| node_text(n, source).to_string())
                .unwrap_or_default();
            if name.is_empty() {
                continue;
            }

            elements.push(Element {
                kind: ElementKind::Field,
                name: name.clone(),
                qualified_name: name,
                file_path: file_path.to_string(),
                line_number: decl.start_position().row + 1,
                signature: signature.clone(),
                documentation: documentation.clone(),
                parameters: Vec::new(),
                annotations: annotations.clone(),
            });
        }
    }

    fn extract_package(&self, root: Node, source: &[u8]) -> Option<String> {
        let query = Query::new(&self.language, PACKAGE_QUERY).ok()?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, root, source);

        if let Some(m) = matches.next() {
            for capture in m.captures {
                if query.capture_names()[capture.index as usize] == "package_name" {
                    return Some(node_text(capture.node, source).to_string());
                }
            }
        }
        None
    }
}

impl Default for JavaAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceAnalyzer for JavaAnalyzer {
    fn language_id(&self) -> &'static str {
        "java"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn analyze(&self, path: &Path, content: &str, include_private: bool) -> Vec<Element> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        match self.extract(path, content, include_private) {
            Ok(elements) => elements,
            Err(e) => {
                warn!("failed to analyze Java file {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}

/// Visibility check against the declaration's modifier set, not its
/// full body text (a public class containing a private member must not
/// classify as private).
fn included(decl: Node, name: &str, source: &[u8], include_private: bool) -> bool {
    let mut walker = decl.walk();
    let modifiers = decl
        .children(&mut walker)
        .find(|n| n.kind() == "modifiers")
        .map(|n| node_text(n, source).to_string())
        .unwrap_or_default();

    Visibility::from_signature_and_name(&modifiers, name).should_include(include_private)
}

fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Collapse all whitespace runs to single spaces.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Declaration header: the method's source text up to its body block.
fn method_signature(decl: Node, source: &[u8]) -> String {
    let text = match decl.child_by_field_name("body") {
        Some(body) => {
            let start = decl.start_byte();
            let end = body.start_byte();
            std::str::from_utf8(&source[start..end]).unwrap_or("")
        }
        // Abstract/interface methods have no body; drop the trailing ';'.
        None => node_text(decl, source).trim_end_matches(';'),
    };
    collapse_whitespace(text)
}

/// Dotted path through the package and enclosing types, or the bare
/// name when nothing encloses the declaration.
fn qualified_type_name(decl: Node, name: &str, package: &Option<String>, source: &[u8]) -> String {
    let mut outer = Vec::new();
    let mut current = decl.parent();
    while let Some(node) = current {
        if matches!(
            node.kind(),
            "class_declaration" | "interface_declaration" | "enum_declaration"
        ) {
            if let Some(n) = node.child_by_field_name("name") {
                outer.push(node_text(n, source).to_string());
            }
        }
        current = node.parent();
    }
    outer.reverse();

    let mut segments = Vec::new();
    if let Some(pkg) = package {
        segments.push(pkg.clone());
    }
    segments.extend(outer);

    if segments.is_empty() {
        name.to_string()
    } else {
        segments.push(name.to_string());
        segments.join(".")
    }
}

/// Annotation names from the declaration's modifier list, verbatim with
/// their leading `@`.
fn annotations_of(decl: Node, source: &[u8]) -> Vec<String> {
    let mut walker = decl.walk();
    let modifiers = decl
        .children(&mut walker)
        .find(|n| n.kind() == "modifiers");

    let modifiers = match modifiers {
        Some(m) => m,
        None => return Vec::new(),
    };

    let mut names = Vec::new();
    let mut walker = modifiers.walk();
    for child in modifiers.children(&mut walker) {
        if matches!(child.kind(), "marker_annotation" | "annotation") {
            names.push(collapse_whitespace(node_text(child, source)));
        }
    }
    names
}

/// Parameter descriptors as `Type name` pairs.
fn parameters_of(decl: Node, source: &[u8]) -> Vec<String> {
    let params = match decl.child_by_field_name("parameters") {
        Some(p) => p,
        None => return Vec::new(),
    };

    let mut result = Vec::new();
    let mut walker = params.walk();
    for child in params.children(&mut walker) {
        match child.kind() {
            "formal_parameter" => {
                let ty = child
                    .child_by_field_name("type")
                    .map(|n| node_text(n, source))
                    .unwrap_or("");
                let name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source))
                    .unwrap_or("");
                result.push(collapse_whitespace(&format!("{} {}", ty, name)));
            }
            "spread_parameter" => {
                result.push(collapse_whitespace(node_text(child, source)));
            }
            _ => {}
        }
    }
    result
}

/// Doc comment attached immediately above a declaration, cleaned of its
/// comment markers. Absence yields an empty string.
fn doc_comment_above(decl: Node, source: &[u8]) -> String {
    let prev = match decl.prev_sibling() {
        Some(p) => p,
        None => return String::new(),
    };
    if prev.kind() != "block_comment" {
        return String::new();
    }

    let text = node_text(prev, source);
    if !text.starts_with("/**") {
        return String::new();
    }

    clean_doc_comment(text)
}

fn clean_doc_comment(text: &str) -> String {
    let body = text
        .trim_start_matches("/**")
        .trim_end_matches("*/");

    body.lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

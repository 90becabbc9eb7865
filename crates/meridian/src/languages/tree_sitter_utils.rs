//! Shared tree-sitter utilities for the bundled analyzers.

// Tree-sitter returns usize for positions, but we store u32 for compactness.
// This is safe for practical source files (no file has 4 billion lines).
#![allow(clippy::cast_possible_truncation)]

use crate::error::AnalysisError;

/// Decode file bytes, rejecting non-UTF-8 content.
pub fn decode(content: &[u8]) -> Result<&str, AnalysisError> {
    std::str::from_utf8(content).map_err(|_| AnalysisError::Encoding)
}

/// Parse source text with a fresh parser for `language`.
///
/// Parsers are not shared between threads, so each analysis gets its own.
pub fn parse(
    language: &tree_sitter::Language,
    source: &str,
) -> Result<tree_sitter::Tree, AnalysisError> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(language)
        .map_err(|e| AnalysisError::Grammar(e.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| AnalysisError::Parse("parser returned no tree".to_string()))
}

/// Get text content of a tree-sitter node.
///
/// Returns `None` if the node's byte range contains invalid UTF-8.
pub fn node_text(node: &tree_sitter::Node, content: &[u8]) -> Option<String> {
    match std::str::from_utf8(&content[node.byte_range()]) {
        Ok(s) => Some(s.to_string()),
        Err(e) => {
            tracing::trace!(
                byte_range = ?node.byte_range(),
                error = %e,
                node_kind = %node.kind(),
                "Failed to decode node text as UTF-8"
            );
            None
        }
    }
}

/// 1-indexed `(line, column)` of a node's start.
pub fn start_of(node: &tree_sitter::Node) -> (u32, u32) {
    let pos = node.start_position();
    (pos.row as u32 + 1, pos.column as u32 + 1)
}

/// Whether `node` is the `field` child of its parent.
pub fn is_field_of_parent(node: &tree_sitter::Node, field: &str) -> bool {
    node.parent()
        .and_then(|parent| parent.child_by_field_name(field))
        .is_some_and(|named| named.id() == node.id())
}

//! Rust analyzer.
//!
//! Extracts definitions, references and `use`/`mod` dependencies from Rust
//! source files using tree-sitter-rust.

use std::path::{Path, PathBuf};

use super::tree_sitter_utils::{decode, is_field_of_parent, node_text, parse, start_of};
use super::Analyzer;
use crate::error::AnalysisError;
use crate::resolver;
use crate::types::{
    DefinedSymbol, FileFacts, ImportSpec, Language, ReferenceKind, SymbolKind, SymbolReference,
    Visibility,
};

/// Tree-sitter node kind constants for Rust grammar.
///
/// These match the node types defined in tree-sitter-rust. Using constants
/// prevents typos and makes supported node types explicit.
mod node_kinds {
    // Item declarations
    pub const FUNCTION_ITEM: &str = "function_item";
    pub const FUNCTION_SIGNATURE_ITEM: &str = "function_signature_item";
    pub const STRUCT_ITEM: &str = "struct_item";
    pub const UNION_ITEM: &str = "union_item";
    pub const ENUM_ITEM: &str = "enum_item";
    pub const TRAIT_ITEM: &str = "trait_item";
    pub const IMPL_ITEM: &str = "impl_item";
    pub const CONST_ITEM: &str = "const_item";
    pub const STATIC_ITEM: &str = "static_item";
    pub const TYPE_ITEM: &str = "type_item";
    pub const MACRO_DEFINITION: &str = "macro_definition";
    pub const MOD_ITEM: &str = "mod_item";
    pub const USE_DECLARATION: &str = "use_declaration";

    // Structure nodes
    pub const DECLARATION_LIST: &str = "declaration_list";
    pub const TYPE_IDENTIFIER: &str = "type_identifier";
    pub const GENERIC_TYPE: &str = "generic_type";
    pub const SCOPED_TYPE_IDENTIFIER: &str = "scoped_type_identifier";
    pub const VISIBILITY_MODIFIER: &str = "visibility_modifier";

    // Use tree nodes
    pub const USE_LIST: &str = "use_list";
    pub const SCOPED_USE_LIST: &str = "scoped_use_list";
    pub const USE_WILDCARD: &str = "use_wildcard";
    pub const USE_AS_CLAUSE: &str = "use_as_clause";
    pub const SCOPED_IDENTIFIER: &str = "scoped_identifier";
    pub const IDENTIFIER: &str = "identifier";
    pub const CRATE: &str = "crate";
    pub const SELF: &str = "self";
    pub const SUPER: &str = "super";

    // Expression nodes
    pub const CALL_EXPRESSION: &str = "call_expression";
    pub const STRUCT_EXPRESSION: &str = "struct_expression";
    pub const FIELD_EXPRESSION: &str = "field_expression";
    pub const GENERIC_FUNCTION: &str = "generic_function";
    pub const MACRO_INVOCATION: &str = "macro_invocation";
}

/// Analyzer for `.rs` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustAnalyzer;

impl Analyzer for RustAnalyzer {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn version(&self) -> u32 {
        1
    }

    fn analyze(&self, _path: &Path, content: &[u8]) -> Result<FileFacts, AnalysisError> {
        let source = decode(content)?;
        let tree = parse(&tree_sitter_rust::LANGUAGE.into(), source)?;
        let root = tree.root_node();

        let mut facts = FileFacts::default();
        extract_symbols(&root, content, &mut facts.symbols, None);
        extract_references(&root, content, &mut facts.references);
        extract_imports(&root, content, &mut facts.imports);
        Ok(facts)
    }

    fn import_candidates(&self, from: &Path, import: &ImportSpec) -> Vec<PathBuf> {
        resolver::rust_candidates(from, &import.specifier)
    }
}

// ============================================================================
// Definitions
// ============================================================================

fn extract_symbols(
    node: &tree_sitter::Node,
    content: &[u8],
    symbols: &mut Vec<DefinedSymbol>,
    container: Option<&str>,
) {
    use node_kinds::{
        CONST_ITEM, DECLARATION_LIST, ENUM_ITEM, FUNCTION_ITEM, IMPL_ITEM, MACRO_DEFINITION,
        MOD_ITEM, STATIC_ITEM, STRUCT_ITEM, TRAIT_ITEM, TYPE_ITEM, UNION_ITEM,
    };

    let simple_kind = match node.kind() {
        FUNCTION_ITEM => Some(SymbolKind::Function),
        STRUCT_ITEM | UNION_ITEM => Some(SymbolKind::Struct),
        ENUM_ITEM => Some(SymbolKind::Enum),
        CONST_ITEM => Some(SymbolKind::Const),
        STATIC_ITEM => Some(SymbolKind::Static),
        TYPE_ITEM => Some(SymbolKind::TypeAlias),
        MACRO_DEFINITION => Some(SymbolKind::Macro),
        _ => None,
    };
    if let Some(kind) = simple_kind {
        if let Some(sym) = definition(node, content, kind, container) {
            symbols.push(sym);
        }
        return;
    }

    match node.kind() {
        TRAIT_ITEM => {
            let Some(sym) = definition(node, content, SymbolKind::Trait, container) else {
                return;
            };
            let trait_name = sym.name.clone();
            symbols.push(sym);
            if let Some(body) = node.child_by_field_name("body") {
                extract_methods(&body, content, symbols, Some(&trait_name));
            }
        }
        IMPL_ITEM => {
            let type_name = find_impl_type(node, content);
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.kind() == DECLARATION_LIST {
                    extract_methods(&child, content, symbols, type_name.as_deref());
                }
            }
        }
        MOD_ITEM => {
            let Some(sym) = definition(node, content, SymbolKind::Module, container) else {
                return;
            };
            let mod_name = sym.name.clone();
            symbols.push(sym);
            // Inline module bodies; `mod x;` has none
            if let Some(body) = node.child_by_field_name("body") {
                let mut cursor = body.walk();
                for child in body.children(&mut cursor) {
                    extract_symbols(&child, content, symbols, Some(&mod_name));
                }
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                extract_symbols(&child, content, symbols, container);
            }
        }
    }
}

/// Functions declared directly in an impl or trait body.
fn extract_methods(
    body: &tree_sitter::Node,
    content: &[u8],
    symbols: &mut Vec<DefinedSymbol>,
    owner: Option<&str>,
) {
    use node_kinds::{FUNCTION_ITEM, FUNCTION_SIGNATURE_ITEM};

    let mut cursor = body.walk();
    for item in body.children(&mut cursor) {
        if matches!(item.kind(), FUNCTION_ITEM | FUNCTION_SIGNATURE_ITEM) {
            if let Some(sym) = definition(&item, content, SymbolKind::Method, owner) {
                symbols.push(sym);
            }
        }
    }
}

fn definition(
    node: &tree_sitter::Node,
    content: &[u8],
    kind: SymbolKind,
    container: Option<&str>,
) -> Option<DefinedSymbol> {
    let name_node = node.child_by_field_name("name")?;
    let name = node_text(&name_node, content)?;
    let (line, column) = start_of(node);
    let visibility = if kind == SymbolKind::Macro {
        macro_visibility(node, content)
    } else {
        extract_visibility(node, content)
    };

    Some(DefinedSymbol {
        name,
        kind,
        line,
        column,
        visibility,
        container: container.map(String::from),
    })
}

/// Find the type name being implemented in an impl block.
fn find_impl_type(node: &tree_sitter::Node, content: &[u8]) -> Option<String> {
    use node_kinds::{GENERIC_TYPE, SCOPED_TYPE_IDENTIFIER, TYPE_IDENTIFIER};

    let type_node = node.child_by_field_name("type")?;
    match type_node.kind() {
        TYPE_IDENTIFIER => node_text(&type_node, content),
        // `impl<T> Foo<T>`
        GENERIC_TYPE => {
            let inner = type_node.child_by_field_name("type")?;
            if inner.kind() == SCOPED_TYPE_IDENTIFIER {
                let name = inner.child_by_field_name("name")?;
                node_text(&name, content)
            } else {
                node_text(&inner, content)
            }
        }
        SCOPED_TYPE_IDENTIFIER => {
            let name = type_node.child_by_field_name("name")?;
            node_text(&name, content)
        }
        _ => None,
    }
}

fn extract_visibility(node: &tree_sitter::Node, content: &[u8]) -> Visibility {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == node_kinds::VISIBILITY_MODIFIER {
            let Some(text) = node_text(&child, content) else {
                return Visibility::Private;
            };
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            return match compact.as_str() {
                "pub" => Visibility::Public,
                s if s.starts_with("pub(crate)") => Visibility::Crate,
                s if s.starts_with("pub(super)") || s.starts_with("pub(in") => {
                    Visibility::Module
                }
                s if s.starts_with("pub(self)") => Visibility::Private,
                _ => Visibility::Public,
            };
        }
    }
    Visibility::Private
}

/// `macro_rules!` macros are public when marked `#[macro_export]`.
fn macro_visibility(node: &tree_sitter::Node, content: &[u8]) -> Visibility {
    let mut sibling = node.prev_named_sibling();
    while let Some(prev) = sibling {
        if prev.kind() != "attribute_item" {
            break;
        }
        if node_text(&prev, content).is_some_and(|t| t.contains("macro_export")) {
            return Visibility::Public;
        }
        sibling = prev.prev_named_sibling();
    }
    Visibility::Private
}

// ============================================================================
// References
// ============================================================================

fn extract_references(node: &tree_sitter::Node, content: &[u8], refs: &mut Vec<SymbolReference>) {
    use node_kinds::{
        CALL_EXPRESSION, MACRO_INVOCATION, STRUCT_EXPRESSION, TYPE_IDENTIFIER, USE_DECLARATION,
    };

    match node.kind() {
        // Handled as imports
        USE_DECLARATION => return,
        CALL_EXPRESSION => {
            if let Some(r) = call_reference(node, content) {
                refs.push(r);
            }
        }
        STRUCT_EXPRESSION => {
            if let Some(name_node) = node.child_by_field_name("name") {
                if let Some(r) = named_reference(&name_node, content, ReferenceKind::Construct) {
                    refs.push(r);
                }
            }
        }
        MACRO_INVOCATION => {
            if let Some(macro_node) = node.child_by_field_name("macro") {
                if let Some(r) = named_reference(&macro_node, content, ReferenceKind::Call) {
                    refs.push(r);
                }
            }
        }
        TYPE_IDENTIFIER => {
            if !is_type_definition_context(node) {
                if let Some(r) = reference_at(node, content, ReferenceKind::Type) {
                    refs.push(r);
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        extract_references(&child, content, refs);
    }
}

fn call_reference(node: &tree_sitter::Node, content: &[u8]) -> Option<SymbolReference> {
    use node_kinds::{FIELD_EXPRESSION, GENERIC_FUNCTION};

    let mut function = node.child_by_field_name("function")?;
    // `parse::<T>()`
    if function.kind() == GENERIC_FUNCTION {
        function = function.child_by_field_name("function")?;
    }
    if function.kind() == FIELD_EXPRESSION {
        // Method call: `user.greet()`
        let field = function.child_by_field_name("field")?;
        return reference_at(&field, content, ReferenceKind::Call);
    }
    named_reference(&function, content, ReferenceKind::Call)
}

/// Reference to the last segment of a (possibly scoped) name.
fn named_reference(
    node: &tree_sitter::Node,
    content: &[u8],
    kind: ReferenceKind,
) -> Option<SymbolReference> {
    use node_kinds::{IDENTIFIER, SCOPED_IDENTIFIER, SCOPED_TYPE_IDENTIFIER, TYPE_IDENTIFIER};

    match node.kind() {
        IDENTIFIER | TYPE_IDENTIFIER => reference_at(node, content, kind),
        // `crate::auth::authenticate()` or `User::new()`
        SCOPED_IDENTIFIER | SCOPED_TYPE_IDENTIFIER => {
            let name = node.child_by_field_name("name")?;
            reference_at(&name, content, kind)
        }
        _ => None,
    }
}

fn reference_at(
    node: &tree_sitter::Node,
    content: &[u8],
    kind: ReferenceKind,
) -> Option<SymbolReference> {
    let name = node_text(node, content)?;
    let (line, column) = start_of(node);
    Some(SymbolReference {
        name,
        kind,
        line,
        column,
    })
}

/// Whether a `type_identifier` names a definition or generic parameter
/// rather than referring to a type.
fn is_type_definition_context(node: &tree_sitter::Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "struct_item" | "union_item" | "enum_item" | "trait_item" | "type_item" => {
            is_field_of_parent(node, "name")
        }
        // Already recorded as a construction
        "struct_expression" => is_field_of_parent(node, "name"),
        "type_parameters" => true,
        "type_parameter" | "optional_type_parameter" => is_field_of_parent(node, "name"),
        "constrained_type_parameter" => is_field_of_parent(node, "left"),
        _ => false,
    }
}

// ============================================================================
// Imports
// ============================================================================

fn extract_imports(node: &tree_sitter::Node, content: &[u8], imports: &mut Vec<ImportSpec>) {
    use node_kinds::{MOD_ITEM, USE_DECLARATION};

    match node.kind() {
        USE_DECLARATION => {
            let (line, _) = start_of(node);
            if let Some(argument) = node.child_by_field_name("argument") {
                let mut entries = Vec::new();
                collect_use_tree(&argument, content, &[], &mut entries);
                imports.extend(entries.into_iter().map(|(path, name)| ImportSpec {
                    specifier: path.join("::"),
                    names: name.into_iter().collect(),
                    line,
                }));
            }
        }
        // `mod x;` pulls in `x.rs` or `x/mod.rs`
        MOD_ITEM if node.child_by_field_name("body").is_none() => {
            if let Some(name) = node
                .child_by_field_name("name")
                .and_then(|n| node_text(&n, content))
            {
                let (line, _) = start_of(node);
                imports.push(ImportSpec {
                    specifier: format!("self::{name}"),
                    names: vec![name],
                    line,
                });
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                extract_imports(&child, content, imports);
            }
        }
    }
}

/// Flatten a use tree into `(full path, bound name)` pairs.
///
/// Globs yield their prefix with no bound name.
fn collect_use_tree(
    node: &tree_sitter::Node,
    content: &[u8],
    prefix: &[String],
    out: &mut Vec<(Vec<String>, Option<String>)>,
) {
    use node_kinds::{
        CRATE, IDENTIFIER, SCOPED_IDENTIFIER, SCOPED_USE_LIST, SELF, SUPER, USE_AS_CLAUSE,
        USE_LIST, USE_WILDCARD,
    };

    match node.kind() {
        IDENTIFIER | CRATE | SUPER | SCOPED_IDENTIFIER => {
            let mut path = prefix.to_vec();
            collect_scoped_path(node, content, &mut path);
            let name = path.last().cloned();
            out.push((path, name));
        }
        // `{self, ...}` binds the prefix module itself
        SELF => {
            if prefix.is_empty() {
                out.push((vec!["self".to_string()], None));
            } else {
                out.push((prefix.to_vec(), prefix.last().cloned()));
            }
        }
        USE_AS_CLAUSE => {
            let Some(path_node) = node.child_by_field_name("path") else {
                return;
            };
            let mut path = prefix.to_vec();
            collect_scoped_path(&path_node, content, &mut path);
            let alias = node
                .child_by_field_name("alias")
                .and_then(|a| node_text(&a, content));
            out.push((path, alias));
        }
        USE_WILDCARD => {
            let mut path = prefix.to_vec();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_scoped_path(&child, content, &mut path);
            }
            out.push((path, None));
        }
        SCOPED_USE_LIST => {
            let mut path = prefix.to_vec();
            if let Some(path_node) = node.child_by_field_name("path") {
                collect_scoped_path(&path_node, content, &mut path);
            }
            if let Some(list) = node.child_by_field_name("list") {
                collect_use_tree(&list, content, &path, out);
            }
        }
        USE_LIST => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_use_tree(&child, content, prefix, out);
            }
        }
        _ => {}
    }
}

/// Recursively collect path segments from a scoped identifier.
fn collect_scoped_path(node: &tree_sitter::Node, content: &[u8], segments: &mut Vec<String>) {
    use node_kinds::{CRATE, IDENTIFIER, SCOPED_IDENTIFIER, SELF, SUPER};

    match node.kind() {
        SCOPED_IDENTIFIER => {
            if let Some(path_node) = node.child_by_field_name("path") {
                collect_scoped_path(&path_node, content, segments);
            }
            if let Some(name_node) = node.child_by_field_name("name") {
                if let Some(text) = node_text(&name_node, content) {
                    segments.push(text);
                }
            }
        }
        IDENTIFIER | CRATE | SELF | SUPER => {
            if let Some(text) = node_text(node, content) {
                segments.push(text);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(code: &str) -> FileFacts {
        RustAnalyzer
            .analyze(Path::new("src/lib.rs"), code.as_bytes())
            .expect("analysis should succeed")
    }

    fn symbol<'a>(facts: &'a FileFacts, name: &str) -> &'a DefinedSymbol {
        facts
            .symbols
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("symbol {name} not found"))
    }

    fn specifiers(facts: &FileFacts) -> Vec<&str> {
        facts.imports.iter().map(|i| i.specifier.as_str()).collect()
    }

    #[test]
    fn extracts_simple_function() {
        let facts = analyze("fn hello() {}");

        assert_eq!(facts.symbols.len(), 1);
        assert_eq!(facts.symbols[0].name, "hello");
        assert_eq!(facts.symbols[0].kind, SymbolKind::Function);
        assert_eq!(facts.symbols[0].visibility, Visibility::Private);
        assert_eq!((facts.symbols[0].line, facts.symbols[0].column), (1, 1));
    }

    #[test]
    fn extracts_visibility_levels() {
        let facts = analyze(
            "pub fn a() {}\npub(crate) fn b() {}\npub(super) fn c() {}\nfn d() {}",
        );

        assert_eq!(symbol(&facts, "a").visibility, Visibility::Public);
        assert_eq!(symbol(&facts, "b").visibility, Visibility::Crate);
        assert_eq!(symbol(&facts, "c").visibility, Visibility::Module);
        assert_eq!(symbol(&facts, "d").visibility, Visibility::Private);
    }

    #[test]
    fn extracts_type_definitions() {
        let facts = analyze(
            r#"
pub struct User { name: String }
enum Status { Active, Inactive }
pub trait Display { fn display(&self); }
type Id = u64;
const MAX: usize = 3;
static NAME: &str = "x";
"#,
        );

        assert_eq!(symbol(&facts, "User").kind, SymbolKind::Struct);
        assert_eq!(symbol(&facts, "Status").kind, SymbolKind::Enum);
        assert_eq!(symbol(&facts, "Display").kind, SymbolKind::Trait);
        assert_eq!(symbol(&facts, "Id").kind, SymbolKind::TypeAlias);
        assert_eq!(symbol(&facts, "MAX").kind, SymbolKind::Const);
        assert_eq!(symbol(&facts, "NAME").kind, SymbolKind::Static);

        let display = symbol(&facts, "display");
        assert_eq!(display.kind, SymbolKind::Method);
        assert_eq!(display.container.as_deref(), Some("Display"));
    }

    #[test]
    fn extracts_impl_methods_with_container() {
        let facts = analyze(
            r"
struct User {}

impl User {
    pub fn new() -> Self { User {} }
    fn private_method(&self) {}
}

impl<T> Wrapper<T> {
    fn get(&self) -> &T { &self.0 }
}
",
        );

        assert_eq!(facts.symbols.len(), 4);
        let new = symbol(&facts, "new");
        assert_eq!(new.kind, SymbolKind::Method);
        assert_eq!(new.container.as_deref(), Some("User"));
        assert_eq!(new.line, 5);
        assert_eq!(symbol(&facts, "get").container.as_deref(), Some("Wrapper"));
    }

    #[test]
    fn inline_modules_contain_their_items() {
        let facts = analyze("mod inner { pub fn helper() {} }");

        assert_eq!(symbol(&facts, "inner").kind, SymbolKind::Module);
        assert_eq!(symbol(&facts, "helper").container.as_deref(), Some("inner"));
        assert!(facts.imports.is_empty(), "inline mod is not a file dependency");
    }

    #[test]
    fn exported_macros_are_public() {
        let facts = analyze("#[macro_export]\nmacro_rules! shout { () => {} }\nmacro_rules! quiet { () => {} }");

        assert_eq!(symbol(&facts, "shout").visibility, Visibility::Public);
        assert_eq!(symbol(&facts, "quiet").visibility, Visibility::Private);
    }

    #[test]
    fn extracts_simple_use_statement() {
        let facts = analyze("use std::collections::HashMap;");

        assert_eq!(facts.imports.len(), 1);
        assert_eq!(facts.imports[0].specifier, "std::collections::HashMap");
        assert_eq!(facts.imports[0].names, vec!["HashMap"]);
        assert_eq!(facts.imports[0].line, 1);
    }

    #[test]
    fn use_list_yields_one_import_per_name() {
        let facts = analyze("use crate::storage::{Issue, self, backend::Store};");

        assert_eq!(
            specifiers(&facts),
            vec![
                "crate::storage::Issue",
                "crate::storage",
                "crate::storage::backend::Store"
            ]
        );
        assert_eq!(facts.imports[1].names, vec!["storage"]);
    }

    #[test]
    fn use_alias_binds_alias_name() {
        let facts = analyze("use super::config::Config as Settings;");

        assert_eq!(specifiers(&facts), vec!["super::config::Config"]);
        assert_eq!(facts.imports[0].names, vec!["Settings"]);
    }

    #[test]
    fn glob_use_has_no_names() {
        let facts = analyze("use self::prelude::*;");

        assert_eq!(specifiers(&facts), vec!["self::prelude"]);
        assert!(facts.imports[0].names.is_empty());
    }

    #[test]
    fn mod_declaration_is_an_import() {
        let facts = analyze("pub mod storage;\nmod cli;");

        assert_eq!(specifiers(&facts), vec!["self::storage", "self::cli"]);
        assert_eq!(symbol(&facts, "storage").kind, SymbolKind::Module);
    }

    #[test]
    fn extracts_function_call() {
        let facts = analyze("fn main() { foo(); }");

        let foo = facts.references.iter().find(|r| r.name == "foo").unwrap();
        assert_eq!(foo.kind, ReferenceKind::Call);
        assert_eq!((foo.line, foo.column), (1, 13));
    }

    #[test]
    fn extracts_scoped_and_method_calls() {
        let facts = analyze("fn main() { crate::auth::authenticate(); let u = User::new(); u.greet(); }");

        for name in ["authenticate", "new", "greet"] {
            assert!(
                facts
                    .references
                    .iter()
                    .any(|r| r.name == name && r.kind == ReferenceKind::Call),
                "missing call to {name}"
            );
        }
    }

    #[test]
    fn extracts_type_annotation_and_constructor() {
        let facts = analyze("fn new(id: Id) -> User { User { name: \"test\".into() } }");

        assert!(facts
            .references
            .iter()
            .any(|r| r.name == "Id" && r.kind == ReferenceKind::Type));
        assert!(facts
            .references
            .iter()
            .any(|r| r.name == "User" && r.kind == ReferenceKind::Construct));
    }

    #[test]
    fn definition_names_are_not_references() {
        let facts = analyze("struct User {}\nenum Kind { A }\nfn id<T>(t: T) -> T { t }");

        assert!(!facts.references.iter().any(|r| r.name == "User"));
        assert!(!facts.references.iter().any(|r| r.name == "Kind"));
        // `T` in parameter positions is still a type usage; only the declaration is skipped
        let t_refs = facts.references.iter().filter(|r| r.name == "T").count();
        assert_eq!(t_refs, 2);
    }

    #[test]
    fn use_declarations_are_not_references() {
        let facts = analyze("use crate::auth::Authenticator;");
        assert!(facts.references.is_empty());
    }

    #[test]
    fn macro_invocations_are_calls() {
        let facts = analyze("fn main() { shout!(); }");
        assert!(facts
            .references
            .iter()
            .any(|r| r.name == "shout" && r.kind == ReferenceKind::Call));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let result = RustAnalyzer.analyze(Path::new("src/lib.rs"), &[0xff, 0xfe, 0x00]);
        assert_eq!(result, Err(AnalysisError::Encoding));
    }

    #[test]
    fn syntax_errors_still_yield_partial_facts() {
        let facts = analyze("fn ok() {}\nfn broken( {");
        assert!(facts.symbols.iter().any(|s| s.name == "ok"));
    }

    #[test]
    fn import_candidates_follow_module_layout() {
        let import = ImportSpec {
            specifier: "crate::storage::Issue".to_string(),
            names: vec!["Issue".to_string()],
            line: 1,
        };
        let candidates = RustAnalyzer.import_candidates(Path::new("src/cli.rs"), &import);
        assert_eq!(candidates[0], PathBuf::from("src/storage/Issue.rs"));
        assert!(candidates.contains(&PathBuf::from("src/storage.rs")));
    }
}

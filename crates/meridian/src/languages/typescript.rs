//! TypeScript and JavaScript analyzer.
//!
//! One implementation serves `.ts`, `.tsx` and the JavaScript family. Plain
//! TypeScript uses the TypeScript grammar; everything that may contain JSX
//! uses the TSX grammar, which is a superset of JavaScript.

use std::path::{Path, PathBuf};

use super::tree_sitter_utils::{decode, is_field_of_parent, node_text, parse, start_of};
use super::Analyzer;
use crate::error::AnalysisError;
use crate::resolver;
use crate::types::{
    DefinedSymbol, FileFacts, ImportSpec, Language, ReferenceKind, SymbolKind, SymbolReference,
    Visibility,
};

/// Tree-sitter node kind constants for the TypeScript/TSX grammars.
mod node_kinds {
    pub const PROGRAM: &str = "program";
    pub const STATEMENT_BLOCK: &str = "statement_block";

    // Declarations
    pub const FUNCTION_DECLARATION: &str = "function_declaration";
    pub const GENERATOR_FUNCTION_DECLARATION: &str = "generator_function_declaration";
    pub const FUNCTION_SIGNATURE: &str = "function_signature";
    pub const CLASS_DECLARATION: &str = "class_declaration";
    pub const ABSTRACT_CLASS_DECLARATION: &str = "abstract_class_declaration";
    pub const INTERFACE_DECLARATION: &str = "interface_declaration";
    pub const TYPE_ALIAS_DECLARATION: &str = "type_alias_declaration";
    pub const ENUM_DECLARATION: &str = "enum_declaration";
    pub const INTERNAL_MODULE: &str = "internal_module";
    pub const MODULE: &str = "module";
    pub const LEXICAL_DECLARATION: &str = "lexical_declaration";
    pub const VARIABLE_DECLARATION: &str = "variable_declaration";
    pub const VARIABLE_DECLARATOR: &str = "variable_declarator";
    pub const EXPORT_STATEMENT: &str = "export_statement";

    // Class members
    pub const METHOD_DEFINITION: &str = "method_definition";
    pub const ABSTRACT_METHOD_SIGNATURE: &str = "abstract_method_signature";
    pub const PUBLIC_FIELD_DEFINITION: &str = "public_field_definition";
    pub const ACCESSIBILITY_MODIFIER: &str = "accessibility_modifier";
    pub const PRIVATE_PROPERTY_IDENTIFIER: &str = "private_property_identifier";

    // Function values
    pub const ARROW_FUNCTION: &str = "arrow_function";
    pub const FUNCTION_EXPRESSION: &str = "function_expression";
    pub const FUNCTION: &str = "function";
    pub const GENERATOR_FUNCTION: &str = "generator_function";

    // Imports
    pub const IMPORT_STATEMENT: &str = "import_statement";
    pub const IMPORT_CLAUSE: &str = "import_clause";
    pub const IMPORT_REQUIRE_CLAUSE: &str = "import_require_clause";
    pub const NAMED_IMPORTS: &str = "named_imports";
    pub const IMPORT_SPECIFIER: &str = "import_specifier";
    pub const EXPORT_CLAUSE: &str = "export_clause";
    pub const EXPORT_SPECIFIER: &str = "export_specifier";
    pub const IMPORT: &str = "import";
    pub const STRING: &str = "string";

    // References
    pub const CALL_EXPRESSION: &str = "call_expression";
    pub const NEW_EXPRESSION: &str = "new_expression";
    pub const MEMBER_EXPRESSION: &str = "member_expression";
    pub const IDENTIFIER: &str = "identifier";
    pub const TYPE_IDENTIFIER: &str = "type_identifier";
    pub const EXTENDS_CLAUSE: &str = "extends_clause";
    pub const JSX_OPENING_ELEMENT: &str = "jsx_opening_element";
    pub const JSX_SELF_CLOSING_ELEMENT: &str = "jsx_self_closing_element";
}

/// Analyzer for the ECMAScript family (TypeScript, TSX, JavaScript).
#[derive(Debug, Clone, Copy)]
pub struct EcmaAnalyzer {
    language: Language,
}

impl EcmaAnalyzer {
    /// Analyzer for `.ts`, `.mts` and `.cts` files.
    #[must_use]
    pub fn typescript() -> Self {
        Self {
            language: Language::TypeScript,
        }
    }

    /// Analyzer for `.tsx` files.
    #[must_use]
    pub fn tsx() -> Self {
        Self {
            language: Language::Tsx,
        }
    }

    /// Analyzer for `.js`, `.jsx`, `.mjs` and `.cjs` files.
    #[must_use]
    pub fn javascript() -> Self {
        Self {
            language: Language::JavaScript,
        }
    }

    fn grammar(self) -> tree_sitter::Language {
        if self.language == Language::TypeScript {
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
        } else {
            tree_sitter_typescript::LANGUAGE_TSX.into()
        }
    }
}

impl Analyzer for EcmaAnalyzer {
    fn language(&self) -> Language {
        self.language
    }

    fn version(&self) -> u32 {
        1
    }

    fn analyze(&self, _path: &Path, content: &[u8]) -> Result<FileFacts, AnalysisError> {
        let source = decode(content)?;
        let tree = parse(&self.grammar(), source)?;
        let root = tree.root_node();

        let mut facts = FileFacts::default();
        extract_symbols(&root, content, &mut facts.symbols, None);
        extract_references(&root, content, &mut facts.references);
        extract_imports(&root, content, &mut facts.imports);
        Ok(facts)
    }

    fn import_candidates(&self, from: &Path, import: &ImportSpec) -> Vec<PathBuf> {
        resolver::ecma_candidates(from, &import.specifier)
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
        ABSTRACT_CLASS_DECLARATION, CLASS_DECLARATION, ENUM_DECLARATION, FUNCTION_DECLARATION,
        FUNCTION_SIGNATURE, GENERATOR_FUNCTION_DECLARATION, INTERFACE_DECLARATION,
        INTERNAL_MODULE, LEXICAL_DECLARATION, MODULE, TYPE_ALIAS_DECLARATION,
        VARIABLE_DECLARATION,
    };

    let simple_kind = match node.kind() {
        FUNCTION_DECLARATION | GENERATOR_FUNCTION_DECLARATION | FUNCTION_SIGNATURE => {
            Some(SymbolKind::Function)
        }
        INTERFACE_DECLARATION => Some(SymbolKind::Interface),
        TYPE_ALIAS_DECLARATION => Some(SymbolKind::TypeAlias),
        ENUM_DECLARATION => Some(SymbolKind::Enum),
        _ => None,
    };
    if let Some(kind) = simple_kind {
        if let Some(sym) = declaration(node, content, kind, container) {
            symbols.push(sym);
        }
        return;
    }

    match node.kind() {
        CLASS_DECLARATION | ABSTRACT_CLASS_DECLARATION => {
            let Some(sym) = declaration(node, content, SymbolKind::Class, container) else {
                return;
            };
            let class_name = sym.name.clone();
            symbols.push(sym);
            if let Some(body) = node.child_by_field_name("body") {
                extract_class_members(&body, content, symbols, &class_name);
            }
        }
        INTERNAL_MODULE | MODULE => {
            let Some(sym) = declaration(node, content, SymbolKind::Module, container) else {
                return;
            };
            let namespace = sym.name.clone();
            symbols.push(sym);
            if let Some(body) = node.child_by_field_name("body") {
                let mut cursor = body.walk();
                for child in body.children(&mut cursor) {
                    extract_symbols(&child, content, symbols, Some(&namespace));
                }
            }
        }
        LEXICAL_DECLARATION | VARIABLE_DECLARATION => {
            if is_module_scope(node) {
                extract_bindings(node, content, symbols, container);
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

fn extract_class_members(
    body: &tree_sitter::Node,
    content: &[u8],
    symbols: &mut Vec<DefinedSymbol>,
    class_name: &str,
) {
    use node_kinds::{ABSTRACT_METHOD_SIGNATURE, METHOD_DEFINITION, PUBLIC_FIELD_DEFINITION};

    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        let is_method = match member.kind() {
            METHOD_DEFINITION | ABSTRACT_METHOD_SIGNATURE => true,
            // `handle = () => { ... }`
            PUBLIC_FIELD_DEFINITION => member
                .child_by_field_name("value")
                .is_some_and(|v| is_function_value(&v)),
            _ => false,
        };
        if !is_method {
            continue;
        }
        let Some(name_node) = member.child_by_field_name("name") else {
            continue;
        };
        let Some(name) = node_text(&name_node, content) else {
            continue;
        };
        let (line, column) = start_of(&member);
        symbols.push(DefinedSymbol {
            name,
            kind: SymbolKind::Method,
            line,
            column,
            visibility: member_visibility(&member, &name_node, content),
            container: Some(class_name.to_string()),
        });
    }
}

/// Named bindings of a module-scope `const`/`let`/`var` declaration.
fn extract_bindings(
    node: &tree_sitter::Node,
    content: &[u8],
    symbols: &mut Vec<DefinedSymbol>,
    container: Option<&str>,
) {
    use node_kinds::{IDENTIFIER, VARIABLE_DECLARATOR};

    let is_const = node.child(0).is_some_and(|keyword| keyword.kind() == "const");
    let visibility = export_visibility(node);

    let mut cursor = node.walk();
    for declarator in node.children(&mut cursor) {
        if declarator.kind() != VARIABLE_DECLARATOR {
            continue;
        }
        // Destructuring patterns bind no single name
        let Some(name_node) = declarator
            .child_by_field_name("name")
            .filter(|n| n.kind() == IDENTIFIER)
        else {
            continue;
        };
        let Some(name) = node_text(&name_node, content) else {
            continue;
        };
        let kind = match declarator.child_by_field_name("value") {
            Some(value) if is_function_value(&value) => SymbolKind::Function,
            _ if is_const => SymbolKind::Const,
            _ => SymbolKind::Variable,
        };
        let (line, column) = start_of(&declarator);
        symbols.push(DefinedSymbol {
            name,
            kind,
            line,
            column,
            visibility,
            container: container.map(String::from),
        });
    }
}

fn declaration(
    node: &tree_sitter::Node,
    content: &[u8],
    kind: SymbolKind,
    container: Option<&str>,
) -> Option<DefinedSymbol> {
    let name_node = node.child_by_field_name("name")?;
    let name = node_text(&name_node, content)?;
    // `declare module "pkg"` names are string literals
    let name = name.trim_matches(|c| c == '"' || c == '\'').to_string();
    let (line, column) = start_of(node);

    Some(DefinedSymbol {
        name,
        kind,
        line,
        column,
        visibility: export_visibility(node),
        container: container.map(String::from),
    })
}

fn is_function_value(node: &tree_sitter::Node) -> bool {
    use node_kinds::{ARROW_FUNCTION, FUNCTION, FUNCTION_EXPRESSION, GENERATOR_FUNCTION};
    matches!(
        node.kind(),
        ARROW_FUNCTION | FUNCTION_EXPRESSION | FUNCTION | GENERATOR_FUNCTION
    )
}

/// Whether a declaration sits at module (or namespace) scope.
fn is_module_scope(node: &tree_sitter::Node) -> bool {
    use node_kinds::{EXPORT_STATEMENT, INTERNAL_MODULE, MODULE, PROGRAM, STATEMENT_BLOCK};

    let mut parent = node.parent();
    if parent.is_some_and(|p| p.kind() == EXPORT_STATEMENT) {
        parent = parent.and_then(|p| p.parent());
    }
    match parent {
        Some(p) if p.kind() == PROGRAM => true,
        Some(p) if p.kind() == STATEMENT_BLOCK => p
            .parent()
            .is_some_and(|g| matches!(g.kind(), INTERNAL_MODULE | MODULE)),
        _ => false,
    }
}

fn export_visibility(node: &tree_sitter::Node) -> Visibility {
    if node
        .parent()
        .is_some_and(|p| p.kind() == node_kinds::EXPORT_STATEMENT)
    {
        Visibility::Public
    } else {
        Visibility::Private
    }
}

fn member_visibility(
    member: &tree_sitter::Node,
    name_node: &tree_sitter::Node,
    content: &[u8],
) -> Visibility {
    if name_node.kind() == node_kinds::PRIVATE_PROPERTY_IDENTIFIER {
        return Visibility::Private;
    }
    let mut cursor = member.walk();
    for child in member.children(&mut cursor) {
        if child.kind() == node_kinds::ACCESSIBILITY_MODIFIER {
            return match node_text(&child, content).as_deref() {
                Some("private") => Visibility::Private,
                Some("protected") => Visibility::Module,
                _ => Visibility::Public,
            };
        }
    }
    Visibility::Public
}

// ============================================================================
// References
// ============================================================================

fn extract_references(node: &tree_sitter::Node, content: &[u8], refs: &mut Vec<SymbolReference>) {
    use node_kinds::{
        CALL_EXPRESSION, EXTENDS_CLAUSE, IDENTIFIER, IMPORT_STATEMENT, JSX_OPENING_ELEMENT,
        JSX_SELF_CLOSING_ELEMENT, NEW_EXPRESSION, TYPE_IDENTIFIER,
    };

    match node.kind() {
        IMPORT_STATEMENT => {
            import_binding_references(node, content, refs);
            return;
        }
        CALL_EXPRESSION => {
            if import_call_specifier(node, content).is_none() {
                if let Some(function) = node.child_by_field_name("function") {
                    push_callee(&function, content, ReferenceKind::Call, refs);
                }
            }
        }
        NEW_EXPRESSION => {
            if let Some(constructor) = node.child_by_field_name("constructor") {
                push_callee(&constructor, content, ReferenceKind::Construct, refs);
            }
        }
        EXTENDS_CLAUSE => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == IDENTIFIER {
                    push_reference(&child, content, ReferenceKind::Type, refs);
                }
            }
        }
        JSX_OPENING_ELEMENT | JSX_SELF_CLOSING_ELEMENT => {
            if let Some(name) = node.child_by_field_name("name") {
                push_component(&name, content, refs);
            }
        }
        TYPE_IDENTIFIER => {
            if !is_type_definition_context(node) {
                push_reference(node, content, ReferenceKind::Type, refs);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        extract_references(&child, content, refs);
    }
}

/// Reference to a called or constructed expression: `foo()`, `api.get()`.
fn push_callee(
    node: &tree_sitter::Node,
    content: &[u8],
    kind: ReferenceKind,
    refs: &mut Vec<SymbolReference>,
) {
    match node.kind() {
        node_kinds::IDENTIFIER => push_reference(node, content, kind, refs),
        node_kinds::MEMBER_EXPRESSION => {
            if let Some(property) = node.child_by_field_name("property") {
                push_reference(&property, content, kind, refs);
            }
        }
        _ => {}
    }
}

/// JSX elements whose tag names a component rather than an intrinsic element.
fn push_component(name: &tree_sitter::Node, content: &[u8], refs: &mut Vec<SymbolReference>) {
    match name.kind() {
        node_kinds::IDENTIFIER => {
            let capitalised = node_text(name, content)
                .is_some_and(|t| t.chars().next().is_some_and(char::is_uppercase));
            if capitalised {
                push_reference(name, content, ReferenceKind::Construct, refs);
            }
        }
        node_kinds::MEMBER_EXPRESSION => {
            if let Some(property) = name.child_by_field_name("property") {
                push_reference(&property, content, ReferenceKind::Construct, refs);
            }
        }
        _ => {}
    }
}

fn push_reference(
    node: &tree_sitter::Node,
    content: &[u8],
    kind: ReferenceKind,
    refs: &mut Vec<SymbolReference>,
) {
    if let Some(name) = node_text(node, content) {
        let (line, column) = start_of(node);
        refs.push(SymbolReference {
            name,
            kind,
            line,
            column,
        });
    }
}

/// Imported names, recorded where they are bound.
fn import_binding_references(
    node: &tree_sitter::Node,
    content: &[u8],
    refs: &mut Vec<SymbolReference>,
) {
    for (name_node, _) in import_bindings(node) {
        push_reference(&name_node, content, ReferenceKind::Import, refs);
    }
}

fn is_type_definition_context(node: &tree_sitter::Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "class_declaration"
        | "abstract_class_declaration"
        | "class"
        | "interface_declaration"
        | "type_alias_declaration"
        | "type_parameter" => is_field_of_parent(node, "name"),
        _ => false,
    }
}

// ============================================================================
// Imports
// ============================================================================

fn extract_imports(node: &tree_sitter::Node, content: &[u8], imports: &mut Vec<ImportSpec>) {
    use node_kinds::{
        CALL_EXPRESSION, EXPORT_CLAUSE, EXPORT_SPECIFIER, EXPORT_STATEMENT, IMPORT_REQUIRE_CLAUSE,
        IMPORT_STATEMENT,
    };

    match node.kind() {
        IMPORT_STATEMENT => {
            let source = node.child_by_field_name("source").or_else(|| {
                let mut cursor = node.walk();
                node.named_children(&mut cursor)
                    .find(|c| c.kind() == IMPORT_REQUIRE_CLAUSE)
                    .and_then(|clause| clause.child_by_field_name("source"))
            });
            if let Some(specifier) = source.and_then(|s| string_value(&s, content)) {
                let names = import_bindings(node)
                    .into_iter()
                    .filter_map(|(name, _)| node_text(&name, content))
                    .collect();
                imports.push(ImportSpec {
                    specifier,
                    names,
                    line: start_of(node).0,
                });
            }
            return;
        }
        // `export { a } from "./a"` and `export * from "./b"`
        EXPORT_STATEMENT => {
            if let Some(specifier) = node
                .child_by_field_name("source")
                .and_then(|s| string_value(&s, content))
            {
                let mut names = Vec::new();
                let mut cursor = node.walk();
                for clause in node.named_children(&mut cursor) {
                    if clause.kind() != EXPORT_CLAUSE {
                        continue;
                    }
                    let mut inner = clause.walk();
                    for spec in clause.named_children(&mut inner) {
                        if spec.kind() == EXPORT_SPECIFIER {
                            if let Some(name) = spec
                                .child_by_field_name("name")
                                .and_then(|n| node_text(&n, content))
                            {
                                names.push(name);
                            }
                        }
                    }
                }
                imports.push(ImportSpec {
                    specifier,
                    names,
                    line: start_of(node).0,
                });
                return;
            }
        }
        CALL_EXPRESSION => {
            if let Some(specifier) = import_call_specifier(node, content) {
                imports.push(ImportSpec {
                    specifier,
                    names: Vec::new(),
                    line: start_of(node).0,
                });
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        extract_imports(&child, content, imports);
    }
}

/// Identifier nodes bound by an import statement, with their local alias.
///
/// Default and named imports are included; namespace imports bind no
/// exported name and are skipped.
fn import_bindings<'tree>(
    node: &tree_sitter::Node<'tree>,
) -> Vec<(tree_sitter::Node<'tree>, Option<tree_sitter::Node<'tree>>)> {
    use node_kinds::{IDENTIFIER, IMPORT_CLAUSE, IMPORT_SPECIFIER, NAMED_IMPORTS};

    let mut bindings = Vec::new();
    let mut cursor = node.walk();
    for clause in node.named_children(&mut cursor) {
        if clause.kind() != IMPORT_CLAUSE {
            continue;
        }
        let mut clause_cursor = clause.walk();
        for part in clause.named_children(&mut clause_cursor) {
            match part.kind() {
                IDENTIFIER => bindings.push((part, None)),
                NAMED_IMPORTS => {
                    let mut named_cursor = part.walk();
                    for spec in part.named_children(&mut named_cursor) {
                        if spec.kind() != IMPORT_SPECIFIER {
                            continue;
                        }
                        if let Some(name) = spec.child_by_field_name("name") {
                            bindings.push((name, spec.child_by_field_name("alias")));
                        }
                    }
                }
                _ => {}
            }
        }
    }
    bindings
}

/// The specifier of `require("x")` or `import("x")`, if this call is one.
fn import_call_specifier(node: &tree_sitter::Node, content: &[u8]) -> Option<String> {
    use node_kinds::{IDENTIFIER, IMPORT, STRING};

    let function = node.child_by_field_name("function")?;
    let is_loader = match function.kind() {
        IMPORT => true,
        IDENTIFIER => node_text(&function, content).as_deref() == Some("require"),
        _ => false,
    };
    if !is_loader {
        return None;
    }
    let arguments = node.child_by_field_name("arguments")?;
    let first = arguments.named_child(0)?;
    if first.kind() != STRING {
        return None;
    }
    string_value(&first, content)
}

fn string_value(node: &tree_sitter::Node, content: &[u8]) -> Option<String> {
    let text = node_text(node, content)?;
    let trimmed = text.trim_matches(|c| c == '"' || c == '\'' || c == '`');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

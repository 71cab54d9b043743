//! Source syntax representation.
//!
//! A [`SyntaxTree`] holds the text of one source file together with the type
//! declarations found in it. Parsing is a single pass: conditional
//! directives are evaluated first ([`preprocess`]), the remaining text is
//! tokenized ([`lexer`]), and a structural scan records every class, struct,
//! interface, enum and record with its namespace, enclosing types, attribute
//! names and documentation comment.
//!
//! Member bodies are skipped; nothing below the type level is modelled.

pub mod annotations;
pub mod lexer;
pub mod preprocess;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use self::annotations::{FALLBACK_PATH, FALLBACK_SOURCE, OBJECT_MARKER};
use self::lexer::{Lexer, Token, TokenKind};

/// Language version the sources are parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageVersion {
    #[default]
    Latest,
}

/// Whether `///` documentation comments are retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentationMode {
    None,
    #[default]
    Parse,
}

/// Kind of source unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Regular,
}

/// Options every source of a compilation is parsed with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseOptions {
    pub language_version: LanguageVersion,
    pub documentation: DocumentationMode,
    pub kind: SourceKind,
    /// Symbols considered defined by `#if`
    pub preprocessor_symbols: BTreeSet<String>,
}

impl ParseOptions {
    /// Latest language version, documentation parsed, regular sources, and
    /// the given symbols.
    pub fn with_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParseOptions {
            preprocessor_symbols: symbols.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Kind of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Record,
    RecordStruct,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
            TypeKind::RecordStruct => "record struct",
        };
        f.write_str(s)
    }
}

/// A type declared in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDeclaration {
    pub kind: TypeKind,
    pub name: String,
    /// Enclosing namespace, dotted
    pub namespace: Option<String>,
    /// Enclosing types, outermost first
    pub containing: Vec<String>,
    /// Attribute names as written, without arguments or qualifiers
    pub attributes: Vec<String>,
    /// Documentation comment lines, joined with newlines
    pub doc: Option<String>,
    pub line: u32,
}

impl TypeDeclaration {
    /// Namespace-qualified name, with enclosing types separated by `+`.
    pub fn full_name(&self) -> String {
        let mut name = String::new();
        if let Some(ns) = &self.namespace {
            name.push_str(ns);
            name.push('.');
        }
        for outer in &self.containing {
            name.push_str(outer);
            name.push('+');
        }
        name.push_str(&self.name);
        name
    }

    /// Check for an attribute, with or without its `Attribute` suffix.
    pub fn has_attribute(&self, name: &str) -> bool {
        let wanted = name.strip_suffix("Attribute").unwrap_or(name);
        self.attributes
            .iter()
            .any(|a| a.strip_suffix("Attribute").unwrap_or(a) == wanted)
    }
}

/// One parsed source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    path: PathBuf,
    text: String,
    declarations: Vec<TypeDeclaration>,
    declares_object_marker: bool,
    generated: bool,
}

impl SyntaxTree {
    /// Parse `text` as the contents of `path`.
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>, options: &ParseOptions) -> Self {
        let path = path.into();
        let mut text = text.into();
        if text.starts_with('\u{feff}') {
            text.drain(..'\u{feff}'.len_utf8());
        }

        let visible = preprocess::preprocess(&text, &options.preprocessor_symbols);
        let keep_docs = options.documentation == DocumentationMode::Parse;
        let tokens = Lexer::new(&visible, keep_docs).tokenize();
        let declarations = Scanner::new(tokens).scan();

        let declares_object_marker = declarations
            .iter()
            .any(|d| d.kind == TypeKind::Class && d.name == OBJECT_MARKER);
        if declares_object_marker {
            tracing::debug!("{} declares {}", path.display(), OBJECT_MARKER);
        }

        SyntaxTree {
            path,
            text,
            declarations,
            declares_object_marker,
            generated: false,
        }
    }

    /// The synthesised tree declaring the serialization attributes.
    pub fn fallback_annotations(options: &ParseOptions) -> Self {
        let mut tree = Self::parse(FALLBACK_PATH, FALLBACK_SOURCE, options);
        tree.generated = true;
        tree
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Types declared in active regions of the file, in source order.
    pub fn declarations(&self) -> &[TypeDeclaration] {
        &self.declarations
    }

    /// Whether the file declares the object-marker attribute class.
    pub fn declares_object_marker(&self) -> bool {
        self.declares_object_marker
    }

    /// Whether the file follows the `Attributes.cs` naming convention for
    /// hand-written attribute declarations.
    pub fn is_attributes_file(&self) -> bool {
        self.path.file_stem().is_some_and(|s| s == "Attributes")
    }

    /// Whether the tree was synthesised rather than read from disk.
    pub fn is_generated(&self) -> bool {
        self.generated
    }
}

#[derive(Debug)]
enum Scope {
    Namespace(String),
    Type(String),
    /// Member bodies, initializers and anything else between braces
    Block,
}

const TYPE_KEYWORDS: &[&str] = &["class", "struct", "interface", "enum", "record"];

/// Identifiers that can follow a type keyword without naming a type
/// (`where T : struct where U : class`).
const NOT_A_NAME: &[&str] = &["where", "new", "unmanaged", "notnull"];

struct Scanner<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    scopes: Vec<Scope>,
    file_namespace: Option<String>,
    attributes: Vec<String>,
    docs: Vec<&'a str>,
    /// Last non-doc token, to tell attribute sections from indexers
    last: Option<TokenKind>,
    /// Type header seen, waiting for its `{` or `;`
    pending: Option<TypeDeclaration>,
    declarations: Vec<TypeDeclaration>,
}

impl<'a> Scanner<'a> {
    fn new(tokens: Vec<Token<'a>>) -> Self {
        Scanner {
            tokens,
            pos: 0,
            scopes: Vec::new(),
            file_namespace: None,
            attributes: Vec::new(),
            docs: Vec::new(),
            last: None,
            pending: None,
            declarations: Vec::new(),
        }
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek_at(&self, offset: usize) -> Option<&Token<'a>> {
        self.tokens.get(self.pos + offset)
    }

    fn in_block(&self) -> bool {
        matches!(self.scopes.last(), Some(Scope::Block))
    }

    fn scan(mut self) -> Vec<TypeDeclaration> {
        while let Some(token) = self.next() {
            if self.in_block() {
                match token.kind {
                    TokenKind::Punct('{') => self.scopes.push(Scope::Block),
                    TokenKind::Punct('}') => {
                        self.scopes.pop();
                    }
                    _ => {}
                }
                self.last = Some(token.kind);
                continue;
            }

            match token.kind {
                TokenKind::DocComment => {
                    if self.pending.is_none() {
                        self.docs.push(token.text);
                    }
                    continue;
                }
                TokenKind::Punct('[') if self.pending.is_none() && self.at_member_start() => {
                    self.attribute_section();
                    continue;
                }
                TokenKind::Punct('{') => self.open_brace(),
                TokenKind::Punct('}') => {
                    self.scopes.pop();
                    self.clear_member();
                }
                TokenKind::Punct(';') => {
                    if let Some(decl) = self.pending.take() {
                        self.declarations.push(decl);
                    }
                    self.clear_member();
                }
                TokenKind::Ident if self.pending.is_none() => {
                    if token.text == "namespace" {
                        self.namespace();
                        continue;
                    }
                    if TYPE_KEYWORDS.contains(&token.text) && !self.after_constraint_colon() {
                        self.type_header(token.text);
                        continue;
                    }
                }
                _ => {}
            }
            self.last = Some(token.kind);
        }

        if let Some(decl) = self.pending.take() {
            self.declarations.push(decl);
        }
        self.declarations
    }

    fn at_member_start(&self) -> bool {
        matches!(
            self.last,
            None | Some(TokenKind::Punct(';' | '{' | '}' | ']'))
        )
    }

    fn after_constraint_colon(&self) -> bool {
        matches!(self.last, Some(TokenKind::Punct(':' | ',')))
    }

    fn clear_member(&mut self) {
        self.attributes.clear();
        self.docs.clear();
    }

    fn open_brace(&mut self) {
        match self.pending.take() {
            Some(decl) => {
                self.scopes.push(Scope::Type(decl.name.clone()));
                self.declarations.push(decl);
            }
            None => self.scopes.push(Scope::Block),
        }
        self.clear_member();
    }

    /// `namespace A.B;` or `namespace A.B {`
    fn namespace(&mut self) {
        let mut name = String::new();
        while let Some(token) = self.peek_at(0) {
            match token.kind {
                TokenKind::Ident => name.push_str(token.text),
                TokenKind::Punct('.') => name.push('.'),
                _ => break,
            }
            self.pos += 1;
        }

        match self.next() {
            Some(t) if t.is_punct(';') => {
                self.file_namespace = Some(name);
                self.last = Some(t.kind);
            }
            Some(t) if t.is_punct('{') => {
                self.scopes.push(Scope::Namespace(name));
                self.last = Some(t.kind);
            }
            other => {
                tracing::debug!("unterminated namespace declaration `{}`", name);
                self.last = other.map(|t| t.kind);
            }
        }
        self.clear_member();
    }

    fn type_header(&mut self, keyword: &str) {
        let mut kind = match keyword {
            "class" => TypeKind::Class,
            "struct" => TypeKind::Struct,
            "interface" => TypeKind::Interface,
            "enum" => TypeKind::Enum,
            _ => TypeKind::Record,
        };

        if kind == TypeKind::Record {
            match self.peek_at(0) {
                Some(t) if t.is_ident("struct") => {
                    kind = TypeKind::RecordStruct;
                    self.pos += 1;
                }
                Some(t) if t.is_ident("class") => self.pos += 1,
                _ => {}
            }
        }

        let name = match self.peek_at(0) {
            Some(t) if t.kind == TokenKind::Ident && !NOT_A_NAME.contains(&t.text) => t.clone(),
            _ => {
                self.last = Some(TokenKind::Ident);
                return;
            }
        };
        self.pos += 1;
        self.last = Some(TokenKind::Ident);

        let doc = if self.docs.is_empty() {
            None
        } else {
            Some(self.docs.join("\n"))
        };

        self.pending = Some(TypeDeclaration {
            kind,
            name: name.text.to_string(),
            namespace: self.current_namespace(),
            containing: self.containing_types(),
            attributes: std::mem::take(&mut self.attributes),
            doc,
            line: name.line,
        });
        self.docs.clear();
    }

    /// Parse `[...]` after its opening bracket, collecting attribute names.
    fn attribute_section(&mut self) {
        let mut depth = 0usize;
        let mut expect_name = true;

        while let Some(token) = self.next() {
            match token.kind {
                TokenKind::Punct('(' | '[' | '{') => depth += 1,
                TokenKind::Punct(')' | '}') => depth = depth.saturating_sub(1),
                TokenKind::Punct(']') if depth == 0 => break,
                TokenKind::Punct(']') => depth -= 1,
                TokenKind::Punct(',') if depth == 0 => expect_name = true,
                TokenKind::Ident if depth == 0 && expect_name => {
                    // `assembly:` / `return:` target, but not `global::`
                    let target = self.peek_at(0).is_some_and(|t| t.is_punct(':'))
                        && !self.peek_at(1).is_some_and(|t| t.is_punct(':'));
                    if target {
                        self.pos += 1;
                        continue;
                    }
                    let name = self.qualified_name(token.text);
                    self.attributes.push(name.to_string());
                    expect_name = false;
                }
                _ => {}
            }
        }

        self.last = Some(TokenKind::Punct(']'));
    }

    /// Consume `.Name` and `::Name` continuations, returning the last segment.
    fn qualified_name(&mut self, first: &'a str) -> &'a str {
        let mut last = first;
        loop {
            let dot = self.peek_at(0).is_some_and(|t| t.is_punct('.'));
            let alias = self.peek_at(0).is_some_and(|t| t.is_punct(':'))
                && self.peek_at(1).is_some_and(|t| t.is_punct(':'));
            let skip = if dot {
                1
            } else if alias {
                2
            } else {
                return last;
            };
            match self.peek_at(skip) {
                Some(t) if t.kind == TokenKind::Ident => {
                    last = t.text;
                    self.pos += skip + 1;
                }
                _ => return last,
            }
        }
    }

    fn current_namespace(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .file_namespace
            .iter()
            .map(String::as_str)
            .chain(self.scopes.iter().filter_map(|s| match s {
                Scope::Namespace(name) => Some(name.as_str()),
                _ => None,
            }))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("."))
        }
    }

    fn containing_types(&self) -> Vec<String> {
        self.scopes
            .iter()
            .filter_map(|s| match s {
                Scope::Type(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> SyntaxTree {
        SyntaxTree::parse("Sample.cs", text, &ParseOptions::default())
    }

    fn names(tree: &SyntaxTree) -> Vec<String> {
        tree.declarations().iter().map(|d| d.full_name()).collect()
    }

    #[test]
    fn test_block_namespace_and_nesting() {
        let tree = parse(
            r#"using System;

namespace Game.Models
{
    /// <summary>
    /// A player.
    /// </summary>
    [MessagePackObject(true)]
    [Serializable, global::System.Obsolete("old")]
    public sealed partial class Player<T> : Base where T : class, new()
    {
        [Key(0)] public int[] Scores { get; set; } = new int[] { 1, 2 };

        public void Update() { var s = "class Fake {"; if (x) { } }

        public enum State : byte { Idle, [Obsolete] Running }

        private struct Inner { }
    }

    public interface IEntity { }
}
"#,
        );

        assert_eq!(
            names(&tree),
            [
                "Game.Models.Player",
                "Game.Models.Player+State",
                "Game.Models.Player+Inner",
                "Game.Models.IEntity",
            ]
        );

        let player = &tree.declarations()[0];
        assert_eq!(player.kind, TypeKind::Class);
        assert_eq!(player.attributes, ["MessagePackObject", "Serializable", "Obsolete"]);
        assert!(player.has_attribute("MessagePackObjectAttribute"));
        assert_eq!(
            player.doc.as_deref(),
            Some("<summary>\nA player.\n</summary>")
        );
        assert_eq!(player.line, 10);

        let state = &tree.declarations()[1];
        assert_eq!(state.kind, TypeKind::Enum);
        assert!(state.attributes.is_empty());
        assert!(state.doc.is_none());
    }

    #[test]
    fn test_file_scoped_namespace_and_records() {
        let tree = parse(
            "namespace App.Data;\n\
             public record Point(int X, [property: Key(1)] int Y);\n\
             public record struct Size(int W, int H) { }\n\
             public readonly record class Line(Point A, Point B);\n",
        );

        let kinds: Vec<_> = tree.declarations().iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            [TypeKind::Record, TypeKind::RecordStruct, TypeKind::Record]
        );
        assert_eq!(names(&tree), ["App.Data.Point", "App.Data.Size", "App.Data.Line"]);
    }

    #[test]
    fn test_generic_constraints_are_not_types() {
        let tree = parse(
            "class Repo { T Get<T>() where T : struct { return default; } \
             void Put<T, U>(T t) where T : class where U : struct; }",
        );
        assert_eq!(names(&tree), ["Repo"]);
    }

    #[test]
    fn test_preprocessor_hides_declarations() {
        let text = "#if UNITY_EDITOR\nclass EditorOnly { }\n#else\nclass Runtime { }\n#endif\n";

        let tree = parse(text);
        assert_eq!(names(&tree), ["Runtime"]);

        let tree = SyntaxTree::parse("A.cs", text, &ParseOptions::with_symbols(["UNITY_EDITOR"]));
        assert_eq!(names(&tree), ["EditorOnly"]);
        assert_eq!(tree.declarations()[0].line, 2);
    }

    #[test]
    fn test_object_marker_detection() {
        let tree = SyntaxTree::parse(
            "Attributes.cs",
            "namespace MessagePack { public class MessagePackObjectAttribute : System.Attribute { } }",
            &ParseOptions::default(),
        );
        assert!(tree.declares_object_marker());
        assert!(tree.is_attributes_file());

        let tree = parse("[MessagePackObject] public class MessagePackObjectAttributeUser { }");
        assert!(!tree.declares_object_marker());
        assert!(!tree.is_attributes_file());
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let tree = parse("\u{feff}[MessagePackObject]\npublic class Foo { }");
        assert_eq!(names(&tree), ["Foo"]);
        assert!(tree.declarations()[0].has_attribute("MessagePackObject"));
        assert!(!tree.text().starts_with('\u{feff}'));

        let tree = parse(
            "\u{feff}#if NEVER_DEFINED\nnamespace MessagePack { public class MessagePackObjectAttribute { } }\n#endif\n",
        );
        assert!(tree.declarations().is_empty());
        assert!(!tree.declares_object_marker());
    }

    #[test]
    fn test_fallback_annotations() {
        let tree = SyntaxTree::fallback_annotations(&ParseOptions::default());
        assert!(tree.is_generated());
        assert!(tree.declares_object_marker());

        let names = names(&tree);
        for expected in [
            "MessagePack.MessagePackObjectAttribute",
            "MessagePack.KeyAttribute",
            "MessagePack.IgnoreMemberAttribute",
            "MessagePack.UnionAttribute",
            "MessagePack.SerializationConstructorAttribute",
            "MessagePack.MessagePackFormatterAttribute",
            "MessagePack.IMessagePackSerializationCallbackReceiver",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_documentation_mode_none() {
        let options = ParseOptions {
            documentation: DocumentationMode::None,
            ..Default::default()
        };
        let tree = SyntaxTree::parse("A.cs", "/// doc\nclass A { }", &options);
        assert!(tree.declarations()[0].doc.is_none());
    }
}

//! Java source chunker.
//!
//! Turns one source file into a layered set of [`Chunk`]s:
//!
//! 1. one **full-unit** chunk holding the whole file, named after its first
//!    type declaration (`"Unknown"` when there is none), then
//! 2. one **method** chunk per method or constructor declaration anywhere in
//!    the tree, holding the exact source lines of the declaration.
//!
//! Parsing uses `tree-sitter-java`, which always produces a tree and marks
//! damaged regions with ERROR / MISSING nodes. A file counts as unparseable
//! only when it has syntax errors *and* no declaration can be recovered.
//!
//! # Method boundaries
//!
//! An error-free declaration ends where its node ends. A declaration whose
//! subtree contains errors has an unreliable end position, so its end line is
//! recomputed with [`resolve_end_by_braces`], a brace-depth scan that always
//! terminates at or before the last line.
//!
//! # Example
//!
//! ```rust
//! use coderag_core::chunk::parse_source;
//! use coderag_core::models::ChunkKind;
//!
//! let src = "class A {\n    void run() {\n        go();\n    }\n}\n";
//! let chunks = parse_source(src, "p1/A.java", "p1");
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[0].metadata.kind, ChunkKind::FullUnit);
//! assert_eq!(chunks[1].metadata.name, "run");
//! assert_eq!(chunks[1].metadata.start_line, Some(2));
//! assert_eq!(chunks[1].metadata.end_line, Some(4));
//! ```

use std::cell::RefCell;

use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};
use uuid::Uuid;

use crate::models::{Chunk, ChunkKind, ChunkMetadata};

/// Name given to a full-unit chunk when the file declares no type.
pub const UNKNOWN_NAME: &str = "Unknown";

const TYPE_DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

const METHOD_DECLARATION_KINDS: &[&str] = &[
    "method_declaration",
    "constructor_declaration",
    "compact_constructor_declaration",
];

/// Why a file produced no chunks.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Java grammar unavailable: {0}")]
    Grammar(String),
    #[error("parser produced no syntax tree")]
    NoTree,
    #[error("syntax errors and no recoverable declarations")]
    Unrecoverable,
}

thread_local! {
    static JAVA_PARSER: RefCell<Result<Parser, String>> = RefCell::new({
        let mut parser = Parser::new();
        match parser.set_language(tree_sitter_java::language()) {
            Ok(()) => Ok(parser),
            Err(_) => Err("tree-sitter-java language load failed".to_string()),
        }
    });
}

fn parse_java(source: &str) -> Result<Tree, ParseError> {
    JAVA_PARSER.with(|cell| {
        let mut parser = cell
            .try_borrow_mut()
            .map_err(|_| ParseError::Grammar("parser is already in use".to_string()))?;
        let parser = parser
            .as_mut()
            .map_err(|err| ParseError::Grammar(err.clone()))?;
        parser.parse(source, None).ok_or(ParseError::NoTree)
    })
}

/// Chunk a source file, returning an empty list when it cannot be parsed.
///
/// Use [`try_parse_source`] to learn why a file was rejected.
pub fn parse_source(source: &str, file_path: &str, project_id: &str) -> Vec<Chunk> {
    try_parse_source(source, file_path, project_id).unwrap_or_default()
}

/// Chunk a source file, reporting structural parse failure as an error.
///
/// On success the full-unit chunk (if the file is not blank) comes first,
/// followed by method chunks in source order. Every chunk carries
/// `project_id` and `file_path` unchanged.
pub fn try_parse_source(
    source: &str,
    file_path: &str,
    project_id: &str,
) -> Result<Vec<Chunk>, ParseError> {
    let tree = parse_java(source)?;
    let root = tree.root_node();

    let mut type_decls = Vec::new();
    let mut method_decls = Vec::new();
    visit_nodes(root, &mut |node| {
        if TYPE_DECLARATION_KINDS.contains(&node.kind()) {
            type_decls.push(node);
        } else if METHOD_DECLARATION_KINDS.contains(&node.kind()) {
            method_decls.push(node);
        }
    });

    if root.has_error() && type_decls.is_empty() && method_decls.is_empty() {
        return Err(ParseError::Unrecoverable);
    }

    let metadata = |kind, name: &str, lines: Option<(usize, usize)>| ChunkMetadata {
        project_id: project_id.to_string(),
        file_path: file_path.to_string(),
        kind,
        name: name.to_string(),
        start_line: lines.map(|(start, _)| start),
        end_line: lines.map(|(_, end)| end),
    };

    let mut chunks = Vec::with_capacity(method_decls.len() + 1);

    let full_text = source.trim();
    if !full_text.is_empty() {
        let name = type_decls
            .first()
            .and_then(|node| declared_name(*node, source))
            .unwrap_or(UNKNOWN_NAME);
        chunks.push(make_chunk(
            full_text,
            metadata(ChunkKind::FullUnit, name, None),
        ));
    }

    let lines: Vec<&str> = source.lines().collect();
    for node in method_decls {
        let start_line = node.start_position().row + 1;
        let end_line = if node.has_error() {
            resolve_end_by_braces(&lines, start_line)
        } else {
            node.end_position().row + 1
        };
        let end_line = end_line.min(lines.len()).max(start_line);

        let body = slice_lines(&lines, start_line, end_line);
        let body = body.trim();
        if body.is_empty() {
            continue;
        }

        let name = declared_name(node, source).unwrap_or(UNKNOWN_NAME);
        chunks.push(make_chunk(
            body,
            metadata(ChunkKind::Method, name, Some((start_line, end_line))),
        ));
    }

    Ok(chunks)
}

/// Find the end line of a declaration by counting braces.
///
/// Scans from `start_line` (1-based) and returns the first line at which the
/// running `{`/`}` depth falls back to zero or below after an opening brace
/// was seen. A line ending in `;` before any brace (an abstract or interface
/// method) ends the declaration. Unbalanced input ends at the last line, so
/// the result is always `<= lines.len()`.
pub fn resolve_end_by_braces(lines: &[&str], start_line: usize) -> usize {
    let total = lines.len();
    if total == 0 {
        return 0;
    }
    let start = start_line.clamp(1, total);

    let mut depth: i64 = 0;
    let mut opened = false;
    for (offset, line) in lines[start - 1..].iter().enumerate() {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }

        let line_no = start + offset;
        if depth < 0 || (opened && depth == 0) {
            return line_no;
        }
        if !opened && line.trim_end().ends_with(';') {
            return line_no;
        }
    }

    total
}

/// Visit a node and all its descendants in pre-order.
fn visit_nodes<'a, F: FnMut(Node<'a>)>(node: Node<'a>, f: &mut F) {
    f(node);
    if node.child_count() == 0 {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_nodes(child, f);
    }
}

fn declared_name<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    let name = node.child_by_field_name("name")?;
    let text = source.get(name.byte_range())?;
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Join lines `start..=end` (1-based) back together.
fn slice_lines(lines: &[&str], start: usize, end: usize) -> String {
    if start == 0 || start > lines.len() {
        return String::new();
    }
    let end = end.min(lines.len());
    lines[start - 1..end].join("\n")
}

fn make_chunk(text: &str, metadata: ChunkMetadata) -> Chunk {
    Chunk {
        id: Uuid::new_v4().to_string(),
        text: text.to_string(),
        metadata,
    }
}

//! A parser library for scripted-data text files.
//!
//! The format is the hierarchical scripting format used by the simulation
//! engine's content files: braces `{}`, `key = value` properties (also
//! `+=` and `-=`), bare value lists, and nested tagged blocks, typically
//! encoded in `WINDOWS_1252`.
//!
//! Parsing produces a [`Block`] tree; [`Block::serialize`] writes a tree
//! back out in the canonical form (tab indentation, inline "minor" blocks,
//! trailing newline after "major" blocks).

pub mod error;
pub mod tabular;

pub use error::{FileError, ParseError, SerializeError};

use std::fs::File;
use std::io::Read;
use std::path::Path;

use encoding_rs::WINDOWS_1252;
use encoding_rs_io::DecodeReaderBytesBuilder;
use serde::{Deserialize, Serialize};

/// The operator joining a key (or block tag) to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operator {
    /// Sentinel: operator not yet determined. Never serialized.
    #[default]
    None,
    /// `=`
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Subtract,
}

impl Operator {
    /// The textual token for this operator, or `None` for the sentinel.
    pub fn token(self) -> Option<&'static str> {
        match self {
            Operator::None => None,
            Operator::Assign => Some("="),
            Operator::Add => Some("+="),
            Operator::Subtract => Some("-="),
        }
    }
}

/// A `key operator value` entry inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub operator: Operator,
    pub value: String,
}

impl Property {
    pub fn new(key: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Property {
            key: key.into(),
            operator,
            value: value.into(),
        }
    }
}

/// A node in the scripted-data tree.
///
/// A block holds, in declaration order, bare values, `key op value`
/// properties, and nested child blocks. The document root is an anonymous
/// block (empty tag) whose body is the whole file.
///
/// Repeated property keys are legal; every occurrence is kept in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    /// Block tag; empty for the root and for anonymous blocks.
    pub tag: String,
    /// Operator between the tag and the opening brace.
    pub operator: Operator,
    /// Bare value tokens (a block used as a plain list).
    pub values: Vec<String>,
    /// Ordered `key op value` properties.
    pub properties: Vec<Property>,
    /// Nested blocks.
    pub children: Vec<Block>,
    /// Presentation only: minor blocks print inline on one line.
    pub minor: bool,
}

impl Block {
    /// Creates an empty anonymous block.
    pub fn new() -> Block {
        Block::default()
    }

    /// Creates an empty tagged block.
    pub fn with_tag(tag: impl Into<String>, operator: Operator) -> Block {
        Block {
            tag: tag.into(),
            operator,
            ..Block::default()
        }
    }

    /// Appends a property (builder style, for emitting data).
    pub fn add_property(
        &mut self,
        key: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) {
        self.properties.push(Property::new(key, operator, value));
    }

    /// Appends a bare value.
    pub fn add_value(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    /// Appends a child block.
    pub fn add_child(&mut self, child: Block) {
        self.children.push(child);
    }

    /// Last value written for `key`, if any.
    ///
    /// Later occurrences of a repeated key overwrite earlier ones, matching
    /// the engine's general property-parsing policy.
    pub fn property_value(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .rev()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    /// All values written for `key`, in declaration order.
    pub fn property_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.properties
            .iter()
            .filter(move |p| p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Last value for `key` parsed as a `yes`/`no` boolean.
    pub fn property_bool(&self, key: &str) -> Option<bool> {
        match self.property_value(key)? {
            "yes" => Some(true),
            "no" => Some(false),
            _ => None,
        }
    }

    /// Last value for `key` parsed as an integer.
    pub fn property_int(&self, key: &str) -> Option<i64> {
        self.property_value(key)?.parse().ok()
    }

    /// First child block with the given tag.
    pub fn child(&self, tag: &str) -> Option<&Block> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All child blocks with the given tag, in declaration order.
    pub fn children_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Block> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Counts the total number of blocks in this subtree (inclusive).
    pub fn block_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.block_count()).sum::<usize>()
    }

    /// Serializes this block as a document body (no surrounding braces).
    ///
    /// Fails if any tagged block or property still carries the `None`
    /// sentinel operator.
    pub fn serialize(&self) -> Result<String, SerializeError> {
        let mut out = String::new();
        write_body(self, &mut out, 0)?;
        Ok(out)
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn write_token(out: &mut String, value: &str) -> Result<(), SerializeError> {
    // No escape sequences exist, so an embedded quote is unrepresentable.
    if value.contains('"') {
        return Err(SerializeError::UnquotableToken {
            token: value.to_string(),
        });
    }
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '=' | '#'));
    if needs_quotes {
        out.push('"');
        out.push_str(value);
        out.push('"');
    } else {
        out.push_str(value);
    }
    Ok(())
}

fn write_property(p: &Property, out: &mut String) -> Result<(), SerializeError> {
    let op = p.operator.token().ok_or(SerializeError::NoneOperator {
        tag: p.key.clone(),
    })?;
    write_token(out, &p.key)?;
    out.push(' ');
    out.push_str(op);
    out.push(' ');
    write_token(out, &p.value)?;
    Ok(())
}

fn write_header(block: &Block, out: &mut String) -> Result<(), SerializeError> {
    if !block.tag.is_empty() {
        let op = block.operator.token().ok_or(SerializeError::NoneOperator {
            tag: block.tag.clone(),
        })?;
        write_token(out, &block.tag)?;
        out.push(' ');
        out.push_str(op);
        out.push(' ');
    }
    Ok(())
}

fn write_body(block: &Block, out: &mut String, depth: usize) -> Result<(), SerializeError> {
    for value in &block.values {
        indent(out, depth);
        write_token(out, value)?;
        out.push('\n');
    }
    for property in &block.properties {
        indent(out, depth);
        write_property(property, out)?;
        out.push('\n');
    }
    for child in &block.children {
        write_block(child, out, depth)?;
    }
    Ok(())
}

fn write_block(block: &Block, out: &mut String, depth: usize) -> Result<(), SerializeError> {
    indent(out, depth);
    write_header(block, out)?;
    if block.minor && block.children.is_empty() {
        // Minor blocks print inline: leading space before the brace, no
        // trailing newline of their own.
        out.push('{');
        for value in &block.values {
            out.push(' ');
            write_token(out, value)?;
        }
        for property in &block.properties {
            out.push(' ');
            write_property(property, out)?;
        }
        out.push_str(" }\n");
    } else {
        out.push_str("{\n");
        write_body(block, out, depth + 1)?;
        indent(out, depth);
        out.push_str("}\n");
    }
    Ok(())
}

/// A token scanned from scripted text.
#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    /// A bare word (identifier, number, yes/no).
    Word(String),
    /// A quoted string (quotes stripped).
    Quoted(String),
    /// `{`
    Open,
    /// `}`
    Close,
    /// `=`, `+=`, or `-=`.
    Op(Operator),
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    line: usize,
}

fn is_structural(c: char) -> bool {
    matches!(c, '{' | '}' | '=' | '#' | '"')
}

fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => {
                line += 1;
                i += 1;
            }
            c if c.is_whitespace() => {
                i += 1;
            }
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '{' => {
                tokens.push(Token {
                    kind: TokenKind::Open,
                    line,
                });
                i += 1;
            }
            '}' => {
                tokens.push(Token {
                    kind: TokenKind::Close,
                    line,
                });
                i += 1;
            }
            '=' => {
                tokens.push(Token {
                    kind: TokenKind::Op(Operator::Assign),
                    line,
                });
                i += 1;
            }
            '+' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token {
                        kind: TokenKind::Op(Operator::Add),
                        line,
                    });
                    i += 2;
                } else {
                    return Err(ParseError::BadOperator {
                        line,
                        found: "+".to_string(),
                    });
                }
            }
            '"' => {
                let start_line = line;
                i += 1;
                let mut s = String::new();
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(ParseError::UnterminatedString { line: start_line });
                        }
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some(&nc) => {
                            if nc == '\n' {
                                line += 1;
                            }
                            s.push(nc);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Quoted(s),
                    line: start_line,
                });
            }
            _ => {
                // `-=` is an operator; any other `-` starts a bare word
                // (negative numbers).
                if c == '-' && chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token {
                        kind: TokenKind::Op(Operator::Subtract),
                        line,
                    });
                    i += 2;
                    continue;
                }
                let mut s = String::new();
                while i < chars.len() {
                    let nc = chars[i];
                    if nc.is_whitespace() || is_structural(nc) {
                        break;
                    }
                    // Stop before a `+=` / `-=` glued to the word.
                    if (nc == '+' || nc == '-')
                        && !s.is_empty()
                        && chars.get(i + 1) == Some(&'=')
                    {
                        break;
                    }
                    s.push(nc);
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Word(s),
                    line,
                });
            }
        }
    }
    Ok(tokens)
}

/// Parses scripted text into an anonymous root [`Block`].
pub fn parse_text(text: &str) -> Result<Block, ParseError> {
    let tokens = tokenize(text)?;
    let mut root = Block::new();
    let mut pos = 0usize;
    parse_body(&tokens, &mut pos, &mut root, None)?;
    Ok(root)
}

/// Opens `path`, decodes it as WINDOWS_1252, and parses it.
pub fn parse_file(path: &Path) -> Result<Block, FileError> {
    if !path.exists() {
        return Err(FileError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| FileError::Io(path.to_path_buf(), e))?;
    let mut reader = DecodeReaderBytesBuilder::new()
        .encoding(Some(WINDOWS_1252))
        .build(file);
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .map_err(|e| FileError::Io(path.to_path_buf(), e))?;
    parse_text(&contents).map_err(|e| FileError::Parse(path.to_path_buf(), e))
}

/// Parses one block body into `block`.
///
/// `open_line` is `Some(line of the opening brace)` for nested blocks and
/// `None` at document level; it drives the unbalanced-brace errors.
fn parse_body(
    tokens: &[Token],
    pos: &mut usize,
    block: &mut Block,
    open_line: Option<usize>,
) -> Result<(), ParseError> {
    loop {
        let tok = match tokens.get(*pos) {
            None => {
                if let Some(line) = open_line {
                    return Err(ParseError::UnclosedBlock { line });
                }
                break;
            }
            Some(tok) => tok,
        };
        match &tok.kind {
            TokenKind::Close => {
                if open_line.is_none() {
                    return Err(ParseError::UnexpectedClose { line: tok.line });
                }
                *pos += 1;
                break;
            }
            TokenKind::Open => {
                // Anonymous block: value list or unnamed nested scope.
                let open = tok.line;
                *pos += 1;
                let mut child = Block::new();
                parse_body(tokens, pos, &mut child, Some(open))?;
                block.children.push(child);
            }
            TokenKind::Op(_) => {
                return Err(ParseError::UnexpectedToken {
                    line: tok.line,
                    token: "operator".to_string(),
                });
            }
            TokenKind::Word(w) | TokenKind::Quoted(w) => {
                match tokens.get(*pos + 1).map(|t| &t.kind) {
                    Some(TokenKind::Op(op)) => {
                        // Lookahead past the operator decides between a
                        // property and a tagged block.
                        match tokens.get(*pos + 2).map(|t| &t.kind) {
                            Some(TokenKind::Open) => {
                                let open = tokens[*pos + 2].line;
                                let mut child = Block::with_tag(w.clone(), *op);
                                *pos += 3;
                                parse_body(tokens, pos, &mut child, Some(open))?;
                                block.children.push(child);
                            }
                            Some(TokenKind::Word(v)) | Some(TokenKind::Quoted(v)) => {
                                block.properties.push(Property::new(w.clone(), *op, v.clone()));
                                *pos += 3;
                            }
                            _ => {
                                return Err(ParseError::MissingValue {
                                    line: tok.line,
                                    key: w.clone(),
                                });
                            }
                        }
                    }
                    Some(TokenKind::Open) => {
                        // `tag { ... }` with the operator elided.
                        let open = tokens[*pos + 1].line;
                        let mut child = Block::with_tag(w.clone(), Operator::Assign);
                        *pos += 2;
                        parse_body(tokens, pos, &mut child, Some(open))?;
                        block.children.push(child);
                    }
                    _ => {
                        // Not followed by `op value`: plain list entry.
                        block.values.push(w.clone());
                        *pos += 1;
                    }
                }
            }
        }
    }
    // Pure value lists read naturally inline.
    block.minor =
        open_line.is_some() && block.properties.is_empty() && block.children.is_empty();
    Ok(())
}

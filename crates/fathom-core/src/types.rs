use serde::{Deserialize, Serialize};

use crate::symbol::SymbolId;

/// A zero-based row/column location in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: u32,
    pub column: u32,
}

impl Position {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// A span of source text. Byte offsets are carried alongside the
/// row/column positions so node text can be sliced without a line index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
    pub start_byte: u32,
    pub end_byte: u32,
}

impl Range {
    pub fn new(start: Position, end: Position, start_byte: u32, end_byte: u32) -> Self {
        Self {
            start,
            end,
            start_byte,
            end_byte,
        }
    }

    /// True when `other` lies entirely within this range.
    pub fn contains(&self, other: &Range) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    /// True when the position lies within this range (end-exclusive).
    pub fn contains_position(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    pub fn byte_size(&self) -> u32 {
        self.end_byte.saturating_sub(self.start_byte)
    }

    /// Slice the text of this range out of the file source.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source
            .get(self.start_byte as usize..self.end_byte as usize)
            .unwrap_or("")
    }
}

/// What kind of symbol a definition binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Generator,
    Class,
    Variable,
    Const,
    Let,
    Constant,
    Import,
    Constructor,
    Struct,
    Enum,
    Interface,
    Trait,
    Module,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Generator => "generator",
            SymbolKind::Class => "class",
            SymbolKind::Variable => "variable",
            SymbolKind::Const => "const",
            SymbolKind::Let => "let",
            SymbolKind::Constant => "constant",
            SymbolKind::Import => "import",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Interface => "interface",
            SymbolKind::Trait => "trait",
            SymbolKind::Module => "module",
        }
    }

    /// Kinds that participate in the call graph as callers.
    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            SymbolKind::Function
                | SymbolKind::Method
                | SymbolKind::Generator
                | SymbolKind::Constructor
        )
    }

    /// Kinds that can carry methods and participate in inheritance.
    pub fn is_class_like(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Struct
                | SymbolKind::Enum
                | SymbolKind::Interface
                | SymbolKind::Trait
        )
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "function" => Ok(SymbolKind::Function),
            "method" => Ok(SymbolKind::Method),
            "generator" => Ok(SymbolKind::Generator),
            "class" => Ok(SymbolKind::Class),
            "variable" => Ok(SymbolKind::Variable),
            "const" => Ok(SymbolKind::Const),
            "let" => Ok(SymbolKind::Let),
            "constant" => Ok(SymbolKind::Constant),
            "import" => Ok(SymbolKind::Import),
            "constructor" => Ok(SymbolKind::Constructor),
            "struct" => Ok(SymbolKind::Struct),
            "enum" => Ok(SymbolKind::Enum),
            "interface" => Ok(SymbolKind::Interface),
            "trait" => Ok(SymbolKind::Trait),
            "module" => Ok(SymbolKind::Module),
            other => Err(format!("unknown symbol kind: {other}")),
        }
    }
}

/// Optional detail attached to a definition by the per-language
/// context extractors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefMetadata {
    pub line_count: u32,
    pub parameter_names: Vec<String>,
    pub is_async: bool,
    pub is_test: bool,
    pub is_private: bool,
    pub parent_class: Option<String>,
    pub decorators: Vec<String>,
}

/// A definition projected out of a scope graph as a flat value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Def {
    pub symbol_id: SymbolId,
    pub name: String,
    pub symbol_kind: SymbolKind,
    pub file_path: String,
    pub range: Range,
    pub enclosing_range: Option<Range>,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub metadata: Option<DefMetadata>,
    pub is_exported: bool,
}

/// An import paired with the exported definition it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportInfo {
    /// The name the importing file binds locally.
    pub local_name: String,
    /// Location of the import binding in the importing file.
    pub import_range: Range,
    /// The importing file.
    pub file_path: String,
    /// The exported definition in the source file.
    pub definition: Def,
}

/// A single resolved call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub caller_def: Def,
    pub called_def: Def,
    pub call_location: Position,
    pub is_method_call: bool,
}

/// Classification of a call-graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Direct,
    Method,
    Constructor,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Direct => "direct",
            CallType::Method => "method",
            CallType::Constructor => "constructor",
        }
    }
}

impl std::fmt::Display for CallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outgoing call recorded on a call-graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRef {
    pub symbol: SymbolId,
    pub range: Range,
    pub kind: CallType,
}

/// A node in the projected call graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphNode {
    pub symbol: SymbolId,
    pub definition: Def,
    pub is_exported: bool,
    pub calls: Vec<CallRef>,
}

/// A caller→callee edge in the projected call graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallGraphEdge {
    pub from: SymbolId,
    pub to: SymbolId,
    pub call_type: CallType,
}

/// The project-wide call graph, projected on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallGraph {
    pub nodes: std::collections::BTreeMap<SymbolId, CallGraphNode>,
    pub edges: Vec<CallGraphEdge>,
    /// Nodes with no incoming edge in the current projection.
    pub top_level_nodes: Vec<SymbolId>,
}

//! Source cache: per-file text, parsed CST, resolved language, and content
//! hash. Graphs are rebuilt from the CST on every edit; only the CST itself
//! is patched incrementally.

use tree_sitter::{InputEdit, Parser, Tree};

use fathom_core::hash::content_hash;
use fathom_core::types::Position;

use crate::cst::{byte_offset, point_of, position_at};
use crate::registry::LanguageConfig;

/// Parser buffer sizing. The buffer starts at `initial_buffer_size` and
/// doubles on each size-triggered retry until `max_file_size`.
#[derive(Debug, Clone, Copy)]
pub struct ParseLimits {
    pub initial_buffer_size: usize,
    pub max_file_size: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            initial_buffer_size: 512 * 1024,
            max_file_size: 4 * 1024 * 1024,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{path}: file too large ({size} bytes, limit {limit})")]
    FileTooLarge {
        path: String,
        size: usize,
        limit: usize,
    },
    #[error("language error: {0}")]
    Language(String),
    #[error("unknown file: {0}")]
    UnknownFile(String),
}

/// The cached state of one source file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub source: String,
    /// `None` for unknown languages, oversized files, and parser failures;
    /// the source stays cached either way.
    pub tree: Option<Tree>,
    /// Registered language name, `None` when the extension is unknown.
    pub language: Option<&'static str>,
    pub content_hash: u64,
}

impl ParsedFile {
    /// A file cached without parsing (unknown extension).
    pub fn unparsed(source: String) -> Self {
        let content_hash = content_hash(&source);
        Self {
            source,
            tree: None,
            language: None,
            content_hash,
        }
    }
}

/// A stateful tree-sitter parser. One per worker; parse calls on a single
/// instance must not be re-entered. The input buffer persists across calls
/// and only ever grows.
pub struct FileParser {
    parser: Parser,
    buffer_size: usize,
}

impl FileParser {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            buffer_size: 0,
        }
    }

    /// Current input-buffer capacity (0 until the first parse).
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Parse `source` under `config`, reusing `old_tree` when this is an
    /// incremental reparse. An input larger than the buffer doubles the
    /// buffer and retries, up to `max_file_size`; past that the file is
    /// `FileTooLarge`. Returns `Ok(None)` when the parser gives up on the
    /// input; the caller caches the file without a graph.
    pub fn parse(
        &mut self,
        config: &LanguageConfig,
        path: &str,
        source: &str,
        old_tree: Option<&Tree>,
        limits: &ParseLimits,
    ) -> Result<Option<Tree>, ParseError> {
        if self.buffer_size < limits.initial_buffer_size {
            self.buffer_size = limits.initial_buffer_size;
        }
        while source.len() > self.buffer_size {
            if self.buffer_size >= limits.max_file_size {
                return Err(ParseError::FileTooLarge {
                    path: path.to_string(),
                    size: source.len(),
                    limit: limits.max_file_size,
                });
            }
            self.buffer_size = self
                .buffer_size
                .saturating_mul(2)
                .max(1)
                .min(limits.max_file_size);
        }
        self.parser
            .set_language(&config.language)
            .map_err(|e| ParseError::Language(e.to_string()))?;
        Ok(self.parser.parse(source, old_tree))
    }

    /// Parse a full file into a [`ParsedFile`].
    pub fn parse_file(
        &mut self,
        config: &LanguageConfig,
        path: &str,
        source: String,
        limits: &ParseLimits,
    ) -> Result<ParsedFile, ParseError> {
        let tree = self.parse(config, path, &source, None, limits)?;
        let content_hash = content_hash(&source);
        Ok(ParsedFile {
            source,
            tree,
            language: Some(config.name),
            content_hash,
        })
    }
}

impl Default for FileParser {
    fn default() -> Self {
        Self::new()
    }
}

/// The result of splicing an edit into a cached file.
pub struct AppliedEdit {
    pub source: String,
    /// The old tree with the edit applied, ready to seed an incremental
    /// reparse. `None` when the file had no tree.
    pub edited_tree: Option<Tree>,
}

/// Apply `update_range(old_start, old_end, new_text)` to cached text and
/// CST: splice the string, then feed tree-sitter the byte/position deltas.
pub fn apply_edit(
    old_source: &str,
    tree: Option<&Tree>,
    old_start: Position,
    old_end: Position,
    new_text: &str,
) -> AppliedEdit {
    let start_byte = byte_offset(old_source, old_start);
    let old_end_byte = byte_offset(old_source, old_end).max(start_byte);

    let mut source =
        String::with_capacity(old_source.len() - (old_end_byte - start_byte) + new_text.len());
    source.push_str(&old_source[..start_byte]);
    source.push_str(new_text);
    source.push_str(&old_source[old_end_byte..]);

    let new_end_byte = start_byte + new_text.len();
    let new_end = position_at(&source, new_end_byte);

    let edited_tree = tree.map(|tree| {
        let mut tree = tree.clone();
        tree.edit(&InputEdit {
            start_byte,
            old_end_byte,
            new_end_byte,
            start_position: point_of(old_start),
            old_end_position: point_of(old_end),
            new_end_position: point_of(new_end),
        });
        tree
    });

    AppliedEdit { source, edited_tree }
}

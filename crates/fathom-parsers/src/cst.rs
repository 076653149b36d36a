//! Small conversions between tree-sitter coordinates and the core data model.

use fathom_core::types::{Position, Range};
use tree_sitter::{Node, Point};

pub fn position_of(point: Point) -> Position {
    Position::new(point.row as u32, point.column as u32)
}

pub fn point_of(pos: Position) -> Point {
    Point::new(pos.row as usize, pos.column as usize)
}

pub fn node_range(node: &Node) -> Range {
    Range::new(
        position_of(node.start_position()),
        position_of(node.end_position()),
        node.start_byte() as u32,
        node.end_byte() as u32,
    )
}

pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Byte offset of a row/column position within `source`.
pub fn byte_offset(source: &str, pos: Position) -> usize {
    let mut row = 0u32;
    let mut line_start = 0usize;
    if pos.row > 0 {
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                row += 1;
                line_start = i + 1;
                if row == pos.row {
                    break;
                }
            }
        }
        if row < pos.row {
            return source.len();
        }
    }
    (line_start + pos.column as usize).min(source.len())
}

/// Row/column position of a byte offset within `source`.
pub fn position_at(source: &str, offset: usize) -> Position {
    let offset = offset.min(source.len());
    let mut row = 0u32;
    let mut line_start = 0usize;
    for (i, b) in source.bytes().enumerate() {
        if i >= offset {
            break;
        }
        if b == b'\n' {
            row += 1;
            line_start = i + 1;
        }
    }
    Position::new(row, (offset - line_start) as u32)
}

/// The smallest named node spanning the given byte range.
pub fn node_at_range<'t>(root: Node<'t>, range: Range) -> Option<Node<'t>> {
    root.named_descendant_for_byte_range(range.start_byte as usize, range.end_byte as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_offset_round_trip() {
        let source = "abc\ndef\nghi\n";
        let pos = Position::new(1, 2);
        let off = byte_offset(source, pos);
        assert_eq!(off, 6);
        assert_eq!(position_at(source, off), pos);
    }

    #[test]
    fn test_byte_offset_clamps_past_end() {
        let source = "ab\n";
        assert_eq!(byte_offset(source, Position::new(9, 0)), source.len());
    }

    #[test]
    fn test_position_at_start() {
        assert_eq!(position_at("hello", 0), Position::new(0, 0));
    }
}

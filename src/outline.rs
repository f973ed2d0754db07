//! Outline reconstruction from a flat, ordered stream of heading and column
//! occurrences.
//!
//! A single left-to-right pass keeps the chain of open ancestors on a stack of
//! `(level, node)` pairs. An occurrence first closes every open node whose
//! level is not lower than its own, then becomes the newest child of whatever
//! remains on top (or a root when the stack is empty). A closed headline ends
//! just before the occurrence that closed it; whatever is still open when the
//! stream runs out ends at the end of the document. Columns carry their own
//! extent from the compiler and are never re-ended.

use serde::Serialize;

use crate::compiler::{SymbolKind, SymbolOccurrence};
use crate::text::LineIndex;
use crate::types::{Position, Range};

/// Discriminates outline nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A column, whose end comes from the compiler.
    Column,
    /// A heading, whose end is computed from what follows it.
    Headline,
}

impl NodeKind {
    /// Detail string shown next to the node name.
    pub const fn detail(self) -> &'static str {
        return match self {
            Self::Column => "column",
            Self::Headline => "headline",
        };
    }
}

/// One entry of the outline tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    /// Nested entries, in document order.
    pub children: Vec<OutlineNode>,
    /// Headline or column.
    #[serde(rename = "detail")]
    pub kind: NodeKind,
    /// Nesting level the node was placed with.
    #[serde(skip)]
    pub level: u32,
    /// Display label.
    pub name: String,
    /// Extent of the node, covering all of its children.
    pub range: Range,
}

/// Arena slot used while the tree is being assembled.
struct Slot {
    /// Indices of child slots, in document order.
    children: Vec<usize>,
    /// The node, minus its children.
    node: OutlineNode,
}

/// Flat arena of nodes plus the chain of open ancestors.
struct Builder<'a> {
    /// Text geometry for "position before" and the document end.
    index: &'a LineIndex,
    /// Indices of top-level slots.
    roots: Vec<usize>,
    /// Every node created so far.
    slots: Vec<Slot>,
    /// Open ancestors as `(level, slot)`, innermost last. Empty is the virtual root.
    stack: Vec<(u32, usize)>,
}

impl<'a> Builder<'a> {
    /// Attach a fresh node to the innermost open ancestor and open it.
    fn attach(&mut self, level: u32, node: OutlineNode) {
        let idx = self.slots.len();
        self.slots.push(Slot { children: Vec::new(), node });
        match self.stack.last() {
            Some(&(_, parent)) => {
                if let Some(slot) = self.slots.get_mut(parent) {
                    slot.children.push(idx);
                }
            },
            None => self.roots.push(idx),
        }
        self.stack.push((level, idx));
    }

    /// End every node still open at the end of the document.
    fn close_all(&mut self) {
        let end = self.index.end();
        while let Some((_, idx)) = self.stack.pop() {
            self.set_end(idx, end);
        }
    }

    /// Close open nodes whose level is not lower than `level`. Each closed
    /// node ends just before `next_start`.
    fn close_to(&mut self, level: u32, next_start: Position) {
        let end = self.index.position_before(next_start);
        while let Some(&(open_level, idx)) = self.stack.last() {
            if open_level < level {
                break;
            }
            self.stack.pop();
            self.set_end(idx, end);
        }
    }

    /// Assemble the nested forest from the arena.
    fn finish(mut self) -> Vec<OutlineNode> {
        self.close_all();
        let mut slots: Vec<Option<Slot>> = self.slots.into_iter().map(Some).collect();
        return self
            .roots
            .iter()
            .filter_map(|&idx| return take_subtree(&mut slots, idx))
            .collect();
    }

    /// Create an empty builder over `index`.
    const fn new(index: &'a LineIndex) -> Self {
        return Self {
            index,
            roots: Vec::new(),
            slots: Vec::new(),
            stack: Vec::new(),
        };
    }

    /// Feed one occurrence. Occurrences without a level or a span are dropped.
    fn push(&mut self, occurrence: &SymbolOccurrence) {
        let (Some(level), Some(span)) = (occurrence.nesting_level(), occurrence.span()) else {
            return;
        };
        let mut range = Range::empty_at(span.start);
        let kind = if occurrence.kind == SymbolKind::Column {
            // The reported end overlaps the next element by one character.
            range.end = self.index.position_before(span.end);
            NodeKind::Column
        } else {
            NodeKind::Headline
        };

        self.close_to(level, range.start);
        self.attach(level, OutlineNode {
            children: Vec::new(),
            kind,
            level,
            name: occurrence.label(),
            range,
        });
    }

    /// Set the end of a headline slot. Columns keep their own end.
    fn set_end(&mut self, idx: usize, end: Position) {
        let Some(slot) = self.slots.get_mut(idx) else {
            return;
        };
        if slot.node.kind == NodeKind::Headline {
            slot.node.range.end = end;
        }
    }
}

/// Build the outline forest for one chapter.
///
/// `occurrences` must already be limited to the chapter, non-inline, and in
/// document order; see [`crate::compiler::CompileOutput::outline_occurrences`].
/// Occurrences without a level or a location are skipped. Never fails.
pub fn build(occurrences: &[SymbolOccurrence], index: &LineIndex) -> Vec<OutlineNode> {
    let mut builder = Builder::new(index);
    for occurrence in occurrences {
        builder.push(occurrence);
    }
    return builder.finish();
}

/// Count nodes in a forest, all depths included.
pub fn count(nodes: &[OutlineNode]) -> usize {
    return nodes
        .iter()
        .map(|n| return count(&n.children).saturating_add(1))
        .fold(0_usize, usize::saturating_add);
}

/// Move a slot and its descendants out of the arena as a nested node.
fn take_subtree(slots: &mut [Option<Slot>], idx: usize) -> Option<OutlineNode> {
    let Slot { children, mut node } = slots.get_mut(idx)?.take()?;
    node.children = children
        .into_iter()
        .filter_map(|child| return take_subtree(slots, child))
        .collect();
    return Some(node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Point};

    fn occ(kind: SymbolKind, level: Option<u32>, caption: &str, start: (u32, u32), end: (u32, u32)) -> SymbolOccurrence {
        // Test coordinates are 0-based; the compiler reports 1-based.
        return SymbolOccurrence {
            caption: caption.to_string(),
            file: "ch01.re".to_string(),
            id: None,
            inline: false,
            kind,
            level,
            location: Some(Location {
                end: Point { column: end.1 + 1, line: end.0 + 1 },
                start: Point { column: start.1 + 1, line: start.0 + 1 },
            }),
        };
    }

    fn hd(level: u32, caption: &str, line: u32) -> SymbolOccurrence {
        return occ(SymbolKind::Headline, Some(level), caption, (line, 0), (line, 12));
    }

    fn column(level: u32, caption: &str, start: u32, end: (u32, u32)) -> SymbolOccurrence {
        return occ(SymbolKind::Column, Some(level), caption, (start, 0), end);
    }

    /// Twenty-one lines; line `n` is `n + 10` characters long.
    fn document() -> LineIndex {
        let text = (0..=20_usize)
            .map(|n| "x".repeat(n + 10))
            .collect::<Vec<_>>()
            .join("\n");
        return LineIndex::new(&text);
    }

    fn names(nodes: &[OutlineNode]) -> Vec<&str> {
        return nodes.iter().map(|n| n.name.as_str()).collect();
    }

    fn assert_well_formed(nodes: &[OutlineNode]) {
        for pair in nodes.windows(2) {
            assert!(pair[0].range.end < pair[1].range.start, "siblings overlap: {pair:?}");
        }
        for node in nodes {
            for child in &node.children {
                assert!(node.range.contains_range(&child.range), "{node:?} does not contain {child:?}");
            }
            assert_well_formed(&node.children);
        }
    }

    #[test]
    fn empty_input_gives_empty_forest() {
        assert!(build(&[], &document()).is_empty());
    }

    #[test]
    fn only_unleveled_occurrences_gives_empty_forest() {
        let occs = vec![
            occ(SymbolKind::Other, None, "fn", (1, 0), (1, 4)),
            occ(SymbolKind::Headline, None, "broken", (2, 0), (2, 4)),
        ];
        assert!(build(&occs, &document()).is_empty());
    }

    #[test]
    fn nested_headings_scenario() {
        let index = document();
        let occs = vec![hd(1, "Intro", 0), hd(2, "Background", 5), hd(1, "Methods", 10)];
        let forest = build(&occs, &index);

        assert_eq!(names(&forest), vec!["Intro", "Methods"]);
        let intro = &forest[0];
        assert_eq!(intro.range.start, Position::new(0, 0));
        assert_eq!(intro.range.end, Position::new(9, 19));
        assert_eq!(names(&intro.children), vec!["Background"]);
        assert_eq!(intro.children[0].range.start, Position::new(5, 0));
        assert_eq!(intro.children[0].range.end, Position::new(9, 19));
        assert_eq!(forest[1].range.end, index.end());
        assert_eq!(index.end(), Position::new(20, 30));
        assert_well_formed(&forest);
    }

    #[test]
    fn same_level_headings_are_siblings() {
        let occs = vec![hd(2, "A", 1), hd(2, "B", 4)];
        let forest = build(&occs, &document());
        assert_eq!(names(&forest), vec!["A", "B"]);
        assert!(forest[0].children.is_empty());
        assert_eq!(forest[0].range.end, Position::new(3, 13));
    }

    #[test]
    fn mid_line_start_ends_previous_one_character_earlier() {
        let occs = vec![
            occ(SymbolKind::Headline, Some(1), "A", (0, 0), (0, 3)),
            occ(SymbolKind::Headline, Some(1), "B", (2, 4), (2, 8)),
        ];
        let forest = build(&occs, &document());
        assert_eq!(forest[0].range.end, Position::new(2, 3));
    }

    #[test]
    fn parent_is_nearest_preceding_lower_level() {
        let occs = vec![
            hd(1, "a", 0),
            hd(3, "b", 1),
            hd(2, "c", 2),
            hd(3, "d", 3),
            hd(2, "e", 4),
            hd(1, "f", 5),
            hd(2, "g", 6),
        ];
        let forest = build(&occs, &document());
        assert_eq!(names(&forest), vec!["a", "f"]);
        assert_eq!(names(&forest[0].children), vec!["b", "c", "e"]);
        assert_eq!(names(&forest[0].children[1].children), vec!["d"]);
        assert_eq!(names(&forest[1].children), vec!["g"]);
        assert_well_formed(&forest);
    }

    fn record_parents(nodes: &[OutlineNode], parent: Option<usize>, out: &mut Vec<(usize, Option<usize>)>) {
        for node in nodes {
            let idx: usize = node.name.parse().unwrap();
            out.push((idx, parent));
            record_parents(&node.children, Some(idx), out);
        }
    }

    #[test]
    fn every_short_level_sequence_nests_under_nearest_lower_level() {
        let index = document();
        for len in 1..=5_u32 {
            for code in 0..3_u32.pow(len) {
                let levels: Vec<u32> = (0..len).map(|i| (code / 3_u32.pow(i)) % 3 + 1).collect();
                let occs: Vec<SymbolOccurrence> = levels
                    .iter()
                    .enumerate()
                    .map(|(i, &level)| hd(level, &i.to_string(), u32::try_from(i).unwrap() * 3))
                    .collect();
                let forest = build(&occs, &index);
                assert_well_formed(&forest);

                let mut parents = Vec::new();
                record_parents(&forest, None, &mut parents);
                parents.sort_unstable();
                assert_eq!(parents.len(), levels.len(), "{levels:?}");
                for (i, parent) in parents {
                    let expected = (0..i).rev().find(|&j| levels[j] < levels[i]);
                    assert_eq!(parent, expected, "occurrence {i} of {levels:?}");
                }
            }
        }
    }

    #[test]
    fn unlocated_occurrence_is_dropped() {
        let mut lost = hd(2, "Lost", 3);
        lost.location = None;
        let forest = build(&[hd(1, "A", 0), lost, hd(2, "B", 5)], &document());
        assert_eq!(names(&forest[0].children), vec!["B"]);
    }

    #[test]
    fn column_end_is_shortened_by_one_character() {
        let occs = vec![hd(1, "Chapter", 0), column(2, "Aside", 2, (6, 5))];
        let forest = build(&occs, &document());
        let aside = &forest[0].children[0];
        assert_eq!(aside.kind, NodeKind::Column);
        assert_eq!(aside.name, "[column] Aside");
        assert_eq!(aside.range.end, Position::new(6, 4));
    }

    #[test]
    fn column_ending_at_line_start_ends_on_previous_line() {
        let occs = vec![column(2, "Aside", 2, (6, 0))];
        let forest = build(&occs, &document());
        assert_eq!(forest[0].range.end, Position::new(5, 15));
    }

    #[test]
    fn column_end_survives_being_closed() {
        let occs = vec![
            hd(1, "Chapter", 0),
            column(2, "Aside", 2, (6, 0)),
            hd(2, "Next", 8),
        ];
        let forest = build(&occs, &document());
        let children = &forest[0].children;
        assert_eq!(children[0].range.end, Position::new(5, 15));
        assert_eq!(children[1].range.end, Position::new(20, 30));
        assert_eq!(forest[0].range.end, Position::new(20, 30));
        assert_well_formed(&forest);
    }

    #[test]
    fn trailing_column_keeps_end_while_ancestors_close() {
        let index = document();
        let occs = vec![hd(1, "Chapter", 0), hd(2, "Section", 2), column(3, "Aside", 4, (9, 0))];
        let forest = build(&occs, &index);
        let section = &forest[0].children[0];
        assert_eq!(section.children[0].range.end, Position::new(8, 18));
        assert_eq!(section.range.end, index.end());
        assert_eq!(forest[0].range.end, index.end());
    }

    #[test]
    fn column_at_lower_level_pops_like_a_heading() {
        let occs = vec![hd(1, "A", 0), hd(3, "Deep", 2), column(2, "Aside", 4, (6, 3))];
        let forest = build(&occs, &document());
        assert_eq!(names(&forest[0].children), vec!["Deep", "[column] Aside"]);
        assert_eq!(forest[0].children[0].range.end, Position::new(3, 13));
    }

    #[test]
    fn dropped_trailing_occurrence_still_closes_the_chain() {
        let index = document();
        let occs = vec![hd(1, "A", 0), hd(2, "B", 3), occ(SymbolKind::Other, None, "x", (7, 0), (7, 2))];
        let forest = build(&occs, &index);
        assert_eq!(forest[0].range.end, index.end());
        assert_eq!(forest[0].children[0].range.end, index.end());
    }

    #[test]
    fn building_twice_is_identical() {
        let index = document();
        let occs = vec![hd(1, "A", 0), column(2, "C", 1, (3, 2)), hd(2, "B", 5), hd(1, "D", 9)];
        assert_eq!(build(&occs, &index), build(&occs, &index));
    }

    #[test]
    fn count_includes_all_depths() {
        let occs = vec![hd(1, "A", 0), hd(2, "B", 2), hd(3, "C", 3), hd(1, "D", 9)];
        assert_eq!(count(&build(&occs, &document())), 4);
    }

    #[test]
    fn serializes_detail_and_hides_level() {
        let forest = build(&[hd(1, "A", 0)], &document());
        let json = serde_json::to_value(&forest).unwrap();
        assert_eq!(json[0]["detail"], "headline");
        assert!(json[0].get("level").is_none());
    }
}

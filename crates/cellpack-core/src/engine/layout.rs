use crate::core::models::segment::{Element, Segment};
use std::collections::BTreeMap;
use std::ops::Range;

/// A contiguous id block: the elements of one table belonging to one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Block {
    pub element: Element,
    pub segment: Segment,
}

impl Block {
    pub const fn new(element: Element, segment: Segment) -> Self {
        Self { element, segment }
    }
}

/// Hands out consecutive id ranges per element table, in allocation order.
#[derive(Debug, Clone, Default)]
pub struct IndexAllocator {
    next: BTreeMap<Element, usize>,
    ranges: BTreeMap<Block, Range<usize>>,
}

impl IndexAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `count` ids for `block` right after the previous block of the
    /// same element table. Allocating a block twice extends it only if it is
    /// still the last block of its table; otherwise the new range replaces
    /// the recorded one.
    pub fn allocate(&mut self, block: Block, count: usize) -> Range<usize> {
        let start = self.next.entry(block.element).or_insert(0);
        let range = *start..*start + count;
        *start += count;
        match self.ranges.get_mut(&block) {
            Some(existing) if existing.end == range.start => existing.end = range.end,
            _ => {
                self.ranges.insert(block, range.clone());
            }
        }
        range
    }

    pub fn range_for(&self, block: Block) -> Option<Range<usize>> {
        self.ranges.get(&block).cloned()
    }

    /// Number of ids allocated so far in `element`'s table.
    pub fn total(&self, element: Element) -> usize {
        self.next.get(&element).copied().unwrap_or(0)
    }
}

/// Role of each of the four lateral half-edges generated from one apical
/// half-edge, in id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum LateralRole {
    /// Apical edge reversed.
    ReversedApical = 0,
    /// Apical source down to the matching basal vertex.
    AscendingRib = 1,
    /// Basal edge in its sheet direction.
    ReversedBasal = 2,
    /// Basal vertex up to the apical target.
    DescendingRib = 3,
}

impl LateralRole {
    pub const ALL: [LateralRole; 4] = [
        LateralRole::ReversedApical,
        LateralRole::AscendingRib,
        LateralRole::ReversedBasal,
        LateralRole::DescendingRib,
    ];
}

/// Id layout of a freshly assembled monolayer.
#[derive(Debug, Clone)]
pub struct MonolayerLayout {
    allocator: IndexAllocator,
}

impl MonolayerLayout {
    pub fn new(apical_verts: usize, basal_verts: usize, faces: usize, edges: usize) -> Self {
        let mut allocator = IndexAllocator::new();
        allocator.allocate(Block::new(Element::Vert, Segment::Apical), apical_verts);
        allocator.allocate(Block::new(Element::Vert, Segment::Basal), basal_verts);
        allocator.allocate(Block::new(Element::Face, Segment::Apical), faces);
        allocator.allocate(Block::new(Element::Face, Segment::Basal), faces);
        allocator.allocate(Block::new(Element::Face, Segment::Lateral), edges);
        allocator.allocate(Block::new(Element::Edge, Segment::Apical), edges);
        allocator.allocate(Block::new(Element::Edge, Segment::Basal), edges);
        allocator.allocate(Block::new(Element::Edge, Segment::Lateral), 4 * edges);
        allocator.allocate(Block::new(Element::Cell, Segment::Apical), faces);
        Self { allocator }
    }

    pub fn range(&self, element: Element, segment: Segment) -> Range<usize> {
        self.allocator
            .range_for(Block::new(element, segment))
            .unwrap_or(0..0)
    }

    pub fn total(&self, element: Element) -> usize {
        self.allocator.total(element)
    }

    #[inline]
    pub fn basal_vertex(&self, sheet_vertex: usize) -> usize {
        self.range(Element::Vert, Segment::Basal).start + sheet_vertex
    }

    #[inline]
    pub fn basal_face(&self, sheet_face: usize) -> usize {
        self.range(Element::Face, Segment::Basal).start + sheet_face
    }

    #[inline]
    pub fn lateral_face(&self, apical_edge: usize) -> usize {
        self.range(Element::Face, Segment::Lateral).start + apical_edge
    }

    #[inline]
    pub fn basal_edge(&self, sheet_edge: usize) -> usize {
        self.range(Element::Edge, Segment::Basal).start + sheet_edge
    }

    /// Id of the lateral half-edge playing `role` for apical edge `k`.
    #[inline]
    pub fn lateral_edge(&self, k: usize, role: LateralRole) -> usize {
        self.range(Element::Edge, Segment::Lateral).start + 4 * k + role as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_of_one_table_are_contiguous() {
        let mut allocator = IndexAllocator::new();
        let a = allocator.allocate(Block::new(Element::Face, Segment::Apical), 3);
        let b = allocator.allocate(Block::new(Element::Face, Segment::Basal), 3);
        let v = allocator.allocate(Block::new(Element::Vert, Segment::Apical), 5);
        assert_eq!(a, 0..3);
        assert_eq!(b, 3..6);
        assert_eq!(v, 0..5);
        assert_eq!(allocator.total(Element::Face), 6);
        assert_eq!(
            allocator.range_for(Block::new(Element::Face, Segment::Basal)),
            Some(3..6)
        );
        assert_eq!(
            allocator.range_for(Block::new(Element::Edge, Segment::Basal)),
            None
        );
    }

    #[test]
    fn allocating_the_last_block_again_extends_it() {
        let mut allocator = IndexAllocator::new();
        let block = Block::new(Element::Edge, Segment::Lateral);
        allocator.allocate(block, 4);
        allocator.allocate(block, 4);
        assert_eq!(allocator.range_for(block), Some(0..8));
    }

    #[test]
    fn monolayer_layout_places_lateral_edges_in_groups_of_four() {
        let layout = MonolayerLayout::new(24, 24, 7, 42);
        assert_eq!(layout.range(Element::Edge, Segment::Lateral), 84..252);
        assert_eq!(layout.lateral_edge(0, LateralRole::ReversedApical), 84);
        assert_eq!(layout.lateral_edge(2, LateralRole::DescendingRib), 84 + 8 + 3);
        assert_eq!(layout.lateral_face(5), 19);
        assert_eq!(layout.basal_vertex(0), 24);
        assert_eq!(layout.total(Element::Face), 2 * 7 + 42);
        assert_eq!(layout.total(Element::Edge), 6 * 42);
        assert_eq!(layout.total(Element::Cell), 7);
    }
}

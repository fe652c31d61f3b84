//! Typed accessors over a 4 KiB page interpreted as a leaf or internal
//! B+-tree node.
//!
//! Every accessor here is a total function that computes an offset by
//! constant arithmetic and reads/writes through a bounds-checked slice.
//! There is no long-lived borrow of a page: callers fetch a `&Page` or
//! `&mut Page` per operation, per the pager's cache-slab design (see
//! `storage::pager`).

use crate::record::ROW_SIZE;

pub const PAGE_SIZE: usize = 4096;

/// The two variants a page can be interpreted as. `0` is internal, `1` is
/// leaf, per the on-disk layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal,
    Leaf,
}

impl NodeType {
    fn to_byte(self) -> u8 {
        match self {
            NodeType::Internal => 0,
            NodeType::Leaf => 1,
        }
    }

    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(NodeType::Internal),
            1 => Some(NodeType::Leaf),
            _ => None,
        }
    }
}

// Common header, all node types: byte 0 node_type, byte 1 is_root, bytes 2..6
// parent_page_num (reserved, unused while tree depth <= 2).
const NODE_TYPE_OFFSET: usize = 0;
const IS_ROOT_OFFSET: usize = 1;
const PARENT_POINTER_OFFSET: usize = 2;
const PARENT_POINTER_SIZE: usize = 4;
pub const COMMON_NODE_HEADER_SIZE: usize = PARENT_POINTER_OFFSET + PARENT_POINTER_SIZE;

// Leaf header: num_cells (u32) right after the common header.
const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const LEAF_NODE_NUM_CELLS_SIZE: usize = 4;
pub const LEAF_NODE_HEADER_SIZE: usize = LEAF_NODE_NUM_CELLS_OFFSET + LEAF_NODE_NUM_CELLS_SIZE;

// Leaf body: cells are (key: u32, value: ROW_SIZE bytes).
const LEAF_NODE_KEY_SIZE: usize = 4;
const LEAF_NODE_VALUE_SIZE: usize = ROW_SIZE;
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + LEAF_NODE_VALUE_SIZE;
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

/// Number of cells kept in the left node on a leaf split.
pub const LEAF_NODE_LEFT_SPLIT_COUNT: usize =
    (LEAF_NODE_MAX_CELLS + 1) - LEAF_NODE_RIGHT_SPLIT_COUNT;
/// Number of cells moved into the right node on a leaf split.
pub const LEAF_NODE_RIGHT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1) / 2;

// Internal header: num_keys (u32) and right_child_page_num (u32) after the
// common header.
const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const INTERNAL_NODE_NUM_KEYS_SIZE: usize = 4;
const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize =
    INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE;
const INTERNAL_NODE_RIGHT_CHILD_SIZE: usize = 4;
pub const INTERNAL_NODE_HEADER_SIZE: usize =
    INTERNAL_NODE_RIGHT_CHILD_OFFSET + INTERNAL_NODE_RIGHT_CHILD_SIZE;

// Internal body: cells are (child_page_num: u32, key: u32).
const INTERNAL_NODE_CHILD_SIZE: usize = 4;
const INTERNAL_NODE_KEY_SIZE: usize = 4;
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + INTERNAL_NODE_KEY_SIZE;

/// An owned 4 KiB page buffer with typed accessors over its leaf/internal
/// layout. The page doesn't know which variant it currently holds except
/// through its own `node_type` byte; callers are expected to call the
/// accessor that matches what they just checked.
#[derive(Clone)]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    pub fn zeroed() -> Self {
        Page { data: [0u8; PAGE_SIZE] }
    }

    pub fn from_bytes(bytes: [u8; PAGE_SIZE]) -> Self {
        Page { data: bytes }
    }

    pub fn as_bytes(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    pub fn node_type(&self) -> NodeType {
        NodeType::from_byte(self.data[NODE_TYPE_OFFSET])
            .unwrap_or_else(|| panic!("invalid node_type byte {}", self.data[NODE_TYPE_OFFSET]))
    }

    pub fn set_node_type(&mut self, node_type: NodeType) {
        self.data[NODE_TYPE_OFFSET] = node_type.to_byte();
    }

    pub fn is_root(&self) -> bool {
        self.data[IS_ROOT_OFFSET] == 1
    }

    pub fn set_is_root(&mut self, is_root: bool) {
        self.data[IS_ROOT_OFFSET] = is_root as u8;
    }

    pub fn parent_page_num(&self) -> u32 {
        read_u32(&self.data, PARENT_POINTER_OFFSET)
    }

    pub fn set_parent_page_num(&mut self, page_num: u32) {
        write_u32(&mut self.data, PARENT_POINTER_OFFSET, page_num);
    }

    /// The maximum key in this node's subtree: its own last key if a leaf,
    /// the last internal key otherwise (invariant 3: an internal key equals
    /// the max key of its left child's subtree, so the rightmost internal
    /// key is this node's own max).
    pub fn max_key(&self) -> u32 {
        match self.node_type() {
            NodeType::Leaf => {
                let n = self.leaf_num_cells();
                assert!(n > 0, "max_key on an empty leaf");
                self.leaf_key(n - 1)
            }
            NodeType::Internal => {
                let n = self.internal_num_keys();
                assert!(n > 0, "max_key on an empty internal node");
                self.internal_key(n - 1)
            }
        }
    }

    // --- Leaf node accessors ---

    pub fn leaf_num_cells(&self) -> u32 {
        read_u32(&self.data, LEAF_NODE_NUM_CELLS_OFFSET)
    }

    pub fn set_leaf_num_cells(&mut self, num_cells: u32) {
        write_u32(&mut self.data, LEAF_NODE_NUM_CELLS_OFFSET, num_cells);
    }

    fn leaf_cell_offset(&self, cell_num: usize) -> usize {
        assert!(
            cell_num < LEAF_NODE_MAX_CELLS,
            "leaf cell {} out of bounds (max {})",
            cell_num,
            LEAF_NODE_MAX_CELLS
        );
        LEAF_NODE_HEADER_SIZE + cell_num * LEAF_NODE_CELL_SIZE
    }

    pub fn leaf_key(&self, cell_num: usize) -> u32 {
        let offset = self.leaf_cell_offset(cell_num);
        read_u32(&self.data, offset)
    }

    pub fn set_leaf_key(&mut self, cell_num: usize, key: u32) {
        let offset = self.leaf_cell_offset(cell_num);
        write_u32(&mut self.data, offset, key);
    }

    pub fn leaf_value(&self, cell_num: usize) -> &[u8] {
        let offset = self.leaf_cell_offset(cell_num) + LEAF_NODE_KEY_SIZE;
        &self.data[offset..offset + LEAF_NODE_VALUE_SIZE]
    }

    pub fn set_leaf_value(&mut self, cell_num: usize, value: &[u8]) {
        assert_eq!(value.len(), LEAF_NODE_VALUE_SIZE);
        let offset = self.leaf_cell_offset(cell_num) + LEAF_NODE_KEY_SIZE;
        self.data[offset..offset + LEAF_NODE_VALUE_SIZE].copy_from_slice(value);
    }

    /// Copies cell `src` onto cell `dst` within the same page (key + value).
    pub fn copy_leaf_cell(&mut self, dst: usize, src: usize) {
        let src_offset = self.leaf_cell_offset(src);
        let dst_offset = self.leaf_cell_offset(dst);
        let mut tmp = [0u8; LEAF_NODE_CELL_SIZE];
        tmp.copy_from_slice(&self.data[src_offset..src_offset + LEAF_NODE_CELL_SIZE]);
        self.data[dst_offset..dst_offset + LEAF_NODE_CELL_SIZE].copy_from_slice(&tmp);
    }

    pub fn init_leaf(&mut self) {
        self.data = [0u8; PAGE_SIZE];
        self.set_node_type(NodeType::Leaf);
        self.set_is_root(false);
        self.set_leaf_num_cells(0);
    }

    // --- Internal node accessors ---

    pub fn internal_num_keys(&self) -> u32 {
        read_u32(&self.data, INTERNAL_NODE_NUM_KEYS_OFFSET)
    }

    pub fn set_internal_num_keys(&mut self, num_keys: u32) {
        write_u32(&mut self.data, INTERNAL_NODE_NUM_KEYS_OFFSET, num_keys);
    }

    pub fn internal_right_child(&self) -> u32 {
        read_u32(&self.data, INTERNAL_NODE_RIGHT_CHILD_OFFSET)
    }

    pub fn set_internal_right_child(&mut self, page_num: u32) {
        write_u32(&mut self.data, INTERNAL_NODE_RIGHT_CHILD_OFFSET, page_num);
    }

    fn internal_cell_offset(&self, cell_num: u32) -> usize {
        INTERNAL_NODE_HEADER_SIZE + cell_num as usize * INTERNAL_NODE_CELL_SIZE
    }

    pub fn internal_child(&self, child_num: u32) -> u32 {
        let num_keys = self.internal_num_keys();
        assert!(
            child_num <= num_keys,
            "internal child {} exceeds num_keys {}",
            child_num,
            num_keys
        );
        if child_num == num_keys {
            self.internal_right_child()
        } else {
            let offset = self.internal_cell_offset(child_num);
            read_u32(&self.data, offset)
        }
    }

    pub fn set_internal_child(&mut self, child_num: u32, page_num: u32) {
        let num_keys = self.internal_num_keys();
        if child_num == num_keys {
            self.set_internal_right_child(page_num);
        } else {
            let offset = self.internal_cell_offset(child_num);
            write_u32(&mut self.data, offset, page_num);
        }
    }

    pub fn internal_key(&self, key_num: u32) -> u32 {
        let offset = self.internal_cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE;
        read_u32(&self.data, offset)
    }

    pub fn set_internal_key(&mut self, key_num: u32, key: u32) {
        let offset = self.internal_cell_offset(key_num) + INTERNAL_NODE_CHILD_SIZE;
        write_u32(&mut self.data, offset, key);
    }

    pub fn init_internal(&mut self) {
        self.data = [0u8; PAGE_SIZE];
        self.set_node_type(NodeType::Internal);
        self.set_is_root(false);
        self.set_internal_num_keys(0);
    }
}

fn read_u32(data: &[u8; PAGE_SIZE], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

fn write_u32(data: &mut [u8; PAGE_SIZE], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_constants_match_spec() {
        assert_eq!(COMMON_NODE_HEADER_SIZE, 6);
        assert_eq!(LEAF_NODE_HEADER_SIZE, 10);
        assert_eq!(LEAF_NODE_CELL_SIZE, 297);
        assert_eq!(LEAF_NODE_MAX_CELLS, 13);
        assert_eq!(LEAF_NODE_LEFT_SPLIT_COUNT, 7);
        assert_eq!(LEAF_NODE_RIGHT_SPLIT_COUNT, 7);
        assert_eq!(INTERNAL_NODE_HEADER_SIZE, 14);
        assert_eq!(INTERNAL_NODE_CELL_SIZE, 8);
    }

    #[test]
    fn leaf_cells_round_trip() {
        let mut page = Page::zeroed();
        page.init_leaf();
        page.set_leaf_num_cells(2);
        page.set_leaf_key(0, 10);
        page.set_leaf_value(0, &[1u8; ROW_SIZE]);
        page.set_leaf_key(1, 20);
        page.set_leaf_value(1, &[2u8; ROW_SIZE]);

        assert_eq!(page.leaf_key(0), 10);
        assert_eq!(page.leaf_key(1), 20);
        assert_eq!(page.leaf_value(0), &[1u8; ROW_SIZE][..]);
        assert_eq!(page.max_key(), 20);
    }

    #[test]
    fn internal_children_and_right_child() {
        let mut page = Page::zeroed();
        page.init_internal();
        page.set_internal_num_keys(1);
        page.set_internal_child(0, 3);
        page.set_internal_key(0, 99);
        page.set_internal_right_child(4);

        assert_eq!(page.internal_child(0), 3);
        assert_eq!(page.internal_child(1), 4);
        assert_eq!(page.max_key(), 99);
    }
}

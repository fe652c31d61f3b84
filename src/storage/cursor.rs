//! A cursor is a position within the table: a page number, a cell number
//! within that page's leaf, and whether the position is one past the final
//! cell. Cursors never hold a borrowed page across calls; each method
//! fetches the view it needs from the pager and drops it before returning.
//!
//! There is no next-leaf sibling pointer in the node layout (§3 fixes
//! `leaf_header_size == 10`, leaving no room for one), so `advance` finds
//! the next leaf itself by re-descending from the root: it looks up which
//! child of the root the current leaf is, and moves to the next one. This
//! only has to handle a root that is a leaf or an internal node with leaf
//! children, since the tree never grows past one root split.

use crate::errors::Error;
use crate::record::Record;
use crate::storage::page::NodeType;
use crate::storage::pager::Pager;

pub struct Cursor {
    root_page_num: u32,
    pub page_num: u32,
    pub cell_num: u32,
    pub end_of_table: bool,
}

impl Cursor {
    /// A cursor at the first cell of the leftmost leaf.
    pub fn table_start(pager: &mut Pager, root_page_num: u32) -> Result<Self, Error> {
        let mut cursor = Self::table_find(pager, root_page_num, 0)?;
        let page = pager.get_page(cursor.page_num)?;
        cursor.end_of_table = page.leaf_num_cells() == 0;
        Ok(cursor)
    }

    /// A cursor positioned at `key` if present, or at the first cell greater
    /// than `key` otherwise. Descends through internal nodes (picking the
    /// child whose subtree max-key is `>= key`, or the rightmost child if
    /// none) until it reaches a leaf, then binary-searches that leaf.
    pub fn table_find(pager: &mut Pager, root_page_num: u32, key: u32) -> Result<Self, Error> {
        let mut page_num = root_page_num;
        loop {
            let page = pager.get_page(page_num)?;
            match page.node_type() {
                NodeType::Leaf => break,
                NodeType::Internal => {
                    let num_keys = page.internal_num_keys();
                    let mut child_index = num_keys;
                    for i in 0..num_keys {
                        if page.internal_key(i) >= key {
                            child_index = i;
                            break;
                        }
                    }
                    page_num = page.internal_child(child_index);
                }
            }
        }

        let page = pager.get_page(page_num)?;
        let num_cells = page.leaf_num_cells();

        let mut lo = 0u32;
        let mut hi = num_cells;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let mid_key = page.leaf_key(mid as usize);
            if key == mid_key {
                return Ok(Cursor {
                    root_page_num,
                    page_num,
                    cell_num: mid,
                    end_of_table: false,
                });
            }
            if key < mid_key {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }

        Ok(Cursor {
            root_page_num,
            page_num,
            cell_num: lo,
            end_of_table: false,
        })
    }

    /// Copies the record at the cursor's position out of the page.
    pub fn value(&self, pager: &mut Pager) -> Result<Record, Error> {
        let page = pager.get_page(self.page_num)?;
        let bytes = page.leaf_value(self.cell_num as usize);
        Ok(Record::deserialize(bytes))
    }

    /// Moves to the next cell, crossing into the next sibling leaf (via the
    /// root) if the current one is exhausted, or setting `end_of_table` if
    /// the current leaf was the last one.
    pub fn advance(&mut self, pager: &mut Pager) -> Result<(), Error> {
        let page = pager.get_page(self.page_num)?;
        self.cell_num += 1;
        if self.cell_num < page.leaf_num_cells() {
            return Ok(());
        }
        drop(page);

        match self.next_leaf(pager)? {
            Some(next_page_num) => {
                self.page_num = next_page_num;
                self.cell_num = 0;
            }
            None => self.end_of_table = true,
        }
        Ok(())
    }

    /// Finds the leaf after `self.page_num` by looking it up among the
    /// root's children, or `None` if it was the last (or only) leaf.
    fn next_leaf(&self, pager: &mut Pager) -> Result<Option<u32>, Error> {
        let root = pager.get_page(self.root_page_num)?;
        if let NodeType::Leaf = root.node_type() {
            return Ok(None);
        }

        let num_keys = root.internal_num_keys();
        for i in 0..=num_keys {
            if root.internal_child(i) == self.page_num {
                return Ok(if i < num_keys {
                    Some(root.internal_child(i + 1))
                } else {
                    None
                });
            }
        }
        Ok(None)
    }
}

//! Mutating B+-tree operations: leaf insertion, the single leaf split the
//! engine supports, and the root split that follows it.
//!
//! The tree this engine builds never grows past one level of internal
//! nodes: a leaf splits into two leaves under a freshly created internal
//! root exactly once, and every later insert either lands in one of those
//! two leaves without splitting again or hits the fatal path below. This
//! mirrors the Non-goal that excludes recursive internal-node splitting.

use tracing::{debug, warn};

use crate::err;
use crate::errors::Error;
use crate::record::Record;
use crate::storage::cursor::Cursor;
use crate::storage::page::{
    NodeType, LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS, LEAF_NODE_RIGHT_SPLIT_COUNT,
};
use crate::storage::pager::Pager;

/// Inserts `record` under `root_page_num`, splitting the root's single leaf
/// into a two-leaf tree if it's full. Returns an error for a duplicate id.
pub fn insert(pager: &mut Pager, root_page_num: u32, record: &Record) -> Result<(), Error> {
    let cursor = Cursor::table_find(pager, root_page_num, record.id)?;

    let page = pager.get_page(cursor.page_num)?;
    let num_cells = page.leaf_num_cells();
    if cursor.cell_num < num_cells && page.leaf_key(cursor.cell_num as usize) == record.id {
        return Err(err!(Db, "Duplicate key."));
    }
    let is_full = num_cells as usize >= LEAF_NODE_MAX_CELLS;
    drop(page);

    if is_full {
        warn!(
            page_num = cursor.page_num,
            num_cells, "leaf full, splitting"
        );
        return leaf_split_and_insert(pager, &cursor, record);
    }

    let mut page = pager.get_page_mut(cursor.page_num)?;
    for i in (cursor.cell_num + 1..=num_cells).rev() {
        page.copy_leaf_cell(i as usize, i as usize - 1);
    }
    page.set_leaf_num_cells(num_cells + 1);
    page.set_leaf_key(cursor.cell_num as usize, record.id);
    let mut buf = [0u8; crate::record::ROW_SIZE];
    record.serialize(&mut buf);
    page.set_leaf_value(cursor.cell_num as usize, &buf);
    Ok(())
}

/// Splits the leaf at `cursor.page_num` into itself (left) and a freshly
/// allocated page (right), distributing the existing cells plus the new
/// record evenly, then promotes the split into a new root if the leaf was
/// the root. Splitting a non-root leaf is outside this engine's scope and
/// is reported as a fatal error instead of silently corrupting the tree.
fn leaf_split_and_insert(pager: &mut Pager, cursor: &Cursor, record: &Record) -> Result<(), Error> {
    let old_page_num = cursor.page_num;
    let was_root = pager.get_page(old_page_num)?.is_root();
    if !was_root {
        return Err(err!(
            Storage,
            "Splitting a non-root leaf is not supported by this engine."
        ));
    }

    debug!(old_page_num, "splitting root leaf");

    let mut old_cells: Vec<(u32, [u8; crate::record::ROW_SIZE])> = {
        let old_page = pager.get_page(old_page_num)?;
        (0..LEAF_NODE_MAX_CELLS)
            .map(|i| {
                let mut value = [0u8; crate::record::ROW_SIZE];
                value.copy_from_slice(old_page.leaf_value(i));
                (old_page.leaf_key(i), value)
            })
            .collect()
    };

    let mut new_record_bytes = [0u8; crate::record::ROW_SIZE];
    record.serialize(&mut new_record_bytes);
    old_cells.insert(cursor.cell_num as usize, (record.id, new_record_bytes));

    let (left_cells, right_cells) = old_cells.split_at(LEAF_NODE_LEFT_SPLIT_COUNT);
    debug_assert_eq!(right_cells.len(), LEAF_NODE_RIGHT_SPLIT_COUNT);

    let new_page_num = pager.unused_page_num();
    {
        let mut new_page = pager.get_page_mut(new_page_num)?;
        new_page.init_leaf();
        new_page.set_leaf_num_cells(right_cells.len() as u32);
        for (i, (key, value)) in right_cells.iter().enumerate() {
            new_page.set_leaf_key(i, *key);
            new_page.set_leaf_value(i, value);
        }
    }
    {
        let mut old_page = pager.get_page_mut(old_page_num)?;
        old_page.set_leaf_num_cells(left_cells.len() as u32);
        for (i, (key, value)) in left_cells.iter().enumerate() {
            old_page.set_leaf_key(i, *key);
            old_page.set_leaf_value(i, value);
        }
    }

    create_new_root(pager, old_page_num, new_page_num)
}

/// Promotes a split leaf into a two-level tree: the old root's contents
/// move to a new left-child page, and a fresh internal node takes over the
/// root page number with one key (the left child's max) and two children.
fn create_new_root(
    pager: &mut Pager,
    root_page_num: u32,
    right_child_page_num: u32,
) -> Result<(), Error> {
    let left_child_page_num = pager.unused_page_num();

    let root_bytes = *pager.get_page(root_page_num)?.as_bytes();
    {
        let mut left_child = pager.get_page_mut(left_child_page_num)?;
        *left_child = crate::storage::page::Page::from_bytes(root_bytes);
        left_child.set_is_root(false);
    }

    let left_max_key = pager.get_page(left_child_page_num)?.max_key();

    let mut root = pager.get_page_mut(root_page_num)?;
    root.init_internal();
    root.set_is_root(true);
    root.set_internal_num_keys(1);
    root.set_internal_child(0, left_child_page_num);
    root.set_internal_key(0, left_max_key);
    root.set_internal_right_child(right_child_page_num);

    Ok(())
}

/// Describes every page in the table for the `.btree` meta-command, in
/// page-number order.
pub fn describe(pager: &mut Pager, total_pages: u32) -> Result<Vec<String>, Error> {
    let mut lines = Vec::new();
    for page_num in 0..total_pages {
        let page = pager.get_page(page_num)?;
        match page.node_type() {
            NodeType::Leaf => {
                let num_cells = page.leaf_num_cells();
                lines.push(format!("leaf (size {})", num_cells));
                for i in 0..num_cells as usize {
                    lines.push(format!("  - {}", page.leaf_key(i)));
                }
            }
            NodeType::Internal => {
                let num_keys = page.internal_num_keys();
                lines.push(format!("internal (size {})", num_keys));
                for i in 0..num_keys {
                    lines.push(format!("  - {}", page.internal_key(i)));
                }
            }
        }
    }
    Ok(lines)
}

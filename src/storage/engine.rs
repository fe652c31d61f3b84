//! The single boundary between the CLI and the storage core. Everything
//! the REPL needs — opening a file, running an insert or a full-table
//! select, inspecting the tree, closing cleanly — goes through here.

use tracing::info;

use crate::errors::Error;
use crate::record::Record;
use crate::storage::cursor::Cursor;
use crate::storage::pager::Pager;
use crate::storage::tree;

/// Page 0 is always the tree's root, whether it currently holds a leaf or
/// an internal node.
const ROOT_PAGE_NUM: u32 = 0;

pub struct Engine {
    pager: Pager,
}

/// A snapshot of the constants the `.constants` meta-command reports.
pub struct Constants {
    pub row_size: usize,
    pub common_node_header_size: usize,
    pub leaf_node_header_size: usize,
    pub leaf_node_cell_size: usize,
    pub leaf_node_space_for_cells: usize,
    pub leaf_node_max_cells: usize,
    pub internal_node_header_size: usize,
    pub internal_node_cell_size: usize,
}

impl Engine {
    pub fn open(path: &str) -> Result<Self, Error> {
        let mut pager = Pager::open(path)?;
        if pager.num_pages() == 0 {
            let mut root = pager.get_page_mut(ROOT_PAGE_NUM)?;
            root.init_leaf();
            root.set_is_root(true);
        }
        info!(path, "opened table");
        Ok(Engine { pager })
    }

    pub fn close(&mut self) -> Result<(), Error> {
        self.pager.close()?;
        info!("closed table");
        Ok(())
    }

    pub fn execute_insert(&mut self, record: &Record) -> Result<(), Error> {
        tree::insert(&mut self.pager, ROOT_PAGE_NUM, record)
    }

    pub fn execute_select(&mut self) -> Result<Vec<Record>, Error> {
        let mut rows = Vec::new();
        let mut cursor = Cursor::table_start(&mut self.pager, ROOT_PAGE_NUM)?;
        while !cursor.end_of_table {
            rows.push(cursor.value(&mut self.pager)?);
            cursor.advance(&mut self.pager)?;
        }
        Ok(rows)
    }

    /// Lines for the `.btree` meta-command: every page's node type, size,
    /// and keys, in page-number order.
    pub fn describe_tree(&mut self) -> Result<Vec<String>, Error> {
        tree::describe(&mut self.pager, self.pager.num_pages())
    }

    pub fn constants(&self) -> Constants {
        use crate::record::ROW_SIZE;
        use crate::storage::page::{
            COMMON_NODE_HEADER_SIZE, INTERNAL_NODE_CELL_SIZE, INTERNAL_NODE_HEADER_SIZE,
            LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_MAX_CELLS,
            LEAF_NODE_SPACE_FOR_CELLS,
        };
        Constants {
            row_size: ROW_SIZE,
            common_node_header_size: COMMON_NODE_HEADER_SIZE,
            leaf_node_header_size: LEAF_NODE_HEADER_SIZE,
            leaf_node_cell_size: LEAF_NODE_CELL_SIZE,
            leaf_node_space_for_cells: LEAF_NODE_SPACE_FOR_CELLS,
            leaf_node_max_cells: LEAF_NODE_MAX_CELLS,
            internal_node_header_size: INTERNAL_NODE_HEADER_SIZE,
            internal_node_cell_size: INTERNAL_NODE_CELL_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn record(id: u32) -> Record {
        Record::new(id, &format!("user{}", id), &format!("user{}@example.com", id)).unwrap()
    }

    #[test]
    fn select_on_empty_table_is_empty() {
        let tmp = NamedTempFile::new().unwrap();
        let mut engine = Engine::open(tmp.path().to_str().unwrap()).unwrap();
        assert!(engine.execute_select().unwrap().is_empty());
    }

    #[test]
    fn insert_then_select_returns_rows_in_key_order() {
        let tmp = NamedTempFile::new().unwrap();
        let mut engine = Engine::open(tmp.path().to_str().unwrap()).unwrap();
        engine.execute_insert(&record(3)).unwrap();
        engine.execute_insert(&record(1)).unwrap();
        engine.execute_insert(&record(2)).unwrap();

        let rows = engine.execute_select().unwrap();
        let ids: Vec<u32> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let tmp = NamedTempFile::new().unwrap();
        let mut engine = Engine::open(tmp.path().to_str().unwrap()).unwrap();
        engine.execute_insert(&record(1)).unwrap();
        let result = engine.execute_insert(&record(1));
        assert!(matches!(result, Err(Error::Db(_))));
    }

    #[test]
    fn persists_across_close_and_reopen() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap().to_string();
        {
            let mut engine = Engine::open(&path).unwrap();
            engine.execute_insert(&record(1)).unwrap();
            engine.close().unwrap();
        }
        {
            let mut engine = Engine::open(&path).unwrap();
            let rows = engine.execute_select().unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].id, 1);
        }
    }

    #[test]
    fn fourteen_inserts_split_the_root_into_an_internal_node() {
        let tmp = NamedTempFile::new().unwrap();
        let mut engine = Engine::open(tmp.path().to_str().unwrap()).unwrap();
        for id in 1..=14 {
            engine.execute_insert(&record(id)).unwrap();
        }
        let rows = engine.execute_select().unwrap();
        let ids: Vec<u32> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, (1..=14).collect::<Vec<_>>());

        let lines = engine.describe_tree().unwrap();
        assert!(lines.iter().any(|l| l.starts_with("internal")));
        assert_eq!(lines.iter().filter(|l| l.starts_with("leaf")).count(), 2);
    }
}

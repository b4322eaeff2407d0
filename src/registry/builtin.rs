//! Constructors and loaders of the built-in node, record and table types.

use crate::tree::{Level, NodeId, Tree};

use super::Loader;

fn create_at(tree: &mut Tree, existing: Option<NodeId>, level: Level) -> Option<NodeId> {
    match existing {
        Some(id) => tree.upgrade(id, level).then_some(id),
        None => Some(match level {
            Level::Node => tree.new_node(),
            Level::Record => tree.new_record(),
            Level::Table => tree.new_table(),
        }),
    }
}

pub fn create_node(tree: &mut Tree, existing: Option<NodeId>) -> Option<NodeId> {
    create_at(tree, existing, Level::Node)
}

pub fn create_record(tree: &mut Tree, existing: Option<NodeId>) -> Option<NodeId> {
    create_at(tree, existing, Level::Record)
}

pub fn create_table(tree: &mut Tree, existing: Option<NodeId>) -> Option<NodeId> {
    create_at(tree, existing, Level::Table)
}

fn read_record_block(loader: &mut Loader<'_>, tree: &mut Tree, id: NodeId) -> bool {
    let Some(body) = tree.body_mut(id) else {
        loader.input().set_error(true);
        return false;
    };
    let read = match body.record_mut() {
        Some(record) => record.read_block(loader.input()),
        None => {
            loader.input().set_error(true);
            false
        }
    };
    body.remove_reserved();
    read
}

fn read_table_block(loader: &mut Loader<'_>, tree: &mut Tree, id: NodeId) -> bool {
    match tree.table_mut(id) {
        Some(table) => table.read_block(loader.input()),
        None => {
            loader.input().set_error(true);
            false
        }
    }
}

/// With `existing`, reads only the node block into it. Otherwise builds a
/// node and reads every block of a node object.
pub fn load_node(loader: &mut Loader<'_>, tree: &mut Tree, existing: Option<NodeId>) -> Option<NodeId> {
    let id = existing.unwrap_or_else(|| tree.new_node());
    tree.read_node_block(id, loader);
    Some(id)
}

/// With `existing` (already upgraded to a record), reads only the record
/// block. Otherwise builds a record and reads the node and record blocks.
pub fn load_record(loader: &mut Loader<'_>, tree: &mut Tree, existing: Option<NodeId>) -> Option<NodeId> {
    if let Some(id) = existing {
        read_record_block(loader, tree, id);
        return Some(id);
    }

    let id = tree.new_record();
    let _ = tree.read_node_block(id, loader) && read_record_block(loader, tree, id);
    Some(id)
}

/// With `existing` (already upgraded to a table), reads only the table
/// block. Otherwise builds a table and reads all three blocks.
pub fn load_table(loader: &mut Loader<'_>, tree: &mut Tree, existing: Option<NodeId>) -> Option<NodeId> {
    if let Some(id) = existing {
        read_table_block(loader, tree, id);
        return Some(id);
    }

    let id = tree.new_table();
    let _ = tree.read_node_block(id, loader)
        && read_record_block(loader, tree, id)
        && read_table_block(loader, tree, id);
    Some(id)
}

//! # Table Schema Commit Tests
//!
//! Exercises staged schema edits followed by commit through the public tree
//! API: defaults, migration, removal, reshaping, and the metadata keys a
//! table publishes through its record.

use svtree::{container, Level, Registry, SymbolTable, Tree, Value};

fn tree() -> Tree {
    Registry::new(SymbolTable::shared()).new_tree()
}

#[test]
fn buffer_always_matches_stride_times_cells() {
    let mut tree = tree();
    let id = tree.new_table();
    let table = tree.table_mut(id).unwrap();

    table.setup_3d(5, 4, 3);
    table.add_typed::<f64>("a", 1.0);
    table.add_typed::<i8>("b", -1);
    table.commit(true);
    assert_eq!(table.data().len(), table.count() * table.stride(0).unwrap());
    assert_eq!(table.stride(3), Some(table.data().len()));

    table.rem("a");
    table.add_typed::<u32>("c", 3);
    table.commit(true);
    assert_eq!(table.stride(0), Some(5));
    assert_eq!(table.data().len(), 60 * 5);
    assert!(table.field::<i8>("b").unwrap().iter().all(|b| b == -1));
    assert!(table.field::<u32>("c").unwrap().iter().all(|c| c == 3));
}

#[test]
fn reshape_rebuilds_from_defaults() {
    let mut tree = tree();
    let id = tree.new_table();
    let table = tree.table_mut(id).unwrap();
    table.setup_1d(4);
    table.add_typed::<i32>("n", 7);
    table.commit(true);
    table.field_mut::<i32>("n").unwrap().fill(1);

    table.setup_2d(2, 3);
    table.commit(true);

    assert_eq!(table.count(), 6);
    assert!(table.field::<i32>("n").unwrap().iter().all(|n| n == 7));
}

#[test]
fn field_indices_are_dense_after_commit() {
    let mut tree = tree();
    let id = tree.new_table();
    let table = tree.table_mut(id).unwrap();
    for name in ["a", "b", "c", "d"] {
        table.add(name, "raw", 1, &[]);
    }
    table.commit(true);

    table.rem("b");
    table.rem("c");
    table.add("e", "raw", 2, &[1, 2]);
    table.commit(true);

    let names: Vec<String> = (0..table.field_count())
        .map(|i| table.symbols().name(table.field_name(i).unwrap()).to_string())
        .collect();
    assert_eq!(names, ["a", "d", "e"]);
    for (i, name) in names.iter().enumerate() {
        assert_eq!(table.index_of(name), Some(i));
    }
}

#[test]
fn metadata_keys_come_before_stored_keys() {
    let mut tree = tree();
    let id = tree.new_table();
    {
        let table = tree.table_mut(id).unwrap();
        table.setup_1d(8);
        table.add_typed::<f32>("x", 0.0);
        table.commit(true);
    }
    tree.record_mut(id).unwrap().item_str("owner").set_string("calib");

    let record = tree.record(id).unwrap();
    let exported = record.export_count();
    assert_eq!(exported, 2 + 1 + 2 + 4);
    assert_eq!(record.len(), exported + 1);
    assert_eq!(record.entry(0).unwrap().as_int(), 1);
    assert_eq!(record.entry(exported).unwrap().as_string(), "calib");
    assert!(record.entry(0).unwrap().is_export());
    assert!(!record.entry(exported).unwrap().is_export());
}

#[test]
fn metadata_keys_are_read_only() {
    let mut tree = tree();
    let id = tree.new_table();
    tree.table_mut(id).unwrap().commit(true);

    let mut record = tree.record_mut(id).unwrap();
    assert!(!record.item_str("dims").set_int(3));
    let fields = record.symbols().intern("fields");
    assert!(!record.remove(fields));
    drop(record);

    assert_eq!(tree.table(id).unwrap().dims(), 0);
    assert_eq!(tree.body(id).unwrap().record().unwrap().len(), 0);
}

#[test]
fn upgraded_record_keeps_items_next_to_new_table() {
    let mut tree = tree();
    let id = tree.new_record();
    tree.record_mut(id).unwrap().item_str("kept").set_real(0.5);

    assert!(tree.upgrade(id, Level::Table));
    let table = tree.table_mut(id).unwrap();
    table.setup_1d(2);
    table.add_typed::<u8>("m", 1);
    table.commit(true);

    let record = tree.record(id).unwrap();
    assert_eq!(record.get_str("kept").unwrap().as_real(), 0.5);
    assert_eq!(record.get_str("size[0]").unwrap().as_int(), 2);
}

#[test]
fn reserved_metadata_keys_are_never_stored() {
    let mut tree = tree();
    let id = tree.new_table();
    let table = tree.table_mut(id).unwrap();
    table.setup_1d(4);
    table.commit(true);

    let mut record = tree.record_mut(id).unwrap();
    let mut item = record.item_str("size[1]");
    assert!(!item.can_set());
    assert!(!item.set_int(99));
    assert_eq!(tree.body(id).unwrap().record().unwrap().len(), 0);

    let table = tree.table_mut(id).unwrap();
    table.setup_2d(3, 4);
    table.commit(true);

    let size1 = tree.symbols().intern("size[1]");
    let record = tree.record(id).unwrap();
    assert_eq!(record.keys().filter(|&k| k == size1).count(), 1);
    assert_eq!(record.len(), record.export_count());
    assert_eq!(record.get(size1).unwrap().as_int(), 4);
}

#[test]
fn upgrading_to_table_drops_colliding_stored_keys() {
    let mut tree = tree();
    let id = tree.new_record();
    {
        let mut record = tree.record_mut(id).unwrap();
        record.item_str("dims").set_int(7);
        record.item_str("stride[9]").set_int(1);
        record.item_str("kept").set_int(3);
    }

    assert!(tree.upgrade(id, Level::Table));
    assert_eq!(tree.body(id).unwrap().record().unwrap().len(), 1);
    let record = tree.record(id).unwrap();
    assert_eq!(record.get_str("dims").unwrap().as_int(), 0);
    assert_eq!(record.get_str("kept").unwrap().as_int(), 3);
}

#[test]
fn loading_drops_stored_keys_that_collide_with_metadata() {
    let registry = Registry::new(SymbolTable::shared());
    let mut tree = registry.new_tree();
    let id = tree.new_table();
    let table = tree.table_mut(id).unwrap();
    table.setup_1d(2);
    table.commit(true);

    // bypass the record view, as a file written elsewhere could
    let key = tree.symbols().intern("size[1]");
    let raw = tree.body_mut(id).unwrap().record_mut().unwrap();
    raw.set(key, Value::Int(99));
    let bytes = container::save_to_vec(&tree, id).unwrap();

    let loaded = container::load_from_slice(&registry, &bytes).unwrap();
    let body = loaded.tree.body(loaded.root).unwrap();
    assert!(body.record().unwrap().is_empty());
    let record = loaded.tree.record(loaded.root).unwrap();
    assert_eq!(record.len(), record.export_count());
}

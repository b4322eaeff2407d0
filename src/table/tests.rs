use super::*;
use crate::record::{Exports, RecordView, Record};
use crate::stream::{InStream, OutStream, SliceReader, VecWriter};
use crate::encoding::Tag;

fn table() -> Table {
    Table::new(SymbolTable::shared())
}

fn grid_2x2() -> Table {
    let mut table = table();
    table.setup_2d(2, 2);
    table.add_typed::<f32>("v", 0.0);
    table.commit(true);
    table
}

#[test]
fn new_table_is_a_single_empty_cell() {
    let table = table();
    assert_eq!(table.dims(), 0);
    assert_eq!(table.count(), 1);
    assert_eq!(table.strides(), &[0]);
    assert!(table.data().is_empty());
    assert!(table.is_dirty());
}

#[test]
fn commit_sizes_buffer_to_stride_times_cells() {
    let mut table = table();
    table.setup_3d(4, 3, 2);
    table.add_typed::<f32>("a", 1.5);
    table.add_typed::<u8>("b", 7);
    table.commit(true);

    assert_eq!(table.strides(), &[5, 20, 60, 120]);
    assert_eq!(table.data().len(), table.count() * table.stride(0).unwrap());
    assert_eq!(table.field_count(), 2);
    assert_eq!(table.index_of("b"), Some(1));
    assert!(!table.is_dirty());

    let a = table.field::<f32>("a").unwrap();
    let b = table.field::<u8>("b").unwrap();
    assert!(a.iter().all(|v| v == 1.5));
    assert!(b.iter().all(|v| v == 7));
}

#[test]
fn staged_changes_are_invisible_until_commit() {
    let mut table = grid_2x2();
    table.add_typed::<i32>("w", 5);
    table.setup_1d(10);

    assert!(!table.exists("w"));
    assert_eq!(table.sizes(), &[2, 2]);
    assert!(table.is_dirty());

    table.commit(true);
    assert!(table.exists("w"));
    assert_eq!(table.sizes(), &[10]);
}

#[test]
fn migration_keeps_values_and_fills_new_fields() {
    let mut table = grid_2x2();
    {
        let mut v = table.field_mut::<f32>("v").unwrap();
        assert!(v.set(&[0, 0], 1.0));
        assert!(v.set(&[1, 1], 2.0));
    }

    table.add_typed::<i16>("n", -3);
    table.commit(true);

    let v: Vec<f32> = table.field::<f32>("v").unwrap().iter().collect();
    assert_eq!(v, vec![1.0, 0.0, 0.0, 2.0]);
    let n = table.field::<i16>("n").unwrap();
    assert!(n.iter().all(|x| x == -3));
    assert_eq!(table.field_def(1).map(FieldDef::offset), Some(4));
}

#[test]
fn migration_without_defaults_zeroes_new_fields() {
    let mut table = grid_2x2();
    table.add_typed::<u32>("n", 99);
    table.commit(false);

    assert!(table.field::<u32>("n").unwrap().iter().all(|x| x == 0));
}

#[test]
fn rem_drops_field_and_compacts_offsets() {
    let mut table = table();
    table.setup_1d(3);
    table.add_typed::<u8>("a", 1);
    table.add_typed::<u16>("b", 2);
    table.add_typed::<u8>("c", 3);
    table.commit(true);

    assert!(table.rem("b"));
    assert!(table.exists("b"));
    table.commit(true);

    assert!(!table.exists("b"));
    assert_eq!(table.field_count(), 2);
    assert_eq!(table.index_of("c"), Some(1));
    assert_eq!(table.stride(0), Some(2));
    assert_eq!(table.data(), &[1, 3, 1, 3, 1, 3]);
}

#[test]
fn rem_unknown_name_is_noop() {
    let mut table = grid_2x2();
    assert!(!table.rem("nope"));
    assert!(!table.is_dirty());
}

#[test]
fn rem_of_staged_field_unstages_it() {
    let mut table = grid_2x2();
    table.add_typed::<u8>("tmp", 1);
    assert!(table.rem("tmp"));
    assert!(!table.is_dirty());
}

#[test]
fn add_replaces_same_named_field() {
    let mut table = grid_2x2();
    table.add_typed::<f64>("v", 0.25);
    table.commit(true);

    assert_eq!(table.field_count(), 1);
    assert!(table.exists_typed("v", "eos::real64"));
    assert!(!table.exists_typed("v", "eos::real32"));
    assert!(table.field::<f64>("v").unwrap().iter().all(|x| x == 0.25));
}

#[test]
fn commit_twice_is_idempotent() {
    let mut table = grid_2x2();
    table.field_mut::<f32>("v").unwrap().set(&[1, 0], 4.0);
    let before = table.data().to_vec();

    table.commit(true);
    assert_eq!(table.data(), before.as_slice());
}

#[test]
fn default_is_padded_or_truncated_to_size() {
    let mut table = table();
    table.add("pad", "raw", 4, &[1, 2]);
    table.add("cut", "raw", 1, &[9, 9, 9]);
    table.commit(true);

    assert_eq!(table.field_default(0), Some(&[1, 2, 0, 0][..]));
    assert_eq!(table.field_default(1), Some(&[9][..]));
    assert_eq!(table.data(), &[1, 2, 0, 0, 9]);
}

#[test]
fn get_raw_gathers_one_field() {
    let mut table = table();
    table.setup_1d(3);
    table.add("a", "raw", 1, &[1]);
    table.add("b", "raw", 2, &[2, 3]);
    table.commit(true);

    let mut out = Vec::new();
    assert!(table.get_raw(1, &mut out));
    assert_eq!(out, vec![2, 3, 2, 3, 2, 3]);
    assert!(!table.get_raw(2, &mut out));
    assert_eq!(table.field_memory(1), Some(6));
}

#[test]
fn coordinates_out_of_range_are_rejected() {
    let table = grid_2x2();
    let v = table.field::<f32>("v").unwrap();

    assert!(v.get(&[2, 0]).is_none());
    assert!(v.get(&[0, 0, 0]).is_none());
    assert_eq!(v.get(&[1]), Some(0.0));
    assert!(table.cell(&[0, 2]).is_none());
    assert_eq!(table.cell(&[1, 1]).map(<[u8]>::len), Some(4));
}

#[test]
fn typed_view_rejects_narrow_field() {
    let table = grid_2x2();
    assert!(table.field::<f64>("v").is_none());
    assert!(table.field::<u16>("v").is_some());
}

#[test]
fn sub_field_reads_component() {
    let mut table = table();
    table.setup_1d(2);
    table.add("xy", "vec2", 8, &[]);
    table.commit(true);

    let xy = table.field_mut::<f32>("xy").unwrap();
    let mut y = xy.sub_field_mut::<f32>(4).unwrap();
    y.fill(3.5);

    let xy = table.field::<f32>("xy").unwrap();
    assert_eq!(xy.get(&[1]), Some(0.0));
    assert_eq!(xy.sub_field::<f32>(4).unwrap().get(&[1]), Some(3.5));
    assert!(xy.sub_field::<f32>(5).is_none());
}

#[test]
fn exported_metadata_reflects_committed_layout() {
    let mut table = table();
    table.setup_2d(3, 2);
    table.add_typed::<u16>("id", 0x0102);
    table.commit(true);

    let symbols = Arc::clone(table.symbols());
    let record = Record::new(Arc::clone(&symbols));
    let view = RecordView::new(&record, Some(&table));

    assert_eq!(view.export_count(), 2 + 2 + 3 + 4);
    assert_eq!(view.get_str("dims").unwrap().as_int(), 2);
    assert_eq!(view.get_str("fields").unwrap().as_int(), 1);
    assert_eq!(view.get_str("size[0]").unwrap().as_int(), 3);
    assert_eq!(view.get_str("stride[2]").unwrap().as_int(), 12);
    assert_eq!(view.get_str("field[0].name").unwrap().as_string(), "id");
    assert_eq!(view.get_str("field[0].type").unwrap().as_string(), "eos::nat16");
    assert_eq!(view.get_str("field[0].size").unwrap().as_int(), 2);
    assert_eq!(view.get_str("field[0].default").unwrap().as_string(), "0201");
    assert!(!view.get_str("dims").unwrap().can_set());

    let out_of_range = symbols.intern("size[2]");
    assert!(!table.is_export(out_of_range));
}

#[test]
fn block_round_trip_restores_layout_and_data() {
    let mut table = grid_2x2();
    table.field_mut::<f32>("v").unwrap().set(&[0, 1], -1.0);

    let mut out = VecWriter::new();
    let written = table.write_block(Tag::TABLE, table.block_size(), &mut out);
    assert!(!out.error());
    assert_eq!(written, table.block_size());

    let bytes = out.into_inner();
    let mut input = SliceReader::new(&bytes);
    let mut loaded = Table::new(Arc::clone(table.symbols()));
    assert!(loaded.read_block(&mut input));
    assert!(input.is_exhausted());

    assert_eq!(loaded.sizes(), table.sizes());
    assert_eq!(loaded.strides(), table.strides());
    assert_eq!(loaded.data(), table.data());
    assert_eq!(loaded.index_of("v"), Some(0));
    assert!(!loaded.is_dirty());
}

#[test]
fn staged_fields_are_not_serialized() {
    let mut table = grid_2x2();
    let committed = table.block_size();
    table.add_typed::<u8>("later", 1);

    assert_eq!(table.block_size(), committed);
}

#[test]
fn data_length_mismatch_sets_error() {
    let table = grid_2x2();
    let mut out = VecWriter::new();
    table.write_block(Tag::TABLE, table.block_size(), &mut out);
    let mut bytes = out.into_inner();
    // shrink the first dimension from 2 to 1 without touching the data
    bytes[20] = 1;

    let mut input = SliceReader::new(&bytes);
    let mut loaded = Table::new(Arc::clone(table.symbols()));
    assert!(!loaded.read_block(&mut input));
    assert!(input.error());
}

#[test]
fn clone_is_deep() {
    let table = grid_2x2();
    let mut copy = table.clone();
    copy.field_mut::<f32>("v").unwrap().fill(9.0);

    assert!(table.field::<f32>("v").unwrap().iter().all(|x| x == 0.0));
    assert!(copy.field::<f32>("v").unwrap().iter().all(|x| x == 9.0));
}

#[test]
fn memory_accounts_for_buffer() {
    let table = grid_2x2();
    assert!(table.memory() >= table.data().len());
    assert_eq!(table.field_memory(0), Some(16));
}

#[test]
fn commit_refuses_overflowing_buffer() {
    let mut table = grid_2x2();
    let before = table.data().to_vec();

    table.setup_2d(usize::MAX, 2);
    assert!(!table.commit(true));
    assert_eq!(table.sizes(), &[2, 2]);
    assert_eq!(table.data(), before.as_slice());
    assert!(table.is_dirty());

    table.setup_2d(2, 2);
    assert!(table.commit(true));
}

#[test]
fn commit_refuses_overflowing_cell_count_without_fields() {
    let mut table = table();
    table.setup_3d(usize::MAX, usize::MAX, usize::MAX);

    assert!(!table.commit(true));
    assert_eq!(table.dims(), 0);
    assert_eq!(table.count(), 1);
}

#[test]
fn overflowing_shape_in_block_sets_error() {
    let mut table = table();
    table.setup_3d(1, 1, 1);
    table.commit(true);
    let mut out = VecWriter::new();
    table.write_block(Tag::TABLE, table.block_size(), &mut out);
    let mut bytes = out.into_inner();
    // three extents follow the header and the dimension count
    bytes[20..32].fill(0xff);

    let mut input = SliceReader::new(&bytes);
    let mut loaded = Table::new(Arc::clone(table.symbols()));
    assert!(!loaded.read_block(&mut input));
    assert!(input.error());
    assert_eq!(loaded.dims(), 0);
}

#[test]
fn fields_running_past_block_end_set_error() {
    let mut table = table();
    table.setup_1d(0);
    table.add_typed::<u32>("n", 5);
    table.commit(true);
    let mut out = VecWriter::new();
    table.write_block(Tag::TABLE, table.block_size(), &mut out);
    let mut bytes = out.into_inner();
    let short = (table.block_size() - 4) as u32;
    bytes[6..10].copy_from_slice(&short.to_le_bytes());

    let mut input = SliceReader::new(&bytes);
    let mut loaded = Table::new(Arc::clone(table.symbols()));
    assert!(!loaded.read_block(&mut input));
    assert!(input.error());
}

#[test]
fn reserved_keys_cover_every_shape() {
    let table = grid_2x2();
    let symbols = table.symbols();

    assert!(table.is_reserved(symbols.intern("size[7]")));
    assert!(table.is_reserved(symbols.intern("field[3].default")));
    assert!(!table.is_export(symbols.intern("size[7]")));
    assert!(!table.is_reserved(symbols.intern("size")));
    assert!(!table.is_reserved(symbols.intern("label")));
}

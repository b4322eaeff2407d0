use std::sync::Arc;

use super::*;
use crate::encoding::Tag;
use crate::encoding::BlockHeader;
use crate::stream::{InStream, OutStream, OutStreamExt, SliceReader, VecWriter};
use crate::symbols::{SymbolTable, Token};

fn record() -> Record {
    Record::new(SymbolTable::shared())
}

/// Publishes one writable int `gain` and one read-only token `mode`.
struct Knobs {
    gain: Token,
    mode: Token,
    mode_value: Token,
    gain_value: i32,
}

impl Knobs {
    fn new(symbols: &SymbolTable) -> Self {
        Self {
            gain: symbols.intern("gain"),
            mode: symbols.intern("mode"),
            mode_value: symbols.intern("fast"),
            gain_value: 3,
        }
    }
}

impl Exports for Knobs {
    fn export_count(&self) -> usize {
        2
    }

    fn export_key(&self, index: usize) -> Option<Token> {
        [self.gain, self.mode].get(index).copied()
    }

    fn is_export(&self, key: Token) -> bool {
        key == self.gain || key == self.mode
    }

    fn can_set(&self, key: Token) -> bool {
        key == self.gain
    }

    fn description(&self, key: Token) -> Option<&str> {
        (key == self.gain).then_some("amplifier gain")
    }

    fn export_kind(&self, key: Token) -> ValueKind {
        if key == self.mode {
            ValueKind::Token
        } else {
            ValueKind::Int
        }
    }

    fn get_int(&self, key: Token) -> Option<i32> {
        (key == self.gain).then_some(self.gain_value)
    }

    fn get_token(&self, key: Token) -> Option<Token> {
        (key == self.mode).then_some(self.mode_value)
    }

    fn set_int(&mut self, key: Token, value: i32) -> bool {
        if key != self.gain {
            return false;
        }
        self.gain_value = value;
        true
    }
}

#[test]
fn index_creates_int_zero() {
    let mut record = record();
    let mut view = RecordViewMut::new(&mut record, None);

    let item = view.item_str("width");
    assert_eq!(item.kind(), ValueKind::Int);
    assert_eq!(item.as_int(), 0);
    assert_eq!(record.len(), 1);
}

#[test]
fn get_does_not_create() {
    let mut record = record();
    let mut view = RecordViewMut::new(&mut record, None);

    assert!(view.get_str("missing").is_none());
    assert!(record.is_empty());
}

#[test]
fn set_switches_kind() {
    let mut record = record();
    let mut view = RecordViewMut::new(&mut record, None);

    let mut item = view.item_str("x");
    assert!(item.set_real(2.75));
    assert_eq!(item.kind(), ValueKind::Real);
    assert_eq!(item.as_int(), 2);

    assert!(item.set_string("hello"));
    assert_eq!(item.kind(), ValueKind::String);
    assert_eq!(item.as_string(), "hello");
}

#[test]
fn exported_keys_come_first() {
    let mut record = record();
    let symbols = Arc::clone(record.symbols());
    let mut knobs = Knobs::new(&symbols);

    RecordViewMut::new(&mut record, None).item_str("stored").set_int(9);

    let view = RecordView::new(&record, Some(&knobs));
    assert_eq!(view.len(), 3);
    assert_eq!(view.export_count(), 2);
    assert_eq!(view.key(0), Some(knobs.gain));
    assert_eq!(view.key(1), Some(knobs.mode));
    assert_eq!(view.key(2), symbols.get("stored"));
    assert_eq!(view.entry(2).map(|item| item.as_int()), Some(9));

    let keys: Vec<_> = view.keys().collect();
    assert_eq!(keys.len(), 3);

    let mut view = RecordViewMut::new(&mut record, Some(&mut knobs));
    assert!(view.item_str("gain").is_export());
}

#[test]
fn exported_reads_go_through_callbacks() {
    let record = record();
    let symbols = Arc::clone(record.symbols());
    let knobs = Knobs::new(&symbols);
    let view = RecordView::new(&record, Some(&knobs));

    let gain = view.get_str("gain").unwrap();
    assert!(gain.is_export());
    assert!(gain.can_set());
    assert_eq!(gain.description(), "amplifier gain");
    assert_eq!(gain.as_int(), 3);
    assert_eq!(gain.as_string(), "3");

    let mode = view.get_str("mode").unwrap();
    assert_eq!(mode.kind(), ValueKind::Token);
    assert_eq!(mode.as_string(), "fast");
    assert_eq!(mode.as_int(), 0);
    assert!(!mode.can_set());
}

#[test]
fn exported_writes_never_touch_storage() {
    let mut record = record();
    let symbols = Arc::clone(record.symbols());
    let mut knobs = Knobs::new(&symbols);

    {
        let mut view = RecordViewMut::new(&mut record, Some(&mut knobs));
        assert!(view.item_str("gain").set_int(11));
        assert!(!view.item_str("mode").set_int(1));
        assert!(!view.item_str("gain").set_string("loud"));
        assert!(!view.remove(symbols.intern("gain")));
    }

    assert!(record.is_empty());
    assert_eq!(knobs.gain_value, 11);
    assert_eq!(knobs.mode_value, symbols.intern("fast"));
}

#[test]
fn remove_drops_stored_key() {
    let mut record = record();
    let key = record.symbols().intern("k");
    let mut view = RecordViewMut::new(&mut record, None);
    view.item(key).set_int(1);

    assert!(view.remove(key));
    assert!(!view.remove(key));
    assert!(record.is_empty());
}

#[test]
fn block_round_trip_preserves_items() {
    let mut record = record();
    {
        let mut view = RecordViewMut::new(&mut record, None);
        view.item_str("i").set_int(-7);
        view.item_str("r").set_real(0.5);
        let token = view.symbols().intern("alpha");
        view.item_str("t").set_token(token);
        view.item_str("s").set_string("text value");
    }

    let mut out = VecWriter::new();
    let written = record.write_block(Tag::RECORD, record.block_size(), &mut out);
    assert!(!out.error());
    assert_eq!(written, record.block_size());

    let mut loaded = Record::new(Arc::clone(record.symbols()));
    let bytes = out.into_inner();
    let mut input = SliceReader::new(&bytes);
    assert!(loaded.read_block(&mut input));
    assert!(input.is_exhausted());

    let original: Vec<_> = record.iter().map(|(k, v)| (k, v.clone())).collect();
    let reloaded: Vec<_> = loaded.iter().map(|(k, v)| (k, v.clone())).collect();
    assert_eq!(original, reloaded);
}

#[test]
fn unknown_value_type_loads_as_string() {
    let symbols = SymbolTable::shared();
    let mut out = VecWriter::new();
    let block_size = 20 + (2 + 1) + (2 + 7) + (2 + 3);
    let header = BlockHeader::new(
        Tag::RECORD,
        Tag::RECORD,
        block_size as u32,
        block_size as u32,
    );
    header.write(&mut out);
    out.write_u32(1);
    out.write_lump(b"q");
    out.write_lump(b"complex");
    out.write_lump(b"1+i");

    let bytes = out.into_inner();
    let mut input = SliceReader::new(&bytes);
    let mut record = Record::new(Arc::clone(&symbols));
    assert!(record.read_block(&mut input));

    let value = record.get(symbols.intern("q")).unwrap();
    assert_eq!(value, &Value::Str("1+i".into()));
}

#[test]
fn truncated_block_sets_error() {
    let mut record = record();
    RecordViewMut::new(&mut record, None).item_str("x").set_int(1);

    let mut out = VecWriter::new();
    record.write_block(Tag::RECORD, record.block_size(), &mut out);
    let bytes = out.into_inner();

    let mut input = SliceReader::new(&bytes[..bytes.len() - 2]);
    let mut loaded = Record::new(Arc::clone(record.symbols()));
    assert!(!loaded.read_block(&mut input));
    assert!(input.error());
}

#[test]
fn lookups_by_name_do_not_intern() {
    let mut record = record();
    let symbols = Arc::clone(record.symbols());
    let before = symbols.len();

    assert!(RecordView::new(&record, None).get_str("absent").is_none());
    let mut view = RecordViewMut::new(&mut record, None);
    assert!(view.get_str("absent").is_none());

    assert_eq!(symbols.len(), before);
    assert!(symbols.get("absent").is_none());
}

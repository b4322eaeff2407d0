//! Table commit and container benchmarks for svtree
//!
//! A commit either rebuilds the whole buffer from field defaults (after a
//! reshape) or migrates existing cells into a new field layout. These
//! benchmarks compare both paths and measure a full save/load cycle of a
//! table-bearing tree.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use svtree::{container, Registry, SymbolTable, Table};

fn seeded_table(cells: usize) -> Table {
    let mut table = Table::new(SymbolTable::shared());
    table.setup_1d(cells);
    table.add_typed::<f32>("x", 0.0);
    table.add_typed::<f32>("y", 0.0);
    table.add_typed::<u16>("flags", 1);
    table.commit(true);
    table
}

fn bench_commit_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_rebuild");

    for cells in [1_000usize, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(cells), &cells, |b, &cells| {
            let mut table = seeded_table(cells);
            b.iter(|| {
                table.setup_1d(black_box(cells));
                table.commit(true);
                black_box(table.data().len())
            });
        });
    }

    group.finish();
}

fn bench_commit_migrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_migrate");

    for cells in [1_000usize, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(cells), &cells, |b, &cells| {
            let mut table = seeded_table(cells);
            let mut toggle = false;
            b.iter(|| {
                if toggle {
                    table.rem("z");
                } else {
                    table.add_typed::<f64>("z", 1.0);
                }
                toggle = !toggle;
                table.commit(true);
                black_box(table.stride(0))
            });
        });
    }

    group.finish();
}

fn bench_container_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("container_cycle");
    let registry = Registry::new(SymbolTable::shared());

    let mut tree = registry.new_tree();
    let root = tree.new_node();
    for i in 0..16 {
        let id = tree.new_table();
        tree.record_mut(id).unwrap().item_str("index").set_int(i);
        let table = tree.table_mut(id).unwrap();
        table.setup_2d(64, 64);
        table.add_typed::<f32>("v", i as f32);
        table.commit(true);
        tree.attach_parent(id, root);
    }
    let bytes = container::save_to_vec(&tree, root).unwrap();

    group.bench_function("save", |b| {
        b.iter(|| black_box(container::save_to_vec(&tree, root).unwrap().len()))
    });
    group.bench_function("load", |b| {
        b.iter(|| {
            let loaded = container::load_from_slice(&registry, black_box(&bytes)).unwrap();
            black_box(loaded.tree.len())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_commit_rebuild,
    bench_commit_migrate,
    bench_container_cycle
);
criterion_main!(benches);

//! Benchmarks for the lineage graph pipeline
//!
//! Measures end-to-end graph building on long staging chains and wide
//! tables, with intermediates both shown and collapsed.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lineviz_core::DisplayPolicy;
use lineviz_engine::LineageGraphBuilder;
use lineviz_sql::SqlLineageExtractor;

/// A script of `num_stages` chained INSERTs, each copying `num_columns`
/// columns through a CTE into the next staging table
fn generate_chain_script(num_stages: usize, num_columns: usize) -> String {
    let columns: Vec<String> = (0..num_columns).map(|i| format!("col_{}", i)).collect();
    let select_list = columns.join(", ");

    (0..num_stages)
        .map(|stage| {
            let source = if stage == 0 {
                "src.raw".to_string()
            } else {
                format!("dw.stage_{}", stage - 1)
            };
            format!(
                "INSERT INTO dw.stage_{stage} WITH step AS (SELECT {select_list} FROM {source}) SELECT {select_list} FROM step;"
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn policy(include: bool) -> DisplayPolicy {
    DisplayPolicy {
        include_intermediate_tables: include,
        filter_physical_only: true,
    }
}

/// Benchmark: long chains (10, 50, 100 statements)
fn bench_chain_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_length");
    let extractor = SqlLineageExtractor::default();

    for num_stages in [10, 50, 100].iter() {
        let script = generate_chain_script(*num_stages, 10);

        group.bench_with_input(BenchmarkId::from_parameter(num_stages), num_stages, |b, _| {
            b.iter(|| {
                let builder = LineageGraphBuilder::new(&extractor).policy(policy(true));
                black_box(builder.build(&script))
            });
        });
    }

    group.finish();
}

/// Benchmark: collapsing every intermediate forces edge tracing through
/// the whole chain
fn bench_collapsed_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("collapsed_chain");
    let extractor = SqlLineageExtractor::default();

    for num_stages in [10, 50].iter() {
        let script = generate_chain_script(*num_stages, 20);

        group.bench_with_input(BenchmarkId::from_parameter(num_stages), num_stages, |b, _| {
            b.iter(|| {
                let builder = LineageGraphBuilder::new(&extractor).policy(policy(false));
                black_box(builder.build(&script))
            });
        });
    }

    group.finish();
}

/// Benchmark: wide tables (50, 200 columns)
fn bench_wide_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_tables");
    let extractor = SqlLineageExtractor::default();

    for num_columns in [50, 200].iter() {
        let script = generate_chain_script(5, *num_columns);

        group.bench_with_input(BenchmarkId::from_parameter(num_columns), num_columns, |b, _| {
            b.iter(|| {
                let builder = LineageGraphBuilder::new(&extractor);
                black_box(builder.build(&script))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_chain_length, bench_collapsed_chain, bench_wide_tables);
criterion_main!(benches);

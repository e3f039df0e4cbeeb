//! Criterion benchmarks for placeholder rewriting and the Julian day codec.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sql_dblib::codec::julian::{julianday_to_timestamp, timestamp_to_julianday};
use sql_dblib::postgres::PgActions;
use sql_dblib::prelude::*;

const SHORT: &str = "select name from person where id = :id";
const LONG: &str = "insert into orders({if_seq id,} customer, placed, total, note) \
    values({next orders_seq,} :customer, ?2, :total, 'literal with ?1 and :x') -- :ignored\n\
    /* :also ignored */ returning id";

fn bench_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocess");
    for (label, sql) in [("short", SHORT), ("long", LONG)] {
        group.throughput(Throughput::Bytes(sql.len() as u64));
        group.bench_with_input(BenchmarkId::new("postgres", label), sql, |b, sql| {
            b.iter(|| preprocess(black_box(sql), false, true, &PgActions));
        });
        group.bench_with_input(BenchmarkId::new("pass_through", label), sql, |b, sql| {
            b.iter(|| preprocess(black_box(sql), true, true, &PgActions));
        });
    }
    group.finish();
}

fn bench_julian(c: &mut Criterion) {
    let ts = Timestamp::new(Date::new(2020, 1, 5), Time::new(13, 14, 15, 16));
    c.bench_function("julian_round_trip", |b| {
        b.iter(|| julianday_to_timestamp(timestamp_to_julianday(black_box(&ts))));
    });
}

criterion_group!(benches, bench_preprocess, bench_julian);
criterion_main!(benches);

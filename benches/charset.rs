use std::hint::black_box;

use cg_portal::charset::CharsetBridge;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const SAMPLE: &str = "剑士一号 player_01 王宫骑士 Lv99 ";

fn bench_to_legacy(c: &mut Criterion) {
    let bridge = CharsetBridge::gbk();
    let mut group = c.benchmark_group("charset");
    for repeat in [1usize, 16, 256] {
        let text = SAMPLE.repeat(repeat);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("to_legacy", repeat), &text, |b, text| {
            b.iter(|| black_box(bridge.to_legacy(text)));
        });
    }
    group.finish();
}

fn bench_to_unicode(c: &mut Criterion) {
    let bridge = CharsetBridge::gbk();
    let mut group = c.benchmark_group("charset");
    for repeat in [1usize, 16, 256] {
        let bytes = bridge.to_legacy(&SAMPLE.repeat(repeat)).into_inner();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("to_unicode", repeat), &bytes, |b, bytes| {
            b.iter(|| black_box(bridge.to_unicode(bytes)));
        });
    }
    group.finish();
}

fn bench_fallback(c: &mut Criterion) {
    let bridge = CharsetBridge::gbk();
    // Lone lead bytes: never valid GBK, never valid UTF-8.
    let garbage: Vec<u8> = std::iter::repeat([0x81u8, 0x20]).take(256).flatten().collect();
    c.bench_function("charset/to_unicode_fallback", |b| {
        b.iter(|| black_box(bridge.to_unicode(&garbage)));
    });
}

criterion_group!(charset_benches, bench_to_legacy, bench_to_unicode, bench_fallback);
criterion_main!(charset_benches);

extern crate criterion;
extern crate vis;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fs;
use vis::{decode::Decoder, encode::Encoder, VisStatus};

fn sample(name: &str) -> Vec<u8> {
    match name {
        "text" => fs::read("Cargo.toml").expect("Benchmark input not found"),
        "binary" => (0..1 << 16).map(|i: u32| (i * 31 % 251) as u8).collect(),
        _ => unreachable!("unknown sample"),
    }
}

pub fn encode_benchmark(c: &mut Criterion, name: &str) {
    let data = sample(name);
    let mut group = c.benchmark_group("encode");
    let id = BenchmarkId::new(name, data.len());
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_with_input(id, &data, |b, data| {
        b.iter(|| {
            let mut encoder = Encoder::new();
            encoder.finish();
            let mut outbuf = vec![0; 1 << 12];
            let mut data = data.as_slice();
            loop {
                let result = encoder.encode_bytes(data, &mut outbuf[..]);
                let done = result.status.expect("Error");
                data = &data[result.consumed_in..];
                black_box(&outbuf[..result.consumed_out]);
                if let VisStatus::Done = done {
                    break;
                }
            }
        })
    });
}

pub fn decode_benchmark(c: &mut Criterion, name: &str) {
    let data = vis::encode(&sample(name)).into_bytes();
    let mut group = c.benchmark_group("decode");
    let id = BenchmarkId::new(name, data.len());
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_with_input(id, &data, |b, data| {
        b.iter(|| {
            let mut decoder = Decoder::new();
            decoder.finish();
            let mut outbuf = vec![0; 1 << 12];
            let mut data = data.as_slice();
            loop {
                let result = decoder.decode_bytes(data, &mut outbuf[..]);
                let done = result.status.expect("Error");
                data = &data[result.consumed_in..];
                black_box(&outbuf[..result.consumed_out]);
                if let VisStatus::Done = done {
                    break;
                }
            }
        })
    });
}

pub fn bench_text(c: &mut Criterion) {
    encode_benchmark(c, "text");
    decode_benchmark(c, "text");
}

pub fn bench_binary(c: &mut Criterion) {
    encode_benchmark(c, "binary");
    decode_benchmark(c, "binary");
}

criterion_group!(benches, bench_text, bench_binary);
criterion_main!(benches);

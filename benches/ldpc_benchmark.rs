//! Performance benchmarks for the (208,160) LDPC FEC path.
//!
//! Measures parity computation, clean-frame syndrome checking, and the
//! bit-flipping decoder's cost under a range of injected bit-error counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ogn_rf_core::constants::PACKET_LEN;
use ogn_rf_core::ldpc::{check, compute_fec, LdpcDecoder};
use std::time::Duration;

fn sample_payload() -> [u8; 20] {
    let mut payload = [0u8; 20];
    for (i, byte) in payload.iter_mut().enumerate() {
        *byte = (i as u8).wrapping_mul(37).wrapping_add(11);
    }
    payload
}

fn sample_frame() -> [u8; PACKET_LEN] {
    let payload = sample_payload();
    let fec = compute_fec(&payload);
    let mut frame = [0u8; PACKET_LEN];
    frame[..20].copy_from_slice(&payload);
    frame[20..].copy_from_slice(&fec);
    frame
}

fn corrupt(frame: &[u8; PACKET_LEN], bit_errors: usize) -> [u8; PACKET_LEN] {
    let mut corrupted = *frame;
    for i in 0..bit_errors {
        let bit = i * 31 % (PACKET_LEN * 8);
        corrupted[bit / 8] ^= 1 << (bit % 8);
    }
    corrupted
}

fn bench_compute_fec(c: &mut Criterion) {
    let payload = sample_payload();
    c.bench_function("compute_fec", |b| {
        b.iter(|| compute_fec(black_box(&payload)))
    });
}

fn bench_check_clean_frame(c: &mut Criterion) {
    let frame = sample_frame();
    c.bench_function("check_clean_frame", |b| {
        b.iter(|| check(black_box(&frame)))
    });
}

fn bench_decode_by_error_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("ldpc_decode");
    group.measurement_time(Duration::from_secs(5));

    let frame = sample_frame();
    let err_mask = [0u8; PACKET_LEN];

    for bit_errors in &[0usize, 1, 4, 8, 16] {
        let corrupted = corrupt(&frame, *bit_errors);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(bit_errors),
            &corrupted,
            |b, corrupted| {
                b.iter(|| {
                    let mut decoder = LdpcDecoder::new();
                    decoder.input(black_box(corrupted), black_box(&err_mask));
                    let remaining = decoder.decode();
                    let mut out = [0u8; PACKET_LEN];
                    decoder.output(&mut out);
                    black_box((remaining, out))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compute_fec,
    bench_check_clean_frame,
    bench_decode_by_error_count
);
criterion_main!(benches);

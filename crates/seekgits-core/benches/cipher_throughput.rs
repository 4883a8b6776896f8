use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use seekgits_core::FileKey;
use seekgits_core::cipher::{decrypt, encrypt};

fn generate_plaintext(size: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; size];
    rng.fill_bytes(&mut data);
    data
}

/// Benchmark encrypt/decrypt across a range of plaintext sizes. Nonce
/// derivation hashes the whole plaintext before a single ciphertext byte
/// is produced, so throughput is the interesting number here, not latency
/// at any one size.
fn bench_cipher_sizes(c: &mut Criterion) {
    let key = FileKey::from_bytes([0x42; 64]);
    let sizes: &[(&str, usize)] = &[
        ("1kb", 1024),
        ("64kb", 64 * 1024),
        ("1mb", 1024 * 1024),
        ("8mb", 8 * 1024 * 1024),
    ];

    let mut group = c.benchmark_group("encrypt");
    for (label, size) in sizes {
        let plaintext = generate_plaintext(*size, 7);
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &plaintext, |b, plaintext| {
            b.iter(|| black_box(encrypt(black_box(plaintext), black_box(&key))));
        });
    }
    group.finish();

    let mut group = c.benchmark_group("decrypt");
    for (label, size) in sizes {
        let plaintext = generate_plaintext(*size, 7);
        let frame = encrypt(&plaintext, &key);
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &frame, |b, frame| {
            b.iter(|| black_box(decrypt(black_box(frame), black_box(&key)).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cipher_sizes);
criterion_main!(benches);

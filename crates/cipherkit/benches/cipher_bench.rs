//! Performance benchmarks for cipherkit.
//!
//! Run with: `cargo bench -p cipherkit`

use cipherkit::{CipherDescriptor, constant_time};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::RngCore;

const SIZES: [usize; 5] = [64, 1024, 4096, 16384, 65536];

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

// ============================================================================
// Session Benchmarks
// ============================================================================

fn bench_encrypt(c: &mut Criterion) {
    for name in ["AES-128-CBC", "AES-256-CBC", "AES-128-CTR", "AES-256-CFB", "AES-256-GCM"] {
        let cipher = CipherDescriptor::resolve(name).unwrap();
        let key = random_bytes(cipher.key_len());
        let iv = random_bytes(cipher.iv_len());

        let mut group = c.benchmark_group(format!("encrypt/{name}"));
        for size in SIZES {
            let plaintext = vec![0xAA; size];
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
                b.iter(|| {
                    let mut session = cipher.encryptor(&key, &iv).unwrap();
                    let mut out = session.update(black_box(&plaintext)).unwrap();
                    out.extend(session.finalize().unwrap());
                    out
                })
            });
        }
        group.finish();
    }
}

fn bench_gcm_decrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("gcm_decrypt");
    let gcm = CipherDescriptor::aes_256_gcm();
    let key = random_bytes(32);
    let nonce = random_bytes(12);
    let aad = b"additional data";

    for size in SIZES {
        let plaintext = vec![0xAA; size];
        let (ciphertext, tag) = gcm
            .quick_authenticated_encrypt(&key, &nonce, &plaintext, Some(aad.as_slice()), 16)
            .unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                gcm.quick_authenticated_decrypt(
                    &key,
                    &nonce,
                    black_box(&ciphertext),
                    &tag,
                    Some(aad.as_slice()),
                )
            })
        });
    }

    group.finish();
}

fn bench_chunked_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunked_update");
    let cbc = CipherDescriptor::resolve("AES-128-CBC").unwrap();
    let key = random_bytes(16);
    let iv = random_bytes(16);
    let data = vec![0x5A; 65536];
    group.throughput(Throughput::Bytes(data.len() as u64));

    // Odd chunk sizes exercise the partial-block buffer
    for chunk in [1, 15, 17, 1500] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let mut session = cbc.encryptor(&key, &iv).unwrap();
                let mut produced = 0;
                for piece in data.chunks(chunk) {
                    produced += session.update(black_box(piece)).unwrap().len();
                }
                produced + session.finalize().unwrap().len()
            })
        });
    }

    group.finish();
}

fn bench_begin(c: &mut Criterion) {
    let gcm = CipherDescriptor::aes_128_gcm();
    let key = [0x42u8; 16];
    let nonce = [0x24u8; 12];
    c.bench_function("begin/AES-128-GCM", |b| {
        b.iter(|| gcm.encryptor(black_box(&key), black_box(&nonce)).unwrap())
    });

    c.bench_function("resolve", |b| {
        b.iter(|| CipherDescriptor::resolve(black_box("aes-256-ctr")).unwrap())
    });
}

// ============================================================================
// Constant-time Benchmarks
// ============================================================================

fn bench_constant_time_ops(c: &mut Criterion) {
    let a = [0x42u8; 16];
    let b = [0x42u8; 16];
    c.bench_function("ct_eq_16", |bench| {
        bench.iter(|| constant_time::ct_eq(black_box(&a), black_box(&b)))
    });

    let mut block = [0xAAu8; 16];
    block[12..].fill(4);
    c.bench_function("pkcs7_unpadded_len", |bench| {
        bench.iter(|| constant_time::pkcs7_unpadded_len(black_box(&block)))
    });
}

criterion_group!(
    session_benches,
    bench_encrypt,
    bench_gcm_decrypt,
    bench_chunked_update,
    bench_begin,
);

criterion_group!(constant_time_benches, bench_constant_time_ops,);

criterion_main!(session_benches, constant_time_benches);

use callzip::synthesize;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};

fn bench(c: &mut Criterion) {
    let mut g = c.benchmark_group("synthesize");
    for (name, data) in shapes() {
        g.throughput(Throughput::Bytes(data.len() as u64));
        g.bench_function(name, |b| b.iter(|| synthesize(&data)));
    }
    g.finish();
}

fn shapes() -> Vec<(&'static str, Vec<u8>)> {
    let mut abi = vec![0x25, 0x2d, 0xba, 0x42];
    for i in 0..60u8 {
        let mut word = [0u8; 32];
        word[31] = i % 8;
        word[12..32 - 8].copy_from_slice(&[0x11; 12]);
        abi.extend_from_slice(&word);
    }

    let mut repeated = vec![0xa9, 0x05, 0x9c, 0xbb];
    let word: Vec<u8> = (1..=32).collect();
    for _ in 0..60 {
        repeated.extend_from_slice(&word);
    }

    let mut x = 0x2545f491u32;
    let dense: Vec<u8> = (0..2048)
        .map(|_| {
            x = x.wrapping_mul(1664525).wrapping_add(1013904223);
            (x >> 24) as u8
        })
        .collect();

    vec![
        ("zeros", vec![0u8; 2048]),
        ("abi_words", abi),
        ("repeated_words", repeated),
        ("dense", dense),
    ]
}

criterion_group!(benches, bench);
criterion_main!(benches);

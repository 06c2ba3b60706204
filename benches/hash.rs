use argon2kdf::{Argon2, Variant};
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_variants(c: &mut Criterion) {
    let cases = [("argon2d", Variant::Argon2d),
                 ("argon2i", Variant::Argon2i),
                 ("argon2id", Variant::Argon2id),
                 ("argon2ds", Variant::Argon2ds)];

    for &(name, variant) in cases.iter() {
        let a2 = Argon2::new(3, 1, 4096, variant).unwrap();
        c.bench_function(name, |b| {
            let mut out = [0u8; 32];
            b.iter(|| {
                a2.hash(&mut out, b"password", b"somesaltsomesalt", &[], &[])
            });
        });
    }
}

fn bench_parallel(c: &mut Criterion) {
    for &lanes in &[1u32, 4] {
        let a2 = Argon2::new(3, lanes, 4096, Variant::Argon2id).unwrap();
        c.bench_function(&format!("argon2id_lanes_{}", lanes), |b| {
            let mut out = [0u8; 32];
            b.iter(|| {
                a2.hash(&mut out, b"password", b"somesaltsomesalt", &[], &[])
            });
        });
    }
}

criterion_group!(benches, bench_variants, bench_parallel);
criterion_main!(benches);

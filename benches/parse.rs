use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rxnpredict::reaction::from_reaction_smarts;
use rxnpredict::smarts::from_smarts;
use rxnpredict::smiles::{from_smiles, to_canonical_smiles};

const BENZENE: &str = "c1ccccc1";
const ASPIRIN: &str = "CC(=O)Oc1ccccc1C(=O)O";
const IBUPROFEN: &str = "CC(C)Cc1ccc(cc1)C(C)C(=O)O";
const CHOLESTANE: &str = "CC(C)CCCC(C)C1CCC2C1(CCC3C2CCC4C3(CCCC4)C)C";

fn bench_smiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("smiles");

    for (name, smiles) in [
        ("benzene", BENZENE),
        ("aspirin", ASPIRIN),
        ("ibuprofen", IBUPROFEN),
        ("cholestane", CHOLESTANE),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| black_box(from_smiles(black_box(smiles)).unwrap()))
        });
    }

    group.finish();
}

fn bench_canonical(c: &mut Criterion) {
    let aspirin = from_smiles(ASPIRIN).unwrap();
    let cholestane = from_smiles(CHOLESTANE).unwrap();

    let mut group = c.benchmark_group("canonical");

    group.bench_function("aspirin", |b| {
        b.iter(|| black_box(to_canonical_smiles(black_box(&aspirin))))
    });
    group.bench_function("cholestane", |b| {
        b.iter(|| black_box(to_canonical_smiles(black_box(&cholestane))))
    });

    group.finish();
}

fn bench_smarts(c: &mut Criterion) {
    let mut group = c.benchmark_group("smarts");

    group.bench_function("recursive", |b| {
        b.iter(|| black_box(from_smarts(black_box("[C;$(C(=O)[OH]),$(C#N)]-[!#1;R2]")).unwrap()))
    });
    group.bench_function("claisen_template", |b| {
        b.iter(|| {
            black_box(
                from_reaction_smarts(black_box(
                    "[C:1](=O)O[C:2].[C:3](=O)O[C:4]>>[C:1](=O)C[C:3](=O)[C:4]",
                ))
                .unwrap(),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_smiles, bench_canonical, bench_smarts);
criterion_main!(benches);

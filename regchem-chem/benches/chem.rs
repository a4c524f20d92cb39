use criterion::{black_box, criterion_group, criterion_main, Criterion};
use regchem_chem::{canonical_smiles, fragments, parse_smiles, replace_core, QueryPattern};

/// Representative structures, including salts and hydrates.
const SMILES_SET: &[&str] = &[
    "CCO",                                  // ethanol
    "CC(=O)O",                              // acetic acid
    "c1ccccc1",                             // benzene
    "CC(=O)Oc1ccccc1C(=O)O",                // aspirin
    "CC12CCC3C(C1CCC2O)CCC4=CC(=O)CCC34C",  // testosterone
    "CN1C=NC2=C1C(=O)N(C(=O)N2C)C",         // caffeine
    "CC(C)CC1=CC=C(C=C1)C(C)C(=O)O",        // ibuprofen
    "C[C@H](N)Cc1ccccc1",                   // amphetamine
    "CN[C@@H](C)Cc1ccccc1.Cl",              // methamphetamine hydrochloride
    "CC(=O)[O-].[Na+]",                     // sodium acetate
    "O.O.[Cu+2].[O-]S(=O)(=O)[O-]",         // copper sulfate hydrate
    "c1ccc2ccccc2c1",                       // naphthalene
    "F/C=C/F",                              // trans-difluoroethene
    "c1cc[nH]c1",                           // pyrrole
    "C1=CSC=C1",                            // thiophene
];

fn bench_smiles_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("smiles_parse");
    let smiles_1k: Vec<&str> = SMILES_SET.iter().copied().cycle().take(1000).collect();

    group.bench_function("1k_mols", |b| {
        b.iter(|| {
            for &smi in black_box(&smiles_1k) {
                let _ = parse_smiles(smi);
            }
        })
    });

    group.finish();
}

fn bench_canonical(c: &mut Criterion) {
    let mols: Vec<_> = SMILES_SET.iter().filter_map(|s| parse_smiles(s).ok()).collect();

    c.bench_function("canonical_smiles_set", |b| {
        b.iter(|| {
            for mol in black_box(&mols) {
                let _ = canonical_smiles(mol);
            }
        })
    });
}

fn bench_substructure(c: &mut Criterion) {
    let mut group = c.benchmark_group("substructure");
    let core = QueryPattern::from_molecule(&parse_smiles("NC(C)Cc1ccccc1").unwrap());
    let targets: Vec<_> = SMILES_SET
        .iter()
        .filter_map(|s| parse_smiles(s).ok())
        .flat_map(|m| fragments(&m))
        .collect();

    group.bench_function("matches", |b| {
        b.iter(|| {
            for t in black_box(&targets) {
                let _ = core.matches(t);
            }
        })
    });

    group.bench_function("replace_core", |b| {
        b.iter(|| {
            for t in black_box(&targets) {
                let _ = replace_core(t, &core);
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_smiles_parse, bench_canonical, bench_substructure);
criterion_main!(benches);

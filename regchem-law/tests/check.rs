//! End-to-end checks from law table files to labeled hits.

use std::path::Path;

use proptest::prelude::*;
use regchem_law::{format_report, CheckOutcome, Checker, CheckerConfig, LawSource, RegulationDatabase};
use tracing_subscriber::EnvFilter;

/// Route log output through the test harness. Filter with `REGCHEM_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("REGCHEM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
}

fn write_table(dir: &Path, file: &str, json: &str) -> LawSource {
    let path = dir.join(file);
    std::fs::write(&path, json).unwrap();
    LawSource::new(path, file.trim_end_matches(".json"))
}

fn checker_for(json: &str) -> Checker {
    Checker::new(&RegulationDatabase::from_tables(&[("Test Act", json)]).unwrap())
}

fn labels(checker: &Checker, smiles: &str) -> Vec<String> {
    checker.check(smiles).into_iter().map(|h| h.detected_type).collect()
}

#[test]
fn exact_match_with_itself_scope() {
    let checker = checker_for(r#"{"CCO": {"name": "Ethanol", "scope": ["itself"]}}"#);
    let hits = checker.check("CCO");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].detected_type, "itself (exact match)");
    assert_eq!(hits[0].name, "Ethanol");
}

#[test]
fn long_side_chain_is_organic_compound() {
    let checker = checker_for(r#"{"CCO": {"scope": ["compounds", "organic_compounds"]}}"#);
    assert_eq!(labels(&checker, "CCOCCCC"), vec!["organic compound"]);
}

#[test]
fn sodium_salt_gets_salt_suffix() {
    let checker = checker_for(r#"{"CC(=O)[O-]": {"name": "Acetate", "scope": ["salts"]}}"#);
    let got = labels(&checker, "CC(=O)[O-].[Na+]");
    assert_eq!(got.len(), 1);
    assert!(got[0].contains("salt"));
    assert_eq!(got[0], "itself (exact match) of salt");
}

#[test]
fn unrelated_fragments_attributed_separately() {
    let checker = checker_for(
        r#"{
            "NC(C)Cc1ccccc1": {"name": "Amphetamine", "scope": ["itself"]},
            "ClC(Cl)Cl": {"name": "Chloroform", "scope": ["itself"]}
        }"#,
    );
    let hits = checker.check("ClC(Cl)Cl.CC(N)Cc1ccccc1");
    let pairs: Vec<(&str, &str)> = hits
        .iter()
        .map(|h| (h.name.as_str(), h.pattern_matched.as_str()))
        .collect();
    assert_eq!(pairs, vec![("Chloroform", "ClC(Cl)Cl"), ("Amphetamine", "NC(C)Cc1ccccc1")]);
}

#[test]
fn check_is_idempotent() {
    let checker = checker_for(
        r#"{"CNC(C)Cc1ccccc1": {"scope": ["itself", "salts", "hydrates"]}, "c1ccccc1": {"scope": ["compounds"]}}"#,
    );
    let input = "CN[C@@H](C)Cc1ccccc1.Cl.O";
    let first = checker.check(input);
    assert!(!first.is_empty());
    assert_eq!(first, checker.check(input));
}

#[test]
fn unrelated_law_does_not_change_results() {
    init_tracing();
    let base = r#"{"CCO": {"scope": ["itself"]}, "c1ccncc1": {"scope": ["compounds"]}}"#;
    let extra = r#"{"FC(F)(F)Br": {"scope": ["itself"]}}"#;
    let before = Checker::new(&RegulationDatabase::from_tables(&[("A", base)]).unwrap());
    let after = Checker::new(&RegulationDatabase::from_tables(&[("A", base), ("B", extra)]).unwrap());
    for smiles in ["CCO", "OCC.O", "Cc1ccncc1", "CCCC", "not smiles"] {
        assert_eq!(before.check(smiles), after.check(smiles), "input {smiles}");
    }
}

#[test]
fn hydrate_suffix_depends_on_scope() {
    let with = checker_for(r#"{"CNC(C)Cc1ccccc1": {"scope": ["itself", "hydrates"]}}"#);
    assert_eq!(labels(&with, "CNC(C)Cc1ccccc1.O"), vec!["itself (exact match) of hydrate"]);

    let without = checker_for(r#"{"CNC(C)Cc1ccccc1": {"scope": ["itself"]}}"#);
    assert_eq!(
        labels(&without, "CNC(C)Cc1ccccc1.O"),
        vec!["itself (exact match) of hydrate (possibly in scope)"]
    );

    let salts = checker_for(r#"{"CNC(C)Cc1ccccc1": {"scope": ["salts"]}}"#);
    assert_eq!(labels(&salts, "CNC(C)Cc1ccccc1.O.Cl"), vec!["itself (exact match) of salt (hydrate)/salt"]);
}

#[test]
fn side_chain_carbon_boundary() {
    let checker = checker_for(r#"{"Oc1ccccc1": {"scope": ["compounds"]}}"#);
    assert_eq!(labels(&checker, "CC(=O)Oc1ccccc1"), vec!["compound (inorganic compound)"]);
    assert_eq!(labels(&checker, "CCC(=O)Oc1ccccc1"), vec!["compound (organic compound)"]);
}

#[test]
fn identity_outside_scope_is_annotated() {
    let checker = checker_for(r#"{"CNC(C)Cc1ccccc1": {"scope": ["salts"]}}"#);
    assert_eq!(
        labels(&checker, "CNC(C)Cc1ccccc1"),
        vec!["itself (exact match) (possibly out of legal scope: law may regulate only compounds/salts/hydrates)"]
    );
    assert_eq!(labels(&checker, "CNC(C)Cc1ccccc1.Cl"), vec!["itself (exact match) of salt"]);
}

#[test]
fn derivative_and_overlap() {
    let checker = checker_for(
        r#"{"OC(=O)c1ccccc1": {"name": "Benzoic acid", "scope": ["esters"]}, "c1ccccc1": {"name": "Benzene", "scope": ["itself"]}}"#,
    );
    let got = labels(&checker, "COC(=O)c1ccccc1");
    assert_eq!(got.len(), 2);
    assert_eq!(got[0], "derivative (ester/ether-type)");
    assert!(got[1].starts_with("structural overlap (may be a regulated substance"));
}

#[test]
fn same_pattern_under_two_laws() {
    let db = RegulationDatabase::from_tables(&[
        ("Stimulants Control Act", r#"{"CNC(C)Cc1ccccc1": {"name": "Methamphetamine", "scope": ["itself"]}}"#),
        ("Narcotics Act", r#"{"CNC(C)Cc1ccccc1": {"name": "Methamphetamine", "scope": ["isomers"]}}"#),
    ])
    .unwrap();
    let hits = Checker::new(&db).check("CNC(C)Cc1ccccc1");
    let laws: Vec<&str> = hits.iter().map(|h| h.law.as_str()).collect();
    assert_eq!(laws, vec!["Stimulants Control Act", "Narcotics Act"]);
}

#[test]
fn checker_from_config_files() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let stimulants = write_table(
        dir.path(),
        "stimulants.json",
        r#"{"CNC(C)Cc1ccccc1": {"name": "Methamphetamine", "scope": ["itself", "salts"], "description": "N,alpha-dimethylphenethylamine"}}"#,
    );
    let broken = write_table(dir.path(), "broken.json", "{ oops");
    let missing = LawSource::new(dir.path().join("missing.json"), "missing");

    let checker = Checker::from_config(&CheckerConfig::with_sources(vec![missing, broken, stimulants]));
    assert_eq!(checker.regulations().len(), 1);

    let hits = checker.check("CN[C@@H](C)Cc1ccccc1.Cl");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].law, "stimulants");
    assert_eq!(hits[0].detected_type, "isomer of salt");

    let report = format_report(&hits);
    assert!(report.contains("Methamphetamine"));
    assert!(report.contains("N,alpha-dimethylphenethylamine"));
}

#[test]
fn shared_checker_across_threads() {
    let checker = std::sync::Arc::new(checker_for(r#"{"CCO": {"scope": ["itself"]}}"#));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let checker = std::sync::Arc::clone(&checker);
            std::thread::spawn(move || checker.check("OCC").len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }
}

#[test]
fn over_valent_input_is_unparsable() {
    let checker = checker_for(r#"{"CC": {"scope": ["compounds"]}, "c1ccccc1": {"scope": ["compounds"]}}"#);
    for smiles in ["CC(C)(C)(C)(C)C", "C=C=C=C(=C)C", "FC(F)(F)(F)F", "CN(C)(C)(C)C", "c1cccc1"] {
        assert!(checker.check(smiles).is_empty(), "input {smiles}");
        assert!(
            matches!(checker.check_detailed(smiles), CheckOutcome::Unparsable { .. }),
            "input {smiles}"
        );
    }
    assert!(!checker.check("CC(C)(C)C").is_empty());
}

#[test]
fn crowded_aromatic_atom_is_unparsable() {
    let checker = checker_for(r#"{"CC": {"scope": ["compounds"]}}"#);
    let smiles = format!("c{}", "(C)".repeat(255));
    assert!(checker.check(&smiles).is_empty());
    assert!(matches!(checker.check_detailed(&smiles), CheckOutcome::Unparsable { .. }));
}

#[test]
fn explicit_hydrogens_keep_identity() {
    let checker = checker_for(r#"{"CCO": {"name": "Ethanol", "scope": ["itself"]}}"#);
    for smiles in ["CCO", "[H]OCC", "C([H])([H])([H])CO"] {
        assert_eq!(labels(&checker, smiles), vec!["itself (exact match)"], "input {smiles}");
    }
    let salts = checker_for(r#"{"CCO": {"scope": ["itself", "salts"]}}"#);
    assert_eq!(labels(&salts, "[H]OCC.[Na+]"), vec!["itself (exact match) of salt"]);
}

#[test]
fn no_laws_no_hits() {
    let checker = Checker::new(&RegulationDatabase::new());
    assert!(checker.check("CCO").is_empty());
    assert!(format_report(&[]).contains("no characteristic regulated structure found"));
}

proptest! {
    #[test]
    fn arbitrary_input_never_panics(s in "\\PC{0,40}") {
        let checker = checker_for(r#"{"CCO": {"scope": ["itself", "salts", "compounds"]}}"#);
        match checker.check_detailed(&s) {
            CheckOutcome::Unparsable { reason } => prop_assert!(!reason.is_empty()),
            CheckOutcome::Parsed { truncated, .. } => prop_assert!(!truncated),
        }
    }

    #[test]
    fn fragment_order_does_not_change_hit_set(n in 1usize..4) {
        let checker = checker_for(r#"{"CCO": {"scope": ["itself", "salts"]}}"#);
        let salts = vec!["[Na+]"; n].join(".");
        let a = checker.check(&format!("CCO.{salts}"));
        let b = checker.check(&format!("{salts}.CCO"));
        prop_assert_eq!(a, b);
    }
}

//! Compile law table patterns and the fixed exception sets into queries.

use std::sync::Arc;

use tracing::{debug, warn};

use regchem_chem::{parse_smarts, parse_smiles, Molecule, QueryPattern};

use crate::database::{RegulationDatabase, RegulationRecord};

/// Side chains with one or two carbons that still count as inorganic:
/// acetyl, formyl, carbonate ester, cyano, carbon disulfide.
pub const SIDE_CHAIN_EXCEPTIONS: &[&str] = &["CC(=O)*", "[CH1](=O)*", "OC(=O)*", "N#C*", "S=C=S"];

/// Counter-ions with one or two carbons that still count as inorganic:
/// acetate, formate, carbonate, cyanide, carbon disulfide.
pub const SALT_EXCEPTIONS: &[&str] = &[
    "CC(=O)[O-,OH]",
    "[CH1](=O)[O-,OH]",
    "C(=O)([O-,OH])[O-,OH]",
    "C#N",
    "[C-]#[N+]",
    "S=C=S",
];

/// One law's attribution of a compiled pattern. Records of the same pattern
/// share one query.
#[derive(Debug, Clone)]
pub struct CompiledRegulation {
    pub pattern_smiles: String,
    pub query: Arc<QueryPattern>,
    pub record: RegulationRecord,
}

/// Compile every database entry, flattened to one item per record in
/// registration order. Entries whose pattern does not parse are dropped.
pub fn compile(db: &RegulationDatabase) -> Vec<CompiledRegulation> {
    let mut compiled = Vec::with_capacity(db.record_count());
    for (pattern, records) in db.iter() {
        let query = match parse_smiles(pattern) {
            Ok(mol) => Arc::new(QueryPattern::from_molecule(&mol)),
            Err(e) => {
                let name = records.first().map_or("Unknown", |r| r.name.as_str());
                warn!(name, pattern, error = %e, "invalid pattern SMILES, skipping entry");
                continue;
            }
        };
        compiled.extend(records.iter().map(|record| CompiledRegulation {
            pattern_smiles: pattern.to_string(),
            query: Arc::clone(&query),
            record: record.clone(),
        }));
    }
    debug!(patterns = db.len(), compiled = compiled.len(), "compiled regulation patterns");
    compiled
}

/// Small carbon-containing groups treated as inorganic.
#[derive(Debug, Clone)]
pub struct ExceptionSet {
    patterns: Vec<QueryPattern>,
}

impl ExceptionSet {
    /// Compile SMARTS patterns; any that fail to parse are logged and left out.
    pub fn compile(smarts: &[&str]) -> Self {
        let patterns = smarts
            .iter()
            .filter_map(|s| match parse_smarts(s) {
                Ok(q) => Some(q),
                Err(e) => {
                    warn!(smarts = *s, error = %e, "invalid exception pattern");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn side_chain() -> Self {
        Self::compile(SIDE_CHAIN_EXCEPTIONS)
    }

    pub fn salt() -> Self {
        Self::compile(SALT_EXCEPTIONS)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `fragment` is essentially one of the exception groups: it
    /// contains the pattern and has at most one atom more.
    pub fn covers(&self, fragment: &Molecule) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches(fragment) && fragment.atom_count() <= p.atom_count() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mol(smiles: &str) -> Molecule {
        parse_smiles(smiles).unwrap()
    }

    #[test]
    fn builtin_sets_compile_fully() {
        assert_eq!(ExceptionSet::side_chain().len(), SIDE_CHAIN_EXCEPTIONS.len());
        assert_eq!(ExceptionSet::salt().len(), SALT_EXCEPTIONS.len());
    }

    #[test]
    fn bad_exception_pattern_left_out() {
        let set = ExceptionSet::compile(&["C(", "C#N"]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn side_chain_coverage() {
        let set = ExceptionSet::side_chain();
        assert!(set.covers(&mol("CC(=O)*")));
        assert!(set.covers(&mol("*C#N")));
        assert!(set.covers(&mol("S=C=S")));
        assert!(!set.covers(&mol("CC*")));
    }

    #[test]
    fn salt_coverage() {
        let set = ExceptionSet::salt();
        assert!(set.covers(&mol("CC(=O)[O-]")));
        assert!(set.covers(&mol("[O-]C(=O)[O-]")));
        assert!(set.covers(&mol("[C-]#N")));
        assert!(set.covers(&mol("OC=O")));
        assert!(!set.covers(&mol("CCO")));
    }

    #[test]
    fn size_tolerance_is_one_atom() {
        let set = ExceptionSet::compile(&["C#N"]);
        assert!(set.covers(&mol("CC#N")));
        assert!(!set.covers(&mol("CCC#N")));
    }

    #[test]
    fn compile_flattens_and_skips_bad_patterns() {
        let db = RegulationDatabase::from_tables(&[
            ("A", r#"{"CCO": {"name": "Ethanol", "scope": ["itself"]}, "C1CC": {"name": "Broken"}}"#),
            ("B", r#"{"CCO": {"name": "Ethanol", "scope": ["salts"]}, "CN": {}}"#),
        ])
        .unwrap();
        let compiled = compile(&db);
        let summary: Vec<(&str, &str)> = compiled
            .iter()
            .map(|c| (c.pattern_smiles.as_str(), c.record.law.as_str()))
            .collect();
        assert_eq!(summary, vec![("CCO", "A"), ("CCO", "B"), ("CN", "B")]);
        assert!(Arc::ptr_eq(&compiled[0].query, &compiled[1].query));
        assert_eq!(compiled[0].query.atom_count(), 3);
    }
}

//! Salt and hydrate detection from the fragments around a main fragment.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::Serialize;

use regchem_chem::{canonical_smiles, parse_smiles, Molecule};

use crate::compiler::ExceptionSet;
use crate::fragment::Fragment;

/// Spellings of water and hydronium recognised as water of hydration.
pub const WATER_FORMS: &[&str] = &["O", "[OH2]", "[OH2+]", "[OH3+]"];

/// Kind of counter-ion. Orders organic before inorganic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaltKind {
    Organic,
    Inorganic,
}

impl fmt::Display for SaltKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SaltKind::Organic => "organic salt",
            SaltKind::Inorganic => "inorganic salt",
        })
    }
}

/// Classify a counter-ion fragment by its carbon count, using the same
/// one-or-two carbon exception rule as side chains.
pub fn classify_salt(fragment: &Molecule, exceptions: &ExceptionSet) -> SaltKind {
    match fragment.carbon_count() {
        0 => SaltKind::Inorganic,
        1 | 2 if exceptions.covers(fragment) => SaltKind::Inorganic,
        _ => SaltKind::Organic,
    }
}

/// Rules for surveying co-fragments.
#[derive(Debug, Clone)]
pub struct SaltRules {
    water: HashSet<String>,
    exceptions: ExceptionSet,
}

impl SaltRules {
    pub fn new(exceptions: ExceptionSet) -> Self {
        let water = WATER_FORMS
            .iter()
            .filter_map(|s| parse_smiles(s).ok())
            .map(|m| canonical_smiles(&m))
            .collect();
        Self { water, exceptions }
    }

    pub fn is_water(&self, canonical: &str) -> bool {
        self.water.contains(canonical)
    }

    pub fn exceptions(&self) -> &ExceptionSet {
        &self.exceptions
    }
}

impl Default for SaltRules {
    fn default() -> Self {
        Self::new(ExceptionSet::salt())
    }
}

/// What surrounds one main fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaltEnvironment {
    pub has_hydrate: bool,
    pub salts: BTreeSet<SaltKind>,
}

impl SaltEnvironment {
    /// Survey the co-fragments of `main`. Only co-fragments with fewer atoms
    /// than `main` are considered; each is either water or a counter-ion.
    pub fn survey<'a, I>(main: &Fragment, others: I, rules: &SaltRules) -> Self
    where
        I: IntoIterator<Item = &'a Fragment>,
    {
        let mut env = SaltEnvironment::default();
        for other in others {
            if other.atom_count() >= main.atom_count() {
                continue;
            }
            if rules.is_water(&other.canonical) {
                env.has_hydrate = true;
            } else {
                env.salts.insert(classify_salt(&other.mol, &rules.exceptions));
            }
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(smiles: &str) -> Fragment {
        Fragment::new(parse_smiles(smiles).unwrap())
    }

    fn survey(main: &str, others: &[&str]) -> SaltEnvironment {
        let main = frag(main);
        let others: Vec<Fragment> = others.iter().map(|s| frag(s)).collect();
        SaltEnvironment::survey(&main, &others, &SaltRules::default())
    }

    #[test]
    fn water_forms_collapse() {
        let rules = SaltRules::default();
        assert!(rules.is_water("O"));
        assert!(rules.is_water(&frag("[OH3+]").canonical));
        assert!(rules.is_water(&frag("[OH2+]").canonical));
        assert!(!rules.is_water("CO"));
    }

    #[test]
    fn salt_kinds() {
        let ex = ExceptionSet::salt();
        let kind = |s: &str| classify_salt(&parse_smiles(s).unwrap(), &ex);
        assert_eq!(kind("[Na+]"), SaltKind::Inorganic);
        assert_eq!(kind("Cl"), SaltKind::Inorganic);
        assert_eq!(kind("CC(=O)[O-]"), SaltKind::Inorganic);
        assert_eq!(kind("[C-]#N"), SaltKind::Inorganic);
        assert_eq!(kind("CC[O-]"), SaltKind::Organic);
        assert_eq!(kind("OC(=O)C(O)C(O)C(=O)O"), SaltKind::Organic);
    }

    #[test]
    fn hydrochloride_hydrate() {
        let env = survey("CNC(C)Cc1ccccc1", &["Cl", "O"]);
        assert!(env.has_hydrate);
        assert_eq!(env.salts.iter().copied().collect::<Vec<_>>(), vec![SaltKind::Inorganic]);
    }

    #[test]
    fn kinds_ordered_organic_first() {
        let env = survey("CNC(C)Cc1ccccc1", &["[Na+]", "CCCC(=O)[O-]"]);
        assert_eq!(
            env.salts.iter().copied().collect::<Vec<_>>(),
            vec![SaltKind::Organic, SaltKind::Inorganic]
        );
    }

    #[test]
    fn larger_or_equal_fragments_ignored() {
        let env = survey("CCO", &["CCCCCC", "OCC", "O"]);
        assert!(env.has_hydrate);
        assert!(env.salts.is_empty());
        assert!(!survey("O", &["O"]).has_hydrate);
        assert_eq!(survey("CCO", &[]), SaltEnvironment::default());
    }
}

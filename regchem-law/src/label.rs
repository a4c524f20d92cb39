//! Classification labels and the decision table that builds them.

use std::fmt;

use crate::analyzer::CompoundKind;
use crate::salt::{SaltEnvironment, SaltKind};
use crate::scope::{ScopeFlag, ScopeSet};

const OUT_OF_SCOPE_NOTE: &str =
    " (possibly out of legal scope: law may regulate only compounds/salts/hydrates)";
const OVERLAP_NOTE: &str =
    " (may be a regulated substance or its isomer; verify against statute text; possible false positive)";

/// How the matched fragment relates to the regulated pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseLabel {
    /// Same atoms and same canonical SMILES.
    Exact,
    /// Same atom count, different canonical SMILES.
    Isomer,
    Derivative,
    OrganicCompound,
    InorganicCompound,
    /// A compound whose kind the law does not single out; `None` if the
    /// side chains could not be analyzed.
    Compound(Option<CompoundKind>),
    StructuralOverlap,
}

impl BaseLabel {
    pub fn is_identity(self) -> bool {
        matches!(self, BaseLabel::Exact | BaseLabel::Isomer)
    }
}

impl fmt::Display for BaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseLabel::Exact => f.write_str("itself (exact match)"),
            BaseLabel::Isomer => f.write_str("isomer"),
            BaseLabel::Derivative => f.write_str("derivative (ester/ether-type)"),
            BaseLabel::OrganicCompound => f.write_str("organic compound"),
            BaseLabel::InorganicCompound => f.write_str("inorganic compound"),
            BaseLabel::Compound(Some(kind)) => write!(f, "compound ({kind})"),
            BaseLabel::Compound(None) => f.write_str("compound (unclassified)"),
            BaseLabel::StructuralOverlap => f.write_str("structural overlap"),
        }
    }
}

/// Salt or hydrate qualifier appended to a base label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suffix {
    Hydrate,
    SaltHydrate,
    HydrateUnconfirmed,
    OrganicSalt,
    InorganicSalt,
    Salt,
    CompoundSalt(SaltKind),
}

impl fmt::Display for Suffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suffix::Hydrate => f.write_str("hydrate"),
            Suffix::SaltHydrate => f.write_str("salt (hydrate)"),
            Suffix::HydrateUnconfirmed => f.write_str("hydrate (possibly in scope)"),
            Suffix::OrganicSalt => f.write_str("organic salt"),
            Suffix::InorganicSalt => f.write_str("inorganic salt"),
            Suffix::Salt => f.write_str("salt"),
            Suffix::CompoundSalt(kind) => write!(f, "compound({kind})"),
        }
    }
}

/// A complete label for one (fragment, regulation) match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub base: BaseLabel,
    /// Identity match against a law whose scope names neither the substance
    /// nor its isomers.
    pub out_of_scope: bool,
    pub suffixes: Vec<Suffix>,
}

impl Classification {
    /// Label for a fragment with the same atom count as the pattern.
    pub fn identity(exact: bool, scope: ScopeSet) -> Self {
        Self {
            base: if exact { BaseLabel::Exact } else { BaseLabel::Isomer },
            out_of_scope: !scope.covers_identity(),
            suffixes: Vec::new(),
        }
    }

    /// Label for a fragment strictly larger than the pattern. `analyze` runs
    /// only when the scope covers compounds.
    pub fn partial<F>(scope: ScopeSet, analyze: F) -> Self
    where
        F: FnOnce() -> Option<CompoundKind>,
    {
        let base = if scope.covers_derivatives() {
            BaseLabel::Derivative
        } else if scope.covers_compounds() {
            match analyze() {
                Some(CompoundKind::Organic) if scope.contains(ScopeFlag::OrganicCompounds) => {
                    BaseLabel::OrganicCompound
                }
                Some(CompoundKind::Inorganic) if scope.contains(ScopeFlag::InorganicCompounds) => {
                    BaseLabel::InorganicCompound
                }
                kind => BaseLabel::Compound(kind),
            }
        } else {
            BaseLabel::StructuralOverlap
        };
        Self { base, out_of_scope: false, suffixes: Vec::new() }
    }

    /// Attach hydrate and salt suffixes for the fragment's surroundings.
    pub fn with_environment(mut self, env: &SaltEnvironment, scope: ScopeSet) -> Self {
        if env.has_hydrate {
            self.suffixes.push(if scope.contains(ScopeFlag::Hydrates) {
                Suffix::Hydrate
            } else if scope.contains(ScopeFlag::Salts) {
                Suffix::SaltHydrate
            } else {
                Suffix::HydrateUnconfirmed
            });
        }
        for &kind in &env.salts {
            let suffix = match kind {
                SaltKind::Inorganic if scope.contains(ScopeFlag::InorganicSalts) => Suffix::InorganicSalt,
                SaltKind::Organic if scope.contains(ScopeFlag::OrganicSalts) => Suffix::OrganicSalt,
                _ if scope.contains(ScopeFlag::Salts) => Suffix::Salt,
                _ if scope.contains(ScopeFlag::Compounds) => Suffix::CompoundSalt(kind),
                _ => continue,
            };
            self.suffixes.push(suffix);
        }
        self
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        if self.suffixes.is_empty() {
            if self.out_of_scope && self.base.is_identity() {
                f.write_str(OUT_OF_SCOPE_NOTE)?;
            }
        } else {
            f.write_str(" of ")?;
            for (i, suffix) in self.suffixes.iter().enumerate() {
                if i > 0 {
                    f.write_str("/")?;
                }
                write!(f, "{suffix}")?;
            }
        }
        if self.base == BaseLabel::StructuralOverlap {
            f.write_str(OVERLAP_NOTE)?;
        }
        Ok(())
    }
}

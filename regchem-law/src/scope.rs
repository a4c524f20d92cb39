//! Regulatory scope vocabulary.
//!
//! Each regulation lists which forms of a substance it covers (the
//! substance itself, its isomers, salts, hydrates, esters, compounds...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One form of a substance a regulation may cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeFlag {
    Itself,
    Isomers,
    SpecificIsomers,
    Salts,
    OrganicSalts,
    InorganicSalts,
    Hydrates,
    Esters,
    Ethers,
    Compounds,
    OrganicCompounds,
    InorganicCompounds,
}

impl ScopeFlag {
    pub const ALL: [ScopeFlag; 12] = [
        ScopeFlag::Itself,
        ScopeFlag::Isomers,
        ScopeFlag::SpecificIsomers,
        ScopeFlag::Salts,
        ScopeFlag::OrganicSalts,
        ScopeFlag::InorganicSalts,
        ScopeFlag::Hydrates,
        ScopeFlag::Esters,
        ScopeFlag::Ethers,
        ScopeFlag::Compounds,
        ScopeFlag::OrganicCompounds,
        ScopeFlag::InorganicCompounds,
    ];

    /// The name used in law tables.
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeFlag::Itself => "itself",
            ScopeFlag::Isomers => "isomers",
            ScopeFlag::SpecificIsomers => "specific_isomers",
            ScopeFlag::Salts => "salts",
            ScopeFlag::OrganicSalts => "organic_salts",
            ScopeFlag::InorganicSalts => "inorganic_salts",
            ScopeFlag::Hydrates => "hydrates",
            ScopeFlag::Esters => "esters",
            ScopeFlag::Ethers => "ethers",
            ScopeFlag::Compounds => "compounds",
            ScopeFlag::OrganicCompounds => "organic_compounds",
            ScopeFlag::InorganicCompounds => "inorganic_compounds",
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for ScopeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a scope name outside the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scope '{0}'")]
pub struct UnknownScope(pub String);

impl FromStr for ScopeFlag {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScopeFlag::ALL
            .into_iter()
            .find(|flag| flag.as_str() == s)
            .ok_or_else(|| UnknownScope(s.to_string()))
    }
}

/// A set of scope flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ScopeSet(u16);

impl ScopeSet {
    pub fn new() -> Self {
        ScopeSet(0)
    }

    pub fn insert(&mut self, flag: ScopeFlag) {
        self.0 |= flag.bit();
    }

    pub fn contains(&self, flag: ScopeFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    /// Whether any of `flags` is in the set.
    pub fn contains_any(&self, flags: &[ScopeFlag]) -> bool {
        flags.iter().any(|&f| self.contains(f))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Flags in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = ScopeFlag> + '_ {
        ScopeFlag::ALL.into_iter().filter(move |&f| self.contains(f))
    }

    /// Covers the substance itself or any of its isomers.
    pub fn covers_identity(&self) -> bool {
        self.contains_any(&[ScopeFlag::Itself, ScopeFlag::Isomers, ScopeFlag::SpecificIsomers])
    }

    /// Covers ester or ether derivatives.
    pub fn covers_derivatives(&self) -> bool {
        self.contains_any(&[ScopeFlag::Esters, ScopeFlag::Ethers])
    }

    /// Covers compounds of any kind.
    pub fn covers_compounds(&self) -> bool {
        self.contains_any(&[
            ScopeFlag::Compounds,
            ScopeFlag::OrganicCompounds,
            ScopeFlag::InorganicCompounds,
        ])
    }

    /// Split scope names into a typed set and the names outside the
    /// vocabulary.
    pub fn parse_lenient<S: AsRef<str>>(names: &[S]) -> (ScopeSet, Vec<String>) {
        let mut set = ScopeSet::new();
        let mut unknown = Vec::new();
        for name in names {
            match name.as_ref().parse::<ScopeFlag>() {
                Ok(flag) => set.insert(flag),
                Err(UnknownScope(s)) => unknown.push(s),
            }
        }
        (set, unknown)
    }
}

impl FromIterator<ScopeFlag> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = ScopeFlag>>(iter: I) -> Self {
        let mut set = ScopeSet::new();
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}

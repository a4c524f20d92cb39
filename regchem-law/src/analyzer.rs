//! Organic/inorganic classification of the side chains around a matched core.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use regchem_chem::{fragments, replace_core, Molecule, QueryPattern};

use crate::compiler::ExceptionSet;

/// Whether the groups attached to a regulated core are organic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompoundKind {
    Organic,
    Inorganic,
}

impl fmt::Display for CompoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompoundKind::Organic => "organic compound",
            CompoundKind::Inorganic => "inorganic compound",
        })
    }
}

/// Classify one side chain by its carbon count.
///
/// More than two carbons is organic. One or two carbons is inorganic only
/// if the chain is one of the `exceptions` groups. No carbon is inorganic.
pub fn classify_side_chain(chain: &Molecule, exceptions: &ExceptionSet) -> CompoundKind {
    match chain.carbon_count() {
        0 => CompoundKind::Inorganic,
        1 | 2 if exceptions.covers(chain) => CompoundKind::Inorganic,
        _ => CompoundKind::Organic,
    }
}

/// Remove `core` from `fragment` and classify what remains.
///
/// Returns `None` if the core does not embed. Any organic side chain makes
/// the whole compound organic; no side chains at all is inorganic.
pub fn analyze_compound(
    fragment: &Molecule,
    core: &QueryPattern,
    exceptions: &ExceptionSet,
) -> Option<CompoundKind> {
    let residual = replace_core(fragment, core)?;
    if residual.is_empty() {
        return Some(CompoundKind::Inorganic);
    }
    let chains = fragments(&residual);
    let kind = if chains.iter().any(|c| classify_side_chain(c, exceptions) == CompoundKind::Organic) {
        CompoundKind::Organic
    } else {
        CompoundKind::Inorganic
    };
    debug!(side_chains = chains.len(), kind = %kind, "analyzed compound");
    Some(kind)
}

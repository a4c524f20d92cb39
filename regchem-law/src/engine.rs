//! The checker: match input fragments against compiled regulations and
//! label every hit.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use regchem_chem::parse_smiles;
use regchem_core::{ContentAddressable, Summarizable};

use crate::analyzer::analyze_compound;
use crate::compiler::{compile, CompiledRegulation, ExceptionSet};
use crate::config::CheckerConfig;
use crate::database::RegulationDatabase;
use crate::fragment::Fragment;
use crate::label::Classification;
use crate::salt::{SaltEnvironment, SaltRules};

/// One regulation a structure may fall under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRecord {
    pub law: String,
    pub name: String,
    pub detected_type: String,
    /// Scope names as listed in the law table.
    pub scope: Vec<String>,
    pub description: String,
    pub pattern_matched: String,
}

/// Result of [`Checker::check_detailed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The input parsed. `truncated` is set when the match budget ran out
    /// before every fragment was checked against every pattern.
    Parsed { hits: Vec<HitRecord>, truncated: bool },
    Unparsable { reason: String },
}

impl CheckOutcome {
    pub fn hits(&self) -> &[HitRecord] {
        match self {
            CheckOutcome::Parsed { hits, .. } => hits,
            CheckOutcome::Unparsable { .. } => &[],
        }
    }

    pub fn into_hits(self) -> Vec<HitRecord> {
        match self {
            CheckOutcome::Parsed { hits, .. } => hits,
            CheckOutcome::Unparsable { .. } => Vec::new(),
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, CheckOutcome::Parsed { truncated: true, .. })
    }
}

/// Classifies structures against a fixed set of regulations.
///
/// Immutable once built; share it across threads by reference or `Arc`.
///
/// ```
/// use regchem_law::{Checker, RegulationDatabase};
///
/// let db = RegulationDatabase::from_tables(&[(
///     "Example Act",
///     r#"{"CCO": {"name": "Ethanol", "scope": ["itself"]}}"#,
/// )])
/// .unwrap();
/// let checker = Checker::new(&db);
/// let hits = checker.check("OCC");
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].detected_type, "itself (exact match)");
/// ```
#[derive(Debug, Clone)]
pub struct Checker {
    regulations: Vec<CompiledRegulation>,
    side_chain_exceptions: ExceptionSet,
    salt_rules: SaltRules,
    match_budget: Option<Duration>,
    snapshot: String,
}

impl Checker {
    pub fn new(db: &RegulationDatabase) -> Self {
        Self {
            regulations: compile(db),
            side_chain_exceptions: ExceptionSet::side_chain(),
            salt_rules: SaltRules::default(),
            match_budget: None,
            snapshot: db.content_hash(),
        }
    }

    /// Load the configured law tables and build a checker over them.
    pub fn from_config(config: &CheckerConfig) -> Self {
        let db = RegulationDatabase::load(&config.law_sources);
        debug!(summary = %db.summary(), "regulation database ready");
        Self::new(&db).with_match_budget(config.match_budget())
    }

    pub fn with_match_budget(mut self, budget: Option<Duration>) -> Self {
        self.match_budget = budget;
        self
    }

    pub fn regulations(&self) -> &[CompiledRegulation] {
        &self.regulations
    }

    /// Content hash of the regulation database this checker was built from.
    pub fn snapshot_hash(&self) -> &str {
        &self.snapshot
    }

    /// All regulations `smiles` may fall under. Empty for unparsable input.
    pub fn check(&self, smiles: &str) -> Vec<HitRecord> {
        self.check_detailed(smiles).into_hits()
    }

    /// Like [`check`](Self::check), but tells unparsable input apart from
    /// no hits and reports budget truncation.
    pub fn check_detailed(&self, smiles: &str) -> CheckOutcome {
        let mol = match parse_smiles(smiles) {
            Ok(mol) => mol,
            Err(e) => {
                warn!(smiles, error = %e, "could not parse input SMILES");
                return CheckOutcome::Unparsable { reason: e.to_string() };
            }
        };

        let fragments = Fragment::split(&mol);
        let deadline = self.match_budget.map(|b| Instant::now() + b);
        let mut hits = Vec::new();
        let mut truncated = false;

        'fragments: for (i, main) in fragments.iter().enumerate() {
            let others = fragments.iter().enumerate().filter(|&(j, _)| j != i).map(|(_, f)| f);
            let env = SaltEnvironment::survey(main, others, &self.salt_rules);

            for regulation in &self.regulations {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    warn!(
                        smiles,
                        fragment = i,
                        hits = hits.len(),
                        "match budget exhausted, remaining patterns skipped"
                    );
                    truncated = true;
                    break 'fragments;
                }
                if let Some(label) = self.classify(main, regulation, &env) {
                    hits.push(HitRecord {
                        law: regulation.record.law.clone(),
                        name: regulation.record.name.clone(),
                        detected_type: label.to_string(),
                        scope: regulation.record.raw_scope.clone(),
                        description: regulation.record.description.clone(),
                        pattern_matched: regulation.pattern_smiles.clone(),
                    });
                }
            }
        }

        debug!(smiles, fragments = fragments.len(), hits = hits.len(), truncated, "check complete");
        CheckOutcome::Parsed { hits, truncated }
    }

    /// Label `fragment` against one regulation, or `None` if the fragment
    /// does not contain the pattern.
    pub fn classify(
        &self,
        fragment: &Fragment,
        regulation: &CompiledRegulation,
        env: &SaltEnvironment,
    ) -> Option<Classification> {
        let query = &regulation.query;
        if !query.matches(&fragment.mol) {
            return None;
        }
        let scope = regulation.record.scope;
        let label = if fragment.atom_count() == query.atom_count() {
            let exact = query.canonical_smiles() == Some(fragment.canonical.as_str());
            Classification::identity(exact, scope)
        } else {
            Classification::partial(scope, || {
                analyze_compound(&fragment.mol, query, &self.side_chain_exceptions)
            })
        };
        Some(label.with_environment(env, scope))
    }
}

impl Summarizable for Checker {
    fn summary(&self) -> String {
        format!("Checker: {} compiled regulations, snapshot {}", self.regulations.len(), self.snapshot)
    }
}

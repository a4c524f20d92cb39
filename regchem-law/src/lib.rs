//! Regulated-substance classification.
//!
//! Law tables map pattern SMILES to the forms of a substance each law
//! covers. A [`Checker`] built from them splits an input structure into
//! fragments, finds every pattern each fragment contains, and labels the
//! match: the substance itself, an isomer, a derivative, a compound, or a
//! structural overlap, qualified by any salt or water of hydration present.
//!
//! - [`database`]: law table loading and merging
//! - [`compiler`]: pattern and exception-set compilation
//! - [`analyzer`]: organic/inorganic side-chain analysis
//! - [`salt`]: salt and hydrate detection
//! - [`label`]: classification labels
//! - [`engine`]: the checker
//! - [`report`]: plain-text reports

pub mod analyzer;
pub mod compiler;
pub mod config;
pub mod database;
pub mod engine;
pub mod fragment;
pub mod label;
pub mod report;
pub mod salt;
pub mod scope;

pub use analyzer::{analyze_compound, CompoundKind};
pub use compiler::{compile, CompiledRegulation, ExceptionSet};
pub use config::CheckerConfig;
pub use database::{LawSource, LoadedSource, RegulationDatabase, RegulationRecord};
pub use engine::{CheckOutcome, Checker, HitRecord};
pub use fragment::Fragment;
pub use label::{BaseLabel, Classification, Suffix};
pub use report::format_report;
pub use salt::{SaltEnvironment, SaltKind, SaltRules};
pub use scope::{ScopeFlag, ScopeSet};

//! Law table loading and merging.
//!
//! A law table is a JSON object keyed by pattern SMILES:
//!
//! ```json
//! { "CN[C@@H](C)Cc1ccccc1": { "name": "Methamphetamine", "scope": ["itself", "salts"] } }
//! ```
//!
//! Tables from several laws are merged into one [`RegulationDatabase`]. A
//! pattern listed by more than one law keeps one record per law.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use regchem_core::hash::{sha256, FieldHasher};
use regchem_core::{Annotated, ContentAddressable, RegchemError, Result, Summarizable};

use crate::scope::ScopeSet;

/// Name used when a table entry has no `name`.
pub const DEFAULT_NAME: &str = "classification unavailable";

/// Where to read one law's table from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawSource {
    pub path: PathBuf,
    pub law_name: String,
}

impl LawSource {
    pub fn new(path: impl Into<PathBuf>, law_name: impl Into<String>) -> Self {
        Self { path: path.into(), law_name: law_name.into() }
    }
}

/// One law's regulation of one pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegulationRecord {
    pub law: String,
    pub name: String,
    #[serde(skip)]
    pub scope: ScopeSet,
    /// Scope names as written in the table, unknown ones included.
    #[serde(rename = "scope")]
    pub raw_scope: Vec<String>,
    pub description: String,
}

impl Annotated for RegulationRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        (!self.description.is_empty()).then_some(self.description.as_str())
    }
}

/// Provenance of a successfully loaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedSource {
    pub law_name: String,
    pub path: PathBuf,
    /// SHA-256 of the file bytes.
    pub sha256: String,
    pub entries: usize,
}

#[derive(Debug, Deserialize)]
struct TableEntry {
    #[serde(default)]
    scope: Vec<String>,
    name: Option<String>,
    description: Option<String>,
}

/// A law table in file order. `serde_json`'s own map type sorts its keys,
/// so entries are collected through a visitor instead.
struct LawTable(Vec<(String, TableEntry)>);

impl<'de> Deserialize<'de> for LawTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = LawTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping pattern SMILES to regulation entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<LawTable, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((pattern, entry)) = map.next_entry::<String, TableEntry>()? {
                    entries.push((pattern, entry));
                }
                Ok(LawTable(entries))
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

/// Patterns and their per-law records, in first-registration order.
#[derive(Debug, Clone, Default)]
pub struct RegulationDatabase {
    entries: Vec<(String, Vec<RegulationRecord>)>,
    index: HashMap<String, usize>,
    sources: Vec<LoadedSource>,
}

impl RegulationDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and merge law tables in order.
    ///
    /// A missing, unreadable or malformed table is logged and skipped; the
    /// remaining tables still load.
    pub fn load(sources: &[LawSource]) -> Self {
        let mut db = Self::new();
        for source in sources {
            match db.load_source(source) {
                Ok(loaded) => {
                    info!(
                        law = %loaded.law_name,
                        path = %loaded.path.display(),
                        entries = loaded.entries,
                        "loaded law table"
                    );
                }
                Err(RegchemError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(
                        law = %source.law_name,
                        path = %source.path.display(),
                        "law table not found, skipping"
                    );
                }
                Err(e) => {
                    warn!(
                        law = %source.law_name,
                        path = %source.path.display(),
                        error = %e,
                        "failed to load law table, skipping"
                    );
                }
            }
        }
        db
    }

    /// Build from in-memory `(law_name, json)` tables.
    pub fn from_tables<L, J>(tables: &[(L, J)]) -> Result<Self>
    where
        L: AsRef<str>,
        J: AsRef<str>,
    {
        let mut db = Self::new();
        for (law, json) in tables {
            db.add_table(law.as_ref(), json.as_ref())?;
        }
        Ok(db)
    }

    /// Read one table file and merge it. Nothing is merged on error.
    pub fn load_source(&mut self, source: &LawSource) -> Result<&LoadedSource> {
        let bytes = std::fs::read(&source.path)?;
        let table: LawTable = serde_json::from_slice(&bytes)?;
        let entries = self.merge(&source.law_name, table);
        self.sources.push(LoadedSource {
            law_name: source.law_name.clone(),
            path: source.path.clone(),
            sha256: sha256(&bytes),
            entries,
        });
        Ok(&self.sources[self.sources.len() - 1])
    }

    /// Parse one JSON table and merge it under `law_name`. Returns the
    /// number of entries merged.
    pub fn add_table(&mut self, law_name: &str, json: &str) -> Result<usize> {
        let table: LawTable = serde_json::from_str(json)?;
        Ok(self.merge(law_name, table))
    }

    /// Append a record for `pattern`.
    pub fn insert(&mut self, pattern: impl Into<String>, record: RegulationRecord) {
        let pattern = pattern.into();
        match self.index.get(&pattern) {
            Some(&i) => self.entries[i].1.push(record),
            None => {
                self.index.insert(pattern.clone(), self.entries.len());
                self.entries.push((pattern, vec![record]));
            }
        }
    }

    fn merge(&mut self, law_name: &str, table: LawTable) -> usize {
        let count = table.0.len();
        for (pattern, entry) in table.0 {
            let name = entry.name.unwrap_or_else(|| DEFAULT_NAME.to_string());
            let (scope, unknown) = ScopeSet::parse_lenient(&entry.scope);
            for s in &unknown {
                warn!(law = law_name, name = %name, scope = %s, "unknown scope ignored");
            }
            self.insert(
                pattern,
                RegulationRecord {
                    law: law_name.to_string(),
                    name,
                    scope,
                    raw_scope: entry.scope,
                    description: entry.description.unwrap_or_default(),
                },
            );
        }
        count
    }

    /// Distinct patterns with their records, in first-registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RegulationRecord])> {
        self.entries.iter().map(|(p, r)| (p.as_str(), r.as_slice()))
    }

    pub fn records(&self, pattern: &str) -> Option<&[RegulationRecord]> {
        self.index.get(pattern).map(|&i| self.entries[i].1.as_slice())
    }

    /// Number of distinct patterns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of records over all patterns.
    pub fn record_count(&self) -> usize {
        self.entries.iter().map(|(_, r)| r.len()).sum()
    }

    /// Files loaded through [`load`](Self::load) or
    /// [`load_source`](Self::load_source).
    pub fn sources(&self) -> &[LoadedSource] {
        &self.sources
    }

    pub fn source_paths(&self) -> impl Iterator<Item = &Path> {
        self.sources.iter().map(|s| s.path.as_path())
    }
}

impl ContentAddressable for RegulationDatabase {
    fn content_hash(&self) -> String {
        let mut hasher = FieldHasher::new();
        for (pattern, records) in &self.entries {
            hasher.field(pattern).field(records.len().to_string());
            for record in records {
                hasher
                    .field(&record.law)
                    .field(&record.name)
                    .field(record.raw_scope.len().to_string());
                for s in &record.raw_scope {
                    hasher.field(s);
                }
            }
        }
        hasher.finish()
    }
}

impl Summarizable for RegulationDatabase {
    fn summary(&self) -> String {
        format!(
            "RegulationDatabase: {} patterns, {} records from {} sources",
            self.len(),
            self.record_count(),
            self.sources.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeFlag;
    use std::io::Write;

    const STIMULANTS: &str = r#"{
        "CNC(C)Cc1ccccc1": {"name": "Methamphetamine", "scope": ["itself", "salts"], "description": "phenylmethylaminopropane"},
        "NC(C)Cc1ccccc1": {"name": "Amphetamine", "scope": ["itself", "salts"]}
    }"#;

    const NARCOTICS: &str = r#"{
        "NC(C)Cc1ccccc1": {"name": "Amphetamine (narcotics list)", "scope": ["isomers"]},
        "CCO": {"scope": ["itself", "bogus"]}
    }"#;

    #[test]
    fn merges_in_first_registration_order() {
        let db = RegulationDatabase::from_tables(&[("Stimulants", STIMULANTS), ("Narcotics", NARCOTICS)])
            .unwrap();
        let patterns: Vec<&str> = db.iter().map(|(p, _)| p).collect();
        assert_eq!(patterns, vec!["CNC(C)Cc1ccccc1", "NC(C)Cc1ccccc1", "CCO"]);
        let amph = db.records("NC(C)Cc1ccccc1").unwrap();
        assert_eq!(amph.len(), 2);
        assert_eq!(amph[0].law, "Stimulants");
        assert_eq!(amph[1].law, "Narcotics");
        assert_eq!(db.record_count(), 4);
    }

    #[test]
    fn file_order_preserved_not_sorted() {
        let db = RegulationDatabase::from_tables(&[("L", r#"{"O": {}, "C": {}, "N": {}}"#)]).unwrap();
        let patterns: Vec<&str> = db.iter().map(|(p, _)| p).collect();
        assert_eq!(patterns, vec!["O", "C", "N"]);
    }

    #[test]
    fn defaults_for_missing_fields() {
        let db = RegulationDatabase::from_tables(&[("L", r#"{"CCO": {}}"#)]).unwrap();
        let rec = &db.records("CCO").unwrap()[0];
        assert_eq!(rec.name, DEFAULT_NAME);
        assert_eq!(rec.description, "");
        assert!(rec.scope.is_empty());
        assert!(rec.raw_scope.is_empty());
        assert_eq!(Annotated::description(rec), None);
    }

    #[test]
    fn unknown_scope_kept_raw_only() {
        let db = RegulationDatabase::from_tables(&[("Narcotics", NARCOTICS)]).unwrap();
        let rec = &db.records("CCO").unwrap()[0];
        assert!(rec.scope.contains(ScopeFlag::Itself));
        assert_eq!(rec.scope.len(), 1);
        assert_eq!(rec.raw_scope, vec!["itself", "bogus"]);
    }

    #[test]
    fn load_skips_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        std::fs::File::create(&good).unwrap().write_all(STIMULANTS.as_bytes()).unwrap();
        std::fs::File::create(&bad).unwrap().write_all(b"{ not json").unwrap();

        let db = RegulationDatabase::load(&[
            LawSource::new(dir.path().join("absent.json"), "Absent"),
            LawSource::new(&bad, "Bad"),
            LawSource::new(&good, "Stimulants"),
        ]);
        assert_eq!(db.len(), 2);
        assert_eq!(db.sources().len(), 1);
        let loaded = &db.sources()[0];
        assert_eq!(loaded.law_name, "Stimulants");
        assert_eq!(loaded.entries, 2);
        assert_eq!(loaded.sha256, sha256(STIMULANTS.as_bytes()));
    }

    #[test]
    fn load_source_reports_errors() {
        let mut db = RegulationDatabase::new();
        let err = db.load_source(&LawSource::new("/nonexistent/law.json", "X")).unwrap_err();
        assert!(matches!(err, RegchemError::Io(_)));
        assert!(db.is_empty());
    }

    #[test]
    fn malformed_table_rejected_whole() {
        let mut db = RegulationDatabase::new();
        assert!(db.add_table("L", r#"{"CCO": {"scope": "itself"}}"#).is_err());
        assert!(db.add_table("L", "[1, 2]").is_err());
        assert!(db.is_empty());
    }

    #[test]
    fn content_hash_tracks_content() {
        let a = RegulationDatabase::from_tables(&[("Stimulants", STIMULANTS)]).unwrap();
        let b = RegulationDatabase::from_tables(&[("Stimulants", STIMULANTS)]).unwrap();
        let c = RegulationDatabase::from_tables(&[("Other", STIMULANTS)]).unwrap();
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
        assert_ne!(a.content_hash(), RegulationDatabase::new().content_hash());
    }

    #[test]
    fn summary_counts() {
        let db = RegulationDatabase::from_tables(&[("Stimulants", STIMULANTS), ("Narcotics", NARCOTICS)])
            .unwrap();
        assert_eq!(db.summary(), "RegulationDatabase: 3 patterns, 4 records from 0 sources");
    }
}

//! Molecular graphs and structure matching for regulated-substance checks.
//!
//! Provides SMILES parsing with aromaticity perception, canonical SMILES,
//! SMARTS-style structural queries with VF2 matching, and the fragment and
//! core-subtraction helpers the regulation engine builds on.
//!
//! # Example
//!
//! ```
//! use regchem_chem::{canonical_smiles, parse_smiles, QueryPattern};
//!
//! let ethanol = parse_smiles("OCC").unwrap();
//! assert_eq!(ethanol.atom_count(), 3);
//! assert_eq!(canonical_smiles(&ethanol), "CCO");
//!
//! let query = QueryPattern::from_molecule(&ethanol);
//! assert!(query.matches(&parse_smiles("CCOCCCC").unwrap()));
//! ```

pub mod canon;
pub mod decompose;
pub mod element;
pub mod molecule;
pub mod query;
pub mod smiles;
pub mod stereo;

mod aromaticity;
mod ring;
mod valence;

pub use canon::canonical_smiles;
pub use decompose::{connected_components, fragments, replace_core};
pub use element::{element_by_number, element_by_symbol, Element};
pub use molecule::{Bond, BondOrder, BondStereo, Chirality, MolAtom, Molecule};
pub use query::{parse_smarts, QueryPattern, SubstructureMatch};
pub use smiles::{parse_smiles, parse_smiles_named};

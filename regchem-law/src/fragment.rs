//! Input fragments with their canonical identity.

use tracing::debug;

use regchem_chem::{canonical_smiles, fragments, Molecule};

/// One connected component of an input structure.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub mol: Molecule,
    pub canonical: String,
}

impl Fragment {
    pub fn new(mol: Molecule) -> Self {
        let canonical = canonical_smiles(&mol);
        Self { mol, canonical }
    }

    pub fn atom_count(&self) -> usize {
        self.mol.atom_count()
    }

    /// Split `mol` into fragments in order of their lowest atom index.
    ///
    /// Falls back to the whole molecule as a single fragment if
    /// decomposition yields nothing.
    pub fn split(mol: &Molecule) -> Vec<Fragment> {
        let parts = fragments(mol);
        if parts.is_empty() && !mol.is_empty() {
            debug!(atoms = mol.atom_count(), "decomposition produced no fragments, using whole molecule");
            return vec![Fragment::new(mol.clone())];
        }
        parts.into_iter().map(Fragment::new).collect()
    }
}

//! Molecular graph representation.

use regchem_core::{Annotated, Summarizable};

/// Tetrahedral chirality at a stereocenter.
///
/// The sense is relative to the atom's reference neighbor order: implicit
/// hydrogen first (if any), then neighbors in [`Molecule::adjacency`] order.
/// Looking from the first reference neighbor, the remaining ones run
/// counterclockwise (`@`) or clockwise (`@@`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Chirality {
    /// No chirality specified.
    #[default]
    None,
    /// Counterclockwise (`@` in SMILES).
    CounterClockwise,
    /// Clockwise (`@@` in SMILES).
    Clockwise,
}

impl Chirality {
    /// The opposite sense; `None` stays `None`.
    pub fn inverted(self) -> Self {
        match self {
            Chirality::None => Chirality::None,
            Chirality::CounterClockwise => Chirality::Clockwise,
            Chirality::Clockwise => Chirality::CounterClockwise,
        }
    }
}

/// Cis-trans stereo bond direction.
///
/// Recorded on single bonds as written in SMILES, read from `atom1` to `atom2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondStereo {
    /// No stereo bond.
    #[default]
    None,
    /// Up bond (`/` in SMILES).
    Up,
    /// Down bond (`\` in SMILES).
    Down,
}

/// Bond order classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Numeric bond order for valence calculations.
    pub fn as_f64(self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }
}

/// An atom in a molecular graph. Atomic number 0 is a dummy (`*`) atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MolAtom {
    pub atomic_number: u8,
    pub formal_charge: i8,
    pub isotope: Option<u16>,
    pub is_aromatic: bool,
    pub implicit_hydrogens: u8,
    pub chirality: Chirality,
}

impl MolAtom {
    /// A neutral, non-aromatic atom with no hydrogens.
    pub fn new(atomic_number: u8) -> Self {
        MolAtom {
            atomic_number,
            formal_charge: 0,
            isotope: None,
            is_aromatic: false,
            implicit_hydrogens: 0,
            chirality: Chirality::None,
        }
    }

    /// An attachment-point placeholder.
    pub fn dummy() -> Self {
        MolAtom::new(0)
    }

    pub fn is_dummy(&self) -> bool {
        self.atomic_number == 0
    }
}

/// A bond between two atoms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
    pub is_aromatic: bool,
    pub stereo: BondStereo,
}

impl Bond {
    /// A plain bond with no stereo marker.
    pub fn new(atom1: usize, atom2: usize, order: BondOrder) -> Self {
        Bond {
            atom1,
            atom2,
            order,
            is_aromatic: order == BondOrder::Aromatic,
            stereo: BondStereo::None,
        }
    }

    /// The atom at the other end of the bond from `atom`.
    pub fn other(&self, atom: usize) -> usize {
        if self.atom1 == atom {
            self.atom2
        } else {
            self.atom1
        }
    }
}

/// A molecular graph with atoms, bonds, and adjacency information.
#[derive(Debug, Clone)]
pub struct Molecule {
    pub name: String,
    pub atoms: Vec<MolAtom>,
    pub bonds: Vec<Bond>,
    /// adjacency[atom_idx] = Vec<(neighbor_atom_idx, bond_idx)>
    pub adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    /// Create a new molecule, building the adjacency list from atoms and bonds.
    pub fn new(name: String, atoms: Vec<MolAtom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bi, bond) in bonds.iter().enumerate() {
            adjacency[bond.atom1].push((bond.atom2, bi));
            adjacency[bond.atom2].push((bond.atom1, bi));
        }
        Molecule { name, atoms, bonds, adjacency }
    }

    /// Number of graph atoms. Parsed hydrogens are implicit unless isotopic,
    /// charged or bridging.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Number of bonds.
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Number of carbon atoms; dummies are never counted.
    pub fn carbon_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.atomic_number == 6).count()
    }

    /// Neighbor atom indices for a given atom.
    pub fn neighbors(&self, atom_idx: usize) -> Vec<usize> {
        self.adjacency[atom_idx].iter().map(|&(n, _)| n).collect()
    }

    /// Graph degree of an atom (number of explicit bonds).
    pub fn degree(&self, atom_idx: usize) -> usize {
        self.adjacency[atom_idx].len()
    }

    /// Find the bond between two atoms, if any.
    pub fn get_bond(&self, a1: usize, a2: usize) -> Option<&Bond> {
        self.bond_index(a1, a2).map(|bi| &self.bonds[bi])
    }

    /// Index of the bond between two atoms, if any.
    pub fn bond_index(&self, a1: usize, a2: usize) -> Option<usize> {
        self.adjacency[a1]
            .iter()
            .find(|&&(n, _)| n == a2)
            .map(|&(_, bi)| bi)
    }

    /// Sum of explicit bond orders at an atom, aromatic bonds counted as 1.5
    /// and the total rounded.
    pub fn bond_order_sum(&self, atom_idx: usize) -> u8 {
        let v: f64 = self.adjacency[atom_idx]
            .iter()
            .map(|&(_, bi)| self.bonds[bi].order.as_f64())
            .sum();
        v.round() as u8
    }
}

impl Annotated for Molecule {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Summarizable for Molecule {
    fn summary(&self) -> String {
        format!(
            "{}: {} atoms, {} bonds",
            if self.name.is_empty() { "Molecule" } else { &self.name },
            self.atom_count(),
            self.bond_count()
        )
    }
}

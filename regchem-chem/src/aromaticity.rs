//! Hückel aromaticity perception.
//!
//! Rings written in Kekulé form are re-expressed with aromatic atoms and
//! bonds so that alternative spellings of the same ring system compare equal.

use crate::molecule::{BondOrder, BondStereo, Molecule};
use crate::ring::{ring_bonds, RingInfo};

/// Smallest ring considered for aromaticity.
const MIN_RING_SIZE: usize = 5;

/// Mark every ring (or pair of fused rings) that satisfies the 4n+2 rule as
/// aromatic. Repeats until nothing changes, so rings whose neighbors were
/// just aromatized get a second look. Hydrogen counts are left unchanged.
pub fn perceive(mol: &mut Molecule) {
    let info = RingInfo::new(mol);
    let candidates: Vec<(Vec<usize>, Vec<usize>)> = info
        .rings
        .iter()
        .filter(|r| r.len() >= MIN_RING_SIZE)
        .map(|r| (r.clone(), ring_bonds(mol, r)))
        .collect();
    if candidates.is_empty() {
        return;
    }

    loop {
        let mut changed = false;

        for (atoms, bonds) in &candidates {
            if is_fully_aromatic(mol, bonds) {
                continue;
            }
            if is_huckel(mol, atoms) {
                mark_aromatic(mol, atoms, bonds);
                changed = true;
            }
        }

        for i in 0..candidates.len() {
            for j in i + 1..candidates.len() {
                let (ai, bi) = &candidates[i];
                let (aj, bj) = &candidates[j];
                if !bi.iter().any(|b| bj.contains(b)) {
                    continue;
                }
                if is_fully_aromatic(mol, bi) && is_fully_aromatic(mol, bj) {
                    continue;
                }
                let mut atoms = ai.clone();
                atoms.extend(aj.iter().filter(|a| !ai.contains(a)));
                if is_huckel(mol, &atoms) {
                    let mut bonds = bi.clone();
                    bonds.extend(bj.iter().filter(|b| !bi.contains(b)));
                    mark_aromatic(mol, &atoms, &bonds);
                    changed = true;
                }
            }
        }

        if !changed {
            break;
        }
    }
}

fn is_fully_aromatic(mol: &Molecule, bonds: &[usize]) -> bool {
    bonds.iter().all(|&bi| mol.bonds[bi].is_aromatic)
}

fn is_huckel(mol: &Molecule, system: &[usize]) -> bool {
    let mut electrons = 0u32;
    for &atom in system {
        match pi_electrons(mol, atom, system) {
            Some(e) => electrons += e,
            None => return false,
        }
    }
    electrons >= 2 && (electrons - 2) % 4 == 0
}

/// Pi electrons an atom contributes to a candidate ring system, or `None` if
/// the atom cannot take part in one.
fn pi_electrons(mol: &Molecule, atom_idx: usize, system: &[usize]) -> Option<u32> {
    let atom = &mol.atoms[atom_idx];

    if atom.is_aromatic {
        return match (atom.atomic_number, atom.formal_charge) {
            (6, 0) => Some(1),
            (6, -1) => Some(2),
            (6, 1) => Some(0),
            (7 | 15, 1) => Some(1),
            (7 | 15, _) => {
                if atom.implicit_hydrogens > 0 || (mol.degree(atom_idx) == 3 && atom.formal_charge == 0) {
                    Some(2)
                } else {
                    Some(1)
                }
            }
            (8 | 16 | 34, _) => Some(2),
            (5, _) => Some(0),
            _ => None,
        };
    }

    let mut exocyclic = None;
    for &(nbr, bi) in &mol.adjacency[atom_idx] {
        match mol.bonds[bi].order {
            BondOrder::Triple => return None,
            BondOrder::Double | BondOrder::Aromatic => {
                if system.contains(&nbr) {
                    return Some(1);
                }
                exocyclic = Some(nbr);
            }
            BondOrder::Single => {}
        }
    }

    if let Some(nbr) = exocyclic {
        return match mol.atoms[nbr].atomic_number {
            7 | 8 | 16 => Some(0),
            _ => None,
        };
    }

    match (atom.atomic_number, atom.formal_charge) {
        (6, -1) => Some(2),
        (6, 1) => Some(0),
        (7 | 15, 0) => Some(2),
        (8 | 16 | 34, 0) => Some(2),
        _ => None,
    }
}

fn mark_aromatic(mol: &mut Molecule, atoms: &[usize], bonds: &[usize]) {
    for &a in atoms {
        mol.atoms[a].is_aromatic = true;
    }
    for &bi in bonds {
        let bond = &mut mol.bonds[bi];
        bond.order = BondOrder::Aromatic;
        bond.is_aromatic = true;
        bond.stereo = BondStereo::None;
    }
}

#[cfg(test)]
mod tests {
    use crate::molecule::BondOrder;
    use crate::smiles::parse_smiles;

    fn all_aromatic(smiles: &str) -> bool {
        let mol = parse_smiles(smiles).unwrap();
        mol.atoms.iter().all(|a| a.is_aromatic)
    }

    #[test]
    fn kekule_rings() {
        assert!(all_aromatic("C1=CC=CC=C1"));
        assert!(all_aromatic("C1=CC=NC=C1"));
        assert!(all_aromatic("C1=COC=C1"));
        assert!(all_aromatic("C1=CSC=C1"));
    }

    #[test]
    fn kekule_naphthalene() {
        assert!(all_aromatic("C1=CC=C2C=CC=CC2=C1"));
    }

    #[test]
    fn saturated_rings_stay_aliphatic() {
        let mol = parse_smiles("C1CCCCC1").unwrap();
        assert!(mol.atoms.iter().all(|a| !a.is_aromatic));
        let mol = parse_smiles("C1=CCCCC1").unwrap();
        assert!(mol.atoms.iter().all(|a| !a.is_aromatic));
    }

    #[test]
    fn cyclooctatetraene_is_not_aromatic() {
        let mol = parse_smiles("C1=CC=CC=CC=C1").unwrap();
        assert!(mol.atoms.iter().all(|a| !a.is_aromatic));
    }

    #[test]
    fn pyridone_keeps_carbonyl() {
        let mol = parse_smiles("O=C1C=CC=CN1").unwrap();
        assert!(!mol.atoms[0].is_aromatic);
        assert!(mol.atoms[1..].iter().all(|a| a.is_aromatic));
        assert_eq!(mol.bonds[0].order, BondOrder::Double);
        assert_eq!(mol.atoms[6].implicit_hydrogens, 1);
    }

    #[test]
    fn substituent_bonds_untouched() {
        let mol = parse_smiles("CC1=CC=CC=C1").unwrap();
        assert!(!mol.atoms[0].is_aromatic);
        assert_eq!(mol.bonds[0].order, BondOrder::Single);
    }
}

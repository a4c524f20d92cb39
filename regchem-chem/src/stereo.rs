//! Stereochemistry helpers: permutation parity for tetrahedral centers and
//! cis/trans configuration of double bonds from directional single bonds.

use crate::molecule::{BondOrder, BondStereo, Molecule};

/// Whether the permutation given as a sequence of distinct positions is odd.
pub fn permutation_is_odd(positions: &[usize]) -> bool {
    let mut inversions = 0usize;
    for i in 0..positions.len() {
        for j in i + 1..positions.len() {
            if positions[i] > positions[j] {
                inversions += 1;
            }
        }
    }
    inversions % 2 == 1
}

/// Geometry of a stereo double bond relative to one reference neighbor on
/// each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoubleBondConfig {
    /// Double-bond atoms.
    pub begin: usize,
    pub end: usize,
    /// Reference neighbor of `begin` (not `end`).
    pub begin_ref: usize,
    /// Reference neighbor of `end` (not `begin`).
    pub end_ref: usize,
    /// Whether the two reference neighbors lie on opposite sides.
    pub trans: bool,
}

/// Derive the cis/trans configuration of every double bond whose both ends
/// carry a directional single bond. Indexed by bond.
pub fn double_bond_configs(mol: &Molecule) -> Vec<Option<DoubleBondConfig>> {
    mol.bonds
        .iter()
        .map(|bond| {
            if bond.order != BondOrder::Double || bond.is_aromatic {
                return None;
            }
            let (begin_ref, begin_dir) = directional_neighbor(mol, bond.atom1, bond.atom2)?;
            let (end_ref, end_dir) = directional_neighbor(mol, bond.atom2, bond.atom1)?;
            Some(DoubleBondConfig {
                begin: bond.atom1,
                end: bond.atom2,
                begin_ref,
                end_ref,
                trans: begin_dir != end_dir,
            })
        })
        .collect()
}

/// Find a neighbor of `atom` (other than `partner`) joined by a directional
/// bond and return it with the direction as seen arriving at `atom`.
fn directional_neighbor(mol: &Molecule, atom: usize, partner: usize) -> Option<(usize, i8)> {
    mol.adjacency[atom].iter().find_map(|&(n, bi)| {
        if n == partner {
            return None;
        }
        let bond = &mol.bonds[bi];
        let dir = match bond.stereo {
            BondStereo::Up => 1,
            BondStereo::Down => -1,
            BondStereo::None => return None,
        };
        Some((n, if bond.atom2 == atom { dir } else { -dir }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    #[test]
    fn parity() {
        assert!(!permutation_is_odd(&[0, 1, 2, 3]));
        assert!(permutation_is_odd(&[1, 0, 2, 3]));
        assert!(!permutation_is_odd(&[1, 2, 0]));
        assert!(!permutation_is_odd(&[3, 2, 1, 0]));
    }

    #[test]
    fn trans_difluoroethene() {
        let mol = parse_smiles("F/C=C/F").unwrap();
        let configs = double_bond_configs(&mol);
        let cfg = configs[1].unwrap();
        assert!(cfg.trans);
        assert_eq!((cfg.begin_ref, cfg.end_ref), (0, 3));
    }

    #[test]
    fn cis_difluoroethene() {
        let mol = parse_smiles("F/C=C\\F").unwrap();
        assert!(!double_bond_configs(&mol)[1].unwrap().trans);
    }

    #[test]
    fn branch_written_direction() {
        // C(\F)=C/F is trans: the branch bond is read away from the double bond.
        let mol = parse_smiles("C(\\F)=C/F").unwrap();
        let cfg = double_bond_configs(&mol)[1].unwrap();
        assert!(cfg.trans);
    }

    #[test]
    fn unspecified_double_bond() {
        let mol = parse_smiles("FC=CF").unwrap();
        assert!(double_bond_configs(&mol).iter().all(Option::is_none));
    }
}

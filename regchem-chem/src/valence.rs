//! Valence checks for parsed structures.
//!
//! An atom is rejected when its bonds and hydrogens exceed every valence its
//! element (adjusted for charge) allows. Atoms written aromatic must pair up
//! through aromatic bonds so that the ring system has a Kekulé form.

use regchem_core::{RegchemError, Result};

use crate::element::element_by_number;
use crate::molecule::{BondOrder, MolAtom, Molecule};

/// Search steps for the Kekulé assignment. Systems that exhaust it are
/// accepted unchecked.
const KEKULE_SEARCH_LIMIT: usize = 100_000;

/// Check every atom of `mol` for an allowed valence and every written
/// aromatic system for a Kekulé form.
pub(crate) fn check(mol: &Molecule) -> Result<()> {
    let mut needs_double = vec![false; mol.atom_count()];
    for (i, atom) in mol.atoms.iter().enumerate() {
        let Some(allowed) = allowed_valences(atom) else {
            continue;
        };
        let used = used_valence(mol, i);
        let Some(&target) = allowed.iter().find(|&&v| usize::from(v) >= used) else {
            let symbol = element_by_number(atom.atomic_number).map_or("?", |e| e.symbol);
            return Err(RegchemError::Parse(format!(
                "atom {i} ({symbol}, charge {}) has valence {used}, more than allowed",
                atom.formal_charge
            )));
        };
        needs_double[i] = atom.is_aromatic && usize::from(target) > used;
    }

    let mut paired = vec![false; mol.atom_count()];
    let mut budget = KEKULE_SEARCH_LIMIT;
    if !pair_from(mol, &needs_double, &mut paired, 0, &mut budget) {
        let atom = (0..mol.atom_count())
            .find(|&i| needs_double[i] && !paired[i])
            .unwrap_or(0);
        return Err(RegchemError::Parse(format!(
            "aromatic system at atom {atom} has no Kekulé form"
        )));
    }
    Ok(())
}

/// Valences `atom` may take. A charged atom takes those of the element
/// with the same electron count; second-row atoms keep the octet.
fn allowed_valences(atom: &MolAtom) -> Option<&'static [u8]> {
    let elem = element_by_number(atom.atomic_number)?;
    let allowed = if atom.formal_charge == 0 {
        elem.allowed_valences()
    } else {
        let z = i16::from(atom.atomic_number) - i16::from(atom.formal_charge);
        let iso = element_by_number(u8::try_from(z).ok()?)?;
        let second_row = |n: u8| (3..=10).contains(&n);
        if second_row(elem.atomic_number) {
            if !second_row(iso.atomic_number) {
                return None;
            }
            iso.allowed_valences().get(..1)?
        } else {
            iso.allowed_valences()
        }
    };
    (!allowed.is_empty()).then_some(allowed)
}

/// Valence in use at an atom. For an aromatic atom, aromatic bonds count
/// once; the pi bond it may still need is settled by the Kekulé search.
fn used_valence(mol: &Molecule, atom_idx: usize) -> usize {
    let atom = &mol.atoms[atom_idx];
    let bonds: usize = mol.adjacency[atom_idx]
        .iter()
        .map(|&(_, bi)| match mol.bonds[bi].order {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        })
        .sum();
    bonds + usize::from(atom.implicit_hydrogens)
}

/// Pair every atom from `start` on that needs a double bond with an
/// unpaired aromatic neighbour that also needs one.
fn pair_from(
    mol: &Molecule,
    needs_double: &[bool],
    paired: &mut [bool],
    start: usize,
    budget: &mut usize,
) -> bool {
    let Some(atom) = (start..mol.atom_count()).find(|&i| needs_double[i] && !paired[i]) else {
        return true;
    };
    if *budget == 0 {
        return true;
    }
    *budget -= 1;

    paired[atom] = true;
    for &(nbr, bi) in &mol.adjacency[atom] {
        if !needs_double[nbr] || paired[nbr] || mol.bonds[bi].order != BondOrder::Aromatic {
            continue;
        }
        paired[nbr] = true;
        if pair_from(mol, needs_double, paired, atom + 1, budget) {
            return true;
        }
        paired[nbr] = false;
    }
    paired[atom] = false;
    false
}

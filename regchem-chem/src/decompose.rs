//! Fragment decomposition and core subtraction.

use std::collections::VecDeque;

use crate::molecule::{Bond, Chirality, MolAtom, Molecule};
use crate::query::QueryPattern;

/// Connected components as sorted atom index lists, ordered by their lowest
/// atom index.
pub fn connected_components(mol: &Molecule) -> Vec<Vec<usize>> {
    let n = mol.atom_count();
    let mut visited = vec![false; n];
    let mut components = Vec::new();

    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut component = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        while let Some(curr) = queue.pop_front() {
            component.push(curr);
            for &(nbr, _) in &mol.adjacency[curr] {
                if !visited[nbr] {
                    visited[nbr] = true;
                    queue.push_back(nbr);
                }
            }
        }
        component.sort_unstable();
        components.push(component);
    }

    components
}

/// Copy the atoms in `keep` (ascending indices) and the bonds among them
/// into a new molecule. Bond order is preserved, so per-atom neighbor order
/// and with it stored chirality stay valid for atoms that keep all their
/// neighbors.
pub fn extract_subgraph(mol: &Molecule, keep: &[usize]) -> Molecule {
    let mut index_map = vec![usize::MAX; mol.atom_count()];
    let mut atoms = Vec::with_capacity(keep.len());
    for (new_idx, &old_idx) in keep.iter().enumerate() {
        index_map[old_idx] = new_idx;
        atoms.push(mol.atoms[old_idx].clone());
    }

    let bonds = mol
        .bonds
        .iter()
        .filter_map(|bond| {
            let (a1, a2) = (index_map[bond.atom1], index_map[bond.atom2]);
            (a1 != usize::MAX && a2 != usize::MAX).then(|| Bond { atom1: a1, atom2: a2, ..bond.clone() })
        })
        .collect();

    Molecule::new(mol.name.clone(), atoms, bonds)
}

/// Split a molecule into its connected components, in order of their lowest
/// atom index. A connected molecule yields a single clone of itself.
pub fn fragments(mol: &Molecule) -> Vec<Molecule> {
    let components = connected_components(mol);
    if components.len() == 1 {
        return vec![mol.clone()];
    }
    components
        .iter()
        .map(|component| extract_subgraph(mol, component))
        .collect()
}

/// Remove the first embedding of `core` from `mol`.
///
/// Every bond broken between a core atom and a remaining atom is replaced by
/// a bond of the same order to a fresh dummy atom (atomic number 0), so each
/// side chain keeps a marker where it was attached. Returns `None` if the
/// core does not embed. The result may be empty when the core covers the
/// whole molecule.
pub fn replace_core(mol: &Molecule, core: &QueryPattern) -> Option<Molecule> {
    let hit = core.find_first(mol)?;

    let mut in_core = vec![false; mol.atom_count()];
    for t in hit.target_atoms() {
        in_core[t] = true;
    }
    let keep: Vec<usize> = (0..mol.atom_count()).filter(|&i| !in_core[i]).collect();

    let mut index_map = vec![usize::MAX; mol.atom_count()];
    for (new_idx, &old_idx) in keep.iter().enumerate() {
        index_map[old_idx] = new_idx;
    }

    let mut residual = extract_subgraph(mol, &keep);
    let mut atoms = std::mem::take(&mut residual.atoms);
    let mut bonds = std::mem::take(&mut residual.bonds);

    for bond in &mol.bonds {
        let side = match (in_core[bond.atom1], in_core[bond.atom2]) {
            (true, false) => bond.atom2,
            (false, true) => bond.atom1,
            _ => continue,
        };
        let attach = index_map[side];
        // The attachment atom's neighbor list changed; its stored sense no
        // longer refers to the same neighbors.
        atoms[attach].chirality = Chirality::None;
        let dummy = atoms.len();
        atoms.push(MolAtom::dummy());
        bonds.push(Bond::new(attach, dummy, bond.order));
    }

    Some(Molecule::new(mol.name.clone(), atoms, bonds))
}

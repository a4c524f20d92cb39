//! Ring perception: smallest set of smallest rings (SSSR) and ring membership.

use std::collections::VecDeque;

use crate::molecule::Molecule;

/// Ring membership of a molecule's atoms and bonds.
#[derive(Debug, Clone, Default)]
pub struct RingInfo {
    /// SSSR rings as atom cycles, smallest first.
    pub rings: Vec<Vec<usize>>,
    atom_rings: Vec<Vec<usize>>,
    bond_in_ring: Vec<bool>,
}

impl RingInfo {
    pub fn new(mol: &Molecule) -> Self {
        let rings = find_sssr(mol);
        let mut atom_rings = vec![Vec::new(); mol.atom_count()];
        let mut bond_in_ring = vec![false; mol.bond_count()];
        for (ri, ring) in rings.iter().enumerate() {
            for &a in ring {
                atom_rings[a].push(ri);
            }
            for bi in ring_bonds(mol, ring) {
                bond_in_ring[bi] = true;
            }
        }
        RingInfo { rings, atom_rings, bond_in_ring }
    }

    pub fn atom_in_ring(&self, atom_idx: usize) -> bool {
        !self.atom_rings[atom_idx].is_empty()
    }

    pub fn bond_in_ring(&self, bond_idx: usize) -> bool {
        self.bond_in_ring[bond_idx]
    }

    /// Whether the atom lies in an SSSR ring of exactly `size` atoms.
    pub fn atom_in_ring_of_size(&self, atom_idx: usize, size: usize) -> bool {
        self.atom_rings[atom_idx].iter().any(|&ri| self.rings[ri].len() == size)
    }
}

/// Bond indices joining consecutive atoms of a ring cycle.
pub fn ring_bonds(mol: &Molecule, ring: &[usize]) -> Vec<usize> {
    (0..ring.len())
        .filter_map(|i| mol.bond_index(ring[i], ring[(i + 1) % ring.len()]))
        .collect()
}

/// Find the smallest set of smallest rings (SSSR) in a molecule.
///
/// For each ring bond the shortest cycle through it is collected; cycles are
/// deduplicated, sorted by size, and truncated to the cyclomatic number.
pub fn find_sssr(mol: &Molecule) -> Vec<Vec<usize>> {
    let n = mol.atom_count();
    if n == 0 || mol.bond_count() == 0 {
        return Vec::new();
    }

    let cyclomatic =
        mol.bond_count() as isize - n as isize + count_components(mol) as isize;
    if cyclomatic <= 0 {
        return Vec::new();
    }

    let cyclic = cyclic_atoms(mol);
    let mut rings: Vec<Vec<usize>> = Vec::new();
    for (bi, bond) in mol.bonds.iter().enumerate() {
        if !cyclic[bond.atom1] || !cyclic[bond.atom2] {
            continue;
        }
        let Some(mut ring) = shortest_path_avoiding(mol, bond.atom1, bond.atom2, bi, &cyclic) else {
            continue;
        };
        canonical_rotation(&mut ring);
        if !rings.contains(&ring) {
            rings.push(ring);
        }
    }

    rings.sort_by_key(|r| r.len());
    rings.truncate(cyclomatic as usize);
    rings
}

fn count_components(mol: &Molecule) -> usize {
    let mut seen = vec![false; mol.atom_count()];
    let mut components = 0;
    for start in 0..mol.atom_count() {
        if seen[start] {
            continue;
        }
        components += 1;
        let mut stack = vec![start];
        seen[start] = true;
        while let Some(curr) = stack.pop() {
            for &(next, _) in &mol.adjacency[curr] {
                if !seen[next] {
                    seen[next] = true;
                    stack.push(next);
                }
            }
        }
    }
    components
}

/// Atoms left after repeatedly peeling off atoms of degree <= 1.
fn cyclic_atoms(mol: &Molecule) -> Vec<bool> {
    let n = mol.atom_count();
    let mut degree: Vec<usize> = (0..n).map(|i| mol.degree(i)).collect();
    let mut peeled = vec![false; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| degree[i] <= 1).collect();

    while let Some(atom) = queue.pop_front() {
        if peeled[atom] {
            continue;
        }
        peeled[atom] = true;
        for &(next, _) in &mol.adjacency[atom] {
            if !peeled[next] {
                degree[next] -= 1;
                if degree[next] <= 1 {
                    queue.push_back(next);
                }
            }
        }
    }

    peeled.into_iter().map(|p| !p).collect()
}

/// BFS path from `start` to `end` over cyclic atoms without using `skip_bond`.
fn shortest_path_avoiding(
    mol: &Molecule,
    start: usize,
    end: usize,
    skip_bond: usize,
    cyclic: &[bool],
) -> Option<Vec<usize>> {
    let mut parent = vec![usize::MAX; mol.atom_count()];
    let mut queue = VecDeque::from([start]);
    parent[start] = start;

    while let Some(curr) = queue.pop_front() {
        if curr == end {
            let mut path = vec![end];
            let mut node = end;
            while node != start {
                node = parent[node];
                path.push(node);
            }
            path.reverse();
            return Some(path);
        }
        for &(next, bi) in &mol.adjacency[curr] {
            if bi != skip_bond && cyclic[next] && parent[next] == usize::MAX {
                parent[next] = curr;
                queue.push_back(next);
            }
        }
    }
    None
}

/// Rotate a cycle to start at its smallest atom, walking towards the smaller
/// of its two neighbors, so equal cycles compare equal.
fn canonical_rotation(ring: &mut [usize]) {
    let Some(min_pos) = ring.iter().enumerate().min_by_key(|&(_, &v)| v).map(|(i, _)| i) else {
        return;
    };
    ring.rotate_left(min_pos);
    let n = ring.len();
    if n > 2 && ring[n - 1] < ring[1] {
        ring[1..].reverse();
    }
}

//! Canonical SMILES generation.
//!
//! Atoms are ranked by iterative neighbor refinement, remaining ties are
//! broken one at a time, and a DFS over the ranked graph fixes the output
//! order. Tetrahedral and cis/trans stereo survive when the surrounding
//! groups are distinguishable.
//!
//! # Example
//!
//! ```
//! use regchem_chem::{parse_smiles, canonical_smiles};
//!
//! let mol1 = parse_smiles("OCC").unwrap();
//! let mol2 = parse_smiles("CCO").unwrap();
//! assert_eq!(canonical_smiles(&mol1), canonical_smiles(&mol2));
//! ```

use std::collections::{BTreeSet, HashMap};

use crate::element::element_by_number;
use crate::molecule::{BondOrder, Chirality, Molecule};
use crate::ring::RingInfo;
use crate::smiles::default_implicit_hydrogens;
use crate::stereo::{double_bond_configs, permutation_is_odd};

/// Generate a canonical SMILES string for the given molecule.
///
/// Disconnected components are joined with `.` in rank order.
pub fn canonical_smiles(mol: &Molecule) -> String {
    if mol.is_empty() {
        return String::new();
    }

    let classes = symmetry_classes(mol);
    let ranks = break_ties(mol, &classes);
    let plan = Plan::build(mol, &ranks);
    let bond_dirs = assign_bond_directions(mol, &classes, &plan);

    let mut writer = Writer {
        mol,
        classes: &classes,
        plan: &plan,
        bond_dirs: &bond_dirs,
        out: String::new(),
        digits: HashMap::new(),
        in_use: BTreeSet::new(),
    };
    for (k, &root) in plan.roots.iter().enumerate() {
        if k > 0 {
            writer.out.push('.');
        }
        writer.write_branch(root);
    }
    writer.out
}

/// Graph-invariant atom classes: atoms in the same class are
/// indistinguishable by element, charge, hydrogens and neighborhood.
pub fn symmetry_classes(mol: &Molecule) -> Vec<usize> {
    let rings = RingInfo::new(mol);
    let keys: Vec<_> = (0..mol.atom_count())
        .map(|i| {
            let a = &mol.atoms[i];
            (
                a.atomic_number,
                a.is_aromatic,
                mol.degree(i),
                a.implicit_hydrogens,
                a.formal_charge,
                a.isotope.unwrap_or(0),
                rings.atom_in_ring(i),
            )
        })
        .collect();
    refine(mol, dense_ranks(&keys))
}

fn dense_ranks<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    let mut ranks = vec![0; keys.len()];
    let mut rank = 0;
    for w in 1..order.len() {
        if keys[order[w]] != keys[order[w - 1]] {
            rank += 1;
        }
        ranks[order[w]] = rank;
    }
    ranks
}

fn class_count(ranks: &[usize]) -> usize {
    ranks.iter().max().map_or(0, |&m| m + 1)
}

/// Split classes by the sorted classes of their neighbors until stable.
/// Existing class order is kept as the primary key.
fn refine(mol: &Molecule, mut ranks: Vec<usize>) -> Vec<usize> {
    loop {
        let keys: Vec<(usize, Vec<(usize, BondOrder)>)> = (0..mol.atom_count())
            .map(|i| {
                let mut nbrs: Vec<(usize, BondOrder)> = mol.adjacency[i]
                    .iter()
                    .map(|&(j, bi)| (ranks[j], mol.bonds[bi].order))
                    .collect();
                nbrs.sort_unstable();
                (ranks[i], nbrs)
            })
            .collect();
        let next = dense_ranks(&keys);
        if class_count(&next) == class_count(&ranks) {
            return next;
        }
        ranks = next;
    }
}

/// Make every rank unique by promoting one member of the lowest tied class
/// at a time and refining again.
fn break_ties(mol: &Molecule, classes: &[usize]) -> Vec<usize> {
    let n = classes.len();
    let mut ranks = classes.to_vec();
    loop {
        let mut counts = vec![0usize; n];
        for &r in &ranks {
            counts[r] += 1;
        }
        let Some(tied) = (0..n).find(|&r| counts[r] > 1) else {
            return ranks;
        };
        let Some(pick) = (0..n).find(|&i| ranks[i] == tied) else {
            return ranks;
        };
        let split: Vec<usize> = ranks
            .iter()
            .enumerate()
            .map(|(i, &r)| if i == pick { 2 * r } else { 2 * r + 1 })
            .collect();
        ranks = refine(mol, dense_ranks(&split));
    }
}

/// A ring-closure digit written at an atom.
#[derive(Debug, Clone, Copy)]
struct Closure {
    bond: usize,
    partner: usize,
    opening: bool,
}

/// DFS layout of the output: spanning forest plus ring closures.
struct Plan {
    roots: Vec<usize>,
    parent: Vec<Option<(usize, usize)>>,
    children: Vec<Vec<(usize, usize)>>,
    closures: Vec<Vec<Closure>>,
    position: Vec<usize>,
    is_closure_bond: Vec<bool>,
}

impl Plan {
    fn build(mol: &Molecule, ranks: &[usize]) -> Self {
        let n = mol.atom_count();
        let mut plan = Plan {
            roots: Vec::new(),
            parent: vec![None; n],
            children: vec![Vec::new(); n],
            closures: vec![Vec::new(); n],
            position: vec![0; n],
            is_closure_bond: vec![false; mol.bond_count()],
        };
        let mut visited = vec![false; n];
        let mut used = vec![false; mol.bond_count()];
        let mut counter = 0;
        while let Some(root) = (0..n).filter(|&i| !visited[i]).min_by_key(|&i| ranks[i]) {
            plan.roots.push(root);
            plan.visit(mol, ranks, root, &mut visited, &mut used, &mut counter);
        }
        plan
    }

    fn visit(
        &mut self,
        mol: &Molecule,
        ranks: &[usize],
        atom: usize,
        visited: &mut [bool],
        used: &mut [bool],
        counter: &mut usize,
    ) {
        visited[atom] = true;
        self.position[atom] = *counter;
        *counter += 1;

        let mut nbrs: Vec<(usize, usize)> = mol.adjacency[atom].to_vec();
        nbrs.sort_by_key(|&(nbr, _)| ranks[nbr]);
        for (nbr, bi) in nbrs {
            if used[bi] {
                continue;
            }
            used[bi] = true;
            if visited[nbr] {
                // Unused edge to a visited atom: `nbr` is an ancestor.
                self.closures[nbr].push(Closure { bond: bi, partner: atom, opening: true });
                self.closures[atom].push(Closure { bond: bi, partner: nbr, opening: false });
                self.is_closure_bond[bi] = true;
            } else {
                self.parent[nbr] = Some((atom, bi));
                self.children[atom].push((nbr, bi));
                self.visit(mol, ranks, nbr, visited, used, counter);
            }
        }
    }

    /// Closures at an atom in the order their digits are written: closings
    /// first, then openings.
    fn closures_in_order(&self, atom: usize) -> impl Iterator<Item = &Closure> {
        let list = &self.closures[atom];
        list.iter()
            .filter(|c| !c.opening)
            .chain(list.iter().filter(|c| c.opening))
    }

    /// Whether the tree edge `bond` is written with `stereo_atom` before
    /// `neighbor`.
    fn written_from(&self, bond: usize, stereo_atom: usize, neighbor: usize) -> bool {
        self.parent[neighbor] == Some((stereo_atom, bond))
    }
}

/// Symbol for a directional bond, given the required direction as seen
/// arriving at the stereo atom.
fn direction_symbol(plan: &Plan, bond: usize, neighbor: usize, stereo_atom: usize, dir: i8) -> char {
    let d = if plan.written_from(bond, stereo_atom, neighbor) { -dir } else { dir };
    if d > 0 {
        '/'
    } else {
        '\\'
    }
}

/// Choose `/` or `\` for the single bonds around each stereo double bond.
/// Indexed by bond.
fn assign_bond_directions(mol: &Molecule, classes: &[usize], plan: &Plan) -> Vec<Option<char>> {
    let mut dirs: Vec<Option<char>> = vec![None; mol.bond_count()];
    let rings = RingInfo::new(mol);

    let mut configs: Vec<_> = double_bond_configs(mol)
        .into_iter()
        .enumerate()
        .filter_map(|(bi, cfg)| cfg.filter(|_| !rings.bond_in_ring(bi)))
        .collect();
    configs.sort_by_key(|c| plan.position[c.begin].min(plan.position[c.end]));

    for cfg in configs {
        // (bond, neighbor, stereo atom, direction)
        let mut marks: Vec<(usize, usize, usize, i8)> = Vec::new();
        let sides = [
            (cfg.begin, cfg.end, cfg.begin_ref, 1i8),
            (cfg.end, cfg.begin, cfg.end_ref, if cfg.trans { -1 } else { 1 }),
        ];
        let mut resolvable = true;
        for (atom, partner, reference, ref_dir) in sides {
            let others: Vec<(usize, usize)> = mol.adjacency[atom]
                .iter()
                .copied()
                .filter(|&(nbr, _)| nbr != partner)
                .collect();
            if others.len() == 2 && classes[others[0].0] == classes[others[1].0] {
                resolvable = false;
            }
            let before = marks.len();
            for (nbr, nb) in others {
                if mol.bonds[nb].order != BondOrder::Single || plan.is_closure_bond[nb] {
                    continue;
                }
                let dir = if nbr == reference { ref_dir } else { -ref_dir };
                marks.push((nb, nbr, atom, dir));
            }
            if marks.len() == before {
                resolvable = false;
            }
        }
        if !resolvable {
            continue;
        }

        // Match a symbol already chosen for a shared bond, otherwise make
        // the first written symbol a '/'.
        let flip = marks
            .iter()
            .find_map(|&(nb, nbr, atom, dir)| {
                dirs[nb].map(|sym| {
                    if direction_symbol(plan, nb, nbr, atom, dir) == sym {
                        1
                    } else {
                        -1
                    }
                })
            })
            .or_else(|| {
                marks
                    .iter()
                    .min_by_key(|&&(nb, nbr, atom, _)| {
                        let child = if plan.written_from(nb, atom, nbr) { nbr } else { atom };
                        plan.position[child]
                    })
                    .map(|&(nb, nbr, atom, dir)| {
                        if direction_symbol(plan, nb, nbr, atom, dir) == '/' {
                            1
                        } else {
                            -1
                        }
                    })
            })
            .unwrap_or(1);

        for (nb, nbr, atom, dir) in marks {
            if dirs[nb].is_none() {
                dirs[nb] = Some(direction_symbol(plan, nb, nbr, atom, dir * flip));
            }
        }
    }
    dirs
}

struct Writer<'a> {
    mol: &'a Molecule,
    classes: &'a [usize],
    plan: &'a Plan,
    bond_dirs: &'a [Option<char>],
    out: String,
    /// Ring digit assigned to each open closure bond.
    digits: HashMap<usize, usize>,
    in_use: BTreeSet<usize>,
}

impl Writer<'_> {
    fn write_branch(&mut self, atom: usize) {
        self.write_atom(atom);
        self.write_closures(atom);

        let plan = self.plan;
        let children = &plan.children[atom];
        for (k, &(child, bi)) in children.iter().enumerate() {
            let last = k + 1 == children.len();
            if !last {
                self.out.push('(');
            }
            self.write_bond(bi, true);
            self.write_branch(child);
            if !last {
                self.out.push(')');
            }
        }
    }

    fn write_closures(&mut self, atom: usize) {
        let mut released = Vec::new();
        let closures: Vec<Closure> = self.plan.closures_in_order(atom).copied().collect();
        for c in closures {
            if c.opening {
                let digit = (1..).find(|d| !self.in_use.contains(d)).unwrap_or(1);
                self.in_use.insert(digit);
                self.digits.insert(c.bond, digit);
                self.write_bond(c.bond, false);
                push_ring_digit(digit, &mut self.out);
            } else if let Some(digit) = self.digits.remove(&c.bond) {
                push_ring_digit(digit, &mut self.out);
                released.push(digit);
            }
        }
        for digit in released {
            self.in_use.remove(&digit);
        }
    }

    fn write_bond(&mut self, bi: usize, tree_edge: bool) {
        let bond = &self.mol.bonds[bi];
        let both_aromatic =
            self.mol.atoms[bond.atom1].is_aromatic && self.mol.atoms[bond.atom2].is_aromatic;
        match bond.order {
            BondOrder::Single => match self.bond_dirs[bi] {
                Some(sym) if tree_edge => self.out.push(sym),
                _ if both_aromatic => self.out.push('-'),
                _ => {}
            },
            BondOrder::Double => self.out.push('='),
            BondOrder::Triple => self.out.push('#'),
            BondOrder::Aromatic => {
                if !both_aromatic {
                    self.out.push(':');
                }
            }
        }
    }

    fn write_atom(&mut self, i: usize) {
        let atom = &self.mol.atoms[i];
        let chirality = self.output_chirality(i);

        let (symbol, organic) = if atom.is_dummy() {
            ("*".to_string(), true)
        } else {
            match element_by_number(atom.atomic_number) {
                Some(elem) => {
                    let organic = elem.is_organic_subset()
                        && (!atom.is_aromatic || matches!(atom.atomic_number, 5 | 6 | 7 | 8 | 15 | 16));
                    let symbol = if atom.is_aromatic {
                        elem.symbol.to_ascii_lowercase()
                    } else {
                        elem.symbol.to_string()
                    };
                    (symbol, organic)
                }
                None => ("*".to_string(), false),
            }
        };

        let default_h = if atom.is_dummy() { 0 } else { default_implicit_hydrogens(self.mol, i) };
        let needs_bracket = !organic
            || atom.formal_charge != 0
            || atom.isotope.is_some()
            || chirality != Chirality::None
            || atom.implicit_hydrogens != default_h;

        if !needs_bracket {
            self.out.push_str(&symbol);
            return;
        }

        self.out.push('[');
        if let Some(iso) = atom.isotope {
            self.out.push_str(&iso.to_string());
        }
        self.out.push_str(&symbol);
        match chirality {
            Chirality::CounterClockwise => self.out.push('@'),
            Chirality::Clockwise => self.out.push_str("@@"),
            Chirality::None => {}
        }
        if atom.implicit_hydrogens > 0 {
            self.out.push('H');
            if atom.implicit_hydrogens > 1 {
                self.out.push_str(&atom.implicit_hydrogens.to_string());
            }
        }
        match atom.formal_charge {
            0 => {}
            1 => self.out.push('+'),
            -1 => self.out.push('-'),
            c if c > 0 => self.out.push_str(&format!("+{c}")),
            c => self.out.push_str(&format!("-{}", -c)),
        }
        self.out.push(']');
    }

    /// Chirality re-expressed for the written neighbor order, or `None` when
    /// the center is not a stereocenter.
    fn output_chirality(&self, i: usize) -> Chirality {
        let atom = &self.mol.atoms[i];
        if atom.chirality == Chirality::None {
            return Chirality::None;
        }
        let h = atom.implicit_hydrogens as usize;
        if h > 1 || !(3..=4).contains(&(self.mol.degree(i) + h)) {
            return Chirality::None;
        }
        let nbrs = self.mol.neighbors(i);
        for a in 0..nbrs.len() {
            for b in a + 1..nbrs.len() {
                if self.classes[nbrs[a]] == self.classes[nbrs[b]] {
                    return Chirality::None;
                }
            }
        }

        // None stands for the implicit hydrogen.
        let mut reference: Vec<Option<usize>> = Vec::with_capacity(4);
        if h == 1 {
            reference.push(None);
        }
        reference.extend(nbrs.iter().map(|&n| Some(n)));

        let mut written: Vec<Option<usize>> = Vec::with_capacity(4);
        if let Some((p, _)) = self.plan.parent[i] {
            written.push(Some(p));
        }
        if h == 1 {
            written.push(None);
        }
        written.extend(self.plan.closures_in_order(i).map(|c| Some(c.partner)));
        written.extend(self.plan.children[i].iter().map(|&(c, _)| Some(c)));

        let positions: Option<Vec<usize>> = written
            .iter()
            .map(|w| reference.iter().position(|r| r == w))
            .collect();
        match positions {
            Some(p) if p.len() == reference.len() => {
                if permutation_is_odd(&p) {
                    atom.chirality.inverted()
                } else {
                    atom.chirality
                }
            }
            _ => Chirality::None,
        }
    }
}

fn push_ring_digit(digit: usize, out: &mut String) {
    if digit < 10 {
        out.push_str(&digit.to_string());
    } else {
        out.push('%');
        out.push_str(&digit.to_string());
    }
}

//! SMILES string parser.

use std::collections::BTreeMap;

use regchem_core::{RegchemError, Result};

use crate::aromaticity;
use crate::element::{element_by_number, element_by_symbol};
use crate::molecule::{Bond, BondOrder, BondStereo, Chirality, MolAtom, Molecule};
use crate::stereo::permutation_is_odd;
use crate::valence;

/// Parse a SMILES string into a `Molecule`.
pub fn parse_smiles(smiles: &str) -> Result<Molecule> {
    parse_smiles_named(smiles, "")
}

/// Parse a SMILES string into a `Molecule` with a given name.
///
/// Ring systems written in Kekulé form are perceived as aromatic, so
/// `C1=CC=CC=C1` and `c1ccccc1` produce the same graph. Plain `[H]` atoms
/// are folded into their neighbour's hydrogen count. Atoms over their
/// allowed valence and aromatic rings with no Kekulé form are parse errors.
pub fn parse_smiles_named(smiles: &str, name: &str) -> Result<Molecule> {
    let smiles = smiles.trim();
    if smiles.is_empty() {
        return Err(RegchemError::Parse("empty SMILES string".into()));
    }
    let mut parser = SmilesParser::new(smiles);
    parser.parse()?;
    parser.resolve_ring_closures()?;
    let mut mol = parser.finish(name)?;
    aromaticity::perceive(&mut mol);
    Ok(mol)
}

/// One entry in an atom's neighbor list in written order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Atom(usize),
    Hydrogen,
    /// A ring-closure digit whose partner has not been seen yet.
    Ring(u16),
}

struct OpenRing {
    atom: usize,
    order: Option<BondOrder>,
}

struct SmilesParser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<MolAtom>,
    bonds: Vec<Bond>,
    /// Whether each atom was written in brackets (hydrogens given explicitly).
    bracketed: Vec<bool>,
    /// Neighbors of each atom in the order they appear in the string.
    written: Vec<Vec<Slot>>,
    ring_closures: BTreeMap<u16, OpenRing>,
    /// Stack of atom indices for branch handling
    stack: Vec<usize>,
    /// Index of the previous atom (for bonding)
    prev_atom: Option<usize>,
    /// Pending bond order for the next bond
    pending_bond: Option<BondOrder>,
    pending_stereo: BondStereo,
}

impl<'a> SmilesParser<'a> {
    fn new(input: &'a str) -> Self {
        SmilesParser {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            bracketed: Vec::new(),
            written: Vec::new(),
            ring_closures: BTreeMap::new(),
            stack: Vec::new(),
            prev_atom: None,
            pending_bond: None,
            pending_stereo: BondStereo::None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn error(&self, msg: impl std::fmt::Display) -> RegchemError {
        RegchemError::Parse(format!("{msg} at position {}", self.pos))
    }

    fn set_pending_bond(&mut self, order: BondOrder, stereo: BondStereo) -> Result<()> {
        if self.pending_bond.is_some() {
            return Err(self.error("two consecutive bond symbols"));
        }
        self.advance();
        self.pending_bond = Some(order);
        self.pending_stereo = stereo;
        Ok(())
    }

    fn parse(&mut self) -> Result<()> {
        while let Some(ch) = self.peek() {
            match ch {
                b'(' => {
                    let prev = self
                        .prev_atom
                        .ok_or_else(|| self.error("branch without preceding atom"))?;
                    if self.pending_bond.is_some() {
                        return Err(self.error("bond symbol before '('"));
                    }
                    self.advance();
                    self.stack.push(prev);
                }
                b')' => {
                    if self.pending_bond.is_some() {
                        return Err(self.error("dangling bond before ')'"));
                    }
                    self.advance();
                    let top = self.stack.pop().ok_or_else(|| self.error("unmatched ')'"))?;
                    self.prev_atom = Some(top);
                }
                b'-' => self.set_pending_bond(BondOrder::Single, BondStereo::None)?,
                b'=' => self.set_pending_bond(BondOrder::Double, BondStereo::None)?,
                b'#' => self.set_pending_bond(BondOrder::Triple, BondStereo::None)?,
                b':' => self.set_pending_bond(BondOrder::Aromatic, BondStereo::None)?,
                b'/' => self.set_pending_bond(BondOrder::Single, BondStereo::Up)?,
                b'\\' => self.set_pending_bond(BondOrder::Single, BondStereo::Down)?,
                b'%' => {
                    self.advance();
                    let ring_num = self.parse_two_digit_ring()?;
                    self.handle_ring_closure(ring_num)?;
                }
                b'[' => self.parse_bracket_atom()?,
                b'*' => {
                    self.advance();
                    self.push_atom(MolAtom::dummy(), false, 0)?;
                }
                b'.' => {
                    if self.pending_bond.is_some() {
                        return Err(self.error("dangling bond before '.'"));
                    }
                    if !self.stack.is_empty() {
                        return Err(self.error("'.' inside an open branch"));
                    }
                    self.advance();
                    self.prev_atom = None;
                }
                _ if ch.is_ascii_digit() => {
                    self.advance();
                    self.handle_ring_closure((ch - b'0') as u16)?;
                }
                _ if is_organic_atom_start(ch) => self.parse_organic_atom()?,
                _ => {
                    return Err(self.error(format_args!("unexpected character '{}'", ch as char)));
                }
            }
        }
        if self.pending_bond.is_some() {
            return Err(self.error("SMILES ends with a bond symbol"));
        }
        Ok(())
    }

    fn parse_organic_atom(&mut self) -> Result<()> {
        let ch = self.advance().ok_or_else(|| self.error("expected atom"))?;
        let is_aromatic = ch.is_ascii_lowercase();
        let upper = ch.to_ascii_uppercase();

        let symbol = match upper {
            b'B' if !is_aromatic && self.peek() == Some(b'r') => {
                self.advance();
                "Br"
            }
            b'C' if !is_aromatic && self.peek() == Some(b'l') => {
                self.advance();
                "Cl"
            }
            b'B' => "B",
            b'C' => "C",
            b'N' => "N",
            b'O' => "O",
            b'P' => "P",
            b'S' => "S",
            b'F' => "F",
            b'I' => "I",
            _ => return Err(self.error(format_args!("unknown organic atom '{}'", ch as char))),
        };

        let elem = element_by_symbol(symbol)
            .ok_or_else(|| self.error(format_args!("unknown element '{symbol}'")))?;
        let mut atom = MolAtom::new(elem.atomic_number);
        atom.is_aromatic = is_aromatic;
        self.push_atom(atom, false, 0)
    }

    fn parse_bracket_atom(&mut self) -> Result<()> {
        self.advance(); // consume '['

        let isotope = self.parse_optional_number();

        let ch = self
            .advance()
            .ok_or_else(|| self.error("unexpected end of SMILES in bracket atom"))?;

        let (atomic_number, is_aromatic) = if ch == b'*' {
            (0, false)
        } else if ch.is_ascii_alphabetic() {
            let is_aromatic = ch.is_ascii_lowercase();
            let upper = ch.to_ascii_uppercase() as char;
            let two_letter = match self.peek() {
                Some(next) if next.is_ascii_lowercase() => {
                    let candidate = format!("{upper}{}", next as char);
                    element_by_symbol(&candidate).map(|e| e.atomic_number)
                }
                _ => None,
            };
            match two_letter {
                Some(n) => {
                    self.advance();
                    (n, is_aromatic)
                }
                None => {
                    let elem = element_by_symbol(&upper.to_string())
                        .ok_or_else(|| self.error(format_args!("unknown element '{upper}'")))?;
                    (elem.atomic_number, is_aromatic)
                }
            }
        } else {
            return Err(self.error(format_args!("unexpected '{}' in bracket atom", ch as char)));
        };

        let mut chirality = Chirality::None;
        if self.peek() == Some(b'@') {
            self.advance();
            chirality = Chirality::CounterClockwise;
            if self.peek() == Some(b'@') {
                self.advance();
                chirality = Chirality::Clockwise;
            }
        }

        let mut explicit_h = 0u8;
        if self.peek() == Some(b'H') {
            self.advance();
            explicit_h = self.parse_optional_digit().unwrap_or(1);
        }

        let charge = self.parse_charge()?;

        // Atom class, ignored.
        if self.peek() == Some(b':') {
            self.advance();
            if self.parse_optional_number().is_none() {
                return Err(self.error("expected atom class number after ':'"));
            }
        }

        if self.advance() != Some(b']') {
            return Err(self.error("expected ']' in bracket atom"));
        }

        let isotope = match isotope {
            Some(n) => Some(
                u16::try_from(n).map_err(|_| self.error(format_args!("isotope {n} out of range")))?,
            ),
            None => None,
        };

        let atom = MolAtom {
            atomic_number,
            formal_charge: charge,
            isotope,
            is_aromatic,
            implicit_hydrogens: explicit_h,
            chirality,
        };
        self.push_atom(atom, true, explicit_h)
    }

    fn parse_charge(&mut self) -> Result<i8> {
        let sign: i8 = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Ok(0),
        };
        let symbol = self.advance();
        if let Some(d) = self.parse_optional_digit() {
            return Ok(sign * d as i8);
        }
        let mut magnitude = 1i8;
        while self.peek() == symbol {
            self.advance();
            magnitude += 1;
            if magnitude > 9 {
                return Err(self.error("charge out of range"));
            }
        }
        Ok(sign * magnitude)
    }

    fn push_atom(&mut self, atom: MolAtom, bracketed: bool, explicit_h: u8) -> Result<()> {
        let atom_idx = self.atoms.len();
        self.atoms.push(atom);
        self.bracketed.push(bracketed);
        self.written.push(Vec::new());
        self.add_bond_to_prev(atom_idx)?;
        if explicit_h > 0 {
            self.written[atom_idx].push(Slot::Hydrogen);
        }
        self.prev_atom = Some(atom_idx);
        Ok(())
    }

    fn parse_optional_number(&mut self) -> Option<u32> {
        let mut n: u32 = 0;
        let mut found = false;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                self.advance();
                n = n.saturating_mul(10).saturating_add((ch - b'0') as u32);
                found = true;
            } else {
                break;
            }
        }
        if found { Some(n) } else { None }
    }

    fn parse_optional_digit(&mut self) -> Option<u8> {
        match self.peek() {
            Some(ch) if ch.is_ascii_digit() => {
                self.advance();
                Some(ch - b'0')
            }
            _ => None,
        }
    }

    fn parse_two_digit_ring(&mut self) -> Result<u16> {
        let d1 = self.advance().ok_or_else(|| self.error("expected digit after '%'"))?;
        let d2 = self.advance().ok_or_else(|| self.error("expected second digit after '%'"))?;
        if !d1.is_ascii_digit() || !d2.is_ascii_digit() {
            return Err(self.error("invalid ring closure number after '%'"));
        }
        Ok((d1 - b'0') as u16 * 10 + (d2 - b'0') as u16)
    }

    fn handle_ring_closure(&mut self, ring_num: u16) -> Result<()> {
        let current = self
            .prev_atom
            .ok_or_else(|| self.error("ring closure without preceding atom"))?;

        if let Some(open) = self.ring_closures.remove(&ring_num) {
            let explicit = match (self.pending_bond.take(), open.order) {
                (Some(a), Some(b)) if a != b => {
                    return Err(self.error(format_args!("conflicting bonds for ring closure {ring_num}")));
                }
                (a, b) => a.or(b),
            };
            self.pending_stereo = BondStereo::None;
            if open.atom == current || self.bond_exists(open.atom, current) {
                return Err(self.error(format_args!("ring closure {ring_num} duplicates a bond")));
            }
            let both_aromatic = self.atoms[open.atom].is_aromatic && self.atoms[current].is_aromatic;
            let order = explicit.unwrap_or(if both_aromatic {
                BondOrder::Aromatic
            } else {
                BondOrder::Single
            });
            self.bonds.push(Bond::new(open.atom, current, order));

            if let Some(slot) = self.written[open.atom]
                .iter_mut()
                .find(|s| **s == Slot::Ring(ring_num))
            {
                *slot = Slot::Atom(current);
            }
            self.written[current].push(Slot::Atom(open.atom));
        } else {
            let order = self.pending_bond.take();
            self.pending_stereo = BondStereo::None;
            self.written[current].push(Slot::Ring(ring_num));
            self.ring_closures.insert(ring_num, OpenRing { atom: current, order });
        }
        Ok(())
    }

    fn bond_exists(&self, a: usize, b: usize) -> bool {
        self.bonds
            .iter()
            .any(|bond| (bond.atom1 == a && bond.atom2 == b) || (bond.atom1 == b && bond.atom2 == a))
    }

    fn add_bond_to_prev(&mut self, atom_idx: usize) -> Result<()> {
        let stereo = std::mem::take(&mut self.pending_stereo);
        let explicit = self.pending_bond.take();
        if let Some(prev) = self.prev_atom {
            let both_aromatic = self.atoms[prev].is_aromatic && self.atoms[atom_idx].is_aromatic;
            let order = explicit.unwrap_or(if both_aromatic {
                BondOrder::Aromatic
            } else {
                BondOrder::Single
            });
            let mut bond = Bond::new(prev, atom_idx, order);
            bond.stereo = stereo;
            self.bonds.push(bond);
            self.written[prev].push(Slot::Atom(atom_idx));
            self.written[atom_idx].push(Slot::Atom(prev));
        } else if explicit.is_some() {
            return Err(self.error("bond symbol without preceding atom"));
        }
        Ok(())
    }

    fn resolve_ring_closures(&self) -> Result<()> {
        if !self.ring_closures.is_empty() {
            let open: Vec<_> = self.ring_closures.keys().collect();
            return Err(RegchemError::Parse(format!(
                "unmatched ring closure(s): {:?}",
                open
            )));
        }
        if !self.stack.is_empty() {
            return Err(RegchemError::Parse(format!(
                "{} unmatched '(' in SMILES",
                self.stack.len()
            )));
        }
        Ok(())
    }

    /// Build the molecule: infer implicit hydrogens for unbracketed atoms,
    /// check valences, fold plain hydrogen atoms and re-express chirality
    /// relative to the molecule's reference neighbor order.
    fn finish(mut self, name: &str) -> Result<Molecule> {
        let atoms = std::mem::take(&mut self.atoms);
        let bonds = std::mem::take(&mut self.bonds);
        let mut mol = Molecule::new(name.to_string(), atoms, bonds);

        for i in 0..mol.atom_count() {
            if !self.bracketed[i] {
                mol.atoms[i].implicit_hydrogens = default_implicit_hydrogens(&mol, i);
            }
        }
        valence::check(&mol)?;
        let mut mol = self.fold_hydrogens(mol);

        for i in 0..mol.atom_count() {
            if mol.atoms[i].chirality == Chirality::None {
                continue;
            }
            let mut reference: Vec<Slot> = Vec::with_capacity(4);
            if mol.atoms[i].implicit_hydrogens > 0 {
                reference.push(Slot::Hydrogen);
            }
            reference.extend(mol.adjacency[i].iter().map(|&(n, _)| Slot::Atom(n)));

            let written = &self.written[i];
            let positions: Option<Vec<usize>> = written
                .iter()
                .map(|slot| reference.iter().position(|r| r == slot))
                .collect();
            match positions {
                Some(p) if p.len() == reference.len() && (3..=4).contains(&p.len()) => {
                    if permutation_is_odd(&p) {
                        mol.atoms[i].chirality = mol.atoms[i].chirality.inverted();
                    }
                }
                _ => mol.atoms[i].chirality = Chirality::None,
            }
        }
        Ok(mol)
    }

    /// Remove plain hydrogen atoms and count each on its heavy neighbour.
    /// The neighbour's written order keeps a hydrogen slot in its place.
    fn fold_hydrogens(&mut self, mol: Molecule) -> Molecule {
        let fold: Vec<bool> = (0..mol.atom_count()).map(|i| is_plain_hydrogen(&mol, i)).collect();
        if !fold.contains(&true) {
            return mol;
        }

        let Molecule { name, mut atoms, bonds, adjacency } = mol;
        let mut new_index = vec![usize::MAX; atoms.len()];
        let mut next = 0;
        for (i, &folded) in fold.iter().enumerate() {
            if folded {
                let heavy = adjacency[i][0].0;
                atoms[heavy].implicit_hydrogens = atoms[heavy].implicit_hydrogens.saturating_add(1);
                for slot in self.written[heavy].iter_mut() {
                    if *slot == Slot::Atom(i) {
                        *slot = Slot::Hydrogen;
                    }
                }
            } else {
                new_index[i] = next;
                next += 1;
            }
        }

        let written = std::mem::take(&mut self.written);
        self.written = written
            .into_iter()
            .zip(&fold)
            .filter(|&(_, &folded)| !folded)
            .map(|(slots, _)| {
                slots
                    .into_iter()
                    .map(|slot| match slot {
                        Slot::Atom(n) => Slot::Atom(new_index[n]),
                        other => other,
                    })
                    .collect()
            })
            .collect();

        let atoms = atoms
            .into_iter()
            .zip(&fold)
            .filter(|&(_, &folded)| !folded)
            .map(|(atom, _)| atom)
            .collect();
        let bonds = bonds
            .into_iter()
            .filter(|b| !fold[b.atom1] && !fold[b.atom2])
            .map(|mut b| {
                b.atom1 = new_index[b.atom1];
                b.atom2 = new_index[b.atom2];
                b
            })
            .collect();
        Molecule::new(name, atoms, bonds)
    }
}

/// A neutral, non-isotopic hydrogen atom with a single plain bond to a
/// heavy atom.
fn is_plain_hydrogen(mol: &Molecule, idx: usize) -> bool {
    let atom = &mol.atoms[idx];
    if atom.atomic_number != 1
        || atom.isotope.is_some()
        || atom.formal_charge != 0
        || atom.implicit_hydrogens != 0
    {
        return false;
    }
    match mol.adjacency[idx].as_slice() {
        &[(nbr, bi)] => {
            let bond = &mol.bonds[bi];
            mol.atoms[nbr].atomic_number > 1
                && bond.order == BondOrder::Single
                && bond.stereo == BondStereo::None
        }
        _ => false,
    }
}

/// Implicit hydrogen count an unbracketed atom would carry given its bonds.
///
/// Aromatic atoms donate one valence to the pi system and count each
/// aromatic bond once.
pub fn default_implicit_hydrogens(mol: &Molecule, atom_idx: usize) -> u8 {
    let atom = &mol.atoms[atom_idx];
    let Some(elem) = element_by_number(atom.atomic_number) else {
        return 0;
    };
    if !elem.is_organic_subset() {
        return 0;
    }
    if atom.is_aromatic {
        let base = elem.default_valences[0];
        let extra: usize = mol.adjacency[atom_idx]
            .iter()
            .map(|&(_, bi)| match mol.bonds[bi].order {
                BondOrder::Double => 1,
                BondOrder::Triple => 2,
                _ => 0,
            })
            .sum();
        let used = mol.degree(atom_idx) + 1 + extra;
        // Never more than `base`.
        usize::from(base).saturating_sub(used) as u8
    } else {
        elem.implicit_hydrogens(mol.bond_order_sum(atom_idx))
    }
}

fn is_organic_atom_start(ch: u8) -> bool {
    matches!(
        ch,
        b'B' | b'C' | b'N' | b'O' | b'P' | b'S' | b'F' | b'I'
            | b'b' | b'c' | b'n' | b'o' | b'p' | b's'
    )
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for valid simple SMILES: chains of one-atom tokens
    fn simple_chain() -> impl Strategy<Value = Vec<&'static str>> {
        let atoms = prop_oneof![
            Just("C"),
            Just("N"),
            Just("O"),
            Just("S"),
            Just("P"),
            Just("[Na+]"),
        ];
        proptest::collection::vec(atoms, 1..=20)
    }

    proptest! {
        #[test]
        fn parse_smiles_does_not_panic(s in "\\PC{0,100}") {
            let _ = parse_smiles(&s);
        }

        #[test]
        fn chain_atom_count_matches(parts in simple_chain()) {
            let mol = parse_smiles(&parts.join("")).unwrap();
            prop_assert_eq!(mol.atom_count(), parts.len());
            prop_assert_eq!(mol.bond_count(), parts.len() - 1);
        }
    }
}

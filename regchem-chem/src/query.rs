//! Structural queries and VF2 substructure matching.
//!
//! A [`QueryPattern`] is a graph whose atoms and bonds are logical tests.
//! Patterns come either from SMARTS text ([`parse_smarts`]) or from a
//! concrete molecule ([`QueryPattern::from_molecule`]), in which case atoms
//! match on element, aromaticity, charge and isotope while hydrogen counts
//! are left free.

use std::collections::BTreeMap;

use regchem_core::{RegchemError, Result};

use crate::canon::canonical_smiles;
use crate::element::element_by_symbol;
use crate::molecule::{BondOrder, Molecule};
use crate::ring::RingInfo;

/// A primitive atom test.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomPrimitive {
    /// Atomic number (`#6`, or an element symbol).
    AtomicNum(u8),
    /// Aromatic atom (`a`).
    Aromatic,
    /// Aliphatic atom (`A`).
    Aliphatic,
    /// Graph degree (`D2`).
    Degree(u8),
    /// Total hydrogen count, implicit plus explicit (`H1`).
    HCount(u8),
    /// Formal charge (`+1`, `-`).
    Charge(i8),
    /// Mass number (`[13C]`).
    Isotope(u16),
    /// Member of any ring (`R`).
    RingMember,
    /// Member of a ring of the given size (`r5`).
    RingSize(u8),
    /// Total connections including implicit hydrogens (`X3`).
    Connectivity(u8),
    /// Any atom (`*`).
    Wildcard,
}

/// A logical atom expression.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomExpr {
    Prim(AtomPrimitive),
    And(Vec<AtomExpr>),
    Or(Vec<AtomExpr>),
    Not(Box<AtomExpr>),
}

/// A bond test.
#[derive(Debug, Clone, PartialEq)]
pub enum BondExpr {
    Single,
    Double,
    Triple,
    Aromatic,
    /// The implicit SMARTS bond: single or aromatic.
    SingleOrAromatic,
    Ring,
    Any,
    Not(Box<BondExpr>),
}

/// A bond between two query atoms.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBond {
    pub atom1: usize,
    pub atom2: usize,
    pub expr: BondExpr,
}

/// A mapping from pattern atoms to target atoms.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstructureMatch {
    /// Pairs of (pattern_atom_idx, target_atom_idx), in pattern order.
    pub atom_mapping: Vec<(usize, usize)>,
}

impl SubstructureMatch {
    /// Target atoms covered by the match.
    pub fn target_atoms(&self) -> impl Iterator<Item = usize> + '_ {
        self.atom_mapping.iter().map(|&(_, t)| t)
    }
}

/// A compiled structural query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPattern {
    pub atoms: Vec<AtomExpr>,
    pub bonds: Vec<QueryBond>,
    adjacency: Vec<Vec<(usize, usize)>>,
    canonical: Option<String>,
}

impl QueryPattern {
    fn new(atoms: Vec<AtomExpr>, bonds: Vec<QueryBond>, canonical: Option<String>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bi, bond) in bonds.iter().enumerate() {
            adjacency[bond.atom1].push((bond.atom2, bi));
            adjacency[bond.atom2].push((bond.atom1, bi));
        }
        QueryPattern { atoms, bonds, adjacency, canonical }
    }

    /// Compile a concrete molecule into a query.
    ///
    /// Each atom requires the same element and aromaticity; a non-zero
    /// charge or an isotope must also agree. Dummy atoms match anything.
    /// Bonds require the same order.
    pub fn from_molecule(mol: &Molecule) -> Self {
        let atoms = mol
            .atoms
            .iter()
            .map(|atom| {
                if atom.is_dummy() {
                    return AtomExpr::Prim(AtomPrimitive::Wildcard);
                }
                let mut terms = vec![
                    AtomExpr::Prim(AtomPrimitive::AtomicNum(atom.atomic_number)),
                    AtomExpr::Prim(if atom.is_aromatic {
                        AtomPrimitive::Aromatic
                    } else {
                        AtomPrimitive::Aliphatic
                    }),
                ];
                if atom.formal_charge != 0 {
                    terms.push(AtomExpr::Prim(AtomPrimitive::Charge(atom.formal_charge)));
                }
                if let Some(iso) = atom.isotope {
                    terms.push(AtomExpr::Prim(AtomPrimitive::Isotope(iso)));
                }
                AtomExpr::And(terms)
            })
            .collect();
        let bonds = mol
            .bonds
            .iter()
            .map(|b| QueryBond {
                atom1: b.atom1,
                atom2: b.atom2,
                expr: match b.order {
                    BondOrder::Single => BondExpr::Single,
                    BondOrder::Double => BondExpr::Double,
                    BondOrder::Triple => BondExpr::Triple,
                    BondOrder::Aromatic => BondExpr::Aromatic,
                },
            })
            .collect();
        QueryPattern::new(atoms, bonds, Some(canonical_smiles(mol)))
    }

    /// Number of query atoms.
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Canonical SMILES of the source molecule, for queries built by
    /// [`QueryPattern::from_molecule`].
    pub fn canonical_smiles(&self) -> Option<&str> {
        self.canonical.as_deref()
    }

    /// Whether `target` contains this pattern as a substructure.
    pub fn matches(&self, target: &Molecule) -> bool {
        self.find_first(target).is_some()
    }

    /// The first embedding of this pattern in `target`.
    pub fn find_first(&self, target: &Molecule) -> Option<SubstructureMatch> {
        let rings = RingInfo::new(target);
        let mut state = Vf2State::new(target, self, &rings);
        state.search();
        state.found
    }
}

// ---------------------------------------------------------------------------
// SMARTS parser
// ---------------------------------------------------------------------------

/// Parse a SMARTS string into a `QueryPattern`.
pub fn parse_smarts(smarts: &str) -> Result<QueryPattern> {
    let smarts = smarts.trim();
    if smarts.is_empty() {
        return Err(RegchemError::Parse("empty SMARTS string".into()));
    }
    let mut parser = SmartsParser::new(smarts);
    parser.parse()?;
    Ok(QueryPattern::new(parser.atoms, parser.bonds, None))
}

struct SmartsParser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<AtomExpr>,
    bonds: Vec<QueryBond>,
    stack: Vec<usize>,
    prev_atom: Option<usize>,
    pending_bond: Option<BondExpr>,
    ring_closures: BTreeMap<u16, (usize, Option<BondExpr>)>,
}

impl<'a> SmartsParser<'a> {
    fn new(input: &'a str) -> Self {
        SmartsParser {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            stack: Vec::new(),
            prev_atom: None,
            pending_bond: None,
            ring_closures: BTreeMap::new(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn error(&self, msg: impl std::fmt::Display) -> RegchemError {
        RegchemError::Parse(format!("{msg} at position {} in SMARTS", self.pos))
    }

    fn parse(&mut self) -> Result<()> {
        while let Some(ch) = self.peek() {
            match ch {
                b'(' => {
                    let prev = self
                        .prev_atom
                        .ok_or_else(|| self.error("branch without preceding atom"))?;
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
                b'-' | b'=' | b'#' | b':' | b'~' | b'@' | b'!' => {
                    let expr = self.parse_bond()?;
                    if self.pending_bond.replace(expr).is_some() {
                        return Err(self.error("two consecutive bond expressions"));
                    }
                }
                b'%' => {
                    self.advance();
                    let ring_num = self.parse_two_digit_ring()?;
                    self.handle_ring_closure(ring_num)?;
                }
                b'[' => {
                    let expr = self.parse_bracket_atom()?;
                    self.push_atom(expr)?;
                }
                b'*' => {
                    self.advance();
                    self.push_atom(AtomExpr::Prim(AtomPrimitive::Wildcard))?;
                }
                b'.' => {
                    if self.pending_bond.is_some() {
                        return Err(self.error("dangling bond before '.'"));
                    }
                    self.advance();
                    self.prev_atom = None;
                }
                _ if ch.is_ascii_digit() => {
                    self.advance();
                    self.handle_ring_closure((ch - b'0') as u16)?;
                }
                _ if is_organic_smarts(ch) => {
                    let expr = self.parse_organic_atom()?;
                    self.push_atom(expr)?;
                }
                _ => return Err(self.error(format_args!("unexpected character '{}'", ch as char))),
            }
        }
        if self.pending_bond.is_some() {
            return Err(self.error("SMARTS ends with a bond"));
        }
        if !self.stack.is_empty() {
            return Err(self.error("unmatched '('"));
        }
        if !self.ring_closures.is_empty() {
            let open: Vec<_> = self.ring_closures.keys().collect();
            return Err(RegchemError::Parse(format!(
                "unmatched ring closure(s) in SMARTS: {open:?}"
            )));
        }
        Ok(())
    }

    fn parse_bond(&mut self) -> Result<BondExpr> {
        let negate = if self.peek() == Some(b'!') {
            self.advance();
            true
        } else {
            false
        };
        let expr = match self.advance() {
            Some(b'-') => BondExpr::Single,
            Some(b'=') => BondExpr::Double,
            Some(b'#') => BondExpr::Triple,
            Some(b':') => BondExpr::Aromatic,
            Some(b'~') => BondExpr::Any,
            Some(b'@') => BondExpr::Ring,
            _ => return Err(self.error("expected bond symbol")),
        };
        Ok(if negate { BondExpr::Not(Box::new(expr)) } else { expr })
    }

    fn push_atom(&mut self, expr: AtomExpr) -> Result<()> {
        let idx = self.atoms.len();
        self.atoms.push(expr);
        let pending = self.pending_bond.take();
        match self.prev_atom {
            Some(prev) => self.bonds.push(QueryBond {
                atom1: prev,
                atom2: idx,
                expr: pending.unwrap_or(BondExpr::SingleOrAromatic),
            }),
            None if pending.is_some() => {
                return Err(self.error("bond without preceding atom"));
            }
            None => {}
        }
        self.prev_atom = Some(idx);
        Ok(())
    }

    fn parse_organic_atom(&mut self) -> Result<AtomExpr> {
        let ch = self.advance().ok_or_else(|| self.error("expected atom"))?;
        let is_aromatic = ch.is_ascii_lowercase();
        let atomic_num = match ch.to_ascii_uppercase() {
            b'B' if !is_aromatic && self.peek() == Some(b'r') => {
                self.advance();
                35
            }
            b'C' if !is_aromatic && self.peek() == Some(b'l') => {
                self.advance();
                17
            }
            b'B' => 5,
            b'C' => 6,
            b'N' => 7,
            b'O' => 8,
            b'P' => 15,
            b'S' => 16,
            b'F' => 9,
            b'I' => 53,
            _ => return Err(self.error(format_args!("unknown organic atom '{}'", ch as char))),
        };
        Ok(element_expr(atomic_num, is_aromatic))
    }

    fn parse_bracket_atom(&mut self) -> Result<AtomExpr> {
        self.advance(); // '['
        let isotope = self.parse_optional_number();
        let expr = self.parse_atom_or()?;
        if self.advance() != Some(b']') {
            return Err(self.error("expected ']' in bracket atom"));
        }
        Ok(match isotope {
            Some(n) => {
                let iso = u16::try_from(n).map_err(|_| self.error("isotope out of range"))?;
                AtomExpr::And(vec![AtomExpr::Prim(AtomPrimitive::Isotope(iso)), expr])
            }
            None => expr,
        })
    }

    //   or_expr  = and_expr (',' and_expr)*
    //   and_expr = not_expr (('&' | implicit) not_expr)*
    //   not_expr = '!'* primitive

    fn parse_atom_or(&mut self) -> Result<AtomExpr> {
        let mut terms = vec![self.parse_atom_and()?];
        while self.peek() == Some(b',') {
            self.advance();
            terms.push(self.parse_atom_and()?);
        }
        Ok(if terms.len() == 1 { terms.remove(0) } else { AtomExpr::Or(terms) })
    }

    fn parse_atom_and(&mut self) -> Result<AtomExpr> {
        let mut terms = vec![self.parse_atom_not()?];
        loop {
            match self.peek() {
                Some(b'&') => {
                    self.advance();
                    terms.push(self.parse_atom_not()?);
                }
                Some(ch) if ch != b']' && ch != b',' && ch != b';' => {
                    terms.push(self.parse_atom_not()?);
                }
                _ => break,
            }
        }
        Ok(if terms.len() == 1 { terms.remove(0) } else { AtomExpr::And(terms) })
    }

    fn parse_atom_not(&mut self) -> Result<AtomExpr> {
        if self.peek() == Some(b'!') {
            self.advance();
            let inner = self.parse_atom_not()?;
            Ok(AtomExpr::Not(Box::new(inner)))
        } else {
            self.parse_atom_primitive()
        }
    }

    fn parse_atom_primitive(&mut self) -> Result<AtomExpr> {
        let ch = self.peek().ok_or_else(|| self.error("unexpected end of SMARTS"))?;
        let prim = match ch {
            b'#' => {
                self.advance();
                let n = self
                    .parse_optional_number()
                    .ok_or_else(|| self.error("expected atomic number after '#'"))?;
                AtomPrimitive::AtomicNum(
                    u8::try_from(n).map_err(|_| self.error("atomic number out of range"))?,
                )
            }
            b'*' => {
                self.advance();
                AtomPrimitive::Wildcard
            }
            b'+' | b'-' => {
                self.advance();
                let sign: i8 = if ch == b'+' { 1 } else { -1 };
                let magnitude = match self.parse_optional_digit() {
                    Some(d) => d as i8,
                    None => {
                        let mut m = 1i8;
                        while self.peek() == Some(ch) && m < 9 {
                            self.advance();
                            m += 1;
                        }
                        m
                    }
                };
                AtomPrimitive::Charge(sign * magnitude)
            }
            b'H' => {
                self.advance();
                AtomPrimitive::HCount(self.parse_optional_digit().unwrap_or(1))
            }
            b'D' => {
                self.advance();
                AtomPrimitive::Degree(self.parse_optional_digit().unwrap_or(1))
            }
            b'X' => {
                self.advance();
                AtomPrimitive::Connectivity(self.parse_optional_digit().unwrap_or(1))
            }
            b'R' => {
                self.advance();
                AtomPrimitive::RingMember
            }
            b'r' => {
                self.advance();
                match self.parse_optional_digit() {
                    Some(n) => AtomPrimitive::RingSize(n),
                    None => AtomPrimitive::RingMember,
                }
            }
            b'a' if !self.starts_element(b'A') => {
                self.advance();
                AtomPrimitive::Aromatic
            }
            b'A' if !self.starts_element(b'A') => {
                self.advance();
                AtomPrimitive::Aliphatic
            }
            _ if ch.is_ascii_alphabetic() => return self.parse_element(),
            _ => return Err(self.error(format_args!("unexpected '{}' in atom expression", ch as char))),
        };
        Ok(AtomExpr::Prim(prim))
    }

    /// Whether the input at the cursor spells a two-letter element whose
    /// first letter is `first` (e.g. `Al`, `as`).
    fn starts_element(&self, first: u8) -> bool {
        match self.peek_at(1) {
            Some(next) if next.is_ascii_lowercase() => {
                let symbol = format!("{}{}", first as char, next as char);
                element_by_symbol(&symbol).is_some()
            }
            _ => false,
        }
    }

    fn parse_element(&mut self) -> Result<AtomExpr> {
        let ch = self.advance().ok_or_else(|| self.error("expected element"))?;
        let is_aromatic = ch.is_ascii_lowercase();
        let upper = ch.to_ascii_uppercase() as char;
        if let Some(next) = self.peek().filter(u8::is_ascii_lowercase) {
            let two = format!("{upper}{}", next as char);
            if let Some(elem) = element_by_symbol(&two) {
                self.advance();
                return Ok(element_expr(elem.atomic_number, is_aromatic));
            }
        }
        let elem = element_by_symbol(&upper.to_string())
            .ok_or_else(|| self.error(format_args!("unknown element '{upper}'")))?;
        Ok(element_expr(elem.atomic_number, is_aromatic))
    }

    fn parse_optional_number(&mut self) -> Option<u32> {
        let start = self.pos;
        let mut n: u32 = 0;
        while let Some(ch) = self.peek().filter(u8::is_ascii_digit) {
            self.advance();
            n = n.saturating_mul(10).saturating_add((ch - b'0') as u32);
        }
        (self.pos > start).then_some(n)
    }

    fn parse_optional_digit(&mut self) -> Option<u8> {
        let ch = self.peek().filter(u8::is_ascii_digit)?;
        self.advance();
        Some(ch - b'0')
    }

    fn parse_two_digit_ring(&mut self) -> Result<u16> {
        let d1 = self.advance().filter(u8::is_ascii_digit);
        let d2 = self.advance().filter(u8::is_ascii_digit);
        match (d1, d2) {
            (Some(a), Some(b)) => Ok((a - b'0') as u16 * 10 + (b - b'0') as u16),
            _ => Err(self.error("invalid ring closure after '%'")),
        }
    }

    fn handle_ring_closure(&mut self, ring_num: u16) -> Result<()> {
        let current = self
            .prev_atom
            .ok_or_else(|| self.error("ring closure without preceding atom"))?;
        if let Some((open_atom, open_bond)) = self.ring_closures.remove(&ring_num) {
            if open_atom == current {
                return Err(self.error(format_args!("ring closure {ring_num} bonds an atom to itself")));
            }
            let expr = self
                .pending_bond
                .take()
                .or(open_bond)
                .unwrap_or(BondExpr::SingleOrAromatic);
            self.bonds.push(QueryBond { atom1: open_atom, atom2: current, expr });
        } else {
            let pending = self.pending_bond.take();
            self.ring_closures.insert(ring_num, (current, pending));
        }
        Ok(())
    }
}

fn element_expr(atomic_num: u8, is_aromatic: bool) -> AtomExpr {
    AtomExpr::And(vec![
        AtomExpr::Prim(AtomPrimitive::AtomicNum(atomic_num)),
        AtomExpr::Prim(if is_aromatic {
            AtomPrimitive::Aromatic
        } else {
            AtomPrimitive::Aliphatic
        }),
    ])
}

fn is_organic_smarts(ch: u8) -> bool {
    matches!(
        ch,
        b'B' | b'C' | b'N' | b'O' | b'P' | b'S' | b'F' | b'I'
            | b'b' | b'c' | b'n' | b'o' | b'p' | b's'
    )
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn eval_atom(expr: &AtomExpr, mol: &Molecule, atom_idx: usize, rings: &RingInfo) -> bool {
    match expr {
        AtomExpr::Prim(prim) => eval_atom_prim(prim, mol, atom_idx, rings),
        AtomExpr::And(terms) => terms.iter().all(|t| eval_atom(t, mol, atom_idx, rings)),
        AtomExpr::Or(terms) => terms.iter().any(|t| eval_atom(t, mol, atom_idx, rings)),
        AtomExpr::Not(inner) => !eval_atom(inner, mol, atom_idx, rings),
    }
}

fn eval_atom_prim(prim: &AtomPrimitive, mol: &Molecule, atom_idx: usize, rings: &RingInfo) -> bool {
    let atom = &mol.atoms[atom_idx];
    match *prim {
        AtomPrimitive::AtomicNum(n) => atom.atomic_number == n,
        AtomPrimitive::Aromatic => atom.is_aromatic,
        AtomPrimitive::Aliphatic => !atom.is_aromatic,
        AtomPrimitive::Degree(d) => mol.degree(atom_idx) == d as usize,
        AtomPrimitive::HCount(h) => {
            let explicit = mol.adjacency[atom_idx]
                .iter()
                .filter(|&&(n, _)| mol.atoms[n].atomic_number == 1)
                .count();
            atom.implicit_hydrogens as usize + explicit == h as usize
        }
        AtomPrimitive::Charge(c) => atom.formal_charge == c,
        AtomPrimitive::Isotope(i) => atom.isotope == Some(i),
        AtomPrimitive::RingMember => rings.atom_in_ring(atom_idx),
        AtomPrimitive::RingSize(s) => rings.atom_in_ring_of_size(atom_idx, s as usize),
        AtomPrimitive::Connectivity(x) => {
            mol.degree(atom_idx) + atom.implicit_hydrogens as usize == x as usize
        }
        AtomPrimitive::Wildcard => true,
    }
}

fn eval_bond(expr: &BondExpr, mol: &Molecule, bond_idx: usize, rings: &RingInfo) -> bool {
    let bond = &mol.bonds[bond_idx];
    match expr {
        BondExpr::Single => bond.order == BondOrder::Single && !bond.is_aromatic,
        BondExpr::Double => bond.order == BondOrder::Double,
        BondExpr::Triple => bond.order == BondOrder::Triple,
        BondExpr::Aromatic => bond.is_aromatic,
        BondExpr::SingleOrAromatic => bond.order == BondOrder::Single || bond.is_aromatic,
        BondExpr::Ring => rings.bond_in_ring(bond_idx),
        BondExpr::Any => true,
        BondExpr::Not(inner) => !eval_bond(inner, mol, bond_idx, rings),
    }
}

// ---------------------------------------------------------------------------
// VF2 subgraph isomorphism
// ---------------------------------------------------------------------------

struct Vf2State<'a> {
    target: &'a Molecule,
    pattern: &'a QueryPattern,
    rings: &'a RingInfo,
    core_target: Vec<Option<usize>>,
    core_pattern: Vec<Option<usize>>,
    found: Option<SubstructureMatch>,
}

impl<'a> Vf2State<'a> {
    fn new(target: &'a Molecule, pattern: &'a QueryPattern, rings: &'a RingInfo) -> Self {
        Vf2State {
            target,
            pattern,
            rings,
            core_target: vec![None; target.atom_count()],
            core_pattern: vec![None; pattern.atom_count()],
            found: None,
        }
    }

    fn search(&mut self) {
        if self.pattern.atoms.is_empty()
            || self.pattern.atom_count() > self.target.atom_count()
            || self.pattern.bonds.len() > self.target.bond_count()
        {
            return;
        }
        self.match_recursive(0);
    }

    fn match_recursive(&mut self, depth: usize) {
        if depth == self.pattern.atom_count() {
            let mapping = self
                .core_pattern
                .iter()
                .enumerate()
                .filter_map(|(p, t)| t.map(|t| (p, t)))
                .collect();
            self.found = Some(SubstructureMatch { atom_mapping: mapping });
            return;
        }

        for target_atom in self.candidates(depth) {
            if !self.is_feasible(depth, target_atom) {
                continue;
            }
            self.core_pattern[depth] = Some(target_atom);
            self.core_target[target_atom] = Some(depth);

            self.match_recursive(depth + 1);

            self.core_pattern[depth] = None;
            self.core_target[target_atom] = None;

            if self.found.is_some() {
                return;
            }
        }
    }

    /// Unmapped target atoms adjacent to the images of all mapped pattern
    /// neighbors, or every unmapped atom if none are mapped yet.
    fn candidates(&self, pattern_atom: usize) -> Vec<usize> {
        let mut candidates: Option<Vec<usize>> = None;
        for &(p_nbr, _) in &self.pattern.adjacency[pattern_atom] {
            let Some(t_mapped) = self.core_pattern[p_nbr] else {
                continue;
            };
            let t_nbrs: Vec<usize> = self.target.adjacency[t_mapped]
                .iter()
                .map(|&(n, _)| n)
                .filter(|&n| self.core_target[n].is_none())
                .collect();
            candidates = Some(match candidates {
                None => t_nbrs,
                Some(existing) => existing.into_iter().filter(|n| t_nbrs.contains(n)).collect(),
            });
        }
        candidates.unwrap_or_else(|| {
            (0..self.target.atom_count())
                .filter(|&i| self.core_target[i].is_none())
                .collect()
        })
    }

    fn is_feasible(&self, pattern_atom: usize, target_atom: usize) -> bool {
        if self.core_target[target_atom].is_some() {
            return false;
        }
        if !eval_atom(&self.pattern.atoms[pattern_atom], self.target, target_atom, self.rings) {
            return false;
        }
        self.pattern.adjacency[pattern_atom].iter().all(|&(p_nbr, p_bond)| {
            match self.core_pattern[p_nbr] {
                None => true,
                Some(t_mapped) => match self.target.bond_index(target_atom, t_mapped) {
                    Some(tbi) => eval_bond(&self.pattern.bonds[p_bond].expr, self.target, tbi, self.rings),
                    None => false,
                },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    fn smarts_hit(smarts: &str, smiles: &str) -> bool {
        parse_smarts(smarts).unwrap().matches(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn atomic_number() {
        assert!(smarts_hit("[#6]", "C"));
        assert!(!smarts_hit("[#6]", "N"));
        assert!(smarts_hit("[!#6]", "N"));
        assert!(!smarts_hit("[!#6]", "C"));
    }

    #[test]
    fn aromatic_and_aliphatic() {
        assert!(smarts_hit("[a]", "c1ccccc1"));
        assert!(!smarts_hit("[a]", "CC"));
        assert!(smarts_hit("c", "c1ccccc1"));
        assert!(!smarts_hit("C", "c1ccccc1"));
        assert!(!smarts_hit("[C]", "c1ccccc1"));
    }

    #[test]
    fn degree_and_ring_primitives() {
        assert!(smarts_hit("[D3]", "CC(C)C"));
        assert!(smarts_hit("[R]", "c1ccccc1"));
        assert!(!smarts_hit("[R]", "CC"));
        assert!(smarts_hit("[r6]", "c1ccccc1"));
        assert!(!smarts_hit("[r6]", "C1CCCC1"));
    }

    #[test]
    fn hydrogen_count_and_charge_alternatives() {
        let acid = "[CH1](=O)[O-,OH]";
        assert!(smarts_hit(acid, "C(=O)O"));
        assert!(smarts_hit(acid, "C(=O)[O-]"));
        assert!(!smarts_hit(acid, "CC(=O)O"));
        assert!(smarts_hit("[C-]#[N+]", "[C-]#[N+]"));
        assert!(!smarts_hit("[C-]#[N+]", "C#N"));
    }

    #[test]
    fn two_letter_elements_in_brackets() {
        assert!(smarts_hit("[Na]", "[Na+]"));
        assert!(smarts_hit("[Cl]", "CCl"));
        assert!(smarts_hit("[Al]", "[Al]"));
        assert!(!smarts_hit("[A]", "c1ccccc1"));
    }

    #[test]
    fn default_bond_is_single_or_aromatic() {
        assert!(smarts_hit("cc", "c1ccccc1"));
        assert!(smarts_hit("CC", "CC"));
        assert!(!smarts_hit("CC", "C=C"));
        assert!(smarts_hit("C~C", "C=C"));
        assert!(smarts_hit("C!-C", "C=C"));
    }

    #[test]
    fn wildcard_matches_dummy_atoms() {
        assert!(smarts_hit("CC(=O)*", "*C(C)=O"));
        assert!(smarts_hit("N#C*", "*C#N"));
        assert!(smarts_hit("*", "N"));
    }

    #[test]
    fn from_molecule_is_strict_on_aromaticity_and_bonds() {
        let q = QueryPattern::from_molecule(&parse_smiles("c1ccccc1").unwrap());
        assert!(q.matches(&parse_smiles("Cc1ccccc1").unwrap()));
        assert!(q.matches(&parse_smiles("C1=CC=CC=C1").unwrap()));
        assert!(!q.matches(&parse_smiles("C1CCCCC1").unwrap()));

        let q = QueryPattern::from_molecule(&parse_smiles("CCO").unwrap());
        assert!(q.matches(&parse_smiles("CCCO").unwrap()));
        assert!(!q.matches(&parse_smiles("C=CO").unwrap()));
        assert_eq!(q.atom_count(), 3);
        assert_eq!(q.canonical_smiles(), Some("CCO"));
    }

    #[test]
    fn from_molecule_ignores_hydrogens_but_not_charge() {
        let q = QueryPattern::from_molecule(&parse_smiles("CC(=O)O").unwrap());
        assert!(q.matches(&parse_smiles("CC(=O)[O-]").unwrap()));
        let q = QueryPattern::from_molecule(&parse_smiles("[NH4+]").unwrap());
        assert!(!q.matches(&parse_smiles("N").unwrap()));
    }

    #[test]
    fn find_first_maps_pattern_atoms() {
        let q = parse_smarts("[#6]").unwrap();
        let mol = parse_smiles("CCO").unwrap();
        let first = q.find_first(&mol).unwrap();
        assert_eq!(first.atom_mapping, vec![(0, 0)]);
        assert!(parse_smarts("[#8][#8]").unwrap().find_first(&mol).is_none());
    }

    #[test]
    fn ring_closure_patterns() {
        assert!(smarts_hit("c1ccccc1", "Oc1ccccc1"));
        assert!(smarts_hit("C1CC1", "C1CC1C"));
        assert!(!smarts_hit("C1CC1", "CCC"));
    }

    #[test]
    fn invalid_smarts_error() {
        assert!(parse_smarts("").is_err());
        assert!(parse_smarts("[").is_err());
        assert!(parse_smarts("C(").is_err());
        assert!(parse_smarts("C1CC").is_err());
        assert!(parse_smarts("[Xx]").is_err());
        assert!(parse_smarts("C=").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::smiles::parse_smiles;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn parse_smarts_does_not_panic(s in "\\PC{0,60}") {
            let _ = parse_smarts(&s);
        }

        #[test]
        fn molecule_contains_itself(parts in proptest::collection::vec(
            prop_oneof![Just("C"), Just("N"), Just("O"), Just("C(=O)"), Just("c1ccccc1")], 1..=6)) {
            let mol = parse_smiles(&parts.join("")).unwrap();
            let query = QueryPattern::from_molecule(&mol);
            prop_assert!(query.matches(&mol));
        }
    }
}

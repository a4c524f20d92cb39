//! Periodic table data and element lookup.

/// A chemical element from the periodic table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub atomic_number: u8,
    pub symbol: &'static str,
    pub name: &'static str,
    /// Normal valences used to infer implicit hydrogens for unbracketed
    /// SMILES atoms. Empty outside the organic subset.
    pub default_valences: &'static [u8],
}

impl Element {
    /// Whether the element may be written without brackets in SMILES.
    pub fn is_organic_subset(&self) -> bool {
        !self.default_valences.is_empty()
    }

    /// Implicit hydrogen count for an unbracketed atom whose explicit bonds
    /// sum to `used` valence: the smallest normal valence that accommodates
    /// `used`, minus `used`.
    pub fn implicit_hydrogens(&self, used: u8) -> u8 {
        self.default_valences
            .iter()
            .find(|&&v| v >= used)
            .map(|&v| v - used)
            .unwrap_or(0)
    }

    /// Valences a neutral atom of this element may take in a valid
    /// structure, ascending. Empty for elements that are not checked.
    pub fn allowed_valences(&self) -> &'static [u8] {
        match self.atomic_number {
            5 => &[3],
            6 | 14 => &[4],
            7 => &[3],
            8 => &[2],
            9 | 17 | 35 => &[1],
            15 => &[3, 5, 7],
            16 | 34 => &[2, 4, 6],
            33 => &[3, 5],
            53 => &[1, 3, 5],
            _ => &[],
        }
    }
}

/// Elements 1–92 (H through U).
static ELEMENTS: [Element; 92] = [
    Element { atomic_number: 1, symbol: "H", name: "Hydrogen", default_valences: &[] },
    Element { atomic_number: 2, symbol: "He", name: "Helium", default_valences: &[] },
    Element { atomic_number: 3, symbol: "Li", name: "Lithium", default_valences: &[] },
    Element { atomic_number: 4, symbol: "Be", name: "Beryllium", default_valences: &[] },
    Element { atomic_number: 5, symbol: "B", name: "Boron", default_valences: &[3] },
    Element { atomic_number: 6, symbol: "C", name: "Carbon", default_valences: &[4] },
    Element { atomic_number: 7, symbol: "N", name: "Nitrogen", default_valences: &[3, 5] },
    Element { atomic_number: 8, symbol: "O", name: "Oxygen", default_valences: &[2] },
    Element { atomic_number: 9, symbol: "F", name: "Fluorine", default_valences: &[1] },
    Element { atomic_number: 10, symbol: "Ne", name: "Neon", default_valences: &[] },
    Element { atomic_number: 11, symbol: "Na", name: "Sodium", default_valences: &[] },
    Element { atomic_number: 12, symbol: "Mg", name: "Magnesium", default_valences: &[] },
    Element { atomic_number: 13, symbol: "Al", name: "Aluminum", default_valences: &[] },
    Element { atomic_number: 14, symbol: "Si", name: "Silicon", default_valences: &[] },
    Element { atomic_number: 15, symbol: "P", name: "Phosphorus", default_valences: &[3, 5] },
    Element { atomic_number: 16, symbol: "S", name: "Sulfur", default_valences: &[2, 4, 6] },
    Element { atomic_number: 17, symbol: "Cl", name: "Chlorine", default_valences: &[1] },
    Element { atomic_number: 18, symbol: "Ar", name: "Argon", default_valences: &[] },
    Element { atomic_number: 19, symbol: "K", name: "Potassium", default_valences: &[] },
    Element { atomic_number: 20, symbol: "Ca", name: "Calcium", default_valences: &[] },
    Element { atomic_number: 21, symbol: "Sc", name: "Scandium", default_valences: &[] },
    Element { atomic_number: 22, symbol: "Ti", name: "Titanium", default_valences: &[] },
    Element { atomic_number: 23, symbol: "V", name: "Vanadium", default_valences: &[] },
    Element { atomic_number: 24, symbol: "Cr", name: "Chromium", default_valences: &[] },
    Element { atomic_number: 25, symbol: "Mn", name: "Manganese", default_valences: &[] },
    Element { atomic_number: 26, symbol: "Fe", name: "Iron", default_valences: &[] },
    Element { atomic_number: 27, symbol: "Co", name: "Cobalt", default_valences: &[] },
    Element { atomic_number: 28, symbol: "Ni", name: "Nickel", default_valences: &[] },
    Element { atomic_number: 29, symbol: "Cu", name: "Copper", default_valences: &[] },
    Element { atomic_number: 30, symbol: "Zn", name: "Zinc", default_valences: &[] },
    Element { atomic_number: 31, symbol: "Ga", name: "Gallium", default_valences: &[] },
    Element { atomic_number: 32, symbol: "Ge", name: "Germanium", default_valences: &[] },
    Element { atomic_number: 33, symbol: "As", name: "Arsenic", default_valences: &[] },
    Element { atomic_number: 34, symbol: "Se", name: "Selenium", default_valences: &[] },
    Element { atomic_number: 35, symbol: "Br", name: "Bromine", default_valences: &[1] },
    Element { atomic_number: 36, symbol: "Kr", name: "Krypton", default_valences: &[] },
    Element { atomic_number: 37, symbol: "Rb", name: "Rubidium", default_valences: &[] },
    Element { atomic_number: 38, symbol: "Sr", name: "Strontium", default_valences: &[] },
    Element { atomic_number: 39, symbol: "Y", name: "Yttrium", default_valences: &[] },
    Element { atomic_number: 40, symbol: "Zr", name: "Zirconium", default_valences: &[] },
    Element { atomic_number: 41, symbol: "Nb", name: "Niobium", default_valences: &[] },
    Element { atomic_number: 42, symbol: "Mo", name: "Molybdenum", default_valences: &[] },
    Element { atomic_number: 43, symbol: "Tc", name: "Technetium", default_valences: &[] },
    Element { atomic_number: 44, symbol: "Ru", name: "Ruthenium", default_valences: &[] },
    Element { atomic_number: 45, symbol: "Rh", name: "Rhodium", default_valences: &[] },
    Element { atomic_number: 46, symbol: "Pd", name: "Palladium", default_valences: &[] },
    Element { atomic_number: 47, symbol: "Ag", name: "Silver", default_valences: &[] },
    Element { atomic_number: 48, symbol: "Cd", name: "Cadmium", default_valences: &[] },
    Element { atomic_number: 49, symbol: "In", name: "Indium", default_valences: &[] },
    Element { atomic_number: 50, symbol: "Sn", name: "Tin", default_valences: &[] },
    Element { atomic_number: 51, symbol: "Sb", name: "Antimony", default_valences: &[] },
    Element { atomic_number: 52, symbol: "Te", name: "Tellurium", default_valences: &[] },
    Element { atomic_number: 53, symbol: "I", name: "Iodine", default_valences: &[1] },
    Element { atomic_number: 54, symbol: "Xe", name: "Xenon", default_valences: &[] },
    Element { atomic_number: 55, symbol: "Cs", name: "Cesium", default_valences: &[] },
    Element { atomic_number: 56, symbol: "Ba", name: "Barium", default_valences: &[] },
    Element { atomic_number: 57, symbol: "La", name: "Lanthanum", default_valences: &[] },
    Element { atomic_number: 58, symbol: "Ce", name: "Cerium", default_valences: &[] },
    Element { atomic_number: 59, symbol: "Pr", name: "Praseodymium", default_valences: &[] },
    Element { atomic_number: 60, symbol: "Nd", name: "Neodymium", default_valences: &[] },
    Element { atomic_number: 61, symbol: "Pm", name: "Promethium", default_valences: &[] },
    Element { atomic_number: 62, symbol: "Sm", name: "Samarium", default_valences: &[] },
    Element { atomic_number: 63, symbol: "Eu", name: "Europium", default_valences: &[] },
    Element { atomic_number: 64, symbol: "Gd", name: "Gadolinium", default_valences: &[] },
    Element { atomic_number: 65, symbol: "Tb", name: "Terbium", default_valences: &[] },
    Element { atomic_number: 66, symbol: "Dy", name: "Dysprosium", default_valences: &[] },
    Element { atomic_number: 67, symbol: "Ho", name: "Holmium", default_valences: &[] },
    Element { atomic_number: 68, symbol: "Er", name: "Erbium", default_valences: &[] },
    Element { atomic_number: 69, symbol: "Tm", name: "Thulium", default_valences: &[] },
    Element { atomic_number: 70, symbol: "Yb", name: "Ytterbium", default_valences: &[] },
    Element { atomic_number: 71, symbol: "Lu", name: "Lutetium", default_valences: &[] },
    Element { atomic_number: 72, symbol: "Hf", name: "Hafnium", default_valences: &[] },
    Element { atomic_number: 73, symbol: "Ta", name: "Tantalum", default_valences: &[] },
    Element { atomic_number: 74, symbol: "W", name: "Tungsten", default_valences: &[] },
    Element { atomic_number: 75, symbol: "Re", name: "Rhenium", default_valences: &[] },
    Element { atomic_number: 76, symbol: "Os", name: "Osmium", default_valences: &[] },
    Element { atomic_number: 77, symbol: "Ir", name: "Iridium", default_valences: &[] },
    Element { atomic_number: 78, symbol: "Pt", name: "Platinum", default_valences: &[] },
    Element { atomic_number: 79, symbol: "Au", name: "Gold", default_valences: &[] },
    Element { atomic_number: 80, symbol: "Hg", name: "Mercury", default_valences: &[] },
    Element { atomic_number: 81, symbol: "Tl", name: "Thallium", default_valences: &[] },
    Element { atomic_number: 82, symbol: "Pb", name: "Lead", default_valences: &[] },
    Element { atomic_number: 83, symbol: "Bi", name: "Bismuth", default_valences: &[] },
    Element { atomic_number: 84, symbol: "Po", name: "Polonium", default_valences: &[] },
    Element { atomic_number: 85, symbol: "At", name: "Astatine", default_valences: &[] },
    Element { atomic_number: 86, symbol: "Rn", name: "Radon", default_valences: &[] },
    Element { atomic_number: 87, symbol: "Fr", name: "Francium", default_valences: &[] },
    Element { atomic_number: 88, symbol: "Ra", name: "Radium", default_valences: &[] },
    Element { atomic_number: 89, symbol: "Ac", name: "Actinium", default_valences: &[] },
    Element { atomic_number: 90, symbol: "Th", name: "Thorium", default_valences: &[] },
    Element { atomic_number: 91, symbol: "Pa", name: "Protactinium", default_valences: &[] },
    Element { atomic_number: 92, symbol: "U", name: "Uranium", default_valences: &[] },
];

/// Look up an element by its symbol (e.g. "C", "Fe").
pub fn element_by_symbol(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// Look up an element by its atomic number (1-based).
pub fn element_by_number(n: u8) -> Option<&'static Element> {
    if (1..=92).contains(&n) {
        Some(&ELEMENTS[(n - 1) as usize])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_carbon_by_symbol() {
        let c = element_by_symbol("C").unwrap();
        assert_eq!(c.atomic_number, 6);
        assert_eq!(c.name, "Carbon");
        assert!(c.is_organic_subset());
    }

    #[test]
    fn lookup_thallium_by_number() {
        let tl = element_by_number(81).unwrap();
        assert_eq!(tl.symbol, "Tl");
        assert!(!tl.is_organic_subset());
    }

    #[test]
    fn table_is_ordered() {
        for (i, e) in ELEMENTS.iter().enumerate() {
            assert_eq!(e.atomic_number as usize, i + 1, "{}", e.symbol);
        }
    }

    #[test]
    fn implicit_hydrogens_use_next_valence() {
        let s = element_by_symbol("S").unwrap();
        assert_eq!(s.implicit_hydrogens(0), 2);
        assert_eq!(s.implicit_hydrogens(3), 1);
        assert_eq!(s.implicit_hydrogens(6), 0);
        let n = element_by_symbol("N").unwrap();
        assert_eq!(n.implicit_hydrogens(4), 1);
        assert_eq!(n.implicit_hydrogens(7), 0);
    }

    #[test]
    fn allowed_valences_are_stricter_than_defaults() {
        let n = element_by_symbol("N").unwrap();
        assert_eq!(n.default_valences, &[3, 5]);
        assert_eq!(n.allowed_valences(), &[3]);
        assert_eq!(element_by_symbol("P").unwrap().allowed_valences(), &[3, 5, 7]);
        assert!(element_by_symbol("Na").unwrap().allowed_valences().is_empty());
        assert!(element_by_symbol("H").unwrap().allowed_valences().is_empty());
    }

    #[test]
    fn unknown_returns_none() {
        assert!(element_by_symbol("Zz").is_none());
        assert!(element_by_number(0).is_none());
        assert!(element_by_number(93).is_none());
    }
}

/// A chemical element, identified by atomic number (1–118).
///
/// Only the data the reaction engine needs is kept here: symbols for
/// reading and writing SMILES/SMARTS, default valences for implicit
/// hydrogen assignment, and a display colour for depiction.
///
/// # Examples
///
/// ```
/// use rxnpredict::Element;
///
/// let br = Element::from_symbol("Br").unwrap();
/// assert_eq!(br.atomic_num(), 35);
/// assert_eq!(br.default_valences(), &[1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u8);

impl Element {
    pub const H: Element = Element(1);
    pub const B: Element = Element(5);
    pub const C: Element = Element(6);
    pub const N: Element = Element(7);
    pub const O: Element = Element(8);
    pub const F: Element = Element(9);
    pub const P: Element = Element(15);
    pub const S: Element = Element(16);
    pub const CL: Element = Element(17);
    pub const BR: Element = Element(35);
    pub const I: Element = Element(53);

    pub fn from_atomic_num(n: u8) -> Option<Element> {
        (1..=118).contains(&n).then_some(Element(n))
    }

    pub fn from_symbol(s: &str) -> Option<Element> {
        SYMBOLS
            .iter()
            .position(|sym| *sym == s)
            .map(|i| Element(i as u8 + 1))
    }

    /// Looks up a lowercase aromatic symbol as written in SMILES/SMARTS
    /// (`c`, `n`, `se`, ...).
    pub fn from_aromatic_symbol(s: &str) -> Option<Element> {
        let element = match s {
            "b" => Element::B,
            "c" => Element::C,
            "n" => Element::N,
            "o" => Element::O,
            "p" => Element::P,
            "s" => Element::S,
            "si" => Element(14),
            "as" => Element(33),
            "se" => Element(34),
            "te" => Element(52),
            _ => return None,
        };
        Some(element)
    }

    pub fn atomic_num(self) -> u8 {
        self.0
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[self.0 as usize - 1]
    }

    pub fn default_valences(self) -> &'static [u8] {
        valences_for(self.0)
    }

    /// Default valences of the isoelectronic neutral element.
    ///
    /// A charged main-group atom behaves like its isoelectronic neighbour:
    /// `N+` takes carbon's valence, `O-` fluorine's, `C+` boron's. Ions
    /// without a main-group counterpart get no valences.
    pub fn charged_valences(self, formal_charge: i8) -> &'static [u8] {
        let shifted = self.0 as i16 - formal_charge as i16;
        if !(1..=118).contains(&shifted) {
            return &[];
        }
        let shifted = shifted as u8;
        if formal_charge != 0 && row_of(shifted) != row_of(self.0) {
            return &[];
        }
        valences_for(shifted)
    }

    pub fn is_organic_subset(self) -> bool {
        matches!(self.0, 5 | 6 | 7 | 8 | 9 | 15 | 16 | 17 | 35 | 53)
    }

    /// Elements that may be written lowercase (aromatic) without brackets.
    pub fn is_aromatic_organic(self) -> bool {
        matches!(self.0, 5 | 6 | 7 | 8 | 15 | 16)
    }

    /// Fill colour used when depicting this element, as an SVG colour.
    pub fn color(self) -> &'static str {
        match self.0 {
            1 | 6 => "#222222",
            7 => "#3050F8",
            8 => "#E00000",
            9 | 17 => "#1FA01F",
            15 => "#E07000",
            16 => "#C8A000",
            35 => "#A62929",
            53 => "#940094",
            5 => "#D08080",
            _ => "#555555",
        }
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

fn valences_for(atomic_num: u8) -> &'static [u8] {
    match atomic_num {
        1 => &[1],
        5 => &[3],
        6 | 14 | 32 => &[4],
        7 => &[3],
        8 => &[2],
        9 | 17 | 35 | 85 => &[1],
        15 | 33 => &[3, 5],
        16 | 34 | 52 => &[2, 4, 6],
        53 => &[1, 3, 5],
        _ => &[],
    }
}

fn row_of(atomic_num: u8) -> u8 {
    match atomic_num {
        1..=2 => 1,
        3..=10 => 2,
        11..=18 => 3,
        19..=36 => 4,
        37..=54 => 5,
        55..=86 => 6,
        _ => 7,
    }
}

static SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm",
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_lookup_round_trips() {
        for n in 1u8..=118 {
            let e = Element::from_atomic_num(n).unwrap();
            assert_eq!(Element::from_symbol(e.symbol()), Some(e));
        }
    }

    #[test]
    fn atomic_num_bounds() {
        assert!(Element::from_atomic_num(0).is_none());
        assert!(Element::from_atomic_num(119).is_none());
        assert_eq!(Element::from_atomic_num(35), Some(Element::BR));
    }

    #[test]
    fn symbols_are_case_sensitive() {
        assert!(Element::from_symbol("br").is_none());
        assert!(Element::from_symbol("").is_none());
        assert_eq!(Element::from_aromatic_symbol("se").map(Element::atomic_num), Some(34));
        assert!(Element::from_aromatic_symbol("cl").is_none());
    }

    #[test]
    fn charged_valences_follow_isoelectronic_element() {
        assert_eq!(Element::N.charged_valences(1), &[4]);
        assert_eq!(Element::O.charged_valences(-1), &[1]);
        assert_eq!(Element::C.charged_valences(-1), &[3]);
        assert_eq!(Element::C.charged_valences(1), &[3]);
        assert_eq!(Element::O.charged_valences(0), &[2]);
    }

    #[test]
    fn halide_and_metal_ions_have_no_valence() {
        assert!(Element::BR.charged_valences(-1).is_empty());
        let na = Element::from_symbol("Na").unwrap();
        assert!(na.charged_valences(1).is_empty());
    }

    #[test]
    fn organic_subset() {
        for sym in ["B", "C", "N", "O", "P", "S", "F", "Cl", "Br", "I"] {
            assert!(Element::from_symbol(sym).unwrap().is_organic_subset(), "{sym}");
        }
        assert!(!Element::H.is_organic_subset());
        assert!(!Element::from_symbol("Se").unwrap().is_organic_subset());
    }
}

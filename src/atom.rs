use crate::element::Element;

/// Default atom type for a molecular graph node.
///
/// `Atom` stores intrinsic atomic properties, the things you would read off
/// a structural formula. Ring membership and valence are derived on demand
/// by [`rings`](crate::rings) and [`valence`](crate::valence).
///
/// # Examples
///
/// ```
/// use rxnpredict::Atom;
///
/// let carbon = Atom {
///     atomic_num: 6,
///     formal_charge: 0,
///     isotope: 0,
///     hydrogen_count: 3,
///     is_aromatic: false,
/// };
/// assert_eq!(carbon.symbol(), "C");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Atom {
    /// Atomic number (1 = H, 6 = C, 7 = N, …).
    pub atomic_num: u8,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Mass number. `0` means natural isotopic abundance.
    pub isotope: u16,
    /// Number of suppressed hydrogens on this atom.
    ///
    /// These are not graph nodes. Hydrogens written as bracket atoms
    /// (`[H]`) are ordinary nodes and are not counted here.
    pub hydrogen_count: u8,
    /// Whether this atom belongs to an aromatic ring.
    pub is_aromatic: bool,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            atomic_num: element.atomic_num(),
            ..Self::default()
        }
    }

    pub fn element(&self) -> Option<Element> {
        Element::from_atomic_num(self.atomic_num)
    }

    pub fn symbol(&self) -> &'static str {
        self.element().map_or("*", Element::symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    /// Delocalised ring bond between two aromatic atoms.
    Aromatic,
}

impl BondOrder {
    /// Contribution of this bond to an atom's explicit valence.
    ///
    /// Aromatic bonds count as one; the extra ring electron is accounted
    /// for per atom by [`valence`](crate::valence).
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            BondOrder::Single => '-',
            BondOrder::Double => '=',
            BondOrder::Triple => '#',
            BondOrder::Aromatic => ':',
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bond {
    pub order: BondOrder,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self { order }
    }
}

impl From<BondOrder> for Bond {
    fn from(order: BondOrder) -> Self {
        Self { order }
    }
}

use std::fmt;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::element::Element;
use crate::mol::Mol;
use crate::rings::RingInfo;

/// AST node for a SMARTS atom query expression.
///
/// Each variant is a primitive test or a logical combination of tests.
/// [`AtomExpr::matches`] evaluates the tree against a target atom.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomExpr {
    /// Matches any atom (`*`). Also stands in for stereo marks, which are
    /// accepted but not enforced.
    True,
    /// Matches by element. `aromatic` is `None` for `#n`, `Some(true)` for
    /// lowercase (`c`) and `Some(false)` for uppercase (`C`).
    Element {
        atomic_num: u8,
        aromatic: Option<bool>,
    },
    /// Any aromatic atom (`a`).
    Aromatic,
    /// Any aliphatic atom (`A`).
    Aliphatic,
    Isotope(u16),
    /// Explicit connections (`D`).
    Degree(u8),
    /// Total valence, aromatic bonds counted as 1.5 (`v`).
    Valence(u8),
    /// Explicit connections plus suppressed hydrogens (`X`).
    Connectivity(u8),
    /// Suppressed plus explicit hydrogen neighbours (`H`).
    TotalHCount(u8),
    /// Number of rings containing the atom (`R<n>`).
    RingMembership(u8),
    /// In at least one ring (`R`, `r`).
    InRing,
    /// Not in any ring (`R0`).
    NotInRing,
    /// Smallest ring containing the atom has this size (`r<n>`).
    SmallestRingSize(u8),
    Charge(i8),
    /// Atom map number (`:n`). Always matches; carries the reaction mapping.
    AtomMapClass(u16),
    /// Recursive SMARTS (`$(...)`), anchored on the tested atom.
    Recursive(Box<Mol<AtomExpr, BondExpr>>),
    And(Vec<AtomExpr>),
    Or(Vec<AtomExpr>),
    Not(Box<AtomExpr>),
}

/// AST node for a SMARTS bond query expression.
///
/// An omitted bond is [`BondExpr::SingleOrAromatic`].
#[derive(Debug, Clone, PartialEq)]
pub enum BondExpr {
    /// Any bond (`~`).
    True,
    Single,
    Double,
    Triple,
    Aromatic,
    /// Ring bond (`@`).
    Ring,
    SingleOrAromatic,
    And(Vec<BondExpr>),
    Or(Vec<BondExpr>),
    Not(Box<BondExpr>),
}

/// Target molecule plus its ring perception, shared by every test during a
/// search.
pub struct MatchContext<'a> {
    pub mol: &'a Mol<Atom, Bond>,
    pub rings: &'a RingInfo,
}

impl<'a> MatchContext<'a> {
    pub fn new(mol: &'a Mol<Atom, Bond>, rings: &'a RingInfo) -> Self {
        Self { mol, rings }
    }
}

fn explicit_h_count(mol: &Mol<Atom, Bond>, idx: NodeIndex) -> u8 {
    mol.neighbors(idx)
        .filter(|&nb| mol.atom(nb).atomic_num == 1)
        .count() as u8
}

fn valence_with_aromatic_halves(mol: &Mol<Atom, Bond>, idx: NodeIndex) -> u8 {
    let doubled: u32 = mol
        .bonds_of(idx)
        .map(|e| match mol.bond(e).order {
            BondOrder::Aromatic => 3,
            order => 2 * order.valence() as u32,
        })
        .sum();
    (doubled / 2) as u8 + mol.atom(idx).hydrogen_count
}

impl AtomExpr {
    pub fn matches(&self, ctx: &MatchContext, idx: NodeIndex) -> bool {
        let atom = ctx.mol.atom(idx);
        match self {
            AtomExpr::True | AtomExpr::AtomMapClass(_) => true,
            AtomExpr::Element {
                atomic_num,
                aromatic,
            } => atom.atomic_num == *atomic_num && aromatic.map_or(true, |a| atom.is_aromatic == a),
            AtomExpr::Aromatic => atom.is_aromatic,
            AtomExpr::Aliphatic => !atom.is_aromatic,
            AtomExpr::Isotope(iso) => atom.isotope == *iso,
            AtomExpr::Degree(d) => ctx.mol.degree(idx) == *d as usize,
            AtomExpr::Valence(v) => valence_with_aromatic_halves(ctx.mol, idx) == *v,
            AtomExpr::Connectivity(x) => {
                ctx.mol.degree(idx) + atom.hydrogen_count as usize == *x as usize
            }
            AtomExpr::TotalHCount(h) => atom.hydrogen_count + explicit_h_count(ctx.mol, idx) == *h,
            AtomExpr::RingMembership(n) => ctx.rings.ring_count(idx) == *n as usize,
            AtomExpr::InRing => ctx.rings.is_ring_atom(idx),
            AtomExpr::NotInRing => !ctx.rings.is_ring_atom(idx),
            AtomExpr::SmallestRingSize(r) => {
                ctx.rings.smallest_ring_size(idx) == Some(*r as usize)
            }
            AtomExpr::Charge(c) => atom.formal_charge == *c,
            AtomExpr::Recursive(inner) => super::matches_at(ctx, inner, idx),
            AtomExpr::And(exprs) => exprs.iter().all(|e| e.matches(ctx, idx)),
            AtomExpr::Or(exprs) => exprs.iter().any(|e| e.matches(ctx, idx)),
            AtomExpr::Not(expr) => !expr.matches(ctx, idx),
        }
    }

    /// The expression itself, or the members of a top-level conjunction.
    fn conjuncts(&self) -> &[AtomExpr] {
        match self {
            AtomExpr::And(parts) => parts,
            other => std::slice::from_ref(other),
        }
    }

    pub fn map_class(&self) -> Option<u16> {
        self.conjuncts().iter().find_map(|e| match e {
            AtomExpr::AtomMapClass(n) if *n > 0 => Some(*n),
            _ => None,
        })
    }

    /// Element stated unconditionally by the expression.
    pub fn element(&self) -> Option<(u8, Option<bool>)> {
        self.conjuncts().iter().find_map(|e| match e {
            AtomExpr::Element {
                atomic_num,
                aromatic,
            } => Some((*atomic_num, *aromatic)),
            _ => None,
        })
    }

    /// Aromaticity stated unconditionally, either through the element case
    /// or through `a`/`A`.
    pub fn aromaticity(&self) -> Option<bool> {
        self.conjuncts().iter().find_map(|e| match e {
            AtomExpr::Element { aromatic, .. } => *aromatic,
            AtomExpr::Aromatic => Some(true),
            AtomExpr::Aliphatic => Some(false),
            _ => None,
        })
    }

    pub fn total_h(&self) -> Option<u8> {
        self.conjuncts().iter().find_map(|e| match e {
            AtomExpr::TotalHCount(h) => Some(*h),
            _ => None,
        })
    }

    pub fn charge(&self) -> Option<i8> {
        self.conjuncts().iter().find_map(|e| match e {
            AtomExpr::Charge(c) => Some(*c),
            _ => None,
        })
    }

    pub fn isotope(&self) -> Option<u16> {
        self.conjuncts().iter().find_map(|e| match e {
            AtomExpr::Isotope(i) => Some(*i),
            _ => None,
        })
    }
}

impl BondExpr {
    pub fn matches(&self, ctx: &MatchContext, edge: EdgeIndex) -> bool {
        let order = ctx.mol.bond(edge).order;
        match self {
            BondExpr::True => true,
            BondExpr::Single => order == BondOrder::Single,
            BondExpr::Double => order == BondOrder::Double,
            BondExpr::Triple => order == BondOrder::Triple,
            BondExpr::Aromatic => order == BondOrder::Aromatic,
            BondExpr::SingleOrAromatic => {
                matches!(order, BondOrder::Single | BondOrder::Aromatic)
            }
            BondExpr::Ring => ctx.rings.is_ring_bond(edge),
            BondExpr::And(exprs) => exprs.iter().all(|e| e.matches(ctx, edge)),
            BondExpr::Or(exprs) => exprs.iter().any(|e| e.matches(ctx, edge)),
            BondExpr::Not(expr) => !expr.matches(ctx, edge),
        }
    }

    /// The concrete order this expression asks for, if it names exactly one.
    pub fn order(&self) -> Option<BondOrder> {
        match self {
            BondExpr::Single => Some(BondOrder::Single),
            BondExpr::Double => Some(BondOrder::Double),
            BondExpr::Triple => Some(BondOrder::Triple),
            BondExpr::Aromatic => Some(BondOrder::Aromatic),
            BondExpr::And(parts) => parts.iter().find_map(BondExpr::order),
            _ => None,
        }
    }
}

/// Writes the expression in SMARTS notation, without brackets. Used for
/// atom labels in reaction depictions.
impl fmt::Display for AtomExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomExpr::True => f.write_str("*"),
            AtomExpr::Element {
                atomic_num,
                aromatic,
            } => {
                let symbol = Element::from_atomic_num(*atomic_num).map_or("*", Element::symbol);
                match aromatic {
                    Some(true) => f.write_str(&symbol.to_ascii_lowercase()),
                    Some(false) => f.write_str(symbol),
                    None => write!(f, "#{atomic_num}"),
                }
            }
            AtomExpr::Aromatic => f.write_str("a"),
            AtomExpr::Aliphatic => f.write_str("A"),
            AtomExpr::Isotope(i) => write!(f, "{i}"),
            AtomExpr::Degree(d) => write!(f, "D{d}"),
            AtomExpr::Valence(v) => write!(f, "v{v}"),
            AtomExpr::Connectivity(x) => write!(f, "X{x}"),
            AtomExpr::TotalHCount(1) => f.write_str("H"),
            AtomExpr::TotalHCount(h) => write!(f, "H{h}"),
            AtomExpr::RingMembership(n) => write!(f, "R{n}"),
            AtomExpr::InRing => f.write_str("R"),
            AtomExpr::NotInRing => f.write_str("R0"),
            AtomExpr::SmallestRingSize(r) => write!(f, "r{r}"),
            AtomExpr::Charge(1) => f.write_str("+"),
            AtomExpr::Charge(-1) => f.write_str("-"),
            AtomExpr::Charge(c) if *c > 0 => write!(f, "+{c}"),
            AtomExpr::Charge(c) => write!(f, "{c}"),
            AtomExpr::AtomMapClass(n) => write!(f, ":{n}"),
            AtomExpr::Recursive(_) => f.write_str("$(...)"),
            AtomExpr::And(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    let attaches = matches!(
                        part,
                        AtomExpr::TotalHCount(_) | AtomExpr::Charge(_) | AtomExpr::AtomMapClass(_)
                    ) || matches!(part, AtomExpr::Element { .. })
                        && matches!(parts.first(), Some(AtomExpr::Isotope(_)));
                    if i > 0 && !attaches {
                        f.write_str("&")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
            AtomExpr::Or(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
            AtomExpr::Not(inner) => write!(f, "!{inner}"),
        }
    }
}

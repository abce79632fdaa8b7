use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::element::Element;
use crate::mol::Mol;

/// An atom whose bonds and hydrogens exceed every allowed valence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("atom {} ({}): valence {actual} exceeds allowed {allowed:?}", .atom.index(), symbol(.atomic_num))]
pub struct ValenceError {
    pub atom: NodeIndex,
    pub atomic_num: u8,
    pub actual: u8,
    pub allowed: &'static [u8],
}

fn symbol(atomic_num: &u8) -> &'static str {
    Element::from_atomic_num(*atomic_num).map_or("*", Element::symbol)
}

/// Sum of bond valence contributions at `atom` (aromatic bonds count one).
pub fn bond_order_sum(mol: &Mol<Atom, Bond>, atom: NodeIndex) -> u8 {
    mol.bonds_of(atom)
        .map(|e| mol.bond(e).order.valence())
        .fold(0u8, u8::saturating_add)
}

/// Bond valence plus suppressed hydrogens.
pub fn total_valence(mol: &Mol<Atom, Bond>, atom: NodeIndex) -> u8 {
    bond_order_sum(mol, atom).saturating_add(mol.atom(atom).hydrogen_count)
}

/// Hydrogens needed to bring `atom` up to its lowest default valence that
/// accommodates `bond_sum`.
///
/// Charge shifts the valence list to the isoelectronic element. Aromatic
/// atoms that still have room give one valence to the ring. Elements
/// without default valences get none.
pub fn default_hydrogens(atom: &Atom, bond_sum: u8) -> u8 {
    let Some(element) = atom.element() else {
        return 0;
    };
    let valences = element.charged_valences(atom.formal_charge);
    let Some(&target) = valences.iter().find(|&&v| v >= bond_sum) else {
        return 0;
    };
    let h = target - bond_sum;
    if atom.is_aromatic && h > 0 {
        h - 1
    } else {
        h
    }
}

/// Checks every atom against the maximum of its (charge-adjusted) default
/// valences. Elements without a valence model are not checked.
pub fn check_valences(mol: &Mol<Atom, Bond>) -> Result<(), ValenceError> {
    for idx in mol.atoms() {
        let atom = mol.atom(idx);
        let Some(element) = atom.element() else {
            continue;
        };
        let allowed = element.charged_valences(atom.formal_charge);
        let Some(&max) = allowed.iter().max() else {
            continue;
        };
        let actual = total_valence(mol, idx);
        if actual > max {
            return Err(ValenceError {
                atom: idx,
                atomic_num: atom.atomic_num,
                actual,
                allowed,
            });
        }
    }
    Ok(())
}

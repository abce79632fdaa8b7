use std::collections::BTreeMap;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::mol::Mol;
use crate::smiles::error::SmilesError;
use crate::smiles::tokenizer::{BondToken, Token};
use crate::valence::{bond_order_sum, default_hydrogens};

struct OpenRing {
    atom: NodeIndex,
    bond: Option<BondToken>,
}

/// Builds the molecular graph from a token stream.
///
/// Bonds without a symbol become aromatic between two aromatic atoms and
/// single otherwise. Bare atoms get hydrogens from their default valence;
/// bracket atoms carry exactly the hydrogens they state.
pub(crate) fn build_mol(tokens: &[Token]) -> Result<Mol<Atom, Bond>, SmilesError> {
    let mut mol: Mol<Atom, Bond> = Mol::new();
    let mut bare: Vec<bool> = Vec::new();
    let mut implicit_bonds: Vec<EdgeIndex> = Vec::new();

    let mut prev: Option<NodeIndex> = None;
    let mut pending: Option<(BondToken, usize)> = None;
    let mut branches: Vec<(Option<NodeIndex>, usize)> = Vec::new();
    let mut rings: BTreeMap<u16, OpenRing> = BTreeMap::new();

    for token in tokens {
        match token {
            Token::Atom(tok) => {
                let idx = mol.add_atom(Atom {
                    atomic_num: tok.element.atomic_num(),
                    formal_charge: tok.charge,
                    isotope: tok.isotope,
                    hydrogen_count: tok.hcount.unwrap_or(0),
                    is_aromatic: tok.is_aromatic,
                });
                bare.push(tok.hcount.is_none());
                match (prev, pending.take()) {
                    (Some(p), bond) => {
                        let bond = bond.map(|(b, _)| b);
                        let edge = mol.add_bond(p, idx, Bond::new(explicit_order(bond)));
                        if bond.is_none() {
                            implicit_bonds.push(edge);
                        }
                    }
                    (None, Some((_, pos))) => return Err(SmilesError::DanglingBond { pos }),
                    (None, None) => {}
                }
                prev = Some(idx);
            }
            Token::Bond { bond, pos } => {
                if prev.is_none() || pending.is_some() {
                    return Err(SmilesError::DanglingBond { pos: *pos });
                }
                pending = Some((*bond, *pos));
            }
            Token::RingClosure { digit, pos } => {
                let Some(atom) = prev else {
                    return Err(SmilesError::InvalidRingBond {
                        digit: *digit,
                        pos: *pos,
                    });
                };
                let bond = pending.take().map(|(b, _)| b);
                match rings.remove(digit) {
                    Some(open) => {
                        if open.atom == atom || mol.bond_between(open.atom, atom).is_some() {
                            return Err(SmilesError::InvalidRingBond {
                                digit: *digit,
                                pos: *pos,
                            });
                        }
                        let bond = match (open.bond, bond) {
                            (Some(a), Some(b)) if a != b => {
                                return Err(SmilesError::RingBondConflict { digit: *digit })
                            }
                            (a, b) => a.or(b),
                        };
                        let edge = mol.add_bond(open.atom, atom, Bond::new(explicit_order(bond)));
                        if bond.is_none() {
                            implicit_bonds.push(edge);
                        }
                    }
                    None => {
                        rings.insert(*digit, OpenRing { atom, bond });
                    }
                }
            }
            Token::OpenParen(pos) => {
                if prev.is_none() || pending.is_some() {
                    return Err(SmilesError::UnmatchedParen { pos: *pos });
                }
                branches.push((prev, *pos));
            }
            Token::CloseParen(pos) => {
                if let Some((_, bond_pos)) = pending {
                    return Err(SmilesError::DanglingBond { pos: bond_pos });
                }
                let Some((branch_root, _)) = branches.pop() else {
                    return Err(SmilesError::UnmatchedParen { pos: *pos });
                };
                prev = branch_root;
            }
            Token::Dot(_) => {
                if let Some((_, bond_pos)) = pending {
                    return Err(SmilesError::DanglingBond { pos: bond_pos });
                }
                prev = None;
            }
        }
    }

    if let Some((_, pos)) = pending {
        return Err(SmilesError::DanglingBond { pos });
    }
    if let Some((_, pos)) = branches.pop() {
        return Err(SmilesError::UnmatchedParen { pos });
    }
    if let Some((&digit, _)) = rings.iter().next() {
        return Err(SmilesError::UnclosedRing { digit });
    }
    if mol.is_empty() {
        return Err(SmilesError::EmptyInput);
    }

    for edge in implicit_bonds {
        if let Some((a, b)) = mol.bond_endpoints(edge) {
            if mol.atom(a).is_aromatic && mol.atom(b).is_aromatic {
                mol.bond_mut(edge).order = BondOrder::Aromatic;
            }
        }
    }

    let atoms: Vec<NodeIndex> = mol.atoms().collect();
    for idx in atoms {
        if bare[idx.index()] {
            let sum = bond_order_sum(&mol, idx);
            let h = default_hydrogens(mol.atom(idx), sum);
            mol.atom_mut(idx).hydrogen_count = h;
        }
    }

    Ok(mol)
}

fn explicit_order(bond: Option<BondToken>) -> BondOrder {
    match bond {
        Some(BondToken::Double) => BondOrder::Double,
        Some(BondToken::Triple) => BondOrder::Triple,
        Some(BondToken::Aromatic) => BondOrder::Aromatic,
        Some(BondToken::Single | BondToken::Directional) | None => BondOrder::Single,
    }
}

use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::mol::Mol;
use crate::rings::RingInfo;

/// Marks Kekulé-drawn rings as aromatic.
///
/// A ring qualifies when every atom can donate pi electrons and the total
/// satisfies Hückel's 4n+2 rule. Rings are revisited until nothing changes,
/// so fused systems whose inner atoms only carry an exocyclic double bond
/// (naphthalene) are picked up once a neighbouring ring is aromatic.
/// Returns the number of atoms newly marked aromatic.
pub fn perceive_aromaticity(mol: &mut Mol<Atom, Bond>, rings: &RingInfo) -> usize {
    let mut marked = 0;
    let mut done = vec![false; rings.num_rings()];
    loop {
        let mut changed = false;
        for (i, ring) in rings.rings().iter().enumerate() {
            if done[i] {
                continue;
            }
            if ring.iter().all(|&a| mol.atom(a).is_aromatic) && ring_bonds_aromatic(mol, ring) {
                done[i] = true;
                continue;
            }
            let Some(total) = ring_pi_electrons(mol, ring) else {
                continue;
            };
            if !is_huckel(total) {
                continue;
            }
            done[i] = true;
            changed = true;
            for &a in ring {
                if !mol.atom(a).is_aromatic {
                    mol.atom_mut(a).is_aromatic = true;
                    marked += 1;
                }
            }
            for k in 0..ring.len() {
                let (a, b) = (ring[k], ring[(k + 1) % ring.len()]);
                if let Some(e) = mol.bond_between(a, b) {
                    mol.bond_mut(e).order = BondOrder::Aromatic;
                }
            }
        }
        if !changed {
            break;
        }
    }
    marked
}

fn ring_bonds_aromatic(mol: &Mol<Atom, Bond>, ring: &[NodeIndex]) -> bool {
    (0..ring.len()).all(|k| {
        mol.bond_between(ring[k], ring[(k + 1) % ring.len()])
            .is_some_and(|e| mol.bond(e).order == BondOrder::Aromatic)
    })
}

fn ring_pi_electrons(mol: &Mol<Atom, Bond>, ring: &[NodeIndex]) -> Option<u32> {
    ring.iter()
        .map(|&a| pi_electrons(mol, a, ring).map(u32::from))
        .sum()
}

fn is_huckel(electrons: u32) -> bool {
    electrons >= 2 && (electrons - 2) % 4 == 0
}

fn pi_electrons(mol: &Mol<Atom, Bond>, idx: NodeIndex, ring: &[NodeIndex]) -> Option<u8> {
    let atom = mol.atom(idx);
    let mut ring_double = false;
    let mut exo_double_hetero = false;
    let mut exo_double_carbon = false;
    for e in mol.bonds_of(idx) {
        let (a, b) = mol.bond_endpoints(e)?;
        let other = if a == idx { b } else { a };
        match mol.bond(e).order {
            BondOrder::Triple => return None,
            BondOrder::Double if ring.contains(&other) => ring_double = true,
            BondOrder::Double if mol.atom(other).atomic_num == 6 => exo_double_carbon = true,
            BondOrder::Double => exo_double_hetero = true,
            _ => {}
        }
    }
    let any_double = ring_double || exo_double_hetero || exo_double_carbon;
    let connections = mol.degree(idx) + atom.hydrogen_count as usize;

    if atom.is_aromatic && !ring_double {
        // Already part of a perceived neighbouring ring.
        return match atom.atomic_num {
            7 | 15 if connections == 3 && atom.formal_charge == 0 && !any_double => Some(2),
            8 | 16 | 34 | 52 => Some(2),
            _ => Some(1),
        };
    }

    match (atom.atomic_num, atom.formal_charge) {
        (6, 0) if ring_double => Some(1),
        (6, 0) if exo_double_hetero => Some(0),
        (6, -1) if !any_double => Some(2),
        (6, 1) if !any_double => Some(0),
        (5, 0) if ring_double => Some(1),
        (5, 0) if !any_double => Some(0),
        (7 | 15, 0) if ring_double => Some(1),
        (7 | 15, 0) if !any_double && connections == 3 => Some(2),
        (7, 1) if ring_double => Some(1),
        (16 | 34 | 52, 0) if ring_double => Some(1),
        (8 | 16 | 34 | 52, 0) if !any_double && connections == 2 => Some(2),
        _ => None,
    }
}

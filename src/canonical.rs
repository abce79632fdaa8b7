use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::mol::Mol;
use crate::rings::RingInfo;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
struct AtomInvariant {
    atomic_num: u8,
    degree: usize,
    hydrogen_count: u8,
    formal_charge: i8,
    isotope: u16,
    is_aromatic: bool,
    in_ring: bool,
    bond_orders: Vec<BondOrder>,
}

fn atom_invariant(mol: &Mol<Atom, Bond>, rings: &RingInfo, idx: NodeIndex) -> AtomInvariant {
    let atom = mol.atom(idx);
    let mut bond_orders: Vec<BondOrder> = mol.bonds_of(idx).map(|e| mol.bond(e).order).collect();
    bond_orders.sort();
    AtomInvariant {
        atomic_num: atom.atomic_num,
        degree: bond_orders.len(),
        hydrogen_count: atom.hydrogen_count,
        formal_charge: atom.formal_charge,
        isotope: atom.isotope,
        is_aromatic: atom.is_aromatic,
        in_ring: rings.is_ring_atom(idx),
        bond_orders,
    }
}

/// Dense ranks (0, 1, 2, ...) of `keys`; equal keys share a rank.
fn dense_ranks<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    let mut ranks = vec![0; keys.len()];
    let mut rank = 0;
    for (pos, &i) in order.iter().enumerate() {
        if pos > 0 && keys[order[pos - 1]] != keys[i] {
            rank += 1;
        }
        ranks[i] = rank;
    }
    ranks
}

fn class_count(ranks: &[usize]) -> usize {
    ranks.iter().max().map_or(0, |&m| m + 1)
}

fn refine(mol: &Mol<Atom, Bond>, ranks: &mut Vec<usize>) {
    loop {
        let keys: Vec<(usize, Vec<(usize, BondOrder)>)> = mol
            .atoms()
            .map(|idx| {
                let mut env: Vec<(usize, BondOrder)> = mol
                    .bonds_of(idx)
                    .filter_map(|e| {
                        let (a, b) = mol.bond_endpoints(e)?;
                        let other = if a == idx { b } else { a };
                        Some((ranks[other.index()], mol.bond(e).order))
                    })
                    .collect();
                env.sort();
                (ranks[idx.index()], env)
            })
            .collect();
        let next = dense_ranks(&keys);
        let done = class_count(&next) == class_count(ranks);
        *ranks = next;
        if done {
            break;
        }
    }
}

/// Canonical rank of every atom, indexed by atom index.
///
/// Ranks are a permutation of `0..atom_count`. Two molecules that differ
/// only in atom order get ranks that map equivalent atoms onto each other,
/// which makes the SMILES writer's output independent of input order.
pub fn canonical_ordering(mol: &Mol<Atom, Bond>) -> Vec<usize> {
    let n = mol.atom_count();
    if n == 0 {
        return Vec::new();
    }
    let rings = RingInfo::perceive(mol);
    let invariants: Vec<AtomInvariant> = mol
        .atoms()
        .map(|idx| atom_invariant(mol, &rings, idx))
        .collect();
    let mut ranks = dense_ranks(&invariants);
    refine(mol, &mut ranks);

    while class_count(&ranks) < n {
        let tied = lowest_tied_rank(&ranks);
        let chosen = ranks.iter().position(|&r| r == tied).unwrap_or(0);
        let keys: Vec<(usize, bool)> = ranks
            .iter()
            .enumerate()
            .map(|(i, &r)| (r, i != chosen))
            .collect();
        ranks = dense_ranks(&keys);
        refine(mol, &mut ranks);
    }
    ranks
}

fn lowest_tied_rank(ranks: &[usize]) -> usize {
    let mut counts = vec![0usize; ranks.len()];
    for &r in ranks {
        counts[r] += 1;
    }
    counts.iter().position(|&c| c > 1).unwrap_or(0)
}

use std::collections::VecDeque;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::mol::Mol;

/// Ring perception result.
///
/// The ring set holds, for every ring bond, the smallest cycle through that
/// bond. For fused and bridged systems this is a superset of the SSSR that
/// is independent of atom order, which is what matching and aromaticity
/// perception need.
#[derive(Debug, Clone)]
pub struct RingInfo {
    rings: Vec<Vec<NodeIndex>>,
    ring_bonds: Vec<bool>,
    atom_ring_count: Vec<usize>,
    atom_smallest: Vec<Option<usize>>,
}

impl RingInfo {
    pub fn perceive<A, B>(mol: &Mol<A, B>) -> Self {
        let mut rings: Vec<Vec<NodeIndex>> = Vec::new();
        let mut ring_bonds = vec![false; mol.bond_count()];

        for edge in mol.bonds() {
            let Some((a, b)) = mol.bond_endpoints(edge) else {
                continue;
            };
            if let Some(path) = shortest_path_avoiding(mol, a, b, edge) {
                ring_bonds[edge.index()] = true;
                let ring = normalize_ring(&path);
                if !rings.contains(&ring) {
                    rings.push(ring);
                }
            }
        }
        rings.sort_by(|x, y| x.len().cmp(&y.len()).then_with(|| x.cmp(y)));

        let mut atom_ring_count = vec![0; mol.atom_count()];
        let mut atom_smallest: Vec<Option<usize>> = vec![None; mol.atom_count()];
        for ring in &rings {
            for atom in ring {
                atom_ring_count[atom.index()] += 1;
                let slot = &mut atom_smallest[atom.index()];
                *slot = Some(slot.map_or(ring.len(), |s| s.min(ring.len())));
            }
        }

        Self {
            rings,
            ring_bonds,
            atom_ring_count,
            atom_smallest,
        }
    }

    pub fn num_rings(&self) -> usize {
        self.rings.len()
    }

    /// Rings ordered by size, each as atoms in cycle order.
    pub fn rings(&self) -> &[Vec<NodeIndex>] {
        &self.rings
    }

    pub fn is_ring_atom(&self, atom: NodeIndex) -> bool {
        self.atom_ring_count.get(atom.index()).is_some_and(|&c| c > 0)
    }

    pub fn is_ring_bond(&self, bond: EdgeIndex) -> bool {
        self.ring_bonds.get(bond.index()).copied().unwrap_or(false)
    }

    /// Number of perceived rings containing `atom`.
    pub fn ring_count(&self, atom: NodeIndex) -> usize {
        self.atom_ring_count.get(atom.index()).copied().unwrap_or(0)
    }

    pub fn smallest_ring_size(&self, atom: NodeIndex) -> Option<usize> {
        self.atom_smallest.get(atom.index()).copied().flatten()
    }
}

fn shortest_path_avoiding<A, B>(
    mol: &Mol<A, B>,
    from: NodeIndex,
    to: NodeIndex,
    skip: EdgeIndex,
) -> Option<Vec<NodeIndex>> {
    let mut prev: Vec<Option<NodeIndex>> = vec![None; mol.atom_count()];
    let mut seen = vec![false; mol.atom_count()];
    let mut queue = VecDeque::new();
    seen[from.index()] = true;
    queue.push_back(from);

    while let Some(cur) = queue.pop_front() {
        if cur == to {
            let mut path = vec![to];
            let mut at = to;
            while let Some(p) = prev[at.index()] {
                path.push(p);
                at = p;
            }
            return Some(path);
        }
        for edge in mol.bonds_of(cur) {
            if edge == skip {
                continue;
            }
            let Some((a, b)) = mol.bond_endpoints(edge) else {
                continue;
            };
            let nb = if a == cur { b } else { a };
            if !seen[nb.index()] {
                seen[nb.index()] = true;
                prev[nb.index()] = Some(cur);
                queue.push_back(nb);
            }
        }
    }
    None
}

/// Rotates a cycle to start at its lowest index and walks it in the
/// direction of the smaller second atom.
fn normalize_ring(ring: &[NodeIndex]) -> Vec<NodeIndex> {
    let n = ring.len();
    let start = (0..n).min_by_key(|&i| ring[i]).unwrap_or(0);
    let forward: Vec<NodeIndex> = (0..n).map(|k| ring[(start + k) % n]).collect();
    let backward: Vec<NodeIndex> = (0..n).map(|k| ring[(start + n - k) % n]).collect();
    if n > 2 && backward[1] < forward[1] {
        backward
    } else {
        forward
    }
}

use std::collections::VecDeque;
use std::f64::consts::PI;

use petgraph::graph::NodeIndex;

use crate::mol::Mol;

/// A 2D position in bond-length units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

const MAX_ITERATIONS: usize = 300;
const TOLERANCE: f64 = 1e-5;
/// Horizontal space between packed fragments.
const FRAGMENT_GAP: f64 = 1.5;
/// Target distance per bond hop beyond the first, giving 120 degree zigzags.
const ZIGZAG: f64 = 0.866;

/// 2D coordinates for every atom, one stress-majorised layout per
/// connected fragment, fragments packed left to right and centred on y = 0.
pub fn compute_coords<A, B>(mol: &Mol<A, B>) -> Vec<Point> {
    let mut coords = vec![Point::default(); mol.atom_count()];
    let mut offset = 0.0;
    for component in mol.components() {
        let local = layout_fragment(mol, &component);
        let (min_x, max_x) = extent(local.iter().map(|p| p.x));
        let (min_y, max_y) = extent(local.iter().map(|p| p.y));
        let mid_y = (min_y + max_y) / 2.0;
        for (idx, p) in component.iter().zip(&local) {
            coords[idx.index()] = Point::new(p.x - min_x + offset, p.y - mid_y);
        }
        offset += (max_x - min_x) + FRAGMENT_GAP;
    }
    coords
}

/// Minimum and maximum of a non-empty sequence; `(0, 0)` when empty.
pub(crate) fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo > hi {
        (0.0, 0.0)
    } else {
        (lo, hi)
    }
}

fn layout_fragment<A, B>(mol: &Mol<A, B>, atoms: &[NodeIndex]) -> Vec<Point> {
    let n = atoms.len();
    if n == 1 {
        return vec![Point::default()];
    }
    let dist = target_distances(mol, atoms);

    // Start on a circle so no two atoms coincide.
    let radius = (n as f64 / (2.0 * PI)).max(0.5);
    let mut pos: Vec<Point> = (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            Point::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect();

    for _ in 0..MAX_ITERATIONS {
        let mut moved = 0.0;
        for i in 0..n {
            let (mut sx, mut sy, mut wsum) = (0.0, 0.0, 0.0);
            for j in 0..n {
                if i == j {
                    continue;
                }
                let d = dist[i][j];
                let w = 1.0 / (d * d);
                let dx = pos[i].x - pos[j].x;
                let dy = pos[i].y - pos[j].y;
                let norm = dx.hypot(dy).max(1e-9);
                sx += w * (pos[j].x + d * dx / norm);
                sy += w * (pos[j].y + d * dy / norm);
                wsum += w;
            }
            let next = Point::new(sx / wsum, sy / wsum);
            moved += next.distance(pos[i]);
            pos[i] = next;
        }
        if moved / (n as f64) < TOLERANCE {
            break;
        }
    }
    pos
}

/// Ideal pairwise distances inside one fragment, derived from bond hops.
fn target_distances<A, B>(mol: &Mol<A, B>, atoms: &[NodeIndex]) -> Vec<Vec<f64>> {
    let mut local = vec![usize::MAX; mol.atom_count()];
    for (i, idx) in atoms.iter().enumerate() {
        local[idx.index()] = i;
    }
    atoms
        .iter()
        .map(|&start| {
            let mut hops = vec![usize::MAX; atoms.len()];
            hops[local[start.index()]] = 0;
            let mut queue = VecDeque::from([start]);
            while let Some(cur) = queue.pop_front() {
                let h = hops[local[cur.index()]];
                for nb in mol.neighbors(cur) {
                    let slot = &mut hops[local[nb.index()]];
                    if *slot == usize::MAX {
                        *slot = h + 1;
                        queue.push_back(nb);
                    }
                }
            }
            hops.into_iter()
                .map(|h| match h {
                    0 => 0.0,
                    1 => 1.0,
                    h => h as f64 * ZIGZAG,
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn coords(smiles: &str) -> Vec<Point> {
        let mol = from_smiles(smiles).unwrap_or_else(|e| panic!("bad SMILES {smiles:?}: {e}"));
        compute_coords(&mol)
    }

    #[test]
    fn single_atom_sits_at_origin() {
        assert_eq!(coords("C"), vec![Point::default()]);
    }

    #[test]
    fn bonded_atoms_are_about_one_unit_apart() {
        let mol = from_smiles("c1ccccc1").unwrap();
        let pts = compute_coords(&mol);
        for e in mol.bonds() {
            let (a, b) = mol.bond_endpoints(e).unwrap();
            let d = pts[a.index()].distance(pts[b.index()]);
            assert!((0.6..1.4).contains(&d), "bond length {d}");
        }
    }

    #[test]
    fn all_coordinates_are_finite_and_distinct() {
        let pts = coords("CC(=O)Oc1ccccc1C(=O)O");
        assert!(pts.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        for i in 0..pts.len() {
            for j in i + 1..pts.len() {
                assert!(pts[i].distance(pts[j]) > 0.25, "atoms {i} and {j} overlap");
            }
        }
    }

    #[test]
    fn fragments_are_packed_left_to_right() {
        let pts = coords("CCO.[Na+]");
        let max_first = pts[..3].iter().map(|p| p.x).fold(f64::MIN, f64::max);
        assert!(pts[3].x > max_first);
    }

    #[test]
    fn layout_is_deterministic() {
        assert_eq!(coords("CC(C)CC1CCCCC1"), coords("CC(C)CC1CCCCC1"));
    }
}

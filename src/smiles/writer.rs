use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::canonical::canonical_ordering;
use crate::mol::Mol;
use crate::valence::{bond_order_sum, default_hydrogens};

/// Writes SMILES in input atom order. Fragments follow atom order too.
pub fn to_smiles(mol: &Mol<Atom, Bond>) -> String {
    let ranks: Vec<usize> = (0..mol.atom_count()).collect();
    mol.components()
        .iter()
        .map(|comp| write_fragment(mol, comp, &ranks))
        .collect::<Vec<_>>()
        .join(".")
}

/// Writes canonical SMILES: equal molecules give equal strings regardless
/// of atom order.
///
/// # Examples
///
/// ```
/// use rxnpredict::smiles::{from_smiles, to_canonical_smiles};
///
/// let a = to_canonical_smiles(&from_smiles("OCC").unwrap());
/// let b = to_canonical_smiles(&from_smiles("C(O)C").unwrap());
/// assert_eq!(a, b);
/// ```
pub fn to_canonical_smiles(mol: &Mol<Atom, Bond>) -> String {
    let ranks = canonical_ordering(mol);
    let mut parts: Vec<String> = mol
        .components()
        .iter()
        .map(|comp| write_fragment(mol, comp, &ranks))
        .collect();
    parts.sort();
    parts.join(".")
}

struct FragmentWriter<'a> {
    mol: &'a Mol<Atom, Bond>,
    ranks: &'a [usize],
    visited: Vec<bool>,
    children: Vec<Vec<NodeIndex>>,
    closures: Vec<Vec<EdgeIndex>>,
    ring_edges: Vec<EdgeIndex>,
    open: HashMap<EdgeIndex, u16>,
    in_use: BTreeSet<u16>,
    out: String,
}

fn write_fragment(mol: &Mol<Atom, Bond>, component: &[NodeIndex], ranks: &[usize]) -> String {
    let Some(&start) = component.iter().min_by_key(|a| ranks[a.index()]) else {
        return String::new();
    };
    let n = mol.atom_count();
    let mut w = FragmentWriter {
        mol,
        ranks,
        visited: vec![false; n],
        children: vec![Vec::new(); n],
        closures: vec![Vec::new(); n],
        ring_edges: Vec::new(),
        open: HashMap::new(),
        in_use: BTreeSet::new(),
        out: String::new(),
    };
    w.explore(start, None);
    w.emit(start);
    w.out
}

impl FragmentWriter<'_> {
    fn sorted_neighbors(&self, atom: NodeIndex) -> Vec<NodeIndex> {
        let mut nbs: Vec<NodeIndex> = self.mol.neighbors(atom).collect();
        nbs.sort_by_key(|n| self.ranks[n.index()]);
        nbs
    }

    /// Builds the DFS spanning tree and records ring-closure bonds on both
    /// of their atoms.
    fn explore(&mut self, atom: NodeIndex, parent: Option<NodeIndex>) {
        self.visited[atom.index()] = true;
        for nb in self.sorted_neighbors(atom) {
            if Some(nb) == parent {
                continue;
            }
            if self.visited[nb.index()] {
                let Some(edge) = self.mol.bond_between(atom, nb) else {
                    continue;
                };
                if !self.ring_edges.contains(&edge) {
                    self.ring_edges.push(edge);
                    self.closures[nb.index()].push(edge);
                    self.closures[atom.index()].push(edge);
                }
            } else {
                self.children[atom.index()].push(nb);
                self.explore(nb, Some(atom));
            }
        }
    }

    fn emit(&mut self, atom: NodeIndex) {
        write_atom(self.mol, atom, &mut self.out);

        let closures = std::mem::take(&mut self.closures[atom.index()]);
        for edge in closures {
            match self.open.remove(&edge) {
                Some(digit) => {
                    self.write_bond(edge);
                    self.in_use.remove(&digit);
                    write_ring_digit(digit, &mut self.out);
                }
                None => {
                    let digit = (1u16..)
                        .find(|d| !self.in_use.contains(d))
                        .unwrap_or(1);
                    self.in_use.insert(digit);
                    self.open.insert(edge, digit);
                    write_ring_digit(digit, &mut self.out);
                }
            }
        }

        let children = std::mem::take(&mut self.children[atom.index()]);
        let last = children.len().saturating_sub(1);
        for (i, child) in children.into_iter().enumerate() {
            let branch = i < last;
            if branch {
                self.out.push('(');
            }
            if let Some(edge) = self.mol.bond_between(atom, child) {
                self.write_bond(edge);
            }
            self.emit(child);
            if branch {
                self.out.push(')');
            }
        }
    }

    fn write_bond(&mut self, edge: EdgeIndex) {
        let Some((a, b)) = self.mol.bond_endpoints(edge) else {
            return;
        };
        let both_aromatic = self.mol.atom(a).is_aromatic && self.mol.atom(b).is_aromatic;
        match self.mol.bond(edge).order {
            BondOrder::Single if both_aromatic => self.out.push('-'),
            BondOrder::Single => {}
            BondOrder::Aromatic if both_aromatic => {}
            order => self.out.push(order.symbol()),
        }
    }
}

fn write_ring_digit(digit: u16, out: &mut String) {
    if digit < 10 {
        out.push_str(&digit.to_string());
    } else {
        out.push_str(&format!("%{digit:02}"));
    }
}

fn write_atom(mol: &Mol<Atom, Bond>, idx: NodeIndex, out: &mut String) {
    let atom = mol.atom(idx);
    let Some(element) = atom.element() else {
        out.push('*');
        return;
    };
    let symbol = if atom.is_aromatic {
        element.symbol().to_ascii_lowercase()
    } else {
        element.symbol().to_string()
    };

    let organic = if atom.is_aromatic {
        element.is_aromatic_organic()
    } else {
        element.is_organic_subset()
    };
    let implied = default_hydrogens(atom, bond_order_sum(mol, idx));
    if organic && atom.formal_charge == 0 && atom.isotope == 0 && implied == atom.hydrogen_count {
        out.push_str(&symbol);
        return;
    }

    out.push('[');
    if atom.isotope > 0 {
        out.push_str(&atom.isotope.to_string());
    }
    out.push_str(&symbol);
    match atom.hydrogen_count {
        0 => {}
        1 => out.push('H'),
        h => out.push_str(&format!("H{h}")),
    }
    match atom.formal_charge {
        0 => {}
        1 => out.push('+'),
        -1 => out.push('-'),
        c if c > 0 => out.push_str(&format!("+{c}")),
        c => out.push_str(&format!("-{}", -(c as i16))),
    }
    out.push(']');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn canon(s: &str) -> String {
        to_canonical_smiles(&from_smiles(s).unwrap_or_else(|e| panic!("{s}: {e}")))
    }

    fn round_trip(s: &str) {
        let written = to_smiles(&from_smiles(s).unwrap());
        assert_eq!(canon(&written), canon(s), "{s} -> {written}");
    }

    #[test]
    fn simple_chains() {
        assert_eq!(to_smiles(&from_smiles("CCO").unwrap()), "CCO");
        assert_eq!(to_smiles(&from_smiles("CC(=O)O").unwrap()), "CC(=O)O");
    }

    #[test]
    fn brackets_only_when_needed() {
        assert_eq!(to_smiles(&from_smiles("[NH4+]").unwrap()), "[NH4+]");
        assert_eq!(to_smiles(&from_smiles("[13CH4]").unwrap()), "[13CH4]");
        assert_eq!(to_smiles(&from_smiles("[CH4]").unwrap()), "C");
        assert_eq!(to_smiles(&from_smiles("[H][H]").unwrap()), "[H][H]");
        assert_eq!(to_smiles(&from_smiles("[O-2]").unwrap()), "[O-2]");
    }

    #[test]
    fn ring_digits_switch_to_percent_form() {
        let mut out = String::new();
        write_ring_digit(7, &mut out);
        write_ring_digit(12, &mut out);
        assert_eq!(out, "7%12");
    }

    #[test]
    fn pyrrole_keeps_explicit_hydrogen() {
        let s = to_smiles(&from_smiles("c1cc[nH]c1").unwrap());
        assert!(s.contains("[nH]"), "{s}");
    }

    #[test]
    fn biphenyl_link_is_explicit_single() {
        let s = to_smiles(&from_smiles("c1ccccc1-c1ccccc1").unwrap());
        assert!(s.contains('-'), "{s}");
        round_trip("c1ccccc1-c1ccccc1");
    }

    #[test]
    fn round_trips() {
        for s in [
            "c1ccccc1",
            "C1CC2CCC1CC2",
            "c1ccc2ccccc2c1",
            "O=[N+]([O-])c1ccccc1",
            "CC(C)(C)C",
            "C1=CCCCC1",
            "[Na+].[Cl-]",
            "C%10CC%10",
        ] {
            round_trip(s);
        }
    }

    #[test]
    fn canonical_is_order_independent() {
        assert_eq!(canon("Brc1ccccc1"), canon("c1ccc(Br)cc1"));
        assert_eq!(canon("C1=CC=CC=C1"), canon("c1ccccc1"));
        assert_eq!(canon("OCC"), canon("CCO"));
        assert_eq!(canon("Cc1ccc(Cl)cc1"), canon("Clc1ccc(C)cc1"));
        assert_eq!(canon("[Cl-].[Na+]"), canon("[Na+].[Cl-]"));
    }

    #[test]
    fn canonical_distinguishes_isomers() {
        assert_ne!(canon("Cc1ccccc1Cl"), canon("Cc1ccc(Cl)cc1"));
        assert_ne!(canon("CCO"), canon("COC"));
    }

    #[test]
    fn many_rings_use_percent_digits() {
        let mut mol: Mol<Atom, Bond> = Mol::new();
        let atoms: Vec<NodeIndex> = (0..12)
            .map(|_| {
                mol.add_atom(Atom {
                    atomic_num: 6,
                    ..Atom::default()
                })
            })
            .collect();
        for i in 1..12 {
            mol.add_bond(atoms[0], atoms[i], Bond::default());
        }
        for i in 1..11 {
            mol.add_bond(atoms[i], atoms[i + 1], Bond::default());
        }
        let written = to_smiles(&mol);
        let reparsed = crate::smiles::parse_unchecked(&written).unwrap();
        assert_eq!(reparsed.bond_count(), mol.bond_count());
    }
}

use std::collections::VecDeque;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::mol::Mol;

/// Query atom to target atom pairs, ordered by query atom index.
pub type AtomMapping = Vec<(NodeIndex, NodeIndex)>;

pub fn has_substruct_match_with<A1, B1, A2, B2>(
    target: &Mol<A1, B1>,
    query: &Mol<A2, B2>,
    atom_match: impl Fn(NodeIndex, NodeIndex) -> bool,
    bond_match: impl Fn(EdgeIndex, EdgeIndex) -> bool,
) -> bool {
    get_substruct_match_with(target, query, atom_match, bond_match).is_some()
}

pub fn get_substruct_match_with<A1, B1, A2, B2>(
    target: &Mol<A1, B1>,
    query: &Mol<A2, B2>,
    atom_match: impl Fn(NodeIndex, NodeIndex) -> bool,
    bond_match: impl Fn(EdgeIndex, EdgeIndex) -> bool,
) -> Option<AtomMapping> {
    Vf2::new(target, query, atom_match, bond_match)
        .with_limit(1)
        .find_all()
        .into_iter()
        .next()
}

/// Every embedding of `query` in `target`.
///
/// Embeddings that cover the same target atoms in a different order are
/// all reported; callers that want unique atom sets filter them.
pub fn get_substruct_matches_with<A1, B1, A2, B2>(
    target: &Mol<A1, B1>,
    query: &Mol<A2, B2>,
    atom_match: impl Fn(NodeIndex, NodeIndex) -> bool,
    bond_match: impl Fn(EdgeIndex, EdgeIndex) -> bool,
) -> Vec<AtomMapping> {
    Vf2::new(target, query, atom_match, bond_match).find_all()
}

/// Whether `query` embeds in `target` with query atom 0 placed on `anchor`.
pub fn has_anchored_match_with<A1, B1, A2, B2>(
    target: &Mol<A1, B1>,
    query: &Mol<A2, B2>,
    anchor: NodeIndex,
    atom_match: impl Fn(NodeIndex, NodeIndex) -> bool,
    bond_match: impl Fn(EdgeIndex, EdgeIndex) -> bool,
) -> bool {
    if query.is_empty() || anchor.index() >= target.atom_count() {
        return false;
    }
    !Vf2::new(target, query, atom_match, bond_match)
        .with_anchor(anchor)
        .with_limit(1)
        .find_all()
        .is_empty()
}

struct Vf2<'a, A1, B1, A2, B2, FA, FB> {
    target: &'a Mol<A1, B1>,
    query: &'a Mol<A2, B2>,
    atom_match: FA,
    bond_match: FB,
    /// Query atoms in visiting order, each with the already-visited
    /// neighbour it was reached from.
    query_order: Vec<(NodeIndex, Option<NodeIndex>)>,
    query_map: Vec<Option<NodeIndex>>,
    target_used: Vec<bool>,
    anchor: Option<NodeIndex>,
    limit: Option<usize>,
}

impl<'a, A1, B1, A2, B2, FA, FB> Vf2<'a, A1, B1, A2, B2, FA, FB>
where
    FA: Fn(NodeIndex, NodeIndex) -> bool,
    FB: Fn(EdgeIndex, EdgeIndex) -> bool,
{
    fn new(
        target: &'a Mol<A1, B1>,
        query: &'a Mol<A2, B2>,
        atom_match: FA,
        bond_match: FB,
    ) -> Self {
        Self {
            target,
            query,
            atom_match,
            bond_match,
            query_order: bfs_order(query),
            query_map: vec![None; query.atom_count()],
            target_used: vec![false; target.atom_count()],
            anchor: None,
            limit: None,
        }
    }

    fn with_anchor(mut self, anchor: NodeIndex) -> Self {
        self.anchor = Some(anchor);
        self
    }

    fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn find_all(&mut self) -> Vec<AtomMapping> {
        let mut results = Vec::new();
        if self.query.is_empty() || self.query.atom_count() > self.target.atom_count() {
            return results;
        }
        self.recurse(0, &mut results);
        results
    }

    fn done(&self, results: &[AtomMapping]) -> bool {
        self.limit.is_some_and(|limit| results.len() >= limit)
    }

    fn recurse(&mut self, depth: usize, results: &mut Vec<AtomMapping>) {
        if depth == self.query_order.len() {
            let mapping = self
                .query_map
                .iter()
                .enumerate()
                .filter_map(|(q, t)| t.map(|t| (NodeIndex::new(q), t)))
                .collect();
            results.push(mapping);
            return;
        }

        let (query_node, parent) = self.query_order[depth];
        let candidates: Vec<NodeIndex> = match (depth, self.anchor, parent) {
            (0, Some(anchor), _) => vec![anchor],
            (_, _, Some(parent)) => match self.query_map[parent.index()] {
                Some(t_parent) => self.target.neighbors(t_parent).collect(),
                None => return,
            },
            _ => self.target.atoms().collect(),
        };

        for target_node in candidates {
            if self.target_used[target_node.index()] {
                continue;
            }
            if !self.is_feasible(query_node, target_node) {
                continue;
            }

            self.query_map[query_node.index()] = Some(target_node);
            self.target_used[target_node.index()] = true;

            self.recurse(depth + 1, results);

            self.query_map[query_node.index()] = None;
            self.target_used[target_node.index()] = false;

            if self.done(results) {
                return;
            }
        }
    }

    fn is_feasible(&self, query_node: NodeIndex, target_node: NodeIndex) -> bool {
        if self.target.degree(target_node) < self.query.degree(query_node) {
            return false;
        }
        if !(self.atom_match)(query_node, target_node) {
            return false;
        }

        for q_neighbor in self.query.neighbors(query_node) {
            if let Some(t_mapped) = self.query_map[q_neighbor.index()] {
                let Some(q_bond) = self.query.bond_between(query_node, q_neighbor) else {
                    continue;
                };
                match self.target.bond_between(target_node, t_mapped) {
                    Some(t_bond) => {
                        if !(self.bond_match)(q_bond, t_bond) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }

        true
    }
}

/// Breadth-first order over every component of the query, starting each
/// component from its lowest-index atom so atom 0 is always visited first.
fn bfs_order<A, B>(query: &Mol<A, B>) -> Vec<(NodeIndex, Option<NodeIndex>)> {
    let mut order = Vec::with_capacity(query.atom_count());
    let mut seen = vec![false; query.atom_count()];
    for root in query.atoms() {
        if seen[root.index()] {
            continue;
        }
        seen[root.index()] = true;
        let mut queue = VecDeque::from([(root, None)]);
        while let Some((node, parent)) = queue.pop_front() {
            order.push((node, parent));
            let mut next: Vec<NodeIndex> = query
                .neighbors(node)
                .filter(|n| !seen[n.index()])
                .collect();
            next.sort();
            for n in next {
                seen[n.index()] = true;
                queue.push_back((n, Some(node)));
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;
    use crate::{Atom, Bond};

    fn mol(smiles: &str) -> Mol<Atom, Bond> {
        from_smiles(smiles).unwrap_or_else(|e| panic!("bad SMILES {smiles:?}: {e}"))
    }

    fn matches(target: &Mol<Atom, Bond>, query: &Mol<Atom, Bond>) -> Vec<AtomMapping> {
        get_substruct_matches_with(
            target,
            query,
            |q, t| {
                let (q, t) = (query.atom(q), target.atom(t));
                q.atomic_num == t.atomic_num && q.is_aromatic == t.is_aromatic
            },
            |q, t| query.bond(q).order == target.bond(t).order,
        )
    }

    #[test]
    fn ethanol_contains_cc() {
        let target = mol("CCO");
        let query = mol("CC");
        let found = matches(&target, &query);
        // Both orientations of the C-C bond.
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|m| m.len() == 2));
    }

    #[test]
    fn methane_does_not_contain_cc() {
        let target = mol("C");
        let query = mol("CC");
        assert!(matches(&target, &query).is_empty());
    }

    #[test]
    fn mapping_is_ordered_by_query_atom() {
        let target = mol("OCC");
        let query = mol("CO");
        let found = matches(&target, &query);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0],
            vec![
                (NodeIndex::new(0), NodeIndex::new(1)),
                (NodeIndex::new(1), NodeIndex::new(0))
            ]
        );
    }

    #[test]
    fn bond_order_is_checked() {
        let target = mol("C=CC");
        let query = mol("C=C");
        assert_eq!(matches(&target, &query).len(), 2);
        let query = mol("CC");
        assert_eq!(matches(&target, &query).len(), 2);
    }

    #[test]
    fn ring_closure_bonds_must_exist() {
        let target = mol("CCCCCC");
        let query = mol("C1CCCCC1");
        assert!(matches(&target, &query).is_empty());
        let target = mol("C1CCCCC1");
        // Six starting atoms times two directions.
        assert_eq!(matches(&target, &query).len(), 12);
    }

    #[test]
    fn disconnected_query_uses_distinct_atoms() {
        let target = mol("CCO");
        let query = mol("C.O");
        assert_eq!(matches(&target, &query).len(), 2);
        let query = mol("O.O");
        assert!(matches(&target, &query).is_empty());
    }

    #[test]
    fn single_match_stops_early() {
        let target = mol("c1ccccc1");
        let query = mol("CC");
        let first = get_substruct_match_with(
            &target,
            &query,
            |q, t| query.atom(q).atomic_num == target.atom(t).atomic_num,
            |_, _| true,
        );
        let first = first.unwrap();
        assert_eq!(first.len(), 2);
        assert!(target.bond_between(first[0].1, first[1].1).is_some());
        assert!(has_substruct_match_with(&target, &query, |_, _| true, |_, _| true));
    }

    #[test]
    fn anchor_fixes_first_query_atom() {
        let target = mol("CCO");
        let query = mol("CO");
        let same = |q: NodeIndex, t: NodeIndex| {
            query.atom(q).atomic_num == target.atom(t).atomic_num
        };
        assert!(has_anchored_match_with(&target, &query, NodeIndex::new(1), same, |_, _| true));
        assert!(!has_anchored_match_with(&target, &query, NodeIndex::new(0), same, |_, _| true));
        assert!(!has_anchored_match_with(&target, &query, NodeIndex::new(9), same, |_, _| true));
    }
}

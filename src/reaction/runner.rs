use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::mol::Mol;
use crate::rings::RingInfo;
use crate::smarts::{get_smarts_matches_in, AtomExpr, BondExpr, MatchContext};
use crate::valence::{bond_order_sum, default_hydrogens};

use super::error::ReactionError;
use super::Reaction;

/// Upper bound on reactant match combinations tried by one [`Reaction::run`].
pub const MAX_COMBINATIONS: usize = 1000;

/// Target atom for each query atom of one reactant template.
type Embedding = Vec<NodeIndex>;

impl Reaction {
    /// Apply this reaction to a set of reactant molecules.
    ///
    /// Returns one result per match combination. Each result is a `Vec`
    /// of product molecules (one per product template). Returns an empty
    /// `Vec` if some template matches nothing. Combinations are not
    /// deduplicated: a symmetric reactant yields the same products once
    /// per equivalent embedding.
    pub fn run(
        &self,
        reactants: &[&Mol<Atom, Bond>],
    ) -> Result<Vec<Vec<Mol<Atom, Bond>>>, ReactionError> {
        if reactants.len() != self.reactant_templates.len() {
            return Err(ReactionError::WrongReactantCount {
                expected: self.reactant_templates.len(),
                got: reactants.len(),
            });
        }

        let per_template_matches: Vec<Vec<Embedding>> = self
            .reactant_templates
            .iter()
            .zip(reactants)
            .map(|(tmpl, &mol)| {
                let rings = RingInfo::perceive(mol);
                get_smarts_matches_in(&MatchContext::new(mol, &rings), tmpl)
                    .into_iter()
                    .map(|mapping| mapping.into_iter().map(|(_, t)| t).collect())
                    .collect()
            })
            .collect();

        if per_template_matches.iter().any(Vec::is_empty) {
            return Ok(Vec::new());
        }

        let combinations = cartesian_product(&per_template_matches, MAX_COMBINATIONS)?;

        let reactant_template_bonds = collect_mapped_bond_pairs(&self.reactant_templates);
        Ok(combinations
            .iter()
            .map(|combo| {
                let assembly = Assembly::new(self, reactants, combo, &reactant_template_bonds);
                self.product_templates
                    .iter()
                    .map(|tmpl| assembly.build(tmpl))
                    .collect()
            })
            .collect())
    }
}

fn cartesian_product<'a, T>(
    sets: &'a [Vec<T>],
    max: usize,
) -> Result<Vec<Vec<&'a T>>, ReactionError> {
    let total = sets
        .iter()
        .try_fold(1usize, |acc, set| acc.checked_mul(set.len()))
        .filter(|&n| n <= max)
        .ok_or(ReactionError::TooManyCombinations { limit: max })?;

    let mut result: Vec<Vec<&'a T>> = Vec::with_capacity(total);
    result.push(Vec::new());
    for set in sets {
        result = result
            .iter()
            .flat_map(|combo| {
                set.iter().map(move |item| {
                    let mut next = combo.clone();
                    next.push(item);
                    next
                })
            })
            .collect();
    }
    Ok(result)
}

/// Pairs of map numbers bonded to each other in some template.
fn collect_mapped_bond_pairs(templates: &[Mol<AtomExpr, BondExpr>]) -> HashSet<(u16, u16)> {
    let mut pairs = HashSet::new();
    for tmpl in templates {
        for edge in tmpl.bonds() {
            let Some((a, b)) = tmpl.bond_endpoints(edge) else {
                continue;
            };
            if let (Some(ma), Some(mb)) = (tmpl.atom(a).map_class(), tmpl.atom(b).map_class()) {
                pairs.insert((ma.min(mb), ma.max(mb)));
            }
        }
    }
    pairs
}

/// What one match combination says about the reactants, shared by every
/// product template built from it.
struct Assembly<'a> {
    reactants: &'a [&'a Mol<Atom, Bond>],
    /// Map number to (reactant, atom).
    mapped: HashMap<u16, (usize, NodeIndex)>,
    /// Per reactant: matched atom to its map number, if any.
    matched: Vec<HashMap<NodeIndex, Option<u16>>>,
    reactant_template_bonds: &'a HashSet<(u16, u16)>,
}

impl<'a> Assembly<'a> {
    fn new(
        reaction: &Reaction,
        reactants: &'a [&'a Mol<Atom, Bond>],
        combo: &[&Embedding],
        reactant_template_bonds: &'a HashSet<(u16, u16)>,
    ) -> Self {
        let mut mapped = HashMap::new();
        let mut matched = vec![HashMap::new(); reactants.len()];
        for (ri, (tmpl, embedding)) in reaction.reactant_templates.iter().zip(combo).enumerate() {
            for q in tmpl.atoms() {
                let t = embedding[q.index()];
                let map_num = tmpl.atom(q).map_class();
                if let Some(mn) = map_num {
                    mapped.insert(mn, (ri, t));
                }
                matched[ri].insert(t, map_num);
            }
        }
        Self {
            reactants,
            mapped,
            matched,
            reactant_template_bonds,
        }
    }

    fn build(&self, tmpl: &Mol<AtomExpr, BondExpr>) -> Mol<Atom, Bond> {
        let mut product: Mol<Atom, Bond> = Mol::new();
        let mut node_map: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut by_map_num: HashMap<u16, NodeIndex> = HashMap::new();
        // Template-derived product atoms with their reactant origin.
        let mut origins: Vec<(NodeIndex, Option<(usize, NodeIndex)>, bool)> = Vec::new();

        for p_idx in tmpl.atoms() {
            let expr = tmpl.atom(p_idx);
            let origin = expr
                .map_class()
                .and_then(|mn| self.mapped.get(&mn).copied());
            let mut atom = match origin {
                Some((ri, t)) => self.reactants[ri].atom(t).clone(),
                None => Atom::default(),
            };
            apply_expr(&mut atom, expr);
            let new_idx = product.add_atom(atom);
            node_map.insert(p_idx, new_idx);
            if let (Some(mn), Some(_)) = (expr.map_class(), origin) {
                by_map_num.insert(mn, new_idx);
            }
            origins.push((new_idx, origin, expr.total_h().is_some()));
        }

        for edge in tmpl.bonds() {
            let Some((a, b)) = tmpl.bond_endpoints(edge) else {
                continue;
            };
            let order = tmpl
                .bond(edge)
                .order()
                .or_else(|| self.reactant_order(tmpl.atom(a), tmpl.atom(b)))
                .unwrap_or(BondOrder::Single);
            product.add_bond(node_map[&a], node_map[&b], Bond::new(order));
        }

        let mut carried: HashMap<(usize, NodeIndex), NodeIndex> = HashMap::new();
        for &(p_node, origin, _) in &origins {
            let Some((ri, t)) = origin else {
                continue;
            };
            let reactant = self.reactants[ri];
            for nb in reactant.neighbors(t) {
                match self.matched[ri].get(&nb) {
                    // Matched atoms without a map number are consumed.
                    Some(None) => {}
                    Some(Some(n_mn)) => {
                        let Some(mn) = self.matched[ri].get(&t).copied().flatten() else {
                            continue;
                        };
                        let pair = (mn.min(*n_mn), mn.max(*n_mn));
                        // Template bonds were handled above, either kept or
                        // broken. Other bonds between mapped atoms survive.
                        if self.reactant_template_bonds.contains(&pair) {
                            continue;
                        }
                        if let Some(&other) = by_map_num.get(n_mn) {
                            copy_bond(&mut product, reactant, (t, nb), (p_node, other));
                        }
                    }
                    None => self.carry(&mut product, ri, t, nb, p_node, &mut carried),
                }
            }
        }

        for (idx, origin, explicit_h) in origins {
            if explicit_h {
                continue;
            }
            let bond_sum = bond_order_sum(&product, idx);
            let unchanged = origin.is_some_and(|(ri, t)| {
                let before = self.reactants[ri].atom(t);
                bond_order_sum(self.reactants[ri], t) == bond_sum
                    && before.formal_charge == product.atom(idx).formal_charge
            });
            if !unchanged {
                let h = default_hydrogens(product.atom(idx), bond_sum);
                product.atom_mut(idx).hydrogen_count = h;
            }
        }

        product
    }

    /// Reactant bond order between the atoms behind two mapped template
    /// atoms, when they come from the same reactant and are bonded there.
    fn reactant_order(&self, a: &AtomExpr, b: &AtomExpr) -> Option<BondOrder> {
        let (ra, ta) = *self.mapped.get(&a.map_class()?)?;
        let (rb, tb) = *self.mapped.get(&b.map_class()?)?;
        if ra != rb {
            return None;
        }
        let reactant = self.reactants[ra];
        reactant
            .bond_between(ta, tb)
            .map(|e| reactant.bond(e).order)
    }

    /// Copies the unmatched part of reactant `ri` reachable from `start`
    /// into the product, attached to `anchor`.
    fn carry(
        &self,
        product: &mut Mol<Atom, Bond>,
        ri: usize,
        from: NodeIndex,
        start: NodeIndex,
        anchor: NodeIndex,
        carried: &mut HashMap<(usize, NodeIndex), NodeIndex>,
    ) {
        let reactant = self.reactants[ri];
        if let Some(&existing) = carried.get(&(ri, start)) {
            // Reached again from another template atom: ring closure.
            copy_bond(product, reactant, (from, start), (anchor, existing));
            return;
        }

        let start_node = product.add_atom(reactant.atom(start).clone());
        carried.insert((ri, start), start_node);
        copy_bond(product, reactant, (from, start), (anchor, start_node));

        let mut queue = VecDeque::from([(start, start_node)]);
        while let Some((r_node, p_node)) = queue.pop_front() {
            for nb in reactant.neighbors(r_node) {
                if self.matched[ri].contains_key(&nb) {
                    continue;
                }
                if let Some(&existing) = carried.get(&(ri, nb)) {
                    copy_bond(product, reactant, (r_node, nb), (p_node, existing));
                    continue;
                }
                let nb_node = product.add_atom(reactant.atom(nb).clone());
                carried.insert((ri, nb), nb_node);
                copy_bond(product, reactant, (r_node, nb), (p_node, nb_node));
                queue.push_back((nb, nb_node));
            }
        }
    }
}

fn copy_bond(
    product: &mut Mol<Atom, Bond>,
    reactant: &Mol<Atom, Bond>,
    (ra, rb): (NodeIndex, NodeIndex),
    (pa, pb): (NodeIndex, NodeIndex),
) {
    if pa == pb || product.bond_between(pa, pb).is_some() {
        return;
    }
    if let Some(edge) = reactant.bond_between(ra, rb) {
        product.add_bond(pa, pb, reactant.bond(edge).clone());
    }
}

/// Overwrites the properties the product template states explicitly.
fn apply_expr(atom: &mut Atom, expr: &AtomExpr) {
    if let Some((atomic_num, _)) = expr.element() {
        atom.atomic_num = atomic_num;
    }
    if let Some(aromatic) = expr.aromaticity() {
        atom.is_aromatic = aromatic;
    }
    if let Some(charge) = expr.charge() {
        atom.formal_charge = charge;
    }
    if let Some(isotope) = expr.isotope() {
        atom.isotope = isotope;
    }
    if let Some(h) = expr.total_h() {
        atom.hydrogen_count = h;
    }
}

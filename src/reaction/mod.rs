pub mod error;
mod parser;
mod runner;

pub use error::{ReactionError, ReactionSmartsError};
pub use parser::parse_reaction_smarts;
pub use runner::MAX_COMBINATIONS;

use crate::mol::Mol;
use crate::smarts::{AtomExpr, BondExpr};

/// A parsed reaction template: query graphs for reactants, agents and
/// products, linked through atom map numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub(crate) reactant_templates: Vec<Mol<AtomExpr, BondExpr>>,
    pub(crate) product_templates: Vec<Mol<AtomExpr, BondExpr>>,
    pub(crate) agent_templates: Vec<Mol<AtomExpr, BondExpr>>,
}

impl Reaction {
    pub fn reactant_templates(&self) -> &[Mol<AtomExpr, BondExpr>] {
        &self.reactant_templates
    }

    pub fn product_templates(&self) -> &[Mol<AtomExpr, BondExpr>] {
        &self.product_templates
    }

    pub fn agent_templates(&self) -> &[Mol<AtomExpr, BondExpr>] {
        &self.agent_templates
    }

    /// Number of reactant molecules [`Reaction::run`] expects.
    pub fn reactant_count(&self) -> usize {
        self.reactant_templates.len()
    }
}

pub fn from_reaction_smarts(s: &str) -> Result<Reaction, ReactionSmartsError> {
    parse_reaction_smarts(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bond::{Bond, BondOrder};
    use crate::smiles::{from_smiles, to_canonical_smiles};
    use std::collections::BTreeSet;

    fn mol(smiles: &str) -> Mol<Atom, Bond> {
        from_smiles(smiles).unwrap_or_else(|e| panic!("bad SMILES {smiles:?}: {e}"))
    }

    fn canon(smiles: &str) -> String {
        to_canonical_smiles(&mol(smiles))
    }

    fn rxn(smarts: &str) -> Reaction {
        from_reaction_smarts(smarts).unwrap_or_else(|e| panic!("bad reaction {smarts:?}: {e}"))
    }

    /// Distinct canonical SMILES over every product of every combination.
    fn product_set(reaction: &Reaction, reactants: &[&str]) -> BTreeSet<String> {
        let mols: Vec<Mol<Atom, Bond>> = reactants.iter().map(|s| mol(s)).collect();
        let refs: Vec<&Mol<Atom, Bond>> = mols.iter().collect();
        reaction
            .run(&refs)
            .unwrap()
            .iter()
            .flatten()
            .map(to_canonical_smiles)
            .collect()
    }

    fn expect(smiles: &[&str]) -> BTreeSet<String> {
        smiles.iter().map(|s| canon(s)).collect()
    }

    #[test]
    fn parse_simple_reaction() {
        let r = rxn("[C:1][Br:2]>>[C:1][OH]");
        assert_eq!(r.reactant_count(), 1);
        assert_eq!(r.product_templates().len(), 1);
        assert!(r.agent_templates().is_empty());
    }

    #[test]
    fn parse_with_agents() {
        let r = rxn("[C:1]=[C:2]>[Pd]>[C:1][C:2]");
        assert_eq!(r.reactant_count(), 1);
        assert_eq!(r.agent_templates().len(), 1);
    }

    #[test]
    fn parse_errors() {
        assert!(from_reaction_smarts("[C][Br]").is_err());
        assert_eq!(
            from_reaction_smarts("[C:1]>>").unwrap_err(),
            ReactionSmartsError::EmptyProducts
        );
        assert_eq!(
            from_reaction_smarts(">>[C:1]").unwrap_err(),
            ReactionSmartsError::EmptyReactants
        );
    }

    #[test]
    fn bromination_of_benzene() {
        let r = rxn("[cH:1].[Br][Br]>>[c:1][Br]");
        assert_eq!(product_set(&r, &["c1ccccc1", "BrBr"]), expect(&["Brc1ccccc1"]));
    }

    #[test]
    fn symmetric_matches_are_all_enumerated() {
        let r = rxn("[cH:1].[Br][Br]>>[c:1][Br]");
        let benzene = mol("c1ccccc1");
        let bromine = mol("BrBr");
        // Six ring carbons times two orientations of Br-Br.
        assert_eq!(r.run(&[&benzene, &bromine]).unwrap().len(), 12);
    }

    #[test]
    fn chlorination_of_toluene_gives_three_isomers() {
        let r = rxn("[cH:1].[Cl][Cl]>>[c:1][Cl]");
        assert_eq!(
            product_set(&r, &["Cc1ccccc1", "ClCl"]),
            expect(&["Cc1ccccc1Cl", "Cc1cccc(Cl)c1", "Cc1ccc(Cl)cc1"])
        );
    }

    #[test]
    fn hydrogenation_saturates_double_bond() {
        let r = rxn("[C:1]=[C:2].[H][H]>>[C:1]-[C:2]");
        assert_eq!(product_set(&r, &["C=C", "[H][H]"]), expect(&["CC"]));
    }

    #[test]
    fn esterification_joins_acid_and_alcohol() {
        let r = rxn("[C:1](=O)O.[O:2][C:3]>>[C:1](=O)[O:2][C:3]");
        assert_eq!(product_set(&r, &["CC(=O)O", "CO"]), expect(&["COC(C)=O"]));
    }

    #[test]
    fn hydrolysis_splits_into_two_products() {
        let r = rxn("[C:1](=O)[O:2][C:3]>>[C:1](=O)O.[C:3][OH]");
        let ester = mol("CC(=O)OC");
        let results = r.run(&[&ester]).unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|products| products.len() == 2));
        assert_eq!(product_set(&r, &["CC(=O)OC"]), expect(&["CC(=O)O", "CO"]));
    }

    #[test]
    fn cannizzaro_charges_one_oxygen() {
        let r = rxn("[C:1]=O.[C:2]=O>>[C:1][OH].[C:2][O-]");
        assert_eq!(product_set(&r, &["C=O", "C=O"]), expect(&["CO", "C[O-]"]));
    }

    #[test]
    fn nitration_builds_charged_nitro_group() {
        let r = rxn("[cH:1].[O-][N+](=O)O>>[c:1][N+](=O)[O-]");
        assert_eq!(
            product_set(&r, &["c1ccccc1", "O[N+](=O)[O-]"]),
            expect(&["O=[N+]([O-])c1ccccc1"])
        );
    }

    #[test]
    fn friedel_crafts_acylation() {
        let r = rxn("[cH:1].[C:2](=O)Cl>>[c:1][C:2](=O)");
        assert_eq!(
            product_set(&r, &["c1ccccc1", "CC(=O)Cl"]),
            expect(&["CC(=O)c1ccccc1"])
        );
    }

    #[test]
    fn aldol_condensation() {
        let r = rxn("[C:1]=O.[CH3][C:2]=O>>[C:1]=C-[C:2]=O");
        assert_eq!(product_set(&r, &["CC=O", "CC=O"]), expect(&["CC=CC=O"]));
    }

    #[test]
    fn diels_alder_without_maps() {
        let r = rxn("C=CC=C.C=C>>C1=CCCCC1");
        assert_eq!(product_set(&r, &["C=CC=C", "C=C"]), expect(&["C1=CCCCC1"]));
    }

    #[test]
    fn decarboxylation_adds_explicit_hydrogen() {
        let r = rxn("[C:1](=O)[OH]>>[C:1][H]");
        let products = r.run(&[&mol("CC(=O)O")]).unwrap();
        assert_eq!(products.len(), 1);
        let product = &products[0][0];
        assert_eq!(product.atom_count(), 3);
        let h = product
            .atoms()
            .find(|&i| product.atom(i).atomic_num == 1)
            .unwrap();
        assert_eq!(product.degree(h), 1);
    }

    #[test]
    fn substituents_are_carried_over() {
        let r = rxn("[C:1][Br:2]>>[C:1][OH]");
        let products = r.run(&[&mol("CCCBr")]).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(to_canonical_smiles(&products[0][0]), canon("CCCO"));
    }

    #[test]
    fn ring_carried_through_mapped_atom_stays_closed() {
        let r = rxn("[C:1][Br:2]>>[C:1][OH]");
        assert_eq!(product_set(&r, &["BrC1CCCCC1"]), expect(&["OC1CCCCC1"]));
    }

    #[test]
    fn explicit_product_bond_order_wins() {
        let r = rxn("[C:1][C:2]>>[C:1]#[C:2]");
        let products = r.run(&[&mol("CC")]).unwrap();
        let product = &products[0][0];
        let edge = product.bonds().next().unwrap();
        assert_eq!(product.bond(edge).order, BondOrder::Triple);
        assert!(product.atoms().all(|i| product.atom(i).hydrogen_count == 1));
    }

    #[test]
    fn unspecified_product_bond_copies_reactant_bond() {
        let r = rxn("[C:1]=[C:2][Br:3]>>[C:1][C:2][OH]");
        let products = r.run(&[&mol("C=CBr")]).unwrap();
        let product = &products[0][0];
        let edge = product.bonds().next().unwrap();
        assert_eq!(product.bond(edge).order, BondOrder::Double);
        assert_eq!(to_canonical_smiles(product), canon("C=CO"));
    }

    #[test]
    fn charge_change_recomputes_hydrogens() {
        let r = rxn("[OH:1]>>[O-:1]");
        let products = r.run(&[&mol("CO")]).unwrap();
        let product = &products[0][0];
        let o = product
            .atoms()
            .find(|&i| product.atom(i).atomic_num == 8)
            .unwrap();
        assert_eq!(product.atom(o).formal_charge, -1);
        assert_eq!(product.atom(o).hydrogen_count, 0);
    }

    #[test]
    fn no_match_returns_empty() {
        let r = rxn("[cH:1].[Br][Br]>>[c:1][Br]");
        assert!(r.run(&[&mol("CCCCCC"), &mol("BrBr")]).unwrap().is_empty());
    }

    #[test]
    fn wrong_reactant_count_error() {
        let r = rxn("[cH:1].[Br][Br]>>[c:1][Br]");
        assert_eq!(
            r.run(&[&mol("c1ccccc1")]).unwrap_err(),
            ReactionError::WrongReactantCount {
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn combination_limit_is_enforced() {
        let r = rxn("[C:1].[C:2]>>[C:1][C:2]");
        let long_chain = mol(&"C".repeat(40));
        assert_eq!(
            r.run(&[&long_chain, &long_chain]).unwrap_err(),
            ReactionError::TooManyCombinations {
                limit: MAX_COMBINATIONS
            }
        );
    }
}

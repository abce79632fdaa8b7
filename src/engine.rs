//! The seam between orchestration and chemistry.
//!
//! [`Predictor`](crate::Predictor) only talks to a [`ReactionEngine`], so the
//! whole chemistry stack can be swapped for a test double.

use crate::atom::Atom;
use crate::bond::Bond;
use crate::depict::{depict_molecule, depict_reaction, Canvas, Depiction, RenderError};
use crate::mol::Mol;
use crate::reaction::{from_reaction_smarts, Reaction, ReactionError, ReactionSmartsError};
use crate::smiles::{from_smiles, to_canonical_smiles, SmilesError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Template(#[from] ReactionSmartsError),
    #[error(transparent)]
    Structure(#[from] SmilesError),
    #[error(transparent)]
    Reaction(#[from] ReactionError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Everything the orchestration layer needs from a chemistry toolkit.
pub trait ReactionEngine {
    type Template;
    type Structure;

    fn parse_template(&self, text: &str) -> Result<Self::Template, EngineError>;

    /// How many reactant structures the template consumes.
    fn reactant_slots(&self, template: &Self::Template) -> usize;

    fn parse_structure(&self, text: &str) -> Result<Self::Structure, EngineError>;

    /// One product list per reactant match combination. The caller has
    /// already checked the reactant count.
    fn enumerate(
        &self,
        template: &Self::Template,
        reactants: &[Self::Structure],
    ) -> Result<Vec<Vec<Self::Structure>>, EngineError>;

    fn canonical_smiles(&self, structure: &Self::Structure) -> String;

    fn depict_structure(
        &self,
        structure: &Self::Structure,
        canvas: Canvas,
    ) -> Result<Depiction, EngineError>;

    fn depict_template(
        &self,
        template: &Self::Template,
        panel: Canvas,
    ) -> Result<Depiction, EngineError>;
}

/// The crate's own SMILES/SMARTS engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl ReactionEngine for NativeEngine {
    type Template = Reaction;
    type Structure = Mol<Atom, Bond>;

    fn parse_template(&self, text: &str) -> Result<Reaction, EngineError> {
        Ok(from_reaction_smarts(text)?)
    }

    fn reactant_slots(&self, template: &Reaction) -> usize {
        template.reactant_count()
    }

    fn parse_structure(&self, text: &str) -> Result<Mol<Atom, Bond>, EngineError> {
        Ok(from_smiles(text)?)
    }

    fn enumerate(
        &self,
        template: &Reaction,
        reactants: &[Mol<Atom, Bond>],
    ) -> Result<Vec<Vec<Mol<Atom, Bond>>>, EngineError> {
        let refs: Vec<&Mol<Atom, Bond>> = reactants.iter().collect();
        Ok(template.run(&refs)?)
    }

    fn canonical_smiles(&self, structure: &Mol<Atom, Bond>) -> String {
        to_canonical_smiles(structure)
    }

    fn depict_structure(
        &self,
        structure: &Mol<Atom, Bond>,
        canvas: Canvas,
    ) -> Result<Depiction, EngineError> {
        Ok(depict_molecule(structure, canvas)?)
    }

    fn depict_template(&self, template: &Reaction, panel: Canvas) -> Result<Depiction, EngineError> {
        Ok(depict_reaction(template, panel)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_engine_round_trip() {
        let engine = NativeEngine;
        let rxn = engine.parse_template("[cH:1].[Br][Br]>>[c:1][Br]").unwrap();
        assert_eq!(engine.reactant_slots(&rxn), 2);
        let reactants = vec![
            engine.parse_structure("c1ccccc1").unwrap(),
            engine.parse_structure("BrBr").unwrap(),
        ];
        let results = engine.enumerate(&rxn, &reactants).unwrap();
        assert!(!results.is_empty());
        let smiles = engine.canonical_smiles(&results[0][0]);
        let reparsed = engine.parse_structure(&smiles).unwrap();
        assert_eq!(engine.canonical_smiles(&reparsed), smiles);
    }

    #[test]
    fn errors_keep_their_source_kind() {
        let engine = NativeEngine;
        assert!(matches!(
            engine.parse_template("no separator"),
            Err(EngineError::Template(_))
        ));
        assert!(matches!(
            engine.parse_structure("XYZ123notasmiles"),
            Err(EngineError::Structure(_))
        ));
    }
}

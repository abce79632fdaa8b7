//! Reaction template prediction.
//!
//! Parses SMILES reactants and SMARTS reaction templates, enumerates the
//! products a template yields, and depicts products and templates as SVG.
//! [`Predictor`] ties these together behind the [`ReactionEngine`] seam.

pub mod aromaticity;
pub mod atom;
pub mod bond;
pub mod canonical;
pub mod catalog;
pub mod config;
pub mod depict;
pub mod element;
pub mod engine;
pub mod mol;
pub mod predict;
pub mod reaction;
pub mod rings;
pub mod smarts;
pub mod smiles;
pub mod substruct;
pub mod valence;

pub use atom::Atom;
pub use bond::{Bond, BondOrder};
pub use catalog::{CatalogError, TemplateCatalog};
pub use config::{ConfigError, RenderOptions, Settings};
pub use depict::{depict_molecule, depict_reaction, Canvas, Depiction, RenderError};
pub use element::Element;
pub use engine::{EngineError, NativeEngine, ReactionEngine};
pub use mol::Mol;
pub use predict::{
    dedupe, split_reactants, PredictError, Prediction, Predictor, ProductSet, RenderedProduct,
};
pub use reaction::{from_reaction_smarts, Reaction, ReactionError, ReactionSmartsError};
pub use smarts::{from_smarts, SmartsError};
pub use smiles::{from_smiles, to_canonical_smiles, to_smiles, SmilesError};

//! Orchestration: turn reactant text and a reaction name into a product set.
//!
//! [`Predictor`] resolves the template from a [`TemplateCatalog`], hands the
//! chemistry to a [`ReactionEngine`], and deduplicates the products by their
//! canonical SMILES. Every failure is returned as a [`PredictError`]; nothing
//! is retried and no partial result is produced.

use indexmap::IndexSet;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::catalog::TemplateCatalog;
use crate::config::RenderOptions;
use crate::depict::Depiction;
use crate::engine::{EngineError, NativeEngine, ReactionEngine};
use crate::reaction::ReactionError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictError {
    #[error("unknown reaction template '{name}'")]
    UnknownTemplate { name: String },
    #[error("invalid reaction template '{name}': {detail}")]
    InvalidTemplateSyntax { name: String, detail: String },
    /// `position` counts reactants from 1.
    #[error("invalid reactant {position} '{text}': {detail}")]
    InvalidReactantStructure {
        position: usize,
        text: String,
        detail: String,
    },
    #[error("reactants provided ({got}) do not match expected ({expected})")]
    ReactantCountMismatch { expected: usize, got: usize },
    #[error("no products found for the given reactants")]
    NoProductsFound,
    #[error("generated product '{smiles}' is not a valid structure: {detail}")]
    InvalidGeneratedStructure { smiles: String, detail: String },
    #[error("failed to render {subject}: {detail}")]
    RenderingFailure { subject: String, detail: String },
    #[error("too many reactant match combinations (limit {limit})")]
    TooManyMatches { limit: usize },
    #[error("reaction could not be applied: {detail}")]
    Enumeration { detail: String },
}

/// Distinct product SMILES in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProductSet(IndexSet<String>);

impl ProductSet {
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, smiles: &str) -> bool {
        self.0.contains(smiles)
    }
}

impl<S: Into<String>> FromIterator<S> for ProductSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a ProductSet {
    type Item = &'a String;
    type IntoIter = indexmap::set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Collapses repeated structure strings, keeping the first occurrence.
/// Applying it to its own output changes nothing.
pub fn dedupe<I, S>(smiles: I) -> ProductSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    smiles.into_iter().collect()
}

/// Splits raw input on `+` and trims each piece.
///
/// A `+` inside a bracket atom is a charge, not a separator, so
/// `"O[N+](=O)[O-] + c1ccccc1"` gives two reactants. Empty pieces are kept
/// so that they are reported as invalid structures.
pub fn split_reactants(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '+' if depth == 0 => {
                pieces.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(text[start..].trim());
    pieces
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedProduct {
    pub smiles: String,
    pub depiction: Depiction,
}

/// Everything one prediction request produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub reaction: String,
    pub template: String,
    pub products: ProductSet,
    pub images: Vec<RenderedProduct>,
    pub schematic: Depiction,
}

pub struct Predictor<'c, E = NativeEngine> {
    catalog: &'c TemplateCatalog,
    engine: E,
    render: RenderOptions,
}

impl<'c> Predictor<'c> {
    pub fn new(catalog: &'c TemplateCatalog) -> Self {
        Self::with_engine(catalog, NativeEngine)
    }
}

impl<'c, E: ReactionEngine> Predictor<'c, E> {
    pub fn with_engine(catalog: &'c TemplateCatalog, engine: E) -> Self {
        Self {
            catalog,
            engine,
            render: RenderOptions::default(),
        }
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    pub fn catalog(&self) -> &'c TemplateCatalog {
        self.catalog
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Applies the named reaction to the `+`-separated reactants and returns
    /// the distinct products.
    ///
    /// # Examples
    ///
    /// ```
    /// use rxnpredict::{from_smiles, to_canonical_smiles, Predictor, TemplateCatalog};
    ///
    /// let catalog = TemplateCatalog::builtin();
    /// let products = Predictor::new(&catalog)
    ///     .predict("c1ccccc1 + BrBr", "Bromination")
    ///     .unwrap();
    /// let bromobenzene = to_canonical_smiles(&from_smiles("Brc1ccccc1").unwrap());
    /// assert!(products.contains(&bromobenzene));
    /// ```
    #[instrument(skip(self), fields(reaction = %name))]
    pub fn predict(&self, text: &str, name: &str) -> Result<ProductSet, PredictError> {
        self.resolve(name)
            .and_then(|template| self.apply(&template, text))
            .inspect_err(|e| warn!(error = %e, "prediction failed"))
    }

    /// Draws every product on the molecule canvas, re-reading each SMILES so
    /// that a product which does not survive a round trip is reported.
    pub fn render_products(
        &self,
        products: &ProductSet,
    ) -> Result<Vec<RenderedProduct>, PredictError> {
        products
            .iter()
            .map(|smiles| {
                let structure = self.engine.parse_structure(smiles).map_err(|e| {
                    PredictError::InvalidGeneratedStructure {
                        smiles: smiles.to_owned(),
                        detail: e.to_string(),
                    }
                })?;
                let depiction = self
                    .engine
                    .depict_structure(&structure, self.render.molecule)
                    .map_err(|e| PredictError::RenderingFailure {
                        subject: format!("product {smiles}"),
                        detail: e.to_string(),
                    })?;
                Ok(RenderedProduct {
                    smiles: smiles.to_owned(),
                    depiction,
                })
            })
            .collect()
    }

    /// Draws the schematic of the named reaction.
    pub fn render_template(&self, name: &str) -> Result<Depiction, PredictError> {
        let template = self.resolve(name)?;
        self.schematic(name, &template)
    }

    /// The full request: predict, then draw products and schematic.
    #[instrument(skip(self), fields(reaction = %name))]
    pub fn run(&self, text: &str, name: &str) -> Result<Prediction, PredictError> {
        let result = self.resolve(name).and_then(|template| {
            let products = self.apply(&template, text)?;
            let images = self.render_products(&products)?;
            let schematic = self.schematic(name, &template)?;
            Ok((products, images, schematic))
        });
        let (products, images, schematic) =
            result.inspect_err(|e| warn!(error = %e, "prediction failed"))?;
        Ok(Prediction {
            reaction: name.to_owned(),
            template: self.catalog.lookup(name).unwrap_or_default().to_owned(),
            products,
            images,
            schematic,
        })
    }

    fn resolve(&self, name: &str) -> Result<E::Template, PredictError> {
        let text = self
            .catalog
            .lookup(name)
            .ok_or_else(|| PredictError::UnknownTemplate {
                name: name.to_owned(),
            })?;
        let template =
            self.engine
                .parse_template(text)
                .map_err(|e| PredictError::InvalidTemplateSyntax {
                    name: name.to_owned(),
                    detail: e.to_string(),
                })?;
        debug!(template = text, "parsed reaction template");
        Ok(template)
    }

    fn apply(&self, template: &E::Template, text: &str) -> Result<ProductSet, PredictError> {
        let pieces = split_reactants(text);
        let reactants = pieces
            .iter()
            .enumerate()
            .map(|(i, piece)| {
                self.engine.parse_structure(piece).map_err(|e| {
                    PredictError::InvalidReactantStructure {
                        position: i + 1,
                        text: (*piece).to_owned(),
                        detail: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let expected = self.engine.reactant_slots(template);
        if reactants.len() != expected {
            return Err(PredictError::ReactantCountMismatch {
                expected,
                got: reactants.len(),
            });
        }

        let combinations = self
            .engine
            .enumerate(template, &reactants)
            .map_err(|e| match e {
                EngineError::Reaction(ReactionError::TooManyCombinations { limit }) => {
                    PredictError::TooManyMatches { limit }
                }
                other => PredictError::Enumeration {
                    detail: other.to_string(),
                },
            })?;
        debug!(combinations = combinations.len(), "enumerated products");

        let products = dedupe(
            combinations
                .iter()
                .flatten()
                .map(|p| self.engine.canonical_smiles(p)),
        );
        if products.is_empty() {
            return Err(PredictError::NoProductsFound);
        }
        debug!(products = products.len(), "deduplicated products");
        Ok(products)
    }

    fn schematic(&self, name: &str, template: &E::Template) -> Result<Depiction, PredictError> {
        self.engine
            .depict_template(template, self.render.template_panel)
            .map_err(|e| PredictError::RenderingFailure {
                subject: format!("template '{name}'"),
                detail: e.to_string(),
            })
    }
}

//! 2D depiction of molecules and reaction templates as SVG documents.

mod layout;
mod svg;

pub use layout::{compute_coords, Point};

use serde::{Deserialize, Serialize};

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::element::Element;
use crate::mol::Mol;
use crate::reaction::Reaction;
use crate::smarts::{AtomExpr, BondExpr};

use self::svg::{BondStyle, Frame, Label, Sketch};

/// Smallest canvas side that still leaves room for a drawing.
const MIN_SIDE: u32 = 40;
/// Space between template panels, holding `+` or the arrow.
const PANEL_GAP: u32 = 40;

/// Pixel size of a drawing area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// Canvas for a single product structure.
    pub const MOLECULE: Canvas = Canvas {
        width: 300,
        height: 300,
    };
    /// Canvas for one component of a reaction schematic.
    pub const TEMPLATE_PANEL: Canvas = Canvas {
        width: 400,
        height: 200,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn check(self) -> Result<Self, RenderError> {
        if self.width < MIN_SIDE || self.height < MIN_SIDE {
            return Err(RenderError::CanvasTooSmall {
                width: self.width,
                height: self.height,
                min: MIN_SIDE,
            });
        }
        Ok(self)
    }

    fn margin(self) -> f64 {
        (self.width.min(self.height) as f64 * 0.08).max(8.0)
    }
}

/// A finished SVG image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Depiction {
    pub width: u32,
    pub height: u32,
    pub svg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("nothing to draw: structure has no atoms")]
    EmptyStructure,
    #[error("canvas {width}x{height} is too small (minimum side {min})")]
    CanvasTooSmall { width: u32, height: u32, min: u32 },
    #[error("layout produced non-finite coordinates")]
    NonFiniteLayout,
}

/// Draws a molecule centred on `canvas`.
///
/// Carbon atoms are drawn as bare vertices unless charged, isotopic or
/// isolated; every other atom gets a label with its hydrogens and charge.
pub fn depict_molecule(mol: &Mol<Atom, Bond>, canvas: Canvas) -> Result<Depiction, RenderError> {
    let canvas = canvas.check()?;
    let sketch = molecule_sketch(mol)?;
    let mut doc = svg::open_document(canvas.width, canvas.height);
    svg::draw_sketch(&mut doc, &sketch, full_frame(canvas));
    svg::close_document(&mut doc);
    Ok(Depiction {
        width: canvas.width,
        height: canvas.height,
        svg: doc,
    })
}

/// Draws a reaction schematic: each reactant and product template in its
/// own `panel`, `+` between components and an arrow between the sides.
pub fn depict_reaction(reaction: &Reaction, panel: Canvas) -> Result<Depiction, RenderError> {
    let panel = panel.check()?;
    let reactants = reaction.reactant_templates();
    let products = reaction.product_templates();
    let panels = reactants.len() + products.len();
    if panels == 0 {
        return Err(RenderError::EmptyStructure);
    }

    let width = panel.width * panels as u32 + PANEL_GAP * (panels as u32 - 1);
    let height = panel.height;
    let mid_y = height as f64 / 2.0;
    let mut doc = svg::open_document(width, height);

    let mut x = 0u32;
    for (i, tmpl) in reactants.iter().chain(products).enumerate() {
        let sketch = template_sketch(tmpl)?;
        let frame = Frame {
            x: x as f64,
            ..full_frame(panel)
        };
        svg::draw_sketch(&mut doc, &sketch, frame);
        x += panel.width;
        if i + 1 == panels {
            break;
        }
        let gap_start = x as f64;
        let gap_mid = gap_start + PANEL_GAP as f64 / 2.0;
        if i + 1 == reactants.len() {
            svg::draw_arrow(&mut doc, gap_start + 4.0, gap_start + PANEL_GAP as f64 - 4.0, mid_y);
        } else {
            svg::draw_plus(&mut doc, gap_mid, mid_y);
        }
        x += PANEL_GAP;
    }
    svg::close_document(&mut doc);

    Ok(Depiction {
        width,
        height,
        svg: doc,
    })
}

fn full_frame(canvas: Canvas) -> Frame {
    Frame {
        x: 0.0,
        y: 0.0,
        width: canvas.width as f64,
        height: canvas.height as f64,
        margin: canvas.margin(),
    }
}

fn finite_coords<A, B>(mol: &Mol<A, B>) -> Result<Vec<Point>, RenderError> {
    if mol.is_empty() {
        return Err(RenderError::EmptyStructure);
    }
    let points = compute_coords(mol);
    if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(RenderError::NonFiniteLayout);
    }
    Ok(points)
}

fn molecule_sketch(mol: &Mol<Atom, Bond>) -> Result<Sketch, RenderError> {
    let points = finite_coords(mol)?;
    let labels = mol
        .atoms()
        .map(|idx| atom_label(mol.atom(idx), mol.degree(idx)))
        .collect();
    let bonds = mol
        .bonds()
        .filter_map(|e| {
            let (a, b) = mol.bond_endpoints(e)?;
            let style = match mol.bond(e).order {
                BondOrder::Single => BondStyle::Single,
                BondOrder::Double => BondStyle::Double,
                BondOrder::Triple => BondStyle::Triple,
                BondOrder::Aromatic => BondStyle::Aromatic,
            };
            Some((a.index(), b.index(), style))
        })
        .collect();
    Ok(Sketch {
        points,
        labels,
        bonds,
    })
}

fn atom_label(atom: &Atom, degree: usize) -> Option<Label> {
    let element = atom.element()?;
    let plain_carbon =
        element == Element::C && atom.formal_charge == 0 && atom.isotope == 0 && degree > 0;
    if plain_carbon {
        return None;
    }
    let mut text = String::new();
    if atom.isotope > 0 {
        text.push_str(&atom.isotope.to_string());
    }
    text.push_str(element.symbol());
    match atom.hydrogen_count {
        0 => {}
        1 => text.push('H'),
        n => text.push_str(&format!("H{n}")),
    }
    text.push_str(&charge_suffix(atom.formal_charge));
    Some(Label {
        text,
        color: element.color(),
    })
}

fn charge_suffix(charge: i8) -> String {
    match charge {
        0 => String::new(),
        1 => "+".to_owned(),
        -1 => "-".to_owned(),
        c if c > 0 => format!("{c}+"),
        c => format!("{}-", -(c as i16)),
    }
}

fn template_sketch(tmpl: &Mol<AtomExpr, BondExpr>) -> Result<Sketch, RenderError> {
    let points = finite_coords(tmpl)?;
    let labels = tmpl
        .atoms()
        .map(|idx| {
            let expr = tmpl.atom(idx);
            let color = expr
                .element()
                .and_then(|(n, _)| Element::from_atomic_num(n))
                .map_or("#555555", Element::color);
            Some(Label {
                text: expr.to_string(),
                color,
            })
        })
        .collect();
    let bonds = tmpl
        .bonds()
        .filter_map(|e| {
            let (a, b) = tmpl.bond_endpoints(e)?;
            let style = match tmpl.bond(e) {
                BondExpr::Single | BondExpr::SingleOrAromatic => BondStyle::Single,
                BondExpr::Double => BondStyle::Double,
                BondExpr::Triple => BondStyle::Triple,
                BondExpr::Aromatic => BondStyle::Aromatic,
                _ => BondStyle::Query,
            };
            Some((a.index(), b.index(), style))
        })
        .collect();
    Ok(Sketch {
        points,
        labels,
        bonds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction::from_reaction_smarts;
    use crate::smiles::from_smiles;

    fn mol(smiles: &str) -> Mol<Atom, Bond> {
        from_smiles(smiles).unwrap_or_else(|e| panic!("bad SMILES {smiles:?}: {e}"))
    }

    #[test]
    fn molecule_depiction_has_requested_size() {
        let d = depict_molecule(&mol("Brc1ccccc1"), Canvas::MOLECULE).unwrap();
        assert_eq!((d.width, d.height), (300, 300));
        assert!(d.svg.starts_with("<svg"));
        assert!(d.svg.ends_with("</svg>"));
        assert!(d.svg.contains(">Br</text>"));
        // Benzene carbons stay unlabelled.
        assert!(!d.svg.contains(">C</text>"));
    }

    #[test]
    fn heteroatom_labels_carry_hydrogens_and_charge() {
        let d = depict_molecule(&mol("CC(=O)[O-].C[NH3+]"), Canvas::MOLECULE).unwrap();
        assert!(d.svg.contains(">O-</text>"));
        assert!(d.svg.contains(">NH3+</text>"));
    }

    #[test]
    fn isolated_carbon_is_labelled() {
        let d = depict_molecule(&mol("C"), Canvas::MOLECULE).unwrap();
        assert!(d.svg.contains(">CH4</text>"));
    }

    #[test]
    fn empty_molecule_is_rejected() {
        let empty: Mol<Atom, Bond> = Mol::new();
        assert_eq!(
            depict_molecule(&empty, Canvas::MOLECULE).unwrap_err(),
            RenderError::EmptyStructure
        );
    }

    #[test]
    fn tiny_canvas_is_rejected() {
        assert!(matches!(
            depict_molecule(&mol("CCO"), Canvas::new(10, 300)),
            Err(RenderError::CanvasTooSmall { width: 10, .. })
        ));
    }

    #[test]
    fn reaction_schematic_has_one_panel_per_component() {
        let rxn = from_reaction_smarts("[cH:1].[Br][Br]>>[c:1][Br]").unwrap();
        let d = depict_reaction(&rxn, Canvas::TEMPLATE_PANEL).unwrap();
        assert_eq!(d.width, 3 * 400 + 2 * PANEL_GAP);
        assert_eq!(d.height, 200);
        assert!(d.svg.contains(">cH:1</text>"));
        assert!(d.svg.contains(">c:1</text>"));
        assert_eq!(d.svg.matches(">+</text>").count(), 1);
        assert_eq!(d.svg.matches("<polygon").count(), 1);
    }

    #[test]
    fn query_labels_are_escaped() {
        let rxn = from_reaction_smarts("[c&R:1]>>[c:1]O").unwrap();
        let d = depict_reaction(&rxn, Canvas::TEMPLATE_PANEL).unwrap();
        assert!(d.svg.contains("c&amp;R:1"));
    }

    #[test]
    fn charge_suffixes() {
        assert_eq!(charge_suffix(0), "");
        assert_eq!(charge_suffix(-1), "-");
        assert_eq!(charge_suffix(2), "2+");
        assert_eq!(charge_suffix(-3), "3-");
    }
}

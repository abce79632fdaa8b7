use super::layout::{extent, Point};

const FONT: &str = "DejaVu Sans, Arial, sans-serif";
const BOND_COLOR: &str = "#222222";
/// Largest drawn bond length in pixels; small molecules are not blown up.
const MAX_BOND_PX: f64 = 40.0;
/// Fraction of the bond length between the lines of a multiple bond.
const MULTI_BOND_GAP: f64 = 0.16;

/// How a bond is stroked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondStyle {
    Single,
    Double,
    Triple,
    /// Solid line with a dashed companion.
    Aromatic,
    /// Query bond that matches more than one order.
    Query,
}

/// A text label drawn over an atom position.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub color: &'static str,
}

/// Everything needed to draw one structure, independent of whether it is a
/// molecule or a query template.
#[derive(Debug, Clone, Default)]
pub struct Sketch {
    pub points: Vec<Point>,
    pub labels: Vec<Option<Label>>,
    pub bonds: Vec<(usize, usize, BondStyle)>,
}

/// Placement of a sketch on the page in pixels.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Frame {
    fn transform(&self, points: &[Point]) -> impl Fn(Point) -> Point {
        let (min_x, max_x) = extent(points.iter().map(|p| p.x));
        let (min_y, max_y) = extent(points.iter().map(|p| p.y));
        let span_x = (max_x - min_x).max(1e-6);
        let span_y = (max_y - min_y).max(1e-6);
        let scale = ((self.width - 2.0 * self.margin) / span_x)
            .min((self.height - 2.0 * self.margin) / span_y)
            .min(MAX_BOND_PX);
        let cx = self.x + self.width / 2.0;
        let cy = self.y + self.height / 2.0;
        let mid_x = (min_x + max_x) / 2.0;
        let mid_y = (min_y + max_y) / 2.0;
        move |p| Point::new(cx + (p.x - mid_x) * scale, cy + (p.y - mid_y) * scale)
    }
}

pub fn open_document(width: u32, height: u32) -> String {
    format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{width}' height='{height}' \
         viewBox='0 0 {width} {height}'><rect width='100%' height='100%' fill='#ffffff'/>"
    )
}

pub fn close_document(svg: &mut String) {
    svg.push_str("</svg>");
}

/// Appends the sketch, scaled to fit `frame`.
pub fn draw_sketch(svg: &mut String, sketch: &Sketch, frame: Frame) {
    let to_px = frame.transform(&sketch.points);
    let px: Vec<Point> = sketch.points.iter().map(|&p| to_px(p)).collect();
    let bond_px = sketch
        .bonds
        .first()
        .map_or(MAX_BOND_PX, |&(a, b, _)| px[a].distance(px[b]).max(1.0));
    let font_size = (bond_px * 0.45).clamp(8.0, 16.0);
    let clearance = font_size * 0.6;

    svg.push_str(&format!(
        "<g stroke='{BOND_COLOR}' stroke-width='1.5' stroke-linecap='round'>"
    ));
    for &(a, b, style) in &sketch.bonds {
        let mut start = px[a];
        let mut end = px[b];
        if sketch.labels[a].is_some() {
            start = toward(start, end, clearance);
        }
        if sketch.labels[b].is_some() {
            end = toward(end, start, clearance);
        }
        draw_bond(svg, start, end, style, bond_px * MULTI_BOND_GAP);
    }
    svg.push_str("</g>");

    svg.push_str(&format!(
        "<g font-size='{font_size:.1}' font-family='{FONT}' text-anchor='middle' \
         dominant-baseline='central'>"
    ));
    for (p, label) in px.iter().zip(&sketch.labels) {
        if let Some(label) = label {
            svg.push_str(&format!(
                "<text x='{:.2}' y='{:.2}' fill='{}'>{}</text>",
                p.x,
                p.y,
                label.color,
                escape_xml(&label.text)
            ));
        }
    }
    svg.push_str("</g>");
}

/// A `+` sign centred at `(x, y)`.
pub fn draw_plus(svg: &mut String, x: f64, y: f64) {
    svg.push_str(&format!(
        "<text x='{x:.2}' y='{y:.2}' font-size='22' font-family='{FONT}' \
         text-anchor='middle' dominant-baseline='central' fill='{BOND_COLOR}'>+</text>"
    ));
}

/// A reaction arrow from `x1` to `x2` at height `y`.
pub fn draw_arrow(svg: &mut String, x1: f64, x2: f64, y: f64) {
    svg.push_str(&format!(
        "<g stroke='{BOND_COLOR}' stroke-width='2' fill='{BOND_COLOR}'>\
         <line x1='{x1:.2}' y1='{y:.2}' x2='{:.2}' y2='{y:.2}'/>\
         <polygon points='{x2:.2},{y:.2} {:.2},{:.2} {:.2},{:.2}'/></g>",
        x2 - 8.0,
        x2 - 10.0,
        y - 5.0,
        x2 - 10.0,
        y + 5.0
    ));
}

fn draw_bond(svg: &mut String, a: Point, b: Point, style: BondStyle, gap: f64) {
    let len = a.distance(b).max(1e-9);
    // Unit normal to the bond.
    let (nx, ny) = (-(b.y - a.y) / len, (b.x - a.x) / len);
    let shifted = |d: f64| {
        (
            Point::new(a.x + nx * d, a.y + ny * d),
            Point::new(b.x + nx * d, b.y + ny * d),
        )
    };
    match style {
        BondStyle::Single => line(svg, a, b, None),
        BondStyle::Double => {
            let (a1, b1) = shifted(gap / 2.0);
            let (a2, b2) = shifted(-gap / 2.0);
            line(svg, a1, b1, None);
            line(svg, a2, b2, None);
        }
        BondStyle::Triple => {
            let (a1, b1) = shifted(gap);
            let (a2, b2) = shifted(-gap);
            line(svg, a, b, None);
            line(svg, a1, b1, None);
            line(svg, a2, b2, None);
        }
        BondStyle::Aromatic => {
            let (a1, b1) = shifted(gap);
            line(svg, a, b, None);
            line(svg, a1, b1, Some("4,3"));
        }
        BondStyle::Query => line(svg, a, b, Some("2,2")),
    }
}

fn line(svg: &mut String, a: Point, b: Point, dash: Option<&str>) {
    svg.push_str(&format!(
        "<line x1='{:.2}' y1='{:.2}' x2='{:.2}' y2='{:.2}'",
        a.x, a.y, b.x, b.y
    ));
    if let Some(dash) = dash {
        svg.push_str(&format!(" stroke-dasharray='{dash}'"));
    }
    svg.push_str("/>");
}

/// Moves `from` toward `to` by `by` pixels, never past the midpoint.
fn toward(from: Point, to: Point, by: f64) -> Point {
    let len = from.distance(to);
    if len <= 1e-9 {
        return from;
    }
    let t = (by / len).min(0.45);
    Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
}

pub fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

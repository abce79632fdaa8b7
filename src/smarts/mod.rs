mod error;
mod parser;
pub mod query;

pub use error::SmartsError;
pub use query::{AtomExpr, BondExpr, MatchContext};

use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;
use crate::rings::RingInfo;
use crate::substruct::{
    get_substruct_match_with, get_substruct_matches_with, has_anchored_match_with, AtomMapping,
};

/// Parses a SMARTS pattern into a query graph.
///
/// Bonds left implicit between two atoms become
/// [`BondExpr::SingleOrAromatic`]. Atom map classes (`[C:1]`) are kept as
/// [`AtomExpr::AtomMapClass`] conjuncts, which always match.
///
/// ```
/// use rxnpredict::smarts::from_smarts;
///
/// let q = from_smarts("[c:1][H]").unwrap();
/// assert_eq!(q.atom_count(), 2);
/// assert!(from_smarts("C1CC").is_err());
/// ```
pub fn from_smarts(s: &str) -> Result<Mol<AtomExpr, BondExpr>, SmartsError> {
    parser::parse(s)
}

pub fn has_smarts_match(target: &Mol<Atom, Bond>, query: &Mol<AtomExpr, BondExpr>) -> bool {
    get_smarts_match(target, query).is_some()
}

pub fn get_smarts_match(
    target: &Mol<Atom, Bond>,
    query: &Mol<AtomExpr, BondExpr>,
) -> Option<AtomMapping> {
    let rings = RingInfo::perceive(target);
    let ctx = MatchContext::new(target, &rings);
    get_substruct_match_with(
        target,
        query,
        |q, t| query.atom(q).matches(&ctx, t),
        |q, t| query.bond(q).matches(&ctx, t),
    )
}

/// All embeddings of `query` in `target`, including those that differ only
/// by a permutation of symmetric atoms.
pub fn get_smarts_matches(
    target: &Mol<Atom, Bond>,
    query: &Mol<AtomExpr, BondExpr>,
) -> Vec<AtomMapping> {
    let rings = RingInfo::perceive(target);
    get_smarts_matches_in(&MatchContext::new(target, &rings), query)
}

/// Same as [`get_smarts_matches`] but reuses ring perception the caller
/// already holds.
pub fn get_smarts_matches_in(
    ctx: &MatchContext,
    query: &Mol<AtomExpr, BondExpr>,
) -> Vec<AtomMapping> {
    get_substruct_matches_with(
        ctx.mol,
        query,
        |q, t| query.atom(q).matches(ctx, t),
        |q, t| query.bond(q).matches(ctx, t),
    )
}

/// Recursive SMARTS: does `query` match with its first atom on `idx`?
pub(crate) fn matches_at(
    ctx: &MatchContext,
    query: &Mol<AtomExpr, BondExpr>,
    idx: NodeIndex,
) -> bool {
    has_anchored_match_with(
        ctx.mol,
        query,
        idx,
        |q, t| query.atom(q).matches(ctx, t),
        |q, t| query.bond(q).matches(ctx, t),
    )
}

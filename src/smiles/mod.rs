//! SMILES reading and writing.

mod builder;
pub mod error;
mod tokenizer;
mod writer;

use crate::aromaticity::perceive_aromaticity;
use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;
use crate::rings::RingInfo;
use crate::valence::check_valences;
pub use error::SmilesError;
pub use writer::{to_canonical_smiles, to_smiles};

/// Parses a SMILES string into a sanitised molecule.
///
/// Kekulé rings are perceived aromatic, aromatic atoms must sit in a ring,
/// and no atom may exceed its allowed valence.
///
/// # Examples
///
/// ```
/// use rxnpredict::smiles::from_smiles;
///
/// let benzene = from_smiles("C1=CC=CC=C1").unwrap();
/// assert_eq!(benzene.atom_count(), 6);
/// assert!(benzene.atoms().all(|a| benzene.atom(a).is_aromatic));
/// ```
pub fn from_smiles(s: &str) -> Result<Mol<Atom, Bond>, SmilesError> {
    let mut mol = parse_unchecked(s)?;
    let rings = RingInfo::perceive(&mol);
    if let Some(idx) = mol
        .atoms()
        .find(|&a| mol.atom(a).is_aromatic && !rings.is_ring_atom(a))
    {
        return Err(SmilesError::NonRingAromatic {
            atom: idx.index(),
            symbol: mol.atom(idx).symbol(),
        });
    }
    perceive_aromaticity(&mut mol, &rings);
    check_valences(&mol)?;
    Ok(mol)
}

/// Parses SMILES syntax into a graph without sanitisation.
pub(crate) fn parse_unchecked(s: &str) -> Result<Mol<Atom, Bond>, SmilesError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    let tokens = tokenizer::tokenize(trimmed)?;
    builder::build_mol(&tokens)
}

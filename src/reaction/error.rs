use crate::smarts::SmartsError;

/// Error returned when parsing a reaction SMARTS string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReactionSmartsError {
    #[error("no '>>' separator found in reaction SMARTS")]
    MissingSeparator,
    #[error("too many '>' separators in reaction SMARTS")]
    TooManySeparators,
    #[error("reaction has no reactant templates")]
    EmptyReactants,
    #[error("reaction has no product templates")]
    EmptyProducts,
    /// A SMARTS component failed to parse.
    #[error("invalid {section} component: {source}")]
    InvalidComponent {
        section: &'static str,
        source: SmartsError,
    },
    /// An atom map number appears more than once in the reactant templates.
    #[error("duplicate atom map number {map_num} in reactant templates")]
    DuplicateAtomMap { map_num: u16 },
    /// A product atom without a reactant counterpart must say what element
    /// to create.
    #[error("product template {template} atom {atom} is unmapped and names no element")]
    UnmappedProductAtom { template: usize, atom: usize },
}

/// Error returned when applying a reaction to reactant molecules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReactionError {
    #[error("expected {expected} reactants, got {got}")]
    WrongReactantCount { expected: usize, got: usize },
    #[error("match combination count exceeds limit of {limit}")]
    TooManyCombinations { limit: usize },
}

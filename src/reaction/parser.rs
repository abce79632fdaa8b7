use std::collections::HashSet;

use crate::mol::Mol;
use crate::smarts::{from_smarts, AtomExpr, BondExpr};

use super::error::ReactionSmartsError;
use super::Reaction;

pub fn parse_reaction_smarts(s: &str) -> Result<Reaction, ReactionSmartsError> {
    let (reactant_text, agent_text, product_text) = split_reaction(s.trim())?;

    let reactant_templates = parse_section(reactant_text, "reactant")?;
    if reactant_templates.is_empty() {
        return Err(ReactionSmartsError::EmptyReactants);
    }

    let product_templates = parse_section(product_text, "product")?;
    if product_templates.is_empty() {
        return Err(ReactionSmartsError::EmptyProducts);
    }

    let agent_templates = parse_section(agent_text, "agent")?;

    let reactant_maps = check_unique_maps(&reactant_templates)?;
    check_product_atoms(&product_templates, &reactant_maps)?;

    Ok(Reaction {
        reactant_templates,
        product_templates,
        agent_templates,
    })
}

/// Splits `reactants>>products` or `reactants>agents>products` on the
/// top-level `>` characters.
fn split_reaction(s: &str) -> Result<(&str, &str, &str), ReactionSmartsError> {
    match find_gt_positions(s).as_slice() {
        [] | [_] => Err(ReactionSmartsError::MissingSeparator),
        &[first, second] => Ok((&s[..first], &s[first + 1..second], &s[second + 1..])),
        _ => Err(ReactionSmartsError::TooManySeparators),
    }
}

/// Byte offsets of every `>` outside brackets and parentheses.
fn find_gt_positions(s: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut bracket_depth = 0u32;
    let mut paren_depth = 0u32;

    for (i, ch) in s.char_indices() {
        match ch {
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            '>' if bracket_depth == 0 && paren_depth == 0 => positions.push(i),
            _ => {}
        }
    }

    positions
}

fn split_on_dot(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut bracket_depth = 0u32;
    let mut paren_depth = 0u32;

    for (i, ch) in s.char_indices() {
        match ch {
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            '.' if bracket_depth == 0 && paren_depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_section(
    text: &str,
    section: &'static str,
) -> Result<Vec<Mol<AtomExpr, BondExpr>>, ReactionSmartsError> {
    let mut mols = Vec::new();
    for comp in split_on_dot(text) {
        // `(A.B)` groups fragments into one component; each fragment still
        // becomes its own template here.
        for sub in split_on_dot(strip_component_group(comp)) {
            let mol = from_smarts(sub)
                .map_err(|source| ReactionSmartsError::InvalidComponent { section, source })?;
            mols.push(mol);
        }
    }
    Ok(mols)
}

fn strip_component_group(s: &str) -> &str {
    let Some(inner) = s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) else {
        return s;
    };
    let mut depth = 0i32;
    for ch in inner.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                // `(A)(B)`: the outer parentheses do not enclose one group.
                if depth < 0 {
                    return s;
                }
            }
            _ => {}
        }
    }
    if depth == 0 {
        inner
    } else {
        s
    }
}

fn check_unique_maps(
    templates: &[Mol<AtomExpr, BondExpr>],
) -> Result<HashSet<u16>, ReactionSmartsError> {
    let mut seen = HashSet::new();
    for tmpl in templates {
        for idx in tmpl.atoms() {
            if let Some(map_num) = tmpl.atom(idx).map_class() {
                if !seen.insert(map_num) {
                    return Err(ReactionSmartsError::DuplicateAtomMap { map_num });
                }
            }
        }
    }
    Ok(seen)
}

fn check_product_atoms(
    templates: &[Mol<AtomExpr, BondExpr>],
    reactant_maps: &HashSet<u16>,
) -> Result<(), ReactionSmartsError> {
    for (template, tmpl) in templates.iter().enumerate() {
        for idx in tmpl.atoms() {
            let expr = tmpl.atom(idx);
            let mapped = expr
                .map_class()
                .is_some_and(|map_num| reactant_maps.contains(&map_num));
            if !mapped && expr.element().is_none() {
                return Err(ReactionSmartsError::UnmappedProductAtom {
                    template,
                    atom: idx.index(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_simple_reaction() {
        let (r, a, p) = split_reaction("[C:1][Br:2]>>[C:1][OH]").unwrap();
        assert_eq!(r, "[C:1][Br:2]");
        assert_eq!(a, "");
        assert_eq!(p, "[C:1][OH]");
    }

    #[test]
    fn split_with_agents() {
        let (r, a, p) = split_reaction("[C:1]=[C:2]>[Pd]>[C:1][C:2]").unwrap();
        assert_eq!(r, "[C:1]=[C:2]");
        assert_eq!(a, "[Pd]");
        assert_eq!(p, "[C:1][C:2]");
    }

    #[test]
    fn separator_errors() {
        assert_eq!(
            split_reaction("[C][Br]").unwrap_err(),
            ReactionSmartsError::MissingSeparator
        );
        assert_eq!(
            split_reaction("[C]>[Br]").unwrap_err(),
            ReactionSmartsError::MissingSeparator
        );
        assert_eq!(
            split_reaction("[C:1]>[A]>[B]>[C:1]").unwrap_err(),
            ReactionSmartsError::TooManySeparators
        );
    }

    #[test]
    fn split_on_dot_respects_brackets() {
        assert_eq!(split_on_dot("[C:1]Br.[N:2]"), vec!["[C:1]Br", "[N:2]"]);
        assert_eq!(split_on_dot("[C.C]"), vec!["[C.C]"]);
        assert_eq!(split_on_dot(" [cH:1] . [Br][Br] "), vec!["[cH:1]", "[Br][Br]"]);
        assert!(split_on_dot("").is_empty());
    }

    #[test]
    fn strip_component_groups() {
        assert_eq!(strip_component_group("(A.B)"), "A.B");
        assert_eq!(strip_component_group("A.B"), "A.B");
        assert_eq!(strip_component_group("(A(=O).B)"), "A(=O).B");
        assert_eq!(strip_component_group("(A)(B)"), "(A)(B)");
    }

    #[test]
    fn parse_parenthesized_reaction() {
        let rxn = parse_reaction_smarts("([C:1]=O.[N:2])>>[C:1][N:2]").unwrap();
        assert_eq!(rxn.reactant_templates.len(), 2);
        assert_eq!(rxn.product_templates.len(), 1);
    }

    #[test]
    fn duplicate_reactant_map_is_rejected() {
        let err = parse_reaction_smarts("[C:1].[O:1]>>[C:1]O").unwrap_err();
        assert_eq!(err, ReactionSmartsError::DuplicateAtomMap { map_num: 1 });
    }

    #[test]
    fn unmapped_product_atom_needs_an_element() {
        let err = parse_reaction_smarts("[C:1]>>[C:1]*").unwrap_err();
        assert_eq!(
            err,
            ReactionSmartsError::UnmappedProductAtom {
                template: 0,
                atom: 1
            }
        );
        // A map number with no reactant counterpart counts as unmapped.
        assert!(parse_reaction_smarts("[C:1]>>[C:1][#8:7]").is_ok());
        assert!(parse_reaction_smarts("[C:1]>>[C:1][a:7]").is_err());
    }

    #[test]
    fn invalid_component_names_section() {
        let err = parse_reaction_smarts("[C:1]=O.[C:2]=P[CH3]3>>[C:1]=[C:2]").unwrap_err();
        assert!(matches!(
            err,
            ReactionSmartsError::InvalidComponent {
                section: "reactant",
                ..
            }
        ));
    }
}

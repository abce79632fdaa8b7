use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;

use crate::element::Element;
use crate::mol::Mol;

use super::error::SmartsError;
use super::query::{AtomExpr, BondExpr};

pub(crate) fn parse(input: &str) -> Result<Mol<AtomExpr, BondExpr>, SmartsError> {
    if input.trim().is_empty() {
        return Err(SmartsError::EmptyInput);
    }
    let mut parser = Parser {
        chars: input.trim().chars().collect(),
        pos: 0,
    };
    parser.parse_smarts()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

struct OpenRing {
    atom: NodeIndex,
    bond: Option<BondExpr>,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn number(&mut self) -> Option<u32> {
        let mut value: Option<u32> = None;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(d));
            self.pos += 1;
        }
        value
    }

    fn parse_smarts(&mut self) -> Result<Mol<AtomExpr, BondExpr>, SmartsError> {
        let mut mol = Mol::new();
        let mut current: Option<NodeIndex> = None;
        let mut pending: Option<(BondExpr, usize)> = None;
        let mut branches: Vec<(NodeIndex, usize)> = Vec::new();
        let mut rings: BTreeMap<u16, OpenRing> = BTreeMap::new();

        while let Some(ch) = self.peek() {
            let start = self.pos;
            match ch {
                '(' => {
                    let Some(cur) = current else {
                        return Err(SmartsError::UnmatchedParen { pos: start });
                    };
                    if let Some((_, pos)) = pending {
                        return Err(SmartsError::DanglingBond { pos });
                    }
                    branches.push((cur, start));
                    self.pos += 1;
                }
                ')' => {
                    if let Some((_, pos)) = pending {
                        return Err(SmartsError::DanglingBond { pos });
                    }
                    let Some((root, _)) = branches.pop() else {
                        return Err(SmartsError::UnmatchedParen { pos: start });
                    };
                    current = Some(root);
                    self.pos += 1;
                }
                '.' => {
                    if let Some((_, pos)) = pending {
                        return Err(SmartsError::DanglingBond { pos });
                    }
                    current = None;
                    self.pos += 1;
                }
                '-' | '=' | '#' | '~' | ':' | '/' | '\\' | '@' | '!' | ',' | ';' | '&' => {
                    if current.is_none() || pending.is_some() {
                        return Err(SmartsError::DanglingBond { pos: start });
                    }
                    pending = Some((self.bond_expr()?, start));
                }
                '0'..='9' | '%' => {
                    let digit = self.ring_digit()?;
                    let Some(cur) = current else {
                        return Err(SmartsError::InvalidRingBond { digit, pos: start });
                    };
                    let bond = pending.take().map(|(b, _)| b);
                    match rings.remove(&digit) {
                        Some(open) => {
                            if open.atom == cur || mol.bond_between(open.atom, cur).is_some() {
                                return Err(SmartsError::InvalidRingBond { digit, pos: start });
                            }
                            let bond = bond.or(open.bond).unwrap_or(BondExpr::SingleOrAromatic);
                            mol.add_bond(open.atom, cur, bond);
                        }
                        None => {
                            rings.insert(digit, OpenRing { atom: cur, bond });
                        }
                    }
                }
                _ => {
                    let expr = if ch == '[' {
                        self.bracket_atom()?
                    } else {
                        self.bare_atom()?
                    };
                    let idx = mol.add_atom(expr);
                    if let Some(prev) = current {
                        let bond = pending
                            .take()
                            .map_or(BondExpr::SingleOrAromatic, |(b, _)| b);
                        mol.add_bond(prev, idx, bond);
                    } else if let Some((_, pos)) = pending {
                        return Err(SmartsError::DanglingBond { pos });
                    }
                    current = Some(idx);
                }
            }
        }

        if let Some((_, pos)) = pending {
            return Err(SmartsError::DanglingBond { pos });
        }
        if let Some((_, pos)) = branches.pop() {
            return Err(SmartsError::UnmatchedParen { pos });
        }
        if let Some((&digit, _)) = rings.iter().next() {
            return Err(SmartsError::UnclosedRing { digit });
        }
        if mol.is_empty() {
            return Err(SmartsError::EmptyInput);
        }
        Ok(mol)
    }

    fn ring_digit(&mut self) -> Result<u16, SmartsError> {
        let start = self.pos;
        if self.peek() == Some('%') {
            let (Some(d1), Some(d2)) = (
                self.peek_at(1).and_then(|c| c.to_digit(10)),
                self.peek_at(2).and_then(|c| c.to_digit(10)),
            ) else {
                return Err(SmartsError::UnexpectedChar { pos: start, ch: '%' });
            };
            self.pos += 3;
            return Ok((d1 * 10 + d2) as u16);
        }
        let d = self
            .peek()
            .and_then(|c| c.to_digit(10))
            .ok_or(SmartsError::UnexpectedEnd { pos: start })?;
        self.pos += 1;
        Ok(d as u16)
    }

    // ---- Bonds ----

    fn bond_expr(&mut self) -> Result<BondExpr, SmartsError> {
        let mut parts = vec![self.bond_or()?];
        while self.peek() == Some(';') {
            self.pos += 1;
            parts.push(self.bond_or()?);
        }
        Ok(flatten_bond_and(parts))
    }

    fn bond_or(&mut self) -> Result<BondExpr, SmartsError> {
        let mut parts = vec![self.bond_and()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            parts.push(self.bond_and()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            BondExpr::Or(parts)
        })
    }

    fn bond_and(&mut self) -> Result<BondExpr, SmartsError> {
        let mut parts = Vec::new();
        loop {
            match self.peek() {
                Some('&') => self.pos += 1,
                Some('-' | '=' | '#' | '~' | ':' | '/' | '\\' | '@' | '!') => {
                    parts.push(self.bond_not()?)
                }
                _ => break,
            }
        }
        if parts.is_empty() {
            return Err(match self.peek() {
                Some(ch) => SmartsError::UnexpectedChar { pos: self.pos, ch },
                None => SmartsError::UnexpectedEnd { pos: self.pos },
            });
        }
        Ok(flatten_bond_and(parts))
    }

    fn bond_not(&mut self) -> Result<BondExpr, SmartsError> {
        if self.peek() == Some('!') {
            self.pos += 1;
            return Ok(BondExpr::Not(Box::new(self.bond_not()?)));
        }
        let pos = self.pos;
        let ch = self.peek().ok_or(SmartsError::UnexpectedEnd { pos })?;
        self.pos += 1;
        Ok(match ch {
            '-' | '/' | '\\' => BondExpr::Single,
            '=' => BondExpr::Double,
            '#' => BondExpr::Triple,
            '~' => BondExpr::True,
            ':' => BondExpr::Aromatic,
            '@' => BondExpr::Ring,
            _ => return Err(SmartsError::UnexpectedChar { pos, ch }),
        })
    }

    // ---- Atoms ----

    fn bare_atom(&mut self) -> Result<AtomExpr, SmartsError> {
        let start = self.pos;
        let ch = self.peek().ok_or(SmartsError::UnexpectedEnd { pos: start })?;
        let two: Option<String> = self.peek_at(1).map(|c2| [ch, c2].iter().collect());
        let (expr, len) = match (ch, two.as_deref()) {
            (_, Some("Cl")) => (element(17, false), 2),
            (_, Some("Br")) => (element(35, false), 2),
            ('*', _) => (AtomExpr::True, 1),
            ('a', _) => (AtomExpr::Aromatic, 1),
            ('A', _) => (AtomExpr::Aliphatic, 1),
            ('B' | 'C' | 'N' | 'O' | 'P' | 'S' | 'F' | 'I', _) => {
                let e = Element::from_symbol(&ch.to_string())
                    .ok_or(SmartsError::UnexpectedChar { pos: start, ch })?;
                (element(e.atomic_num(), false), 1)
            }
            ('b' | 'c' | 'n' | 'o' | 'p' | 's', _) => {
                let e = Element::from_aromatic_symbol(&ch.to_string())
                    .ok_or(SmartsError::UnexpectedChar { pos: start, ch })?;
                (element(e.atomic_num(), true), 1)
            }
            _ => return Err(SmartsError::UnexpectedChar { pos: start, ch }),
        };
        self.pos += len;
        Ok(expr)
    }

    fn bracket_atom(&mut self) -> Result<AtomExpr, SmartsError> {
        let start = self.pos;
        self.pos += 1;
        if self.peek() == Some(']') {
            return Err(SmartsError::UnexpectedChar { pos: self.pos, ch: ']' });
        }

        let mut expr = self.atom_semicolon()?;

        if self.peek() == Some(':') {
            self.pos += 1;
            let map = self
                .number()
                .ok_or(SmartsError::UnexpectedChar { pos: self.pos - 1, ch: ':' })?;
            let map = AtomExpr::AtomMapClass(map.min(u16::MAX as u32) as u16);
            expr = flatten_atom_and(vec![expr, map]);
        }

        match self.peek() {
            Some(']') => {
                self.pos += 1;
                Ok(expr)
            }
            _ => Err(SmartsError::UnclosedBracket { pos: start }),
        }
    }

    fn atom_semicolon(&mut self) -> Result<AtomExpr, SmartsError> {
        let mut parts = vec![self.atom_or()?];
        while self.peek() == Some(';') {
            self.pos += 1;
            parts.push(self.atom_or()?);
        }
        Ok(flatten_atom_and(parts))
    }

    fn atom_or(&mut self) -> Result<AtomExpr, SmartsError> {
        let mut parts = vec![self.atom_and()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            parts.push(self.atom_and()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            AtomExpr::Or(parts)
        })
    }

    fn atom_and(&mut self) -> Result<AtomExpr, SmartsError> {
        let mut parts = Vec::new();
        loop {
            match self.peek() {
                None => return Err(SmartsError::UnexpectedEnd { pos: self.pos }),
                Some(']' | ',' | ';' | ':') => break,
                Some('&') => self.pos += 1,
                Some(_) => {
                    let first = parts.iter().all(|p| matches!(p, AtomExpr::Isotope(_)));
                    parts.push(self.atom_not(first)?);
                }
            }
        }
        if parts.is_empty() {
            return Err(match self.peek() {
                Some(ch) => SmartsError::UnexpectedChar { pos: self.pos, ch },
                None => SmartsError::UnexpectedEnd { pos: self.pos },
            });
        }
        Ok(flatten_atom_and(parts))
    }

    fn atom_not(&mut self, first: bool) -> Result<AtomExpr, SmartsError> {
        if self.peek() == Some('!') {
            self.pos += 1;
            return Ok(AtomExpr::Not(Box::new(self.atom_not(false)?)));
        }
        self.atom_primitive(first)
    }

    fn atom_primitive(&mut self, first: bool) -> Result<AtomExpr, SmartsError> {
        let pos = self.pos;
        let ch = self.peek().ok_or(SmartsError::UnexpectedEnd { pos })?;
        let next = self.peek_at(1);

        if ch.is_ascii_digit() {
            let n = self.number().unwrap_or(0);
            return Ok(AtomExpr::Isotope(n.min(u16::MAX as u32) as u16));
        }

        match ch {
            '*' => {
                self.pos += 1;
                Ok(AtomExpr::True)
            }
            '@' => {
                while self.peek() == Some('@') {
                    self.pos += 1;
                }
                Ok(AtomExpr::True)
            }
            '#' => {
                self.pos += 1;
                match self.number() {
                    Some(n @ 1..=118) => Ok(any_element(n as u8)),
                    _ => Err(SmartsError::InvalidAtomicNum { pos }),
                }
            }
            '+' | '-' => {
                self.pos += 1;
                let sign: i32 = if ch == '+' { 1 } else { -1 };
                let magnitude = match self.number() {
                    Some(n) => n as i32,
                    None => {
                        let mut count = 1;
                        while self.peek() == Some(ch) {
                            self.pos += 1;
                            count += 1;
                        }
                        count
                    }
                };
                Ok(AtomExpr::Charge((sign * magnitude).clamp(-127, 127) as i8))
            }
            '$' => self.recursive(),
            // `[H]`, `[2H]`, `[H+]`: the hydrogen element rather than an H count.
            'H' if first && matches!(next, Some(']' | '+' | '-' | ':' | ';' | ',')) => {
                self.pos += 1;
                Ok(element(1, false))
            }
            'H' if !matches!(next, Some('e' | 'f' | 'g' | 'o' | 's')) => {
                self.pos += 1;
                Ok(AtomExpr::TotalHCount(self.count_or_one()))
            }
            'D' if !next.is_some_and(|c| c.is_ascii_lowercase()) => {
                self.pos += 1;
                Ok(AtomExpr::Degree(self.count_or_one()))
            }
            'X' if next != Some('e') => {
                self.pos += 1;
                Ok(AtomExpr::Connectivity(self.count_or_one()))
            }
            'v' => {
                self.pos += 1;
                Ok(AtomExpr::Valence(self.count_or_one()))
            }
            'R' if !next.is_some_and(|c| c.is_ascii_lowercase()) => {
                self.pos += 1;
                Ok(match self.number() {
                    None => AtomExpr::InRing,
                    Some(0) => AtomExpr::NotInRing,
                    Some(n) => AtomExpr::RingMembership(n.min(255) as u8),
                })
            }
            'r' => {
                self.pos += 1;
                Ok(match self.number() {
                    None => AtomExpr::InRing,
                    Some(0) => AtomExpr::NotInRing,
                    Some(n) => AtomExpr::SmallestRingSize(n.min(255) as u8),
                })
            }
            'a' if next != Some('s') => {
                self.pos += 1;
                Ok(AtomExpr::Aromatic)
            }
            'A' if !next.is_some_and(|c| c.is_ascii_lowercase()) => {
                self.pos += 1;
                Ok(AtomExpr::Aliphatic)
            }
            c if c.is_ascii_lowercase() => {
                if let Some(second) = next.filter(|n| n.is_ascii_lowercase()) {
                    let sym: String = [c, second].iter().collect();
                    if let Some(e) = Element::from_aromatic_symbol(&sym) {
                        self.pos += 2;
                        return Ok(element(e.atomic_num(), true));
                    }
                }
                match Element::from_aromatic_symbol(&c.to_string()) {
                    Some(e) => {
                        self.pos += 1;
                        Ok(element(e.atomic_num(), true))
                    }
                    None => Err(SmartsError::UnexpectedChar { pos, ch }),
                }
            }
            c if c.is_ascii_uppercase() => {
                if let Some(second) = next.filter(|n| n.is_ascii_lowercase()) {
                    let sym: String = [c, second].iter().collect();
                    if let Some(e) = Element::from_symbol(&sym) {
                        self.pos += 2;
                        return Ok(element(e.atomic_num(), false));
                    }
                }
                match Element::from_symbol(&c.to_string()) {
                    Some(e) => {
                        self.pos += 1;
                        Ok(element(e.atomic_num(), false))
                    }
                    None => Err(SmartsError::UnexpectedChar { pos, ch }),
                }
            }
            _ => Err(SmartsError::UnexpectedChar { pos, ch }),
        }
    }

    fn count_or_one(&mut self) -> u8 {
        self.number().map_or(1, |n| n.min(255) as u8)
    }

    fn recursive(&mut self) -> Result<AtomExpr, SmartsError> {
        let start = self.pos;
        if self.peek_at(1) != Some('(') {
            return Err(SmartsError::UnclosedRecursive { pos: start });
        }
        self.pos += 2;
        let inner_start = self.pos;
        let mut depth = 1usize;
        while let Some(ch) = self.peek() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        if depth != 0 {
            return Err(SmartsError::UnclosedRecursive { pos: start });
        }
        let inner: String = self.chars[inner_start..self.pos].iter().collect();
        self.pos += 1;
        let inner_mol = parse(&inner).map_err(|e| shift_position(e, inner_start))?;
        Ok(AtomExpr::Recursive(Box::new(inner_mol)))
    }
}

fn element(atomic_num: u8, aromatic: bool) -> AtomExpr {
    AtomExpr::Element {
        atomic_num,
        aromatic: Some(aromatic),
    }
}

fn any_element(atomic_num: u8) -> AtomExpr {
    AtomExpr::Element {
        atomic_num,
        aromatic: None,
    }
}

fn flatten_atom_and(parts: Vec<AtomExpr>) -> AtomExpr {
    let mut flat = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            AtomExpr::And(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    if flat.len() == 1 {
        flat.remove(0)
    } else {
        AtomExpr::And(flat)
    }
}

fn flatten_bond_and(parts: Vec<BondExpr>) -> BondExpr {
    let mut flat = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            BondExpr::And(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    if flat.len() == 1 {
        flat.remove(0)
    } else {
        BondExpr::And(flat)
    }
}

/// Re-bases a position reported by a nested parse onto the outer string.
fn shift_position(err: SmartsError, offset: usize) -> SmartsError {
    match err {
        SmartsError::UnexpectedChar { pos, ch } => SmartsError::UnexpectedChar {
            pos: pos + offset,
            ch,
        },
        SmartsError::UnexpectedEnd { pos } => SmartsError::UnexpectedEnd { pos: pos + offset },
        SmartsError::UnclosedBracket { pos } => SmartsError::UnclosedBracket { pos: pos + offset },
        SmartsError::UnmatchedParen { pos } => SmartsError::UnmatchedParen { pos: pos + offset },
        SmartsError::InvalidAtomicNum { pos } => SmartsError::InvalidAtomicNum { pos: pos + offset },
        SmartsError::UnclosedRecursive { pos } => {
            SmartsError::UnclosedRecursive { pos: pos + offset }
        }
        SmartsError::DanglingBond { pos } => SmartsError::DanglingBond { pos: pos + offset },
        SmartsError::InvalidRingBond { digit, pos } => SmartsError::InvalidRingBond {
            digit,
            pos: pos + offset,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom0(s: &str) -> AtomExpr {
        parse(s).unwrap().atom(NodeIndex::new(0)).clone()
    }

    #[test]
    fn bare_atoms() {
        assert_eq!(atom0("C"), element(6, false));
        assert_eq!(atom0("c"), element(6, true));
        assert_eq!(atom0("Cl"), element(17, false));
        assert_eq!(atom0("*"), AtomExpr::True);
        assert_eq!(atom0("a"), AtomExpr::Aromatic);
    }

    #[test]
    fn bracket_with_hydrogen_count_and_map() {
        assert_eq!(
            atom0("[cH:1]"),
            AtomExpr::And(vec![
                element(6, true),
                AtomExpr::TotalHCount(1),
                AtomExpr::AtomMapClass(1)
            ])
        );
        assert_eq!(
            atom0("[CH3]"),
            AtomExpr::And(vec![element(6, false), AtomExpr::TotalHCount(3)])
        );
    }

    #[test]
    fn bracket_hydrogen_element() {
        assert_eq!(atom0("[H]"), element(1, false));
        assert_eq!(
            atom0("[H+]"),
            AtomExpr::And(vec![element(1, false), AtomExpr::Charge(1)])
        );
        assert_eq!(
            atom0("[2H]"),
            AtomExpr::And(vec![AtomExpr::Isotope(2), element(1, false)])
        );
    }

    #[test]
    fn charges() {
        assert_eq!(
            atom0("[N+]"),
            AtomExpr::And(vec![element(7, false), AtomExpr::Charge(1)])
        );
        assert_eq!(
            atom0("[O-]"),
            AtomExpr::And(vec![element(8, false), AtomExpr::Charge(-1)])
        );
        assert_eq!(
            atom0("[Fe+++]"),
            AtomExpr::And(vec![element(26, false), AtomExpr::Charge(3)])
        );
    }

    #[test]
    fn operator_precedence() {
        // `&` binds tighter than `,`, which binds tighter than `;`.
        assert_eq!(
            atom0("[C,N&H1;!R]"),
            AtomExpr::And(vec![
                AtomExpr::Or(vec![
                    element(6, false),
                    AtomExpr::And(vec![element(7, false), AtomExpr::TotalHCount(1)]),
                ]),
                AtomExpr::Not(Box::new(AtomExpr::InRing)),
            ])
        );
    }

    #[test]
    fn atomic_number_and_ring_primitives() {
        assert_eq!(atom0("[#6]"), any_element(6));
        assert_eq!(atom0("[R0]"), AtomExpr::NotInRing);
        assert_eq!(atom0("[r6]"), AtomExpr::SmallestRingSize(6));
        assert_eq!(atom0("[D3]"), AtomExpr::Degree(3));
        assert!(matches!(parse("[#0]"), Err(SmartsError::InvalidAtomicNum { .. })));
    }

    #[test]
    fn two_letter_elements_in_brackets() {
        assert_eq!(atom0("[Na]"), element(11, false));
        assert_eq!(atom0("[se]"), element(34, true));
        assert_eq!(atom0("[as]"), element(33, true));
    }

    #[test]
    fn bonds() {
        let q = parse("C=C-C#N").unwrap();
        let orders: Vec<BondExpr> = q.bonds().map(|e| q.bond(e).clone()).collect();
        assert_eq!(orders, vec![BondExpr::Double, BondExpr::Single, BondExpr::Triple]);
        let q = parse("CC").unwrap();
        assert_eq!(q.bond(q.bonds().next().unwrap()), &BondExpr::SingleOrAromatic);
        let q = parse("C!@C").unwrap();
        assert_eq!(
            q.bond(q.bonds().next().unwrap()),
            &BondExpr::Not(Box::new(BondExpr::Ring))
        );
        let q = parse("C-,=C").unwrap();
        assert_eq!(
            q.bond(q.bonds().next().unwrap()),
            &BondExpr::Or(vec![BondExpr::Single, BondExpr::Double])
        );
    }

    #[test]
    fn rings_and_branches() {
        let q = parse("C1CC(=O)CC1").unwrap();
        assert_eq!(q.atom_count(), 6);
        assert_eq!(q.bond_count(), 6);
        let q = parse("[C:1]1[O][C:2]1").unwrap();
        assert_eq!(q.bond_count(), 3);
    }

    #[test]
    fn unclosed_ring_is_reported() {
        assert_eq!(
            parse("[C:2]=P[CH3]3").unwrap_err(),
            SmartsError::UnclosedRing { digit: 3 }
        );
    }

    #[test]
    fn recursive_smarts() {
        let expr = atom0("[$(CO)]");
        let AtomExpr::Recursive(inner) = expr else {
            panic!("expected recursive expression");
        };
        assert_eq!(inner.atom_count(), 2);
        assert!(matches!(parse("[$(CO]"), Err(SmartsError::UnclosedRecursive { .. })));
    }

    #[test]
    fn syntax_errors() {
        assert_eq!(parse("").unwrap_err(), SmartsError::EmptyInput);
        assert!(matches!(parse("[C"), Err(SmartsError::UnexpectedEnd { .. })));
        assert!(matches!(parse("[]"), Err(SmartsError::UnexpectedChar { .. })));
        assert!(matches!(parse("C("), Err(SmartsError::UnmatchedParen { pos: 1 })));
        assert!(matches!(parse("C)"), Err(SmartsError::UnmatchedParen { pos: 1 })));
        assert!(matches!(parse("=C"), Err(SmartsError::DanglingBond { pos: 0 })));
        assert!(matches!(parse("C="), Err(SmartsError::DanglingBond { pos: 1 })));
        assert!(matches!(parse("[Q]"), Err(SmartsError::UnexpectedChar { pos: 1, ch: 'Q' })));
    }
}

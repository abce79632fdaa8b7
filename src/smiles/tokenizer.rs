use crate::element::Element;
use crate::smiles::error::SmilesError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Atom(AtomToken),
    Bond { bond: BondToken, pos: usize },
    RingClosure { digit: u16, pos: usize },
    OpenParen(usize),
    CloseParen(usize),
    Dot(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AtomToken {
    pub element: Element,
    pub is_aromatic: bool,
    pub isotope: u16,
    /// `None` for bare atoms, whose hydrogens are implied by valence.
    pub hcount: Option<u8>,
    pub charge: i8,
    pub pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BondToken {
    Single,
    Double,
    Triple,
    Aromatic,
    /// `/` or `\`. Read as a single bond.
    Directional,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, SmilesError> {
    Lexer {
        chars: input.chars().collect(),
        pos: 0,
    }
    .run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn run(mut self) -> Result<Vec<Token>, SmilesError> {
        let mut tokens = Vec::new();
        while let Some(ch) = self.peek() {
            let start = self.pos;
            let token = match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.pos += 1;
                    continue;
                }
                '[' => Token::Atom(self.bracket_atom()?),
                '-' | '=' | '#' | ':' | '/' | '\\' => {
                    self.pos += 1;
                    let bond = match ch {
                        '-' => BondToken::Single,
                        '=' => BondToken::Double,
                        '#' => BondToken::Triple,
                        ':' => BondToken::Aromatic,
                        _ => BondToken::Directional,
                    };
                    Token::Bond { bond, pos: start }
                }
                '(' => {
                    self.pos += 1;
                    Token::OpenParen(start)
                }
                ')' => {
                    self.pos += 1;
                    Token::CloseParen(start)
                }
                '.' => {
                    self.pos += 1;
                    Token::Dot(start)
                }
                '%' => {
                    let (Some(d1), Some(d2)) = (
                        self.peek_at(1).and_then(|c| c.to_digit(10)),
                        self.peek_at(2).and_then(|c| c.to_digit(10)),
                    ) else {
                        return Err(SmilesError::UnexpectedChar { pos: start, ch });
                    };
                    self.pos += 3;
                    Token::RingClosure {
                        digit: (d1 * 10 + d2) as u16,
                        pos: start,
                    }
                }
                '0'..='9' => {
                    self.pos += 1;
                    Token::RingClosure {
                        digit: ch as u16 - '0' as u16,
                        pos: start,
                    }
                }
                _ => Token::Atom(self.bare_atom()?),
            };
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn bare_atom(&mut self) -> Result<AtomToken, SmilesError> {
        let start = self.pos;
        let ch = self.peek().ok_or(SmilesError::EmptyInput)?;
        let two: Option<String> = self.peek_at(1).map(|c2| [ch, c2].iter().collect());
        let (element, is_aromatic, len) = match (ch, two.as_deref()) {
            (_, Some("Cl")) => (Element::CL, false, 2),
            (_, Some("Br")) => (Element::BR, false, 2),
            ('B', _) => (Element::B, false, 1),
            ('C', _) => (Element::C, false, 1),
            ('N', _) => (Element::N, false, 1),
            ('O', _) => (Element::O, false, 1),
            ('P', _) => (Element::P, false, 1),
            ('S', _) => (Element::S, false, 1),
            ('F', _) => (Element::F, false, 1),
            ('I', _) => (Element::I, false, 1),
            ('b' | 'c' | 'n' | 'o' | 'p' | 's', _) => {
                let element = Element::from_aromatic_symbol(&ch.to_string())
                    .ok_or(SmilesError::UnexpectedChar { pos: start, ch })?;
                (element, true, 1)
            }
            _ => return Err(SmilesError::UnexpectedChar { pos: start, ch }),
        };
        self.pos += len;
        Ok(AtomToken {
            element,
            is_aromatic,
            isotope: 0,
            hcount: None,
            charge: 0,
            pos: start,
        })
    }

    fn bracket_atom(&mut self) -> Result<AtomToken, SmilesError> {
        let start = self.pos;
        self.pos += 1;

        let isotope = self.number().map_or(Ok(0), |n| {
            u16::try_from(n).map_err(|_| SmilesError::InvalidIsotope { pos: start })
        })?;
        let (element, is_aromatic) = self.bracket_element(start)?;

        // Stereo marks are accepted and dropped.
        while self.peek() == Some('@') {
            self.pos += 1;
        }

        let hcount = if self.peek() == Some('H') {
            self.pos += 1;
            match self.peek().and_then(|c| c.to_digit(10)) {
                Some(d) => {
                    self.pos += 1;
                    d as u8
                }
                None => 1,
            }
        } else {
            0
        };

        let charge = self.charge()?;

        if self.peek() == Some(':') {
            self.pos += 1;
            if self.number().is_none() {
                return Err(SmilesError::UnexpectedChar { pos: self.pos, ch: ':' });
            }
        }

        match self.peek() {
            Some(']') => self.pos += 1,
            _ => return Err(SmilesError::UnclosedBracket { pos: start }),
        }

        Ok(AtomToken {
            element,
            is_aromatic,
            isotope,
            hcount: Some(hcount),
            charge,
            pos: start,
        })
    }

    fn bracket_element(&mut self, bracket: usize) -> Result<(Element, bool), SmilesError> {
        let Some(first) = self.peek() else {
            return Err(SmilesError::UnclosedBracket { pos: bracket });
        };
        if first.is_ascii_lowercase() {
            if let Some(second) = self.peek_at(1).filter(|c| c.is_ascii_lowercase()) {
                let sym: String = [first, second].iter().collect();
                if let Some(e) = Element::from_aromatic_symbol(&sym) {
                    self.pos += 2;
                    return Ok((e, true));
                }
            }
            if let Some(e) = Element::from_aromatic_symbol(&first.to_string()) {
                self.pos += 1;
                return Ok((e, true));
            }
        } else if first.is_ascii_uppercase() {
            if let Some(second) = self.peek_at(1).filter(|c| c.is_ascii_lowercase()) {
                let sym: String = [first, second].iter().collect();
                if let Some(e) = Element::from_symbol(&sym) {
                    self.pos += 2;
                    return Ok((e, false));
                }
            }
            if let Some(e) = Element::from_symbol(&first.to_string()) {
                self.pos += 1;
                return Ok((e, false));
            }
        }
        Err(SmilesError::InvalidElement {
            pos: self.pos,
            text: first.to_string(),
        })
    }

    fn number(&mut self) -> Option<u32> {
        let mut value: Option<u32> = None;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(d));
            self.pos += 1;
        }
        value
    }

    fn charge(&mut self) -> Result<i8, SmilesError> {
        let sign: i8 = match self.peek() {
            Some('+') => 1,
            Some('-') => -1,
            _ => return Ok(0),
        };
        let start = self.pos;
        let sign_char = if sign > 0 { '+' } else { '-' };
        self.pos += 1;
        if let Some(n) = self.number() {
            let n = i8::try_from(n).map_err(|_| SmilesError::InvalidCharge { pos: start })?;
            return Ok(sign * n);
        }
        let mut count: i8 = 1;
        while self.peek() == Some(sign_char) {
            count = count
                .checked_add(1)
                .ok_or(SmilesError::InvalidCharge { pos: start })?;
            self.pos += 1;
        }
        Ok(sign * count)
    }
}

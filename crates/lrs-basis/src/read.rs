//! Strict text parsers for the basis-function and mesh-line interchange
//! formats.
//!
//! Grammar (whitespace-insensitive between tokens):
//! - basis function: `<id>:[<u...>] x [<v...>] <cp...> (<weight>)`
//! - mesh line, span-U: `[<start>, <stop>] x <const_par> (<mult>)`
//! - mesh line, span-V: `<const_par> x [<start>, <stop>] (<mult>)`
//!
//! The two mesh-line forms are distinguished by whether the first
//! non-whitespace character is `[`. Any unexpected character is a
//! recoverable `Parse` error carrying the offending token and byte offset.

use std::str::FromStr;

use lrs_core::{LrsError, Result};

use crate::basis::BasisFunction;
use crate::meshline::MeshLine;

/// Byte cursor over the input, tracking the offset for error reporting.
pub(crate) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn err(&self, message: impl Into<String>) -> LrsError {
        LrsError::Parse {
            message: message.into(),
            offset: self.pos,
        }
    }

    pub fn skip_ws(&mut self) {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Next non-whitespace character without consuming it.
    pub fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.text.as_bytes().get(self.pos).copied()
    }

    /// Consume exactly `c` (after whitespace) or fail.
    pub fn expect(&mut self, c: u8) -> Result<()> {
        self.skip_ws();
        match self.text.as_bytes().get(self.pos) {
            Some(&found) if found == c => {
                self.pos += 1;
                Ok(())
            }
            Some(&found) => Err(self.err(format!(
                "expected '{}', found '{}'",
                c as char, found as char
            ))),
            None => Err(self.err(format!("expected '{}', found end of input", c as char))),
        }
    }

    fn token(&mut self) -> Result<&'a str> {
        self.skip_ws();
        let bytes = self.text.as_bytes();
        let start = self.pos;
        while self.pos < bytes.len()
            && (bytes[self.pos].is_ascii_digit()
                || matches!(bytes[self.pos], b'+' | b'-' | b'.' | b'e' | b'E'))
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.err(match bytes.get(self.pos) {
                Some(&c) => format!("expected a number, found '{}'", c as char),
                None => "expected a number, found end of input".to_string(),
            }));
        }
        Ok(&self.text[start..self.pos])
    }

    pub fn number(&mut self) -> Result<f64> {
        let tok = self.token()?;
        tok.parse::<f64>()
            .map_err(|_| self.err(format!("invalid number '{}'", tok)))
    }

    pub fn integer<T: FromStr>(&mut self) -> Result<T> {
        let tok = self.token()?;
        tok.parse::<T>()
            .map_err(|_| self.err(format!("invalid integer '{}'", tok)))
    }

    /// Fail if anything but trailing whitespace remains.
    pub fn finish(&mut self) -> Result<()> {
        self.skip_ws();
        if self.pos < self.text.len() {
            let c = self.text.as_bytes()[self.pos] as char;
            return Err(self.err(format!("trailing input starting at '{}'", c)));
        }
        Ok(())
    }
}

impl FromStr for MeshLine {
    type Err = LrsError;

    fn from_str(s: &str) -> Result<Self> {
        let mut cur = Cursor::new(s);
        let line = if cur.peek() == Some(b'[') {
            // Interval first: spans U, constant V
            cur.expect(b'[')?;
            let start = cur.number()?;
            cur.expect(b',')?;
            let stop = cur.number()?;
            cur.expect(b']')?;
            cur.expect(b'x')?;
            let const_par = cur.number()?;
            cur.expect(b'(')?;
            let multiplicity = cur.integer()?;
            cur.expect(b')')?;
            MeshLine::new(true, const_par, start, stop, multiplicity)
        } else {
            let const_par = cur.number()?;
            cur.expect(b'x')?;
            cur.expect(b'[')?;
            let start = cur.number()?;
            cur.expect(b',')?;
            let stop = cur.number()?;
            cur.expect(b']')?;
            cur.expect(b'(')?;
            let multiplicity = cur.integer()?;
            cur.expect(b')')?;
            MeshLine::new(false, const_par, start, stop, multiplicity)
        };
        cur.finish()?;
        Ok(line)
    }
}

impl BasisFunction {
    /// Parse the strict textual form for a function of known dimension and
    /// orders (the knot counts depend on them).
    pub fn parse(s: &str, dim: usize, order_u: usize, order_v: usize) -> Result<Self> {
        let mut cur = Cursor::new(s);

        let id: i64 = cur.integer()?;
        cur.expect(b':')?;

        cur.expect(b'[')?;
        let mut knot_u = Vec::with_capacity(order_u + 1);
        for _ in 0..=order_u {
            knot_u.push(cur.number()?);
        }
        cur.expect(b']')?;
        cur.expect(b'x')?;
        cur.expect(b'[')?;
        let mut knot_v = Vec::with_capacity(order_v + 1);
        for _ in 0..=order_v {
            knot_v.push(cur.number()?);
        }
        cur.expect(b']')?;

        let mut controlpoint = Vec::with_capacity(dim);
        for _ in 0..dim {
            controlpoint.push(cur.number()?);
        }

        cur.expect(b'(')?;
        let weight = cur.number()?;
        cur.expect(b')')?;
        cur.finish()?;

        let mut basis = BasisFunction::from_knots(
            &knot_u,
            &knot_v,
            &controlpoint,
            dim,
            order_u,
            order_v,
            weight,
        );
        basis.set_id(id);
        Ok(basis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meshline_span_u_round_trip() {
        let line: MeshLine = "[0.25, 0.75] x 0.5 (1)".parse().unwrap();
        assert!(line.is_spanning_u());
        assert_eq!(line.const_par(), 0.5);
        assert_eq!(line.start(), 0.25);
        assert_eq!(line.stop(), 0.75);
        assert_eq!(line.multiplicity(), 1);
        assert_eq!(line.to_string().parse::<MeshLine>().unwrap(), line);
    }

    #[test]
    fn test_meshline_span_v_round_trip() {
        let line: MeshLine = "0.5 x [0, 1] (2)".parse().unwrap();
        assert!(!line.is_spanning_u());
        assert_eq!(line.multiplicity(), 2);
        assert_eq!(line.to_string().parse::<MeshLine>().unwrap(), line);
    }

    #[test]
    fn test_meshline_rejects_garbage() {
        let err = "[0.25; 0.75] x 0.5 (1)".parse::<MeshLine>().unwrap_err();
        match err {
            LrsError::Parse { offset, .. } => assert_eq!(offset, 5),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!("[0, 1] x 0.5".parse::<MeshLine>().is_err());
        assert!("[0, 1] x 0.5 (1) extra".parse::<MeshLine>().is_err());
    }

    #[test]
    fn test_basis_round_trip() {
        let text = "7:[0 0 0.5 1 ] x [0 0.5 1 1 ] 1.25 -2 (0.8)";
        let b = BasisFunction::parse(text, 2, 3, 3).unwrap();
        assert_eq!(b.id(), 7);
        assert_eq!(b.knot_u(), &[0.0, 0.0, 0.5, 1.0]);
        assert_eq!(b.knot_v(), &[0.0, 0.5, 1.0, 1.0]);
        assert_eq!(b.controlpoint(), &[1.25, -2.0]);
        assert_eq!(b.weight(), 0.8);

        let reparsed = BasisFunction::parse(&b.to_string(), 2, 3, 3).unwrap();
        assert_eq!(reparsed.controlpoint(), b.controlpoint());
        assert_eq!(reparsed, b); // structural (knot) equality
    }

    #[test]
    fn test_basis_rejects_missing_tokens() {
        assert!(BasisFunction::parse("[0 1] x [0 1] 0 0 (1)", 2, 1, 1).is_err());
        assert!(BasisFunction::parse("3:[0 1] x [0 1] 0 0", 2, 1, 1).is_err());
        assert!(BasisFunction::parse("3:[0 1] x [0 1] 0 0 (1) junk", 2, 1, 1).is_err());
    }
}

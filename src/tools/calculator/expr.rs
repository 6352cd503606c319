//! Arithmetic over `+ - * / %` with parentheses, parsed by recursive descent.
//!
//! `%` is a postfix operator (`X%` = `X/100`). The `A%ofB` idiom is handled by
//! [`evaluate`] before the grammar sees the input. Nothing else is accepted, so
//! planner-supplied strings never reach anything more powerful than this.

use thiserror::Error;

/// Bound on nested parentheses plus chained unary signs.
const MAX_DEPTH: usize = 256;
const MAX_TOKENS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("Invalid numeric value in expression: '{0}'")]
    BadNumber(String),
    #[error("Invalid mathematical syntax: {0}")]
    Syntax(String),
    #[error("Calculation error: division by zero")]
    DivisionByZero,
    #[error("Calculation error: result is not finite")]
    NotFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tok {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

impl Tok {
    fn symbol(&self) -> String {
        match self {
            Tok::Num(n) => n.to_string(),
            Tok::Plus => "+".into(),
            Tok::Minus => "-".into(),
            Tok::Star => "*".into(),
            Tok::Slash => "/".into(),
            Tok::Percent => "%".into(),
            Tok::LParen => "(".into(),
            Tok::RParen => ")".into(),
        }
    }
}

/// Evaluate a whitespace-free expression, including the `A%ofB` form.
pub fn evaluate(expr: &str) -> Result<f64, CalcError> {
    // ASCII lowercasing keeps byte offsets stable
    let lowered = expr.to_ascii_lowercase();
    let value = match lowered.find("%of") {
        Some(idx) => {
            let percent = eval_plain(&expr[..idx])?;
            let base = eval_plain(&expr[idx + 3..])?;
            (percent / 100.0) * base
        }
        None => eval_plain(expr)?,
    };
    finite(value)
}

fn eval_plain(src: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(CalcError::Syntax("empty expression".into()));
    }
    let mut p = Parser { tokens: &tokens, pos: 0, depth: 0 };
    let value = p.expr()?;
    if let Some((pos, tok)) = p.peek_at() {
        return Err(CalcError::Syntax(format!(
            "unexpected '{}' at token {}",
            tok.symbol(),
            pos
        )));
    }
    finite(value)
}

fn finite(v: f64) -> Result<f64, CalcError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CalcError::NotFinite)
    }
}

fn tokenize(src: &str) -> Result<Vec<Tok>, CalcError> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() && out.len() <= MAX_TOKENS {
        let c = chars[i];
        let tok = match c {
            '+' => Tok::Plus,
            '-' => Tok::Minus,
            '*' => Tok::Star,
            '/' => Tok::Slash,
            '%' => Tok::Percent,
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // exponent: e5, e+5, e-5
                if i < chars.len() && matches!(chars[i], 'e' | 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && matches!(chars[j], '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| CalcError::BadNumber(text.clone()))?;
                out.push(Tok::Num(n));
                continue;
            }
            other => {
                return Err(CalcError::Syntax(format!(
                    "unexpected character '{other}' at position {i}"
                )))
            }
        };
        out.push(tok);
        i += 1;
    }
    if out.len() > MAX_TOKENS {
        return Err(CalcError::Syntax(format!(
            "expression too long (more than {MAX_TOKENS} tokens)"
        )));
    }
    Ok(out)
}

struct Parser<'a> {
    tokens: &'a [Tok],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Tok> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_at(&self) -> Option<(usize, Tok)> {
        self.peek().map(|t| (self.pos, t))
    }

    fn descend(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::Syntax("expression nested too deeply".into()));
        }
        Ok(())
    }

    fn bump(&mut self) -> Option<Tok> {
        let t = self.peek();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut acc = self.term()?;
        while let Some(op @ (Tok::Plus | Tok::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            acc = if op == Tok::Plus { acc + rhs } else { acc - rhs };
        }
        Ok(acc)
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<f64, CalcError> {
        let mut acc = self.unary()?;
        while let Some(op @ (Tok::Star | Tok::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            acc = if op == Tok::Star {
                acc * rhs
            } else {
                if rhs == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                acc / rhs
            };
        }
        Ok(acc)
    }

    // unary := ('+' | '-') unary | postfix
    fn unary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(Tok::Minus) => {
                self.pos += 1;
                self.descend()?;
                let v = -self.unary()?;
                self.depth -= 1;
                Ok(v)
            }
            Some(Tok::Plus) => {
                self.pos += 1;
                self.descend()?;
                let v = self.unary()?;
                self.depth -= 1;
                Ok(v)
            }
            _ => self.postfix(),
        }
    }

    // postfix := primary '%'*
    fn postfix(&mut self) -> Result<f64, CalcError> {
        let mut v = self.primary()?;
        while self.peek() == Some(Tok::Percent) {
            self.pos += 1;
            v /= 100.0;
        }
        Ok(v)
    }

    // primary := number | '(' expr ')'
    fn primary(&mut self) -> Result<f64, CalcError> {
        let at = self.pos;
        match self.bump() {
            Some(Tok::Num(n)) => Ok(n),
            Some(Tok::LParen) => {
                self.descend()?;
                let v = self.expr()?;
                self.depth -= 1;
                match self.bump() {
                    Some(Tok::RParen) => Ok(v),
                    Some(t) => Err(CalcError::Syntax(format!(
                        "expected ')' but found '{}'",
                        t.symbol()
                    ))),
                    None => Err(CalcError::Syntax("missing closing ')'".into())),
                }
            }
            Some(t) => Err(CalcError::Syntax(format!(
                "unexpected '{}' at token {}",
                t.symbol(),
                at
            ))),
            None => Err(CalcError::Syntax("unexpected end of expression".into())),
        }
    }
}

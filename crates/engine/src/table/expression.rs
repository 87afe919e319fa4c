// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Condition and update expression evaluation.
//!
//! Covers the grammar application templates actually use: comparison
//! operators, `AND`/`OR`/`NOT`, `BETWEEN`, `attribute_exists`,
//! `attribute_not_exists`, `begins_with`, `contains`, and update
//! clauses `SET` (with `+`/`-` arithmetic and `if_not_exists`),
//! `REMOVE`, and `ADD`. Name (`#n`) and value (`:v`) placeholders are
//! resolved through the caller-supplied context.

use std::cmp::Ordering;
use std::collections::HashMap;

use lws_core::{AttrValue, EngineError, Item};

/// Placeholder tables for one expression evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprContext<'a> {
    pub names: Option<&'a HashMap<String, String>>,
    pub values: Option<&'a HashMap<String, AttrValue>>,
}

impl<'a> ExprContext<'a> {
    pub fn new(
        names: Option<&'a HashMap<String, String>>,
        values: Option<&'a HashMap<String, AttrValue>>,
    ) -> Self {
        Self { names, values }
    }

    fn resolve_name(&self, segment: &str) -> Result<String, EngineError> {
        if let Some(stripped) = segment.strip_prefix('#') {
            let table = self.names.ok_or_else(|| {
                EngineError::validation(format!("no ExpressionAttributeNames for #{stripped}"))
            })?;
            return table
                .get(&format!("#{stripped}"))
                .cloned()
                .ok_or_else(|| {
                    EngineError::validation(format!("undefined name placeholder #{stripped}"))
                });
        }
        Ok(segment.to_string())
    }

    fn resolve_value(&self, reference: &str) -> Result<AttrValue, EngineError> {
        let table = self.values.ok_or_else(|| {
            EngineError::validation(format!("no ExpressionAttributeValues for {reference}"))
        })?;
        table.get(reference).cloned().ok_or_else(|| {
            EngineError::validation(format!("undefined value placeholder {reference}"))
        })
    }
}

/// Evaluate a condition expression against an item (empty for an
/// absent item).
pub fn eval_condition(
    expression: &str,
    item: &Item,
    ctx: &ExprContext<'_>,
) -> Result<bool, EngineError> {
    let tokens = lex(expression)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let cond = parser.parse_or()?;
    parser.expect_end()?;
    eval(&cond, item, ctx)
}

/// Apply an update expression to an item in place.
pub fn apply_update(
    expression: &str,
    item: &mut Item,
    ctx: &ExprContext<'_>,
) -> Result<(), EngineError> {
    let tokens = lex(expression)?;
    let mut pos = 0;
    while pos < tokens.len() {
        let clause = match &tokens[pos] {
            Token::Ident(word) => word.to_ascii_uppercase(),
            other => {
                return Err(EngineError::validation(format!(
                    "expected update clause, found {other:?}"
                )))
            }
        };
        pos += 1;
        match clause.as_str() {
            "SET" => pos = apply_set_clause(&tokens, pos, item, ctx)?,
            "REMOVE" => pos = apply_remove_clause(&tokens, pos, item, ctx)?,
            "ADD" => pos = apply_add_clause(&tokens, pos, item, ctx)?,
            other => {
                return Err(EngineError::validation(format!("unsupported update clause {other}")))
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    LParen,
    RParen,
    Comma,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
}

fn lex(input: &str) -> Result<Vec<Token>, EngineError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            '<' => {
                if chars.get(i + 1) == Some(&'>') {
                    tokens.push(Token::Ne);
                    i += 2;
                } else if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            c if is_ident_char(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(EngineError::validation(format!(
                    "unexpected character '{other}' in expression"
                )))
            }
        }
    }
    Ok(tokens)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '#' | ':' | '.')
}

// ---------------------------------------------------------------------------
// Condition parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Cond {
    Or(Box<Cond>, Box<Cond>),
    And(Box<Cond>, Box<Cond>),
    Not(Box<Cond>),
    Cmp(Operand, CmpOp, Operand),
    Between(Operand, Operand, Operand),
    Exists(String),
    NotExists(String),
    BeginsWith(String, Operand),
    Contains(String, Operand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone)]
enum Operand {
    Path(String),
    ValueRef(String),
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn keyword(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(ident)) if ident.eq_ignore_ascii_case(word))
    }

    fn expect(&mut self, expected: Token) -> Result<(), EngineError> {
        match self.next() {
            Some(token) if *token == expected => Ok(()),
            other => Err(EngineError::validation(format!(
                "expected {expected:?}, found {other:?}"
            ))),
        }
    }

    fn expect_end(&self) -> Result<(), EngineError> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(EngineError::validation("trailing tokens in expression"))
        }
    }

    fn parse_or(&mut self) -> Result<Cond, EngineError> {
        let mut left = self.parse_and()?;
        while self.keyword("OR") {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Cond::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Cond, EngineError> {
        let mut left = self.parse_unary()?;
        while self.keyword("AND") {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Cond::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Cond, EngineError> {
        if self.keyword("NOT") {
            self.pos += 1;
            return Ok(Cond::Not(Box::new(self.parse_unary()?)));
        }
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.parse_or()?;
            self.expect(Token::RParen)?;
            return Ok(inner);
        }
        self.parse_simple()
    }

    fn parse_simple(&mut self) -> Result<Cond, EngineError> {
        let first = match self.next() {
            Some(Token::Ident(ident)) => ident.clone(),
            other => {
                return Err(EngineError::validation(format!(
                    "expected operand, found {other:?}"
                )))
            }
        };

        // Function call form
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            return self.parse_function(&first);
        }

        let left = operand_from_ident(&first);

        if self.keyword("BETWEEN") {
            self.pos += 1;
            let low = self.parse_operand()?;
            if !self.keyword("AND") {
                return Err(EngineError::validation("BETWEEN requires AND"));
            }
            self.pos += 1;
            let high = self.parse_operand()?;
            return Ok(Cond::Between(left, low, high));
        }

        let op = match self.next() {
            Some(Token::Eq) => CmpOp::Eq,
            Some(Token::Ne) => CmpOp::Ne,
            Some(Token::Lt) => CmpOp::Lt,
            Some(Token::Le) => CmpOp::Le,
            Some(Token::Gt) => CmpOp::Gt,
            Some(Token::Ge) => CmpOp::Ge,
            other => {
                return Err(EngineError::validation(format!(
                    "expected comparator, found {other:?}"
                )))
            }
        };
        let right = self.parse_operand()?;
        Ok(Cond::Cmp(left, op, right))
    }

    fn parse_function(&mut self, name: &str) -> Result<Cond, EngineError> {
        let path = match self.next() {
            Some(Token::Ident(ident)) if !ident.starts_with(':') => ident.clone(),
            other => {
                return Err(EngineError::validation(format!(
                    "{name} expects an attribute path, found {other:?}"
                )))
            }
        };
        let cond = match name.to_ascii_lowercase().as_str() {
            "attribute_exists" => Cond::Exists(path),
            "attribute_not_exists" => Cond::NotExists(path),
            "begins_with" => {
                self.expect(Token::Comma)?;
                Cond::BeginsWith(path, self.parse_operand()?)
            }
            "contains" => {
                self.expect(Token::Comma)?;
                Cond::Contains(path, self.parse_operand()?)
            }
            other => {
                return Err(EngineError::validation(format!("unsupported function {other}")))
            }
        };
        self.expect(Token::RParen)?;
        Ok(cond)
    }

    fn parse_operand(&mut self) -> Result<Operand, EngineError> {
        match self.next() {
            Some(Token::Ident(ident)) => Ok(operand_from_ident(ident)),
            other => Err(EngineError::validation(format!(
                "expected operand, found {other:?}"
            ))),
        }
    }
}

fn operand_from_ident(ident: &str) -> Operand {
    if ident.starts_with(':') {
        Operand::ValueRef(ident.to_string())
    } else {
        Operand::Path(ident.to_string())
    }
}

// ---------------------------------------------------------------------------
// Condition evaluation
// ---------------------------------------------------------------------------

fn eval(cond: &Cond, item: &Item, ctx: &ExprContext<'_>) -> Result<bool, EngineError> {
    match cond {
        Cond::Or(a, b) => Ok(eval(a, item, ctx)? || eval(b, item, ctx)?),
        Cond::And(a, b) => Ok(eval(a, item, ctx)? && eval(b, item, ctx)?),
        Cond::Not(inner) => Ok(!eval(inner, item, ctx)?),
        Cond::Cmp(left, op, right) => {
            let left = resolve_operand(left, item, ctx)?;
            let right = resolve_operand(right, item, ctx)?;
            Ok(compare(left.as_ref(), *op, right.as_ref()))
        }
        Cond::Between(target, low, high) => {
            let target = resolve_operand(target, item, ctx)?;
            let low = resolve_operand(low, item, ctx)?;
            let high = resolve_operand(high, item, ctx)?;
            Ok(compare(target.as_ref(), CmpOp::Ge, low.as_ref())
                && compare(target.as_ref(), CmpOp::Le, high.as_ref()))
        }
        Cond::Exists(path) => Ok(get_path(item, path, ctx)?.is_some()),
        Cond::NotExists(path) => Ok(get_path(item, path, ctx)?.is_none()),
        Cond::BeginsWith(path, prefix) => {
            let value = get_path(item, path, ctx)?;
            let prefix = resolve_operand(prefix, item, ctx)?;
            Ok(match (value, prefix) {
                (Some(AttrValue::S(s)), Some(AttrValue::S(p))) => s.starts_with(&p),
                _ => false,
            })
        }
        Cond::Contains(path, needle) => {
            let value = get_path(item, path, ctx)?;
            let needle = resolve_operand(needle, item, ctx)?;
            Ok(match (value, needle) {
                (Some(AttrValue::S(s)), Some(AttrValue::S(n))) => s.contains(&n),
                (Some(AttrValue::L(list)), Some(needle)) => list.contains(&needle),
                _ => false,
            })
        }
    }
}

fn resolve_operand(
    operand: &Operand,
    item: &Item,
    ctx: &ExprContext<'_>,
) -> Result<Option<AttrValue>, EngineError> {
    match operand {
        Operand::Path(path) => get_path(item, path, ctx),
        Operand::ValueRef(reference) => ctx.resolve_value(reference).map(Some),
    }
}

fn compare(left: Option<&AttrValue>, op: CmpOp, right: Option<&AttrValue>) -> bool {
    let (Some(left), Some(right)) = (left, right) else {
        return false;
    };
    match op {
        CmpOp::Eq => values_equal(left, right),
        CmpOp::Ne => !values_equal(left, right),
        ordered => match order_values(left, right) {
            Some(ordering) => match ordered {
                CmpOp::Lt => ordering == Ordering::Less,
                CmpOp::Le => ordering != Ordering::Greater,
                CmpOp::Gt => ordering == Ordering::Greater,
                CmpOp::Ge => ordering != Ordering::Less,
                CmpOp::Eq | CmpOp::Ne => false,
            },
            None => false,
        },
    }
}

fn values_equal(left: &AttrValue, right: &AttrValue) -> bool {
    if let (AttrValue::N(_), AttrValue::N(_)) = (left, right) {
        if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
            return a == b;
        }
    }
    left == right
}

/// Total order for comparable value pairs: numerics by value, strings
/// lexicographically. Mixed types do not order.
pub(crate) fn order_values(left: &AttrValue, right: &AttrValue) -> Option<Ordering> {
    match (left, right) {
        (AttrValue::N(_), AttrValue::N(_)) => {
            left.as_number().zip(right.as_number()).and_then(|(a, b)| a.partial_cmp(&b))
        }
        (AttrValue::S(a), AttrValue::S(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Resolve a possibly dotted, possibly `#`-substituted path.
fn get_path(
    item: &Item,
    path: &str,
    ctx: &ExprContext<'_>,
) -> Result<Option<AttrValue>, EngineError> {
    let mut segments = path.split('.');
    let first = match segments.next() {
        Some(segment) => ctx.resolve_name(segment)?,
        None => return Ok(None),
    };
    let mut current = match item.get(&first) {
        Some(value) => value.clone(),
        None => return Ok(None),
    };
    for segment in segments {
        let name = ctx.resolve_name(segment)?;
        current = match current {
            AttrValue::M(map) => match map.get(&name) {
                Some(value) => value.clone(),
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
    }
    Ok(Some(current))
}

// ---------------------------------------------------------------------------
// Update application
// ---------------------------------------------------------------------------

fn apply_set_clause(
    tokens: &[Token],
    mut pos: usize,
    item: &mut Item,
    ctx: &ExprContext<'_>,
) -> Result<usize, EngineError> {
    loop {
        let path = expect_path(tokens, &mut pos)?;
        if tokens.get(pos) != Some(&Token::Eq) {
            return Err(EngineError::validation("SET requires '='"));
        }
        pos += 1;
        let value = parse_set_value(tokens, &mut pos, item, ctx)?;
        set_path(item, &path, value, ctx)?;

        if tokens.get(pos) == Some(&Token::Comma) {
            pos += 1;
            continue;
        }
        return Ok(pos);
    }
}

fn parse_set_value(
    tokens: &[Token],
    pos: &mut usize,
    item: &Item,
    ctx: &ExprContext<'_>,
) -> Result<AttrValue, EngineError> {
    let first = parse_set_term(tokens, pos, item, ctx)?;
    let op = match tokens.get(*pos) {
        Some(Token::Plus) => 1.0,
        Some(Token::Minus) => -1.0,
        _ => return Ok(first),
    };
    *pos += 1;
    let second = parse_set_term(tokens, pos, item, ctx)?;
    let (Some(a), Some(b)) = (first.as_number(), second.as_number()) else {
        return Err(EngineError::validation("arithmetic requires numeric operands"));
    };
    Ok(AttrValue::n(format_number(a + op * b)))
}

fn parse_set_term(
    tokens: &[Token],
    pos: &mut usize,
    item: &Item,
    ctx: &ExprContext<'_>,
) -> Result<AttrValue, EngineError> {
    let ident = match tokens.get(*pos) {
        Some(Token::Ident(ident)) => ident.clone(),
        other => {
            return Err(EngineError::validation(format!("expected value, found {other:?}")))
        }
    };
    *pos += 1;

    if ident.eq_ignore_ascii_case("if_not_exists") && tokens.get(*pos) == Some(&Token::LParen) {
        *pos += 1;
        let path = expect_path(tokens, pos)?;
        if tokens.get(*pos) != Some(&Token::Comma) {
            return Err(EngineError::validation("if_not_exists requires a fallback"));
        }
        *pos += 1;
        let fallback = parse_set_term(tokens, pos, item, ctx)?;
        if tokens.get(*pos) != Some(&Token::RParen) {
            return Err(EngineError::validation("unclosed if_not_exists"));
        }
        *pos += 1;
        return Ok(get_path(item, &path, ctx)?.unwrap_or(fallback));
    }

    match operand_from_ident(&ident) {
        Operand::ValueRef(reference) => ctx.resolve_value(&reference),
        Operand::Path(path) => get_path(item, &path, ctx)?
            .ok_or_else(|| EngineError::validation(format!("path {path} not present"))),
    }
}

fn apply_remove_clause(
    tokens: &[Token],
    mut pos: usize,
    item: &mut Item,
    ctx: &ExprContext<'_>,
) -> Result<usize, EngineError> {
    loop {
        let path = expect_path(tokens, &mut pos)?;
        remove_path(item, &path, ctx)?;
        if tokens.get(pos) == Some(&Token::Comma) {
            pos += 1;
            continue;
        }
        return Ok(pos);
    }
}

fn apply_add_clause(
    tokens: &[Token],
    mut pos: usize,
    item: &mut Item,
    ctx: &ExprContext<'_>,
) -> Result<usize, EngineError> {
    loop {
        let path = expect_path(tokens, &mut pos)?;
        let reference = match tokens.get(pos) {
            Some(Token::Ident(ident)) if ident.starts_with(':') => ident.clone(),
            other => {
                return Err(EngineError::validation(format!(
                    "ADD requires a value placeholder, found {other:?}"
                )))
            }
        };
        pos += 1;
        let addend = ctx.resolve_value(&reference)?;
        let current = get_path(item, &path, ctx)?;
        let next = match (current, &addend) {
            (None, _) => addend.clone(),
            (Some(existing), AttrValue::N(_)) => {
                let (Some(a), Some(b)) = (existing.as_number(), addend.as_number()) else {
                    return Err(EngineError::validation("ADD requires numeric operands"));
                };
                AttrValue::n(format_number(a + b))
            }
            _ => return Err(EngineError::validation("ADD requires numeric operands")),
        };
        set_path(item, &path, next, ctx)?;
        if tokens.get(pos) == Some(&Token::Comma) {
            pos += 1;
            continue;
        }
        return Ok(pos);
    }
}

fn expect_path(tokens: &[Token], pos: &mut usize) -> Result<String, EngineError> {
    match tokens.get(*pos) {
        Some(Token::Ident(ident)) if !ident.starts_with(':') => {
            *pos += 1;
            Ok(ident.clone())
        }
        other => Err(EngineError::validation(format!(
            "expected attribute path, found {other:?}"
        ))),
    }
}

fn set_path(
    item: &mut Item,
    path: &str,
    value: AttrValue,
    ctx: &ExprContext<'_>,
) -> Result<(), EngineError> {
    let segments: Vec<String> = path
        .split('.')
        .map(|segment| ctx.resolve_name(segment))
        .collect::<Result<_, _>>()?;
    let (first, rest) = match segments.split_first() {
        Some(split) => split,
        None => return Ok(()),
    };
    if rest.is_empty() {
        item.insert(first.clone(), value);
        return Ok(());
    }
    let entry = item
        .entry(first.clone())
        .or_insert_with(|| AttrValue::M(indexmap::IndexMap::new()));
    let mut current = entry;
    for (i, segment) in rest.iter().enumerate() {
        let AttrValue::M(map) = current else {
            return Err(EngineError::validation(format!(
                "path {path} traverses a non-map attribute"
            )));
        };
        if i == rest.len() - 1 {
            map.insert(segment.clone(), value);
            return Ok(());
        }
        current = map
            .entry(segment.clone())
            .or_insert_with(|| AttrValue::M(indexmap::IndexMap::new()));
    }
    Ok(())
}

fn remove_path(item: &mut Item, path: &str, ctx: &ExprContext<'_>) -> Result<(), EngineError> {
    let segments: Vec<String> = path
        .split('.')
        .map(|segment| ctx.resolve_name(segment))
        .collect::<Result<_, _>>()?;
    match segments.as_slice() {
        [] => Ok(()),
        [only] => {
            item.shift_remove(only);
            Ok(())
        }
        [first, rest @ ..] => {
            let mut current = match item.get_mut(first) {
                Some(value) => value,
                None => return Ok(()),
            };
            for (i, segment) in rest.iter().enumerate() {
                let AttrValue::M(map) = current else { return Ok(()) };
                if i == rest.len() - 1 {
                    map.shift_remove(segment);
                    return Ok(());
                }
                current = match map.get_mut(segment) {
                    Some(value) => value,
                    None => return Ok(()),
                };
            }
            Ok(())
        }
    }
}

/// Render without a trailing `.0` for whole numbers.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
#[path = "expression_tests.rs"]
mod tests;

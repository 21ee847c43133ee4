// SPDX-License-Identifier: MIT

//! Step `condition` evaluation.
//!
//! The source's condition expression is free-form and its evaluator is not
//! fully specified; we implement the documented fallback — a small boolean
//! grammar over `step:<id>.status` comparisons:
//!
//! ```text
//! expr       := or_expr
//! or_expr    := and_expr ( "||" and_expr )*
//! and_expr   := unary ( "&&" unary )*
//! unary      := "(" expr ")" | comparison
//! comparison := "step:" ident ".status" ( "==" | "!=" ) status
//! status     := completed | failed | skipped
//! ```
//!
//! `&&` binds tighter than `||`; parentheses override both.

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::CharIndices;

use loom_core::model::StepResultStatus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConditionError {
    #[error("condition `{0}` does not match the supported `step:<id>.status (==|!=) value` grammar")]
    Unparseable(String),
    #[error("condition `{0}` references unknown status value `{1}`")]
    UnknownStatus(String, String),
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Compare { step: String, negate: bool, expected: StepResultStatus },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// Evaluate `condition` against the accumulated per-step statuses of a flow
/// run. Returns `Ok(true)` when the step should run.
pub fn evaluate(condition: &str, results: &HashMap<String, StepResultStatus>) -> Result<bool, ConditionError> {
    let expr = Parser::new(condition).parse()?;
    Ok(expr.eval(results))
}

impl Expr {
    fn eval(&self, results: &HashMap<String, StepResultStatus>) -> bool {
        match self {
            Expr::Compare { step, negate, expected } => {
                let matches = results.get(step).copied() == Some(*expected);
                matches != *negate
            }
            Expr::And(lhs, rhs) => lhs.eval(results) && rhs.eval(results),
            Expr::Or(lhs, rhs) => lhs.eval(results) || rhs.eval(results),
        }
    }
}

/// Tiny hand-rolled recursive-descent parser; the grammar is small enough
/// that pulling in a parser-combinator crate for it would cost more than it
/// saves.
struct Parser<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser { source, chars: source.char_indices().peekable() }
    }

    fn parse(mut self) -> Result<Expr, ConditionError> {
        let expr = self.or_expr()?;
        self.skip_ws();
        if self.chars.peek().is_some() {
            return Err(self.unparseable());
        }
        Ok(expr)
    }

    fn or_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.and_expr()?;
        loop {
            self.skip_ws();
            if self.eat_token("||") {
                let rhs = self.and_expr()?;
                lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn and_expr(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.unary()?;
        loop {
            self.skip_ws();
            if self.eat_token("&&") {
                let rhs = self.unary()?;
                lhs = Expr::And(Box::new(lhs), Box::new(rhs));
            } else {
                return Ok(lhs);
            }
        }
    }

    fn unary(&mut self) -> Result<Expr, ConditionError> {
        self.skip_ws();
        if self.eat_token("(") {
            let inner = self.or_expr()?;
            self.skip_ws();
            if !self.eat_token(")") {
                return Err(self.unparseable());
            }
            return Ok(inner);
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ConditionError> {
        self.skip_ws();
        if !self.eat_token("step:") {
            return Err(self.unparseable());
        }
        let step = self.take_while(|c| c.is_alphanumeric() || c == '-' || c == '_');
        if step.is_empty() {
            return Err(self.unparseable());
        }
        if !self.eat_token(".status") {
            return Err(self.unparseable());
        }
        self.skip_ws();
        let negate = if self.eat_token("==") {
            false
        } else if self.eat_token("!=") {
            true
        } else {
            return Err(self.unparseable());
        };
        self.skip_ws();
        let raw_value = self.take_quoted_or_bare();
        let expected = parse_status(&raw_value)
            .ok_or_else(|| ConditionError::UnknownStatus(self.source.to_string(), raw_value))?;

        Ok(Expr::Compare { step, negate, expected })
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some((_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn eat_token(&mut self, token: &str) -> bool {
        let mut probe = self.chars.clone();
        for expected in token.chars() {
            match probe.next() {
                Some((_, c)) if c == expected => {}
                _ => return false,
            }
        }
        self.chars = probe;
        true
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if pred(c) {
                out.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        out
    }

    fn take_quoted_or_bare(&mut self) -> String {
        if self.eat_token("\"") {
            let value = self.take_while(|c| c != '"');
            self.eat_token("\"");
            value
        } else {
            self.take_while(|c| c.is_alphanumeric())
        }
    }

    fn unparseable(&self) -> ConditionError {
        ConditionError::Unparseable(self.source.to_string())
    }
}

fn parse_status(raw: &str) -> Option<StepResultStatus> {
    match raw {
        "completed" => Some(StepResultStatus::Completed),
        "failed" => Some(StepResultStatus::Failed),
        "skipped" => Some(StepResultStatus::Skipped),
        _ => None,
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;

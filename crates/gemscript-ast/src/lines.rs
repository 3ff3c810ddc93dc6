//! Flatten a script into numbered editor lines.
//!
//! Every token gets a stable key `"line,pos"` (both 1-based) so an editor
//! can map a click or a diagnostic back to a token. A block token ends its
//! line; the block's statements follow one level deeper, and any tokens
//! after the block continue on a fresh line at the original level.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::script::Script;
use crate::token::{Statement, Token};

/// Position of a token on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenKey {
    pub line: usize,
    pub pos: usize,
}

impl fmt::Display for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.line, self.pos)
    }
}

/// One rendered line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLine {
    pub line: usize,
    pub level: usize,
    pub tokens: Vec<(TokenKey, Token)>,
}

/// A flattened script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub lines: Vec<PageLine>,
    /// Reverse lookup from `"line,pos"` to the token at that position.
    pub token_map: IndexMap<String, Token>,
}

impl Page {
    pub fn token_at(&self, line: usize, pos: usize) -> Option<&Token> {
        self.token_map.get(&TokenKey { line, pos }.to_string())
    }
}

/// Flatten `script` into a page of numbered lines.
pub fn script_to_lines(script: &Script) -> Page {
    let mut builder = PageBuilder::default();
    for statement in script.statements() {
        builder.statement(script, statement, 0);
    }
    builder.page
}

#[derive(Default)]
struct PageBuilder {
    page: Page,
    current: Option<PageLine>,
}

impl PageBuilder {
    fn statement(&mut self, script: &Script, statement: &Statement, level: usize) {
        self.open(level);
        for token in &statement.tokens {
            if self.current.is_none() {
                self.open(level);
            }
            self.push(token.clone());
            if let Token::Block(id) = token {
                self.flush();
                for nested in script.block(*id).unwrap_or(&[]) {
                    self.statement(script, nested, level + 1);
                }
            }
        }
        self.flush();
    }

    fn open(&mut self, level: usize) {
        self.flush();
        self.current = Some(PageLine {
            line: self.page.lines.len() + 1,
            level,
            tokens: Vec::new(),
        });
    }

    fn push(&mut self, token: Token) {
        if let Some(line) = self.current.as_mut() {
            let key = TokenKey {
                line: line.line,
                pos: line.tokens.len() + 1,
            };
            self.page.token_map.insert(key.to_string(), token.clone());
            line.tokens.push((key, token));
        }
    }

    fn flush(&mut self) {
        if let Some(line) = self.current.take() {
            if !line.tokens.is_empty() {
                self.page.lines.push(line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::BlockId;

    #[test]
    fn test_flat_statements_number_lines() {
        let script = Script::from_statements(vec![
            Statement::new(vec![Token::ident("useFeature"), Token::ident("Movement")]),
            Statement::new(vec![
                Token::ident("setProp"),
                Token::objref("agent.x"),
                Token::literal(3.0),
            ]),
        ]);
        let page = script_to_lines(&script);
        assert_eq!(page.lines.len(), 2);
        assert_eq!(page.lines[1].line, 2);
        assert_eq!(page.token_at(2, 3), Some(&Token::literal(3.0)));
        assert_eq!(page.token_map.len(), 5);
    }

    #[test]
    fn test_block_splits_lines_and_indents() {
        let mut script = Script::new();
        let body = script.new_block();
        script.push(body, Statement::new(vec![Token::ident("dbgOut"), Token::literal("tick")]));
        script.push(
            BlockId::ROOT,
            Statement::new(vec![
                Token::ident("repeat"),
                Token::literal(2.0),
                Token::Block(body),
                Token::ident("trailing"),
            ]),
        );
        let page = script_to_lines(&script);
        let levels: Vec<usize> = page.lines.iter().map(|l| l.level).collect();
        assert_eq!(levels, vec![0, 1, 0]);
        assert_eq!(page.lines[0].tokens.len(), 3);
        assert_eq!(page.token_at(2, 1), Some(&Token::ident("dbgOut")));
        assert_eq!(page.token_at(3, 1), Some(&Token::ident("trailing")));
    }
}

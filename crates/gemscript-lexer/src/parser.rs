//! Statement and block parser.

use std::ops::Range;

use logos::Logos;
use thiserror::Error;
use tracing::trace;

use gemscript_ast::{BlockId, Script, Statement, Token as AstToken, PRAGMA};
use gemscript_foundation::Value;

use crate::Token;

/// A syntax error with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Parse source text into a script.
///
/// Nested blocks are allocated in the order their `[[` appears.
///
/// # Errors
///
/// Returns [`ParseError`] on an unrecognized character, a `#` that does
/// not start a line, an unbalanced `]]`, or an unterminated block.
pub fn parse_script(source: &str) -> Result<Script, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                return Err(error_at(
                    source,
                    lexer.span().start,
                    format!("unexpected input '{}'", lexer.slice()),
                ))
            }
        }
    }
    trace!(tokens = tokens.len(), "lexed script");

    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        script: Script::new(),
    };
    parser.parse_block(BlockId::ROOT, None)?;
    Ok(parser.script)
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
    script: Script,
}

impl<'s> Parser<'s> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, span)| span.start)
            .unwrap_or(self.source.len())
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        error_at(self.source, self.offset(), message.into())
    }

    /// Parse statements into `block`. `opened_at` is the offset of the `[[`
    /// for nested blocks, `None` for the root.
    fn parse_block(&mut self, block: BlockId, opened_at: Option<usize>) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(Token::Newline) => self.pos += 1,
                Some(Token::BlockClose) => {
                    if opened_at.is_none() {
                        return Err(self.error("unexpected ']]' outside a block"));
                    }
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => {
                    let statement = self.parse_statement()?;
                    if !statement.is_empty() {
                        self.script.push(block, statement);
                    }
                }
                None => {
                    return match opened_at {
                        Some(offset) => Err(error_at(
                            self.source,
                            offset,
                            "unterminated block: missing ']]'".to_string(),
                        )),
                        None => Ok(()),
                    }
                }
            }
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let mut tokens = Vec::new();
        if self.peek() == Some(&Token::Hash) {
            self.pos += 1;
            tokens.push(AstToken::Identifier(PRAGMA.to_string()));
        }
        loop {
            let token = match self.peek() {
                None | Some(Token::Newline) | Some(Token::BlockClose) => break,
                Some(Token::Hash) => {
                    return Err(self.error("'#' is only allowed at the start of a statement"))
                }
                Some(Token::BlockOpen) => {
                    let opened_at = self.offset();
                    self.pos += 1;
                    let id = self.script.new_block();
                    self.parse_block(id, Some(opened_at))?;
                    tokens.push(AstToken::Block(id));
                    continue;
                }
                Some(Token::Ident(name)) => AstToken::Identifier(name.clone()),
                Some(Token::ObjRef(parts)) => AstToken::ObjRef(parts.clone()),
                Some(Token::Number(n)) => AstToken::Literal(Value::Number(*n)),
                Some(Token::Str(s)) => AstToken::Literal(Value::String(s.clone())),
                Some(Token::Bool(b)) => AstToken::Literal(Value::Boolean(*b)),
                Some(Token::Null) => AstToken::Literal(Value::Null),
            };
            self.pos += 1;
            tokens.push(token);
        }
        Ok(Statement::new(tokens))
    }
}

fn error_at(source: &str, offset: usize, message: String) -> ParseError {
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0) + 1;
    ParseError {
        line,
        column,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pragma_becomes_keyword() {
        let script = parse_script("# PROGRAM UPDATE\n").unwrap();
        let stmt = &script.statements()[0];
        assert!(stmt.tokens[0].is_pragma());
        assert_eq!(stmt.tokens[1], AstToken::ident("PROGRAM"));
    }

    #[test]
    fn test_blank_lines_and_comments_skipped() {
        let script = parse_script("\n\n// nothing here\nuseFeature IU\n\n").unwrap();
        assert_eq!(script.statements().len(), 1);
    }

    #[test]
    fn test_multiline_blocks() {
        let source = "\
ifProp agent.energy lessThan 5 [[
  dbgOut \"hungry\"
  repeat 2 [[ dbgOut 'inner' ]]
]] [[
  dbgOut \"fine\"
]]
";
        let script = parse_script(source).unwrap();
        assert_eq!(script.block_count(), 4);
        let stmt = &script.statements()[0];
        let blocks: Vec<BlockId> = stmt.blocks().collect();
        assert_eq!(blocks, vec![BlockId::new(1), BlockId::new(3)]);
        let then = script.block(BlockId::new(1)).unwrap();
        assert_eq!(then.len(), 2);
        assert_eq!(then[1].tokens[2], AstToken::Block(BlockId::new(2)));
    }

    #[test]
    fn test_unterminated_block() {
        let err = parse_script("repeat 3 [[\n  dbgOut 1\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 10);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_stray_close() {
        let err = parse_script("dbgOut 1\n]]\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_hash_mid_statement() {
        assert!(parse_script("dbgOut # 1").is_err());
    }

    #[test]
    fn test_bad_character_position() {
        let err = parse_script("setProp x 1\nsetProp y @").unwrap_err();
        assert_eq!((err.line, err.column), (2, 11));
    }
}

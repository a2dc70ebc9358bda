//! Character scanner for filter source.

use super::token::{LexErrorKind, Position, Token, TokenKind};
use crate::error::FilterError;

/// Single-pass scanner. Problems are reported as `TokenKind::Error` tokens
/// rather than failing, so the parser decides when to stop.
///
/// [`Lexer::tokens`] iterates the remaining tokens without the final EOF.
#[derive(Debug, Clone)]
pub struct Lexer {
    chars: Vec<char>,
    offset: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Rewind to the start of the source.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.line = 1;
        self.column = 1;
    }

    /// Scan the next token. Returns EOF tokens forever once input is exhausted.
    pub fn scan(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.here();

        let Some(c) = self.bump() else {
            return Token::new(TokenKind::Eof, "", start, start);
        };

        match c {
            '(' => self.token(TokenKind::LParen, "(", start),
            ')' => self.token(TokenKind::RParen, ")", start),
            '[' => self.token(TokenKind::LBracket, "[", start),
            ']' => self.token(TokenKind::RBracket, "]", start),
            ',' => self.token(TokenKind::Comma, ",", start),
            '=' => self.pair('=', TokenKind::Eq, "==", "=", start),
            '!' => self.pair('=', TokenKind::NotEq, "!=", "!", start),
            '<' => {
                if self.eat('=') {
                    self.token(TokenKind::LtEq, "<=", start)
                } else {
                    self.token(TokenKind::Lt, "<", start)
                }
            }
            '>' => {
                if self.eat('=') {
                    self.token(TokenKind::GtEq, ">=", start)
                } else {
                    self.token(TokenKind::Gt, ">", start)
                }
            }
            '\'' => self.string(start),
            '-' if self.peek().is_some_and(|d| d.is_ascii_digit()) => self.number('-', start),
            d if d.is_ascii_digit() => self.number(d, start),
            l if l.is_alphabetic() => self.ident(l, start),
            other => self.token(
                TokenKind::Error(LexErrorKind::IllegalCharacter),
                other.to_string(),
                start,
            ),
        }
    }

    fn here(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.offset).copied()
    }

    fn peek_second(&self) -> Option<char> {
        self.chars.get(self.offset + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn token(&self, kind: TokenKind, literal: impl Into<String>, start: Position) -> Token {
        Token::new(kind, literal, start, self.here())
    }

    fn pair(&mut self, second: char, kind: TokenKind, both: &str, alone: &str, start: Position) -> Token {
        if self.eat(second) {
            self.token(kind, both, start)
        } else {
            self.token(TokenKind::Error(LexErrorKind::IllegalCharacter), alone, start)
        }
    }

    fn string(&mut self, start: Position) -> Token {
        let mut value = String::new();
        loop {
            match self.bump() {
                None => {
                    return self.token(
                        TokenKind::Error(LexErrorKind::UnterminatedString),
                        format!("'{}", value),
                        start,
                    )
                }
                Some('\'') => return self.token(TokenKind::String, value, start),
                Some('\\') => match self.bump() {
                    None => {
                        return self.token(
                            TokenKind::Error(LexErrorKind::UnterminatedString),
                            format!("'{}\\", value),
                            start,
                        )
                    }
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(other) => value.push(other),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn number(&mut self, first: char, start: Position) -> Token {
        let mut text = String::from(first);
        self.digits(&mut text);

        if self.peek() == Some('.') {
            if self.peek_second().is_some_and(|d| d.is_ascii_digit()) {
                self.bump();
                text.push('.');
                self.digits(&mut text);
            } else {
                self.bump();
                text.push('.');
                return self.token(TokenKind::Error(LexErrorKind::MalformedNumber), text, start);
            }
        }
        self.token(TokenKind::Number, text, start)
    }

    fn digits(&mut self, text: &mut String) {
        while let Some(d) = self.peek().filter(|d| d.is_ascii_digit()) {
            self.bump();
            text.push(d);
        }
    }

    fn ident(&mut self, first: char, start: Position) -> Token {
        let mut text = String::from(first);
        while let Some(c) = self.peek().filter(|c| c.is_alphanumeric() || *c == '_') {
            self.bump();
            text.push(c);
        }
        let lower = text.to_lowercase();
        match TokenKind::keyword(&lower) {
            Some(kind) => self.token(kind, lower, start),
            None => self.token(TokenKind::Ident, text, start),
        }
    }
}

impl Lexer {
    /// Iterate the remaining tokens, stopping before end of input.
    pub fn tokens(&mut self) -> Tokens<'_> {
        Tokens { lexer: self }
    }
}

/// Iterator returned by [`Lexer::tokens`].
#[derive(Debug)]
pub struct Tokens<'a> {
    lexer: &'a mut Lexer,
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.lexer.scan();
        if token.is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

/// Convert an error token into the matching [`FilterError`].
pub fn lex_error(token: &Token) -> Option<FilterError> {
    let found = token.literal.clone();
    let pos = token.start;
    match token.kind {
        TokenKind::Error(LexErrorKind::IllegalCharacter) => Some(FilterError::IllegalCharacter { found, pos }),
        TokenKind::Error(LexErrorKind::UnterminatedString) => Some(FilterError::UnterminatedString { found, pos }),
        TokenKind::Error(LexErrorKind::MalformedNumber) => Some(FilterError::MalformedNumber { found, pos }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokens().map(|t| t.kind).collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("== != < <= > >= ( ) [ ] ,"),
            vec![
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Comma,
            ]
        );
    }

    #[test]
    fn test_bare_equals_and_bang_are_illegal() {
        let illegal = TokenKind::Error(LexErrorKind::IllegalCharacter);
        assert_eq!(kinds("a = 1"), vec![TokenKind::Ident, illegal, TokenKind::Number]);
        assert_eq!(kinds("!a"), vec![illegal, TokenKind::Ident]);
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens: Vec<_> = Lexer::new("AND Or nOt IN Like TRUE false").tokens().collect();
        let literals: Vec<_> = tokens.iter().map(|t| t.literal.as_str()).collect();
        assert_eq!(literals, vec!["and", "or", "not", "in", "like", "true", "false"]);
        assert_eq!(tokens[5].kind, TokenKind::True);
    }

    #[test]
    fn test_identifiers_keep_case() {
        let token = Lexer::new("userName_2").scan();
        assert_eq!(token.kind, TokenKind::Ident);
        assert_eq!(token.literal, "userName_2");
    }

    #[test]
    fn test_numbers() {
        let tokens: Vec<_> = Lexer::new("42 -7 3.25 -0.5").tokens().collect();
        let literals: Vec<_> = tokens.iter().map(|t| t.literal.as_str()).collect();
        assert_eq!(literals, vec!["42", "-7", "3.25", "-0.5"]);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn test_malformed_number() {
        let token = Lexer::new("12.").scan();
        assert_eq!(token.kind, TokenKind::Error(LexErrorKind::MalformedNumber));
        assert_eq!(token.literal, "12.");
    }

    #[test]
    fn test_detached_minus_is_illegal() {
        assert_eq!(
            kinds("- 5"),
            vec![TokenKind::Error(LexErrorKind::IllegalCharacter), TokenKind::Number]
        );
    }

    #[test]
    fn test_string_escapes() {
        let token = Lexer::new(r"'it\'s\n\ta \\ \q'").scan();
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.literal, "it's\n\ta \\ q");
    }

    #[test]
    fn test_unterminated_string() {
        let token = Lexer::new("'abc").scan();
        assert_eq!(token.kind, TokenKind::Error(LexErrorKind::UnterminatedString));

        let token = Lexer::new(r"'abc\").scan();
        assert_eq!(token.kind, TokenKind::Error(LexErrorKind::UnterminatedString));
    }

    #[test]
    fn test_positions() {
        let mut lexer = Lexer::new("a ==\n  'x'");
        let a = lexer.scan();
        assert_eq!((a.start, a.end), (Position::new(1, 1), Position::new(1, 2)));
        let eq = lexer.scan();
        assert_eq!(eq.start, Position::new(1, 3));
        let x = lexer.scan();
        assert_eq!((x.start, x.end), (Position::new(2, 3), Position::new(2, 6)));
        let eof = lexer.scan();
        assert!(eof.is_eof());
        assert_eq!(eof.start, Position::new(2, 6));
        assert!(lexer.scan().is_eof());
    }

    #[test]
    fn test_reset() {
        let mut lexer = Lexer::new("a b");
        assert_eq!(lexer.tokens().count(), 2);
        lexer.reset();
        assert_eq!(lexer.scan().literal, "a");
    }

    #[test]
    fn test_scan_on_owned_lexer_returns_tokens() {
        let mut lexer = Lexer::new("score >= 10");
        let score = lexer.scan();
        assert_eq!(score.kind, TokenKind::Ident);
        assert_eq!(score.end, Position::new(1, 6));
        let op = lexer.scan();
        assert_eq!((op.kind, op.start), (TokenKind::GtEq, Position::new(1, 7)));
        assert_eq!(lexer.tokens().map(|t| t.literal).collect::<Vec<_>>(), vec!["10"]);
        assert!(lexer.scan().is_eof());
    }

    #[test]
    fn test_unicode_identifier() {
        let token = Lexer::new("größe").scan();
        assert_eq!(token.kind, TokenKind::Ident);
        assert_eq!(token.end, Position::new(1, 6));
    }

    #[test]
    fn test_lex_error_conversion() {
        let token = Lexer::new("$").scan();
        assert_eq!(
            lex_error(&token),
            Some(FilterError::IllegalCharacter {
                found: "$".to_string(),
                pos: Position::new(1, 1)
            })
        );
        assert_eq!(lex_error(&Token::operator(TokenKind::And)), None);
    }
}

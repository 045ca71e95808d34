use crate::token::{Directive, Span, SpannedToken, Token};
use std::fmt;

/// Lexer error.
#[derive(Clone, Debug, PartialEq)]
pub struct LexError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for LexError {}

/// Pull-based lexer for the extended dialect.
pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    current: Option<Result<SpannedToken, LexError>>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer from source bytes.
    pub fn new(source: &'a [u8]) -> Self {
        let mut lexer = Lexer {
            source,
            pos: 0,
            line: 1,
            column: 1,
            current: None,
        };
        // Prime the first token
        lexer.current = Some(lexer.scan_token());
        lexer
    }

    /// Peek at the current token without consuming.
    pub fn current(&self) -> Result<&SpannedToken, &LexError> {
        match &self.current {
            Some(Ok(tok)) => Ok(tok),
            Some(Err(e)) => Err(e),
            None => unreachable!("lexer should always have a current token"),
        }
    }

    /// Consume the current token and advance to the next one.
    pub fn advance(&mut self) -> Result<SpannedToken, LexError> {
        let prev = self.current.take().unwrap();
        self.current = Some(self.scan_token());
        prev
    }

    /// Get current line number.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Peek at the token after the current one without consuming
    /// anything. Returns `None` when the next token is a lex error.
    pub fn peek_after_current(&mut self) -> Option<Token> {
        let saved = (self.pos, self.line, self.column);
        let next = self.scan_token().ok().map(|st| st.token);
        (self.pos, self.line, self.column) = saved;
        next
    }

    // ---- Internal scanning ----

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance_char(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            // \n\r counts as one newline
            if self.peek() == Some(b'\r') {
                self.pos += 1;
            }
            self.line += 1;
            self.column = 1;
        } else if ch == b'\r' {
            // \r\n counts as one newline
            if self.peek() == Some(b'\n') {
                self.pos += 1;
            }
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while let Some(ch) = self.peek() {
                if ch == b' '
                    || ch == b'\t'
                    || ch == b'\n'
                    || ch == b'\r'
                    || ch == b'\x0C'
                    || ch == b'\x0B'
                {
                    self.advance_char();
                } else {
                    break;
                }
            }

            if self.peek() == Some(b'-') && self.peek_at(1) == Some(b'-') {
                self.advance_char(); // -
                self.advance_char(); // -
                if self.peek() == Some(b'[') {
                    if let Some(level) = self.check_long_bracket() {
                        // Long comment
                        if self.scan_long_string_content(level).is_err() {
                            // Error surfaces when the next token is scanned
                            return;
                        }
                        continue;
                    }
                }
                // Short comment: skip to end of line
                while let Some(ch) = self.peek() {
                    if ch == b'\n' || ch == b'\r' {
                        break;
                    }
                    self.advance_char();
                }
                continue;
            }

            break;
        }
    }

    /// Check if the current position starts a long bracket `[=*[`.
    /// Returns the level if so.
    fn check_long_bracket(&self) -> Option<usize> {
        if self.peek() != Some(b'[') {
            return None;
        }
        let mut level = 0;
        let mut offset = 1;
        while self.peek_at(offset) == Some(b'=') {
            level += 1;
            offset += 1;
        }
        if self.peek_at(offset) == Some(b'[') {
            Some(level)
        } else {
            None
        }
    }

    fn check_closing_long_bracket(&self, level: usize) -> bool {
        if self.peek() != Some(b']') {
            return false;
        }
        for offset in 1..=level {
            if self.peek_at(offset) != Some(b'=') {
                return false;
            }
        }
        self.peek_at(level + 1) == Some(b']')
    }

    fn error(&self, span: Span, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            line: span.line,
            column: span.column,
        }
    }

    fn scan_token(&mut self) -> Result<SpannedToken, LexError> {
        self.skip_whitespace_and_comments();

        let span = Span {
            line: self.line,
            column: self.column,
        };

        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Ok(SpannedToken { token: Token::Eof, span }),
        };

        let token = match ch {
            b'+' => self.op_or_assign(Token::Plus, Token::PlusAssign),
            b'-' => self.op_or_assign(Token::Minus, Token::MinusAssign),
            b'*' => self.op_or_assign(Token::Star, Token::StarAssign),
            b'/' => self.op_or_assign(Token::Slash, Token::SlashAssign),
            b'%' => self.op_or_assign(Token::Percent, Token::PercentAssign),
            b'^' => self.op_or_assign(Token::Caret, Token::CaretAssign),
            b'(' => self.single(Token::LParen),
            b')' => self.single(Token::RParen),
            b'{' => self.single(Token::LBrace),
            b'}' => self.single(Token::RBrace),
            b']' => self.single(Token::RBracket),
            b';' => self.single(Token::Semi),
            b',' => self.single(Token::Comma),
            b'<' => self.op_or_assign(Token::Less, Token::LessEq),
            b'>' => self.op_or_assign(Token::Greater, Token::GreaterEq),
            b'=' => self.op_or_assign(Token::Assign, Token::Equal),
            b'~' => {
                self.advance_char();
                if self.peek() == Some(b'=') {
                    self.advance_char();
                    Token::NotEqual
                } else {
                    return Err(self.error(span, "unexpected symbol near '~'"));
                }
            }
            b':' => {
                self.advance_char();
                if self.peek() == Some(b':') {
                    self.advance_char();
                    Token::DoubleColon
                } else {
                    Token::Colon
                }
            }
            b'#' => return self.scan_hash(span),
            b'.' => {
                self.advance_char();
                if self.peek() == Some(b'.') {
                    self.advance_char();
                    if self.peek() == Some(b'.') {
                        self.advance_char();
                        Token::DotDotDot
                    } else if self.peek() == Some(b'=') {
                        self.advance_char();
                        Token::ConcatAssign
                    } else {
                        Token::DotDot
                    }
                } else if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    return self.scan_number_after_dot(span);
                } else {
                    Token::Dot
                }
            }
            b'[' => {
                if let Some(level) = self.check_long_bracket() {
                    return self.scan_long_string(level, span);
                }
                self.single(Token::LBracket)
            }
            b'"' | b'\'' => return self.scan_short_string(span),
            b'0'..=b'9' => return self.scan_number(span),
            _ if is_ident_start(ch) => return Ok(self.scan_name(span)),
            _ => {
                self.advance_char();
                let near = if ch.is_ascii_graphic() || ch == b' ' {
                    format!("'{}'", ch as char)
                } else {
                    format!("'<\\{}>'", ch)
                };
                return Err(self.error(span, format!("unexpected symbol near {near}")));
            }
        };

        Ok(SpannedToken { token, span })
    }

    /// Consume one character and produce `plain`.
    fn single(&mut self, plain: Token) -> Token {
        self.advance_char();
        plain
    }

    /// Consume one character; if an `=` follows, consume it too and
    /// produce `with_eq`, otherwise `plain`.
    fn op_or_assign(&mut self, plain: Token, with_eq: Token) -> Token {
        self.advance_char();
        if self.peek() == Some(b'=') {
            self.advance_char();
            with_eq
        } else {
            plain
        }
    }

    /// `#` introduces a directive when followed by exactly a directive
    /// name; any other `#` is the length operator.
    fn scan_hash(&mut self, span: Span) -> Result<SpannedToken, LexError> {
        let mut end = self.pos + 1;
        while self
            .source
            .get(end)
            .copied()
            .is_some_and(is_ident_continue)
        {
            end += 1;
        }
        let word = std::str::from_utf8(&self.source[self.pos + 1..end]).unwrap_or("");
        if let Some(directive) = Directive::from_str(word) {
            for _ in self.pos..end {
                self.advance_char();
            }
            return Ok(SpannedToken {
                token: Token::Directive(directive),
                span,
            });
        }
        self.advance_char(); // #
        Ok(SpannedToken { token: Token::Hash, span })
    }

    fn scan_name(&mut self, span: Span) -> SpannedToken {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if is_ident_continue(ch) {
                self.advance_char();
            } else {
                break;
            }
        }
        let name = std::str::from_utf8(&self.source[start..self.pos])
            .unwrap_or("")
            .to_string();

        let token = match Token::keyword_from_str(&name) {
            Some(keyword) => keyword,
            None => Token::Name(name),
        };
        SpannedToken { token, span }
    }

    fn scan_number(&mut self, span: Span) -> Result<SpannedToken, LexError> {
        let start = self.pos;

        if self.peek() == Some(b'0') && self.peek_at(1).is_some_and(|c| c == b'x' || c == b'X') {
            self.advance_char(); // 0
            self.advance_char(); // x/X
            return self.scan_hex_number(start, span);
        }

        let mut is_float = false;

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_char();
        }

        // Fractional part (but not `..`)
        if self.peek() == Some(b'.') && self.peek_at(1) != Some(b'.') {
            is_float = true;
            self.advance_char();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance_char();
            }
        }

        if self.peek().is_some_and(|c| c == b'e' || c == b'E') {
            is_float = true;
            self.scan_exponent(span)?;
        }

        self.reject_trailing_word(start, span)?;

        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        let token = if is_float {
            match text.parse::<f64>() {
                Ok(f) => Token::Float(f),
                Err(_) => return Err(self.error(span, format!("malformed number: '{text}'"))),
            }
        } else {
            match text.parse::<i64>() {
                Ok(i) => Token::Integer(i),
                // Too large for i64: fall back to float, as the plain
                // dialect's numbers are doubles anyway.
                Err(_) => match text.parse::<f64>() {
                    Ok(f) => Token::Float(f),
                    Err(_) => {
                        return Err(self.error(span, format!("malformed number: '{text}'")))
                    }
                },
            }
        };
        Ok(SpannedToken { token, span })
    }

    fn scan_exponent(&mut self, span: Span) -> Result<(), LexError> {
        self.advance_char(); // e/E
        if self.peek().is_some_and(|c| c == b'+' || c == b'-') {
            self.advance_char();
        }
        let exp_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_char();
        }
        if self.pos == exp_start {
            return Err(self.error(span, "malformed number: expected exponent digits"));
        }
        Ok(())
    }

    /// A letter or underscore immediately after a number is malformed.
    fn reject_trailing_word(&mut self, start: usize, span: Span) -> Result<(), LexError> {
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == b'_') {
            while self
                .peek()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b'.')
            {
                self.advance_char();
            }
            let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("?");
            return Err(self.error(span, format!("malformed number near '{text}'")));
        }
        Ok(())
    }

    fn scan_hex_number(&mut self, start: usize, span: Span) -> Result<SpannedToken, LexError> {
        let hex_start = self.pos;
        let mut val: u64 = 0;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_hexdigit() {
                val = val.wrapping_mul(16).wrapping_add(hex_value(ch) as u64);
                self.advance_char();
            } else {
                break;
            }
        }
        if self.pos == hex_start {
            return Err(self.error(span, "malformed number: no hex digits after '0x'"));
        }
        self.reject_trailing_word(start, span)?;
        Ok(SpannedToken {
            token: Token::Integer(val as i64),
            span,
        })
    }

    /// Scan a number that started with a dot (already consumed).
    fn scan_number_after_dot(&mut self, span: Span) -> Result<SpannedToken, LexError> {
        let start = self.pos - 1; // include the dot
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_char();
        }
        if self.peek().is_some_and(|c| c == b'e' || c == b'E') {
            self.scan_exponent(span)?;
        }
        self.reject_trailing_word(start, span)?;
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        match text.parse::<f64>() {
            Ok(f) => Ok(SpannedToken {
                token: Token::Float(f),
                span,
            }),
            Err(_) => Err(self.error(span, format!("malformed number: '{text}'"))),
        }
    }

    fn scan_short_string(&mut self, span: Span) -> Result<SpannedToken, LexError> {
        let quote = self.advance_char().unwrap();
        let mut buf = Vec::new();

        loop {
            match self.peek() {
                None => return Err(self.error(span, "unfinished string near <eof>")),
                Some(b'\n') | Some(b'\r') => {
                    return Err(self.error(span, "unfinished string"));
                }
                Some(ch) if ch == quote => {
                    self.advance_char();
                    break;
                }
                Some(b'\\') => {
                    self.advance_char();
                    self.scan_escape(&mut buf, span)?;
                }
                Some(ch) => {
                    self.advance_char();
                    buf.push(ch);
                }
            }
        }

        Ok(SpannedToken {
            token: Token::Str(buf),
            span,
        })
    }

    fn scan_escape(&mut self, buf: &mut Vec<u8>, span: Span) -> Result<(), LexError> {
        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Err(self.error(span, "unfinished string near <eof>")),
        };
        match ch {
            b'a' => self.push_escape(buf, 0x07),
            b'b' => self.push_escape(buf, 0x08),
            b'f' => self.push_escape(buf, 0x0C),
            b'n' => self.push_escape(buf, b'\n'),
            b'r' => self.push_escape(buf, b'\r'),
            b't' => self.push_escape(buf, b'\t'),
            b'v' => self.push_escape(buf, 0x0B),
            b'\\' => self.push_escape(buf, b'\\'),
            b'\'' => self.push_escape(buf, b'\''),
            b'"' => self.push_escape(buf, b'"'),
            // A backslash-newline embeds a newline
            b'\n' | b'\r' => self.push_escape(buf, b'\n'),
            b'x' => {
                self.advance_char();
                let mut val: u8 = 0;
                for _ in 0..2 {
                    match self.peek() {
                        Some(h) if h.is_ascii_hexdigit() => {
                            self.advance_char();
                            val = (val << 4) | hex_value(h);
                        }
                        _ => return Err(self.error(span, "hexadecimal digit expected")),
                    }
                }
                buf.push(val);
            }
            b'z' => {
                self.advance_char();
                // Skip following whitespace
                while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
                    self.advance_char();
                }
            }
            b'0'..=b'9' => {
                // \ddd - up to 3 decimal digits
                let mut val: u16 = 0;
                for _ in 0..3 {
                    match self.peek() {
                        Some(d) if d.is_ascii_digit() => {
                            self.advance_char();
                            val = val * 10 + (d - b'0') as u16;
                        }
                        _ => break,
                    }
                }
                if val > 255 {
                    return Err(self.error(span, "decimal escape too large"));
                }
                buf.push(val as u8);
            }
            _ => return Err(self.error(span, "invalid escape sequence")),
        }
        Ok(())
    }

    fn push_escape(&mut self, buf: &mut Vec<u8>, byte: u8) {
        self.advance_char();
        buf.push(byte);
    }

    fn scan_long_string(&mut self, level: usize, span: Span) -> Result<SpannedToken, LexError> {
        // Skip opening [=*[
        self.advance_char(); // [
        for _ in 0..level {
            self.advance_char(); // =
        }
        self.advance_char(); // [

        let content = self.scan_long_string_content(level)?;
        Ok(SpannedToken {
            token: Token::Str(content),
            span,
        })
    }

    fn scan_long_string_content(&mut self, level: usize) -> Result<Vec<u8>, LexError> {
        let mut buf = Vec::new();
        let mut first_newline = true;

        loop {
            match self.peek() {
                None => {
                    return Err(LexError {
                        message: "unfinished long string near <eof>".to_string(),
                        line: self.line,
                        column: self.column,
                    });
                }
                Some(b']') => {
                    if self.check_closing_long_bracket(level) {
                        self.advance_char(); // ]
                        for _ in 0..level {
                            self.advance_char(); // =
                        }
                        self.advance_char(); // ]
                        return Ok(buf);
                    }
                    self.advance_char();
                    buf.push(b']');
                }
                Some(b'\n') | Some(b'\r') => {
                    self.advance_char();
                    if first_newline && buf.is_empty() {
                        // Strip the first newline of a long string
                        first_newline = false;
                        continue;
                    }
                    buf.push(b'\n');
                    first_newline = false;
                }
                Some(ch) => {
                    self.advance_char();
                    buf.push(ch);
                    first_newline = false;
                }
            }
        }
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}

fn hex_value(ch: u8) -> u8 {
    match ch {
        b'0'..=b'9' => ch - b'0',
        b'a'..=b'f' => ch - b'a' + 10,
        b'A'..=b'F' => ch - b'A' + 10,
        _ => 0,
    }
}

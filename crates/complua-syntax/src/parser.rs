use crate::ast::{
    BinOp, Block, Call, Expr, Field, FuncBody, FuncName, IfArm, MethodCall, Stat, StatKind, UnOp,
    UNARY_PRIORITY,
};
use crate::lexer::{LexError, Lexer};
use crate::token::{Directive, Span, Token};
use std::fmt;

/// Parse error.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: u32,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError {
            message: e.message,
            line: e.line,
        }
    }
}

/// Parse a whole source file into a block.
pub fn parse_chunk(source: &[u8]) -> Result<Block, ParseError> {
    let mut parser = Parser::new(source);
    let block = parser.parse_block()?;
    parser.expect(&Token::Eof)?;
    Ok(block)
}

/// Parse a source fragment as a single expression (used by `#load` in
/// expression position).
pub fn parse_expr_fragment(source: &[u8]) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(source);
    let expr = parser.parse_expr()?;
    parser.expect(&Token::Eof)?;
    Ok(expr)
}

/// Recursive-descent parser over the pull lexer.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a [u8]) -> Self {
        Parser {
            lexer: Lexer::new(source),
        }
    }

    fn error(&self, msg: impl Into<String>) -> ParseError {
        ParseError {
            message: msg.into(),
            line: self
                .lexer
                .current()
                .map(|st| st.span.line)
                .unwrap_or_else(|e| e.line),
        }
    }

    // ---- Token helpers ----

    fn current_token(&self) -> Result<&Token, ParseError> {
        self.lexer
            .current()
            .map(|st| &st.token)
            .map_err(|e| ParseError {
                message: e.message.clone(),
                line: e.line,
            })
    }

    fn current_span(&self) -> Span {
        self.lexer
            .current()
            .map(|st| st.span)
            .unwrap_or(Span { line: 0, column: 0 })
    }

    fn check(&self, expected: &Token) -> bool {
        self.current_token().map(|t| t == expected).unwrap_or(false)
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let st = self.lexer.advance()?;
        Ok(st.token)
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        if self.check(expected) {
            self.advance()?;
            Ok(())
        } else {
            let found = self
                .current_token()
                .map(|t| format!("{t}"))
                .unwrap_or("error".into());
            Err(self.error(format!("expected '{expected}', got '{found}'")))
        }
    }

    fn expect_name(&mut self) -> Result<String, ParseError> {
        match self.current_token()?.clone() {
            Token::Name(name) => {
                self.advance()?;
                Ok(name)
            }
            other => Err(self.error(format!("expected name, got '{other}'"))),
        }
    }

    fn test_next(&mut self, expected: &Token) -> Result<bool, ParseError> {
        if self.check(expected) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// True when the current token ends a block.
    fn block_follows(&self) -> bool {
        matches!(
            self.current_token(),
            Ok(Token::End) | Ok(Token::Else) | Ok(Token::ElseIf) | Ok(Token::Until) | Ok(Token::Eof)
        )
    }

    // ---- Statements ----

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let mut stats = Vec::new();
        loop {
            if self.block_follows() {
                break;
            }
            if self.test_next(&Token::Semi)? {
                continue;
            }
            if self.check(&Token::Return) {
                stats.push(self.parse_return()?);
                break;
            }
            stats.push(self.parse_statement()?);
        }
        Ok(stats)
    }

    fn parse_return(&mut self) -> Result<Stat, ParseError> {
        let span = self.current_span();
        self.expect(&Token::Return)?;
        let exprs = if self.block_follows() || self.check(&Token::Semi) {
            Vec::new()
        } else {
            self.parse_expr_list()?
        };
        self.test_next(&Token::Semi)?;
        Ok(Stat {
            kind: StatKind::Return(exprs),
            span,
        })
    }

    fn parse_statement(&mut self) -> Result<Stat, ParseError> {
        let span = self.current_span();
        let kind = match self.current_token()?.clone() {
            Token::Local => {
                self.advance()?;
                if self.test_next(&Token::Function)? {
                    let name = self.expect_name()?;
                    let body = self.parse_func_body()?;
                    StatKind::LocalFunction { name, body }
                } else {
                    let names = self.parse_name_list()?;
                    let exprs = if self.test_next(&Token::Assign)? {
                        self.parse_expr_list()?
                    } else {
                        Vec::new()
                    };
                    StatKind::Local { names, exprs }
                }
            }
            Token::If => self.parse_if()?,
            Token::While => {
                self.advance()?;
                let cond = self.parse_expr()?;
                self.expect(&Token::Do)?;
                let body = self.parse_block()?;
                self.expect(&Token::End)?;
                StatKind::While { cond, body }
            }
            Token::Repeat => {
                self.advance()?;
                let body = self.parse_block()?;
                self.expect(&Token::Until)?;
                let cond = self.parse_expr()?;
                StatKind::Repeat { body, cond }
            }
            Token::For => self.parse_for()?,
            Token::Do => {
                self.advance()?;
                let body = self.parse_block()?;
                self.expect(&Token::End)?;
                StatKind::Do(body)
            }
            Token::Function => {
                self.advance()?;
                let name = self.parse_func_name()?;
                let body = self.parse_func_body()?;
                StatKind::Function { name, body }
            }
            Token::Break => {
                self.advance()?;
                StatKind::Break
            }
            Token::Goto => {
                self.advance()?;
                StatKind::Goto(self.expect_name()?)
            }
            Token::DoubleColon => {
                self.advance()?;
                let name = self.expect_name()?;
                self.expect(&Token::DoubleColon)?;
                StatKind::Label(name)
            }
            Token::Directive(d) => {
                self.advance()?;
                self.parse_directive_stat(d)?
            }
            _ => return self.parse_expr_statement(span),
        };
        Ok(Stat { kind, span })
    }

    fn parse_if(&mut self) -> Result<StatKind, ParseError> {
        self.expect(&Token::If)?;
        let mut arms = Vec::new();
        let cond = self.parse_expr()?;
        self.expect(&Token::Then)?;
        let body = self.parse_block()?;
        arms.push(IfArm { cond, body });
        let mut else_body = None;
        loop {
            match self.current_token()? {
                Token::ElseIf => {
                    self.advance()?;
                    let cond = self.parse_expr()?;
                    self.expect(&Token::Then)?;
                    let body = self.parse_block()?;
                    arms.push(IfArm { cond, body });
                }
                Token::Else => {
                    self.advance()?;
                    else_body = Some(self.parse_block()?);
                    self.expect(&Token::End)?;
                    break;
                }
                Token::End => {
                    self.advance()?;
                    break;
                }
                other => {
                    return Err(self.error(format!("expected 'end', got '{other}'")));
                }
            }
        }
        Ok(StatKind::If { arms, else_body })
    }

    fn parse_for(&mut self) -> Result<StatKind, ParseError> {
        self.expect(&Token::For)?;
        let first = self.expect_name()?;
        if self.test_next(&Token::Assign)? {
            let start = self.parse_expr()?;
            self.expect(&Token::Comma)?;
            let limit = self.parse_expr()?;
            let step = if self.test_next(&Token::Comma)? {
                Some(self.parse_expr()?)
            } else {
                None
            };
            self.expect(&Token::Do)?;
            let body = self.parse_block()?;
            self.expect(&Token::End)?;
            Ok(StatKind::NumericFor {
                var: first,
                start,
                limit,
                step,
                body,
            })
        } else {
            let mut names = vec![first];
            while self.test_next(&Token::Comma)? {
                names.push(self.expect_name()?);
            }
            self.expect(&Token::In)?;
            let exprs = self.parse_expr_list()?;
            self.expect(&Token::Do)?;
            let body = self.parse_block()?;
            self.expect(&Token::End)?;
            Ok(StatKind::GenericFor { names, exprs, body })
        }
    }

    fn parse_directive_stat(&mut self, directive: Directive) -> Result<StatKind, ParseError> {
        match directive {
            Directive::Eval => Ok(StatKind::Eval(self.parse_expr()?)),
            Directive::Assert => Ok(StatKind::Assert(self.parse_expr()?)),
            Directive::Debug => Ok(StatKind::Debug(self.parse_expr_list()?)),
            Directive::Load => Ok(StatKind::Load(self.parse_expr()?)),
            Directive::Using => Ok(StatKind::Using(self.parse_expr()?)),
            Directive::CheckCall => {
                let name = self.expect_name()?;
                let body = self.parse_func_body()?;
                Ok(StatKind::CheckCall { name, body })
            }
            Directive::Inline => {
                self.expect(&Token::Function)?;
                let name = self.expect_name()?;
                let body = self.parse_func_body()?;
                Ok(StatKind::Inline { name, body })
            }
            Directive::Defer => {
                if self.block_follows() || self.check(&Token::Return) {
                    return Err(self.error("expected statement after '#defer'"));
                }
                let stat = self.parse_statement()?;
                Ok(StatKind::Defer(Box::new(stat)))
            }
            Directive::Todo => {
                let msg = match self.current_token()? {
                    Token::Str(bytes) => {
                        let bytes = bytes.clone();
                        self.advance()?;
                        Some(bytes)
                    }
                    _ => None,
                };
                Ok(StatKind::Todo(msg))
            }
            Directive::Repr => Err(self.error("'#repr' is only valid in expression position")),
        }
    }

    /// An expression statement: a call, or the start of an assignment.
    fn parse_expr_statement(&mut self, span: Span) -> Result<Stat, ParseError> {
        let first = self.parse_suffixed_expr()?;

        // Compound assignment
        if let Some(op) = compound_op(self.current_token()?) {
            self.advance()?;
            let value = self.parse_expr()?;
            check_assign_target(&first).map_err(|m| self.error(m))?;
            return Ok(Stat {
                kind: StatKind::CompoundAssign {
                    target: first,
                    op,
                    value,
                },
                span,
            });
        }

        // Plain assignment
        if self.check(&Token::Assign) || self.check(&Token::Comma) {
            let mut targets = vec![first];
            while self.test_next(&Token::Comma)? {
                targets.push(self.parse_suffixed_expr()?);
            }
            self.expect(&Token::Assign)?;
            let exprs = self.parse_expr_list()?;
            for target in &targets {
                check_assign_target(target).map_err(|m| self.error(m))?;
            }
            return Ok(Stat {
                kind: StatKind::Assign { targets, exprs },
                span,
            });
        }

        // Otherwise it must be a call
        match first {
            Expr::Call(call) => Ok(Stat {
                kind: StatKind::Call(*call),
                span,
            }),
            Expr::MethodCall(call) => Ok(Stat {
                kind: StatKind::MethodCall(*call),
                span,
            }),
            _ => Err(self.error("syntax error: expected statement")),
        }
    }

    fn parse_func_name(&mut self) -> Result<FuncName, ParseError> {
        let mut path = vec![self.expect_name()?];
        while self.test_next(&Token::Dot)? {
            path.push(self.expect_name()?);
        }
        let method = if self.test_next(&Token::Colon)? {
            Some(self.expect_name()?)
        } else {
            None
        };
        Ok(FuncName { path, method })
    }

    fn parse_func_body(&mut self) -> Result<FuncBody, ParseError> {
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        let mut is_vararg = false;
        if !self.check(&Token::RParen) {
            loop {
                match self.current_token()?.clone() {
                    Token::Name(name) => {
                        self.advance()?;
                        params.push(name);
                    }
                    Token::DotDotDot => {
                        self.advance()?;
                        is_vararg = true;
                        break;
                    }
                    other => {
                        return Err(self.error(format!("expected parameter name, got '{other}'")))
                    }
                }
                if !self.test_next(&Token::Comma)? {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        let body = self.parse_block()?;
        self.expect(&Token::End)?;
        Ok(FuncBody {
            params,
            is_vararg,
            body,
        })
    }

    fn parse_name_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = vec![self.expect_name()?];
        while self.test_next(&Token::Comma)? {
            names.push(self.expect_name()?);
        }
        Ok(names)
    }

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.parse_expr()?];
        while self.test_next(&Token::Comma)? {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    // ---- Expressions ----

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_sub_expr(0)
    }

    /// Precedence-climbing loop; `limit` is the left priority the next
    /// operator must exceed to bind.
    fn parse_sub_expr(&mut self, limit: u8) -> Result<Expr, ParseError> {
        let mut left = if let Some(op) = unary_op(self.current_token()?) {
            self.advance()?;
            let operand = self.parse_sub_expr(UNARY_PRIORITY)?;
            Expr::Unary {
                op,
                operand: Box::new(operand),
            }
        } else {
            self.parse_simple_expr()?
        };

        loop {
            let op = match self.current_token() {
                Ok(tok) => match binary_op(tok) {
                    Some(op) => op,
                    None => break,
                },
                Err(_) => break,
            };
            let (left_pri, right_pri) = op.priority();
            if left_pri <= limit {
                break;
            }
            self.advance()?;
            let rhs = self.parse_sub_expr(right_pri)?;
            left = Expr::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(rhs),
            };
        }

        Ok(left)
    }

    fn parse_simple_expr(&mut self) -> Result<Expr, ParseError> {
        let span = self.current_span();
        let expr = match self.current_token()?.clone() {
            Token::Nil => {
                self.advance()?;
                Expr::Nil
            }
            Token::True => {
                self.advance()?;
                Expr::True
            }
            Token::False => {
                self.advance()?;
                Expr::False
            }
            Token::Integer(i) => {
                self.advance()?;
                Expr::Integer(i)
            }
            Token::Float(f) => {
                self.advance()?;
                Expr::Float(f)
            }
            Token::Str(bytes) => {
                self.advance()?;
                Expr::Str(bytes)
            }
            Token::DotDotDot => {
                self.advance()?;
                Expr::Vararg
            }
            Token::Function => {
                self.advance()?;
                Expr::Function(Box::new(self.parse_func_body()?))
            }
            Token::LBrace => self.parse_table()?,
            Token::Do => {
                self.advance()?;
                let body = self.parse_block()?;
                self.expect(&Token::End)?;
                Expr::DoExpr(body)
            }
            // A directive operand is parsed greedily: it outranks any
            // unparenthesised binary operand.
            Token::Directive(Directive::Eval) => {
                self.advance()?;
                Expr::Eval {
                    expr: Box::new(self.parse_expr()?),
                    span,
                }
            }
            Token::Directive(Directive::Load) => {
                self.advance()?;
                Expr::Load {
                    expr: Box::new(self.parse_expr()?),
                    span,
                }
            }
            Token::Directive(Directive::Repr) => {
                self.advance()?;
                Expr::Repr(Box::new(self.parse_expr()?))
            }
            Token::Directive(d) => {
                return Err(self.error(format!(
                    "'#{}' is not valid in expression position",
                    d.name()
                )))
            }
            _ => return self.parse_suffixed_expr(),
        };
        Ok(expr)
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, ParseError> {
        match self.current_token()?.clone() {
            Token::Name(name) => {
                self.advance()?;
                Ok(Expr::Name(name))
            }
            Token::LParen => {
                self.advance()?;
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            other => Err(self.error(format!("unexpected symbol near '{other}'"))),
        }
    }

    /// A primary expression followed by any number of `.name`, `[k]`,
    /// `:m(args)` and call suffixes.
    fn parse_suffixed_expr(&mut self) -> Result<Expr, ParseError> {
        let span = self.current_span();
        let mut expr = self.parse_primary_expr()?;
        loop {
            match self.current_token()? {
                Token::Dot => {
                    self.advance()?;
                    let name = self.expect_name()?;
                    expr = Expr::Field {
                        object: Box::new(expr),
                        name,
                    };
                }
                Token::LBracket => {
                    self.advance()?;
                    let index = self.parse_expr()?;
                    self.expect(&Token::RBracket)?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Token::Colon => {
                    self.advance()?;
                    let method = self.expect_name()?;
                    let args = self.parse_call_args()?;
                    expr = Expr::MethodCall(Box::new(MethodCall {
                        object: Box::new(expr),
                        method,
                        args,
                        span,
                    }));
                }
                Token::LParen | Token::Str(_) | Token::LBrace => {
                    let args = self.parse_call_args()?;
                    expr = Expr::Call(Box::new(Call {
                        callee: Box::new(expr),
                        args,
                        span,
                    }));
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// `(args)`, or the `f"s"` / `f{...}` sugar.
    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        match self.current_token()?.clone() {
            Token::LParen => {
                self.advance()?;
                let args = if self.check(&Token::RParen) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                self.expect(&Token::RParen)?;
                Ok(args)
            }
            Token::Str(bytes) => {
                self.advance()?;
                Ok(vec![Expr::Str(bytes)])
            }
            Token::LBrace => Ok(vec![self.parse_table()?]),
            other => Err(self.error(format!("expected arguments, got '{other}'"))),
        }
    }

    fn parse_table(&mut self) -> Result<Expr, ParseError> {
        self.expect(&Token::LBrace)?;
        let mut fields = Vec::new();
        while !self.check(&Token::RBrace) {
            let field = if self.check(&Token::LBracket) {
                self.advance()?;
                let key = self.parse_expr()?;
                self.expect(&Token::RBracket)?;
                self.expect(&Token::Assign)?;
                let value = self.parse_expr()?;
                Field::Computed(key, value)
            } else if matches!(self.current_token()?, Token::Name(_))
                && self.lexer.peek_after_current() == Some(Token::Assign)
            {
                let name = self.expect_name()?;
                self.expect(&Token::Assign)?;
                let value = self.parse_expr()?;
                Field::Named(name, value)
            } else {
                Field::Positional(self.parse_expr()?)
            };
            fields.push(field);
            if !self.test_next(&Token::Comma)? && !self.test_next(&Token::Semi)? {
                break;
            }
        }
        self.expect(&Token::RBrace)?;
        Ok(Expr::Table(fields))
    }
}

fn unary_op(token: &Token) -> Option<UnOp> {
    match token {
        Token::Not => Some(UnOp::Not),
        Token::Minus => Some(UnOp::Neg),
        Token::Hash => Some(UnOp::Len),
        _ => None,
    }
}

fn binary_op(token: &Token) -> Option<BinOp> {
    match token {
        Token::Plus => Some(BinOp::Add),
        Token::Minus => Some(BinOp::Sub),
        Token::Star => Some(BinOp::Mul),
        Token::Slash => Some(BinOp::Div),
        Token::Percent => Some(BinOp::Mod),
        Token::Caret => Some(BinOp::Pow),
        Token::DotDot => Some(BinOp::Concat),
        Token::Equal => Some(BinOp::Eq),
        Token::NotEqual => Some(BinOp::NotEq),
        Token::Less => Some(BinOp::Lt),
        Token::LessEq => Some(BinOp::LtEq),
        Token::Greater => Some(BinOp::Gt),
        Token::GreaterEq => Some(BinOp::GtEq),
        Token::And => Some(BinOp::And),
        Token::Or => Some(BinOp::Or),
        _ => None,
    }
}

fn compound_op(token: &Token) -> Option<BinOp> {
    match token {
        Token::PlusAssign => Some(BinOp::Add),
        Token::MinusAssign => Some(BinOp::Sub),
        Token::StarAssign => Some(BinOp::Mul),
        Token::SlashAssign => Some(BinOp::Div),
        Token::PercentAssign => Some(BinOp::Mod),
        Token::CaretAssign => Some(BinOp::Pow),
        Token::ConcatAssign => Some(BinOp::Concat),
        _ => None,
    }
}

fn check_assign_target(expr: &Expr) -> Result<(), String> {
    match expr {
        Expr::Name(_) | Expr::Field { .. } | Expr::Index { .. } => Ok(()),
        _ => Err("cannot assign to this expression".to_string()),
    }
}

//! Recursive descent parser for Rill
//!
//! Parses a token stream into a translation unit.

use super::ast::*;
use crate::analysis::DataType;
use crate::errors::{RillcError, RillcResult};
use crate::lexer::{Keyword, Lexer, Token, TokenKind};

/// The parser for Rill source code
pub struct Parser {
    /// Tokens from the lexer
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// Depth of enclosing loops, for `continue` placement
    loop_depth: usize,
    /// Names of enclosing named loops, for `break` placement
    named_loops: Vec<String>,
}

impl Parser {
    /// Create a new parser for the given source code
    pub fn new(source: &str) -> Self {
        let tokens = Lexer::new(source).tokenize();
        Self {
            tokens,
            pos: 0,
            loop_depth: 0,
            named_loops: Vec::new(),
        }
    }

    /// Parse the source code into a translation unit
    pub fn parse(mut self) -> RillcResult<TranslationUnit> {
        // Surface scanner failures before structural parsing
        for token in &self.tokens {
            if let TokenKind::Error(message) = &token.kind {
                return Err(RillcError::lexer(message.clone(), token.line));
            }
        }

        let mut functions = Vec::new();
        while !self.is_at_end() {
            functions.push(self.parse_function()?);
        }

        Ok(TranslationUnit { functions })
    }

    // ==================== Helpers ====================

    /// Check if we've reached EOF
    fn is_at_end(&self) -> bool {
        self.peek().kind.is_eof()
    }

    /// Peek at the current token
    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("tokens should have at least EOF"))
    }

    /// Get the current token's line
    fn current_line(&self) -> usize {
        self.peek().line
    }

    /// Advance and return the previous token
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous()
    }

    /// Get the previous token
    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    /// Check if current token matches
    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    /// Check if current token is a keyword
    fn check_keyword(&self, kw: Keyword) -> bool {
        matches!(&self.peek().kind, TokenKind::Keyword(k) if *k == kw)
    }

    /// Consume a token if it matches, otherwise error
    fn expect(&mut self, kind: &TokenKind, msg: &str) -> RillcResult<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(RillcError::parser(
                format!("{}, found {}", msg, self.peek().kind),
                self.current_line(),
            ))
        }
    }

    /// Consume a keyword if it matches, otherwise error
    fn expect_keyword(&mut self, kw: Keyword, msg: &str) -> RillcResult<()> {
        if self.check_keyword(kw) {
            self.advance();
            Ok(())
        } else {
            Err(RillcError::parser(
                format!("{}, found {}", msg, self.peek().kind),
                self.current_line(),
            ))
        }
    }

    /// Consume token if it matches
    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume keyword if it matches
    fn match_keyword(&mut self, kw: Keyword) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Parse an identifier
    fn parse_ident(&mut self) -> RillcResult<String> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(RillcError::parser(
                format!("expected identifier, found {}", self.peek().kind),
                self.current_line(),
            )),
        }
    }

    /// Parse a declarable value type (int, double, char, string)
    fn parse_value_type(&mut self) -> RillcResult<DataType> {
        let ty = match &self.peek().kind {
            TokenKind::Keyword(Keyword::Int) => DataType::Integer,
            TokenKind::Keyword(Keyword::Double) => DataType::Double,
            TokenKind::Keyword(Keyword::Char) => DataType::Char,
            TokenKind::Keyword(Keyword::Str) => DataType::Str,
            other => {
                return Err(RillcError::parser(
                    format!("expected type (int, double, char, string), found {}", other),
                    self.current_line(),
                ));
            }
        };
        self.advance();
        Ok(ty)
    }

    /// Parse a return type (a value type or nil)
    fn parse_return_type(&mut self) -> RillcResult<DataType> {
        if self.match_keyword(Keyword::Nil) {
            Ok(DataType::Nil)
        } else {
            self.parse_value_type()
        }
    }

    fn is_type_keyword(&self) -> bool {
        matches!(
            &self.peek().kind,
            TokenKind::Keyword(Keyword::Int)
                | TokenKind::Keyword(Keyword::Double)
                | TokenKind::Keyword(Keyword::Char)
                | TokenKind::Keyword(Keyword::Str)
        )
    }

    // ==================== Functions ====================

    fn parse_function(&mut self) -> RillcResult<FunctionDef> {
        let line = self.current_line();
        self.expect_keyword(Keyword::Def, "expected 'def'")?;
        let name = self.parse_ident()?;

        self.expect(&TokenKind::LParen, "expected '(' after function name")?;
        let params = self.parse_params()?;
        self.expect(&TokenKind::RParen, "expected ')' after parameters")?;

        self.expect(&TokenKind::Arrow, "expected '->' before return type")?;
        let return_type = self.parse_return_type()?;

        let body = self.parse_block()?;

        Ok(FunctionDef {
            name,
            params,
            return_type,
            body,
            line,
        })
    }

    fn parse_params(&mut self) -> RillcResult<Vec<Param>> {
        let mut params = Vec::new();

        if !self.check(&TokenKind::RParen) {
            loop {
                let by_ref = self.match_keyword(Keyword::Ref);
                let name = self.parse_ident()?;
                self.expect(&TokenKind::Colon, "expected ':' after parameter name")?;
                let base = self.parse_value_type()?;

                let data_type = if by_ref {
                    base.base()
                        .expect("value types always have a base")
                        .by_ref()
                } else {
                    base
                };
                params.push(Param { name, data_type });

                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        Ok(params)
    }

    // ==================== Statements ====================

    fn parse_block(&mut self) -> RillcResult<Vec<Statement>> {
        self.expect(&TokenKind::LBrace, "expected '{'")?;

        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }

        self.expect(&TokenKind::RBrace, "expected '}'")?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> RillcResult<Statement> {
        if self.check_keyword(Keyword::Const) || self.is_type_keyword() {
            return Ok(Statement::Assignment(self.parse_declaration()?));
        }
        if self.check_keyword(Keyword::If) {
            return Ok(Statement::If(self.parse_if(IfKind::If)?));
        }
        if self.check_keyword(Keyword::While) {
            return Ok(Statement::While(self.parse_while()?));
        }
        if self.check_keyword(Keyword::For) {
            return Ok(Statement::For(Box::new(self.parse_for()?)));
        }
        if self.check_keyword(Keyword::Loop) {
            return Ok(Statement::NamedLoop(self.parse_named_loop()?));
        }
        if self.check_keyword(Keyword::Return) {
            return Ok(Statement::Return(self.parse_return()?));
        }
        if self.check_keyword(Keyword::Break) {
            return Ok(Statement::Break(self.parse_break()?));
        }
        if self.check_keyword(Keyword::Continue) {
            let line = self.current_line();
            self.advance();
            if self.loop_depth == 0 {
                return Err(RillcError::parser("'continue' outside of a loop", line));
            }
            self.expect(&TokenKind::Semicolon, "expected ';' after 'continue'")?;
            return Ok(Statement::Continue(ContinueStmt { line }));
        }

        // Remaining statements start with an identifier: call or reassignment
        if matches!(&self.peek().kind, TokenKind::Ident(_)) {
            return self.parse_call_or_reassignment();
        }

        Err(RillcError::parser(
            format!("expected statement, found {}", self.peek().kind),
            self.current_line(),
        ))
    }

    /// Parse `const? type name = expr;`
    fn parse_declaration(&mut self) -> RillcResult<AssignmentStmt> {
        let line = self.current_line();
        let immutable = self.match_keyword(Keyword::Const);
        let data_type = self.parse_value_type()?;
        let name = self.parse_ident()?;
        self.expect(&TokenKind::Eq, "expected '=' in declaration")?;
        let expr = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon, "expected ';' after declaration")?;

        Ok(AssignmentStmt {
            name,
            data_type,
            immutable,
            expr: Box::new(expr),
            line,
        })
    }

    fn parse_call_or_reassignment(&mut self) -> RillcResult<Statement> {
        let line = self.current_line();
        let name = self.parse_ident()?;

        if self.check(&TokenKind::LParen) {
            let call = self.parse_call_data(name)?;
            self.expect(&TokenKind::Semicolon, "expected ';' after call")?;
            return Ok(Statement::Call(CallStmt { call, line }));
        }

        self.expect(&TokenKind::Eq, "expected '=' or '(' after identifier")?;
        let expr = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon, "expected ';' after reassignment")?;

        Ok(Statement::Reassignment(ReassignmentStmt {
            name,
            expr: Box::new(expr),
            line,
        }))
    }

    fn parse_if(&mut self, kind: IfKind) -> RillcResult<IfStmt> {
        let line = self.current_line();
        self.advance(); // consume 'if' / 'elif'
        self.expect(&TokenKind::LParen, "expected '(' after condition keyword")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "expected ')' after condition")?;
        let body = self.parse_block()?;

        let trail = if self.check_keyword(Keyword::Elif) {
            Some(Box::new(self.parse_if(IfKind::Elif)?))
        } else if self.match_keyword(Keyword::Else) {
            // else is elif with an always-true condition
            let else_line = self.previous().line;
            let body = self.parse_block()?;
            Some(Box::new(IfStmt {
                kind: IfKind::Elif,
                cond: Box::new(Ast::value(DataType::Integer, "1")),
                body,
                trail: None,
                line: else_line,
            }))
        } else {
            None
        };

        Ok(IfStmt {
            kind,
            cond: Box::new(cond),
            body,
            trail,
            line,
        })
    }

    fn parse_while(&mut self) -> RillcResult<WhileStmt> {
        let line = self.current_line();
        self.expect_keyword(Keyword::While, "expected 'while'")?;
        self.expect(&TokenKind::LParen, "expected '(' after 'while'")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "expected ')' after condition")?;

        self.loop_depth += 1;
        let body = self.parse_block()?;
        self.loop_depth -= 1;

        Ok(WhileStmt {
            cond: Box::new(cond),
            body,
            line,
        })
    }

    fn parse_for(&mut self) -> RillcResult<ForStmt> {
        let line = self.current_line();
        self.expect_keyword(Keyword::For, "expected 'for'")?;
        self.expect(&TokenKind::LParen, "expected '(' after 'for'")?;

        let init = self.parse_declaration()?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon, "expected ';' after loop condition")?;

        let step_line = self.current_line();
        let step_name = self.parse_ident()?;
        self.expect(&TokenKind::Eq, "expected '=' in loop step")?;
        let step_expr = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "expected ')' after loop step")?;

        self.loop_depth += 1;
        let body = self.parse_block()?;
        self.loop_depth -= 1;

        Ok(ForStmt {
            init,
            cond: Box::new(cond),
            step: ReassignmentStmt {
                name: step_name,
                expr: Box::new(step_expr),
                line: step_line,
            },
            body,
            line,
        })
    }

    fn parse_named_loop(&mut self) -> RillcResult<NamedLoopStmt> {
        let line = self.current_line();
        self.expect_keyword(Keyword::Loop, "expected 'loop'")?;
        let name = self.parse_ident()?;

        self.loop_depth += 1;
        self.named_loops.push(name.clone());
        let body = self.parse_block()?;
        self.named_loops.pop();
        self.loop_depth -= 1;

        Ok(NamedLoopStmt { name, body, line })
    }

    fn parse_return(&mut self) -> RillcResult<ReturnStmt> {
        let line = self.current_line();
        self.expect_keyword(Keyword::Return, "expected 'return'")?;

        let expr = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        self.expect(&TokenKind::Semicolon, "expected ';' after return")?;

        Ok(ReturnStmt { expr, line })
    }

    fn parse_break(&mut self) -> RillcResult<BreakStmt> {
        let line = self.current_line();
        self.expect_keyword(Keyword::Break, "expected 'break'")?;
        let name = self.parse_ident()?;
        self.expect(&TokenKind::Semicolon, "expected ';' after break target")?;

        if !self.named_loops.iter().any(|n| n == &name) {
            return Err(RillcError::parser(
                format!("'break {}' does not target an enclosing named loop", name),
                line,
            ));
        }

        Ok(BreakStmt { name, line })
    }

    // ==================== Calls ====================

    /// Parse the argument list of a call whose name was already consumed.
    ///
    /// Arguments are identifiers or literals; a bare identifier's type is not
    /// known here, so it is tagged `Unknown` (`RefUnknown` when passed by
    /// ref) for the analyzer to resolve.
    fn parse_call_data(&mut self, function_name: String) -> RillcResult<CallData> {
        self.expect(&TokenKind::LParen, "expected '(' after callee name")?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.parse_call_arg()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(&TokenKind::RParen, "expected ')' after call arguments")?;
        Ok(CallData {
            function_name,
            params,
        })
    }

    fn parse_call_arg(&mut self) -> RillcResult<CallParam> {
        if self.match_keyword(Keyword::Ref) {
            let name = self.parse_ident()?;
            return Ok(CallParam {
                name,
                data_type: DataType::RefUnknown,
            });
        }

        let param = match &self.peek().kind {
            TokenKind::Ident(name) => CallParam {
                name: name.clone(),
                data_type: DataType::Unknown,
            },
            TokenKind::Integer(text) => CallParam {
                name: text.clone(),
                data_type: DataType::Integer,
            },
            TokenKind::Double(text) => CallParam {
                name: text.clone(),
                data_type: DataType::Double,
            },
            TokenKind::CharLit(c) => CallParam {
                name: c.to_string(),
                data_type: DataType::Char,
            },
            TokenKind::StringLit(s) => CallParam {
                name: s.clone(),
                data_type: DataType::Str,
            },
            other => {
                return Err(RillcError::parser(
                    format!("expected call argument, found {}", other),
                    self.current_line(),
                ));
            }
        };
        self.advance();
        Ok(param)
    }

    // ==================== Expressions ====================

    fn parse_expr(&mut self) -> RillcResult<Ast> {
        self.parse_binary_expr(0)
    }

    /// Map the current token to a binary operator and its precedence
    fn binary_op(&self) -> Option<(AstKind, u8)> {
        let op = match &self.peek().kind {
            TokenKind::PipePipe => (AstKind::Or, 1),
            TokenKind::AmpAmp => (AstKind::And, 2),
            TokenKind::Pipe => (AstKind::BwOr, 3),
            TokenKind::Caret => (AstKind::BwXor, 4),
            TokenKind::Amp => (AstKind::BwAnd, 5),
            TokenKind::EqEq => (AstKind::Eq, 6),
            TokenKind::BangEq => (AstKind::Ne, 6),
            TokenKind::Lt => (AstKind::Lt, 7),
            TokenKind::LtEq => (AstKind::Lte, 7),
            TokenKind::Gt => (AstKind::Gt, 7),
            TokenKind::GtEq => (AstKind::Gte, 7),
            TokenKind::LtLt => (AstKind::Lsh, 8),
            TokenKind::GtGt => (AstKind::Rsh, 8),
            TokenKind::Plus => (AstKind::Add, 9),
            TokenKind::Minus => (AstKind::Sub, 9),
            TokenKind::Star => (AstKind::Mul, 10),
            TokenKind::Slash => (AstKind::Div, 10),
            TokenKind::Percent => (AstKind::Mod, 10),
            TokenKind::StarStar => (AstKind::Pow, 11),
            _ => return None,
        };
        Some(op)
    }

    fn parse_binary_expr(&mut self, min_prec: u8) -> RillcResult<Ast> {
        let mut left = self.parse_unary_expr()?;

        loop {
            let Some((op, prec)) = self.binary_op() else {
                break;
            };
            if prec < min_prec {
                break;
            }

            self.advance();
            // Exponentiation is right-associative; everything else is left
            let next_min = if op == AstKind::Pow { prec } else { prec + 1 };
            let right = self.parse_binary_expr(next_min)?;

            left = Ast::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> RillcResult<Ast> {
        let op = match &self.peek().kind {
            TokenKind::Minus => Some(AstKind::Negate),
            TokenKind::Tilde => Some(AstKind::BwNot),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary_expr()?;
            return Ok(Ast::unary(op, operand));
        }

        self.parse_primary_expr()
    }

    fn parse_primary_expr(&mut self) -> RillcResult<Ast> {
        match &self.peek().kind {
            TokenKind::Integer(text) => {
                let text = text.clone();
                self.advance();
                Ok(Ast::value(DataType::Integer, text))
            }
            TokenKind::Double(text) => {
                let text = text.clone();
                self.advance();
                Ok(Ast::value(DataType::Double, text))
            }
            TokenKind::CharLit(c) => {
                let text = c.to_string();
                self.advance();
                Ok(Ast::value(DataType::Char, text))
            }
            TokenKind::StringLit(s) => {
                let text = s.clone();
                self.advance();
                Ok(Ast::value(DataType::Str, text))
            }
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                if self.check(&TokenKind::LParen) {
                    let call = self.parse_call_data(name)?;
                    Ok(Ast::call(call))
                } else {
                    Ok(Ast::identifier(name))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "expected ')' after expression")?;
                Ok(expr)
            }
            other => Err(RillcError::parser(
                format!("expected expression, found {}", other),
                self.current_line(),
            )),
        }
    }
}

//! Recursive-descent parser: tokens → [`FuncDecl`]s. One call parses one
//! script's top-level sequence of function definitions.

use crate::ast::{BinOp, Expr, FuncDecl, Stmt, UnOp};
use crate::funcmap::Access;
use crate::lexer::Token;

#[derive(Debug)]
pub struct ParseError {
    pub message: String,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type PResult<T> = Result<T, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> PResult<()> {
        if self.peek() == expected {
            self.bump();
            Ok(())
        } else {
            Err(ParseError { message: format!("expected {expected:?}, found {:?}", self.peek()) })
        }
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == tok {
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn parse_program(&mut self) -> PResult<Vec<FuncDecl>> {
        let mut funcs = Vec::new();
        while *self.peek() != Token::Eof {
            funcs.push(self.parse_func()?);
        }
        Ok(funcs)
    }

    fn parse_func(&mut self) -> PResult<FuncDecl> {
        let access = match self.peek() {
            Token::Public => {
                self.bump();
                Access::Public
            }
            Token::Protected => {
                self.bump();
                Access::Protected
            }
            Token::Private => {
                self.bump();
                Access::Private
            }
            Token::Global => {
                self.bump();
                Access::Global
            }
            _ => Access::Public,
        };
        self.expect(&Token::Func)?;
        let name = self.parse_ident_text()?;
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if *self.peek() != Token::RParen {
            loop {
                let first = self.parse_ident_text()?;
                let param_name = if let Token::Ident(_) = self.peek() {
                    self.parse_ident_text()?
                } else {
                    first
                };
                params.push(param_name);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        let body = self.parse_block()?;
        Ok(FuncDecl { name, access, params, body })
    }

    fn parse_ident_text(&mut self) -> PResult<String> {
        match self.bump() {
            Token::Ident(s) => Ok(s),
            other => Err(ParseError { message: format!("expected identifier, found {other:?}") }),
        }
    }

    fn parse_block(&mut self) -> PResult<Vec<Stmt>> {
        self.expect(&Token::LBrace)?;
        let mut stmts = Vec::new();
        while *self.peek() != Token::RBrace {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(&Token::RBrace)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        match self.peek() {
            Token::Var => {
                self.bump();
                let name = self.parse_ident_text()?;
                let init = if self.eat(&Token::Assign) { Some(self.parse_expr()?) } else { None };
                self.expect(&Token::Semi)?;
                Ok(Stmt::VarDecl(name, init))
            }
            Token::If => {
                self.bump();
                self.expect(&Token::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                let then_branch = self.parse_block()?;
                let else_branch = if self.eat(&Token::Else) {
                    if *self.peek() == Token::If {
                        vec![Stmt::If {
                            cond: {
                                // re-enter as nested if via recursive parse_stmt
                                return self.finish_if(then_branch, cond);
                            },
                            then_branch: Vec::new(),
                            else_branch: Vec::new(),
                        }]
                    } else {
                        self.parse_block()?
                    }
                } else {
                    Vec::new()
                };
                Ok(Stmt::If { cond, then_branch, else_branch })
            }
            Token::While => {
                self.bump();
                self.expect(&Token::LParen)?;
                let cond = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                let body = self.parse_block()?;
                Ok(Stmt::While { cond, body })
            }
            Token::Return => {
                self.bump();
                let value = if *self.peek() != Token::Semi { Some(self.parse_expr()?) } else { None };
                self.expect(&Token::Semi)?;
                Ok(Stmt::Return(value))
            }
            _ => {
                let expr = self.parse_expr()?;
                if self.eat(&Token::Assign) {
                    let rhs = self.parse_expr()?;
                    self.expect(&Token::Semi)?;
                    Ok(Stmt::Assign(expr, rhs))
                } else {
                    self.expect(&Token::Semi)?;
                    Ok(Stmt::Expr(expr))
                }
            }
        }
    }

    fn finish_if(&mut self, then_branch: Vec<Stmt>, cond: Expr) -> PResult<Stmt> {
        let nested = self.parse_stmt()?;
        Ok(Stmt::If { cond, then_branch, else_branch: vec![nested] })
    }

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Token::EqEq => BinOp::Eq,
                Token::NotEq => BinOp::NotEq,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinOp::Lt,
                Token::Le => BinOp::Le,
                Token::Gt => BinOp::Gt,
                Token::Ge => BinOp::Ge,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Mod,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        match self.peek() {
            Token::Minus => {
                self.bump();
                Ok(Expr::Unary(UnOp::Neg, Box::new(self.parse_unary()?)))
            }
            Token::Not => {
                self.bump();
                Ok(Expr::Unary(UnOp::Not, Box::new(self.parse_unary()?)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Token::LBracket => {
                    self.bump();
                    let index = self.parse_expr()?;
                    self.expect(&Token::RBracket)?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                Token::Arrow => {
                    self.bump();
                    let name = self.parse_ident_text()?;
                    let args = self.parse_call_args()?;
                    expr = Expr::ObjectCall { target: Box::new(expr), name, args };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> PResult<Vec<Expr>> {
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if *self.peek() != Token::RParen {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        match self.bump() {
            Token::Int(i) => Ok(Expr::Int(i)),
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            Token::Nil => Ok(Expr::Nil),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::LBracket => {
                let mut items = Vec::new();
                if *self.peek() != Token::RBracket {
                    loop {
                        items.push(self.parse_expr()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&Token::RBracket)?;
                Ok(Expr::Array(items))
            }
            Token::LParen => {
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Token::Ident(name) => {
                if *self.peek() == Token::LParen {
                    let args = self.parse_call_args()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            other => Err(ParseError { message: format!("unexpected token {other:?}") }),
        }
    }
}

pub fn parse(tokens: Vec<Token>) -> PResult<Vec<FuncDecl>> {
    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    #[test]
    fn parses_simple_function() {
        let funcs = parse(lex("public func Add(int a, int b) { return a + b; }").unwrap()).unwrap();
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].name, "Add");
        assert_eq!(funcs[0].params, vec!["a", "b"]);
    }

    #[test]
    fn parses_if_else_and_while() {
        let src = "func F() { if (a) { return 1; } else { return 2; } while (x) { x = x - 1; } }";
        let funcs = parse(lex(src).unwrap()).unwrap();
        assert_eq!(funcs[0].body.len(), 2);
    }

    #[test]
    fn parses_object_call_and_index() {
        let funcs = parse(lex("func F() { return obj->Go(arr[0]); }").unwrap()).unwrap();
        assert_eq!(funcs.len(), 1);
    }

    #[test]
    fn parses_var_decl_and_assign() {
        let funcs = parse(lex("func F() { var x = 1; x = x + 1; }").unwrap()).unwrap();
        assert_eq!(funcs[0].body.len(), 2);
    }
}

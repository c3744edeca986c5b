use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::span::{Span, Spanned};
use crate::token::{Keyword, Token};

/// Recursive-descent parser with one-token lookahead over a finished
/// token stream (mirrors the teacher's `Parser`: `tokens`/`pos`/
/// `diagnostics` plus `peek`/`advance`/`at`/`eat`/`expect` helpers).
/// No error recovery: the first unexpected token is fatal (spec.md §4.2).
pub struct Parser {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned<Token>>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn parse_class(mut self) -> Result<Class, Vec<Diagnostic>> {
        let class = self.class();
        if !self.diagnostics.is_empty() {
            return Err(self.diagnostics);
        }
        Ok(class)
    }

    // --- grammar ---

    fn class(&mut self) -> Class {
        self.expect_keyword(Keyword::Class);
        let name = self.expect_ident();
        self.expect_symbol('{');

        let mut class_var_decs = Vec::new();
        while self.at_keyword(Keyword::Static) || self.at_keyword(Keyword::Field) {
            class_var_decs.extend(self.class_var_dec());
        }

        let mut subroutine_decs = Vec::new();
        while self.at_keyword(Keyword::Constructor)
            || self.at_keyword(Keyword::Function)
            || self.at_keyword(Keyword::Method)
        {
            subroutine_decs.push(self.subroutine_dec());
        }

        self.expect_symbol('}');
        Class {
            name,
            class_var_decs,
            subroutine_decs,
        }
    }

    /// `classVarDec := ('static'|'field') type varList ';'` — one
    /// `ClassVarDec` AST node per name in the `varList` sharing the same
    /// modifier and type.
    fn class_var_dec(&mut self) -> Vec<ClassVarDec> {
        let modifier = if self.eat_keyword(Keyword::Static) {
            ClassVarModifier::Static
        } else {
            self.expect_keyword(Keyword::Field);
            ClassVarModifier::Field
        };
        let ty = self.parse_type();
        let mut decs = vec![ClassVarDec {
            modifier,
            ty: ty.clone(),
            name: self.expect_ident(),
        }];
        while self.eat_symbol(',') {
            decs.push(ClassVarDec {
                modifier,
                ty: ty.clone(),
                name: self.expect_ident(),
            });
        }
        self.expect_symbol(';');
        decs
    }

    fn parse_type(&mut self) -> Spanned<Type> {
        let span = self.current_span();
        if self.eat_keyword(Keyword::Int) {
            return Spanned::new(Type::Int, span);
        }
        if self.eat_keyword(Keyword::Char) {
            return Spanned::new(Type::Char, span);
        }
        if self.eat_keyword(Keyword::Boolean) {
            return Spanned::new(Type::Bool, span);
        }
        let name = self.expect_ident();
        Spanned::new(Type::Class(name.node), span)
    }

    fn subroutine_dec(&mut self) -> SubroutineDec {
        let modifier = if self.eat_keyword(Keyword::Constructor) {
            SubroutineModifier::Constructor
        } else if self.eat_keyword(Keyword::Function) {
            SubroutineModifier::Function
        } else {
            self.expect_keyword(Keyword::Method);
            SubroutineModifier::Method
        };

        let return_span = self.current_span();
        let return_type = if self.eat_keyword(Keyword::Void) {
            Spanned::new(ReturnType::Void, return_span)
        } else {
            let ty = self.parse_type();
            Spanned::new(ReturnType::Type(ty.node), ty.span)
        };

        let name = self.expect_ident();
        self.expect_symbol('(');
        let parameters = self.param_list();
        self.expect_symbol(')');
        let body = self.subroutine_body();

        SubroutineDec {
            modifier,
            return_type,
            name,
            parameters,
            body,
        }
    }

    fn param_list(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if self.at_symbol(')') {
            return params;
        }
        loop {
            let ty = self.parse_type();
            let name = self.expect_ident();
            params.push(Param { ty, name });
            if !self.eat_symbol(',') {
                break;
            }
        }
        params
    }

    fn subroutine_body(&mut self) -> SubroutineBody {
        self.expect_symbol('{');
        let mut local_var_decs = Vec::new();
        while self.at_keyword(Keyword::Var) {
            local_var_decs.extend(self.var_dec());
        }
        let mut statements = Vec::new();
        while !self.at_symbol('}') && !self.at_eof() {
            statements.push(self.statement());
        }
        self.expect_symbol('}');
        SubroutineBody {
            local_var_decs,
            statements,
        }
    }

    fn var_dec(&mut self) -> Vec<VarDec> {
        self.expect_keyword(Keyword::Var);
        let ty = self.parse_type();
        let mut decs = vec![VarDec {
            ty: ty.clone(),
            name: self.expect_ident(),
        }];
        while self.eat_symbol(',') {
            decs.push(VarDec {
                ty: ty.clone(),
                name: self.expect_ident(),
            });
        }
        self.expect_symbol(';');
        decs
    }

    fn statement(&mut self) -> Statement {
        if self.at_keyword(Keyword::Let) {
            Statement::Let(self.let_stmt())
        } else if self.at_keyword(Keyword::If) {
            Statement::If(self.if_stmt())
        } else if self.at_keyword(Keyword::While) {
            Statement::While(self.while_stmt())
        } else if self.at_keyword(Keyword::Do) {
            Statement::Do(self.do_stmt())
        } else if self.at_keyword(Keyword::Return) {
            Statement::Return(self.return_stmt())
        } else {
            self.error(&format!(
                "expected a statement, found {}",
                self.peek().description()
            ));
            // Avoid looping forever on a bad token.
            self.advance();
            Statement::Do(SubroutineCall {
                qualifier: None,
                name: Spanned::dummy("_error_".to_string()),
                args: Vec::new(),
            })
        }
    }

    fn let_stmt(&mut self) -> LetStmt {
        self.expect_keyword(Keyword::Let);
        let name = self.expect_ident();
        let index_expr = if self.eat_symbol('[') {
            let e = self.expr();
            self.expect_symbol(']');
            Some(e)
        } else {
            None
        };
        self.expect_symbol('=');
        let value_expr = self.expr();
        self.expect_symbol(';');
        LetStmt {
            name,
            index_expr,
            value_expr,
        }
    }

    fn if_stmt(&mut self) -> IfStmt {
        self.expect_keyword(Keyword::If);
        self.expect_symbol('(');
        let condition = self.expr();
        self.expect_symbol(')');
        self.expect_symbol('{');
        let then_stmts = self.statements_until_rbrace();
        self.expect_symbol('}');
        let else_stmts = if self.eat_keyword(Keyword::Else) {
            self.expect_symbol('{');
            let stmts = self.statements_until_rbrace();
            self.expect_symbol('}');
            stmts
        } else {
            Vec::new()
        };
        IfStmt {
            condition,
            then_stmts,
            else_stmts,
        }
    }

    fn while_stmt(&mut self) -> WhileStmt {
        self.expect_keyword(Keyword::While);
        self.expect_symbol('(');
        let condition = self.expr();
        self.expect_symbol(')');
        self.expect_symbol('{');
        let body_stmts = self.statements_until_rbrace();
        self.expect_symbol('}');
        WhileStmt {
            condition,
            body_stmts,
        }
    }

    fn statements_until_rbrace(&mut self) -> Vec<Statement> {
        let mut stmts = Vec::new();
        while !self.at_symbol('}') && !self.at_eof() {
            stmts.push(self.statement());
        }
        stmts
    }

    fn do_stmt(&mut self) -> SubroutineCall {
        self.expect_keyword(Keyword::Do);
        let name = self.expect_ident();
        let call = self.subroutine_call_tail(name);
        self.expect_symbol(';');
        call
    }

    fn return_stmt(&mut self) -> ReturnStmt {
        let span = self.current_span();
        self.expect_keyword(Keyword::Return);
        let expr = if self.at_symbol(';') {
            None
        } else {
            Some(self.expr())
        };
        self.expect_symbol(';');
        ReturnStmt { expr, span }
    }

    fn expr(&mut self) -> Expr {
        let head = Box::new(self.term());
        let mut tail = Vec::new();
        while let Some(op) = self.try_bin_op() {
            let term = self.term();
            tail.push((op, term));
        }
        Expr { head, tail }
    }

    fn try_bin_op(&mut self) -> Option<Spanned<BinOp>> {
        let span = self.current_span();
        let op = match self.peek() {
            Token::Symbol('+') => BinOp::Add,
            Token::Symbol('-') => BinOp::Sub,
            Token::Symbol('*') => BinOp::Mul,
            Token::Symbol('/') => BinOp::Div,
            Token::Symbol('&') => BinOp::And,
            Token::Symbol('|') => BinOp::Or,
            Token::Symbol('<') => BinOp::Lt,
            Token::Symbol('>') => BinOp::Gt,
            Token::Symbol('=') => BinOp::Eq,
            _ => return None,
        };
        self.advance();
        Some(Spanned::new(op, span))
    }

    fn term(&mut self) -> Term {
        let span = self.current_span();
        match self.peek().clone() {
            Token::IntegerConstant(n) => {
                self.advance();
                Term::IntConst(n, span)
            }
            Token::StringConstant(s) => {
                self.advance();
                Term::StrConst(s, span)
            }
            Token::Keyword(Keyword::True) => {
                self.advance();
                Term::True(span)
            }
            Token::Keyword(Keyword::False) => {
                self.advance();
                Term::False(span)
            }
            Token::Keyword(Keyword::Null) => {
                self.advance();
                Term::Null(span)
            }
            Token::Keyword(Keyword::This) => {
                self.advance();
                Term::This(span)
            }
            Token::Symbol('(') => {
                self.advance();
                let e = self.expr();
                self.expect_symbol(')');
                Term::Paren(Box::new(e))
            }
            Token::Symbol('-') => {
                self.advance();
                Term::Unary(UnaryOp::Neg, Box::new(self.term()), span)
            }
            Token::Symbol('~') => {
                self.advance();
                Term::Unary(UnaryOp::Not, Box::new(self.term()), span)
            }
            Token::Identifier(_) => {
                let name = self.expect_ident();
                if self.at_symbol('[') {
                    self.advance();
                    let e = self.expr();
                    self.expect_symbol(']');
                    Term::VarIndex(name, Box::new(e))
                } else if self.at_symbol('(') || self.at_symbol('.') {
                    Term::Call(self.subroutine_call_tail(name))
                } else {
                    Term::Var(name)
                }
            }
            _ => {
                self.error(&format!(
                    "expected an expression term, found {}",
                    self.peek().description()
                ));
                self.advance();
                Term::IntConst(0, span)
            }
        }
    }

    /// `subroutineCallTail := '(' args ')' | '.' Ident '(' args ')'`.
    /// `name` is the identifier already consumed (either the bare
    /// subroutine name or the qualifier).
    fn subroutine_call_tail(&mut self, name: Spanned<String>) -> SubroutineCall {
        if self.eat_symbol('.') {
            let method = self.expect_ident();
            self.expect_symbol('(');
            let args = self.args();
            self.expect_symbol(')');
            SubroutineCall {
                qualifier: Some(name),
                name: method,
                args,
            }
        } else {
            self.expect_symbol('(');
            let args = self.args();
            self.expect_symbol(')');
            SubroutineCall {
                qualifier: None,
                name,
                args,
            }
        }
    }

    fn args(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        if self.at_symbol(')') {
            return args;
        }
        args.push(self.expr());
        while self.eat_symbol(',') {
            args.push(self.expr());
        }
        args
    }

    // --- token-stream utilities (mirrors the teacher's Parser helpers) ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos].node
    }

    fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn advance(&mut self) -> &Spanned<Token> {
        let tok = &self.tokens[self.pos];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn at_symbol(&self, c: char) -> bool {
        matches!(self.peek(), Token::Symbol(s) if *s == c)
    }

    fn eat_symbol(&mut self, c: char) -> bool {
        if self.at_symbol(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, c: char) {
        if !self.eat_symbol(c) {
            self.error(&format!(
                "expected '{}', found {}",
                c,
                self.peek().description()
            ));
        }
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek(), Token::Keyword(k) if *k == kw)
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) {
        if !self.eat_keyword(kw) {
            self.error(&format!(
                "expected '{}', found {}",
                kw.as_str(),
                self.peek().description()
            ));
        }
    }

    fn expect_ident(&mut self) -> Spanned<String> {
        if let Token::Identifier(name) = self.peek().clone() {
            let span = self.current_span();
            self.advance();
            Spanned::new(name, span)
        } else {
            self.error(&format!(
                "expected identifier, found {}",
                self.peek().description()
            ));
            Spanned::new("_error_".to_string(), self.current_span())
        }
    }

    fn error(&mut self, msg: &str) {
        self.diagnostics
            .push(Diagnostic::error(msg.to_string(), self.current_span()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn parse(source: &str) -> Class {
        let lines = source.lines().map(str::to_string);
        let (tokens, lex_diags) = Tokenizer::new(lines).tokenize();
        assert!(lex_diags.is_empty(), "lex errors: {:?}", lex_diags);
        Parser::new(tokens).parse_class().unwrap()
    }

    #[test]
    fn empty_class() {
        let class = parse("class Main {\n}\n");
        assert_eq!(class.name.node, "Main");
        assert!(class.class_var_decs.is_empty());
        assert!(class.subroutine_decs.is_empty());
    }

    #[test]
    fn class_var_dec_list_desugars_to_multiple_nodes() {
        let class = parse("class Point {\n  field int x, y;\n}\n");
        assert_eq!(class.class_var_decs.len(), 2);
        assert_eq!(class.class_var_decs[0].name.node, "x");
        assert_eq!(class.class_var_decs[0].modifier, ClassVarModifier::Field);
        assert_eq!(class.class_var_decs[1].name.node, "y");
    }

    #[test]
    fn subroutine_with_params_and_body() {
        let class = parse(
            "class Math {\n  function int add(int a, int b) {\n    return a + b;\n  }\n}\n",
        );
        let sub = &class.subroutine_decs[0];
        assert_eq!(sub.modifier, SubroutineModifier::Function);
        assert_eq!(sub.name.node, "add");
        assert_eq!(sub.parameters.len(), 2);
        assert_eq!(sub.body.statements.len(), 1);
        match &sub.body.statements[0] {
            Statement::Return(r) => assert!(r.expr.is_some()),
            _ => panic!("expected return statement"),
        }
    }

    #[test]
    fn let_with_and_without_index() {
        let class = parse(
            "class Main {\n  function void main() {\n    let x = 1;\n    let a[i] = 2;\n  }\n}\n",
        );
        let stmts = &class.subroutine_decs[0].body.statements;
        match &stmts[0] {
            Statement::Let(l) => {
                assert_eq!(l.name.node, "x");
                assert!(l.index_expr.is_none());
            }
            _ => panic!("expected let"),
        }
        match &stmts[1] {
            Statement::Let(l) => {
                assert_eq!(l.name.node, "a");
                assert!(l.index_expr.is_some());
            }
            _ => panic!("expected let"),
        }
    }

    #[test]
    fn if_else_and_while() {
        let class = parse(
            "class Main {\n  function void main() {\n    if (x) {\n      let y = 1;\n    } else {\n      let y = 2;\n    }\n    while (x) {\n      let y = 3;\n    }\n  }\n}\n",
        );
        let stmts = &class.subroutine_decs[0].body.statements;
        match &stmts[0] {
            Statement::If(i) => {
                assert_eq!(i.then_stmts.len(), 1);
                assert_eq!(i.else_stmts.len(), 1);
            }
            _ => panic!("expected if"),
        }
        match &stmts[1] {
            Statement::While(w) => assert_eq!(w.body_stmts.len(), 1),
            _ => panic!("expected while"),
        }
    }

    #[test]
    fn expression_is_flat_no_precedence() {
        let class = parse(
            "class Main {\n  function void main() {\n    let x = 1 + 2 * 3;\n  }\n}\n",
        );
        match &class.subroutine_decs[0].body.statements[0] {
            Statement::Let(l) => {
                assert_eq!(l.value_expr.tail.len(), 2);
                assert_eq!(l.value_expr.tail[0].0.node, BinOp::Add);
                assert_eq!(l.value_expr.tail[1].0.node, BinOp::Mul);
            }
            _ => panic!("expected let"),
        }
    }

    #[test]
    fn call_disambiguation_var_index_and_call() {
        let class = parse(
            "class Main {\n  function void main() {\n    do foo();\n    do Bar.baz(1, 2);\n    let y = a[i];\n    let z = b;\n  }\n}\n",
        );
        let stmts = &class.subroutine_decs[0].body.statements;
        match &stmts[0] {
            Statement::Do(c) => {
                assert!(c.qualifier.is_none());
                assert_eq!(c.name.node, "foo");
                assert!(c.args.is_empty());
            }
            _ => panic!("expected do"),
        }
        match &stmts[1] {
            Statement::Do(c) => {
                assert_eq!(c.qualifier.as_ref().unwrap().node, "Bar");
                assert_eq!(c.name.node, "baz");
                assert_eq!(c.args.len(), 2);
            }
            _ => panic!("expected do"),
        }
        match &stmts[2] {
            Statement::Let(l) => assert!(matches!(l.value_expr.head.as_ref(), Term::VarIndex(..))),
            _ => panic!("expected let"),
        }
        match &stmts[3] {
            Statement::Let(l) => assert!(matches!(l.value_expr.head.as_ref(), Term::Var(_))),
            _ => panic!("expected let"),
        }
    }

    #[test]
    fn unexpected_token_is_fatal() {
        let lines = "class Main {\n  123\n}\n".lines().map(str::to_string);
        let (tokens, _) = Tokenizer::new(lines).tokenize();
        let result = Parser::new(tokens).parse_class();
        assert!(result.is_err());
    }
}

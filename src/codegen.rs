use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::symtable::{Kind, SymbolTableStack};

/// Walks a `Class` AST and emits a flat sequence of VM instructions.
/// Grounded on the teacher's `Emitter` (`output: Vec<String>` accumulator
/// plus a `label_counter`), generalized to the Jack calling convention —
/// see spec.md §4.3 for the per-construct contracts this module implements.
pub struct CodeGenerator {
    output: Vec<String>,
    symbols: SymbolTableStack,
    uniq: u32,
    class_name: String,
    diagnostics: Vec<Diagnostic>,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            symbols: SymbolTableStack::new(),
            uniq: 0,
            class_name: String::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn generate(mut self, class: &Class) -> Result<Vec<String>, Vec<Diagnostic>> {
        self.class_name = class.name.node.clone();
        self.symbols.push();

        for dec in &class.class_var_decs {
            let kind = match dec.modifier {
                ClassVarModifier::Static => Kind::Static,
                ClassVarModifier::Field => Kind::Field,
            };
            if let Err(e) = self
                .symbols
                .add(&dec.name.node, dec.ty.node.clone(), kind)
            {
                self.error(dec.name.span, &e.to_string());
            }
        }

        for sub in &class.subroutine_decs {
            self.subroutine(sub);
        }

        self.symbols.pop();

        if self.diagnostics.is_empty() {
            Ok(self.output)
        } else {
            Err(self.diagnostics)
        }
    }

    fn error(&mut self, span: Span, msg: &str) {
        self.diagnostics.push(Diagnostic::error(msg.to_string(), span));
    }

    fn fresh(&mut self) -> u32 {
        let n = self.uniq;
        self.uniq += 1;
        n
    }

    fn subroutine(&mut self, sub: &SubroutineDec) {
        self.symbols.push();

        for p in &sub.parameters {
            if let Err(e) = self.symbols.add(&p.name.node, p.ty.node.clone(), Kind::Argument) {
                self.error(p.name.span, &e.to_string());
            }
        }
        for v in &sub.body.local_var_decs {
            if let Err(e) = self.symbols.add(&v.name.node, v.ty.node.clone(), Kind::Local) {
                self.error(v.name.span, &e.to_string());
            }
        }

        let n_locals = self.symbols.count(Kind::Local);
        self.output.push(format!(
            "function {}.{} {}",
            self.class_name, sub.name.node, n_locals
        ));

        match sub.modifier {
            SubroutineModifier::Method => {
                self.output.push("push argument 0".to_string());
                self.output.push("pop pointer 0".to_string());
            }
            SubroutineModifier::Constructor => {
                let fields = self.symbols.count_in_outer(Kind::Field);
                self.output.push(format!("push constant {}", fields));
                self.output.push("call Memory.alloc 1".to_string());
                self.output.push("pop pointer 0".to_string());
            }
            SubroutineModifier::Function => {}
        }

        let is_void = matches!(sub.return_type.node, ReturnType::Void);
        for stmt in &sub.body.statements {
            self.statement(stmt, is_void);
        }

        self.symbols.pop();
    }

    fn statement(&mut self, stmt: &Statement, enclosing_is_void: bool) {
        match stmt {
            Statement::Let(l) => self.let_stmt(l),
            Statement::If(i) => self.if_stmt(i, enclosing_is_void),
            Statement::While(w) => self.while_stmt(w, enclosing_is_void),
            Statement::Do(call) => {
                self.subroutine_call(call);
                self.output.push("pop temp 0".to_string());
            }
            Statement::Return(r) => self.return_stmt(r, enclosing_is_void),
        }
    }

    fn let_stmt(&mut self, l: &LetStmt) {
        match &l.index_expr {
            None => {
                self.expr(&l.value_expr);
                self.pop_var(&l.name);
            }
            Some(index_expr) => {
                self.push_var(&l.name);
                self.expr(index_expr);
                self.output.push("add".to_string());
                self.expr(&l.value_expr);
                self.output.push("pop temp 0".to_string());
                self.output.push("pop pointer 1".to_string());
                self.output.push("push temp 0".to_string());
                self.output.push("pop that 0".to_string());
            }
        }
    }

    fn if_stmt(&mut self, i: &IfStmt, enclosing_is_void: bool) {
        let k = self.fresh();
        self.expr(&i.condition);
        self.output.push("not".to_string());
        self.output.push(format!("if-goto IF{}.FALSE", k));
        for s in &i.then_stmts {
            self.statement(s, enclosing_is_void);
        }
        self.output.push(format!("goto IF{}.END", k));
        self.output.push(format!("label IF{}.FALSE", k));
        for s in &i.else_stmts {
            self.statement(s, enclosing_is_void);
        }
        self.output.push(format!("label IF{}.END", k));
    }

    fn while_stmt(&mut self, w: &WhileStmt, enclosing_is_void: bool) {
        let k = self.fresh();
        self.output.push(format!("label WHILE{}.START", k));
        self.expr(&w.condition);
        self.output.push("not".to_string());
        self.output.push(format!("if-goto WHILE{}.END", k));
        for s in &w.body_stmts {
            self.statement(s, enclosing_is_void);
        }
        self.output.push(format!("goto WHILE{}.START", k));
        self.output.push(format!("label WHILE{}.END", k));
    }

    fn return_stmt(&mut self, r: &ReturnStmt, enclosing_is_void: bool) {
        match (&r.expr, enclosing_is_void) {
            (None, true) => self.output.push("push constant 0".to_string()),
            (Some(e), false) => self.expr(e),
            (Some(_), true) => {
                self.error(r.span, "void subroutine may not return a value");
                self.output.push("push constant 0".to_string());
            }
            (None, false) => {
                self.error(r.span, "non-void subroutine must return a value");
                self.output.push("push constant 0".to_string());
            }
        }
        self.output.push("return".to_string());
    }

    fn expr(&mut self, expr: &Expr) {
        self.term(&expr.head);
        let mut ops = Vec::new();
        for (op, term) in &expr.tail {
            ops.push(op.node);
            self.term(term);
        }
        while let Some(op) = ops.pop() {
            self.output.push(bin_op_instr(op).to_string());
        }
    }

    fn term(&mut self, term: &Term) {
        match term {
            Term::IntConst(n, _) => self.output.push(format!("push constant {}", n)),
            Term::StrConst(s, _) => {
                self.output.push(format!("push constant {}", s.chars().count()));
                self.output.push("call String.new 1".to_string());
                for c in s.chars() {
                    self.output.push(format!("push constant {}", c as u32));
                    self.output.push("call String.appendChar 2".to_string());
                }
            }
            Term::True(_) => {
                self.output.push("push constant 1".to_string());
                self.output.push("neg".to_string());
            }
            Term::False(_) | Term::Null(_) => self.output.push("push constant 0".to_string()),
            Term::This(_) => self.output.push("push pointer 0".to_string()),
            Term::Var(name) => self.push_var(name),
            Term::VarIndex(name, index_expr) => {
                self.push_var(name);
                self.expr(index_expr);
                self.output.push("add".to_string());
                self.output.push("pop pointer 1".to_string());
                self.output.push("push that 0".to_string());
            }
            Term::Paren(e) => self.expr(e),
            Term::Unary(op, t, _) => {
                self.term(t);
                self.output.push(
                    match op {
                        UnaryOp::Neg => "neg",
                        UnaryOp::Not => "not",
                    }
                    .to_string(),
                );
            }
            Term::Call(call) => self.subroutine_call(call),
        }
    }

    fn subroutine_call(&mut self, call: &SubroutineCall) {
        match &call.qualifier {
            None => {
                self.output.push("push pointer 0".to_string());
                for a in &call.args {
                    self.expr(a);
                }
                self.output.push(format!(
                    "call {}.{} {}",
                    self.class_name,
                    call.name.node,
                    call.args.len() + 1
                ));
            }
            Some(q) => {
                // Clone to avoid holding a borrow of self.symbols across the
                // mutable self.expr() calls below.
                let resolved = self
                    .symbols
                    .lookup(&q.node)
                    .map(|s| (s.kind, s.index, s.ty.clone()));
                match resolved {
                    Some((kind, index, ty)) => {
                        let class_name = match ty {
                            Type::Class(c) => c,
                            _ => {
                                self.error(
                                    q.span,
                                    &format!("cannot call a method on non-object '{}'", q.node),
                                );
                                self.class_name.clone()
                            }
                        };
                        self.output.push(format!("push {} {}", segment_of(kind), index));
                        for a in &call.args {
                            self.expr(a);
                        }
                        self.output.push(format!(
                            "call {}.{} {}",
                            class_name,
                            call.name.node,
                            call.args.len() + 1
                        ));
                    }
                    None => {
                        for a in &call.args {
                            self.expr(a);
                        }
                        self.output.push(format!(
                            "call {}.{} {}",
                            q.node,
                            call.name.node,
                            call.args.len()
                        ));
                    }
                }
            }
        }
    }

    fn push_var(&mut self, name: &crate::span::Spanned<String>) {
        match self.symbols.lookup(&name.node) {
            Some(sym) => self
                .output
                .push(format!("push {} {}", segment_of(sym.kind), sym.index)),
            None => {
                self.error(name.span, &format!("undeclared variable '{}'", name.node));
                self.output.push("push constant 0".to_string());
            }
        }
    }

    fn pop_var(&mut self, name: &crate::span::Spanned<String>) {
        match self.symbols.lookup(&name.node) {
            Some(sym) => self
                .output
                .push(format!("pop {} {}", segment_of(sym.kind), sym.index)),
            None => {
                self.error(name.span, &format!("undeclared variable '{}'", name.node));
            }
        }
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn segment_of(kind: Kind) -> &'static str {
    match kind {
        Kind::Field => "this",
        Kind::Static => "static",
        Kind::Local => "local",
        Kind::Argument => "argument",
    }
}

fn bin_op_instr(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "add",
        BinOp::Sub => "sub",
        BinOp::Mul => "call Math.multiply 2",
        BinOp::Div => "call Math.divide 2",
        BinOp::And => "and",
        BinOp::Or => "or",
        BinOp::Lt => "lt",
        BinOp::Gt => "gt",
        BinOp::Eq => "eq",
    }
}

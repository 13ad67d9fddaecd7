//! Canonical stringification of the AST.
//!
//! This is the oracle the test suite compares trees with: one deterministic
//! rendering per node shape, `, `-separated lists, two-space indentation.
//! Completion markers render as `<CompleteOnXxx:prefix>`.

use crate::ast::*;

/// Full rendering: parsed bodies and initializers are included, skipped
/// slots render as empty braces.
pub fn unit_to_string(unit: &CompilationUnit) -> String {
    let mut p = Printer::new(true);
    p.unit(unit);
    p.out
}

/// Declaration skeleton only: no bodies, no field initializers. Diet and
/// full parses of the same source agree on this rendering.
pub fn skeleton_to_string(unit: &CompilationUnit) -> String {
    let mut p = Printer::new(false);
    p.unit(unit);
    p.out
}

pub fn member_to_string(member: &MemberDecl) -> String {
    let mut p = Printer::new(true);
    p.member(member);
    p.out
}

pub fn stmt_to_string(stmt: &Stmt) -> String {
    let mut p = Printer::new(true);
    p.stmt(stmt);
    p.out
}

pub fn expr_to_string(expr: &Expr) -> String {
    let mut p = Printer::new(true);
    p.expr(expr);
    p.out
}

struct Printer {
    out: String,
    indent: usize,
    bodies: bool,
}

impl Printer {
    fn new(bodies: bool) -> Self {
        Printer {
            out: String::new(),
            indent: 0,
            bodies,
        }
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn unit(&mut self, unit: &CompilationUnit) {
        let mut first = true;
        if let Some(pkg) = &unit.package {
            self.push(&format!("package {};", pkg.name));
            first = false;
        }
        for import in &unit.imports {
            if !first {
                self.newline();
            }
            first = false;
            self.push("import ");
            if import.is_static {
                self.push("static ");
            }
            self.push(&import.path);
            if import.is_star {
                self.push(".*");
            }
            self.push(";");
        }
        for ty in &unit.types {
            if !first {
                self.newline();
            }
            first = false;
            self.type_decl(ty);
        }
    }

    fn modifiers(&mut self, modifiers: &[Modifier]) {
        for m in modifiers {
            self.push(m.as_str());
            self.push(" ");
        }
    }

    fn type_list(&mut self, prefix: &str, types: &[TypeRef]) {
        if types.is_empty() {
            return;
        }
        self.push(prefix);
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(&ty.text);
        }
    }

    fn type_decl(&mut self, decl: &TypeDecl) {
        self.modifiers(&decl.modifiers);
        self.push(decl.kind.keyword());
        self.push(" ");
        self.push(&decl.name);
        if decl.kind == TypeKind::Record {
            self.push("(");
            self.params(&decl.components);
            self.push(")");
        }
        self.type_list(" extends ", &decl.extends);
        self.type_list(" implements ", &decl.implements);
        self.type_list(" permits ", &decl.permits);
        self.push(" {");
        self.indent += 1;
        if !decl.constants.is_empty() {
            self.newline();
            let names: Vec<&str> = decl.constants.iter().map(|c| c.name.as_str()).collect();
            self.push(&names.join(", "));
            self.push(";");
        }
        for member in &decl.members {
            self.newline();
            self.member(member);
        }
        self.indent -= 1;
        self.newline();
        self.push("}");
    }

    fn params(&mut self, params: &[ParamDecl]) {
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.modifiers(&param.modifiers);
            self.push(&param.ty.text);
            if param.varargs {
                self.push("...");
            }
            self.push(" ");
            self.push(&param.name);
        }
    }

    fn member(&mut self, member: &MemberDecl) {
        match member {
            MemberDecl::Field(field) => {
                self.modifiers(&field.modifiers);
                self.push(&field.ty.text);
                self.push(" ");
                self.push(&field.name);
                if self.bodies {
                    if let FieldInit::Parsed(init) = &field.init {
                        self.push(" = ");
                        self.expr(init);
                    }
                }
                self.push(";");
            }
            MemberDecl::Method(method) => {
                self.modifiers(&method.modifiers);
                self.push(&method.return_ty.text);
                self.push(" ");
                self.push(&method.name);
                self.push("(");
                self.params(&method.params);
                self.push(")");
                self.type_list(" throws ", &method.throws);
                self.body(&method.body);
            }
            MemberDecl::Constructor(ctor) => {
                self.modifiers(&ctor.modifiers);
                self.push(&ctor.name);
                self.push("(");
                self.params(&ctor.params);
                self.push(")");
                self.type_list(" throws ", &ctor.throws);
                self.body(&ctor.body);
            }
            MemberDecl::Initializer(init) => {
                if init.is_static {
                    self.push("static ");
                }
                match &init.body {
                    BodyRef::Parsed(block) if self.bodies => self.block(block),
                    _ => self.push("{\n}"),
                }
            }
            MemberDecl::Type(decl) => self.type_decl(decl),
        }
    }

    fn body(&mut self, body: &BodyRef) {
        match body {
            BodyRef::None => self.push(";"),
            BodyRef::Skipped(_) => self.push(";"),
            BodyRef::Parsed(block) => {
                if self.bodies {
                    self.push(" ");
                    self.block(block);
                } else {
                    self.push(";");
                }
            }
        }
    }

    fn block(&mut self, block: &Block) {
        self.push("{");
        self.indent += 1;
        for stmt in &block.statements {
            self.newline();
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.newline();
        self.push("}");
    }

    fn local_var(&mut self, stmt: &LocalVarStmt, semicolon: bool) {
        self.modifiers(&stmt.modifiers);
        self.push(&stmt.ty.text);
        self.push(" ");
        self.push(&stmt.name);
        if let Some(init) = &stmt.initializer {
            self.push(" = ");
            self.expr(init);
        }
        if semicolon {
            self.push(";");
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => self.block(block),
            Stmt::LocalVar(local) => self.local_var(local, true),
            Stmt::LocalType(decl) => self.type_decl(decl),
            Stmt::Expr(es) => {
                self.expr(&es.expr);
                self.push(";");
            }
            Stmt::If(s) => {
                self.push("if (");
                self.expr(&s.cond);
                self.push(") ");
                self.stmt(&s.then_branch);
                if let Some(else_branch) = &s.else_branch {
                    self.push(" else ");
                    self.stmt(else_branch);
                }
            }
            Stmt::While(s) => {
                self.push("while (");
                self.expr(&s.cond);
                self.push(") ");
                self.stmt(&s.body);
            }
            Stmt::DoWhile(s) => {
                self.push("do ");
                self.stmt(&s.body);
                self.push(" while (");
                self.expr(&s.cond);
                self.push(");");
            }
            Stmt::For(s) => {
                self.push("for (");
                for (i, init) in s.init.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    match init {
                        Stmt::LocalVar(local) => self.local_var(local, false),
                        Stmt::Expr(es) => self.expr(&es.expr),
                        other => self.stmt(other),
                    }
                }
                self.push("; ");
                if let Some(cond) = &s.cond {
                    self.expr(cond);
                }
                self.push("; ");
                for (i, update) in s.update.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(update);
                }
                self.push(") ");
                self.stmt(&s.body);
            }
            Stmt::ForEach(s) => {
                self.push("for (");
                self.modifiers(&s.modifiers);
                self.push(&s.ty.text);
                self.push(" ");
                self.push(&s.name);
                self.push(" : ");
                self.expr(&s.iterable);
                self.push(") ");
                self.stmt(&s.body);
            }
            Stmt::Switch(s) => {
                self.push("switch (");
                self.expr(&s.scrutinee);
                self.push(") {");
                self.indent += 1;
                for group in &s.groups {
                    for label in &group.labels {
                        self.newline();
                        match label {
                            SwitchLabel::Case(expr) => {
                                self.push("case ");
                                self.expr(expr);
                                self.push(" :");
                            }
                            SwitchLabel::Default(_) => self.push("default :"),
                        }
                    }
                    self.indent += 1;
                    for stmt in &group.statements {
                        self.newline();
                        self.stmt(stmt);
                    }
                    self.indent -= 1;
                }
                self.indent -= 1;
                self.newline();
                self.push("}");
            }
            Stmt::Labeled(s) => {
                self.push(&s.label);
                self.push(": ");
                self.stmt(&s.stmt);
            }
            Stmt::Break(s) => {
                self.push("break");
                if let Some(label) = &s.label {
                    self.push(" ");
                    self.push(label);
                }
                self.push(";");
            }
            Stmt::Continue(s) => {
                self.push("continue");
                if let Some(label) = &s.label {
                    self.push(" ");
                    self.push(label);
                }
                self.push(";");
            }
            Stmt::Return(s) => {
                self.push("return");
                if let Some(expr) = &s.expr {
                    self.push(" ");
                    self.expr(expr);
                }
                self.push(";");
            }
            Stmt::Throw(s) => {
                self.push("throw ");
                self.expr(&s.expr);
                self.push(";");
            }
            Stmt::Synchronized(s) => {
                self.push("synchronized (");
                self.expr(&s.lock);
                self.push(") ");
                self.block(&s.body);
            }
            Stmt::Try(s) => {
                self.push("try ");
                if !s.resources.is_empty() {
                    self.push("(");
                    for (i, res) in s.resources.iter().enumerate() {
                        if i > 0 {
                            self.push("; ");
                        }
                        self.local_var(res, false);
                    }
                    self.push(") ");
                }
                self.block(&s.block);
                for catch in &s.catches {
                    self.push(" catch (");
                    for (i, ty) in catch.types.iter().enumerate() {
                        if i > 0 {
                            self.push(" | ");
                        }
                        self.push(&ty.text);
                    }
                    self.push(" ");
                    self.push(&catch.name);
                    self.push(") ");
                    self.block(&catch.body);
                }
                if let Some(finally) = &s.finally {
                    self.push(" finally ");
                    self.block(finally);
                }
            }
            Stmt::Assert(s) => {
                self.push("assert ");
                self.expr(&s.cond);
                if let Some(detail) = &s.detail {
                    self.push(" : ");
                    self.expr(detail);
                }
                self.push(";");
            }
            Stmt::Empty(_) => self.push(";"),
        }
    }

    fn args(&mut self, args: &[Expr]) {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(arg);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Name(e) => self.push(&e.name),
            Expr::Literal(e) => self.push(&e.text),
            Expr::Call(e) => {
                if let Some(receiver) = &e.receiver {
                    self.expr(receiver);
                    self.push(".");
                }
                self.push(&e.name);
                self.push("(");
                self.args(&e.args);
                self.push(")");
            }
            Expr::New(e) => {
                if let Some(qualifier) = &e.qualifier {
                    self.expr(qualifier);
                    self.push(".");
                }
                self.push("new ");
                self.push(&e.ty.text);
                self.push("(");
                self.args(&e.args);
                self.push(")");
                if e.anon_body.is_some() {
                    self.push(" {\n}");
                }
            }
            Expr::ArrayNew(e) => {
                self.push("new ");
                self.push(&e.ty.text);
                for dim in &e.dims {
                    self.push("[");
                    if let Some(expr) = dim {
                        self.expr(expr);
                    }
                    self.push("]");
                }
                if let Some(init) = &e.initializer {
                    self.push(" ");
                    self.expr(init);
                }
            }
            Expr::ArrayInit(e) => {
                self.push("{");
                self.args(&e.elements);
                self.push("}");
            }
            Expr::FieldAccess(e) => {
                self.expr(&e.receiver);
                self.push(".");
                self.push(&e.name);
            }
            Expr::ArrayAccess(e) => {
                self.expr(&e.array);
                self.push("[");
                self.expr(&e.index);
                self.push("]");
            }
            Expr::Unary(e) => {
                if e.postfix {
                    self.expr(&e.operand);
                    self.push(e.op.as_str());
                } else {
                    self.push(e.op.as_str());
                    self.expr(&e.operand);
                }
            }
            Expr::Binary(e) => {
                self.expr(&e.lhs);
                self.push(" ");
                self.push(e.op.as_str());
                self.push(" ");
                self.expr(&e.rhs);
            }
            Expr::Assign(e) => {
                self.expr(&e.lhs);
                self.push(" ");
                self.push(e.op.as_str());
                self.push(" ");
                self.expr(&e.rhs);
            }
            Expr::Conditional(e) => {
                self.expr(&e.cond);
                self.push(" ? ");
                self.expr(&e.then_expr);
                self.push(" : ");
                self.expr(&e.else_expr);
            }
            Expr::Cast(e) => {
                self.push("(");
                self.push(&e.ty.text);
                self.push(") ");
                self.expr(&e.expr);
            }
            Expr::InstanceOf(e) => {
                self.expr(&e.expr);
                self.push(" instanceof ");
                self.push(&e.ty.text);
                if let Some(binding) = &e.binding {
                    self.push(" ");
                    self.push(binding);
                }
            }
            Expr::ClassLiteral(e) => {
                self.push(&e.ty.text);
                self.push(".class");
            }
            Expr::This(_) => self.push("this"),
            Expr::Super(_) => self.push("super"),
            Expr::Paren(e) => {
                self.push("(");
                self.expr(&e.inner);
                self.push(")");
            }
            Expr::Missing(_) => {}
            Expr::Completion(e) => {
                self.push(&format!("<{}:{}{}>", e.role.tag(), e.qualifier, e.prefix));
            }
        }
    }
}

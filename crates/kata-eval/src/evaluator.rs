//! Core expression and statement evaluator.

use std::rc::Rc;

use kata_types::ast::*;

use crate::builtins;
use crate::env::Environment;
use crate::error::{EvalError, EvalResult};
use crate::value::{Closure, PromiseState, Value};

/// Call-depth ceiling. Untrusted recursion must not blow the host stack.
const MAX_CALL_DEPTH: u32 = 200;

/// Tree-walking evaluator. Walks AST nodes and produces values.
pub struct Interpreter {
    /// Global scope of the snippet.
    pub env: Environment,
    /// Steps taken so far in the current run segment.
    pub gas: u64,
    /// Gas limit.
    pub gas_limit: u64,
    /// Captured console output, one line per `console.*` call.
    pub console: Vec<String>,
    /// Current user-function call depth.
    call_depth: u32,
    /// Deterministic PRNG state for `Math.random`.
    rng_state: u64,
}

impl Interpreter {
    /// Create a new interpreter with the given gas limit.
    pub fn new(gas_limit: u64) -> Self {
        Self {
            env: Environment::global(),
            gas: 0,
            gas_limit,
            console: Vec::new(),
            call_depth: 0,
            rng_state: 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// Reset the gas counter, giving the next invocation a full budget.
    pub fn reset_gas(&mut self) {
        self.gas = 0;
    }

    /// Drain captured console lines.
    pub fn take_console(&mut self) -> Vec<String> {
        std::mem::take(&mut self.console)
    }

    /// Consume one unit of gas. Returns error if exhausted.
    fn tick(&mut self) -> EvalResult<()> {
        self.gas += 1;
        if self.gas > self.gas_limit {
            Err(EvalError::GasExhausted)
        } else {
            Ok(())
        }
    }

    /// Deterministic xorshift64* for `Math.random`: reproducible runs,
    /// no host entropy inside the sandbox.
    pub(crate) fn next_random(&mut self) -> f64 {
        let mut s = self.rng_state;
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        self.rng_state = s;
        (s >> 11) as f64 / (1u64 << 53) as f64
    }

    // ══════════════════════════════════════════════════════════════════════
    // Program & statements
    // ══════════════════════════════════════════════════════════════════════

    /// Execute every top-level statement once in the global scope.
    pub fn run_program(&mut self, program: &Program) -> EvalResult<()> {
        let env = self.env.clone();
        self.exec_stmts(&program.stmts, &env).map_err(|e| match e {
            EvalError::Return(_) | EvalError::Break | EvalError::Continue => {
                EvalError::Runtime("unexpected control flow at top level".to_string())
            }
            other => other,
        })
    }

    /// Run a statement list in the given scope, hoisting function
    /// declarations first so mutual recursion works.
    fn exec_stmts(&mut self, stmts: &[Stmt], env: &Environment) -> EvalResult<()> {
        for stmt in stmts {
            if let Stmt::FunctionDecl(decl) = stmt {
                let value = self.make_closure(&decl.func, env);
                env.define(&decl.name.name, value);
            }
        }
        for stmt in stmts {
            self.exec_stmt(stmt, env)?;
        }
        Ok(())
    }

    /// Run a block in a fresh child scope.
    fn exec_block(&mut self, block: &Block, env: &Environment) -> EvalResult<()> {
        let scope = env.child();
        self.exec_stmts(&block.stmts, &scope)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Environment) -> EvalResult<()> {
        self.tick()?;
        match stmt {
            // Hoisted by `exec_stmts`; nothing left to do in sequence.
            Stmt::FunctionDecl(_) => Ok(()),

            Stmt::VarDecl(decl) => {
                for d in &decl.declarators {
                    let value = match &d.init {
                        Some(init) => self.eval_expr(init, env)?,
                        None => Value::Undefined,
                    };
                    env.define(&d.name.name, value);
                }
                Ok(())
            }

            Stmt::Assign(assign) => self.exec_assign(assign, env),

            Stmt::If(stmt) => self.exec_if(stmt, env),

            Stmt::While(stmt) => {
                loop {
                    self.tick()?;
                    if !self.eval_expr(&stmt.cond, env)?.is_truthy() {
                        break;
                    }
                    match self.exec_block(&stmt.body, env) {
                        Err(EvalError::Break) => break,
                        Err(EvalError::Continue) => continue,
                        other => other?,
                    }
                }
                Ok(())
            }

            Stmt::For(stmt) => self.exec_for(stmt, env),
            Stmt::ForOf(stmt) => self.exec_for_of(stmt, env),
            Stmt::ForIn(stmt) => self.exec_for_in(stmt, env),

            Stmt::Return(stmt) => {
                let value = match &stmt.value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Undefined,
                };
                Err(EvalError::Return(value))
            }

            Stmt::Throw(stmt) => {
                let value = self.eval_expr(&stmt.value, env)?;
                let message = throw_message(&value);
                Err(EvalError::Thrown { value, message })
            }

            Stmt::Try(stmt) => self.exec_try(stmt, env),

            Stmt::Break(_) => Err(EvalError::Break),
            Stmt::Continue(_) => Err(EvalError::Continue),

            Stmt::Block(block) => self.exec_block(block, env),

            Stmt::Expr(stmt) => {
                self.eval_expr(&stmt.expr, env)?;
                Ok(())
            }
        }
    }

    fn exec_assign(&mut self, assign: &AssignStmt, env: &Environment) -> EvalResult<()> {
        let mut value = self.eval_expr(&assign.value, env)?;
        if let Some(op) = compound_bin_op(assign.op) {
            let current = self.eval_expr(&assign.target, env)?;
            value = self.apply_binary(op, current, value)?;
        }
        self.write_target(&assign.target, value, env)
    }

    /// Store a value through an assignable expression.
    fn write_target(&mut self, target: &Expr, value: Value, env: &Environment) -> EvalResult<()> {
        match &target.kind {
            ExprKind::Identifier(ident) => {
                if env.assign(&ident.name, value) {
                    Ok(())
                } else {
                    Err(EvalError::Undefined(ident.name.clone()))
                }
            }
            ExprKind::Member { object, property } => {
                let obj = self.eval_expr(object, env)?;
                self.set_member(&obj, property, value)
            }
            ExprKind::Index { object, index } => {
                let obj = self.eval_expr(object, env)?;
                let idx = self.eval_expr(index, env)?;
                self.set_index(&obj, &idx, value)
            }
            ExprKind::Paren(inner) => self.write_target(inner, value, env),
            _ => Err(EvalError::Type("invalid assignment target".to_string())),
        }
    }

    fn exec_if(&mut self, stmt: &IfStmt, env: &Environment) -> EvalResult<()> {
        if self.eval_expr(&stmt.cond, env)?.is_truthy() {
            return self.exec_block(&stmt.then_block, env);
        }
        match &stmt.else_branch {
            Some(ElseBranch::ElseIf(nested)) => self.exec_if(nested, env),
            Some(ElseBranch::Block(block)) => self.exec_block(block, env),
            None => Ok(()),
        }
    }

    fn exec_for(&mut self, stmt: &ForStmt, env: &Environment) -> EvalResult<()> {
        // The init clause gets its own scope so `let i` does not leak.
        let scope = env.child();
        if let Some(init) = &stmt.init {
            self.exec_stmt(init, &scope)?;
        }
        loop {
            self.tick()?;
            if let Some(cond) = &stmt.cond {
                if !self.eval_expr(cond, &scope)?.is_truthy() {
                    break;
                }
            }
            match self.exec_block(&stmt.body, &scope) {
                Err(EvalError::Break) => break,
                Err(EvalError::Continue) => {}
                other => other?,
            }
            if let Some(update) = &stmt.update {
                self.exec_stmt(update, &scope)?;
            }
        }
        Ok(())
    }

    fn exec_for_of(&mut self, stmt: &ForOfStmt, env: &Environment) -> EvalResult<()> {
        let iterable = self.eval_expr(&stmt.iterable, env)?;
        let items: Vec<Value> = match &iterable {
            Value::Array(items) => items.borrow().clone(),
            Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
            other => {
                return Err(EvalError::Type(format!(
                    "{} is not iterable",
                    other.type_of()
                )))
            }
        };
        self.run_loop_body(stmt, items, env)
    }

    fn exec_for_in(&mut self, stmt: &ForOfStmt, env: &Environment) -> EvalResult<()> {
        let target = self.eval_expr(&stmt.iterable, env)?;
        let keys: Vec<Value> = match &target {
            Value::Object(fields) => fields
                .borrow()
                .keys()
                .map(|k| Value::Str(k.clone()))
                .collect(),
            Value::Array(items) => (0..items.borrow().len())
                .map(|i| Value::Str(i.to_string()))
                .collect(),
            Value::Str(s) => (0..s.chars().count())
                .map(|i| Value::Str(i.to_string()))
                .collect(),
            // `for..in` over primitives iterates zero times.
            _ => Vec::new(),
        };
        self.run_loop_body(stmt, keys, env)
    }

    fn run_loop_body(
        &mut self,
        stmt: &ForOfStmt,
        items: Vec<Value>,
        env: &Environment,
    ) -> EvalResult<()> {
        for item in items {
            self.tick()?;
            let scope = env.child();
            scope.define(&stmt.binding.name, item);
            match self.exec_stmts(&stmt.body.stmts, &scope) {
                Err(EvalError::Break) => break,
                Err(EvalError::Continue) => continue,
                other => other?,
            }
        }
        Ok(())
    }

    fn exec_try(&mut self, stmt: &TryStmt, env: &Environment) -> EvalResult<()> {
        let mut result = self.exec_block(&stmt.try_block, env);

        if let Err(err) = &result {
            if err.is_catchable() {
                if let Some(catch_block) = &stmt.catch_block {
                    let scope = env.child();
                    if let Some(param) = &stmt.catch_param {
                        scope.define(&param.name, err.to_caught_value());
                    }
                    result = self.exec_stmts(&catch_block.stmts, &scope);
                }
            }
        }

        if let Some(finally_block) = &stmt.finally_block {
            self.exec_block(finally_block, env)?;
        }
        result
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a value.
    pub fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> EvalResult<Value> {
        self.tick()?;
        match &expr.kind {
            ExprKind::NumberLit(n) => Ok(Value::Number(*n)),
            ExprKind::StringLit(s) => Ok(Value::Str(s.clone())),
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
            ExprKind::NullLit => Ok(Value::Null),
            ExprKind::UndefinedLit => Ok(Value::Undefined),

            ExprKind::TemplateLit(parts) => self.eval_template(parts, env),
            ExprKind::ArrayLit(elems) => self.eval_array_literal(elems, env),
            ExprKind::ObjectLit(entries) => self.eval_object_literal(entries, env),

            ExprKind::Identifier(ident) => self.eval_identifier(&ident.name, env),

            ExprKind::Function(func) => Ok(self.make_closure(func, env)),

            ExprKind::Call { callee, args } => self.eval_call(callee, args, env),
            ExprKind::New { callee, args } => self.eval_new(callee, args, env),

            ExprKind::Member { object, property } => {
                let obj = self.eval_expr(object, env)?;
                self.get_member(&obj, property)
            }
            ExprKind::Index { object, index } => {
                let obj = self.eval_expr(object, env)?;
                let idx = self.eval_expr(index, env)?;
                self.get_index(&obj, &idx)
            }

            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand, env),
            ExprKind::Update { op, prefix, target } => {
                self.eval_update(*op, *prefix, target, env)
            }
            ExprKind::Binary { left, op, right } => self.eval_binary(left, *op, right, env),
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                if self.eval_expr(cond, env)?.is_truthy() {
                    self.eval_expr(then_expr, env)
                } else {
                    self.eval_expr(else_expr, env)
                }
            }

            ExprKind::Await(inner) => {
                let value = self.eval_expr(inner, env)?;
                self.force(value)
            }
            ExprKind::Paren(inner) => self.eval_expr(inner, env),
        }
    }

    fn eval_identifier(&mut self, name: &str, env: &Environment) -> EvalResult<Value> {
        if let Some(value) = self.lookup(name, env) {
            return Ok(value);
        }
        Err(EvalError::Undefined(name.to_string()))
    }

    /// Resolution starts at the active lexical scope; parameters and
    /// block locals shadow globals and builtins.
    fn lookup(&self, name: &str, env: &Environment) -> Option<Value> {
        env.get(name).or_else(|| builtins::lookup_global(name))
    }

    fn make_closure(&self, func: &FunctionExpr, env: &Environment) -> Value {
        Value::Function(Rc::new(Closure {
            func: Rc::new(func.clone()),
            env: env.clone(),
        }))
    }

    fn eval_template(&mut self, parts: &[TemplatePart], env: &Environment) -> EvalResult<Value> {
        let mut result = String::new();
        for part in parts {
            match part {
                TemplatePart::Literal(s) => result.push_str(s),
                TemplatePart::Expr(expr) => {
                    let value = self.eval_expr(expr, env)?;
                    result.push_str(&value.to_display_string());
                }
            }
        }
        Ok(Value::Str(result))
    }

    fn eval_array_literal(&mut self, elems: &[ArrayElem], env: &Environment) -> EvalResult<Value> {
        let mut values = Vec::with_capacity(elems.len());
        for elem in elems {
            match elem {
                ArrayElem::Item(expr) => values.push(self.eval_expr(expr, env)?),
                ArrayElem::Spread(expr) => {
                    let spread = self.eval_expr(expr, env)?;
                    values.extend(self.spread_values(&spread)?);
                }
            }
        }
        Ok(Value::array(values))
    }

    fn spread_values(&mut self, value: &Value) -> EvalResult<Vec<Value>> {
        match value {
            Value::Array(items) => Ok(items.borrow().clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            other => Err(EvalError::Type(format!(
                "{} is not iterable",
                other.type_of()
            ))),
        }
    }

    fn eval_object_literal(
        &mut self,
        entries: &[ObjectEntry],
        env: &Environment,
    ) -> EvalResult<Value> {
        let mut fields = std::collections::BTreeMap::new();
        for entry in entries {
            match entry {
                ObjectEntry::Field { key, value } => {
                    let value = self.eval_expr(value, env)?;
                    fields.insert(key.clone(), value);
                }
                ObjectEntry::Shorthand(ident) => {
                    let value = self.eval_identifier(&ident.name, env)?;
                    fields.insert(ident.name.clone(), value);
                }
                ObjectEntry::Spread(expr) => match self.eval_expr(expr, env)? {
                    Value::Object(other) => {
                        for (k, v) in other.borrow().iter() {
                            fields.insert(k.clone(), v.clone());
                        }
                    }
                    Value::Array(items) => {
                        for (i, v) in items.borrow().iter().enumerate() {
                            fields.insert(i.to_string(), v.clone());
                        }
                    }
                    // Spreading nullish into an object is a no-op.
                    Value::Null | Value::Undefined => {}
                    other => {
                        return Err(EvalError::Type(format!(
                            "cannot spread {} into an object",
                            other.type_of()
                        )))
                    }
                },
            }
        }
        Ok(Value::object(fields))
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, env: &Environment) -> EvalResult<Value> {
        // `typeof missing` must not throw on unbound names.
        if op == UnaryOp::TypeOf {
            if let ExprKind::Identifier(ident) = &operand.kind {
                return Ok(Value::Str(match self.lookup(&ident.name, env) {
                    Some(value) => value.type_of().to_string(),
                    None => "undefined".to_string(),
                }));
            }
        }
        let value = self.eval_expr(operand, env)?;
        Ok(match op {
            UnaryOp::Neg => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::Not => Value::Bool(!value.is_truthy()),
            UnaryOp::TypeOf => Value::Str(value.type_of().to_string()),
        })
    }

    fn eval_update(
        &mut self,
        op: UpdateOp,
        prefix: bool,
        target: &Expr,
        env: &Environment,
    ) -> EvalResult<Value> {
        let old = self.eval_expr(target, env)?.to_number();
        let new = match op {
            UpdateOp::Inc => old + 1.0,
            UpdateOp::Dec => old - 1.0,
        };
        self.write_target(target, Value::Number(new), env)?;
        Ok(Value::Number(if prefix { new } else { old }))
    }

    fn eval_binary(
        &mut self,
        left: &Expr,
        op: BinOp,
        right: &Expr,
        env: &Environment,
    ) -> EvalResult<Value> {
        // Short-circuit forms evaluate the right side conditionally.
        match op {
            BinOp::And => {
                let lhs = self.eval_expr(left, env)?;
                return if lhs.is_truthy() {
                    self.eval_expr(right, env)
                } else {
                    Ok(lhs)
                };
            }
            BinOp::Or => {
                let lhs = self.eval_expr(left, env)?;
                return if lhs.is_truthy() {
                    Ok(lhs)
                } else {
                    self.eval_expr(right, env)
                };
            }
            BinOp::Coalesce => {
                let lhs = self.eval_expr(left, env)?;
                return if matches!(lhs, Value::Null | Value::Undefined) {
                    self.eval_expr(right, env)
                } else {
                    Ok(lhs)
                };
            }
            _ => {}
        }

        let lhs = self.eval_expr(left, env)?;
        let rhs = self.eval_expr(right, env)?;
        self.apply_binary(op, lhs, rhs)
    }

    fn apply_binary(&mut self, op: BinOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
        let value = match op {
            BinOp::Add => {
                if matches!(&lhs, Value::Str(_))
                    || matches!(&rhs, Value::Str(_))
                    || matches!(&lhs, Value::Array(_) | Value::Object(_))
                    || matches!(&rhs, Value::Array(_) | Value::Object(_))
                {
                    Value::Str(format!(
                        "{}{}",
                        lhs.to_display_string(),
                        rhs.to_display_string()
                    ))
                } else {
                    Value::Number(lhs.to_number() + rhs.to_number())
                }
            }
            BinOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
            BinOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
            BinOp::Div => Value::Number(lhs.to_number() / rhs.to_number()),
            BinOp::Mod => Value::Number(lhs.to_number() % rhs.to_number()),
            BinOp::Pow => Value::Number(lhs.to_number().powf(rhs.to_number())),

            BinOp::Eq => Value::Bool(lhs.loose_eq(&rhs)),
            BinOp::NotEq => Value::Bool(!lhs.loose_eq(&rhs)),
            BinOp::StrictEq => Value::Bool(lhs.strict_eq(&rhs)),
            BinOp::StrictNotEq => Value::Bool(!lhs.strict_eq(&rhs)),

            BinOp::Less | BinOp::Greater | BinOp::LessEq | BinOp::GreaterEq => {
                compare(op, &lhs, &rhs)
            }

            // Handled above.
            BinOp::And | BinOp::Or | BinOp::Coalesce => unreachable!("short-circuit ops"),
        };
        Ok(value)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Calls
    // ══════════════════════════════════════════════════════════════════════

    fn eval_call(&mut self, callee: &Expr, args: &[Arg], env: &Environment) -> EvalResult<Value> {
        let arg_values = self.eval_args(args, env)?;

        // Method-call shape: dispatch on the receiver so `xs.map(f)`
        // and `console.log(x)` work without bound-method values.
        if let ExprKind::Member { object, property } = &callee.kind {
            let receiver = self.eval_expr(object, env)?;
            if let Value::Object(fields) = &receiver {
                let field = fields.borrow().get(property.as_str()).cloned();
                if let Some(func) = field.filter(Value::is_callable) {
                    return self.call_value(&func, arg_values, property);
                }
            }
            return builtins::call_method(self, &receiver, property, arg_values);
        }

        let callee_value = self.eval_expr(callee, env)?;
        let hint = match &callee.kind {
            ExprKind::Identifier(ident) => ident.name.clone(),
            _ => callee_value.type_of().to_string(),
        };
        self.call_value(&callee_value, arg_values, &hint)
    }

    fn eval_args(&mut self, args: &[Arg], env: &Environment) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Arg::Item(expr) => values.push(self.eval_expr(expr, env)?),
                Arg::Spread(expr) => {
                    let spread = self.eval_expr(expr, env)?;
                    values.extend(self.spread_values(&spread)?);
                }
            }
        }
        Ok(values)
    }

    /// Invoke any callable value.
    pub fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        name_hint: &str,
    ) -> EvalResult<Value> {
        match callee {
            Value::Function(closure) => self.call_closure(closure, args),
            Value::Native(name) => builtins::call_native(self, name, args),
            Value::Resolver { state, reject } => {
                let mut slot = state.borrow_mut();
                if matches!(*slot, PromiseState::Pending) {
                    let value = args.into_iter().next().unwrap_or(Value::Undefined);
                    *slot = if *reject {
                        PromiseState::Rejected(value)
                    } else {
                        PromiseState::Resolved(value)
                    };
                }
                Ok(Value::Undefined)
            }
            _ => Err(EvalError::NotCallable(name_hint.to_string())),
        }
    }

    /// Invoke a user-defined function.
    pub fn call_closure(&mut self, closure: &Rc<Closure>, args: Vec<Value>) -> EvalResult<Value> {
        self.tick()?;
        self.call_depth += 1;
        if self.call_depth > MAX_CALL_DEPTH {
            self.call_depth -= 1;
            return Err(EvalError::Runtime(
                "maximum call stack size exceeded".to_string(),
            ));
        }
        let result = self.run_closure_body(closure, args);
        self.call_depth -= 1;

        if !closure.func.is_async {
            return result;
        }
        // Async functions run eagerly and settle their promise at once.
        match result {
            Ok(value) => Ok(Value::resolved(value)),
            Err(err) if err.is_catchable() => Ok(Value::rejected(err.to_caught_value())),
            Err(err) => Err(err),
        }
    }

    fn run_closure_body(&mut self, closure: &Rc<Closure>, args: Vec<Value>) -> EvalResult<Value> {
        let scope = closure.env.child();
        // Named function expressions can call themselves by name.
        if let Some(name) = &closure.func.name {
            scope.define(name, Value::Function(closure.clone()));
        }

        for (i, param) in closure.func.params.iter().enumerate() {
            if param.rest {
                let rest: Vec<Value> = args.get(i..).map(|s| s.to_vec()).unwrap_or_default();
                scope.define(&param.name.name, Value::array(rest));
                break;
            }
            let mut value = args.get(i).cloned().unwrap_or(Value::Undefined);
            if matches!(value, Value::Undefined) {
                if let Some(default) = &param.default {
                    value = self.eval_expr(default, &scope)?;
                }
            }
            scope.define(&param.name.name, value);
        }

        match &closure.func.body {
            FunctionBody::Block(block) => match self.exec_stmts(&block.stmts, &scope) {
                Ok(()) => Ok(Value::Undefined),
                Err(EvalError::Return(value)) => Ok(value),
                Err(other) => Err(other),
            },
            FunctionBody::Expr(expr) => self.eval_expr(expr, &scope),
        }
    }

    fn eval_new(&mut self, callee: &Ident, args: &[Expr], env: &Environment) -> EvalResult<Value> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, env)?);
        }
        builtins::construct(self, &callee.name, values, env)
    }

    /// Await semantics: unwrap a settled promise, pass anything else
    /// through untouched.
    pub fn force(&mut self, value: Value) -> EvalResult<Value> {
        match value {
            Value::Promise(state) => {
                let settled = state.borrow().clone();
                match settled {
                    PromiseState::Resolved(inner) => self.force(inner),
                    PromiseState::Rejected(value) => {
                        let message = throw_message(&value);
                        Err(EvalError::Thrown { value, message })
                    }
                    PromiseState::Pending => Err(EvalError::AwaitTimeout),
                }
            }
            other => Ok(other),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Member & index access
    // ══════════════════════════════════════════════════════════════════════

    pub(crate) fn get_member(&mut self, obj: &Value, property: &str) -> EvalResult<Value> {
        match obj {
            Value::Str(s) => Ok(match property {
                "length" => Value::Number(s.chars().count() as f64),
                _ => Value::Undefined,
            }),
            Value::Array(items) => Ok(match property {
                "length" => Value::Number(items.borrow().len() as f64),
                _ => Value::Undefined,
            }),
            Value::Object(fields) => Ok(fields
                .borrow()
                .get(property)
                .cloned()
                .unwrap_or(Value::Undefined)),
            Value::Function(closure) => Ok(match property {
                "name" => Value::Str(closure.name().to_string()),
                "length" => Value::Number(closure.func.arity() as f64),
                _ => Value::Undefined,
            }),
            Value::Native(name) => builtins::namespace_member(name, property),
            Value::Null | Value::Undefined => Err(EvalError::Type(format!(
                "Cannot read properties of {} (reading '{property}')",
                obj.to_display_string()
            ))),
            _ => Ok(Value::Undefined),
        }
    }

    fn get_index(&mut self, obj: &Value, idx: &Value) -> EvalResult<Value> {
        match obj {
            Value::Array(items) => {
                let items = items.borrow();
                Ok(index_of(idx, items.len())
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or(Value::Undefined))
            }
            Value::Str(s) => Ok(index_of(idx, usize::MAX)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::Str(c.to_string()))
                .unwrap_or(Value::Undefined)),
            Value::Object(fields) => Ok(fields
                .borrow()
                .get(&idx.to_display_string())
                .cloned()
                .unwrap_or(Value::Undefined)),
            Value::Null | Value::Undefined => Err(EvalError::Type(format!(
                "Cannot read properties of {} (reading '{}')",
                obj.to_display_string(),
                idx.to_display_string()
            ))),
            _ => Ok(Value::Undefined),
        }
    }

    fn set_member(&mut self, obj: &Value, property: &str, value: Value) -> EvalResult<()> {
        match obj {
            Value::Object(fields) => {
                fields.borrow_mut().insert(property.to_string(), value);
                Ok(())
            }
            Value::Array(items) if property == "length" => {
                let new_len = value.to_number();
                if new_len.fract() != 0.0 || new_len < 0.0 {
                    return Err(EvalError::Type("invalid array length".to_string()));
                }
                items.borrow_mut().resize(new_len as usize, Value::Undefined);
                Ok(())
            }
            Value::Null | Value::Undefined => Err(EvalError::Type(format!(
                "Cannot set properties of {} (setting '{property}')",
                obj.to_display_string()
            ))),
            // Property writes on other primitives silently vanish.
            _ => Ok(()),
        }
    }

    fn set_index(&mut self, obj: &Value, idx: &Value, value: Value) -> EvalResult<()> {
        match obj {
            Value::Array(items) => {
                let n = idx.to_number();
                if n.fract() != 0.0 || n < 0.0 || !n.is_finite() {
                    return Err(EvalError::Type(format!(
                        "invalid array index: {}",
                        idx.to_display_string()
                    )));
                }
                let i = n as usize;
                let mut items = items.borrow_mut();
                if i >= items.len() {
                    items.resize(i + 1, Value::Undefined);
                }
                items[i] = value;
                Ok(())
            }
            Value::Object(fields) => {
                fields.borrow_mut().insert(idx.to_display_string(), value);
                Ok(())
            }
            Value::Null | Value::Undefined => Err(EvalError::Type(format!(
                "Cannot set properties of {}",
                obj.to_display_string()
            ))),
            _ => Ok(()),
        }
    }
}

/// Integer index from a value, for array/string subscripts.
fn index_of(idx: &Value, len: usize) -> Option<usize> {
    let n = idx.to_number();
    if n.fract() != 0.0 || n < 0.0 || !n.is_finite() {
        return None;
    }
    let i = n as usize;
    (i < len || len == usize::MAX).then_some(i)
}

fn compare(op: BinOp, lhs: &Value, rhs: &Value) -> Value {
    let result = match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => match op {
            BinOp::Less => a < b,
            BinOp::Greater => a > b,
            BinOp::LessEq => a <= b,
            _ => a >= b,
        },
        _ => {
            let (a, b) = (lhs.to_number(), rhs.to_number());
            match op {
                BinOp::Less => a < b,
                BinOp::Greater => a > b,
                BinOp::LessEq => a <= b,
                _ => a >= b,
            }
        }
    };
    Value::Bool(result)
}

fn compound_bin_op(op: AssignOp) -> Option<BinOp> {
    match op {
        AssignOp::Assign => None,
        AssignOp::Add => Some(BinOp::Add),
        AssignOp::Sub => Some(BinOp::Sub),
        AssignOp::Mul => Some(BinOp::Mul),
        AssignOp::Div => Some(BinOp::Div),
        AssignOp::Mod => Some(BinOp::Mod),
    }
}

/// Human-readable message for a thrown value, matching how the host
/// reports uncaught exceptions.
pub(crate) fn throw_message(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Object(fields) => {
            let fields = fields.borrow();
            match fields.get("message") {
                Some(message) => {
                    let name = fields
                        .get("name")
                        .map(|n| n.to_display_string())
                        .unwrap_or_else(|| "Error".to_string());
                    format!("{name}: {}", message.to_display_string())
                }
                None => value.to_display_string(),
            }
        }
        other => other.to_display_string(),
    }
}

//! FILENAME: engine/src/evaluator.rs
//! PURPOSE: Evaluates row formulas against live table data.
//! CONTEXT: After a formula is parsed into statements, this module binds
//! each identifier against one row of a RowSource, computes the result,
//! and writes assignment targets back into the row. One evaluation per
//! call; no state is carried across rows.
//!
//! IDENTIFIER BINDING (in order):
//! 1. A name that resolves to a column reads that column's value for the
//!    row, with the -99 sentinel mapped to an actual null.
//! 2. The reserved identifier ROW reads the 1-based row number.
//! 3. Anything else: strict mode substitutes 0; non-strict mode consults
//!    the externally registered function namespace, else null.
//!
//! SUPPORTED FUNCTIONS: ABS, MIN, MAX, ROUND, FLOOR, CEILING, SQRT,
//! POWER, MOD, IF, LEN, UPPER, LOWER, TRIM, plus externally registered
//! functions in non-strict mode.

use std::collections::HashMap;

use parser::{parse, AssignOp, BinaryOp, Expr, Statement, UnaryOp};

use crate::error::EngineError;
use crate::source::RowSource;
use crate::value::Value;

/// The result of evaluating one formula against one row.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalOutcome {
    /// Expression truthiness; forced true when at least one column was
    /// written back, regardless of the expression's own result.
    pub passed: bool,

    /// Whether any assignment target was written into the row.
    pub wrote_back: bool,

    /// The formula text with identifiers replaced by their bound values,
    /// captured only when diagnostics are enabled.
    pub substituted: Option<String>,
}

/// An externally registered function.
pub type ExternalFn = Box<dyn Fn(&[Value]) -> Value>;

/// Namespace of externally registered functions, consulted in non-strict
/// mode for names the evaluator does not know.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, ExternalFn>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }

    /// Registers a function under a case-insensitive name.
    pub fn register(&mut self, name: &str, f: ExternalFn) {
        self.functions.insert(name.to_uppercase(), f);
    }

    fn call(&self, name: &str, args: &[Value]) -> Option<Value> {
        self.functions.get(&name.to_uppercase()).map(|f| f(args))
    }
}

/// The row-formula evaluator.
pub struct Evaluator {
    strict: bool,
    capture_substitution: bool,
    functions: FunctionRegistry,
}

impl Evaluator {
    /// Creates a strict-mode evaluator: unknown identifiers become 0.
    pub fn new() -> Self {
        Evaluator {
            strict: true,
            capture_substitution: false,
            functions: FunctionRegistry::new(),
        }
    }

    /// Creates a non-strict evaluator with an external function namespace.
    pub fn with_functions(functions: FunctionRegistry) -> Self {
        Evaluator {
            strict: false,
            capture_substitution: false,
            functions,
        }
    }

    /// Enables capture of the substituted expression text.
    pub fn with_diagnostics(mut self) -> Self {
        self.capture_substitution = true;
        self
    }

    /// Evaluates `formula` against one row.
    ///
    /// A malformed formula returns an Expression error; the caller treats
    /// the row as evaluating to null and continues with later rows.
    pub fn evaluate(
        &self,
        source: &mut dyn RowSource,
        row: usize,
        formula: &str,
    ) -> Result<EvalOutcome, EngineError> {
        let statements = parse(formula).map_err(|e| EngineError::Expression {
            row,
            message: e.message,
        })?;

        // The substituted text reads the row before any write-back, so it
        // reflects the values the statements were bound against.
        let substituted = if self.capture_substitution {
            Some(self.render_statements(source, row, &statements))
        } else {
            None
        };

        // Assignment targets are an explicit side-output of the parse.
        let mut wrote_back = false;
        let mut last = Value::Empty;

        for statement in &statements {
            let value = self.eval_expr(source, row, &statement.expr);
            match &statement.target {
                Some(assignment) => {
                    let current = source.get_one(row, &assignment.column);
                    let result = combine_assignment(assignment.op, &current, &value);
                    source.set(row, &assignment.column, result);
                    wrote_back = true;
                }
                None => last = value,
            }
        }

        Ok(EvalOutcome {
            passed: wrote_back || last.is_truthy(),
            wrote_back,
            substituted,
        })
    }

    /// Evaluates one expression against a row.
    fn eval_expr(&self, source: &dyn RowSource, row: usize, expr: &Expr) -> Value {
        match expr {
            Expr::Number(n) => Value::Number(*n),
            Expr::Text(s) => Value::Text(s.clone()),
            Expr::Ident(name) => self.bind_ident(source, row, name),
            Expr::Unary { op, operand } => {
                let v = self.eval_expr(source, row, operand);
                match op {
                    UnaryOp::Negate => match v.as_number() {
                        Some(n) => Value::Number(-n),
                        None => Value::Empty,
                    },
                }
            }
            Expr::Binary { left, op, right } => {
                let lhs = self.eval_expr(source, row, left);
                let rhs = self.eval_expr(source, row, right);
                eval_binary(*op, &lhs, &rhs)
            }
            Expr::Call { name, args } => {
                let values: Vec<Value> = args
                    .iter()
                    .map(|arg| self.eval_expr(source, row, arg))
                    .collect();
                self.call_function(name, &values)
            }
        }
    }

    /// Binds a bare identifier: column value, ROW, or the unknown-name
    /// fallback for the current mode.
    fn bind_ident(&self, source: &dyn RowSource, row: usize, name: &str) -> Value {
        if source.column_index(name).is_some() {
            let value = source.get_one(row, name);
            // Sentinel reads as an actual null
            if value.is_missing() {
                return Value::Empty;
            }
            return value;
        }

        if name == "ROW" {
            return Value::Number((row + 1) as f64);
        }

        if self.strict {
            Value::Number(0.0)
        } else {
            // Unresolved tokens fall through to the external namespace
            self.functions.call(name, &[]).unwrap_or(Value::Empty)
        }
    }

    /// Dispatches a function call: builtins first, then the external
    /// namespace, then the unknown-name fallback.
    fn call_function(&self, name: &str, args: &[Value]) -> Value {
        if let Some(result) = eval_builtin(name, args) {
            return result;
        }
        if let Some(result) = self.functions.call(name, args) {
            return result;
        }
        if self.strict {
            Value::Number(0.0)
        } else {
            Value::Empty
        }
    }

    /// Renders the statements with identifiers replaced by the values
    /// they bind to, for diagnostics.
    fn render_statements(
        &self,
        source: &dyn RowSource,
        row: usize,
        statements: &[Statement],
    ) -> String {
        statements
            .iter()
            .map(|statement| match &statement.target {
                Some(a) => format!(
                    "{} {} {}",
                    a.column,
                    a.op,
                    self.render_expr(source, row, &statement.expr)
                ),
                None => self.render_expr(source, row, &statement.expr),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn render_expr(&self, source: &dyn RowSource, row: usize, expr: &Expr) -> String {
        match expr {
            Expr::Ident(name) => {
                let bound = self.bind_ident(source, row, name);
                match bound {
                    Value::Empty => "null".to_string(),
                    Value::Number(n) => Value::Number(n).display_value(),
                    Value::Text(s) => format!("\"{}\"", s),
                }
            }
            Expr::Binary { left, op, right } => format!(
                "{} {} {}",
                self.render_expr(source, row, left),
                op,
                self.render_expr(source, row, right)
            ),
            Expr::Unary { op, operand } => {
                format!("{}{}", op, self.render_expr(source, row, operand))
            }
            Expr::Call { name, args } => {
                let rendered: Vec<String> = args
                    .iter()
                    .map(|arg| self.render_expr(source, row, arg))
                    .collect();
                format!("{}({})", name, rendered.join(", "))
            }
            other => format!("{}", other),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}

/// Applies an assignment operator. Compound arithmetic numifies a missing
/// operand to 0, matching the legacy dynamic-eval behavior this engine
/// replaces; .= appends display text.
fn combine_assignment(op: AssignOp, current: &Value, value: &Value) -> Value {
    match op {
        AssignOp::Set => value.clone(),
        AssignOp::Append => {
            Value::Text(format!("{}{}", current.display_value(), value.display_value()))
        }
        _ => {
            let cur = current.as_number().unwrap_or(0.0);
            let v = value.as_number().unwrap_or(0.0);
            match op {
                AssignOp::Add => Value::Number(cur + v),
                AssignOp::Subtract => Value::Number(cur - v),
                AssignOp::Multiply => Value::Number(cur * v),
                AssignOp::Divide => {
                    if v == 0.0 {
                        Value::Empty
                    } else {
                        Value::Number(cur / v)
                    }
                }
                AssignOp::Set | AssignOp::Append => unreachable!(),
            }
        }
    }
}

/// Evaluates a binary operator. Arithmetic with a null operand yields
/// null; comparison falls back to text when either side is non-numeric.
fn eval_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    match op {
        BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide
        | BinaryOp::Power => {
            let (a, b) = match (lhs.as_number(), rhs.as_number()) {
                (Some(a), Some(b)) => (a, b),
                _ => return Value::Empty,
            };
            match op {
                BinaryOp::Add => Value::Number(a + b),
                BinaryOp::Subtract => Value::Number(a - b),
                BinaryOp::Multiply => Value::Number(a * b),
                BinaryOp::Divide => {
                    if b == 0.0 {
                        Value::Empty
                    } else {
                        Value::Number(a / b)
                    }
                }
                BinaryOp::Power => Value::Number(a.powf(b)),
                _ => unreachable!(),
            }
        }
        BinaryOp::Concat => {
            Value::Text(format!("{}{}", lhs.display_value(), rhs.display_value()))
        }
        _ => {
            let ordering = compare_values(lhs, rhs);
            let result = match op {
                BinaryOp::Equal => ordering == std::cmp::Ordering::Equal,
                BinaryOp::NotEqual => ordering != std::cmp::Ordering::Equal,
                BinaryOp::LessThan => ordering == std::cmp::Ordering::Less,
                BinaryOp::GreaterThan => ordering == std::cmp::Ordering::Greater,
                BinaryOp::LessEqual => ordering != std::cmp::Ordering::Greater,
                BinaryOp::GreaterEqual => ordering != std::cmp::Ordering::Less,
                _ => unreachable!(),
            };
            Value::Number(if result { 1.0 } else { 0.0 })
        }
    }
}

/// Orders two values: numerically when both coerce, lexically otherwise.
fn compare_values(lhs: &Value, rhs: &Value) -> std::cmp::Ordering {
    match (lhs.as_number(), rhs.as_number()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
        _ => lhs.display_value().cmp(&rhs.display_value()),
    }
}

/// Evaluates a builtin function, or None when the name is not a builtin.
fn eval_builtin(name: &str, args: &[Value]) -> Option<Value> {
    let result = match name.to_uppercase().as_str() {
        "ABS" => unary_numeric(args, f64::abs),
        "SQRT" => match first_number(args) {
            Some(n) if n >= 0.0 => Value::Number(n.sqrt()),
            _ => Value::Empty,
        },
        "FLOOR" => unary_numeric(args, f64::floor),
        "CEILING" => unary_numeric(args, f64::ceil),
        "ROUND" => {
            let n = first_number(args);
            let digits = args
                .get(1)
                .and_then(|v| v.as_number())
                .unwrap_or(0.0) as i32;
            match n {
                Some(n) => {
                    let factor = 10f64.powi(digits);
                    Value::Number((n * factor).round() / factor)
                }
                None => Value::Empty,
            }
        }
        "POWER" => match (first_number(args), args.get(1).and_then(|v| v.as_number())) {
            (Some(a), Some(b)) => Value::Number(a.powf(b)),
            _ => Value::Empty,
        },
        "MOD" => match (first_number(args), args.get(1).and_then(|v| v.as_number())) {
            (Some(_), Some(b)) if b == 0.0 => Value::Empty,
            (Some(a), Some(b)) => Value::Number(a - b * (a / b).floor()),
            _ => Value::Empty,
        },
        "MIN" => fold_numeric(args, f64::min),
        "MAX" => fold_numeric(args, f64::max),
        "IF" => {
            let cond = args.first().map(|v| v.is_truthy()).unwrap_or(false);
            if cond {
                args.get(1).cloned().unwrap_or(Value::Empty)
            } else {
                args.get(2).cloned().unwrap_or(Value::Empty)
            }
        }
        "LEN" => Value::Number(
            args.first()
                .map(|v| v.display_value().chars().count())
                .unwrap_or(0) as f64,
        ),
        "UPPER" => unary_text(args, |s| s.to_uppercase()),
        "LOWER" => unary_text(args, |s| s.to_lowercase()),
        "TRIM" => unary_text(args, |s| s.trim().to_string()),
        _ => return None,
    };
    Some(result)
}

fn first_number(args: &[Value]) -> Option<f64> {
    args.first().and_then(|v| v.as_number())
}

fn unary_numeric(args: &[Value], f: impl Fn(f64) -> f64) -> Value {
    match first_number(args) {
        Some(n) => Value::Number(f(n)),
        None => Value::Empty,
    }
}

fn unary_text(args: &[Value], f: impl Fn(&str) -> String) -> Value {
    match args.first() {
        Some(v) => Value::Text(f(&v.display_value())),
        None => Value::Empty,
    }
}

fn fold_numeric(args: &[Value], f: impl Fn(f64, f64) -> f64) -> Value {
    let mut acc: Option<f64> = None;
    for arg in args {
        if let Some(n) = arg.as_number() {
            acc = Some(match acc {
                Some(a) => f(a, n),
                None => n,
            });
        }
    }
    match acc {
        Some(n) => Value::Number(n),
        None => Value::Empty,
    }
}

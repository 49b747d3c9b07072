//! FILENAME: parser/src/ast.rs
//! PURPOSE: Defines the Abstract Syntax Tree (AST) for row formulas.
//! CONTEXT: After the Lexer tokenizes a formula string, the Parser converts
//! those tokens into this tree structure. The evaluator then binds each
//! identifier against a table row and computes the final result.
//!
//! SUPPORTED EXPRESSIONS:
//! - Literals: numbers, double-quoted strings
//! - Identifiers: column names resolved per row, the reserved name ROW
//! - Binary operations: + - * / ^ & == != < > <= >=
//! - Unary operations: - (negation)
//! - Function calls: MIN(au, cu), IF(depth > 100, "deep", "shallow")
//!
//! A formula is a `;`-separated list of statements. Each statement is
//! either a bare expression or an assignment of the form
//! `column op= expression` with op= one of = += -= *= /= .=

/// A parsed expression tree.
#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    /// A numeric literal.
    Number(f64),

    /// A string literal.
    Text(String),

    /// A bare identifier. Classification (column, ROW, external function)
    /// happens at evaluation time against the live row.
    Ident(String),

    /// A binary operation: left op right (e.g. au * 2, depth > 10).
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    /// A unary operation: op operand (e.g. -5).
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// A function call like MIN(au, cu) or IF(depth > 10, 1, 0).
    Call { name: String, args: Vec<Expr> },
}

/// Binary operators, listed in precedence groups (comparison is lowest).
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOp {
    // Comparison operators (lowest precedence)
    Equal,        // ==
    NotEqual,     // != or <>
    LessThan,     // <
    GreaterThan,  // >
    LessEqual,    // <=
    GreaterEqual, // >=

    // String concatenation
    Concat, // &

    // Arithmetic operators
    Add,      // +
    Subtract, // -
    Multiply, // *
    Divide,   // /
    Power,    // ^ (highest precedence among binary ops)
}

/// Unary operators.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOp {
    Negate, // -
}

/// Assignment operators for statement targets.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum AssignOp {
    Set,      // =
    Add,      // +=
    Subtract, // -=
    Multiply, // *=
    Divide,   // /=
    Append,   // .= (string append)
}

/// An assignment target: the output column and how the value lands in it.
#[derive(Debug, PartialEq, Clone)]
pub struct Assignment {
    pub column: String,
    pub op: AssignOp,
}

/// One statement of a formula: an optional assignment target plus the
/// right-hand-side expression. A bare expression has no target.
#[derive(Debug, PartialEq, Clone)]
pub struct Statement {
    pub target: Option<Assignment>,
    pub expr: Expr,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Subtract => write!(f, "-"),
            BinaryOp::Multiply => write!(f, "*"),
            BinaryOp::Divide => write!(f, "/"),
            BinaryOp::Power => write!(f, "^"),
            BinaryOp::Concat => write!(f, "&"),
            BinaryOp::Equal => write!(f, "=="),
            BinaryOp::NotEqual => write!(f, "!="),
            BinaryOp::LessThan => write!(f, "<"),
            BinaryOp::GreaterThan => write!(f, ">"),
            BinaryOp::LessEqual => write!(f, "<="),
            BinaryOp::GreaterEqual => write!(f, ">="),
        }
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Negate => write!(f, "-"),
        }
    }
}

impl std::fmt::Display for AssignOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignOp::Set => write!(f, "="),
            AssignOp::Add => write!(f, "+="),
            AssignOp::Subtract => write!(f, "-="),
            AssignOp::Multiply => write!(f, "*="),
            AssignOp::Divide => write!(f, "/="),
            AssignOp::Append => write!(f, ".="),
        }
    }
}

/// Writes expressions back out in source-like form. Used for diagnostics
/// when the evaluator reports the substituted expression text.
impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Text(s) => write!(f, "\"{}\"", s),
            Expr::Ident(name) => write!(f, "{}", name),
            Expr::Binary { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::Unary { op, operand } => write!(f, "{}{}", op, operand),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            Some(a) => write!(f, "{} {} {}", a.column, a.op, self.expr),
            None => write!(f, "{}", self.expr),
        }
    }
}

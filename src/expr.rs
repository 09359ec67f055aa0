use serde::Serialize;

use crate::token::Token;

/// Stable identity of an expression node.  The resolver's side table is keyed
/// by it, so every node that reads or writes a binding needs a distinct id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ExprId(pub u32);

impl std::fmt::Display for ExprId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A **literal constant** that appears directly in the source code.
///
/// The parser copies the value out of the token so the tree does not depend
/// on the token's payload.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

/// An expression node: its identity plus what it is.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // Used to parse Binary expressions
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    // Used to parse Unary expressions
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    // Used to parse Literal expressions
    Literal(LiteralValue),

    // Used to parse parenthesized grouped expressions
    Grouping(Box<Expr>),

    // Used to parse variable reads
    Variable(Token),

    // Used to parse assignment operators
    Assign {
        name: Token,
        value: Box<Expr>,
    },

    // `and` / `or`, short-circuiting
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    // Used to parse function calls; `paren` is kept for error lines
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },

    // object.property
    Get {
        object: Box<Expr>,
        name: Token,
    },

    // object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This(Token),

    // super.method
    Super {
        keyword: Token,
        method: Token,
    },
}

impl Expr {
    pub fn new(id: ExprId, kind: ExprKind) -> Self {
        Self { id, kind }
    }
}

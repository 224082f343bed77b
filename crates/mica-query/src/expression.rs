use bson::Bson;
use regex::Regex;

use crate::path::Path;

/// A recursive filter expression tree.
///
/// Owns paths and operands so the expression can outlive the filter document
/// it was parsed from. Built once per request and evaluated per document.
#[derive(Debug, Clone)]
pub enum Expression {
    // Logical. `And([])` matches every document.
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Nor(Vec<Expression>),
    // A single predicate on the value(s) a path resolves to
    Field(Path, Predicate),
}

impl Expression {
    /// The expression produced by an empty filter document.
    pub fn match_all() -> Self {
        Expression::And(Vec::new())
    }
}

/// One operator applied to a resolved value.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Bare value: `{ "skill": { "name": "Java" } }`. Key order is significant.
    Literal(Bson),
    // Comparison
    Eq(Bson),
    Ne(Bson),
    Gt(Bson),
    Gte(Bson),
    Lt(Bson),
    Lte(Bson),
    // Set membership
    In(Vec<Bson>),
    Nin(Vec<Bson>),
    // Array
    All(Vec<Bson>),
    Size(usize),
    ElemMatch(ElemMatch),
    // Element
    Exists(bool),
    Type(Vec<TypeSpec>),
    // Pattern
    Regex(Regex),
}

/// Condition each array element is tested against.
#[derive(Debug, Clone)]
pub enum ElemMatch {
    /// `{ $elemMatch: { name: "Java", experienceYear: 3 } }`: the element is
    /// matched as a document.
    Document(Box<Expression>),
    /// `{ $elemMatch: { $gte: 80, $lt: 90 } }`: operators apply to the element itself.
    Value(Vec<Predicate>),
}

/// A `$type` operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSpec {
    /// A BSON element type tag (`10` is null, `0xFF` is minKey).
    Code(u8),
    /// The `"number"` alias: double, int, long or decimal.
    Number,
}

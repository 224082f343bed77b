use std::cmp::Ordering;

use bson::{Bson, Document};
use mica_query::{ElemMatch, Expression, Path, Predicate};

use super::value::{compare, ordered_equal, type_matches, unordered_equal};
use crate::document::{Resolved, resolve_all};

/// Evaluate whether a document matches the given expression.
///
/// Total over any parsed expression: type mismatches simply fail to match.
pub fn matches(doc: &Document, expr: &Expression) -> bool {
    match expr {
        Expression::And(children) => children.iter().all(|child| matches(doc, child)),
        Expression::Or(children) => children.iter().any(|child| matches(doc, child)),
        Expression::Nor(children) => !children.iter().any(|child| matches(doc, child)),
        Expression::Field(path, predicate) => field_matches(doc, path, predicate),
    }
}

/// Test one array element against an `$elemMatch` condition.
pub(crate) fn elem_matches(item: &Bson, cond: &ElemMatch) -> bool {
    match cond {
        ElemMatch::Document(expr) => match item {
            Bson::Document(sub) => matches(sub, expr),
            _ => false,
        },
        ElemMatch::Value(predicates) => predicates
            .iter()
            .all(|p| predicate_matches(Resolved::Present(item), p)),
    }
}

fn field_matches(doc: &Document, path: &Path, predicate: &Predicate) -> bool {
    let candidates = resolve_all(doc, path);
    match predicate {
        // Negative and existence checks look at every candidate at once:
        // `$exists: false` means no candidate is present at all.
        Predicate::Exists(expected) => candidates.iter().any(Resolved::is_present) == *expected,
        Predicate::Ne(value) => !candidates
            .iter()
            .any(|c| equals(*c, value, unordered_equal)),
        Predicate::Nin(values) => !candidates
            .iter()
            .any(|c| values.iter().any(|v| equals(*c, v, unordered_equal))),
        _ => candidates.iter().any(|c| predicate_matches(*c, predicate)),
    }
}

/// Evaluate a single predicate against a single candidate value.
fn predicate_matches(candidate: Resolved<'_>, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Literal(value) => equals(candidate, value, ordered_equal),
        Predicate::Eq(value) => equals(candidate, value, unordered_equal),
        Predicate::Ne(value) => !equals(candidate, value, unordered_equal),
        Predicate::Gt(value) => ordered(candidate, value, |o| o == Ordering::Greater),
        Predicate::Gte(value) => ordered(candidate, value, |o| o != Ordering::Less),
        Predicate::Lt(value) => ordered(candidate, value, |o| o == Ordering::Less),
        Predicate::Lte(value) => ordered(candidate, value, |o| o != Ordering::Greater),
        Predicate::In(values) => values
            .iter()
            .any(|v| equals(candidate, v, unordered_equal)),
        Predicate::Nin(values) => !values
            .iter()
            .any(|v| equals(candidate, v, unordered_equal)),
        Predicate::All(values) => {
            // `$all: []` matches nothing
            !values.is_empty()
                && match candidate.value() {
                    Some(Bson::Array(items)) => values
                        .iter()
                        .all(|v| items.iter().any(|item| unordered_equal(item, v))),
                    Some(other) => values.iter().all(|v| unordered_equal(other, v)),
                    None => false,
                }
        }
        Predicate::Size(n) => matches!(candidate.value(), Some(Bson::Array(items)) if items.len() == *n),
        Predicate::ElemMatch(cond) => match candidate.value() {
            Some(Bson::Array(items)) => items.iter().any(|item| elem_matches(item, cond)),
            _ => false,
        },
        Predicate::Exists(expected) => candidate.is_present() == *expected,
        Predicate::Type(specs) => match candidate.value() {
            Some(value) => specs.iter().any(|spec| {
                type_matches(value, spec)
                    || matches!(value, Bson::Array(items) if items.iter().any(|i| type_matches(i, spec)))
            }),
            None => false,
        },
        Predicate::Regex(re) => match candidate.value() {
            Some(Bson::String(s)) => re.is_match(s),
            Some(Bson::Array(items)) => items
                .iter()
                .any(|item| matches!(item, Bson::String(s) if re.is_match(s))),
            _ => false,
        },
    }
}

/// Equality between a candidate and an operand.
///
/// - `null` matches a missing value, an explicit null, or an array holding null
/// - an array operand must equal the whole array (no element containment)
/// - any other operand matches the value itself or, for arrays, any element
fn equals(candidate: Resolved<'_>, operand: &Bson, eq: fn(&Bson, &Bson) -> bool) -> bool {
    if matches!(operand, Bson::Null) {
        return candidate.is_nullish()
            || matches!(candidate.value(), Some(Bson::Array(items)) if items.iter().any(|i| matches!(i, Bson::Null)));
    }
    match candidate.value() {
        None => false,
        Some(value) if eq(value, operand) => true,
        Some(Bson::Array(items)) if !matches!(operand, Bson::Array(_)) => {
            items.iter().any(|item| eq(item, operand))
        }
        Some(_) => false,
    }
}

/// Range comparison; arrays match when any element satisfies it.
fn ordered(candidate: Resolved<'_>, operand: &Bson, predicate: fn(Ordering) -> bool) -> bool {
    match candidate.value() {
        Some(Bson::Array(items)) => items
            .iter()
            .any(|item| compare(item, operand).is_some_and(predicate)),
        Some(value) => compare(value, operand).is_some_and(predicate),
        None => false,
    }
}

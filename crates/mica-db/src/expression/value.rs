use std::cmp::Ordering;
use std::fmt::Write;

use bson::Bson;
use mica_query::TypeSpec;

/// Strict structural equality: sub-documents must have the same keys in the
/// same order. Used for literal matches like `{ skill: { name: "Java" } }`.
pub fn ordered_equal(a: &Bson, b: &Bson) -> bool {
    equal_with(a, b, true)
}

/// Structural equality that ignores sub-document key order. Arrays still
/// compare positionally. Used for operator operands (`$eq`, `$in`, `$all`, ...).
pub fn unordered_equal(a: &Bson, b: &Bson) -> bool {
    equal_with(a, b, false)
}

fn equal_with(a: &Bson, b: &Bson, ordered: bool) -> bool {
    match (a, b) {
        (Bson::Document(x), Bson::Document(y)) => {
            x.len() == y.len()
                && if ordered {
                    x.iter()
                        .zip(y.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && equal_with(va, vb, true))
                } else {
                    x.iter()
                        .all(|(k, va)| y.get(k).is_some_and(|vb| equal_with(va, vb, false)))
                }
        }
        (Bson::Array(x), Bson::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(va, vb)| equal_with(va, vb, ordered))
        }
        _ => match (Number::of(a), Number::of(b)) {
            (Some(x), Some(y)) => x.compare_to(y) == Some(Ordering::Equal),
            _ => a == b,
        },
    }
}

/// Order two values of the same comparable class; `None` across classes.
pub(crate) fn compare(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (Number::of(a), Number::of(b)) {
        return x.compare_to(y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => {
            Some(x.timestamp_millis().cmp(&y.timestamp_millis()))
        }
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Total order used for sorting: values rank by type class first, then by
/// [`compare`] within a class. A missing value sorts with null.
pub(crate) fn sort_order(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let (ra, rb) = (type_rank(a), type_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        Some(Bson::MinKey) => 0,
        None | Some(Bson::Null) | Some(Bson::Undefined) => 1,
        Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_)) => 2,
        Some(Bson::String(_) | Bson::Symbol(_)) => 3,
        Some(Bson::Document(_)) => 4,
        Some(Bson::Array(_)) => 5,
        Some(Bson::Binary(_)) => 6,
        Some(Bson::ObjectId(_)) => 7,
        Some(Bson::Boolean(_)) => 8,
        Some(Bson::DateTime(_)) => 9,
        Some(Bson::Timestamp(_)) => 10,
        Some(Bson::RegularExpression(_)) => 11,
        Some(Bson::MaxKey) => 13,
        Some(_) => 12,
    }
}

/// `$type` check against the value itself (not its elements).
pub(crate) fn type_matches(value: &Bson, spec: &TypeSpec) -> bool {
    match spec {
        TypeSpec::Code(code) => value.element_type() as u8 == *code,
        TypeSpec::Number => matches!(
            value,
            Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_)
        ),
    }
}

/// Numeric view of a value so Int32, Int64 and Double compare by magnitude.
///
/// Decimal128 is not included: bson exposes it only as raw bytes, so it
/// compares equal to itself and is unordered against other numbers.
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Bson) -> Option<Number> {
        match value {
            Bson::Int32(n) => Some(Number::Int(i64::from(*n))),
            Bson::Int64(n) => Some(Number::Int(*n)),
            Bson::Double(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    fn compare_to(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (Number::Int(a), Number::Float(b)) => compare_int_float(a, b),
            (Number::Float(a), Number::Int(b)) => compare_int_float(b, a).map(Ordering::reverse),
            (Number::Float(a), Number::Float(b)) => a.partial_cmp(&b),
        }
    }
}

// 2^63 is exactly representable; every i64 lies in [-2^63, 2^63).
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

/// Exact `i64` vs `f64` ordering. Casting the integer to `f64` would round
/// anything above 2^53.
fn compare_int_float(int: i64, float: f64) -> Option<Ordering> {
    if float.is_nan() {
        return None;
    }
    if float >= TWO_POW_63 {
        return Some(Ordering::Less);
    }
    if float < -TWO_POW_63 {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc();
    // in range, so the cast is exact
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(float - whole)),
        unequal => Some(unequal),
    }
}

/// A string that is the same for two values exactly when they are
/// [`unordered_equal`], used to index unique `_id`s. Integral numbers share
/// one form whatever their BSON type; sub-document keys are sorted.
pub(crate) fn identity_key(value: &Bson) -> String {
    let mut out = String::new();
    write_identity(value, &mut out);
    out
}

fn write_identity(value: &Bson, out: &mut String) {
    match value {
        Bson::Document(doc) => {
            let mut entries: Vec<_> = doc.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            out.push('{');
            for (key, v) in entries {
                let _ = write!(out, "{key:?}:");
                write_identity(v, out);
                out.push(',');
            }
            out.push('}');
        }
        Bson::Array(items) => {
            out.push('[');
            for item in items {
                write_identity(item, out);
                out.push(',');
            }
            out.push(']');
        }
        _ => match Number::of(value) {
            Some(Number::Int(n)) => {
                let _ = write!(out, "n{n}");
            }
            Some(Number::Float(f)) => match integral(f) {
                Some(n) => {
                    let _ = write!(out, "n{n}");
                }
                None => {
                    let _ = write!(out, "f{:x}", f.to_bits());
                }
            },
            None => {
                let _ = write!(out, "t{}:{value:?}", value.element_type() as u8);
            }
        },
    }
}

/// The `i64` a double equals exactly, if any. Covers `-0.0` too.
fn integral(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && (-TWO_POW_63..TWO_POW_63).contains(&f)).then_some(f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{bson, doc};

    #[test]
    fn numbers_compare_across_types() {
        assert!(ordered_equal(&Bson::Int32(3), &Bson::Int64(3)));
        assert!(ordered_equal(&Bson::Int64(3), &Bson::Double(3.0)));
        assert!(!ordered_equal(&Bson::Int32(3), &Bson::Double(3.5)));
        assert!(!ordered_equal(&Bson::Int32(3), &Bson::String("3".into())));
    }

    #[test]
    fn large_integers_compare_exactly_with_doubles() {
        let big = Bson::Int64(9_007_199_254_740_993);
        let near = Bson::Double(9_007_199_254_740_992.0);
        assert!(!ordered_equal(&big, &near));
        assert!(!unordered_equal(&big, &near));
        assert_eq!(compare(&big, &near), Some(Ordering::Greater));
        assert_eq!(compare(&near, &big), Some(Ordering::Less));
        assert!(ordered_equal(&Bson::Int64(9_007_199_254_740_992), &near));
    }

    #[test]
    fn integers_against_fractional_and_extreme_doubles() {
        assert_eq!(compare(&Bson::Int32(2), &Bson::Double(2.5)), Some(Ordering::Less));
        assert_eq!(compare(&Bson::Int32(-2), &Bson::Double(-2.5)), Some(Ordering::Greater));
        assert_eq!(compare(&Bson::Int32(3), &Bson::Double(2.5)), Some(Ordering::Greater));
        assert_eq!(compare(&Bson::Int64(i64::MAX), &Bson::Double(1e19)), Some(Ordering::Less));
        assert_eq!(compare(&Bson::Int64(i64::MIN), &Bson::Double(-1e19)), Some(Ordering::Greater));
        assert_eq!(
            compare(&Bson::Int64(i64::MAX), &Bson::Double(f64::INFINITY)),
            Some(Ordering::Less)
        );
        assert_eq!(compare(&Bson::Int64(1), &Bson::Double(f64::NAN)), None);
    }

    #[test]
    fn identity_keys_follow_unordered_equality() {
        let samples = vec![
            Bson::Int32(1),
            Bson::Int64(1),
            Bson::Double(1.0),
            Bson::Double(1.5),
            Bson::Double(-0.0),
            Bson::Int32(0),
            Bson::Int64(9_007_199_254_740_993),
            Bson::Double(9_007_199_254_740_992.0),
            Bson::Double(1e19),
            Bson::String("1".into()),
            Bson::String("a\",\"b".into()),
            Bson::Boolean(true),
            Bson::Null,
            bson!({ "a": 1, "b": [1, 2] }),
            bson!({ "b": [1.0, 2], "a": 1_i64 }),
            bson!({ "b": [2, 1], "a": 1 }),
            bson!([1, 2]),
            bson!([2, 1]),
        ];
        for a in &samples {
            for b in &samples {
                assert_eq!(
                    identity_key(a) == identity_key(b),
                    unordered_equal(a, b),
                    "{a:?} vs {b:?}"
                );
            }
        }
    }

    #[test]
    fn document_key_order() {
        let a = bson!({ "name": "Java", "experienceYear": 3 });
        let b = bson!({ "experienceYear": 3, "name": "Java" });
        assert!(!ordered_equal(&a, &b));
        assert!(unordered_equal(&a, &b));
        assert!(ordered_equal(&a, &a.clone()));
    }

    #[test]
    fn nested_documents_inherit_relation() {
        let a = bson!({ "skill": { "a": 1, "b": 2 } });
        let b = bson!({ "skill": { "b": 2, "a": 1 } });
        assert!(!ordered_equal(&a, &b));
        assert!(unordered_equal(&a, &b));
    }

    #[test]
    fn documents_of_different_size() {
        let a = bson!({ "a": 1 });
        let b = bson!({ "a": 1, "b": 2 });
        assert!(!ordered_equal(&a, &b));
        assert!(!unordered_equal(&a, &b));
    }

    #[test]
    fn arrays_are_positional() {
        let a = bson!(["NodeJs", "CSS"]);
        let b = bson!(["CSS", "NodeJs"]);
        assert!(!ordered_equal(&a, &b));
        assert!(!unordered_equal(&a, &b));
        assert!(ordered_equal(&a, &bson!(["NodeJs", "CSS"])));
    }

    #[test]
    fn compare_within_class() {
        assert_eq!(compare(&Bson::Int32(21), &Bson::Int32(22)), Some(Ordering::Less));
        assert_eq!(compare(&Bson::Double(22.5), &Bson::Int64(22)), Some(Ordering::Greater));
        assert_eq!(
            compare(&Bson::String("a".into()), &Bson::String("b".into())),
            Some(Ordering::Less)
        );
        assert_eq!(compare(&Bson::Int32(1), &Bson::String("1".into())), None);
        assert_eq!(compare(&Bson::Double(f64::NAN), &Bson::Int32(1)), None);
    }

    #[test]
    fn sort_order_ranks_types() {
        let null = Bson::Null;
        let one = Bson::Int32(1);
        let text = Bson::String("a".into());
        assert_eq!(sort_order(None, Some(&one)), Ordering::Less);
        assert_eq!(sort_order(None, Some(&null)), Ordering::Equal);
        assert_eq!(sort_order(Some(&one), Some(&text)), Ordering::Less);
        assert_eq!(sort_order(Some(&text), Some(&one)), Ordering::Greater);
    }

    #[test]
    fn type_codes() {
        assert!(type_matches(&Bson::Null, &TypeSpec::Code(0x0A)));
        assert!(!type_matches(&Bson::String("x".into()), &TypeSpec::Code(0x0A)));
        assert!(type_matches(&Bson::Int32(1), &TypeSpec::Code(0x10)));
        assert!(type_matches(&Bson::Int64(1), &TypeSpec::Number));
        assert!(type_matches(&Bson::Document(doc! {}), &TypeSpec::Code(0x03)));
        assert!(type_matches(&Bson::MinKey, &TypeSpec::Code(0xFF)));
    }
}

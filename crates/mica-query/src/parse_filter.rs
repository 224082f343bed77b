use bson::{Bson, Document};
use regex::Regex;

use crate::expression::{ElemMatch, Expression, Predicate, TypeSpec};
use crate::path::Path;

/// Parse error for filter documents.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParseError(pub String);

impl std::fmt::Display for FilterParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "filter parse error: {}", self.0)
    }
}

impl std::error::Error for FilterParseError {}

/// `$type` aliases and their BSON element tags.
const TYPE_ALIASES: &[(&str, u8)] = &[
    ("double", 0x01),
    ("string", 0x02),
    ("object", 0x03),
    ("array", 0x04),
    ("binData", 0x05),
    ("undefined", 0x06),
    ("objectId", 0x07),
    ("bool", 0x08),
    ("date", 0x09),
    ("null", 0x0A),
    ("regex", 0x0B),
    ("dbPointer", 0x0C),
    ("javascript", 0x0D),
    ("symbol", 0x0E),
    ("javascriptWithScope", 0x0F),
    ("int", 0x10),
    ("timestamp", 0x11),
    ("long", 0x12),
    ("decimal", 0x13),
    ("minKey", 0xFF),
    ("maxKey", 0x7F),
];

/// Parse a BSON filter document into an Expression tree.
///
/// Follows MongoDB query semantics:
/// - Top-level document is an implicit AND of all entries; `{}` matches everything
/// - `{ "field": value }` is a literal match (ordered for sub-documents)
/// - `{ "field": { "$gt": v } }` uses operator sub-documents
/// - `{ "$or": [...] }` / `{ "$and": [...] }` / `{ "$nor": [...] }` for logical ops
/// - `{ "field": { "$regex": "pattern", "$options": "i" } }` for regex
/// - `{ "field": { "$elemMatch": { ... } } }` for per-element conditions
pub fn parse_filter(doc: &Document) -> Result<Expression, FilterParseError> {
    let mut children = Vec::with_capacity(doc.len());

    for (key, value) in doc {
        match key.as_str() {
            "$and" => children.push(Expression::And(parse_logical_array(key, value)?)),
            "$or" => children.push(Expression::Or(parse_logical_array(key, value)?)),
            "$nor" => children.push(Expression::Nor(parse_logical_array(key, value)?)),
            k if k.starts_with('$') => {
                return Err(FilterParseError(format!("unknown top-level operator: {k}")));
            }
            _ => children.push(parse_field_condition(key, value)?),
        }
    }

    if children.len() == 1 {
        Ok(children.remove(0))
    } else {
        Ok(Expression::And(children))
    }
}

/// Parse a `$and`, `$or` or `$nor` array value into its branches.
fn parse_logical_array(op: &str, value: &Bson) -> Result<Vec<Expression>, FilterParseError> {
    let arr = match value {
        Bson::Array(a) => a,
        _ => return Err(FilterParseError(format!("{op} value must be an array"))),
    };
    if arr.is_empty() {
        return Err(FilterParseError(format!("{op} array must not be empty")));
    }

    arr.iter()
        .map(|elem| match elem {
            Bson::Document(sub_doc) => parse_filter(sub_doc),
            _ => Err(FilterParseError(format!(
                "{op} array elements must be documents"
            ))),
        })
        .collect()
}

/// Parse a field condition: either a literal match or an operator sub-document.
fn parse_field_condition(field: &str, value: &Bson) -> Result<Expression, FilterParseError> {
    let path = Path::parse(field).map_err(|e| FilterParseError(e.to_string()))?;

    // If value is a document whose first key starts with $, it's an operator doc
    if let Bson::Document(sub_doc) = value
        && sub_doc.keys().next().is_some_and(|k| k.starts_with('$'))
    {
        let mut predicates = parse_operator_doc(sub_doc)?;
        if predicates.len() == 1 {
            return Ok(Expression::Field(path, predicates.remove(0)));
        }
        return Ok(Expression::And(
            predicates
                .into_iter()
                .map(|p| Expression::Field(path.clone(), p))
                .collect(),
        ));
    }

    Ok(Expression::Field(path, Predicate::Literal(value.clone())))
}

/// Parse an operator sub-document like `{ "$gt": 21, "$lte": 100 }`.
pub(crate) fn parse_operator_doc(doc: &Document) -> Result<Vec<Predicate>, FilterParseError> {
    let options = match doc.get("$options") {
        None => None,
        Some(Bson::String(s)) => Some(s.as_str()),
        Some(_) => return Err(FilterParseError("$options value must be a string".into())),
    };

    let mut predicates = Vec::with_capacity(doc.len());
    for (op, arg) in doc {
        let predicate = match op.as_str() {
            "$eq" => Predicate::Eq(arg.clone()),
            "$ne" => Predicate::Ne(arg.clone()),
            "$gt" => Predicate::Gt(arg.clone()),
            "$gte" => Predicate::Gte(arg.clone()),
            "$lt" => Predicate::Lt(arg.clone()),
            "$lte" => Predicate::Lte(arg.clone()),
            "$in" => Predicate::In(array_operand(op, arg)?),
            "$nin" => Predicate::Nin(array_operand(op, arg)?),
            "$all" => Predicate::All(array_operand(op, arg)?),
            "$size" => match integral(arg) {
                Some(n) if n >= 0 => Predicate::Size(n as usize),
                _ => {
                    return Err(FilterParseError(
                        "$size value must be a non-negative integer".into(),
                    ));
                }
            },
            "$exists" => match arg {
                Bson::Boolean(b) => Predicate::Exists(*b),
                other => match integral(other) {
                    Some(n) => Predicate::Exists(n != 0),
                    None => {
                        return Err(FilterParseError("$exists value must be a boolean".into()));
                    }
                },
            },
            "$type" => Predicate::Type(parse_type_operand(arg)?),
            "$regex" => Predicate::Regex(parse_regex(arg, options)?),
            "$options" => {
                if !doc.contains_key("$regex") {
                    return Err(FilterParseError("$options without $regex".into()));
                }
                continue;
            }
            "$elemMatch" => Predicate::ElemMatch(parse_elem_match(arg)?),
            k => return Err(FilterParseError(format!("unknown field operator: {k}"))),
        };
        predicates.push(predicate);
    }

    if predicates.is_empty() {
        return Err(FilterParseError("empty operator document".into()));
    }
    Ok(predicates)
}

/// Parse the operand of `$elemMatch`, shared by filters and projections.
///
/// An operand made only of field operators applies to each element's value;
/// anything else is a filter applied to each element as a document.
pub(crate) fn parse_elem_match(arg: &Bson) -> Result<ElemMatch, FilterParseError> {
    let doc = match arg {
        Bson::Document(d) => d,
        _ => return Err(FilterParseError("$elemMatch value must be a document".into())),
    };

    let value_form = !doc.is_empty()
        && doc
            .keys()
            .all(|k| k.starts_with('$') && !matches!(k.as_str(), "$and" | "$or" | "$nor"));

    if value_form {
        Ok(ElemMatch::Value(parse_operator_doc(doc)?))
    } else {
        Ok(ElemMatch::Document(Box::new(parse_filter(doc)?)))
    }
}

fn array_operand(op: &str, arg: &Bson) -> Result<Vec<Bson>, FilterParseError> {
    match arg {
        Bson::Array(items) => Ok(items.clone()),
        _ => Err(FilterParseError(format!("{op} value must be an array"))),
    }
}

fn parse_type_operand(arg: &Bson) -> Result<Vec<TypeSpec>, FilterParseError> {
    match arg {
        Bson::Array(items) => {
            if items.is_empty() {
                return Err(FilterParseError("$type array must not be empty".into()));
            }
            items.iter().map(parse_type_spec).collect()
        }
        single => Ok(vec![parse_type_spec(single)?]),
    }
}

fn parse_type_spec(arg: &Bson) -> Result<TypeSpec, FilterParseError> {
    if let Bson::String(alias) = arg {
        if alias == "number" {
            return Ok(TypeSpec::Number);
        }
        return TYPE_ALIASES
            .iter()
            .find(|(name, _)| *name == alias.as_str())
            .map(|(_, code)| TypeSpec::Code(*code))
            .ok_or_else(|| FilterParseError(format!("unknown $type alias: {alias}")));
    }

    let code = integral(arg)
        .ok_or_else(|| FilterParseError("$type value must be a number or string".into()))?;
    let tag = if code == -1 { 0xFF } else { code };
    TYPE_ALIASES
        .iter()
        .find(|(_, known)| i64::from(*known) == tag)
        .map(|(_, known)| TypeSpec::Code(*known))
        .ok_or_else(|| FilterParseError(format!("unknown $type code: {code}")))
}

/// Compile a `$regex` operand with optional `$options` flags.
fn parse_regex(arg: &Bson, options: Option<&str>) -> Result<Regex, FilterParseError> {
    let pat = match arg {
        Bson::String(s) => s.as_str(),
        _ => return Err(FilterParseError("$regex value must be a string".into())),
    };

    // Build final pattern with flags
    let full_pattern = match options {
        Some(opts) if !opts.is_empty() => {
            let mut prefix = String::with_capacity(4 + opts.len() + pat.len());
            prefix.push_str("(?");
            for ch in opts.chars() {
                match ch {
                    'i' | 's' | 'm' | 'x' => prefix.push(ch),
                    c => return Err(FilterParseError(format!("unknown regex option: {c}"))),
                }
            }
            prefix.push(')');
            prefix.push_str(pat);
            prefix
        }
        _ => pat.to_string(),
    };

    Regex::new(&full_pattern).map_err(|e| FilterParseError(format!("invalid regex pattern: {e}")))
}

/// Integral value of a numeric operand; `2.0` counts, `2.5` does not.
pub(crate) fn integral(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
        _ => None,
    }
}

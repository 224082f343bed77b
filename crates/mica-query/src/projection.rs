use std::fmt;

use bson::{Bson, Document};

use crate::expression::ElemMatch;
use crate::parse_filter::{integral, parse_elem_match};
use crate::path::Path;

/// Identity field assigned to every stored document.
pub const ID_FIELD: &str = "_id";

/// Parse error for projection documents.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionParseError(pub String);

impl fmt::Display for ProjectionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projection parse error: {}", self.0)
    }
}

impl std::error::Error for ProjectionParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    /// Only the listed paths (plus `_id`) survive.
    Inclusive,
    /// Everything except the listed paths survives.
    Exclusive,
}

#[derive(Debug, Clone)]
pub enum Directive {
    Include,
    Exclude,
    Slice(Slice),
    ElemMatch(ElemMatch),
}

/// A `$slice` operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slice {
    /// `n` keeps the first `n` elements, `-n` the last `n`.
    Count(i64),
    /// `[skip, limit]`; a negative skip counts from the end.
    Range { skip: i64, limit: usize },
}

impl Slice {
    /// Half-open index range this slice keeps from an array of `len` elements.
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        match *self {
            Slice::Count(n) if n >= 0 => (0, len.min(n as usize)),
            Slice::Count(n) => (len.saturating_sub(n.unsigned_abs() as usize), len),
            Slice::Range { skip, limit } => {
                let start = if skip >= 0 {
                    len.min(skip as usize)
                } else {
                    len.saturating_sub(skip.unsigned_abs() as usize)
                };
                (start, len.min(start.saturating_add(limit)))
            }
        }
    }
}

/// A validated projection document.
#[derive(Debug, Clone)]
pub struct Projection {
    include_id: bool,
    mode: ProjectionMode,
    fields: Vec<(Path, Directive)>,
}

impl Projection {
    pub fn include_id(&self) -> bool {
        self.include_id
    }

    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn fields(&self) -> &[(Path, Directive)] {
        &self.fields
    }
}

/// Parse a projection document such as `{ "_id": 0, "city": 1, "jobs": { "$slice": -1 } }`.
///
/// Ordinary fields must be all inclusions or all exclusions; `_id` may be
/// toggled independently. With no ordinary fields the mode is inclusive when an
/// `$elemMatch` is present or the document is just `{ _id: 1 }`, and
/// exclusive otherwise.
pub fn parse_projection(doc: &Document) -> Result<Projection, ProjectionParseError> {
    let mut include_id = true;
    let mut id_requested = false;
    let mut fields: Vec<(Path, Directive)> = Vec::with_capacity(doc.len());

    for (key, value) in doc {
        let directive = parse_directive(key, value)?;
        if key == ID_FIELD {
            match directive {
                Directive::Include => {
                    include_id = true;
                    id_requested = true;
                    continue;
                }
                Directive::Exclude => {
                    include_id = false;
                    continue;
                }
                _ => {}
            }
        }

        let path = Path::parse(key).map_err(|e| ProjectionParseError(e.to_string()))?;
        if let Some((existing, _)) = fields
            .iter()
            .find(|(p, _)| p.is_prefix_of(&path) || path.is_prefix_of(p))
        {
            return Err(ProjectionParseError(format!(
                "path collision between '{existing}' and '{path}'"
            )));
        }
        fields.push((path, directive));
    }

    let includes = fields.iter().any(|(_, d)| matches!(d, Directive::Include));
    let excludes = fields.iter().any(|(_, d)| matches!(d, Directive::Exclude));
    let mode = match (includes, excludes) {
        (true, true) => {
            return Err(ProjectionParseError(
                "cannot mix inclusion and exclusion".into(),
            ));
        }
        (true, false) => ProjectionMode::Inclusive,
        (false, true) => ProjectionMode::Exclusive,
        // `{ _id: 1 }` on its own keeps only `_id`.
        (false, false) => {
            if (id_requested && fields.is_empty())
                || fields
                    .iter()
                    .any(|(_, d)| matches!(d, Directive::ElemMatch(_)))
            {
                ProjectionMode::Inclusive
            } else {
                ProjectionMode::Exclusive
            }
        }
    };

    Ok(Projection {
        include_id,
        mode,
        fields,
    })
}

fn parse_directive(key: &str, value: &Bson) -> Result<Directive, ProjectionParseError> {
    match value {
        Bson::Boolean(true) => Ok(Directive::Include),
        Bson::Boolean(false) => Ok(Directive::Exclude),
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => match numeric_flag(value) {
            Some(true) => Ok(Directive::Include),
            Some(false) => Ok(Directive::Exclude),
            None => Err(ProjectionParseError(format!(
                "invalid projection value for '{key}'"
            ))),
        },
        Bson::Document(op_doc) => {
            let mut ops = op_doc.iter();
            let (op, arg) = match (ops.next(), ops.next()) {
                (Some(only), None) => only,
                _ => {
                    return Err(ProjectionParseError(format!(
                        "projection operator for '{key}' must have exactly one key"
                    )));
                }
            };
            match op.as_str() {
                "$slice" => Ok(Directive::Slice(parse_slice(arg)?)),
                "$elemMatch" => parse_elem_match(arg)
                    .map(Directive::ElemMatch)
                    .map_err(|e| ProjectionParseError(e.0)),
                other => Err(ProjectionParseError(format!(
                    "unknown projection operator: {other}"
                ))),
            }
        }
        _ => Err(ProjectionParseError(format!(
            "invalid projection value for '{key}'"
        ))),
    }
}

fn numeric_flag(value: &Bson) -> Option<bool> {
    match value {
        Bson::Double(f) if f.is_nan() => None,
        Bson::Double(f) => Some(*f != 0.0),
        other => integral(other).map(|n| n != 0),
    }
}

fn parse_slice(arg: &Bson) -> Result<Slice, ProjectionParseError> {
    if let Some(n) = integral(arg) {
        return Ok(Slice::Count(n));
    }
    if let Bson::Array(pair) = arg
        && let [skip, limit] = pair.as_slice()
    {
        let skip = integral(skip)
            .ok_or_else(|| ProjectionParseError("$slice skip must be an integer".into()))?;
        return match integral(limit) {
            Some(limit) if limit > 0 => Ok(Slice::Range {
                skip,
                limit: limit as usize,
            }),
            _ => Err(ProjectionParseError(
                "$slice limit must be a positive integer".into(),
            )),
        };
    }
    Err(ProjectionParseError(
        "$slice value must be an integer or [skip, limit]".into(),
    ))
}

use bson::Document;
use serde::{Deserialize, Serialize};

use crate::parse_filter::{FilterParseError, integral};
use crate::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Parse a sort document such as `{ "age": -1, "name": 1 }`; keys are applied in order.
pub fn parse_sort(doc: &Document) -> Result<Vec<Sort>, FilterParseError> {
    doc.iter()
        .map(|(field, value)| {
            Path::parse(field).map_err(|e| FilterParseError(e.to_string()))?;
            let direction = match integral(value) {
                Some(1) => SortDirection::Asc,
                Some(-1) => SortDirection::Desc,
                _ => {
                    return Err(FilterParseError(format!(
                        "sort direction for '{field}' must be 1 or -1"
                    )));
                }
            };
            Ok(Sort {
                field: field.clone(),
                direction,
            })
        })
        .collect()
}

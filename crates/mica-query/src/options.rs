use bson::Document;
use serde::{Deserialize, Serialize};

use crate::sort::Sort;

/// Cursor shaping applied after filtering, in order: sort, skip, limit, projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    #[serde(default)]
    pub sort: Vec<Sort>,
    #[serde(default)]
    pub skip: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub projection: Option<Document>,
}

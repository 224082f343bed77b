mod field_tree;

use std::collections::HashMap;

use bson::{Bson, Document};
use mica_query::{Directive, ID_FIELD, Projection, ProjectionMode};

use self::field_tree::FieldTree;
use crate::expression::elem_matches;

/// A projection compiled into a field tree, ready to apply to many documents.
#[derive(Debug, Clone)]
pub struct ProjectionPlan {
    include_id: bool,
    mode: ProjectionMode,
    tree: HashMap<String, FieldTree>,
}

impl ProjectionPlan {
    pub fn new(projection: &Projection) -> Self {
        ProjectionPlan {
            include_id: projection.include_id(),
            mode: projection.mode(),
            tree: FieldTree::from_fields(projection.fields()),
        }
    }

    /// Build the projected copy of `doc`. Fields keep their source order.
    pub fn apply(&self, doc: &Document) -> Document {
        let mut out = Document::new();
        for (key, value) in doc {
            if key == ID_FIELD {
                match self.tree.get(key) {
                    // `_id` reached through a nested path like `_id.part`
                    Some(node) if self.include_id => {
                        if let Some(v) = self.project_node(node, value) {
                            out.insert(key.clone(), v);
                        }
                    }
                    _ if self.include_id => {
                        out.insert(key.clone(), value.clone());
                    }
                    _ => {}
                }
                continue;
            }
            if let Some(v) = self.project_field(key, value, &self.tree) {
                out.insert(key.clone(), v);
            }
        }
        out
    }

    fn project_field(&self, key: &str, value: &Bson, tree: &HashMap<String, FieldTree>) -> Option<Bson> {
        match tree.get(key) {
            Some(node) => self.project_node(node, value),
            None => match self.mode {
                ProjectionMode::Inclusive => None,
                ProjectionMode::Exclusive => Some(value.clone()),
            },
        }
    }

    fn project_node(&self, node: &FieldTree, value: &Bson) -> Option<Bson> {
        match node {
            FieldTree::Leaf(directive) => apply_leaf(directive, value),
            FieldTree::Branch(children) => match value {
                Bson::Document(sub) => Some(Bson::Document(self.project_document(sub, children))),
                Bson::Array(items) => Some(Bson::Array(
                    items
                        .iter()
                        .filter_map(|item| match item {
                            Bson::Document(sub) => {
                                Some(Bson::Document(self.project_document(sub, children)))
                            }
                            // Scalars have no sub-fields to keep.
                            other => match self.mode {
                                ProjectionMode::Inclusive => None,
                                ProjectionMode::Exclusive => Some(other.clone()),
                            },
                        })
                        .collect(),
                )),
                other => match self.mode {
                    ProjectionMode::Inclusive => None,
                    ProjectionMode::Exclusive => Some(other.clone()),
                },
            },
        }
    }

    fn project_document(&self, doc: &Document, tree: &HashMap<String, FieldTree>) -> Document {
        let mut out = Document::new();
        for (key, value) in doc {
            if let Some(v) = self.project_field(key, value, tree) {
                out.insert(key.clone(), v);
            }
        }
        out
    }
}

/// Apply a projection to a single document.
pub fn project(doc: &Document, projection: &Projection) -> Document {
    ProjectionPlan::new(projection).apply(doc)
}

fn apply_leaf(directive: &Directive, value: &Bson) -> Option<Bson> {
    match directive {
        Directive::Include => Some(value.clone()),
        Directive::Exclude => None,
        Directive::Slice(slice) => match value {
            Bson::Array(items) => {
                let (start, end) = slice.bounds(items.len());
                Some(Bson::Array(items[start..end].to_vec()))
            }
            _ => None,
        },
        // Every matching element is kept; no match drops the field.
        Directive::ElemMatch(cond) => match value {
            Bson::Array(items) => {
                let kept: Vec<Bson> = items
                    .iter()
                    .filter(|item| elem_matches(item, cond))
                    .cloned()
                    .collect();
                (!kept.is_empty()).then_some(Bson::Array(kept))
            }
            _ => None,
        },
    }
}

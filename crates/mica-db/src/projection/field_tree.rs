use std::collections::HashMap;

use mica_query::{Directive, Path};

/// A pre-built tree of projection paths.
///
/// Given `[("city", Include), ("jobs.title", Include), ("jobs.years", Include)]`, builds:
/// ```text
/// { "city": Leaf(Include),
///   "jobs": Branch({ "title": Leaf(Include), "years": Leaf(Include) }) }
/// ```
///
/// Built once per cursor and reused across every document it yields.
#[derive(Debug, Clone)]
pub(crate) enum FieldTree {
    /// Apply the directive to the whole field value.
    Leaf(Directive),
    /// Recurse into sub-fields.
    Branch(HashMap<String, FieldTree>),
}

impl FieldTree {
    /// Build a tree from parsed projection fields.
    ///
    /// Paths never overlap (the parser rejects collisions), so a leaf is never
    /// asked to grow children.
    pub(crate) fn from_fields(fields: &[(Path, Directive)]) -> HashMap<String, FieldTree> {
        let mut root = HashMap::new();
        for (path, directive) in fields {
            let keys: Vec<String> = path.segments().iter().map(|s| s.key().into_owned()).collect();
            insert_path(&mut root, &keys, directive);
        }
        root
    }
}

fn insert_path(map: &mut HashMap<String, FieldTree>, keys: &[String], directive: &Directive) {
    match keys {
        [] => {}
        [last] => {
            map.insert(last.clone(), FieldTree::Leaf(directive.clone()));
        }
        [top, rest @ ..] => {
            let entry = map
                .entry(top.clone())
                .or_insert_with(|| FieldTree::Branch(HashMap::new()));
            if let FieldTree::Branch(children) = entry {
                insert_path(children, rest, directive);
            }
        }
    }
}

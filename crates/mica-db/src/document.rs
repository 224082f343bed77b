use bson::{Bson, Document};
use mica_query::{Path, Segment};

/// Outcome of locating a path in a document.
///
/// An explicit `null` is `Present(Bson::Null)`; only a missing key (or a walk
/// that cannot continue) is `Absent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Present(&'a Bson),
    Absent,
}

impl<'a> Resolved<'a> {
    pub fn is_present(&self) -> bool {
        matches!(self, Resolved::Present(_))
    }

    /// `Absent` or `Present(null)`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Resolved::Absent | Resolved::Present(Bson::Null))
    }

    pub fn value(&self) -> Option<&'a Bson> {
        match *self {
            Resolved::Present(v) => Some(v),
            Resolved::Absent => None,
        }
    }
}

/// Resolve a path positionally.
///
/// Index segments index into arrays; a field segment applied to an array, or
/// any segment applied to a scalar, resolves to `Absent`.
pub fn resolve<'a>(doc: &'a Document, path: &Path) -> Resolved<'a> {
    let Some((first, rest)) = path.segments().split_first() else {
        return Resolved::Absent;
    };
    let mut current = match doc.get(&*first.key()) {
        Some(v) => v,
        None => return Resolved::Absent,
    };
    for segment in rest {
        current = match (current, segment) {
            (Bson::Document(sub), _) => match sub.get(&*segment.key()) {
                Some(v) => v,
                None => return Resolved::Absent,
            },
            (Bson::Array(items), Segment::Index(i)) => match items.get(*i) {
                Some(v) => v,
                None => return Resolved::Absent,
            },
            _ => return Resolved::Absent,
        };
    }
    Resolved::Present(current)
}

/// Resolve a path with array fan-out, the way query conditions see it.
///
/// A field segment applied to an array continues into every element that is
/// a document, so `skills.name` yields one candidate per skill. Index
/// segments still index positionally. Never returns an empty list: when
/// nothing is reachable the result is a single `Absent`.
pub fn resolve_all<'a>(doc: &'a Document, path: &Path) -> Vec<Resolved<'a>> {
    let mut out = Vec::new();
    walk_document(doc, path.segments(), &mut out);
    if out.is_empty() {
        out.push(Resolved::Absent);
    }
    out
}

fn walk_document<'a>(doc: &'a Document, segments: &[Segment], out: &mut Vec<Resolved<'a>>) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    match doc.get(&*first.key()) {
        Some(value) => walk_value(value, rest, out),
        None => out.push(Resolved::Absent),
    }
}

fn walk_value<'a>(value: &'a Bson, segments: &[Segment], out: &mut Vec<Resolved<'a>>) {
    let Some((first, rest)) = segments.split_first() else {
        out.push(Resolved::Present(value));
        return;
    };
    match (value, first) {
        (Bson::Document(sub), _) => walk_document(sub, segments, out),
        (Bson::Array(items), Segment::Index(i)) => match items.get(*i) {
            Some(item) => walk_value(item, rest, out),
            None => out.push(Resolved::Absent),
        },
        (Bson::Array(items), Segment::Field(_)) => {
            for item in items {
                if let Bson::Document(sub) = item {
                    walk_document(sub, segments, out);
                }
            }
        }
        _ => out.push(Resolved::Absent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn path(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn user() -> Document {
        doc! {
            "name": "Vasa",
            "skill": { "name": "Java", "experienceYear": 3 },
            "doneProjects": [{ "name": "Project 1" }, { "name": "Project 2" }],
            "tags": ["a", "b"],
            "nothing": null,
        }
    }

    #[test]
    fn top_level_and_nested() {
        let doc = user();
        assert_eq!(resolve(&doc, &path("name")), Resolved::Present(&Bson::String("Vasa".into())));
        assert_eq!(resolve(&doc, &path("skill.experienceYear")), Resolved::Present(&Bson::Int32(3)));
    }

    #[test]
    fn null_is_present() {
        let doc = user();
        let r = resolve(&doc, &path("nothing"));
        assert_eq!(r, Resolved::Present(&Bson::Null));
        assert!(r.is_nullish());
        assert!(r.is_present());
    }

    #[test]
    fn missing_is_absent() {
        let doc = user();
        let r = resolve(&doc, &path("missing"));
        assert_eq!(r, Resolved::Absent);
        assert!(r.is_nullish());
        assert!(!r.is_present());
        assert_eq!(resolve(&doc, &path("skill.level")), Resolved::Absent);
    }

    #[test]
    fn index_segments() {
        let doc = user();
        assert_eq!(
            resolve(&doc, &path("doneProjects.0.name")),
            Resolved::Present(&Bson::String("Project 1".into()))
        );
        assert_eq!(resolve(&doc, &path("doneProjects.5.name")), Resolved::Absent);
        assert_eq!(resolve(&doc, &path("tags.1")), Resolved::Present(&Bson::String("b".into())));
    }

    #[test]
    fn field_segment_on_array_is_absent_positionally() {
        let doc = user();
        assert_eq!(resolve(&doc, &path("doneProjects.name")), Resolved::Absent);
    }

    #[test]
    fn through_scalar_is_absent() {
        let doc = user();
        assert_eq!(resolve(&doc, &path("name.first")), Resolved::Absent);
        assert_eq!(resolve(&doc, &path("tags.0.x")), Resolved::Absent);
    }

    #[test]
    fn numeric_segment_on_document_is_a_key() {
        let doc = doc! { "scores": { "0": "zero" } };
        assert_eq!(
            resolve(&doc, &path("scores.0")),
            Resolved::Present(&Bson::String("zero".into()))
        );
    }

    #[test]
    fn fan_out_over_array_of_documents() {
        let doc = user();
        let all = resolve_all(&doc, &path("doneProjects.name"));
        assert_eq!(
            all,
            vec![
                Resolved::Present(&Bson::String("Project 1".into())),
                Resolved::Present(&Bson::String("Project 2".into())),
            ]
        );
    }

    #[test]
    fn fan_out_never_empty() {
        let doc = user();
        assert_eq!(resolve_all(&doc, &path("tags.name")), vec![Resolved::Absent]);
        assert_eq!(resolve_all(&doc, &path("missing.name")), vec![Resolved::Absent]);
    }

    #[test]
    fn fan_out_keeps_absent_elements() {
        let doc = doc! { "items": [{ "a": 1 }, { "b": 2 }] };
        assert_eq!(
            resolve_all(&doc, &path("items.a")),
            vec![Resolved::Present(&Bson::Int32(1)), Resolved::Absent]
        );
    }
}

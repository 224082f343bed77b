mod expression;
mod options;
mod parse_filter;
mod path;
mod projection;
mod sort;

pub use expression::{ElemMatch, Expression, Predicate, TypeSpec};
pub use options::FindOptions;
pub use parse_filter::{FilterParseError, parse_filter};
pub use path::{Path, PathError, Segment};
pub use projection::{
    Directive, ID_FIELD, Projection, ProjectionMode, ProjectionParseError, Slice,
    parse_projection,
};
pub use sort::{Sort, SortDirection, parse_sort};

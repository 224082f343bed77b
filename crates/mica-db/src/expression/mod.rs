mod eval;
mod value;

pub use eval::matches;
pub(crate) use eval::elem_matches;
pub(crate) use value::{identity_key, sort_order};
pub use value::{ordered_equal, unordered_equal};

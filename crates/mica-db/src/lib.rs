mod collection;
mod cursor;
mod database;
mod document;
mod error;
mod expression;
mod projection;
mod result;

pub use bson::{Bson, Document};
pub use collection::Collection;
pub use cursor::{Cursor, CursorIter};
pub use database::{Database, DatabaseConfig, IdStrategy};
pub use document::{Resolved, resolve, resolve_all};
pub use error::DbError;
pub use expression::{matches, ordered_equal, unordered_equal};
pub use projection::{ProjectionPlan, project};
pub use result::{InsertManyResult, InsertOneResult};

//! Persistence layer: one SQLite table of health centres, split into the
//! connection handle, the bulk loader and the row-level operations.

mod centres;
mod connection;
mod loader;

pub use centres::Predicate;
pub(crate) use connection::CASEFOLD_FN;
pub use connection::RecordStore;
pub use loader::read_dataset;

//! Reference data store: dictionaries, notices, configs and email records.
//!
//! [`store::ReferenceStore`] is the single entry point. It wraps a SeaORM
//! connection (SQLite by default), runs the schema migrations on open and
//! exposes typed operations whose lifecycle and uniqueness rules are enforced
//! here rather than by callers:
//!
//! - a dictionary type owns its entries and deleting it removes them in the
//!   same transaction;
//! - an entry's `type_code` is always derived from its owning type;
//! - notice and email status transitions are check-then-set in one statement,
//!   so concurrent callers cannot both win;
//! - config values are validated against their declared type before they are
//!   written.

pub mod clock;
pub mod config_value;
pub mod entities;
pub mod error;
pub mod store;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config_value::ConfigValue;
pub use error::{ErrorKind, Result, StoreError};
pub use store::{
    ConfigFilter, DictDataFilter, DictTypeFilter, EmailRecordFilter, NoticeFilter, ReferenceStore,
};

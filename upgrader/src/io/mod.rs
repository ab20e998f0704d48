//! Side-effecting operations: filesystem reads and writes.
//!
//! Everything here touches the install tree or the log directory. Pure
//! decision logic lives in `core`.

pub mod config;
pub mod install;
pub mod module_log;
pub mod predicate;
pub mod properties;
pub mod xml_query;

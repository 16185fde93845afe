//! Dependency records and per-file deduplication for Purview providers.
//!
//! Dependency-extraction backends report one ordered list of [`Dependency`]
//! records per analysed source file (keyed by file URI). The same artefact is
//! routinely reported more than once — once as a direct declaration and again
//! as a transitive requirement — so the raw lists are collapsed with
//! [`deduplicate`] before they are handed to the dependency-report consumer.
//!
//! A dependency that appears both directly and transitively is reported as
//! direct, regardless of which occurrence was seen first.

mod dedup;
mod record;

pub use self::dedup::deduplicate;
pub use self::record::Dependency;

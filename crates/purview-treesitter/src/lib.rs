//! Tree-sitter backed reference provider for Purview.
//!
//! [`TreeSitterProvider`] is a complete provider built on the Purview
//! framework: it is constructed from normalised configuration, owns a
//! backend session, and exposes two capabilities to the rule engine:
//!
//! - `query` — walks the workspace, parses files whose extension matches the
//!   condition's language, runs a tree-sitter query over each syntax tree,
//!   and reports one incident per capture with the file URI and the matched
//!   node's zero-based span.
//! - `echo` — a minimal round-trip capability used to exercise the dispatch
//!   contract end to end.
//!
//! Parsing runs in-process; the provider keeps a per-session [`ParseCache`]
//! of parsed files, validated by modification time and never evicted —
//! sessions are short-lived analysis runs, so the growth is accepted.

mod cache;
mod echo;
mod language;
mod provider;
mod query;

pub use self::cache::{ParseCache, ParsedFile};
pub use self::echo::{ECHO_CAPABILITY, EchoCondition, EchoSpec};
pub use self::language::LanguageTable;
pub use self::provider::{InProcessBackend, TreeSitterProvider};
pub use self::query::{QUERY_CAPABILITY, QueryCondition, QuerySpec};

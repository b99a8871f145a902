//! shonac-util - Shared compiler infrastructure.
//!
//! This crate carries the pieces every phase of the compiler needs:
//! source location tracking ([`Span`]) and the diagnostic reporting
//! machinery ([`Handler`], [`Diagnostic`], [`Level`]).
//!
//! Diagnostics follow the language's user-facing convention: lexical and
//! syntactic errors are rendered to stderr as `Kukanganisa pa line N: <msg>`
//! the moment they are reported, and are also collected so callers can query
//! `has_errors()` after a phase.

mod diagnostic;
mod span;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use span::Span;

//! Regular expression matching by Brzozowski derivatives.
//!
//! Instead of compiling a regex to an automaton, the matcher differentiates the regex by each
//! char of the input in turn. The derivative of a regex `r` by a char `c` is the regex matching
//! every `w` such that `c w` matches `r`, so the input matches iff the regex left over at the end
//! matches the empty string.
//!
//! ```
//! use brzozowski::{matches, Term};
//!
//! let a_or_b = Term::union(Term::literal('a'), Term::literal('b'));
//! let regex = Term::concat(Term::star(a_or_b), Term::lift("bb"));
//! assert!(matches(&regex, "abbabb"));
//! assert!(!matches(&regex, "abba"));
//! ```
//!
//! [`Term`] is the plain representation. [`TermStore`] hash-conses terms and caches their
//! derivatives, which keeps terms from growing on inputs that would blow them up otherwise.

mod algebra;
mod config;
mod error;
mod matcher;
mod store;
mod term;

pub use config::Config;
pub use error::MatchError;
pub use matcher::{matches, Matcher};
pub use store::{State, TermStore};
pub use term::Term;

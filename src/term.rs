use std::fmt;
use std::mem;
use std::rc::Rc;

/// A regular expression, represented as a term that can be differentiated.
///
/// Sub-terms are reference counted, so a derivative can reuse the parts of its parent that it
/// doesn't change. Terms are never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Matches the empty string, and nothing else.
    Empty,
    /// Matches nothing at all.
    Null,
    /// Matches exactly one occurrence of the char.
    Literal(char),
    /// Matches the first term followed by the second.
    Concat(Rc<Term>, Rc<Term>),
    /// Matches either term.
    Union(Rc<Term>, Rc<Term>),
    /// Matches zero or more repetitions of the term.
    Star(Rc<Term>),
}

impl Term {
    pub fn empty() -> Term {
        Term::Empty
    }

    pub fn null() -> Term {
        Term::Null
    }

    pub fn literal(ch: char) -> Term {
        Term::Literal(ch)
    }

    pub fn concat(first: impl Into<Rc<Term>>, second: impl Into<Rc<Term>>) -> Term {
        Term::Concat(first.into(), second.into())
    }

    pub fn union(left: impl Into<Rc<Term>>, right: impl Into<Rc<Term>>) -> Term {
        Term::Union(left.into(), right.into())
    }

    pub fn star(term: impl Into<Rc<Term>>) -> Term {
        Term::Star(term.into())
    }

    /// The term matching exactly `string`: a right-nested chain of `Concat`s of `Literal`s,
    /// ending in `Empty`.
    pub fn lift(string: &str) -> Term {
        string
            .chars()
            .rev()
            .fold(Term::Empty, |rest, ch| Term::concat(Term::Literal(ch), rest))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Term::Null)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Term::Empty)
    }

    /// Number of nodes in the term tree. Shared sub-terms are counted once per occurrence.
    pub fn size(&self) -> usize {
        let mut size = 0;
        let mut pending = vec![self];
        while let Some(term) = pending.pop() {
            size += 1;
            match term {
                Term::Empty | Term::Null | Term::Literal(_) => (),
                Term::Concat(x, y) | Term::Union(x, y) => {
                    pending.push(x.as_ref());
                    pending.push(y.as_ref());
                }
                Term::Star(x) => pending.push(x.as_ref()),
            }
        }
        size
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut pending = vec![(self, 1)];
        while let Some((term, level)) = pending.pop() {
            depth = depth.max(level);
            match term {
                Term::Empty | Term::Null | Term::Literal(_) => (),
                Term::Concat(x, y) | Term::Union(x, y) => {
                    pending.push((x.as_ref(), level + 1));
                    pending.push((y.as_ref(), level + 1));
                }
                Term::Star(x) => pending.push((x.as_ref(), level + 1)),
            }
        }
        depth
    }

    /// Move out the children that would be freed along with this term.
    fn release_children(&mut self, orphans: &mut Vec<Rc<Term>>) {
        fn release(child: &mut Rc<Term>, orphans: &mut Vec<Rc<Term>>) {
            let compound = matches!(
                **child,
                Term::Concat(_, _) | Term::Union(_, _) | Term::Star(_)
            );
            if compound && Rc::strong_count(child) == 1 {
                orphans.push(mem::replace(child, Rc::new(Term::Empty)));
            }
        }

        match self {
            Term::Empty | Term::Null | Term::Literal(_) => (),
            Term::Concat(x, y) | Term::Union(x, y) => {
                release(x, orphans);
                release(y, orphans);
            }
            Term::Star(x) => release(x, orphans),
        }
    }
}

// Lifted strings nest one level per char, so the default drop glue would recurse that deep.
impl Drop for Term {
    fn drop(&mut self) {
        let mut orphans = Vec::new();
        self.release_children(&mut orphans);
        while let Some(orphan) = orphans.pop() {
            if let Ok(mut term) = Rc::try_unwrap(orphan) {
                term.release_children(&mut orphans);
            }
        }
    }
}

impl From<&str> for Term {
    fn from(string: &str) -> Term {
        Term::lift(string)
    }
}

impl From<char> for Term {
    fn from(ch: char) -> Term {
        Term::Literal(ch)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Empty => write!(f, "ε"),
            Term::Null => write!(f, "∅"),
            Term::Literal(ch) => write!(f, "{}", ch),
            Term::Concat(x, y) => write!(f, "({} {})", x, y),
            Term::Union(x, y) => write!(f, "({} | {})", x, y),
            Term::Star(x) => write!(f, "({})*", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifting() {
        assert_eq!(Term::lift(""), Term::Empty);
        assert_eq!(
            Term::lift("ab"),
            Term::concat(Term::literal('a'), Term::concat(Term::literal('b'), Term::Empty))
        );
        assert_eq!(Term::from("ab"), Term::lift("ab"));
    }

    #[test]
    fn lifting_long_strings() {
        let long = "z".repeat(200_000);
        let term = Term::lift(&long);
        assert_eq!(term.size(), 2 * 200_000 + 1);
        assert_eq!(term.depth(), 200_000 + 1);
        drop(term);
    }

    #[test]
    fn dropping_shared_subterms() {
        let tail = Rc::new(Term::lift(&"z".repeat(200_000)));
        let first = Term::Concat(Rc::new(Term::literal('a')), tail.clone());
        let second = Term::Union(tail.clone(), Rc::new(Term::Null));
        drop(first);
        assert_eq!(Rc::strong_count(&tail), 2);
        drop(second);
        assert_eq!(Rc::strong_count(&tail), 1);
        assert_eq!(tail.size(), 2 * 200_000 + 1);
    }

    #[test]
    fn size_and_depth() {
        let term = Term::union(
            Term::star(Term::literal('a')),
            Term::concat(Term::literal('b'), Term::literal('c')),
        );
        assert_eq!(term.size(), 6);
        assert_eq!(term.depth(), 3);
        assert_eq!(Term::Null.size(), 1);
    }

    #[test]
    fn display() {
        let term = Term::union(
            Term::star(Term::literal('a')),
            Term::concat(Term::literal('b'), Term::Empty),
        );
        assert_eq!(term.to_string(), "((a)* | (b ε))");
        assert_eq!(Term::Null.to_string(), "∅");
    }
}

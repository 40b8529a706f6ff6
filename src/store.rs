//! Hash-consed terms with cached derivatives.
//!
//! Every distinct term is allocated once, so a term can be identified by its address, and the
//! derivative of a term by a char only has to be computed once. Matching then amounts to walking
//! a DFA whose states are built lazily, as the input demands them.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;

use log::{debug, trace, warn};
use typed_arena::Arena;

use crate::algebra::{pop, pop_pair};
use crate::config::Config;
use crate::error::MatchError;
use crate::term::Term;

pub struct TermStore<'a> {
    arena: Arena<Node<'a>>,
    interned: RefCell<HashMap<Contents<'a>, State<'a>>>,
    derivatives: RefCell<HashMap<(State<'a>, char), State<'a>>>,
    cache_hits: Cell<usize>,
    config: Config,
}

/// A term that lives in a [`TermStore`]. States from the same store are equal iff they are the
/// same term, so comparing and hashing them is O(1).
#[derive(Clone, Copy)]
pub struct State<'a>(&'a Node<'a>);

#[derive(Debug)]
struct Node<'a> {
    id: usize,
    nullable: bool,
    contents: Contents<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Contents<'a> {
    Null,
    Empty,
    Literal(char),
    Concat(State<'a>, State<'a>),
    Union(State<'a>, State<'a>),
    Star(State<'a>),
}

impl<'a> State<'a> {
    pub fn is_nullable(self) -> bool {
        self.0.nullable
    }

    pub fn is_null(self) -> bool {
        self.0.contents == Contents::Null
    }

    /// Position of this state in its store's allocation order.
    pub fn id(self) -> usize {
        self.0.id
    }

    /// Copy this state out of its store.
    pub fn to_term(self) -> Term {
        use Contents::*;

        match self.0.contents {
            Null => Term::Null,
            Empty => Term::Empty,
            Literal(ch) => Term::Literal(ch),
            Concat(x, y) => Term::concat(x.to_term(), y.to_term()),
            Union(x, y) => Term::union(x.to_term(), y.to_term()),
            Star(x) => Term::star(x.to_term()),
        }
    }

    fn contents(self) -> Contents<'a> {
        self.0.contents
    }

    fn alternatives(self, alts: &mut Vec<State<'a>>) {
        match self.contents() {
            Contents::Union(x, y) => {
                x.alternatives(alts);
                y.alternatives(alts);
            }
            _ => alts.push(self),
        }
    }
}

impl<'a> PartialEq for State<'a> {
    fn eq(&self, other: &State<'a>) -> bool {
        ptr::eq(self.0, other.0)
    }
}

impl<'a> Eq for State<'a> {}

impl<'a> Hash for State<'a> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0 as *const Node<'a>).hash(state)
    }
}

impl<'a> fmt::Debug for State<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State({}: {})", self.0.id, self)
    }
}

impl<'a> fmt::Display for State<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Contents::*;

        match self.0.contents {
            Null => write!(f, "∅"),
            Empty => write!(f, "ε"),
            Literal(ch) => write!(f, "{}", ch),
            Concat(x, y) => write!(f, "({} {})", x, y),
            Union(x, y) => write!(f, "({} | {})", x, y),
            Star(x) => write!(f, "({})*", x),
        }
    }
}

impl<'a> TermStore<'a> {
    pub fn new() -> TermStore<'a> {
        TermStore::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> TermStore<'a> {
        TermStore {
            arena: Arena::new(),
            interned: RefCell::new(HashMap::new()),
            derivatives: RefCell::new(HashMap::new()),
            cache_hits: Cell::new(0),
            config,
        }
    }

    /// Number of distinct terms allocated so far.
    pub fn states(&self) -> usize {
        self.interned.borrow().len()
    }

    /// Number of (state, char) derivatives computed so far.
    pub fn transitions(&self) -> usize {
        self.derivatives.borrow().len()
    }

    /// How many derivatives were answered from the cache.
    pub fn cache_hits(&self) -> usize {
        self.cache_hits.get()
    }

    /// Does the _entire_ input match `state`? Never fails unless `max_states` is configured.
    pub fn try_matches(&'a self, state: State<'a>, input: &str) -> Result<bool, MatchError> {
        let mut state = state;
        for (position, ch) in input.chars().enumerate() {
            state = self.derive(state, ch);
            trace!("derived at {}: state {}", position, state.id());
            self.check_states(position)?;
            if self.config.short_circuit && state.is_null() {
                debug!("State is null after position {}; rejecting", position);
                return Ok(false);
            }
        }
        debug!(
            "{} states, {} transitions, {} cache hits",
            self.states(),
            self.transitions(),
            self.cache_hits()
        );
        Ok(state.is_nullable())
    }

    /// Like [`TermStore::try_matches`], but takes an ordinary term.
    pub fn matches(&'a self, term: &Term, input: &str) -> Result<bool, MatchError> {
        let state = self.intern(term);
        self.try_matches(state, input)
    }

    fn check_states(&self, position: usize) -> Result<(), MatchError> {
        match self.config.max_states {
            Some(limit) if self.states() > limit => {
                warn!("{} states exceeds limit {}", self.states(), limit);
                Err(MatchError::TooManyStates { position, limit })
            }
            _ => Ok(()),
        }
    }

    /// Bring a term into the store, simplifying it along the way.
    pub fn intern(&'a self, term: &Term) -> State<'a> {
        enum Step<'t> {
            Visit(&'t Term),
            Concat,
            Union,
            Star,
        }

        let mut steps = vec![Step::Visit(term)];
        let mut interned: Vec<State<'a>> = Vec::new();
        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(term) => match term {
                    Term::Empty => interned.push(self.empty()),
                    Term::Null => interned.push(self.null()),
                    Term::Literal(ch) => interned.push(self.literal(*ch)),
                    Term::Concat(x, y) => {
                        steps.push(Step::Concat);
                        steps.push(Step::Visit(y));
                        steps.push(Step::Visit(x));
                    }
                    Term::Union(x, y) => {
                        steps.push(Step::Union);
                        steps.push(Step::Visit(y));
                        steps.push(Step::Visit(x));
                    }
                    Term::Star(x) => {
                        steps.push(Step::Star);
                        steps.push(Step::Visit(x));
                    }
                },
                Step::Concat => {
                    let (x, y) = pop_pair(&mut interned);
                    interned.push(self.concat(x, y));
                }
                Step::Union => {
                    let (x, y) = pop_pair(&mut interned);
                    interned.push(self.union(x, y));
                }
                Step::Star => {
                    let x = pop(&mut interned);
                    interned.push(self.star(x));
                }
            }
        }
        pop(&mut interned)
    }

    /// The derivative of `state` by `ch`, already simplified.
    pub fn derive(&'a self, state: State<'a>, ch: char) -> State<'a> {
        use Contents::*;

        let cached = self.derivatives.borrow().get(&(state, ch)).copied();
        if let Some(deriv) = cached {
            self.cache_hits.set(self.cache_hits.get() + 1);
            return deriv;
        }

        let deriv = match state.contents() {
            Null | Empty => self.null(),
            Literal(c) if c == ch => self.empty(),
            Literal(_) => self.null(),
            Concat(x, y) if x.is_nullable() => {
                self.union(self.concat(self.derive(x, ch), y), self.derive(y, ch))
            }
            Concat(x, y) => self.concat(self.derive(x, ch), y),
            Union(x, y) => self.union(self.derive(x, ch), self.derive(y, ch)),
            Star(x) => self.concat(self.derive(x, ch), state),
        };
        self.derivatives.borrow_mut().insert((state, ch), deriv);
        deriv
    }

    pub fn null(&'a self) -> State<'a> {
        self.make(false, Contents::Null)
    }

    pub fn empty(&'a self) -> State<'a> {
        self.make(true, Contents::Empty)
    }

    pub fn literal(&'a self, ch: char) -> State<'a> {
        self.make(false, Contents::Literal(ch))
    }

    pub fn concat(&'a self, x: State<'a>, y: State<'a>) -> State<'a> {
        use Contents::*;

        match (x.contents(), y.contents()) {
            (Null, _) | (_, Null) => self.null(),
            (Empty, _) => y,
            (_, Empty) => x,
            // Reassociate to the right: (x1 x2 ... xn) y => x1 (x2 (... (xn y)))
            (Concat(_, _), _) => {
                let mut factors = Vec::new();
                let mut rest = x;
                while let Concat(head, tail) = rest.contents() {
                    factors.push(head);
                    rest = tail;
                }
                factors.push(rest);
                factors
                    .into_iter()
                    .rev()
                    .fold(y, |tail, factor| self.concat(factor, tail))
            }
            (_, _) => self.make(x.is_nullable() && y.is_nullable(), Concat(x, y)),
        }
    }

    /// Unions are kept as right-nested lists of alternatives, sorted by id and without
    /// duplicates. Together with `concat`'s reassociation, this is what keeps the number of
    /// derivatives of any term finite.
    pub fn union(&'a self, x: State<'a>, y: State<'a>) -> State<'a> {
        let mut alts = Vec::new();
        x.alternatives(&mut alts);
        y.alternatives(&mut alts);
        alts.retain(|alt| !alt.is_null());
        alts.sort_by_key(|alt| alt.id());
        alts.dedup();

        let mut alts = alts.into_iter().rev();
        let last = match alts.next() {
            Some(last) => last,
            None => return self.null(),
        };
        alts.fold(last, |rest, alt| {
            self.make(
                alt.is_nullable() || rest.is_nullable(),
                Contents::Union(alt, rest),
            )
        })
    }

    pub fn star(&'a self, x: State<'a>) -> State<'a> {
        use Contents::*;

        match x.contents() {
            Null | Empty => self.empty(),
            Star(_) => x,
            _ => self.make(true, Star(x)),
        }
    }

    fn make(&'a self, nullable: bool, contents: Contents<'a>) -> State<'a> {
        let existing = self.interned.borrow().get(&contents).copied();
        if let Some(state) = existing {
            return state;
        }
        let id = self.states();
        let node: &'a Node<'a> = self.arena.alloc(Node {
            id,
            nullable,
            contents,
        });
        let state = State(node);
        self.interned.borrow_mut().insert(contents, state);
        state
    }
}

impl<'a> Default for TermStore<'a> {
    fn default() -> TermStore<'a> {
        TermStore::new()
    }
}

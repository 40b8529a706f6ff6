//! The three operations every term supports: nullability, derivatives, and normalization.
//!
//! All three walk the term with an explicit stack instead of recursing, since a lifted string is
//! as deep as it is long.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::term::Term;

impl Term {
    /// Does this term's language contain the empty string? The answer is itself a term: `Empty`
    /// for yes, `Null` for no.
    pub fn nullable(&self) -> Term {
        if self.is_nullable() {
            Term::Empty
        } else {
            Term::Null
        }
    }

    /// Boolean view of [`Term::nullable`].
    pub fn is_nullable(&self) -> bool {
        enum Step<'t> {
            Eval(&'t Term),
            And(&'t Term),
            Or(&'t Term),
        }

        // `nullable` holds the value of the last term evaluated.
        let mut nullable = false;
        let mut steps = vec![Step::Eval(self)];
        while let Some(step) = steps.pop() {
            match step {
                Step::Eval(term) => match term {
                    Term::Empty | Term::Star(_) => nullable = true,
                    Term::Null | Term::Literal(_) => nullable = false,
                    Term::Concat(x, y) => {
                        steps.push(Step::And(y));
                        steps.push(Step::Eval(x));
                    }
                    Term::Union(x, y) => {
                        steps.push(Step::Or(y));
                        steps.push(Step::Eval(x));
                    }
                },
                Step::And(y) if nullable => steps.push(Step::Eval(y)),
                Step::Or(y) if !nullable => steps.push(Step::Eval(y)),
                Step::And(_) | Step::Or(_) => (),
            }
        }
        nullable
    }

    /// The derivative of this term by `ch`: the term matching every `w` such that `ch w` matches
    /// `self`.
    ///
    /// The result isn't simplified. Follow up with [`Term::normalize`] before deriving again, or
    /// the term grows with every step.
    pub fn derive(&self, ch: char) -> Term {
        enum Step<'t> {
            // Children come with their `Rc`, so that a `Star` can reuse itself.
            Visit(&'t Term, Option<&'t Rc<Term>>),
            Concat { y: &'t Rc<Term>, x_nullable: bool },
            Union,
            Star(Rc<Term>),
        }

        let mut steps = vec![Step::Visit(self, None)];
        let mut derived: Vec<Term> = Vec::new();
        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(term, shared) => match term {
                    Term::Empty | Term::Null => derived.push(Term::Null),
                    Term::Literal(c) if *c == ch => derived.push(Term::Empty),
                    Term::Literal(_) => derived.push(Term::Null),
                    Term::Concat(x, y) => {
                        let x_nullable = x.is_nullable();
                        steps.push(Step::Concat { y, x_nullable });
                        if x_nullable {
                            steps.push(Step::Visit(y, Some(y)));
                        }
                        steps.push(Step::Visit(x, Some(x)));
                    }
                    Term::Union(x, y) => {
                        steps.push(Step::Union);
                        steps.push(Step::Visit(y, Some(y)));
                        steps.push(Step::Visit(x, Some(x)));
                    }
                    Term::Star(x) => {
                        let star = match shared {
                            Some(star) => star.clone(),
                            None => Rc::new(Term::Star(x.clone())),
                        };
                        steps.push(Step::Star(star));
                        steps.push(Step::Visit(x, Some(x)));
                    }
                },
                // Either `x` is skipped over (allowed only if it's nullable) and `ch` starts `y`,
                // or `ch` is consumed inside `x`. When `x` isn't nullable the first branch is
                // `∅ ∅`; the derivative of `y` would be absorbed anyway.
                Step::Concat { y, x_nullable } => {
                    let (dy, skip_x) = if x_nullable {
                        (pop(&mut derived), Term::Empty)
                    } else {
                        (Term::Null, Term::Null)
                    };
                    let dx = pop(&mut derived);
                    derived.push(Term::union(
                        Term::concat(skip_x, dy),
                        Term::concat(dx, y.clone()),
                    ));
                }
                Step::Union => {
                    let (dx, dy) = pop_pair(&mut derived);
                    derived.push(Term::union(dx, dy));
                }
                Step::Star(star) => {
                    let dx = pop(&mut derived);
                    derived.push(Term::concat(dx, star));
                }
            }
        }
        pop(&mut derived)
    }

    /// Simplify using `∅ x = x ∅ = ∅`, `ε x = x ε = x`, and `∅ | x = x | ∅ = x`.
    ///
    /// The checks are structural and made once per node, on the node's children as they are
    /// before they get normalized. This shrinks the terms that `derive` produces, but is not a
    /// minimizer: a term whose language is empty isn't necessarily rewritten to `Null`.
    pub fn normalize(&self) -> Term {
        let root = Rc::new(self.clone());
        let normal = NormalForms::default().normalize(&root);
        drop(root);
        owned(normal)
    }
}

/// Normalizes terms while remembering which terms are already normal, so that normalizing the
/// derivative of a normal term only visits the parts the derivative rebuilt.
///
/// Normalizing is not idempotent, so a remembered term may be left alone even though normalizing
/// it again would shrink it further. Its language is the same either way.
#[derive(Default)]
pub(crate) struct NormalForms {
    // The `Weak` keeps the allocation, and so the address, from being reused.
    known: HashMap<*const Term, Weak<Term>>,
    live: usize,
}

impl NormalForms {
    pub(crate) fn normalize(&mut self, term: &Rc<Term>) -> Rc<Term> {
        enum Step<'t> {
            Visit(&'t Rc<Term>),
            Rebuild(&'t Rc<Term>),
        }

        let mut steps = vec![Step::Visit(term)];
        let mut normal: Vec<Rc<Term>> = Vec::new();
        while let Some(step) = steps.pop() {
            match step {
                Step::Visit(term) if self.known.contains_key(&Rc::as_ptr(term)) => {
                    normal.push(term.clone())
                }
                Step::Visit(term) => match &**term {
                    Term::Empty | Term::Null | Term::Literal(_) => {
                        normal.push(self.remember(term.clone()))
                    }
                    Term::Concat(x, y) if x.is_null() || y.is_null() => {
                        normal.push(self.remember(Rc::new(Term::Null)))
                    }
                    Term::Concat(x, y) if y.is_empty() => steps.push(Step::Visit(x)),
                    Term::Concat(x, y) if x.is_empty() => steps.push(Step::Visit(y)),
                    Term::Union(x, y) if y.is_null() => steps.push(Step::Visit(x)),
                    Term::Union(x, y) if x.is_null() => steps.push(Step::Visit(y)),
                    Term::Concat(x, y) | Term::Union(x, y) => {
                        steps.push(Step::Rebuild(term));
                        steps.push(Step::Visit(y));
                        steps.push(Step::Visit(x));
                    }
                    Term::Star(x) => {
                        steps.push(Step::Rebuild(term));
                        steps.push(Step::Visit(x));
                    }
                },
                Step::Rebuild(term) => {
                    let rebuilt = match &**term {
                        Term::Concat(x, y) => {
                            let (nx, ny) = pop_pair(&mut normal);
                            if Rc::ptr_eq(x, &nx) && Rc::ptr_eq(y, &ny) {
                                term.clone()
                            } else {
                                Rc::new(Term::Concat(nx, ny))
                            }
                        }
                        Term::Union(x, y) => {
                            let (nx, ny) = pop_pair(&mut normal);
                            if Rc::ptr_eq(x, &nx) && Rc::ptr_eq(y, &ny) {
                                term.clone()
                            } else {
                                Rc::new(Term::Union(nx, ny))
                            }
                        }
                        Term::Star(x) => {
                            let nx = pop(&mut normal);
                            if Rc::ptr_eq(x, &nx) {
                                term.clone()
                            } else {
                                Rc::new(Term::Star(nx))
                            }
                        }
                        Term::Empty | Term::Null | Term::Literal(_) => term.clone(),
                    };
                    normal.push(self.remember(rebuilt));
                }
            }
        }
        pop(&mut normal)
    }

    /// Drop the entries for terms that no longer exist, once there are enough of them.
    pub(crate) fn forget_dropped(&mut self) {
        if self.known.len() > 2 * self.live.max(1024) {
            self.known.retain(|_, term| term.strong_count() > 0);
            self.live = self.known.len();
        }
    }

    fn remember(&mut self, term: Rc<Term>) -> Rc<Term> {
        self.known.insert(Rc::as_ptr(&term), Rc::downgrade(&term));
        term
    }
}

fn owned(term: Rc<Term>) -> Term {
    Rc::try_unwrap(term).unwrap_or_else(|term| (*term).clone())
}

pub(crate) fn pop<T>(operands: &mut Vec<T>) -> T {
    operands.pop().expect("operand stack underflow")
}

/// Pops the operands pushed for `x` and then `y`.
pub(crate) fn pop_pair<T>(operands: &mut Vec<T>) -> (T, T) {
    let y = pop(operands);
    let x = pop(operands);
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(ch: char) -> Term {
        Term::literal(ch)
    }

    #[test]
    fn nullable() {
        assert_eq!(Term::Empty.nullable(), Term::Empty);
        assert_eq!(Term::Null.nullable(), Term::Null);
        assert_eq!(lit('a').nullable(), Term::Null);
        assert_eq!(Term::star(lit('a')).nullable(), Term::Empty);
        assert_eq!(Term::star(Term::Null).nullable(), Term::Empty);

        assert_eq!(Term::concat(Term::Empty, Term::Empty).nullable(), Term::Empty);
        assert_eq!(Term::concat(Term::Empty, lit('a')).nullable(), Term::Null);
        assert_eq!(Term::concat(lit('a'), Term::Empty).nullable(), Term::Null);

        assert_eq!(Term::union(Term::Empty, lit('a')).nullable(), Term::Empty);
        assert_eq!(Term::union(lit('a'), Term::Empty).nullable(), Term::Empty);
        assert_eq!(Term::union(lit('a'), lit('b')).nullable(), Term::Null);
    }

    #[test]
    fn nullable_is_idempotent() {
        let terms = vec![
            Term::Empty,
            Term::Null,
            lit('a'),
            Term::lift("abc"),
            Term::star(Term::concat(lit('a'), lit('b'))),
            Term::union(Term::Null, Term::star(lit('a'))),
        ];
        for term in terms {
            assert_eq!(term.nullable().nullable(), term.nullable());
        }
    }

    #[test]
    fn derive_atoms() {
        assert_eq!(Term::Empty.derive('a'), Term::Null);
        assert_eq!(Term::Null.derive('a'), Term::Null);
        assert_eq!(lit('a').derive('a'), Term::Empty);
        assert_eq!(lit('a').derive('b'), Term::Null);
    }

    #[test]
    fn derive_compound() {
        let ab = Term::concat(lit('a'), lit('b'));
        assert_eq!(
            ab.derive('a'),
            Term::union(
                Term::concat(Term::Null, Term::Null),
                Term::concat(Term::Empty, lit('b')),
            )
        );

        let a_or_b = Term::union(lit('a'), lit('b'));
        assert_eq!(a_or_b.derive('b'), Term::union(Term::Null, Term::Empty));

        let a_star = Term::star(lit('a'));
        assert_eq!(a_star.derive('a'), Term::concat(Term::Empty, a_star.clone()));
    }

    #[test]
    fn derive_shares_unchanged_subterms() {
        let tail = Rc::new(Term::lift("bcd"));
        let term = Term::Concat(Rc::new(lit('a')), tail.clone());
        match &term.derive('a') {
            Term::Union(_, right) => match &**right {
                Term::Concat(_, kept) => assert!(Rc::ptr_eq(kept, &tail)),
                other => panic!("unexpected term {}", other),
            },
            other => panic!("unexpected term {}", other),
        }
    }

    #[test]
    fn derive_reuses_shared_stars() {
        let star = Rc::new(Term::star(lit('a')));
        let term = Term::Union(star.clone(), Rc::new(lit('b')));
        match &term.derive('a') {
            Term::Union(left, _) => match &**left {
                Term::Concat(_, again) => assert!(Rc::ptr_eq(again, &star)),
                other => panic!("unexpected term {}", other),
            },
            other => panic!("unexpected term {}", other),
        }
    }

    #[test]
    fn normalize() {
        let a = lit('a');
        assert_eq!(Term::concat(Term::Null, a.clone()).normalize(), Term::Null);
        assert_eq!(Term::concat(a.clone(), Term::Null).normalize(), Term::Null);
        assert_eq!(Term::concat(a.clone(), Term::Empty).normalize(), a);
        assert_eq!(Term::concat(Term::Empty, a.clone()).normalize(), a);
        assert_eq!(Term::union(a.clone(), Term::Null).normalize(), a);
        assert_eq!(Term::union(Term::Null, a.clone()).normalize(), a);
        assert_eq!(
            Term::star(Term::concat(Term::Empty, a.clone())).normalize(),
            Term::star(a.clone())
        );
        assert_eq!(Term::Empty.normalize(), Term::Empty);
        assert_eq!(Term::Null.normalize(), Term::Null);
        assert_eq!(a.normalize(), a);
    }

    #[test]
    fn normalize_is_structural() {
        // The children are only inspected before they get normalized.
        let hidden_null = Term::concat(Term::union(Term::Null, Term::Null), lit('a'));
        assert_eq!(hidden_null.normalize(), Term::concat(Term::Null, lit('a')));
    }

    #[test]
    fn normalize_after_derive() {
        let ab = Term::concat(lit('a'), lit('b'));
        let d = ab.derive('a').normalize();
        assert_eq!(d, Term::union(Term::Null, lit('b')));
        assert_eq!(d.derive('b').normalize(), Term::Empty);

        let a_star = Term::star(lit('a'));
        assert_eq!(a_star.derive('a').normalize(), a_star);
        assert_eq!(a_star.derive('b').normalize(), Term::Null);
    }

    #[test]
    fn deep_terms() {
        let long = Term::lift(&"ab".repeat(50_000));
        assert!(!long.is_nullable());

        // ∅ | b a b ... b
        let rest = long.derive('a').normalize();
        assert_eq!(rest.size(), 2 * 100_000 - 1);
        match &rest {
            Term::Union(x, y) => {
                assert!(x.is_null());
                assert!(matches!(**y, Term::Concat(_, _)));
            }
            other => panic!("unexpected term of size {}", other.size()),
        }
    }

    #[test]
    fn remembered_terms_are_not_revisited() {
        let mut forms = NormalForms::default();
        let tail = forms.normalize(&Rc::new(Term::lift("bcd")));
        assert_eq!(*tail, Term::concat(lit('b'), Term::concat(lit('c'), lit('d'))));

        let again = forms.normalize(&Rc::new(Term::concat(Term::Empty, tail.clone())));
        assert!(Rc::ptr_eq(&again, &tail));

        let star = Rc::new(Term::star(lit('a')));
        let same = forms.normalize(&star);
        assert!(Rc::ptr_eq(&same, &star));
    }
}

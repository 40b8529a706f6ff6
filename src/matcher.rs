use std::convert::Infallible;
use std::rc::Rc;

use log::{debug, log_enabled, trace, warn, Level};

use crate::algebra::NormalForms;
use crate::config::Config;
use crate::error::MatchError;
use crate::term::Term;

/// Does the _entire_ input match `term`?
///
/// Derives by each char in turn, normalizing after every step, and checks whether the final term
/// is nullable. Bails out early once the term becomes `Null`.
pub fn matches(term: &Term, input: &str) -> bool {
    let unlimited = |_: &Term, _: usize| Ok::<(), Infallible>(());
    match drive(term, input, true, unlimited) {
        Ok(matched) => matched,
        Err(never) => match never {},
    }
}

/// A matcher with resource limits. See [`Config`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    config: Config,
}

impl Matcher {
    pub fn new(config: Config) -> Matcher {
        Matcher { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Like [`matches`], but fails with [`MatchError::TermTooLarge`] if the working term
    /// outgrows `config.max_term_size`.
    pub fn try_matches(&self, term: &Term, input: &str) -> Result<bool, MatchError> {
        drive(term, input, self.config.short_circuit, |term, position| {
            self.check_size(term, position)
        })
    }

    fn check_size(&self, term: &Term, position: usize) -> Result<(), MatchError> {
        let limit = match self.config.max_term_size {
            Some(limit) => limit,
            None => return Ok(()),
        };
        let size = term.size();
        if size > limit {
            warn!("Term size {} exceeds limit {}", size, limit);
            return Err(MatchError::TermTooLarge {
                position,
                size,
                limit,
            });
        }
        Ok(())
    }
}

/// The matching loop. `check` runs on the working term after every step.
fn drive<E>(
    term: &Term,
    input: &str,
    short_circuit: bool,
    mut check: impl FnMut(&Term, usize) -> Result<(), E>,
) -> Result<bool, E> {
    let mut forms = NormalForms::default();
    let mut term = Rc::new(term.clone());
    for (position, ch) in input.chars().enumerate() {
        let derived = Rc::new(term.derive(ch));
        term = forms.normalize(&derived);
        drop(derived);
        forms.forget_dropped();

        if log_enabled!(Level::Trace) {
            trace!("derived at {}: {} nodes", position, term.size());
        }
        check(term.as_ref(), position)?;
        if short_circuit && term.is_null() {
            debug!("Term is null after position {}; rejecting", position);
            return Ok(false);
        }
    }
    Ok(term.is_nullable())
}

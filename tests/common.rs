#![allow(dead_code)]

use brzozowski::Term;

pub fn lit(ch: char) -> Term {
    Term::literal(ch)
}

/// Every string over `alphabet` of length at most `max_len`, shortest first.
pub fn strings(alphabet: &[char], max_len: usize) -> Vec<String> {
    let mut all = vec![String::new()];
    let mut last = vec![String::new()];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for prefix in &last {
            for ch in alphabet {
                let mut s = prefix.clone();
                s.push(*ch);
                next.push(s);
            }
        }
        all.extend(next.iter().cloned());
        last = next;
    }
    all
}

/// Terms over `a` and `b` up to two levels of nesting.
pub fn terms() -> Vec<Term> {
    let atoms = vec![Term::Empty, Term::Null, lit('a'), lit('b')];
    let mut terms = atoms.clone();
    terms.extend(combine(&atoms));
    let level_one = terms.clone();
    terms.extend(combine(&level_one).into_iter().step_by(7));
    terms
}

fn combine(terms: &[Term]) -> Vec<Term> {
    let mut combined = Vec::new();
    for x in terms {
        combined.push(Term::star(x.clone()));
        for y in terms {
            combined.push(Term::concat(x.clone(), y.clone()));
            combined.push(Term::union(x.clone(), y.clone()));
        }
    }
    combined
}

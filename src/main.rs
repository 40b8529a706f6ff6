use std::env;

use brzozowski::{matches, Term};

/// Prints whether `x` matches the regex `x`, or with two arguments, whether the second matches
/// the first taken literally.
fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (regex, input) = match args.as_slice() {
        [literal, input] => (Term::lift(literal), input.as_str()),
        _ => (Term::literal('x'), "x"),
    };
    println!("{}", matches(&regex, input));
}

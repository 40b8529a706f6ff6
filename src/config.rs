/// Knobs for [`Matcher`](crate::Matcher) and [`TermStore`](crate::TermStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Stop as soon as the working term is `Null`, since nothing can match after that.
    pub short_circuit: bool,
    /// Fail once the working term has more nodes than this.
    pub max_term_size: Option<usize>,
    /// Fail once a store holds more distinct terms than this.
    pub max_states: Option<usize>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            short_circuit: true,
            max_term_size: None,
            max_states: None,
        }
    }
}

impl Config {
    pub fn with_short_circuit(mut self, short_circuit: bool) -> Config {
        self.short_circuit = short_circuit;
        self
    }

    pub fn with_max_term_size(mut self, limit: usize) -> Config {
        self.max_term_size = Some(limit);
        self
    }

    pub fn with_max_states(mut self, limit: usize) -> Config {
        self.max_states = Some(limit);
        self
    }
}

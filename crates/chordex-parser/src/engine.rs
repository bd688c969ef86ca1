//! Grammar-agnostic, restartable parser driver.

use chordex_common::ParseError;

/// An incremental grammar.
///
/// The grammar owns no mutable state itself: everything a parse accumulates
/// lives in `State`, which the [`Parser`] snapshots and restores.
pub trait Grammar {
    type State: Clone;
    type Output: Clone;

    /// State before any fragment has been fed.
    fn start(&self) -> Self::State;

    /// Feed one fragment. On `Err` the state may be left half-updated; the
    /// parser restores a checkpoint before reusing it.
    fn feed(&self, state: &mut Self::State, fragment: &str) -> Result<(), ParseError>;

    /// Complete parses of everything fed so far. Ambiguous grammars may return
    /// several; callers take the first.
    fn results(&self, state: &Self::State) -> Vec<Self::Output>;
}

/// Opaque snapshot of parser state.
#[derive(Debug, Clone)]
pub struct ParserCheckpoint<S>(S);

pub struct Parser<G: Grammar> {
    grammar: G,
    state: G::State,
    initial: ParserCheckpoint<G::State>,
}

impl<G: Grammar> Parser<G> {
    pub fn new(grammar: G) -> Self {
        let state = grammar.start();
        let initial = ParserCheckpoint(state.clone());
        Self {
            grammar,
            state,
            initial,
        }
    }

    pub fn grammar(&self) -> &G {
        &self.grammar
    }

    pub fn save(&self) -> ParserCheckpoint<G::State> {
        ParserCheckpoint(self.state.clone())
    }

    pub fn restore(&mut self, checkpoint: &ParserCheckpoint<G::State>) {
        self.state = checkpoint.0.clone();
    }

    /// Return to the state taken before any fragment was fed.
    pub fn reset(&mut self) {
        self.state = self.initial.0.clone();
    }

    pub fn feed(&mut self, fragment: &str) -> Result<(), ParseError> {
        self.grammar.feed(&mut self.state, fragment)
    }

    pub fn results(&self) -> Vec<G::Output> {
        self.grammar.results(&self.state)
    }

    /// Feed `input` fragment by fragment until the grammar rejects one.
    ///
    /// Returns the most recent complete result and the fragments it does not
    /// cover. Fails with [`ParseError::NoResult`] when no fragment ever
    /// produced a result. The parser is reset in every case.
    pub fn feed_until_error<'i, S: AsRef<str>>(
        &mut self,
        input: &'i [S],
    ) -> Result<(G::Output, &'i [S]), ParseError> {
        let mut last: Option<(G::Output, usize)> = None;
        let mut failure: Option<ParseError> = None;

        for (i, fragment) in input.iter().enumerate() {
            if let Err(e) = self.grammar.feed(&mut self.state, fragment.as_ref()) {
                failure = Some(e);
                break;
            }
            if let Some(result) = self.grammar.results(&self.state).into_iter().next() {
                last = Some((result, i + 1));
            }
        }

        self.reset();

        match last {
            Some((result, end)) => Ok((result, &input[end..])),
            None => Err(ParseError::NoResult(match failure {
                Some(e) => e.to_string(),
                None => "input ended before a complete parse".into(),
            })),
        }
    }

    /// Character-granular convenience over [`Parser::feed_until_error`].
    pub fn feed_chars_until_error(&mut self, input: &str) -> Result<(G::Output, String), ParseError> {
        let chars: Vec<String> = input.chars().map(String::from).collect();
        let (result, rest) = self.feed_until_error(&chars)?;
        Ok((result, rest.concat()))
    }
}

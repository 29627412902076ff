//! Splits a console line into words.
//!
//! Words are separated by spaces or tabs. Single and double quotes group
//! text containing whitespace (`reset --position "(1, 2)"`) and may be
//! glued to unquoted text, as in a shell: `a"b c"d` is the single word `ab cd`.

pub use crate::error::LexingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
        }
    }

    /// Runs the machine over the whole input.
    ///
    /// Fails with [`LexingError::UnfinishedQuote`] when the line ends inside quotes.
    fn make_words(&mut self) -> Result<Vec<String>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch),
                LexingState::ReadingWord => self.handle_word(ch, &mut out),
                LexingState::ReadingSingleQuote => self.handle_quoted(ch, '\''),
                LexingState::ReadingDoubleQuote => self.handle_quoted(ch, '"'),
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote | LexingState::ReadingDoubleQuote => {
                return Err(LexingError::UnfinishedQuote);
            }
            LexingState::ReadingWord => out.push(std::mem::take(&mut self.buffer)),
            LexingState::Start => {}
        }

        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_start(&mut self, ch: char) {
        match ch {
            ' ' | '\t' => {}
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) {
        match ch {
            ' ' | '\t' => {
                out.push(std::mem::take(&mut self.buffer));
                self.state = LexingState::Start;
            }
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            c => self.buffer.push(c),
        }
    }

    fn handle_quoted(&mut self, ch: char, quote: char) {
        if ch == quote {
            // Closing quote; whatever follows continues the same word.
            self.state = LexingState::ReadingWord;
        } else {
            self.buffer.push(ch);
        }
    }
}

/// Split `line` into words, honoring quotes.
pub fn split_into_words(line: &str) -> Result<Vec<String>, LexingError> {
    LexingFSM::new(line).make_words()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        split_into_words(line).unwrap()
    }

    #[test]
    fn test_plain_words() {
        assert_eq!(words("move  FFRL\t--json "), ["move", "FFRL", "--json"]);
    }

    #[test]
    fn test_blank_line() {
        assert!(words("   \t ").is_empty());
        assert!(words("").is_empty());
    }

    #[test]
    fn test_quotes_keep_whitespace() {
        assert_eq!(
            words(r#"reset --position "(1, -2)" --direction 'SOUTH'"#),
            ["reset", "--position", "(1, -2)", "--direction", "SOUTH"]
        );
    }

    #[test]
    fn test_quotes_glue_to_neighbours() {
        assert_eq!(words(r#"a"b c"d 'x'y"#), ["ab cd", "xy"]);
    }

    #[test]
    fn test_empty_quotes_make_empty_word() {
        assert_eq!(words(r#"move """#), ["move", ""]);
    }

    #[test]
    fn test_other_quote_is_literal_inside_quotes() {
        assert_eq!(words(r#""it's""#), ["it's"]);
    }

    #[test]
    fn test_unfinished_quote() {
        assert_eq!(
            split_into_words("move \"FF"),
            Err(LexingError::UnfinishedQuote)
        );
        assert_eq!(
            split_into_words("move 'FF"),
            Err(LexingError::UnfinishedQuote)
        );
    }
}

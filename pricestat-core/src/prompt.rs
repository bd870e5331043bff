//! Operator interaction: line prompts, yes/no questions, and the interactive
//! ticker source.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::debug;

/// Keyword that ends interactive ticker entry.
pub const STOP_KEYWORD: &str = "STOP";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("operator input closed")]
    Closed,

    #[error("failed to read operator input: {0}")]
    Io(#[from] io::Error),
}

/// Someone answering prompts. Blocks until an answer arrives.
pub trait Operator {
    /// Show `prompt` and return the operator's answer without the line ending.
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError>;

    /// Show a message that needs no answer.
    fn tell(&mut self, message: &str);
}

/// Operator on a line-based reader/writer pair, normally stdin/stdout.
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl ConsoleOperator<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PromptError::Closed);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn tell(&mut self, message: &str) {
        // Console sink; a broken stdout is not worth failing the run over.
        let _ = writeln!(self.output, "{message}");
    }
}

/// Operator that replays canned answers and records everything shown to it.
///
/// Runs out of answers the same way a closed stdin does.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: VecDeque<String>,
    pub prompts: Vec<String>,
    pub messages: Vec<String>,
}

impl ScriptedOperator {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Operator for ScriptedOperator {
    fn ask(&mut self, prompt: &str) -> Result<String, PromptError> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().ok_or(PromptError::Closed)
    }

    fn tell(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Ask until the first character of the answer is `y` or `n` (any case).
pub fn ask_yes_no<O: Operator + ?Sized>(operator: &mut O, question: &str) -> Result<bool, PromptError> {
    loop {
        let answer = operator.ask(question)?;
        match answer.trim_start().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('y') => return Ok(true),
            Some('n') => return Ok(false),
            _ => operator.tell("Invalid response, please answer y or n."),
        }
    }
}

/// Interactive ticker source: prompts until the operator types `STOP`.
///
/// Closed input ends the sequence the same way `STOP` does. Blank answers are
/// re-prompted.
pub struct TickerPrompt<'a, O: Operator + ?Sized> {
    operator: &'a mut O,
    done: bool,
}

impl<'a, O: Operator + ?Sized> TickerPrompt<'a, O> {
    pub fn new(operator: &'a mut O) -> Self {
        Self {
            operator,
            done: false,
        }
    }
}

impl<O: Operator + ?Sized> Iterator for TickerPrompt<'_, O> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while !self.done {
            match self
                .operator
                .ask("Enter a ticker symbol (STOP to finish): ")
            {
                Ok(answer) => {
                    let answer = answer.trim();
                    if answer.eq_ignore_ascii_case(STOP_KEYWORD) {
                        self.done = true;
                    } else if !answer.is_empty() {
                        return Some(answer.to_string());
                    }
                }
                Err(e) => {
                    debug!(error = %e, "ticker input ended");
                    self.done = true;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_no_reprompts_until_valid() {
        let mut op = ScriptedOperator::new(["", "maybe", "Yes please"]);
        assert!(ask_yes_no(&mut op, "Overwrite? ").unwrap());
        assert_eq!(op.prompts.len(), 3);
        assert_eq!(op.messages.len(), 2);
        assert!(op.messages.iter().all(|m| m.starts_with("Invalid response")));
    }

    #[test]
    fn yes_no_accepts_uppercase_n() {
        let mut op = ScriptedOperator::new(["NOPE"]);
        assert!(!ask_yes_no(&mut op, "? ").unwrap());
    }

    #[test]
    fn yes_no_on_closed_input_errors() {
        let mut op = ScriptedOperator::new(Vec::<String>::new());
        assert!(matches!(ask_yes_no(&mut op, "? "), Err(PromptError::Closed)));
    }

    #[test]
    fn ticker_prompt_stops_on_keyword_case_insensitive() {
        let mut op = ScriptedOperator::new(["msft", "  ", "aapl", "stop", "never"]);
        let tickers: Vec<String> = TickerPrompt::new(&mut op).collect();
        assert_eq!(tickers, vec!["msft", "aapl"]);
        assert_eq!(op.remaining(), 1);
    }

    #[test]
    fn ticker_prompt_ends_on_closed_input() {
        let mut op = ScriptedOperator::new(["tsla"]);
        let tickers: Vec<String> = TickerPrompt::new(&mut op).collect();
        assert_eq!(tickers, vec!["tsla"]);
    }

    #[test]
    fn console_operator_reads_lines_and_writes_prompts() {
        let input = io::Cursor::new(b"msft\r\nn\n".to_vec());
        let mut output = Vec::new();
        {
            let mut op = ConsoleOperator::new(input, &mut output);
            assert_eq!(op.ask("Ticker: ").unwrap(), "msft");
            assert_eq!(op.ask("Again? ").unwrap(), "n");
            assert!(matches!(op.ask("More? "), Err(PromptError::Closed)));
            op.tell("bye");
        }
        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown, "Ticker: Again? More? bye\n");
    }
}

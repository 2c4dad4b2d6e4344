use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};

use crate::styles as s;

/// The operator's side of the session.
///
/// Every checkpoint of the workflow suspends inside [`Prompter::ask`]; nothing
/// else runs until it returns.
pub trait Prompter {
    /// Shows a line of output.
    fn say(&mut self, line: &str);

    /// Shows `question` and blocks until the operator answers.
    /// The answer is returned with surrounding whitespace removed.
    fn ask(&mut self, question: &str) -> Result<String>;

    /// Shows a section heading.
    fn heading(&mut self, title: &str) {
        self.say(title);
    }
}

/// Prompts on stdout and reads answers from stdin.
pub struct TerminalPrompter<R> {
    input: R,
}

impl TerminalPrompter<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> TerminalPrompter<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> Prompter for TerminalPrompter<R> {
    fn say(&mut self, line: &str) {
        println!("{line}");
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        print!("{question}");
        io::stdout().flush().context("failed to flush prompt")?;

        let mut answer = String::new();
        let read = self
            .input
            .read_line(&mut answer)
            .context("failed to read operator input")?;
        if read == 0 {
            bail!("input closed while waiting for an answer to '{}'", question.trim());
        }
        Ok(answer.trim().to_string())
    }

    fn heading(&mut self, title: &str) {
        println!("{}{title}{}", s::HEADER.render(), s::HEADER.render_reset());
    }
}

/// Answers prompts from a fixed script and records the exchange.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: std::collections::VecDeque<String>,
    pub transcript: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.transcript.iter().filter(|l| l.contains(needle)).count()
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn say(&mut self, line: &str) {
        self.transcript.push(line.to_string());
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        self.transcript.push(question.to_string());
        match self.answers.pop_front() {
            Some(answer) => Ok(answer.trim().to_string()),
            None => bail!("unexpected prompt: {question}"),
        }
    }
}

//! Interactive questions asked before any file is touched

use std::io::{self, BufRead, Write};

use colored::Colorize;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{EncUtilError, Result};

/// Source of passwords and answers for the operations.
pub trait Prompt {
    /// Ask once for an existing password.
    fn password(&mut self) -> Result<SecretString>;

    /// Ask for a new password twice, repeating until both entries match.
    fn new_password(&mut self) -> Result<SecretString>;

    /// Ask a yes/no question, accepting only `y` or `n`.
    fn yes_no(&mut self, question: &str) -> Result<bool>;
}

/// Prompts on the controlling terminal with hidden password entry.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

fn hidden(label: &str) -> Result<SecretString> {
    Ok(SecretString::new(rpassword::prompt_password(label)?))
}

impl Prompt for TerminalPrompt {
    fn password(&mut self) -> Result<SecretString> {
        hidden("Password: ")
    }

    fn new_password(&mut self) -> Result<SecretString> {
        ask_new_password(hidden, &mut io::stdout())
    }

    fn yes_no(&mut self, question: &str) -> Result<bool> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        ask_yes_no(&mut stdin.lock(), &mut stdout.lock(), question)
    }
}

/// Read a password and its confirmation through `read` until both agree.
pub fn ask_new_password<F, W>(mut read: F, output: &mut W) -> Result<SecretString>
where
    F: FnMut(&str) -> Result<SecretString>,
    W: Write,
{
    loop {
        let password = read("Password: ")?;
        let confirm = read("Enter it again: ")?;
        if password.expose_secret() == confirm.expose_secret() {
            return Ok(password);
        }
        writeln!(output, "{}", "The passwords didn't match. Try again.".red())?;
    }
}

/// Ask `question` on `output` until `input` yields a line that is exactly `y` or `n`.
pub fn ask_yes_no<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    loop {
        write!(output, "{} [y/n]? ", question)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(EncUtilError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no answer given",
            )));
        }

        match line.trim_end_matches(['\r', '\n']) {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => writeln!(output, "Please answer 'y' or 'n'.")?,
        }
    }
}

/// Replays canned answers; every unexpected question is an error.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedPrompt {
    pub passwords: std::collections::VecDeque<&'static str>,
    pub answers: std::collections::VecDeque<bool>,
    pub asked: usize,
}

#[cfg(test)]
impl ScriptedPrompt {
    pub fn with_passwords(passwords: &[&'static str]) -> Self {
        Self {
            passwords: passwords.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn answering(mut self, answer: bool) -> Self {
        self.answers.push_back(answer);
        self
    }

    fn next_password(&mut self) -> Result<SecretString> {
        self.asked += 1;
        self.passwords
            .pop_front()
            .map(|p| SecretString::new(p.to_string()))
            .ok_or_else(|| EncUtilError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "no password scripted")))
    }
}

#[cfg(test)]
impl Prompt for ScriptedPrompt {
    fn password(&mut self) -> Result<SecretString> {
        self.next_password()
    }

    fn new_password(&mut self) -> Result<SecretString> {
        self.next_password()
    }

    fn yes_no(&mut self, _question: &str) -> Result<bool> {
        self.asked += 1;
        self.answers
            .pop_front()
            .ok_or_else(|| EncUtilError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "no answer scripted")))
    }
}

//! Choosing which repositories a run targets.

use std::collections::{BTreeSet, HashSet};
use std::io::{BufRead, BufReader, Stdin, Stderr, Write};

use crate::error::{BranchSyncError, Result};
use crate::github::Repository;

/// One entry offered by the interactive chooser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
}

/// Interactive multi-select capability.
pub trait RepoPrompt {
    /// Offer `choices` and return the indices picked.
    ///
    /// Returns [`BranchSyncError::SelectionCancelled`] if the user backs out.
    fn choose(&mut self, choices: &[Choice]) -> Result<Vec<usize>>;
}

/// The repositories a run will act on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Chosen repositories, in listing order.
    pub chosen: Vec<Repository>,
    /// Requested names that matched no repository, in the order given.
    pub missing: Vec<String>,
}

/// Pick repositories by exact, case-sensitive name.
///
/// Duplicate names select a repository once. Each unmatched name is reported
/// once in `missing`.
pub fn select_named(repos: &[Repository], names: &[String]) -> Selection {
    let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
    let chosen: Vec<Repository> = repos
        .iter()
        .filter(|r| wanted.contains(r.name.as_str()))
        .cloned()
        .collect();

    let known: HashSet<&str> = repos.iter().map(|r| r.name.as_str()).collect();
    let mut seen = HashSet::new();
    let missing = names
        .iter()
        .filter(|n| !known.contains(n.as_str()) && seen.insert(n.as_str()))
        .cloned()
        .collect();

    Selection { chosen, missing }
}

/// Let the user pick from every repository.
pub fn select_interactive<P: RepoPrompt + ?Sized>(
    repos: &[Repository],
    prompt: &mut P,
) -> Result<Selection> {
    let choices: Vec<Choice> = repos
        .iter()
        .map(|r| Choice { label: r.label() })
        .collect();

    let picked: BTreeSet<usize> = prompt
        .choose(&choices)?
        .into_iter()
        .filter(|&i| i < repos.len())
        .collect();

    Ok(Selection {
        chosen: picked.into_iter().map(|i| repos[i].clone()).collect(),
        missing: Vec::new(),
    })
}

/// Produce the working set: by name when names are given, interactively otherwise.
pub fn select<P: RepoPrompt + ?Sized>(
    repos: &[Repository],
    names: &[String],
    prompt: &mut P,
) -> Result<Selection> {
    if names.is_empty() {
        select_interactive(repos, prompt)
    } else {
        Ok(select_named(repos, names))
    }
}

/// Line-oriented chooser: lists numbered choices and reads one answer.
///
/// Accepted answers: `1,3`, ranges like `2-5`, `all` or `*`, an empty line
/// for nothing, and `q`, `quit` or end of input to cancel.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompt<BufReader<Stdin>, Stderr> {
    /// Prompt on the terminal. Choices are written to stderr so stdout
    /// stays reserved for the report.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> RepoPrompt for LinePrompt<R, W> {
    fn choose(&mut self, choices: &[Choice]) -> Result<Vec<usize>> {
        if choices.is_empty() {
            writeln!(self.output, "No repositories available.")?;
            return Ok(Vec::new());
        }

        for (i, choice) in choices.iter().enumerate() {
            writeln!(self.output, "{:>4}) {}", i + 1, choice.label)?;
        }

        loop {
            write!(
                self.output,
                "Select repositories (e.g. 1,3,5-7 | all | q to cancel): "
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(BranchSyncError::SelectionCancelled);
            }

            match parse_answer(&line, choices.len()) {
                Ok(Answer::Cancel) => return Err(BranchSyncError::SelectionCancelled),
                Ok(Answer::Pick(indices)) => return Ok(indices),
                Err(message) => writeln!(self.output, "{}", message)?,
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Answer {
    Cancel,
    Pick(Vec<usize>),
}

fn parse_answer(input: &str, count: usize) -> std::result::Result<Answer, String> {
    let input = input.trim();
    match input.to_ascii_lowercase().as_str() {
        "q" | "quit" => return Ok(Answer::Cancel),
        "all" | "*" => return Ok(Answer::Pick((0..count).collect())),
        _ => {}
    }

    let mut picked = BTreeSet::new();
    for token in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let (start, end) = match token.split_once('-') {
            Some((from, to)) => (parse_index(from, count)?, parse_index(to, count)?),
            None => {
                let i = parse_index(token, count)?;
                (i, i)
            }
        };
        if start > end {
            return Err(format!("invalid range '{}'", token));
        }
        picked.extend(start..=end);
    }

    Ok(Answer::Pick(picked.into_iter().collect()))
}

/// Parse a 1-based choice number into an index.
fn parse_index(text: &str, count: usize) -> std::result::Result<usize, String> {
    let n: usize = text
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", text))?;
    if n == 0 || n > count {
        return Err(format!("{} is out of range (1-{})", n, count));
    }
    Ok(n - 1)
}

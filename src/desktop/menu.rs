//! Numbered desktop menu on the terminal

use std::io::{self, BufRead, Write};

use super::selector::{DesktopPresenter, SelectionError, SelectionMode};
use super::DesktopSelection;

const MAX_ATTEMPTS: usize = 3;

/// Menu reading answers from `input` and drawing on `output`
pub struct TerminalMenu<R, W> {
    input: R,
    output: W,
}

impl TerminalMenu<io::BufReader<io::Stdin>, io::Stdout> {
    /// Menu on stdin/stdout.
    ///
    /// Stdin is locked per read, never held, since the credential prompt
    /// reads from it too.
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalMenu<R, W> {
    /// Create new menu
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn draw(&mut self, entries: &[DesktopSelection], default: Option<usize>) -> io::Result<()> {
        writeln!(self.output)?;
        for (index, entry) in entries.iter().enumerate() {
            let mark = if Some(index) == default { '*' } else { ' ' };
            writeln!(self.output, " {}[{}] {}", mark, index, entry)?;
        }
        Ok(())
    }

    fn ask(&mut self, entries: &[DesktopSelection], default: Option<usize>) -> io::Result<Option<String>> {
        let last = entries.len() - 1;
        match default {
            Some(index) => write!(
                self.output,
                "Select [0-{}] (Enter for {}): ",
                last, entries[index].name
            )?,
            None => write!(self.output, "Select [0-{}]: ", last)?,
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> DesktopPresenter for TerminalMenu<R, W> {
    fn choose(
        &mut self,
        entries: &[DesktopSelection],
        mode: SelectionMode,
        default: Option<&DesktopSelection>,
    ) -> Result<DesktopSelection, SelectionError> {
        if entries.is_empty() {
            return Err(SelectionError::NoEntries);
        }

        let default = match mode {
            SelectionMode::Free => default.and_then(|d| entries.iter().position(|e| e == d)),
            SelectionMode::Forced => None,
        };
        self.draw(entries, default)?;

        for _ in 0..MAX_ATTEMPTS {
            let Some(answer) = self.ask(entries, default)? else {
                writeln!(self.output)?;
                return Err(SelectionError::Cancelled);
            };

            if answer.is_empty() {
                if let Some(index) = default {
                    return Ok(entries[index].clone());
                }
            } else if let Some(entry) = answer.parse::<usize>().ok().and_then(|i| entries.get(i)) {
                return Ok(entry.clone());
            }

            writeln!(self.output, "Invalid choice")?;
        }

        Err(SelectionError::Cancelled)
    }
}

use crate::error::{OrderError, Result};
use crate::interfaces::command::Command;
use std::io::BufRead;

/// Reads commands from a JSON Lines source, one object per line.
///
/// Blank lines and lines starting with `#` are skipped.
pub struct CommandReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> CommandReader<R> {
    /// Creates a new `CommandReader` from any buffered source (e.g., a
    /// `BufReader<File>` or locked stdin).
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Returns an iterator that lazily reads and deserializes commands,
    /// paired with their 1-based line number.
    ///
    /// A malformed line yields an error for that line only; reading
    /// continues with the next one.
    pub fn commands(self) -> impl Iterator<Item = (usize, Result<Command>)> {
        self.source
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let parsed = match line {
                    Ok(text) => {
                        let text = text.trim();
                        if text.is_empty() || text.starts_with('#') {
                            return None;
                        }
                        serde_json::from_str(text).map_err(OrderError::from)
                    }
                    Err(e) => Err(OrderError::from(e)),
                };
                Some((index + 1, parsed))
            })
    }
}

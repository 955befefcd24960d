//! Process-boundary adapters: the command script format and CSV reports.

pub mod command;
pub mod csv;
pub mod jsonl;

//! Turtle syntax check.
//!
//! Parses Turtle with Sophia and counts triples. Used to read rendered
//! partitions back before they are written, and to check existing output
//! trees.

use anyhow::{anyhow, Context, Result};
use sophia::api::prelude::*;
use std::convert::Infallible;
use std::path::Path;

/// Parse `text` as Turtle, returning the number of triples.
pub fn parse_turtle(text: &str) -> Result<usize> {
    let reader = std::io::BufReader::new(std::io::Cursor::new(text.as_bytes()));
    let mut count = 0usize;
    sophia::turtle::parser::turtle::parse_bufread(reader)
        .try_for_each_triple(|_| -> std::result::Result<(), Infallible> {
            count += 1;
            Ok(())
        })
        .map_err(|e| anyhow!("failed to parse Turtle: {e}"))?;
    Ok(count)
}

pub fn check_file(path: &Path) -> Result<usize> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_turtle(&text).with_context(|| format!("{} is not valid Turtle", path.display()))
}

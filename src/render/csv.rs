use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::RenderError;

pub const HEADER: &str = "Year,TotalPopulation";

pub fn to_csv(history: &[u64]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for (year, total) in history.iter().enumerate() {
        let _ = writeln!(out, "{year},{total}");
    }
    out
}

pub fn write(path: impl AsRef<Path>, history: &[u64]) -> Result<(), RenderError> {
    fs::write(path, to_csv(history))?;
    Ok(())
}

//! Single-line output of the resolved URL.

use std::io::{self, Write};

/// Rendered in place of an unset variable.
pub const ABSENT: &str = "None";

/// Write `url` (or [`ABSENT`]) followed by a newline, then flush.
pub fn write_url<W: Write>(out: &mut W, url: Option<&str>) -> io::Result<()> {
    writeln!(out, "{}", url.unwrap_or(ABSENT))?;
    out.flush()
}

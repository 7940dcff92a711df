//! Profile serialization.

use std::io::{self, Write};

use crate::merge::ProfileSet;

/// Write `set` in the `mode:` + block-line format.
///
/// An empty set writes nothing. Output order is file name, then block start,
/// so the same set always serializes to the same bytes.
pub fn write_profiles<W: Write + ?Sized>(set: &ProfileSet, out: &mut W) -> io::Result<()> {
    let Some(mode) = set.mode() else {
        return Ok(());
    };
    writeln!(out, "mode: {mode}")?;
    for p in set.profiles() {
        for b in p.blocks() {
            writeln!(out, "{}:{b}", p.file_name)?;
        }
    }
    Ok(())
}

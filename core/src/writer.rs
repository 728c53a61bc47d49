//! CSV serialization in the shape the Jira importer reads.
//!
//! Every non-empty cell is quoted, quotes inside are doubled, and unset or
//! empty cells are written as nothing at all (not `""`). Rows end with a
//! bare `\n`, the header included.

use std::io::{self, Write};

use crate::{mapper::OutputRow, schema::Schema};

const DELIMITER: u8 = b',';
const LINE_END: &[u8] = b"\n";

/// Writes the header and every row to `out`.
pub fn write_table<W: Write>(out: &mut W, schema: &Schema, rows: &[OutputRow]) -> io::Result<()> {
    write_line(out, schema.columns().iter().map(|column| Some(column.header())))?;
    for row in rows {
        write_line(out, row.cells().iter().map(Option::as_deref))?;
    }
    out.flush()
}

fn write_line<'a, W, I>(out: &mut W, cells: I) -> io::Result<()>
where
    W: Write,
    I: Iterator<Item = Option<&'a str>>,
{
    for (index, cell) in cells.enumerate() {
        if index > 0 {
            out.write_all(&[DELIMITER])?;
        }
        write_cell(out, cell)?;
    }
    out.write_all(LINE_END)
}

fn write_cell<W: Write>(out: &mut W, cell: Option<&str>) -> io::Result<()> {
    match cell {
        None | Some("") => Ok(()),
        Some(value) => {
            out.write_all(b"\"")?;
            out.write_all(value.replace('"', "\"\"").as_bytes())?;
            out.write_all(b"\"")
        },
    }
}

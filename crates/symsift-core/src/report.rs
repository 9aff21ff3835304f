//! # Report
//!
//! Renders [`CatalogPartitions`] as the plain-text, column-aligned report.
//!
//! ```text
//! == virtual types ======
//! Sizeof:     16 | type:   0x1006 | fields:   0x1005 | vftable rva: 0x1020   | name: Foo
//! ```

use std::fmt::Write as _;
use std::io;

use crate::partition::CatalogPartitions;
use crate::types::{ResolvedType, VftableEntry};

pub const VIRTUAL_HEADING: &str = "== virtual types ======";
pub const OTHER_HEADING: &str = "== other types ======";
pub const UNEXPANDED_HEADING: &str = "== Unexpanded virtuals ======";

fn resolved_row(out: &mut String, ty: &ResolvedType, width: usize)
{
    let _ = writeln!(
        out,
        "Sizeof: {:>6} | type: {:>#8x} | fields: {:>#8x} | vftable rva: {:<#8x} | name: {:<width$}",
        ty.size, ty.type_index, ty.field_list, ty.rva, ty.name
    );
}

fn unexpanded_row(out: &mut String, entry: &VftableEntry, width: usize)
{
    let _ = writeln!(out, "vftable rva: {:<#8x} | name: {:<width$}", entry.rva, entry.name);
}

/// Render the three sections of the report.
pub fn render(partitions: &CatalogPartitions) -> String
{
    let width = partitions.name_width;
    let mut out = String::new();

    let _ = writeln!(out, "{VIRTUAL_HEADING}");
    for ty in &partitions.virtual_types {
        resolved_row(&mut out, ty, width);
    }

    let _ = writeln!(out, "\n\n{OTHER_HEADING}");
    for ty in &partitions.other_types {
        resolved_row(&mut out, ty, width);
    }

    let _ = writeln!(out, "\n\n{UNEXPANDED_HEADING}");
    for entry in &partitions.unexpanded {
        unexpanded_row(&mut out, entry, width);
    }

    out
}

/// Render the report into every writer in `sinks`.
///
/// ## Errors
///
/// The first I/O error from any sink.
pub fn write_report(partitions: &CatalogPartitions, sinks: &mut [&mut dyn io::Write]) -> io::Result<()>
{
    let text = render(partitions);
    for sink in sinks.iter_mut() {
        sink.write_all(text.as_bytes())?;
        sink.flush()?;
    }
    Ok(())
}

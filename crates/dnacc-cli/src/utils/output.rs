use std::io::{self, Write};

pub const PLATES_COLUMNS: [&str; 4] = ["h", "F_rep", "F_att", "F_plate"];
pub const SPHERES_COLUMNS: [&str; 4] = ["h", "F_rep", "F_att", "F_sphere"];
pub const BLURRED_SPHERES_COLUMNS: [&str; 4] =
    ["h", "F_rep_blurred", "F_att_blurred", "F_sphere_blurred"];

/// Writes a `#`-prefixed, tab-separated header followed by one row per entry in `{:.7e}`.
pub fn write_table<W, R>(mut writer: W, columns: &[&str], rows: R) -> io::Result<()>
where
    W: Write,
    R: IntoIterator,
    R::Item: AsRef<[f64]>,
{
    writeln!(writer, "# {}", columns.join("\t"))?;
    for row in rows {
        let line = row
            .as_ref()
            .iter()
            .map(|value| format!("{:.7e}", value))
            .collect::<Vec<_>>()
            .join("\t");
        writeln!(writer, "{}", line)?;
    }
    writer.flush()
}

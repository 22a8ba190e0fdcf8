//! Full JSON export

use crate::collector::Aggregate;
use crate::output::OutputResult;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the whole aggregate as pretty-printed JSON
pub fn write_json(aggregate: &Aggregate, output_path: &Path) -> OutputResult<()> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, aggregate)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

use std::io::Write;

use fanout_core::TargetDefinition;

use crate::errors::GenerationError;

/// Document separator written before every target.
pub const DOCUMENT_SEPARATOR: &str = "---";

/// Write targets as a multi-document YAML stream.
///
/// Each target is preceded by a `---` line; an empty slice writes nothing.
pub fn write_targets<W: Write>(
    mut writer: W,
    targets: &[TargetDefinition],
) -> Result<(), GenerationError> {
    for target in targets {
        writeln!(writer, "{DOCUMENT_SEPARATOR}")?;
        let document = serde_yaml::to_string(target)?;
        writer.write_all(document.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

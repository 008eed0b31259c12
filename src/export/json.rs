use std::io::Write;

use crate::error::Result;

/// Write any serializable value as pretty JSON.
///
/// JSON has no infinities or NaN; such fields are written as `null`.
pub fn write_json<T, W>(data: &T, writer: &mut W) -> Result<()>
where
    T: serde::Serialize,
    W: Write,
{
    serde_json::to_writer_pretty(&mut *writer, data)?;
    writer.write_all(b"\n")?;
    Ok(())
}

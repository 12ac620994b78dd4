use std::io::Write;

use crate::aggregate::Memberships;
use crate::constants::pipeline::FIELD_DELIMITER;
use crate::errors::{ConsistencyViolation, DedupeError};
use crate::ingestion::RecordStore;

/// Write one `<external_id>\t<canonical_function>\n` line per record, in
/// ingestion order. An absent canonical value leaves the second column empty.
///
/// Returns the number of lines written. The sink is flushed before returning.
pub fn write_report<W: Write>(
    records: &RecordStore,
    memberships: &Memberships,
    sink: &mut W,
) -> Result<usize, DedupeError> {
    let mut lines = 0usize;
    for (key, record) in records.iter() {
        let membership = memberships
            .get(&key)
            .ok_or(ConsistencyViolation::UncoveredKey { key })?;
        let canonical = membership.canonical.function.as_deref().unwrap_or("");
        writeln!(
            sink,
            "{}{}{}",
            record.external_id, FIELD_DELIMITER, canonical
        )?;
        lines += 1;
    }
    sink.flush()?;
    Ok(lines)
}

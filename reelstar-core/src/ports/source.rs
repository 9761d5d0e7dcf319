// reelstar-core/src/ports/source.rs

// The extraction side of the pipeline: anything able to hand over a header
// and an ordered list of raw records.

use crate::domain::record::RawTable;
use crate::error::EtlError;

pub trait RecordSource: Send + Sync {
    /// Reads every record, in source order.
    ///
    /// Fails with `SourceUnavailable` when the source does not exist and with
    /// `MalformedSource` when it cannot be read as a header plus rows.
    fn read_records(&self) -> Result<RawTable, EtlError>;

    /// Short label for logs and the run summary (usually a path).
    fn describe(&self) -> String;
}

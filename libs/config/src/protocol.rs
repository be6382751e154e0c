//! Transmission protocol constants
//!
//! Values here are part of the wire contract. Changing a limit changes which
//! streams a reader accepts; changing a range changes how identifiers are
//! grouped into families. Neither may shrink once data has been recorded.

/// Upper bounds applied to length prefixes while decoding
pub mod limits {
    /// Longest UTF-8 string accepted (bytes)
    pub const MAX_STRING_BYTES: usize = 16 * 1024 * 1024;

    /// Longest byte blob accepted (bytes)
    pub const MAX_BLOB_BYTES: usize = 256 * 1024 * 1024;

    /// Most elements accepted in a homogeneous sequence
    pub const MAX_SEQUENCE_LEN: usize = 4 * 1024 * 1024;

    /// Most transmissions accepted in a single packet
    pub const MAX_PACKET_ELEMENTS: usize = 1024 * 1024;

    /// Deepest packet-in-packet nesting accepted; the outermost packet is depth 1
    pub const MAX_PACKET_DEPTH: usize = 64;

    /// Largest serialized transmission the recorder will store (bytes)
    pub const MAX_RECORDED_ENTRY_BYTES: usize = 512 * 1024 * 1024;
}

/// Type identifier ranges for message families
pub mod type_ids {
    use std::ops::Range;

    /// Session and diagnostic transmissions (packets, logon, checksums)
    pub const SYSTEM_RANGE: Range<i32> = 1..10;

    /// Simulation clock control
    pub const SIMULATION_RANGE: Range<i32> = 10..20;

    /// Optimize rule maintenance
    pub const OPTIMIZE_RANGE: Range<i32> = 20..30;

    /// Resource, capacity and import transmissions
    pub const RESOURCE_RANGE: Range<i32> = 30..40;

    /// Job, manufacturing order and shop-floor reporting
    pub const JOB_RANGE: Range<i32> = 40..50;

    /// Identifiers at or above this value are free for plugin message types
    pub const EXTENSION_FLOOR: i32 = 10_000;
}

/// Recording log file format
pub mod recording {
    /// File magic at the start of every recording log
    pub const LOG_MAGIC: &[u8; 4] = b"TXRC";

    /// Layout version of the log file framing (not the schema version)
    pub const LOG_FORMAT_VERSION: u16 = 1;

    /// File extension used for recording logs
    pub const LOG_EXTENSION: &str = "txrec";
}

#[cfg(test)]
mod tests {
    use super::type_ids::*;

    #[test]
    fn test_family_ranges_do_not_overlap() {
        let ranges = [
            SYSTEM_RANGE,
            SIMULATION_RANGE,
            OPTIMIZE_RANGE,
            RESOURCE_RANGE,
            JOB_RANGE,
        ];
        for window in ranges.windows(2) {
            assert!(window[0].end <= window[1].start);
        }
        assert!(JOB_RANGE.end <= EXTENSION_FLOOR);
    }
}

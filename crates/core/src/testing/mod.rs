//! Testing utilities shared by unit and integration tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use sieve_core::testing::RecordingTransport;
//!
//! let transport = Arc::new(RecordingTransport::new());
//! hub.subscribe("task-1", transport.clone()).await?;
//!
//! // Publish...
//! let events = transport.events();
//! assert_eq!(events.last().unwrap().progress, 100);
//! ```

mod recording_transport;

pub use recording_transport::RecordingTransport;

/// CSV payloads used across tests.
pub mod fixtures {
    /// Three rows, one all-empty column, one duplicate row, one missing value.
    pub const DUPLICATE_WITH_GAPS: &str = "a,b,c\n1,,\n1,,\n2,5,\n";

    /// A header with no data rows.
    pub const HEADER_ONLY: &str = "a,b\n";

    /// A second row with more fields than the header.
    pub const RAGGED: &str = "a,b\n1,2\n3,4,5\n";

    /// Mixed column types with gaps in every column.
    pub const MIXED: &str = "\
id,age,city,score,grade
1,34,Rome,7.5,A
2,,Paris,6.0,B
3,29,,8.25,A
4,41,Rome,,C
5,29,Oslo,5.5,
";

    /// A table large enough for cancellation tests to land mid-run.
    pub fn wide_table(rows: usize) -> String {
        let mut csv = String::from("id,group,value,label\n");
        for i in 0..rows {
            let value = if i % 7 == 0 {
                String::new()
            } else {
                format!("{}", (i * 31) % 97)
            };
            csv.push_str(&format!("{},{},{},item-{}\n", i, i % 5, value, i % 13));
        }
        csv
    }
}

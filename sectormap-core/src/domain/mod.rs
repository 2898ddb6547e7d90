//! Domain types for SectorMap

pub mod record;
pub mod segment;
pub mod ticker;

pub use record::{
    CuratedEntry, CuratedSet, EnrichedRecord, ListingRecord, MergedRecord, PublishedRow,
};
pub use segment::{Exchange, Segment, SegmentParseError};
pub use ticker::{TickerCode, TickerError, TICKER_LEN};

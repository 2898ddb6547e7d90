//! SectorMap Core — domain types, data providers, curated set loader, row stores.
//!
//! This crate contains everything a segment run touches outside the
//! pipeline logic itself:
//! - Domain types (segments, ticker codes, curated/listing/merged/published rows)
//! - The curated CSV loader with UTF-8 → CP949 fallback
//! - Live listing (KRX) and price history (Yahoo) providers behind traits
//! - Row stores (Supabase upsert, in-memory)
//! - `Outcome`, the tagged result for stages that degrade to defaults

pub mod data;
pub mod domain;
pub mod fields;
pub mod outcome;
pub mod store;

#[cfg(test)]
mod test_support;

pub use outcome::Outcome;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: providers, stores and pipeline records can cross
    /// threads, so segments may run in parallel.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::CuratedSet>();
        require_sync::<domain::CuratedSet>();
        require_send::<domain::ListingRecord>();
        require_sync::<domain::ListingRecord>();
        require_send::<domain::EnrichedRecord>();
        require_sync::<domain::EnrichedRecord>();
        require_send::<domain::PublishedRow>();
        require_sync::<domain::PublishedRow>();

        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
        require_send::<data::KrxListingProvider>();
        require_sync::<data::KrxListingProvider>();
        require_send::<data::YahooPriceProvider>();
        require_sync::<data::YahooPriceProvider>();

        require_send::<store::SupabaseStore>();
        require_sync::<store::SupabaseStore>();
        require_send::<store::MemoryStore>();
        require_sync::<store::MemoryStore>();
    }

    /// Provider and store traits stay object-safe so the runner can hold them
    /// as `&dyn` references.
    #[test]
    fn provider_traits_are_object_safe() {
        fn _listing(_: &dyn data::ListingProvider) {}
        fn _prices(_: &dyn data::PriceProvider) {}
        fn _store(_: &dyn store::RowStore) {}
    }
}

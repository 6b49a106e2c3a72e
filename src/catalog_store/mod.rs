mod models;
mod resolve;
mod schema;
mod store;

pub use models::{
    Composition, CompositionFields, Ensemble, EnsembleFields, MembershipRow, Musician,
    MusicianFields, PerformanceRow, Record, RecordFields, StoreCounts, TrackRow,
};
pub use resolve::{extract_display_name, ResolveError, ResolveMode, NO_MATCH};
pub use schema::MUSIC_STORE_SCHEMAS;
pub use store::SqliteCatalogStore;

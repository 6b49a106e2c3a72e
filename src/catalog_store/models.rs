//! Typed models for the music-store catalog.

use crate::display::musician_display_name;
use serde::{Deserialize, Serialize};

/// A performing group (band, orchestra, quartet...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ensemble {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub description: String,
}

/// Writable ensemble fields, shared by insert and update.
#[derive(Clone, Debug, Default)]
pub struct EnsembleFields {
    pub name: String,
    pub kind: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Musician {
    pub id: i64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub bio: String,
}

impl Musician {
    /// "first [middle] last", the display form used by selectors and
    /// relation listings.
    pub fn display_name(&self) -> String {
        musician_display_name(&self.first_name, self.middle_name.as_deref(), &self.last_name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MusicianFields {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub bio: String,
}

/// A musical work, independent of any specific recording.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    pub id: i64,
    pub title: String,
    pub creation_year: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct CompositionFields {
    pub title: String,
    pub creation_year: Option<i64>,
}

/// A pressing/release carrying one or more composition tracks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub title: String,
    pub wholesale_price: f64,
    pub retail_price: f64,
    pub disc_count: i64,
    pub current_year_sales: i64,
    pub remaining_stock: i64,
}

/// Writable record fields. The sales counter is not here: it only moves
/// through the additive sales update.
#[derive(Clone, Debug, Default)]
pub struct RecordFields {
    pub title: String,
    pub wholesale_price: f64,
    pub retail_price: f64,
    pub disc_count: i64,
    pub remaining_stock: i64,
}

// =============================================================================
// Denormalized relation listings
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRow {
    pub ensemble_name: String,
    pub musician_name: String,
    pub role: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub ensemble_name: String,
    pub composition_title: String,
    pub arrangement: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRow {
    pub record_title: String,
    pub composition_title: String,
    pub track_number: i64,
}

/// Entity counts reported at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub ensembles: i64,
    pub musicians: i64,
    pub compositions: i64,
    pub records: i64,
}

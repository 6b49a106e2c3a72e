//! Fixed aggregate views over the catalog.
//!
//! Five parameterless reports, each a fixed column projection run through
//! the gateway. Any report is selectable from any other; there is no
//! state beyond the current selection.

use crate::sqlite_persistence::{Gateway, Row};
use clap::ValueEnum;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Report {
    /// Records joined to performing ensembles, with track and musician
    /// counts, sales and revenue.
    RecordOverview,
    /// Ensembles ranked by distinct performed compositions.
    EnsemblesByRepertoire,
    /// Musicians ranked by ensemble count.
    MusiciansByEnsembles,
    /// Compositions ranked by record count, then performing ensembles.
    CompositionsByPopularity,
    /// Revenue, profit and sell-through per record.
    FinancialSummary,
}

impl Report {
    pub const ALL: [Report; 5] = [
        Report::RecordOverview,
        Report::EnsemblesByRepertoire,
        Report::MusiciansByEnsembles,
        Report::CompositionsByPopularity,
        Report::FinancialSummary,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Report::RecordOverview => "Complete record overview",
            Report::EnsemblesByRepertoire => "Ensembles by repertoire size",
            Report::MusiciansByEnsembles => "Musicians by ensemble count",
            Report::CompositionsByPopularity => "Compositions by popularity",
            Report::FinancialSummary => "Financial summary",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Report::RecordOverview => &[
                "record_title",
                "ensemble_name",
                "compositions_count",
                "total_duration",
                "musicians_count",
                "current_year_sales",
                "total_revenue",
            ],
            Report::EnsemblesByRepertoire => &[
                "ensemble_name",
                "compositions_count",
                "musicians_count",
                "records_count",
            ],
            Report::MusiciansByEnsembles => &[
                "musician_name",
                "ensembles_count",
                "ensemble_names",
                "compositions_count",
            ],
            Report::CompositionsByPopularity => &[
                "composition_title",
                "creation_year",
                "ensembles_count",
                "records_count",
                "performing_ensembles",
            ],
            Report::FinancialSummary => &[
                "record_title",
                "current_year_sales",
                "retail_price",
                "wholesale_price",
                "total_revenue",
                "total_profit",
                "remaining_stock",
                "sales_percentage",
            ],
        }
    }

    fn sql(self) -> &'static str {
        match self {
            // Track duration metadata is not in the schema; the overview
            // estimates 3.5 minutes per track like the sibling reports the
            // storefront grew up with.
            Report::RecordOverview => {
                "SELECT r.title AS record_title, \
                        e.name AS ensemble_name, \
                        COUNT(DISTINCT rt.composition_id) AS compositions_count, \
                        ROUND(COUNT(DISTINCT rt.composition_id) * 3.5, 1) AS total_duration, \
                        COUNT(DISTINCT em.musician_id) AS musicians_count, \
                        r.current_year_sales, \
                        ROUND(r.current_year_sales * r.retail_price, 2) AS total_revenue \
                 FROM records r \
                 LEFT JOIN record_tracks rt ON r.record_id = rt.record_id \
                 LEFT JOIN performances p ON rt.composition_id = p.composition_id \
                 LEFT JOIN ensembles e ON p.ensemble_id = e.ensemble_id \
                 LEFT JOIN ensemble_members em ON e.ensemble_id = em.ensemble_id \
                 GROUP BY r.record_id, e.ensemble_id \
                 ORDER BY r.current_year_sales DESC, total_revenue DESC"
            }
            Report::EnsemblesByRepertoire => {
                "SELECT e.name AS ensemble_name, \
                        COUNT(DISTINCT p.composition_id) AS compositions_count, \
                        COUNT(DISTINCT em.musician_id) AS musicians_count, \
                        COUNT(DISTINCT r.record_id) AS records_count \
                 FROM ensembles e \
                 LEFT JOIN performances p ON e.ensemble_id = p.ensemble_id \
                 LEFT JOIN ensemble_members em ON e.ensemble_id = em.ensemble_id \
                 LEFT JOIN record_tracks rt ON p.composition_id = rt.composition_id \
                 LEFT JOIN records r ON rt.record_id = r.record_id \
                 GROUP BY e.ensemble_id \
                 ORDER BY compositions_count DESC, musicians_count DESC"
            }
            Report::MusiciansByEnsembles => {
                "SELECT m.first_name || ' ' || m.last_name AS musician_name, \
                        COUNT(DISTINCT em.ensemble_id) AS ensembles_count, \
                        group_concat(DISTINCT e.name) AS ensemble_names, \
                        COUNT(DISTINCT p.composition_id) AS compositions_count \
                 FROM musicians m \
                 LEFT JOIN ensemble_members em ON m.musician_id = em.musician_id \
                 LEFT JOIN ensembles e ON em.ensemble_id = e.ensemble_id \
                 LEFT JOIN performances p ON e.ensemble_id = p.ensemble_id \
                 GROUP BY m.musician_id \
                 ORDER BY ensembles_count DESC, compositions_count DESC"
            }
            Report::CompositionsByPopularity => {
                "SELECT c.title AS composition_title, \
                        c.creation_year, \
                        COUNT(DISTINCT p.ensemble_id) AS ensembles_count, \
                        COUNT(DISTINCT rt.record_id) AS records_count, \
                        group_concat(DISTINCT e.name) AS performing_ensembles \
                 FROM compositions c \
                 LEFT JOIN performances p ON c.composition_id = p.composition_id \
                 LEFT JOIN ensembles e ON p.ensemble_id = e.ensemble_id \
                 LEFT JOIN record_tracks rt ON c.composition_id = rt.composition_id \
                 GROUP BY c.composition_id \
                 ORDER BY records_count DESC, ensembles_count DESC"
            }
            Report::FinancialSummary => {
                "SELECT r.title AS record_title, \
                        r.current_year_sales, \
                        r.retail_price, \
                        r.wholesale_price, \
                        ROUND(r.current_year_sales * r.retail_price, 2) AS total_revenue, \
                        ROUND(r.current_year_sales * (r.retail_price - r.wholesale_price), 2) AS total_profit, \
                        r.remaining_stock, \
                        ROUND((r.current_year_sales * 100.0) / (r.current_year_sales + r.remaining_stock), 2) AS sales_percentage \
                 FROM records r \
                 ORDER BY total_revenue DESC, total_profit DESC"
            }
        }
    }

    pub fn run(self, gateway: &Gateway) -> Vec<Row> {
        gateway.run_query(self.sql(), &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{
        CompositionFields, EnsembleFields, MusicianFields, RecordFields, ResolveMode,
        SqliteCatalogStore,
    };

    const ACTOR: &str = "analyst@example.com";

    fn seeded_store() -> SqliteCatalogStore {
        let store = SqliteCatalogStore::in_memory(ResolveMode::Lenient).unwrap();
        store
            .insert_ensemble(
                ACTOR,
                &EnsembleFields {
                    name: "Quartet A".to_string(),
                    kind: "jazz".to_string(),
                    description: String::new(),
                },
            )
            .unwrap();
        store
            .insert_musician(
                ACTOR,
                &MusicianFields {
                    first_name: "Ann".to_string(),
                    last_name: "Lee".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .insert_composition(
                ACTOR,
                &CompositionFields {
                    title: "Nocturne".to_string(),
                    creation_year: Some(2021),
                },
            )
            .unwrap();
        let record_id = store
            .insert_record(
                ACTOR,
                &RecordFields {
                    title: "First Light".to_string(),
                    wholesale_price: 5.0,
                    retail_price: 12.0,
                    disc_count: 1,
                    remaining_stock: 50,
                },
            )
            .unwrap();
        store
            .add_membership(ACTOR, "Quartet A", "Ann Lee", "violin")
            .unwrap();
        store
            .add_performance(ACTOR, "Quartet A", "Nocturne", "")
            .unwrap();
        store
            .add_record_track(ACTOR, "First Light", "Nocturne", 1)
            .unwrap();
        store.update_record_sales(ACTOR, record_id, 50).unwrap();
        store
    }

    #[test]
    fn every_report_returns_its_documented_columns() {
        let store = seeded_store();
        let gateway = store.gateway();
        for report in Report::ALL {
            let rows = report.run(&gateway);
            assert!(!rows.is_empty(), "{:?} returned no rows", report);
            for column in report.columns() {
                assert!(
                    rows[0].columns().any(|(name, _)| name == *column),
                    "{:?} is missing column {}",
                    report,
                    column
                );
            }
        }
    }

    #[test]
    fn financial_summary_computes_revenue_profit_and_sell_through() {
        let store = seeded_store();
        let rows = Report::FinancialSummary.run(&store.gateway());
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get("record_title"), "First Light");
        assert_eq!(row.get("current_year_sales"), "50");
        // 50 * 12.0
        assert_eq!(row.get("total_revenue"), "600");
        // 50 * (12.0 - 5.0)
        assert_eq!(row.get("total_profit"), "350");
        // 50 / (50 + 50) * 100
        assert_eq!(row.get("sales_percentage"), "50");
    }

    #[test]
    fn ensembles_by_repertoire_counts_distinct_compositions() {
        let store = seeded_store();
        let rows = Report::EnsemblesByRepertoire.run(&store.gateway());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("ensemble_name"), "Quartet A");
        assert_eq!(rows[0].get("compositions_count"), "1");
        assert_eq!(rows[0].get("musicians_count"), "1");
        assert_eq!(rows[0].get("records_count"), "1");
    }

    #[test]
    fn musicians_report_aggregates_ensemble_names() {
        let store = seeded_store();
        let rows = Report::MusiciansByEnsembles.run(&store.gateway());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("musician_name"), "Ann Lee");
        assert_eq!(rows[0].get("ensemble_names"), "Quartet A");
    }
}

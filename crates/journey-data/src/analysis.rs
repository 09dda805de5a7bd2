//! Report assembly for the dashboard and journey views.
//!
//! Each section is a pure function of its own input table, so callers may
//! compute sections independently (and in parallel) and combine them with
//! [`DashboardReport::new`] / [`JourneyReport::new`]. The `build_*` helpers
//! do the same sequentially.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use journey_core::identifiers::ClientDirectory;
use journey_core::models::{
    AggregationRow, CalendarBucket, ChartKind, ChartSpec, ClientTotal, Interval, RankedToken, Table,
};
use journey_core::{JourneyError, Result};

use crate::aggregator::CategoricalAggregator;
use crate::calendar::{bucketize, check_ins_from_table};
use crate::intervals::{account_housing, RecordFailure};
use crate::reader::join_text_column;
use crate::words::WordRanker;

pub const REASON_COLUMN: &str = "Reason";
pub const VISITS_COLUMN: &str = "Visits";
pub const PATIENT_ID_COLUMN: &str = "Patient.ID";
pub const CLIENT_COLUMN: &str = "Client";
pub const SERVICE_COLUMN: &str = "Service";
pub const USAGE_COLUMN: &str = "Usage";
pub const TEXT_COLUMN: &str = "text";

/// Headroom added above the largest visit count on the radar axis.
pub const RADAR_HEADROOM: f64 = 2.0;

// ── Series ────────────────────────────────────────────────────────────────────

/// Rows for one chart plus the schema the boundary needs to draw them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series<T> {
    pub chart: ChartSpec,
    /// Column names of `rows`; for [`AggregationRow`]s the group keys in
    /// order followed by the measure.
    pub columns: Vec<String>,
    pub rows: Vec<T>,
}

impl<T> Series<T> {
    fn new(chart: ChartSpec, columns: &[&str], rows: Vec<T>) -> Self {
        Self {
            chart,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }
}

/// Metadata produced alongside a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    /// RFC 3339 timestamp when the report was assembled.
    pub generated_at: String,
}

impl ReportMetadata {
    fn now() -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
        }
    }
}

// ── Dashboard sections ────────────────────────────────────────────────────────

/// Housing timeline and total-days table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HousingSection {
    pub periods: Series<Interval>,
    pub total_days_housed: Vec<ClientTotal>,
    pub failures: Vec<RecordFailure>,
}

/// One client's visits per program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitProfile {
    pub client: String,
    pub visits: Series<AggregationRow>,
    /// Upper bound of the radial axis: largest count plus headroom.
    pub radial_max: Option<f64>,
}

/// Program visit counts, overall and per client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitsSection {
    pub by_reason: Series<AggregationRow>,
    /// Clients offered by the profile selector, first-seen order.
    pub client_options: Vec<String>,
    pub profiles: Vec<VisitProfile>,
}

/// One client's storage / service usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceUsage {
    pub client: String,
    pub totals: Series<AggregationRow>,
    pub long_form: Series<AggregationRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSection {
    pub client_options: Vec<String>,
    pub clients: Vec<ServiceUsage>,
}

/// Housing periods: parse every client's ranges and total them.
pub fn housing_section(housing: &Table) -> Result<HousingSection> {
    let summary = account_housing(housing)?;
    let chart = ChartSpec::new(ChartKind::Timeline, "Housing Periods", "start", "client")
        .with_x_end("end")
        .with_category("client");
    Ok(HousingSection {
        periods: Series::new(
            chart,
            &["client", "start", "end", "duration_days"],
            summary.intervals,
        ),
        total_days_housed: summary.totals,
        failures: summary.failures,
    })
}

/// Visits summed per reason, across all clients.
pub fn visits_by_reason(visits: &Table) -> Result<Vec<AggregationRow>> {
    CategoricalAggregator::aggregate(
        visits,
        &[REASON_COLUMN],
        VISITS_COLUMN,
        &[REASON_COLUMN, VISITS_COLUMN],
    )
}

/// Visits summed per `(client display name, reason)`.
///
/// Rows whose id has no display name drop out with the other null keys.
pub fn client_visits(visits: &Table, directory: &ClientDirectory) -> Result<Vec<AggregationRow>> {
    let named =
        CategoricalAggregator::attach_names(visits, PATIENT_ID_COLUMN, CLIENT_COLUMN, directory)?;
    CategoricalAggregator::aggregate(
        &named,
        &[CLIENT_COLUMN, REASON_COLUMN],
        VISITS_COLUMN,
        &[REASON_COLUMN, VISITS_COLUMN],
    )
}

/// Distinct display names of visit rows with both a reason and a count.
pub fn visit_client_options(visits: &Table, directory: &ClientDirectory) -> Result<Vec<String>> {
    let named =
        CategoricalAggregator::attach_names(visits, PATIENT_ID_COLUMN, CLIENT_COLUMN, directory)?;
    let reason = named.column_index(REASON_COLUMN)?;
    let count = named.column_index(VISITS_COLUMN)?;
    let client = named.column_index(CLIENT_COLUMN)?;

    let mut options: Vec<String> = Vec::new();
    for row in named.rows() {
        if row[reason].is_none() || row[count].is_none() {
            continue;
        }
        if let Some(name) = &row[client] {
            if !options.contains(name) {
                options.push(name.clone());
            }
        }
    }
    Ok(options)
}

/// Select one client's rows out of [`client_visits`] output.
pub fn visit_profile(client_rows: &[AggregationRow], client: &str) -> VisitProfile {
    let rows: Vec<AggregationRow> = client_rows
        .iter()
        .filter(|r| r.group_keys.first().map(String::as_str) == Some(client))
        .map(|r| AggregationRow {
            group_keys: r.group_keys[1..].to_vec(),
            measure_sum: r.measure_sum,
        })
        .collect();
    let radial_max = CategoricalAggregator::max_measure(&rows).map(|m| m + RADAR_HEADROOM);
    let chart = ChartSpec::new(ChartKind::Radar, "Number of Visits", REASON_COLUMN, VISITS_COLUMN);

    VisitProfile {
        client: client.to_string(),
        visits: Series::new(chart, &[REASON_COLUMN, VISITS_COLUMN], rows),
        radial_max,
    }
}

pub fn visits_section(visits: &Table, directory: &ClientDirectory) -> Result<VisitsSection> {
    let by_reason = visits_by_reason(visits)?;
    let per_client = client_visits(visits, directory)?;
    let client_options = visit_client_options(visits, directory)?;
    let profiles = client_options
        .iter()
        .map(|client| visit_profile(&per_client, client))
        .collect();

    let chart = ChartSpec::new(
        ChartKind::Bar,
        "Programs Over Number Accessed Chart",
        REASON_COLUMN,
        VISITS_COLUMN,
    )
    .with_category(REASON_COLUMN);

    Ok(VisitsSection {
        by_reason: Series::new(chart, &[REASON_COLUMN, VISITS_COLUMN], by_reason),
        client_options,
        profiles,
    })
}

/// Long-form usage of one client: one row per service column.
pub fn service_long_form(storage: &Table, client: &str) -> Result<Vec<AggregationRow>> {
    let long = melt_client(storage, client)?;
    CategoricalAggregator::aggregate(&long, &[CLIENT_COLUMN, SERVICE_COLUMN], USAGE_COLUMN, &[])
}

/// Total usage of each service for one client.
pub fn service_totals(storage: &Table, client: &str) -> Result<Vec<AggregationRow>> {
    let long = melt_client(storage, client)?;
    CategoricalAggregator::aggregate(&long, &[SERVICE_COLUMN], USAGE_COLUMN, &[])
}

/// Service columns of the storage export: every numeric column besides
/// `Client`. Text columns are left out of the usage charts.
pub fn service_columns(storage: &Table) -> Vec<String> {
    CategoricalAggregator::numeric_columns(storage, &[CLIENT_COLUMN])
}

fn melt_client(storage: &Table, client: &str) -> Result<Table> {
    let services = service_columns(storage);
    let mut keep = vec![CLIENT_COLUMN];
    keep.extend(services.iter().map(String::as_str));
    let rows = storage.select(&keep)?.filter_eq(CLIENT_COLUMN, client)?;
    CategoricalAggregator::melt(&rows, CLIENT_COLUMN, SERVICE_COLUMN, USAGE_COLUMN)
}

pub fn usage_section(storage: &Table) -> Result<UsageSection> {
    let client_options = storage.distinct(CLIENT_COLUMN)?;
    let services = service_columns(storage);
    for header in storage.headers() {
        if header != CLIENT_COLUMN && !services.contains(header) {
            warn!("Storage column {:?} is not numeric; left out of usage charts", header);
        }
    }
    let clients = client_options
        .iter()
        .map(|client| {
            let totals = Series::new(
                ChartSpec::new(
                    ChartKind::Pie,
                    format!("Storage Usage of {}", client),
                    SERVICE_COLUMN,
                    USAGE_COLUMN,
                ),
                &[SERVICE_COLUMN, USAGE_COLUMN],
                service_totals(storage, client)?,
            );
            let long_form = Series::new(
                ChartSpec::new(
                    ChartKind::StackedBar,
                    format!("Bars and Logs Data for {}", client),
                    CLIENT_COLUMN,
                    USAGE_COLUMN,
                )
                .with_category(SERVICE_COLUMN),
                &[CLIENT_COLUMN, SERVICE_COLUMN, USAGE_COLUMN],
                service_long_form(storage, client)?,
            );
            Ok(ServiceUsage {
                client: client.clone(),
                totals,
                long_form,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(UsageSection {
        client_options,
        clients,
    })
}

// ── DashboardReport ───────────────────────────────────────────────────────────

/// Everything the dashboard page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub housing: HousingSection,
    pub visits: VisitsSection,
    pub usage: UsageSection,
}

impl DashboardReport {
    pub fn new(housing: HousingSection, visits: VisitsSection, usage: UsageSection) -> Self {
        Self {
            metadata: ReportMetadata::now(),
            housing,
            visits,
            usage,
        }
    }
}

/// Build the dashboard from the three exports.
pub fn build_dashboard(
    housing: &Table,
    visits: &Table,
    storage: &Table,
    directory: &ClientDirectory,
) -> Result<DashboardReport> {
    let report = DashboardReport::new(
        housing_section(housing)?,
        visits_section(visits, directory)?,
        usage_section(storage)?,
    );
    info!(
        "Dashboard: {} housing intervals, {} visit reasons, {} storage clients",
        report.housing.periods.rows.len(),
        report.visits.by_reason.rows.len(),
        report.usage.clients.len()
    );
    Ok(report)
}

// ── Journey sections ──────────────────────────────────────────────────────────

/// Check-in calendar for one client.
pub fn calendar_series(client: &str, check_ins: &Table) -> Result<Series<CalendarBucket>> {
    let events = check_ins_from_table(client, check_ins)?;
    let chart = ChartSpec::new(ChartKind::Calendar, "Sleep Check-ins", "date", "value");
    Ok(Series::new(chart, &["date", "value"], bucketize(&events)))
}

/// Most frequent case-note words for one client.
pub fn word_series(
    case_notes: &Table,
    ranker: &WordRanker,
    top_n: usize,
) -> Result<Series<RankedToken>> {
    let text = join_text_column(case_notes, TEXT_COLUMN)?;
    let chart = ChartSpec::new(
        ChartKind::Treemap,
        "Frequent Fifty Words In Log",
        "token",
        "count",
    );
    Ok(Series::new(
        chart,
        &["token", "count"],
        ranker.rank_tokens(&text, top_n),
    ))
}

/// Everything the journey page renders for one client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JourneyReport {
    pub metadata: ReportMetadata,
    pub client: String,
    /// Timeline document forwarded verbatim, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<serde_json::Value>,
    pub check_ins: Series<CalendarBucket>,
    pub words: Series<RankedToken>,
}

impl JourneyReport {
    pub fn new(
        client: &str,
        timeline: Option<serde_json::Value>,
        check_ins: Series<CalendarBucket>,
        words: Series<RankedToken>,
    ) -> Self {
        Self {
            metadata: ReportMetadata::now(),
            client: client.to_string(),
            timeline,
            check_ins,
            words,
        }
    }
}

/// Reject a blank client selection before any work is done.
pub fn require_client(client: Option<&str>) -> Result<&str> {
    client
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| JourneyError::NoInput("client selection".to_string()))
}

/// The client a journey is built for: the requested one, or else the first
/// entry of `available` (roster clients that have a check-in export).
pub fn select_client(requested: Option<&str>, available: &[&str]) -> Result<String> {
    match requested {
        Some(name) => Ok(require_client(Some(name))?.to_string()),
        None => available
            .first()
            .map(|c| c.to_string())
            .ok_or_else(|| JourneyError::NoInput("no client check-in exports".to_string())),
    }
}

/// Build one client's journey from its check-ins and case notes.
pub fn build_journey(
    client: &str,
    check_ins: &Table,
    case_notes: &Table,
    timeline: Option<serde_json::Value>,
    ranker: &WordRanker,
    top_n: usize,
) -> Result<JourneyReport> {
    let client = require_client(Some(client))?;
    let report = JourneyReport::new(
        client,
        timeline,
        calendar_series(client, check_ins)?,
        word_series(case_notes, ranker, top_n)?,
    );
    info!(
        "Journey for {}: {} calendar days, {} ranked words",
        client,
        report.check_ins.rows.len(),
        report.words.rows.len()
    );
    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use journey_core::stopwords::StopwordSet;

    fn visits() -> Table {
        Table::from_str_rows(
            &["Patient.ID", "Reason", "Visits"],
            &[
                &["84999", "Food", "2"],
                &["16555", "Shower", "1"],
                &["84999", "Shower", "4"],
                &["84999", "Food", "3"],
                &["99999", "Food", "10"],
                &["16555", "", "7"],
                &["52896", "Laundry", ""],
            ],
        )
    }

    fn storage() -> Table {
        Table::from_str_rows(
            &["Client", "Bars", "Logs"],
            &[
                &["Kelly Baswick", "3", "1"],
                &["Courtney Bird", "2", ""],
                &["Kelly Baswick", "4", "2"],
            ],
        )
    }

    // ── visits ────────────────────────────────────────────────────────────────

    #[test]
    fn test_visits_by_reason_includes_unmapped_ids() {
        let rows = visits_by_reason(&visits()).unwrap();
        assert_eq!(rows[0].group_keys, vec!["Food"]);
        assert_eq!(rows[0].measure_sum, 15.0);
        assert_eq!(rows[1].group_keys, vec!["Shower"]);
        assert_eq!(rows[1].measure_sum, 5.0);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_client_visits_drop_unmapped_ids() {
        let rows = client_visits(&visits(), &ClientDirectory::default()).unwrap();
        assert!(rows.iter().all(|r| r.group_keys[0] != "99999"));
        let food: f64 = rows
            .iter()
            .filter(|r| r.group_keys == vec!["Courtney Bird", "Food"])
            .map(|r| r.measure_sum)
            .sum();
        assert_eq!(food, 5.0);
    }

    #[test]
    fn test_visit_client_options() {
        let options = visit_client_options(&visits(), &ClientDirectory::default()).unwrap();
        // Less Four Horns only has a row without a count.
        assert_eq!(options, vec!["Courtney Bird", "Kelly Baswick"]);
    }

    #[test]
    fn test_visit_profile_strips_client_key() {
        let rows = client_visits(&visits(), &ClientDirectory::default()).unwrap();
        let profile = visit_profile(&rows, "Courtney Bird");
        assert_eq!(profile.visits.rows.len(), 2);
        assert_eq!(profile.visits.rows[0].group_keys, vec!["Food"]);
        assert_eq!(profile.radial_max, Some(7.0));
    }

    #[test]
    fn test_visit_profile_unknown_client() {
        let rows = client_visits(&visits(), &ClientDirectory::default()).unwrap();
        let profile = visit_profile(&rows, "Nobody");
        assert!(profile.visits.rows.is_empty());
        assert_eq!(profile.radial_max, None);
    }

    #[test]
    fn test_visits_section() {
        let section = visits_section(&visits(), &ClientDirectory::default()).unwrap();
        assert_eq!(section.profiles.len(), 2);
        assert_eq!(section.by_reason.columns, vec!["Reason", "Visits"]);
        assert_eq!(section.by_reason.chart.kind, ChartKind::Bar);
    }

    // ── usage ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_service_totals() {
        let rows = service_totals(&storage(), "Kelly Baswick").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group_keys, vec!["Bars"]);
        assert_eq!(rows[0].measure_sum, 7.0);
        assert_eq!(rows[1].measure_sum, 3.0);
    }

    #[test]
    fn test_service_long_form() {
        let rows = service_long_form(&storage(), "Courtney Bird").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].group_keys, vec!["Courtney Bird", "Bars"]);
    }

    #[test]
    fn test_usage_section_per_client() {
        let section = usage_section(&storage()).unwrap();
        assert_eq!(section.client_options, vec!["Kelly Baswick", "Courtney Bird"]);
        assert_eq!(section.clients[0].totals.chart.title, "Storage Usage of Kelly Baswick");
        assert_eq!(
            section.clients[1].long_form.chart.category.as_deref(),
            Some("Service")
        );
    }

    #[test]
    fn test_usage_section_skips_text_service_columns() {
        let table = Table::from_str_rows(
            &["Client", "Bars", "Notes"],
            &[&["Kelly Baswick", "3", "moved lockers"], &["Kelly Baswick", "1", ""]],
        );
        let section = usage_section(&table).unwrap();
        let totals = &section.clients[0].totals.rows;
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].group_keys, vec!["Bars"]);
        assert_eq!(totals[0].measure_sum, 4.0);
        assert!(section.clients[0]
            .long_form
            .rows
            .iter()
            .all(|r| r.group_keys[1] != "Notes"));
    }

    #[test]
    fn test_usage_section_requires_client_column() {
        let table = Table::from_str_rows(&["Name", "Bars"], &[&["x", "1"]]);
        assert!(matches!(
            usage_section(&table).unwrap_err(),
            JourneyError::MissingField { .. }
        ));
    }

    // ── dashboard ─────────────────────────────────────────────────────────────

    #[test]
    fn test_build_dashboard() {
        let housing = Table::from_str_rows(
            &["client", "housed_date"],
            &[&["Kelly Baswick", "2021-01-01 2021-01-05"], &["Courtney Bird", "bad"]],
        );
        let report =
            build_dashboard(&housing, &visits(), &storage(), &ClientDirectory::default()).unwrap();

        assert_eq!(report.housing.periods.rows.len(), 1);
        assert_eq!(report.housing.total_days_housed[0].total_days_housed, 5);
        assert_eq!(report.housing.failures.len(), 1);
        assert_eq!(report.housing.periods.chart.x_end.as_deref(), Some("end"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["housing"]["periods"]["rows"][0]["start"], "2021-01-01");
        assert!(json["metadata"]["generated_at"].is_string());
    }

    // ── journey ───────────────────────────────────────────────────────────────

    #[test]
    fn test_require_client() {
        assert_eq!(require_client(Some(" Kelly Baswick ")).unwrap(), "Kelly Baswick");
        assert!(matches!(
            require_client(Some("  ")).unwrap_err(),
            JourneyError::NoInput(_)
        ));
        assert!(require_client(None).is_err());
    }

    #[test]
    fn test_select_client_defaults_to_first_available() {
        let available = ["Courtney Bird", "Kelly Baswick"];
        assert_eq!(select_client(None, &available).unwrap(), "Courtney Bird");
        assert_eq!(
            select_client(Some("Kelly Baswick"), &available).unwrap(),
            "Kelly Baswick"
        );
        assert!(matches!(
            select_client(None, &[]).unwrap_err(),
            JourneyError::NoInput(_)
        ));
        assert!(select_client(Some(" "), &available).is_err());
    }

    #[test]
    fn test_build_journey() {
        let check_ins = Table::from_str_rows(
            &["Sleep", "Program"],
            &[
                &["2024-03-01", "Day program"],
                &["2024-03-01", "Night shelter"],
                &["2024-03-03", "Night shelter"],
            ],
        );
        let notes = Table::from_str_rows(
            &["text"],
            &[&["Discussed housing options"], &["Housing forms signed"], &[""]],
        );
        let ranker = WordRanker::new(StopwordSet::builtin().unwrap());

        let report =
            build_journey("Kelly Baswick", &check_ins, &notes, None, &ranker, 50).unwrap();

        let values: Vec<i64> = report.check_ins.rows.iter().map(|b| b.value).collect();
        assert_eq!(values, vec![1, 15, 30, 60]);
        assert_eq!(report.words.rows[0].token, "housing");
        assert_eq!(report.words.rows[0].count, 2);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("timeline").is_none());
        assert_eq!(json["check_ins"]["rows"][1]["date"], "2024-03-01");
    }

    #[test]
    fn test_build_journey_empty_inputs_are_valid() {
        let check_ins = Table::new(["Sleep", "Program"]);
        let notes = Table::new(["text"]);
        let ranker = WordRanker::new(StopwordSet::default());

        let report = build_journey("Courtney Bird", &check_ins, &notes, None, &ranker, 50).unwrap();
        assert!(report.check_ins.rows.is_empty());
        assert!(report.words.rows.is_empty());
    }

    #[test]
    fn test_build_journey_missing_text_column() {
        let check_ins = Table::new(["Sleep", "Program"]);
        let notes = Table::new(["note"]);
        let ranker = WordRanker::new(StopwordSet::default());

        let err = build_journey("Courtney Bird", &check_ins, &notes, None, &ranker, 50).unwrap_err();
        assert!(matches!(err, JourneyError::MissingField { column } if column == "text"));
    }
}

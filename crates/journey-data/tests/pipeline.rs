use std::fs;
use std::path::Path;

use tempfile::TempDir;

use journey_data::analysis::{build_dashboard, build_journey};
use journey_data::core::identifiers::ClientDirectory;
use journey_data::core::models::ChartKind;
use journey_data::core::stopwords::StopwordSet;
use journey_data::core::JourneyError;
use journey_data::reader::{read_csv_file, read_timeline, DataDir};
use journey_data::words::{WordRanker, DEFAULT_TOP_N};

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write fixture");
}

fn fixture_dir() -> TempDir {
    let tmp = TempDir::new().expect("tempdir");
    let dir = tmp.path();

    write(
        dir,
        "housed_date.csv",
        "client,housed_date\n\
         Kelly Baswick,\"2021-01-01 2021-01-05,2021-02-01 2021-02-02\"\n\
         Courtney Bird,2021-03-10 2021-03-01\n\
         Less Four Horns,\n",
    );
    write(
        dir,
        "bar_stack.csv",
        "Patient.ID,Reason,Visits\n\
         16555,Food,3\n\
         84999,Shower,2\n\
         16555,Shower,NaN\n\
         16555,Food,1\n\
         12345,Laundry,4\n",
    );
    write(
        dir,
        "storage.csv",
        "Client,Bars,Logs\n\
         Kelly Baswick,2,1\n\
         Kelly Baswick,1,\n",
    );
    write(
        dir,
        "kelly.csv",
        "Sleep,Program\n\
         2024-03-01,Day program\n\
         2024-03-01,Night shelter\n\
         2024-03-03,Night shelter\n",
    );
    write(
        dir,
        "Kelly Baswick.csv",
        "text\n\
         Kelly asked about housing.\n\
         Housing forms signed on 2024-03-02.\n",
    );
    write(
        dir,
        "Kelly Baswick.json",
        r#"{"events":[{"date":"2024-03-01","label":"Intake"}]}"#,
    );

    tmp
}

#[test]
fn test_dashboard_from_data_dir() {
    let tmp = fixture_dir();
    let data = DataDir::new(tmp.path());

    let report = build_dashboard(
        &read_csv_file(&data.housing()).unwrap(),
        &read_csv_file(&data.visits()).unwrap(),
        &read_csv_file(&data.storage()).unwrap(),
        &ClientDirectory::default(),
    )
    .unwrap();

    // Housing: Kelly has two stays (5 + 2 days), Courtney's range is inverted.
    assert_eq!(report.housing.periods.rows.len(), 2);
    assert_eq!(report.housing.total_days_housed.len(), 1);
    assert_eq!(report.housing.total_days_housed[0].client, "Kelly Baswick");
    assert_eq!(report.housing.total_days_housed[0].total_days_housed, 7);
    assert_eq!(report.housing.failures.len(), 1);
    assert_eq!(report.housing.failures[0].client, "Courtney Bird");

    // Visits: the NaN row is excluded, the unmapped id still counts by reason.
    let by_reason: Vec<(&str, f64)> = report
        .visits
        .by_reason
        .rows
        .iter()
        .map(|r| (r.group_keys[0].as_str(), r.measure_sum))
        .collect();
    assert_eq!(by_reason, vec![("Food", 4.0), ("Shower", 2.0), ("Laundry", 4.0)]);
    assert_eq!(
        report.visits.client_options,
        vec!["Kelly Baswick", "Courtney Bird"]
    );
    assert_eq!(report.visits.profiles[0].radial_max, Some(6.0));

    // Storage: one pie and one stacked bar per client.
    let kelly = &report.usage.clients[0];
    assert_eq!(kelly.totals.chart.kind, ChartKind::Pie);
    assert_eq!(kelly.totals.rows[0].measure_sum, 3.0);
    assert_eq!(kelly.totals.rows[1].measure_sum, 1.0);
    assert_eq!(kelly.long_form.chart.kind, ChartKind::StackedBar);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["housing"]["periods"]["chart"]["kind"], "timeline");
    assert_eq!(json["housing"]["periods"]["rows"][1]["duration_days"], 2);
}

#[test]
fn test_journey_from_data_dir() {
    let tmp = fixture_dir();
    let data = DataDir::new(tmp.path());

    assert_eq!(data.available_clients(), vec!["Kelly Baswick"]);
    let client = data.available_clients()[0];

    let ranker = WordRanker::new(StopwordSet::builtin().unwrap());
    let report = build_journey(
        client,
        &read_csv_file(&data.check_ins(client)).unwrap(),
        &read_csv_file(&data.case_notes(client)).unwrap(),
        Some(read_timeline(&data.timeline(client)).unwrap()),
        &ranker,
        DEFAULT_TOP_N,
    )
    .unwrap();

    let values: Vec<i64> = report.check_ins.rows.iter().map(|b| b.value).collect();
    assert_eq!(values, vec![1, 15, 30, 60]);

    assert_eq!(report.words.rows[0].token, "housing");
    assert_eq!(report.words.rows[0].count, 2);
    assert!(report.words.rows.iter().all(|r| r.token != "kelly"));
    assert!(report
        .words
        .rows
        .iter()
        .all(|r| !r.token.chars().any(|c| c.is_ascii_digit())));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["timeline"]["events"][0]["label"], "Intake");
    assert_eq!(json["words"]["chart"]["kind"], "treemap");
}

#[test]
fn test_missing_export_is_file_read_error() {
    let tmp = TempDir::new().expect("tempdir");
    let data = DataDir::new(tmp.path());

    let err = read_csv_file(&data.housing()).unwrap_err();
    assert!(matches!(err, JourneyError::FileRead { .. }));
    assert!(data.available_clients().is_empty());
}

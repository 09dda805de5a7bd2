mod bootstrap;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::task;

use journey_core::identifiers::ClientDirectory;
use journey_core::settings::Settings;
use journey_data::analysis::{
    calendar_series, housing_section, select_client, usage_section, visits_section,
    word_series, DashboardReport, JourneyReport,
};
use journey_data::reader::{read_csv_file, read_timeline, DataDir};
use journey_data::words::WordRanker;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Client Journey v{} starting", env!("CARGO_PKG_VERSION"));

    let data = DataDir::new(settings.data_dir_or_default());
    tracing::info!(
        "View: {}, data directory: {}",
        settings.view,
        data.root().display()
    );

    let json = match settings.view.as_str() {
        "dashboard" => render(&run_dashboard(&data).await?, settings.pretty)?,
        "journey" => render(&run_journey(&data, &settings).await?, settings.pretty)?,
        unknown => anyhow::bail!("Unknown view: {}", unknown),
    };

    write_report(&json, settings.output.as_deref())
}

// ── Views ──────────────────────────────────────────────────────────────────────

/// Load the three shared exports and build each dashboard section on the
/// blocking pool.
async fn run_dashboard(data: &DataDir) -> Result<DashboardReport> {
    let housing = read_csv_file(&data.housing())?;
    let visits = read_csv_file(&data.visits())?;
    let storage = read_csv_file(&data.storage())?;
    let directory = ClientDirectory::default();

    let housing_task = task::spawn_blocking(move || housing_section(&housing));
    let visits_task = task::spawn_blocking(move || visits_section(&visits, &directory));
    let usage_task = task::spawn_blocking(move || usage_section(&storage));

    let (housing, visits, usage) = tokio::try_join!(housing_task, visits_task, usage_task)?;
    let report = DashboardReport::new(housing?, visits?, usage?);

    if !report.housing.failures.is_empty() {
        tracing::warn!(
            "{} client(s) had unreadable housing records",
            report.housing.failures.len()
        );
    }
    Ok(report)
}

/// Build one client's journey. Without `--client`, the first roster client
/// with a check-in export is used.
async fn run_journey(data: &DataDir, settings: &Settings) -> Result<JourneyReport> {
    let client = select_client(settings.client.as_deref(), &data.available_clients())
        .with_context(|| format!("choosing a client in {}", data.root().display()))?;
    tracing::info!("Building journey for {}", client);

    let check_ins = read_csv_file(&data.check_ins(&client))?;
    let case_notes = read_csv_file(&data.case_notes(&client))?;

    let timeline_path = data.timeline(&client);
    let timeline = if timeline_path.is_file() {
        Some(read_timeline(&timeline_path)?)
    } else {
        tracing::debug!("No timeline document at {}", timeline_path.display());
        None
    };

    let ranker = WordRanker::new(settings.stopword_set()?);
    let top_n = settings.top_n as usize;

    let calendar_client = client.clone();
    let calendar_task =
        task::spawn_blocking(move || calendar_series(&calendar_client, &check_ins));
    let words_task = task::spawn_blocking(move || word_series(&case_notes, &ranker, top_n));

    let (calendar, words) = tokio::try_join!(calendar_task, words_task)?;
    Ok(JourneyReport::new(&client, timeline, calendar?, words?))
}

// ── Output ─────────────────────────────────────────────────────────────────────

fn render<T: Serialize>(report: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    Ok(json)
}

fn write_report(json: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("writing report to {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

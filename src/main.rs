// Entry point and high-level CLI flow.
//
// The console menu is the stand-in for the dashboard frontend:
// - Option [1] loads the CSV and rebuilds the engine, printing diagnostics.
// - Option [2] exports the district overview report with a table preview.
// - Option [3] prints and exports the quality summary.
// - Option [4] dumps one district's display payload as JSON.
// Everything interesting happens inside the library; this file only wires
// stdin/stdout to it.
use once_cell::sync::Lazy;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

use district_insights::types::{DisplayPayload, DistrictOverviewRow};
use district_insights::{loader, output, quality, util, AnalyticsConfig, Engine, RuleConfig};

static ENGINE: Lazy<Engine> =
    Lazy::new(|| Engine::new(RuleConfig::dashboard_defaults(), AnalyticsConfig::default()));

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn prompt_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the menu after a report.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Menu (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load the CSV snapshot and rebuild the store.
fn handle_load() {
    let path = "district_metrics.csv";
    match loader::load_rows(path) {
        Ok(rows) => {
            let metrics = ENGINE.rebuild(&rows);
            println!(
                "Processing dataset... ({} rows ingested, {} districts tracked)",
                util::format_int(metrics.total_rows as i64),
                util::format_int(ENGINE.list_districts(None).len() as i64)
            );
            if metrics.invalid_rows > 0 {
                println!(
                    "Note: {} rows skipped due to missing district ids.",
                    util::format_int(metrics.invalid_rows as i64)
                );
            }
            if ENGINE.should_alert() {
                println!(
                    "Warning: completeness {:.1}% is below the {:.0}% alert threshold.",
                    metrics.completeness_score,
                    quality::ALERT_THRESHOLD
                );
            }
            println!("");
        }
        // The previous snapshot stays in place when the source is
        // unavailable.
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

fn overview_row(payload: &DisplayPayload) -> DistrictOverviewRow {
    DistrictOverviewRow {
        district_id: payload.district_id.clone(),
        district_name: payload.district_name.clone(),
        state: payload.state_name.clone(),
        employment: payload.employment.display.clone(),
        employment_band: payload.employment.label.clone(),
        payment_speed: payload.payment_speed.display.clone(),
        payment_band: payload.payment_speed.label.clone(),
        vs_state: payload.state_comparison.label.clone(),
    }
}

/// Handle option [2]: the per-district overview grid.
fn handle_overview() {
    let state = prompt_line("State filter (blank for all): ");
    let filter = if state.is_empty() { None } else { Some(state.as_str()) };
    let rows: Vec<DistrictOverviewRow> = ENGINE
        .list_districts(filter)
        .iter()
        .filter_map(|d| ENGINE.get_display_payload(&d.id))
        .map(|p| overview_row(&p))
        .collect();
    if rows.is_empty() {
        println!("No districts loaded. Please load the CSV file first (option 1).\n");
        return;
    }
    println!("District Overview ({} districts)\n", rows.len());
    if let Err(e) = output::export_with_preview("district_overview.csv", &rows, 5) {
        eprintln!("Write error: {}", e);
    }
}

/// Handle option [3]: quality counters for the last ingestion cycle.
fn handle_quality() {
    let metrics = ENGINE.get_quality();
    if let Err(e) = output::write_json("quality_summary.json", &metrics) {
        eprintln!("Write error: {}", e);
    }
    println!(
        "Quality: {} total rows, {} valid, {} rejected, completeness {:.1}%",
        util::format_int(metrics.total_rows as i64),
        util::format_int(metrics.valid_rows as i64),
        util::format_int(metrics.invalid_rows as i64),
        metrics.completeness_score
    );
    if ENGINE.should_alert() {
        println!("Alert: completeness is below {:.0}%.", quality::ALERT_THRESHOLD);
    }
    println!("(Summary exported to quality_summary.json)\n");
}

/// Handle option [4]: one district's full display payload.
fn handle_insights() {
    let id = prompt_line("District id: ");
    match ENGINE.get_display_payload(&id) {
        Some(payload) => match serde_json::to_string_pretty(&payload) {
            Ok(s) => println!("{}\n", s),
            Err(e) => eprintln!("Serialization error: {}", e),
        },
        None => println!("No district found for id {}.\n", id),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    loop {
        println!("District Insights");
        println!("[1] Load district metrics");
        println!("[2] District overview report");
        println!("[3] Quality summary");
        println!("[4] District insights\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!("");
                handle_overview();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                println!("");
                handle_quality();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "4" => {
                println!("");
                handle_insights();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1-4.\n");
            }
        }
    }
}

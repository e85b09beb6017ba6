// Entry point and terminal front end.
//
// With `--mode` the selected report is rendered once (and optionally
// exported). Without it an interactive menu stands in for the two selector
// controls: every change goes through the dashboard, which recomputes the
// charts and prints them through its subscriber.
use anyhow::Context;
use auto_sales_dashboard::config::{Cli, DataSource, DASHBOARD_TITLE};
use auto_sales_dashboard::dashboard::Dashboard;
use auto_sales_dashboard::types::{Dataset, ReportMode};
use auto_sales_dashboard::{loader, output, util};
use clap::Parser;
use once_cell::sync::OnceCell;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// Loaded once at startup and never mutated afterwards.
static DATASET: OnceCell<Dataset> = OnceCell::new();

const DEFAULT_EXPORT_DIR: &str = "charts";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_dataset(source: &DataSource) -> anyhow::Result<&'static Dataset> {
    DATASET.get_or_try_init(|| {
        let (data, report) = loader::load(source)
            .with_context(|| format!("failed to load sales data from {source}"))?;
        println!(
            "Processing dataset... ({} rows read, {} loaded)",
            util::format_int(report.total_rows),
            util::format_int(report.loaded_rows)
        );
        if report.parse_errors > 0 {
            println!(
                "Note: {} rows skipped due to parse/validation errors.",
                util::format_int(report.parse_errors)
            );
        }
        if report.missing_measures > 0 {
            println!(
                "Info: {} empty measure cells excluded from aggregates.",
                util::format_int(report.missing_measures)
            );
        }
        if report.missing_rates > 0 {
            println!(
                "Info: {} rows without an unemployment rate left out of rate groupings.",
                util::format_int(report.missing_rates)
            );
        }
        println!();
        Ok(data)
    })
}

/// Prompt and read one trimmed line. `None` on end of input.
fn prompt(label: &str) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn print_state(dash: &Dashboard<'_>) {
    let year = match (dash.year_selector_enabled(), dash.year()) {
        (false, _) => "(disabled)".to_string(),
        (true, Some(y)) => y.to_string(),
        (true, None) => "(none)".to_string(),
    };
    println!("Statistics: {} | Year: {}", dash.mode(), year);
}

fn choose_mode(dash: &mut Dashboard<'_>) {
    for (idx, mode) in ReportMode::ALL.iter().enumerate() {
        println!("[{}] {}", idx + 1, mode);
    }
    let Some(choice) = prompt("Enter choice: ") else { return };
    match choice.as_str() {
        "1" => dash.set_mode(ReportMode::Yearly),
        "2" => dash.set_mode(ReportMode::Recession),
        _ => println!("Invalid choice. Please enter 1 or 2.\n"),
    }
}

fn choose_year(dash: &mut Dashboard<'_>) {
    if !dash.year_selector_enabled() {
        println!("Year selection only applies to {}.\n", ReportMode::Yearly);
        return;
    }
    let years = dash.year_options();
    let listed: Vec<String> = years.iter().map(|y| y.to_string()).collect();
    println!("Available years: {}", listed.join(", "));
    let Some(input) = prompt("Enter year: ") else { return };
    match input.parse::<i32>() {
        Ok(y) if years.contains(&y) => dash.set_year(Some(y)),
        _ => println!("Invalid year: {input}\n"),
    }
}

fn export(dir: &Path, dash: &Dashboard<'_>) {
    match output::export_charts(dir, dash.charts()) {
        Ok(files) => {
            for f in &files {
                println!("Saved {}", f.display());
            }
            println!();
        }
        Err(e) => {
            error!(error = %e, "export failed");
            eprintln!("Write error: {e}\n");
        }
    }
}

fn run_interactive(data: &'static Dataset, export_dir: PathBuf, preview_rows: usize) {
    let mut dash = Dashboard::new(data);
    dash.subscribe(move |_, charts| output::preview_charts(charts, preview_rows));

    println!("{DASHBOARD_TITLE}\n");
    print_state(&dash);
    output::preview_charts(dash.charts(), preview_rows);

    loop {
        println!("[1] Select Statistics");
        println!("[2] Select Year");
        println!("[3] Export Charts");
        println!("[4] Exit\n");
        let Some(choice) = prompt("Enter choice: ") else { break };
        match choice.as_str() {
            "1" => choose_mode(&mut dash),
            "2" => choose_year(&mut dash),
            "3" => export(&export_dir, &dash),
            "4" => break,
            _ => println!("Invalid choice. Please enter 1-4.\n"),
        }
        print_state(&dash);
    }
    println!("Exiting the program.");
}

fn run_once(cli: &Cli, data: &'static Dataset, mode: ReportMode) -> anyhow::Result<()> {
    let mut dash = Dashboard::new(data);
    dash.set_mode(mode);
    if cli.year.is_some() {
        dash.set_year(cli.year);
    }
    info!(mode = %dash.mode(), year = ?dash.year(), charts = dash.charts().len(), "report computed");

    println!("{DASHBOARD_TITLE}\n");
    print_state(&dash);
    output::preview_charts(dash.charts(), cli.preview_rows);

    if let Some(dir) = &cli.export_dir {
        output::export_charts(dir, dash.charts())
            .with_context(|| format!("failed to export charts to {}", dir.display()))?;
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let data = load_dataset(&cli.data)?;
    match cli.mode {
        Some(mode) => run_once(&cli, data, mode),
        None => {
            let dir = cli.export_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR));
            run_interactive(data, dir, cli.preview_rows);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

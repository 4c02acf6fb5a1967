use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use reqwest::Client;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

use a11ydash::{
    config::{Config, SHEET_DETAILS, SHEET_OVERVIEW, SHEET_TOUCHPOINTS},
    fetch::{refresh, sheets, Envelope},
    parse::{
        filter_rows, parse_detail, parse_overview, parse_touchpoints, sort_rows, SortKey,
    },
    render,
    view::{Tabs, DATA_UNAVAILABLE},
};

#[derive(Parser)]
#[command(
    name = "a11ydash",
    version,
    about = "Dashboard Accessibilità A11Y — segnalazioni touchpoint dal foglio di audit"
)]
struct Cli {
    /// Storage export serving the "Panoramica" and "Touchpoint" sheets.
    #[arg(long)]
    data_url: Option<Url>,
    /// Spreadsheet-script export serving the findings sheet.
    #[arg(long)]
    detail_url: Option<Url>,
    /// Regeneration trigger for the export.
    #[arg(long)]
    refresh_url: Option<Url>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// KPI totals, level distribution and per-touchpoint counts.
    Overview {
        #[arg(long)]
        json: bool,
    },
    /// Per-touchpoint breakdown by conformance level.
    Touchpoints {
        /// Keep only touchpoints whose name contains the query.
        #[arg(long)]
        query: Option<String>,
        #[arg(long, value_enum, default_value = "total")]
        sort: SortKey,
        /// Sort ascending instead of descending.
        #[arg(long)]
        asc: bool,
        #[arg(long)]
        json: bool,
    },
    /// Flat findings table, headers taken verbatim from the export.
    Details {
        #[arg(long)]
        json: bool,
    },
    /// All three views in sequence.
    All,
    /// Ask the export service to regenerate the spreadsheet JSON.
    Refresh,
    /// Interactive tab loop (1/2/3 switch view, r refresh, q quit).
    Tabs,
}

#[tokio::main]
async fn main() {
    // ─── init logging ────────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let cli = Cli::parse();

    let mut config = Config::default();
    if let Some(url) = cli.data_url {
        config.data_url = url;
    }
    if let Some(url) = cli.detail_url {
        config.detail_url = url;
    }
    if let Some(url) = cli.refresh_url {
        config.refresh_url = url;
    }
    let client = Client::new();

    let outcome = match cli.command {
        Command::Overview { json } => surface(overview_cmd(&client, &config, json).await),
        Command::Touchpoints {
            query,
            sort,
            asc,
            json,
        } => surface(touchpoints_cmd(&client, &config, query.as_deref(), sort, asc, json).await),
        Command::Details { json } => surface(details_cmd(&client, &config, json).await),
        Command::All => all_cmd(&client, &config).await,
        Command::Refresh => match refresh::trigger(&client, &config.refresh_url).await {
            Ok(()) => {
                println!("Rigenerazione del foglio avviata.");
                Ok(())
            }
            Err(err) => {
                eprintln!("Rigenerazione non riuscita.");
                Err(err)
            }
        },
        Command::Tabs => Tabs::new(client.clone(), config.clone()).run().await,
    };

    if let Err(err) = outcome {
        error!(error = %err, "command failed");
        std::process::exit(1);
    }
}

/// Each view handles its own failure: one user-visible message, details in
/// the log.
fn surface<T>(outcome: Result<T>) -> Result<T> {
    if outcome.is_err() {
        eprintln!("{DATA_UNAVAILABLE}");
    }
    outcome
}

fn footer() -> String {
    format!("Aggiornato alle {}", Local::now().format("%d/%m/%Y %H:%M:%S"))
}

async fn overview_cmd(client: &Client, config: &Config, json: bool) -> Result<()> {
    let rows =
        sheets::fetch_sheet(client, &config.data_url, Envelope::Storage, SHEET_OVERVIEW).await?;
    let report = parse_overview(&rows);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_overview(&report));
        println!("\n{}", footer());
    }
    Ok(())
}

async fn touchpoints_cmd(
    client: &Client,
    config: &Config,
    query: Option<&str>,
    sort: SortKey,
    ascending: bool,
    json: bool,
) -> Result<()> {
    let rows = sheets::fetch_sheet(
        client,
        &config.data_url,
        Envelope::Storage,
        SHEET_TOUCHPOINTS,
    )
    .await?;
    let mut parsed = parse_touchpoints(&rows);
    if let Some(query) = query {
        parsed = filter_rows(&parsed, query);
    }
    sort_rows(&mut parsed, sort, ascending);
    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        print!("{}", render::render_touchpoints(&parsed));
        println!("\n{}", footer());
    }
    Ok(())
}

async fn details_cmd(client: &Client, config: &Config, json: bool) -> Result<()> {
    let rows =
        sheets::fetch_sheet(client, &config.detail_url, Envelope::Direct, SHEET_DETAILS).await?;
    let sheet = parse_detail(&rows);
    if json {
        println!("{}", serde_json::to_string_pretty(&sheet)?);
    } else {
        print!("{}", render::render_detail(&sheet));
        println!("\n{}", footer());
    }
    Ok(())
}

/// The three views stay independent: one failing fetch never blanks the
/// others.
async fn all_cmd(client: &Client, config: &Config) -> Result<()> {
    let (overview, touchpoints, details) = futures::join!(
        sheets::fetch_sheet(client, &config.data_url, Envelope::Storage, SHEET_OVERVIEW),
        sheets::fetch_sheet(
            client,
            &config.data_url,
            Envelope::Storage,
            SHEET_TOUCHPOINTS
        ),
        sheets::fetch_sheet(client, &config.detail_url, Envelope::Direct, SHEET_DETAILS),
    );

    match overview {
        Ok(rows) => print!("{}", render::render_overview(&parse_overview(&rows))),
        Err(err) => {
            error!(error = %err, sheet = SHEET_OVERVIEW, "fetch failed");
            println!("{DATA_UNAVAILABLE}");
        }
    }
    println!();
    match touchpoints {
        Ok(rows) => print!("{}", render::render_touchpoints(&parse_touchpoints(&rows))),
        Err(err) => {
            error!(error = %err, sheet = SHEET_TOUCHPOINTS, "fetch failed");
            println!("{DATA_UNAVAILABLE}");
        }
    }
    println!();
    match details {
        Ok(rows) => print!("{}", render::render_detail(&parse_detail(&rows))),
        Err(err) => {
            error!(error = %err, sheet = SHEET_DETAILS, "fetch failed");
            println!("{DATA_UNAVAILABLE}");
        }
    }
    println!("\n{}", footer());
    Ok(())
}

//! OpenSound CLI
//!
//! Command-line front end for the OpenSound analytics core:
//! - List genres and regions
//! - Show a genre summary, globally or for one region
//! - Export a summary to JSON or CSV
//! - Query the ETL analytics service

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use opensound::client::{EtlClient, EtlSnapshot, MusicApiClient};
use opensound::config::{generate_default_config, Config, LogFormat, LoggingConfig};
use opensound::export::ExportFormat;
use opensound::session::{DashboardSession, DashboardView, Selection};
use opensound::timeline::{MetricField, TimeWindow};
use opensound::Dataset;

#[derive(Parser)]
#[command(name = "opensound")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Music streaming analytics from the OpenSound data API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data API base URL (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// ETL service base URL (overrides config)
    #[arg(long, global = true)]
    pub etl_url: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List genres
    Genres,

    /// List regions
    Regions,

    /// Summarize a genre, globally or within a region
    Summary {
        /// Genre id
        #[arg(short, long)]
        genre: String,
        /// Region id ("global" or omitted for all regions)
        #[arg(short, long)]
        region: Option<String>,
        /// Time window (all, early, peak, decline)
        #[arg(short, long, default_value = "all")]
        window: String,
        /// Only show these metrics (e.g. totalStreams, avg_popularity)
        #[arg(short, long)]
        metric: Vec<String>,
    },

    /// Export a genre summary
    Export {
        /// Genre id
        #[arg(short, long)]
        genre: String,
        /// Region id ("global" or omitted for all regions)
        #[arg(short, long)]
        region: Option<String>,
        /// Time window used for the exported statistics
        #[arg(short, long, default_value = "all")]
        window: String,
        /// Output file or directory (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write CSV instead of JSON
        #[arg(long)]
        csv: bool,
    },

    /// Query the ETL analytics service
    Etl {
        #[command(subcommand)]
        command: EtlCommands,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum EtlCommands {
    /// Most popular genres
    TopGenres {
        #[arg(short, long)]
        dataset: Option<Dataset>,
        #[arg(short = 'n', long)]
        top_n: Option<u32>,
    },
    /// Most popular decades
    TopDecades {
        #[arg(short, long)]
        dataset: Option<Dataset>,
        #[arg(short = 'n', long)]
        top_n: Option<u32>,
    },
    /// Correlation between track duration and popularity
    Correlation {
        #[arg(short, long)]
        dataset: Option<Dataset>,
    },
    /// All three analyses at once
    Snapshot {
        #[arg(short, long)]
        dataset: Option<Dataset>,
        #[arg(short = 'n', long)]
        top_n: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(url) = &cli.etl_url {
        config.etl.base_url = url.clone();
    }

    init_tracing(&config.logging);
    tracing::debug!(api = %config.api.base_url, etl = %config.etl.base_url, "Configured upstreams");

    let json = match cli.format.as_str() {
        "json" => true,
        "table" => false,
        other => bail!("Unknown output format: {} (expected table or json)", other),
    };

    match cli.command {
        Commands::Genres => {
            let session = data_session(&config)?;
            let (genres, error) = session.aggregator().genres().await.into_parts();
            report_notice(error.map(|e| e.to_string()));

            if json {
                println!("{}", serde_json::to_string_pretty(&genres)?);
            } else if genres.is_empty() {
                println!("No genres available.");
            } else {
                println!("{:<8} {}", "ID", "Name");
                println!("{}", "-".repeat(40));
                for genre in genres {
                    println!("{:<8} {}", genre.id, genre.name);
                }
            }
        }

        Commands::Regions => {
            let session = data_session(&config)?;
            let (regions, error) = session.aggregator().regions().await.into_parts();
            report_notice(error.map(|e| e.to_string()));

            if json {
                println!("{}", serde_json::to_string_pretty(&regions)?);
            } else if regions.is_empty() {
                println!("No regions available.");
            } else {
                println!("{:<8} {:<30} {}", "ID", "Name", "Continent");
                println!("{}", "-".repeat(60));
                for region in regions {
                    println!(
                        "{:<8} {:<30} {}",
                        region.id,
                        region.display_name(),
                        region.continent.as_deref().unwrap_or("-")
                    );
                }
            }
        }

        Commands::Summary {
            genre,
            region,
            window,
            metric,
        } => {
            let fields = parse_metrics(&metric)?;
            let session = data_session(&config)?;
            let view = load_view(&session, &genre, region, &window).await?;
            report_notice(view.notice.clone());

            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_view(&view, &fields);
            }
        }

        Commands::Export {
            genre,
            region,
            window,
            output,
            csv,
        } => {
            let session = data_session(&config)?;
            let view = load_view(&session, &genre, region, &window).await?;
            report_notice(view.notice);

            let document = match session.export().await {
                Some(document) => document,
                None => bail!("Nothing to export for genre {}", genre),
            };
            let format = if csv { ExportFormat::Csv } else { ExportFormat::Json };

            match output {
                Some(path) if path.is_dir() => {
                    let written = document.write_to_dir(&path, format)?;
                    println!("Exported {} to {:?}", format.content_type(), written);
                }
                Some(path) => {
                    document.write_to(&path, format)?;
                    println!("Exported {} to {:?}", format.content_type(), path);
                }
                None => {
                    print!("{}", document.render(format)?);
                }
            }
        }

        Commands::Etl { command } => {
            let client = EtlClient::new((&config.etl).into())?;
            let dataset_or = |d: Option<Dataset>| d.unwrap_or(config.etl.dataset);
            let top_n_or = |n: Option<u32>| n.unwrap_or(config.etl.top_n).max(1);

            match command {
                EtlCommands::TopGenres { dataset, top_n } => {
                    let response = client.top_genres(dataset_or(dataset), top_n_or(top_n)).await?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&response)?);
                    } else {
                        print_ranking("Genre", &response.ranked(), response.total_tracks_analyzed);
                    }
                }
                EtlCommands::TopDecades { dataset, top_n } => {
                    let response = client.top_decades(dataset_or(dataset), top_n_or(top_n)).await?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&response)?);
                    } else {
                        let ranked: Vec<(String, f64)> = response
                            .ranked()
                            .into_iter()
                            .map(|(decade, popularity)| (format!("{}s", decade), popularity))
                            .collect();
                        print_ranking("Decade", &ranked, response.total_tracks_analyzed);
                    }
                }
                EtlCommands::Correlation { dataset } => {
                    let response = client
                        .duration_popularity_correlation(dataset_or(dataset))
                        .await?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&response)?);
                    } else {
                        println!("Duration / popularity correlation: {:.3}", response.correlation);
                        println!("Tracks analyzed: {}", response.total_tracks_analyzed);
                    }
                }
                EtlCommands::Snapshot { dataset, top_n } => {
                    let snapshot = client
                        .snapshot(dataset_or(dataset), top_n_or(top_n))
                        .await
                        .context("ETL analytics unavailable")?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&snapshot)?);
                    } else {
                        print_snapshot(&snapshot);
                    }
                }
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &content)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", content);
                }
            }
        }
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("opensound={}", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn data_session(config: &Config) -> anyhow::Result<DashboardSession<MusicApiClient>> {
    let client = MusicApiClient::new((&config.api).into()).context("building data API client")?;
    Ok(DashboardSession::new(client))
}

async fn load_view(
    session: &DashboardSession<MusicApiClient>,
    genre: &str,
    region: Option<String>,
    window: &str,
) -> anyhow::Result<DashboardView> {
    let mut selection = Selection::genre(genre).window(TimeWindow::parse(window));
    if let Some(region) = region {
        selection = selection.region(region);
    }

    match session.apply(selection).await {
        Some(view) => Ok(view),
        None => bail!("No summary loaded for genre {}", genre),
    }
}

fn report_notice(notice: Option<String>) {
    if let Some(notice) = notice {
        eprintln!("warning: {}", notice);
    }
}

/// Metric names as accepted by `--metric`; none means all of them
fn parse_metrics(names: &[String]) -> anyhow::Result<Vec<MetricField>> {
    if names.is_empty() {
        return Ok(MetricField::ALL.to_vec());
    }

    names
        .iter()
        .map(|name| match MetricField::from_key(name.trim()) {
            Some(field) => Ok(field),
            None => bail!("Unknown metric: {}", name),
        })
        .collect()
}

fn print_view(view: &DashboardView, fields: &[MetricField]) {
    let scope = view.selection.region.as_deref().unwrap_or("global");
    println!(
        "Genre {} / region {} / window {}",
        view.selection.genre.as_deref().unwrap_or("-"),
        scope,
        view.selection.window
    );
    println!();

    println!("{:<18} {:>14} {:>14}", "Metric", "Total", "Current");
    println!("{}", "-".repeat(48));
    for &field in fields {
        println!(
            "{:<18} {:>14.1} {:>14.1}",
            field.label(),
            view.totals.get(field),
            view.stats.get(field)
        );
    }
    println!();

    if view.timeline.is_empty() {
        println!("No timeline data for this selection");
        return;
    }

    print!("{:<12}", "Date");
    for field in fields {
        print!(" | {:>14}", field.label());
    }
    println!();
    println!("{}", "-".repeat(12 + fields.len() * 17));

    for (label, bucket) in view.chart.labels.iter().zip(&view.timeline) {
        print!("{:<12}", label);
        for field in fields {
            print!(" | {:>14.1}", field.of_bucket(bucket));
        }
        println!();
    }
}

fn print_ranking(kind: &str, ranked: &[(String, f64)], total_tracks: u64) {
    println!("{:<24} {:>10}", kind, "Popularity");
    println!("{}", "-".repeat(36));
    for (name, popularity) in ranked {
        println!("{:<24} {:>10.2}", name, popularity);
    }
    println!();
    println!("Tracks analyzed: {}", total_tracks);
}

fn print_snapshot(snapshot: &EtlSnapshot) {
    println!("Dataset: {} (top {})", snapshot.dataset, snapshot.top_n);
    println!();
    print_ranking("Genre", &snapshot.top_genres, snapshot.total_tracks_analyzed);
    println!();

    let decades: Vec<(String, f64)> = snapshot
        .top_decades
        .iter()
        .map(|(decade, popularity)| (format!("{}s", decade), *popularity))
        .collect();
    print_ranking("Decade", &decades, snapshot.total_tracks_analyzed);
    println!();
    println!("Duration / popularity correlation: {:.3}", snapshot.correlation);
}


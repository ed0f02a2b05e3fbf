//! Penguin Statistics CLI
//!
//! Command-line interface over the client library:
//! - Query the drop matrix, optionally for selected stages
//! - List stages
//! - Submit and recall drop reports
//! - Ask the planner for a farming plan

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use penguin_stats::config::{generate_default_config, Config, LoggingConfig};
use penguin_stats::{
    DropRecord, DropReport, DropType, ItemDrop, MatrixQuery, PenguinClient, PlannerPlan,
    PlannerRequest, Server, Stage,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "penguin-stats")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query and report Arknights drop statistics on Penguin Statistics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Server region (US, CN, JP, KR)
    #[arg(short, long, global = true)]
    pub server: Option<Server>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the drop matrix
    Matrix {
        /// Only show these stage ids (repeatable)
        #[arg(long = "stage")]
        stages: Vec<String>,
        /// Include zones that are no longer open
        #[arg(long)]
        closed_zones: bool,
        /// Query the personal matrix of this user id
        #[arg(long)]
        user_id: Option<String>,
    },

    /// List stage metadata
    Stages,

    /// Submit a drop report
    Report {
        /// Stage id (e.g. main_01-07)
        stage_id: String,
        /// Drops as item_id:quantity[:drop_type]
        drops: Vec<String>,
    },

    /// Recall a drop report by hash
    Recall {
        /// Hash returned when the report was submitted
        report_hash: String,
    },

    /// Request a farming plan from a JSON request file
    Plan {
        path: PathBuf,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, skipped) = match &cli.config {
        Some(path) => (Config::load_with_env(path)?, Vec::new()),
        None => Config::load_default(),
    };
    init_logging(&config.logging);
    for error in &skipped {
        tracing::warn!("Skipped config file: {}", error);
    }

    let server = cli.server.unwrap_or(config.defaults.server);
    let client = PenguinClient::new(config.client.clone())?;

    match cli.command {
        Commands::Matrix {
            stages,
            closed_zones,
            user_id,
        } => {
            let mut query = MatrixQuery::new(server).show_closed_zones(closed_zones);
            if let Some(user_id) = user_id {
                query = query.personal(user_id);
            }

            let mut matrix = client.get_matrix_with(&query).await?;
            tracing::info!("Fetched {} drop records for {}", matrix.len(), server);

            if stages.is_empty() {
                match cli.format {
                    Format::Json => println!("{}", serde_json::to_string_pretty(&matrix)?),
                    Format::Table => print_records(matrix.raw().iter()),
                }
            } else {
                matrix.build_index();
                match cli.format {
                    Format::Json => {
                        let mut selected = serde_json::Map::new();
                        for stage in &stages {
                            selected.insert(stage.clone(), serde_json::to_value(matrix.lookup(stage))?);
                        }
                        println!("{}", serde_json::to_string_pretty(&selected)?);
                    }
                    Format::Table => {
                        for stage in &stages {
                            let records = matrix.lookup(stage);
                            if records.is_empty() {
                                println!("No drop records for stage {}", stage);
                            } else {
                                print_records(records.into_iter());
                            }
                        }
                    }
                }
            }
        }

        Commands::Stages => {
            let stages = client.get_stages(server).await?;
            tracing::info!("Fetched {} stages for {}", stages.len(), server);

            match cli.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&stages)?),
                Format::Table => print_stages(&stages),
            }
        }

        Commands::Report { stage_id, drops } => {
            let drops = drops
                .iter()
                .map(|spec| parse_drop(spec.as_str()))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let mut report = DropReport::new(server, stage_id).items(drops);
            if let Some(source) = &config.client.source {
                report = report.source(source.clone());
            }
            if let Some(version) = &config.client.version {
                report = report.version(version.clone());
            }

            let hash = client.report_drop(&report).await?;
            tracing::info!("Reported {} drops for {}", report.drops.len(), report.stage_id);

            match cli.format {
                Format::Json => println!("{}", serde_json::json!({ "reportHash": hash })),
                Format::Table => println!("Report hash: {}", hash),
            }
        }

        Commands::Recall { report_hash } => {
            client
                .recall_report(&report_hash, config.client.source.as_deref())
                .await?;
            println!("Recalled report {}", report_hash);
        }

        Commands::Plan { path } => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read planner request {:?}", path))?;
            let mut request: PlannerRequest = serde_json::from_str(&content)
                .with_context(|| format!("Invalid planner request in {:?}", path))?;
            if let Some(server) = cli.server {
                request.server = server;
            }

            let plan = client.plan(&request).await?;

            match cli.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                Format::Table => print_plan(&plan),
            }
        }

        Commands::Config { output } => {
            let config = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("penguin_stats={}", config.level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Parse `item_id:quantity[:drop_type]`
fn parse_drop(spec: &str) -> anyhow::Result<ItemDrop> {
    let mut parts = spec.split(':');

    let item_id = parts
        .next()
        .filter(|s| !s.is_empty())
        .with_context(|| format!("Missing item id in drop '{}'", spec))?;
    let quantity = parts
        .next()
        .with_context(|| format!("Missing quantity in drop '{}'", spec))?
        .parse::<i64>()
        .with_context(|| format!("Invalid quantity in drop '{}'", spec))?;
    let drop_type = match parts.next() {
        Some(kind) => kind.parse::<DropType>()?,
        None => DropType::NormalDrop,
    };

    if parts.next().is_some() {
        anyhow::bail!("Too many fields in drop '{}'", spec);
    }

    Ok(ItemDrop::new(item_id, quantity).drop_type(drop_type))
}

fn format_rate(record: &DropRecord) -> String {
    record
        .drop_rate()
        .map(|rate| format!("{:.3}", rate))
        .unwrap_or_else(|| "-".to_string())
}

fn print_records<'a>(records: impl Iterator<Item = &'a DropRecord>) {
    println!(
        "{:<20} {:<16} {:>10} {:>10} {:>8}",
        "Stage", "Item", "Quantity", "Times", "Rate"
    );
    println!("{}", "-".repeat(68));

    for record in records {
        println!(
            "{:<20} {:<16} {:>10} {:>10} {:>8}",
            record.stage_id,
            record.item_id,
            record.quantity,
            record.times,
            format_rate(record)
        );
    }
}

fn print_stages(stages: &[Stage]) {
    if stages.is_empty() {
        println!("No stages");
        return;
    }

    println!("{:<24} {:<10} {:<16} {:>6}", "Stage", "Code", "Zone", "AP");
    println!("{}", "-".repeat(60));

    for stage in stages {
        println!(
            "{:<24} {:<10} {:<16} {:>6}",
            stage.stage_id,
            stage.code,
            stage.zone_id,
            stage
                .ap_cost
                .map(|ap| ap.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
}

fn print_plan(plan: &PlannerPlan) {
    println!("Sanity cost: {:.0}", plan.cost);
    println!("LMD gained: {:.0}  LMD spent: {:.0}", plan.gold, plan.gcost);
    println!();

    if plan.stages.is_empty() {
        println!("No stages to farm");
    } else {
        println!("{:<12} {:>8}", "Stage", "Clears");
        println!("{}", "-".repeat(22));
        for stage in &plan.stages {
            println!("{:<12} {:>8.0}", stage.stage, stage.count);
        }
    }

    if !plan.syntheses.is_empty() {
        println!();
        println!("{:<24} {:>8}", "Craft", "Count");
        println!("{}", "-".repeat(34));
        for synthesis in &plan.syntheses {
            println!("{:<24} {:>8.0}", synthesis.target, synthesis.count);
        }
    }
}

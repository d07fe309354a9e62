use clap::{Parser, Subcommand};
use nu_plugin_biodiversity::algo::aggregate::UnknownPolicy;
use nu_plugin_biodiversity::algo::dataset::Dataset;
use nu_plugin_biodiversity::error::Result;
use nu_plugin_biodiversity::ops;
use serde_json::Value;
use std::io::{self, Read};

#[derive(Parser)]
#[command(
    name = "bellybutton",
    version,
    about = "Belly-button biodiversity dashboard engine"
)]
struct Cli {
    /// Dataset JSON to load: a path or a file:// URL
    #[arg(short, long, global = true, env = "BELLY_DATA", default_value = "samples.json")]
    data: String,

    /// Start as an MCP (Model Context Protocol) server on stdio, serving the loaded dataset.
    #[cfg(feature = "mcp")]
    #[arg(long)]
    mcp: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List sample names (sample selector options)
    Names,
    /// List metadata features (feature selector options)
    Features,
    /// Normalize one raw value for a feature
    Normalize {
        /// Raw value; parsed as JSON when possible, otherwise taken as a string
        value: String,
        /// Feature: ethnicity, gender, age, location, bbtype, wfreq
        #[arg(short, long)]
        feature: String,
    },
    /// Count values from a JSON array on stdin
    Frequency {
        /// Normalize each value for this feature before counting
        #[arg(short, long)]
        feature: Option<String>,
    },
    /// Distribution of a metadata feature across all volunteers
    Distribution {
        #[arg(short, long, default_value = "ethnicity")]
        feature: String,
        /// Keep "Unknown" entries in histogram series
        #[arg(long)]
        keep_unknown: bool,
    },
    /// Top-N OTUs of one sample, ordered for a horizontal bar chart
    Top {
        #[arg(short, long)]
        sample: String,
        /// Number of OTUs
        #[arg(short = 'n', long, default_value_t = ops::DEFAULT_TOP_N)]
        count: usize,
        /// Sort observations by count before ranking
        #[arg(long)]
        sort: bool,
    },
    /// All OTUs of one sample as a bubble series
    Bubble {
        #[arg(short, long)]
        sample: String,
    },
    /// Washing-frequency gauge for one volunteer
    Gauge {
        #[arg(short, long)]
        sample: String,
    },
    /// Normalized demographic info card for one volunteer
    Info {
        #[arg(short, long)]
        sample: String,
    },
    /// Every payload for one sample/feature selection
    Dashboard {
        #[arg(short, long)]
        sample: String,
        #[arg(short, long, default_value = "ethnicity")]
        feature: String,
        #[arg(short = 'n', long, default_value_t = ops::DEFAULT_TOP_N)]
        count: usize,
        #[arg(long)]
        keep_unknown: bool,
        #[arg(long)]
        sort: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    // ── MCP server mode ─────────────────────────────────────────────────
    #[cfg(feature = "mcp")]
    if cli.mcp {
        let dataset = Dataset::load(&cli.data).unwrap_or_else(|e| fail(e));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| fail(e));
        rt.block_on(async {
            if let Err(e) = nu_plugin_biodiversity::mcp::serve_stdio(dataset).await {
                fail(format!("MCP server error: {e}"));
            }
        });
        return;
    }

    // ── Normal subcommand dispatch ──────────────────────────────────────
    let command = cli.command.unwrap_or_else(|| {
        fail("No subcommand provided. Run `bellybutton --help` for usage.")
    });

    match run(&cli.data, command) {
        Ok(output) => print_json(&output),
        Err(e) => fail(e),
    }
}

fn run(data: &str, command: Commands) -> Result<Value> {
    match command {
        Commands::Features => Ok(ops::op_features()),
        Commands::Normalize { value, feature } => {
            let feature = ops::parse_feature(&feature)?;
            let raw = serde_json::from_str(&value).unwrap_or(Value::String(value));
            Ok(ops::op_normalize(Some(&raw), feature))
        }
        Commands::Frequency { feature } => {
            let feature = feature.as_deref().map(ops::parse_feature).transpose()?;
            let values = read_stdin_json()?;
            Ok(ops::op_frequency(&values, feature))
        }
        Commands::Names => Ok(ops::op_names(&Dataset::load(data)?)),
        Commands::Distribution {
            feature,
            keep_unknown,
        } => {
            let feature = ops::parse_feature(&feature)?;
            let ds = Dataset::load(data)?;
            Ok(ops::op_distribution(
                &ds,
                feature,
                UnknownPolicy::from_keep(keep_unknown),
            ))
        }
        Commands::Top {
            sample,
            count,
            sort,
        } => ops::op_top_species(&Dataset::load(data)?, &sample, count, sort),
        Commands::Bubble { sample } => ops::op_bubble(&Dataset::load(data)?, &sample),
        Commands::Gauge { sample } => ops::op_gauge(&Dataset::load(data)?, &sample),
        Commands::Info { sample } => ops::op_info_card(&Dataset::load(data)?, &sample),
        Commands::Dashboard {
            sample,
            feature,
            count,
            keep_unknown,
            sort,
        } => {
            let feature = ops::parse_feature(&feature)?;
            let ds = Dataset::load(data)?;
            ops::op_dashboard(
                &ds,
                &sample,
                feature,
                count,
                UnknownPolicy::from_keep(keep_unknown),
                sort,
            )
        }
    }
}

fn read_stdin_json() -> Result<Vec<Value>> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    let parsed: Value = serde_json::from_str(&buf)?;
    Ok(match parsed {
        Value::Array(arr) => arr,
        single => vec![single],
    })
}

fn print_json(v: &Value) {
    match serde_json::to_string_pretty(v) {
        Ok(s) => println!("{s}"),
        Err(e) => fail(e),
    }
}

fn fail(e: impl std::fmt::Display) -> ! {
    log::debug!("exiting on error: {e}");
    eprintln!("Error: {e}");
    std::process::exit(1);
}

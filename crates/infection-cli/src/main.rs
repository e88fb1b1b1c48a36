use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use infection_core::{AccountingMode, InfectionSettings, SiteVersion};
use infection_graph::{plot_data, BuiltGraph, GraphFixture, PropagationReport, Propagator};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "infection")]
#[command(about = "Roll a site version out across a coach/student graph", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (json, pretty)
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Settings file (TOML, JSON or YAML)
    #[arg(long, global = true, env = "INFECTION_CONFIG")]
    config: Option<PathBuf>,

    /// Override the capacity accounting mode from settings
    #[arg(long, global = true, value_enum)]
    accounting: Option<AccountingArg>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Clone, ValueEnum)]
enum AccountingArg {
    Footprint,
    NewlyTagged,
}

impl From<AccountingArg> for AccountingMode {
    fn from(arg: AccountingArg) -> Self {
        match arg {
            AccountingArg::Footprint => AccountingMode::Footprint,
            AccountingArg::NewlyTagged => AccountingMode::NewlyTagged,
        }
    }
}

#[derive(clap::Args, Clone)]
struct GraphArgs {
    /// Graph fixture file (TOML or .json)
    #[arg(short, long)]
    graph: PathBuf,

    /// Name of the user to start from
    #[arg(short, long)]
    start: String,

    /// Site version to roll out
    #[arg(long, default_value = "1")]
    site_version: SiteVersion,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag every user connected to the start user
    Total {
        #[command(flatten)]
        target: GraphArgs,
    },

    /// Tag whole classes while they fit in a capacity
    Limited {
        #[command(flatten)]
        target: GraphArgs,

        /// Maximum number of users to tag; falls back to settings
        #[arg(short, long)]
        capacity: Option<usize>,
    },

    /// Print the vis.js node/edge payload for the start user's component
    Plot {
        #[command(flatten)]
        target: GraphArgs,

        /// Run a limited propagation with this capacity first
        #[arg(long)]
        propagate: Option<usize>,
    },

    /// Run the bundled five-user demo and print its plot payload
    Demo {
        /// Capacity for the demo propagation
        #[arg(short, long, default_value_t = 3)]
        capacity: usize,
    },
}

#[derive(Serialize)]
struct PropagationOutput {
    start: String,
    site_version: SiteVersion,
    capacity: Option<usize>,
    accounting: AccountingMode,
    count: usize,
    tagged: Vec<String>,
    accepted_classes: Vec<String>,
    rejected_classes: Vec<String>,
}

impl PropagationOutput {
    fn new(
        built: &BuiltGraph,
        start: &str,
        site_version: SiteVersion,
        capacity: Option<usize>,
        accounting: AccountingMode,
        report: &PropagationReport,
    ) -> Self {
        Self {
            start: start.to_string(),
            site_version,
            capacity,
            accounting,
            count: report.count(),
            tagged: built.names_of(&report.tagged),
            accepted_classes: built.names_of(&report.accepted_classes),
            rejected_classes: built.names_of(&report.rejected_classes),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = InfectionSettings::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&settings, cli.verbose);

    match execute_command(&cli, &settings) {
        Ok(output) => {
            print_output(&cli.output, &output)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(settings: &InfectionSettings, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        settings.logging.level.as_str()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("infection_graph={level},infection_core={level},infection={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn propagator(cli: &Cli, settings: &InfectionSettings) -> Propagator {
    let mut propagation = settings.propagation.clone();
    if let Some(arg) = &cli.accounting {
        propagation.accounting = arg.clone().into();
    }
    Propagator::new(propagation)
}

fn load_graph(args: &GraphArgs) -> Result<BuiltGraph> {
    let fixture = GraphFixture::from_file(&args.graph)
        .with_context(|| format!("Failed to read graph {}", args.graph.display()))?;
    let built = fixture.build().context("Failed to build graph")?;
    info!(path = %args.graph.display(), users = built.graph.len(), "graph loaded");
    Ok(built)
}

fn execute_command(cli: &Cli, settings: &InfectionSettings) -> Result<serde_json::Value> {
    let propagator = propagator(cli, settings);
    let accounting = propagator.settings().accounting;

    match &cli.command {
        Commands::Total { target } => {
            let mut built = load_graph(target)?;
            let start = built.id(&target.start)?;
            let report = propagator.total(&mut built.graph, start, target.site_version)?;
            Ok(serde_json::to_value(PropagationOutput::new(
                &built,
                &target.start,
                target.site_version,
                None,
                accounting,
                &report,
            ))?)
        }

        Commands::Limited { target, capacity } => {
            let capacity = capacity
                .or(settings.propagation.default_capacity)
                .context("No capacity given and propagation.default_capacity is not set")?;
            let mut built = load_graph(target)?;
            let start = built.id(&target.start)?;
            let report =
                propagator.limited(&mut built.graph, start, capacity, target.site_version)?;
            Ok(serde_json::to_value(PropagationOutput::new(
                &built,
                &target.start,
                target.site_version,
                Some(capacity),
                accounting,
                &report,
            ))?)
        }

        Commands::Plot { target, propagate } => {
            let mut built = load_graph(target)?;
            let start = built.id(&target.start)?;
            if let Some(capacity) = propagate {
                propagator.limited(&mut built.graph, start, *capacity, target.site_version)?;
            }
            let data = plot_data(&built.graph, start, target.site_version, &settings.plot)?;
            Ok(serde_json::to_value(data)?)
        }

        Commands::Demo { capacity } => {
            let site_version = SiteVersion(1);
            let mut built = GraphFixture::demo().build()?;
            let start = built.id("host")?;
            propagator.limited(&mut built.graph, start, *capacity, site_version)?;
            let data = plot_data(&built.graph, start, site_version, &settings.plot)?;
            Ok(serde_json::to_value(data)?)
        }
    }
}

fn print_output(format: &OutputFormat, value: &serde_json::Value) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Pretty => {
            print_pretty(value)?;
        }
    }
    Ok(())
}

fn print_pretty(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    serde_json::Value::String(s) => {
                        println!("{}: {}", key_colored, s.green());
                    }
                    serde_json::Value::Number(n) => {
                        println!("{}: {}", key_colored, n.to_string().yellow());
                    }
                    serde_json::Value::Array(items) if items.iter().all(|i| i.is_string()) => {
                        let joined: Vec<&str> = items.iter().filter_map(|i| i.as_str()).collect();
                        println!("{}: [{}]", key_colored, joined.join(", "));
                    }
                    serde_json::Value::Array(items) => {
                        println!("{}:", key_colored);
                        for item in items {
                            println!("  {}", serde_json::to_string(item)?);
                        }
                    }
                    serde_json::Value::Null => {
                        println!("{}: {}", key_colored, "none".dimmed());
                    }
                    _ => {
                        println!("{}: {}", key_colored, val);
                    }
                }
            }
        }
        _ => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}

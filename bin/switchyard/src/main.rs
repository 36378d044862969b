use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use switchyard::commands;
use switchyard::config::CliConfig;
use switchyard_capability::{Kind, NoOpEncryptor, Registry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Inspect and exercise the switchyard capability runtime
#[derive(Parser)]
#[command(name = "switchyard")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered capabilities
    Capabilities {
        /// Only list capabilities of this kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Validate a graph file against the registry
    Compile {
        /// Path to the wire graph (JSON)
        graph_file: PathBuf,
    },
    /// Fetch a URL through the egress policy
    Fetch { url: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Component,
    Trigger,
    Integration,
    Application,
    Widget,
}

impl From<KindArg> for Kind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Component => Kind::Component,
            KindArg::Trigger => Kind::Trigger,
            KindArg::Integration => Kind::Integration,
            KindArg::Application => Kind::Application,
            KindArg::Widget => Kind::Widget,
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(report) => {
            eprintln!("error: {report}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    switchyard_components::register_builtins();
    let registry = Registry::new(Arc::new(NoOpEncryptor));

    let result = match cli.command {
        Commands::Capabilities { kind } => {
            let capabilities = commands::list_capabilities(&registry, kind.map(Kind::from));
            return print_json(&capabilities);
        }
        Commands::Compile { graph_file } => {
            commands::compile_file(&registry, &graph_file).map(|summary| print_json(&summary))
        }
        Commands::Fetch { url } => commands::fetch(config.egress.into(), &url)
            .await
            .map(|summary| print_json(&summary)),
    };

    result.unwrap_or_else(|report| {
        eprintln!("error: {report}");
        ExitCode::FAILURE
    })
}

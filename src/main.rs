use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};
use wxmcp::analysis::AnthropicClient;
use wxmcp::{
    AnalysisRequest, ConfigLoader, McpServer, NwsClient, Perspective, TelemetryClient,
    WeatherAnalyzer, WeatherSource,
};

/// National Weather Service tools for Model Context Protocol
///
/// Serves `get_alerts` and `get_forecast` to MCP clients such as Claude
/// Desktop, and can run an LLM analysis of the same data.
#[derive(Parser, Debug)]
#[command(name = "wxmcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    ///
    /// Falls back to `settings.log_level` from the config file, then `info`.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Log to file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Config file (default: ./.wxmcp.toml, $WXMCP_CONFIG or ~/.config/wxmcp/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP server on stdio (default)
    Serve,

    /// Print active weather alerts for a US state
    Alerts {
        /// Two-letter state code
        state: String,
    },

    /// Print the forecast for a coordinate
    #[command(allow_negative_numbers = true)]
    Forecast { latitude: f64, longitude: f64 },

    /// Ask the LLM for a narrative analysis of alerts and forecast
    #[command(allow_negative_numbers = true)]
    Analyze {
        /// Two-letter state code used for alerts
        #[arg(long)]
        state: String,

        #[arg(long)]
        lat: f64,

        #[arg(long)]
        lon: f64,

        #[arg(short, long, value_enum, default_value_t)]
        perspective: Perspective,

        /// Append to an existing telemetry session
        #[arg(long)]
        session_id: Option<String>,

        /// Also print the weather text sent to the model
        #[arg(long)]
        show_data: bool,
    },
}

fn setup_logging(log_level: &str, log_file: Option<PathBuf>) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // stdout carries protocol traffic
    if let Some(log_path) = log_file {
        let file = std::fs::File::create(log_path)?;
        subscriber.with_ansi(false).with_writer(file).init();
    } else {
        subscriber.with_writer(std::io::stderr).init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match ConfigLoader::new(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let log_level = args
        .log_level
        .clone()
        .or_else(|| config.settings().log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    setup_logging(&log_level, args.log_file)?;

    info!("Starting WXMCP v{}", env!("CARGO_PKG_VERSION"));
    match config.source() {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("Using built-in configuration"),
    }

    let settings = config.into_settings();
    let nws = Arc::new(NwsClient::new(&settings.nws)?);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let mcp_server = McpServer::new(nws);

            info!("WXMCP server starting - ready to accept MCP requests on stdio");

            // Blocks until the client disconnects
            match mcp_server.run().await {
                Ok(()) => info!("MCP server stopped normally"),
                Err(e) => {
                    eprintln!("MCP server error: {}", e);
                    return Err(e);
                }
            }
        }
        Command::Alerts { state } => {
            println!("{}", nws.get_alerts(&state).await);
        }
        Command::Forecast {
            latitude,
            longitude,
        } => {
            println!("{}", nws.get_forecast(latitude, longitude).await);
        }
        Command::Analyze {
            state,
            lat,
            lon,
            perspective,
            session_id,
            show_data,
        } => {
            let model = Arc::new(AnthropicClient::new(&settings.llm)?);
            let mut analyzer = WeatherAnalyzer::new(nws, model);

            if let Some(telemetry) = &settings.telemetry {
                info!("Telemetry enabled: {}", telemetry.base_url);
                analyzer = analyzer.with_telemetry(TelemetryClient::new(telemetry)?);
            }

            let report = analyzer
                .analyze(&AnalysisRequest {
                    state,
                    latitude: lat,
                    longitude: lon,
                    perspective,
                    session_id,
                })
                .await;

            if show_data {
                println!("== Alerts ==\n{}\n", report.alerts);
                println!("== Forecast ==\n{}\n", report.forecast);
                println!("== Analysis ({}) ==", perspective);
            }
            println!("{}", report.response);

            if let Some(id) = &report.session_id {
                info!("Telemetry session: {}", id);
            }
        }
    }

    info!("WXMCP shut down successfully");

    Ok(())
}

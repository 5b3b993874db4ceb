use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_app::Application;
use shelf_kernel::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "shelf")]
#[command(about = "Bookmark management service", long_about = None)]
struct Cli {
    /// Environment overlay to load (`local`, `staging`, `production`)
    #[arg(short = 'e', long = "env")]
    environment: Option<String>,

    /// Directory holding `base.toml` and the environment overlays
    #[arg(short = 'c', long = "config-dir")]
    config_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply migrations and serve the HTTP API (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    shelf_telemetry::init(&settings.telemetry)?;

    let app = Application::build(&settings).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => shelf_http::start_server(&app.registry, &settings).await,
        Command::Migrate => {
            tracing::info!(db = %settings.database.path, "migrations up to date");
            Ok(())
        }
    }
}

/// Flags override `SHELF_ENV` / `SHELF_CONFIG_DIR`; without flags the usual
/// `.env` + environment lookup applies.
fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    if cli.environment.is_none() && cli.config_dir.is_none() {
        return Settings::load().context("failed to load shelf settings");
    }

    let config_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => match std::env::var_os("SHELF_CONFIG_DIR") {
            Some(dir) => dir.into(),
            None => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        },
    };
    let environment = match &cli.environment {
        Some(environment) => environment.clone(),
        None => std::env::var("SHELF_ENV").unwrap_or_else(|_| "local".to_string()),
    };

    Settings::load_from(&config_dir, &environment)
        .with_context(|| format!("failed to load shelf settings from {}", config_dir.display()))
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use url::Url;

use spa_layout::config::{load_config, load_layout};
use spa_layout::layout::{construct_applications, find_redirect, match_routes};
use spa_layout::observability::logging;

#[derive(Parser)]
#[command(name = "layout-cli")]
#[command(about = "Inspect layout files and server configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a layout file and print its route tree
    Resolve {
        layout: PathBuf,
        /// Treat unknown router properties as errors
        #[arg(long)]
        strict: bool,
    },
    /// Show what a URL matches in a layout file
    Match {
        layout: PathBuf,
        url: String,
    },
    /// Load and validate a server configuration
    Config { path: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init_tracing("spa_layout=warn") {
        eprintln!("Failed to initialize logging: {e}");
    }
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Resolve { layout, strict } => {
            let document = load_layout(&layout, strict)?;
            let routes = &document.routes;
            println!("mode: {:?}", routes.mode);
            println!("base: {}", routes.base);
            println!("container: {}", routes.container_el);
            print!("{}", routes.outline());
            for (from, to) in &routes.redirects {
                println!("redirect {from} -> {to}");
            }
        }
        Commands::Match { layout, url } => {
            let document = load_layout(&layout, false)?;
            let url = Url::parse(&url).or_else(|_| Url::parse("http://localhost")?.join(&url))?;
            if let Some(to) = find_redirect(&document.routes, &url) {
                println!("redirect -> {to}");
                return Ok(());
            }
            print!("{}", match_routes(&document.routes, &url).outline());
            let active: Vec<_> = construct_applications(&document.routes)
                .into_iter()
                .filter(|app| app.is_active(&url))
                .map(|app| app.name)
                .collect();
            println!("active applications: {}", active.join(", "));
        }
        Commands::Config { path } => {
            let config = load_config(&path)?;
            println!("listener: {}", config.listener.bind_address);
            println!("layout: {}", config.layout.path);
            for (name, url) in &config.applications {
                println!("application {name} -> {url}");
            }
            println!("configuration is valid");
        }
    }
    Ok(())
}

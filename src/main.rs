//! Command line OFX image-effect render host.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod bundle;
mod commands;
mod constants;
mod frame_io;
mod handles;
mod host;
mod property;
mod schema;
mod suite_impls;
mod suites;
mod types;

#[derive(Parser)]
#[command(about = "Simple command line OFX plugin render host")]
struct Cli {
    /// Log level filter (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all the plugins in an OFX bundle
    List {
        /// Path to the OFX bundle directory
        dir: PathBuf,
        /// Name of the OFX bundle to load
        bundle: String,
    },
    /// Display or save a plugin's parameters
    Params {
        dir: PathBuf,
        bundle: String,
        /// Name of the plugin to use
        plugin: String,
        /// Save parameters to a JSON file, usable as input to render
        #[arg(short = 'j', long = "json")]
        json: Option<PathBuf>,
    },
    /// Render one frame in the filter context with default parameters
    Filter {
        dir: PathBuf,
        bundle: String,
        plugin: String,
        /// Filename of the input image
        infile: PathBuf,
        /// Filename of the output image (PNG or JPG)
        outfile: PathBuf,
    },
    /// Render one frame using a JSON parameter file
    Render {
        dir: PathBuf,
        /// Parameter settings saved by `params -j`
        params: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level)
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::List { dir, bundle } => commands::list_plugins(dir, bundle),
        Commands::Params {
            dir,
            bundle,
            plugin,
            json,
        } => commands::describe_params(dir, bundle, plugin, json.as_deref()),
        Commands::Filter {
            dir,
            bundle,
            plugin,
            infile,
            outfile,
        } => commands::filter_render(dir, bundle, plugin, infile, outfile),
        Commands::Render { dir, params } => commands::json_render(dir, params),
    };

    if let Err(e) = result {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

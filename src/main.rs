use clap::{Parser, Subcommand};
use hashpress::drafts::BuildMode;
use hashpress::{bundles, config, output, site, styles, watch};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "hashpress")]
#[command(about = "Static site builder with content-hashed stylesheets")]
#[command(long_about = "\
Static site builder with content-hashed stylesheets

Markdown pages are rendered into a fixed layout that links a single compiled
stylesheet and any bundles produced by an external bundler. Every output file
is minified on the way to disk.

Project structure:

  .
  ├── config.toml                  # Optional; see 'hashpress gen-config'
  ├── assets/scss/                 # Compiled in filename order → /css/main.<sha256>.css
  │   ├── _vars.scss               # Partial: only reachable through @import
  │   ├── reset.scss
  │   └── theme.scss
  ├── content/                     # Markdown pages (+++ TOML front matter)
  │   ├── index.md                 # → /
  │   └── guide/install.md         # → /guide/install/
  └── static/                      # Copied verbatim into the output root

Draft pages (draft = true) are skipped by 'build' and kept by 'watch'.
HASHPRESS_RUN_MODE=build|serve|watch overrides the mode.")]
#[command(version)]
struct Cli {
    /// Project root containing config.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG also applies
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site once
    Build,
    /// Build, then rebuild whenever content, styles or static files change
    Watch,
    /// Compile the stylesheet only and print its hashed path
    Styles,
    /// List the bundles found in the configured bundle directory
    Bundles,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Build => {
            let mode = BuildMode::from_env(BuildMode::Build)?;
            let report = site::build_project(&cli.root, mode)?;
            output::print_build_output(&report);
        }
        Command::Watch => {
            let mode = BuildMode::from_env(BuildMode::Watch)?;
            watch::watch(&cli.root, mode, |result| match result {
                Ok(report) => output::print_build_output(&report),
                Err(e) => eprintln!("error: {e}"),
            })?;
        }
        Command::Styles => {
            let config = config::load_config(&cli.root)?;
            let dirs = config.resolve(&cli.root);
            let options = styles::CompileOptions::from_config(&config, &dirs);
            let asset = styles::compile(&dirs.styles, &options)?;
            output::print_styles_output(&asset);
        }
        Command::Bundles => {
            let config = config::load_config(&cli.root)?;
            match config.resolve(&cli.root).bundles {
                Some(dir) => output::print_bundles_output(&dir, &bundles::resolve(&dir)),
                None => {
                    println!("No bundle directory configured (set [bundles] dir in config.toml)")
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize tracing: 0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE.
///
/// Logs go to stderr so stdout carries only the command output.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

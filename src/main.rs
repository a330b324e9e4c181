//! Shelf - inspect metadata caches and load content-source providers

use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use shelf::cache::Ttl;
use shelf::cli::{parse_cache_arg, CacheAction, Cli, Command};
use shelf::config::Config;
use shelf::{paths, AppContext};

/// Formats a TTL for display
fn describe_ttl(ttl: Ttl) -> String {
    match ttl {
        Ttl::Never => "never expires".to_string(),
        Ttl::After(duration) if duration.num_days() > 0 => format!("{} days", duration.num_days()),
        Ttl::After(duration) if duration.num_hours() > 0 => format!("{} hours", duration.num_hours()),
        Ttl::After(duration) => format!("{} minutes", duration.num_minutes()),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    let context = AppContext::new(config)?;
    debug!(cache_dir = %context.cache_dir().display(), "context ready");

    match cli.command {
        Command::Providers { dir } => {
            let loaders = context.load_providers(dir.as_deref())?;
            for loader in &loaders {
                let info = loader.info();
                println!(
                    "{}\t{}\t{}",
                    info.name,
                    info.version.as_deref().unwrap_or("-"),
                    loader.dir().display()
                );
            }
            println!("{} provider(s) loaded", loaders.len());
        }
        Command::Cache { action } => match action {
            CacheAction::Info => {
                for summary in context.caches().summaries() {
                    println!(
                        "{}\t{} entries\t{}\t{}",
                        summary.kind,
                        summary.entries,
                        describe_ttl(summary.ttl),
                        summary.path.display()
                    );
                }
            }
            CacheAction::Lookup { name } => match context.caches().find(&name) {
                Some(record) => {
                    println!(
                        "{}\t{}",
                        record.id,
                        record.display_title().unwrap_or("(untitled)")
                    );
                    for alias in record.names() {
                        println!("  {}", alias);
                    }
                }
                None => println!("{} is not cached", name),
            },
            CacheAction::Clear { cache } => {
                let target = parse_cache_arg(&cache)?;
                for kind in target.kinds() {
                    context.caches().clear(kind)?;
                    println!("cleared {}", kind);
                }
            }
        },
        Command::Where => {
            let config_file = cli.config.clone().or_else(paths::config_file);
            if let Some(path) = config_file {
                println!("config\t{}", path.display());
            }
            println!("cache\t{}", context.cache_dir().display());
            println!("providers\t{}", context.config().providers_dir()?.display());
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

//! Status command implementation

use colored::Colorize;

use crate::cli::CommandContext;
use crate::cli::args::GlobalOptions;
use crate::config::Config;
use crate::error::Result;
use crate::output::formatters::{format_age, format_timestamp_local};

/// Show credentials, hosts and cache state without calling the API
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}\n", "hnmon Configuration Status".bold());

    let config_path = Config::resolve_path(opts.config_path())?;
    if config_path.exists() {
        println!("Config file: {}", config_path.display().to_string().cyan());
    } else {
        println!(
            "Config file: {} {}",
            config_path.display().to_string().cyan(),
            "(not created)".dimmed()
        );
    }

    let ctx = match CommandContext::new(opts) {
        Ok(ctx) => ctx,
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            println!();
            println!("Run {} to create a configuration file.", "hnmon init".cyan());
            println!();
            return Ok(());
        }
    };
    let config = &ctx.config;

    println!();
    if config.credentials().is_ok() {
        println!("{} API credentials configured", "✓".green());
    } else {
        println!("{} API credentials not configured", "✗".red());
        println!("  → Run 'hnmon init' or set HNMON_CLIENT_ID / HNMON_CLIENT_SECRET");
    }

    println!("{} API host: {}", "○".dimmed(), config.api_host().cyan());
    println!("{} App host: {}", "○".dimmed(), config.app_host().cyan());

    let mapped = config.channel_clients().len();
    if mapped > 0 {
        println!("{} {} alert channels mapped to clients", "✓".green(), mapped);
    } else {
        println!("{} No alert channel mapping (client column falls back to channel)", "○".dimmed());
    }

    println!();
    if opts.no_cache {
        println!("{} Cache disabled for this run", "○".dimmed());
    } else {
        println!("Cache dir: {}", ctx.cache_dir.display().to_string().cyan());
    }

    let status = ctx.store.status(&ctx.dataset_key(None)).await;
    match status {
        Ok(status) => match (status.valid, status.written_at, status.age) {
            (true, Some(written), Some(age)) => {
                println!(
                    "{} Monitors cached: {} rows, {} old (written {})",
                    "✓".green(),
                    status.row_count.unwrap_or_default(),
                    format_age(age),
                    format_timestamp_local(&written)
                );
                if status.partial {
                    println!("  {} Last refresh was partial", "⚠".yellow());
                }
            }
            (false, Some(_), Some(age)) => {
                println!(
                    "{} Monitors cache expired ({} old, will refresh on next list)",
                    "⚠".yellow(),
                    format_age(age)
                );
            }
            _ => println!("{} Monitors not cached yet", "○".dimmed()),
        },
        Err(e) => println!("{} Cache unreadable: {}", "✗".red(), e),
    }
    println!();

    Ok(())
}

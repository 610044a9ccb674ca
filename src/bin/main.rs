use clap::Parser;
use eoka_formfill::{FormData, StopReason};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "eoka-formfill")]
#[command(about = "Fill multi-step application forms from a config")]
#[command(version)]
struct Cli {
    /// Config file to run
    config: PathBuf,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Stop after this many page lifecycles (overrides config)
    #[arg(long, value_name = "N")]
    max_lifecycles: Option<u32>,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config without running
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> eoka_formfill::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let mut config = eoka_formfill::Config::load(&cli.config)?;
    let data = FormData::from_config(&config);

    if cli.check {
        println!("Config valid: {}", config.name);
        println!("  Target: {}", config.target.url);
        println!(
            "  Answers: {} ({} aliases)",
            data.answers().value_count(),
            data.answers().len()
        );
        println!("  Navigation sequences: {}", data.catalog().len());
        for seq in data.catalog().entries() {
            println!(
                "    - [{}] {}={} -> {} children{}",
                seq.domain,
                seq.match_key,
                seq.match_value,
                seq.child_selectors.len(),
                if seq.awaits_navigation { ", navigates" } else { "" }
            );
        }
        println!(
            "  Automate: buttons={} forms={}",
            config.automate.buttons, config.automate.forms
        );
        if let Some(max) = cli.max_lifecycles.or(config.lifecycle.max_lifecycles) {
            println!("  Max lifecycles: {}", max);
        }
        return Ok(());
    }

    if cli.headless {
        config.browser.headless = true;
    }

    println!("Running: {}", config.name);

    let mut runner = eoka_formfill::Runner::new(&config.browser).await?;
    let result = runner.run(&config, &data, cli.max_lifecycles).await?;

    println!();
    match result.stop {
        Some(StopReason::LifecycleLimit) => println!("✓ Done (lifecycle limit)"),
        Some(StopReason::NoNavigation) => println!("✓ Done (no further navigation)"),
        Some(StopReason::DriverFailure(ref e)) => {
            println!("✗ Failed");
            println!("  Error: {}", e);
        }
        None => println!("✗ Interrupted"),
    }
    println!("  Pages: {}", result.lifecycles.len());
    for report in &result.lifecycles {
        println!(
            "    {}. {} ({}, {} handled)",
            report.id, report.url, report.end_reason, report.handled
        );
    }
    println!("  Fields handled: {}", result.handled);
    println!("  Sequences run: {}", result.navigations);
    println!("  Duration: {}ms", result.duration_ms);

    runner.close().await?;

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}

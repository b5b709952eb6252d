use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use clickgen::config::ThemeConfig;
use clickgen::pipeline::ThemeBuilder;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(path), None) = (args.next(), args.next()) else {
        bail!("usage: clickgen <config.toml>");
    };

    let config = ThemeConfig::load_from_file(&path)
        .with_context(|| format!("Failed to load {}", path))?;
    let report = ThemeBuilder::new(config).build()?;

    for file in report.files() {
        println!("{}", file.display());
    }
    for key in &report.skipped {
        println!("skipped {}", key);
    }
    Ok(())
}

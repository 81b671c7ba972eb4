//! Automated install example
//!
//! Runs a real `forge install` against your site, answering the scopes
//! confirmation automatically.
//!
//! # Usage
//!
//! ```bash
//! export FORGE_EMAIL=you@example.com
//! export FORGE_API_TOKEN=...
//! cargo run --example install -- your-site.atlassian.net jira
//! ```
//!
//! Requires the `forge` CLI on PATH and a deployed app in the working
//! directory.

use std::env;

use autoforge::{Credentials, InstallerConfig, installer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let site = args.next().unwrap_or_else(|| {
        eprintln!("Usage: install <site> [product]");
        std::process::exit(1);
    });

    let mut builder = InstallerConfig::builder(site);
    if let Some(product) = args.next() {
        builder = builder.product(product);
    }
    let config = builder.build()?;
    let credentials = Credentials::from_env()?;

    println!("Installing to {} ({})...", config.site, config.product);

    let report = installer::run_install(&config, &credentials).await?;

    println!("{}", report.render());
    println!(
        "\nFinished in {:?} (exit code {:?})",
        report.elapsed, report.exit_code
    );
    Ok(())
}

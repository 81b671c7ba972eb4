//! Command-line entry point.
//!
//! Usage: `autoforge [config.toml]`
//!
//! Configuration is resolved from the argument path, then
//! `autoforge.toml` in the working directory, then the `FORGE_SITE` /
//! `FORGE_PRODUCT` environment variables. Credentials always come from
//! `FORGE_EMAIL` / `FORGE_API_TOKEN`.

use std::env;
use std::path::Path;

use autoforge::{Credentials, InstallerConfig, installer};

const CONFIG_FILE: &str = "autoforge.toml";

#[tokio::main]
async fn main() -> Result<(), autoforge::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match env::args().nth(1) {
        Some(path) => InstallerConfig::from_file(Path::new(&path))?,
        None if Path::new(CONFIG_FILE).exists() => {
            InstallerConfig::from_file(Path::new(CONFIG_FILE))?
        }
        None => InstallerConfig::from_env()?,
    };
    let credentials = Credentials::from_env()?;

    let report = installer::run_install(&config, &credentials).await?;

    println!("{}", report.render());
    println!("\nDone!");
    Ok(())
}

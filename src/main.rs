//! DirSight — interactive directory-size explorer.
//!
//! Thin binary entry point. All logic lives in the `dirsight-core`
//! and `dirsight-session` crates.

mod repl;

use anyhow::Context;
use dirsight_core::EngineConfig;
use dirsight_session::Session;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the listing on stdout stays clean.
    let level = match std::env::var("DIRSIGHT_LOG").as_deref() {
        Ok("debug") => tracing::Level::DEBUG,
        _ => tracing::Level::INFO,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("DirSight starting");

    let config = match std::env::var_os("DIRSIGHT_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            EngineConfig::load(&path)
                .with_context(|| format!("loading config from {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    if dirsight_core::platform::is_elevated() {
        tracing::info!("Running with elevated privileges; restricted folders will be readable");
    }

    let start = std::env::current_dir().context("resolving the working directory")?;
    let mut session = Session::new(config, start);
    println!("dirsight — type 'help' for commands");
    repl::run(&mut session, std::io::stdin().lock(), &mut std::io::stdout().lock())
}

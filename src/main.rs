mod config;
mod errors;
mod logging;
mod plugin;
mod security;
mod server;
mod tools;


use crate::config::Config;
use anyhow::Context;
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path = PathBuf::from("vouch.toml");
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if i >= args.len() { eprintln!("--config requires a path"); std::process::exit(2); }
                config_path = PathBuf::from(&args[i]);
            }
            _ => {}
        }
        i += 1;
    }

    let mut cfg = Config::load(&config_path).context("loading config")?;
    cfg.validate().context("validating config")?;
    cfg.worktree.root_dir =
        config::canonical_root(&cfg.worktree.root_dir).context("canonicalizing worktree root")?;

    let addr = format!("{}:{}", cfg.server.bind_addr, cfg.server.port);

    let registry = plugin::registry::ToolRegistry::new();

    info!(
        addr = %addr,
        base_path = %cfg.server.base_path,
        worktree = %cfg.worktree.root_dir.display(),
        tools = ?registry.list_names(),
        "vouch ready"
    );
    println!(
        "vouch ready addr={} base_path={} tools=[{}]",
        addr,
        cfg.server.base_path,
        registry.list_names().join(",")
    );

    server::serve(cfg, registry).await
}

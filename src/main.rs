use std::path::PathBuf;

use sunroom::{DemoConfig, SunroomApp};

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("SUNROOM_CONFIG"))
        .map(PathBuf::from)
}

fn run() -> anyhow::Result<()> {
    let config = match config_path() {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };
    log::info!("Assets from {}", config.asset_root.display());

    SunroomApp::new(config)?.run()?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e:#}");
        eprintln!("Your program encountered an unrecoverable error, can not draw on canvas. Error was: {e:#}");
        std::process::exit(1);
    }
}

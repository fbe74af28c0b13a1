use anyhow::{Context, Result};
use std::os::unix::process::CommandExt;
use tagwm::window_manager::WindowManager;
use tagwm::x::X11rbConn;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        None => {}
        Some("-v") if args.len() == 2 => {
            println!("tagwm-{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(_) => {
            eprintln!("usage: tagwm [-v]");
            std::process::exit(1);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    tagwm::process::install_child_reaper().context("Failed to install SIGCHLD handler")?;

    let config = tagwm::config::load();
    let conn = X11rbConn::new(&config.font).context("Failed to set up the X connection")?;

    let mut wm = WindowManager::new(conn, config).context("Failed to start the window manager")?;
    let should_restart = wm.run()?;

    drop(wm);

    if should_restart && let Some((program, rest)) = args.split_first() {
        let err = std::process::Command::new(program).args(rest).exec();
        eprintln!("Failed to restart: {}", err);
    }

    Ok(())
}

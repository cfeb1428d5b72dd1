mod commands;
mod error;
mod fs_ops;
mod parser;
mod session;
mod shell;
mod utils;

use std::io;

use anyhow::Context;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::session::Session;
use crate::shell::Shell;

fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let session =
        Session::from_process_dir().context("failed to determine the starting directory")?;
    let mut shell = Shell::new(session);
    shell
        .run(io::stdin().lock(), io::stdout().lock())
        .context("shell error")?;

    debug!(dir = %shell.session().current_dir().display(), "session ended");
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

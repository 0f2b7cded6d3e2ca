use anyhow::Context;
use simplesh::config::{Args, LOG_ENV};
use simplesh::repl::start_repl;
use simplesh::ShellConfig;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();
    let code = start_repl(ShellConfig::from(args)).context("shell terminated")?;
    std::process::exit(code);
}

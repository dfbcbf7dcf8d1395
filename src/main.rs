use clap::Parser;
use logic_dispatch::cli::{run_cli, Cli};
use logic_dispatch::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _logging = init_logging_with_config(&LogConfig::from_env())?;

    let ok = run_cli(cli)?;
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

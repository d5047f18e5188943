mod cli;
mod logging;

use clap::Parser;

use pyv_core::{Config, EngineError, PythonVersion};
use pyv_engine::Engine;

use crate::cli::{Cli, Commands, LsScope};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(error) = run(cli).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), EngineError> {
    let config = Config::from_env()?;
    let engine = Engine::new(config)?;
    engine.check_path_configuration();

    match (cli.command, cli.request) {
        (Some(command), _) => dispatch(&engine, command).await,
        (None, Some(raw)) => {
            let version = engine.resolve_and_activate(&raw).await?;
            println!("activated {version}");
            Ok(())
        }
        (None, None) => print_installed(&engine).await,
    }
}

async fn dispatch(engine: &Engine, command: Commands) -> Result<(), EngineError> {
    match command {
        Commands::Ls { scope: None } => {
            let available = engine.list_available().await?;
            print_marked(engine, &available).await;
            Ok(())
        }
        Commands::Ls {
            scope: Some(LsScope::Installed),
        } => print_installed(engine).await,
        Commands::Ls {
            scope: Some(LsScope::Latest),
        } => {
            println!("{}", engine.latest().await?);
            Ok(())
        }
        Commands::Ls {
            scope: Some(LsScope::Stable),
        } => {
            println!("{}", engine.stable().await?);
            Ok(())
        }
        Commands::Latest => {
            println!("{}", engine.activate_latest().await?);
            Ok(())
        }
        Commands::Stable => {
            println!("{}", engine.activate_stable().await?);
            Ok(())
        }
        Commands::Status => {
            println!("current version: {}", engine.current_version().await?);
            Ok(())
        }
        Commands::Install { version, force } => {
            let version: PythonVersion = version.parse()?;
            engine.install(&version, force).await?;
            println!("{version}");
            Ok(())
        }
        Commands::Use { version, args } => {
            let version: PythonVersion = version.parse()?;
            let output = engine.run_with_version(&version, &args).await?;
            print!("{output}");
            Ok(())
        }
        Commands::Bin { version } => {
            let version: PythonVersion = version.parse()?;
            println!("{}", engine.bin_path(&version)?.display());
            Ok(())
        }
        Commands::Rm { versions } => {
            for raw in versions {
                let version: PythonVersion = raw.parse()?;
                engine.uninstall(&version).await?;
                println!("uninstalled {version}");
            }
            Ok(())
        }
        Commands::Default => {
            engine.deactivate()?;
            match engine.current_version().await {
                Ok(version) => {
                    println!("system python: {version}");
                    Ok(())
                }
                Err(error) => {
                    log::error!("no system python installed");
                    Err(error)
                }
            }
        }
    }
}

async fn print_installed(engine: &Engine) -> Result<(), EngineError> {
    let installed = engine.list_installed()?;
    print_marked(engine, &installed).await;
    Ok(())
}

/// Print versions one per line, marking the currently active one.
async fn print_marked(engine: &Engine, versions: &[PythonVersion]) {
    let current = engine.current_version().await.ok();
    for version in versions {
        if Some(version) == current.as_ref() {
            println!("--> {version}");
        } else {
            println!("    {version}");
        }
    }
}

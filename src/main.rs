use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use deploy_router::config::{AppState, Config};
use deploy_router::deployment::{Deployment, Dispatch};
use deploy_router::logger;
use deploy_router::manifest::{Manifest, ManifestError};
use deploy_router::server::{self, SignalHandler};

#[derive(Parser)]
#[command(name = "deploy-router")]
#[command(about = "Serve a project from its vercel.json manifest", long_about = None)]
struct Cli {
    /// Configuration file, without extension
    #[arg(short, long, global = true, default_value = "config")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the server (default)
    Serve,
    /// Load and validate the manifest
    Check {
        /// Manifest to check instead of the configured one
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Show where a request path is dispatched
    Resolve {
        /// Decoded request path, e.g. /api/info
        path: String,
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = Config::load_from(&cli.config)?;
    logger::init(&cfg.logging.level)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg).map(|()| ExitCode::SUCCESS),
        Command::Check { manifest } => Ok(check(&cfg, manifest.as_deref())),
        Command::Resolve { path, manifest } => Ok(resolve(&cfg, manifest.as_deref(), &path)),
    }
}

fn serve(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Worker threads follow server.workers, else one per CPU core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let state = Arc::new(AppState::from_config(cfg)?);
    logger::log_deployment(&*state.deployment().await);

    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &state.config);

    let signals = Arc::new(SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals))?;
    server::start_server_loop(listener, state, signals).await;

    tracing::info!("server stopped");
    Ok(())
}

/// Configured deployment, or the one at `manifest` rooted at its directory
fn load(cfg: &Config, manifest: Option<&Path>) -> Result<Deployment, ManifestError> {
    match manifest {
        Some(path) => {
            let root = path.parent().unwrap_or_else(|| Path::new("."));
            Deployment::from_manifest(root, Manifest::load(path)?)
        }
        None => Deployment::load(&cfg.project.root, &cfg.project.manifest),
    }
}

fn check(cfg: &Config, manifest: Option<&Path>) -> ExitCode {
    match load(cfg, manifest) {
        Ok(deployment) => {
            let manifest = deployment.manifest();
            println!("manifest OK (version {})", manifest.version);
            println!("builds:");
            for build in deployment.builds().iter() {
                println!("  {:<24} {}", build.src, build.kind);
            }
            println!("routes:");
            for (index, route) in manifest.routes.iter().enumerate() {
                println!("  #{index:<3} {:<24} -> {}", route.src, route.dest);
            }
            ExitCode::SUCCESS
        }
        Err(ManifestError::Invalid(issues)) => {
            eprintln!("manifest is invalid:");
            for issue in issues {
                eprintln!("  - {issue}");
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn resolve(cfg: &Config, manifest: Option<&Path>, path: &str) -> ExitCode {
    let deployment = match load(cfg, manifest) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let Some(resolution) = deployment.routes().resolve(path) else {
        println!("no route");
        return ExitCode::FAILURE;
    };
    let route = &deployment.routes().routes()[resolution.route_index];
    println!("route  #{} {}", resolution.route_index, route.src);
    println!("dest   {}", resolution.destination);

    match deployment.dispatch(path) {
        Dispatch::Static { relative, .. } => {
            println!("build  static, serves {}", deployment.root().join(relative).display());
        }
        Dispatch::Function {
            build_src,
            function_path,
            ..
        } => println!("build  function {build_src}, path {function_path}"),
        Dispatch::Unowned { .. } => println!("build  none (404)"),
        Dispatch::Refused { .. } => println!("build  refused, leaves the project root (404)"),
        Dispatch::NoRoute => {}
    }
    ExitCode::SUCCESS
}

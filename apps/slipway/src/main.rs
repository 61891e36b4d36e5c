//! slipway - build, dist, and publish orchestrator for go projects
//!
//! The CLI binary: parses arguments, loads the operation context, and
//! drives the ops crate while rendering its event stream.

mod cli;
mod events;

use crate::cli::{
    ArtifactsCommands, Cli, Commands, DockerCommands, PublishArgs, PublishCommands,
};
use crate::events::EventHandler;
use clap::Parser;
use slipway_builder::BuildOptions;
use slipway_dist::DockerOptions;
use slipway_errors::{ConfigError, Error, Result};
use slipway_events::EventReceiver;
use slipway_ops::{BuildArtifactsOptions, OpsCtx};
use slipway_publish::{
    AlmanacConfig, ArtifactoryDestination, BintrayDestination, Destination, GitHubDestination,
    LocalDestination, PublishOptions,
};
use slipway_types::OsArch;
use std::path::{Path, PathBuf};
use std::process;
use tokio::select;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let debug = cli.global.debug;
    init_tracing(debug);

    match run(cli).await {
        Ok(code) => {
            if code != 0 {
                process::exit(code);
            }
        }
        Err(err) => {
            error!("command failed: {err}");
            report(&err, debug);
            process::exit(1);
        }
    }
}

fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report(err: &Error, debug: bool) {
    eprintln!("Error: {err}");
    if debug {
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let project_dir =
        std::env::current_dir().map_err(|e| Error::io_with_path(&e, Path::new(".")))?;
    let (tx, rx) = slipway_events::channel();
    let ctx = OpsCtx::load(&project_dir, cli.global.config.as_deref(), tx).await?;
    let mut handler = EventHandler::new(cli.global.debug);
    execute_with_events(cli.command, ctx, rx, &mut handler).await
}

/// Run the command while rendering events as they arrive
async fn execute_with_events(
    command: Commands,
    ctx: OpsCtx,
    mut rx: EventReceiver,
    handler: &mut EventHandler,
) -> Result<i32> {
    let mut future = Box::pin(execute(command, ctx));
    loop {
        select! {
            result = &mut future => {
                while let Ok(event) = rx.try_recv() {
                    handler.handle(event);
                }
                return result;
            }
            event = rx.recv() => {
                match event {
                    Some(event) => handler.handle(event),
                    None => { /* channel closed; wait for the command */ }
                }
            }
        }
    }
}

async fn execute(command: Commands, ctx: OpsCtx) -> Result<i32> {
    match command {
        Commands::ProjectVersion => {
            println!("{}", slipway_ops::project_version(&ctx));
        }
        Commands::Products => {
            for name in slipway_ops::list_products(&ctx)? {
                println!("{name}");
            }
        }
        Commands::Artifacts(command) => artifacts(command, &ctx)?,
        Commands::Build {
            products,
            os_arch,
            parallel,
            install,
            pkgdir,
        } => {
            let opts = BuildOptions {
                parallel,
                install_first: install,
                isolated_pkg_dir: pkgdir,
            };
            slipway_ops::build(&ctx, &products, &parse_os_archs(&os_arch)?, &opts).await?;
        }
        Commands::Dist { products } => {
            slipway_ops::dist(&ctx, &products).await?;
        }
        Commands::Docker(command) => match command {
            DockerCommands::Build {
                products,
                base_repository,
                verbose,
            } => {
                let opts = DockerOptions {
                    base_repository: base_repository.unwrap_or_default(),
                    verbose,
                };
                slipway_ops::docker_build(&ctx, &products, &opts).await?;
            }
            DockerCommands::Push {
                products,
                base_repository,
            } => {
                let opts = DockerOptions {
                    base_repository: base_repository.unwrap_or_default(),
                    verbose: false,
                };
                slipway_ops::docker_push(&ctx, &products, &opts).await?;
            }
        },
        Commands::Run { product, args } => {
            let requested: Vec<String> = product.into_iter().collect();
            return slipway_ops::run(&ctx, &requested, &args).await;
        }
        Commands::Clean { products } => {
            slipway_ops::clean(&ctx, &products).await?;
        }
        Commands::Publish(command) => {
            let (common, destination) = destination(command);
            let opts = PublishOptions {
                fail_fast: common.fail_fast,
                dry_run: common.dry_run,
                almanac: almanac(&common)?,
            };
            slipway_ops::publish(&ctx, &common.products, &destination, &opts).await?;
        }
    }
    Ok(0)
}

fn artifacts(command: ArtifactsCommands, ctx: &OpsCtx) -> Result<()> {
    match command {
        ArtifactsCommands::Build {
            products,
            os_arch,
            absolute,
            requires_build,
        } => {
            let opts = BuildArtifactsOptions {
                os_archs: parse_os_archs(&os_arch)?,
                absolute,
                requires_build,
            };
            for path in slipway_ops::list_build_artifacts(ctx, &products, &opts)? {
                println!("{}", path.display());
            }
        }
        ArtifactsCommands::Dist { products, absolute } => {
            for path in slipway_ops::list_dist_artifacts(ctx, &products, absolute)? {
                println!("{}", path.display());
            }
        }
        ArtifactsCommands::Docker { products } => {
            for image in slipway_ops::list_docker_images(ctx, &products)? {
                println!("{image}");
            }
        }
    }
    Ok(())
}

fn parse_os_archs(values: &[String]) -> Result<Vec<OsArch>> {
    values.iter().map(|value| value.parse()).collect()
}

fn destination(command: PublishCommands) -> (PublishArgs, Destination) {
    match command {
        PublishCommands::Local { common, path } => {
            let path = path.unwrap_or_else(default_local_repository);
            (common, Destination::Local(LocalDestination { path }))
        }
        PublishCommands::Artifactory {
            common,
            url,
            user,
            password,
            repository,
        } => (
            common,
            Destination::Artifactory(ArtifactoryDestination {
                url,
                repository,
                username: user,
                password,
            }),
        ),
        PublishCommands::Bintray {
            common,
            url,
            user,
            password,
            subject,
            repository,
            publish,
            downloads_list,
        } => (
            common,
            Destination::Bintray(BintrayDestination {
                url,
                subject,
                repository,
                username: user,
                password,
                publish,
                downloads_list,
            }),
        ),
        PublishCommands::Github {
            common,
            url,
            user,
            password,
            owner,
            repository,
        } => (
            common,
            Destination::GitHub(GitHubDestination {
                api_url: url,
                user,
                token: password,
                owner: owner.unwrap_or_default(),
                repository,
            }),
        ),
    }
}

fn almanac(common: &PublishArgs) -> Result<Option<AlmanacConfig>> {
    let Some(url) = &common.almanac_url else {
        return Ok(None);
    };
    let (Some(access_id), Some(secret)) = (&common.almanac_id, &common.almanac_secret) else {
        return Err(ConfigError::Invalid {
            message: "--almanac-url requires --almanac-id and --almanac-secret".to_string(),
        }
        .into());
    };
    Ok(Some(AlmanacConfig {
        url: url.clone(),
        access_id: access_id.clone(),
        secret: secret.clone(),
        release: common.almanac_release,
    }))
}

fn default_local_repository() -> PathBuf {
    let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
    home.join(".m2").join("repository")
}

//! Build worker pool
//!
//! Turns a list of specs into (product, target) work units and executes
//! them serially or across a bounded set of workers. The parallel mode
//! fills a bounded work channel up front and drops the sender, so workers
//! drain it and exit naturally; the first error closes a done signal that
//! stops idle workers from picking up further units. Running compiler
//! subprocesses are never killed.

use crate::{go, script};
use slipway_errors::{Error, Result};
use slipway_events::{AppEvent, BuildEvent, EventEmitter, EventSender};
use slipway_types::{OsArch, ProductSpec, SpecWithDeps};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinSet;

/// Build execution mode
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Run units concurrently
    pub parallel: bool,
    /// Run the compiler's install action for the main package first
    pub install_first: bool,
    /// Give every target its own package cache under the build output dir
    pub isolated_pkg_dir: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            install_first: false,
            isolated_pkg_dir: false,
        }
    }
}

#[derive(Debug, Clone)]
struct BuildUnit {
    spec: ProductSpec,
    os_arch: OsArch,
}

/// Build every (product, target) named by `specs` and allowed by `filter`
///
/// Pre-build scripts run first, serially, one per product. Products whose
/// build is skipped contribute no units and run no scripts.
///
/// # Errors
///
/// Returns the first build or script error. In parallel mode units already
/// running when the error occurs still finish.
pub async fn build(
    specs: &[SpecWithDeps],
    filter: &[OsArch],
    opts: &BuildOptions,
    tx: &EventSender,
) -> Result<()> {
    let specs = dedup(specs);
    run_pre_build_scripts(&specs, tx).await?;
    let units = flatten(&specs, filter);
    if units.is_empty() {
        return Ok(());
    }
    if opts.parallel && units.len() > 1 {
        build_parallel(units, opts, tx).await
    } else {
        for unit in &units {
            go::build_unit(&unit.spec, &unit.os_arch, opts, tx).await?;
        }
        Ok(())
    }
}

fn dedup(specs: &[SpecWithDeps]) -> Vec<&SpecWithDeps> {
    let mut out: Vec<&SpecWithDeps> = Vec::new();
    for spec in specs {
        if !out.iter().any(|seen| *seen == spec) {
            out.push(spec);
        }
    }
    out
}

async fn run_pre_build_scripts(specs: &[&SpecWithDeps], tx: &EventSender) -> Result<()> {
    for with_deps in specs {
        let spec = &with_deps.spec;
        if spec.config.build.skip || spec.config.build.script.is_empty() {
            continue;
        }
        tx.emit(AppEvent::Build(BuildEvent::ScriptStarted {
            product: spec.name.clone(),
        }));
        let env = script_env(spec);
        script::run_script(&spec.project_dir, &spec.config.build.script, &env, tx).await?;
    }
    Ok(())
}

/// Environment for pre-build scripts: the configured build environment
/// plus the well-known product variables, which win on collision
fn script_env(spec: &ProductSpec) -> BTreeMap<String, String> {
    let mut env = spec.config.build.environment.clone();
    env.insert("PROJECT_DIR".to_string(), spec.project_dir.display().to_string());
    env.insert("PRODUCT".to_string(), spec.name.clone());
    env.insert("VERSION".to_string(), spec.version.clone());
    env
}

fn flatten(specs: &[&SpecWithDeps], filter: &[OsArch]) -> Vec<BuildUnit> {
    let mut units = Vec::new();
    for with_deps in specs {
        let spec = &with_deps.spec;
        if spec.config.build.skip {
            continue;
        }
        for os_arch in &spec.config.build.os_archs {
            if !filter.is_empty() && !filter.contains(os_arch) {
                continue;
            }
            units.push(BuildUnit {
                spec: spec.clone(),
                os_arch: os_arch.clone(),
            });
        }
    }
    units
}

async fn build_parallel(units: Vec<BuildUnit>, opts: &BuildOptions, tx: &EventSender) -> Result<()> {
    let worker_count = num_cpus::get().min(units.len());
    let (work_tx, work_rx) = mpsc::channel(units.len());
    for unit in units {
        // capacity equals the unit count, so the queue is never full here
        work_tx
            .try_send(unit)
            .map_err(|e| Error::internal(format!("work queue send failed: {e}")))?;
    }
    drop(work_tx);
    let work = Arc::new(Mutex::new(work_rx));

    let (err_tx, mut err_rx) = mpsc::unbounded_channel::<Error>();
    let (done_tx, done_rx) = watch::channel(false);

    let mut workers = JoinSet::new();
    for _ in 0..worker_count {
        let work = Arc::clone(&work);
        let err_tx = err_tx.clone();
        let done_rx = done_rx.clone();
        let opts = opts.clone();
        let tx = tx.clone();
        workers.spawn(async move {
            loop {
                if *done_rx.borrow() {
                    break;
                }
                let next = { work.lock().await.try_recv() };
                let Ok(unit) = next else { break };
                if let Err(err) = go::build_unit(&unit.spec, &unit.os_arch, &opts, &tx).await {
                    // exactly one error per failed unit
                    let _ = err_tx.send(err);
                }
            }
        });
    }
    drop(err_tx);

    // the merged stream ends once every worker has exited
    let mut first_error = None;
    while let Some(err) = err_rx.recv().await {
        if first_error.is_none() {
            let _ = done_tx.send(true);
            first_error = Some(err);
        }
    }
    while let Some(joined) = workers.join_next().await {
        joined.map_err(|e| Error::internal(format!("build worker join error: {e}")))?;
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

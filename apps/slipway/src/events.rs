//! Rendering of engine events as terminal output
//!
//! Progress lines go to stdout, warnings and the upload meter to stderr.
//! Debug events surface only under `--debug`.

use slipway_events::{AppEvent, BuildEvent, DistEvent, GeneralEvent, PublishEvent};

/// Turns the event stream into terminal lines
pub struct EventHandler {
    debug: bool,
}

impl EventHandler {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::Build(event) => Self::handle_build(&event),
            AppEvent::Dist(event) => Self::handle_dist(&event),
            AppEvent::Publish(event) => Self::handle_publish(&event),
            AppEvent::General(event) => self.handle_general(&event),
        }
    }

    fn handle_build(event: &BuildEvent) {
        match event {
            BuildEvent::ScriptStarted { product } => {
                println!("Running build script for {product}");
            }
            BuildEvent::UnitStarted {
                product,
                os_arch,
                path,
            } => {
                println!("Building {product} for {os_arch} at {}", path.display());
            }
            BuildEvent::UnitCompleted {
                product,
                os_arch,
                duration,
            } => {
                println!("Finished building {product} for {os_arch} (took {duration:.2?})");
            }
            BuildEvent::UpToDate { product, os_arch } => {
                println!("Skipping {product} for {os_arch}: up-to-date");
            }
        }
    }

    fn handle_dist(event: &DistEvent) {
        match event {
            DistEvent::Started { product, dist_type } => {
                println!("Creating {dist_type} distribution for {product}");
            }
            DistEvent::ArtifactCreated { product: _, path } => {
                println!("Finished creating {}", path.display());
            }
            DistEvent::DockerBuildStarted { product: _, image } => {
                println!("Building image {image}");
            }
            DistEvent::DockerBuildCompleted { product: _, image } => {
                println!("Finished building image {image}");
            }
            DistEvent::DockerPushStarted { product: _, image } => {
                println!("Pushing image {image}");
            }
            DistEvent::DockerPushCompleted { product: _, image } => {
                println!("Finished pushing image {image}");
            }
        }
    }

    fn handle_publish(event: &PublishEvent) {
        match event {
            PublishEvent::UploadStarted { file, url } => {
                println!("Uploading {file} to {url}");
            }
            PublishEvent::UploadProgress {
                file,
                uploaded,
                total,
            } => {
                let percent = if *total == 0 {
                    100
                } else {
                    uploaded * 100 / total
                };
                eprint!("\r{file}: {uploaded}/{total} bytes ({percent}%)");
                if uploaded >= total {
                    eprintln!();
                }
            }
            PublishEvent::UploadSkipped { file, url } => {
                println!("File {file} already exists at {url}, skipping upload");
            }
            PublishEvent::UploadPlanned { file, url } => {
                println!("Would upload {file} to {url}");
            }
            PublishEvent::FileCopied { file, path } => {
                println!("Copied {file} to {}", path.display());
            }
            PublishEvent::ReleaseCreated { product, url } => {
                println!("Created release for {product}: {url}");
            }
            PublishEvent::AssetAvailable { file, url } => {
                println!("Uploaded {file}: {url}");
            }
            PublishEvent::AlmanacRegistered { product, version } => {
                println!("Registered {product} {version} in almanac");
            }
            PublishEvent::FollowUpFailed { action, error } => {
                eprintln!("Warning: {action} failed: {error}");
            }
        }
    }

    fn handle_general(&self, event: &GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => {
                eprintln!("Warning: {message}");
                if let Some(context) = context {
                    eprintln!("  {context}");
                }
            }
            GeneralEvent::Error { message, details } => {
                eprintln!("Error: {message}");
                if let Some(details) = details {
                    eprintln!("  {details}");
                }
            }
            GeneralEvent::DebugLog { message, .. } => {
                if self.debug {
                    eprintln!("[debug] {message}");
                }
            }
            GeneralEvent::OperationStarted { operation } => {
                if self.debug {
                    eprintln!("[debug] {operation} started");
                }
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                if self.debug {
                    eprintln!("[debug] {operation} completed (success: {success})");
                }
            }
        }
    }
}

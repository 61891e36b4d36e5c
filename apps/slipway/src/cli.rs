//! Command line interface definition

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// slipway - build, package, and publish the products of a go project
#[derive(Parser)]
#[command(name = "slipway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build, package, and publish the products of a go project")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Arguments available to every command
#[derive(Args)]
pub struct GlobalArgs {
    /// Print debug events and widen the log filter
    #[arg(long, global = true)]
    pub debug: bool,

    /// Alternate project configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the version derived from the project's source-control state
    ProjectVersion,

    /// List the project's products
    Products,

    /// Print artifact paths and image names without building anything
    #[command(subcommand)]
    Artifacts(ArtifactsCommands),

    /// Compile the requested products for their configured targets
    Build {
        /// Products to build (default: all)
        #[arg(long, value_delimiter = ',', value_name = "NAME")]
        products: Vec<String>,

        /// Restrict the build to these targets
        #[arg(long, value_delimiter = ',', value_name = "OS-ARCH")]
        os_arch: Vec<String>,

        /// Build units concurrently; pass --parallel=false for serial builds
        #[arg(long, default_value_t = true, num_args = 0..=1, default_missing_value = "true", action = clap::ArgAction::Set)]
        parallel: bool,

        /// Run the compiler's install action for each main package first
        #[arg(long)]
        install: bool,

        /// Give every target its own package cache
        #[arg(long)]
        pkgdir: bool,
    },

    /// Assemble the distributions of the requested products
    Dist {
        /// Products to dist (default: all)
        #[arg(long, value_delimiter = ',', value_name = "NAME")]
        products: Vec<String>,
    },

    /// Build or push container images
    #[command(subcommand)]
    Docker(DockerCommands),

    /// Run a product's main package in place
    Run {
        /// Product to run; optional when the project has exactly one
        product: Option<String>,

        /// Arguments passed to the program; prefix an argument with
        /// `flag:` to pass flags that collide with slipway's own
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Remove build and dist outputs
    Clean {
        /// Products to clean (default: all, plus the project directories)
        #[arg(long, value_delimiter = ',', value_name = "NAME")]
        products: Vec<String>,
    },

    /// Publish dist artifacts to a remote
    #[command(subcommand)]
    Publish(PublishCommands),
}

/// Artifact path listings
#[derive(Subcommand)]
pub enum ArtifactsCommands {
    /// Paths of the build artifacts the products would produce
    Build {
        /// Products to list (default: all)
        #[arg(long, value_delimiter = ',', value_name = "NAME")]
        products: Vec<String>,

        /// Restrict the listing to these targets
        #[arg(long, value_delimiter = ',', value_name = "OS-ARCH")]
        os_arch: Vec<String>,

        /// Print absolute paths
        #[arg(long)]
        absolute: bool,

        /// List only artifacts whose sources require a rebuild
        #[arg(long)]
        requires_build: bool,
    },

    /// Paths of the dist artifacts the products would produce
    Dist {
        /// Products to list (default: all)
        #[arg(long, value_delimiter = ',', value_name = "NAME")]
        products: Vec<String>,

        /// Print absolute paths
        #[arg(long)]
        absolute: bool,
    },

    /// Names of the images the products would build
    Docker {
        /// Products to list (default: all)
        #[arg(long, value_delimiter = ',', value_name = "NAME")]
        products: Vec<String>,
    },
}

/// Container image operations
#[derive(Subcommand)]
pub enum DockerCommands {
    /// Build the images of the requested products, assembling the dist
    /// artifacts they depend on first
    Build {
        /// Products whose images to build (default: all with images)
        #[arg(long, value_delimiter = ',', value_name = "NAME")]
        products: Vec<String>,

        /// Prefix joined in front of every image repository
        #[arg(long, value_name = "PREFIX")]
        base_repository: Option<String>,

        /// Stream the container builder's output
        #[arg(long)]
        verbose: bool,
    },

    /// Push the built images of the requested products
    Push {
        /// Products whose images to push (default: all with images)
        #[arg(long, value_delimiter = ',', value_name = "NAME")]
        products: Vec<String>,

        /// Prefix joined in front of every image repository
        #[arg(long, value_name = "PREFIX")]
        base_repository: Option<String>,
    },
}

/// Arguments shared by every publish destination
#[derive(Args)]
pub struct PublishArgs {
    /// Products to publish (default: all)
    #[arg(long, value_delimiter = ',', value_name = "NAME")]
    pub products: Vec<String>,

    /// Abort on the first failing product instead of aggregating errors
    #[arg(long)]
    pub fail_fast: bool,

    /// Report planned uploads without contacting the remote
    #[arg(long)]
    pub dry_run: bool,

    /// Almanac service URL; registration happens when set
    #[arg(long, value_name = "URL")]
    pub almanac_url: Option<String>,

    /// Almanac access id
    #[arg(long, value_name = "ID")]
    pub almanac_id: Option<String>,

    /// Almanac signing secret
    #[arg(long, value_name = "SECRET")]
    pub almanac_secret: Option<String>,

    /// Release registered almanac units to GA
    #[arg(long)]
    pub almanac_release: bool,
}

/// Publish destinations
#[derive(Subcommand)]
pub enum PublishCommands {
    /// Copy artifacts into a local maven-style tree
    Local {
        #[command(flatten)]
        common: PublishArgs,

        /// Root of the tree (default: ~/.m2/repository)
        #[arg(long, value_name = "DIR")]
        path: Option<PathBuf>,
    },

    /// Upload to an artifactory-style repository
    Artifactory {
        #[command(flatten)]
        common: PublishArgs,

        /// Base URL of the remote
        #[arg(long)]
        url: String,

        /// Basic auth user
        #[arg(long)]
        user: String,

        /// Basic auth password
        #[arg(long)]
        password: String,

        /// Repository key
        #[arg(long)]
        repository: String,
    },

    /// Upload to a bintray-style repository
    Bintray {
        #[command(flatten)]
        common: PublishArgs,

        /// Base URL of the remote
        #[arg(long)]
        url: String,

        /// Basic auth user
        #[arg(long)]
        user: String,

        /// Basic auth password
        #[arg(long)]
        password: String,

        /// Subject (user or organization) owning the repository
        #[arg(long)]
        subject: String,

        /// Repository name
        #[arg(long)]
        repository: String,

        /// Publish the uploads once the last artifact lands
        #[arg(long)]
        publish: bool,

        /// List the uploads in the repository's downloads section
        #[arg(long)]
        downloads_list: bool,
    },

    /// Create a release on a github-style host and attach artifacts
    Github {
        #[command(flatten)]
        common: PublishArgs,

        /// API base URL of the host
        #[arg(long)]
        url: String,

        /// User the API token belongs to
        #[arg(long)]
        user: String,

        /// API token
        #[arg(long)]
        password: String,

        /// Repository owner (default: the user)
        #[arg(long)]
        owner: Option<String>,

        /// Repository name
        #[arg(long)]
        repository: String,
    },
}

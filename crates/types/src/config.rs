//! Declarative project configuration model
//!
//! Mirrors the on-disk YAML shape: a `products` mapping plus project-wide
//! defaults. Fields left empty inherit project-level values during spec
//! resolution; the types here carry the raw shape and the resolved shape
//! alike.

use crate::osarch::OsArch;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Top-level project configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProjectConfig {
    /// Product name to product configuration
    pub products: BTreeMap<String, ProductConfig>,
    /// Root for build outputs, relative to the project dir (default `build`)
    pub build_output_dir: String,
    /// Root for dist outputs, relative to the project dir (default `dist`)
    pub dist_output_dir: String,
    /// Default maven-style group identifier for publishing
    pub group_id: String,
    /// Script preamble prepended to every non-empty dist script
    pub dist_script_include: String,
    /// Matcher removing products from the project
    pub exclude: ExcludeConfig,
}

/// Name/path matcher used for product exclusion and YAML-validation exemptions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExcludeConfig {
    /// Glob patterns matched against names
    pub names: Vec<String>,
    /// Glob patterns matched against relative paths
    pub paths: Vec<String>,
}

impl ExcludeConfig {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.paths.is_empty()
    }
}

/// Per-product configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProductConfig {
    pub build: BuildConfig,
    pub run: RunConfig,
    /// Distribution configurations; a single mapping is accepted in YAML
    #[serde(deserialize_with = "one_or_many")]
    pub dist: Vec<DistConfig>,
    /// Container image configurations
    pub docker: Vec<DockerImageConfig>,
    /// Default publish configuration, copied down to each dist
    pub publish: PublishConfig,
}

impl ProductConfig {
    /// Names of every input product referenced by this product's dists and
    /// docker images, sorted and deduplicated
    #[must_use]
    pub fn input_product_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .dist
            .iter()
            .flat_map(|d| d.input_products.iter().cloned())
            .chain(
                self.docker
                    .iter()
                    .flat_map(|d| d.dependencies.iter().map(|dep| dep.product.clone())),
            )
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Build configuration for a product
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BuildConfig {
    /// Main package path relative to the project root
    pub main_pkg: String,
    /// Skip building this product entirely
    pub skip: bool,
    /// Shell script run once before the product's build units
    pub script: String,
    /// Override for the project build output directory
    pub output_dir: String,
    /// Script whose stdout lines become additional build flags
    pub build_args_script: String,
    /// Package path of a string variable linker-set to the version
    pub version_var: String,
    /// Environment overlay for build commands
    pub environment: BTreeMap<String, String>,
    /// Build targets; empty means the host target
    pub os_archs: Vec<OsArch>,
}

/// Run configuration for a product
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RunConfig {
    /// Literal arguments passed to the binary on `run`
    pub args: Vec<String>,
}

/// One distribution of a product
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DistConfig {
    /// Override for the project dist output directory
    pub output_dir: String,
    /// Directory of static files copied into the staging tree
    pub input_dir: String,
    /// Other products whose built binaries are required
    pub input_products: Vec<String>,
    /// Shell script run after the variant layout
    pub script: String,
    /// Distribution variant; `None` means the implicit os-archs-bin dist
    pub dist_type: Option<DistType>,
    /// Publish overlay for this dist
    pub publish: PublishConfig,
}

/// Distribution variant plus its parameters
///
/// Serialized as `{type: <kind>, info: {..}}`; a missing or null `info`
/// yields the variant's defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "info", rename_all = "kebab-case")]
pub enum DistType {
    Sls(SlsDistInfo),
    Bin(BinDistInfo),
    OsArchsBin(OsArchsBinDistInfo),
    Rpm(RpmDistInfo),
    Manual(ManualDistInfo),
}

impl DistType {
    /// Short identifier used in artifact naming and diagnostics
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sls(_) => "sls",
            Self::Bin(_) => "bin",
            Self::OsArchsBin(_) => "os-archs-bin",
            Self::Rpm(_) => "rpm",
            Self::Manual(_) => "manual",
        }
    }

    /// File extension of the artifact this variant produces
    #[must_use]
    pub fn artifact_extension(&self) -> String {
        match self {
            Self::Sls(_) => "sls.tgz".to_string(),
            Self::Bin(_) | Self::OsArchsBin(_) => "tgz".to_string(),
            Self::Rpm(_) => "rpm".to_string(),
            Self::Manual(info) => info.extension.clone(),
        }
    }
}

impl<'de> Deserialize<'de> for DistType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "kebab-case")]
        enum Kind {
            Sls,
            Bin,
            OsArchsBin,
            Rpm,
            Manual,
        }

        #[derive(Deserialize)]
        struct Tagged {
            #[serde(rename = "type")]
            kind: Kind,
            #[serde(default)]
            info: Option<serde_yml::Value>,
        }

        fn info<'de, T, D>(value: Option<serde_yml::Value>) -> Result<T, D::Error>
        where
            T: serde::de::DeserializeOwned + Default,
            D: Deserializer<'de>,
        {
            match value {
                None | Some(serde_yml::Value::Null) => Ok(T::default()),
                Some(v) => serde_yml::from_value(v).map_err(de::Error::custom),
            }
        }

        let tagged = Tagged::deserialize(deserializer)?;
        Ok(match tagged.kind {
            Kind::Sls => Self::Sls(info::<_, D>(tagged.info)?),
            Kind::Bin => Self::Bin(info::<_, D>(tagged.info)?),
            Kind::OsArchsBin => Self::OsArchsBin(info::<_, D>(tagged.info)?),
            Kind::Rpm => Self::Rpm(info::<_, D>(tagged.info)?),
            Kind::Manual => Self::Manual(info::<_, D>(tagged.info)?),
        })
    }
}

/// Service-layout distribution parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SlsDistInfo {
    /// Template file for the init script; empty uses the built-in template
    pub init_script_template_file: String,
    /// Template file for the manifest; empty uses the built-in template
    pub manifest_template_file: String,
    /// Arguments substituted into the default init script
    pub service_args: String,
    /// Product type identifier written to the manifest
    pub product_type: String,
    /// Manifest extension entries
    pub manifest_extensions: BTreeMap<String, serde_yml::Value>,
    /// Paths exempt from syntactic YAML validation
    pub yaml_validation_exclude: ExcludeConfig,
    /// Whether the service supports live reload
    pub reloadable: bool,
}

/// Binary-archive distribution parameters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BinDistInfo {
    /// Skip generating the OS-dispatch launcher script
    pub omit_init_sh: bool,
    /// Template file for the launcher; empty uses the built-in template
    pub init_sh_template_file: String,
}

/// Per-OS/arch binary distribution parameters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OsArchsBinDistInfo {
    /// Targets for which one archive per target is produced
    pub os_archs: Vec<OsArch>,
}

/// OS-package distribution parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RpmDistInfo {
    /// Package release identifier
    pub release: String,
    /// Absolute paths of in-package files declared as config files
    pub config_files: Vec<String>,
    pub before_install_script: String,
    pub after_install_script: String,
    pub after_remove_script: String,
}

impl Default for RpmDistInfo {
    fn default() -> Self {
        Self {
            release: "1".to_string(),
            config_files: Vec::new(),
            before_install_script: String::new(),
            after_install_script: String::new(),
            after_remove_script: String::new(),
        }
    }
}

/// Manual distribution parameters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ManualDistInfo {
    /// Extension of the artifact the dist script produces
    pub extension: String,
}

/// Container image configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DockerImageConfig {
    /// Image repository; empty defaults to the product name
    pub repository: String,
    /// Image tag; empty defaults to the product version
    pub tag: String,
    /// Build context directory relative to the project root
    pub context_dir: String,
    /// Script whose stdout lines become additional `docker build` arguments
    pub build_args_script: String,
    /// Artifacts required inside the context directory before building
    pub dependencies: Vec<DockerDep>,
    /// Image variant; `None` is the default variant
    pub info: Option<DockerImageInfo>,
}

/// A dependency of a container image on another product's output
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DockerDep {
    /// Product whose output is required
    pub product: String,
    /// Kind of output required
    #[serde(rename = "type")]
    pub kind: DockerDepKind,
    /// File name the artifact takes inside the context directory;
    /// empty keeps the artifact's own basename
    pub target_file: String,
}

/// Kind of artifact a container image depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DockerDepKind {
    /// Another product's container image (orders image builds)
    Docker,
    /// A service-layout dist artifact
    Sls,
    /// A binary dist artifact
    #[default]
    Bin,
    /// An OS-package dist artifact
    Rpm,
}

impl std::fmt::Display for DockerDepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Docker => "docker",
            Self::Sls => "sls",
            Self::Bin => "bin",
            Self::Rpm => "rpm",
        };
        f.write_str(name)
    }
}

/// Container image variant plus its parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "info", rename_all = "kebab-case")]
pub enum DockerImageInfo {
    Default,
    Sls(SlsDockerInfo),
}

impl<'de> Deserialize<'de> for DockerImageInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "kebab-case")]
        enum Kind {
            Default,
            Sls,
        }

        #[derive(Deserialize)]
        struct Tagged {
            #[serde(rename = "type")]
            kind: Kind,
            #[serde(default)]
            info: Option<serde_yml::Value>,
        }

        let tagged = Tagged::deserialize(deserializer)?;
        Ok(match tagged.kind {
            Kind::Default => Self::Default,
            Kind::Sls => match tagged.info {
                None | Some(serde_yml::Value::Null) => Self::Sls(SlsDockerInfo::default()),
                Some(v) => Self::Sls(serde_yml::from_value(v).map_err(de::Error::custom)?),
            },
        })
    }
}

/// Parameters for service-layout labelled container images
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SlsDockerInfo {
    /// Group identifier written to the labelled manifest
    pub group_id: String,
    /// Product type identifier written to the labelled manifest
    pub product_type: String,
    /// Manifest extension entries
    pub manifest_extensions: BTreeMap<String, serde_yml::Value>,
}

/// Publish configuration carried by a product and overlaid per dist
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PublishConfig {
    /// Maven-style group identifier
    pub group_id: String,
    /// Almanac metadata and tags
    pub almanac: AlmanacInfo,
}

/// Almanac registration info attached to published artifacts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AlmanacInfo {
    pub metadata: BTreeMap<String, String>,
    pub tags: Vec<String>,
}

/// Accept either a single mapping or a sequence of mappings
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<DistConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Box<DistConfig>),
        Many(Vec<DistConfig>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(one) => vec![*one],
        OneOrMany::Many(many) => many,
    })
}

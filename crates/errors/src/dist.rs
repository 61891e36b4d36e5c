//! Dist engine error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum DistError {
    #[error("build artifacts missing for products {missing:?}; run build first")]
    MissingBuildArtifacts { missing: Vec<String> },

    #[error("dist layout for {product} is missing required entries: {missing:?}")]
    LayoutIncomplete {
        product: String,
        missing: Vec<String>,
    },

    #[error("invalid YAML in {path}: {message}")]
    InvalidYaml { path: String, message: String },

    #[error("os/arch {os_arch} is not part of the build targets for {product}")]
    OsArchNotBuilt { product: String, os_arch: String },

    #[error("{dist_type} dist for {product} requires linux/amd64 as the only build target")]
    RequiresLinuxAmd64 { dist_type: String, product: String },

    #[error("template {name} failed to render: {message}")]
    TemplateFailed { name: String, message: String },

    #[error("archiver failed for {path}: {message}")]
    ArchiveFailed { path: String, message: String },

    #[error("required tool {tool} was not found on PATH. {hint}")]
    MissingTool { tool: String, hint: String },

    #[error("{tool} exited with {code}: {output}")]
    ToolFailed {
        tool: String,
        code: i32,
        output: String,
    },

    #[error("docker image dependency cycle: {cycle:?}")]
    ImageDependencyCycle { cycle: Vec<String> },

    #[error("image for {product} needs the {kind} artifact of {dependency} at {path}; run dist first")]
    DependencyArtifactMissing {
        product: String,
        dependency: String,
        kind: String,
        path: String,
    },

    #[error("image for {product} depends on {dependency}, which has no {kind} dist configured")]
    NoDistOfKind {
        product: String,
        dependency: String,
        kind: String,
    },

    #[error("manual dist for {product} did not produce {expected}")]
    ManualArtifactMissing { product: String, expected: String },
}

//! Template rendering for init scripts and user-supplied manifests
//!
//! Templates see `ProductName`, `ProductVersion`, `VersionInfo.*`, a
//! flattened `Dist.*` view of the distribution's own fields, and
//! `Publish.*`.

use serde::Serialize;
use slipway_errors::{DistError, Result};
use slipway_types::{DistConfig, DistType, ProductSpec};
use std::collections::BTreeMap;
use tera::{Context, Tera};

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TemplateContext {
    product_name: String,
    product_version: String,
    version_info: VersionContext,
    dist: BTreeMap<String, serde_yml::Value>,
    publish: PublishContext,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct VersionContext {
    version: String,
    branch: String,
    revision: String,
}

#[derive(Serialize)]
struct PublishContext {
    #[serde(rename = "GroupID")]
    group_id: String,
    #[serde(rename = "Almanac")]
    almanac: AlmanacContext,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AlmanacContext {
    metadata: BTreeMap<String, String>,
    tags: Vec<String>,
}

/// Render one template against the product and dist variables
///
/// # Errors
///
/// Returns an error when the template fails to parse or render.
pub fn render(name: &str, raw: &str, spec: &ProductSpec, dist: &DistConfig) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, raw)
        .map_err(|e| DistError::TemplateFailed {
            name: name.to_string(),
            message: e.to_string(),
        })?;
    let context =
        Context::from_serialize(build_context(spec, dist)).map_err(|e| DistError::TemplateFailed {
            name: name.to_string(),
            message: e.to_string(),
        })?;
    tera.render(name, &context).map_err(|e| {
        DistError::TemplateFailed {
            name: name.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

fn build_context(spec: &ProductSpec, dist: &DistConfig) -> TemplateContext {
    TemplateContext {
        product_name: spec.name.clone(),
        product_version: spec.version.clone(),
        version_info: VersionContext {
            version: spec.version_info.version.clone(),
            branch: spec.version_info.branch.clone(),
            revision: spec.version_info.revision.clone(),
        },
        dist: dist_fields(dist),
        publish: PublishContext {
            group_id: dist.publish.group_id.clone(),
            almanac: AlmanacContext {
                metadata: dist.publish.almanac.metadata.clone(),
                tags: dist.publish.almanac.tags.clone(),
            },
        },
    }
}

/// Flattened view of the distribution's own fields
fn dist_fields(dist: &DistConfig) -> BTreeMap<String, serde_yml::Value> {
    use serde_yml::Value;

    let mut fields = BTreeMap::new();
    fields.insert(
        "InputDir".to_string(),
        Value::String(dist.input_dir.clone()),
    );
    fields.insert(
        "OutputDir".to_string(),
        Value::String(dist.output_dir.clone()),
    );
    match &dist.dist_type {
        Some(DistType::Sls(info)) => {
            fields.insert(
                "ServiceArgs".to_string(),
                Value::String(info.service_args.clone()),
            );
            fields.insert(
                "ProductType".to_string(),
                Value::String(info.product_type.clone()),
            );
            fields.insert("Reloadable".to_string(), Value::Bool(info.reloadable));
            fields.insert(
                "ManifestExtensions".to_string(),
                serde_yml::to_value(&info.manifest_extensions).unwrap_or(Value::Null),
            );
        }
        Some(DistType::Bin(info)) => {
            fields.insert("OmitInitSh".to_string(), Value::Bool(info.omit_init_sh));
        }
        Some(DistType::OsArchsBin(info)) => {
            let targets = info
                .os_archs
                .iter()
                .map(|os_arch| Value::String(os_arch.to_string()))
                .collect();
            fields.insert("OsArchs".to_string(), Value::Sequence(targets));
        }
        Some(DistType::Rpm(info)) => {
            fields.insert("Release".to_string(), Value::String(info.release.clone()));
        }
        Some(DistType::Manual(info)) => {
            fields.insert(
                "Extension".to_string(),
                Value::String(info.extension.clone()),
            );
        }
        None => {}
    }
    fields
}

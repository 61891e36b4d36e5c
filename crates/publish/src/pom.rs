//! Maven POM descriptor generation
//!
//! Every published distribution carries a minimal POM next to its
//! artifacts so Maven-style remotes can index it.

/// Render the POM descriptor for one product distribution
///
/// `packaging` is the distribution's artifact extension, e.g. `tgz` or
/// `rpm`.
#[must_use]
pub fn render(group_id: &str, product: &str, version: &str, packaging: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd">
<modelVersion>4.0.0</modelVersion>
<groupId>{group_id}</groupId>
<artifactId>{product}</artifactId>
<version>{version}</version>
<packaging>{packaging}</packaging>
</project>
"#
    )
}

/// File name the POM is written and uploaded under
#[must_use]
pub fn file_name(product: &str, version: &str) -> String {
    format!("{product}-{version}.pom")
}

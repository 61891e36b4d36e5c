//! Light-weight inspection of Go source files
//!
//! Declaration-level scanning only: package clause, import set, and
//! top-level `main` function. That is all discovery, freshness checking,
//! and `run` need, so no full parser is involved.

use std::path::Path;

/// Parsed declarations of one Go source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoSource {
    /// Package clause name, empty if none was found
    pub package: String,
    /// Import paths in declaration order
    pub imports: Vec<String>,
    /// Whether the file declares a top-level `func main(`
    pub has_main_func: bool,
}

impl GoSource {
    /// Whether the file imports `"C"` and therefore needs cgo
    #[must_use]
    pub fn uses_cgo(&self) -> bool {
        self.imports.iter().any(|import| import == "C")
    }
}

/// Whether a path names a Go source file
#[must_use]
pub fn is_go_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "go")
}

/// Whether a path names a Go test file
#[must_use]
pub fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with("_test.go"))
}

/// Whether an import path is a standard-library package
///
/// Standard-library paths have no dot in their first segment
/// (`fmt`, `net/http`); anything else is assumed fetchable source.
#[must_use]
pub fn is_stdlib_import(import: &str) -> bool {
    import
        .split('/')
        .next()
        .is_some_and(|first| !first.contains('.'))
}

/// Scan a Go source file's declarations
#[must_use]
pub fn parse(content: &str) -> GoSource {
    let mut source = GoSource::default();
    let mut in_block_comment = false;
    let mut in_import_block = false;

    for raw in content.lines() {
        let mut line = raw.trim();

        if in_block_comment {
            match line.find("*/") {
                Some(end) => {
                    line = line[end + 2..].trim();
                    in_block_comment = false;
                }
                None => continue,
            }
        }
        // Strip a trailing block comment opener; nested openers on one
        // line are beyond what declaration scanning needs
        if let Some(start) = line.find("/*") {
            if !line[start..].contains("*/") {
                in_block_comment = true;
            }
            line = line[..start].trim();
        }
        if let Some(start) = line.find("//") {
            line = line[..start].trim();
        }
        if line.is_empty() {
            continue;
        }

        if in_import_block {
            if line.starts_with(')') {
                in_import_block = false;
            } else if let Some(path) = quoted_import(line) {
                source.imports.push(path);
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("package ") {
            if source.package.is_empty() {
                source.package = rest.trim().to_string();
            }
        } else if line == "import (" || line.starts_with("import (") {
            in_import_block = true;
        } else if let Some(rest) = line.strip_prefix("import ") {
            if let Some(path) = quoted_import(rest) {
                source.imports.push(path);
            }
        } else if line.starts_with("func main(") {
            source.has_main_func = true;
        }
    }

    source
}

/// Extract the quoted import path from an import line, tolerating aliases
/// (`alias "path"`, `_ "path"`, `. "path"`)
fn quoted_import(line: &str) -> Option<String> {
    let start = line.find('"')?;
    let rest = &line[start + 1..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_package_and_single_imports() {
        let src = parse(
            r#"package main

import "fmt"
import f "os"

func main() {
    fmt.Println(f.Args)
}
"#,
        );
        assert_eq!(src.package, "main");
        assert_eq!(src.imports, vec!["fmt", "os"]);
        assert!(src.has_main_func);
    }

    #[test]
    fn parses_import_blocks() {
        let src = parse(
            r#"package server

import (
    "net/http"
    _ "net/http/pprof"
    "github.com/test/project/internal/api"
)
"#,
        );
        assert_eq!(
            src.imports,
            vec![
                "net/http",
                "net/http/pprof",
                "github.com/test/project/internal/api"
            ]
        );
        assert!(!src.has_main_func);
    }

    #[test]
    fn comments_do_not_confuse_the_scan() {
        let src = parse(
            r#"// package comment
/* block
   package notme
*/
package real // trailing

/* import "bogus" */
import "fmt"
"#,
        );
        assert_eq!(src.package, "real");
        assert_eq!(src.imports, vec!["fmt"]);
    }

    #[test]
    fn detects_cgo() {
        let src = parse("package main\n\nimport \"C\"\n");
        assert!(src.uses_cgo());
    }

    #[test]
    fn classifies_stdlib_imports() {
        assert!(is_stdlib_import("fmt"));
        assert!(is_stdlib_import("net/http"));
        assert!(!is_stdlib_import("github.com/test/project/pkg"));
        assert!(!is_stdlib_import("example.org/mod"));
    }

    #[test]
    fn file_name_predicates() {
        assert!(is_go_file(Path::new("main.go")));
        assert!(!is_go_file(Path::new("README.md")));
        assert!(is_test_file(Path::new("main_test.go")));
        assert!(!is_test_file(Path::new("main.go")));
    }
}

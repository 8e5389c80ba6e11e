//! Output path convention per implementation mode.

use std::path::Path;

use gantry_core::Mode;
use serde::{Deserialize, Serialize};

/// Maps (contract base name, mode) to an artifact path.
///
/// Patterns may use `{name}` (contract base name as written) and `{Name}`
/// (the base name in PascalCase). Two contracts with the same base name
/// route to the same artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingTable {
    pub backend: String,
    pub frontend: String,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self {
            backend: "apps/api/src/routes/{name}.ts".to_string(),
            frontend: "apps/web/src/components/{Name}View.tsx".to_string(),
        }
    }
}

impl RoutingTable {
    pub fn pattern(&self, mode: Mode) -> &str {
        match mode {
            Mode::Backend => &self.backend,
            Mode::Frontend => &self.frontend,
        }
    }

    /// Artifact path for a contract in a mode.
    pub fn resolve(&self, contract_path: &str, mode: Mode) -> String {
        let name = base_name(contract_path);
        self.pattern(mode)
            .replace("{name}", &name)
            .replace("{Name}", &pascal_case(&name))
    }
}

/// File name without directory or extensions (`types/x.d.ts` -> `x`).
pub fn base_name(path: &str) -> String {
    let file = Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());
    match file.split_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file,
    }
}

fn pascal_case(name: &str) -> String {
    name.split(|c: char| c == '-' || c == '_' || c == ' ')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

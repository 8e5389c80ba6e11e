//! Instruction texts for the generation stages.

use gantry_core::Mode;

use crate::parse::SCHEMA_MARKER;

/// System instruction for the contract stage.
pub fn contract_system() -> String {
    format!(
        "You are a software architect defining the shared interface for one feature.\n\
         Respond with a single TypeScript file and nothing else.\n\
         Rules:\n\
         1. The first line must be `// FILE: <relative path>` naming where the file belongs.\n\
         2. Export the primary data shape for the feature.\n\
         3. Export a display-oriented data shape derived from it for the user interface.\n\
         4. After the TypeScript, write the marker {} on its own line, followed by exactly\n\
            one Prisma `model <Name> {{ ... }}` block persisting the primary shape.\n\
         Do not add explanations.",
        SCHEMA_MARKER
    )
}

/// User instruction for the contract stage.
pub fn contract_user(task: &str) -> String {
    format!("Define the contract for this work item:\n\n{}", task)
}

/// System instruction for a fresh generation in a mode.
pub fn implement_system(mode: Mode) -> &'static str {
    match mode {
        Mode::Backend => {
            "You are a backend engineer writing one HTTP route module.\n\
             Conform exactly to the public interface of the contract you are given; import\n\
             its types instead of redefining them. Never import frontend or UI packages.\n\
             Follow the project rules. Respond with the complete file only."
        }
        Mode::Frontend => {
            "You are a frontend engineer writing one React view component.\n\
             Render the display-oriented shape from the contract you are given; import its\n\
             types instead of redefining them. Never import server, database or ORM packages.\n\
             Follow the project rules. Respond with the complete file only."
        }
    }
}

/// System instruction for a repair.
pub fn repair_system(mode: Mode) -> String {
    format!(
        "You are a {} engineer fixing a file that failed the quality gate.\n\
         Fix every problem in the failure report without changing behaviour that is not\n\
         involved. Keep conforming to the contract. Respond with the full corrected file,\n\
         never a diff or a fragment.",
        mode
    )
}

/// User instruction for a fresh generation.
pub fn implement_user(task: &str, contract: &str, rules: &str, target: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("Target file: {}\n\n", target));
    if !task.is_empty() {
        out.push_str(&format!("## Work item\n{}\n\n", task));
    }
    out.push_str(&format!("## Contract\n{}\n", contract.trim_end()));
    if !rules.trim().is_empty() {
        out.push_str(&format!("\n## Project rules\n{}\n", rules.trim_end()));
    }
    out
}

/// User instruction for a repair.
pub fn repair_user(contract: &str, rules: &str, target: &str, existing: &str, report: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("Target file: {}\n\n", target));
    out.push_str(&format!("## Contract\n{}\n\n", contract.trim_end()));
    if !rules.trim().is_empty() {
        out.push_str(&format!("## Project rules\n{}\n\n", rules.trim_end()));
    }
    out.push_str(&format!("## Current file\n{}\n\n", existing.trim_end()));
    out.push_str(&format!("## Failure report\n{}\n", report.trim_end()));
    out
}

//! Pipeline bounds and repair routing.

use serde::{Deserialize, Serialize};

use crate::state::{FailureKind, Mode};

/// Which implementation targets a repair pass regenerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepairTarget {
    #[default]
    Backend,
    Frontend,
    Both,
}

impl RepairTarget {
    /// Modes to regenerate, in order.
    pub fn modes(&self) -> Vec<Mode> {
        match self {
            RepairTarget::Backend => vec![Mode::Backend],
            RepairTarget::Frontend => vec![Mode::Frontend],
            RepairTarget::Both => vec![Mode::Backend, Mode::Frontend],
        }
    }
}

/// Repair targets keyed by the kind of gate failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RepairRouting {
    pub lint: RepairTarget,
    pub test: RepairTarget,
}

impl RepairRouting {
    /// Route every failure kind to the same target.
    pub fn uniform(target: RepairTarget) -> Self {
        Self {
            lint: target,
            test: target,
        }
    }

    pub fn target(&self, kind: FailureKind) -> RepairTarget {
        match kind {
            FailureKind::Lint => self.lint,
            FailureKind::Test => self.test,
        }
    }

    pub fn targets(&self, kind: FailureKind) -> Vec<Mode> {
        self.target(kind).modes()
    }

    /// Largest number of implementation visits a single repair pass can make.
    fn widest_pass(&self) -> u32 {
        self.lint.modes().len().max(self.test.modes().len()) as u32
    }
}

/// Bounds and routing for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum number of repair passes before the run aborts
    pub max_repairs: u32,
    /// Cap on total stage invocations; derived from `max_repairs` when unset
    pub max_steps: Option<u32>,
    pub repair_routing: RepairRouting,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_repairs: 3,
            max_steps: None,
            repair_routing: RepairRouting::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_repairs(mut self, max_repairs: u32) -> Self {
        self.max_repairs = max_repairs;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn with_repair_routing(mut self, routing: RepairRouting) -> Self {
        self.repair_routing = routing;
        self
    }

    /// Total stage invocations a run may make.
    ///
    /// intake + contract + two implementation visits + gate, then per repair
    /// pass its implementation visits plus a gate, then publish.
    ///
    /// Saturates at `u32::MAX` for very large repair limits.
    pub fn step_budget(&self) -> u32 {
        self.max_steps.unwrap_or_else(|| {
            self.max_repairs
                .saturating_mul(self.repair_routing.widest_pass() + 1)
                .saturating_add(5 + 1)
        })
    }
}

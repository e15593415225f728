//! Deployment state types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::color::DeployColor;

/// Status of a deployment, per alias.
///
/// Derived on demand by querying the alias registry and the index pattern;
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Idle,
    Deploying,
    ReadyForSwap,
    Swapping,
    Completed,
    Failed,
    RollingBack,
}

/// Policy controlling whether a validated deployment swaps automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentStrategy {
    /// Build and validate, then wait for a manual promote.
    #[default]
    Safe,
    /// Swap the alias as soon as the new index validates.
    AutoSwap,
}

impl DeploymentStrategy {
    /// Parse the query-string form (`safe` / `auto-swap`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "safe" => Some(DeploymentStrategy::Safe),
            "auto-swap" | "auto_swap" => Some(DeploymentStrategy::AutoSwap),
            _ => None,
        }
    }
}

/// The computed blue/green state of one alias.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentState {
    pub alias: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_color: Option<DeployColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_index: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_color: Option<DeployColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staging_index: Option<String>,
    pub status: DeploymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_deployment: Option<DateTime<Utc>>,
    pub strategy: DeploymentStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeploymentState {
    /// An idle state for an alias with no indices.
    pub fn idle(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            active_color: None,
            active_index: None,
            staging_color: None,
            staging_index: None,
            status: DeploymentStatus::Idle,
            last_deployment: None,
            strategy: DeploymentStrategy::Safe,
            error: None,
        }
    }

    /// The color the next deployment should target: the opposite of the
    /// active color, defaulting to blue when nothing is active.
    pub fn next_color(&self) -> DeployColor {
        self.active_color
            .map(DeployColor::opposite)
            .unwrap_or(DeployColor::Blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&DeploymentStatus::ReadyForSwap).unwrap(),
            "\"READY_FOR_SWAP\""
        );
        assert_eq!(
            serde_json::to_string(&DeploymentStatus::RollingBack).unwrap(),
            "\"ROLLING_BACK\""
        );
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            DeploymentStrategy::parse("safe"),
            Some(DeploymentStrategy::Safe)
        );
        assert_eq!(
            DeploymentStrategy::parse("auto-swap"),
            Some(DeploymentStrategy::AutoSwap)
        );
        assert_eq!(
            DeploymentStrategy::parse("AUTO-SWAP"),
            Some(DeploymentStrategy::AutoSwap)
        );
        assert_eq!(DeploymentStrategy::parse("yolo"), None);
    }

    #[test]
    fn test_next_color() {
        let mut state = DeploymentState::idle("products");
        assert_eq!(state.next_color(), DeployColor::Blue);

        state.active_color = Some(DeployColor::Blue);
        assert_eq!(state.next_color(), DeployColor::Green);

        state.active_color = Some(DeployColor::Green);
        assert_eq!(state.next_color(), DeployColor::Blue);
    }
}

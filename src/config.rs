//! Engine configuration. Defaults mirror the tuned constants of the
//! product build; a TOML file can override any subset, and
//! `AROS_RESPONDER_URL` overrides the responder endpoint.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Viewport geometry the renderer reports at startup. The engine
    /// has no window of its own; bounds are derived from these.
    pub viewport_w: f32,
    pub viewport_h: f32,
    /// Unscaled body width in pixels, used for the lateral bound.
    pub body_width: f32,

    /// Lateral step per discrete move, in pixels.
    pub x_step: f32,
    /// Depth step per discrete move.
    pub z_step: f32,

    pub drain_period_ms: u64,
    pub drain_idle: i32,
    pub drain_active: i32,
    /// Battery at or below this (and above zero) shows Tired.
    pub low_battery: u8,

    pub inactivity_ms: u64,

    pub charge_period_ms: u64,
    pub charge_step: i32,

    /// Synthetic interacting pulse around instantaneous moves.
    pub pulse_ms: u64,

    pub welcome_delay_ms: u64,
    pub welcome_message_ms: u64,

    /// Tired -> Sleeping fall time.
    pub sleep_fall_ms: u64,

    pub explore_min_ms: u64,
    pub explore_max_ms: u64,
    pub explore_emote_ms: u64,
    /// Probability that a wander step moves instead of emoting.
    pub explore_move_p: f64,

    pub responder: ResponderConfig,

    /// Fixed RNG seed; unset means seed from entropy.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport_w: 1280.0,
            viewport_h: 800.0,
            body_width: 200.0,
            x_step: 60.0,
            z_step: 0.2,
            drain_period_ms: 15_000,
            drain_idle: 1,
            drain_active: 2,
            low_battery: 20,
            inactivity_ms: 30_000,
            charge_period_ms: 500,
            charge_step: 2,
            pulse_ms: 300,
            welcome_delay_ms: 1_000,
            welcome_message_ms: 5_000,
            sleep_fall_ms: 2_000,
            explore_min_ms: 1_000,
            explore_max_ms: 2_000,
            explore_emote_ms: 1_500,
            explore_move_p: 0.7,
            responder: ResponderConfig::default(),
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config: EngineConfig =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        config.apply_env();
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("AROS_RESPONDER_URL") {
            if !url.is_empty() {
                self.responder.base_url = url;
            }
        }
    }

    /// Lateral bound for autonomous movement at depth `z`: half the
    /// viewport minus the scaled body width.
    pub fn x_boundary(&self, z: f32) -> f32 {
        let scale = 1.0 + z * 0.25;
        self.viewport_w / 2.0 - self.body_width * scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_tuning() {
        let c = EngineConfig::default();
        assert_eq!(c.drain_period_ms, 15_000);
        assert_eq!(c.inactivity_ms, 30_000);
        assert_eq!(c.charge_period_ms, 500);
        assert_eq!(c.x_step, 60.0);
    }

    #[test]
    fn partial_toml_overrides() {
        let parsed: EngineConfig = toml::from_str("inactivity_ms = 1000").unwrap();
        assert_eq!(parsed.inactivity_ms, 1_000);
        assert_eq!(parsed.charge_period_ms, 500);
    }
}

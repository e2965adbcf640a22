//! Central Configuration Constants
//!
//! Single source of truth for all evaluation defaults.
//! Each default can be overridden through the matching environment variable.

use std::path::PathBuf;

/// Smallest accepted top-k
pub const MIN_TOPK: usize = 1;

/// Largest accepted top-k
pub const MAX_TOPK: usize = 5;

/// Default top-k used by the CLI
pub const DEFAULT_TOPK: usize = 5;

/// Resolution (height, width) the target model expects after a surrogate handoff
pub const TARGET_RESOLUTION: (usize, usize) = (256, 256);

/// Key under which a perturbed tensor is dumped
pub const PERTURBED_INPUT_KEY: &str = "perturbed_input";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "attack-eval";

// ============================================
// Environment variable names
// ============================================

pub const ENV_TOPK: &str = "ATTACK_EVAL_TOPK";
pub const ENV_TARGET_SIZE: &str = "ATTACK_EVAL_TARGET_SIZE";
pub const ENV_RESULTS_DIR: &str = "ATTACK_EVAL_RESULTS_DIR";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get top-k from environment or use default
pub fn get_topk() -> usize {
    std::env::var(ENV_TOPK)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TOPK)
}

/// Get target resolution from environment (`256` or `224x224`) or use default
pub fn get_target_resolution() -> (usize, usize) {
    std::env::var(ENV_TARGET_SIZE)
        .ok()
        .and_then(|s| parse_resolution(&s))
        .unwrap_or(TARGET_RESOLUTION)
}

/// Get results directory from environment or use the local data dir
pub fn get_results_dir() -> PathBuf {
    std::env::var(ENV_RESULTS_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_NAME)
                .join("results")
        })
}

fn parse_resolution(raw: &str) -> Option<(usize, usize)> {
    let raw = raw.trim();
    let (h, w) = match raw.split_once(['x', 'X']) {
        Some((h, w)) => (h.trim().parse().ok()?, w.trim().parse().ok()?),
        None => {
            let side = raw.parse().ok()?;
            (side, side)
        }
    };
    if h == 0 || w == 0 {
        return None;
    }
    Some((h, w))
}

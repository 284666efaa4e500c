//! Runtime configuration of a halo exchange engine.

use crate::algs::communicator::ExchangeTags;
use crate::data::layout::DEFAULT_CACHE_LINE_BYTES;
use serde::{Deserialize, Serialize};

/// Knobs of [`HaloExchange`](crate::algs::exchange::HaloExchange).
///
/// Every field has a default, so a partial JSON/TOML document is enough:
///
/// ```
/// use mesh_halo::config::HaloConfig;
/// let cfg: HaloConfig = serde_json::from_str(r#"{ "cache_line_bytes": 64 }"#).unwrap();
/// assert_eq!(cfg.cache_line_bytes, 64);
/// assert_eq!(cfg.tags.pos_vel.as_u16(), 2048);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HaloConfig {
    /// Slot sizes are rounded up to a multiple of this many bytes.
    pub cache_line_bytes: usize,
    pub tags: ExchangeTags,
}

impl Default for HaloConfig {
    fn default() -> Self {
        Self {
            cache_line_bytes: DEFAULT_CACHE_LINE_BYTES,
            tags: ExchangeTags::default(),
        }
    }
}

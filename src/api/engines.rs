//! Engines API
//!
//! Older listing of the models behind each endpoint. Superseded by the models
//! API but still served.

use crate::api::common::Object;
use serde::{Deserialize, Serialize};

/// An engine and whether it is serving requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    /// Engine ID, e.g. `davinci`
    pub id: String,

    /// Always `engine`
    #[serde(default)]
    pub object: Object,

    /// Organization that owns the engine
    #[serde(default)]
    pub owner: String,

    /// Whether the engine accepts requests
    #[serde(default)]
    pub ready: bool,
}

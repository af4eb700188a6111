use std::path::Path;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::adapters::ParamMap;
use crate::dispatcher::SolveOptions;

/// Default solve options, layered from built-in defaults, an optional TOML
/// file and `SOLVER_DISPATCH__*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub backend: String,
    pub display: bool,
    pub params: ParamMap,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            backend: "clarabel".to_string(),
            display: false,
            params: ParamMap::new(),
        }
    }
}

impl DispatchConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(path.as_ref()))
                .merge(Env::prefixed("SOLVER_DISPATCH__").split("__")),
        )
    }

    /// Extract from `figment` layered over [`DispatchConfig::default`].
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(DispatchConfig::default())).merge(figment);
        Ok(figment.extract()?)
    }

    pub fn options(&self) -> SolveOptions {
        SolveOptions {
            backend: self.backend.clone(),
            display: self.display,
            params: self.params.clone(),
        }
    }
}

//! Error type shared by placement, tracking and configuration.
use std::path::PathBuf;

use thiserror::Error;

use crate::utils::objects::CubeIdentity;

#[derive(Debug, Error)]
pub enum ArError {
    #[error("model for {0:?} is not loaded")]
    AssetLoadFailure(CubeIdentity),

    #[error("no surface sample close enough to the candidate position")]
    NoValidSurfaceNearby,

    #[error("raycast did not hit any tracked plane")]
    NoRaycastHit,

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

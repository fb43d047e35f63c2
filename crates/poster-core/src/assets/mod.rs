//! Concurrent loading of the rasters a poster is built from.
//!
//! [`load_all`] is an all-or-nothing barrier: every request is started at
//! once, the result is returned only when all of them have decoded, and the
//! first failure completes the barrier immediately, dropping the loads still
//! in flight. No partial results are ever exposed.
//!
//! # Example
//!
//! ```ignore
//! let requests = vec![
//!     AssetRequest::location(AssetRole::Template, "template.jpg"),
//!     AssetRequest::bytes(AssetRole::UserPhoto, photo_bytes),
//! ];
//! let mut assets = load_all(&FsSource::new("public"), requests).await?;
//! let template = assets.take(AssetRole::Template)?;
//! ```

mod source;

pub use source::{normalize_location, AssetSource, FetchError, FsSource, MemorySource};

use std::collections::BTreeMap;
use std::fmt;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::decode::{decode_image, DecodeError, ImageAsset};

/// Logical role of an image in the poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetRole {
    Background,
    Template,
    UserPhoto,
}

impl AssetRole {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetRole::Background => "background",
            AssetRole::Template => "template",
            AssetRole::UserPhoto => "user photo",
        }
    }
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the bytes of an asset come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetRef {
    /// A location resolved through an [`AssetSource`].
    Location(String),
    /// Bytes already in memory (an uploaded file or a cropped photo).
    Bytes(Vec<u8>),
}

/// One entry of a [`load_all`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub role: AssetRole,
    pub source: AssetRef,
}

impl AssetRequest {
    pub fn location(role: AssetRole, location: impl Into<String>) -> Self {
        Self {
            role,
            source: AssetRef::Location(location.into()),
        }
    }

    pub fn bytes(role: AssetRole, bytes: Vec<u8>) -> Self {
        Self {
            role,
            source: AssetRef::Bytes(bytes),
        }
    }
}

/// Failure of a single asset, which fails the whole barrier.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The bytes could not be fetched.
    #[error("Failed to load {role} from '{location}': {reason}")]
    Unavailable {
        role: AssetRole,
        location: String,
        reason: String,
    },

    /// The bytes are not a readable image.
    #[error("Could not decode {role}: {source}")]
    Undecodable {
        role: AssetRole,
        #[source]
        source: DecodeError,
    },

    /// A role was requested from a result set that does not contain it.
    #[error("No {role} was loaded")]
    Missing { role: AssetRole },
}

impl AssetError {
    /// Role of the asset that failed.
    pub fn role(&self) -> AssetRole {
        match self {
            AssetError::Unavailable { role, .. }
            | AssetError::Undecodable { role, .. }
            | AssetError::Missing { role } => *role,
        }
    }
}

/// Successfully loaded assets, keyed by role.
#[derive(Debug, Default)]
pub struct LoadedAssets {
    assets: BTreeMap<AssetRole, ImageAsset>,
}

impl LoadedAssets {
    pub fn get(&self, role: AssetRole) -> Option<&ImageAsset> {
        self.assets.get(&role)
    }

    /// Remove and return the asset for `role`.
    pub fn take(&mut self, role: AssetRole) -> Result<ImageAsset, AssetError> {
        self.assets
            .remove(&role)
            .ok_or(AssetError::Missing { role })
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl FromIterator<(AssetRole, ImageAsset)> for LoadedAssets {
    fn from_iter<T: IntoIterator<Item = (AssetRole, ImageAsset)>>(iter: T) -> Self {
        Self {
            assets: iter.into_iter().collect(),
        }
    }
}

/// Load every request concurrently; succeed only if all succeed.
///
/// Completion order does not matter: the result is keyed by role. The first
/// request to fail completes the call with that request's error.
#[tracing::instrument(skip_all, fields(count = requests.len()))]
pub async fn load_all<S: AssetSource>(
    source: &S,
    requests: Vec<AssetRequest>,
) -> Result<LoadedAssets, AssetError> {
    let loads = requests
        .into_iter()
        .map(|request| load_one(source, request));

    let loaded = try_join_all(loads).await.map_err(|e| {
        warn!(role = %e.role(), error = %e, "asset barrier failed");
        e
    })?;

    Ok(loaded.into_iter().collect())
}

async fn load_one<S: AssetSource>(
    source: &S,
    request: AssetRequest,
) -> Result<(AssetRole, ImageAsset), AssetError> {
    let AssetRequest { role, source: asset } = request;

    let bytes = match asset {
        AssetRef::Bytes(bytes) => bytes,
        AssetRef::Location(location) => {
            debug!(%role, %location, "fetching asset");
            source
                .fetch(&location)
                .await
                .map_err(|e| AssetError::Unavailable {
                    role,
                    location,
                    reason: e.reason,
                })?
        }
    };

    let image = decode_image(&bytes).map_err(|source| AssetError::Undecodable { role, source })?;
    debug!(%role, width = image.width, height = image.height, "asset ready");
    Ok((role, image))
}

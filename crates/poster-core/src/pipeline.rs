//! The poster session: everything between "a file was chosen" and "here is
//! your poster".
//!
//! [`PosterSession`] owns the only mutable state of the pipeline: the selected
//! photo, the crop controller, the pending cropped image and the last result.
//! Generation is split in three steps so that no borrow of the session is held
//! while assets load:
//!
//! 1. [`PosterSession::prepare_generation`] validates the inputs and snapshots
//!    them into a [`GenerationRequest`]
//! 2. [`GenerationRequest::run`] loads every asset behind one barrier, then
//!    composes and exports
//! 3. [`PosterSession::finish_generation`] stores the result and consumes the
//!    crop it was built from
//!
//! [`PosterSession::generate`] runs all three in sequence.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::assets::{load_all, AssetError, AssetRequest, AssetRole, AssetSource};
use crate::compose::{display_name, ComposeError, Compositor};
use crate::config::PosterConfig;
use crate::crop::{CropController, CropError, CropState, CroppedImage};
use crate::export::{expose, Download, ExportedPoster};

/// An input that must be present before generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingField {
    FirstName,
    LastName,
    Photo,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingField::FirstName => "first name",
            MissingField::LastName => "last name",
            MissingField::Photo => "photo",
        })
    }
}

fn join_fields(fields: &[MissingField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pipeline failures, each recovered at the session boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Name fields or photo absent. Nothing was started.
    #[error("Missing input: {}", join_fields(.0))]
    MissingInput(Vec<MissingField>),

    /// The background or template could not be loaded.
    #[error("Failed to load {role} from '{location}': {reason}")]
    AssetLoadFailure {
        role: AssetRole,
        location: String,
        reason: String,
    },

    /// The photo is not a readable image.
    #[error("Could not decode the photo: {0}")]
    PhotoDecodeFailure(String),

    /// The selected file could not be opened for cropping.
    #[error("Could not open the photo for cropping: {0}")]
    CropDecodeFailure(String),

    #[error(transparent)]
    Crop(CropError),

    #[error(transparent)]
    Compose(#[from] ComposeError),
}

impl PipelineError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::MissingInput(_) => {
                "Please fill in all fields and upload a photo.".to_string()
            }
            PipelineError::AssetLoadFailure { location, .. } => {
                format!("Failed to load {location}. Make sure it's available.")
            }
            PipelineError::PhotoDecodeFailure(_) | PipelineError::CropDecodeFailure(_) => {
                "Could not load your image. Please try a different file.".to_string()
            }
            PipelineError::Crop(_) | PipelineError::Compose(_) => {
                "Something went wrong while creating your poster. Please try again.".to_string()
            }
        }
    }
}

impl From<CropError> for PipelineError {
    fn from(e: CropError) -> Self {
        match e {
            CropError::Decode(source) => PipelineError::CropDecodeFailure(source.to_string()),
            other => PipelineError::Crop(other),
        }
    }
}

/// Outcome of [`PosterSession::select_photo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSelection {
    /// A crop session was opened right away.
    pub crop_opened: bool,
}

/// A finished poster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterResult {
    pub width: u32,
    pub height: u32,
    pub full_name: String,
    #[serde(flatten)]
    pub exported: ExportedPoster,
}

impl PosterResult {
    pub fn preview_url(&self) -> &str {
        &self.exported.preview_url
    }

    pub fn download(&self) -> &Download {
        &self.exported.download
    }

    pub fn png(&self) -> &[u8] {
        self.exported.bytes()
    }
}

#[derive(Debug, Clone)]
struct SelectedPhoto {
    name: String,
    bytes: Vec<u8>,
}

/// Inputs of one generation, detached from the session.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    full_name: String,
    photo: Vec<u8>,
    background_path: String,
    template_path: String,
    download_name: String,
    compositor: Compositor,
    epoch: u64,
    uses_crop: bool,
}

impl GenerationRequest {
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Whether the photo is a pending crop rather than the raw upload.
    pub fn uses_crop(&self) -> bool {
        self.uses_crop
    }

    /// Load all assets, compose and export.
    pub async fn run<S: AssetSource>(&self, source: &S) -> Result<PosterResult, PipelineError> {
        let requests = vec![
            AssetRequest::location(AssetRole::Background, self.background_path.as_str()),
            AssetRequest::location(AssetRole::Template, self.template_path.as_str()),
            AssetRequest::bytes(AssetRole::UserPhoto, self.photo.clone()),
        ];

        let mut assets = load_all(source, requests)
            .await
            .map_err(|e| self.classify(e))?;
        let background = assets
            .take(AssetRole::Background)
            .map_err(|e| self.classify(e))?;
        let template = assets
            .take(AssetRole::Template)
            .map_err(|e| self.classify(e))?;
        let photo = assets
            .take(AssetRole::UserPhoto)
            .map_err(|e| self.classify(e))?;

        let png = self
            .compositor
            .compose(&background, &template, &photo, &self.full_name)?;

        Ok(PosterResult {
            width: template.width,
            height: template.height,
            full_name: self.full_name.clone(),
            exported: expose(png, &self.download_name),
        })
    }

    fn location_of(&self, role: AssetRole) -> &str {
        match role {
            AssetRole::Background => &self.background_path,
            AssetRole::Template => &self.template_path,
            AssetRole::UserPhoto => "photo",
        }
    }

    fn classify(&self, e: AssetError) -> PipelineError {
        let role = e.role();
        if role == AssetRole::UserPhoto {
            let reason = match e {
                AssetError::Undecodable { source, .. } => source.to_string(),
                other => other.to_string(),
            };
            return PipelineError::PhotoDecodeFailure(reason);
        }

        let reason = match e {
            AssetError::Unavailable { reason, .. } => reason,
            AssetError::Undecodable { source, .. } => source.to_string(),
            AssetError::Missing { .. } => "not loaded".to_string(),
        };
        PipelineError::AssetLoadFailure {
            role,
            location: self.location_of(role).to_string(),
            reason,
        }
    }
}

/// The single in-memory poster session of one user.
#[derive(Debug)]
pub struct PosterSession {
    config: PosterConfig,
    compositor: Compositor,
    crop: CropController,
    photo: Option<SelectedPhoto>,
    pending_crop: Option<CroppedImage>,
    /// Bumped whenever the photo changes, so a late generation cannot consume
    /// a crop that belongs to a newer photo.
    photo_epoch: u64,
    result: Option<PosterResult>,
}

impl Default for PosterSession {
    fn default() -> Self {
        Self::new(PosterConfig::default())
    }
}

impl PosterSession {
    pub fn new(config: PosterConfig) -> Self {
        let compositor = Compositor::with_fonts(config.system_fonts, &config.font_dirs);
        Self::with_compositor(config, compositor)
    }

    pub fn with_compositor(config: PosterConfig, compositor: Compositor) -> Self {
        Self {
            crop: CropController::new(config.crop_filter),
            config,
            compositor,
            photo: None,
            pending_crop: None,
            photo_epoch: 0,
            result: None,
        }
    }

    pub fn config(&self) -> &PosterConfig {
        &self.config
    }

    /// Register a font from memory for the name text.
    pub fn add_font(&mut self, data: Vec<u8>) {
        self.compositor.add_font(data);
    }

    /// Choose a new photo.
    ///
    /// Drops any crop in progress and any pending crop of the previous photo.
    /// With `auto_open_crop` set, a crop session is opened right away; if the
    /// file cannot be decoded the photo stays selected and the error is
    /// returned.
    pub fn select_photo(
        &mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<PhotoSelection, PipelineError> {
        let name = name.into();
        info!(file = %name, bytes = bytes.len(), "photo selected");

        self.crop.cancel();
        self.pending_crop = None;
        self.photo_epoch += 1;
        self.photo = Some(SelectedPhoto { name, bytes });

        if self.config.auto_open_crop {
            self.open_crop()?;
        }
        Ok(PhotoSelection {
            crop_opened: self.crop.is_active(),
        })
    }

    /// Open a crop session over the selected photo.
    pub fn open_crop(&mut self) -> Result<CropState, PipelineError> {
        let photo = self
            .photo
            .as_ref()
            .ok_or_else(|| PipelineError::MissingInput(vec![MissingField::Photo]))?;
        let session = self.crop.open(&photo.bytes)?;
        Ok(session.state())
    }

    pub fn crop(&self) -> &CropController {
        &self.crop
    }

    /// Crop controller, for zoom, rotate, pan and reset.
    pub fn crop_mut(&mut self) -> &mut CropController {
        &mut self.crop
    }

    /// Render the crop and keep it for the next generation.
    pub fn apply_crop(&mut self) -> Result<(u32, u32), PipelineError> {
        let cropped = self.crop.apply()?;
        let size = (cropped.width, cropped.height);
        self.pending_crop = Some(cropped);
        Ok(size)
    }

    /// Close the crop dialog without a result.
    ///
    /// The selected photo is discarded too; a new file must be chosen.
    pub fn cancel_crop(&mut self) {
        self.crop.cancel();
        self.pending_crop = None;
        if self.photo.take().is_some() {
            self.photo_epoch += 1;
            info!("photo selection cleared");
        }
    }

    /// Label for the file input.
    pub fn file_label(&self) -> String {
        match (&self.photo, &self.pending_crop) {
            (None, _) => String::new(),
            (Some(photo), Some(_)) => format!("{} (Cropped)", photo.name),
            (Some(photo), None) => photo.name.clone(),
        }
    }

    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }

    pub fn pending_crop(&self) -> Option<&CroppedImage> {
        self.pending_crop.as_ref()
    }

    /// The most recent successful poster.
    pub fn result(&self) -> Option<&PosterResult> {
        self.result.as_ref()
    }

    /// Validate inputs and snapshot them for a generation.
    ///
    /// Does not change the session. Blank names count as missing.
    pub fn prepare_generation(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<GenerationRequest, PipelineError> {
        let mut missing = Vec::new();
        if first_name.trim().is_empty() {
            missing.push(MissingField::FirstName);
        }
        if last_name.trim().is_empty() {
            missing.push(MissingField::LastName);
        }
        if self.photo.is_none() {
            missing.push(MissingField::Photo);
        }
        let photo = match &self.photo {
            Some(photo) if missing.is_empty() => photo,
            _ => return Err(PipelineError::MissingInput(missing)),
        };

        let (bytes, uses_crop) = match &self.pending_crop {
            Some(cropped) => (cropped.png.clone(), true),
            None => (photo.bytes.clone(), false),
        };

        Ok(GenerationRequest {
            full_name: display_name(first_name, last_name),
            photo: bytes,
            background_path: self.config.background_path.clone(),
            template_path: self.config.template_path.clone(),
            download_name: self.config.download_name.clone(),
            compositor: self.compositor.clone(),
            epoch: self.photo_epoch,
            uses_crop,
        })
    }

    /// Record the outcome of `request`.
    ///
    /// On success the result replaces the previous one and, if the photo has
    /// not changed since the request was prepared, the crop session and the
    /// pending crop are cleared. Failures leave the session untouched so the
    /// user can retry.
    pub fn finish_generation(
        &mut self,
        request: &GenerationRequest,
        outcome: Result<PosterResult, PipelineError>,
    ) -> Result<&PosterResult, PipelineError> {
        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "poster generation failed");
                return Err(e);
            }
        };

        if request.epoch == self.photo_epoch {
            self.crop.cancel();
            self.pending_crop = None;
        }

        info!(
            width = result.width,
            height = result.height,
            bytes = result.png().len(),
            "poster generated"
        );
        Ok(self.result.insert(result))
    }

    /// Validate, load, compose and export in one go.
    pub async fn generate<S: AssetSource>(
        &mut self,
        first_name: &str,
        last_name: &str,
        source: &S,
    ) -> Result<&PosterResult, PipelineError> {
        let request = self.prepare_generation(first_name, last_name)?;
        let outcome = request.run(source).await;
        self.finish_generation(&request, outcome)
    }
}

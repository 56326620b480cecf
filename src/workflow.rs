//! Try-on workflow state machine.
//!
//! Owns the two upload slots and the generation lifecycle, and publishes every
//! transition through a [`watch`] channel for the presentation layer.

use crate::ai::TryOnService;
use crate::encoder::{data_url, encode_file, EncodedImage};
use std::fmt;
use std::path::Path;
use tokio::sync::watch;
use tracing::{error, info, warn};

pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to process file. Please try another image.";
pub const MISSING_UPLOADS_MESSAGE: &str = "Please upload both images before trying on.";

/// Media type declared on the published result.
pub const RESULT_MEDIA_TYPE: &str = "image/png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Person,
    Clothing,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Person => "person",
            Role::Clothing => "clothing",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user-provided image in encoded form. The raw bytes are not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSlot {
    pub file_name: String,
    pub image: EncodedImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    /// Both uploads present and nothing attempted yet.
    Ready,
    Generating,
    Succeeded { result: String },
    Failed { message: String },
}

/// Observable view of a workflow session.
///
/// Read-only outside this module; all changes go through
/// [`WorkflowController`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    person: Option<UploadSlot>,
    clothing: Option<UploadSlot>,
    // Never `Ready`; that is derived in `state()`.
    phase: WorkflowState,
    error: Option<String>,
    loading: bool,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            person: None,
            clothing: None,
            phase: WorkflowState::Idle,
            error: None,
            loading: false,
        }
    }
}

impl Snapshot {
    pub fn slot(&self, role: Role) -> Option<&UploadSlot> {
        match role {
            Role::Person => self.person.as_ref(),
            Role::Clothing => self.clothing.as_ref(),
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<UploadSlot> {
        match role {
            Role::Person => &mut self.person,
            Role::Clothing => &mut self.clothing,
        }
    }

    pub fn has_both_uploads(&self) -> bool {
        self.person.is_some() && self.clothing.is_some()
    }

    pub fn state(&self) -> WorkflowState {
        match &self.phase {
            WorkflowState::Idle if self.has_both_uploads() => WorkflowState::Ready,
            phase => phase.clone(),
        }
    }

    /// Displayable data reference of the last successful attempt.
    pub fn result(&self) -> Option<&str> {
        match &self.phase {
            WorkflowState::Succeeded { result } => Some(result),
            _ => None,
        }
    }

    /// The single user-visible message channel for upload, validation and
    /// generation failures.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

enum Admission {
    Started(EncodedImage, EncodedImage),
    MissingUploads,
    InFlight,
}

/// Marks a generation attempt as in flight until it is settled.
///
/// Dropped unsettled (the request future was dropped, or the service
/// panicked) it clears the loading flag and returns the lifecycle to idle.
struct InFlight<'a> {
    state: &'a watch::Sender<Snapshot>,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a watch::Sender<Snapshot>) -> Self {
        Self {
            state,
            settled: false,
        }
    }

    fn settle(mut self, phase: WorkflowState, error: Option<String>) {
        self.settled = true;
        self.state.send_modify(|s| {
            s.phase = phase;
            s.error = error;
            s.loading = false;
        });
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Try-on generation abandoned before completion");
            self.state.send_modify(|s| {
                s.phase = WorkflowState::Idle;
                s.loading = false;
            });
        }
    }
}

/// Coordinates uploads and generation attempts for one session.
pub struct WorkflowController {
    generator: Box<dyn TryOnService>,
    state: watch::Sender<Snapshot>,
}

impl WorkflowController {
    pub fn new(generator: Box<dyn TryOnService>) -> Self {
        let (state, _) = watch::channel(Snapshot::default());
        Self { generator, state }
    }

    /// Receiver that sees every published transition.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    pub fn state(&self) -> WorkflowState {
        self.state.borrow().state()
    }

    pub fn result(&self) -> Option<String> {
        self.state.borrow().result().map(str::to_string)
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error().map(str::to_string)
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn slot(&self, role: Role) -> Option<UploadSlot> {
        self.state.borrow().slot(role).cloned()
    }

    /// Select (`Some`) or remove (`None`) the image for `role`.
    ///
    /// A failed read leaves the previous slot in place and reports through
    /// the error message; the generation lifecycle is not touched.
    pub async fn set_upload(&self, role: Role, file: Option<&Path>) {
        let Some(path) = file else {
            self.state.send_modify(|s| *s.slot_mut(role) = None);
            info!("Cleared {} upload", role);
            return;
        };

        match encode_file(path).await {
            Ok(image) => {
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                info!(
                    "Stored {} upload {} ({})",
                    role, file_name, image.media_type
                );
                let slot = UploadSlot { file_name, image };
                self.state.send_modify(|s| {
                    *s.slot_mut(role) = Some(slot);
                    s.error = None;
                });
            }
            Err(e) => {
                warn!("Failed to process {} upload: {}", role, e);
                self.state
                    .send_modify(|s| s.error = Some(UPLOAD_FAILED_MESSAGE.to_string()));
            }
        }
    }

    pub async fn clear_upload(&self, role: Role) {
        self.set_upload(role, None).await;
    }

    /// Run one try-on attempt with the current uploads and return the
    /// resulting state.
    ///
    /// Missing uploads return the lifecycle to idle, dropping any earlier
    /// result, and set the validation message. A call made while an attempt
    /// is in flight is ignored.
    pub async fn request_generation(&self) -> WorkflowState {
        let mut admission = Admission::InFlight;
        self.state.send_if_modified(|s| {
            if s.loading {
                return false;
            }
            match (&s.person, &s.clothing) {
                (Some(person), Some(clothing)) => {
                    admission = Admission::Started(person.image.clone(), clothing.image.clone());
                    s.phase = WorkflowState::Generating;
                    s.error = None;
                    s.loading = true;
                }
                _ => {
                    admission = Admission::MissingUploads;
                    s.phase = WorkflowState::Idle;
                    s.error = Some(MISSING_UPLOADS_MESSAGE.to_string());
                }
            }
            true
        });

        let (person, clothing) = match admission {
            Admission::Started(person, clothing) => (person, clothing),
            Admission::MissingUploads => {
                warn!("Try-on requested without both uploads");
                return self.state();
            }
            Admission::InFlight => {
                warn!("Try-on already in progress, ignoring request");
                return self.state();
            }
        };

        let in_flight = InFlight::new(&self.state);
        info!("Generating try-on image");

        match self.generator.generate(&person, &clothing).await {
            Ok(payload) => {
                info!("Try-on image generated ({} base64 chars)", payload.len());
                let result = data_url(RESULT_MEDIA_TYPE, &payload);
                in_flight.settle(WorkflowState::Succeeded { result }, None);
            }
            Err(e) => {
                error!("Try-on generation failed: {}", e.detail());
                let message = format!("An error occurred: {}. Please try again.", e);
                in_flight.settle(
                    WorkflowState::Failed {
                        message: message.clone(),
                    },
                    Some(message),
                );
            }
        }

        self.state()
    }
}

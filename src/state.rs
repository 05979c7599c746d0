use std::fmt::Display;
use std::sync::Arc;

use log::{debug, warn};

use crate::color::ColorEntry;
use crate::decode::DecodeError;
use crate::sampler::Palette;

/// What the user picked: file name and the MIME hint the picker reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub name: String,
    pub mime: String,
}

impl ImageSource {
    pub fn new(name: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
        }
    }
}

/// The decoded file as shown beside the palette: its original bytes plus
/// the dimensions the decoder found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview {
    pub bytes: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
}

impl ImagePreview {
    pub fn new(bytes: impl Into<Arc<[u8]>>, width: u32, height: u32) -> Self {
        Self {
            bytes: bytes.into(),
            width,
            height,
        }
    }
}

/// Inputs into the widget state machine.
#[derive(Debug, Clone)]
pub enum Event {
    /// A file is being dragged over the drop zone.
    DragEntered,
    /// The drag left the drop zone without dropping.
    DragLeft,
    /// A file was dropped or picked and its bytes are being decoded.
    ImageSelected(ImageSource),
    /// Decoding and sampling finished.
    ExtractionCompleted { preview: ImagePreview, palette: Palette },
    /// The file could not be decoded.
    ExtractionFailed(Arc<DecodeError>),
    Reset,
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Event::*;
        match self {
            DragEntered => write!(f, "DragEntered"),
            DragLeft => write!(f, "DragLeft"),
            ImageSelected(src) => write!(f, "ImageSelected({})", src.name),
            ExtractionCompleted { preview, palette } => write!(
                f,
                "ExtractionCompleted({}x{}, {} colors)",
                preview.width,
                preview.height,
                palette.len()
            ),
            ExtractionFailed(e) => write!(f, "ExtractionFailed({e})"),
            Reset => write!(f, "Reset"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum Phase {
    /// Nothing selected yet, or the widget was reset.
    #[default]
    Empty,

    /// Waiting on the decode of `source`. New selections are ignored until it settles.
    Loading { source: ImageSource },

    Ready {
        source: ImageSource,
        preview: ImagePreview,
        palette: Palette,
    },

    /// Decode failed; the user has to pick another file.
    Failed { source: ImageSource, error: Arc<DecodeError> },
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Phase::*;
        match self {
            Empty => write!(f, "Empty"),
            Loading { source } => write!(f, "Loading({})", source.name),
            Ready { source, palette, .. } => {
                write!(f, "Ready({}, {} colors)", source.name, palette.len())
            }
            Failed { source, error } => write!(f, "Failed({}, {error})", source.name),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WidgetState {
    phase: Phase,
    dragging: bool,
}

impl WidgetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an [Event] and returns the resulting state. Events that don't
    /// apply to the current phase leave it unchanged.
    pub fn next(self, event: Event) -> WidgetState {
        use Event::*;
        use Phase::*;

        debug!("widget: {} --- {}", self.phase, event);

        let WidgetState { phase, dragging } = self;
        match (event, phase) {
            (DragEntered, phase) => WidgetState { phase, dragging: true },
            (DragLeft, phase) => WidgetState { phase, dragging: false },

            (ImageSelected(source), phase @ Loading { .. }) => {
                warn!("ignoring {} while {} is still loading", source.name, phase);
                WidgetState { phase, dragging: false }
            }
            (ImageSelected(source), _) => WidgetState {
                phase: Loading { source },
                dragging: false,
            },

            (ExtractionCompleted { preview, palette }, Loading { source }) => WidgetState {
                phase: Ready {
                    source,
                    preview,
                    palette,
                },
                dragging,
            },
            (ExtractionFailed(error), Loading { source }) => WidgetState {
                phase: Failed { source, error },
                dragging,
            },
            (event @ (ExtractionCompleted { .. } | ExtractionFailed(_)), phase) => {
                warn!("unexpected {} in phase {}", event, phase);
                WidgetState { phase, dragging }
            }

            (Reset, _) => WidgetState::default(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    /// Colors to render; empty unless an extraction has completed.
    pub fn colors(&self) -> &[ColorEntry] {
        match &self.phase {
            Phase::Ready { palette, .. } => palette.colors(),
            _ => &[],
        }
    }

    pub fn palette(&self) -> Option<&Palette> {
        match &self.phase {
            Phase::Ready { palette, .. } => Some(palette),
            _ => None,
        }
    }

    /// The current image, once it has been decoded.
    pub fn preview(&self) -> Option<&ImagePreview> {
        match &self.phase {
            Phase::Ready { preview, .. } => Some(preview),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<&ImageSource> {
        match &self.phase {
            Phase::Empty => None,
            Phase::Loading { source }
            | Phase::Ready { source, .. }
            | Phase::Failed { source, .. } => Some(source),
        }
    }

    pub fn error(&self) -> Option<&DecodeError> {
        match &self.phase {
            Phase::Failed { error, .. } => Some(&**error),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self.phase {
            Phase::Empty => "empty",
            Phase::Loading { .. } => "loading",
            Phase::Ready { .. } => "ready",
            Phase::Failed { .. } => "failed",
        }
    }
}

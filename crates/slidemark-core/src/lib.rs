//! Slidemark Core Library
//!
//! Annotation anchoring, slide composition and tutorial persistence for
//! step-by-step visual tutorials. Platform-agnostic: no windowing, no GPU.

pub mod annotations;
pub mod compositor;
pub mod config;
pub mod error;
pub mod mapper;
pub mod session;
pub mod slide;
pub mod storage;
pub mod tutorial;
pub mod widget;

pub use annotations::{Annotation, AnnotationId, AnnotationKind, PenStyle, RenderPlan};
pub use compositor::{Composite, WindowCapture, composite};
pub use config::AnnotatorConfig;
pub use error::{ConfigurationError, LoadWarning, ResourceError, SchemaError};
pub use mapper::ViewMapping;
pub use session::{EditorSession, HelperHandles, KeyInput, Tool};
pub use slide::{Slide, SlideId, SlideLayout, SlidePainter};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, TutorialStore};
pub use tutorial::{Tutorial, TutorialMetadata};
pub use widget::{WidgetDescriptor, WidgetSidecar};

//! Widget descriptors supplied by the screenshot source.
//!
//! The core only reads these: annotations keep a snapshot of the descriptor
//! they point at, and slides keep the list visible on their image.

mod descriptor;
mod sidecar;

pub use descriptor::WidgetDescriptor;
pub use sidecar::{DEVICE_PIXEL_RATIO_KEY, WidgetSidecar};

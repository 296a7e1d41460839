//! Building a fresh tutorial from a raw capture session.

use super::AssetSource;
use super::convert::{LoadOutcome, to_logical_image};
use super::schema::CaptureManifest;
use crate::compositor::{WindowCapture, composite};
use crate::error::{LoadWarning, ResourceError};
use crate::slide::Slide;
use crate::tutorial::{Tutorial, TutorialMetadata};

/// One screenshot slide per captured step, windows of a step composited.
///
/// A step whose files cannot be read is skipped with a warning.
pub fn import_capture<A: AssetSource + ?Sized>(
    manifest: CaptureManifest,
    assets: &A,
) -> LoadOutcome {
    let mut tutorial = Tutorial::new(TutorialMetadata {
        title: manifest.title,
        author: manifest.author,
        date: manifest.date,
        description: manifest.desc,
        ..TutorialMetadata::default()
    });
    let mut warnings = Vec::new();

    for (step_index, step) in manifest.steps.iter().enumerate() {
        let built = step
            .iter()
            .map(|window| -> Result<WindowCapture, ResourceError> {
                let (image, sidecar) = assets.raw_window(&window.window, &window.metadata)?;
                Ok(WindowCapture::new(
                    to_logical_image(image, sidecar.device_pixel_ratio),
                    sidecar.widgets,
                ))
            })
            .collect::<Result<Vec<_>, _>>()
            .and_then(|windows| composite(&windows));

        match built {
            Ok(composite) => {
                log::debug!(
                    "Step {step_index}: {} windows, {} widgets",
                    step.len(),
                    composite.widgets.len()
                );
                let sources = (0..step.len())
                    .map(|window| format!("{step_index}/{window}"))
                    .collect();
                tutorial.push_slide(
                    Slide::new(composite.image, composite.widgets).with_sources(sources),
                );
            }
            Err(err) => {
                log::warn!("Skipping capture step {step_index}: {err}");
                warnings.push(LoadWarning::SlideSkipped {
                    slide: step_index,
                    reason: err.to_string(),
                });
            }
        }
    }

    log::info!("Imported {} slides from capture", tutorial.len());
    LoadOutcome { tutorial, warnings }
}

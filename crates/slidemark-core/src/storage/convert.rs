//! Pure conversion between [`Tutorial`] and its documents.

use super::AssetSource;
use super::schema::{
    AnnotationRecord, LegacyDocument, PenRecord, SlideRecord, TutorialDocument, split_slide_code,
};
use super::text_dict::TextDictionary;
use crate::annotations::{Annotation, AnnotationKind, PenStyle, SerializableColor};
use crate::compositor::{Composite, WindowCapture, composite};
use crate::error::{LoadWarning, ResourceError, SchemaError};
use crate::slide::{Slide, SlideLayout};
use crate::tutorial::{FORMAT_VERSION, Tutorial, TutorialMetadata};
use crate::widget::WidgetDescriptor;
use image::RgbaImage;
use image::imageops::{self, FilterType};
use kurbo::{Point, Vec2};

/// A loaded tutorial plus everything that was recovered along the way.
#[derive(Debug)]
pub struct LoadOutcome {
    pub tutorial: Tutorial,
    pub warnings: Vec<LoadWarning>,
}

/// Key prefix of slide `index`: `"<index>_<alnum title>"`, or `"<index>_slide"`.
pub fn slide_prefix(index: usize, title: &str) -> String {
    let clean: String = title.chars().filter(char::is_ascii_alphanumeric).collect();
    if clean.is_empty() {
        format!("{index}_slide")
    } else {
        format!("{index}_{clean}")
    }
}

/// Build the document and its text dictionary.
///
/// Inactive slides are left out unless they are cover or acknowledgment
/// pages. Uncommitted annotations are left out. Slide and annotation indices
/// in the keys count position in the tutorial, so keys are stable across
/// saves of the same tutorial.
pub fn to_document(tutorial: &Tutorial) -> Result<(TutorialDocument, TextDictionary), SchemaError> {
    let mut text = TextDictionary::new();
    let mut slides = Vec::new();

    for (index, slide) in tutorial.slides().iter().enumerate() {
        if !slide.is_emitted() {
            continue;
        }
        let prefix = slide_prefix(index, &slide.title);
        let title_key = format!("{prefix}_title");
        let body_key = format!("{prefix}_body");
        text.insert(title_key.clone(), slide.title.clone());
        text.insert(body_key.clone(), slide.body.clone());

        let mut annotations = Vec::new();
        for (annotation_index, annotation) in slide
            .annotations()
            .iter()
            .filter(|a| a.persisted)
            .enumerate()
        {
            let kind = annotation.kind();
            if kind.is_transient() {
                return Err(SchemaError::TransientKind(kind.name()));
            }
            let key = format!("{index}_{}_{annotation_index}", kind.name());
            text.insert(key.clone(), annotation.text.clone());

            let offset = annotation.offset();
            let optional = annotation.optional();
            annotations.push(AnnotationRecord {
                widget_path: annotation.target().path.clone(),
                kind: kind.name().to_string(),
                offset: [offset.x, offset.y],
                optional: [optional.x, optional.y],
                custom: String::new(),
                pen: PenRecord {
                    color: annotation.style.color.to_hex(),
                    thickness: annotation.style.thickness,
                    font_size: annotation.style.font_size,
                },
                text: key,
            });
        }

        slides.push(SlideRecord {
            image_path: format!("{prefix}.png"),
            slide_code: slide.screenshot_sources.clone(),
            layout: slide.layout.name().to_string(),
            title_key,
            body_key,
            annotations,
        });
    }

    let metadata = &tutorial.metadata;
    let document = TutorialDocument {
        title: metadata.title.clone(),
        author: metadata.author.clone(),
        date: metadata.date.clone(),
        desc: metadata.description.clone(),
        version: FORMAT_VERSION.to_string(),
        slides,
    };
    Ok((document, text))
}

/// Load a current-format document.
///
/// A screenshot slide whose captures are gone falls back to its step
/// sidecars and the image written under its `ImagePath`. Slides that cannot
/// be built either way are skipped with a warning. Unknown kinds, layouts,
/// colors and slide codes fail the whole load.
pub fn from_document<A: AssetSource + ?Sized>(
    document: TutorialDocument,
    text: &TextDictionary,
    assets: &A,
) -> Result<LoadOutcome, SchemaError> {
    let mut tutorial = Tutorial::new(TutorialMetadata {
        title: document.title,
        author: document.author,
        date: document.date,
        description: document.desc,
        format_version: document.version,
    });
    let mut warnings = Vec::new();

    for (index, record) in document.slides.into_iter().enumerate() {
        let layout = SlideLayout::from_name(&record.layout)?;
        let built = match layout {
            SlideLayout::Screenshot => {
                let codes = record
                    .slide_code
                    .iter()
                    .map(|code| split_slide_code(code))
                    .collect::<Result<Vec<_>, _>>()?;
                capture_or_rendered(&codes, &record.image_path, assets).map(capture_slide)
            }
            other => assets
                .layout_background(other)
                .map(|background| Slide::page(other, background)),
        };
        let Some(mut slide) = accept(built, index, &mut warnings) else {
            continue;
        };

        let annotations =
            build_annotations(&record.annotations, &slide.widgets, text, index, &mut warnings)?;
        for annotation in annotations {
            slide.add_annotation(annotation);
        }
        slide.title = text.text(&record.title_key);
        slide.body = text.text(&record.body_key);
        slide.screenshot_sources = record.slide_code;
        tutorial.push_slide(slide);
    }

    log::info!("Loaded {} slides", tutorial.len());
    Ok(LoadOutcome { tutorial, warnings })
}

/// Load a document written before the version marker existed.
///
/// Legacy slide codes count non-screenshot slides as steps; every such slide
/// seen so far is subtracted from later step numbers. When a step's window
/// capture is missing, widgets come from every sidecar in the step directory
/// and the image from the slide rendered by the previous save.
pub fn from_legacy<A: AssetSource + ?Sized>(
    document: LegacyDocument,
    text: &TextDictionary,
    assets: &A,
) -> Result<LoadOutcome, SchemaError> {
    let mut tutorial = Tutorial::new(TutorialMetadata {
        title: document.title,
        author: document.author,
        date: document.date,
        description: document.desc,
        format_version: String::new(),
    });
    let mut warnings = Vec::new();
    let mut step_shift: i64 = 0;

    for (index, record) in document.slides.into_iter().enumerate() {
        let layout = SlideLayout::from_name(&record.layout)?;
        let (step, file) = split_slide_code(&record.slide_code)?;
        let step: i64 = step
            .parse()
            .map_err(|_| SchemaError::BadSlideCode(record.slide_code.clone()))?;

        let built = if layout == SlideLayout::Screenshot {
            let step = (step - step_shift).to_string();
            let source = format!("{step}/{file}");
            capture_or_rendered(&[(step.as_str(), file)], &record.image_path, assets)
                .map(|capture| capture_slide(capture).with_sources(vec![source]))
        } else {
            step_shift += 1;
            assets
                .rendered_slide(&record.image_path)
                .or_else(|_| assets.layout_background(layout))
                .map(|background| {
                    Slide::page(layout, background).with_sources(vec![record.slide_code.clone()])
                })
        };
        let Some(mut slide) = accept(built, index, &mut warnings) else {
            continue;
        };

        let annotations =
            build_annotations(&record.annotations, &slide.widgets, text, index, &mut warnings)?;
        for annotation in annotations {
            slide.add_annotation(annotation);
        }
        slide.title = text.text(&record.title_key);
        slide.body = text.text(&record.body_key);
        tutorial.push_slide(slide);
    }

    log::info!("Loaded {} slides from legacy document", tutorial.len());
    Ok(LoadOutcome { tutorial, warnings })
}

/// Downscale a capture taken at `device_pixel_ratio` to logical pixels.
pub fn to_logical_image(image: RgbaImage, device_pixel_ratio: f64) -> RgbaImage {
    if device_pixel_ratio <= 1.0 {
        return image;
    }
    let width = ((image.width() as f64 / device_pixel_ratio) as u32).max(1);
    let height = ((image.height() as f64 / device_pixel_ratio) as u32).max(1);
    imageops::resize(&image, width, height, FilterType::Triangle)
}

pub(super) fn load_window<A: AssetSource + ?Sized>(
    assets: &A,
    step: &str,
    window: &str,
) -> Result<WindowCapture, ResourceError> {
    let (image, sidecar) = assets.window_capture(step, window)?;
    Ok(WindowCapture::new(
        to_logical_image(image, sidecar.device_pixel_ratio),
        sidecar.widgets,
    ))
}

fn capture_composite<A: AssetSource + ?Sized>(
    codes: &[(&str, &str)],
    assets: &A,
) -> Result<Composite, ResourceError> {
    let windows = codes
        .iter()
        .map(|(step, window)| load_window(assets, step, window))
        .collect::<Result<Vec<_>, _>>()?;
    composite(&windows)
}

/// Composite of the listed windows, or, when a capture is gone, the
/// widgets of every sidecar in those steps over the image rendered by an
/// earlier save. The flag is set when the fallback was taken.
fn capture_or_rendered<A: AssetSource + ?Sized>(
    codes: &[(&str, &str)],
    image_path: &str,
    assets: &A,
) -> Result<(Composite, bool), ResourceError> {
    let err = match capture_composite(codes, assets) {
        Ok(composite) => return Ok((composite, false)),
        Err(err) => err,
    };
    // Rendered slides are already in logical pixels.
    let Ok(image) = assets.rendered_slide(image_path) else {
        return Err(err);
    };
    log::debug!("Captures for {image_path} unavailable ({err}), using step sidecars");

    let mut steps: Vec<&str> = codes.iter().map(|(step, _)| *step).collect();
    steps.dedup();
    let mut widgets = Vec::new();
    for step in steps {
        widgets.extend(
            assets
                .step_sidecars(step)?
                .into_iter()
                .flat_map(|sidecar| sidecar.widgets),
        );
    }
    Ok((Composite { image, widgets }, true))
}

fn capture_slide((composite, rendered): (Composite, bool)) -> Slide {
    let mut slide = Slide::new(composite.image, composite.widgets);
    slide.rendered_background = rendered;
    slide
}

fn accept(
    built: Result<Slide, ResourceError>,
    index: usize,
    warnings: &mut Vec<LoadWarning>,
) -> Option<Slide> {
    match built {
        Ok(slide) => Some(slide),
        Err(err) => {
            log::warn!("Skipping slide {index}: {err}");
            warnings.push(LoadWarning::SlideSkipped {
                slide: index,
                reason: err.to_string(),
            });
            None
        }
    }
}

fn build_annotations(
    records: &[AnnotationRecord],
    widgets: &[WidgetDescriptor],
    text: &TextDictionary,
    slide_index: usize,
    warnings: &mut Vec<LoadWarning>,
) -> Result<Vec<Annotation>, SchemaError> {
    let mut annotations = Vec::with_capacity(records.len());
    for record in records {
        let kind = AnnotationKind::from_name(&record.kind)?;
        let target = match widgets.iter().rev().find(|w| w.path == record.widget_path) {
            Some(widget) => widget.clone(),
            None => {
                log::warn!(
                    "Slide {slide_index}: widget {} not found, using placeholder target",
                    record.widget_path
                );
                warnings.push(LoadWarning::MissingWidget {
                    slide: slide_index,
                    path: record.widget_path.clone(),
                });
                WidgetDescriptor::degenerate(record.widget_path.clone())
            }
        };
        let style = PenStyle {
            color: SerializableColor::from_hex(&record.pen.color)?,
            thickness: record.pen.thickness,
            font_size: record.pen.font_size,
        };
        let annotation = Annotation::builder()
            .kind(kind)
            .target(target)
            .offset(Vec2::new(record.offset[0], record.offset[1]))
            .optional(Point::new(record.optional[0], record.optional[1]))
            .text(text.text(&record.text))
            .style(style)
            .persisted(true)
            .build()
            .map_err(|e| SchemaError::Other(e.to_string()))?;
        annotations.push(annotation);
    }
    Ok(annotations)
}

//! Loading, saving and document lifecycle.

use super::convert::{LoadOutcome, from_document, from_legacy, to_document};
use super::schema::{CaptureManifest, DocumentFormat, parse_document};
use super::{Storage, StorageError, StorageResult, capture};
use crate::error::LoadWarning;
use crate::slide::{Slide, SlideId, SlideLayout, SlidePainter};
use crate::tutorial::{Tutorial, TutorialMetadata};

/// Lifecycle of the tutorial document held by a [`TutorialStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Unloaded,
    Loaded,
    Editing,
    Saved,
}

/// What a save wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub slides: usize,
    pub text_entries: usize,
    pub images: usize,
}

/// Read the document and its text dictionary, picking the loader by format.
pub fn load_tutorial<S: Storage + ?Sized>(
    storage: &S,
    locale: Option<&str>,
) -> StorageResult<LoadOutcome> {
    let json = storage.read_document()?;
    let text = storage.read_text(locale)?;
    let outcome = match parse_document(&json)? {
        DocumentFormat::Current(document) => from_document(document, &text, storage)?,
        DocumentFormat::Legacy(document) => {
            log::info!("Document has no version marker, using legacy loader");
            from_legacy(document, &text, storage)?
        }
    };
    for warning in &outcome.warnings {
        log::warn!("{warning}");
    }
    Ok(outcome)
}

/// Write the document and the default text dictionary.
///
/// With a painter, every emitted slide is redrawn without previews or
/// selection outlines and its image written under the slide's `ImagePath`.
/// A slide whose background came from such an image gets the background
/// written back unchanged, painter or not, so the next load finds it.
pub fn save_tutorial<S: Storage + ?Sized>(
    storage: &S,
    tutorial: &Tutorial,
    mut painter: Option<&mut dyn SlidePainter>,
) -> StorageResult<SaveReport> {
    let (document, text) = to_document(tutorial)?;
    let mut report = SaveReport {
        slides: document.slides.len(),
        text_entries: text.len(),
        images: 0,
    };

    let emitted = tutorial.slides().iter().filter(|s| s.is_emitted());
    for (slide, record) in emitted.zip(&document.slides) {
        if slide.rendered_background {
            storage.write_slide_image(&record.image_path, slide.background())?;
            report.images += 1;
        } else if let Some(painter) = painter.as_deref_mut() {
            let mut export = slide.clone();
            export.discard_uncommitted();
            export.clear_selection_highlights();
            storage.write_slide_image(&record.image_path, export.redraw(painter))?;
            report.images += 1;
        }
    }

    let json = serde_json::to_string_pretty(&document)
        .map_err(|e| StorageError::Other(format!("Failed to serialize document: {}", e)))?;
    storage.write_document(&json)?;
    storage.write_text(&text)?;

    log::info!(
        "Saved {} slides, {} text entries, {} images",
        report.slides,
        report.text_entries,
        report.images
    );
    Ok(report)
}

/// Owns one tutorial and its storage, tracking where it is in its lifecycle.
pub struct TutorialStore<S: Storage> {
    storage: S,
    locale: Option<String>,
    state: DocumentState,
    tutorial: Option<Tutorial>,
    warnings: Vec<LoadWarning>,
}

impl<S: Storage> TutorialStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            locale: None,
            state: DocumentState::Unloaded,
            tutorial: None,
            warnings: Vec::new(),
        }
    }

    pub fn with_locale(mut self, locale: Option<String>) -> Self {
        self.locale = locale;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// Warnings from the last load or import.
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Mutated since the last load or save.
    pub fn is_dirty(&self) -> bool {
        self.state == DocumentState::Editing
    }

    /// Load the saved document. A failed load leaves the store untouched.
    pub fn load(&mut self) -> StorageResult<&Tutorial> {
        let outcome = load_tutorial(&self.storage, self.locale.as_deref())?;
        Ok(self.replace(outcome))
    }

    /// Build a fresh tutorial from the raw capture manifest.
    pub fn import_capture(&mut self) -> StorageResult<&Tutorial> {
        let manifest = CaptureManifest::from_json(&self.storage.read_manifest()?)?;
        let outcome = capture::import_capture(manifest, &self.storage);
        Ok(self.replace(outcome))
    }

    /// Start an empty tutorial.
    pub fn create(&mut self, metadata: TutorialMetadata) -> &mut Tutorial {
        self.warnings.clear();
        self.state = DocumentState::Editing;
        self.tutorial.insert(Tutorial::new(metadata))
    }

    fn replace(&mut self, outcome: LoadOutcome) -> &Tutorial {
        self.warnings = outcome.warnings;
        self.state = DocumentState::Loaded;
        self.tutorial.insert(outcome.tutorial)
    }

    pub fn tutorial(&self) -> Option<&Tutorial> {
        self.tutorial.as_ref()
    }

    /// Mutable access; marks the document as edited.
    pub fn edit(&mut self) -> StorageResult<&mut Tutorial> {
        let tutorial = self
            .tutorial
            .as_mut()
            .ok_or_else(|| StorageError::InvalidState("no tutorial loaded".into()))?;
        self.state = DocumentState::Editing;
        Ok(tutorial)
    }

    /// Insert a template page (cover, acknowledgment or blank) at `index`.
    pub fn add_page(&mut self, layout: SlideLayout, index: usize) -> StorageResult<SlideId> {
        if layout == SlideLayout::Screenshot {
            return Err(StorageError::InvalidState(
                "screenshot slides come from captures".into(),
            ));
        }
        let background = self.storage.layout_background(layout)?;
        let tutorial = self.edit()?;
        let index = index.min(tutorial.len());
        Ok(tutorial.insert_slide(index, Slide::page(layout, background)))
    }

    pub fn save(&mut self, painter: Option<&mut dyn SlidePainter>) -> StorageResult<SaveReport> {
        let tutorial = self
            .tutorial
            .as_ref()
            .ok_or_else(|| StorageError::InvalidState("nothing to save".into()))?;
        let report = save_tutorial(&self.storage, tutorial, painter)?;
        self.state = DocumentState::Saved;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{
        Annotation, AnnotationKind, ApproximateMetrics, GeometryConfig, RenderPlan, TextMeasure,
    };
    use crate::storage::{AssetSource, MemoryStorage, TextDictionary};
    use image::{Rgba, RgbaImage};

    const SIDECAR: &str = r#"{
        "_devicePixelRatio": 1.0,
        "0": {"name":"main","path":"Main","text":"","position":[0,0],"size":[100,80]},
        "1": {"name":"ok","path":"Main/ok","text":"OK","position":[10,10],"size":[30,20]}
    }"#;

    struct CountingPainter {
        metrics: ApproximateMetrics,
        config: GeometryConfig,
        painted: usize,
        overlays: usize,
    }

    impl CountingPainter {
        fn new() -> Self {
            Self {
                metrics: ApproximateMetrics,
                config: GeometryConfig::default(),
                painted: 0,
                overlays: 0,
            }
        }
    }

    impl SlidePainter for CountingPainter {
        fn metrics(&self) -> &dyn TextMeasure {
            &self.metrics
        }

        fn geometry(&self) -> &GeometryConfig {
            &self.config
        }

        fn paint(&mut self, _canvas: &mut RgbaImage, plan: &RenderPlan) {
            self.painted += 1;
            if plan.target_highlight.is_some() || plan.selection_outline.is_some() {
                self.overlays += 1;
            }
        }
    }

    fn storage_with_capture() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.insert_window(0, 0, RgbaImage::from_pixel(100, 80, Rgba([255; 4])), SIDECAR);
        storage
    }

    fn tutorial(storage: &MemoryStorage) -> Tutorial {
        let (image, sidecar) = storage.raw_window("0/0.png", "0/0.json").unwrap();
        let mut slide = Slide::new(image, sidecar.widgets.clone())
            .with_title("Press OK")
            .with_sources(vec!["0/0".into()]);
        let mut annotation = Annotation::new(AnnotationKind::Arrow, sidecar.widgets[1].clone());
        annotation.persisted = true;
        annotation.text = "here".into();
        slide.add_annotation(annotation);

        let mut tutorial = Tutorial::new(TutorialMetadata {
            title: "Demo".into(),
            ..TutorialMetadata::default()
        });
        tutorial.push_slide(slide);
        tutorial.push_slide(Slide::page(SlideLayout::Cover, RgbaImage::new(10, 10)));
        tutorial
    }

    #[test]
    fn test_save_then_load() {
        let storage = storage_with_capture();
        let tutorial = tutorial(&storage);
        let mut painter = CountingPainter::new();

        let report = save_tutorial(&storage, &tutorial, Some(&mut painter)).unwrap();
        assert_eq!(report.slides, 2);
        assert_eq!(report.images, 2);
        assert_eq!(painter.painted, 1);
        assert!(storage.slide_image("0_PressOK.png").is_some());
        assert!(storage.slide_image("1_slide.png").is_some());

        let outcome = load_tutorial(&storage, None).unwrap();
        assert!(outcome.warnings.is_empty());
        let loaded = outcome.tutorial;
        assert_eq!(loaded.metadata.title, "Demo");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.slides()[0].title, "Press OK");
        let annotation = &loaded.slides()[0].annotations()[0];
        assert_eq!(annotation.target().path, "Main/ok");
        assert_eq!(annotation.text, "here");
        assert_eq!(loaded.slides()[1].layout, SlideLayout::Cover);
    }

    #[test]
    fn test_load_picks_legacy_loader() {
        let storage = storage_with_capture();
        storage.set_document(
            r#"{"title":"Old","author":"","date":"","desc":"",
                "slides":[{"ImagePath":"0.png","SlideCode":"0/0","SlideLayout":"Screenshot",
                           "SlideTitle":"t","SlideDesc":"d","Annotations":[]}]}"#,
        );
        let mut text = TextDictionary::new();
        text.insert("t", "Legacy title");
        storage.insert_text(None, text);

        let outcome = load_tutorial(&storage, Some("es")).unwrap();
        assert_eq!(outcome.tutorial.metadata.title, "Old");
        assert_eq!(outcome.tutorial.slides()[0].title, "Legacy title");
    }

    #[test]
    fn test_missing_document_is_error() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            load_tutorial(&storage, None),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_store_lifecycle() {
        let storage = storage_with_capture();
        let mut store = TutorialStore::new(storage);
        assert_eq!(store.state(), DocumentState::Unloaded);
        assert!(matches!(store.edit(), Err(StorageError::InvalidState(_))));
        assert!(matches!(store.save(None), Err(StorageError::InvalidState(_))));

        let tutorial = tutorial(store.storage());
        *store.create(TutorialMetadata::default()) = tutorial;
        assert!(store.is_dirty());
        store.save(None).unwrap();
        assert_eq!(store.state(), DocumentState::Saved);
        assert!(!store.is_dirty());

        store.load().unwrap();
        assert_eq!(store.state(), DocumentState::Loaded);
        store.edit().unwrap().slides_mut()[0].title = "Changed".into();
        assert_eq!(store.state(), DocumentState::Editing);
        assert_eq!(store.tutorial().unwrap().slides()[0].title, "Changed");
    }

    #[test]
    fn test_store_import_capture() {
        let storage = storage_with_capture();
        storage.set_manifest(
            r#"{"title":"Cap","author":"","date":"","desc":"",
                "steps":[[{"window":"0/0.png","metadata":"0/0.json"}]]}"#,
        );
        let mut store = TutorialStore::new(storage);
        let tutorial = store.import_capture().unwrap();
        assert_eq!(tutorial.len(), 1);
        assert_eq!(tutorial.slides()[0].widgets.len(), 2);
        assert_eq!(store.state(), DocumentState::Loaded);
        assert!(store.warnings().is_empty());
    }

    #[test]
    fn test_store_add_page() {
        let mut store = TutorialStore::new(storage_with_capture());
        assert!(matches!(
            store.add_page(SlideLayout::Blank, 0),
            Err(StorageError::InvalidState(_))
        ));

        let tutorial = tutorial(store.storage());
        *store.create(TutorialMetadata::default()) = tutorial;
        let id = store.add_page(SlideLayout::Acknowledgment, 99).unwrap();
        let tutorial = store.tutorial().unwrap();
        assert_eq!(tutorial.len(), 3);
        assert_eq!(tutorial.index_of(id), Some(2));
        assert_eq!(tutorial.slides()[2].layout, SlideLayout::Acknowledgment);
        assert!(matches!(
            store.add_page(SlideLayout::Screenshot, 0),
            Err(StorageError::InvalidState(_))
        ));
    }

    #[test]
    fn test_export_images_leave_out_editing_state() {
        let storage = storage_with_capture();
        let mut tutorial = tutorial(&storage);
        let slide = tutorial.slide_mut(0).unwrap();
        let target = slide.widgets[1].clone();
        let selected = slide.annotations()[0].id();
        slide.annotation_mut(selected).unwrap().selection_highlight = true;
        slide.add_annotation(Annotation::new(AnnotationKind::ClickMarker, target));

        let mut painter = CountingPainter::new();
        save_tutorial(&storage, &tutorial, Some(&mut painter)).unwrap();
        assert_eq!(painter.painted, 1);
        assert_eq!(painter.overlays, 0);

        // The editing view keeps its state.
        let slide = tutorial.slide(0).unwrap();
        assert_eq!(slide.annotations().len(), 2);
        assert!(slide.annotation(selected).unwrap().selection_highlight);
    }

    #[test]
    fn test_legacy_fallback_survives_resave() {
        let storage = MemoryStorage::new();
        storage.insert_raw("0/shot.png", RgbaImage::new(1, 1), "0/a.json", SIDECAR);
        storage.insert_slide_image("0_slide.png", RgbaImage::from_pixel(64, 48, Rgba([9; 4])));
        storage.set_document(
            r##"{"title":"Old","author":"","date":"","desc":"",
                "slides":[{"ImagePath":"0_slide.png","SlideCode":"0/missing",
                           "SlideLayout":"Screenshot","SlideTitle":"t","SlideDesc":"d",
                           "Annotations":[{"widgetPath":"Main/ok","type":"Arrow",
                                           "offset":[0,0],"optional":[90,20],"custom":"",
                                           "penSettings":{"color":"#ff0000","thickness":3,"fontSize":14},
                                           "text":"a"}]}]}"##,
        );
        let mut text = TextDictionary::new();
        text.insert("t", "Step one");
        storage.insert_text(None, text);

        let legacy = load_tutorial(&storage, None).unwrap();
        assert!(legacy.warnings.is_empty(), "{:?}", legacy.warnings);
        let legacy = legacy.tutorial;
        assert!(legacy.slides()[0].rendered_background);

        let report = save_tutorial(&storage, &legacy, None).unwrap();
        assert_eq!(report.images, 1);
        assert!(storage.slide_image("0_Stepone.png").is_some());

        let outcome = load_tutorial(&storage, None).unwrap();
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        let reloaded = outcome.tutorial;
        assert_eq!(reloaded.len(), 1);
        let (before, after) = (&legacy.slides()[0], &reloaded.slides()[0]);
        assert_eq!(after.title, "Step one");
        assert_eq!(after.widgets, before.widgets);
        assert_eq!(after.background().as_raw(), before.background().as_raw());
        assert_eq!(after.annotations()[0].target().path, "Main/ok");
        assert!(after.rendered_background);
    }
}

//! The tutorial: metadata plus an ordered list of slides.

use crate::slide::{Slide, SlideId};

/// Version written into current-format documents.
pub const FORMAT_VERSION: &str = "1.0";

/// Descriptive fields of a tutorial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorialMetadata {
    pub title: String,
    pub author: String,
    pub date: String,
    pub description: String,
    pub format_version: String,
}

impl Default for TutorialMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            date: String::new(),
            description: String::new(),
            format_version: FORMAT_VERSION.to_string(),
        }
    }
}

/// A tutorial document. Owns its slides exclusively.
#[derive(Debug, Clone, Default)]
pub struct Tutorial {
    pub metadata: TutorialMetadata,
    slides: Vec<Slide>,
}

impl Tutorial {
    pub fn new(metadata: TutorialMetadata) -> Self {
        Self {
            metadata,
            slides: Vec::new(),
        }
    }

    pub fn with_slides(metadata: TutorialMetadata, slides: Vec<Slide>) -> Self {
        Self { metadata, slides }
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slides_mut(&mut self) -> &mut [Slide] {
        &mut self.slides
    }

    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    pub fn index_of(&self, id: SlideId) -> Option<usize> {
        self.slides.iter().position(|s| s.id() == id)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn push_slide(&mut self, slide: Slide) -> SlideId {
        let id = slide.id();
        self.slides.push(slide);
        id
    }

    /// Insert at `index`, clamped to the end.
    pub fn insert_slide(&mut self, index: usize, slide: Slide) -> SlideId {
        let id = slide.id();
        let index = index.min(self.slides.len());
        self.slides.insert(index, slide);
        id
    }

    /// Insert a duplicate of slide `index` right after it.
    pub fn copy_slide(&mut self, index: usize) -> Option<SlideId> {
        let copy = self.slides.get(index)?.duplicate();
        Some(self.insert_slide(index + 1, copy))
    }

    pub fn remove_slide(&mut self, index: usize) -> Option<Slide> {
        (index < self.slides.len()).then(|| self.slides.remove(index))
    }

    pub fn swap_slides(&mut self, a: usize, b: usize) -> bool {
        if a >= self.slides.len() || b >= self.slides.len() {
            return false;
        }
        self.slides.swap(a, b);
        true
    }

    /// Move slide `from` so that it ends up at position `to`.
    pub fn move_slide(&mut self, from: usize, to: usize) -> bool {
        if from >= self.slides.len() || to >= self.slides.len() {
            return false;
        }
        let slide = self.slides.remove(from);
        self.slides.insert(to, slide);
        true
    }

    /// Drop every uncommitted annotation on every slide.
    pub fn discard_uncommitted(&mut self) -> usize {
        self.slides
            .iter_mut()
            .map(Slide::discard_uncommitted)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slide::SlideLayout;
    use image::RgbaImage;

    fn page(title: &str) -> Slide {
        Slide::page(SlideLayout::Blank, RgbaImage::new(1, 1)).with_title(title)
    }

    fn titles(t: &Tutorial) -> Vec<&str> {
        t.slides().iter().map(|s| s.title.as_str()).collect()
    }

    fn sample() -> Tutorial {
        let mut t = Tutorial::default();
        for title in ["a", "b", "c"] {
            t.push_slide(page(title));
        }
        t
    }

    #[test]
    fn test_default_version() {
        assert_eq!(Tutorial::default().metadata.format_version, "1.0");
    }

    #[test]
    fn test_insert_clamps() {
        let mut t = sample();
        t.insert_slide(99, page("z"));
        t.insert_slide(0, page("first"));
        assert_eq!(titles(&t), ["first", "a", "b", "c", "z"]);
    }

    #[test]
    fn test_copy_inserts_after() {
        let mut t = sample();
        let id = t.copy_slide(1).unwrap();
        assert_eq!(titles(&t), ["a", "b", "b", "c"]);
        assert_eq!(t.index_of(id), Some(2));
        assert_ne!(t.slides()[1].id(), id);
        assert!(t.copy_slide(10).is_none());
    }

    #[test]
    fn test_remove_swap_move() {
        let mut t = sample();
        assert!(t.swap_slides(0, 2));
        assert_eq!(titles(&t), ["c", "b", "a"]);
        assert!(t.move_slide(0, 2));
        assert_eq!(titles(&t), ["b", "a", "c"]);
        assert_eq!(t.remove_slide(1).unwrap().title, "a");
        assert!(t.remove_slide(5).is_none());
        assert!(!t.swap_slides(0, 9));
        assert!(!t.move_slide(9, 0));
        assert_eq!(t.len(), 2);
    }
}

use std::fmt;
use std::path::Path;

use super::compress::CompressedImage;
use super::normalize::TranslationResult;

/// One-line description of the uploaded image
pub struct Preview<'a> {
    pub source: &'a Path,
    pub image: &'a CompressedImage,
}

impl fmt::Display for Preview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}x{}, {} KB -> {}x{}, {} KB)",
            self.source.display(),
            self.image.original_width,
            self.image.original_height,
            self.image.original_bytes.div_ceil(1024),
            self.image.width,
            self.image.height,
            self.image.bytes.len().div_ceil(1024)
        )
    }
}

/// Lines shown for a result: the word, then romanization and gloss when
/// they add something.
pub fn render_lines(result: &TranslationResult) -> Vec<String> {
    let mut lines = vec![result.translated_word.clone()];
    if let Some(romanization) = result.visible_romanization() {
        lines.push(format!("({})", romanization));
    }
    if let Some(english) = result.visible_english() {
        lines.push(english.to_string());
    }
    lines
}

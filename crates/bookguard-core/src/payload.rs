//! Payload definitions
//!
//! A payload is the ordered page text of one book item. Its size is the
//! encoded length of all pages concatenated in order, with no separators.

use crate::{GuardError, GuardResult, TextEncoding};

/// Ordered text pages belonging to one item instance
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Payload {
    pages: Vec<String>,
}

impl Payload {
    pub fn new(pages: Vec<String>) -> Self {
        Payload { pages }
    }

    pub fn empty() -> Self {
        Payload { pages: Vec::new() }
    }

    /// Build a payload from anything that yields page text
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Payload {
            pages: pages.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn into_pages(self) -> Vec<String> {
        self.pages
    }

    /// UTF-8 size of the concatenated pages
    pub fn measure(&self) -> usize {
        measure(&self.pages)
    }

    /// Size of the concatenated pages in `encoding`
    pub fn try_measure(&self, encoding: TextEncoding) -> GuardResult<usize> {
        try_measure(&self.pages, encoding)
    }

    /// Overwrite every page with `text`, keeping the page count
    pub(crate) fn fill(&mut self, text: &str) {
        for page in &mut self.pages {
            page.clear();
            page.push_str(text);
        }
    }
}

impl From<Vec<String>> for Payload {
    fn from(pages: Vec<String>) -> Self {
        Payload::new(pages)
    }
}

/// UTF-8 byte size of `pages` concatenated in order.
///
/// Saturates at `usize::MAX`; use [`try_measure`] to observe overflow.
pub fn measure<S: AsRef<str>>(pages: &[S]) -> usize {
    try_measure(pages, TextEncoding::Utf8).unwrap_or(usize::MAX)
}

/// Byte size of `pages` concatenated in order, encoded as `encoding`.
///
/// None of the supported encodings carry state across a page boundary, so
/// walking the pages in order measures exactly the concatenated text.
pub fn try_measure<S: AsRef<str>>(pages: &[S], encoding: TextEncoding) -> GuardResult<usize> {
    pages.iter().try_fold(0usize, |total, page| {
        encoding
            .encoded_len(page.as_ref())
            .and_then(|len| total.checked_add(len))
            .ok_or(GuardError::MeasureOverflow { encoding })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_measure_empty() {
        let pages: [&str; 0] = [];
        assert_eq!(measure(&pages), 0);
        assert_eq!(Payload::empty().measure(), 0);
        assert_eq!(Payload::empty().try_measure(TextEncoding::Utf16), Ok(0));
    }

    #[test]
    fn test_measure_concatenation() {
        let payload = Payload::from_pages(["hello", " ", "world"]);
        assert_eq!(payload.measure(), "hello world".len());
        assert_eq!(payload.page_count(), 3);
    }

    #[test]
    fn test_measure_unicode_bytes() {
        let payload = Payload::from_pages(["ñ", "日本語", "🦀"]);
        assert_eq!(payload.measure(), 2 + 9 + 4);
        assert_eq!(payload.try_measure(TextEncoding::ModifiedUtf8), Ok(2 + 9 + 6));
    }

    #[test]
    fn test_fill_keeps_page_count() {
        let mut payload = Payload::from_pages(["a", "bb", ""]);
        payload.fill("x");
        assert_eq!(payload.pages(), &["x", "x", "x"]);
    }

    proptest! {
        #[test]
        fn prop_measure_is_concatenated_length(pages in prop::collection::vec(".*", 0..8)) {
            prop_assert_eq!(measure(&pages), pages.concat().len());
        }

        #[test]
        fn prop_splitting_a_page_keeps_size(
            page in ".*",
            cut in any::<prop::sample::Index>(),
            encoding in prop_oneof![
                Just(TextEncoding::Utf8),
                Just(TextEncoding::ModifiedUtf8),
                Just(TextEncoding::Utf16),
            ],
        ) {
            let boundaries: Vec<usize> = page
                .char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(page.len()))
                .collect();
            let at = boundaries[cut.index(boundaries.len())];
            let (head, tail) = page.split_at(at);

            let whole = try_measure(&[page.as_str()], encoding).unwrap();
            let split = try_measure(&[head, tail], encoding).unwrap();
            prop_assert_eq!(whole, split);
        }
    }
}

use sb_core::domain::{Card, CoreMaterial};
use sb_core::error::AppError;

pub mod wikimedia;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: String,
    /// File title without the `File:` prefix.
    pub title: String,
}

/// Looks up a freely licensed image for a search keyword.
pub trait ImageResolver: Send + Sync {
    fn find_image(&self, query: &str) -> Result<Option<ResolvedImage>, AppError>;
}

/// Resolver used when image lookup is switched off. Never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageResolver for NoImages {
    fn find_image(&self, _query: &str) -> Result<Option<ResolvedImage>, AppError> {
        Ok(None)
    }
}

/// Fill `coreImage.url` for every card carrying a search keyword.
///
/// Lookup is best effort: a miss or a lookup error leaves the url empty and never fails the
/// generation. Keywords are consumed either way. Returns the number of images found.
pub fn resolve_card_images(cards: &mut [Card], resolver: &dyn ImageResolver) -> usize {
    let total = cards.len();
    let mut found = 0usize;

    for (idx, card) in cards.iter_mut().enumerate() {
        let CoreMaterial::Image(img) = &mut card.core else {
            continue;
        };
        let Some(keyword) = img.search_keyword.take() else {
            continue;
        };

        match resolver.find_image(&keyword) {
            Ok(Some(hit)) => {
                log::info!(
                    "[{}/{}] image for {:?}: {}",
                    idx + 1,
                    total,
                    keyword,
                    hit.title
                );
                img.url = hit.url;
                found += 1;
            }
            Ok(None) => {
                log::warn!("[{}/{}] no image found for {:?}", idx + 1, total, keyword);
                img.url.clear();
            }
            Err(e) => {
                log::warn!(
                    "[{}/{}] image lookup failed for {:?}: {}",
                    idx + 1,
                    total,
                    keyword,
                    e.user_message()
                );
                img.url.clear();
            }
        }
    }
    found
}

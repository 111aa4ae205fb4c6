use crate::api::CatalogSource;
use crate::cache::TtlCache;
use crate::i18n::{Language, Translations};
use crate::models::{CatalogKind, Category};
use anyhow::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CATEGORY_TTL: Duration = Duration::from_secs(10 * 60);

/// Category chips for the listing pages. Both catalog kinds are cached per
/// language; concurrent misses are not de-duplicated.
pub struct CategoryListFetcher<S: CatalogSource> {
    source: Arc<S>,
    translations: Arc<Translations>,
    cache: Mutex<TtlCache<(CatalogKind, Language), Vec<Category>>>,
}

impl<S: CatalogSource> CategoryListFetcher<S> {
    pub fn new(source: Arc<S>, translations: Arc<Translations>) -> Self {
        Self {
            source,
            translations,
            cache: Mutex::new(TtlCache::new(CATEGORY_TTL)),
        }
    }

    /// Server categories prefixed with the synthetic, localized `all` entry.
    pub async fn fetch(&self, kind: CatalogKind, language: Language) -> Result<Vec<Category>> {
        let key = (kind, language);
        if let Some(hit) = self.cached(&key) {
            log::debug!(
                "Category cache hit for {}/{}",
                kind.category_type(),
                language.code()
            );
            return Ok(hit);
        }

        let fetched = self.source.categories(kind, language).await?;
        let mut categories = Vec::with_capacity(fetched.len() + 1);
        categories.push(Category {
            id: Category::ALL.to_string(),
            name: self.translations.get(language, "all"),
        });
        categories.extend(fetched.into_iter().filter(|c| c.id != Category::ALL));

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, categories.clone());
        }
        Ok(categories)
    }

    fn cached(&self, key: &(CatalogKind, Language)) -> Option<Vec<Category>> {
        self.cache.lock().ok().and_then(|cache| cache.get(key))
    }
}

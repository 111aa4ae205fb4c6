use crate::api::{classify_error, CatalogSource};
use crate::cache::TtlCache;
use crate::category_tree::CategoryTree;
use crate::i18n::{Language, Translations, Translator};
use crate::models::{CatalogItem, CatalogKind};
use chrono::Datelike;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const FOOTER_LINKS: usize = 5;
pub const LAYOUT_TTL: Duration = Duration::from_secs(10 * 60);

/// A data-dependent part of a page. Sections load and fail independently.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Section<T> {
    Ready { data: T },
    Failed { message: String },
}

impl<T> Section<T> {
    pub fn from_result(result: anyhow::Result<T>, translator: Translator<'_>) -> Self {
        match result {
            Ok(data) => Section::Ready { data },
            Err(e) => {
                log::error!("Section failed to load: {:?}", e);
                Section::Failed {
                    message: translator.t(classify_error(&e).message_key()),
                }
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready { data } => Some(data),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Section::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuickLink {
    pub title: String,
    pub href: String,
}

/// First `limit` items of a catalog, linking to their detail pages.
pub fn quick_links(kind: CatalogKind, items: &[CatalogItem], limit: usize) -> Vec<QuickLink> {
    items
        .iter()
        .take(limit)
        .map(|item| QuickLink {
            title: item.title.clone(),
            href: format!("{}/{}", kind.route(), item.id),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct Footer {
    pub title: String,
    pub products: Vec<QuickLink>,
    pub services: Vec<QuickLink>,
    pub copyright: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub language: Language,
    pub languages: Vec<Language>,
    pub nav: Vec<NavLink>,
    pub product_menu: Section<CategoryTree>,
    pub service_menu: Section<CategoryTree>,
    pub footer: Footer,
}

fn nav_links(translator: Translator<'_>) -> Vec<NavLink> {
    [
        ("nav_home", "/"),
        ("nav_about", "/about"),
        ("nav_products", CatalogKind::Product.route()),
        ("nav_services", CatalogKind::Service.route()),
        ("nav_contact", "/contact"),
    ]
    .into_iter()
    .map(|(key, href)| NavLink {
        label: translator.t(key),
        href: href.to_string(),
    })
    .collect()
}

/**
 * load_layout
 * Fetches both flat catalog lists concurrently and builds menus and footer links.
 */
pub async fn load_layout<S: CatalogSource>(
    source: &S,
    translations: &Translations,
    language: Language,
) -> Layout {
    let translator = translations.translator(language);
    let (products, services) = tokio::join!(
        source.catalog_list(CatalogKind::Product, language),
        source.catalog_list(CatalogKind::Service, language)
    );

    let resolve = |raw: Vec<crate::models::RawCatalogItem>| -> Vec<CatalogItem> {
        raw.into_iter()
            .map(|item| CatalogItem::from_raw(item, source.api_base()))
            .collect()
    };
    let products = products.map(resolve);
    let services = services.map(resolve);

    let footer = Footer {
        title: translator.t("quick_links"),
        products: products
            .as_ref()
            .map(|items| quick_links(CatalogKind::Product, items, FOOTER_LINKS))
            .unwrap_or_default(),
        services: services
            .as_ref()
            .map(|items| quick_links(CatalogKind::Service, items, FOOTER_LINKS))
            .unwrap_or_default(),
        copyright: format!(
            "© {} {}",
            chrono::Utc::now().year(),
            translator.t("all_rights_reserved")
        ),
    };

    Layout {
        language,
        languages: Language::all().to_vec(),
        nav: nav_links(translator),
        product_menu: Section::from_result(
            products.map(|items| CategoryTree::build(CatalogKind::Product, items)),
            translator,
        ),
        service_menu: Section::from_result(
            services.map(|items| CategoryTree::build(CatalogKind::Service, items)),
            translator,
        ),
        footer,
    }
}

/// Layouts shared by every request, one per language. A layout with a
/// failed menu is served but not kept, so the next request retries it.
pub struct LayoutCache<S: CatalogSource> {
    source: Arc<S>,
    translations: Arc<Translations>,
    cache: Mutex<TtlCache<Language, Layout>>,
}

impl<S: CatalogSource> LayoutCache<S> {
    pub fn new(source: Arc<S>, translations: Arc<Translations>) -> Self {
        Self {
            source,
            translations,
            cache: Mutex::new(TtlCache::new(LAYOUT_TTL)),
        }
    }

    pub async fn get(&self, language: Language) -> Layout {
        let hit = self.cache.lock().ok().and_then(|cache| cache.get(&language));
        if let Some(layout) = hit {
            log::debug!("Layout cache hit for {}", language.code());
            return layout;
        }

        let layout = load_layout(self.source.as_ref(), &self.translations, language).await;
        if !layout.product_menu.is_failed() && !layout.service_menu.is_failed() {
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(language, layout.clone());
            }
        }
        layout
    }
}

/// Keeps a layout current with the language store: reloads once per language change.
pub struct LayoutShell {
    state: watch::Receiver<Option<Layout>>,
    task: JoinHandle<()>,
}

impl LayoutShell {
    pub fn follow<S: CatalogSource>(
        source: Arc<S>,
        translations: Arc<Translations>,
        mut languages: watch::Receiver<Language>,
    ) -> Self {
        let (sender, state) = watch::channel(None);
        let task = tokio::spawn(async move {
            loop {
                let language = *languages.borrow_and_update();
                tokio::select! {
                    layout = load_layout(source.as_ref(), &translations, language) => {
                        sender.send_replace(Some(layout));
                    }
                    changed = languages.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                }
                if languages.changed().await.is_err() {
                    break;
                }
            }
        });
        Self { state, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Layout>> {
        self.state.clone()
    }
}

impl Drop for LayoutShell {
    fn drop(&mut self) {
        self.task.abort();
    }
}

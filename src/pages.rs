//! View models for every route of the site. Each data-dependent block is a
//! `Section`, so a failed banner fetch still leaves the product grid intact.

use crate::api::{ApiClient, ApiError, CatalogSource};
use crate::categories::CategoryListFetcher;
use crate::contact::Country;
use crate::fetcher::{load_listing, FetchKey};
use crate::i18n::Translator;
use crate::layout::Section;
use crate::models::{Banner, CatalogDetail, CatalogItem, CatalogKind, Category, Dashboard, Partner};
use crate::query_state::{Pagination, QueryState};
use reqwest::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub dashboard: Section<Dashboard>,
    pub banners: Section<Vec<Banner>>,
    pub partners: Section<Vec<Partner>>,
    pub partners_title: String,
    pub more_details: String,
}

pub async fn index_page(api: &ApiClient, translator: Translator<'_>) -> IndexPage {
    let language = translator.language();
    let (dashboard, banners, partners) = tokio::join!(
        api.dashboard(language),
        api.banners(language),
        api.partners(language)
    );
    IndexPage {
        dashboard: Section::from_result(dashboard, translator),
        banners: Section::from_result(banners, translator),
        partners: Section::from_result(partners, translator),
        partners_title: translator.t("our_partners"),
        more_details: translator.t("more_details"),
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CategoryChip {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub href: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct PaginationView {
    pub page: u32,
    pub page_count: u32,
    /// `None` renders the control disabled.
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub pages: Vec<PageLink>,
    pub previous_label: String,
    pub next_label: String,
}

impl PaginationView {
    fn new(route: &str, query: &QueryState, total_count: u64, translator: Translator<'_>) -> Self {
        let pagination = Pagination::new(query.page, total_count);
        let href = |page: u32| query.with_page(page).href(route);
        Self {
            page: pagination.page,
            page_count: pagination.page_count,
            previous_href: pagination.previous().map(href),
            next_href: pagination.next().map(href),
            pages: pagination
                .pages()
                .map(|number| PageLink {
                    number,
                    href: href(number),
                    active: number == pagination.page,
                })
                .collect(),
            previous_label: translator.t("previous"),
            next_label: translator.t("next"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorPanel {
    pub message: String,
    pub detail: Option<String>,
    pub retry_href: String,
    pub retry_label: String,
}

#[derive(Debug, Serialize)]
pub struct ListingPage {
    pub kind: CatalogKind,
    pub title: String,
    pub query: QueryState,
    /// Minimal URL reproducing this view.
    pub canonical_url: String,
    pub search_placeholder: String,
    pub categories: Section<Vec<CategoryChip>>,
    pub items: Vec<CatalogItem>,
    pub total_count: u64,
    pub pagination: PaginationView,
    pub empty: bool,
    pub empty_message: String,
    pub error: Option<ErrorPanel>,
    pub price_on_request: String,
    pub discount_label: String,
}

fn category_chips(route: &str, query: &QueryState, categories: Vec<Category>) -> Vec<CategoryChip> {
    categories
        .into_iter()
        .map(|category| CategoryChip {
            active: category.id == query.category,
            href: query.with_category(&category.id).href(route),
            id: category.id,
            name: category.name,
        })
        .collect()
}

/**
 * listing_page
 * Products or services listing for one query state; items and category chips load concurrently.
 */
pub async fn listing_page<S: CatalogSource>(
    source: &S,
    categories: &CategoryListFetcher<S>,
    translator: Translator<'_>,
    kind: CatalogKind,
    query: QueryState,
) -> ListingPage {
    let route = kind.route();
    let key = FetchKey {
        language: translator.language(),
        kind,
        query: query.clone(),
    };
    let (listing, chips) = tokio::join!(
        load_listing(source, &key),
        categories.fetch(kind, key.language)
    );

    let canonical_url = query.href(route);
    let error = listing.error.as_ref().map(|detail| ErrorPanel {
        message: translator.t(
            listing
                .failure
                .map(|f| f.message_key())
                .unwrap_or("error_title"),
        ),
        detail: Some(detail.clone()),
        retry_href: canonical_url.clone(),
        retry_label: translator.t("retry"),
    });

    ListingPage {
        kind,
        title: translator.t(kind.nav_key()),
        categories: Section::from_result(
            chips.map(|list| category_chips(route, &query, list)),
            translator,
        ),
        pagination: PaginationView::new(route, &query, listing.total_count, translator),
        empty: listing.is_empty_result(),
        empty_message: translator.t("not_found"),
        total_count: listing.total_count,
        items: listing.items,
        error,
        canonical_url,
        search_placeholder: translator.t("search_placeholder"),
        price_on_request: translator.t("price_on_request"),
        discount_label: translator.t("discount"),
        query,
    }
}

#[derive(Debug, Serialize)]
pub struct DetailPage {
    pub detail: Section<CatalogDetail>,
    #[serde(skip)]
    pub not_found: bool,
    pub back_href: String,
    pub back_label: String,
    pub price_on_request: String,
    pub discount_label: String,
}

pub async fn detail_page(
    api: &ApiClient,
    translator: Translator<'_>,
    kind: CatalogKind,
    id: i64,
) -> DetailPage {
    let result = api.catalog_detail(kind, id, translator.language()).await;
    let not_found = matches!(
        result.as_ref().err().and_then(|e| e.downcast_ref::<ApiError>()),
        Some(ApiError::Status { status, .. }) if *status == StatusCode::NOT_FOUND
    );
    let back_href = match result.as_ref() {
        Ok(detail) => QueryState::default()
            .with_category(&detail.category_id)
            .href(kind.route()),
        Err(_) => kind.route().to_string(),
    };

    DetailPage {
        detail: Section::from_result(result, translator),
        not_found,
        back_href,
        back_label: translator.t(kind.nav_key()),
        price_on_request: translator.t("price_on_request"),
        discount_label: translator.t("discount"),
    }
}

#[derive(Debug, Serialize)]
pub struct AboutPage {
    pub title: String,
    pub body: String,
}

pub fn about_page(translator: Translator<'_>) -> AboutPage {
    AboutPage {
        title: translator.t("about_title"),
        body: translator.t("about_body"),
    }
}

#[derive(Debug, Serialize)]
pub struct ContactPage {
    pub title: String,
    pub full_name_label: String,
    pub phone_label: String,
    pub message_label: String,
    pub send_label: String,
    pub countries: Vec<Country>,
}

pub fn contact_page(translator: Translator<'_>) -> ContactPage {
    ContactPage {
        title: translator.t("contact_title"),
        full_name_label: translator.t("full_name"),
        phone_label: translator.t("phone"),
        message_label: translator.t("message"),
        send_label: translator.t("send"),
        countries: vec![
            Country::UZ,
            Country::RU,
            Country::KZ,
            Country::KG,
            Country::TJ,
            Country::TM,
        ],
    }
}

#[derive(Debug, Serialize)]
pub struct NotFoundPage {
    pub message: String,
    pub home_href: String,
    pub home_label: String,
}

pub fn not_found_page(translator: Translator<'_>) -> NotFoundPage {
    NotFoundPage {
        message: translator.t("page_not_found"),
        home_href: "/".to_string(),
        home_label: translator.t("nav_home"),
    }
}

use crate::config::{normalize_base_url, Config};
use crate::i18n::Language;
use crate::models::{
    Banner, CatalogDetail, CatalogKind, Category, ContactRequest, Dashboard, Paginated, Partner,
    RawCatalogDetail, RawCatalogItem, RawDashboard,
};
use anyhow::Result;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::time::Duration;

#[derive(Debug)]
pub enum ApiError {
    MissingBaseUrl,
    Status { status: StatusCode, body: String },
    Transport(reqwest::Error),
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingBaseUrl => write!(f, "API base URL is not configured"),
            ApiError::Status { status, body } => {
                write!(f, "API responded with {}. Body: {}", status, body)
            }
            ApiError::Transport(e) => write!(f, "API request failed: {}", e),
            ApiError::Decode(e) => write!(f, "API response could not be decoded: {}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Network,
}

impl FailureKind {
    /// Translation key of the message shown in the error panel.
    pub fn message_key(&self) -> &'static str {
        match self {
            FailureKind::Configuration => "config_error",
            FailureKind::Network => "error_title",
        }
    }
}

/**
 * classify_error
 * Splits fetch failures into the configuration and network/HTTP buckets; anything untyped counts as network.
 */
pub fn classify_error(err: &anyhow::Error) -> FailureKind {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::MissingBaseUrl) => FailureKind::Configuration,
        _ => FailureKind::Network,
    }
}

/**
 * error_summary
 * One-line description of a failure that is safe to hand to clients; upstream bodies stay in the log.
 */
pub fn error_summary(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::MissingBaseUrl) => ApiError::MissingBaseUrl.to_string(),
        Some(ApiError::Status { status, .. }) => format!("API responded with {}", status),
        Some(ApiError::Decode(_)) => "API response could not be decoded".to_string(),
        Some(ApiError::Transport(_)) | None => "API request failed".to_string(),
    }
}

/**
 * resolve_image_url
 * Absolute URLs pass through; relative paths are joined onto the API base with exactly one `/`.
 */
pub fn resolve_image_url(api_base: &str, image: &str) -> String {
    let image = image.trim();
    if image.is_empty() {
        return String::new();
    }
    if image.starts_with("http://") || image.starts_with("https://") || image.starts_with("//") {
        return image.to_string();
    }
    let base = normalize_base_url(api_base);
    if image.starts_with('/') {
        format!("{}{}", base, image)
    } else {
        format!("{}/{}", base, image)
    }
}

/// Query of the paginated list endpoints. Absent filters are not sent at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", self.page.to_string())];
        if let Some(category) = &self.category {
            query.push(("category", category.clone()));
        }
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        query
    }
}

/// The slice of the API the listing, menu, category and contact logic depends on.
pub trait CatalogSource: Send + Sync + 'static {
    fn api_base(&self) -> &str;

    fn catalog_page(
        &self,
        kind: CatalogKind,
        params: &ListParams,
        language: Language,
    ) -> impl Future<Output = Result<Paginated<RawCatalogItem>>> + Send;

    fn catalog_list(
        &self,
        kind: CatalogKind,
        language: Language,
    ) -> impl Future<Output = Result<Vec<RawCatalogItem>>> + Send;

    fn categories(
        &self,
        kind: CatalogKind,
        language: Language,
    ) -> impl Future<Output = Result<Vec<Category>>> + Send;

    fn send_contact(
        &self,
        request: &ContactRequest,
        language: Language,
    ) -> impl Future<Output = Result<()>> + Send;
}

pub struct ApiClient {
    client: Client,
    base_url: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    pub fn with_base_url(base_url: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(8))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url
                .map(normalize_base_url)
                .filter(|b| !b.is_empty()),
        })
    }

    pub fn is_unconfigured(&self) -> bool {
        self.base_url.is_none()
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let base = self.base_url.as_deref().ok_or(ApiError::MissingBaseUrl)?;
        let mut url = Url::parse(&format!("{}{}", base, path))?;
        if !query.is_empty() {
            let mut qp = url.query_pairs_mut();
            for (k, v) in query {
                qp.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        language: Language,
    ) -> Result<T> {
        let url = self.url(path, query)?;
        log::debug!("GET {} [{}]", url, language.code());

        let response = self
            .client
            .get(url)
            .header("Accept-Language", language.header_value())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(ApiError::Transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body }.into());
        }

        let bytes = response.bytes().await.map_err(ApiError::Transport)?;
        let parsed = serde_json::from_slice::<T>(&bytes)
            .map_err(|e| ApiError::Decode(format!("{} ({})", e, path)))?;
        Ok(parsed)
    }

    pub async fn dashboard(&self, language: Language) -> Result<Dashboard> {
        let raw: RawDashboard = self.get_json("/dashboard/", &[], language).await?;
        Ok(Dashboard::from_raw(raw, self.api_base()))
    }

    pub async fn catalog_detail(
        &self,
        kind: CatalogKind,
        id: i64,
        language: Language,
    ) -> Result<CatalogDetail> {
        let raw: RawCatalogDetail = self
            .get_json(&kind.detail_path(id), &[], language)
            .await?;
        Ok(CatalogDetail::from_raw(kind, raw, self.api_base()))
    }

    pub async fn product_detail(&self, id: i64, language: Language) -> Result<CatalogDetail> {
        self.catalog_detail(CatalogKind::Product, id, language).await
    }

    pub async fn service_detail(&self, id: i64, language: Language) -> Result<CatalogDetail> {
        self.catalog_detail(CatalogKind::Service, id, language).await
    }

    pub async fn banners(&self, language: Language) -> Result<Vec<Banner>> {
        let mut banners: Vec<Banner> = self.get_json("/banners/", &[], language).await?;
        for banner in banners.iter_mut() {
            banner.image = resolve_image_url(self.api_base(), &banner.image);
        }
        Ok(banners)
    }

    pub async fn partners(&self, language: Language) -> Result<Vec<Partner>> {
        let mut partners: Vec<Partner> = self.get_json("/partners/", &[], language).await?;
        for partner in partners.iter_mut() {
            partner.logo = resolve_image_url(self.api_base(), &partner.logo);
        }
        Ok(partners)
    }
}

impl CatalogSource for ApiClient {
    fn api_base(&self) -> &str {
        self.base_url.as_deref().unwrap_or("")
    }

    async fn catalog_page(
        &self,
        kind: CatalogKind,
        params: &ListParams,
        language: Language,
    ) -> Result<Paginated<RawCatalogItem>> {
        self.get_json(kind.page_path(), &params.to_query(), language)
            .await
    }

    async fn catalog_list(
        &self,
        kind: CatalogKind,
        language: Language,
    ) -> Result<Vec<RawCatalogItem>> {
        self.get_json(kind.list_path(), &[], language).await
    }

    async fn categories(&self, kind: CatalogKind, language: Language) -> Result<Vec<Category>> {
        self.get_json(
            "/categories/",
            &[("type", kind.category_type().to_string())],
            language,
        )
        .await
    }

    async fn send_contact(&self, request: &ContactRequest, language: Language) -> Result<()> {
        let url = self.url("/send/", &[])?;
        let response = self
            .client
            .post(url)
            .header("Accept-Language", language.header_value())
            .json(request)
            .send()
            .await
            .map_err(ApiError::Transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body }.into());
        }
        Ok(())
    }
}

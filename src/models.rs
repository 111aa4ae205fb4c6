use crate::api::resolve_image_url;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Products and services share one item shape but live behind different endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Product,
    Service,
}

impl CatalogKind {
    /// Unpaginated flat list used by the navigation menu and footer.
    pub fn list_path(&self) -> &'static str {
        match self {
            CatalogKind::Product => "/products-list/",
            CatalogKind::Service => "/services-list/",
        }
    }

    pub fn page_path(&self) -> &'static str {
        match self {
            CatalogKind::Product => "/products/",
            CatalogKind::Service => "/services/",
        }
    }

    pub fn detail_path(&self, id: i64) -> String {
        format!("{}{}/", self.page_path(), id)
    }

    /// `type` value of `/categories/`.
    pub fn category_type(&self) -> &'static str {
        match self {
            CatalogKind::Product => "product",
            CatalogKind::Service => "service",
        }
    }

    /// Site route of the listing page.
    pub fn route(&self) -> &'static str {
        match self {
            CatalogKind::Product => "/products",
            CatalogKind::Service => "/services",
        }
    }

    pub fn nav_key(&self) -> &'static str {
        match self {
            CatalogKind::Product => "nav_products",
            CatalogKind::Service => "nav_services",
        }
    }
}

/// Ids arrive as numbers from some endpoints and strings from others.
fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    de_opt_id(deserializer)?.ok_or_else(|| serde::de::Error::custom("missing id"))
}

fn de_opt_price<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    })
}

fn de_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCatalogItem {
    pub id: i64,
    #[serde(default, deserialize_with = "de_nullable_string")]
    pub title: String,
    #[serde(default, alias = "shortDescription", deserialize_with = "de_nullable_string")]
    pub short_description: String,
    #[serde(default, deserialize_with = "de_nullable_string")]
    pub category: String,
    #[serde(default, alias = "categoryId", deserialize_with = "de_opt_id")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "de_opt_price")]
    pub price: Option<i64>,
    #[serde(default, alias = "hasDiscount")]
    pub has_discount: Option<bool>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: i64,
    pub title: String,
    pub short_description: String,
    pub category: String,
    /// Join key for filtering; the display name stands in when the server omits it.
    pub category_id: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    pub has_discount: bool,
}

impl CatalogItem {
    pub fn from_raw(raw: RawCatalogItem, api_base: &str) -> Self {
        let category_id = match raw.category_id {
            Some(id) => id,
            None => {
                log::warn!(
                    "Catalog item {} has no category_id; using category name {:?} as its id",
                    raw.id,
                    raw.category
                );
                raw.category.clone()
            }
        };

        Self {
            id: raw.id,
            title: raw.title,
            short_description: raw.short_description,
            category: raw.category,
            category_id,
            image: resolve_image_url(api_base, raw.image.as_deref().unwrap_or("")),
            price: raw.price,
            has_discount: raw.has_discount.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Category {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_nullable_string")]
    pub name: String,
}

impl Category {
    pub const ALL: &'static str = "all";
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawDashboard {
    #[serde(default)]
    pub products: Vec<RawCatalogItem>,
    #[serde(default)]
    pub services: Vec<RawCatalogItem>,
}

#[derive(Debug, Serialize, Clone)]
pub struct Dashboard {
    pub products: Vec<CatalogItem>,
    pub services: Vec<CatalogItem>,
}

impl Dashboard {
    pub fn from_raw(raw: RawDashboard, api_base: &str) -> Self {
        Self {
            products: raw
                .products
                .into_iter()
                .map(|item| CatalogItem::from_raw(item, api_base))
                .collect(),
            services: raw
                .services
                .into_iter()
                .map(|item| CatalogItem::from_raw(item, api_base))
                .collect(),
        }
    }
}

/// Gallery entries come either as bare URLs or as `{image|video|url: ...}` objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MediaRef {
    Url(String),
    Object {
        #[serde(alias = "image", alias = "video", alias = "file")]
        url: String,
    },
}

impl MediaRef {
    pub fn as_str(&self) -> &str {
        match self {
            MediaRef::Url(url) => url,
            MediaRef::Object { url } => url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCatalogDetail {
    pub id: i64,
    #[serde(default, deserialize_with = "de_nullable_string")]
    pub title: String,
    #[serde(default, alias = "shortDescription", deserialize_with = "de_nullable_string")]
    pub short_description: String,
    #[serde(default, deserialize_with = "de_nullable_string")]
    pub description: String,
    #[serde(default, deserialize_with = "de_nullable_string")]
    pub category: String,
    #[serde(default, alias = "categoryId", deserialize_with = "de_opt_id")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<MediaRef>,
    #[serde(default)]
    pub videos: Vec<MediaRef>,
    #[serde(default, deserialize_with = "de_opt_price")]
    pub price: Option<i64>,
    #[serde(default, alias = "hasDiscount")]
    pub has_discount: Option<bool>,
}

#[derive(Debug, Serialize, Clone)]
pub struct CatalogDetail {
    pub kind: CatalogKind,
    pub id: i64,
    pub title: String,
    pub short_description: String,
    /// Server-rendered HTML, passed through untouched.
    pub description: String,
    pub category: String,
    pub category_id: String,
    pub image: String,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    pub has_discount: bool,
}

impl CatalogDetail {
    pub fn from_raw(kind: CatalogKind, raw: RawCatalogDetail, api_base: &str) -> Self {
        let resolve_all = |media: Vec<MediaRef>| -> Vec<String> {
            media
                .iter()
                .map(|m| resolve_image_url(api_base, m.as_str()))
                .filter(|url| !url.is_empty())
                .collect()
        };

        let images = resolve_all(raw.images);
        let image = match raw.image.as_deref().filter(|s| !s.is_empty()) {
            Some(image) => resolve_image_url(api_base, image),
            None => images.first().cloned().unwrap_or_default(),
        };

        Self {
            kind,
            id: raw.id,
            title: raw.title,
            short_description: raw.short_description,
            description: raw.description,
            category_id: raw.category_id.unwrap_or_else(|| raw.category.clone()),
            category: raw.category,
            image,
            images,
            videos: resolve_all(raw.videos),
            price: if kind == CatalogKind::Product { raw.price } else { None },
            has_discount: kind == CatalogKind::Product && raw.has_discount.unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Banner {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub image: String,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Partner {
    pub id: i64,
    #[serde(deserialize_with = "de_nullable_string")]
    pub name: String,
    pub logo: String,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ContactRequest {
    pub full_name: String,
    pub phone: String,
    pub text: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct ErrorBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn error(code: &str, message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            error: Some(ErrorBody {
                code: code.to_string(),
                detail: None,
            }),
        }
    }
}

// Test doubles shared by the module tests

use crate::api::{ApiError, CatalogSource, ListParams};
use crate::i18n::Language;
use crate::models::{CatalogKind, Category, ContactRequest, Paginated, RawCatalogItem};
use crate::query_state::ITEMS_PER_PAGE;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FAKE_API_BASE: &str = "https://api.x.com";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Page(CatalogKind, ListParams, Language),
    List(CatalogKind, Language),
    Categories(CatalogKind, Language),
    Contact(ContactRequest),
}

pub fn raw_item(id: i64, title: &str, category: &str, category_id: Option<&str>) -> RawCatalogItem {
    RawCatalogItem {
        id,
        title: title.to_string(),
        short_description: format!("{} description", title),
        category: category.to_string(),
        category_id: category_id.map(|s| s.to_string()),
        image: Some(format!("/media/{}.jpg", id)),
        price: Some(id * 1000),
        has_discount: Some(id % 2 == 0),
    }
}

#[derive(Default)]
pub struct FakeSource {
    pub products: Vec<RawCatalogItem>,
    pub services: Vec<RawCatalogItem>,
    pub categories: Vec<Category>,
    pub fail: AtomicBool,
    /// Artificial latency of `catalog_page` per requested page.
    pub delays: Mutex<HashMap<u32, Duration>>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeSource {
    pub fn with_products(products: Vec<RawCatalogItem>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn delay_page(&self, page: u32, delay: Duration) {
        self.delays.lock().unwrap().insert(page, delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "fake failure".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn localized(items: &[RawCatalogItem], language: Language) -> Vec<RawCatalogItem> {
        items
            .iter()
            .cloned()
            .map(|mut item| {
                item.title = format!("{} [{}]", item.title, language.code());
                item
            })
            .collect()
    }

    fn items(&self, kind: CatalogKind) -> &[RawCatalogItem] {
        match kind {
            CatalogKind::Product => &self.products,
            CatalogKind::Service => &self.services,
        }
    }
}

impl CatalogSource for FakeSource {
    fn api_base(&self) -> &str {
        FAKE_API_BASE
    }

    async fn catalog_page(
        &self,
        kind: CatalogKind,
        params: &ListParams,
        language: Language,
    ) -> Result<Paginated<RawCatalogItem>> {
        self.record(Call::Page(kind, params.clone(), language));
        let delay = self.delays.lock().unwrap().get(&params.page).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_failure()?;

        let matching: Vec<RawCatalogItem> = Self::localized(self.items(kind), language)
            .into_iter()
            .filter(|item| match &params.category {
                Some(category) => item.category_id.as_deref() == Some(category.as_str()),
                None => true,
            })
            .filter(|item| match &params.search {
                Some(search) => item.title.to_lowercase().contains(&search.to_lowercase()),
                None => true,
            })
            .collect();

        let start = (params.page.saturating_sub(1) as usize) * ITEMS_PER_PAGE;
        Ok(Paginated {
            count: matching.len() as u64,
            next: None,
            previous: None,
            results: matching.into_iter().skip(start).take(ITEMS_PER_PAGE).collect(),
        })
    }

    async fn catalog_list(
        &self,
        kind: CatalogKind,
        language: Language,
    ) -> Result<Vec<RawCatalogItem>> {
        self.record(Call::List(kind, language));
        self.check_failure()?;
        Ok(Self::localized(self.items(kind), language))
    }

    async fn categories(&self, kind: CatalogKind, language: Language) -> Result<Vec<Category>> {
        self.record(Call::Categories(kind, language));
        self.check_failure()?;
        Ok(self.categories.clone())
    }

    async fn send_contact(&self, request: &ContactRequest, _language: Language) -> Result<()> {
        self.record(Call::Contact(request.clone()));
        self.check_failure()
    }
}

fn header_language(req: &HttpRequest) -> String {
    req.headers()
        .get("Accept-Language")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("none")
        .to_string()
}

async fn fake_page(req: HttpRequest) -> HttpResponse {
    let title = format!("{}|{}", header_language(&req), req.query_string());
    HttpResponse::Ok().json(json!({
        "count": 1,
        "next": null,
        "previous": null,
        "results": [
            {"id": 1, "title": title, "category": "Tractors", "category_id": 5, "image": "/media/t.jpg", "price": 100}
        ]
    }))
}

async fn fake_detail(path: web::Path<(String, i64)>) -> HttpResponse {
    let (_, id) = path.into_inner();
    if id == 404 {
        return HttpResponse::NotFound().json(json!({"detail": "Not found."}));
    }
    HttpResponse::Ok().json(json!({
        "id": id,
        "title": format!("item {}", id),
        "description": "<p>detail</p>",
        "category": "Tractors",
        "category_id": 5,
        "image": format!("/media/p{}.jpg", id),
        "images": [],
        "videos": ["https://cdn.y.com/v.mp4"]
    }))
}

async fn fake_list(req: HttpRequest, hits: web::Data<AtomicUsize>) -> HttpResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    let language = header_language(&req);
    HttpResponse::Ok().json(json!([
        {"id": 1, "title": format!("MTZ-82 [{}]", language), "category": "Tractors", "category_id": 5, "image": "/media/1.jpg"},
        {"id": 2, "title": format!("Disc harrow [{}]", language), "category": "Tillage", "category_id": 6, "image": "/media/2.jpg"}
    ]))
}

async fn fake_dashboard() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "products": [{"id": 1, "title": "MTZ-82", "category": "Tractors", "category_id": 5, "image": "/media/1.jpg"}],
        "services": [{"id": 3, "title": "Repair", "category": "Maintenance", "category_id": 9, "image": "https://cdn.y.com/r.jpg"}]
    }))
}

async fn fake_categories() -> HttpResponse {
    HttpResponse::Ok().json(json!([{"id": 5, "name": "Tractors"}, {"id": 6, "name": "Tillage"}]))
}

async fn fake_banners() -> HttpResponse {
    HttpResponse::Ok().json(json!([{"title": "Spring sale", "image": "/media/banner.jpg"}]))
}

async fn fake_partners() -> HttpResponse {
    HttpResponse::Ok().json(json!([{"id": 1, "name": "Claas", "logo": "https://cdn.y.com/logo.png", "link": null}]))
}

async fn fake_send(body: web::Json<ContactRequest>) -> HttpResponse {
    if body.text.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({"text": ["required"]}));
    }
    HttpResponse::Created().finish()
}

/// Starts an in-process stand-in for the remote API and returns its base URL.
/// Must run inside an actix system (`#[actix_web::test]`).
pub fn spawn_fake_api() -> String {
    spawn_counting_fake_api().0
}

/// Like `spawn_fake_api`, also counting hits on the flat list endpoints.
pub fn spawn_counting_fake_api() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let list_hits = web::Data::from(Arc::clone(&hits));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(list_hits.clone())
            .route("/dashboard/", web::get().to(fake_dashboard))
            .route("/products-list/", web::get().to(fake_list))
            .route("/services-list/", web::get().to(fake_list))
            .route("/products/", web::get().to(fake_page))
            .route("/services/", web::get().to(fake_page))
            .route("/{kind}/{id}/", web::get().to(fake_detail))
            .route("/categories/", web::get().to(fake_categories))
            .route("/banners/", web::get().to(fake_banners))
            .route("/partners/", web::get().to(fake_partners))
            .route("/send/", web::post().to(fake_send))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .expect("bind fake api");

    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    (format!("http://{}", addr), hits)
}

use crate::api::{ApiClient, CatalogSource};
use crate::categories::CategoryListFetcher;
use crate::config::Config;
use crate::contact::{validate_request, Toast, ToastKind};
use crate::i18n::{
    FileStorage, Language, LanguageStorage, LanguageStore, MemoryStorage, Translations, Translator,
};
use crate::layout::{Layout, LayoutCache};
use crate::models::{ApiResponse, CatalogKind, ErrorBody};
use crate::pages;
use crate::query_state::QueryState;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const LANGUAGE_COOKIE: &str = "lang";

pub struct AppState {
    pub api: Arc<ApiClient>,
    pub categories: CategoryListFetcher<ApiClient>,
    pub layouts: LayoutCache<ApiClient>,
    pub translations: Arc<Translations>,
    /// Fallback language for requests that carry neither cookie nor `Accept-Language`.
    /// `POST /language` updates and persists it.
    pub languages: LanguageStore,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let storage: Box<dyn LanguageStorage> = match &config.language_store_path {
            Some(path) => Box::new(FileStorage::new(path)),
            None => Box::new(MemoryStorage::default()),
        };
        Ok(Self::with_api(
            ApiClient::new(config)?,
            LanguageStore::new(storage, config.default_language),
        ))
    }

    pub fn with_api(api: ApiClient, languages: LanguageStore) -> Self {
        let api = Arc::new(api);
        let translations = Arc::new(Translations::new());
        Self {
            categories: CategoryListFetcher::new(Arc::clone(&api), Arc::clone(&translations)),
            layouts: LayoutCache::new(Arc::clone(&api), Arc::clone(&translations)),
            api,
            translations,
            languages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub layout: Layout,
    pub page: T,
}

#[derive(Debug, Serialize)]
pub struct ToastView {
    pub kind: ToastKind,
    pub message: String,
}

/**
 * get_language_from_request
 * Cookie first, then `Accept-Language`, then the store's current language.
 */
fn get_language_from_request(req: &HttpRequest, state: &AppState) -> Language {
    if let Some(language) = req
        .cookie(LANGUAGE_COOKIE)
        .and_then(|c| Language::from_code(c.value()))
    {
        return language;
    }
    req.headers()
        .get("Accept-Language")
        .and_then(|h| h.to_str().ok())
        .and_then(Language::from_accept_language)
        .unwrap_or_else(|| state.languages.current())
}

async fn render<T, F>(state: &AppState, language: Language, page: F) -> PageResponse<T>
where
    F: std::future::Future<Output = T>,
{
    let (layout, page) = tokio::join!(state.layouts.get(language), page);
    PageResponse { layout, page }
}

fn toast_view(state: &AppState, language: Language, toast: Toast) -> ToastView {
    ToastView {
        kind: toast.kind,
        message: state.translations.get(language, toast.message_key),
    }
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "api_configured": !state.api.is_unconfigured(),
        "timestamp": Utc::now().to_rfc3339()
    }))
}

pub async fn index(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let language = get_language_from_request(&req, &state);
    let translator = state.translations.translator(language);
    let body = render(&state, language, pages::index_page(&state.api, translator)).await;
    HttpResponse::Ok().json(ApiResponse::success(body))
}

pub async fn about(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let language = get_language_from_request(&req, &state);
    let translator = state.translations.translator(language);
    let body = render(&state, language, async { pages::about_page(translator) }).await;
    HttpResponse::Ok().json(ApiResponse::success(body))
}

async fn listing(req: HttpRequest, state: web::Data<AppState>, kind: CatalogKind) -> HttpResponse {
    let language = get_language_from_request(&req, &state);
    let translator = state.translations.translator(language);
    let query = QueryState::parse(req.query_string());
    let body = render(
        &state,
        language,
        pages::listing_page(state.api.as_ref(), &state.categories, translator, kind, query),
    )
    .await;
    HttpResponse::Ok().json(ApiResponse::success(body))
}

pub async fn products(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    listing(req, state, CatalogKind::Product).await
}

pub async fn services(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    listing(req, state, CatalogKind::Service).await
}

async fn detail(
    req: HttpRequest,
    state: web::Data<AppState>,
    kind: CatalogKind,
    raw_id: String,
) -> HttpResponse {
    let id = match raw_id.trim().parse::<i64>() {
        Ok(id) => id,
        Err(_) => return not_found(req, state).await,
    };
    let language = get_language_from_request(&req, &state);
    let translator = state.translations.translator(language);
    let body = render(&state, language, pages::detail_page(&state.api, translator, kind, id)).await;

    if body.page.not_found {
        return not_found_response(body.layout, translator);
    }
    HttpResponse::Ok().json(ApiResponse::success(body))
}

pub async fn product_detail(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    detail(req, state, CatalogKind::Product, path.into_inner()).await
}

pub async fn service_detail(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    detail(req, state, CatalogKind::Service, path.into_inner()).await
}

pub async fn contact(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let language = get_language_from_request(&req, &state);
    let translator = state.translations.translator(language);
    let body = render(&state, language, async { pages::contact_page(translator) }).await;
    HttpResponse::Ok().json(ApiResponse::success(body))
}

#[derive(Debug, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

pub async fn submit_contact(
    req: HttpRequest,
    body: web::Json<ContactSubmission>,
    state: web::Data<AppState>,
) -> impl Responder {
    let language = get_language_from_request(&req, &state);
    let request = match validate_request(&body.full_name, &body.phone, &body.message) {
        Ok(request) => request,
        Err(field) => {
            let toast = toast_view(
                &state,
                language,
                Toast {
                    kind: ToastKind::Error,
                    message_key: field.message_key(),
                },
            );
            return HttpResponse::UnprocessableEntity().json(ApiResponse {
                success: false,
                message: Some(toast.message.clone()),
                data: Some(toast),
                error: Some(ErrorBody {
                    code: "validation_error".to_string(),
                    detail: Some(field.message_key().to_string()),
                }),
            });
        }
    };

    match state.api.send_contact(&request, language).await {
        Ok(()) => {
            let toast = toast_view(
                &state,
                language,
                Toast {
                    kind: ToastKind::Success,
                    message_key: "contact_success",
                },
            );
            HttpResponse::Ok().json(ApiResponse::success(toast))
        }
        Err(e) => {
            log::error!("Failed to forward contact submission: {:?}", e);
            let message = state.translations.get(language, "contact_error");
            HttpResponse::BadGateway().json(ApiResponse::<()>::error("upstream_error", message))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LanguageChange {
    pub language: String,
}

pub async fn set_language(
    body: web::Json<LanguageChange>,
    state: web::Data<AppState>,
) -> impl Responder {
    let language = match Language::from_code(&body.language) {
        Some(language) => language,
        None => {
            return HttpResponse::BadRequest().json(ApiResponse::<()>::error(
                "unsupported_language",
                format!("Unsupported language: {}", body.language),
            ))
        }
    };

    state.languages.set(language);
    let cookie = Cookie::build(LANGUAGE_COOKIE, language.code())
        .path("/")
        .max_age(CookieDuration::days(365))
        .finish();
    HttpResponse::Ok()
        .cookie(cookie)
        .json(ApiResponse::success(serde_json::json!({ "language": language })))
}

fn not_found_response(layout: Layout, translator: Translator<'_>) -> HttpResponse {
    let page = pages::not_found_page(translator);
    HttpResponse::NotFound().json(ApiResponse {
        success: false,
        message: Some(page.message.clone()),
        data: Some(PageResponse { layout, page }),
        error: Some(ErrorBody {
            code: "not_found".to_string(),
            detail: None,
        }),
    })
}

pub async fn not_found(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let language = get_language_from_request(&req, &state);
    let layout = state.layouts.get(language).await;
    not_found_response(layout, state.translations.translator(language))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .route("/", web::get().to(index))
        .route("/about", web::get().to(about))
        .route("/products", web::get().to(products))
        .route("/products/{id}", web::get().to(product_detail))
        .route("/services", web::get().to(services))
        .route("/services/{id}", web::get().to(service_detail))
        .route("/contact", web::get().to(contact))
        .route("/contact", web::post().to(submit_contact))
        .route("/language", web::post().to(set_language));
}

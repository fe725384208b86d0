use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use charityhub_db::Database;
use charityhub_stores::{Attachments, countries};
use charityhub_types::api::{
    AttachRequest, AttachedResponse, Claims, CreateRequest, CreatedResponse, DateQuery,
    DateResponse, DeletedResponse, FlagResponse, ResolveQuery,
};
use charityhub_types::entity::{Entity, Flag};
use charityhub_types::format;
use charityhub_types::models::{Advertisement, Charity, Connection, Content, User};
use charityhub_types::nav::{self, HEADER_ITEMS, ROUTES};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::middleware::require_auth;
use crate::session::{Sessions, SessionEntity, SharedSession};
use crate::storage::Storage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub storage: Arc<Storage>,
    pub sessions: Sessions,
    pub http: reqwest::Client,
    pub jwt_secret: String,
    pub countries_url: String,
}

impl AppStateInner {
    pub fn session(&self, claims: &Claims) -> SharedSession {
        self.sessions
            .get_or_create(&claims.sub, claims.exp, &self.db, &self.storage)
    }
}

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/nav/sidebar", get(sidebar))
        .route("/nav/header", get(header))
        .route("/nav/routes", get(routes))
        .route("/nav/resolve", get(resolve))
        .route("/format/date", get(format_date))
        .route("/countries", get(country_names))
        .route("/session/logout", post(logout))
        .merge(records::<Charity>())
        .merge(records::<Advertisement>())
        .merge(records::<Content>())
        .merge(records::<User>())
        .merge(records::<Connection>())
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(protected_routes)
        .nest_service("/files", ServeDir::new(state.storage.dir()))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// CRUD and flag routes for one record type, mounted at its collection name.
fn records<T: SessionEntity>() -> Router<AppState> {
    let base = format!("/{}", T::COLLECTION);
    Router::new()
        .route(&base, get(list::<T>).post(create::<T>))
        .route(&format!("{base}/{{id}}"), patch(update::<T>).delete(remove::<T>))
        .route(&format!("{base}/{{id}}/flags/{{flag}}"), post(toggle_flag::<T>))
        .route(&format!("{base}/{{id}}/attachments"), put(upload_attachments::<T>))
}

fn authorize<T: Entity>(claims: &Claims) -> Result<(), ApiError> {
    if T::managed_by(claims.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(claims.role))
    }
}

fn decode_attachments(encoded: BTreeMap<String, String>) -> Result<Attachments, ApiError> {
    let mut files = Attachments::new();
    for (field, data) in encoded {
        let data = STANDARD
            .decode(data.as_bytes())
            .map_err(|e| ApiError::MalformedPayload(format!("attachment '{}': {}", field, e)))?;
        files.insert(field, data);
    }
    Ok(files)
}

// -- Records --

async fn list<T: SessionEntity>(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<T>>, ApiError> {
    authorize::<T>(&claims)?;
    let session = state.session(&claims);
    let mut session = session.lock().await;
    let store = T::store(&mut session);
    store.fetch_all().await?;
    Ok(Json(store.records().to_vec()))
}

async fn create<T: SessionEntity>(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateRequest<T>>,
) -> Result<impl IntoResponse, ApiError> {
    authorize::<T>(&claims)?;
    let files = decode_attachments(req.attachments)?;

    let session = state.session(&claims);
    let mut session = session.lock().await;
    let id = T::store(&mut session).add(&req.record, &files).await?;
    debug!("{} created {}/{}", claims.sub, T::COLLECTION, id);

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn update<T: SessionEntity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(changes): Json<T::Changes>,
) -> Result<StatusCode, ApiError> {
    authorize::<T>(&claims)?;
    let session = state.session(&claims);
    let mut session = session.lock().await;
    T::store(&mut session).update(&id, &changes).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove<T: SessionEntity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DeletedResponse>, ApiError> {
    authorize::<T>(&claims)?;
    let session = state.session(&claims);
    let mut session = session.lock().await;
    let store = T::store(&mut session);

    // Records outside the list filters are never loaded; read them directly.
    let urls = match store.get(&id) {
        Some(record) => record.attachment_urls(),
        None => store
            .find(&id)
            .await?
            .map(|record| record.attachment_urls())
            .unwrap_or_default(),
    };

    let attachments_removed = store.delete(&id, &urls).await?;
    Ok(Json(DeletedResponse {
        id,
        attachments_removed,
    }))
}

async fn toggle_flag<T: SessionEntity>(
    State(state): State<AppState>,
    Path((id, flag)): Path<(String, String)>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<FlagResponse>, ApiError> {
    authorize::<T>(&claims)?;
    let flag: Flag = flag.parse().map_err(ApiError::MalformedPayload)?;

    let session = state.session(&claims);
    let mut session = session.lock().await;
    let store = T::store(&mut session);

    if store.get(&id).is_none() {
        store.fetch_all().await?;
    }
    let value = store.toggle_flag(&id, flag).await?;

    Ok(Json(FlagResponse { id, flag, value }))
}

async fn upload_attachments<T: SessionEntity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AttachRequest>,
) -> Result<Json<AttachedResponse>, ApiError> {
    authorize::<T>(&claims)?;
    let files = decode_attachments(req.attachments)?;

    let session = state.session(&claims);
    let mut session = session.lock().await;
    let urls = T::store(&mut session).attach(&id, &files).await?;

    Ok(Json(AttachedResponse { id, urls }))
}

async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> StatusCode {
    if let Some(session) = state.sessions.remove(&claims.sub) {
        session.lock().await.reset();
    }
    info!(
        "{} logged out ({} sessions open)",
        claims.sub,
        state.sessions.len()
    );
    StatusCode::NO_CONTENT
}

// -- Navigation --

async fn sidebar(Extension(claims): Extension<Claims>) -> impl IntoResponse {
    Json(nav::sidebar_for(claims.role))
}

async fn header() -> impl IntoResponse {
    Json(HEADER_ITEMS)
}

async fn routes() -> impl IntoResponse {
    Json(ROUTES)
}

async fn resolve(Query(query): Query<ResolveQuery>) -> Result<impl IntoResponse, ApiError> {
    nav::resolve(&query.path).map(Json).ok_or(ApiError::NotFound)
}

// -- Utilities --

async fn format_date(Query(query): Query<DateQuery>) -> Json<DateResponse> {
    Json(DateResponse {
        formatted: format::sort_date(query.value.as_deref()),
    })
}

async fn country_names(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let names = countries::fetch_country_names(&state.http, &state.countries_url).await?;
    Ok(Json(names))
}

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub const COLLECTION_PATH: &str = "/api/movies";
pub const UPLOADS_PATH: &str = "/uploads";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub rating: Option<u8>,
    pub image_url: Option<String>,
}

/// Validation failure body, shaped like ASP.NET problem details.
#[derive(Debug, Serialize, Deserialize)]
pub struct Problem {
    pub title: String,
    pub errors: BTreeMap<String, Vec<String>>,
}

#[derive(Clone)]
struct StoredImage {
    content_type: String,
    bytes: Bytes,
}

#[derive(Default)]
pub struct Db {
    movies: BTreeMap<i64, Movie>,
    images: HashMap<String, StoredImage>,
    next_id: i64,
}

pub type SharedDb = Arc<RwLock<Db>>;

pub fn app() -> Router {
    let db: SharedDb = Arc::new(RwLock::new(Db::default()));
    Router::new()
        .route(COLLECTION_PATH, get(list_movies).post(create_movie))
        .route(
            &format!("{COLLECTION_PATH}/{{id}}"),
            put(update_movie).delete(delete_movie),
        )
        .route(&format!("{UPLOADS_PATH}/{{name}}"), get(get_upload))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub enum ApiFailure {
    Invalid(BTreeMap<String, Vec<String>>),
    BadForm(String),
    NotFound,
}

impl From<MultipartError> for ApiFailure {
    fn from(err: MultipartError) -> Self {
        ApiFailure::BadForm(err.body_text())
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        match self {
            ApiFailure::Invalid(errors) => (
                StatusCode::BAD_REQUEST,
                Json(Problem {
                    title: "One or more validation errors occurred.".to_string(),
                    errors,
                }),
            )
                .into_response(),
            ApiFailure::BadForm(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiFailure::NotFound => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

struct Upload {
    file_name: String,
    content_type: String,
    bytes: Bytes,
}

#[derive(Default)]
struct RawForm {
    name: Option<String>,
    description: Option<String>,
    rating: Option<String>,
    image: Option<Upload>,
}

struct MovieInput {
    name: String,
    description: String,
    rating: Option<u8>,
    image: Option<Upload>,
}

async fn read_form(mut multipart: Multipart) -> Result<RawForm, ApiFailure> {
    let mut form = RawForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "Name" => form.name = Some(field.text().await?),
            "Description" => form.description = Some(field.text().await?),
            "Rating" => form.rating = Some(field.text().await?),
            "ImageFile" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.image = Some(Upload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            }
            other => warn!(field = other, "ignoring unknown form field"),
        }
    }
    Ok(form)
}

fn validate(form: RawForm) -> Result<MovieInput, ApiFailure> {
    let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();

    let name = form.name.unwrap_or_default().trim().to_string();
    if name.is_empty() {
        errors
            .entry("Name".to_string())
            .or_default()
            .push("The Name field is required.".to_string());
    }

    let rating = match form.rating.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<u8>() {
            Ok(value) if (1..=5).contains(&value) => Some(value),
            _ => {
                errors
                    .entry("Rating".to_string())
                    .or_default()
                    .push("Rating must be between 1 and 5.".to_string());
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(ApiFailure::Invalid(errors));
    }
    Ok(MovieInput {
        name,
        description: form.description.unwrap_or_default().trim().to_string(),
        rating,
        image: form.image,
    })
}

/// Store the upload under a fresh key and return its public URL.
fn store_image(db: &mut Db, upload: Upload) -> String {
    let extension = upload
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    let key = format!("{}{extension}", Uuid::new_v4().simple());
    db.images.insert(
        key.clone(),
        StoredImage {
            content_type: upload.content_type,
            bytes: upload.bytes,
        },
    );
    format!("{UPLOADS_PATH}/{key}")
}

fn forget_image(db: &mut Db, image_url: Option<&str>) {
    if let Some(key) = image_url.and_then(|url| url.strip_prefix(&format!("{UPLOADS_PATH}/"))) {
        db.images.remove(key);
    }
}

async fn list_movies(State(db): State<SharedDb>) -> Json<Vec<Movie>> {
    let db = db.read().await;
    Json(db.movies.values().cloned().collect())
}

async fn create_movie(
    State(db): State<SharedDb>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Movie>), ApiFailure> {
    let input = validate(read_form(multipart).await?)?;
    let mut db = db.write().await;
    db.next_id += 1;
    let id = db.next_id;
    let image_url = input.image.map(|upload| store_image(&mut db, upload));
    let movie = Movie {
        id,
        name: input.name,
        description: input.description,
        rating: input.rating,
        image_url,
    };
    db.movies.insert(id, movie.clone());
    info!(id, name = %movie.name, "movie created");
    Ok((StatusCode::CREATED, Json(movie)))
}

async fn update_movie(
    State(db): State<SharedDb>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Movie>, ApiFailure> {
    let input = validate(read_form(multipart).await?)?;
    let mut db = db.write().await;
    let mut movie = db.movies.get(&id).cloned().ok_or(ApiFailure::NotFound)?;
    movie.name = input.name;
    movie.description = input.description;
    movie.rating = input.rating;
    if let Some(upload) = input.image {
        forget_image(&mut db, movie.image_url.as_deref());
        movie.image_url = Some(store_image(&mut db, upload));
    }
    db.movies.insert(id, movie.clone());
    info!(id, "movie updated");
    Ok(Json(movie))
}

async fn delete_movie(
    State(db): State<SharedDb>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiFailure> {
    let mut db = db.write().await;
    let movie = db.movies.remove(&id).ok_or(ApiFailure::NotFound)?;
    forget_image(&mut db, movie.image_url.as_deref());
    info!(id, "movie deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_upload(
    State(db): State<SharedDb>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiFailure> {
    let db = db.read().await;
    let image = db.images.get(&name).cloned().ok_or(ApiFailure::NotFound)?;
    Ok(([(header::CONTENT_TYPE, image.content_type)], image.bytes))
}

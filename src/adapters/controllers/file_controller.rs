use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Extension, Json,
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    adapters::{dto::file_dto::FileResponse, state::AppState},
    application::{
        error::ApplicationError,
        repositories::MetadataRepository,
        services::StorageService,
    },
    domain::{
        config::policy::FilePolicy,
        models::{
            file::{FileData, FileRecord, MAX_LIFETIME},
            user::User,
        },
    },
    services::StorageError,
};

const ID_ATTEMPTS: usize = 5;
const FALLBACK_NAME: &str = "upload";

pub struct FileController;

fn forbidden() -> ApplicationError {
    ApplicationError::Forbidden("The current user is not authorized to perform this action".to_string())
}

fn multipart_error(e: MultipartError) -> ApplicationError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApplicationError::PayloadTooLarge;
    }
    warn!("Invalid multipart data: {}", e);
    ApplicationError::BadRequest("Invalid request format".to_string())
}

/// Content sniffing first, then plain text, then the client's file name.
fn detect_mimetype(content: &[u8], original_name: &str) -> String {
    if let Some(kind) = infer::get(content) {
        return kind.mime_type().to_string();
    }
    if !content.is_empty() && std::str::from_utf8(content).is_ok() {
        return "text/plain".to_string();
    }
    mime_guess::from_path(original_name)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

fn extension_of(original_name: &str) -> String {
    FsPath::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Applies the upload policy. Returns the lowercased extension of the upload.
fn check_policy(policy: &FilePolicy, file: &FileData) -> Result<String, ApplicationError> {
    if !policy.allows_mime_type(&file.mimetype) {
        return Err(ApplicationError::Unprocessable(format!(
            "File type {} not allowed",
            file.mimetype
        )));
    }

    let extension = extension_of(&file.original_name);
    if !policy.allows_extension(&extension) {
        return Err(ApplicationError::Unprocessable(format!(
            "File type .{} not allowed",
            extension
        )));
    }

    if !file.validate_size(policy.max_size) {
        return Err(ApplicationError::Unprocessable(format!(
            "File size is {}B, which exceeds the maximum allowed size of {}B",
            file.size(),
            policy.max_size
        )));
    }

    Ok(extension)
}

fn new_file_id() -> String {
    format!("{:08x}", rand::random::<u32>())
}

fn stored_name_for(id: &str, extension: &str) -> String {
    if extension.is_empty() {
        id.to_string()
    } else {
        format!("{}.{}", id, extension)
    }
}

/// Picks an id whose record and blob names are both unused.
async fn allocate_names(
    metadata: &dyn MetadataRepository,
    storage: &dyn StorageService,
    extension: &str,
) -> Result<(String, String), ApplicationError> {
    for _ in 0..ID_ATTEMPTS {
        let id = new_file_id();
        let stored_name = stored_name_for(&id, extension);
        let id_taken = match metadata.get_file(&id).await {
            Ok(_) => true,
            Err(ApplicationError::NotFound(_)) => false,
            Err(e) => return Err(e),
        };
        if !id_taken && !storage.exists(&stored_name).await? {
            return Ok((id, stored_name));
        }
    }
    Err(ApplicationError::InternalError(
        "Could not allocate a unique file id".to_string(),
    ))
}

fn content_disposition(record: &FileRecord) -> HeaderValue {
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", record.original_name))
        .or_else(|_| {
            HeaderValue::from_str(&format!("attachment; filename=\"{}\"", record.stored_name))
        })
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn may_modify(user: &User, record: &FileRecord) -> bool {
    user.is_admin || record.owner.as_deref() == Some(user.username.as_str())
}

impl FileController {
    /// POST /files
    /// Multipart: `file` (required), `lifetime` in seconds (optional, 0 = permanent)
    pub async fn upload_file(
        State(app_state): State<AppState>,
        Extension(user): Extension<User>,
        mut multipart: Multipart,
    ) -> Result<(StatusCode, Json<FileResponse>), ApplicationError> {
        let mut upload: Option<(Vec<u8>, String)> = None;
        let mut lifetime: Option<i64> = None;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or("").to_string();

            match name.as_str() {
                "file" => {
                    let original_name = field
                        .file_name()
                        .map(sanitize_filename::sanitize)
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| FALLBACK_NAME.to_string());
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    upload = Some((bytes.to_vec(), original_name));
                }
                "lifetime" => {
                    let raw = field.text().await.map_err(multipart_error)?;
                    let value = raw.trim().parse::<i64>().ok().filter(|v| *v >= 0).ok_or_else(|| {
                        ApplicationError::Unprocessable(
                            "Lifetime must be a non-negative number of seconds".to_string(),
                        )
                    })?;
                    if value > MAX_LIFETIME {
                        return Err(ApplicationError::Unprocessable(format!(
                            "Lifetime must not exceed {} seconds",
                            MAX_LIFETIME
                        )));
                    }
                    lifetime = Some(value);
                }
                _ => {}
            }
        }

        let (content, original_name) = upload.ok_or_else(|| {
            warn!("Missing required 'file' field in upload");
            ApplicationError::Unprocessable("Missing required field 'file'".to_string())
        })?;

        let mimetype = detect_mimetype(&content, &original_name);
        let file = FileData::new(content, original_name, mimetype);
        let extension = check_policy(&app_state.file_policy, &file)?;

        let metadata = app_state.metadata_repository.as_ref();
        let storage = app_state.storage_service.as_ref();
        let (id, stored_name) = allocate_names(metadata, storage, &extension).await?;

        storage.store(&stored_name, &file.content).await?;

        let size = file.size();
        let record = FileRecord {
            id,
            owner: Some(user.username.clone()),
            original_name: file.original_name,
            stored_name,
            mimetype: file.mimetype,
            size,
            upload_time: Utc::now(),
            lifetime: lifetime.unwrap_or(app_state.file_policy.default_lifetime),
        };

        let record = match metadata.create_file(record.clone()).await {
            Ok(record) => record,
            Err(e) => {
                // Without a record the blob would only wait for the orphan pass.
                if let Err(cleanup) = storage.delete(&record.stored_name).await {
                    error!("Could not remove blob {} after failed insert: {}", record.stored_name, cleanup);
                }
                return Err(e);
            }
        };

        info!(
            "User {} uploaded {} as {} ({} bytes, lifetime {}s)",
            user.username, record.original_name, record.stored_name, record.size, record.lifetime
        );
        Ok((StatusCode::CREATED, Json(FileResponse::new(record, true))))
    }

    /// GET /files
    /// Admins see every file, everyone else only their own.
    pub async fn list_files(
        State(metadata_repo): State<Arc<dyn MetadataRepository>>,
        State(storage): State<Arc<dyn StorageService>>,
        Extension(user): Extension<User>,
    ) -> Result<Json<Vec<FileResponse>>, ApplicationError> {
        let records = if user.is_admin {
            metadata_repo.list_files().await?
        } else {
            metadata_repo.list_files_by_owner(&user.username).await?
        };

        let mut files = Vec::with_capacity(records.len());
        for record in records {
            let available = storage.exists(&record.stored_name).await?;
            files.push(FileResponse::new(record, available));
        }
        Ok(Json(files))
    }

    /// GET /files/{file_id}
    pub async fn view_file(
        State(metadata_repo): State<Arc<dyn MetadataRepository>>,
        State(storage): State<Arc<dyn StorageService>>,
        Path(file_id): Path<String>,
    ) -> Result<Json<FileResponse>, ApplicationError> {
        let record = metadata_repo.get_file(&file_id).await?;
        let available = storage.exists(&record.stored_name).await?;
        Ok(Json(FileResponse::new(record, available)))
    }

    /// GET /files/{file_id}/download
    pub async fn download_file(
        State(metadata_repo): State<Arc<dyn MetadataRepository>>,
        State(storage): State<Arc<dyn StorageService>>,
        Path(file_id): Path<String>,
    ) -> Result<Response, ApplicationError> {
        let record = metadata_repo.get_file(&file_id).await?;

        let content = storage.read(&record.stored_name).await.map_err(|e| match e {
            StorageError::NotFound(_) => {
                warn!("Blob {} of file {} is missing", record.stored_name, record.id);
                ApplicationError::NotFound(
                    "The requested file metadata exists, but the file binary was not found in storage"
                        .to_string(),
                )
            }
            other => other.into(),
        })?;

        let content_type = HeaderValue::from_str(&record.mimetype)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_DISPOSITION, content_disposition(&record))
            .body(Body::from(content))
            .map_err(|e| ApplicationError::InternalError(format!("Failed to build response: {}", e)))
    }

    /// DELETE /files/{file_id}
    ///
    /// The blob goes first. If it cannot be removed the record stays, so the file
    /// remains visible and the delete can be retried.
    pub async fn delete_file(
        State(metadata_repo): State<Arc<dyn MetadataRepository>>,
        State(storage): State<Arc<dyn StorageService>>,
        Extension(user): Extension<User>,
        Path(file_id): Path<String>,
    ) -> Result<StatusCode, ApplicationError> {
        let record = metadata_repo.get_file(&file_id).await?;
        if !may_modify(&user, &record) {
            warn!("User {} tried to delete file {} owned by {:?}", user.username, record.id, record.owner);
            return Err(forbidden());
        }

        match storage.delete(&record.stored_name).await {
            Ok(()) => {}
            Err(StorageError::NotFound(_)) => {
                warn!("Blob {} of file {} was already absent", record.stored_name, record.id);
            }
            Err(e) => return Err(e.into()),
        }
        metadata_repo.delete_file(&record.id).await?;

        info!("User {} deleted file {}", user.username, record.id);
        Ok(StatusCode::NO_CONTENT)
    }

    /// DELETE /files
    /// Admin only. Removes every blob in storage and every record whose blob is gone.
    pub async fn delete_all_files(
        State(metadata_repo): State<Arc<dyn MetadataRepository>>,
        State(storage): State<Arc<dyn StorageService>>,
        Extension(user): Extension<User>,
    ) -> Result<StatusCode, ApplicationError> {
        if !user.is_admin {
            warn!("Non-admin user {} tried to delete all files", user.username);
            return Err(ApplicationError::Forbidden(
                "Admin privileges required".to_string(),
            ));
        }

        let records = metadata_repo.list_files().await?;
        let mut blobs: Vec<String> = storage.list_names().await?.into_iter().collect();
        blobs.sort();

        let mut failed = Vec::new();
        for name in blobs {
            match storage.delete(&name).await {
                Ok(()) | Err(StorageError::NotFound(_)) => {}
                Err(e) if e.is_configuration() => return Err(e.into()),
                Err(e) => {
                    error!("Could not delete blob {}: {}", name, e);
                    failed.push(name);
                }
            }
        }

        let mut session = metadata_repo.begin().await?;
        let mut removed = 0usize;
        for record in records.iter().filter(|r| !failed.contains(&r.stored_name)) {
            if session.delete_file(&record.id).await? {
                removed += 1;
            }
        }
        session.commit().await?;

        info!("Admin {} deleted {} files", user.username, removed);
        if !failed.is_empty() {
            return Err(ApplicationError::InternalError(format!(
                "Could not delete blobs: {:?}",
                failed
            )));
        }
        Ok(StatusCode::NO_CONTENT)
    }
}

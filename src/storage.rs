use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;

/// The resume formats accepted for upload, with the content type the
/// presigned URL is constrained to.
const ALLOWED_RESUME_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
];

/// Maps a resume filename to its constrained (extension, content type) pair.
/// Anything outside the allowed set is rejected before any URL is signed.
pub fn resume_content_type(filename: &str) -> Option<(&'static str, &'static str)> {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)?
        .to_ascii_lowercase();
    ALLOWED_RESUME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .copied()
}

/// StorageService
///
/// Contract for the resume blob store. The application only ever issues
/// short-lived presigned PUT URLs and records the resulting object key on
/// the seeker's profile; the store itself is opaque.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Ensures the resume bucket exists. Used in the `Env::Local` setup to
    /// provision the bucket in MinIO. No-op in production.
    async fn ensure_bucket_exists(&self);

    /// Generates a temporary signed URL allowing a seeker to upload their
    /// resume directly to the bucket, constrained to the given content type.
    async fn presign_resume_upload(&self, key: &str, content_type: &str)
    -> Result<String, String>;
}

/// StorageState
///
/// The concrete type used to share the storage service across the
/// application state.
pub type StorageState = Arc<dyn StorageService>;

/// S3ResumeStore
///
/// The real implementation over any S3-compatible endpoint (MinIO locally).
/// `force_path_style(true)` is required for MinIO compatibility.
#[derive(Clone)]
pub struct S3ResumeStore {
    client: s3::Client,
    bucket_name: String,
}

impl S3ResumeStore {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3ResumeStore {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket is idempotent, safe to call at every startup.
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn presign_resume_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String> {
        // Ten-minute expiry keeps the window small.
        let expires_in = Duration::from_secs(600);

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            // The client request must carry this Content-Type header, so an
            // allowed-extension check upstream also constrains the payload.
            .content_type(content_type)
            .presigned(
                PresigningConfig::expires_in(expires_in)
                    .map_err(|e| format!("invalid presign expiry: {e}"))?,
            )
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }
}

/// Strips directory navigation components from a user-influenced key
/// segment before it reaches the bucket.
fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockStorageService
///
/// In-memory stand-in used by the test suite so handler logic can be
/// exercised without a network connection to S3.
#[derive(Clone)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockStorageService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {
        // No-op in mock environment.
    }

    async fn presign_resume_upload(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }

        let sanitized_key = sanitize_key(key);
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitized_key
        ))
    }
}

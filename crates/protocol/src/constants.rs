//! Paths, header names and status codes used on the wire.

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1";

/// Path (relative to the API root) that opens a resumable upload session.
pub const RESUMABLE_UPLOAD_PATH: &str = "upload?uploadType=resumable";

/// Path (relative to the API root) under which operations are addressed.
pub const OPERATIONS_PATH: &str = "operations";

/// Chunk size used by the small-upload path (256 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// "Resume incomplete": the server kept part of the payload and wants more.
pub const STATUS_RESUME_INCOMPLETE: u16 = 308;

pub const HEADER_API_KEY: &str = "X-API-Key";
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_UPLOAD_ID: &str = "X-Upload-Id";
pub const HEADER_LOCATION: &str = "Location";
pub const HEADER_RANGE: &str = "Range";
pub const HEADER_CONTENT_RANGE: &str = "Content-Range";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";

pub const MIME_JSON: &str = "application/json";
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

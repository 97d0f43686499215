// Infrastructure modules
pub mod action;           // Remote action convention and response decoding
pub mod chunked_upload;   // Resumable attachment uploads
pub mod role_cache;       // LRU-backed role check decorator
pub mod router_transport; // In-process transport over an axum Router
pub mod traits;           // Collaborator traits

pub use action::{user_message, ActionRequest, ActionResponse, ErrorEntry, ResponseCodes};
pub use chunked_upload::{ChunkedUploader, FileReference, UploadSource};
pub use role_cache::CachingRoleChecker;
pub use router_transport::RouterTransport;
pub use traits::{ActionTransport, AttachmentUploader, RoleChecker};

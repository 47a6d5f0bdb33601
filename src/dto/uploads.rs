use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub image_url: String,
    pub file_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteUploadQuery {
    pub file_name: String,
}

use learnmart_core::serde::deserialize_optional_bool;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlDto {
    #[validate(length(min = 1, max = 512, message = "key must be between 1 and 512 characters"))]
    #[schema(example = "lectures/intro.mp4")]
    pub key: String,
    #[validate(length(min = 1, max = 255, message = "contentType must be between 1 and 255 characters"))]
    #[schema(example = "video/mp4")]
    pub content_type: Option<String>,
    pub is_public: Option<bool>,
    pub is_temp: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DownloadUrlParams {
    #[validate(length(min = 1, max = 512, message = "key must be between 1 and 512 characters"))]
    pub key: String,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    #[param(value_type = Option<bool>)]
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignedUrlResponse {
    pub url: String,
    /// Final object key; uploads are placed under `users/{id}/`.
    #[schema(example = "users/7f3c2a9e-0000-0000-0000-000000000000/lectures/intro.mp4")]
    pub key: String,
}

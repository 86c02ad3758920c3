// src/videos/validators.rs

use super::models::{CreateVideoRequest, UploadUrlRequest, Visibility};
use crate::common::{ValidationResult, Validator};

const MAX_TITLE_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 5000;
const MAX_FILE_NAME_LENGTH: usize = 255;

pub struct VideoValidator;

impl Validator<CreateVideoRequest> for VideoValidator {
    fn validate(&self, data: &CreateVideoRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.require("title", data.title.as_deref());
        result.max_len("title", data.title.as_deref(), MAX_TITLE_LENGTH);
        result.require("video_key", data.video_key.as_deref());
        result.max_len("description", data.description.as_deref(), MAX_DESCRIPTION_LENGTH);

        if let Some(visibility) = data.visibility.as_deref() {
            if visibility.parse::<Visibility>().is_err() {
                result.add_error("visibility", "must be one of public, private, unlisted");
            }
        }

        result
    }
}

pub struct UploadUrlValidator;

impl Validator<UploadUrlRequest> for UploadUrlValidator {
    fn validate(&self, data: &UploadUrlRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.require("file_name", data.file_name.as_deref());
        result.max_len("file_name", data.file_name.as_deref(), MAX_FILE_NAME_LENGTH);

        if let Some(content_type) = data.content_type.as_deref() {
            if !content_type.starts_with("video/") {
                result.add_error("content_type", "must be a video/* type");
            }
        }

        result
    }
}

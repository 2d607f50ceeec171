use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::job_description::ParsedJobDescription;
use crate::models::resume::ParsedResume;
use crate::models::user::User;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UploadResumeRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 50, message = "Resume text must be at least 50 characters"))]
    pub resume_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResumeResponse {
    pub resume_id: Uuid,
    pub parsed: ParsedResume,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UploadJobDescriptionRequest {
    #[validate(length(max = 255))]
    pub title: String,
    #[validate(length(min = 50, message = "Job description must be at least 50 characters"))]
    pub jd_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadJobDescriptionResponse {
    pub jd_id: Uuid,
    pub parsed: ParsedJobDescription,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FitScoreRequest {
    pub resume_id: Uuid,
    pub jd_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitScoreResponse {
    pub resume_id: Uuid,
    pub jd_id: Uuid,
    pub fit_score: i32,
}

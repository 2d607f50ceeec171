pub mod interview_dto;
pub mod profile_dto;

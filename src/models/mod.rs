pub mod answer;
pub mod job_description;
pub mod question;
pub mod report;
pub mod resume;
pub mod session;
pub mod user;

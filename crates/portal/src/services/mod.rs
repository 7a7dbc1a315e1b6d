// Services layer: business logic between the HTTP handlers and storage

pub mod profile;
pub mod submission;

pub use profile::{ProfileService, ProfileUpdateError};
pub use submission::{SubmissionService, SubmitError};

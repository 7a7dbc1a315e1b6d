// Thesis submission service
// Decision: Only upload metadata is recorded; file bytes are not stored

use anyhow::Result;
use std::sync::Arc;
use thesis_portal_core::{SelectedFile, UploadError, UploadPolicy};
use uuid::Uuid;

use crate::api::uploads::ThesisSubmission;
use crate::storage::{
    models::{CreateSubmissionRow, SubmissionRow},
    StorageBackend,
};

/// Why a submission was not recorded
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] UploadError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct SubmissionService {
    db: Arc<StorageBackend>,
    policy: UploadPolicy,
}

impl SubmissionService {
    pub fn new(db: Arc<StorageBackend>, policy: UploadPolicy) -> Self {
        Self { db, policy }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Validate the file against the upload policy and record it
    pub async fn submit(
        &self,
        user_id: Uuid,
        file: SelectedFile,
    ) -> Result<ThesisSubmission, SubmitError> {
        if let Err(e) = self.policy.validate(&file) {
            tracing::warn!(
                user_id = %user_id,
                file = %file.name,
                mime_type = %file.mime_type,
                size = file.size,
                "Thesis upload rejected: {}",
                e
            );
            return Err(e.into());
        }

        let row = self
            .db
            .create_submission(CreateSubmissionRow {
                user_id,
                file_name: file.name,
                mime_type: self.policy.mime_type.clone(),
                size_bytes: i64::try_from(file.size).map_err(anyhow::Error::from)?,
            })
            .await?;

        tracing::info!(
            user_id = %user_id,
            submission_id = %row.id,
            size = row.size_bytes,
            "Thesis uploaded"
        );

        Ok(Self::row_to_submission(row))
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<ThesisSubmission>> {
        let rows = self.db.list_submissions_for_user(user_id).await?;
        Ok(rows.into_iter().map(Self::row_to_submission).collect())
    }

    fn row_to_submission(row: SubmissionRow) -> ThesisSubmission {
        ThesisSubmission {
            id: row.id,
            file_name: row.file_name,
            mime_type: row.mime_type,
            size_bytes: row.size_bytes,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::CreateUserRow;
    use thesis_portal_core::upload::PDF_MIME_TYPE;

    const MIB: u64 = 1024 * 1024;

    async fn setup() -> (SubmissionService, Uuid) {
        let db = Arc::new(StorageBackend::in_memory());
        let user = db
            .create_user(CreateUserRow {
                email: "ana@uni.edu".to_string(),
                name: "Ana".to_string(),
                avatar_url: None,
                password_hash: None,
                auth_provider: None,
                auth_provider_id: None,
            })
            .await
            .unwrap();
        (SubmissionService::new(db, UploadPolicy::default()), user.id)
    }

    #[tokio::test]
    async fn test_submit_records_valid_pdf() {
        let (service, user_id) = setup().await;

        let submission = service
            .submit(user_id, SelectedFile::new("tesis.pdf", PDF_MIME_TYPE, 2 * MIB))
            .await
            .unwrap();
        assert_eq!(submission.file_name, "tesis.pdf");
        assert_eq!(submission.size_bytes, (2 * MIB) as i64);

        let listed = service.list(user_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, submission.id);
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_files_without_recording() {
        let (service, user_id) = setup().await;

        let err = service
            .submit(user_id, SelectedFile::new("tesis.pdf", PDF_MIME_TYPE, 6 * MIB))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Invalid(UploadError::TooLarge { .. })
        ));

        let err = service
            .submit(user_id, SelectedFile::new("tesis.docx", "application/msword", MIB))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Invalid(UploadError::InvalidType { .. })
        ));

        assert!(service.list(user_id).await.unwrap().is_empty());
    }
}

use crate::error::ClientError;
use crate::models::{ConsultationForm, ConsultationOutcome, Credential, PatientForm, TutorForm};
use crate::services::api_client::ApiClient;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub const CONSULTATIONS_PATH: &str = "/consultas/";
pub const TUTORS_PATH: &str = "/tutores/";
pub const PATIENTS_PATH: &str = "/pacientes/";

/// One-shot form submissions against the backend.
pub struct FormSubmitter {
    api: Arc<ApiClient>,
}

impl FormSubmitter {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// POST `body` to the API path `path`.
    ///
    /// Validation failures come back as [`ClientError::Backend`] whose
    /// payload keeps the per-field messages.
    pub async fn submit<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        credential: Option<&Credential>,
    ) -> Result<Value, ClientError> {
        let url = self.api.endpoint(path);
        self.api.post_json(&url, body, credential).await
    }

    /// Record a consultation and return the suggested diagnoses.
    pub async fn submit_consultation(
        &self,
        form: &ConsultationForm,
        credential: &Credential,
    ) -> Result<ConsultationOutcome, ClientError> {
        let url = self.api.endpoint(CONSULTATIONS_PATH);
        let outcome: ConsultationOutcome = self.api.post_json(&url, form, Some(credential)).await?;

        tracing::info!(
            patient_id = form.patient_id,
            consultation_id = ?outcome.id,
            suggestions = outcome.suspected_diagnoses.len(),
            "Consultation recorded"
        );

        Ok(outcome)
    }

    pub async fn submit_tutor(
        &self,
        form: &TutorForm,
        credential: &Credential,
    ) -> Result<Value, ClientError> {
        let created = self.submit(TUTORS_PATH, form, Some(credential)).await?;
        tracing::info!(tutor_id = ?created.get("id"), "Tutor registered");
        Ok(created)
    }

    pub async fn submit_patient(
        &self,
        form: &PatientForm,
        credential: &Credential,
    ) -> Result<Value, ClientError> {
        let created = self.submit(PATIENTS_PATH, form, Some(credential)).await?;
        tracing::info!(
            tutor_id = form.tutor_id,
            patient_id = ?created.get("id"),
            "Patient registered"
        );
        Ok(created)
    }
}

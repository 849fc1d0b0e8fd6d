use crate::models::Role;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use validator::Validate;

/// Account registration as submitted from the registration pages.
#[derive(Clone, Validate)]
pub struct RegistrationForm {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirmation: String,
    pub role: Role,
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Wire body of the registration endpoint.
#[derive(Serialize)]
pub(crate) struct RegistrationPayload<'a> {
    username: &'a str,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    password: &'a str,
    password2: &'a str,
    user_type: &'a str,
}

impl RegistrationForm {
    pub(crate) fn payload(&self) -> RegistrationPayload<'_> {
        RegistrationPayload {
            username: &self.username,
            email: &self.email,
            first_name: &self.first_name,
            last_name: &self.last_name,
            password: &self.password,
            password2: &self.password_confirmation,
            user_type: self.role.user_type(),
        }
    }
}

pub const ROUTINE_CONSULTATION: &str = "ROTINA";

/// A new consultation, submitted for diagnosis suggestions.
#[derive(Debug, Clone, Serialize)]
pub struct ConsultationForm {
    #[serde(rename = "paciente")]
    pub patient_id: i64,
    #[serde(rename = "veterinario_responsavel")]
    pub veterinarian_id: i64,
    #[serde(rename = "queixa_principal_tutor")]
    pub chief_complaint: String,
    #[serde(rename = "historico_doenca_atual")]
    pub illness_history: String,
    #[serde(rename = "sintomas_apresentados_ids")]
    pub symptom_ids: Vec<i64>,
    #[serde(rename = "tipo_consulta")]
    pub consultation_type: String,
    #[serde(rename = "temperatura_celsius", skip_serializing_if = "Option::is_none")]
    pub temperature_celsius: Option<String>,
}

impl ConsultationForm {
    pub fn routine(patient_id: i64, veterinarian_id: i64) -> Self {
        Self {
            patient_id,
            veterinarian_id,
            chief_complaint: String::new(),
            illness_history: String::new(),
            symptom_ids: Vec::new(),
            consultation_type: ROUTINE_CONSULTATION.to_string(),
            temperature_celsius: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsultationOutcome {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "diagnosticos_suspeitos", default)]
    pub suspected_diagnoses: Vec<DiagnosisSuggestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosisSuggestion {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "porcentagem", default)]
    pub percentage: Option<Value>,
}

impl DiagnosisSuggestion {
    /// `"Name (85%)"` when a percentage came back, otherwise the name.
    pub fn label(&self) -> String {
        match &self.percentage {
            Some(Value::String(percentage)) if !percentage.is_empty() => {
                format!("{} ({})", self.name, percentage)
            }
            Some(Value::Number(percentage)) => format!("{} ({})", self.name, percentage),
            _ => self.name.clone(),
        }
    }
}

/// A new tutor (pet owner).
///
/// `cpf` and `telefone` may arrive masked (`123.456.789-01`,
/// `(11) 98765-4321`); only their digits are sent.
#[derive(Debug, Clone, Serialize)]
pub struct TutorForm {
    #[serde(rename = "nome_completo")]
    pub full_name: String,
    #[serde(serialize_with = "digits_only")]
    pub cpf: String,
    pub email: String,
    #[serde(rename = "telefone", serialize_with = "digits_only")]
    pub phone: String,
    #[serde(rename = "endereco")]
    pub address: String,
}

/// A new patient, owned by an existing tutor.
///
/// Optional fields left blank are sent as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct PatientForm {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "especie")]
    pub species: String,
    #[serde(rename = "sexo")]
    pub sex: String,
    #[serde(rename = "tutor")]
    pub tutor_id: i64,
    #[serde(rename = "raca", serialize_with = "blank_as_null")]
    pub breed: Option<String>,
    #[serde(rename = "data_nascimento", serialize_with = "blank_as_null")]
    pub birth_date: Option<String>,
    #[serde(rename = "peso_kg", serialize_with = "blank_as_null")]
    pub weight_kg: Option<String>,
    #[serde(serialize_with = "blank_as_null")]
    pub microchip: Option<String>,
    #[serde(rename = "observacoes")]
    pub notes: String,
}

impl PatientForm {
    pub fn new(
        name: impl Into<String>,
        species: impl Into<String>,
        sex: impl Into<String>,
        tutor_id: i64,
    ) -> Self {
        Self {
            name: name.into(),
            species: species.into(),
            sex: sex.into(),
            tutor_id,
            breed: None,
            birth_date: None,
            weight_kg: None,
            microchip: None,
            notes: String::new(),
        }
    }
}

fn digits_only<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    serializer.serialize_str(&digits)
}

fn blank_as_null<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value.as_deref().filter(|value| !value.trim().is_empty()) {
        Some(value) => serializer.serialize_some(value),
        None => serializer.serialize_none(),
    }
}

/// Profile returned by the user endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserProfile {
    /// First name when set, else username.
    pub fn display_name(&self) -> Option<&str> {
        [self.first_name.as_deref(), self.username.as_deref()]
            .into_iter()
            .flatten()
            .find(|name| !name.trim().is_empty())
    }
}

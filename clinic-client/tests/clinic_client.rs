mod common;

use clinic_client::ClinicClient;
use clinic_client::config::{ApiSettings, SessionSettings, Settings};
use clinic_client::error::ClientError;
use clinic_client::models::{ConsultationForm, Credential, PatientForm, Role, TutorForm};
use clinic_client::session::{RecordingNavigator, SessionStore};
use common::{TestApp, jwt_expiring_at};
use std::sync::Arc;
use serde_json::json;
use service_core::retry::RetryConfig;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
        backoff_multiplier: 2.0,
        add_jitter: false,
    }
}

#[tokio::test]
async fn login_then_list_uses_the_session_token() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "acc", "refresh": "ref" })))
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/user/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "username": "ana" })))
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pacientes/"))
        .and(query_param("search", "Rex"))
        .and(header("authorization", "Bearer acc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1, "next": null, "previous": null, "results": [{"id": 7, "nome": "Rex"}]
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let mut client = app.client();
    client.login("ana", "s3cret-pass", Role::Staff).await.unwrap();

    let items = client
        .fetch_collection("dashboard", "pacientes", Some("Rex"))
        .await
        .expect("Listing failed");

    assert_eq!(items, vec![json!({"id": 7, "nome": "Rex"})]);
    assert_eq!(client.display_name().await.unwrap(), Some("ana".to_string()));
}

#[tokio::test]
async fn anonymous_listing_of_protected_page_is_denied_before_any_request() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&app.server)
        .await;

    let mut client = app.client();
    let result = client.fetch_collection("pacientes", "pacientes", None).await;

    assert!(matches!(result, Err(ClientError::AuthRequired { page }) if page == "pacientes"));
    assert_eq!(app.navigator.visits(), vec!["/".to_string()]);
}

#[tokio::test]
async fn anonymous_listing_from_public_page_is_allowed() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/especies/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "nome": "Canina"}])))
        .expect(1)
        .mount(&app.server)
        .await;

    let mut client = app.client();
    let items = client
        .fetch_collection("registro-cliente", "especies", None)
        .await
        .expect("Listing failed");

    assert_eq!(items.len(), 1);
    assert!(app.navigator.visits().is_empty());
}

#[tokio::test]
async fn rejected_credential_signs_the_session_out() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pacientes/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Given token not valid for any token type"
        })))
        .mount(&app.server)
        .await;

    let mut client = app.client();
    client
        .session
        .establish_session(Credential::new("revoked", Role::Staff))
        .await
        .unwrap();

    let error = client
        .fetch_collection("dashboard", "pacientes", None)
        .await
        .expect_err("Listing should fail");

    assert!(error.is_unauthorized());
    assert!(!client.session.is_authenticated());
    assert!(app.store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn server_errors_keep_the_session() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/pacientes/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.server)
        .await;

    let mut client = app.client();
    client
        .session
        .establish_session(Credential::new("valid", Role::Staff))
        .await
        .unwrap();

    let result = client.fetch_collection("dashboard", "pacientes", None).await;

    assert!(matches!(result, Err(ClientError::Backend { .. })));
    assert!(client.session.is_authenticated());
}

#[tokio::test]
async fn retry_reruns_the_aggregation_after_a_transient_failure() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tutores/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tutores/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .expect(1)
        .mount(&app.server)
        .await;

    let mut client = app.client();
    client
        .session
        .establish_session(Credential::new("valid", Role::Manager))
        .await
        .unwrap();

    let items = client
        .fetch_collection_with_retry("dashboard", "tutores", None, &fast_retry())
        .await
        .expect("Retry did not recover");

    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn retry_gives_up_on_client_errors() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tutores/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "detail": "Forbidden" })))
        .expect(1)
        .mount(&app.server)
        .await;

    let mut client = app.client();
    client
        .session
        .establish_session(Credential::new("valid", Role::Staff))
        .await
        .unwrap();

    let result = client
        .fetch_collection_with_retry("dashboard", "tutores", None, &fast_retry())
        .await;

    assert_eq!(result.unwrap_err().status().map(|s| s.as_u16()), Some(403));
}

#[tokio::test]
async fn consultation_returns_suggested_diagnoses() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/consultas/"))
        .and(header("authorization", "Bearer valid"))
        .and(body_partial_json(json!({
            "paciente": 3,
            "veterinario_responsavel": 9,
            "sintomas_apresentados_ids": [1, 4],
            "tipo_consulta": "ROTINA"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 12,
            "diagnosticos_suspeitos": [
                { "id": 2, "nome": "Gastrite", "porcentagem": 85 },
                { "id": 5, "nome": "Parvovirose" }
            ]
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let mut client = app.client();
    client
        .session
        .establish_session(Credential::new("valid", Role::Staff))
        .await
        .unwrap();

    let mut form = ConsultationForm::routine(3, 9);
    form.symptom_ids = vec![1, 4];

    let outcome = client
        .submit_consultation(&form)
        .await
        .expect("Submission failed");

    assert_eq!(outcome.id, Some(12));
    let labels: Vec<String> = outcome.suspected_diagnoses.iter().map(|d| d.label()).collect();
    assert_eq!(labels, vec!["Gastrite (85)".to_string(), "Parvovirose".to_string()]);
}

#[tokio::test]
async fn consultation_requires_a_session() {
    let app = TestApp::spawn().await;

    let mut client = app.client();
    let result = client.submit_consultation(&ConsultationForm::routine(3, 9)).await;

    assert!(matches!(result, Err(ClientError::AuthRequired { .. })));
}

#[tokio::test]
async fn consultation_with_an_expired_token_is_not_sent() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
        .expect(0)
        .mount(&app.server)
        .await;

    let mut client = app.client();
    client
        .session
        .establish_session(Credential::new(jwt_expiring_at(1_000), Role::Staff))
        .await
        .unwrap();

    let result = client.submit_consultation(&ConsultationForm::routine(3, 9)).await;

    assert!(matches!(result, Err(ClientError::AuthRequired { page }) if page == "consulta"));
    assert!(!client.session.is_authenticated());
    assert!(app.store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn tutor_registration_sends_normalised_documents() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tutores/"))
        .and(header("authorization", "Bearer valid"))
        .and(body_json(json!({
            "nome_completo": "Carla Dias",
            "cpf": "12345678901",
            "email": "carla@clinic.example",
            "telefone": "11987654321",
            "endereco": "Rua A, 10"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 4, "nome_completo": "Carla Dias" })))
        .expect(1)
        .mount(&app.server)
        .await;

    let mut client = app.client();
    client
        .session
        .establish_session(Credential::new("valid", Role::Staff))
        .await
        .unwrap();

    let form = TutorForm {
        full_name: "Carla Dias".to_string(),
        cpf: "123.456.789-01".to_string(),
        email: "carla@clinic.example".to_string(),
        phone: "(11) 98765-4321".to_string(),
        address: "Rua A, 10".to_string(),
    };
    let created = client.register_tutor(&form).await.expect("Registration failed");

    assert_eq!(created["id"], 4);
}

#[tokio::test]
async fn patient_registration_sends_null_for_blank_fields() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/pacientes/"))
        .and(body_json(json!({
            "nome": "Rex",
            "especie": "Canina",
            "sexo": "M",
            "tutor": 4,
            "raca": null,
            "data_nascimento": "2021-03-14",
            "peso_kg": null,
            "microchip": null,
            "observacoes": ""
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 11, "nome": "Rex" })))
        .expect(1)
        .mount(&app.server)
        .await;

    let mut client = app.client();
    client
        .session
        .establish_session(Credential::new("valid", Role::Staff))
        .await
        .unwrap();

    let mut form = PatientForm::new("Rex", "Canina", "M", 4);
    form.breed = Some(String::new());
    form.birth_date = Some("2021-03-14".to_string());
    let created = client.register_patient(&form).await.expect("Registration failed");

    assert_eq!(created["id"], 11);
}

#[tokio::test]
async fn patient_field_errors_keep_the_session() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/pacientes/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "tutor": ["Invalid pk."] })))
        .mount(&app.server)
        .await;

    let mut client = app.client();
    client
        .session
        .establish_session(Credential::new("valid", Role::Staff))
        .await
        .unwrap();

    let error = client
        .register_patient(&PatientForm::new("Rex", "Canina", "M", 999))
        .await
        .expect_err("Registration should fail");

    assert_eq!(error.status().map(|s| s.as_u16()), Some(400));
    assert!(client.session.is_authenticated());
}

#[tokio::test]
async fn registration_requires_a_session() {
    let app = TestApp::spawn().await;

    let mut client = app.client();
    let result = client
        .register_patient(&PatientForm::new("Rex", "Canina", "M", 4))
        .await;

    assert!(matches!(result, Err(ClientError::AuthRequired { page }) if page == "novo-paciente"));
}

#[tokio::test]
async fn rejected_profile_lookup_signs_the_session_out() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/user/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token expired" })))
        .expect(1)
        .mount(&app.server)
        .await;

    let mut client = app.client();
    client
        .session
        .establish_session(Credential::new("revoked", Role::Staff))
        .await
        .unwrap();

    let error = client
        .display_name()
        .await
        .expect_err("Rejected credential should surface");

    assert!(error.is_unauthorized());
    assert!(!client.session.is_authenticated());
    assert!(app.store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn client_starts_anonymous_from_a_corrupt_session_file() {
    let app = TestApp::spawn().await;
    let dir = std::env::temp_dir().join(format!("clinic-client-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("session.json");
    std::fs::write(&path, "[1, 2").unwrap();

    let settings = Settings {
        api: ApiSettings::new(format!("{}{}", app.server.uri(), common::API_PREFIX)),
        pagination: Default::default(),
        session: SessionSettings {
            store_path: Some(path.clone()),
            ..Default::default()
        },
        telemetry: Default::default(),
    };

    let client = ClinicClient::from_settings(&settings, Arc::new(RecordingNavigator::default()))
        .await
        .expect("Client should start");

    assert!(!client.session.is_authenticated());
    assert!(!path.exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn logout_clears_everything_and_returns_to_entry_point() {
    let app = TestApp::spawn().await;

    let mut client = app.client();
    client
        .session
        .establish_session(Credential::new("valid", Role::Staff).with_display_name("Ana"))
        .await
        .unwrap();

    client.logout().await.unwrap();

    assert!(!client.session.is_authenticated());
    assert_eq!(client.display_name().await.unwrap(), None);
    assert!(app.store.load().await.unwrap().is_none());
    assert_eq!(app.navigator.visits(), vec!["/".to_string()]);
}

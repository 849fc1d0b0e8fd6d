pub mod credential;
pub mod forms;
pub mod page;

pub use credential::{Credential, Role};
pub use forms::{
    ConsultationForm, ConsultationOutcome, DiagnosisSuggestion, PatientForm, RegistrationForm,
    TutorForm, UserProfile,
};
pub use page::Page;

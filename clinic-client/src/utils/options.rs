use serde_json::Value;

/// One choice of a dropdown populated from an aggregated collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Build sorted choices from collection items.
///
/// The label is `nome_completo` (tutors, veterinarians) or `nome` (patients,
/// symptoms). Items without an `id` or a label are skipped.
pub fn select_options(items: &[Value]) -> Vec<SelectOption> {
    let mut options: Vec<SelectOption> = items
        .iter()
        .filter_map(|item| {
            let value = match item.get("id")? {
                Value::String(id) => id.clone(),
                Value::Number(id) => id.to_string(),
                _ => return None,
            };
            let label = ["nome_completo", "nome"]
                .iter()
                .filter_map(|field| item.get(*field).and_then(Value::as_str))
                .find(|label| !label.is_empty())?;

            Some(SelectOption {
                value,
                label: label.to_string(),
            })
        })
        .collect();

    options.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
    options
}

use cbt_flow::Template;

const BUILTIN: &[&str] = &[
    include_str!("../assets/templates/depression_phq9.json"),
    include_str!("../assets/templates/anxiety_gad7.json"),
    include_str!("../assets/templates/stress_coping.json"),
];

/// Templates shipped with the store and written on first use.
pub fn builtin_templates() -> Result<Vec<Template>, serde_json::Error> {
    BUILTIN
        .iter()
        .map(|raw| serde_json::from_str(raw))
        .collect()
}

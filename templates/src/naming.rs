use chrono::Local;

/// Generate a name for a configured step from its template type and the
/// current timestamp — unless a custom name was already provided. A name is
/// judged custom if it does not contain the template type.
pub fn update_name(template: &str, name: &str) -> String {
    if name.is_empty() || name.contains(template) {
        format!("{template}-{}", Local::now().format("%Y%m%d-%H%M%S"))
    } else {
        name.to_string()
    }
}

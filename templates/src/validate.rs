use modelmanager_registry::{RegistryError, Step, TemplateBuilder};

const PROBE_NAME: &str = "validation-probe";

/// Self-check for a template type before it ships in a registration table.
///
/// Verifies that a default instance serializes to a config carrying the
/// declared template name, that the builder reconstructs an instance from
/// that config, and that reconstruction is faithful: the rebuilt instance
/// must serialize to the identical config.
pub fn validate_template<T>(builder: TemplateBuilder) -> Result<(), RegistryError>
where
    T: Step + Default,
{
    let mut probe = T::default();
    if probe.name().is_empty() {
        probe.set_name(PROBE_NAME);
    }

    let config = probe.to_config()?;
    if config.template != probe.template() {
        return Err(RegistryError::TemplateMismatch {
            expected: probe.template().to_string(),
            found: config.template.clone(),
        });
    }
    config.validate()?;

    let rebuilt = builder(&config)?;
    let round_trip = rebuilt.to_config()?;
    if round_trip != config {
        return Err(RegistryError::Validation(format!(
            "template {:?} does not round-trip through its builder",
            probe.template()
        )));
    }
    Ok(())
}

use crate::config::Config;
use crate::error::{Result, TextlensError, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_api(config, &mut errors);
        Self::validate_render(config, &mut errors);
        Self::validate_export(config, &mut errors);
        Self::validate_report(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TextlensError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_api(config: &Config, errors: &mut Vec<ValidationError>) {
        let base_url = &config.api.base_url;
        match reqwest::Url::parse(base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError::new(
                "api.base_url",
                format!("Scheme must be http or https, got '{}'", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new(
                "api.base_url",
                format!("Invalid URL '{}': {}", base_url, e),
            )),
        }
    }

    fn validate_render(config: &Config, errors: &mut Vec<ValidationError>) {
        let limits = [
            ("render.word_frequency_limit", config.render.word_frequency_limit),
            ("render.pos_limit", config.render.pos_limit),
            ("render.keyword_limit", config.render.keyword_limit),
            ("render.ngram_limit", config.render.ngram_limit),
            ("render.label_width", config.render.label_width),
        ];

        for (path, value) in limits {
            if value == 0 {
                errors.push(ValidationError::new(path, "Must be greater than 0"));
            }
        }
    }

    fn validate_export(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.export.output_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "export.output_dir",
                "Output directory cannot be empty",
            ));
        }
    }

    fn validate_report(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.report.title.trim().is_empty() {
            errors.push(ValidationError::new(
                "report.title",
                "Report title cannot be empty",
            ));
        }
    }
}

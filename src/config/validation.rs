use crate::config::types::{
    AnalysisConfig, Config, FetchConfig, OutputConfig, PolitenessConfig, SiteConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_fetch_config(&config.fetch)?;
    validate_politeness_config(&config.politeness)?;
    validate_analysis_config(&config.analysis)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if !config.page_path.contains("{board}") || !config.page_path.contains("{page}") {
        return Err(ConfigError::Validation(format!(
            "page-path must contain {{board}} and {{page}} placeholders, got '{}'",
            config.page_path
        )));
    }

    if config.boards.is_empty() {
        return Err(ConfigError::Validation(
            "boards must list at least one board id".to_string(),
        ));
    }

    if let Some(board) = config.boards.iter().find(|b| b.as_str().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "board ids cannot be empty, got '{}'",
            board
        )));
    }

    if config.days_limit < 1 {
        return Err(ConfigError::Validation(
            "days-limit must be >= 1".to_string(),
        ));
    }

    if config.pages_per_board < 1 {
        return Err(ConfigError::Validation(
            "pages-per-board must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(
            "max-attempts must be >= 1".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "fetch timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agents.iter().all(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user-agents must contain at least one non-empty entry".to_string(),
        ));
    }

    if encoding_rs::Encoding::for_label(config.fallback_encoding.as_bytes()).is_none() {
        return Err(ConfigError::Validation(format!(
            "Unknown fallback-encoding '{}'",
            config.fallback_encoding
        )));
    }

    Ok(())
}

/// Validates delay ranges
fn validate_politeness_config(config: &PolitenessConfig) -> Result<(), ConfigError> {
    if config.page_delay_min_ms > config.page_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "page-delay-min-ms ({}) cannot exceed page-delay-max-ms ({})",
            config.page_delay_min_ms, config.page_delay_max_ms
        )));
    }

    if config.board_delay_min_ms > config.board_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "board-delay-min-ms ({}) cannot exceed board-delay-max-ms ({})",
            config.board_delay_min_ms, config.board_delay_max_ms
        )));
    }

    Ok(())
}

/// Validates analysis configuration
fn validate_analysis_config(config: &AnalysisConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid analysis base-url: {}", e)))?;

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "batch-size must be >= 1".to_string(),
        ));
    }

    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(
            "max-retries must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.posts_path.is_empty() {
        return Err(ConfigError::Validation(
            "posts-path cannot be empty".to_string(),
        ));
    }

    if config.table_path.is_empty() {
        return Err(ConfigError::Validation(
            "table-path cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

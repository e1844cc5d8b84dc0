use deploy_api::application::ApplicationSpec;
use thiserror::Error;

use super::deploy_configuration::ApplicationLimits;
use crate::storage::app_metadata::AppMetadata;

#[derive(Debug, Error, PartialEq)]
pub enum SanitizeError {
    #[error("Cores value incorrect: {0}")]
    CoresIncorrect(i32),
    #[error("Cores value over limit: {0} > {1}")]
    CoresOverLimit(i32, i32),
    #[error("Memory value incorrect: {0}")]
    MemoryIncorrect(i32),
    #[error("Memory value over limit: {0} > {1}")]
    MemoryOverLimit(i32, i32),
    #[error("Application identifier incorrect: {0:?}")]
    IdentifierIncorrect(String),
}

pub fn sanitize_application(
    app: &ApplicationSpec,
    limits: &ApplicationLimits,
) -> Result<(), SanitizeError> {
    if app.cores <= 0 {
        return Err(SanitizeError::CoresIncorrect(app.cores));
    } else if app.cores > limits.max_cores {
        return Err(SanitizeError::CoresOverLimit(app.cores, limits.max_cores));
    }

    if app.memory <= 0 {
        return Err(SanitizeError::MemoryIncorrect(app.memory));
    } else if app.memory > limits.max_app_mem {
        return Err(SanitizeError::MemoryOverLimit(app.memory, limits.max_app_mem));
    }

    AppMetadata::validate_identifier(&app.id)
        .map_err(|_| SanitizeError::IdentifierIncorrect(app.id.clone()))
}

#[cfg(test)]
mod test {
    use parameterized::parameterized;

    use super::{sanitize_application, SanitizeError};
    use crate::managers::deploy_configuration::ApplicationLimits;
    use crate::utils::test_utilities::create_example_application;

    const LIMITS: ApplicationLimits = ApplicationLimits {
        max_cores: 4,
        max_app_mem: 1024,
    };

    #[test]
    fn accepts_application_within_limits() {
        assert_eq!(
            sanitize_application(&create_example_application("app1"), &LIMITS),
            Ok(())
        );
    }

    #[test]
    fn accepts_exact_limits() {
        let mut app = create_example_application("app1");
        app.cores = 4;
        app.memory = 1024;
        assert_eq!(sanitize_application(&app, &LIMITS), Ok(()));
    }

    #[parameterized(input = {
        (0, SanitizeError::CoresIncorrect(0)),
        (-1, SanitizeError::CoresIncorrect(-1)),
        (8, SanitizeError::CoresOverLimit(8, 4)),
    })]
    fn rejects_cores(input: (i32, SanitizeError)) {
        let (cores, expected) = input;
        let mut app = create_example_application("app2");
        app.cores = cores;
        assert_eq!(sanitize_application(&app, &LIMITS), Err(expected));
    }

    #[parameterized(input = {
        (0, SanitizeError::MemoryIncorrect(0)),
        (-256, SanitizeError::MemoryIncorrect(-256)),
        (2048, SanitizeError::MemoryOverLimit(2048, 1024)),
    })]
    fn rejects_memory(input: (i32, SanitizeError)) {
        let (memory, expected) = input;
        let mut app = create_example_application("app2");
        app.memory = memory;
        assert_eq!(sanitize_application(&app, &LIMITS), Err(expected));
    }

    #[test]
    fn over_limit_message() {
        let mut app = create_example_application("app2");
        app.cores = 8;
        assert_eq!(
            sanitize_application(&app, &LIMITS).unwrap_err().to_string(),
            "Cores value over limit: 8 > 4"
        );
    }

    #[test]
    fn rejects_path_like_identifier() {
        let app = create_example_application("../app1");
        assert_eq!(
            sanitize_application(&app, &LIMITS),
            Err(SanitizeError::IdentifierIncorrect(String::from("../app1")))
        );
    }
}

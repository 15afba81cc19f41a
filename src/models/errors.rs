use thiserror::Error;

/// Service-level errors that can occur in business logic
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },
}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database connection failed")]
    ConnectionFailed,

    #[error("Item not found")]
    NotFound,

    #[error("AWS SDK error: {message}")]
    AwsSdk { message: String },

    #[error("Invalid stored item: {message}")]
    InvalidItem { message: String },

    #[error("Timeout occurred during operation")]
    Timeout,
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl ServiceError {
    /// Whether this error is a propagated storage not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ServiceError::Repository {
                source: RepositoryError::NotFound,
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = RepositoryError::NotFound;
        assert_eq!(error.to_string(), "Item not found");

        let error = RepositoryError::AwsSdk {
            message: "throttled".to_string(),
        };
        assert_eq!(error.to_string(), "AWS SDK error: throttled");
    }

    #[test]
    fn test_repository_error_propagates_unchanged() {
        let service_error: ServiceError = RepositoryError::NotFound.into();

        assert!(service_error.is_not_found());
        match service_error {
            ServiceError::Repository {
                source: RepositoryError::NotFound,
            } => {}
            _ => panic!("Expected NotFound to survive the conversion"),
        }
    }
}

//! Tipos de erro para o cliente da API de treinamento.
//!
//! Define [`ProviderError`] com variantes para throttling, conflitos de nome,
//! jobs inexistentes, erros da API e erros de rede. Usa `thiserror` para
//! derivar `Display` e `Error` a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao interagir com a API de treinamento.
///
/// Apenas [`Throttled`](ProviderError::Throttled), erros 5xx e falhas de rede
/// são considerados transitórios (ver [`ProviderError::is_transient`]).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// O servidor retornou HTTP 429.
    #[error("throttled, retry after {retry_after_ms}ms")]
    Throttled { retry_after_ms: u64 },

    /// Já existe um job com o mesmo nome (HTTP 409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// O job consultado não existe (HTTP 404).
    #[error("job not found: {0}")]
    NotFound(String),

    /// Qualquer outro erro HTTP (ex.: 400 parâmetro inválido, 500 erro interno).
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// O endpoint configurado não é uma URL base utilizável.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl ProviderError {
    /// Indica se vale a pena repetir a mesma chamada depois de um intervalo.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Throttled { .. } | ProviderError::NetworkError(_) => true,
            ProviderError::ApiError { status, .. } => *status >= 500,
            ProviderError::Conflict(_)
            | ProviderError::NotFound(_)
            | ProviderError::InvalidEndpoint(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttled_display() {
        let err = ProviderError::Throttled {
            retry_after_ms: 5000,
        };
        assert_eq!(err.to_string(), "throttled, retry after 5000ms");
    }

    #[test]
    fn api_error_display() {
        let err = ProviderError::ApiError {
            status: 400,
            message: "Invalid base model identifier".into(),
        };
        assert_eq!(
            err.to_string(),
            "API error (status 400): Invalid base model identifier"
        );
    }

    #[test]
    fn transient_classification() {
        assert!(ProviderError::Throttled { retry_after_ms: 1 }.is_transient());
        assert!(
            ProviderError::ApiError {
                status: 503,
                message: "unavailable".into()
            }
            .is_transient()
        );
        assert!(
            !ProviderError::ApiError {
                status: 400,
                message: "bad".into()
            }
            .is_transient()
        );
        assert!(!ProviderError::NotFound("job".into()).is_transient());
        assert!(!ProviderError::Conflict("job".into()).is_transient());
        assert!(!ProviderError::InvalidEndpoint("ftp:x".into()).is_transient());
    }
}

//! Configuração do fmops-tuner carregada a partir de `fmops-tuner.toml`.
//!
//! A struct [`TunerConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! Variáveis de ambiente têm precedência sobre o arquivo para segredos e endpoints.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::TunerError;
use crate::state_machine::RetryConfig;

pub const DEFAULT_CONFIG_FILE: &str = "fmops-tuner.toml";

/// Configuração de nível superior carregada de `fmops-tuner.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct TunerConfig {
    /// URL base da API de treinamento.
    #[serde(default = "default_provider_endpoint")]
    pub provider_endpoint: String,

    /// Token bearer para a API de treinamento.
    #[serde(default)]
    pub provider_token: String,

    /// URL da API de callback que recebe os relatórios de sucesso/falha.
    #[serde(default = "default_callback_endpoint")]
    pub callback_endpoint: String,

    /// Role assumida pelo provedor para ler os dados e gravar o modelo.
    #[serde(default)]
    pub role_arn: String,

    /// Região usada para montar o ARN do modelo base.
    #[serde(default = "default_region")]
    pub region: String,

    /// Espera fixa entre consultas de status, em segundos.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Limite opcional de ciclos de consulta. Ausente = sem limite.
    #[serde(default)]
    pub max_poll_cycles: Option<u32>,

    /// Máximo de retentativas para erros transitórios de consulta.
    #[serde(default = "default_poll_max_retries")]
    pub poll_max_retries: u32,

    /// Atraso base em milissegundos para backoff exponencial.
    #[serde(default = "default_poll_base_delay_ms")]
    pub poll_base_delay_ms: u64,

    /// Rejeita uma segunda mensagem Start para uma execução ainda em andamento.
    #[serde(default)]
    pub dedupe_starts: bool,
}

fn default_provider_endpoint() -> String {
    "https://bedrock.us-east-1.amazonaws.com".to_string()
}

fn default_callback_endpoint() -> String {
    "https://api.sagemaker.us-east-1.amazonaws.com".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

// Dez minutos entre consultas.
fn default_poll_interval_secs() -> u64 {
    600
}

fn default_poll_max_retries() -> u32 {
    3
}

fn default_poll_base_delay_ms() -> u64 {
    1000
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            provider_endpoint: default_provider_endpoint(),
            provider_token: String::new(),
            callback_endpoint: default_callback_endpoint(),
            role_arn: String::new(),
            region: default_region(),
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_cycles: None,
            poll_max_retries: default_poll_max_retries(),
            poll_base_delay_ms: default_poll_base_delay_ms(),
            dedupe_starts: false,
        }
    }
}

impl TunerConfig {
    /// Carrega `fmops-tuner.toml` do diretório atual, aplicando as variáveis de ambiente.
    pub fn load() -> Result<Self, TunerError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Carrega a configuração do caminho dado. Usa valores padrão se o arquivo não existir.
    pub fn load_from(path: &Path) -> Result<Self, TunerError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<TunerConfig>(&contents)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Sobrescreve campos a partir de variáveis de ambiente não vazias.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("TUNER_PROVIDER_TOKEN") {
            self.provider_token = v;
        }
        if let Some(v) = get("TUNER_PROVIDER_ENDPOINT") {
            self.provider_endpoint = v;
        }
        if let Some(v) = get("TUNER_CALLBACK_ENDPOINT") {
            self.callback_endpoint = v;
        }
        if let Some(v) = get("TUNER_ROLE_ARN") {
            self.role_arn = v;
        }
        if let Some(v) = get("AWS_DEFAULT_REGION") {
            self.region = v;
        }
    }

    /// Verifica as combinações que impediriam um workflow de rodar.
    pub fn validate(&self) -> Result<(), TunerError> {
        if self.role_arn.trim().is_empty() {
            return Err(TunerError::Config(
                "role_arn must be set (or TUNER_ROLE_ARN)".into(),
            ));
        }
        if self.provider_endpoint.trim().is_empty() || self.callback_endpoint.trim().is_empty() {
            return Err(TunerError::Config("endpoints must not be empty".into()));
        }
        if self.max_poll_cycles == Some(0) {
            return Err(TunerError::Config(
                "max_poll_cycles must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.poll_max_retries,
            base_delay_ms: self.poll_base_delay_ms,
        }
    }
}

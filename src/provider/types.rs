//! Tipos de dados para requisições e respostas da API de treinamento.
//!
//! Os nomes dos campos seguem o formato camelCase da API de
//! model-customization jobs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local de dados (entrada ou saída) de um job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataConfig {
    pub s3_uri: String,
}

impl DataConfig {
    pub fn new(s3_uri: impl Into<String>) -> Self {
        Self {
            s3_uri: s3_uri.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDataConfig {
    pub validators: Vec<DataConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Corpo da requisição de criação de um job de customização.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub job_name: String,
    pub custom_model_name: String,
    pub role_arn: String,
    pub base_model_identifier: String,
    pub training_data_config: DataConfig,
    pub validation_data_config: ValidationDataConfig,
    pub output_data_config: DataConfig,
    /// Hiperparâmetros como mapa de strings, conforme exigido pela API.
    pub hyper_parameters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_model_tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub job_arn: String,
}

/// Estado bruto de um job, exatamente como a API o reporta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RawJobStatus {
    InProgress,
    Completed,
    Failed,
    Stopping,
    Stopped,
    Other(String),
}

impl From<String> for RawJobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "InProgress" => RawJobStatus::InProgress,
            "Completed" => RawJobStatus::Completed,
            "Failed" => RawJobStatus::Failed,
            "Stopping" => RawJobStatus::Stopping,
            "Stopped" => RawJobStatus::Stopped,
            _ => RawJobStatus::Other(value),
        }
    }
}

impl From<&str> for RawJobStatus {
    fn from(value: &str) -> Self {
        RawJobStatus::from(value.to_string())
    }
}

impl From<RawJobStatus> for String {
    fn from(value: RawJobStatus) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RawJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawJobStatus::InProgress => write!(f, "InProgress"),
            RawJobStatus::Completed => write!(f, "Completed"),
            RawJobStatus::Failed => write!(f, "Failed"),
            RawJobStatus::Stopping => write!(f, "Stopping"),
            RawJobStatus::Stopped => write!(f, "Stopped"),
            RawJobStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Resposta completa da consulta de um job.
///
/// Os campos de saída só são preenchidos pela API depois que o job termina,
/// por isso são opcionais.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    pub job_name: String,
    pub job_arn: String,
    pub status: RawJobStatus,
    #[serde(default)]
    pub output_model_name: Option<String>,
    #[serde(default)]
    pub output_model_arn: Option<String>,
    #[serde(default)]
    pub base_model_arn: Option<String>,
    #[serde(default)]
    pub output_data_config: Option<DataConfig>,
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// Entrada resumida da listagem de jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub job_name: String,
    pub job_arn: String,
    pub status: RawJobStatus,
    #[serde(default)]
    pub creation_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobsResponse {
    #[serde(default)]
    pub model_customization_job_summaries: Vec<JobSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_status_parses_known_and_unknown_values() {
        assert_eq!(RawJobStatus::from("Stopped"), RawJobStatus::Stopped);
        assert_eq!(RawJobStatus::from("InProgress"), RawJobStatus::InProgress);
        assert_eq!(
            RawJobStatus::from("InService"),
            RawJobStatus::Other("InService".into())
        );
        assert_eq!(RawJobStatus::Other("InService".into()).to_string(), "InService");
    }

    #[test]
    fn create_request_uses_api_field_names() {
        let req = CreateJobRequest {
            job_name: "npc-TuningJob-1".into(),
            custom_model_name: "npc-1".into(),
            role_arn: "arn:aws:iam::123:role/tuner".into(),
            base_model_identifier: "arn:aws:bedrock:us-east-1::foundation-model/titan".into(),
            training_data_config: DataConfig::new("s3://b/train/data.jsonl"),
            validation_data_config: ValidationDataConfig {
                validators: vec![DataConfig::new("s3://b/val/data.jsonl")],
            },
            output_data_config: DataConfig::new("s3://b/1"),
            hyper_parameters: BTreeMap::from([("epochCount".to_string(), "2".to_string())]),
            custom_model_tags: vec![Tag {
                key: "ExecutionID".into(),
                value: "1".into(),
            }],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["jobName"], "npc-TuningJob-1");
        assert_eq!(json["trainingDataConfig"]["s3Uri"], "s3://b/train/data.jsonl");
        assert_eq!(
            json["validationDataConfig"]["validators"][0]["s3Uri"],
            "s3://b/val/data.jsonl"
        );
        assert_eq!(json["hyperParameters"]["epochCount"], "2");
        assert_eq!(json["customModelTags"][0]["key"], "ExecutionID");
    }

    #[test]
    fn job_details_deserialize_from_api_format() {
        let api_json = r#"{
            "jobName": "npc-TuningJob-1",
            "jobArn": "arn:aws:bedrock:us-east-1:123:model-customization-job/abc",
            "status": "Completed",
            "outputModelName": "npc-1",
            "outputModelArn": "arn:aws:bedrock:us-east-1:123:custom-model/npc-1",
            "baseModelArn": "arn:aws:bedrock:us-east-1::foundation-model/titan",
            "outputDataConfig": {"s3Uri": "s3://bucket/1"},
            "creationTime": "2024-05-01T10:00:00Z"
        }"#;
        let details: JobDetails = serde_json::from_str(api_json).unwrap();
        assert_eq!(details.status, RawJobStatus::Completed);
        assert_eq!(details.output_model_name.as_deref(), Some("npc-1"));
        assert_eq!(details.output_data_config.unwrap().s3_uri, "s3://bucket/1");
        assert!(details.failure_message.is_none());
        assert!(details.creation_time.is_some());
    }

    #[test]
    fn list_response_tolerates_missing_summaries() {
        let resp: ListJobsResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.model_customization_job_summaries.is_empty());
    }
}

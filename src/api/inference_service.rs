//! The `InferenceService` custom resource: how many replicas, what
//! resources, and what endpoint to expose for a ready `Model`.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Toleration;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum ServiceType {
    #[default]
    ClusterIP,
    NodePort,
    LoadBalancer,
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default, rename = "serviceType")]
    pub service_type: ServiceType,
}

fn default_port() -> u16 {
    8080
}

fn default_path() -> String {
    "/v1/chat/completions".to_string()
}

impl Default for EndpointSpec {
    fn default() -> Self {
        Self {
            port: default_port(),
            path: default_path(),
            service_type: ServiceType::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IsvcResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default)]
    pub gpu: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu_memory: Option<String>,
}

#[derive(Clone, CustomResource, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "llmkube.io",
    version = "v1alpha1",
    kind = "InferenceService",
    plural = "inferenceservices",
    shortname = "isvc",
    status = "InferenceServiceStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct InferenceServiceSpec {
    /// Name of a `Model` in the same namespace.
    pub model_ref: String,
    #[serde(default = "default_replicas")]
    pub replicas: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub endpoint: EndpointSpec,
    #[serde(default)]
    pub resources: IsvcResources,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerations: Option<Vec<Toleration>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,
}

fn default_replicas() -> i32 {
    1
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum InferenceServicePhase {
    #[default]
    Pending,
    Creating,
    Ready,
    Failed,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InferenceServiceStatus {
    #[serde(default)]
    pub phase: InferenceServicePhase,
    #[serde(default)]
    pub ready_replicas: i32,
    #[serde(default)]
    pub desired_replicas: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub model_ready: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl InferenceServiceSpec {
    pub fn validate(&self) -> Result<(), String> {
        if self.model_ref.trim().is_empty() {
            return Err("modelRef must not be empty".to_string());
        }
        if !(0..=10).contains(&self.replicas) {
            return Err(format!("replicas {} out of range [0,10]", self.replicas));
        }
        if !(1..=65535).contains(&(self.endpoint.port as i32)) {
            return Err(format!("port {} out of range [1,65535]", self.endpoint.port));
        }
        Ok(())
    }
}

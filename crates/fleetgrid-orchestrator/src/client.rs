//! Kubernetes REST client for fleet discovery and scaling.
//!
//! Pods are listed with a label selector; the replica count is read and
//! written through the deployment's scale subresource. The default base
//! URL targets a local `kubectl proxy`; direct in-cluster use sets a
//! bearer token instead.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{OrchestratorError, OrchestratorResult};

/// One instance as reported by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    /// Instance (pod) name; becomes the registry server id.
    pub name: String,
    /// Instance network address; empty while the pod has no IP yet.
    pub address: String,
    /// Lifecycle phase as reported (`Pending`, `Running`, ...).
    pub phase: String,
    /// Pod annotations, used for per-instance port/capacity overrides.
    pub annotations: HashMap<String, String>,
}

/// Operations the fleet consumes from its orchestrator.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// List instances matching the label selector in a namespace.
    async fn list_running_instances(
        &self,
        selector: &str,
        namespace: &str,
    ) -> OrchestratorResult<Vec<InstanceInfo>>;

    /// Current replica count of the fleet deployment.
    async fn replica_count(&self, deployment: &str, namespace: &str) -> OrchestratorResult<u32>;

    /// Set the fleet deployment's replica count.
    async fn set_replica_count(
        &self,
        deployment: &str,
        namespace: &str,
        replicas: u32,
    ) -> OrchestratorResult<()>;
}

/// Kubernetes implementation of [`Orchestrator`].
pub struct KubeOrchestrator {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl KubeOrchestrator {
    /// Create a client for the API server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> OrchestratorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Authenticate requests with a bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }
}

#[async_trait]
impl Orchestrator for KubeOrchestrator {
    async fn list_running_instances(
        &self,
        selector: &str,
        namespace: &str,
    ) -> OrchestratorResult<Vec<InstanceInfo>> {
        let path = format!("/api/v1/namespaces/{namespace}/pods");
        let resp = self
            .request(reqwest::Method::GET, &path)
            .query(&[("labelSelector", selector)])
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let pods: PodList = resp
            .json()
            .await
            .map_err(|e| OrchestratorError::Decode(e.to_string()))?;

        let instances = instances_from(pods);
        debug!(selector, namespace, count = instances.len(), "listed fleet pods");
        Ok(instances)
    }

    async fn replica_count(&self, deployment: &str, namespace: &str) -> OrchestratorResult<u32> {
        let path = scale_path(deployment, namespace);
        let resp = self.request(reqwest::Method::GET, &path).send().await?;
        let resp = check_status(resp).await?;
        let scale: Scale = resp
            .json()
            .await
            .map_err(|e| OrchestratorError::Decode(e.to_string()))?;
        Ok(scale.spec.replicas)
    }

    async fn set_replica_count(
        &self,
        deployment: &str,
        namespace: &str,
        replicas: u32,
    ) -> OrchestratorResult<()> {
        let path = scale_path(deployment, namespace);
        let body = serde_json::json!({ "spec": { "replicas": replicas } });
        let resp = self
            .request(reqwest::Method::PATCH, &path)
            .header("content-type", "application/merge-patch+json")
            .body(body.to_string())
            .send()
            .await?;
        check_status(resp).await?;
        debug!(deployment, namespace, replicas, "replica count patched");
        Ok(())
    }
}

fn scale_path(deployment: &str, namespace: &str) -> String {
    format!("/apis/apps/v1/namespaces/{namespace}/deployments/{deployment}/scale")
}

async fn check_status(resp: reqwest::Response) -> OrchestratorResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(OrchestratorError::Api {
        status: status.as_u16(),
        body,
    })
}

fn instances_from(pods: PodList) -> Vec<InstanceInfo> {
    pods.items
        .into_iter()
        .map(|pod| InstanceInfo {
            name: pod.metadata.name,
            address: pod.status.pod_ip.unwrap_or_default(),
            phase: pod.status.phase.unwrap_or_default(),
            annotations: pod.metadata.annotations,
        })
        .collect()
}

// Typed slices of the Kubernetes payloads; everything not consumed is
// ignored.

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: PodMetadata,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Deserialize)]
struct PodMetadata {
    name: String,
    #[serde(default)]
    annotations: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct PodStatus {
    #[serde(rename = "podIP")]
    pod_ip: Option<String>,
    phase: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Scale {
    spec: ScaleSpec,
}

#[derive(Debug, Default, Deserialize)]
struct ScaleSpec {
    #[serde(default)]
    replicas: u32,
}

//! Publishes the host agent's bound host:port into the cluster's
//! service-discovery object so in-cluster clients resolve to it exactly
//! as they would a pod-backed Service.

use k8s_openapi::api::core::v1::{Endpoints, EndpointAddress, EndpointPort, EndpointSubset};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;

use crate::agent::error::AgentError;

/// Idempotently create/update an `Endpoints` object named `service_name`
/// pointing at `(host_ip, port)`. The object must share its name with the
/// Service the reconciler already created so DNS resolution is transparent.
pub async fn publish(client: Client, namespace: &str, service_name: &str, host_ip: &str, port: u16) -> Result<(), AgentError> {
    let endpoints: Api<Endpoints> = Api::namespaced(client, namespace);

    let obj = Endpoints {
        metadata: ObjectMeta {
            name: Some(service_name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        subsets: Some(vec![EndpointSubset {
            addresses: Some(vec![EndpointAddress {
                ip: host_ip.to_string(),
                ..Default::default()
            }]),
            ports: Some(vec![EndpointPort {
                port: port as i32,
                ..Default::default()
            }]),
            ..Default::default()
        }]),
    };

    endpoints
        .patch(service_name, &PatchParams::apply("llmkube-agent"), &Patch::Apply(&obj))
        .await?;
    Ok(())
}

/// Remove the published endpoint, e.g. when the supervised process stops
/// for a declaration no longer present.
pub async fn retract(client: Client, namespace: &str, service_name: &str) -> Result<(), AgentError> {
    let endpoints: Api<Endpoints> = Api::namespaced(client, namespace);
    match endpoints.delete(service_name, &Default::default()).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Best-effort local IP auto-detection: the address this host would use to
/// reach the Kubernetes API, or `127.0.0.1` if that cannot be determined.
pub fn detect_host_ip() -> String {
    std::net::UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("10.0.0.1:53")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "127.0.0.1".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_host_ip_never_panics() {
        let ip = detect_host_ip();
        assert!(!ip.is_empty());
    }
}

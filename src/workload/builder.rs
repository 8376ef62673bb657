//! Translate a `(Model, InferenceService)` pair into a Service and, on the
//! containerized path, a Deployment. Pure function, no I/O: whether the
//! pod needs an init-stage downloader is passed in by the caller, which
//! already knows the cache state from the reconciler's own cache lookup.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, PersistentVolumeClaimVolumeSource, PodSpec,
    PodTemplateSpec, ResourceRequirements, Service, ServicePort, ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference};

use crate::api::{Accelerator, InferenceService, Model};
use crate::dns::sanitize;

use super::args::build_args;
use super::error::WorkloadError;
use super::tolerations;

pub const CACHE_MOUNT_PATH: &str = "/mnt/model-cache";
pub const CPU_IMAGE: &str = "ghcr.io/llmkube/llama-server:cpu";
pub const CUDA_IMAGE: &str = "ghcr.io/llmkube/llama-server:cuda";
pub const OWNER_LABEL: &str = "llmkube.io/inference-service";
pub const PATH_ANNOTATION: &str = "llmkube.io/path";

/// Everything the reconciler needs to apply for one `InferenceService`.
pub struct WorkloadSpec {
    pub service: Service,
    /// `None` on the Metal path — the host agent owns pod lifecycle there.
    pub deployment: Option<Deployment>,
    pub app_label: String,
}

/// Build the derived Service and (containerized path) Deployment for
/// `isvc`, whose `model_ref` resolves to `model`.
///
/// `model_cached` tells the builder whether the pod-local init downloader
/// is necessary: when `true` the init container is a no-op existence
/// check; when `false` it performs the real fetch for this pod.
pub fn build(
    model: &Model,
    isvc: &InferenceService,
    owner: OwnerReference,
    model_cached: bool,
) -> Result<WorkloadSpec, WorkloadError> {
    isvc.spec.validate().map_err(WorkloadError::InvalidSpec)?;

    let app_label = sanitize(&isvc.name_any());
    let service = build_service(isvc, &app_label, owner.clone());

    let deployment = if model.spec.hardware.accelerator == Accelerator::Metal {
        None
    } else {
        Some(build_deployment(model, isvc, &app_label, owner, model_cached)?)
    };

    Ok(WorkloadSpec {
        service,
        deployment,
        app_label,
    })
}

fn build_service(isvc: &InferenceService, app_label: &str, owner: OwnerReference) -> Service {
    let mut selector = BTreeMap::new();
    selector.insert("app".to_string(), app_label.to_string());

    let mut annotations = BTreeMap::new();
    annotations.insert(PATH_ANNOTATION.to_string(), isvc.spec.endpoint.path.clone());

    Service {
        metadata: ObjectMeta {
            name: Some(app_label.to_string()),
            namespace: isvc.namespace(),
            owner_references: Some(vec![owner]),
            labels: Some(selector.clone()),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some(service_type_str(isvc.spec.endpoint.service_type).to_string()),
            selector: Some(selector),
            ports: Some(vec![ServicePort {
                port: isvc.spec.endpoint.port as i32,
                target_port: Some(k8s_openapi::apimachinery::pkg::util::intstr::IntOrString::Int(
                    isvc.spec.endpoint.port as i32,
                )),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn service_type_str(t: crate::api::ServiceType) -> &'static str {
    use crate::api::ServiceType;
    match t {
        ServiceType::ClusterIP => "ClusterIP",
        ServiceType::NodePort => "NodePort",
        ServiceType::LoadBalancer => "LoadBalancer",
    }
}

fn build_deployment(
    model: &Model,
    isvc: &InferenceService,
    app_label: &str,
    owner: OwnerReference,
    model_cached: bool,
) -> Result<Deployment, WorkloadError> {
    let gpu_count = isvc.spec.resources.gpu;
    let gpu_requested = gpu_count > 0;

    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), app_label.to_string());
    labels.insert(OWNER_LABEL.to_string(), sanitize(&isvc.name_any()));

    let cache_key = model.status.as_ref().and_then(|s| s.cache_key.clone()).unwrap_or_default();
    let ext = "gguf";
    let cache_path = format!("{CACHE_MOUNT_PATH}/{cache_key}/model.{ext}");

    let image = isvc.spec.image.clone().unwrap_or_else(|| {
        if gpu_requested { CUDA_IMAGE.to_string() } else { CPU_IMAGE.to_string() }
    });

    let declared_layers = model
        .spec
        .hardware
        .gpu
        .as_ref()
        .map(|g| g.layers)
        .unwrap_or(-1);

    let args = build_args(&cache_path, isvc.spec.endpoint.port, gpu_requested, declared_layers);

    let mut resources = BTreeMap::new();
    if let Some(cpu) = &isvc.spec.resources.cpu {
        resources.insert("cpu".to_string(), Quantity(cpu.clone()));
    }
    if let Some(mem) = &isvc.spec.resources.memory {
        resources.insert("memory".to_string(), Quantity(mem.clone()));
    }
    if gpu_requested {
        resources.insert("nvidia.com/gpu".to_string(), Quantity(gpu_count.to_string()));
    }

    let volume_mounts = vec![VolumeMount {
        name: "model-cache".to_string(),
        mount_path: CACHE_MOUNT_PATH.to_string(),
        read_only: Some(true),
        ..Default::default()
    }];

    let main_container = Container {
        name: "inference-server".to_string(),
        image: Some(image),
        args: Some(args),
        ports: Some(vec![ContainerPort {
            container_port: isvc.spec.endpoint.port as i32,
            ..Default::default()
        }]),
        resources: Some(ResourceRequirements {
            requests: Some(resources.clone()),
            limits: Some(resources),
            ..Default::default()
        }),
        volume_mounts: Some(volume_mounts),
        ..Default::default()
    };

    let init_containers = (!model_cached).then(|| {
        vec![Container {
            name: "model-downloader".to_string(),
            image: Some(CPU_IMAGE.to_string()),
            command: Some(vec!["llmkube-operator".to_string(), "fetch-init".to_string()]),
            env: Some(vec![
                EnvVar { name: "LLMKUBE_SOURCE".to_string(), value: Some(model.spec.source.clone()), ..Default::default() },
                EnvVar { name: "LLMKUBE_DEST".to_string(), value: Some(cache_path.clone()), ..Default::default() },
            ]),
            volume_mounts: Some(vec![VolumeMount {
                name: "model-cache".to_string(),
                mount_path: CACHE_MOUNT_PATH.to_string(),
                read_only: Some(false),
                ..Default::default()
            }]),
            ..Default::default()
        }]
    });

    let tolerations = tolerations::merge(
        isvc.spec.tolerations.as_deref().unwrap_or(&[]),
        gpu_requested,
    );

    let pod_spec = PodSpec {
        containers: vec![main_container],
        init_containers,
        tolerations: Some(tolerations),
        node_selector: isvc.spec.node_selector.clone(),
        volumes: Some(vec![Volume {
            name: "model-cache".to_string(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: crate::cache::PVC_NAME.to_string(),
                read_only: Some(true),
            }),
            ..Default::default()
        }]),
        ..Default::default()
    };

    Ok(Deployment {
        metadata: ObjectMeta {
            name: Some(app_label.to_string()),
            namespace: isvc.namespace(),
            owner_references: Some(vec![owner]),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(isvc.spec.replicas),
            selector: LabelSelector {
                match_labels: Some({
                    let mut m = BTreeMap::new();
                    m.insert("app".to_string(), app_label.to_string());
                    m
                }),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta { labels: Some(labels), ..Default::default() }),
                spec: Some(pod_spec),
            },
            ..Default::default()
        }),
        ..Default::default()
    })
}

use kube::ResourceExt;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Accelerator, EndpointSpec, GpuSpec, HardwareSpec, InferenceServiceSpec, IsvcResources, ModelSpec, ModelStatus};
    use kube::Resource;

    fn owner_ref() -> OwnerReference {
        OwnerReference {
            api_version: "llmkube.io/v1alpha1".to_string(),
            kind: "InferenceService".to_string(),
            name: "x".to_string(),
            uid: "uid".to_string(),
            ..Default::default()
        }
    }

    fn model(accelerator: Accelerator, layers: i64) -> Model {
        let mut m = Model::new("tinyllama", ModelSpec {
            source: "https://example.invalid/tinyllama.gguf".to_string(),
            hardware: HardwareSpec {
                accelerator,
                gpu: Some(GpuSpec { enabled: true, count: 1, layers, ..Default::default() }),
            },
            ..Default::default()
        });
        m.meta_mut().namespace = Some("default".to_string());
        m.status = Some(ModelStatus {
            cache_key: Some("abcdef0123456789".to_string()),
            ..Default::default()
        });
        m
    }

    fn isvc(name: &str, gpu: u8) -> InferenceService {
        let mut svc = InferenceService::new(name, InferenceServiceSpec {
            model_ref: "tinyllama".to_string(),
            replicas: 1,
            image: None,
            endpoint: EndpointSpec::default(),
            resources: IsvcResources { gpu, cpu: Some("500m".to_string()), memory: Some("1Gi".to_string()), gpu_memory: None },
            tolerations: None,
            node_selector: None,
        });
        svc.meta_mut().namespace = Some("default".to_string());
        svc
    }

    #[test]
    fn cpu_path_has_no_gpu_toleration_or_request() {
        let model = model(Accelerator::Cpu, -1);
        let isvc = isvc("tinyllama", 0);
        let spec = build(&model, &isvc, owner_ref(), true).unwrap();
        let deployment = spec.deployment.unwrap();
        let pod = deployment.spec.unwrap().template.spec.unwrap();
        assert!(pod.tolerations.unwrap_or_default().is_empty());
        assert_eq!(spec.service.metadata.name.as_deref(), Some("tinyllama"));
    }

    #[test]
    fn service_carries_path_annotation() {
        let model = model(Accelerator::Cpu, -1);
        let isvc = isvc("tinyllama", 0);
        let spec = build(&model, &isvc, owner_ref(), true).unwrap();
        let annotations = spec.service.metadata.annotations.unwrap();
        assert_eq!(annotations.get(PATH_ANNOTATION).map(String::as_str), Some("/v1/chat/completions"));
    }

    #[test]
    fn metal_accelerator_skips_deployment() {
        let model = model(Accelerator::Metal, -1);
        let isvc = isvc("tinyllama", 0);
        let spec = build(&model, &isvc, owner_ref(), true).unwrap();
        assert!(spec.deployment.is_none());
        assert_eq!(spec.service.metadata.name.as_deref(), Some("tinyllama"));
    }

    #[test]
    fn dotted_name_is_sanitized_everywhere() {
        let model = model(Accelerator::Cpu, -1);
        let isvc = isvc("llama-3.1-8b", 0);
        let spec = build(&model, &isvc, owner_ref(), true).unwrap();
        assert_eq!(spec.app_label, "llama-3-1-8b");
        assert_eq!(spec.service.metadata.name.as_deref(), Some("llama-3-1-8b"));
    }

    #[test]
    fn gpu_auto_layers_use_sentinel_and_toleration_present() {
        let model = model(Accelerator::Cuda, -1);
        let isvc = isvc("tinyllama", 1);
        let spec = build(&model, &isvc, owner_ref(), true).unwrap();
        let deployment = spec.deployment.unwrap();
        let pod = deployment.spec.unwrap().template.spec.unwrap();
        assert_eq!(pod.tolerations.unwrap().len(), 1);
        let args = pod.containers[0].args.clone().unwrap();
        let idx = args.iter().position(|a| a == "--n-gpu-layers").unwrap();
        assert_eq!(args[idx + 1], "99");
        assert_eq!(pod.containers[0].image.as_deref(), Some(CUDA_IMAGE));
    }

    #[test]
    fn init_container_present_only_when_not_cached() {
        let model = model(Accelerator::Cpu, -1);
        let isvc = isvc("tinyllama", 0);

        let cached = build(&model, &isvc, owner_ref(), true).unwrap();
        let pod = cached.deployment.unwrap().spec.unwrap().template.spec.unwrap();
        assert!(pod.init_containers.is_none());

        let uncached = build(&model, &isvc, owner_ref(), false).unwrap();
        let pod = uncached.deployment.unwrap().spec.unwrap().template.spec.unwrap();
        assert_eq!(pod.init_containers.unwrap().len(), 1);
    }

    #[test]
    fn rebuild_with_unchanged_inputs_is_byte_identical() {
        let model = model(Accelerator::Cuda, -1);
        let isvc = isvc("tinyllama", 1);
        let first = build(&model, &isvc, owner_ref(), true).unwrap();
        let second = build(&model, &isvc, owner_ref(), true).unwrap();
        assert_eq!(
            serde_json::to_string(&first.deployment).unwrap(),
            serde_json::to_string(&second.deployment).unwrap(),
        );
    }
}

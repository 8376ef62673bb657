//! llmkube-agent entry point: the host agent that supervises `llama-server`
//! on nodes with an accelerator (Metal) the cluster cannot schedule.

use std::path::PathBuf;

use clap::Parser;
use tracing::error;

use llmkube_operator::agent::{self, AgentConfig};
use llmkube_operator::config;
use llmkube_operator::telemetry::{init_logging, LogConfig};

#[derive(Debug, Parser)]
#[command(name = "llmkube-agent", version)]
struct Cli {
    /// Namespace this agent watches for InferenceService/Model declarations.
    #[arg(long, env = "LLMKUBE_NAMESPACE")]
    namespace: String,

    /// Local directory the agent stores fetched model artifacts in,
    /// independent of the in-cluster cache PVC.
    #[arg(long, env = "LLMKUBE_AGENT_MODEL_STORE", default_value = "/var/lib/llmkube-agent/models")]
    model_store: PathBuf,

    /// Host IP advertised in the published service endpoint. Auto-detected
    /// when unset.
    #[arg(long, env = "LLMKUBE_AGENT_HOST_IP")]
    host_ip: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let env_config = config::load();

    let log_config = LogConfig {
        format: env_config.log_format,
        level: env_config.log_level.clone(),
        output_path: None,
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let client = match kube::Client::try_default().await {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to build Kubernetes client");
            std::process::exit(1);
        }
    };

    let agent_config = AgentConfig {
        namespace: cli.namespace,
        model_store: cli.model_store,
        host_ip: cli.host_ip,
    };

    if let Err(e) = agent::run(client, agent_config).await {
        error!(error = %e, "llmkube-agent exited with error");
        std::process::exit(1);
    }
}

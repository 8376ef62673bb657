//! Main-container argument construction for the inference server.

/// `--n-gpu-layers` sentinel meaning "offload as many as the engine can".
/// The inference engine rejects `-1` directly, so an "auto" layer count on
/// the Model is translated to this value instead.
pub const AUTO_GPU_LAYERS_SENTINEL: i64 = 99;

/// Build the main container's argv: model path, bind address, port, and
/// (when GPU is requested) the layer-offload flag.
pub fn build_args(cache_path: &str, port: u16, gpu_requested: bool, declared_layers: i64) -> Vec<String> {
    let mut args = vec![
        "--model".to_string(),
        cache_path.to_string(),
        "--host".to_string(),
        "0.0.0.0".to_string(),
        "--port".to_string(),
        port.to_string(),
    ];

    if gpu_requested {
        let n = if declared_layers >= 0 {
            declared_layers.max(0)
        } else {
            AUTO_GPU_LAYERS_SENTINEL
        };
        args.push("--n-gpu-layers".to_string());
        args.push(n.to_string());
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_only_has_no_gpu_flag() {
        let args = build_args("/cache/abc/model.gguf", 8080, false, -1);
        assert!(!args.contains(&"--n-gpu-layers".to_string()));
    }

    #[test]
    fn auto_layers_use_sentinel_not_negative_one() {
        let args = build_args("/cache/abc/model.gguf", 8080, true, -1);
        let idx = args.iter().position(|a| a == "--n-gpu-layers").unwrap();
        assert_eq!(args[idx + 1], "99");
    }

    #[test]
    fn explicit_nonnegative_layers_pass_through() {
        let args = build_args("/cache/abc/model.gguf", 8080, true, 20);
        let idx = args.iter().position(|a| a == "--n-gpu-layers").unwrap();
        assert_eq!(args[idx + 1], "20");
    }

    #[test]
    fn port_and_model_path_are_present() {
        let args = build_args("/cache/abc/model.gguf", 9090, false, -1);
        assert!(args.contains(&"/cache/abc/model.gguf".to_string()));
        assert!(args.contains(&"9090".to_string()));
    }
}

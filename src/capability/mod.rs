//! Capability probe: detect the local accelerator and GPU inventory.
//!
//! Pure-observational. Spawns a platform-specific introspection tool and
//! parses its stdout; a missing tool means the capability is absent, never
//! an error. Called once at host agent startup.

use std::process::Command;

/// One detected backend and, where available, device details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Metal,
    Cuda,
    Rocm,
}

impl Backend {
    pub fn as_accelerator_str(&self) -> &'static str {
        match self {
            Backend::Metal => "metal",
            Backend::Cuda => "cuda",
            Backend::Rocm => "rocm",
        }
    }
}

/// Report produced by [`Capabilities::detect`].
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub metal: bool,
    pub cuda: bool,
    pub rocm: bool,
    pub gpu_name: Option<String>,
    pub gpu_core_count: Option<u32>,
    pub metal_version: Option<String>,
    pub os: String,
    pub arch: String,
}

impl Capabilities {
    /// Run the full probe for this host. Never fails: every platform tool is
    /// best-effort and its absence simply clears the corresponding flag.
    pub fn detect() -> Self {
        let os = std::env::consts::OS.to_string();
        let arch = std::env::consts::ARCH.to_string();

        let mut caps = Self {
            os,
            arch,
            ..Default::default()
        };

        if cfg!(target_os = "macos") {
            if let Some(output) = run_tool("system_profiler", &["SPDisplaysDataType"]) {
                caps.metal = output.contains("Metal");
                caps.gpu_name = extract_field(&output, "Chipset Model:");
                caps.metal_version = extract_field(&output, "Metal Support:");
            }
        }

        if let Some(output) = run_tool(
            "nvidia-smi",
            &["--query-gpu=name,count", "--format=csv,noheader"],
        ) {
            if let Some(first_line) = output.lines().next() {
                caps.cuda = true;
                caps.gpu_name = caps.gpu_name.or_else(|| first_line.split(',').next().map(str::trim).map(str::to_string));
            }
        }

        if let Some(output) = run_tool("rocm-smi", &["--showproductname"]) {
            caps.rocm = !output.trim().is_empty();
        }

        caps
    }

    /// Whether the declared accelerator is usable on this host.
    pub fn supports(&self, accelerator: crate::api::Accelerator) -> bool {
        use crate::api::Accelerator;
        match accelerator {
            Accelerator::Cpu => true,
            Accelerator::Metal => self.metal,
            Accelerator::Cuda => self.cuda,
            Accelerator::Rocm => self.rocm,
        }
    }
}

fn run_tool(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).into_owned())
}

fn extract_field(text: &str, label: &str) -> Option<String> {
    text.lines()
        .find(|line| line.trim_start().starts_with(label))
        .map(|line| line.trim_start().trim_start_matches(label).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_never_panics_and_reports_os() {
        let caps = Capabilities::detect();
        assert_eq!(caps.os, std::env::consts::OS);
        assert_eq!(caps.arch, std::env::consts::ARCH);
    }

    #[test]
    fn missing_tool_is_absent_not_error() {
        assert!(run_tool("definitely-not-a-real-binary-xyz", &[]).is_none());
    }

    #[test]
    fn cpu_is_always_supported() {
        let caps = Capabilities::default();
        assert!(caps.supports(crate::api::Accelerator::Cpu));
    }
}

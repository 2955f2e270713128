//! Logger setup for the binary

const LOUD_CRATES: [&str; 3] = ["naga", "wgpu_core", "wgpu_hal"];

/// Builds the filter string: `RUST_LOG` (or `info`), with the chatty GPU
/// crates capped at `warn` unless the user already set a level for them.
pub fn filters(rust_log: Option<&str>) -> String {
    let mut filters = rust_log.unwrap_or("info").to_owned();
    for loud_crate in LOUD_CRATES {
        if !filters.contains(&format!("{loud_crate}=")) {
            filters += &format!(",{loud_crate}=warn");
        }
    }
    filters
}

/// Installs `env_logger`. Safe to call more than once.
pub fn init() {
    let rust_log = std::env::var("RUST_LOG").ok();
    let _ = env_logger::Builder::new()
        .parse_filters(&filters(rust_log.as_deref()))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_quiet_gpu_crates() {
        assert_eq!(
            filters(None),
            "info,naga=warn,wgpu_core=warn,wgpu_hal=warn"
        );
    }

    #[test]
    fn test_user_levels_are_kept() {
        let f = filters(Some("debug,wgpu_core=trace"));
        assert!(f.starts_with("debug,wgpu_core=trace"));
        assert!(!f.contains("wgpu_core=warn"));
        assert!(f.contains("naga=warn"));
    }
}

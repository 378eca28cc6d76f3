//! The ready-made build and cache-warming templates.
//!
//! Both families are parameterized by platform identifier and share the
//! same VCS binding: the application repository checked out into a fixed
//! subdirectory, clean checkout on every run. The platform picks the
//! script prologue and keys the build cache, so Windows and Linux runs
//! never poison each other's caches.

use crate::platform::{script_header, Platform};
use crate::Config;

const REPO: &str = "App";
const CHECKOUT_DIR: &str = "app";
const EXECUTION_TIMEOUT_MINUTES: u32 = 120;

/// Directories persisted by the dependency cache, in publish order.
const CACHE_STORAGE_PATHS: &[&str] = &[
    "%agent.user.home%/.pixi",
    "%agent.user.home%/.cache/pixi",
];

fn cache_id(platform_os: &str) -> String {
    format!("App{}Cache", platform_os)
}

fn cache_name(platform_os: &str) -> String {
    format!("App {} Cache", platform_os)
}

fn setup_script(header: &str) -> String {
    format!("{}pixi --version\npixi run install-ci", header)
}

/// Adds the binary-build template for a platform.
///
/// Two steps, toolchain setup then the build itself, each prefixed with
/// the platform prologue. The cache is consumed but never published
/// here; publishing is the cache-warming template's job. Unrecognized
/// platform identifiers still produce a template, just without a
/// prologue.
pub fn build_template(config: &mut Config, platform_os: &str) {
    let header = script_header(platform_os);
    config
        .template(&format!("Build{}_Template", platform_os), platform_os)
        .vcs(REPO, CHECKOUT_DIR)
        .cache(&cache_id(platform_os), &cache_name(platform_os))
        .cache_publish(false)
        .step(
            "Set up toolchain",
            "setup_toolchain",
            CHECKOUT_DIR,
            &setup_script(&header),
        )
        .step(
            "Build binary",
            "build_binary",
            CHECKOUT_DIR,
            &format!("{}pixi run build", header),
        )
        .timeout_minutes(EXECUTION_TIMEOUT_MINUTES);
}

/// Adds the cache-warming template for a platform.
///
/// Populates the dependency cache from scratch: cache reuse is off so a
/// warming run always starts cold, and the storage paths are declared
/// explicitly. Runs setup then dependency instantiation; there is no
/// build step.
pub fn warm_cache_template(config: &mut Config, platform_os: &str) {
    let header = script_header(platform_os);
    config
        .template(&format!("WarmCache{}_Template", platform_os), platform_os)
        .vcs(REPO, CHECKOUT_DIR)
        .cache(&cache_id(platform_os), &cache_name(platform_os))
        .cache_use(false)
        .cache_paths(CACHE_STORAGE_PATHS)
        .step(
            "Set up toolchain",
            "setup_toolchain",
            CHECKOUT_DIR,
            &setup_script(&header),
        )
        .step(
            "Instantiate dependencies",
            "instantiate_deps",
            CHECKOUT_DIR,
            &format!("{}pixi run instantiate", header),
        );
}

/// The full standard configuration: a build template and a cache-warming
/// template for every supported platform.
///
/// ```rust
/// fn main() {
///     tcgen::templates::standard().emit();
/// }
/// ```
pub fn standard() -> Config {
    let mut config = Config::new();
    for platform in Platform::ALL {
        build_template(&mut config, platform.as_str());
        warm_cache_template(&mut config, platform.as_str());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(config: &Config) -> serde_json::Value {
        let mut buf = Vec::new();
        config.emit_to(&mut buf).unwrap();
        serde_json::from_slice(&buf).unwrap()
    }

    #[test]
    fn test_build_template_has_two_steps_in_order() {
        for platform in Platform::ALL {
            let mut config = Config::new();
            build_template(&mut config, platform.as_str());
            let json = emit(&config);

            let steps = json["templates"][0]["steps"].as_array().unwrap();
            assert_eq!(steps.len(), 2, "platform {}", platform);
            assert_eq!(steps[0]["name"], "Set up toolchain");
            assert_eq!(steps[1]["name"], "Build binary");
        }
    }

    #[test]
    fn test_build_template_timeout_is_120_minutes() {
        for platform in Platform::ALL {
            let mut config = Config::new();
            build_template(&mut config, platform.as_str());
            let json = emit(&config);

            assert_eq!(json["templates"][0]["timeout_minutes"], 120);
        }
    }

    #[test]
    fn test_build_template_consumes_but_never_publishes_cache() {
        let mut config = Config::new();
        build_template(&mut config, "Linux");
        let json = emit(&config);

        let cache = &json["templates"][0]["cache"];
        assert_eq!(cache["publish"], false);
        assert_eq!(cache["use"], true);
    }

    #[test]
    fn test_cache_is_keyed_by_platform() {
        let mut config = Config::new();
        build_template(&mut config, "Windows");
        build_template(&mut config, "Linux");
        let json = emit(&config);

        assert_eq!(json["templates"][0]["cache"]["id"], "AppWindowsCache");
        assert_eq!(json["templates"][1]["cache"]["id"], "AppLinuxCache");
    }

    #[test]
    fn test_linux_steps_carry_the_prologue() {
        let mut config = Config::new();
        build_template(&mut config, "Linux");
        let json = emit(&config);

        let header = script_header("Linux");
        for step in json["templates"][0]["steps"].as_array().unwrap() {
            let script = step["script"].as_str().unwrap();
            assert!(script.starts_with(&header), "step {}", step["name"]);
        }
    }

    #[test]
    fn test_windows_steps_have_no_prologue() {
        let mut config = Config::new();
        build_template(&mut config, "Windows");
        let json = emit(&config);

        for step in json["templates"][0]["steps"].as_array().unwrap() {
            let script = step["script"].as_str().unwrap();
            assert!(script.starts_with("pixi"), "step {}", step["name"]);
        }
    }

    #[test]
    fn test_warm_cache_template_runs_setup_then_instantiate() {
        for platform in Platform::ALL {
            let mut config = Config::new();
            warm_cache_template(&mut config, platform.as_str());
            let json = emit(&config);

            let steps = json["templates"][0]["steps"].as_array().unwrap();
            assert_eq!(steps.len(), 2, "platform {}", platform);
            assert_eq!(steps[0]["name"], "Set up toolchain");
            assert_eq!(steps[1]["name"], "Instantiate dependencies");
            assert!(steps[1]["script"]
                .as_str()
                .unwrap()
                .contains("pixi run instantiate"));
        }
    }

    #[test]
    fn test_warm_cache_template_starts_cold() {
        for platform in Platform::ALL {
            let mut config = Config::new();
            warm_cache_template(&mut config, platform.as_str());
            let json = emit(&config);

            let cache = &json["templates"][0]["cache"];
            assert_eq!(cache["use"], false, "platform {}", platform);
        }
    }

    #[test]
    fn test_warm_cache_template_declares_storage_paths() {
        let mut config = Config::new();
        warm_cache_template(&mut config, "Linux");
        let json = emit(&config);

        let paths = json["templates"][0]["cache"]["paths"].as_array().unwrap();
        assert_eq!(paths.len(), CACHE_STORAGE_PATHS.len());
        assert_eq!(paths[0], "%agent.user.home%/.pixi");
        assert_eq!(paths[1], "%agent.user.home%/.cache/pixi");
    }

    #[test]
    fn test_warm_cache_template_has_no_timeout() {
        let mut config = Config::new();
        warm_cache_template(&mut config, "Linux");
        let json = emit(&config);

        assert!(json["templates"][0].get("timeout_minutes").is_none());
    }

    #[test]
    fn test_vcs_binding_is_fixed_and_clean() {
        let mut config = Config::new();
        build_template(&mut config, "Windows");
        warm_cache_template(&mut config, "Windows");
        let json = emit(&config);

        for template in json["templates"].as_array().unwrap() {
            assert_eq!(template["vcs"]["repo"], "App");
            assert_eq!(template["vcs"]["checkout_path"], "app");
            assert_eq!(template["vcs"]["clean_checkout"], true);
        }
    }

    #[test]
    fn test_standard_has_one_pair_per_platform() {
        let json = emit(&standard());

        let names: Vec<_> = json["templates"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "BuildWindows_Template",
                "WarmCacheWindows_Template",
                "BuildLinux_Template",
                "WarmCacheLinux_Template",
            ]
        );
    }

    #[test]
    fn test_unknown_platform_degrades_to_empty_prologue() {
        let mut config = Config::new();
        build_template(&mut config, "FreeBSD");
        let json = emit(&config);

        assert_eq!(json["templates"][0]["name"], "BuildFreeBSD_Template");
        let script = json["templates"][0]["steps"][0]["script"].as_str().unwrap();
        assert!(script.starts_with("pixi"));
    }
}

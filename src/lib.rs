//! Tcgen - CI build templates defined in Rust instead of Kotlin DSL
//!
//! # Simple usage
//!
//! ```rust
//! use tcgen::Config;
//!
//! fn main() {
//!     let mut c = Config::new();
//!     c.template("BuildLinux_Template", "Linux")
//!         .vcs("App", "app")
//!         .step("Build binary", "build_binary", "app", "pixi run build")
//!         .timeout_minutes(120);
//!     c.emit();
//! }
//! ```
//!
//! # With a platform-keyed cache
//!
//! ```rust
//! use tcgen::Config;
//!
//! fn main() {
//!     let mut c = Config::new();
//!     c.template("WarmCacheLinux_Template", "Linux")
//!         .vcs("App", "app")
//!         .cache("AppLinuxCache", "App Linux Cache")
//!         .cache_use(false)
//!         .cache_publish(false)
//!         .cache_paths(&["%agent.user.home%/.pixi"])
//!         .step("Set up toolchain", "setup_toolchain", "app", "pixi run install-ci");
//!     c.emit();
//! }
//! ```
//!
//! The ready-made build and cache-warming templates live in [`templates`];
//! [`templates::standard`] returns all of them, one pair per platform.

use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub mod platform;
pub mod templates;

pub use platform::{script_header, Platform};

// =============================================================================
// TEMPLATE DATA
// =============================================================================

#[derive(Clone)]
struct VcsData {
    repo: String,
    checkout_path: String,
    clean_checkout: bool,
}

#[derive(Clone)]
struct CacheData {
    id: String,
    name: String,
    publish: bool,
    use_cache: bool,
    paths: Vec<String>,
}

#[derive(Clone)]
struct StepData {
    name: String,
    id: String,
    working_dir: String,
    script: String,
}

#[derive(Clone, Default)]
struct TemplateData {
    name: String,
    platform: String,
    vcs: Option<VcsData>,
    cache: Option<CacheData>,
    steps: Vec<StepData>,
    timeout_minutes: Option<u32>,
}

// =============================================================================
// TEMPLATE
// =============================================================================

/// A build template under construction.
///
/// Handles borrow the [`Config`] they were created from; every method
/// mutates the template in place and returns the handle for chaining.
pub struct Template<'a> {
    config: &'a mut Config,
    index: usize,
}

impl<'a> Template<'a> {
    /// Binds the template to a VCS repository checked out into `checkout_path`.
    ///
    /// Checkouts are clean by default; see [`Template::dirty_checkout`].
    pub fn vcs(self, repo: &str, checkout_path: &str) -> Self {
        if repo.is_empty() {
            panic!("vcs repo cannot be empty");
        }
        if checkout_path.is_empty() {
            panic!("vcs checkout path cannot be empty");
        }
        self.config.templates[self.index].vcs = Some(VcsData {
            repo: repo.to_string(),
            checkout_path: checkout_path.to_string(),
            clean_checkout: true,
        });
        self
    }

    /// Keeps the previous checkout on the agent instead of wiping it.
    pub fn dirty_checkout(mut self) -> Self {
        match self.vcs_mut() {
            Some(vcs) => vcs.clean_checkout = false,
            None => panic!("dirty_checkout requires a vcs binding first"),
        }
        self
    }

    /// Attaches a build cache with the given id and display name.
    ///
    /// The cache is both published and reused unless overridden with
    /// [`Template::cache_publish`] / [`Template::cache_use`].
    pub fn cache(self, id: &str, name: &str) -> Self {
        if id.is_empty() {
            panic!("cache id cannot be empty");
        }
        self.config.templates[self.index].cache = Some(CacheData {
            id: id.to_string(),
            name: name.to_string(),
            publish: true,
            use_cache: true,
            paths: Vec::new(),
        });
        self
    }

    /// Controls whether this template publishes the cache after a run.
    pub fn cache_publish(mut self, publish: bool) -> Self {
        self.cache_mut("cache_publish").publish = publish;
        self
    }

    /// Controls whether this template reuses a previously published cache.
    pub fn cache_use(mut self, use_cache: bool) -> Self {
        self.cache_mut("cache_use").use_cache = use_cache;
        self
    }

    /// Declares the directories the cache persists, in order.
    pub fn cache_paths(mut self, paths: &[&str]) -> Self {
        if paths.iter().any(|p| p.is_empty()) {
            panic!("cache path cannot be empty");
        }
        self.cache_mut("cache_paths")
            .paths
            .extend(paths.iter().map(|p| p.to_string()));
        self
    }

    /// Appends a shell step. Steps execute in the order they are added.
    pub fn step(self, name: &str, id: &str, working_dir: &str, script: &str) -> Self {
        if name.is_empty() {
            panic!("step name cannot be empty");
        }
        if id.is_empty() {
            panic!("step id cannot be empty");
        }
        self.config.templates[self.index].steps.push(StepData {
            name: name.to_string(),
            id: id.to_string(),
            working_dir: working_dir.to_string(),
            script: script.to_string(),
        });
        self
    }

    /// Sets the execution timeout. The CI engine enforces it.
    pub fn timeout_minutes(self, minutes: u32) -> Self {
        if minutes == 0 {
            panic!("timeout must be at least one minute");
        }
        self.config.templates[self.index].timeout_minutes = Some(minutes);
        self
    }

    fn vcs_mut(&mut self) -> Option<&mut VcsData> {
        self.config.templates[self.index].vcs.as_mut()
    }

    fn cache_mut(&mut self, method: &str) -> &mut CacheData {
        match self.config.templates[self.index].cache.as_mut() {
            Some(cache) => cache,
            None => panic!("{} requires a cache first", method),
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// A set of build templates to hand to the CI engine.
pub struct Config {
    templates: Vec<TemplateData>,
}

impl Config {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Config {
            templates: Vec::new(),
        }
    }

    /// Starts a new template for the given platform.
    ///
    /// The platform identifier selects the script prologue via
    /// [`script_header`]; identifiers without a prologue are accepted
    /// and simply get none.
    pub fn template(&mut self, name: &str, platform_os: &str) -> Template<'_> {
        if name.is_empty() {
            panic!("template name cannot be empty");
        }
        if self.templates.iter().any(|t| t.name == name) {
            panic!("template {:?} already exists", name);
        }
        self.templates.push(TemplateData {
            name: name.to_string(),
            platform: platform_os.to_string(),
            ..Default::default()
        });
        let index = self.templates.len() - 1;
        Template {
            config: self,
            index,
        }
    }

    /// Emits the configuration as JSON if --emit flag is present.
    pub fn emit(&self) {
        if env::args().any(|arg| arg == "--emit") {
            if let Err(e) = self.emit_to(&mut io::stdout()) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
            std::process::exit(0);
        }
    }

    /// Writes the configuration JSON to the given writer.
    pub fn emit_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        // Validate
        for t in &self.templates {
            if t.steps.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("template {:?} has no steps", t.name),
                ));
            }
            for s in &t.steps {
                if s.script.is_empty() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("step {:?} in template {:?} has no script", s.name, t.name),
                    ));
                }
                if t.steps.iter().filter(|o| o.id == s.id).count() > 1 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("template {:?} has duplicate step id {:?}", t.name, s.id),
                    ));
                }
            }
        }

        tracing::debug!(templates = self.templates.len(), "emitting configuration");

        let output = JsonConfig {
            version: "1".to_string(),
            templates: self
                .templates
                .iter()
                .map(|t| JsonTemplate {
                    name: t.name.clone(),
                    platform: t.platform.clone(),
                    vcs: t.vcs.as_ref().map(|v| JsonVcs {
                        repo: v.repo.clone(),
                        checkout_path: v.checkout_path.clone(),
                        clean_checkout: v.clean_checkout,
                    }),
                    cache: t.cache.as_ref().map(|c| JsonCache {
                        id: c.id.clone(),
                        name: c.name.clone(),
                        publish: c.publish,
                        use_: c.use_cache,
                        paths: if c.paths.is_empty() {
                            None
                        } else {
                            Some(c.paths.clone())
                        },
                    }),
                    steps: t
                        .steps
                        .iter()
                        .map(|s| JsonStep {
                            name: s.name.clone(),
                            id: s.id.clone(),
                            working_dir: s.working_dir.clone(),
                            script: s.script.clone(),
                        })
                        .collect(),
                    timeout_minutes: t.timeout_minutes,
                })
                .collect(),
        };

        serde_json::to_writer(&mut *w, &output)?;
        writeln!(w)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// JSON SERIALIZATION
// =============================================================================

#[derive(Serialize)]
struct JsonConfig {
    version: String,
    templates: Vec<JsonTemplate>,
}

#[derive(Serialize)]
struct JsonTemplate {
    name: String,
    platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    vcs: Option<JsonVcs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache: Option<JsonCache>,
    steps: Vec<JsonStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_minutes: Option<u32>,
}

#[derive(Serialize)]
struct JsonVcs {
    repo: String,
    checkout_path: String,
    clean_checkout: bool,
}

#[derive(Serialize)]
struct JsonCache {
    id: String,
    name: String,
    publish: bool,
    #[serde(rename = "use")]
    use_: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    paths: Option<Vec<String>>,
}

#[derive(Serialize)]
struct JsonStep {
    name: String,
    id: String,
    working_dir: String,
    script: String,
}

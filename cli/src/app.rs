//! Application context: unified state passed to every command handler.
//!
//! `AppContext` owns the concrete infrastructure (filesystem, process runner,
//! service manager, config store) and the output settings. Registry clients
//! are created on demand by [`AppContext::connect`], because offline commands
//! must work without a reachable server.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::{Layout, Node, PollPolicy, SsmConfig};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::consul::{CONNECT_TIMEOUT, ConsulClient, ServerEndpoint};
use crate::infra::fs::OsFs;
use crate::infra::platform::detect_init_system;
use crate::infra::qan::QanClient;
use crate::infra::service_manager::PlatformServiceManager;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// Environment variable re-rooting every system path.
pub const ROOT_ENV: &str = "SSM_ROOT_DIR";

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `SSM_YES` env vars).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Server-side clients for one command invocation.
pub struct Remote {
    pub consul: ConsulClient,
    pub qan: QanClient,
    /// This client's identity in the registry.
    pub node: Node,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// System paths, re-rooted by `SSM_ROOT_DIR`.
    pub layout: Layout,
    pub fs: OsFs,
    pub runner: TokioCommandRunner,
    /// Service manager for the detected init system.
    pub manager: PlatformServiceManager,
    pub config_store: YamlConfigStore,
    /// Shadow-unit wait policy used by upgrades.
    pub poll: PollPolicy,
    /// When `true`, skip interactive prompts and use defaults.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// This function currently always succeeds; the `Result` leaves room for
    /// infrastructure that can fail to initialise.
    pub async fn new(flags: &AppFlags) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("SSM_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        let layout = match std::env::var(ROOT_ENV) {
            Ok(root) if !root.is_empty() => Layout::new(root),
            _ => Layout::default(),
        };
        let runner = TokioCommandRunner::new();
        let init = detect_init_system(&runner, &layout).await;
        tracing::debug!(%init, root = %layout.root().display(), "platform detected");

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            manager: PlatformServiceManager::new(init, layout.clone(), runner, OsFs),
            config_store: YamlConfigStore::from_env(&layout),
            layout,
            fs: OsFs,
            runner,
            poll: PollPolicy::default(),
            non_interactive,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Progress reporter for application services; silent in JSON mode.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        match self.mode {
            OutputMode::Human => TerminalReporter::new(&self.output),
            OutputMode::Json => TerminalReporter::silent(&self.output),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read.
    pub fn load_config(&self) -> Result<SsmConfig> {
        self.config_store.load()
    }

    /// Build the server clients and verify the server before use.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingSetting` when the client is not
    /// configured, or a `ConnectivityError` when the server check fails.
    pub async fn connect(&self, config: &SsmConfig) -> Result<Remote> {
        let node = config.node()?;
        let endpoint = ServerEndpoint::new(config, CONNECT_TIMEOUT)?;
        let consul = ConsulClient::new(endpoint.clone());
        consul.verify(config).await?;
        Ok(Remote {
            consul,
            qan: QanClient::new(endpoint),
            node,
        })
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `SSM_YES` env),
    /// returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}

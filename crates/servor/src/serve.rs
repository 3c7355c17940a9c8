//! Server startup: argument resolution, banner and browser launch.

use std::path::{Path, PathBuf};

use clap::Args;
use servor_config::{CliSettings, Config};
use servor_server::{Server, server_config_from_servor_config};

use crate::error::CliError;
use crate::network;
use crate::output::Output;

/// Arguments for serving a directory.
#[derive(Args, Debug)]
pub(crate) struct ServeArgs {
    /// Directory to serve (default: current directory).
    root: Option<PathBuf>,

    /// Document served for extensionless (route) requests (default: index.html).
    fallback: Option<String>,

    /// Port for static files (default: 8080).
    port: Option<u16>,

    /// Port for the live reload event stream (default: 5000).
    reload_port: Option<u16>,

    /// Path to configuration file (default: auto-discover servor.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Coalesce bursts of file changes for this many milliseconds.
    #[arg(long, value_name = "MS")]
    debounce: Option<u64>,

    /// Do not open a browser window.
    #[arg(long)]
    no_browser: bool,

    /// Disable live reload (no watcher, no reload port, no injected script).
    #[arg(long)]
    no_reload: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Build CLI settings from the arguments.
    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            host: self.host.clone(),
            port: self.port,
            reload_port: self.reload_port,
            root_dir: self.root.clone(),
            fallback: self.fallback.clone(),
            live_reload_enabled: self.no_reload.then_some(false),
            debounce_ms: self.debounce,
            open_browser: self.no_browser.then_some(false),
        }
    }

    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        let server_config = server_config_from_servor_config(&config);

        let server = Server::bind(server_config).await?;
        let port = server.local_addr()?.port();
        let reload_port = server.reload_addr().transpose()?.map(|addr| addr.port());

        print_banner(&output, &config, port, reload_port);

        if config.browser.open {
            open_browser(&output, &local_url(port));
        }

        server.run().await;

        Ok(())
    }
}

fn local_url(port: u16) -> String {
    format!("https://localhost:{port}")
}

/// Root directory as shown to the user.
fn display_root(root: &Path) -> String {
    let cwd = std::env::current_dir().unwrap_or_default();
    let relative = root.strip_prefix(&cwd).unwrap_or(root);

    if relative.is_absolute() {
        relative.display().to_string()
    } else {
        let shown = relative.display().to_string();
        if shown.is_empty() || shown == "." {
            ".".to_owned()
        } else {
            format!("./{}", shown.trim_start_matches("./"))
        }
    }
}

fn print_banner(output: &Output, config: &Config, port: u16, reload_port: Option<u16>) {
    let root = display_root(&config.site_resolved.root_dir);

    output.blank();
    output.banner(
        "serving",
        &format!("files from {root} on {}", local_url(port)),
    );
    if let Some(&ip) = network::local_ipv4s().first() {
        output.banner(
            "network",
            &format!("exposed on {}", network::network_url(ip, port)),
        );
    }
    output.banner(
        "fallback",
        &format!(
            "using {} for route requests",
            config.site_resolved.fallback
        ),
    );
    if let Some(reload_port) = reload_port {
        output.banner(
            "reload",
            &format!("reloading the browser when files under {root} change (port {reload_port})"),
        );
    }
    output.blank();
}

/// Open the page in the default browser. Failure is not fatal.
fn open_browser(output: &Output, url: &str) {
    if let Err(err) = open::that_detached(url) {
        output.warning(&format!("Could not open browser at {url}: {err}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ServeArgs,
    }

    fn parse(args: &[&str]) -> ServeArgs {
        TestCli::try_parse_from(std::iter::once("servor").chain(args.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_no_arguments_override_nothing() {
        let settings = parse(&[]).cli_settings();

        assert_eq!(settings.root_dir, None);
        assert_eq!(settings.fallback, None);
        assert_eq!(settings.port, None);
        assert_eq!(settings.reload_port, None);
        assert_eq!(settings.live_reload_enabled, None);
        assert_eq!(settings.open_browser, None);
    }

    #[test]
    fn test_positional_arguments_in_order() {
        let settings = parse(&["public", "app.html", "3000", "3001"]).cli_settings();

        assert_eq!(settings.root_dir, Some(PathBuf::from("public")));
        assert_eq!(settings.fallback.as_deref(), Some("app.html"));
        assert_eq!(settings.port, Some(3000));
        assert_eq!(settings.reload_port, Some(3001));
    }

    #[test]
    fn test_flags_mixed_with_positionals() {
        let settings = parse(&["--no-browser", "dist", "--no-reload"]).cli_settings();

        assert_eq!(settings.root_dir, Some(PathBuf::from("dist")));
        assert_eq!(settings.live_reload_enabled, Some(false));
        assert_eq!(settings.open_browser, Some(false));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = TestCli::try_parse_from(["servor", ".", "index.html", "not-a-port"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_debounce_and_host() {
        let settings = parse(&["--debounce", "150", "--host", "127.0.0.1"]).cli_settings();

        assert_eq!(settings.debounce_ms, Some(150));
        assert_eq!(settings.host.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn test_local_url() {
        assert_eq!(local_url(8080), "https://localhost:8080");
    }

    #[test]
    fn test_display_root_relative() {
        assert_eq!(display_root(Path::new("public")), "./public");
        assert_eq!(display_root(Path::new(".")), ".");
        assert_eq!(display_root(Path::new("./dist")), "./dist");
    }

    #[test]
    fn test_display_root_under_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(display_root(&cwd.join("site")), "./site");
        assert_eq!(display_root(&cwd), ".");
    }
}

//! Credential sources for the GitHub API
//!
//! The Authorization header is resolved once at startup by walking a chain of
//! [`CredentialSource`]s and then handed to the API client as an
//! [`Authorization`] value.

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::env;
use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::error::{MirrorError, Result};

/// A resolved `Authorization` header value
#[derive(Clone, PartialEq, Eq)]
pub struct Authorization(String);

impl Authorization {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Build the `token <pat>` form GitHub accepts for personal access tokens
    pub fn token(token: &str) -> Self {
        Self(format!("token {}", token))
    }

    pub fn header_value(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Authorization(<redacted>)")
    }
}

/// Something that may be able to produce an Authorization header
pub trait CredentialSource {
    /// Source name for logging
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the source is not available and the next one should
    /// be tried; `Err` means the source is available but broken.
    fn authorization_header(&self) -> Result<Option<String>>;
}

/// Operator-supplied shell script that prints the full header value
pub struct ScriptSource {
    path: PathBuf,
}

impl ScriptSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialSource for ScriptSource {
    fn name(&self) -> &'static str {
        "script"
    }

    fn authorization_header(&self) -> Result<Option<String>> {
        if !self.path.is_file() {
            debug!("No credential script at {}", self.path.display());
            return Ok(None);
        }

        let output = Command::new("sh").arg(&self.path).output()?;

        if !output.status.success() {
            return Err(MirrorError::Auth(format!(
                "credential script {} failed: {}",
                self.path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if value.is_empty() {
            return Err(MirrorError::Auth(format!(
                "credential script {} printed nothing",
                self.path.display()
            )));
        }

        Ok(Some(value))
    }
}

/// Personal access token from an environment variable
pub struct EnvironmentToken {
    var: String,
}

impl EnvironmentToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvironmentToken {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn authorization_header(&self) -> Result<Option<String>> {
        match env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => {
                let token = token.trim();
                if !token.starts_with("ghp_")
                    && !token.starts_with("gho_")
                    && !token.starts_with("ghs_")
                    && !token.starts_with("github_pat_")
                {
                    warn!("{} doesn't look like a GitHub token", self.var);
                }
                Ok(Some(Authorization::token(token).0))
            }
            _ => Ok(None),
        }
    }
}

/// Token from an authenticated GitHub CLI
pub struct GitHubCli;

impl CredentialSource for GitHubCli {
    fn name(&self) -> &'static str {
        "gh"
    }

    fn authorization_header(&self) -> Result<Option<String>> {
        let output = match Command::new("gh").args(["auth", "token"]).output() {
            Ok(output) => output,
            Err(e) => {
                debug!("GitHub CLI unavailable: {}", e);
                return Ok(None);
            }
        };

        if !output.status.success() {
            debug!(
                "GitHub CLI is not authenticated: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Ok(None);
        }

        Ok(Some(Authorization::token(&token).0))
    }
}

/// Interactive hidden prompt on the controlling terminal
pub struct Prompt;

impl CredentialSource for Prompt {
    fn name(&self) -> &'static str {
        "prompt"
    }

    fn authorization_header(&self) -> Result<Option<String>> {
        if !io::stdin().is_terminal() {
            return Ok(None);
        }

        let mut stderr = io::stderr();
        write!(stderr, "github token: ")?;
        stderr.flush()?;

        let token = read_hidden_line();
        writeln!(stderr)?;

        let token = token?;
        if token.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(Authorization::token(token.trim()).0))
    }
}

/// Read one line without echo; raw mode is always restored
fn read_hidden_line() -> io::Result<String> {
    terminal::enable_raw_mode()?;
    let result = read_keys();
    terminal::disable_raw_mode()?;
    result
}

fn read_keys() -> io::Result<String> {
    let mut line = String::new();

    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Enter => return Ok(line),
            KeyCode::Backspace => {
                line.pop();
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "token prompt cancelled"));
            }
            KeyCode::Char(c) => line.push(c),
            _ => {}
        }
    }
}

/// Build the source chain described by the configuration
pub fn sources_from_config(config: &AuthConfig) -> Vec<Box<dyn CredentialSource>> {
    let mut sources: Vec<Box<dyn CredentialSource>> = Vec::new();

    if let Some(script) = &config.script {
        sources.push(Box::new(ScriptSource::new(script)));
    }
    sources.push(Box::new(EnvironmentToken::new(&config.token_env)));
    if config.use_gh_cli {
        sources.push(Box::new(GitHubCli));
    }
    sources.push(Box::new(Prompt));

    sources
}

/// Ask each source in turn; the first one that answers wins
pub fn resolve_authorization(sources: &[Box<dyn CredentialSource>]) -> Result<Authorization> {
    for source in sources {
        if let Some(value) = source.authorization_header()? {
            info!("Using {} credentials", source.name());
            return Ok(Authorization::new(value));
        }
        debug!("Credential source {} had nothing", source.name());
    }

    Err(MirrorError::Auth(
        "set GITHUB_TOKEN, log in with `gh auth login`, or provide ~/.mirror-auth".to_string(),
    ))
}

//! Runtime configuration.
//!
//! Every setting comes from the environment (optionally through a `.env`
//! file) and can be overridden with a command-line flag.

use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use docdrop_relay::poll::DEFAULT_INTERVAL;
use docdrop_source::{DEFAULT_FTP_PORT, FtpSettings};
use docdrop_uploader::{TagSet, UploaderConfig, Url};

/// docdrop configuration, built once at startup.
#[derive(Clone, Parser)]
#[command(name = "docdrop", version, about)]
pub struct Config {
    /// FTP server host.
    #[arg(long, env = "FTP_HOST")]
    pub ftp_host: String,

    /// FTP server port.
    #[arg(long, env = "FTP_PORT", default_value_t = DEFAULT_FTP_PORT)]
    pub ftp_port: u16,

    /// FTP login user.
    #[arg(long, env = "FTP_USER", default_value = "anonymous")]
    pub ftp_user: String,

    /// FTP login password.
    #[arg(long, env = "FTP_PASS", default_value = "", hide_env_values = true)]
    pub ftp_pass: String,

    /// Directory watched on the FTP server.
    #[arg(long, env = "FTP_DIR", default_value = "/")]
    pub ftp_dir: String,

    /// Seconds allowed for the FTP connection to open.
    #[arg(long, env = "FTP_CONNECT_TIMEOUT", default_value_t = 30)]
    pub ftp_connect_timeout: u64,

    /// Read timeout in seconds on the FTP control connection.
    #[arg(long, env = "FTP_READ_TIMEOUT", default_value_t = 120)]
    pub ftp_read_timeout: u64,

    /// Document upload URL.
    #[arg(long, env = "HTTP_ENDPOINT")]
    pub http_endpoint: Url,

    /// Token sent as `Authorization: Token <value>`.
    #[arg(long, env = "HTTP_AUTH_TOKEN", hide_env_values = true)]
    pub http_auth_token: Option<String>,

    /// Seconds allowed for one upload request.
    #[arg(long, env = "HTTP_TIMEOUT", default_value_t = 300)]
    pub http_timeout: u64,

    /// Seconds to sleep between checks.
    #[arg(long, env = "SLEEP_DURATION", default_value_t = DEFAULT_INTERVAL.as_secs())]
    pub sleep_duration: u64,

    /// Comma-separated tags added to every document.
    #[arg(long, env = "TAGS", default_value = "")]
    pub tags: TagSet,

    /// Run a single cycle and exit.
    #[arg(long)]
    pub once: bool,
}

impl Config {
    /// Rejects settings that parse but cannot work.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ftp_host.trim().is_empty() {
            bail!("FTP_HOST must not be empty");
        }
        if !matches!(self.http_endpoint.scheme(), "http" | "https") {
            bail!(
                "HTTP_ENDPOINT must be an http or https URL, got {}",
                self.http_endpoint
            );
        }
        if self.sleep_duration == 0 {
            bail!("SLEEP_DURATION must be at least 1 second");
        }
        if self.ftp_connect_timeout == 0 || self.ftp_read_timeout == 0 || self.http_timeout == 0 {
            bail!("timeouts must be at least 1 second");
        }
        Ok(())
    }

    pub fn ftp_settings(&self) -> FtpSettings {
        FtpSettings {
            port: self.ftp_port,
            connect_timeout: Duration::from_secs(self.ftp_connect_timeout),
            read_timeout: Duration::from_secs(self.ftp_read_timeout),
            ..FtpSettings::new(&self.ftp_host, &self.ftp_user, &self.ftp_pass)
        }
    }

    pub fn uploader_config(&self) -> UploaderConfig {
        UploaderConfig {
            auth_token: self.http_auth_token.clone(),
            tags: self.tags.clone(),
            timeout: Duration::from_secs(self.http_timeout),
            ..UploaderConfig::new(self.http_endpoint.clone())
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sleep_duration)
    }
}

use std::default::Default;
use std::net::SocketAddr;

use crate::result::{Error, Result};

#[derive(Clone, Debug)]
pub(crate) struct Settings {
    pub(crate) ip: String,
    pub(crate) port: u16,
    /// Where the quiz generation service listens, e.g. `http://127.0.0.1:8000`.
    pub(crate) backend_url: String,
    pub(crate) max_upload_mb: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            ip: String::from("127.0.0.1"),
            port: 12716,
            backend_url: String::from("http://127.0.0.1:8000"),
            max_upload_mb: 20,
        }
    }
}

impl Settings {
    pub(crate) fn listen_addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    pub(crate) fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub(crate) fn check(&self) -> Result<()> {
        let addr = self.listen_addr();
        let _: SocketAddr = addr.parse().map_err(|_| {
            log::error!("Invalid listen address: {}", &addr);
            Error::ErrorWithMessage(format!("Invalid listen address: {}", addr))
        })?;
        let url = reqwest::Url::parse(&self.backend_url).map_err(|e| {
            log::error!("Invalid backend url {}: {}", &self.backend_url, e);
            Error::ErrorWithMessage(format!("Invalid backend url: {}", self.backend_url))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::ErrorWithMessage(format!(
                "Backend url must be http or https: {}",
                self.backend_url
            )));
        }
        if self.max_upload_mb == 0 {
            return Err(Error::ErrorWithMessage(String::from(
                "Upload limit must be at least 1 MB",
            )));
        }
        Ok(())
    }
}

pub(crate) fn from_args<I>(args: I) -> Result<Settings>
where
    I: IntoIterator<Item = String>,
{
    let mut s = Settings::default();
    let mut args = args.into_iter();
    while let Some(argument) = args.next() {
        let flag = argument.as_str();
        if !matches!(flag, "-ip" | "-port" | "-backend" | "-max-upload-mb") {
            continue;
        }
        let Some(value) = args.next() else {
            return Err(Error::ErrorWithMessage(format!("Missing value for {}", flag)));
        };
        match flag {
            "-ip" => s.ip = value,
            "-port" => {
                s.port = value
                    .parse()
                    .map_err(|_| Error::ErrorWithMessage(format!("Invalid port: {}", value)))?
            }
            "-backend" => s.backend_url = value,
            _ => {
                s.max_upload_mb = value.parse().map_err(|_| {
                    Error::ErrorWithMessage(format!("Invalid upload limit: {}", value))
                })?
            }
        }
    }
    s.check()?;
    Ok(s)
}

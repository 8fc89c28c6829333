//! Remote control of a running instance.
//!
//! A second invocation of the binary (or any tool linking the crate) uses
//! [`RemoteClient`] to hit `/+reload` or `/+exit` on a server that is
//! already listening, instead of starting one.

use crate::error::RemoteError;
use crate::server::control::{EXIT_ROUTE, RELOAD_ROUTE};
use crate::ui;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::AUTHORIZATION;
use std::error::Error as StdError;
use std::io;

/// Client for the control endpoints of one running instance.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    hostname: String,
    port: u16,
    credential: Option<String>,
    client: reqwest::Client,
}

impl RemoteClient {
    /// Create a client for the instance at `hostname:port`.
    ///
    /// # Errors
    ///
    /// Fails only if the underlying HTTP client cannot be constructed.
    pub fn new(hostname: impl Into<String>, port: u16) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(RemoteError::Client)?;

        Ok(Self {
            hostname: hostname.into(),
            port,
            credential: None,
            client,
        })
    }

    /// Send `credential` (`username:password`) as Basic authorization.
    /// `None` or an empty string sends no header.
    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential.filter(|credential| !credential.is_empty());
        self
    }

    /// `host:port` this client talks to.
    pub fn host(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// Ask the instance to reload every connected browser.
    ///
    /// # Errors
    ///
    /// Any transport failure, or a non-success status.
    pub async fn trigger_reload(&self) -> Result<(), RemoteError> {
        ui::info(&format!("Triggering reload to {}.", self.host()));

        let url = self.url(RELOAD_ROUTE);
        let response = self.send(&url).await.map_err(|source| RemoteError::Request {
            url: url.clone(),
            source,
        })?;

        check_status(&url, response.status())
    }

    /// Ask the instance to shut down.
    ///
    /// The instance may die before its response is written; a connection
    /// dropped that way counts as success.
    ///
    /// # Errors
    ///
    /// Any other transport failure (e.g. nothing listening), or a
    /// non-success status.
    pub async fn trigger_exit(&self) -> Result<(), RemoteError> {
        ui::info(&format!("Triggering exit to {}.", self.host()));

        let url = self.url(EXIT_ROUTE);
        match self.send(&url).await {
            Ok(response) => check_status(&url, response.status()),
            Err(err) if is_abrupt_disconnect(&err) => {
                tracing::debug!("Connection to {} dropped during exit: {}", url, err);
                Ok(())
            }
            Err(source) => Err(RemoteError::Request { url, source }),
        }
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self.client.get(url);
        if let Some(credential) = &self.credential {
            request = request.header(
                AUTHORIZATION,
                format!("Basic {}", STANDARD.encode(credential)),
            );
        }
        request.send().await
    }

    fn url(&self, route: &str) -> String {
        if self.hostname.contains(':') && !self.hostname.starts_with('[') {
            format!("http://[{}]:{}{}", self.hostname, self.port, route)
        } else {
            format!("http://{}:{}{}", self.hostname, self.port, route)
        }
    }
}

fn check_status(url: &str, status: reqwest::StatusCode) -> Result<(), RemoteError> {
    if status.is_success() {
        return Ok(());
    }

    let hint = if status == reqwest::StatusCode::UNAUTHORIZED {
        "The instance requires credentials; pass them with --auth"
    } else {
        "Check that --hostname/--port point at a runna instance"
    };

    Err(RemoteError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        hint: hint.to_string(),
    })
}

/// Whether `err` means the peer went away mid-exchange rather than never
/// being reachable.
///
/// Walks the whole source chain: reqwest wraps hyper, which wraps the
/// socket's `io::Error`.
pub fn is_abrupt_disconnect(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        if let Some(hyper_err) = err.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() {
                return true;
            }
        }
        current = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Wrapped(io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "request failed")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_url_for_plain_host() {
        let client = RemoteClient::new("localhost", 8000).unwrap();
        assert_eq!(client.url(RELOAD_ROUTE), "http://localhost:8000/+reload");
        assert_eq!(client.host(), "localhost:8000");
    }

    #[test]
    fn test_url_brackets_ipv6_host() {
        let client = RemoteClient::new("::1", 9000).unwrap();
        assert_eq!(client.url(EXIT_ROUTE), "http://[::1]:9000/+exit");
    }

    #[test]
    fn test_empty_credential_is_dropped() {
        let client = RemoteClient::new("localhost", 8000)
            .unwrap()
            .with_credential(Some(String::new()));
        assert!(client.credential.is_none());
    }

    #[test]
    fn test_reset_in_source_chain_is_abrupt() {
        let err = Wrapped(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert!(is_abrupt_disconnect(&err));
    }

    #[test]
    fn test_refused_is_not_abrupt() {
        let err = Wrapped(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert!(!is_abrupt_disconnect(&err));
    }

    #[test]
    fn test_check_status_unauthorized_hint() {
        let err = check_status("http://localhost:8000/+exit", reqwest::StatusCode::UNAUTHORIZED)
            .unwrap_err();
        match err {
            RemoteError::Status { status, hint, .. } => {
                assert_eq!(status, 401);
                assert!(hint.contains("--auth"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_status_success() {
        assert!(check_status("http://localhost:8000/+reload", reqwest::StatusCode::OK).is_ok());
    }
}

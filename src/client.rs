use crate::schema::{NetworkDevice, SystemDetails, SystemSummary, UserRecord};
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use std::fmt;
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use xmlrpc::{Request, Transport, Value};

/// Failure taxonomy for remote calls. Connection, authentication and query
/// failures are fatal to the invoking report; callers decide what to
/// suppress (logout warnings, device lookups inside the resolver).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to reach {endpoint} - {detail}")]
    Connection { endpoint: String, detail: String },
    #[error("login failed for user {username} - {detail}")]
    Authentication { username: String, detail: String },
    #[error("user '{login}' not found")]
    UserNotFound { login: String },
    #[error("{method} failed - {detail}")]
    Query { method: &'static str, detail: String },
}

/// Opaque session token returned by `auth.login`. Valid for one process
/// invocation; invalidated by [`ApiClient::logout`].
pub struct Session {
    key: String,
}

impl Session {
    pub(crate) fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session(*****)")
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    endpoint: Url,
    http: Client,
}

impl ApiClient {
    pub fn new(endpoint: &str, insecure_tls: bool) -> Result<Self, ApiError> {
        let url = Url::parse(endpoint).map_err(|err| ApiError::Connection {
            endpoint: endpoint.to_string(),
            detail: format!("invalid endpoint URL: {err}"),
        })?;

        if insecure_tls {
            warn!(
                endpoint,
                "TLS certificate verification is DISABLED; traffic to this endpoint can be intercepted"
            );
        }

        let http = Client::builder()
            .user_agent(HeaderValue::from_static("sumactl/0.1"))
            .danger_accept_invalid_certs(insecure_tls)
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|err| ApiError::Connection {
                endpoint: endpoint.to_string(),
                detail: format!("building HTTP client: {err}"),
            })?;

        Ok(Self {
            endpoint: url,
            http,
        })
    }

    pub fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let request = Request::new("auth.login").arg(username).arg(password);
        let value = match self.call("auth.login", request) {
            Ok(value) => value,
            // The server answers bad credentials with a fault.
            Err(ApiError::Query { detail, .. }) => {
                return Err(ApiError::Authentication {
                    username: username.to_string(),
                    detail,
                });
            }
            Err(err) => return Err(err),
        };

        let key = value.as_str().ok_or_else(|| ApiError::Query {
            method: "auth.login",
            detail: "session key missing from response".into(),
        })?;
        debug!("session opened");
        Ok(Session {
            key: key.to_string(),
        })
    }

    pub fn logout(&self, session: &Session) -> Result<(), ApiError> {
        let request = Request::new("auth.logout").arg(session.key());
        self.call("auth.logout", request)?;
        debug!("session closed");
        Ok(())
    }

    /// Fetch one user by login name. An empty struct is how the API answers
    /// a lookup for an unknown login; that maps to [`ApiError::UserNotFound`].
    pub fn user_details(&self, session: &Session, login: &str) -> Result<UserRecord, ApiError> {
        let request = Request::new("user.getDetails").arg(session.key()).arg(login);
        let value = self.call("user.getDetails", request)?;
        UserRecord::from_value(&value).ok_or_else(|| ApiError::UserNotFound {
            login: login.to_string(),
        })
    }

    pub fn list_users(&self, session: &Session) -> Result<Vec<UserRecord>, ApiError> {
        let request = Request::new("user.listUsers").arg(session.key());
        let value = self.call("user.listUsers", request)?;
        let entries = expect_array("user.listUsers", &value)?;
        Ok(entries.iter().filter_map(UserRecord::from_value).collect())
    }

    pub fn list_systems(&self, session: &Session) -> Result<Vec<SystemSummary>, ApiError> {
        let request = Request::new("system.listSystems").arg(session.key());
        let value = self.call("system.listSystems", request)?;
        let entries = expect_array("system.listSystems", &value)?;
        Ok(entries.iter().filter_map(SystemSummary::from_value).collect())
    }

    pub fn system_details(&self, session: &Session, id: i64) -> Result<SystemDetails, ApiError> {
        let sid = system_id("system.getDetails", id)?;
        let request = Request::new("system.getDetails").arg(session.key()).arg(sid);
        let value = self.call("system.getDetails", request)?;
        SystemDetails::from_value(&value).ok_or_else(|| ApiError::Query {
            method: "system.getDetails",
            detail: "response is not a struct".into(),
        })
    }

    pub fn network_devices(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<Vec<NetworkDevice>, ApiError> {
        let sid = system_id("system.getNetworkDevices", id)?;
        let request = Request::new("system.getNetworkDevices")
            .arg(session.key())
            .arg(sid);
        let value = self.call("system.getNetworkDevices", request)?;
        let entries = expect_array("system.getNetworkDevices", &value)?;
        Ok(entries.iter().filter_map(NetworkDevice::from_value).collect())
    }

    fn call(&self, method: &'static str, request: Request<'_>) -> Result<Value, ApiError> {
        debug!(method, endpoint = %self.endpoint, "issuing XML-RPC call");
        let transport = XmlRpcTransport {
            http: &self.http,
            url: self.endpoint.clone(),
        };
        request.call(transport).map_err(|err| match err.fault() {
            Some(fault) => ApiError::Query {
                method,
                detail: format!("fault {}: {}", fault.fault_code, fault.fault_string),
            },
            None => ApiError::Connection {
                endpoint: self.endpoint.to_string(),
                detail: err.to_string(),
            },
        })
    }
}

/// XML-RPC `int` arguments are 32-bit on the wire.
fn system_id(method: &'static str, id: i64) -> Result<i32, ApiError> {
    i32::try_from(id).map_err(|_| ApiError::Query {
        method,
        detail: format!("system id {id} outside the XML-RPC integer range"),
    })
}

fn expect_array<'a>(method: &'static str, value: &'a Value) -> Result<&'a [Value], ApiError> {
    value.as_array().ok_or_else(|| ApiError::Query {
        method,
        detail: "response is not an array".into(),
    })
}

struct XmlRpcTransport<'a> {
    http: &'a Client,
    url: Url,
}

impl Transport for XmlRpcTransport<'_> {
    type Stream = Cursor<Vec<u8>>;

    fn transmit(
        self,
        request: &Request<'_>,
    ) -> Result<Self::Stream, Box<dyn std::error::Error + Send + Sync>> {
        let mut body = Vec::new();
        request.write_as_xml(&mut body)?;

        let response = self
            .http
            .post(self.url)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/xml; charset=utf-8"))
            .body(body)
            .send()?
            .error_for_status()?;

        Ok(Cursor::new(response.bytes()?.to_vec()))
    }
}

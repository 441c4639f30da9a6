//! Standalone HTTP client for the Warmup 4iE cloud API.
//!
//! - Blocking client using `ureq` (no async).
//! - Uses existing models in `crate::models::warmup`.
//! - The vendor API is a hybrid: login and `getLocations` go to a REST-style
//!   endpoint, the rooms listing goes to a GraphQL endpoint with a
//!   `warmup-authorization` header.
//!
//! Authentication
//! - One-shot `userLogin` exchange at construction time. The token is held
//!   for the client's lifetime; there is no refresh, an expired token makes
//!   every subsequent call fail.

use log::debug;
use serde::de::DeserializeOwned;

use crate::models::warmup::{Location, LocationsResponse, Room, RoomsResponse, TokenResponse};

const TOKEN_URL: &str = "https://api.warmup.com/apps/app/v1";
const GRAPHQL_URL: &str = "https://apil.warmup.com/graphql";

pub const APP_ID: &str = "WARMUP-APP-V001";
pub const APP_TOKEN: &str = r#"M=;He<Xtg"$}4N%5k{$:PD+WA"]D<;#PriteY|VTuA>_iyhs+vA"4lic{6-LqNM:"#;

/// Headers the vendor expects on every request. The values are what the
/// mobile app sends; requests without them get rejected.
const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("user-agent", "WARMUP_APP"),
    ("accept", "*/*"),
    ("accept-encoding", "br, gzip, deflate"),
    ("accept-language", "de-de"),
    ("connection", "keep-alive"),
    ("content-type", "application/json"),
    ("app-token", APP_TOKEN),
    ("app-version", "1.8.1"),
];

const ROOMS_QUERY: &str = "query QUERY{ user{ currentLocation: location { id name rooms{ id roomName runModeInt targetTemp currentTemp thermostat4ies {minTemp maxTemp}}  }}  } ";

#[derive(Debug)]
pub enum WarmupClientError {
    /// Network/IO failure below the application layer.
    Transport(String),
    /// The server answered with a non-200 status.
    Http { status: u16, message: String },
    /// The body could not be decoded into the expected shape.
    Json(String),
    /// The credential exchange failed.
    Auth(String),
    /// The call succeeded at transport level but the application-level
    /// status was not "success", or the payload was missing a required part.
    Api(String),
}

impl core::fmt::Display for WarmupClientError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WarmupClientError::Transport(s) => write!(f, "transport error: {}", s),
            WarmupClientError::Http { status, message } => write!(f, "http {}: {}", status, message),
            WarmupClientError::Json(s) => write!(f, "json error: {}", s),
            WarmupClientError::Auth(s) => write!(f, "auth error: {}", s),
            WarmupClientError::Api(s) => write!(f, "api error: {}", s),
        }
    }
}

impl std::error::Error for WarmupClientError {}

/// Read access to the thermostat service, mockable for the monitor loop.
pub trait Thermostat {
    fn list_locations(&self) -> Result<Vec<Location>, WarmupClientError>;
    fn list_rooms(&self) -> Result<Vec<Room>, WarmupClientError>;
}

pub struct WarmupClient {
    agent: ureq::Agent,
    email: String,
    token: String,
    token_url: String,
    graphql_url: String,
}

impl WarmupClient {
    /// Authenticates against the vendor and returns a ready-to-use client.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self, WarmupClientError> {
        let agent = ureq::AgentBuilder::new().build();
        let email = email.into();
        let token = Self::retrieve_access_token(&agent, TOKEN_URL, &email, &password.into())?;
        Ok(WarmupClient {
            agent,
            email,
            token,
            token_url: TOKEN_URL.to_string(),
            graphql_url: GRAPHQL_URL.to_string(),
        })
    }

    fn retrieve_access_token(
        agent: &ureq::Agent,
        url: &str,
        email: &str,
        password: &str,
    ) -> Result<String, WarmupClientError> {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Login<'a> {
            email: &'a str,
            password: &'a str,
            method: &'a str,
            app_id: &'a str,
        }
        #[derive(serde::Serialize)]
        struct Body<'a> {
            request: Login<'a>,
        }

        let body = serde_json::to_string(&Body {
            request: Login {
                email,
                password,
                method: "userLogin",
                app_id: APP_ID,
            },
        })
        .map_err(|e| WarmupClientError::Auth(format!("unable to build login request: {}", e)))?;

        let mut req = agent.post(url);
        for &(k, v) in DEFAULT_HEADERS {
            req = req.set(k, v);
        }
        match req.send_string(&body) {
            Ok(resp) => {
                let text = resp
                    .into_string()
                    .map_err(|e| WarmupClientError::Transport(e.to_string()))?;
                debug!("login response: {}", text);
                let parsed: TokenResponse =
                    decode(&text).map_err(|e| WarmupClientError::Auth(e.to_string()))?;
                let result = parsed.status.as_ref().and_then(|s| s.result.as_deref());
                if result != Some("success") {
                    return Err(WarmupClientError::Auth(format!(
                        "login rejected by server: result={:?}",
                        result
                    )));
                }
                parsed
                    .response
                    .and_then(|r| r.token)
                    .ok_or_else(|| WarmupClientError::Auth("login response missing token".to_string()))
            }
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_else(|_| String::from("<no body>"));
                Err(WarmupClientError::Auth(format!("http {}: {}", status, body)))
            }
            Err(ureq::Error::Transport(t)) => Err(WarmupClientError::Transport(t.to_string())),
        }
    }

    /// POST a JSON body with the fixed default headers plus `extra_headers`,
    /// require HTTP 200 and decode the body.
    fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        extra_headers: &[(&str, &str)],
        body: &str,
    ) -> Result<T, WarmupClientError> {
        let mut req = self.agent.post(url);
        for &(k, v) in DEFAULT_HEADERS {
            req = req.set(k, v);
        }
        for &(k, v) in extra_headers {
            req = req.set(k, v);
        }
        match req.send_string(body) {
            Ok(resp) => {
                let text = resp
                    .into_string()
                    .map_err(|e| WarmupClientError::Transport(e.to_string()))?;
                debug!("{} response: {}", url, text);
                decode(&text)
            }
            Err(ureq::Error::Status(status, resp)) => {
                let message = resp.into_string().unwrap_or_else(|_| String::from("<no body>"));
                Err(WarmupClientError::Http { status, message })
            }
            Err(ureq::Error::Transport(t)) => Err(WarmupClientError::Transport(t.to_string())),
        }
    }
}

impl Thermostat for WarmupClient {
    fn list_locations(&self) -> Result<Vec<Location>, WarmupClientError> {
        let body = serde_json::json!({
            "account": { "email": self.email, "token": self.token },
            "request": { "method": "getLocations" },
        })
        .to_string();

        let response: LocationsResponse = self.post_json(&self.token_url, &[], &body)?;
        let result = response.status.as_ref().and_then(|s| s.result.as_deref());
        if result != Some("success") {
            return Err(WarmupClientError::Api(format!(
                "getLocations rejected by server: result={:?}",
                result
            )));
        }
        response
            .message
            .and_then(|m| m.get_locations)
            .and_then(|g| g.result)
            .and_then(|r| r.data)
            .and_then(|d| d.user)
            .map(|u| u.locations)
            .ok_or_else(|| {
                WarmupClientError::Api(
                    "getLocations response missing message.getLocations.result.data.user".to_string(),
                )
            })
    }

    fn list_rooms(&self) -> Result<Vec<Room>, WarmupClientError> {
        let body = serde_json::json!({ "query": ROOMS_QUERY }).to_string();

        let response: RoomsResponse =
            self.post_json(&self.graphql_url, &[("warmup-authorization", &self.token)], &body)?;
        if response.status.as_deref() != Some("success") {
            return Err(WarmupClientError::Api(format!(
                "rooms query rejected by server: status={:?}",
                response.status
            )));
        }
        response
            .data
            .and_then(|d| d.user)
            .and_then(|u| u.current_location)
            .map(|l| l.rooms)
            .ok_or_else(|| {
                WarmupClientError::Api("rooms response missing data.user.currentLocation".to_string())
            })
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, WarmupClientError> {
    let mut deserializer = serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| WarmupClientError::Json(e.to_string()))
}

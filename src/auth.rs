use crate::http::request::RequestUnit;
use crate::http::transport::{ApiRequest, Transport, TransportError, to_json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// The logged-in user as reported by GET /whoami.
#[derive(Clone, Debug, Deserialize)]
pub struct Identity {
    pub id: String,
    pub domain: String,
    #[serde(default)]
    pub roles: Value,
}

#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// Login, logout, and identity check against the UI auth endpoints.
///
/// Stateless by design: no token or session is retained here, the backend
/// session cookie is the only session state. Cached service data is
/// cleared by the composition root on logout.
pub struct AuthService {
    transport: Arc<dyn Transport>,
    pub login: RequestUnit<Option<Credentials>>,
    pub logout: RequestUnit<()>,
}

impl AuthService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let login = {
            let transport = transport.clone();
            RequestUnit::new(move |credentials: Option<Credentials>| {
                let transport = transport.clone();
                async move {
                    let body = match &credentials {
                        Some(credentials) => to_json(credentials)?,
                        // Login with no payload posts an empty record.
                        None => Value::Object(Default::default()),
                    };
                    transport
                        .send(ApiRequest::post("/uilogin").with_json(body))
                        .await
                }
            })
        };

        let logout = {
            let transport = transport.clone();
            RequestUnit::new(move |_: ()| {
                let transport = transport.clone();
                async move { transport.send(ApiRequest::post("/uilogout")).await }
            })
        };

        Self {
            transport,
            login,
            logout,
        }
    }

    pub async fn whoami(&self) -> Result<Identity, TransportError> {
        let value = self.transport.send(ApiRequest::get("/whoami")).await?;
        serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

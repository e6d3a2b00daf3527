//! reqwest-backed [`Requester`].
//!
//! Every call is authorized with a bearer token: the session's token when one
//! was issued earlier, otherwise a fresh HS256 token minted over a signed
//! nonce challenge. Responses arrive wrapped in a `{status, data, message}`
//! envelope that is unwrapped here, so callers only see the payload.

use pipepay::RequestError;
use pipepay::auth::{MessageSigner, sign_challenge};
use pipepay::request::{Params, Requester};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::fmt;
use tracing::{debug, warn};
use url::Url;

use crate::constants::NONCE_PATH;
use crate::options::ClientOptions;
use crate::session::Session;
use crate::token;

/// Envelope status reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum EnvelopeStatus {
    Success,
    Error,
    Expired,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    status: Option<EnvelopeStatus>,
    #[serde(default)]
    data: Option<Box<RawValue>>,
    #[serde(default)]
    message: Option<String>,
}

/// Authenticated HTTP access to the job service.
pub struct HttpRequester<S> {
    client: Client,
    options: ClientOptions,
    server_url: Url,
    services_url: Url,
    signer: S,
    session: Session,
    signing_key: Option<String>,
}

impl<S> fmt::Debug for HttpRequester<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequester")
            .field("server_url", &self.server_url.as_str())
            .field("services_url", &self.services_url.as_str())
            .field("session", &self.session)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl<S: MessageSigner> HttpRequester<S> {
    /// Creates a requester for the endpoints in `options`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Url`] if a host is not a valid URL.
    pub fn new(options: ClientOptions, signer: S) -> Result<Self, RequestError> {
        Ok(Self {
            client: Client::new(),
            server_url: options.server_url()?,
            services_url: options.services_url()?,
            options,
            signer,
            session: Session::default(),
            signing_key: None,
        })
    }

    /// Uses a pre-issued token and expiry hook.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Sets the key that signs minted bearer tokens.
    #[must_use]
    pub fn with_signing_key(mut self, key: impl Into<String>) -> Self {
        self.signing_key = Some(key.into());
        self
    }

    /// Returns the signer authenticating requests.
    pub const fn signer(&self) -> &S {
        &self.signer
    }

    /// Returns the job service base URL.
    pub const fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// Fetches a nonce, signs the challenge and mints a bearer token.
    async fn mint_token(&self) -> Result<String, RequestError> {
        let url = join(&self.services_url, NONCE_PATH, &[])?;
        let request = self
            .client
            .get(url.clone())
            .timeout(self.options.request_timeout);
        let nonce: Option<u64> = self.call(request, &url).await?;
        let signature = sign_challenge(&self.signer, nonce.unwrap_or_default()).await?;
        debug!(address = %signature.address, nonce = signature.nonce, "Signed nonce challenge");
        token::mint(&signature, self.signing_key.as_deref())
    }

    async fn bearer(&self) -> Result<String, RequestError> {
        match &self.session.token {
            Some(token) => Ok(token.clone()),
            None => self.mint_token().await,
        }
    }

    async fn authorized(&self, method: Method, url: Url) -> Result<RequestBuilder, RequestError> {
        let token = self.bearer().await?;
        debug!(%method, %url, "Sending request");
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(token)
            .timeout(self.options.request_timeout))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, RequestError> {
        let response = request.send().await.map_err(|e| http_error(url, &e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| http_error(url, &e))?;
        self.unwrap_envelope(url, status, &body)
    }

    fn unwrap_envelope<T: DeserializeOwned>(
        &self,
        url: &Url,
        status: StatusCode,
        body: &str,
    ) -> Result<T, RequestError> {
        let envelope = match serde_json::from_str::<Envelope>(body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => return Err(status_error(url, status, body)),
            Err(source) => {
                return Err(RequestError::Decode {
                    context: url.to_string(),
                    source,
                });
            }
        };
        match envelope.status {
            Some(EnvelopeStatus::Expired) => {
                warn!(%url, "Session expired");
                self.session.expired();
                Err(RequestError::SessionExpired)
            }
            Some(EnvelopeStatus::Success) if status.is_success() => {
                let data = envelope.data.as_deref().map_or("null", RawValue::get);
                serde_json::from_str(data).map_err(|source| RequestError::Decode {
                    context: url.to_string(),
                    source,
                })
            }
            _ => match envelope.message {
                Some(message) => Err(RequestError::Remote { message }),
                None if !status.is_success() => Err(status_error(url, status, body)),
                None => Err(RequestError::Remote {
                    message: "unexpected response envelope".to_owned(),
                }),
            },
        }
    }

    async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let url = join(&self.server_url, path, &[])?;
        let request = self.authorized(method, url.clone()).await?.json(body);
        self.call(request, &url).await
    }

    async fn send_query<T>(
        &self,
        method: Method,
        path: &str,
        params: Params<'_>,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
    {
        let url = join(&self.server_url, path, params)?;
        let request = self.authorized(method, url.clone()).await?;
        self.call(request, &url).await
    }
}

impl<S: MessageSigner> Requester for HttpRequester<S> {
    async fn get<T>(&self, path: &str, params: Params<'_>) -> Result<T, RequestError>
    where
        T: DeserializeOwned + Send,
    {
        self.send_query(Method::GET, path, params).await
    }

    async fn delete<T>(&self, path: &str, params: Params<'_>) -> Result<T, RequestError>
    where
        T: DeserializeOwned + Send,
    {
        self.send_query(Method::DELETE, path, params).await
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, RequestError>
    where
        T: DeserializeOwned + Send,
        B: Serialize + Sync + ?Sized,
    {
        self.send_json(Method::POST, path, body).await
    }

    async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, RequestError>
    where
        T: DeserializeOwned + Send,
        B: Serialize + Sync + ?Sized,
    {
        self.send_json(Method::PUT, path, body).await
    }

    async fn upload_file<T>(
        &self,
        path: &str,
        contents: Vec<u8>,
        file_name: &str,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned + Send,
    {
        let url = join(&self.server_url, path, &[])?;
        let form = Form::new().part("file", Part::bytes(contents).file_name(file_name.to_owned()));
        let request = self
            .authorized(Method::POST, url.clone())
            .await?
            .multipart(form);
        self.call(request, &url).await
    }

    async fn download(&self, path: &str, params: Params<'_>) -> Result<Vec<u8>, RequestError> {
        let url = join(&self.server_url, path, params)?;
        let response = self
            .authorized(Method::GET, url.clone())
            .await?
            .send()
            .await
            .map_err(|e| http_error(&url, &e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| http_error(&url, &e))?;
            return Err(status_error(&url, status, &body));
        }
        let bytes = response.bytes().await.map_err(|e| http_error(&url, &e))?;
        Ok(bytes.to_vec())
    }
}

/// Resolves `path` beneath `base` and appends `params` as a query string.
fn join(base: &Url, path: &str, params: Params<'_>) -> Result<Url, RequestError> {
    let mut url = base
        .join(path.trim_start_matches('/'))
        .map_err(|e| RequestError::Url(format!("{path}: {e}")))?;
    if !params.is_empty() {
        let mut query = url.query_pairs_mut();
        for (name, value) in params {
            query.append_pair(name, value);
        }
    }
    Ok(url)
}

fn http_error(url: &Url, e: &reqwest::Error) -> RequestError {
    RequestError::Http {
        url: url.to_string(),
        message: e.to_string(),
    }
}

fn status_error(url: &Url, status: StatusCode, body: &str) -> RequestError {
    RequestError::HttpStatus {
        url: url.to_string(),
        status: status.as_u16(),
        body: body.to_owned(),
    }
}

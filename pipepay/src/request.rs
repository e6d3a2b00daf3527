//! Transport capability for the remote job service.
//!
//! [`Requester`] is the only way the library talks to the REST API. Paths are
//! relative to the API root (e.g. `"pipeline/start"`); authentication and the
//! response envelope are the implementation's concern. `pipepay-http` ships the
//! reqwest-backed implementation.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;

use crate::error::RequestError;

/// Query parameters as `(name, value)` pairs.
pub type Params<'a> = &'a [(&'a str, &'a str)];

/// Authenticated access to the remote job service.
pub trait Requester: Send + Sync {
    /// `GET path?params`, decoding the envelope payload.
    fn get<T>(
        &self,
        path: &str,
        params: Params<'_>,
    ) -> impl Future<Output = Result<T, RequestError>> + Send
    where
        T: DeserializeOwned + Send;

    /// `DELETE path?params`, decoding the envelope payload.
    fn delete<T>(
        &self,
        path: &str,
        params: Params<'_>,
    ) -> impl Future<Output = Result<T, RequestError>> + Send
    where
        T: DeserializeOwned + Send;

    /// `POST path` with a JSON body, decoding the envelope payload.
    fn post<T, B>(
        &self,
        path: &str,
        body: &B,
    ) -> impl Future<Output = Result<T, RequestError>> + Send
    where
        T: DeserializeOwned + Send,
        B: Serialize + Sync + ?Sized;

    /// `PUT path` with a JSON body, decoding the envelope payload.
    fn put<T, B>(
        &self,
        path: &str,
        body: &B,
    ) -> impl Future<Output = Result<T, RequestError>> + Send
    where
        T: DeserializeOwned + Send,
        B: Serialize + Sync + ?Sized;

    /// Uploads a file as multipart form data.
    fn upload_file<T>(
        &self,
        path: &str,
        contents: Vec<u8>,
        file_name: &str,
    ) -> impl Future<Output = Result<T, RequestError>> + Send
    where
        T: DeserializeOwned + Send;

    /// Downloads a raw payload.
    fn download(
        &self,
        path: &str,
        params: Params<'_>,
    ) -> impl Future<Output = Result<Vec<u8>, RequestError>> + Send;
}

impl<R: Requester> Requester for Arc<R> {
    fn get<T>(
        &self,
        path: &str,
        params: Params<'_>,
    ) -> impl Future<Output = Result<T, RequestError>> + Send
    where
        T: DeserializeOwned + Send,
    {
        (**self).get(path, params)
    }

    fn delete<T>(
        &self,
        path: &str,
        params: Params<'_>,
    ) -> impl Future<Output = Result<T, RequestError>> + Send
    where
        T: DeserializeOwned + Send,
    {
        (**self).delete(path, params)
    }

    fn post<T, B>(
        &self,
        path: &str,
        body: &B,
    ) -> impl Future<Output = Result<T, RequestError>> + Send
    where
        T: DeserializeOwned + Send,
        B: Serialize + Sync + ?Sized,
    {
        (**self).post(path, body)
    }

    fn put<T, B>(
        &self,
        path: &str,
        body: &B,
    ) -> impl Future<Output = Result<T, RequestError>> + Send
    where
        T: DeserializeOwned + Send,
        B: Serialize + Sync + ?Sized,
    {
        (**self).put(path, body)
    }

    fn upload_file<T>(
        &self,
        path: &str,
        contents: Vec<u8>,
        file_name: &str,
    ) -> impl Future<Output = Result<T, RequestError>> + Send
    where
        T: DeserializeOwned + Send,
    {
        (**self).upload_file(path, contents, file_name)
    }

    fn download(
        &self,
        path: &str,
        params: Params<'_>,
    ) -> impl Future<Output = Result<Vec<u8>, RequestError>> + Send {
        (**self).download(path, params)
    }
}

//! Owned description of an API call
//!
//! An [`ApiRequest`] is cheap to clone and carries everything needed to send
//! the call again, which is what lets the coordinator replay it after a
//! credential refresh. Multipart bodies are kept as plain parts and turned
//! into a fresh form on every dispatch.

use super::ClientError;
use super::user::LOGOUT_PATH;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<JsonValue>,
    multipart: Option<MultipartBody>,
    headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            multipart: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append the fields of a serializable struct as query parameters
    ///
    /// `None` fields are skipped and sequences repeat the key.
    ///
    /// # Errors
    ///
    /// Returns an error if `query` does not serialize to a JSON object
    pub fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self, ClientError> {
        let JsonValue::Object(fields) = serde_json::to_value(query)? else {
            return Err(ClientError::Configuration(
                "query parameters must serialize to an object".into(),
            ));
        };
        for (key, value) in fields {
            match value {
                JsonValue::Null => {}
                JsonValue::Array(items) => {
                    for item in items {
                        self.query.push((key.clone(), scalar_to_string(item)));
                    }
                }
                other => self.query.push((key, scalar_to_string(other))),
            }
        }
        Ok(self)
    }

    /// Set a JSON body
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Send `body` as `multipart/form-data` instead of JSON
    #[must_use]
    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = None;
        self.multipart = Some(body);
        self
    }

    /// Override a header for this call only
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub const fn body(&self) -> Option<&JsonValue> {
        self.body.as_ref()
    }

    pub const fn multipart_body(&self) -> Option<&MultipartBody> {
        self.multipart.as_ref()
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether this call targets the logout endpoint
    pub fn is_logout(&self) -> bool {
        self.path.trim_end_matches('/') == LOGOUT_PATH
    }
}

/// A file attached to a multipart request
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// File part whose MIME type is taken from the file extension
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        Self {
            field: field.into(),
            mime: mime_for(&file_name).to_string(),
            file_name,
            bytes,
        }
    }
}

impl std::fmt::Debug for FilePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePart")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Text fields plus one file, replayable any number of times
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    fields: Vec<(String, String)>,
    file: FilePart,
}

impl MultipartBody {
    pub const fn new(file: FilePart) -> Self {
        Self {
            fields: Vec::new(),
            file,
        }
    }

    /// Append a text field; repeating a name sends it several times
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((name.into(), value.to_string()));
        self
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub const fn file(&self) -> &FilePart {
        &self.file
    }

    /// Build a new form from the stored parts
    ///
    /// # Errors
    ///
    /// Returns an error if the stored MIME type is not valid
    pub fn to_form(&self) -> Result<Form, ClientError> {
        let form = self
            .fields
            .iter()
            .fold(Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            });
        let part = Part::bytes(self.file.bytes.clone())
            .file_name(self.file.file_name.clone())
            .mime_str(&self.file.mime)?;
        Ok(form.part(self.file.field.clone(), part))
    }
}

fn scalar_to_string(value: JsonValue) -> String {
    match value {
        JsonValue::String(text) => text,
        other => other.to_string(),
    }
}

//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! crate builds `HttpRequest` values and interprets `HttpResponse` values
//! without ever touching the network: a caller-supplied [`Transport`]
//! performs the actual I/O.
//!
//! Bodies are carried as [`Body`], a `Read` stream that may also be backed by
//! an in-memory buffer. Request bodies are usually buffered (the executor
//! serializes them up front) but instrumentation may swap in any reader;
//! response bodies may stream straight off a socket.
//!
//! [`Transport`]: crate::transport::Transport

use std::fmt;
use std::io::{self, Cursor, Read};

use bytes::Bytes;
use url::Url;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request or response payload.
///
/// Either a buffer that is already in memory or an arbitrary reader. Dropping
/// a `Body` closes the underlying stream.
pub struct Body {
    inner: Inner,
}

enum Inner {
    Buffered(Cursor<Bytes>),
    Streaming(Box<dyn Read + Send>),
}

impl Body {
    pub fn empty() -> Self {
        Self::from(Bytes::new())
    }

    /// Wrap an arbitrary reader. Nothing is read until the body is consumed.
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self {
            inner: Inner::Streaming(Box::new(reader)),
        }
    }

    /// The remaining bytes when the body is buffered, `None` for streams.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.inner {
            Inner::Buffered(cursor) => {
                let position = (cursor.position() as usize).min(cursor.get_ref().len());
                Some(&cursor.get_ref()[position..])
            }
            Inner::Streaming(_) => None,
        }
    }

    /// Read the rest of the body into memory and close the stream.
    pub fn into_bytes(self) -> io::Result<Bytes> {
        match self.inner {
            Inner::Buffered(cursor) => {
                let position = cursor.position() as usize;
                let bytes = cursor.into_inner();
                Ok(bytes.slice(position.min(bytes.len())..))
            }
            Inner::Streaming(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(Bytes::from(buf))
            }
        }
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Buffered(cursor) => cursor.read(buf),
            Inner::Streaming(reader) => reader.read(buf),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_bytes() {
            Some(bytes) => f.debug_struct("Body").field("len", &bytes.len()).finish(),
            None => f.write_str("Body(<stream>)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self {
            inner: Inner::Buffered(Cursor::new(bytes)),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::from(Bytes::from(text))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::from(Bytes::from_static(text.as_bytes()))
    }
}

/// An HTTP request described as plain data.
///
/// Built by the executor from an [`Operation`](crate::operation::Operation),
/// then handed to request options and finally to the transport.
#[derive(Debug)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// First value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Append a header, keeping any existing values with the same name.
    pub fn append_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Replace every value of the header `name` with `value`.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }
}

/// An HTTP response described as plain data.
///
/// Produced by the transport; consumed by the executor, which drains `body`
/// on every path.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Body>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, Url::parse("http://localhost:5601/api").unwrap())
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut req = request();
        req.append_header("Content-Type", "application/json");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn set_header_replaces_all_values() {
        let mut req = request();
        req.append_header("kbn-xsrf", "true");
        req.append_header("KBN-XSRF", "again");
        req.set_header("kbn-xsrf", "reporting");
        assert_eq!(req.headers, vec![("kbn-xsrf".to_string(), "reporting".to_string())]);
    }

    #[test]
    fn append_header_keeps_order() {
        let mut req = request();
        req.append_header("x-first", "1");
        req.append_header("x-second", "2");
        let names: Vec<&str> = req.headers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["x-first", "x-second"]);
    }

    #[test]
    fn buffered_body_exposes_remaining_bytes() {
        let mut body = Body::from("hello world");
        let mut first = [0u8; 6];
        body.read_exact(&mut first).unwrap();
        assert_eq!(body.as_bytes(), Some(&b"world"[..]));
        assert_eq!(body.into_bytes().unwrap(), Bytes::from_static(b"world"));
    }

    #[test]
    fn streaming_body_reads_to_end() {
        let body = Body::from_reader(Cursor::new(b"streamed".to_vec()));
        assert!(body.as_bytes().is_none());
        assert_eq!(body.into_bytes().unwrap(), Bytes::from_static(b"streamed"));
    }

    #[test]
    fn method_renders_uppercase() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert_eq!(HttpMethod::Put.as_str(), "PUT");
    }
}

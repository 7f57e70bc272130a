//! Minimal HTTP/1.1 wire layer for the HAP transport
//!
//! HAP carries three message shapes over one TCP stream: HTTP/1.1 requests
//! (controller to accessory), HTTP/1.1 responses, and unsolicited
//! `EVENT/1.0` responses that share HTTP framing. Only responses are parsed
//! here; requests are serialised.

mod codec;
mod headers;

#[cfg(test)]
mod tests;

pub use codec::{HttpCodec, HttpCodecError};
pub use headers::{Headers, content_types, names};

/// Request methods used by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
}

impl Method {
    /// Wire spelling
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
        }
    }
}

/// Which start-line a parsed response carried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// `HTTP/1.1` (or `HTTP/1.0`), paired with an outstanding request
    Http,
    /// `EVENT/1.0`, an unsolicited accessory notification
    Event,
}

/// Response status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const MULTI_STATUS: StatusCode = StatusCode(207);

    /// 2xx check
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }
}

/// A parsed response or event message
#[derive(Debug, Clone)]
pub struct Response {
    pub kind: ResponseKind,
    pub status: StatusCode,
    pub reason: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

/// An outgoing request
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Request {
    /// Create a request with no body
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Shorthand for GET
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Shorthand for POST with a typed body
    pub fn post(path: impl Into<String>, content_type: &str, body: Vec<u8>) -> Self {
        let mut request = Self::new(Method::Post, path);
        request.headers.insert(names::CONTENT_TYPE, content_type);
        request.body = body;
        request
    }

    /// Shorthand for PUT with a typed body
    pub fn put(path: impl Into<String>, content_type: &str, body: Vec<u8>) -> Self {
        let mut request = Self::new(Method::Put, path);
        request.headers.insert(names::CONTENT_TYPE, content_type);
        request.body = body;
        request
    }

    /// Serialise for transmission
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut output = Vec::with_capacity(128 + self.body.len());

        output.extend_from_slice(self.method.as_str().as_bytes());
        output.push(b' ');
        output.extend_from_slice(self.path.as_bytes());
        output.extend_from_slice(b" HTTP/1.1\r\n");

        for (name, value) in self.headers.iter() {
            output.extend_from_slice(name.as_bytes());
            output.extend_from_slice(b": ");
            output.extend_from_slice(value.as_bytes());
            output.extend_from_slice(b"\r\n");
        }

        if !self.body.is_empty() {
            let len_header = format!("{}: {}\r\n", names::CONTENT_LENGTH, self.body.len());
            output.extend_from_slice(len_header.as_bytes());
        }

        output.extend_from_slice(b"\r\n");
        output.extend_from_slice(&self.body);

        output
    }
}

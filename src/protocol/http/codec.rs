use super::{Headers, Response, ResponseKind, StatusCode};
use thiserror::Error;

/// Errors during response parsing
#[derive(Debug, Error)]
pub enum HttpCodecError {
    #[error("invalid start line: {0}")]
    InvalidStartLine(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("response too large: {size} bytes")]
    ResponseTooLarge { size: usize },
}

/// Sans-IO codec demultiplexing `HTTP/1.1` and `EVENT/1.0` responses from
/// one byte stream.
///
/// Feed decrypted plaintext with [`HttpCodec::feed`], pull complete messages
/// with [`HttpCodec::decode`]. Each message's body is fully buffered before
/// it is surfaced, so interleaved messages can never bleed into each other.
pub struct HttpCodec {
    buffer: Vec<u8>,
    max_size: usize,
    state: ParseState,
}

#[derive(Debug, Clone)]
enum ParseState {
    StartLine,
    Headers {
        kind: ResponseKind,
        status: StatusCode,
        reason: String,
    },
    Body {
        kind: ResponseKind,
        status: StatusCode,
        reason: String,
        headers: Headers,
        content_length: usize,
    },
}

impl HttpCodec {
    /// Create a new codec
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            max_size: 1024 * 1024,
            state: ParseState::StartLine,
        }
    }

    /// Feed bytes into the codec
    ///
    /// # Errors
    ///
    /// Returns error if the buffered message exceeds the size cap
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), HttpCodecError> {
        if self.buffer.len() + bytes.len() > self.max_size {
            return Err(HttpCodecError::ResponseTooLarge {
                size: self.buffer.len() + bytes.len(),
            });
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Try to decode one complete message
    ///
    /// Returns `Ok(None)` when more bytes are needed.
    ///
    /// # Errors
    ///
    /// Returns error if the message is malformed
    pub fn decode(&mut self) -> Result<Option<Response>, HttpCodecError> {
        loop {
            match &self.state {
                ParseState::StartLine => {
                    let Some(line_end) = self.find_line_end() else {
                        return Ok(None);
                    };
                    let line = String::from_utf8_lossy(&self.buffer[..line_end]).to_string();
                    let (kind, status, reason) = Self::parse_start_line(&line)?;
                    self.buffer.drain(..line_end + 2);
                    self.state = ParseState::Headers {
                        kind,
                        status,
                        reason,
                    };
                }

                ParseState::Headers {
                    kind,
                    status,
                    reason,
                } => {
                    let Some((headers, body_start)) = self.parse_headers()? else {
                        return Ok(None);
                    };
                    let content_length = headers.content_length().unwrap_or(0);
                    let (kind, status, reason) = (*kind, *status, reason.clone());
                    self.buffer.drain(..body_start);

                    if content_length == 0 {
                        self.state = ParseState::StartLine;
                        return Ok(Some(Response {
                            kind,
                            status,
                            reason,
                            headers,
                            body: Vec::new(),
                        }));
                    }

                    self.state = ParseState::Body {
                        kind,
                        status,
                        reason,
                        headers,
                        content_length,
                    };
                }

                ParseState::Body {
                    kind,
                    status,
                    reason,
                    headers,
                    content_length,
                } => {
                    if self.buffer.len() < *content_length {
                        return Ok(None);
                    }
                    let response = Response {
                        kind: *kind,
                        status: *status,
                        reason: reason.clone(),
                        headers: headers.clone(),
                        body: self.buffer.drain(..*content_length).collect(),
                    };
                    self.state = ParseState::StartLine;
                    return Ok(Some(response));
                }
            }
        }
    }

    /// Bytes currently buffered
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn find_line_end(&self) -> Option<usize> {
        self.buffer.windows(2).position(|w| w == b"\r\n")
    }

    // "HTTP/1.1 200 OK" or "EVENT/1.0 200 OK"
    fn parse_start_line(
        line: &str,
    ) -> Result<(ResponseKind, StatusCode, String), HttpCodecError> {
        let mut parts = line.splitn(3, ' ');

        let version = parts
            .next()
            .ok_or_else(|| HttpCodecError::InvalidStartLine(line.to_string()))?;

        let kind = if version.starts_with("EVENT/") {
            ResponseKind::Event
        } else if version.starts_with("HTTP/") {
            ResponseKind::Http
        } else {
            return Err(HttpCodecError::InvalidStartLine(line.to_string()));
        };

        let status = parts
            .next()
            .ok_or_else(|| HttpCodecError::InvalidStartLine(line.to_string()))?
            .parse::<u16>()
            .map_err(|_| HttpCodecError::InvalidStartLine(line.to_string()))?;

        let reason = parts.next().unwrap_or("").to_string();

        Ok((kind, StatusCode(status), reason))
    }

    fn parse_headers(&self) -> Result<Option<(Headers, usize)>, HttpCodecError> {
        if self.buffer.starts_with(b"\r\n") {
            return Ok(Some((Headers::new(), 2)));
        }

        let Some(header_end) = self.buffer.windows(4).position(|w| w == b"\r\n\r\n") else {
            return Ok(None);
        };

        let header_str = String::from_utf8_lossy(&self.buffer[..header_end]);
        let mut headers = Headers::new();

        for line in header_str.split("\r\n") {
            if line.is_empty() {
                continue;
            }
            let colon_pos = line
                .find(':')
                .ok_or_else(|| HttpCodecError::InvalidHeader(line.to_string()))?;
            headers.insert(line[..colon_pos].trim(), line[colon_pos + 1..].trim());
        }

        Ok(Some((headers, header_end + 4)))
    }
}

impl Default for HttpCodec {
    fn default() -> Self {
        Self::new()
    }
}

use super::*;

#[test]
fn request_encode_with_body() {
    let request = Request::put(
        "/characteristics",
        content_types::HAP_JSON,
        br#"{"characteristics":[{"aid":1,"iid":10,"value":true}]}"#.to_vec(),
    );

    let encoded = request.encode();
    let encoded_str = String::from_utf8_lossy(&encoded);

    assert!(encoded_str.starts_with("PUT /characteristics HTTP/1.1\r\n"));
    assert!(encoded_str.contains("Content-Type: application/hap+json\r\n"));
    assert!(encoded_str.contains("Content-Length: 53\r\n"));
    assert!(encoded_str.ends_with("\r\n\r\n{\"characteristics\":[{\"aid\":1,\"iid\":10,\"value\":true}]}"));
}

#[test]
fn request_encode_without_body_has_no_content_length() {
    let encoded = Request::get("/accessories").encode();
    let encoded_str = String::from_utf8_lossy(&encoded);

    assert!(encoded_str.starts_with("GET /accessories HTTP/1.1\r\n"));
    assert!(!encoded_str.contains("Content-Length"));
    assert!(encoded_str.ends_with("\r\n\r\n"));
}

#[test]
fn decode_http_response() {
    let mut codec = HttpCodec::new();
    codec
        .feed(b"HTTP/1.1 200 OK\r\nContent-Type: application/hap+json\r\nContent-Length: 2\r\n\r\n{}")
        .unwrap();

    let response = codec.decode().unwrap().unwrap();
    assert_eq!(response.kind, ResponseKind::Http);
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"{}");
    assert_eq!(codec.buffered_len(), 0);
}

#[test]
fn decode_event_response() {
    let mut codec = HttpCodec::new();
    codec
        .feed(b"EVENT/1.0 200 OK\r\nContent-Length: 5\r\n\r\nhello")
        .unwrap();

    let response = codec.decode().unwrap().unwrap();
    assert_eq!(response.kind, ResponseKind::Event);
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, b"hello");
}

#[test]
fn decode_interleaved_event_and_response() {
    let mut codec = HttpCodec::new();
    codec
        .feed(b"EVENT/1.0 200 OK\r\nContent-Length: 3\r\n\r\nabcHTTP/1.1 204 No Content\r\n\r\n")
        .unwrap();

    let event = codec.decode().unwrap().unwrap();
    assert_eq!(event.kind, ResponseKind::Event);
    assert_eq!(event.body, b"abc");

    let response = codec.decode().unwrap().unwrap();
    assert_eq!(response.kind, ResponseKind::Http);
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());
}

#[test]
fn decode_across_split_feeds() {
    let mut codec = HttpCodec::new();

    codec.feed(b"HTTP/1.1 200").unwrap();
    assert!(codec.decode().unwrap().is_none());

    codec.feed(b" OK\r\nContent-Length: 5\r\n\r\nbo").unwrap();
    assert!(codec.decode().unwrap().is_none());

    codec.feed(b"dy!").unwrap();
    let response = codec.decode().unwrap().unwrap();
    assert_eq!(response.body, b"body!");
}

#[test]
fn no_content_length_means_empty_body() {
    let mut codec = HttpCodec::new();
    codec.feed(b"HTTP/1.1 204 No Content\r\n\r\n").unwrap();

    let response = codec.decode().unwrap().unwrap();
    assert!(response.body.is_empty());
}

#[test]
fn garbage_start_line_is_rejected() {
    let mut codec = HttpCodec::new();
    codec.feed(b"SPDY/3.0 200 OK\r\n\r\n").unwrap();
    assert!(codec.decode().is_err());
}

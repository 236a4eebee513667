//! Tests for the HTTP parser.

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use crate::parser::{
        decode_path, decode_query_component, parse_query, parse_request, read_body, Error,
        HttpVersion, Limits, Method, Request,
    };

    async fn parse(bytes: &[u8]) -> Result<Option<Request>, Error> {
        let mut reader = bytes;
        parse_request(&mut reader, &Limits::default()).await
    }

    #[tokio::test]
    async fn test_parse_simple_get_request() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(result.method(), Some(Method::GET));
        assert_eq!(result.method_name(), "GET");
        assert_eq!(result.path(), "/index.html");
        assert_eq!(result.version(), Some(HttpVersion::Http11));
        assert_eq!(result.header("Host"), Some("example.com"));
        assert!(result.query().is_empty());
    }

    #[tokio::test]
    async fn test_parse_request_with_multiple_headers() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test\r\nAccept: */*\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(result.headers().len(), 3);
        assert_eq!(result.headers().get("user-agent").unwrap(), "test");
        assert_eq!(result.headers().get("accept").unwrap(), "*/*");
    }

    #[tokio::test]
    async fn test_case_insensitive_headers() {
        let request = b"GET /index.html HTTP/1.1\r\nHOST: example.com\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert!(result.headers().contains_key("host"));
        assert!(result.has_header("host"));
        assert!(result.has_header("HOST"));
        assert!(result.has_header("Host"));
    }

    #[tokio::test]
    async fn test_empty_stream_is_no_request() {
        let result = parse(b"").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_blank_request_line_is_missing_method() {
        let result = parse(b"\r\n").await;
        assert!(matches!(result, Err(Error::MissingMethod)));
    }

    #[tokio::test]
    async fn test_missing_target() {
        let result = parse(b"GET\r\n").await;
        assert!(matches!(result, Err(Error::MissingTarget)));
    }

    #[tokio::test]
    async fn test_unknown_method_is_carried_through() {
        let request = b"BREW /pot HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(result.method(), None);
        assert_eq!(result.method_name(), "BREW");
        assert_eq!(result.path(), "/pot");
    }

    #[tokio::test]
    async fn test_method_lookup_is_case_sensitive() {
        let result = parse(b"get / HTTP/1.1\r\n\r\n").await.unwrap().unwrap();
        assert_eq!(result.method(), None);
        assert_eq!(result.method_name(), "get");
    }

    #[tokio::test]
    async fn test_all_methods() {
        let methods = [
            ("GET", Method::GET),
            ("PUT", Method::PUT),
            ("POST", Method::POST),
            ("DELETE", Method::DELETE),
            ("HEAD", Method::HEAD),
            ("OPTIONS", Method::OPTIONS),
        ];

        for (token, expected) in methods {
            let request = format!("{token} /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n");
            let result = parse(request.as_bytes()).await.unwrap().unwrap();
            assert_eq!(result.method(), Some(expected));
        }
    }

    #[tokio::test]
    async fn test_request_line_without_version_reads_no_headers() {
        let mut reader: &[u8] = b"GET /legacy\r\nHost: example.com\r\n\r\n";
        let result = parse_request(&mut reader, &Limits::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.path(), "/legacy");
        assert_eq!(result.version(), None);
        assert!(result.headers().is_empty());
        assert_eq!(reader, &b"Host: example.com\r\n\r\n"[..]);
    }

    #[tokio::test]
    async fn test_unknown_version_still_reads_headers() {
        let result = parse(b"GET / HTTP/9.9\r\nHost: example.com\r\n\r\n")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.version(), None);
        assert_eq!(result.header("host"), Some("example.com"));
    }

    #[tokio::test]
    async fn test_headers_stop_at_blank_line_and_leave_body() {
        let mut reader: &[u8] =
            b"POST /submit HTTP/1.1\r\nContent-Length: 5\r\n\r\nhelloGET /next HTTP/1.1\r\n\r\n";
        let limits = Limits::default();
        let result = parse_request(&mut reader, &limits).await.unwrap().unwrap();
        assert_eq!(result.method(), Some(Method::POST));
        assert_eq!(result.body_length().unwrap(), Some(5));

        let body = read_body(&mut reader, 5, &limits).await.unwrap();
        assert_eq!(body, b"hello");

        let next = parse_request(&mut reader, &limits).await.unwrap().unwrap();
        assert_eq!(next.path(), "/next");
    }

    #[tokio::test]
    async fn test_headers_with_multiple_colons() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nX-Test: value:with:colons\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(result.header("x-test"), Some("value:with:colons"));
    }

    #[tokio::test]
    async fn test_headers_with_surrounding_whitespace() {
        let request = b"GET /index.html HTTP/1.1\r\n  Host : example.com  \r\nUser-Agent:  test  \r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(result.header("host"), Some("example.com"));
        assert_eq!(result.header("user-agent"), Some("test"));
    }

    #[tokio::test]
    async fn test_header_line_without_colon_is_ignored() {
        let request = b"GET /index.html HTTP/1.1\r\nInvalidHeader\r\nHost: example.com\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(result.headers().len(), 1);
        assert_eq!(result.header("host"), Some("example.com"));
    }

    #[tokio::test]
    async fn test_empty_header_value() {
        let request = b"GET /index.html HTTP/1.1\r\nX-Empty:\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(result.header("x-empty"), Some(""));
    }

    #[tokio::test]
    async fn test_duplicate_headers() {
        let request = b"GET /index.html HTTP/1.1\r\nX-Test: value1\r\nx-test: value2\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        // The second value should overwrite the first
        assert_eq!(result.header("X-Test"), Some("value2"));
    }

    #[tokio::test]
    async fn test_mixed_line_endings() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\nUser-Agent: test\r\n\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(result.path(), "/index.html");
        assert_eq!(result.header("host"), Some("example.com"));
        assert_eq!(result.header("user-agent"), Some("test"));
    }

    #[tokio::test]
    async fn test_request_line_with_extra_whitespace() {
        let request = b"GET  /index.html \t HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(result.method(), Some(Method::GET));
        assert_eq!(result.path(), "/index.html");
        assert_eq!(result.version(), Some(HttpVersion::Http11));
    }

    #[tokio::test]
    async fn test_path_with_query_parameters() {
        let request = b"GET /hello?name=World&page=1 HTTP/1.1\r\nHost: x\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(result.path(), "/hello");
        assert_eq!(result.query_param("name"), Some("World"));
        assert_eq!(result.query_param("page"), Some("1"));
        assert!(!result.has_query_param("missing"));
    }

    #[tokio::test]
    async fn test_query_parameters_are_decoded() {
        let request = b"GET /search?q=test%20query+more&sum=1%2B1&filter=name:john HTTP/1.1\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(result.query_param("q"), Some("test query more"));
        assert_eq!(result.query_param("sum"), Some("1+1"));
        assert_eq!(result.query_param("filter"), Some("name:john"));
    }

    #[tokio::test]
    async fn test_path_keeps_literal_plus() {
        let request = b"GET /files/c++%20notes HTTP/1.1\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(result.path(), "/files/c++ notes");
    }

    #[tokio::test]
    async fn test_query_parameters_without_values() {
        let request = b"GET /search?q=test&flag&empty=&& HTTP/1.1\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(result.query().len(), 3);
        assert_eq!(result.query_param("q"), Some("test"));
        assert_eq!(result.query_param("flag"), Some(""));
        assert_eq!(result.query_param("empty"), Some(""));
    }

    #[tokio::test]
    async fn test_duplicate_query_parameters_last_wins() {
        let request = b"GET /list?sort=name&page=1&sort=date HTTP/1.1\r\n\r\n";
        let result = parse(request).await.unwrap().unwrap();
        assert_eq!(
            result.query(),
            &[
                ("sort".to_string(), "date".to_string()),
                ("page".to_string(), "1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_request_line_too_long() {
        let limits = Limits {
            max_line_length: 16,
            ..Limits::default()
        };
        let mut reader: &[u8] = b"GET /aaaaaaaaaaaaaaaaaaaaaaaaaaaa HTTP/1.1\r\n\r\n";
        let result = parse_request(&mut reader, &limits).await;
        assert!(matches!(
            result,
            Err(Error::LineTooLong { what: "request line", limit: 16 })
        ));
    }

    #[tokio::test]
    async fn test_line_at_limit_is_accepted() {
        let limits = Limits {
            max_line_length: 16,
            ..Limits::default()
        };
        // Exactly 16 bytes before the CRLF.
        let mut reader: &[u8] = b"GET /ab HTTP/1.1\r\n\r\n";
        let result = parse_request(&mut reader, &limits).await.unwrap().unwrap();
        assert_eq!(result.path(), "/ab");
    }

    #[tokio::test]
    async fn test_header_line_too_long() {
        let limits = Limits {
            max_line_length: 24,
            ..Limits::default()
        };
        let mut reader: &[u8] = b"GET / HTTP/1.1\r\nX-Long: aaaaaaaaaaaaaaaaaaaaaaaaa\r\n\r\n";
        let result = parse_request(&mut reader, &limits).await;
        assert!(matches!(
            result,
            Err(Error::LineTooLong { what: "header line", .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_utf8_in_request() {
        let request = b"GET /index.html HTTP/1.1\r\nX-Test: \xFF\xFF\xFF\r\n\r\n";
        let result = parse(request).await;
        assert!(matches!(result, Err(Error::InvalidEncoding)));
    }

    #[tokio::test]
    async fn test_read_body_limits() {
        let limits = Limits {
            max_body_size: 4,
            ..Limits::default()
        };

        let mut reader: &[u8] = b"abcdef";
        let result = read_body(&mut reader, 8, &limits).await;
        assert!(matches!(result, Err(Error::BodyTooLarge { length: 8, limit: 4 })));

        let mut short: &[u8] = b"ab";
        let result = read_body(&mut short, 4, &limits).await;
        assert!(matches!(
            result,
            Err(Error::IncompleteBody { expected: 4, received: 2 })
        ));
    }

    #[tokio::test]
    async fn test_body_length_errors() {
        let invalid = parse(b"POST / HTTP/1.1\r\nContent-Length: ten\r\n\r\n")
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(invalid.body_length(), Err(Error::InvalidContentLength(ref v)) if v == "ten"));

        let chunked = parse(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n")
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            chunked.body_length(),
            Err(Error::UnsupportedTransferEncoding(_))
        ));

        let none = parse(b"GET / HTTP/1.1\r\n\r\n").await.unwrap().unwrap();
        assert_eq!(none.body_length().unwrap(), None);
    }

    #[tokio::test]
    async fn test_keep_alive_negotiation() {
        let cases: [(&[u8], bool); 6] = [
            (b"GET / HTTP/1.1\r\n\r\n", true),
            (b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n", false),
            (b"GET / HTTP/1.1\r\nConnection: Upgrade, Close\r\n\r\n", false),
            (b"GET / HTTP/1.0\r\n\r\n", false),
            (b"GET / HTTP/1.0\r\nConnection: keep-alive\r\n\r\n", true),
            (b"GET /\r\n", false),
        ];

        for (raw, expected) in cases {
            let request = parse(raw).await.unwrap().unwrap();
            assert_eq!(
                request.wants_keep_alive(),
                expected,
                "{}",
                String::from_utf8_lossy(raw)
            );
        }
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestUser {
        name: String,
        email: String,
    }

    #[test]
    fn test_json_parsing() {
        let headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        let body = r#"{"name":"John Doe","email":"john@example.com"}"#.as_bytes().to_vec();
        let request = Request::new("POST", "/api/users", Vec::new(), Some(HttpVersion::Http11), headers)
            .with_body(body.clone());

        let user: TestUser = request.json().unwrap();
        assert_eq!(user.name, "John Doe");
        assert_eq!(user.email, "john@example.com");

        let plain = Request::new(
            "POST",
            "/api/users",
            Vec::new(),
            Some(HttpVersion::Http11),
            vec![("Content-Type".to_string(), "text/plain".to_string())],
        )
        .with_body(body);
        let result: Result<TestUser, _> = plain.json();
        assert!(matches!(result, Err(Error::MissingHeader(_))));

        let invalid = Request::new(
            "POST",
            "/api/users",
            Vec::new(),
            Some(HttpVersion::Http11),
            vec![("content-type".to_string(), "application/json".to_string())],
        )
        .with_body(br#"{"name":"John Doe","email":}"#.to_vec());
        let result: Result<TestUser, _> = invalid.json();
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[tokio::test]
    async fn test_encoded_head_parses_back_to_the_same_request() {
        let original = Request::new(
            "GET",
            "/docs/a b+c/ü",
            vec![
                ("q".to_string(), "x y&z=1".to_string()),
                ("flag".to_string(), String::new()),
                ("π".to_string(), "100%".to_string()),
            ],
            Some(HttpVersion::Http11),
            [
                ("Host".to_string(), "example.com".to_string()),
                ("X-Trace".to_string(), "abc:def".to_string()),
            ],
        );

        let head = original.encode_head();
        let parsed = parse(&head).await.unwrap().unwrap();
        assert_eq!(parsed, original);
    }

    #[tokio::test]
    async fn test_encoded_head_round_trips_unknown_method() {
        let original = Request::new("PURGE", "/cache", Vec::new(), Some(HttpVersion::Http10), Vec::new());
        let parsed = parse(&original.encode_head()).await.unwrap().unwrap();
        assert_eq!(parsed, original);
        assert_eq!(parsed.method(), None);
    }

    #[test]
    fn test_decoding_is_applied_once() {
        assert_eq!(decode_path("/already/decoded path"), "/already/decoded path");
        assert_eq!(decode_query_component("plain"), "plain");
        assert_eq!(decode_path("%2541"), "%41");
        assert_eq!(decode_path(&decode_path("%2541")), "A");
        assert_eq!(decode_path("/bad%zzescape%"), "/bad%zzescape%");
    }

    #[test]
    fn test_parse_query_standalone() {
        let params = parse_query("a=1&b&c=%E2%9C%93");
        assert_eq!(
            params,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), String::new()),
                ("c".to_string(), "✓".to_string()),
            ]
        );
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::GET.to_string(), "GET");
        assert_eq!(Method::POST.to_string(), "POST");
        assert_eq!(Method::PUT.to_string(), "PUT");
        assert_eq!(Method::DELETE.to_string(), "DELETE");
        assert_eq!(Method::HEAD.to_string(), "HEAD");
        assert_eq!(Method::OPTIONS.to_string(), "OPTIONS");
        assert_eq!(Method::lookup("PATCH"), None);
    }

    #[test]
    fn test_http_version_display() {
        assert_eq!(HttpVersion::Http10.to_string(), "HTTP/1.0");
        assert_eq!(HttpVersion::Http11.to_string(), "HTTP/1.1");
        assert_eq!(HttpVersion::Http20.to_string(), "HTTP/2");
        assert_eq!("HTTP/2.0".parse::<HttpVersion>(), Ok(HttpVersion::Http20));
    }
}

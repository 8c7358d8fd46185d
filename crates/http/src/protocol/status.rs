//! Status line text and the generic response body.

use http::{StatusCode, Version};

/// The reason phrase for `status`, falling back to the name of its class.
pub fn reason_phrase(status: StatusCode) -> &'static str {
    if let Some(reason) = status.canonical_reason() {
        return reason;
    }
    match status.as_u16() / 100 {
        1 => "Informational",
        2 => "Successful",
        3 => "Redirection",
        4 => "Client Error",
        5 => "Server Error",
        _ => "Unknown",
    }
}

/// Protocol text used in status lines. Anything but HTTP/1.1 answers as HTTP/1.0.
pub fn version_text(version: Option<Version>) -> &'static str {
    match version {
        Some(Version::HTTP_11) => "HTTP/1.1",
        _ => "HTTP/1.0",
    }
}

/// Statuses whose responses never carry a body.
pub fn is_bodiless(status: StatusCode) -> bool {
    status.is_informational()
        || matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED)
}

/// Writes `"<version> <code> <reason>\r\n"`.
pub fn status_line(out: &mut String, version: Option<Version>, status: StatusCode) {
    out.push_str(version_text(version));
    out.push(' ');
    out.push_str(status.as_str());
    out.push(' ');
    out.push_str(reason_phrase(status));
    out.push_str("\r\n");
}

/// The HTML page sent when neither the parser nor the application produced a body.
pub fn standard_body(status: StatusCode) -> String {
    let code = status.as_u16();
    let msg = reason_phrase(status);
    format!("<html><head><title>{code} {msg}</title></head><body><h1>{code} {msg}</h1></body></html>\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_with_class_fallback() {
        assert_eq!(reason_phrase(StatusCode::OK), "OK");
        assert_eq!(reason_phrase(StatusCode::CONTINUE), "Continue");
        assert_eq!(reason_phrase(StatusCode::HTTP_VERSION_NOT_SUPPORTED), "HTTP Version Not Supported");
        assert_eq!(reason_phrase(StatusCode::from_u16(299).unwrap()), "Successful");
        assert_eq!(reason_phrase(StatusCode::from_u16(499).unwrap()), "Client Error");
        assert_eq!(reason_phrase(StatusCode::from_u16(999).unwrap()), "Unknown");
    }

    #[test]
    fn version_texts() {
        assert_eq!(version_text(Some(Version::HTTP_11)), "HTTP/1.1");
        assert_eq!(version_text(Some(Version::HTTP_10)), "HTTP/1.0");
        assert_eq!(version_text(Some(Version::HTTP_09)), "HTTP/1.0");
        assert_eq!(version_text(None), "HTTP/1.0");
    }

    #[test]
    fn generic_page() {
        assert_eq!(
            standard_body(StatusCode::NOT_FOUND),
            "<html><head><title>404 Not Found</title></head><body><h1>404 Not Found</h1></body></html>\n"
        );
        let mut line = String::new();
        status_line(&mut line, Some(Version::HTTP_11), StatusCode::NOT_MODIFIED);
        assert_eq!(line, "HTTP/1.1 304 Not Modified\r\n");
        assert!(is_bodiless(StatusCode::NOT_MODIFIED));
        assert!(!is_bodiless(StatusCode::OK));
    }

    #[test]
    fn status_line_appends() {
        let mut line = String::from("x");
        status_line(&mut line, None, StatusCode::from_u16(299).unwrap());
        status_line(&mut line, Some(Version::HTTP_11), StatusCode::CONTINUE);
        assert_eq!(line, "xHTTP/1.0 299 Successful\r\nHTTP/1.1 100 Continue\r\n");
    }
}

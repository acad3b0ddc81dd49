//! Core HTTP types shared by the request builder and response reader.

/// The two methods the fetch engine builds requests for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub(crate) const fn as_bytes(&self) -> &'static [u8] {
        match self {
            Method::Get => b"GET",
            Method::Post => b"POST",
        }
    }
}

/// The response's declared protocol version, which decides the default
/// `Connection` semantics when no explicit header is present (HTTP/1.1
/// defaults to keep-alive, HTTP/1.0 defaults to close).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    pub(crate) fn from_bytes(src: &[u8]) -> Option<Self> {
        match src {
            b"HTTP/1.1" => Some(Self::Http11),
            b"HTTP/1.0" => Some(Self::Http10),
            _ => None,
        }
    }

    /// Default `Connection` behavior absent an explicit header.
    pub(crate) fn default_keep_alive(&self) -> bool {
        matches!(self, Version::Http11)
    }
}

/// How a response status is classified for the driver's control flow
/// (§4.6, §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    MovedPermanently,
    Redirect,
    SeeOther,
    NotModified,
    Unauthorized,
    ProxyAuthRequired,
    /// 405/500/501 in response to a POST.
    PostNotSupported,
    Other,
}

/// A parsed status code plus its classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub fn classify(&self, method: Method) -> StatusClass {
        match self.0 {
            200..=299 => StatusClass::Success,
            301 => StatusClass::MovedPermanently,
            302 | 307 => StatusClass::Redirect,
            303 => StatusClass::SeeOther,
            304 => StatusClass::NotModified,
            401 => StatusClass::Unauthorized,
            407 => StatusClass::ProxyAuthRequired,
            405 | 500 | 501 if method == Method::Post => StatusClass::PostNotSupported,
            _ => StatusClass::Other,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.0, 301 | 302 | 303 | 307)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_redirects_and_post_errors() {
        assert_eq!(StatusCode(301).classify(Method::Get), StatusClass::MovedPermanently);
        assert_eq!(StatusCode(303).classify(Method::Get), StatusClass::SeeOther);
        assert_eq!(StatusCode(405).classify(Method::Post), StatusClass::PostNotSupported);
        assert_eq!(StatusCode(405).classify(Method::Get), StatusClass::Other);
        assert_eq!(StatusCode(200).classify(Method::Get), StatusClass::Success);
    }

    #[test]
    fn version_default_keepalive() {
        assert!(Version::Http11.default_keep_alive());
        assert!(!Version::Http10.default_keep_alive());
    }
}

//! The request seam between a [`KeyValue`](crate::KeyValue) handle and the network

use std::sync::Arc;

use http::Method;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::Result;

/// RFC 3986 unreserved characters stay as-is, everything else is percent-encoded.
/// `/` is encoded too, so a key or value always stays a single path segment.
const PATH_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a key or value for use as one path segment.
pub fn encode_component(component: &str) -> String {
    utf8_percent_encode(component, PATH_COMPONENT).to_string()
}

/// Something that can deliver a request to the keyvalue service.
///
/// `path` is already escaped and starts with `/`. An implementation returns
/// the response body of a `200 OK` with a single trailing newline removed,
/// [`Error::Remote`](crate::Error::Remote) for any other status, and a
/// transport-class error if no status was received.
pub trait Transport {
    /// Send one request and return the body text
    fn send(&self, method: Method, path: &str) -> Result<String>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, method: Method, path: &str) -> Result<String> {
        (**self).send(method, path)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, method: Method, path: &str) -> Result<String> {
        (**self).send(method, path)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, method: Method, path: &str) -> Result<String> {
        (**self).send(method, path)
    }
}

/// Strip exactly one trailing `\n`, nothing else.
pub(crate) fn strip_trailing_newline(mut body: String) -> String {
    if body.ends_with('\n') {
        body.pop();
    }
    body
}

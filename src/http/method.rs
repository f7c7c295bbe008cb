// Copyright (c) 2019 Parity Technologies (UK) Ltd.
// Copyright (c) 2016 twist developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Closed set of HTTP request methods (RFC 7231, RFC 5789, WebDAV, upnp,
//! subversion, CalDAV, icecast).

use std::fmt;

/// An HTTP request method.
///
/// This is a closed set: an unrecognized token in the request line is a
/// [`ParseError::UnknownMethod`](crate::http::ParseError::UnknownMethod), not
/// an open extension point.
///
/// Grounded on `g6::http::method` (original_source/include/g6/http/http.hpp),
/// which enumerates exactly these 34 tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[allow(missing_docs)]
pub enum Method {
    Delete,
    Get,
    Head,
    Post,
    Put,
    Connect,
    Options,
    Trace,
    Copy,
    Lock,
    MkCol,
    Move,
    PropFind,
    PropPatch,
    Search,
    Unlock,
    Bind,
    Rebind,
    Unbind,
    Acl,
    Report,
    MkActivity,
    Checkout,
    Merge,
    MSearch,
    Notify,
    Subscribe,
    Unsubscribe,
    Patch,
    Purge,
    MkCalendar,
    Link,
    Unlink,
    Source,
}

impl Method {
    /// Resolve a request-line token against the closed method set.
    pub fn parse(token: &str) -> Option<Method> {
        use Method::*;
        Some(match token {
            "DELETE" => Delete,
            "GET" => Get,
            "HEAD" => Head,
            "POST" => Post,
            "PUT" => Put,
            "CONNECT" => Connect,
            "OPTIONS" => Options,
            "TRACE" => Trace,
            "COPY" => Copy,
            "LOCK" => Lock,
            "MKCOL" => MkCol,
            "MOVE" => Move,
            "PROPFIND" => PropFind,
            "PROPPATCH" => PropPatch,
            "SEARCH" => Search,
            "UNLOCK" => Unlock,
            "BIND" => Bind,
            "REBIND" => Rebind,
            "UNBIND" => Unbind,
            "ACL" => Acl,
            "REPORT" => Report,
            "MKACTIVITY" => MkActivity,
            "CHECKOUT" => Checkout,
            "MERGE" => Merge,
            "M-SEARCH" => MSearch,
            "NOTIFY" => Notify,
            "SUBSCRIBE" => Subscribe,
            "UNSUBSCRIBE" => Unsubscribe,
            "PATCH" => Patch,
            "PURGE" => Purge,
            "MKCALENDAR" => MkCalendar,
            "LINK" => Link,
            "UNLINK" => Unlink,
            "SOURCE" => Source,
            _ => return None,
        })
    }

    /// The wire token for this method (used by the request-line builder).
    pub fn as_str(&self) -> &'static str {
        use Method::*;
        match self {
            Delete => "DELETE",
            Get => "GET",
            Head => "HEAD",
            Post => "POST",
            Put => "PUT",
            Connect => "CONNECT",
            Options => "OPTIONS",
            Trace => "TRACE",
            Copy => "COPY",
            Lock => "LOCK",
            MkCol => "MKCOL",
            Move => "MOVE",
            PropFind => "PROPFIND",
            PropPatch => "PROPPATCH",
            Search => "SEARCH",
            Unlock => "UNLOCK",
            Bind => "BIND",
            Rebind => "REBIND",
            Unbind => "UNBIND",
            Acl => "ACL",
            Report => "REPORT",
            MkActivity => "MKACTIVITY",
            Checkout => "CHECKOUT",
            Merge => "MERGE",
            MSearch => "M-SEARCH",
            Notify => "NOTIFY",
            Subscribe => "SUBSCRIBE",
            Unsubscribe => "UNSUBSCRIBE",
            Patch => "PATCH",
            Purge => "PURGE",
            MkCalendar => "MKCALENDAR",
            Link => "LINK",
            Unlink => "UNLINK",
            Source => "SOURCE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

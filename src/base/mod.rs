//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): Network error codes in the style of Chromium's `net_error_list.h`
//! - [`hostport`]: `host:port` splitting and joining

pub mod context;
pub mod hostport;
pub mod neterror;

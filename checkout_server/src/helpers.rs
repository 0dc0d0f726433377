use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use log::{debug, trace};
use regex::Regex;

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req.headers().get("X-Forwarded-For").and_then(|v| v.to_str().ok()).and_then(x_forwarded_for);
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req.headers().get("Forwarded").and_then(|v| v.to_str().ok()).and_then(forwarded_for);
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr().map(|a| a.ip());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr
    })
}

/// The originating client is the first entry in the list.
fn x_forwarded_for(header: &str) -> Option<IpAddr> {
    header.split(',').next().and_then(|s| IpAddr::from_str(s.trim()).ok())
}

/// Reads the first `for=` node of an RFC 7239 `Forwarded` header. Quoted and bracketed IPv6 nodes are accepted.
fn forwarded_for(header: &str) -> Option<IpAddr> {
    let re = Regex::new(r#"(?i)for=(?P<ip>[^;,]+)"#).ok()?;
    let node = re.captures(header)?.name("ip")?.as_str();
    let node = node.trim().trim_matches('"');
    let node = match node.strip_prefix('[') {
        Some(v6) => v6.split(']').next()?,
        None => node.split(':').next()?,
    };
    IpAddr::from_str(node).ok()
}

//! Endpoint-specification grammar.
//!
//! An attachment specification is a comma-separated list of endpoints. Each
//! endpoint may be prefixed with `@` (force bind) or `>` (force connect);
//! without a prefix the socket's default direction applies. Segments are
//! used exactly as written, with no whitespace trimming, so callers must
//! not put spaces after commas.
//!
//! A TCP endpoint whose final component is a decimal port or the `*`
//! wildcard (`tcp://host:5555`, `tcp://*:0`, `tcp://eth0:*`) additionally
//! participates in dynamic port resolution on bind.

/// Whether an endpoint is attached by binding locally or connecting out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Bind,
    Connect,
}

/// Split an attachment specification into its endpoint segments.
///
/// Empty segments (from leading, trailing, or doubled commas) are yielded
/// as-is; they fail later at bind/connect with the transport's own error.
pub fn split_spec(spec: &str) -> impl Iterator<Item = &str> {
    spec.split(',')
}

/// Resolve one endpoint segment against a default direction.
///
/// Returns the direction to use and the endpoint with any forcing prefix
/// stripped.
pub fn classify(endpoint: &str, default: Direction) -> (Direction, &str) {
    if let Some(rest) = endpoint.strip_prefix('@') {
        (Direction::Bind, rest)
    } else if let Some(rest) = endpoint.strip_prefix('>') {
        (Direction::Connect, rest)
    } else {
        (default, endpoint)
    }
}

/// The trailing port token of a TCP endpoint, when the endpoint matches
/// `tcp://<anything>:<digits or *>`.
///
/// Returns the token itself (`"5555"`, `"0"`, or `"*"`); endpoints in other
/// schemes, or TCP endpoints without a final port component, return `None`
/// and take the plain bind path.
pub fn tcp_port_token(endpoint: &str) -> Option<&str> {
    let rest = endpoint.strip_prefix("tcp://")?;
    let idx = rest.rfind(':')?;
    let token = &rest[idx + 1..];
    if token == "*" || (!token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())) {
        Some(token)
    } else {
        None
    }
}

/// Parse the `:<port>` suffix of a resolved endpoint string, as reported by
/// the transport's last-bound-endpoint option.
pub fn trailing_port(endpoint: &str) -> Option<u16> {
    let idx = endpoint.rfind(':')?;
    endpoint[idx + 1..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeps_segments_verbatim() {
        let segments: Vec<&str> = split_spec("@tcp://*:0,>tcp://host:5555").collect();
        assert_eq!(segments, vec!["@tcp://*:0", ">tcp://host:5555"]);

        // no trimming: the space stays attached to the segment
        let segments: Vec<&str> = split_spec("a, b").collect();
        assert_eq!(segments, vec!["a", " b"]);

        let segments: Vec<&str> = split_spec("").collect();
        assert_eq!(segments, vec![""]);
    }

    #[test]
    fn test_classify_prefixes() {
        assert_eq!(
            classify("@tcp://*:5555", Direction::Connect),
            (Direction::Bind, "tcp://*:5555")
        );
        assert_eq!(
            classify(">tcp://host:5555", Direction::Bind),
            (Direction::Connect, "tcp://host:5555")
        );
        assert_eq!(
            classify("inproc://x", Direction::Bind),
            (Direction::Bind, "inproc://x")
        );
        assert_eq!(
            classify("inproc://x", Direction::Connect),
            (Direction::Connect, "inproc://x")
        );
    }

    #[test]
    fn test_tcp_port_token() {
        assert_eq!(tcp_port_token("tcp://127.0.0.1:5555"), Some("5555"));
        assert_eq!(tcp_port_token("tcp://*:0"), Some("0"));
        assert_eq!(tcp_port_token("tcp://eth0:*"), Some("*"));
        assert_eq!(tcp_port_token("tcp://[::1]:5555"), Some("5555"));
        assert_eq!(tcp_port_token("inproc://name"), None);
        assert_eq!(tcp_port_token("tcp://host"), None);
        assert_eq!(tcp_port_token("tcp://host:"), None);
        assert_eq!(tcp_port_token("tcp://host:port"), None);
    }

    #[test]
    fn test_trailing_port() {
        assert_eq!(trailing_port("tcp://127.0.0.1:49153"), Some(49153));
        assert_eq!(trailing_port("tcp://*:0"), Some(0));
        assert_eq!(trailing_port("inproc://name"), None);
        assert_eq!(trailing_port("no-colon"), None);
    }
}

//! Attach target addressing

use crate::ProtocolError;
use std::fmt;
use url::Url;

/// One (session, window) pair an attachment binds to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttachTarget {
    /// Session name
    pub session: String,
    /// Window index within the session
    pub window_index: u32,
}

impl AttachTarget {
    pub fn new(session: impl Into<String>, window_index: u32) -> Self {
        Self {
            session: session.into(),
            window_index,
        }
    }
}

impl fmt::Display for AttachTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.session, self.window_index)
    }
}

/// Build the attach URL for `target`: `{base}{path}?session=<name>&window=<index>`
///
/// The session name is percent-encoded; any query already on `base` is replaced.
pub fn attach_url(base: &str, path: &str, target: &AttachTarget) -> Result<Url, ProtocolError> {
    let mut url = Url::parse(base)?.join(path)?;
    url.query_pairs_mut()
        .clear()
        .append_pair("session", &target.session)
        .append_pair("window", &target.window_index.to_string());
    Ok(url)
}

//! URL construction for the FileBrowser API.
//!
//! Every request URL is `<base_url><endpoint><remote path>`. Remote paths are
//! normalised to start with `/` and escaped so that names containing spaces or
//! `?`/`#` survive the trip; `/` separators are kept as-is.

use fbsync_types::api::{LOGIN_PATH, RAW_PREFIX, RENEW_PATH, RESOURCES_PREFIX, SMB_PATH};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a remote path.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Characters escaped inside a query value.
const QUERY_VALUE: &AsciiSet = &PATH.add(b'&').add(b'=').add(b'+');

/// URL builder bound to one service base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    base: String,
}

impl Routes {
    /// Create routes for `base_url`. A trailing `/` is dropped.
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The normalised base URL.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// `POST` login endpoint.
    pub fn login(&self) -> String {
        format!("{}{}", self.base, LOGIN_PATH)
    }

    /// `POST` renew endpoint.
    pub fn renew(&self) -> String {
        format!("{}{}", self.base, RENEW_PATH)
    }

    /// Resource endpoint: list, info, upload, delete.
    pub fn resources(&self, path: &str) -> String {
        format!("{}{}{}", self.base, RESOURCES_PREFIX, encode_path(path))
    }

    /// Raw download endpoint.
    pub fn raw(&self, path: &str) -> String {
        format!("{}{}{}", self.base, RAW_PREFIX, encode_path(path))
    }

    /// Directory creation: the resource URL with a trailing `/`.
    pub fn mkdir(&self, path: &str) -> String {
        let url = self.resources(path);
        if url.ends_with('/') {
            url
        } else {
            format!("{}/", url)
        }
    }

    /// Rename: `PATCH` on the source with the destination in the query.
    pub fn rename(&self, path: &str, destination: &str) -> String {
        let destination = normalize(destination);
        format!(
            "{}?action=rename&destination={}",
            self.resources(path),
            utf8_percent_encode(&destination, QUERY_VALUE)
        )
    }

    /// Share request endpoint.
    pub fn smb(&self) -> String {
        format!("{}{}", self.base, SMB_PATH)
    }
}

/// Ensure a remote path starts with `/`.
pub fn normalize(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Join a remote directory and a file name with exactly one `/`.
pub fn join_remote(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    format!("{}/{}", dir, name)
}

fn encode_path(path: &str) -> String {
    utf8_percent_encode(&normalize(path), PATH).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> Routes {
        Routes::new("http://host")
    }

    #[test]
    fn trailing_slash_dropped_from_base() {
        assert_eq!(Routes::new("http://host/").base(), "http://host");
        assert_eq!(Routes::new("http://host/fb//").login(), "http://host/fb/api/login");
    }

    #[test]
    fn fixed_endpoints() {
        assert_eq!(routes().login(), "http://host/api/login");
        assert_eq!(routes().renew(), "http://host/api/renew");
        assert_eq!(routes().smb(), "http://host/api/smb");
    }

    #[test]
    fn resource_and_raw_paths() {
        assert_eq!(routes().resources("/"), "http://host/api/resources/");
        assert_eq!(
            routes().resources("/docs/a.txt"),
            "http://host/api/resources/docs/a.txt"
        );
        assert_eq!(routes().raw("docs/a.txt"), "http://host/api/raw/docs/a.txt");
    }

    #[test]
    fn paths_are_escaped() {
        assert_eq!(
            routes().raw("/my file#1?.txt"),
            "http://host/api/raw/my%20file%231%3F.txt"
        );
    }

    #[test]
    fn mkdir_has_trailing_slash() {
        assert_eq!(routes().mkdir("/photos"), "http://host/api/resources/photos/");
        assert_eq!(routes().mkdir("/photos/"), "http://host/api/resources/photos/");
    }

    #[test]
    fn rename_carries_destination() {
        assert_eq!(
            routes().rename("/a.txt", "b & c.txt"),
            "http://host/api/resources/a.txt?action=rename&destination=/b%20%26%20c.txt"
        );
    }

    #[test]
    fn join_remote_uses_single_slash() {
        assert_eq!(join_remote("/", "a.txt"), "/a.txt");
        assert_eq!(join_remote("/backup/", "a.txt"), "/backup/a.txt");
        assert_eq!(join_remote("/backup", "/a.txt"), "/backup/a.txt");
        assert_eq!(join_remote("", "a.txt"), "/a.txt");
    }
}

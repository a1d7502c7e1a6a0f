use url::Url;

use crate::error::Error;

/// Fetches the raw bytes behind a URL.
///
/// Parsing never does I/O itself; [`Document::parse_url_with`](crate::Document::parse_url_with)
/// asks a loader for the bytes and parses whatever it returns.
pub trait Loader {
    /// Load all bytes for `url`.
    fn load(&self, url: &Url) -> Result<Vec<u8>, Error>;
}

/// Loads `file:` URLs from the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl Loader for FileLoader {
    fn load(&self, url: &Url) -> Result<Vec<u8>, Error> {
        if url.scheme() != "file" {
            return Err(Error::UnsupportedScheme(url.scheme().to_string()));
        }
        let path = url
            .to_file_path()
            .map_err(|_| Error::UnsupportedScheme(url.to_string()))?;
        Ok(std::fs::read(path)?)
    }
}

impl<F> Loader for F
where
    F: Fn(&Url) -> Result<Vec<u8>, Error>,
{
    fn load(&self, url: &Url) -> Result<Vec<u8>, Error> {
        self(url)
    }
}

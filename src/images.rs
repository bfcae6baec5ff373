use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::blocking::Client;
use spdlog::{info, warn};
use url::Url;

use crate::error::FetchError;

/// Longest accepted extension, dot included
const MAX_EXT_LEN: usize = 5;

/// Retrieves the raw bytes of an image.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Single GET per image, no retries.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.bytes()?.to_vec())
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct ProcessedImages {
    pub body: String,
    /// File names of the images saved next to the post, in discovery order
    pub attached: Vec<String>,
}

/// Secure image links, both `![alt](url)` and `<img src="url">`, in the
/// order they appear in the text. Repeated links are kept.
pub fn extract_image_urls(markdown: &str) -> Vec<&str> {
    lazy_static! {
        static ref MD_IMAGE_REGEX: Regex = Regex::new(
            r"!\[[^\]]*\]\((?P<url>https://[^)]+)\)"
        ).unwrap();
        static ref HTML_IMAGE_REGEX: Regex = Regex::new(
            r#"<img[^>]+src=["'](?P<url>https://[^"']+)["']"#
        ).unwrap();
    }

    let mut found: Vec<(usize, &str)> = [&*MD_IMAGE_REGEX, &*HTML_IMAGE_REGEX]
        .into_iter()
        .flat_map(|re| re.captures_iter(markdown))
        .filter_map(|cap| cap.name("url"))
        .map(|url| (url.start(), url.as_str()))
        .collect();
    found.sort_by_key(|(start, _)| *start);

    found.into_iter().map(|(_, url)| url).collect()
}

/// Extension of the last path segment of the url, or `default_ext` when
/// there is none or it looks too long to be one.
pub fn image_extension(url: &str, default_ext: &str) -> String {
    let file_name = Url::parse(url)
        .ok()
        .and_then(|url| url.path_segments()?.filter(|s| !s.is_empty()).last().map(str::to_string))
        .unwrap_or_default();

    match file_name.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < file_name.len() && file_name.len() - dot <= MAX_EXT_LEN => {
            file_name[dot..].to_string()
        }
        _ => default_ext.to_string(),
    }
}

fn save_image(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, data)
}

/// Downloads every image referenced in `body` into `post_folder` as
/// `image<N><ext>` and points the body at the local copies. Images that
/// cannot be retrieved keep their original url.
pub fn process_images(body: &str, post_folder: &Path, fetcher: &dyn ImageFetcher, default_ext: &str) -> ProcessedImages {
    let image_urls = extract_image_urls(body);
    let mut updated_body = body.to_string();
    let mut attached = vec![];

    for (i, url) in image_urls.into_iter().enumerate() {
        let file_name = format!("image{}{}", i + 1, image_extension(url, default_ext));
        let output_path = post_folder.join(&file_name);

        let data = match fetcher.fetch(url) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to download {}: {}", url, e);
                continue;
            }
        };
        if let Err(e) = save_image(&output_path, &data) {
            warn!("Failed to save {} to {}: {}", url, output_path.display(), e);
            continue;
        }

        info!("Downloaded: {} -> {}", url, output_path.display());
        updated_body = updated_body.replace(url, &file_name);
        attached.push(file_name);
    }

    ProcessedImages {
        body: updated_body,
        attached,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Serves canned bytes, every other url fails with a 404
    pub struct StaticFetcher(pub HashMap<String, Vec<u8>>);

    impl StaticFetcher {
        pub fn with(urls: &[(&str, &str)]) -> Self {
            Self(urls.iter().map(|(url, data)| (url.to_string(), data.as_bytes().to_vec())).collect())
        }
    }

    impl ImageFetcher for StaticFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.0.get(url).cloned().ok_or(FetchError::Status(404))
        }
    }

    #[test]
    fn test_extract_image_urls() {
        let md = r#"Intro ![first](https://a.com/1.png) text
<img width="10" src="https://b.com/2.gif"> and ![](https://c.com/3)
<img src='https://d.com/4.jpg' />
![insecure](http://e.com/5.png) <img src="http://f.com/6.png">
![upper](HTTPS://g.com/7.png) [link](https://h.com/page)"#;
        let urls = extract_image_urls(md);
        assert_eq!(urls, ["https://a.com/1.png", "https://b.com/2.gif", "https://c.com/3", "https://d.com/4.jpg"]);
    }

    #[test]
    fn test_extract_keeps_duplicates() {
        let md = "![a](https://a.com/x.png)\n![b](https://a.com/x.png)";
        assert_eq!(extract_image_urls(md).len(), 2);
        assert!(extract_image_urls("no images here").is_empty());
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("https://a.com/p.jpg", ".png"), ".jpg");
        assert_eq!(image_extension("https://a.com/dir/photo.jpeg?size=large#top", ".png"), ".jpeg");
        assert_eq!(image_extension("https://a.com/img.webp", ".png"), ".webp");
        assert_eq!(image_extension("https://a.com/archive.tar.backup", ".png"), ".png");
        assert_eq!(image_extension("https://github.com/user-attachments/assets/0a1b2c3d", ".png"), ".png");
        assert_eq!(image_extension("https://a.com/.hidden", ".png"), ".png");
        assert_eq!(image_extension("https://a.com/", ".png"), ".png");
        assert_eq!(image_extension("https://a.com/img.jpg/", ".png"), ".jpg");
        assert_eq!(image_extension("not a url", ".gif"), ".gif");
    }

    // Answers a single request with the given status line and no body
    fn serve_once(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = vec![];
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!("{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", status_line);
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{}/a.png", addr)
    }

    #[test]
    fn test_http_fetcher_failures() {
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        let url = serve_once("HTTP/1.1 404 Not Found");
        assert!(matches!(fetcher.fetch(&url), Err(FetchError::Status(404))));

        // Nothing listens on port 1
        assert!(matches!(fetcher.fetch("https://127.0.0.1:1/a.png"), Err(FetchError::Http(_))));
    }

    #[test]
    fn test_rewrite_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::with(&[("https://a.com/p.jpg", "jpeg-bytes")]);

        let res = process_images("![x](https://a.com/p.jpg)", dir.path(), &fetcher, ".png");
        assert_eq!(res.body, "![x](image1.jpg)");
        assert_eq!(res.attached, ["image1.jpg"]);
        assert_eq!(fs::read(dir.path().join("image1.jpg")).unwrap(), b"jpeg-bytes");
    }

    #[test]
    fn test_failure_keeps_url() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::with(&[]);

        let res = process_images("![x](https://a.com/p.jpg)", dir.path(), &fetcher, ".png");
        assert_eq!(res.body, "![x](https://a.com/p.jpg)");
        assert!(res.attached.is_empty());
        assert!(!dir.path().join("image1.jpg").exists());
    }

    #[test]
    fn test_partial_failure_keeps_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let post_folder = dir.path().join("2024").join("240305-post");
        let fetcher = StaticFetcher::with(&[
            ("https://a.com/one.png", "1"),
            ("https://a.com/three", "3"),
        ]);
        let body = "![1](https://a.com/one.png)\n![2](https://a.com/two.gif)\n<img src=\"https://a.com/three\">\nsee https://a.com/one.png";

        let res = process_images(body, &post_folder, &fetcher, ".png");
        assert_eq!(res.attached, ["image1.png", "image3.png"]);
        assert_eq!(res.body, "![1](image1.png)\n![2](https://a.com/two.gif)\n<img src=\"image3.png\">\nsee image1.png");
        assert!(post_folder.join("image3.png").exists());
    }

    #[test]
    fn test_duplicates_download_twice() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher::with(&[("https://a.com/x.png", "x")]);

        let res = process_images("![a](https://a.com/x.png) ![b](https://a.com/x.png)", dir.path(), &fetcher, ".png");
        assert_eq!(res.body, "![a](image1.png) ![b](image1.png)");
        assert_eq!(res.attached, ["image1.png", "image2.png"]);
        assert!(dir.path().join("image2.png").exists());
    }
}

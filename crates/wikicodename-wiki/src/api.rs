//! MediaWiki `action=parse` URLs and response decoding.

use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::error::{FetchError, Result};

const API_PATH: &str = "/w/api.php";

/// URL listing the sections of `page`.
pub fn section_list_url(wikipedia_url: &str, page: &str) -> Result<String> {
    api_url(wikipedia_url, page, None)
}

/// URL returning the rendered markup of one section of `page`.
pub fn section_url(wikipedia_url: &str, page: &str, section: u32) -> Result<String> {
    api_url(wikipedia_url, page, Some(section))
}

fn api_url(wikipedia_url: &str, page: &str, section: Option<u32>) -> Result<String> {
    let mut url = Url::parse(wikipedia_url)
        .and_then(|base| base.join(API_PATH))
        .map_err(|source| FetchError::InvalidUrl {
            url: wikipedia_url.to_string(),
            source,
        })?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("action", "parse")
            .append_pair("page", page)
            .append_pair("format", "json");
        match section {
            Some(index) => {
                query
                    .append_pair("section", &index.to_string())
                    .append_pair("prop", "text")
                    .append_pair("disabletoc", "1")
                    .append_pair("disableeditsection", "1");
            }
            None => {
                query.append_pair("prop", "sections");
            }
        }
    }

    Ok(url.into())
}

/// Decodes a section list response into `(index, title)` pairs, led by the
/// synthetic `(0, "")` lead section.
pub fn decode_section_list(page: &str, body: &str) -> Result<Vec<(u32, String)>> {
    let data = decode(page, body)?;
    let sections = data
        .get("parse")
        .and_then(|parse| parse.get("sections"))
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::UnexpectedFormat {
            page: page.to_string(),
        })?;

    let mut result = vec![(0, String::new())];
    for section in sections {
        let index = match section.get("index") {
            Some(Value::String(index)) => index.as_str(),
            _ => "",
        };
        if index.is_empty() {
            continue;
        }
        let Ok(index) = index.parse::<u32>() else {
            warn!(page, index, "skipping section with a non-numeric index");
            continue;
        };
        let title = section
            .get("line")
            .and_then(Value::as_str)
            .ok_or_else(|| FetchError::UnexpectedFormat {
                page: page.to_string(),
            })?;
        result.push((index, title.to_string()));
    }
    Ok(result)
}

/// Extracts the rendered markup from a section response.
pub fn decode_section_text(page: &str, body: &str) -> Result<String> {
    let data = decode(page, body)?;
    data.get("parse")
        .and_then(|parse| parse.get("text"))
        .and_then(|text| text.get("*"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FetchError::UnexpectedFormat {
            page: page.to_string(),
        })
}

fn decode(page: &str, body: &str) -> Result<Value> {
    let data: Value = serde_json::from_str(body).map_err(|source| FetchError::Decode {
        page: page.to_string(),
        source,
    })?;
    if let Some(info) = data
        .get("error")
        .and_then(|error| error.get("info"))
        .and_then(Value::as_str)
    {
        return Err(FetchError::Remote {
            page: page.to_string(),
            info: info.to_string(),
        });
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_section_list_url() {
        let url = section_list_url("https://en.wikipedia.org/wiki/Main_Page", "List of colors: A–F")
            .expect("url");
        assert_eq!(
            url,
            "https://en.wikipedia.org/w/api.php?action=parse&page=List+of+colors%3A+A%E2%80%93F&format=json&prop=sections"
        );
    }

    #[test]
    fn builds_section_url() {
        let url = section_url("https://de.wikipedia.org/", "Katze", 3).expect("url");
        assert_eq!(
            url,
            "https://de.wikipedia.org/w/api.php?action=parse&page=Katze&format=json&section=3&prop=text&disabletoc=1&disableeditsection=1"
        );
    }

    #[test]
    fn rejects_unparseable_base() {
        let err = section_list_url("not a url", "Cat").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[test]
    fn section_list_keeps_order_and_prepends_lead() {
        let body = r#"{"parse":{"title":"Cat","sections":[
            {"index":"1","line":"Taxonomy"},
            {"index":"","line":"Transcluded"},
            {"index":"T-1","line":"Template"},
            {"index":"2","line":"References"}
        ]}}"#;
        let sections = decode_section_list("Cat", body).expect("sections");
        assert_eq!(
            sections,
            vec![
                (0, String::new()),
                (1, "Taxonomy".to_string()),
                (2, "References".to_string()),
            ]
        );
    }

    #[test]
    fn remote_error_info_is_surfaced() {
        let body = r#"{"error":{"code":"missingtitle","info":"The page you specified doesn't exist."}}"#;
        let err = decode_section_list("Nope", body).unwrap_err();
        match err {
            FetchError::Remote { page, info } => {
                assert_eq!(page, "Nope");
                assert_eq!(info, "The page you specified doesn't exist.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_text_is_unexpected_format() {
        let err = decode_section_text("Cat", r#"{"parse":{"title":"Cat"}}"#).unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedFormat { .. }));
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let err = decode_section_text("Cat", "<html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }
}

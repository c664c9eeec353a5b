//! Listing URLs for a remote site's posts endpoint.

use url::Url;

use crate::constants::DEFAULT_POST_TYPE;
use crate::error::ClientError;

/// One or more post types to list, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTypes(Vec<String>);

impl PostTypes {
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for PostTypes {
    fn default() -> Self {
        Self(vec![DEFAULT_POST_TYPE.to_string()])
    }
}

impl From<&str> for PostTypes {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for PostTypes {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<String>> for PostTypes {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl From<&[&str]> for PostTypes {
    fn from(value: &[&str]) -> Self {
        Self(value.iter().map(ToString::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PostTypes {
    fn from(value: [&str; N]) -> Self {
        Self(value.iter().map(ToString::to_string).collect())
    }
}

/// Ordered `filter[<key>]` parameters.
///
/// Setting a key twice keeps its first position and the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(Vec<(String, String)>);

impl Filters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Self::new();
        for (k, v) in iter {
            filters.insert(k, v);
        }
        filters
    }
}

/// Build the URL listing posts of the given types on `root_url`.
///
/// The URL is `<root_url><endpoint_base>` with one `type[]` parameter per
/// post type followed by one `filter[<key>]` parameter per filter, all
/// form-urlencoded.
///
/// # Errors
///
/// Returns `InvalidUrl` if the joined root and endpoint do not parse.
pub fn build_listing_url(
    post_types: impl Into<PostTypes>,
    filters: Option<&Filters>,
    endpoint_base: &str,
    root_url: &str,
) -> Result<String, ClientError> {
    let joined = format!("{root_url}{endpoint_base}");
    let mut url = Url::parse(&joined).map_err(|source| ClientError::InvalidUrl {
        url: joined.clone(),
        source,
    })?;

    let post_types = post_types.into();
    {
        let mut query = url.query_pairs_mut();
        for post_type in post_types.as_slice() {
            query.append_pair("type[]", post_type);
        }
        if let Some(filters) = filters {
            for (key, value) in filters.iter() {
                query.append_pair(&format!("filter[{key}]"), value);
            }
        }
    }

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(url: &str) -> Vec<(String, String)> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_single_type_no_filters() {
        let url = build_listing_url("post", Some(&Filters::new()), "/posts", "https://example.com")
            .unwrap();
        assert_eq!(url, "https://example.com/posts?type%5B%5D=post");
    }

    #[test]
    fn test_types_keep_order_and_duplicates() {
        let url = build_listing_url(
            ["page", "post", "page"],
            None,
            "/wp-json/posts",
            "https://example.com",
        )
        .unwrap();

        assert_eq!(
            params(&url),
            vec![
                ("type[]".to_string(), "page".to_string()),
                ("type[]".to_string(), "post".to_string()),
                ("type[]".to_string(), "page".to_string()),
            ]
        );
    }

    #[test]
    fn test_filters_follow_types() {
        let filters: Filters = [("posts_per_page", "5"), ("category_name", "news & views")]
            .into_iter()
            .collect();
        let url = build_listing_url("post", Some(&filters), "/posts", "https://example.com")
            .unwrap();

        assert_eq!(
            params(&url),
            vec![
                ("type[]".to_string(), "post".to_string()),
                ("filter[posts_per_page]".to_string(), "5".to_string()),
                ("filter[category_name]".to_string(), "news & views".to_string()),
            ]
        );
        assert!(url.contains("filter%5Bcategory_name%5D=news+%26+views"));
    }

    #[test]
    fn test_repeated_filter_key_last_write_wins() {
        let mut filters = Filters::new();
        filters.insert("s", "first");
        filters.insert("order", "asc");
        filters.insert("s", "second");

        assert_eq!(filters.len(), 2);
        let url = build_listing_url("post", Some(&filters), "/posts", "https://example.com")
            .unwrap();
        assert_eq!(
            params(&url)[1..],
            [
                ("filter[s]".to_string(), "second".to_string()),
                ("filter[order]".to_string(), "asc".to_string()),
            ]
        );
    }

    #[test]
    fn test_existing_query_is_preserved() {
        let url = build_listing_url("post", None, "/?rest_route=/posts", "https://example.com")
            .unwrap();
        assert_eq!(
            params(&url),
            vec![
                ("rest_route".to_string(), "/posts".to_string()),
                ("type[]".to_string(), "post".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_root_is_rejected() {
        let err = build_listing_url("post", None, "/posts", "not a url").unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl { .. }));
    }

    #[test]
    fn test_default_post_type() {
        assert_eq!(PostTypes::default().as_slice(), ["post".to_string()]);
        let types: PostTypes = vec!["a".to_string(), "b".to_string()].into();
        assert_eq!(types.as_slice().len(), 2);
    }
}

use crate::{ConfigError, LIMIT_PLACEHOLDER, LIMIT_QUERY_PARAM};
use url::Url;

/// Where each job's request is sent.
///
/// A template containing `{limit}` has the placeholder substituted verbatim. Any other template
/// is treated as a base URL and gets a `limit` query parameter, replacing one if present.
#[derive(Clone, Debug)]
pub struct TargetTemplate {
    raw: String,
    shape: Shape,
}

#[derive(Clone, Debug)]
enum Shape {
    Placeholder,
    Query(Url),
}

impl TargetTemplate {
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let shape = if template.contains(LIMIT_PLACEHOLDER) {
            // Any digits are as good as any others for checking the URL shape.
            check_url(template, &template.replace(LIMIT_PLACEHOLDER, "1"))?;
            Shape::Placeholder
        } else {
            Shape::Query(check_url(template, template)?)
        };

        Ok(Self {
            raw: template.to_string(),
            shape,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url_for(&self, limit: u32) -> Result<Url, url::ParseError> {
        match &self.shape {
            Shape::Placeholder => {
                Url::parse(&self.raw.replace(LIMIT_PLACEHOLDER, &limit.to_string()))
            }
            Shape::Query(base) => {
                let mut url = base.clone();
                let kept: Vec<(String, String)> = base
                    .query_pairs()
                    .filter(|(key, _)| key != LIMIT_QUERY_PARAM)
                    .map(|(key, value)| (key.into_owned(), value.into_owned()))
                    .collect();
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(kept)
                    .append_pair(LIMIT_QUERY_PARAM, &limit.to_string());
                Ok(url)
            }
        }
    }
}

fn check_url(template: &str, candidate: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(candidate).map_err(|source| ConfigError::InvalidTarget {
        template: template.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

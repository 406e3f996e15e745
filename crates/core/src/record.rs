//! Typed view over loosely-typed upstream card records.
//!
//! The upstream schema spells the same field several ways. Each logical field
//! has an ordered alias list; the first alias holding a usable value wins.
//! Raw JSON never leaves this module.

use crate::ResolutionError;
use cardsheet_types::{CardImage, ResolvedCard};
use serde::Deserialize;
use serde::de::IgnoredAny;
use serde_json::Value;

const NAME_ALIASES: &[&str] = &["name", "Name", "cardName"];
const SET_ALIASES: &[&str] = &["set", "setCode", "code", "Set", "set_code"];
const NUMBER_ALIASES: &[&str] = &["setnumber", "number", "collector_number", "Number"];
/// Dotted entries address nested objects.
const IMAGE_ALIASES: &[&str] = &["image", "images.large", "images.front", "img", "imageUrl", "FrontArt"];

/// The envelopes a list response may arrive in.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope {
    List(Vec<Value>),
    Data { data: Vec<Value> },
    Values { values: Vec<Value> },
    Other(IgnoredAny),
}

impl Envelope {
    fn into_items(self) -> Vec<Value> {
        match self {
            Envelope::List(items) | Envelope::Data { data: items } | Envelope::Values { values: items } => {
                items
            }
            Envelope::Other(_) => Vec::new(),
        }
    }
}

/// Parses a list response and returns its items. Unknown object shapes are empty.
pub fn parse_list(body: &[u8]) -> Result<Vec<Value>, serde_json::Error> {
    Ok(serde_json::from_slice::<Envelope>(body)?.into_items())
}

/// Parses a catalog response into its names, skipping non-string entries.
pub fn parse_catalog(body: &[u8]) -> Result<Vec<String>, serde_json::Error> {
    Ok(parse_list(body)?
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

fn lookup<'a>(record: &'a Value, alias: &str) -> Option<&'a Value> {
    alias.split('.').try_fold(record, |value, key| value.get(key))
}

/// Strings must be non-blank. Integers count for number-like fields.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
        _ => None,
    }
}

fn probe(record: &Value, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| lookup(record, alias).and_then(scalar))
}

/// Rewrites `http://` and scheme-relative `//` URLs to `https://`.
pub fn normalize_https(url: &str) -> String {
    let url = url.trim();
    if let Some(rest) = url.strip_prefix("//") {
        format!("https://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("https://{rest}")
    } else {
        url.to_string()
    }
}

/// The fields of an upstream card record this crate cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardRecord {
    pub name: Option<String>,
    pub set_code: Option<String>,
    pub number: Option<String>,
    pub image_url: Option<String>,
}

impl CardRecord {
    /// Returns `None` when `value` is not a JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        Some(Self {
            name: probe(value, NAME_ALIASES),
            set_code: probe(value, SET_ALIASES),
            number: probe(value, NUMBER_ALIASES),
            image_url: probe(value, IMAGE_ALIASES).map(|u| normalize_https(&u)),
        })
    }

    /// Prefers the printing identifiers; falls back to the direct image URL.
    pub fn into_resolved(self, requested_name: &str) -> Result<ResolvedCard, ResolutionError> {
        let image = match (self.set_code, self.number, self.image_url) {
            (Some(set_code), Some(number), _) => CardImage::Printing { set_code, number },
            (_, _, Some(url)) => CardImage::Direct(url),
            _ => return Err(ResolutionError::NoImage(requested_name.to_string())),
        };
        Ok(ResolvedCard {
            requested_name: requested_name.to_string(),
            display_name: self.name.unwrap_or_else(|| requested_name.to_string()),
            image,
        })
    }
}

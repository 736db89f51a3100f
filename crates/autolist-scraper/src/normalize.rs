//! Normalization from heterogeneous upstream records to [`autolist_core::Listing`].
//!
//! Three record shapes are known. Each has its own pure mapping function;
//! title synthesis and URL completion are shared afterwards so every shape
//! ends in the same canonical form.
//!
//! ### `Flat`
//! Everything at top level, as the REST channel returns it:
//! `{"title", "price": "$30,000", "location": "London", "mileage", "url",
//! "imageUrl", "year", "make", "model"}`. Some variants use `modelYear`,
//! `mileageInKm`, `detailUrl` or an `images` array instead.
//!
//! ### `Nested`
//! `vehicle` / `price` / `location` sub-objects, with the price as a raw
//! amount: `{"vehicle": {"modelYear", "make", "model", "mileageInKm"},
//! "price": {"amount": 30000}, "location": {"city"}, "url", "images": [...]}`.
//! Fields missing from a sub-object are read from the top level instead.
//!
//! ### `NestedFormatted`
//! Same layout, but `price` carries display text: `{"price": {"formatted":
//! "$30,000"}}`.
//!
//! Mileage is taken to be kilometres in every shape. The upstream never states
//! the unit; `mileageInKm` in the richer shapes is the only evidence.

use autolist_core::{compose_title, Listing};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::NormalizationError;

const TITLE_KEYS: [&str; 1] = ["title"];
const URL_KEYS: [&str; 3] = ["url", "detailUrl", "href"];
const YEAR_KEYS: [&str; 2] = ["year", "modelYear"];
const MAKE_KEYS: [&str; 1] = ["make"];
const MODEL_KEYS: [&str; 1] = ["model"];
const MILEAGE_KEYS: [&str; 3] = ["mileage", "mileageInKm", "odometer"];
const IMAGE_KEYS: [&str; 2] = ["imageUrl", "image"];
const IMAGE_LIST_KEYS: [&str; 2] = ["images", "photos"];
const AMOUNT_KEYS: [&str; 2] = ["amount", "value"];
const FORMATTED_PRICE_KEYS: [&str; 2] = ["formatted", "display"];

/// The closed set of record layouts the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordShape {
    Flat,
    Nested,
    NestedFormatted,
}

impl RecordShape {
    /// Picks the shape from the record's layout. Any `vehicle` key, or a
    /// `price` / `location` object, marks the record as nested; a nested
    /// `price` with display text marks it as `NestedFormatted`.
    #[must_use]
    pub fn detect(record: &Value) -> Self {
        let Some(map) = record.as_object() else {
            return RecordShape::Flat;
        };

        let price = map.get("price").and_then(Value::as_object);
        let nested = map.contains_key("vehicle")
            || price.is_some()
            || map.get("location").is_some_and(Value::is_object);

        if !nested {
            return RecordShape::Flat;
        }

        let formatted = price.is_some_and(|p| {
            FORMATTED_PRICE_KEYS
                .iter()
                .any(|k| p.get(*k).is_some_and(Value::is_string))
        });
        if formatted {
            RecordShape::NestedFormatted
        } else {
            RecordShape::Nested
        }
    }
}

/// Maps one upstream record onto the canonical [`Listing`].
///
/// Missing or wrongly-typed sub-objects read as empty, so any JSON object
/// produces a listing, possibly with every field `None`. Relative URLs are
/// completed against `site_origin`.
///
/// # Errors
///
/// Returns [`NormalizationError`] only when `record` is not a JSON object.
pub fn normalize_listing(
    record: &Value,
    shape: RecordShape,
    site_origin: &str,
) -> Result<Listing, NormalizationError> {
    let Value::Object(map) = record else {
        return Err(NormalizationError {
            found: json_type_name(record),
        });
    };
    let fields = Lookup(Some(map));

    let mut listing = match shape {
        RecordShape::Flat => map_flat(fields),
        RecordShape::Nested => map_nested(fields, false),
        RecordShape::NestedFormatted => map_nested(fields, true),
    };

    if listing.title.is_none() {
        listing.title = compose_title(
            listing.year,
            listing.make.as_deref(),
            listing.model.as_deref(),
        );
    }
    listing.identity_url = listing
        .identity_url
        .and_then(|u| absolutize_url(&u, site_origin));
    listing.image_url = listing
        .image_url
        .and_then(|u| absolutize_url(&u, site_origin));

    Ok(listing)
}

fn map_flat(fields: Lookup<'_>) -> Listing {
    Listing {
        identity_url: fields.text(&URL_KEYS),
        title: fields.text(&TITLE_KEYS),
        price_display: fields.get("price").and_then(price_text),
        city: fields.text(&["location", "city"]),
        mileage_km: fields.integer(&MILEAGE_KEYS),
        image_url: first_image(fields).or_else(|| fields.text(&IMAGE_KEYS)),
        year: fields.year(&YEAR_KEYS),
        make: fields.text(&MAKE_KEYS),
        model: fields.text(&MODEL_KEYS),
    }
}

fn map_nested(fields: Lookup<'_>, formatted_price: bool) -> Listing {
    let vehicle = fields.child("vehicle");
    let price = fields.child("price");
    let location = fields.child("location");

    let price_display = if formatted_price {
        price.text(&FORMATTED_PRICE_KEYS)
    } else {
        AMOUNT_KEYS.iter().find_map(|k| price.get(k).and_then(price_text))
    };
    let price_display = price_display.or_else(|| fields.get("price").and_then(price_text));

    Listing {
        identity_url: fields.text(&URL_KEYS),
        title: fields.text(&TITLE_KEYS).or_else(|| vehicle.text(&TITLE_KEYS)),
        price_display,
        city: location
            .text(&["city"])
            .or_else(|| fields.text(&["location", "city"])),
        mileage_km: vehicle
            .integer(&MILEAGE_KEYS)
            .or_else(|| fields.integer(&MILEAGE_KEYS)),
        image_url: first_image(fields)
            .or_else(|| first_image(vehicle))
            .or_else(|| fields.text(&IMAGE_KEYS)),
        year: vehicle
            .year(&YEAR_KEYS)
            .or_else(|| fields.year(&YEAR_KEYS)),
        make: vehicle
            .text(&MAKE_KEYS)
            .or_else(|| fields.text(&MAKE_KEYS)),
        model: vehicle
            .text(&MODEL_KEYS)
            .or_else(|| fields.text(&MODEL_KEYS)),
    }
}

/// Optional-safe view over a JSON object. A missing or non-object value is an
/// empty lookup where every read returns `None`.
#[derive(Clone, Copy)]
struct Lookup<'a>(Option<&'a Map<String, Value>>);

impl<'a> Lookup<'a> {
    fn get(self, key: &str) -> Option<&'a Value> {
        self.0.and_then(|m| m.get(key)).filter(|v| !v.is_null())
    }

    fn child(self, key: &str) -> Lookup<'a> {
        Lookup(self.get(key).and_then(Value::as_object))
    }

    fn text(self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.get(k).and_then(value_text))
    }

    fn integer(self, keys: &[&str]) -> Option<i64> {
        keys.iter().find_map(|k| self.get(k).and_then(value_integer))
    }

    fn year(self, keys: &[&str]) -> Option<i32> {
        self.integer(keys)
            .and_then(|y| i32::try_from(y).ok())
            .filter(|y| *y > 0)
    }
}

/// Non-empty trimmed string, or a number rendered as text.
fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-negative whole number from a JSON number or text such as
/// `"50,000 km"`.
#[allow(clippy::cast_possible_truncation)]
fn value_integer(v: &Value) -> Option<i64> {
    let n = match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => {
            let lowered = s.trim().to_ascii_lowercase();
            let digits: String = lowered
                .trim_end_matches("km")
                .chars()
                .filter(|c| !c.is_whitespace() && *c != ',')
                .collect();
            digits.parse::<i64>().ok()
        }
        _ => None,
    }?;
    (n >= 0).then_some(n)
}

/// Display text for a price value. Strings are kept as the source formatted
/// them; bare numbers get a `$` and thousands separators.
fn price_text(v: &Value) -> Option<String> {
    match v {
        Value::String(_) => value_text(v),
        Value::Number(n) => {
            if let Some(whole) = n.as_u64() {
                Some(format!("${}", group_thousands(whole)))
            } else {
                let f = n.as_f64().filter(|f| f.is_finite() && *f >= 0.0)?;
                let cents = format!("{f:.2}");
                let (whole, frac) = cents.split_once('.')?;
                let whole: u64 = whole.parse().ok()?;
                Some(format!("${}.{frac}", group_thousands(whole)))
            }
        }
        _ => None,
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// First entry of an image list. Entries may be bare URLs or objects with a
/// `url` / `src`.
fn first_image(fields: Lookup<'_>) -> Option<String> {
    IMAGE_LIST_KEYS
        .iter()
        .find_map(|k| fields.get(k).and_then(Value::as_array))
        .and_then(|images| images.first())
        .and_then(|first| match first {
            Value::Object(obj) => Lookup(Some(obj)).text(&["url", "src", "uri"]),
            other => value_text(other),
        })
}

/// Completes a site-relative URL against `site_origin`; absolute URLs pass
/// through unchanged. Blank input yields `None`.
#[must_use]
pub fn absolutize_url(url: &str, site_origin: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    if has_scheme(url) {
        return Some(url.to_string());
    }

    let origin = site_origin.trim_end_matches('/');
    if let Some(rest) = url.strip_prefix("//") {
        let scheme = origin.split_once("://").map_or("https", |(s, _)| s);
        return Some(format!("{scheme}://{rest}"));
    }
    if url.starts_with('/') {
        Some(format!("{origin}{url}"))
    } else {
        Some(format!("{origin}/{url}"))
    }
}

fn has_scheme(url: &str) -> bool {
    url.split_once("://").is_some_and(|(scheme, _)| {
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

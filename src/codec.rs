//! RFC 3986 percent-encoding and canonical query-string handling.
//!
//! OAuth 1.0a is picky about encoding in two ways that generic form
//! encoding gets wrong: space must become `%20` (never `+`) and `~`
//! must stay as-is. Every signature mismatch story starts here.

use std::collections::BTreeMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except unreserved `A-Z a-z 0-9 - _ . ~` is encoded.
const RFC3986_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encodes a string per RFC 3986.
pub fn encode(input: &str) -> String {
    utf8_percent_encode(input, RFC3986_SET).to_string()
}

/// Reverses [`encode`]. Also folds `+` to a space so that bodies produced
/// by ordinary form encoders parse correctly.
pub fn decode(input: &str) -> String {
    if input.contains('+') {
        let unplussed = input.replace('+', " ");
        percent_decode_str(&unplussed).decode_utf8_lossy().into_owned()
    } else {
        percent_decode_str(input).decode_utf8_lossy().into_owned()
    }
}

/// A multi-valued parameter mapping.
///
/// Every name is bound to a list of values, even when only one value is
/// present; the scalar/list distinction only reappears at serialization
/// time. Repeated query parameters with the same name are preserved, not
/// overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamList {
    entries: BTreeMap<String, Vec<String>>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, accumulating when the name is already bound.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(name.into()).or_default().push(value.into());
    }

    /// Binds a name to exactly one value, discarding any prior values.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let _ = self.entries.insert(name.into(), vec![value.into()]);
    }

    /// Removes a name entirely, returning its values if it was bound.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.entries.remove(name)
    }

    /// First value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values bound to `name`.
    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over `(name, values)` entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Appends every entry of `other`, accumulating duplicates.
    pub fn extend_from(&mut self, other: &ParamList) {
        for (name, values) in other.iter() {
            for value in values {
                self.append(name, value.clone());
            }
        }
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for ParamList {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut params = ParamList::new();
        for (name, value) in iter {
            params.append(name, value);
        }
        params
    }
}

/// Serializes a parameter mapping into the canonical `k1=v1&k2=v2` form.
///
/// Keys and values are percent-encoded first; entries are then sorted by
/// the encoded key using byte-value ordering, and names bound to several
/// values emit one pair per value with the values themselves sorted as
/// strings. An empty mapping yields an empty string.
pub fn build_query(params: &ParamList) -> String {
    let mut encoded: Vec<(String, Vec<String>)> = params
        .iter()
        .map(|(name, values)| {
            let mut encoded_values: Vec<String> = values.iter().map(|v| encode(v)).collect();
            encoded_values.sort();
            (encode(name), encoded_values)
        })
        .collect();
    encoded.sort();

    let mut pairs = Vec::new();
    for (name, values) in encoded {
        for value in values {
            pairs.push(format!("{}={}", name, value));
        }
    }
    pairs.join("&")
}

/// Parses a query string into a parameter mapping.
///
/// Splits on `&`, then each pair on the first `=`; a key without `=` gets
/// an implicit empty value. Repeated keys accumulate in order.
pub fn parse_query(input: &str) -> ParamList {
    let mut params = ParamList::new();
    if input.is_empty() {
        return params;
    }
    for pair in input.split('&') {
        let mut split = pair.splitn(2, '=');
        let name = decode(split.next().unwrap_or_default());
        let value = decode(split.next().unwrap_or_default());
        params.append(name, value);
    }
    params
}

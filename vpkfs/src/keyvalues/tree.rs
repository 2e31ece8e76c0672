//! Parsed KeyValues tree.

/// A value in a KeyValues document: either a leaf string or a nested section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvValue {
    /// A plain `"key" "value"` pair.
    Leaf(String),
    /// A `"key" { ... }` section.
    Section(KvSection),
}

impl KvValue {
    /// Leaf string, if this is a leaf.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KvValue::Leaf(s) => Some(s),
            KvValue::Section(_) => None,
        }
    }

    /// Nested section, if this is a section.
    pub fn as_section(&self) -> Option<&KvSection> {
        match self {
            KvValue::Leaf(_) => None,
            KvValue::Section(s) => Some(s),
        }
    }
}

/// An ordered list of key/value pairs.
///
/// Keys may repeat (search paths routinely list `Game` many times), so this
/// is a list rather than a map. Lookups by name compare ASCII case-insensitively
/// and return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvSection {
    entries: Vec<(String, KvValue)>,
}

impl KvSection {
    /// Create an empty section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair.
    pub fn push(&mut self, key: impl Into<String>, value: KvValue) {
        self.entries.push((key.into(), value));
    }

    fn find_map<'a, T: ?Sized>(
        &'a self,
        name: &str,
        f: impl Fn(&'a KvValue) -> Option<&'a T>,
    ) -> Option<&'a T> {
        self.entries
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .find_map(|(_, v)| f(v))
    }

    /// First child section with the given name.
    pub fn section(&self, name: &str) -> Option<&KvSection> {
        self.find_map(name, KvValue::as_section)
    }

    /// First child section with the given name, or an empty section.
    pub fn section_or_empty(&self, name: &str) -> KvSection {
        self.section(name).cloned().unwrap_or_default()
    }

    /// First leaf value with the given name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find_map(name, KvValue::as_str)
    }

    /// Boolean interpretation of a leaf.
    ///
    /// Accepts `1`/`0`, `true`/`false` and `yes`/`no` (any case). Other
    /// numbers are true when non-zero. Anything else is `None`.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        let value = self.get(name)?.trim();
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            other => other.parse::<i64>().ok().map(|n| n != 0),
        }
    }

    /// All pairs in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &KvValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the section has no pairs.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

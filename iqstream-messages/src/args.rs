use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// String-keyed device configuration, e.g. `driver=file,path=capture.txt`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceArgs(BTreeMap<String, String>);

impl DeviceArgs {
    /// Empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Sets `key`, replacing any earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder form of [`DeviceArgs::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Key/value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True when no keys are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DeviceArgs {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl FromStr for DeviceArgs {
    type Err = Infallible;

    /// Parses `key=value` pairs separated by commas.
    /// An entry without `=` becomes a key with an empty value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let args = s
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (entry, ""),
            })
            .collect();
        Ok(args)
    }
}

impl fmt::Display for DeviceArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markup() {
        let args: DeviceArgs = " driver=file , path = /tmp/rx.txt,,loop".parse().unwrap();
        assert_eq!(args.get("driver"), Some("file"));
        assert_eq!(args.get("path"), Some("/tmp/rx.txt"));
        assert_eq!(args.get("loop"), Some(""));
        assert_eq!(args.get("missing"), None);
    }

    #[test]
    fn test_display_is_sorted_by_key() {
        let args = DeviceArgs::new().with("path", "a.txt").with("driver", "file");
        assert_eq!(args.to_string(), "driver=file, path=a.txt");
    }

    #[test]
    fn test_empty_markup() {
        let args: DeviceArgs = "".parse().unwrap();
        assert!(args.is_empty());
    }
}

//! Translation of single-letter amenity codes into answer labels.

use std::collections::HashMap;

pub const YES_LABEL: &str = "是";
pub const NO_LABEL: &str = "否";

/// Fixed code→label table for boolean-coded record fields.
#[derive(Debug, Clone)]
pub struct CodeTable {
    labels: HashMap<String, String>,
}

impl CodeTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// `T` → 是, `F` → 否.
    pub fn standard() -> Self {
        Self::new([("T", YES_LABEL), ("F", NO_LABEL)])
    }

    /// Label for a raw code. Surrounding whitespace is ignored; unknown codes
    /// have no label.
    pub fn translate(&self, code: &str) -> Option<&str> {
        self.labels.get(code.trim()).map(String::as_str)
    }
}

impl Default for CodeTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_codes() {
        let table = CodeTable::standard();
        assert_eq!(table.translate("T"), Some(YES_LABEL));
        assert_eq!(table.translate("F "), Some(NO_LABEL));
        assert_eq!(table.translate("t"), None);
        assert_eq!(table.translate(""), None);
    }
}

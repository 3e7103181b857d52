use std::collections::HashMap;

/// Case-insensitive lookup from a requested column name to the name as it
/// appears in the source table.
#[derive(Debug, Clone)]
pub struct ColumnLookup {
    map: HashMap<String, String>,
}

impl ColumnLookup {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = HashMap::new();
        for name in names {
            let name = name.as_ref();
            let key = name.trim().to_ascii_uppercase();
            map.entry(key).or_insert_with(|| name.to_string());
        }
        Self { map }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map
            .get(&name.trim().to_ascii_uppercase())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

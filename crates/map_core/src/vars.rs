use serde_json::Value;
use std::collections::BTreeMap;

/// Immutable binding environment for template values and sub-map arguments.
///
/// `extend` returns a new environment; the receiver is never changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vars(BTreeMap<String, Value>);

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut next = self.0.clone();
        next.insert(name.into(), value.into());
        Vars(next)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Scalar rendering used by URL templates; objects, arrays and null are `None`.
    pub fn scalar(&self, name: &str) -> Option<String> {
        self.get(name).and_then(scalar_string)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Vars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Vars(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extend_leaves_original_untouched() {
        let base = Vars::new().extend("a", 1);
        let next = base.extend("b", "two");
        assert!(base.get("b").is_none());
        assert_eq!(next.get("a"), Some(&json!(1)));
        assert_eq!(next.scalar("b").as_deref(), Some("two"));
    }

    #[test]
    fn non_scalars_do_not_render() {
        let vars: Vars = [("o", json!({"x": 1})), ("n", Value::Null)].into_iter().collect();
        assert_eq!(vars.scalar("o"), None);
        assert_eq!(vars.scalar("n"), None);
        assert_eq!(vars.scalar("missing"), None);
    }
}

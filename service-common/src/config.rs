use serde::Deserialize;
use std::collections::HashMap;

/// Deserialize a configuration from environment variables.
///
/// Nested structures are addressed with a `__` separator, e.g.
/// `CONTROLLER__SYNC_INTERVAL` maps to `controller.sync_interval`.
pub trait ConfigFromEnv<'de>: Sized + Deserialize<'de> {
    fn from_env() -> Result<Self, config::ConfigError> {
        Self::from(config::Environment::default())
    }

    fn from(env: config::Environment) -> Result<Self, config::ConfigError>;

    fn from_set<K, V>(set: HashMap<K, V>) -> Result<Self, config::ConfigError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let set = set.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self::from(config::Environment::default().source(Some(set)))
    }
}

impl<'de, T: Deserialize<'de> + Sized> ConfigFromEnv<'de> for T {
    fn from(env: config::Environment) -> Result<T, config::ConfigError> {
        let env = env.try_parsing(true).separator("__");

        config::Config::builder()
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Outer {
        pub name: String,
        #[serde(default)]
        pub inner: Option<Inner>,
    }

    #[derive(Debug, Deserialize)]
    struct Inner {
        pub count: usize,
    }

    #[test]
    fn test_flat() {
        let mut set = HashMap::<String, String>::new();
        set.insert("NAME".into(), "topics".into());

        let outer = Outer::from_set(set).unwrap();
        assert_eq!(outer.name, "topics");
        assert!(outer.inner.is_none());
    }

    #[test]
    fn test_nested() {
        let mut set = HashMap::<String, String>::new();
        set.insert("NAME".into(), "topics".into());
        set.insert("INNER__COUNT".into(), "3".into());

        let outer = Outer::from_set(set).unwrap();
        assert_eq!(outer.inner.unwrap().count, 3);
    }
}

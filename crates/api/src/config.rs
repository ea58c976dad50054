//! Types for use when configuring blockswap modules.

use crate::*;

/// helper transcode function
fn tc<S: serde::Serialize, D: serde::de::DeserializeOwned>(
    s: &S,
) -> BsResult<D> {
    serde_json::from_str(
        &serde_json::to_string(s)
            .map_err(|e| BsError::other_src("encode", e))?,
    )
    .map_err(|e| BsError::other_src("decode", e))
}

/// Denotes a type used to configure a specific blockswap module.
///
/// A module config is a struct with a single camelCase field named after
/// the module, e.g. `{ "coreWorkers": { .. } }`. That way many modules
/// can share one [Config] without colliding.
///
/// Note, the types defined in this struct are specifically for configuration
/// that cannot be changed at runtime, the likes of which might be found
/// in a configuration file. If a module has a value that can be changed at
/// runtime, the config holds a `default_` prefixed version of it.
pub trait ModConfig:
    'static
    + Sized
    + Default
    + std::fmt::Debug
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Send
    + Sync
{
}

/// Blockswap configuration.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Config(serde_json::Map<String, serde_json::Value>);

impl Config {
    /// Add the sections of a module config to this config.
    ///
    /// Refuses to overwrite a section that another module already set.
    pub fn set_module_config<M: ModConfig>(
        &mut self,
        module_config: &M,
    ) -> BsResult<()> {
        let value: serde_json::Value = tc(module_config)?;
        let map = match value {
            serde_json::Value::Object(map) => map,
            _ => {
                return Err(BsError::other(
                    "module config must serialize to an object",
                ))
            }
        };
        for (name, section) in map {
            if self.0.contains_key(&name) {
                return Err(BsError::other(format!(
                    "Refusing to overwrite conflicting module name: {name}"
                )));
            }
            self.0.insert(name, section);
        }
        Ok(())
    }

    /// Extract a module config. Sections not present in this config,
    /// as well as missing properties, take the module's defaults.
    pub fn get_module_config<M: ModConfig>(&self) -> BsResult<M> {
        tc(&self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct TickerConfig {
        period_ms: u32,
        label: String,
    }

    impl Default for TickerConfig {
        fn default() -> Self {
            Self {
                period_ms: 1000,
                label: "tick".into(),
            }
        }
    }

    #[derive(
        Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize,
    )]
    #[serde(default, rename_all = "camelCase")]
    struct TickerModConfig {
        ticker: TickerConfig,
    }

    impl ModConfig for TickerModConfig {}

    #[test]
    fn config_usage_example() {
        let mut config = Config::default();
        config
            .set_module_config(&TickerModConfig::default())
            .unwrap();

        assert_eq!(
            r#"{"ticker":{"periodMs":1000,"label":"tick"}}"#,
            serde_json::to_string(&config).unwrap()
        );

        // second registration of the same section is refused
        assert!(config
            .set_module_config(&TickerModConfig::default())
            .is_err());

        // tolerate odd config loaded from disk
        let config: Config = serde_json::from_str(
            r#"{
              "modBAD": { "foo": "bar" },
              "ticker": { "periodMs": 42, "extra": "foo" }
            }"#,
        )
        .unwrap();

        assert_eq!(
            TickerModConfig {
                ticker: TickerConfig {
                    period_ms: 42,
                    label: "tick".into(),
                },
            },
            config.get_module_config::<TickerModConfig>().unwrap(),
        );

        // unset mods get the default
        assert_eq!(
            TickerModConfig::default(),
            Config::default()
                .get_module_config::<TickerModConfig>()
                .unwrap(),
        );
    }
}

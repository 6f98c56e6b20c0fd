// ABOUTME: Custom serde deserializers for manifest fields.
// ABOUTME: Handles app names, image refs, and order-preserving env maps.

use serde::Deserialize;
use serde::de::{MapAccess, Visitor};
use std::fmt;

use super::EnvValue;
use crate::types::{AppName, ImageRef};

pub fn deserialize_app_name<'de, D>(deserializer: D) -> Result<AppName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    AppName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_image_ref<'de, D>(deserializer: D) -> Result<ImageRef, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ImageRef::parse(&s).map_err(serde::de::Error::custom)
}

/// A YAML map read as a list of pairs, in document order.
pub fn deserialize_env_entries<'de, D>(deserializer: D) -> Result<Vec<(String, EnvValue)>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<(String, EnvValue)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of environment variables")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries: Vec<(String, EnvValue)> = Vec::new();
            while let Some((key, value)) = map.next_entry::<String, EnvValue>()? {
                if entries.iter().any(|(k, _)| k == &key) {
                    return Err(serde::de::Error::custom(format!(
                        "duplicate environment variable: {key}"
                    )));
                }
                entries.push((key, value));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor)
}

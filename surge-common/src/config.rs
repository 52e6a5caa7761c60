use crate::error::BoxError;
use serde::de::DeserializeOwned;
use std::{fs, path::Path};

/// Loads a config file, picking the format from its extension.
pub fn get_config_by_file<T: DeserializeOwned>(path: &str) -> Result<T, BoxError> {
    let contents =
        fs::read_to_string(path).map_err(|e| format!("read path error : {:?} {}", path, e))?;
    let extension = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match extension.as_deref() {
        Some("toml") => from_toml(&contents),
        Some("yaml") | Some("yml") => from_yaml(&contents),
        file_type => Err(format!("not support {:?}", file_type).into()),
    }
}

pub fn from_toml<T: DeserializeOwned>(contents: &str) -> Result<T, BoxError> {
    toml::from_str(contents).map_err(|e| format!("toml config error {}", e).into())
}

pub fn from_yaml<T: DeserializeOwned>(contents: &str) -> Result<T, BoxError> {
    serde_yaml::from_str(contents).map_err(|e| format!("yaml config error {}", e).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Sample {
        name: String,
        port: u16,
    }

    #[test]
    fn load_yaml_and_toml_by_extension() {
        let dir = std::env::temp_dir();
        let yaml = dir.join(format!("surge-config-{}.yaml", std::process::id()));
        let toml = dir.join(format!("surge-config-{}.toml", std::process::id()));
        fs::write(&yaml, "name: order\nport: 8081\n").unwrap();
        fs::write(&toml, "name = \"order\"\nport = 8081\n").unwrap();
        let expect = Sample {
            name: "order".to_owned(),
            port: 8081,
        };
        let from_yaml: Sample = get_config_by_file(yaml.to_str().unwrap()).unwrap();
        let from_toml: Sample = get_config_by_file(toml.to_str().unwrap()).unwrap();
        assert_eq!(from_yaml, expect);
        assert_eq!(from_toml, expect);
        let _ = fs::remove_file(yaml);
        let _ = fs::remove_file(toml);
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let path = std::env::temp_dir().join(format!("surge-config-{}.ini", std::process::id()));
        fs::write(&path, "name=order").unwrap();
        assert!(get_config_by_file::<Sample>(path.to_str().unwrap()).is_err());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(get_config_by_file::<Sample>("/definitely/not/here.yaml").is_err());
    }
}

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::UserId;

#[derive(Debug, Deserialize)]
pub struct Configuration {
    pub book: PathBuf,
    pub user: UserId,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_owned()
}

impl Configuration {
    /// Reads the configuration; a relative `book` is taken relative to the configuration file.
    pub fn load(path: &Path) -> Result<Configuration> {
        let file = File::open(path)?;
        let mut config: Configuration = serde_json::from_reader(file)?;

        if config.book.is_relative() {
            if let Some(dir) = path.parent() {
                config.book = dir.join(&config.book);
            }
        }

        config.tz()?;

        Ok(config)
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| Error::UnknownTimezone(self.timezone.clone()))
    }

    pub fn now(&self) -> Result<NaiveDateTime> {
        Ok(Utc::now().with_timezone(&self.tz()?).naive_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn parse(json: &str) -> serde_json::Result<Configuration> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_default_timezone() -> Result<()> {
        let config = parse(r#"{"book": "book.json", "user": 1}"#)?;
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.tz()?, Tz::UTC);
        assert_eq!(config.user, UserId(1));

        Ok(())
    }

    #[test]
    fn test_named_timezone() -> Result<()> {
        let config = parse(r#"{"book": "book.json", "user": 1, "timezone": "US/Pacific"}"#)?;
        assert_eq!(config.tz()?, chrono_tz::US::Pacific);

        Ok(())
    }

    #[test]
    fn test_unknown_timezone() -> Result<()> {
        let config = parse(r#"{"book": "book.json", "user": 1, "timezone": "Mars/Olympus"}"#)?;
        assert!(matches!(config.tz(), Err(Error::UnknownTimezone(_))));

        Ok(())
    }

    #[test]
    fn test_load_resolves_book_next_to_config() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("quickledger-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{"book": "book.json", "user": 3}"#)?;

        let config = Configuration::load(&path)?;
        assert_eq!(config.book, dir.join("book.json"));

        std::fs::remove_dir_all(&dir)?;

        Ok(())
    }
}

use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub profile: String,
    pub seed_demo: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = lookup("PROFILE").unwrap_or_else(|| "default".to_string());

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| {
            if profile == "default" {
                "sqlite://bibliolink.db?mode=rwc".to_string()
            } else {
                format!("sqlite://bibliolink_{}.db?mode=rwc", profile)
            }
        });

        Self {
            database_url,
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            profile,
            seed_demo: lookup("SEED_DEMO").is_some_and(|v| v != "false" && v != "0"),
        }
    }

    /// Apply a `--profile <name>` override from the command line. The
    /// database URL follows the profile unless `DATABASE_URL` was given.
    pub fn with_profile_arg(self, args: &[String]) -> Self {
        let Some(profile) = args
            .iter()
            .position(|arg| arg == "--profile")
            .and_then(|pos| args.get(pos + 1))
        else {
            return self;
        };

        let explicit_url = env::var("DATABASE_URL").ok();
        Self::from_lookup(|key| match key {
            "PROFILE" => Some(profile.clone()),
            "DATABASE_URL" => explicit_url.clone(),
            "PORT" => Some(self.port.to_string()),
            "CORS_ALLOWED_ORIGINS" => Some(self.cors_allowed_origins.join(",")),
            "SEED_DEMO" => self.seed_demo.then(|| "1".to_string()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.database_url, "sqlite://bibliolink.db?mode=rwc");
        assert_eq!(config.port, 8000);
        assert_eq!(config.profile, "default");
        assert!(config.cors_allowed_origins.is_empty());
        assert!(!config.seed_demo);
    }

    #[test]
    fn test_profile_changes_database_file() {
        let config = Config::from_lookup(lookup_from(&[("PROFILE", "work"), ("PORT", "nope")]));
        assert_eq!(config.database_url, "sqlite://bibliolink_work.db?mode=rwc");
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_cors_and_seed_parsing() {
        let config = Config::from_lookup(lookup_from(&[
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
            ("SEED_DEMO", "1"),
            ("PORT", "9100"),
        ]));
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(config.seed_demo);
        assert_eq!(config.port, 9100);

        let config = Config::from_lookup(lookup_from(&[("SEED_DEMO", "false")]));
        assert!(!config.seed_demo);
    }

    #[test]
    #[serial]
    fn test_profile_arg_overrides_environment() {
        // SAFETY: serialized with every other test touching the environment
        unsafe {
            env::remove_var("DATABASE_URL");
            env::set_var("PORT", "9200");
        }
        let args = vec![
            "bibliolink".to_string(),
            "--profile".to_string(),
            "demo".to_string(),
        ];
        let config = Config::from_env().with_profile_arg(&args);
        unsafe {
            env::remove_var("PORT");
        }

        assert_eq!(config.profile, "demo");
        assert_eq!(config.database_url, "sqlite://bibliolink_demo.db?mode=rwc");
        assert_eq!(config.port, 9200);
    }
}

#[cfg(test)]
mod tests {
    use crate::config::*;
    use std::io::Write;

    #[test]
    fn test_default_feature_config_enables_builtins_only() {
        let features = FeatureConfig::default();
        assert!(!features.links);
        assert!(!features.magnets);
        assert!(!features.free_text);
        assert!(features.make);
        assert!(features.rename);
        assert!(features.required_commands().is_empty());
    }

    #[test]
    fn test_default_session_config() {
        let sessions = SessionConfig::default();
        assert_eq!(sessions.ttl_secs, None);
        assert!(sessions.ttl().is_none());
        assert_eq!(sessions.sweep_interval_secs, 60);
    }

    #[test]
    fn test_default_converter_config() {
        let converters = ConverterConfig::default();
        assert_eq!(converters.timeout_secs, 600);
        assert!(converters.commands.is_empty());
        assert!(converters.work_dir.ends_with("convert-bot"));
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.features, FeatureConfig::default());
        assert_eq!(config.sessions, SessionConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_full_toml() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"

            [features]
            magnets = true

            [sessions]
            ttl_secs = 900
            sweep_interval_secs = 30

            [converters]
            work_dir = "/var/tmp/convert"
            timeout_secs = 120

            [converters.commands]
            convert = "ffmpeg -y -i {input} {output}"
            ocr = "tesseract {input} {dir}/out"
            fetch_magnet = "aria2c -d {dir} {url}"
            "#,
        )
        .unwrap();

        assert!(!config.features.links);
        assert!(config.features.magnets);
        assert_eq!(config.sessions.ttl(), Some(std::time::Duration::from_secs(900)));
        assert_eq!(config.converters.timeout().as_secs(), 120);
        assert_eq!(
            config.converters.commands.get("convert").map(String::as_str),
            Some("ffmpeg -y -i {input} {output}")
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_router_config_mirrors_features() {
        let features = FeatureConfig {
            magnets: true,
            rename: false,
            ..FeatureConfig::default()
        };
        let router = features.router_config();
        assert!(!router.links);
        assert!(!router.rename);
        assert!(router.magnets);
        assert!(router.make);
    }

    #[test]
    fn test_validate_rejects_feature_without_command() {
        let mut config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"

            [features]
            links = true
            free_text = true
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("converters.commands.fetch_link"));

        config
            .converters
            .commands
            .insert("fetch_link".into(), "tg-fetch {url} {dir}".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("converters.commands.other"));

        config
            .converters
            .commands
            .insert("other".into(), "reply-bot {url}".into());
        config.validate().unwrap();
    }

    #[test]
    fn test_from_env_defaults_pass_validation() {
        let config = Config {
            telegram: TelegramConfig {
                bot_token: "1:x".into(),
            },
            features: FeatureConfig::default(),
            sessions: SessionConfig::default(),
            converters: ConverterConfig::default(),
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_empty_token() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "  "
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_command() {
        let mut config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"
            "#,
        )
        .unwrap();
        config.converters.commands.insert("scan".into(), "   ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[telegram]\nbot_token = \"42:xyz\"\n[sessions]\nttl_secs = 5").unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.telegram.bot_token, "42:xyz");
        assert_eq!(config.sessions.ttl_secs, Some(5));
    }

    #[test]
    fn test_from_file_missing_is_error() {
        let err = Config::from_file("/nonexistent/convert-bot.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}

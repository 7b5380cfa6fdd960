//! Tests for client configuration.

use super::*;
use serial_test::serial;
use std::io::Write;

const ENV_KEYS: &[&str] = &[
    "SQS__REGION",
    "SQS__ENDPOINT",
    "SQS__ACCESS_KEY_ID",
    "SQS__SECRET_ACCESS_KEY",
    "SQS__SESSION_TOKEN",
    "SQS__TIMEOUT_SECONDS",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

fn credentials() -> Credentials {
    Credentials::new("AKIDEXAMPLE", "secret")
}

mod defaults_tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(credentials());

        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.api_version, "2012-11-05");
        assert_eq!(config.resolved_endpoint(), "https://sqs.us-east-1.amazonaws.com");
        assert!(config.user_agent.starts_with("sqs-client/"));
    }

    #[test]
    fn test_endpoint_follows_region_until_overridden() {
        let config = ClientConfig::new(credentials()).with_region("ap-southeast-2");
        assert_eq!(
            config.resolved_endpoint(),
            "https://sqs.ap-southeast-2.amazonaws.com"
        );

        let config = config.with_endpoint("http://localhost:9324/");
        assert_eq!(config.resolved_endpoint(), "http://localhost:9324");

        let china = ClientConfig::new(credentials()).with_region("cn-north-1");
        assert_eq!(
            china.resolved_endpoint(),
            "https://sqs.cn-north-1.amazonaws.com.cn"
        );
    }
}

mod validation_tests {
    use super::*;

    #[test]
    fn test_valid_config_yields_endpoint_url() {
        let url = ClientConfig::new(credentials())
            .with_endpoint("http://127.0.0.1:4566")
            .validate()
            .unwrap();

        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(url.port(), Some(4566));
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        assert!(ClientConfig::new(Credentials::new("", "secret"))
            .validate()
            .is_err());
        assert!(ClientConfig::new(credentials())
            .with_region("")
            .validate()
            .is_err());
        assert!(ClientConfig::new(credentials())
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
        assert!(ClientConfig::new(credentials())
            .with_endpoint("not a url")
            .validate()
            .is_err());
        assert!(ClientConfig::new(credentials())
            .with_endpoint("ftp://example.com")
            .validate()
            .is_err());
    }

    #[test]
    fn test_builder_requires_credentials() {
        let result = ClientConfig::builder().region("us-west-2").build();
        assert!(matches!(
            result,
            Err(ConfigurationError::Missing { ref key }) if key == "credentials"
        ));
    }

    #[test]
    fn test_builder_applies_settings() {
        let config = ClientConfig::builder()
            .credentials(credentials())
            .region("us-west-2")
            .endpoint("http://localhost:9324")
            .timeout(Duration::from_secs(5))
            .user_agent("tests/1.0")
            .build()
            .unwrap();

        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.resolved_endpoint(), "http://localhost:9324");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "tests/1.0");
    }
}

mod loading_tests {
    use super::*;

    #[test]
    #[serial]
    fn test_load_from_environment() {
        clear_env();
        std::env::set_var("SQS__REGION", "eu-central-1");
        std::env::set_var("SQS__ACCESS_KEY_ID", "AKIDENV");
        std::env::set_var("SQS__SECRET_ACCESS_KEY", "env-secret");
        std::env::set_var("SQS__TIMEOUT_SECONDS", "12");

        let result = ClientConfig::load(None);
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.region, "eu-central-1");
        assert_eq!(config.credentials.access_key_id, "AKIDENV");
        assert_eq!(config.credentials.secret_access_key, "env-secret");
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(
            config.resolved_endpoint(),
            "https://sqs.eu-central-1.amazonaws.com"
        );
    }

    #[test]
    #[serial]
    fn test_load_without_credentials_fails() {
        clear_env();

        let result = ClientConfig::load(None);

        assert!(matches!(
            result,
            Err(ConfigurationError::Missing { ref key }) if key == "access_key_id"
        ));
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        clear_env();

        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
region = "us-west-1"
endpoint = "http://localhost:9324"
access_key_id = "AKIDFILE"
secret_access_key = "file-secret"
session_token = "file-token"
timeout_seconds = 7
"#
        )
        .unwrap();

        std::env::set_var("SQS__REGION", "us-west-2");
        let result = ClientConfig::load(Some(file.path()));
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.resolved_endpoint(), "http://localhost:9324");
        assert_eq!(config.credentials.access_key_id, "AKIDFILE");
        assert_eq!(config.credentials.session_token.as_deref(), Some("file-token"));
        assert_eq!(config.timeout, Duration::from_secs(7));
    }

    #[test]
    #[serial]
    fn test_missing_file_is_an_error() {
        clear_env();

        let result = ClientConfig::load(Some(Path::new("/nonexistent/sqs-client.toml")));

        assert!(matches!(result, Err(ConfigurationError::Parsing { .. })));
    }
}

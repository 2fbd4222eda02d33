use super::*;
use crate::core::state::Mode;
use crate::core::store::StateKey;
use crate::utils::test_utils::create_test_session;
use std::fs;
use tempfile::TempDir;

mod test_helpers {
    use super::*;

    pub(super) fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }

    pub(super) fn config_path(temp_dir: &TempDir) -> PathBuf {
        temp_dir.path().join("config.toml")
    }

    pub(super) fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }
}

use test_helpers::{args, config_path, parse_args};

#[test]
fn no_subcommand_means_chat() {
    let args = parse_args(&["lingo"]);
    assert!(args.command.is_none());
    assert!(!args.no_tts);
}

#[test]
fn global_flags_parse_before_and_after_subcommands() {
    let cases: [&[&str]; 2] = [
        &["lingo", "-p", "groq", "-m", "llama3", "-L", "french", "--no-tts", "chat"],
        &["lingo", "chat", "--provider", "groq", "--model", "llama3", "--language", "french", "--no-tts"],
    ];

    for argv in cases {
        let args = parse_args(argv);
        assert!(matches!(args.command, Some(Commands::Chat)), "argv={argv:?}");
        assert_eq!(args.provider.as_deref(), Some("groq"), "argv={argv:?}");
        assert_eq!(args.model.as_deref(), Some("llama3"), "argv={argv:?}");
        assert_eq!(args.language.as_deref(), Some("french"), "argv={argv:?}");
        assert!(args.no_tts, "argv={argv:?}");
    }
}

#[test]
fn say_collects_every_word() {
    let args = parse_args(&["lingo", "say", "Hola,", "¿qué", "tal?"]);
    match args.command {
        Some(Commands::Say { text }) => assert_eq!(text, vec!["Hola,", "¿qué", "tal?"]),
        _ => panic!("expected say"),
    }
}

#[test]
fn transcribe_takes_a_file_and_optional_send() {
    let args = parse_args(&["lingo", "transcribe", "take.wav", "--send"]);
    match args.command {
        Some(Commands::Transcribe { file, send }) => {
            assert_eq!(file, PathBuf::from("take.wav"));
            assert!(send);
        }
        _ => panic!("expected transcribe"),
    }

    let args = parse_args(&["lingo", "transcribe", "take.wav"]);
    assert!(matches!(
        args.command,
        Some(Commands::Transcribe { send: false, .. })
    ));
    assert!(Args::try_parse_from(["lingo", "transcribe"]).is_err());
}

#[test]
fn listing_commands_parse() {
    assert!(matches!(parse_args(&["lingo", "voices"]).command, Some(Commands::Voices)));
    assert!(matches!(
        parse_args(&["lingo", "languages"]).command,
        Some(Commands::Languages)
    ));
    assert!(matches!(parse_args(&["lingo", "health"]).command, Some(Commands::Health)));
    assert!(matches!(parse_args(&["lingo", "status"]).command, Some(Commands::Status)));
}

#[test]
fn set_and_unset_parse() {
    match parse_args(&["lingo", "set"]).command {
        Some(Commands::Set { key, value }) => {
            assert!(key.is_none());
            assert!(value.is_empty());
        }
        _ => panic!("expected set"),
    }
    match parse_args(&["lingo", "set", "default-model", "openai", "gpt-4o-mini"]).command {
        Some(Commands::Set { key, value }) => {
            assert_eq!(key.as_deref(), Some("default-model"));
            assert_eq!(value, vec!["openai", "gpt-4o-mini"]);
        }
        _ => panic!("expected set"),
    }
    match parse_args(&["lingo", "unset", "base-url", "groq"]).command {
        Some(Commands::Unset { key, value }) => {
            assert_eq!(key, "base-url");
            assert_eq!(value.as_deref(), Some("groq"));
        }
        _ => panic!("expected unset"),
    }
}

#[test]
fn reset_parses_with_and_without_all() {
    assert!(matches!(
        parse_args(&["lingo", "reset"]).command,
        Some(Commands::Reset { all: false })
    ));
    assert!(matches!(
        parse_args(&["lingo", "reset", "--all"]).command,
        Some(Commands::Reset { all: true })
    ));
}

#[test]
fn overrides_change_the_session_in_memory_only() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut session = create_test_session(temp_dir.path());
    let overrides = SessionOverrides {
        provider: Some("claude".to_string()),
        model: Some("claude-3-5-haiku".to_string()),
        language: Some("French".to_string()),
        no_tts: true,
    };

    overrides.apply(&mut session).expect("overrides should apply");

    assert_eq!(session.state.settings.provider, ProviderKind::Anthropic);
    assert_eq!(session.state.settings.anthropic_model, "claude-3-5-haiku");
    assert_eq!(session.state.settings.language, "french");
    assert!(!session.state.settings.tts_enabled);
    assert!(!session.store.contains(StateKey::ApiProvider));
    assert!(!session.store.contains(StateKey::TtsEnabled));
}

#[test]
fn overrides_reject_unknown_provider_and_language() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut session = create_test_session(temp_dir.path());

    let bad_provider = SessionOverrides {
        provider: Some("mistral".to_string()),
        ..Default::default()
    };
    let err = bad_provider.apply(&mut session).expect_err("unknown provider");
    assert!(err.is_config());

    let bad_language = SessionOverrides {
        language: Some("klingon".to_string()),
        ..Default::default()
    };
    let err = bad_language.apply(&mut session).expect_err("unknown language");
    assert!(err.to_string().contains("klingon"));
}

#[test]
fn set_writes_config_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = config_path(&temp_dir);

    let message = apply_set("default-provider", &args(&["Claude"]), &path).expect("set provider");
    assert_eq!(message, "✅ Set default-provider to: anthropic");
    apply_set("default-model", &args(&["groq", "llama-3.1-8b-instant"]), &path)
        .expect("set model");
    apply_set("player", &args(&["mpv", "--really-quiet"]), &path).expect("set player");
    apply_set("languages", &args(&["Spanish,", "french"]), &path).expect("set languages");
    apply_set("silence-duration-ms", &args(&["1500"]), &path).expect("set duration");

    let config = Config::load_from_path(&path).expect("config should load");
    assert_eq!(config.default_provider.as_deref(), Some("anthropic"));
    assert_eq!(
        config.default_models.get("groq").map(String::as_str),
        Some("llama-3.1-8b-instant")
    );
    assert_eq!(config.player.as_deref(), Some("mpv --really-quiet"));
    assert_eq!(config.languages, vec!["spanish", "french"]);
    assert_eq!(config.silence_duration_ms, Some(1500));
}

#[test]
fn set_rejects_bad_input_without_touching_the_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = config_path(&temp_dir);

    assert!(matches!(
        apply_set("colour", &args(&["blue"]), &path),
        Err(SettingError::UnknownKey(_))
    ));
    assert!(matches!(
        apply_set("default-provider", &args(&["mistral"]), &path),
        Err(SettingError::UnknownProvider { .. })
    ));
    assert!(matches!(
        apply_set("backend", &args(&["carrier-pigeon"]), &path),
        Err(SettingError::InvalidChoice { .. })
    ));
    assert!(matches!(
        apply_set("silence-threshold", &args(&["loud"]), &path),
        Err(SettingError::InvalidNumber { .. })
    ));
    let missing = apply_set("default-model", &args(&["openai"]), &path)
        .expect_err("model name is required");
    assert_eq!(missing.exit_code(), 2);

    assert!(!path.exists());
}

#[test]
fn unset_clears_values() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = config_path(&temp_dir);
    fs::write(
        &path,
        "backend = \"proxy\"\n\n[default_models]\nopenai = \"gpt-4o\"\ngroq = \"llama3\"\n",
    )
    .expect("write config");

    apply_unset("backend", None, &path).expect("unset backend");
    apply_unset("default-model", Some("openai"), &path).expect("unset model");
    let untouched = apply_unset("base-url", Some("groq"), &path).expect("nothing to unset");
    assert!(untouched.contains("No base-url set"));
    assert!(matches!(
        apply_unset("default-model", None, &path),
        Err(SettingError::MissingArgs { .. })
    ));

    let config = Config::load_from_path(&path).expect("config should load");
    assert!(config.backend.is_none());
    assert!(!config.default_models.contains_key("openai"));
    assert_eq!(config.default_models.get("groq").map(String::as_str), Some("llama3"));
}

#[test]
fn settings_listing_covers_every_key() {
    let registry = SettingRegistry::new();
    let mut config = Config::default();
    config.backend = Some("proxy".to_string());
    config
        .default_models
        .insert("openai".to_string(), "gpt-4o".to_string());

    let listing = format_settings(&registry, &config);
    for key in registry.keys_display_order() {
        assert!(listing.contains(key), "missing {key} in listing");
    }
    assert!(listing.contains("  backend: proxy"));
    assert!(listing.contains("    openai: gpt-4o"));
    assert!(listing.contains("  ai-api-base: (unset)"));
}

#[test]
fn reset_keeps_selections_unless_all() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut session = create_test_session(temp_dir.path());
    session.update(&[StateKey::Mode, StateKey::Goals], |state| {
        state.settings.mode = Mode::Structured;
        state.goals = vec!["Order coffee".to_string()];
    });
    let mut store = session.store;

    reset_store(&mut store, false).expect("reset learning");
    assert!(store.contains(StateKey::Mode));
    assert!(!store.contains(StateKey::Goals));

    reset_store(&mut store, true).expect("reset all");
    assert!(!store.contains(StateKey::Mode));
}

use super::*;
use crate::core::config::Config;
use crate::core::state::AppState;
use crate::core::store::StateStore;
use crate::utils::test_utils::{
    create_test_messages, test_runtime, RecordingClient, RecordingTransport,
};
use serde_json::json;
use tempfile::TempDir;

fn settings_with_model(provider: ProviderKind, model: &str) -> Settings {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = StateStore::open(temp_dir.path().join("state.json")).expect("open store");
    let mut settings = AppState::load(&store, &test_runtime()).settings;
    settings.provider = provider;
    settings.set_model(provider, model);
    settings
}

fn context() -> TutorContext {
    TutorContext {
        provider: ProviderKind::Groq,
        model: "llama-3.3-70b-versatile".to_string(),
        system_prompt: String::new(),
        language: "spanish".to_string(),
        mode: Mode::Casual,
    }
}

#[test]
fn provider_kind_parsing() {
    assert_eq!(ProviderKind::parse(" OpenAI "), Some(ProviderKind::OpenAi));
    assert_eq!(ProviderKind::parse("claude"), Some(ProviderKind::Anthropic));
    assert_eq!(ProviderKind::parse("mistral"), None);
    for kind in ProviderKind::ALL {
        assert_eq!(ProviderKind::parse(kind.id()), Some(kind));
    }
}

#[test]
fn empty_model_is_a_configuration_error() {
    let settings = settings_with_model(ProviderKind::Groq, "   ");
    let err = TutorContext::resolve(&settings).expect_err("empty model must fail");
    assert!(err.is_config());
    assert_eq!(err.user_message(), "Model not configured: groq");
}

#[test]
fn context_carries_settings() {
    let settings = settings_with_model(ProviderKind::Anthropic, "claude-3-5-haiku-latest");
    let ctx = TutorContext::resolve(&settings).expect("model is configured");
    assert_eq!(ctx.provider, ProviderKind::Anthropic);
    assert_eq!(ctx.model, "claude-3-5-haiku-latest");
    assert_eq!(ctx.language, "spanish");
}

#[test]
fn direct_connect_requires_api_key() {
    let settings = settings_with_model(ProviderKind::Groq, "llama");
    let result = connect(&settings, &test_runtime(), &reqwest::Client::new());
    let err = result.err().expect("missing key must fail");
    assert!(err.is_config());
    assert!(err.user_message().contains("GROQ_API_KEY"));
}

#[test]
fn proxy_connect_requires_base() {
    let runtime = RuntimeConfig::resolve(
        &Config {
            backend: Some("proxy".to_string()),
            ..Default::default()
        },
        |_| None,
    );
    let settings = settings_with_model(ProviderKind::OpenAi, "gpt-4o-mini");
    let err = connect(&settings, &runtime, &reqwest::Client::new())
        .err()
        .expect("missing base must fail");
    assert_eq!(err.user_message(), "AI API base not configured");
}

#[test]
fn session_prefers_base_url_override() {
    let runtime = RuntimeConfig::resolve(&Config::default(), |name| match name {
        "ANTHROPIC_API_KEY" => Some("sk-ant".to_string()),
        "ANTHROPIC_BASE_URL" => Some("http://localhost:9000/v1".to_string()),
        _ => None,
    });
    let session = ProviderSession::resolve(ProviderKind::Anthropic, &runtime).unwrap();
    assert_eq!(session.base_url, "http://localhost:9000/v1");
    assert_eq!(session.api_key, "sk-ant");

    let session = ProviderSession::resolve(
        ProviderKind::OpenAi,
        &RuntimeConfig::resolve(&Config::default(), |name| {
            (name == "OPENAI_API_KEY").then(|| "sk".to_string())
        }),
    )
    .unwrap();
    assert_eq!(session.base_url, "https://api.openai.com/v1");
}

#[tokio::test]
async fn direct_reply_sends_history_with_system_prompt() {
    let provider = DirectProvider::new(RecordingClient::new(&["¡Muy bien!"]));
    let reply = provider
        .generate_reply(&context(), &create_test_messages())
        .await
        .expect("reply");
    assert_eq!(reply, "¡Muy bien!");

    let requests = provider.client().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "llama-3.3-70b-versatile");
    assert!(requests[0].system.contains("learning spanish"));
    let roles: Vec<&str> = requests[0]
        .messages
        .iter()
        .map(|m| m.role.as_str())
        .collect();
    assert_eq!(roles, vec!["user", "assistant", "user"]);
}

#[tokio::test]
async fn direct_analysis_parses_structured_replies() {
    let provider = DirectProvider::new(RecordingClient::new(&[
        "```json\n{\"comments\":[\"Good\"],\"errors\":[{\"type\":\"Spelling\"}]}\n```",
        "{\"level\":\"intermediate\"}",
        "no goals today",
    ]));
    let ctx = context();
    let history = create_test_messages();

    let analysis = provider.analyze_text(&ctx, "Soy de Madrid").await.unwrap();
    assert_eq!(analysis.summary(), "Good");
    assert_eq!(analysis.categories(), vec!["spelling"]);

    let level = provider.detect_level(&ctx, &history).await.unwrap();
    assert_eq!(level, Proficiency::Intermediate);

    let goals = provider.suggest_goals(&ctx, &history).await.unwrap();
    assert!(goals.is_empty());

    let requests = provider.client().requests();
    assert_eq!(requests[0].messages[0].content, "Soy de Madrid");
    assert_eq!(requests[1].system, prompts::PROFICIENCY_SYSTEM);
    assert_eq!(
        requests[2].messages[0].content,
        "Hola, me llamo Ana\nSoy de Madrid"
    );
}

#[tokio::test]
async fn proxy_bodies_match_endpoints() {
    let provider = ProxyProvider::new(RecordingTransport::new(&[
        ("/chat", json!({"content": "¡Hola!"})),
        ("/analyze", json!({"content": "{\"comments\":[\"Ok\"],\"errors\":[]}"})),
        ("/proficiency", json!({"level": "ADVANCED"})),
        ("/goals", json!({"goals": ["Subjunctive"]})),
    ]));
    let ctx = context();
    let history = create_test_messages();

    assert_eq!(provider.generate_reply(&ctx, &history).await.unwrap(), "¡Hola!");
    assert_eq!(provider.analyze_text(&ctx, "hola").await.unwrap().summary(), "Ok");
    assert_eq!(
        provider.detect_level(&ctx, &history).await.unwrap(),
        Proficiency::Advanced
    );
    assert_eq!(
        provider.suggest_goals(&ctx, &history).await.unwrap(),
        vec!["Subjunctive"]
    );

    let requests = provider.transport().requests();
    let paths: Vec<&str> = requests.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(paths, vec!["/chat", "/analyze", "/proficiency", "/goals"]);

    let chat = &requests[0].1;
    assert_eq!(chat["provider"], "groq");
    assert_eq!(chat["mode"], "casual");
    assert_eq!(chat["messages"][1]["role"], "tutor");
    assert_eq!(requests[1].1["text"], "hola");
    assert_eq!(requests[2].1["system"], "You are a proficiency detector.");
    assert!(requests[2].1["prompt"]
        .as_str()
        .unwrap()
        .ends_with("Hola, me llamo Ana; Soy de Madrid"));
    assert_eq!(requests[3].1["user"], "Hola, me llamo Ana\nSoy de Madrid");
}

#[tokio::test]
async fn proxy_missing_fields_fall_back() {
    let provider = ProxyProvider::new(RecordingTransport::new(&[
        ("/chat", json!({})),
        ("/proficiency", json!({})),
        ("/goals", json!({"goals": null})),
    ]));
    let ctx = context();
    assert_eq!(provider.generate_reply(&ctx, &[]).await.unwrap(), "");
    assert_eq!(
        provider.detect_level(&ctx, &[]).await.unwrap(),
        Proficiency::Beginner
    );
    assert!(provider.suggest_goals(&ctx, &[]).await.unwrap().is_empty());

    let err = provider.analyze_text(&ctx, "x").await.unwrap_err();
    assert!(matches!(err, TutorError::Request { status: 404, .. }));
}

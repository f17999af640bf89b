//! Headless walkthrough of the four features.
//!
//! Stands in for the screens: feeds input to a controller backed by a
//! scripted service and prints every published state.
//!
//! Run with: cargo run -p nanogen-demo -- [config.json]

mod config;

use anyhow::Context;
use config::DemoConfig;
use nanogen_chat::{ChatLog, DEFAULT_GREETING};
use nanogen_models::{Feature, FeatureStatus, RewriteStyle};
use nanogen_service::{DownloadEvent, FeatureService, ImageInput, RewriteRequest, ScriptedService};
use nanogen_session::{ControllerState, FeatureController, GateConfig, InputGate, Phase};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

const MB: i64 = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,nanogen=debug")),
        )
        .init();

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => DemoConfig::load(&path)?,
        None => DemoConfig::default(),
    };
    tracing::info!(?config, "starting nanogen demo");

    for feature in Feature::ALL {
        println!("{:<18} {}", feature.title(), feature.subtitle());
    }

    summarize(&config).await?;
    proofread(&config).await?;
    rewrite(&config).await?;
    describe(&config).await?;

    Ok(())
}

fn spawn_renderer(feature: Feature, mut rx: watch::Receiver<ControllerState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            render(feature, &state);
        }
    })
}

fn render(feature: Feature, state: &ControllerState) {
    let title = feature.title();
    match state.phase {
        Phase::Downloading if state.progress.expected_bytes > 0 => {
            println!("[{title}] {} ({}%)", state.progress.label(), state.progress.percent());
        }
        Phase::Failed => {
            println!("[{title}] error: {}", state.error.as_deref().unwrap_or("unknown"));
        }
        _ => {
            println!(
                "[{title}] {:<14} {:<16} {}",
                state.phase.to_string(),
                state.action_label(feature),
                state.output
            );
        }
    }
}

async fn finish<S: FeatureService>(controller: &FeatureController<S>) -> anyhow::Result<ControllerState> {
    let mut rx = controller.subscribe();
    let state = rx
        .wait_for(|s| s.phase.is_terminal())
        .await
        .context("controller state channel closed")?
        .clone();
    Ok(state)
}

fn gate_config(config: &DemoConfig, feature: Feature) -> GateConfig {
    config
        .gate
        .clone()
        .unwrap_or_else(|| GateConfig::for_feature(feature))
}

async fn summarize(config: &DemoConfig) -> anyhow::Result<()> {
    let mut download = vec![DownloadEvent::Started(24 * MB)];
    download.extend((1..=6).map(|step| DownloadEvent::Progress(step * 4 * MB)));
    download.push(DownloadEvent::Completed);

    let service = ScriptedService::<String>::new(FeatureStatus::Downloadable)
        .with_status_delay(Duration::from_millis(150))
        .with_download(download)
        .with_tokens([
            "- Models run locally.\n",
            "- Privacy over quality.\n",
            "- One-time download.",
        ]);
    let controller =
        FeatureController::with_config(Feature::Summarization, service, config.controller.clone());
    let renderer = spawn_renderer(controller.feature(), controller.subscribe());

    controller.submit(config.article.clone());
    let state = finish(&controller).await?;
    tracing::info!(phase = %state.phase, chars = state.output.len(), "summary ready");

    controller.clear();
    drop(controller);
    renderer.await?;
    Ok(())
}

async fn proofread(config: &DemoConfig) -> anyhow::Result<()> {
    let service = ScriptedService::<String>::new(FeatureStatus::Available).with_tokens([
        "The team needs to urgently fix this issue ",
        "before the big product launch.",
    ]);
    let feature = Feature::Proofreading;
    let controller = Arc::new(FeatureController::with_config(
        feature,
        service,
        config.controller.clone(),
    ));
    let renderer = spawn_renderer(feature, controller.subscribe());
    let gate = InputGate::attach(Arc::clone(&controller), gate_config(config, feature), |text| text);

    let mut typed = String::new();
    for ch in config.draft.chars() {
        typed.push(ch);
        gate.push(typed.clone());
        tokio::time::sleep(Duration::from_millis(config.keystroke_ms)).await;
    }

    let state = finish(controller.as_ref()).await?;
    let mut chat = ChatLog::with_greeting(DEFAULT_GREETING);
    chat.append(typed, true);
    chat.append(state.output, false);
    for message in chat.newest_first() {
        let who = if message.from_user { "you" } else { "assistant" };
        println!("  {who:>9}: {}", message.text);
    }

    drop(gate);
    drop(controller);
    renderer.await?;
    Ok(())
}

async fn rewrite(config: &DemoConfig) -> anyhow::Result<()> {
    let service = ScriptedService::<RewriteRequest>::new(FeatureStatus::Available)
        .with_tokens(["Team, ", "this issue must be resolved ", "ahead of launch."]);
    let controller =
        FeatureController::with_config(Feature::Rewrite, service, config.controller.clone());
    let renderer = spawn_renderer(controller.feature(), controller.subscribe());

    let text = "The team needs to urgently fix this issue before the big product launch.";
    controller.submit(RewriteRequest::new(text, RewriteStyle::Friendly));
    // Picking another style supersedes the running rewrite.
    controller.submit(RewriteRequest::new(text, RewriteStyle::Professional));

    let state = finish(&controller).await?;
    tracing::info!(style = %RewriteStyle::Professional, output = %state.output, "rewrite ready");

    drop(controller);
    renderer.await?;
    Ok(())
}

async fn describe(config: &DemoConfig) -> anyhow::Result<()> {
    let service = ScriptedService::<Option<ImageInput>>::new(FeatureStatus::Available)
        .with_tokens(["A laptop ", "on a wooden desk ", "next to a coffee mug."]);
    let controller = FeatureController::with_config(
        Feature::ImageDescription,
        service,
        config.controller.clone(),
    );
    let renderer = spawn_renderer(controller.feature(), controller.subscribe());

    // Nothing picked yet.
    controller.submit(None);
    render(controller.feature(), &controller.state());

    controller.submit(Some(ImageInput::new(vec![0xff, 0xd8, 0xff, 0xe0], 640, 480)));
    let state = finish(&controller).await?;
    tracing::info!(output = %state.output, "description ready");

    drop(controller);
    renderer.await?;
    Ok(())
}

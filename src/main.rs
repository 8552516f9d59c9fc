mod cli;

use trackpick::{
    config,
    controller::SelectionController,
    player::{MemoryPlayer, Player, TrackSlot},
    service::{SelectionService, SessionEvent},
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use tp_core::{AudioOption, Settings, TrackChoice, TrackRegistry};
use tp_rules::{predict_audio, AudioCandidates};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "trackpick=trace,tp_rules=trace,tp_core=debug".to_string()
        } else {
            "trackpick=info,tp_rules=info,tp_core=info".to_string()
        }
    });

    // Logs go to stderr; stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let settings_path = cli.settings.as_deref();
    let rules_path = cli.rules.as_deref();

    match cli.command {
        Commands::Select {
            tracks,
            audio,
            json,
        } => select(&tracks, audio, json, settings_path, rules_path),
        Commands::Predict {
            tracks,
            aid,
            alang,
            json,
        } => predict(&tracks, aid, &alang, json),
        Commands::Simulate {
            tracks,
            aid,
            alang,
            no_preload,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(simulate(
                &tracks,
                aid,
                alang,
                no_preload,
                json,
                settings_path,
                rules_path,
            ))
        }
        Commands::Validate { rules } => {
            let path = rules.or_else(|| rules_path.map(Path::to_path_buf));
            validate_rules(path.as_deref(), settings_path)
        }
        Commands::Version => {
            println!("trackpick {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn read_registry(path: &Path) -> Result<TrackRegistry> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read track list: {:?}", path))?;
    TrackRegistry::from_json(&content).with_context(|| format!("Invalid track list: {:?}", path))
}

fn read_raw_tracks(path: &Path) -> Result<Vec<tp_core::RawTrack>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read track list: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid track list: {:?}", path))
}

fn select(
    tracks: &Path,
    audio: Option<TrackChoice>,
    json: bool,
    settings_path: Option<&Path>,
    rules_path: Option<&Path>,
) -> Result<()> {
    let settings = config::load_settings_or_default(settings_path)?;
    let engine = config::load_engine(&settings, rules_path)?;
    let registry = read_registry(tracks)?;

    let candidates = match audio {
        None | Some(TrackChoice::Unset) => AudioCandidates::All,
        Some(TrackChoice::Disabled) => AudioCandidates::Only(None),
        Some(TrackChoice::Track(id)) => {
            let track = registry
                .audio_by_id(id)
                .with_context(|| format!("No audio track with id {}", id))?;
            AudioCandidates::Only(Some(track))
        }
    };

    let selection = engine.select(&registry, candidates);

    if json {
        println!("{}", serde_json::to_string_pretty(&selection)?);
        return Ok(());
    }

    match selection.rule_index.and_then(|i| engine.rules().get(i)) {
        Some(rule) => println!("Matched {}", rule),
        None => println!("No rule matched; player defaults apply"),
    }
    println!("  audio:         {}", selection.audio);
    println!("  sub:           {}", selection.sub);
    println!("  secondary_sub: {}", selection.secondary_sub);
    if let Some(visible) = selection.sub_visibility {
        println!("  sub_visibility: {}", visible);
    }
    if let Some(visible) = selection.secondary_sub_visibility {
        println!("  secondary_sub_visibility: {}", visible);
    }

    Ok(())
}

fn predict(tracks: &Path, aid: AudioOption, alang: &[String], json: bool) -> Result<()> {
    let registry = read_registry(tracks)?;
    let predicted = predict_audio(registry.audio(), aid, alang);

    if json {
        let value = serde_json::json!({ "audio": TrackChoice::from(predicted) });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match predicted {
        Some(track) => println!("Predicted audio: {}", track),
        None => println!("Predicted audio: no"),
    }
    Ok(())
}

async fn simulate(
    tracks: &Path,
    aid: AudioOption,
    alang: Vec<String>,
    no_preload: bool,
    json: bool,
    settings_path: Option<&Path>,
    rules_path: Option<&Path>,
) -> Result<()> {
    let mut settings: Settings = config::load_settings_or_default(settings_path)?;
    if no_preload {
        settings.preload = false;
    }
    let engine = config::load_engine(&settings, rules_path)?;

    let player = MemoryPlayer::new(read_raw_tracks(tracks)?)
        .with_audio_option(aid)
        .with_alang_priority(alang);
    let mut controller = SelectionController::new(player, settings, engine);

    // File load, then playback start. Each phase drains its own queue so
    // the player resolves its audio between them.
    for event in [SessionEvent::FileLoaded, SessionEvent::PlaybackStarted] {
        if event == SessionEvent::PlaybackStarted {
            controller.player_mut().start_playback();
        }
        let (service, handle) = SelectionService::new(controller, 8);
        let task = tokio::spawn(service.run());
        handle.send(event).await?;
        drop(handle);
        controller = task.await.context("Selection service task failed")?;
    }

    let player = controller.player();
    let audio = player.current_track(TrackSlot::Audio)?;
    let sub = player.current_track(TrackSlot::Sub)?;
    let secondary_sub = player.current_track(TrackSlot::SecondarySub)?;

    if json {
        let value = serde_json::json!({
            "writes": player.writes(),
            "audio": audio,
            "sub": sub,
            "secondary_sub": secondary_sub,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Property writes: {}", player.writes().len());
    for write in player.writes() {
        println!("  {} = {}", write.property, write.value);
    }
    println!("Final state:");
    println!("  aid:           {}", audio);
    println!("  sid:           {}", sub);
    println!("  secondary-sid: {}", secondary_sub);

    Ok(())
}

fn validate_rules(rules_path: Option<&Path>, settings_path: Option<&Path>) -> Result<()> {
    let settings = config::load_settings_or_default(settings_path)?;
    let path = config::expand_path(rules_path.unwrap_or(&settings.rules_path));

    println!("Validating rules: {:?}", path);
    let engine = config::load_engine(&settings, Some(path.as_path()))?;

    println!("✓ Rules are valid");
    println!("  Rules: {}", engine.rules().len());
    for rule in engine.rules() {
        println!("    {}", rule);
    }

    let warnings = settings.validate();
    if !warnings.is_empty() {
        println!("  Settings warnings:");
        for warning in warnings {
            println!("    {}", warning);
        }
    }

    Ok(())
}

use anyhow::Context;
use clap::Parser;
use emomaestro_core::config::{
    resolve_api_key, resolve_optional_string, resolve_string_with_default, AppConfig, Backend,
    DurationSecs, Env, FusionWeight, InferenceConfig, ModelRefs, StdEnv,
    DEFAULT_DURATION_SECS, DEFAULT_FACE_MODEL, DEFAULT_GENERATION_TIMEOUT_SECS,
    DEFAULT_INFERENCE_URL, DEFAULT_MUSIC_MODEL, DEFAULT_OUTPUT_FILE, DEFAULT_TEXT_MODEL,
    DEFAULT_TEXT_WEIGHT, ENV_HF_API_TOKEN, ENV_INFERENCE_URL, ENV_OUTPUT,
};
use emomaestro_core::pipeline::{Pipeline, PipelineInput};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "emomaestro")]
#[command(about = "Compose a short instrumental track from a diary entry and/or a portrait")]
struct Args {
    /// Diary text.
    #[arg(long, conflicts_with = "text_file")]
    text: Option<String>,

    /// Read the diary text from a file.
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// Portrait image (JPEG or PNG).
    #[arg(long)]
    image: Option<PathBuf>,

    /// Share of the text source in the fused mood, 0.0 to 1.0.
    #[arg(long, default_value_t = DEFAULT_TEXT_WEIGHT)]
    text_weight: f32,

    /// Clip length in seconds, at most 300.
    #[arg(long, default_value_t = DEFAULT_DURATION_SECS)]
    duration_secs: u32,

    #[arg(long)]
    output: Option<PathBuf>,

    /// Fix descriptor selection for reproducible prompts.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_GENERATION_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[arg(long)]
    hf_token: Option<String>,

    #[arg(long)]
    inference_url: Option<String>,

    #[arg(long, default_value = DEFAULT_TEXT_MODEL)]
    text_model: String,

    #[arg(long, default_value = DEFAULT_FACE_MODEL)]
    face_model: String,

    #[arg(long, default_value = DEFAULT_MUSIC_MODEL)]
    music_model: String,

    /// Use the built-in keyword classifier and tone generator; no network.
    #[arg(long)]
    offline: bool,

    /// Play the result on the default output device.
    #[arg(long)]
    play: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let cfg = build_config(args, &env)?;

    tracing::info!(
        backend = ?cfg.backend,
        text_weight = cfg.text_weight.text(),
        duration_secs = cfg.duration.get(),
        output = %cfg.output_path.display(),
        "config loaded"
    );

    let pipeline = Pipeline::from_config(&cfg).context("failed to set up pipeline")?;
    let report = pipeline
        .run(PipelineInput::new(cfg.text.clone(), cfg.image_path.clone()))
        .await;

    match report.outcome {
        Ok(artifact) => {
            println!("{}", artifact.path.display());
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("generation failed")),
    }
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(args: Args, env: &impl Env) -> anyhow::Result<AppConfig> {
    let text = match (args.text, args.text_file) {
        (Some(t), _) => Some(t),
        (None, Some(path)) => Some(
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read --text-file {}", path.display()))?,
        ),
        (None, None) => None,
    };

    let text_weight = FusionWeight::new(args.text_weight)?;
    let duration = DurationSecs::new(args.duration_secs)?;
    let output_path = PathBuf::from(resolve_string_with_default(
        args.output.map(|p| p.to_string_lossy().into_owned()),
        ENV_OUTPUT,
        env,
        DEFAULT_OUTPUT_FILE,
    ));

    let api_token = resolve_api_key(args.hf_token, ENV_HF_API_TOKEN, env)?;
    let base_url = resolve_optional_string(args.inference_url, ENV_INFERENCE_URL, env)
        .unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_owned());

    let backend = if args.offline {
        Backend::Offline
    } else {
        if api_token.is_none() {
            tracing::warn!("no {ENV_HF_API_TOKEN} set; hosted models may reject anonymous calls");
        }
        Backend::Remote
    };

    Ok(AppConfig {
        text,
        image_path: args.image,
        text_weight,
        duration,
        output_path,
        seed: args.seed,
        generation_timeout: Duration::from_secs(args.timeout_secs),
        backend,
        play: args.play,
        inference: InferenceConfig {
            base_url,
            api_token,
            models: ModelRefs {
                text: args.text_model,
                face: args.face_model,
                music: args.music_model,
            },
        },
    })
}

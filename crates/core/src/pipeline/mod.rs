use crate::{
    config::{AppConfig, Backend, DurationSecs, FusionWeight},
    emotion::{
        fuse, map_face, map_text, ClassifyError, EmotionProbabilities, FaceClassifier,
        FusionError, HfFaceClassifier, HfTextClassifier, KeywordTextClassifier, MappingError,
        TextClassifier, ValenceArousal,
    },
    inference::InferenceClient,
    music::{
        GenerationRequest, HfMusicGenerator, MusicError, MusicGenerator, ToneMusicGenerator,
    },
    output::{write_wav, AudioArtifact, OutputError},
    playback::PlaybackSink,
    prompt::{build_prompt_for, Prompt, PromptError},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const TEXT_CLASSIFIER: &str = "text classifier";
const FACE_CLASSIFIER: &str = "face classifier";
const MUSIC_GENERATOR: &str = "music generator";

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no valid emotion source (both text and face are empty)")]
    NoEmotionSource,

    #[error("{collaborator} unavailable: {details}")]
    CollaboratorUnavailable {
        collaborator: &'static str,
        details: String,
    },

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("music generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to write audio: {0}")]
    Output(#[from] OutputError),

    #[error("background task failed: {0}")]
    Task(String),
}

impl From<MappingError> for PipelineError {
    fn from(e: MappingError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

impl From<FusionError> for PipelineError {
    fn from(e: FusionError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

impl From<PromptError> for PipelineError {
    fn from(e: PromptError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

fn unavailable(collaborator: &'static str, details: impl ToString) -> PipelineError {
    PipelineError::CollaboratorUnavailable {
        collaborator,
        details: details.to_string(),
    }
}

fn classify_failure(collaborator: &'static str, e: ClassifyError) -> PipelineError {
    match e {
        ClassifyError::EmptyInput(what) => PipelineError::EmptyInput(what.to_owned()),
        other => unavailable(collaborator, other),
    }
}

fn music_failure(e: MusicError) -> PipelineError {
    match e {
        MusicError::EmptyPrompt => PipelineError::EmptyInput("empty prompt".to_owned()),
        other => unavailable(MUSIC_GENERATOR, other),
    }
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub text_weight: FusionWeight,
    pub duration: DurationSecs,
    pub output_path: PathBuf,
    pub seed: Option<u64>,
    pub generation_timeout: Duration,
}

impl PipelineConfig {
    pub fn from_app(app: &AppConfig) -> Self {
        Self {
            text_weight: app.text_weight,
            duration: app.duration,
            output_path: app.output_path.clone(),
            seed: app.seed,
            generation_timeout: app.generation_timeout,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_app(&AppConfig::default())
    }
}

/// Raw user inputs for one run. Blank values count as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineInput {
    pub text: Option<String>,
    pub image_path: Option<PathBuf>,
}

impl PipelineInput {
    pub fn new(text: Option<String>, image_path: Option<PathBuf>) -> Self {
        Self { text, image_path }.normalized()
    }

    fn normalized(self) -> Self {
        let text = self
            .text
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());
        let image_path = self.image_path.and_then(|p| match p.to_str() {
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(PathBuf::from(s.trim())),
            None => Some(p),
        });
        Self { text, image_path }
    }
}

/// Intermediate values of a run, filled in as far as the run got.
#[derive(Clone, Debug, Default)]
pub struct MoodTrace {
    pub text_probabilities: Option<EmotionProbabilities>,
    pub face_probabilities: Option<EmotionProbabilities>,
    pub text_point: Option<ValenceArousal>,
    pub face_point: Option<ValenceArousal>,
    pub fused: Option<ValenceArousal>,
    pub prompt: Option<Prompt>,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub trace: MoodTrace,
    pub outcome: Result<AudioArtifact, PipelineError>,
}

impl PipelineReport {
    pub fn artifact(&self) -> Option<&AudioArtifact> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.outcome.as_ref().err()
    }
}

#[derive(Clone)]
pub struct Pipeline {
    pub text: Option<Arc<dyn TextClassifier>>,
    pub face: Option<Arc<dyn FaceClassifier>>,
    pub music: Arc<dyn MusicGenerator>,
    pub playback: Option<Arc<dyn PlaybackSink>>,
    pub config: PipelineConfig,
}

impl Pipeline {
    /// Build every collaborator the configured backend needs. Fails up front
    /// instead of leaving a half-initialized pipeline.
    pub fn from_config(app: &AppConfig) -> Result<Self, PipelineError> {
        let config = PipelineConfig::from_app(app);
        let playback = if app.play { playback_sink() } else { None };

        match app.backend {
            Backend::Remote => {
                let client = InferenceClient::new(&app.inference)
                    .map_err(|e| unavailable("inference client", e))?;
                let models = &app.inference.models;
                let text = HfTextClassifier::new(client.clone(), models.text.as_str())
                    .map_err(|e| unavailable(TEXT_CLASSIFIER, e))?;
                let face = HfFaceClassifier::new(client.clone(), models.face.as_str())
                    .map_err(|e| unavailable(FACE_CLASSIFIER, e))?;
                let music = HfMusicGenerator::new(client, models.music.as_str())
                    .map_err(|e| unavailable(MUSIC_GENERATOR, e))?;
                Ok(Self {
                    text: Some(Arc::new(text)),
                    face: Some(Arc::new(face)),
                    music: Arc::new(music),
                    playback,
                    config,
                })
            }
            Backend::Offline => Ok(Self {
                text: Some(Arc::new(KeywordTextClassifier::new())),
                face: None,
                music: Arc::new(ToneMusicGenerator::new()),
                playback,
                config,
            }),
        }
    }

    /// Run once. Failures are reported in the returned value, never raised.
    pub async fn run(&self, input: PipelineInput) -> PipelineReport {
        let mut trace = MoodTrace::default();
        let outcome = self.try_run(input, &mut trace).await;
        match &outcome {
            Ok(artifact) => tracing::info!(
                path = %artifact.path.display(),
                duration_ms = artifact.duration.as_millis() as u64,
                "music generated"
            ),
            Err(e) => tracing::error!(error = %e, "pipeline failed"),
        }
        PipelineReport { trace, outcome }
    }

    async fn try_run(
        &self,
        input: PipelineInput,
        trace: &mut MoodTrace,
    ) -> Result<AudioArtifact, PipelineError> {
        let input = input.normalized();
        tracing::info!(
            has_text = input.text.is_some(),
            image = ?input.image_path,
            "starting pipeline"
        );

        if let Some(text) = input.text {
            let classifier = self
                .text
                .as_ref()
                .ok_or_else(|| unavailable(TEXT_CLASSIFIER, "not configured"))?;
            let probs = classifier
                .classify_text(text)
                .await
                .map_err(|e| classify_failure(TEXT_CLASSIFIER, e))?;
            tracing::debug!(?probs, "text emotion probabilities");
            if probs.is_empty() {
                tracing::warn!("text classifier returned no labels; ignoring text source");
            } else {
                let point = map_text(&probs)?;
                tracing::info!(
                    valence = point.valence(),
                    arousal = point.arousal(),
                    "text valence/arousal"
                );
                trace.text_point = Some(point);
            }
            trace.text_probabilities = Some(probs);
        }

        if let Some(image_path) = input.image_path {
            let classifier = self
                .face
                .as_ref()
                .ok_or_else(|| unavailable(FACE_CLASSIFIER, "not configured"))?;
            let probs = classifier
                .classify_face(image_path)
                .await
                .map_err(|e| classify_failure(FACE_CLASSIFIER, e))?;
            tracing::debug!(?probs, "face emotion probabilities");
            if probs.is_empty() {
                tracing::warn!("face classifier returned no labels; ignoring portrait");
            } else {
                let point = map_face(&probs)?;
                tracing::info!(
                    valence = point.valence(),
                    arousal = point.arousal(),
                    "face valence/arousal"
                );
                trace.face_point = Some(point);
            }
            trace.face_probabilities = Some(probs);
        }

        if trace.text_point.is_none() && trace.face_point.is_none() {
            return Err(PipelineError::NoEmotionSource);
        }

        let fused = fuse(trace.text_point, trace.face_point, self.config.text_weight)?;
        tracing::info!(
            valence = fused.valence(),
            arousal = fused.arousal(),
            text_weight = self.config.text_weight.text(),
            "fused valence/arousal"
        );
        trace.fused = Some(fused);

        let prompt = build_prompt_for(fused, &mut self.rng())?;
        tracing::info!(prompt = %prompt, genre = ?prompt.genre(), "prompt built");
        trace.prompt = Some(prompt.clone());

        let request = GenerationRequest {
            prompt: prompt.into_string(),
            duration: self.config.duration,
        };
        let timeout = self.config.generation_timeout;
        let audio = tokio::time::timeout(timeout, self.music.generate(request))
            .await
            .map_err(|_| PipelineError::Timeout(timeout))?
            .map_err(music_failure)?;

        let path = self.config.output_path.clone();
        let (written, audio) = tokio::task::spawn_blocking(move || {
            let written = write_wav(&path, &audio);
            (written, audio)
        })
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))?;
        let artifact = written?;

        if let Some(sink) = &self.playback {
            if let Err(e) = sink.play(audio).await {
                tracing::warn!(error = %e, "playback failed; artifact was still written");
            }
        }

        Ok(artifact)
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[cfg(feature = "playback")]
fn playback_sink() -> Option<Arc<dyn PlaybackSink>> {
    Some(Arc::new(crate::playback::AudioPlaybackSink::new()))
}

#[cfg(not(feature = "playback"))]
fn playback_sink() -> Option<Arc<dyn PlaybackSink>> {
    tracing::warn!("built without the `playback` feature; ignoring play request");
    None
}

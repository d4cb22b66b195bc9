use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, time::Duration};

pub const DEFAULT_TEXT_WEIGHT: f32 = 0.3;
pub const DEFAULT_DURATION_SECS: u32 = 30;
pub const MAX_DURATION_SECS: u32 = 300;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_OUTPUT_FILE: &str = "EmoMaestro.wav";
pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_TEXT_MODEL: &str = "Jinuuuu/KoELECTRA_fine_tunning_emotion";
pub const DEFAULT_FACE_MODEL: &str = "trpakov/vit-face-expression";
pub const DEFAULT_MUSIC_MODEL: &str = "facebook/musicgen-small";
pub const ENV_HF_API_TOKEN: &str = "HF_API_TOKEN";
pub const ENV_INFERENCE_URL: &str = "EMOMAESTRO_INFERENCE_URL";
pub const ENV_OUTPUT: &str = "EMOMAESTRO_OUTPUT";

/// Trust placed in the text source when fusing; the face source gets `1 - weight`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct FusionWeight(f32);

impl FusionWeight {
    /// Finite values are clamped into [0, 1].
    pub fn new(value: f32) -> Result<Self, ConfigError> {
        if !value.is_finite() {
            return Err(ConfigError::NonFiniteWeight);
        }
        Ok(Self(value.clamp(0.0, 1.0)))
    }

    pub fn text(&self) -> f32 {
        self.0
    }

    pub fn face(&self) -> f32 {
        1.0 - self.0
    }
}

impl Default for FusionWeight {
    fn default() -> Self {
        Self(DEFAULT_TEXT_WEIGHT)
    }
}

/// Requested clip length, 1 to `MAX_DURATION_SECS` seconds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "u32")]
pub struct DurationSecs(u32);

impl DurationSecs {
    pub fn new(secs: u32) -> Result<Self, ConfigError> {
        if secs == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if secs > MAX_DURATION_SECS {
            return Err(ConfigError::DurationTooLong {
                secs,
                max: MAX_DURATION_SECS,
            });
        }
        Ok(Self(secs))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl TryFrom<u32> for DurationSecs {
    type Error = ConfigError;

    fn try_from(secs: u32) -> Result<Self, Self::Error> {
        Self::new(secs)
    }
}

impl Default for DurationSecs {
    fn default() -> Self {
        Self(DEFAULT_DURATION_SECS)
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelRefs {
    pub text: String,
    pub face: String,
    pub music: String,
}

impl Default for ModelRefs {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT_MODEL.to_owned(),
            face: DEFAULT_FACE_MODEL.to_owned(),
            music: DEFAULT_MUSIC_MODEL.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InferenceConfig {
    pub base_url: String,
    pub api_token: Option<ApiKey>,
    pub models: ModelRefs,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INFERENCE_URL.to_owned(),
            api_token: None,
            models: ModelRefs::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Backend {
    /// Hosted inference endpoints for all three collaborators.
    #[default]
    Remote,
    /// Keyword text classifier and tone generator; no face classifier.
    Offline,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub text: Option<String>,
    pub image_path: Option<PathBuf>,
    pub text_weight: FusionWeight,
    pub duration: DurationSecs,
    pub output_path: PathBuf,
    pub seed: Option<u64>,
    pub generation_timeout: Duration,
    pub backend: Backend,
    pub play: bool,
    pub inference: InferenceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            text: None,
            image_path: None,
            text_weight: FusionWeight::default(),
            duration: DurationSecs::default(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            seed: None,
            generation_timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            backend: Backend::default(),
            play: false,
            inference: InferenceConfig::default(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("text weight must be a finite number")]
    NonFiniteWeight,
    #[error("duration must be > 0 s")]
    ZeroDuration,
    #[error("duration {secs} s exceeds the {max} s limit")]
    DurationTooLong { secs: u32, max: u32 },
    #[error("api key must not be empty")]
    EmptyApiKey,
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fusion_weight_clamps_into_unit_range() {
        assert_eq!(FusionWeight::new(1.7).expect("finite").text(), 1.0);
        assert_eq!(FusionWeight::new(-0.2).expect("finite").text(), 0.0);
        let w = FusionWeight::new(0.25).expect("finite");
        assert!((w.face() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn fusion_weight_rejects_nan() {
        assert_eq!(
            FusionWeight::new(f32::NAN).unwrap_err(),
            ConfigError::NonFiniteWeight
        );
    }

    #[test]
    fn duration_rejects_zero() {
        assert_eq!(DurationSecs::new(0).unwrap_err(), ConfigError::ZeroDuration);
        assert_eq!(DurationSecs::new(12).expect("nonzero").duration().as_secs(), 12);
    }

    #[test]
    fn duration_is_capped() {
        assert!(DurationSecs::new(MAX_DURATION_SECS).is_ok());
        assert_eq!(
            DurationSecs::new(u32::MAX).unwrap_err(),
            ConfigError::DurationTooLong {
                secs: u32::MAX,
                max: MAX_DURATION_SECS,
            }
        );
        assert!(serde_json::from_str::<DurationSecs>("4000000000").is_err());
        assert_eq!(
            serde_json::from_str::<DurationSecs>("45").expect("in range").get(),
            45
        );
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("hf_secret").expect("valid key");
        assert!(!format!("{key:?}").contains("hf_secret"));
    }

    #[test]
    fn api_key_cli_takes_precedence_over_env() {
        let env = MapEnv::default().with_var(ENV_HF_API_TOKEN, "env-key");
        let key = resolve_api_key(Some("cli-key".to_owned()), ENV_HF_API_TOKEN, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "cli-key");
    }

    #[test]
    fn api_key_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_HF_API_TOKEN, "env-key");
        let key = resolve_api_key(None, ENV_HF_API_TOKEN, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "env-key");
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let env = MapEnv::default().with_var(ENV_HF_API_TOKEN, "   ");
        assert_eq!(
            resolve_api_key(None, ENV_HF_API_TOKEN, &env).unwrap_err(),
            ConfigError::EmptyApiKey
        );
    }

    #[test]
    fn resolve_string_with_default_falls_through() {
        let env = MapEnv::default().with_var(ENV_INFERENCE_URL, "http://env");
        assert_eq!(
            resolve_string_with_default(
                Some("http://cli".to_owned()),
                ENV_INFERENCE_URL,
                &env,
                "d"
            ),
            "http://cli"
        );
        assert_eq!(
            resolve_string_with_default(None, ENV_INFERENCE_URL, &env, "d"),
            "http://env"
        );
        assert_eq!(
            resolve_string_with_default(None, ENV_INFERENCE_URL, &MapEnv::default(), "d"),
            "d"
        );
    }

    #[test]
    fn resolve_optional_string_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_OUTPUT, "out.wav");
        assert_eq!(
            resolve_optional_string(None, ENV_OUTPUT, &env).as_deref(),
            Some("out.wav")
        );
        assert_eq!(resolve_optional_string(None, ENV_OUTPUT, &MapEnv::default()), None);
    }
}

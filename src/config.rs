use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub faq: FaqConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    pub server: ServerConfig,
    #[serde(default = "default_intents")]
    pub intents: Vec<IntentConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    /// Delimited text file with `Question` and `Réponse` header columns.
    pub path: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ','
}

#[derive(Debug, Deserialize, Clone)]
pub struct FaqConfig {
    /// Best similarity must be strictly greater than this to accept a FAQ answer.
    #[serde(default = "default_faq_threshold")]
    pub threshold: f32,
}

impl Default for FaqConfig {
    fn default() -> Self {
        Self {
            threshold: default_faq_threshold(),
        }
    }
}

fn default_faq_threshold() -> f32 {
    0.70
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL for the ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

/// One routable intent: a name, its reference phrasings, and its own
/// acceptance threshold. The FAQ threshold is deliberately a separate,
/// uncoordinated value.
#[derive(Debug, Deserialize, Clone)]
pub struct IntentConfig {
    pub name: String,
    pub examples: Vec<String>,
    #[serde(default = "default_intent_threshold")]
    pub threshold: f32,
}

fn default_intent_threshold() -> f32 {
    0.75
}

/// The two built-in intents, used when the config file defines none.
pub fn default_intents() -> Vec<IntentConfig> {
    vec![
        IntentConfig {
            name: "consumption".to_string(),
            examples: vec![
                "Quelle est ma consommation pour ce mois ?".to_string(),
                "Combien d'eau ai-je consommé ?".to_string(),
                "Je veux voir ma consommation d'eau.".to_string(),
            ],
            threshold: default_intent_threshold(),
        },
        IntentConfig {
            name: "invoice".to_string(),
            examples: vec![
                "Montrez-moi mes factures".to_string(),
                "Combien dois-je payer ?".to_string(),
                "Je veux vérifier ma facture pour un certain mois.".to_string(),
            ],
            threshold: default_intent_threshold(),
        },
    ]
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate thresholds (cosine similarity lives in [-1, 1])
    if !(-1.0..=1.0).contains(&config.faq.threshold) {
        anyhow::bail!("faq.threshold must be in [-1.0, 1.0]");
    }

    // Validate intents
    if config.intents.is_empty() {
        anyhow::bail!("at least one [[intents]] entry is required");
    }
    for intent in &config.intents {
        if intent.name.trim().is_empty() {
            anyhow::bail!("intent name must not be empty");
        }
        if intent.examples.is_empty() {
            anyhow::bail!("intent '{}' must list at least one example", intent.name);
        }
        if !(-1.0..=1.0).contains(&intent.threshold) {
            anyhow::bail!("intent '{}' threshold must be in [-1.0, 1.0]", intent.name);
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" | "local" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
            other
        ),
    }

    Ok(config)
}

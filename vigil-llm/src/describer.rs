//! Scene descriptions for the user, built from detection summaries

use crate::config::SceneConfig;
use crate::error::{Result, SceneError};
use crate::providers::SceneProvider;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use vigil_core::Assessment;
use vigil_eye::detections_summary;

pub const DEFAULT_SUMMARY: &str = "Procesando entorno...";
pub const DEFAULT_ADVICE: &str = "Precaución";
pub const DEFAULT_DIRECTION: &str = "detenerse";
pub const NOTHING_AHEAD: &str = "No detecto obstáculos visibles al frente.";

/// Longest detection summary sent to the provider
const MAX_SUMMARY_CHARS: usize = 2_000;
const MAX_QUESTION_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub summary: String,
    pub navigation_advice: String,
    pub potential_hazards: Vec<String>,
    pub safe_direction: String,
}

impl SceneDescription {
    /// Shown when the provider call failed
    pub fn fallback(err: &SceneError) -> Self {
        let reason: String = err.to_string().chars().take(50).collect();
        Self {
            summary: format!("Error en IA: {}...", reason),
            navigation_advice: "Error técnico".to_string(),
            potential_hazards: Vec::new(),
            safe_direction: DEFAULT_DIRECTION.to_string(),
        }
    }

    /// One line suitable for speech
    pub fn spoken(&self) -> String {
        format!("{} {}", self.summary, self.navigation_advice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Navigation,
    Hazards,
    SafeDirection,
}

impl Section {
    /// Section a header line opens, if any. Only the text before the first
    /// colon is looked at, so values never reopen a section.
    fn from_header(line: &str) -> Option<Self> {
        let header = line.split_once(':').map(|(header, _)| header).unwrap_or(line);
        let lower = header.to_lowercase();
        if lower.contains("resumen") || header.contains("1.") {
            Some(Section::Summary)
        } else if lower.contains("consejo") || lower.contains("navegación") || header.contains("2.") {
            Some(Section::Navigation)
        } else if lower.contains("peligro") || header.contains("3.") {
            Some(Section::Hazards)
        } else if lower.contains("dirección") || lower.contains("segura") || header.contains("4.") {
            Some(Section::SafeDirection)
        } else {
            None
        }
    }
}

fn clean(text: &str) -> &str {
    text.trim_matches(|c: char| c == '*' || c == '#' || c.is_whitespace())
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(clean)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the four-section answer (RESUMEN, CONSEJO, PELIGROS, DIRECCIÓN).
///
/// A value may follow its header after a colon or sit on the next line.
/// Missing sections fall back to safe defaults.
pub fn parse_response(text: &str) -> SceneDescription {
    let mut summary = String::new();
    let mut navigation = String::new();
    let mut hazards: Vec<String> = Vec::new();
    let mut safe_direction: Option<String> = None;
    let mut current: Option<Section> = None;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(section) = Section::from_header(line) {
            current = Some(section);
            let Some((_, value)) = line.split_once(':') else {
                continue;
            };
            let value = clean(value);
            match section {
                Section::Summary => summary = value.to_string(),
                Section::Navigation => navigation = value.to_string(),
                Section::Hazards => hazards = split_list(value),
                Section::SafeDirection => {
                    if !value.is_empty() {
                        safe_direction = Some(value.to_string());
                    }
                }
            }
            continue;
        }

        let value = clean(line);
        match current {
            Some(Section::Summary) if summary.is_empty() => summary = value.to_string(),
            Some(Section::Navigation) if navigation.is_empty() => navigation = value.to_string(),
            Some(Section::Hazards) if hazards.is_empty() => hazards = split_list(value),
            Some(Section::SafeDirection) if safe_direction.is_none() => safe_direction = Some(value.to_string()),
            _ => {}
        }
    }

    if summary.is_empty() {
        summary = DEFAULT_SUMMARY.to_string();
    }
    if navigation.is_empty() {
        navigation = DEFAULT_ADVICE.to_string();
    }

    SceneDescription {
        summary,
        navigation_advice: navigation,
        potential_hazards: hazards,
        safe_direction: safe_direction.unwrap_or_else(|| DEFAULT_DIRECTION.to_string()),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn scene_prompt(detections: &str) -> String {
    format!(
        "Eres un asistente visual para una persona ciega.\n\
         Tienes acceso a una lista de objetos detectados por sensores.\n\n\
         OBJETOS DETECTADOS: {}\n\n\
         Responde en español de forma MUY BREVE y CLARA:\n\n\
         1. RESUMEN: Frase corta de lo que hay.\n\
         2. CONSEJO DE NAVEGACIÓN: Basado en los peligros detectados.\n\
         3. PELIGROS: Lista de amenazas (si las hay).\n\
         4. DIRECCIÓN SEGURA: Dónde moverse.\n\n\
         Sé conciso.",
        detections
    )
}

fn quick_prompt(detections: &str) -> String {
    format!(
        "Resume en 1 oración qué hay alrededor para un ciego.\nOBJETOS: {}\nIdioma: Español.",
        detections
    )
}

fn question_prompt(detections: &str, question: &str) -> String {
    format!(
        "Eres un asistente para una persona ciega.\n\
         OBJETOS DETECTADOS: {}\n\n\
         PREGUNTA USUARIO: \"{}\"\n\n\
         Responde basándote SOLO en los objetos detectados. Si no sabes, dilo.\n\
         Sé breve.",
        detections, question
    )
}

struct AnalysisCache {
    last_attempt: Option<Instant>,
    last_description: Option<SceneDescription>,
}

/// Scene description client with a cooldown on full analyses
pub struct SceneDescriber {
    provider: Arc<dyn SceneProvider>,
    config: SceneConfig,
    cache: Mutex<AnalysisCache>,
}

impl SceneDescriber {
    pub fn new(provider: Arc<dyn SceneProvider>, config: SceneConfig) -> Result<Self> {
        config.validate().map_err(SceneError::Config)?;
        info!("Scene describer ready (provider: {}, model: {})", provider.name(), config.model);
        Ok(Self {
            provider,
            config,
            cache: Mutex::new(AnalysisCache {
                last_attempt: None,
                last_description: None,
            }),
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Detection summary in the form the prompts expect
    pub fn summarize(&self, assessments: &[Assessment]) -> String {
        detections_summary(assessments, self.config.max_summary_objects)
    }

    /// Structured description of the scene.
    ///
    /// Within the cooldown after the previous attempt the last successful
    /// description is returned without contacting the provider (`None` if
    /// there is none yet). A provider failure yields a fallback description.
    pub async fn analyze_scene(&self, detections: &str, now: Instant) -> Option<SceneDescription> {
        let cooldown = Duration::from_secs_f64(self.config.cooldown_secs);
        {
            let mut cache = self.cache.lock();
            if let Some(last) = cache.last_attempt {
                if now.saturating_duration_since(last) < cooldown {
                    return cache.last_description.clone();
                }
            }
            cache.last_attempt = Some(now);
        }

        let prompt = scene_prompt(&truncate(detections, MAX_SUMMARY_CHARS));
        match self.provider.generate(&prompt).await {
            Ok(text) => {
                let description = parse_response(&text);
                self.cache.lock().last_description = Some(description.clone());
                Some(description)
            }
            Err(e) => {
                warn!("Scene analysis failed: {}", e);
                Some(SceneDescription::fallback(&e))
            }
        }
    }

    /// One-sentence description for speech
    pub async fn quick_description(&self, detections: &str) -> Result<String> {
        if detections.trim().is_empty() {
            return Ok(NOTHING_AHEAD.to_string());
        }

        let prompt = quick_prompt(&truncate(detections, MAX_SUMMARY_CHARS));
        let text = self.provider.generate(&prompt).await?;
        Ok(text.trim().to_string())
    }

    /// Answer a user question using only the detected objects
    pub async fn answer_question(&self, detections: &str, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SceneError::Provider("Question cannot be empty".to_string()));
        }

        let prompt = question_prompt(
            &truncate(detections, MAX_SUMMARY_CHARS),
            &truncate(question, MAX_QUESTION_CHARS),
        );
        let text = self.provider.generate(&prompt).await?;
        Ok(text.trim().to_string())
    }
}

//! Localized message catalog
//!
//! Every user-facing string is addressed by a [`MessageId`] and resolved against
//! the session's [`Language`] at render time. The catalog is an exhaustive match,
//! so a language missing a translation does not compile.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported UI languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Pt,
}

impl Language {
    #[cfg(test)]
    pub const ALL: [Language; 3] = [Language::En, Language::Es, Language::Pt];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Pt => "pt",
        }
    }

    /// Parse a language code, ignoring case and any region suffix (`pt-BR`, `es_AR`).
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        let primary = normalized.split(['-', '_']).next().unwrap_or("");
        match primary {
            "en" => Some(Language::En),
            "es" => Some(Language::Es),
            "pt" => Some(Language::Pt),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Identifiers for every localized string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageId {
    AppTitle,
    AppDescription,
    Generating,
    Welcome,
    Analyzing,
    ImageDescriptionPrefix,
    SocialMediaQuestion,
    SocialMediaPostsPrefix,
    ReadyForAnother,
    SocialMediaError,
    NoProblem,
    ImageAnalysisError,
    ApiError,
    ImageApiError,
    YesButton,
    NoButton,
    ProcessingPlaceholder,
    MessagePlaceholder,
    UploadedImageAlt,
}

impl MessageId {
    pub const ALL: [MessageId; 19] = [
        MessageId::AppTitle,
        MessageId::AppDescription,
        MessageId::Generating,
        MessageId::Welcome,
        MessageId::Analyzing,
        MessageId::ImageDescriptionPrefix,
        MessageId::SocialMediaQuestion,
        MessageId::SocialMediaPostsPrefix,
        MessageId::ReadyForAnother,
        MessageId::SocialMediaError,
        MessageId::NoProblem,
        MessageId::ImageAnalysisError,
        MessageId::ApiError,
        MessageId::ImageApiError,
        MessageId::YesButton,
        MessageId::NoButton,
        MessageId::ProcessingPlaceholder,
        MessageId::MessagePlaceholder,
        MessageId::UploadedImageAlt,
    ];

    /// Stable wire key, matching the serde representation
    pub fn key(self) -> &'static str {
        match self {
            MessageId::AppTitle => "app_title",
            MessageId::AppDescription => "app_description",
            MessageId::Generating => "generating",
            MessageId::Welcome => "welcome",
            MessageId::Analyzing => "analyzing",
            MessageId::ImageDescriptionPrefix => "image_description_prefix",
            MessageId::SocialMediaQuestion => "social_media_question",
            MessageId::SocialMediaPostsPrefix => "social_media_posts_prefix",
            MessageId::ReadyForAnother => "ready_for_another",
            MessageId::SocialMediaError => "social_media_error",
            MessageId::NoProblem => "no_problem",
            MessageId::ImageAnalysisError => "image_analysis_error",
            MessageId::ApiError => "api_error",
            MessageId::ImageApiError => "image_api_error",
            MessageId::YesButton => "yes_button",
            MessageId::NoButton => "no_button",
            MessageId::ProcessingPlaceholder => "processing_placeholder",
            MessageId::MessagePlaceholder => "message_placeholder",
            MessageId::UploadedImageAlt => "uploaded_image_alt",
        }
    }
}

/// Resolve a message to display text.
///
/// With a payload the result is the template, a blank line, then the payload.
pub fn resolve(id: MessageId, language: Language, payload: Option<&str>) -> String {
    let template = text(id, language);
    match payload {
        Some(payload) => format!("{template}\n\n{payload}"),
        None => template.to_string(),
    }
}

/// All messages for a language, in catalog order
pub fn catalog(language: Language) -> Vec<(MessageId, &'static str)> {
    MessageId::ALL
        .iter()
        .map(|&id| (id, text(id, language)))
        .collect()
}

#[allow(clippy::too_many_lines)]
fn text(id: MessageId, language: Language) -> &'static str {
    use Language::{En, Es, Pt};
    use MessageId as M;

    match (id, language) {
        (M::AppTitle | M::AppDescription, En) => "Cloudflare AI Chat",
        (M::AppTitle | M::AppDescription, Es) => "Chat de IA de Cloudflare",
        (M::AppTitle | M::AppDescription, Pt) => "Chat de IA da Cloudflare",

        (M::Generating, En) => "Generating...",
        (M::Generating, Es) => "Generando...",
        (M::Generating, Pt) => "Gerando...",

        (M::Welcome, En) => {
            "Welcome! Let's start by uploading an image you'd like me to analyze."
        }
        (M::Welcome, Es) => {
            "¡Bienvenido! Comencemos subiendo una imagen que te gustaría que analice."
        }
        (M::Welcome, Pt) => {
            "Bem-vindo! Vamos começar enviando uma imagem que você gostaria que eu analisasse."
        }

        (M::Analyzing, En) => "Analyzing your image...",
        (M::Analyzing, Es) => "Analizando tu imagen...",
        (M::Analyzing, Pt) => "Analisando sua imagem...",

        (M::ImageDescriptionPrefix, En) => "Here's how I would describe the image:",
        (M::ImageDescriptionPrefix, Es) => "Así es como describiría la imagen:",
        (M::ImageDescriptionPrefix, Pt) => "Aqui está como eu descreveria a imagem:",

        (M::SocialMediaQuestion, En) => {
            "Would you like me to generate social media posts based on this description?"
        }
        (M::SocialMediaQuestion, Es) => {
            "¿Te gustaría que genere publicaciones para redes sociales basadas en esta descripción?"
        }
        (M::SocialMediaQuestion, Pt) => {
            "Gostaria que eu gerasse posts para redes sociais baseados nesta descrição?"
        }

        (M::SocialMediaPostsPrefix, En) => "Here are some suggested social media posts:",
        (M::SocialMediaPostsPrefix, Es) => {
            "Aquí tienes algunas publicaciones sugeridas para redes sociales:"
        }
        (M::SocialMediaPostsPrefix, Pt) => {
            "Aqui estão algumas sugestões de posts para redes sociais:"
        }

        (M::ReadyForAnother, En) => "I'm ready for another image",
        (M::ReadyForAnother, Es) => "Estoy listo para otra imagen",
        (M::ReadyForAnother, Pt) => "Estou pronto para outra imagem",

        (M::SocialMediaError, En) => {
            "There was an error generating social media posts. Please try again."
        }
        (M::SocialMediaError, Es) => {
            "Hubo un error al generar las publicaciones para redes sociales. Por favor, inténtalo de nuevo."
        }
        (M::SocialMediaError, Pt) => {
            "Houve um erro ao gerar posts para redes sociais. Por favor, tente novamente."
        }

        (M::NoProblem, En) => "No problem! Let me know if you'd like to analyze another image.",
        (M::NoProblem, Es) => "¡No hay problema! Avísame si te gustaría analizar otra imagen.",
        (M::NoProblem, Pt) => "Sem problema! Me avise se gostaria de analisar outra imagem.",

        (M::ImageAnalysisError, En) => {
            "There was an error analyzing the image. Please try again."
        }
        (M::ImageAnalysisError, Es) => {
            "Hubo un error al analizar la imagen. Por favor, inténtalo de nuevo."
        }
        (M::ImageAnalysisError, Pt) => {
            "Houve um erro ao analisar a imagem. Por favor, tente novamente."
        }

        (M::ApiError, En) => "Failed to generate social media posts",
        (M::ApiError, Es) => "Error al generar publicaciones para redes sociales",
        (M::ApiError, Pt) => "Falha ao gerar posts para redes sociais",

        (M::ImageApiError, En) => "Failed to analyze image",
        (M::ImageApiError, Es) => "Error al analizar la imagen",
        (M::ImageApiError, Pt) => "Falha ao analisar imagem",

        (M::YesButton, En) => "Yes",
        (M::YesButton, Es) => "Sí",
        (M::YesButton, Pt) => "Sim",

        (M::NoButton, En | Es) => "No",
        (M::NoButton, Pt) => "Não",

        (M::ProcessingPlaceholder, En) => "Processing...",
        (M::ProcessingPlaceholder, Es) => "Procesando...",
        (M::ProcessingPlaceholder, Pt) => "Processando...",

        (M::MessagePlaceholder, En) => "Type your message...",
        (M::MessagePlaceholder, Es) => "Escribe tu mensaje...",
        (M::MessagePlaceholder, Pt) => "Digite sua mensagem...",

        (M::UploadedImageAlt, En) => "Uploaded image",
        (M::UploadedImageAlt, Es) => "Imagen subida",
        (M::UploadedImageAlt, Pt) => "Imagem enviada",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn parse_accepts_region_tags_and_case() {
        assert_eq!(Language::parse("en"), Some(Language::En));
        assert_eq!(Language::parse("ES"), Some(Language::Es));
        assert_eq!(Language::parse("pt-BR"), Some(Language::Pt));
        assert_eq!(Language::parse(" es_AR "), Some(Language::Es));
        assert_eq!(Language::parse("fr"), None);
        assert_eq!(Language::parse(""), None);
    }

    #[test]
    fn every_message_has_text_in_every_language() {
        for language in Language::ALL {
            let entries = catalog(language);
            assert_eq!(entries.len(), MessageId::ALL.len());
            for (id, text) in entries {
                assert!(!text.trim().is_empty(), "{id:?} is blank in {language}");
            }
        }
    }

    #[test]
    fn message_keys_match_serde_names() {
        let mut seen = HashSet::new();
        for id in MessageId::ALL {
            let json = serde_json::to_value(id).unwrap();
            assert_eq!(json.as_str(), Some(id.key()));
            assert!(seen.insert(id.key()), "duplicate key {}", id.key());
        }
    }

    #[test]
    fn payload_is_separated_by_blank_line() {
        let text = resolve(MessageId::ImageDescriptionPrefix, Language::En, Some("a red car"));
        assert_eq!(text, "Here's how I would describe the image:\n\na red car");
    }

    #[test]
    fn resolve_without_payload_is_template() {
        assert_eq!(resolve(MessageId::YesButton, Language::Pt, None), "Sim");
        assert_eq!(resolve(MessageId::NoButton, Language::Es, None), "No");
    }

    #[test]
    fn language_serializes_as_code() {
        for language in Language::ALL {
            let json = serde_json::to_value(language).unwrap();
            assert_eq!(json.as_str(), Some(language.code()));
        }
    }
}

//! The EversVoz prompt chain: language detection, translation, grammar
//! check, and phonetic explanation, each a single chat completion.
//!
//! Detection, translation and grammar run on DeepSeek; the phonetic
//! explanation runs on Kimi with a much larger token budget because it emits
//! one annotated block per word.

use crate::services::{UpstreamResult, chat::ChatClient};

const TEMPERATURE: f32 = 0.2;

/// Verdict of the language-detection prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedLanguage {
    English,
    Spanish,
    Unsupported,
    /// The model answered something other than the three allowed words.
    Error,
}

impl DetectedLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedLanguage::English => "english",
            DetectedLanguage::Spanish => "spanish",
            DetectedLanguage::Unsupported => "unsupported",
            DetectedLanguage::Error => "error",
        }
    }
}

/// Classify `input_text` as spanish, english, or unsupported.
pub async fn detect_language(
    deepseek: &ChatClient,
    input_text: &str,
) -> UpstreamResult<DetectedLanguage> {
    let prompt = format!(
        r#"
        Analyze this text and respond with exactly one word:
        - "spanish" if the text is in Spanish
        - "english" if the text is in English
        - "unsupported" if the text is in another language or mixes languages

        Text: {input_text}
    "#
    );

    let answer = deepseek.complete(&prompt, 50, TEMPERATURE).await?;
    Ok(match answer.to_lowercase().as_str() {
        "spanish" => DetectedLanguage::Spanish,
        "english" => DetectedLanguage::English,
        "unsupported" => DetectedLanguage::Unsupported,
        _ => DetectedLanguage::Error,
    })
}

/// Translate a Spanish word or phrase into bare English.
pub async fn translate_to_english(
    deepseek: &ChatClient,
    input_text: &str,
) -> UpstreamResult<String> {
    let prompt = format!(
        r#"
        Translate this Spanish word or phrase to English.
        Respond with ONLY the English translation - no additional words or explanations.
        Do not include quotes, periods, or any other punctuation.
        Example input: casa
        Example output: house

        Text: {input_text}
    "#
    );

    deepseek.complete(&prompt, 300, TEMPERATURE).await
}

/// Correct English grammar and spelling; returns the input unchanged when
/// the model declares it already correct.
pub async fn grammar_check(deepseek: &ChatClient, input_text: &str) -> UpstreamResult<String> {
    let prompt = format!(
        r#"
        You are a grammar and spelling-checking assistant. Analyze the following text for grammatical and spelling correctness.

        - If the text is in English and contains grammatical or spelling errors, provide the corrected version of the text only. Do not include any additional text or explanations.
        - If the text is already correct, respond: "The text is grammatically correct."
        - If there are numbers convert them into words. Ex 157 -> one hundred and fifty seven

        Text: {input_text}
    "#
    );

    let answer = deepseek.complete(&prompt, 300, TEMPERATURE).await?;
    if answer.to_lowercase().contains("grammatically correct") {
        Ok(input_text.to_string())
    } else {
        Ok(answer)
    }
}

/// Produce the Spanish-speaker-oriented phonetic rendering of English text.
pub async fn phonetic_explanation(kimi: &ChatClient, input_text: &str) -> UpstreamResult<String> {
    let prompt = format!(
        r#"
        Eres un asistente de transcripción fonética. Convierte el siguiente texto en inglés en una transcripción fonética que imite la pronunciación del inglés pero sea fácil de leer y pronunciar para hablantes nativos de español.

        - Usa fonética simplificada que coincida con la pronunciación en español.
        - Evita símbolos IPA y utiliza combinaciones de letras familiares para los hablantes de español.
        - Use guiones entre palabras si eso ayuda a dividir la palabra para una pronunciación más fácil, "morning" -> "mor-ning".
        - Explicar cómo se pronuncia usando referencias al español
        - Proporciona una explicación para cada palabra indicando cómo debe sonar según el español.
        - Evita incluir prefijos como "Claro!" o "Aquí está la transcripción."
        - NO agregar resúmenes ni conclusiones al final

        La respuesta debe ser únicamente la transcripción fonética y la explicación de las palabras en el texto proporcionado, sin agregar palabras adicionales ni cambiar el formato estrictamente definido.
        La respuesta debe seguir ESTRICTAMENTE este formato para cada palabra:

        Ejemplo:
        "My" (mai)
        - La "m" es igual a la del español, y la "y" suena como un diptongo "ai", similar al sonido de "hay" en inglés.

        "Day" (dei)
        - La "d" es suave, similar a cómo se pronuncia en "dedo" en español, y la "ay" tiene el sonido de "ei", como en la palabra inglesa "hey".

        "Is" (is)
        - La "i" es corta y tensa, similar al sonido de la "i" en "mis" en español, pero más breve, y la "s" es como la de "sopa".

        "Going" (gouin)
        - La "g" es como en "gato", la "o" suena como una "ou" (como en "ou" de "ouch"), y "ing" suena como "in", pero con la lengua relajada al final.

        "Very" (veri)
        - "veri". La "v" se parece a una mezcla entre "v" y "b" en español, pero más cercana a la "v". La "e" es como en "mesa", y la "r" es suave, como en "pero".

        "Well" (uel)
        - "uel". La "w" suena como un leve "u" (como en "huevo"), la "e" es corta y clara, y la "ll" es como la "l" de "luz".

        "Today" (tudei)
        - "tudei". La "t" es fuerte, como en "tapa", la "u" suena como la "u" en español, y "day" es igual a "dei" como en "day" explicado arriba.

        Texto: {input_text} (solo transcribe las palabras proporcionadas, nada más).
    "#
    );

    kimi.complete(&prompt, 1000, TEMPERATURE).await
}

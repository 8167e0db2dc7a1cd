//! Supported reply languages

use serde::Serialize;

/// A language the assistant can answer and speak in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    /// BCP-47 code, also used for speech services
    pub code: &'static str,
    /// English name, used in prompts
    pub name: &'static str,
    pub native_name: &'static str,
    pub welcome: &'static str,
    /// Starter questions shown on an empty conversation
    pub starters: [&'static str; 3],
}

pub const DEFAULT_LANGUAGE: &str = "en-US";

pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language {
        code: "en-US",
        name: "English",
        native_name: "English",
        welcome: "Welcome! How can I help you with your farming questions today?",
        starters: [
            "Best crops for summer?",
            "How to treat leaf curl disease?",
            "Organic fertilizer tips",
        ],
    },
    Language {
        code: "hi-IN",
        name: "Hindi",
        native_name: "हिन्दी",
        welcome: "नमस्ते! मैं आज आपकी खेती के सवालों में कैसे मदद कर सकता हूँ?",
        starters: [
            "गर्मी के लिए सबसे अच्छी फसलें?",
            "पत्ती मोड़क रोग का इलाज कैसे करें?",
            "जैविक खाद के टिप्स",
        ],
    },
    Language {
        code: "ta-IN",
        name: "Tamil",
        native_name: "தமிழ்",
        welcome: "வணக்கம்! இன்று உங்கள் விவசாய கேள்விகளுக்கு நான் எப்படி உதவ முடியும்?",
        starters: [
            "கோடைக்கு சிறந்த பயிர்கள்?",
            "இலை சுருட்டு நோயை எவ்வாறு குணப்படுத்துவது?",
            "இயற்கை உரக் குறிப்புகள்",
        ],
    },
    Language {
        code: "te-IN",
        name: "Telugu",
        native_name: "తెలుగు",
        welcome: "నమస్కారం! ఈ రోజు మీ వ్యవసాయ ప్రశ్నలతో నేను మీకు ఎలా సహాయపడగలను?",
        starters: [
            "వేసవికి ఉత్తమ పంటలు?",
            "ఆకు ముడత వ్యాధిని ఎలా నయం చేయాలి?",
            "సేంద్రీయ ఎరువుల చిట్కాలు",
        ],
    },
    Language {
        code: "kn-IN",
        name: "Kannada",
        native_name: "ಕನ್ನಡ",
        welcome: "ನಮಸ್ಕಾರ! ಇಂದು ನಿಮ್ಮ ಕೃಷಿ ಪ್ರಶ್ನೆಗಳಿಗೆ ನಾನು ಹೇಗೆ ಸಹಾಯ ಮಾಡಬಹುದು?",
        starters: [
            "ಬೇಸಿಗೆಗೆ ಉತ್ತಮ ಬೆಳೆಗಳು?",
            "ಎಲೆ ಸುರುಳಿ ರೋಗವನ್ನು ಹೇಗೆ ಗುಣಪಡಿಸುವುದು?",
            "ಸಾವಯವ ಗೊಬ್ಬರದ ಸಲಹೆಗಳು",
        ],
    },
    Language {
        code: "ml-IN",
        name: "Malayalam",
        native_name: "മലയാളം",
        welcome: "നമസ്കാരം! ഇന്ന് നിങ്ങളുടെ കാർഷിക ചോദ്യങ്ങളിൽ ഞാൻ എങ്ങനെ സഹായിക്കും?",
        starters: [
            "വേനൽക്കാലത്ത് മികച്ച വിളകൾ?",
            "ഇല ചുരുളൽ രോഗം എങ്ങനെ ചികിത്സിക്കാം?",
            "ജൈവ വളപ്രയോഗത്തിനുള്ള നുറുങ്ങുകൾ",
        ],
    },
    Language {
        code: "mr-IN",
        name: "Marathi",
        native_name: "मराठी",
        welcome: "नमस्कार! आज मी तुमच्या शेतीच्या प्रश्नांसाठी कशी मदत करू शकेन?",
        starters: [
            "उन्हाळ्यासाठी सर्वोत्तम पिके?",
            "पाने कुरूप होण्याच्या रोगावर उपचार कसे करावे?",
            "सेंद्रिय खताच्या टिप्स",
        ],
    },
    Language {
        code: "gu-IN",
        name: "Gujarati",
        native_name: "ગુજરાતી",
        welcome: "નમસ્તે! આજે હું તમારા ખેતીના પ્રશ્નોમાં કેવી રીતે મદદ કરી શકું?",
        starters: [
            "ઉનાળા માટે શ્રેષ્ઠ પાક?",
            "પાન વાળવાના રોગનો ઉપચાર કેવી રીતે કરવો?",
            "ઓર્ગેનિક ખાતર ટિપ્સ",
        ],
    },
];

/// Look up a language by code (case-insensitive), if supported
pub fn find_language(code: &str) -> Option<&'static Language> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|l| l.code.eq_ignore_ascii_case(code))
}

/// Look up a language by code, falling back to English
pub fn language_or_default(code: &str) -> &'static Language {
    find_language(code).unwrap_or(&SUPPORTED_LANGUAGES[0])
}

/// All supported language codes
pub fn language_codes() -> Vec<String> {
    SUPPORTED_LANGUAGES
        .iter()
        .map(|l| l.code.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eight_languages() {
        assert_eq!(SUPPORTED_LANGUAGES.len(), 8);
        assert_eq!(SUPPORTED_LANGUAGES[0].code, DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_find_language_case_insensitive() {
        assert_eq!(find_language("HI-in").map(|l| l.name), Some("Hindi"));
        assert!(find_language("fr-FR").is_none());
    }

    #[test]
    fn test_fallback_is_english() {
        assert_eq!(language_or_default("xx").name, "English");
        assert_eq!(language_or_default("gu-IN").native_name, "ગુજરાતી");
    }

    #[test]
    fn test_codes_unique() {
        let mut codes = language_codes();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), SUPPORTED_LANGUAGES.len());
    }
}

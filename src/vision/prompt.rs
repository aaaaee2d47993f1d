use crate::language::Language;

/// Instruction sent alongside the image. The target language is the only
/// parameter.
pub fn build_prompt(language: Language) -> String {
    format!(
        "You are a world-class visual translator. Please study the image carefully and \
         identify the main object or location that is depicted. Just return 3 things: \
         Translated word, Romanization (if possible), and in English. Return it in the \
         following language: {} ({}). If Romanization is not possible, omit it.",
        language.display_name(),
        language.code()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_target_language() {
        let prompt = build_prompt(Language::Ko);
        assert!(prompt.contains("following language: Korean (ko)."));
        assert!(prompt.contains("Translated word, Romanization (if possible), and in English"));
    }

    #[test]
    fn prompt_differs_only_by_language() {
        let en = build_prompt(Language::En);
        let hi = build_prompt(Language::Hi);
        assert_eq!(
            en.replace("English (en)", "X"),
            hi.replace("Hindi (hi)", "X")
        );
    }
}

//! Transcript normalization - fixes common Spanish mis-transcriptions
//!
//! Runs before any wake-word or command matching. Rules are applied in
//! table order, one left-to-right pass each; a rule's output is never
//! re-scanned by an earlier rule.

/// A single correction rule.
///
/// `Phrase` replaces every substring occurrence. `Word` replaces whole
/// whitespace-delimited tokens only, so a correction whose output
/// contains its own pattern ("compa" -> "compae") stays idempotent.
enum Rule {
    Phrase { from: String, to: String },
    Word { from: String, to: String },
}

pub struct Normalizer {
    rules: Vec<Rule>,
}

impl Normalizer {
    /// Corrections observed from the Spanish recognizer in daily use.
    pub fn spanish() -> Self {
        Self {
            rules: vec![
                Rule::phrase("auto gestión", "autogestión"),
                Rule::word("compa", "compae"),
                Rule::phrase("abre guguel", "abre google"),
                Rule::phrase("abre yu tiub", "abre youtube"),
                Rule::phrase("qué horas", "qué hora es"),
                Rule::phrase("qué días", "qué día es"),
            ],
        }
    }

    /// Lower-case, collapse whitespace, and apply the correction table
    /// in order. Spacing is canonicalized first so multi-word rules see
    /// the same text on every pass.
    pub fn apply(&self, text: &str) -> String {
        let mut out = text
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        for rule in &self.rules {
            out = match rule {
                Rule::Phrase { from, to } => out.replace(from.as_str(), to),
                Rule::Word { from, to } => out
                    .split_whitespace()
                    .map(|tok| if tok == from { to.as_str() } else { tok })
                    .collect::<Vec<_>>()
                    .join(" "),
            };
        }
        out
    }
}

impl Rule {
    fn phrase(from: &str, to: &str) -> Self {
        Rule::Phrase {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    fn word(from: &str, to: &str) -> Self {
        Rule::Word {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases() {
        let n = Normalizer::spanish();
        assert_eq!(n.apply("HOLA Illo"), "hola illo");
    }

    #[test]
    fn applies_corrections() {
        let n = Normalizer::spanish();
        assert_eq!(n.apply("Auto Gestión qué horas"), "autogestión qué hora es");
        assert_eq!(n.apply("abre guguel"), "abre google");
        assert_eq!(n.apply("oye compa"), "oye compae");
    }

    #[test]
    fn word_rule_leaves_superstrings_alone() {
        let n = Normalizer::spanish();
        assert_eq!(n.apply("compae"), "compae");
        assert_eq!(n.apply("compartir pantalla"), "compartir pantalla");
    }

    #[test]
    fn idempotent() {
        let n = Normalizer::spanish();
        for input in [
            "auto gestión qué horas",
            "auto   gestión  qué  horas",
            "compa abre guguel",
            "qué días tenemos",
            "texto sin correcciones",
            "",
        ] {
            let once = n.apply(input);
            assert_eq!(n.apply(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn unknown_text_passes_through() {
        let n = Normalizer::spanish();
        assert_eq!(n.apply("abre el correo"), "abre el correo");
    }
}

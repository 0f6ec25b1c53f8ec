//! Multilingual keyword classification for power-infrastructure
//! relevance.
//!
//! Matching is substring-based rather than tokenized: a keyword hits if
//! it appears anywhere in the lowercased text, which catches inflected
//! forms across the six UN languages without per-language stemming.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::ImportError;

/// Built-in corpus: (keyword, language tag). Loaded once per run and
/// optionally extended from a user-supplied file.
pub const BUILTIN_KEYWORDS: &[(&str, &str)] = &[
    // English
    ("power", "en"),
    ("electricity", "en"),
    ("electric", "en"),
    ("electrical", "en"),
    ("energy", "en"),
    ("utility", "en"),
    ("substation", "en"),
    ("transformer", "en"),
    ("transmission", "en"),
    ("distribution", "en"),
    ("power line", "en"),
    ("powerline", "en"),
    ("overhead line", "en"),
    ("underground cable", "en"),
    ("utility pole", "en"),
    ("power pole", "en"),
    ("electricity pole", "en"),
    ("pylon", "en"),
    ("transmission tower", "en"),
    ("power tower", "en"),
    ("power grid", "en"),
    ("electrical grid", "en"),
    ("power supply", "en"),
    ("voltage", "en"),
    ("high voltage", "en"),
    ("low voltage", "en"),
    ("medium voltage", "en"),
    ("kilovolt", "en"),
    ("volt", "en"),
    ("outage", "en"),
    ("blackout", "en"),
    ("power cut", "en"),
    ("no power", "en"),
    ("power failure", "en"),
    ("electricity cut", "en"),
    ("power restoration", "en"),
    ("generator", "en"),
    ("solar panel", "en"),
    ("wind turbine", "en"),
    ("power station", "en"),
    ("power plant", "en"),
    ("electrical cabinet", "en"),
    ("switchgear", "en"),
    ("power meter", "en"),
    ("electricity meter", "en"),
    // Spanish
    ("energía", "es"),
    ("electricidad", "es"),
    ("eléctrico", "es"),
    ("eléctrica", "es"),
    ("energético", "es"),
    ("corriente", "es"),
    ("subestación", "es"),
    ("transformador", "es"),
    ("transmisión", "es"),
    ("distribución", "es"),
    ("línea eléctrica", "es"),
    ("línea de transmisión", "es"),
    ("cable subterráneo", "es"),
    ("cable aéreo", "es"),
    ("tendido eléctrico", "es"),
    ("poste eléctrico", "es"),
    ("poste de luz", "es"),
    ("torre eléctrica", "es"),
    ("pilón", "es"),
    ("torre de transmisión", "es"),
    ("red eléctrica", "es"),
    ("red de distribución", "es"),
    ("suministro eléctrico", "es"),
    ("voltaje", "es"),
    ("tensión", "es"),
    ("alto voltaje", "es"),
    ("bajo voltaje", "es"),
    ("kilovoltio", "es"),
    ("voltio", "es"),
    ("apagón", "es"),
    ("corte de luz", "es"),
    ("falla eléctrica", "es"),
    ("sin electricidad", "es"),
    ("interrupción eléctrica", "es"),
    ("restauración eléctrica", "es"),
    ("generador", "es"),
    ("panel solar", "es"),
    ("turbina eólica", "es"),
    ("central eléctrica", "es"),
    ("planta eléctrica", "es"),
    ("gabinete eléctrico", "es"),
    ("contador eléctrico", "es"),
    // French
    ("énergie", "fr"),
    ("électricité", "fr"),
    ("électrique", "fr"),
    ("énergétique", "fr"),
    ("courant électrique", "fr"),
    ("sous-station", "fr"),
    ("transformateur", "fr"),
    ("ligne électrique", "fr"),
    ("ligne de transmission", "fr"),
    ("câble souterrain", "fr"),
    ("câble aérien", "fr"),
    ("réseau électrique", "fr"),
    ("poteau électrique", "fr"),
    ("pylône", "fr"),
    ("tour de transmission", "fr"),
    ("alimentation électrique", "fr"),
    ("haute tension", "fr"),
    ("basse tension", "fr"),
    ("panne électrique", "fr"),
    ("coupure de courant", "fr"),
    ("panne de courant", "fr"),
    ("interruption électrique", "fr"),
    ("rétablissement électrique", "fr"),
    ("générateur", "fr"),
    ("panneau solaire", "fr"),
    ("éolienne", "fr"),
    ("centrale électrique", "fr"),
    ("armoire électrique", "fr"),
    ("compteur électrique", "fr"),
    // Russian
    ("энергия", "ru"),
    ("электричество", "ru"),
    ("электрический", "ru"),
    ("электрическая", "ru"),
    ("энергетический", "ru"),
    ("подстанция", "ru"),
    ("трансформатор", "ru"),
    ("линия электропередач", "ru"),
    ("лэп", "ru"),
    ("воздушная линия", "ru"),
    ("подземный кабель", "ru"),
    ("опора лэп", "ru"),
    ("столб", "ru"),
    ("мачта", "ru"),
    ("электрическая вышка", "ru"),
    ("электросеть", "ru"),
    ("энергосеть", "ru"),
    ("электроснабжение", "ru"),
    ("напряжение", "ru"),
    ("высокое напряжение", "ru"),
    ("низкое напряжение", "ru"),
    ("киловольт", "ru"),
    ("вольт", "ru"),
    ("отключение электричества", "ru"),
    ("авария на сети", "ru"),
    ("нет света", "ru"),
    ("перебои с электричеством", "ru"),
    ("восстановление электроснабжения", "ru"),
    ("генератор", "ru"),
    ("солнечная батарея", "ru"),
    ("ветрогенератор", "ru"),
    ("электростанция", "ru"),
    ("электрощит", "ru"),
    ("счётчик электроэнергии", "ru"),
    // Chinese
    ("电力", "zh"),
    ("电能", "zh"),
    ("电气", "zh"),
    ("能源", "zh"),
    ("电流", "zh"),
    ("变电站", "zh"),
    ("变压器", "zh"),
    ("输电", "zh"),
    ("配电", "zh"),
    ("电力线", "zh"),
    ("输电线路", "zh"),
    ("架空线路", "zh"),
    ("地下电缆", "zh"),
    ("电线杆", "zh"),
    ("输电塔", "zh"),
    ("电力塔", "zh"),
    ("铁塔", "zh"),
    ("电网", "zh"),
    ("供电", "zh"),
    ("电压", "zh"),
    ("高压", "zh"),
    ("低压", "zh"),
    ("千伏", "zh"),
    ("伏特", "zh"),
    ("停电", "zh"),
    ("断电", "zh"),
    ("电力故障", "zh"),
    ("没电", "zh"),
    ("电力中断", "zh"),
    ("供电恢复", "zh"),
    ("发电机", "zh"),
    ("太阳能板", "zh"),
    ("风力发电机", "zh"),
    ("发电站", "zh"),
    ("电厂", "zh"),
    ("配电柜", "zh"),
    ("电表", "zh"),
    // Arabic
    ("طاقة", "ar"),
    ("كهرباء", "ar"),
    ("كهربائي", "ar"),
    ("كهربائية", "ar"),
    ("تيار كهربائي", "ar"),
    ("محطة فرعية", "ar"),
    ("محول كهربائي", "ar"),
    ("نقل الكهرباء", "ar"),
    ("توزيع الكهرباء", "ar"),
    ("خط كهربائي", "ar"),
    ("كابل تحت الأرض", "ar"),
    ("كابل علوي", "ar"),
    ("عمود كهربائي", "ar"),
    ("برج كهربائي", "ar"),
    ("شبكة كهربائية", "ar"),
    ("إمداد كهربائي", "ar"),
    ("جهد كهربائي", "ar"),
    ("فولتية", "ar"),
    ("جهد عالي", "ar"),
    ("كيلو فولت", "ar"),
    ("فولت", "ar"),
    ("انقطاع الكهرباء", "ar"),
    ("عطل كهربائي", "ar"),
    ("بدون كهرباء", "ar"),
    ("انقطاع التيار", "ar"),
    ("استعادة الكهرباء", "ar"),
    ("مولد كهربائي", "ar"),
    ("لوحة شمسية", "ar"),
    ("توربين رياح", "ar"),
    ("محطة كهرباء", "ar"),
    ("عداد كهربائي", "ar"),
    // Technical terms and tag fragments
    ("power=", "en"),
    ("generator:", "en"),
    ("voltage=", "en"),
    ("frequency=", "en"),
    ("kva", "en"),
    ("mva", "en"),
    ("kilowatt", "en"),
    ("megawatt", "en"),
    ("three phase", "en"),
    ("single phase", "en"),
    ("alternating current", "en"),
    ("direct current", "en"),
    ("mantenimiento eléctrico", "es"),
    ("reparación eléctrica", "es"),
    ("entretien électrique", "fr"),
    ("réparation électrique", "fr"),
    ("ремонт сети", "ru"),
    ("электромонтаж", "ru"),
    ("电力维修", "zh"),
    ("电力安装", "zh"),
    ("صيانة كهربائية", "ar"),
    ("تركيب كهربائي", "ar"),
];

#[derive(Debug, Clone)]
struct Keyword {
    term: String,
    lowered: String,
    lang: String,
}

/// Holds the keyword corpus for one run. Immutable after construction.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<Keyword>,
}

impl KeywordClassifier {
    /// Build a classifier from the built-in corpus.
    pub fn builtin() -> Self {
        let keywords = BUILTIN_KEYWORDS
            .iter()
            .map(|(term, lang)| Keyword {
                term: term.to_string(),
                lowered: term.to_lowercase(),
                lang: lang.to_string(),
            })
            .collect();
        KeywordClassifier { keywords }
    }

    /// Merge additional keywords from a UTF-8 file, one per line. Blank
    /// lines are skipped; the language of file entries is unspecified.
    pub fn with_keywords_file(mut self, path: &Path) -> Result<Self, ImportError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            ImportError::Configuration(format!(
                "cannot read keywords file {}: {}",
                path.display(),
                err
            ))
        })?;

        let mut added = 0;
        for line in contents.lines() {
            let term = line.trim();
            if term.is_empty() {
                continue;
            }
            self.keywords.push(Keyword {
                term: term.to_string(),
                lowered: term.to_lowercase(),
                lang: "und".to_string(),
            });
            added += 1;
        }
        info!("Loaded {} custom keywords from {}", added, path.display());
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Return every keyword whose lowered form occurs as a substring of
    /// the lowered text, deduplicated and sorted for reproducibility.
    pub fn classify(&self, text: &str) -> Vec<String> {
        let haystack = text.to_lowercase();
        let matched: BTreeSet<&str> = self
            .keywords
            .iter()
            .filter(|kw| haystack.contains(&kw.lowered))
            .map(|kw| kw.term.as_str())
            .collect();
        matched.into_iter().map(str::to_string).collect()
    }

    /// Languages present in the corpus, for diagnostics.
    pub fn languages(&self) -> BTreeSet<&str> {
        self.keywords.iter().map(|kw| kw.lang.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn matches_are_case_insensitive() {
        let classifier = KeywordClassifier::builtin();
        let matched = classifier.classify("The SUBSTATION near the river is damaged");
        assert!(matched.contains(&"substation".to_string()));
    }

    #[test]
    fn spanish_outage_report_is_power_related() {
        let classifier = KeywordClassifier::builtin();
        let matched = classifier.classify("hay un apagón en la subestación");
        assert!(matched.contains(&"apagón".to_string()));
        assert!(matched.contains(&"subestación".to_string()));
        assert!(!matched.is_empty());
    }

    #[test]
    fn unrelated_text_matches_nothing() {
        let classifier = KeywordClassifier::builtin();
        let matched = classifier.classify("the bakery on the corner sells fresh bread");
        assert!(matched.is_empty());
    }

    #[test]
    fn keyword_matches_inside_words() {
        // Substring matching is intentional: "transformers" contains
        // "transformer".
        let classifier = KeywordClassifier::builtin();
        let matched = classifier.classify("two transformers were replaced");
        assert!(matched.contains(&"transformer".to_string()));
    }

    #[test]
    fn matched_keywords_are_sorted_and_deduplicated() {
        let classifier = KeywordClassifier::builtin();
        let matched = classifier.classify("voltage drop near the substation, high voltage risk");
        let mut sorted = matched.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(matched, sorted);
    }

    #[test]
    fn corpus_covers_six_languages() {
        let classifier = KeywordClassifier::builtin();
        let langs = classifier.languages();
        for lang in ["en", "es", "fr", "ru", "zh", "ar"] {
            assert!(langs.contains(lang), "missing language {}", lang);
        }
        assert!(classifier.len() >= 150);
    }

    #[test]
    fn keywords_file_extends_corpus() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "trafo").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  enerji kesintisi  ").unwrap();

        let classifier = KeywordClassifier::builtin()
            .with_keywords_file(file.path())
            .unwrap();
        assert_eq!(classifier.len(), BUILTIN_KEYWORDS.len() + 2);

        let matched = classifier.classify("mahallede enerji kesintisi var");
        assert!(matched.contains(&"enerji kesintisi".to_string()));
    }

    #[test]
    fn missing_keywords_file_is_configuration_error() {
        let result = KeywordClassifier::builtin()
            .with_keywords_file(Path::new("/nonexistent/keywords.txt"));
        assert!(matches!(result, Err(ImportError::Configuration(_))));
    }
}

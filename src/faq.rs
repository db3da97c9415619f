//! FAQ reference dataset: file loading and the cached similarity index.
//!
//! The dataset is a delimited text file with a header row carrying at
//! least the columns `Question` and `Réponse` (French labels, exact). It
//! is loaded wholesale into memory at startup and never persisted back;
//! a missing file or missing header column aborts startup.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::embedding;
use crate::matcher;
use crate::models::QaPair;

pub const FALLBACK_ANSWER: &str =
    "Désolé, je n'ai pas de réponse à cette question pour le moment.";

/// Parse the FAQ dataset file into question/answer pairs, in file order.
pub fn load_dataset(path: &Path, delimiter: char) -> Result<Vec<QaPair>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read FAQ dataset: {}", path.display()))?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let mut records = parse_records(content, delimiter).into_iter();

    let header = records
        .next()
        .ok_or_else(|| anyhow::anyhow!("FAQ dataset is empty: {}", path.display()))?;

    let question_col = column_index(&header, "Question")
        .ok_or_else(|| anyhow::anyhow!("FAQ dataset is missing a 'Question' column"))?;
    let answer_col = column_index(&header, "Réponse")
        .ok_or_else(|| anyhow::anyhow!("FAQ dataset is missing a 'Réponse' column"))?;

    let mut pairs = Vec::new();

    for (record_no, fields) in records.enumerate() {
        let needed = question_col.max(answer_col);
        if fields.len() <= needed {
            bail!(
                "Malformed FAQ row {}: expected at least {} fields, got {}",
                record_no + 2,
                needed + 1,
                fields.len()
            );
        }
        pairs.push(QaPair {
            question: fields[question_col].clone(),
            answer: fields[answer_col].clone(),
        });
    }

    if pairs.is_empty() {
        bail!("FAQ dataset has a header but no rows: {}", path.display());
    }

    Ok(pairs)
}

fn column_index(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.trim() == name)
}

/// Split the file into records of fields, honoring double-quoted fields
/// with `""` as an embedded quote. Quote state carries across newlines, so
/// a quoted field may span multiple lines; a newline outside quotes ends
/// the record. Blank lines are skipped.
fn parse_records(content: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' && current.is_empty() {
            in_quotes = true;
        } else if c == delimiter {
            fields.push(std::mem::take(&mut current));
        } else if c == '\n' {
            if current.ends_with('\r') {
                current.pop();
            }
            if fields.is_empty() && current.trim().is_empty() {
                current.clear();
            } else {
                fields.push(std::mem::take(&mut current));
                records.push(std::mem::take(&mut fields));
            }
        } else {
            current.push(c);
        }
    }

    // Final record when the file has no trailing newline.
    if !(fields.is_empty() && current.trim().is_empty()) {
        fields.push(current);
        records.push(fields);
    }

    records
}

/// FAQ pairs with their question embeddings, computed once per process.
///
/// Scores and ordering are identical to re-embedding the reference set on
/// every query; only the latency changes.
pub struct FaqIndex {
    pairs: Vec<QaPair>,
    question_vecs: Vec<Vec<f32>>,
    threshold: f32,
}

impl FaqIndex {
    /// Load the dataset and embed every question with the configured provider.
    pub async fn build(config: &Config) -> Result<Self> {
        let pairs = load_dataset(&config.dataset.path, config.dataset.delimiter)?;
        let questions: Vec<String> = pairs.iter().map(|p| p.question.clone()).collect();
        let question_vecs = embedding::embed_texts(&config.embedding, &questions).await?;
        if question_vecs.len() != pairs.len() {
            bail!(
                "Embedding provider returned {} vectors for {} FAQ questions",
                question_vecs.len(),
                pairs.len()
            );
        }
        Ok(Self::from_parts(pairs, question_vecs, config.faq.threshold))
    }

    pub fn from_parts(pairs: Vec<QaPair>, question_vecs: Vec<Vec<f32>>, threshold: f32) -> Self {
        Self {
            pairs,
            question_vecs,
            threshold,
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The stored answer for the closest question, verbatim, when its
    /// similarity clears the FAQ threshold.
    pub fn answer_for(&self, query_vec: &[f32]) -> Option<&str> {
        let (idx, score) = matcher::best_match(query_vec, &self.question_vecs)?;
        if matcher::accepts(score, self.threshold) {
            Some(&self.pairs[idx].answer)
        } else {
            None
        }
    }
}

/// The five fixed sidebar shortcuts. These append their pair to the
/// transcript directly, bypassing the matcher.
pub fn sidebar_shortcuts() -> Vec<QaPair> {
    let entries = [
        (
            "Comment puis-je consulter ma consommation d'eau ?",
            "Vous pouvez consulter votre consommation d'eau en vous connectant à votre compte sur notre site web ou en utilisant notre application mobile.",
        ),
        (
            "Que faire en cas d'interruption de service ?",
            "En cas d'interruption de service, veuillez vérifier notre site web ou notre application mobile pour des mises à jour. Vous pouvez également contacter notre service client pour plus d'informations.",
        ),
        (
            "Comment puis-je payer ma facture en ligne ?",
            "Vous pouvez payer votre facture en ligne via notre site web ou en utilisant notre application mobile.",
        ),
        (
            "Comment souscrire à un nouveau service d'eau ?",
            "Pour souscrire à un nouveau service d'eau, veuillez remplir le formulaire de demande sur notre site web ou vous rendre dans notre agence la plus proche.",
        ),
        (
            "Comment signaler une fuite d'eau ?",
            "Pour signaler une fuite d'eau, veuillez contacter notre service client immédiatement ou utiliser l'option de signalement dans notre application mobile.",
        ),
    ];

    entries
        .iter()
        .map(|(q, a)| QaPair {
            question: q.to_string(),
            answer: a.to_string(),
        })
        .collect()
}

/// Static sidebar links: (label, URL).
pub const SIDEBAR_LINKS: [(&str, &str); 2] = [
    ("Contactez-nous", "https://www.radeec.ma/contact/"),
    ("Télécharger notre application", "#"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_dataset(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_load_dataset_basic() {
        let f = write_dataset(
            "Question,Réponse\nComment payer ?,En ligne ou en agence.\nHoraires ?,De 8h à 16h.\n",
        );
        let pairs = load_dataset(f.path(), ',').unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].question, "Comment payer ?");
        assert_eq!(pairs[1].answer, "De 8h à 16h.");
    }

    #[test]
    fn test_load_dataset_quoted_fields() {
        let f = write_dataset(
            "Question,Réponse\n\"Payer, comment ?\",\"Par carte, virement, ou \"\"cash\"\".\"\n",
        );
        let pairs = load_dataset(f.path(), ',').unwrap();
        assert_eq!(pairs[0].question, "Payer, comment ?");
        assert_eq!(pairs[0].answer, "Par carte, virement, ou \"cash\".");
    }

    #[test]
    fn test_load_dataset_multiline_quoted_answer() {
        // A quoted field may span lines; the newline is part of the answer.
        let f = write_dataset(
            "Question,Réponse\nHoraires ?,\"Du lundi au vendredi :\n8h à 16h.\"\nAdresse ?,12 rue du Port.\n",
        );
        let pairs = load_dataset(f.path(), ',').unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].answer, "Du lundi au vendredi :\n8h à 16h.");
        assert_eq!(pairs[1].question, "Adresse ?");
    }

    #[test]
    fn test_load_dataset_crlf_line_endings() {
        let f = write_dataset("Question,Réponse\r\nQ1,R1\r\nQ2,R2\r\n");
        let pairs = load_dataset(f.path(), ',').unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].answer, "R1");
        assert_eq!(pairs[1].question, "Q2");
    }

    #[test]
    fn test_load_dataset_no_trailing_newline() {
        let f = write_dataset("Question,Réponse\nQ1,R1");
        let pairs = load_dataset(f.path(), ',').unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].answer, "R1");
    }

    #[test]
    fn test_load_dataset_extra_columns() {
        let f = write_dataset("Id;Question;Réponse\n1;Q1;R1\n2;Q2;R2\n");
        let pairs = load_dataset(f.path(), ';').unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].question, "Q2");
    }

    #[test]
    fn test_missing_column_fails() {
        let f = write_dataset("Question,Answer\nQ1,R1\n");
        let err = load_dataset(f.path(), ',').unwrap_err();
        assert!(err.to_string().contains("Réponse"));
    }

    #[test]
    fn test_malformed_row_fails() {
        let f = write_dataset("Question,Réponse\nonly-one-field\n");
        let err = load_dataset(f.path(), ',').unwrap_err();
        assert!(err.to_string().contains("Malformed FAQ row"));
    }

    #[test]
    fn test_missing_file_fails() {
        let err = load_dataset(Path::new("/nonexistent/faq.csv"), ',').unwrap_err();
        assert!(err.to_string().contains("Failed to read FAQ dataset"));
    }

    #[test]
    fn test_index_returns_answer_above_threshold() {
        let pairs = vec![
            QaPair {
                question: "q1".to_string(),
                answer: "a1".to_string(),
            },
            QaPair {
                question: "q2".to_string(),
                answer: "a2".to_string(),
            },
        ];
        let vecs = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        let index = FaqIndex::from_parts(pairs, vecs, 0.70);

        // Close paraphrase of q2
        assert_eq!(index.answer_for(&[0.0, 0.95, 0.1]), Some("a2"));
        // Unrelated direction: similarity to both is below threshold
        assert_eq!(index.answer_for(&[0.0, 0.0, 1.0]), None);
    }

    #[test]
    fn test_sidebar_has_five_shortcuts() {
        assert_eq!(sidebar_shortcuts().len(), 5);
        assert_eq!(SIDEBAR_LINKS.len(), 2);
    }
}

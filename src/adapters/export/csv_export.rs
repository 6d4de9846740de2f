//! CSV export of flashcard decks. Uses the `csv` crate for safe quoting.
//!
//! Output is Anki-importable: a `#separator` directive line followed by
//! `question;answer` rows.

use crate::domain::Flashcard;

const ANKI_HEADER: &str = "#separator:Semicolon\n#html:false\n";

/// Convert flashcards to a semicolon-delimited CSV string.
///
/// Newlines inside fields are kept; the csv writer quotes them.
pub fn flashcards_to_csv(cards: &[Flashcard]) -> Result<String, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(Vec::new());

    for card in cards {
        wtr.write_record([card.question.trim(), card.answer.trim()])?;
    }

    wtr.flush()?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))?;

    let body = String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })?;

    Ok(format!("{}{}", ANKI_HEADER, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(q: &str, a: &str) -> Flashcard {
        Flashcard {
            question: q.to_string(),
            answer: a.to_string(),
        }
    }

    #[test]
    fn test_flashcards_to_csv_basic() {
        let csv = flashcards_to_csv(&[card("What is ATP?", "Energy currency")]).unwrap();
        assert!(csv.starts_with("#separator:Semicolon\n"));
        assert!(csv.contains("What is ATP?;Energy currency"));
    }

    #[test]
    fn test_flashcards_to_csv_special_chars() {
        let csv = flashcards_to_csv(&[card("A; B", "say \"hi\"")]).unwrap();
        // Delimiters and quotes inside fields are quoted/escaped
        assert!(csv.contains("\"A; B\""));
        assert!(csv.contains("\"say \"\"hi\"\"\""));
    }

    #[test]
    fn test_flashcards_to_csv_empty() {
        assert_eq!(flashcards_to_csv(&[]).unwrap(), ANKI_HEADER);
    }
}

//! Turns warehouse rows into the report's text blocks.

/// Format a result-set's rows as a report section.
///
/// The first row (Athena's header echo for SELECT results) becomes the
/// header line `* | col0 | col1 |`; each subsequent row becomes a bullet
/// `  + col0: col1 requests`. An empty row list produces the empty string.
/// NULL cells render as empty strings.
pub fn format_rows(rows: &[Vec<Option<String>>]) -> String {
    let mut text = String::new();

    for (idx, row) in rows.iter().enumerate() {
        let col0 = row.first().and_then(|c| c.as_deref()).unwrap_or("");
        let col1 = row.get(1).and_then(|c| c.as_deref()).unwrap_or("");

        if idx == 0 {
            text = format!("* | {col0} | {col1} |\n");
            continue;
        }
        text.push_str(&format!("  + {col0}: {col1} requests\n"));
    }

    text
}

/// Assemble the full report text from its sections.
///
/// Header line `✍️ [<date>] <title>`, a blank line, then each section
/// followed by a newline.
pub fn compose_report(date: &str, title: &str, sections: &[String]) -> String {
    let mut text = format!("✍️ [{date}] {title}\n\n");
    for section in sections {
        text.push_str(section);
        text.push('\n');
    }
    text
}

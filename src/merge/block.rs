//! Table block extraction from free-form extraction output

/// Prefixes marking a line (or a whole output) as a failure report
pub const FAILURE_MARKERS: [&str; 3] = ["AI分析失败", "ANALYSIS_FAILED", "Error:"];

/// First column name of every header line
pub const HEADER_SIGNATURE: &str = "original_title";

/// A header plus data rows pulled out of one output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableBlock {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Returns true if the line starts a table header
pub fn is_header_line(line: &str) -> bool {
    line.split('\t')
        .next()
        .map(|first| first.trim().eq_ignore_ascii_case(HEADER_SIGNATURE))
        .unwrap_or(false)
}

/// Returns true if the line reports a failure instead of holding data
pub fn is_failure_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    FAILURE_MARKERS.iter().any(|marker| trimmed.starts_with(marker))
}

/// Extracts the table block of one output
///
/// The first fenced (```) section opening with a header is preferred. When
/// no fenced section does, the table starts at the first header line outside
/// any fence marker and runs to the end. Returns `None` when no header line
/// exists.
pub fn extract_block(text: &str) -> Option<TableBlock> {
    let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();

    let fenced = fenced_sections(&lines);
    let section: Vec<&str> = match fenced.into_iter().find(|section| opens_with_header(section)) {
        Some(section) => section,
        None => {
            let start = lines.iter().position(|l| is_header_line(l))?;
            lines[start..]
                .iter()
                .copied()
                .filter(|l| !is_fence_line(l))
                .collect()
        }
    };

    let mut kept = section
        .into_iter()
        .filter(|l| !l.trim().is_empty() && !is_failure_line(l))
        .map(split_cells);

    let header = kept.next()?;
    // Repeated header lines inside the block are not data
    let rows: Vec<Vec<String>> = kept
        .filter(|row| {
            !row.first()
                .map(|c| c.eq_ignore_ascii_case(HEADER_SIGNATURE))
                .unwrap_or(false)
        })
        .collect();

    Some(TableBlock { header, rows })
}

fn opens_with_header(section: &[&str]) -> bool {
    section
        .iter()
        .find(|l| !l.trim().is_empty())
        .map(|l| is_header_line(l))
        .unwrap_or(false)
}

fn is_fence_line(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Lines between each pair of ``` fences; an unclosed fence runs to the end
fn fenced_sections<'a>(lines: &[&'a str]) -> Vec<Vec<&'a str>> {
    let mut sections = Vec::new();
    let mut current: Option<Vec<&'a str>> = None;

    for &line in lines {
        if is_fence_line(line) {
            match current.take() {
                Some(section) => sections.push(section),
                None => current = Some(Vec::new()),
            }
        } else if let Some(section) = current.as_mut() {
            section.push(line);
        }
    }

    if let Some(section) = current {
        sections.push(section);
    }

    sections
}

fn split_cells(line: &str) -> Vec<String> {
    line.split('\t').map(|c| c.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_preferred() {
        let text = "Here is the table:\n```tsv\noriginal_title\tintent\r\n1060 dragon\tsell\r\n\n```\nThanks!";
        let block = extract_block(text).unwrap();
        assert_eq!(block.header, vec!["original_title", "intent"]);
        assert_eq!(block.rows, vec![vec!["1060 dragon", "sell"]]);
    }

    #[test]
    fn test_fence_with_header_wins_over_earlier_fence() {
        let text = "```\nsome echo of the input\n```\n```tsv\noriginal_title\tintent\nx\tother\n```";
        let block = extract_block(text).unwrap();
        assert_eq!(block.rows, vec![vec!["x", "other"]]);
    }

    #[test]
    fn test_headerless_fence_falls_back_to_unfenced_header() {
        let text = "```\nsome echo of the input\n```\noriginal_title\tintent\na\tsell\n```";
        let block = extract_block(text).unwrap();
        assert_eq!(block.header, vec!["original_title", "intent"]);
        assert_eq!(block.rows, vec![vec!["a", "sell"]]);

        assert_eq!(extract_block("```\n1060 dragon\tsell\n```"), None);
    }

    #[test]
    fn test_unfenced_header_signature() {
        let text = "Result follows\noriginal_title\tintent\n  a  \t sell \n\nb\tacquire";
        let block = extract_block(text).unwrap();
        assert_eq!(block.header, vec!["original_title", "intent"]);
        assert_eq!(block.rows, vec![vec!["a", "sell"], vec!["b", "acquire"]]);
    }

    #[test]
    fn test_failure_lines_and_repeated_headers_dropped() {
        let text = "```\noriginal_title\tintent\nAI分析失败: partial\na\tsell\noriginal_title\tintent\nError: cut off\n```";
        let block = extract_block(text).unwrap();
        assert_eq!(block.rows, vec![vec!["a", "sell"]]);
    }

    #[test]
    fn test_no_block() {
        assert_eq!(extract_block("I could not find any listings."), None);
        assert_eq!(extract_block(""), None);
        assert_eq!(extract_block("```\n\n```"), None);
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let block = extract_block("```tsv\noriginal_title\tintent\na\tsell").unwrap();
        assert_eq!(block.rows.len(), 1);
    }

    #[test]
    fn test_failure_line_detection() {
        assert!(is_failure_line("  ANALYSIS_FAILED: quota"));
        assert!(!is_failure_line("original_title\tError: column"));
    }
}

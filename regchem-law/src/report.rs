//! Plain-text report of check results.

use crate::engine::HitRecord;

const RULE_WIDE: usize = 40;
const RULE_NARROW: usize = 30;

/// Render hits as the console report: a count header and warning followed
/// by one block per hit, or a notice that nothing matched.
pub fn format_report(hits: &[HitRecord]) -> String {
    let mut out = String::new();
    out.push_str(&"-".repeat(RULE_WIDE));
    out.push('\n');
    if hits.is_empty() {
        out.push_str("no characteristic regulated structure found\n");
        out.push_str(&"-".repeat(RULE_WIDE));
        out.push('\n');
        return out;
    }

    out.push_str(&format!("{} result{}\n", hits.len(), if hits.len() == 1 { "" } else { "s" }));
    out.push_str("WARNING: the following regulations may apply\n");
    for hit in hits {
        out.push_str(&format!("- law           : {}\n", hit.law));
        out.push_str(&format!("- entry         : {}\n", hit.name));
        out.push_str(&format!("- registered as : {}\n", hit.description));
        out.push_str(&format!("- detected type : {}\n", hit.detected_type));
        out.push_str(&"-".repeat(RULE_NARROW));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(name: &str) -> HitRecord {
        HitRecord {
            law: "Stimulants Control Act".into(),
            name: name.into(),
            detected_type: "salt".into(),
            scope: vec!["salts".into()],
            description: "phenylmethylaminopropane".into(),
            pattern_matched: "CNC(C)Cc1ccccc1".into(),
        }
    }

    #[test]
    fn empty_report() {
        let report = format_report(&[]);
        assert!(report.contains("no characteristic regulated structure found"));
        assert_eq!(report.lines().count(), 3);
    }

    #[test]
    fn one_block_per_hit() {
        let report = format_report(&[hit("Methamphetamine"), hit("Methamphetamine salts")]);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[1], "2 results");
        assert!(lines[2].starts_with("WARNING"));
        assert_eq!(lines[3], "- law           : Stimulants Control Act");
        assert_eq!(lines[4], "- entry         : Methamphetamine");
        assert_eq!(lines[6], "- detected type : salt");
        assert_eq!(lines[7], "-".repeat(30));
        assert_eq!(report.matches("- entry").count(), 2);
    }

    #[test]
    fn singular_header() {
        assert!(format_report(&[hit("x")]).contains("\n1 result\n"));
    }
}

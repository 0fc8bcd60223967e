//! # LVBB Report Parsing
//!
//! LVBB answers every delivery with one or more XML reports. The first
//! `lvbb:uitkomst` in the document is the main outcome; `lvbb:verslag`
//! carries the delivery id and, once processing finished, a sub outcome.
//!
//! Code `DL-0005` means the publication went through. It counts as a sub
//! outcome even when LVBB sends none.

use roxmltree::{Document, Node};

use ob_state::{ReportOutcome, ReportStatus};

use crate::error::PublicationError;

pub const LVBB_NS: &str = "http://www.overheid.nl/2017/lvbb";
pub const STOP_NS: &str = "http://www.overheid.nl/2017/stop";

const PUBLISHED_CODE: &str = "DL-0005";

pub fn parse_report(content: &str) -> Result<ReportOutcome, PublicationError> {
    let doc = Document::parse(content).map_err(|e| PublicationError::Xml(e.to_string()))?;

    let main_outcome = doc
        .descendants()
        .find(|n| n.has_tag_name((LVBB_NS, "uitkomst")))
        .map(text_of)
        .ok_or(PublicationError::MissingReportElement("lvbb:uitkomst"))?;

    let verslag = doc
        .descendants()
        .find(|n| n.has_tag_name((LVBB_NS, "verslag")));

    let sub_delivery_id = verslag
        .and_then(|v| child_text(v, "idLevering"))
        .ok_or(PublicationError::MissingReportElement("lvbb:verslag/lvbb:idLevering"))?;
    let sub_progress = verslag
        .and_then(|v| child_text(v, "voortgang"))
        .unwrap_or_default();
    let mut sub_outcome = verslag
        .and_then(|v| child_text(v, "uitkomst"))
        .unwrap_or_default();

    let is_published = doc
        .descendants()
        .any(|n| n.has_tag_name((STOP_NS, "code")) && n.text() == Some(PUBLISHED_CODE));
    if is_published && sub_outcome.is_empty() {
        sub_outcome = format!("Received code {PUBLISHED_CODE}");
    }

    let status = if main_outcome == "succes" {
        ReportStatus::Valid
    } else {
        ReportStatus::Failed
    };

    Ok(ReportOutcome {
        status,
        main_outcome,
        sub_delivery_id,
        sub_progress,
        sub_outcome,
    })
}

fn text_of(node: Node<'_, '_>) -> String {
    node.text().unwrap_or_default().trim().to_string()
}

fn child_text(parent: Node<'_, '_>, name: &str) -> Option<String> {
    parent
        .children()
        .find(|n| n.has_tag_name((LVBB_NS, name)))
        .map(text_of)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(uitkomst: &str, verslag: &str, extra: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<lvbb:validatieVerzoekResultaat xmlns:lvbb="{LVBB_NS}" xmlns:stop="{STOP_NS}">
  <lvbb:tijdstipVerwerking>2024-05-01T10:00:00Z</lvbb:tijdstipVerwerking>
  <lvbb:uitkomst>{uitkomst}</lvbb:uitkomst>
  <lvbb:verslag>{verslag}</lvbb:verslag>
  {extra}
</lvbb:validatieVerzoekResultaat>"#
        )
    }

    #[test]
    fn successful_report_without_sub_outcome() {
        let xml = report(
            "succes",
            "<lvbb:idLevering>lvr-123</lvbb:idLevering><lvbb:voortgang>ontvangen</lvbb:voortgang>",
            "",
        );
        let outcome = parse_report(&xml).unwrap();
        assert_eq!(outcome.status, ReportStatus::Valid);
        assert_eq!(outcome.sub_delivery_id, "lvr-123");
        assert_eq!(outcome.sub_progress, "ontvangen");
        assert_eq!(outcome.sub_outcome, "");
    }

    #[test]
    fn verslag_outcome_is_sub_outcome() {
        let xml = report(
            "succes",
            "<lvbb:idLevering>lvr-1</lvbb:idLevering><lvbb:uitkomst>Publicatie gelukt</lvbb:uitkomst>",
            "",
        );
        let outcome = parse_report(&xml).unwrap();
        assert_eq!(outcome.main_outcome, "succes");
        assert_eq!(outcome.sub_outcome, "Publicatie gelukt");
    }

    #[test]
    fn published_code_fills_sub_outcome() {
        let xml = report(
            "succes",
            "<lvbb:idLevering>lvr-1</lvbb:idLevering>",
            "<stop:meldingen><stop:melding><stop:code>DL-0005</stop:code></stop:melding></stop:meldingen>",
        );
        let outcome = parse_report(&xml).unwrap();
        assert_eq!(outcome.sub_outcome, "Received code DL-0005");
    }

    #[test]
    fn any_other_outcome_fails() {
        let xml = report("fout", "<lvbb:idLevering>lvr-1</lvbb:idLevering>", "");
        assert_eq!(parse_report(&xml).unwrap().status, ReportStatus::Failed);
    }

    #[test]
    fn missing_delivery_id_is_rejected() {
        let xml = report("succes", "", "");
        assert!(matches!(
            parse_report(&xml),
            Err(PublicationError::MissingReportElement(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_report("not xml").is_err());
    }
}

//! Extracts asset uuids from STOP act text.
//!
//! Images are embedded as `<Illustratie naam="img_{uuid}.{ext}"/>` in the
//! `tekst` namespace.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::PublicationError;

pub const STOP_TEKST_NS: &str = "https://standaarden.overheid.nl/stop/imop/tekst/";

fn asset_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"img_([a-f0-9\-]+)\.(png|jpg|jpeg|gif|bmp|tiff|webp)")
            .expect("asset name regex is valid")
    })
}

pub fn asset_uuids(act_text: &str) -> Result<BTreeSet<String>, PublicationError> {
    let doc = roxmltree::Document::parse(act_text)
        .map_err(|e| PublicationError::Xml(e.to_string()))?;

    doc.descendants()
        .filter(|n| n.has_tag_name((STOP_TEKST_NS, "Illustratie")))
        .map(|n| extract_uuid(n.attribute("naam").unwrap_or_default()))
        .collect()
}

fn extract_uuid(name: &str) -> Result<String, PublicationError> {
    asset_name_regex()
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| PublicationError::AssetName(name.to_string()))
}

//! # Act Text
//!
//! Renders the used objects into a minimal STOP `RegelingVrijetekst`: one
//! `Divisietekst` per object with its title, its text as a paragraph and
//! its images as `Illustratie` elements.
//!
//! wIds are pinned per object code. An object already known to the
//! consolidated act keeps the wId it was first rendered with.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use crate::asset_parser::{asset_uuids, STOP_TEKST_NS};
use crate::error::PublicationError;
use crate::input::{ActInputData, PublicationObject};
use crate::state::WidData;

/// Act text together with the wIds and assets it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAct {
    pub act_text: String,
    pub wid_data: WidData,
    pub asset_uuids: BTreeSet<String>,
}

/// Object types that are delivered next to the act instead of inside it.
pub fn is_attachment_type(object_type: &str) -> bool {
    matches!(object_type, "werkingsgebied" | "document")
}

pub fn render_act_text(data: &ActInputData) -> Result<RenderedAct, PublicationError> {
    let (mut wid_map, mut wids) = match &data.act_mutation {
        Some(m) => (m.known_wid_map.clone(), m.known_wids.clone()),
        None => (BTreeMap::new(), Vec::new()),
    };

    let extensions: BTreeMap<&str, &str> = data
        .publication_data
        .assets
        .iter()
        .map(|a| (a.uuid.as_str(), a.extension.as_str()))
        .collect();

    let prefix = format!("{}_{}", data.province_id, data.act_frbr.frbr.work_other);

    let mut body = String::new();
    for object in used_objects(data) {
        let wid = wid_map
            .entry(object.code.clone())
            .or_insert_with(|| format!("{prefix}__div_{}", object.code.replace('-', "_")))
            .clone();
        if !wids.contains(&wid) {
            wids.push(wid.clone());
        }
        render_object(&mut body, &wid, object, &extensions)?;
    }

    let act_text = format!(
        r#"<RegelingVrijetekst xmlns="{STOP_TEKST_NS}" componentnaam="main"><Lichaam wId="{prefix}__body">{body}</Lichaam></RegelingVrijetekst>"#
    );
    let asset_uuids = asset_uuids(&act_text)?;

    Ok(RenderedAct {
        act_text,
        wid_data: WidData {
            known_wid_map: wid_map,
            known_wids: wids,
        },
        asset_uuids,
    })
}

/// Objects the template places, in input order.
pub fn used_objects(data: &ActInputData) -> impl Iterator<Item = &PublicationObject> {
    let codes = &data.publication_data.used_object_codes;
    data.publication_data
        .objects
        .iter()
        .filter(move |o| !is_attachment_type(&o.object_type) && codes.contains(&o.code))
}

fn render_object(
    out: &mut String,
    wid: &str,
    object: &PublicationObject,
    extensions: &BTreeMap<&str, &str>,
) -> Result<(), PublicationError> {
    let _ = write!(
        out,
        r#"<Divisietekst wId="{}"><Kop><Opschrift>{}</Opschrift></Kop><Inhoud>"#,
        escape(wid),
        escape(&object.title)
    );

    let text = plain_text(&object.text);
    if !text.is_empty() {
        let _ = write!(out, "<Al>{}</Al>", escape(&text));
    }

    for asset in &object.assets {
        let key = asset.to_string();
        let extension = extensions
            .get(key.as_str())
            .ok_or_else(|| PublicationError::MissingAsset(key.clone()))?;
        let _ = write!(
            out,
            r#"<Figuur><Illustratie naam="img_{asset}.{extension}"/></Figuur>"#
        );
    }

    out.push_str("</Inhoud></Divisietekst>");
    Ok(())
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex is valid"))
}

fn plain_text(html: &str) -> String {
    let stripped = tag_regex().replace_all(html, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

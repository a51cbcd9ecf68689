//! `docProps/core.xml` and `docProps/app.xml`

use chrono::{DateTime, SecondsFormat, Utc};
use docxkit_model::Metadata;
use log::warn;

use crate::error::Result;
use crate::xml::{XmlNode, XmlWriter};

pub const CORE_PART: &str = "docProps/core.xml";
pub const APP_PART: &str = "docProps/app.xml";

const NS_CP: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
const NS_DCTERMS: &str = "http://purl.org/dc/terms/";
const NS_DCMITYPE: &str = "http://purl.org/dc/dcmitype/";
const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
const NS_EXTENDED: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";
const NS_VT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes";

/// Core properties; missing timestamps are filled with `now`
pub fn core_xml(meta: &Metadata, now: DateTime<Utc>) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new();
    w.declaration()?;
    w.start(
        "cp:coreProperties",
        &[
            ("xmlns:cp", NS_CP),
            ("xmlns:dc", NS_DC),
            ("xmlns:dcterms", NS_DCTERMS),
            ("xmlns:dcmitype", NS_DCMITYPE),
            ("xmlns:xsi", NS_XSI),
        ],
    )?;

    let keywords = meta.keywords_joined();
    let text_fields = [
        ("dc:title", meta.title.as_deref()),
        ("dc:subject", meta.subject.as_deref()),
        ("dc:creator", meta.creator.as_deref()),
        ("cp:keywords", keywords.as_deref()),
        ("dc:description", meta.description.as_deref()),
        ("cp:lastModifiedBy", meta.last_modified_by.as_deref()),
    ];
    for (name, value) in text_fields {
        if let Some(value) = value {
            w.text_element(name, &[], value)?;
        }
    }
    w.text_element("cp:revision", &[], &meta.revision.unwrap_or(1).to_string())?;
    if let Some(category) = &meta.category {
        w.text_element("cp:category", &[], category)?;
    }
    for (name, stamp) in [
        ("dcterms:created", meta.created.unwrap_or(now)),
        ("dcterms:modified", meta.modified.unwrap_or(now)),
    ] {
        w.text_element(
            name,
            &[("xsi:type", "dcterms:W3CDTF")],
            &stamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
    }
    w.end("cp:coreProperties")?;
    Ok(w.into_bytes())
}

/// Extended properties
pub fn app_xml(meta: &Metadata, application: &str) -> Result<Vec<u8>> {
    let mut w = XmlWriter::new();
    w.declaration()?;
    w.start("Properties", &[("xmlns", NS_EXTENDED), ("xmlns:vt", NS_VT)])?;
    w.text_element("Application", &[], application)?;
    w.text_element("DocSecurity", &[], "0")?;
    if let Some(company) = &meta.company {
        w.text_element("Company", &[], company)?;
    }
    w.end("Properties")?;
    Ok(w.into_bytes())
}

/// Fill `meta` from a core properties part
pub fn parse_core(xml: &[u8], meta: &mut Metadata) -> Result<()> {
    let root = XmlNode::parse(xml)?;
    for node in root.elements() {
        let text = node.text();
        let value = || Some(text.clone()).filter(|t| !t.is_empty());
        match node.local_name() {
            "title" => meta.title = value(),
            "subject" => meta.subject = value(),
            "creator" => meta.creator = value(),
            "keywords" => meta.keywords = Metadata::parse_keywords(&text),
            "description" => meta.description = value(),
            "lastModifiedBy" => meta.last_modified_by = value(),
            "category" => meta.category = value(),
            "revision" => meta.revision = text.trim().parse().ok(),
            "created" => meta.created = parse_timestamp(&text),
            "modified" => meta.modified = parse_timestamp(&text),
            _ => {}
        }
    }
    Ok(())
}

/// Fill `meta` from an extended properties part
pub fn parse_app(xml: &[u8], meta: &mut Metadata) -> Result<()> {
    let root = XmlNode::parse(xml)?;
    if let Some(company) = root.child("Company") {
        let company = company.text();
        if !company.is_empty() {
            meta.company = Some(company);
        }
    }
    Ok(())
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(text.trim()) {
        Ok(stamp) => Some(stamp.with_timezone(&Utc)),
        Err(err) => {
            warn!("ignoring timestamp {text:?}: {err}");
            None
        }
    }
}

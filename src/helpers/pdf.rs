use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat, dictionary};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::errors::{TimesheetError, TimesheetResult};
use crate::helpers::fields::SessionFieldMapping;

const FONT_SIZE: f32 = 10.0;

/// A fillable widget on one of the template's pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    /// Object carrying `/T` and receiving `/V`.
    pub field_id: ObjectId,
    /// Widget annotation receiving the appearance stream; equals `field_id`
    /// for merged field/widget dictionaries.
    pub widget_id: ObjectId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub matched: usize,
    pub unmatched_keys: Vec<String>,
}

fn load_pdf<P: AsRef<Path>>(path: P) -> Result<Document, lopdf::Error> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Document::load_from(reader)
}

/// Lists the names of all fillable widgets in `template`, page by page.
pub fn list_fields<P: AsRef<Path>>(template: P) -> TimesheetResult<Vec<String>> {
    let doc = load_pdf(template)?;
    Ok(collect_form_fields(&doc)
        .into_iter()
        .map(|field| field.name)
        .collect())
}

/// Writes `mapping` into the form fields of `template` and saves the result
/// to `output`. Fields without a matching key are left untouched.
pub fn fill_form<P: AsRef<Path>, Q: AsRef<Path>>(
    template: P,
    mapping: &SessionFieldMapping,
    output: Q,
) -> TimesheetResult<FillReport> {
    let mut doc = load_pdf(template.as_ref())?;
    info!("Loaded PDF with {} page(s)", doc.get_pages().len());

    let report = fill_document(&mut doc, mapping)?;

    let mut writer = BufWriter::new(File::create(output.as_ref())?);
    doc.save_to(&mut writer)?;
    info!("Saved filled timesheet to {}", output.as_ref().display());

    Ok(report)
}

pub fn fill_document(doc: &mut Document, mapping: &SessionFieldMapping) -> TimesheetResult<FillReport> {
    let fields = collect_form_fields(doc);
    info!("Found {} form fields", fields.len());

    let mut filled: HashSet<&str> = HashSet::new();

    for field in &fields {
        let Some(value) = mapping.get(&field.name) else {
            continue;
        };
        debug!("Filling form field {} = {}", field.name, value);

        doc.get_dictionary_mut(field.field_id)?
            .set(b"V", encode_text(value));
        update_field_appearance(doc.get_dictionary_mut(field.widget_id)?, value);

        filled.insert(field.name.as_str());
    }

    request_appearance_regeneration(doc)?;

    let unmatched_keys: Vec<String> = mapping
        .keys()
        .filter(|key| !filled.contains(key))
        .map(String::from)
        .collect();
    if !unmatched_keys.is_empty() {
        warn!(
            "{} mapped value(s) have no field in the template",
            unmatched_keys.len()
        );
    }

    Ok(FillReport {
        matched: filled.len(),
        unmatched_keys,
    })
}

/// Walks every page's annotations and returns the named widgets.
pub fn collect_form_fields(doc: &Document) -> Vec<FormField> {
    let mut fields = Vec::new();

    for page_id in doc.get_pages().into_values() {
        let Ok(page) = doc.get_dictionary(page_id) else {
            continue;
        };
        let annots = match page.get(b"Annots").and_then(|annots| doc.dereference(annots)) {
            Ok((_, Object::Array(annots))) => annots,
            _ => continue,
        };

        for annot in annots {
            let Ok(widget_id) = annot.as_reference() else {
                continue;
            };
            let Ok(widget) = doc.get_dictionary(widget_id) else {
                continue;
            };
            let is_widget = widget
                .get(b"Subtype")
                .and_then(Object::as_name)
                .map(|subtype| subtype == b"Widget")
                .unwrap_or(false);
            if !is_widget {
                continue;
            }

            if let Some((field_id, name)) = field_name(doc, widget_id, widget) {
                fields.push(FormField {
                    name,
                    field_id,
                    widget_id,
                });
            }
        }
    }

    fields
}

/// Name of the field owning `widget`: its own `/T` or, for a kid widget, the
/// parent's.
fn field_name(doc: &Document, widget_id: ObjectId, widget: &Dictionary) -> Option<(ObjectId, String)> {
    if let Ok(Object::String(name_bytes, _)) = widget.get(b"T") {
        return Some((widget_id, decode_text(name_bytes)));
    }

    let parent_id = widget.get(b"Parent").and_then(Object::as_reference).ok()?;
    match doc.get_dictionary(parent_id).and_then(|parent| parent.get(b"T")) {
        Ok(Object::String(name_bytes, _)) => Some((parent_id, decode_text(name_bytes))),
        _ => None,
    }
}

/// Decodes a PDF text string: UTF-16BE with byte order mark, UTF-8, or
/// single-byte PDFDocEncoding read as Latin-1.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Encodes `value` as a literal Latin-1 string when possible, otherwise as a
/// UTF-16BE hex string with byte order mark.
pub fn encode_text(value: &str) -> Object {
    match latin1_bytes(value) {
        Some(bytes) => Object::String(bytes, StringFormat::Literal),
        None => {
            let mut bytes = vec![0xFE, 0xFF];
            for unit in value.encode_utf16() {
                bytes.extend_from_slice(&unit.to_be_bytes());
            }
            Object::String(bytes, StringFormat::Hexadecimal)
        }
    }
}

fn latin1_bytes(value: &str) -> Option<Vec<u8>> {
    value.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(val) => Some(*val as f32),
        Object::Real(val) => Some(*val as f32),
        _ => None,
    }
}

fn update_field_appearance(widget_dict: &mut Dictionary, value: &str) {
    // drop the stale appearance, viewers may regenerate it anyway
    widget_dict.remove(b"AP");

    let rect: Vec<f32> = match widget_dict.get(b"Rect") {
        Ok(Object::Array(rect)) if rect.len() == 4 => rect.iter().filter_map(number).collect(),
        _ => Vec::new(),
    };
    let (width, height) = match rect.as_slice() {
        [x1, y1, x2, y2] => ((x2 - x1).abs(), (y2 - y1).abs()),
        _ => (100.0, 30.0),
    };

    // text is drawn in WinAnsi, anything outside Latin-1 degrades to '?'
    let text: Vec<u8> = value
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    let baseline = ((height - FONT_SIZE) / 2.0 + 2.0).max(1.0);

    let mut content = format!("/Tx BMC\nq\nBT\n/Helv {} Tf\n0 g\n2 {:.2} Td\n(", FONT_SIZE, baseline).into_bytes();
    content.extend(escape_literal(&text));
    content.extend_from_slice(b") Tj\nET\nQ\nEMC");

    let stream_dict = dictionary! {
        "Type" => Object::Name(b"XObject".to_vec()),
        "Subtype" => Object::Name(b"Form".to_vec()),
        "BBox" => Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width.into()),
            Object::Real(height.into()),
        ]),
        "Resources" => dictionary! {
            "Font" => dictionary! {
                "Helv" => dictionary! {
                    "Type" => Object::Name(b"Font".to_vec()),
                    "Subtype" => Object::Name(b"Type1".to_vec()),
                    "BaseFont" => Object::Name(b"Helvetica".to_vec()),
                    "Encoding" => Object::Name(b"WinAnsiEncoding".to_vec()),
                },
            },
        },
    };
    let ap_stream = lopdf::Stream::new(stream_dict, content);

    let mut ap_dict = dictionary! {};
    ap_dict.set(b"N", Object::Stream(ap_stream));
    widget_dict.set(b"AP", Object::Dictionary(ap_dict));

    if !widget_dict.has(b"DA") {
        widget_dict.set(
            b"DA",
            Object::String(b"/Helv 10 Tf 0 g".to_vec(), StringFormat::Literal),
        );
    }
}

fn escape_literal(text: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(text.len());
    for &b in text {
        if matches!(b, b'(' | b')' | b'\\') {
            escaped.push(b'\\');
        }
        escaped.push(b);
    }
    escaped
}

/// Sets `/NeedAppearances true` on the document's AcroForm.
fn request_appearance_regeneration(doc: &mut Document) -> TimesheetResult<()> {
    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| TimesheetError::MalformedForm("missing document catalog".to_string()))?;

    let acroform = match doc.get_dictionary(root_id)?.get(b"AcroForm") {
        Ok(acroform) => acroform.clone(),
        Err(_) => {
            warn!("Template has no AcroForm, appearance regeneration not requested");
            return Ok(());
        }
    };

    match acroform {
        Object::Reference(acroform_id) => {
            doc.get_dictionary_mut(acroform_id)?
                .set(b"NeedAppearances", Object::Boolean(true));
        }
        Object::Dictionary(mut acroform) => {
            acroform.set(b"NeedAppearances", Object::Boolean(true));
            doc.get_dictionary_mut(root_id)?
                .set(b"AcroForm", Object::Dictionary(acroform));
        }
        _ => {
            return Err(TimesheetError::MalformedForm(
                "AcroForm is not a dictionary".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_all_text_encodings() {
        assert_eq!(decode_text(b"ttmmjjRow1"), "ttmmjjRow1");
        assert_eq!(decode_text(b"T\xe4tigkeit"), "Tätigkeit");
        assert_eq!(decode_text("Tätigkeit".as_bytes()), "Tätigkeit");
        assert_eq!(decode_text(&[0xFE, 0xFF, 0x00, 0x54, 0x00, 0xE4]), "Tä");
    }

    #[test]
    fn encodes_latin1_as_literal() {
        match encode_text("Tä") {
            Object::String(bytes, StringFormat::Literal) => assert_eq!(bytes, vec![b'T', 0xE4]),
            other => panic!("unexpected encoding {other:?}"),
        }
        match encode_text("€") {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(bytes, vec![0xFE, 0xFF, 0x20, 0xAC])
            }
            other => panic!("unexpected encoding {other:?}"),
        }
    }

    #[test]
    fn escapes_parentheses_and_backslashes() {
        assert_eq!(escape_literal(b"a(b)\\c"), b"a\\(b\\)\\\\c".to_vec());
    }

    #[test]
    fn appearance_replaces_existing_stream() {
        let mut widget = dictionary! {
            "Rect" => Object::Array(vec![
                Object::Integer(10),
                Object::Integer(10),
                Object::Real(110.0),
                Object::Integer(30),
            ]),
            "AP" => dictionary! {},
        };
        update_field_appearance(&mut widget, "08:00");

        let ap = widget.get(b"AP").and_then(Object::as_dict).unwrap();
        let normal = match ap.get(b"N").unwrap() {
            Object::Stream(stream) => stream,
            other => panic!("unexpected appearance {other:?}"),
        };
        assert!(String::from_utf8_lossy(&normal.content).contains("(08:00) Tj"));
        assert!(widget.has(b"DA"));
    }
}

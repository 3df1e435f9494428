//! WordprocessingML generation for `word/document.xml` and the static
//! parts of the package.

use std::fmt::Write;

use quick_xml::escape::escape;

use mdocx_diagrams::RenderedImage;

use crate::section::{AssembledDocument, Section, StyledRun};

/// EMUs per pixel at 96 DPI.
const EMU_PER_PX: u64 = 9525;

/// Twips of left indent per list nesting level.
const INDENT_TWIPS: usize = 720;

pub(crate) const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

pub(crate) const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Relationships for document.xml: styles plus one entry per image.
pub(crate) fn document_rels_xml(image_count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    );
    for n in 1..=image_count {
        let _ = write!(
            xml,
            r#"<Relationship Id="rIdImg{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image{n}.png"/>"#
        );
    }
    xml.push_str("</Relationships>");
    xml
}

/// Minimal style sheet: six heading styles, a shaded monospace code style,
/// and list styles.
pub(crate) fn styles_xml() -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>"#,
    );
    for level in 1..=6u8 {
        let size = 32 - 2 * u32::from(level);
        let _ = write!(
            xml,
            r#"<w:style w:type="paragraph" w:styleId="Heading{level}"><w:name w:val="heading {level}"/><w:basedOn w:val="Normal"/><w:pPr><w:outlineLvl w:val="{}"/><w:spacing w:before="240" w:after="120"/></w:pPr><w:rPr><w:b/><w:sz w:val="{size}"/></w:rPr></w:style>"#,
            level - 1
        );
    }
    xml.push_str(
        r#"<w:style w:type="paragraph" w:styleId="Code"><w:name w:val="Code"/><w:basedOn w:val="Normal"/><w:pPr><w:shd w:val="clear" w:color="auto" w:fill="F2F2F2"/></w:pPr><w:rPr><w:rFonts w:ascii="Courier New" w:hAnsi="Courier New"/><w:sz w:val="18"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="ListBullet"><w:name w:val="List Bullet"/><w:basedOn w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="ListNumber"><w:name w:val="List Number"/><w:basedOn w:val="Normal"/></w:style></w:styles>"#,
    );
    xml
}

/// Render the main document part.
pub(crate) fn document_xml(doc: &AssembledDocument) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>"#,
    );

    let mut image_index = 0usize;
    for section in &doc.sections {
        match section {
            Section::Heading { level, runs } => {
                let _ = write!(xml, r#"<w:p><w:pPr><w:pStyle w:val="Heading{level}"/></w:pPr>"#);
                write_runs(&mut xml, runs, false);
                xml.push_str("</w:p>");
            }
            Section::Paragraph { runs } => {
                xml.push_str("<w:p>");
                write_runs(&mut xml, runs, false);
                xml.push_str("</w:p>");
            }
            Section::ListItem {
                ordered,
                depth,
                runs,
            } => {
                let style = if *ordered { "ListNumber" } else { "ListBullet" };
                let indent = INDENT_TWIPS * (depth + 1);
                let _ = write!(
                    xml,
                    r#"<w:p><w:pPr><w:pStyle w:val="{style}"/><w:ind w:left="{indent}"/></w:pPr>"#
                );
                let marker = if *ordered { "" } else { "\u{2022} " };
                if !marker.is_empty() {
                    let _ = write!(
                        xml,
                        r#"<w:r><w:t xml:space="preserve">{marker}</w:t></w:r>"#
                    );
                }
                write_runs(&mut xml, runs, false);
                xml.push_str("</w:p>");
            }
            Section::CodeBlock { text } => {
                xml.push_str(r#"<w:p><w:pPr><w:pStyle w:val="Code"/></w:pPr>"#);
                write_run(
                    &mut xml,
                    &StyledRun {
                        text: text.clone(),
                        code: true,
                        ..StyledRun::default()
                    },
                    false,
                );
                xml.push_str("</w:p>");
            }
            Section::Table { header_rows, rows } => {
                write_table(&mut xml, *header_rows, rows);
            }
            Section::Image(image) => {
                image_index += 1;
                write_image(&mut xml, image, image_index, doc.image_box);
            }
            Section::Placeholder { reason, detail } => {
                xml.push_str(r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:i/><w:color w:val="C00000"/></w:rPr>"#);
                let text = format!(
                    "[diagram rendering failed ({}): {}]",
                    reason.as_str(),
                    detail
                );
                let _ = write!(
                    xml,
                    r#"<w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                    escape(&*text)
                );
            }
        }
    }

    xml.push_str(r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/></w:sectPr></w:body></w:document>"#);
    xml
}

fn write_runs(xml: &mut String, runs: &[StyledRun], force_bold: bool) {
    for run in runs {
        write_run(xml, run, force_bold);
    }
}

fn write_run(xml: &mut String, run: &StyledRun, force_bold: bool) {
    xml.push_str("<w:r>");
    let bold = run.bold || force_bold;
    if bold || run.italic || run.code {
        xml.push_str("<w:rPr>");
        if bold {
            xml.push_str("<w:b/>");
        }
        if run.italic {
            xml.push_str("<w:i/>");
        }
        if run.code {
            xml.push_str(r#"<w:rFonts w:ascii="Courier New" w:hAnsi="Courier New"/>"#);
        }
        xml.push_str("</w:rPr>");
    }
    // Newlines inside a run become explicit line breaks.
    let mut first = true;
    for line in run.text.split('\n') {
        if !first {
            xml.push_str("<w:br/>");
        }
        first = false;
        let _ = write!(xml, r#"<w:t xml:space="preserve">{}</w:t>"#, escape(line));
    }
    xml.push_str("</w:r>");
}

fn write_table(xml: &mut String, header_rows: usize, rows: &[crate::section::TableRow]) {
    xml.push_str(
        r#"<w:tbl><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:color="auto"/><w:left w:val="single" w:sz="4" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:color="auto"/><w:right w:val="single" w:sz="4" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:color="auto"/></w:tblBorders></w:tblPr>"#,
    );
    let columns = rows.first().map_or(0, Vec::len);
    xml.push_str("<w:tblGrid>");
    for _ in 0..columns {
        xml.push_str(r#"<w:gridCol w:w="2400"/>"#);
    }
    xml.push_str("</w:tblGrid>");
    for (row_index, row) in rows.iter().enumerate() {
        let in_header = row_index < header_rows;
        xml.push_str("<w:tr>");
        for cell in row {
            xml.push_str("<w:tc><w:p>");
            write_runs(xml, cell, in_header);
            xml.push_str("</w:p></w:tc>");
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
}

fn write_image(xml: &mut String, image: &RenderedImage, index: usize, image_box: (u32, u32)) {
    let (cx, cy) = fit_within(image.width_px, image.height_px, image_box);
    let _ = write!(
        xml,
        r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{index}" name="diagram{index}"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:nvPicPr><pic:cNvPr id="{index}" name="image{index}.png"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="rIdImg{index}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
    );
}

/// Scale pixel dimensions into the bounding box, preserving aspect ratio,
/// and convert to EMUs. Images already inside the box keep their size.
pub(crate) fn fit_within(width_px: u32, height_px: u32, image_box: (u32, u32)) -> (u64, u64) {
    let (box_w, box_h) = image_box;
    let (width_px, height_px) = (width_px.max(1), height_px.max(1));
    let scale = f64::min(
        f64::from(box_w) / f64::from(width_px),
        f64::from(box_h) / f64::from(height_px),
    )
    .min(1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scaled = |px: u32| ((f64::from(px) * scale).round() as u64).max(1) * EMU_PER_PX;
    (scaled(width_px), scaled(height_px))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use mdocx_diagrams::FailureReason;

    use super::*;

    #[test]
    fn test_fit_within_keeps_small_images() {
        assert_eq!(fit_within(100, 50, (1200, 800)), (100 * 9525, 50 * 9525));
    }

    #[test]
    fn test_fit_within_scales_down_preserving_aspect() {
        // 2400x800 into 1200x800 halves both dimensions.
        assert_eq!(fit_within(2400, 800, (1200, 800)), (1200 * 9525, 400 * 9525));
        // Height-bound: 1000x1600 into 1200x800 scales by 0.5.
        assert_eq!(fit_within(1000, 1600, (1200, 800)), (500 * 9525, 800 * 9525));
    }

    #[test]
    fn test_fit_within_zero_dimension() {
        let (cx, cy) = fit_within(0, 0, (1200, 800));
        assert!(cx >= EMU_PER_PX && cy >= EMU_PER_PX);
    }

    #[test]
    fn test_document_xml_escapes_text() {
        let doc = AssembledDocument {
            sections: vec![Section::Paragraph {
                runs: vec![StyledRun::plain("a < b & c")],
            }],
            image_box: (1200, 800),
        };
        let xml = document_xml(&doc);
        assert!(xml.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_document_xml_heading_style() {
        let doc = AssembledDocument {
            sections: vec![Section::Heading {
                level: 2,
                runs: vec![StyledRun::plain("Title")],
            }],
            image_box: (1200, 800),
        };
        let xml = document_xml(&doc);
        assert!(xml.contains(r#"<w:pStyle w:val="Heading2"/>"#));
    }

    #[test]
    fn test_document_xml_placeholder_carries_reason_and_detail() {
        let doc = AssembledDocument {
            sections: vec![Section::Placeholder {
                reason: FailureReason::NetworkError,
                detail: "HTTP 503".to_owned(),
            }],
            image_box: (1200, 800),
        };
        let xml = document_xml(&doc);
        assert!(xml.contains("network_error"));
        assert!(xml.contains("HTTP 503"));
    }

    #[test]
    fn test_document_xml_image_extent() {
        let doc = AssembledDocument {
            sections: vec![Section::Image(RenderedImage {
                bytes: Vec::new(),
                width_px: 600,
                height_px: 400,
            })],
            image_box: (1200, 800),
        };
        let xml = document_xml(&doc);
        assert!(xml.contains(&format!(r#"<wp:extent cx="{}" cy="{}"/>"#, 600 * 9525, 400 * 9525)));
        assert!(xml.contains(r#"r:embed="rIdImg1""#));
        assert!(xml.contains(r#"<w:jc w:val="center"/>"#));
    }

    #[test]
    fn test_document_rels_lists_images() {
        let rels = document_rels_xml(2);
        assert!(rels.contains(r#"Target="media/image1.png""#));
        assert!(rels.contains(r#"Target="media/image2.png""#));
        assert!(rels.contains(r#"Target="styles.xml""#));
    }

    #[test]
    fn test_multiline_run_uses_breaks() {
        let doc = AssembledDocument {
            sections: vec![Section::CodeBlock {
                text: "line one\nline two".to_owned(),
            }],
            image_box: (1200, 800),
        };
        let xml = document_xml(&doc);
        assert!(xml.contains("line one</w:t><w:br/>"));
    }
}
